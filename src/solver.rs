use crate::rules::{calculate_set_points, is_valid_set};
use crate::sort::{sort_hand, SortKey};
use crate::{Board, Color, Hand, Tile, TileSet, INITIAL_MELD_POINTS, MAX_NUMBER, MIN_NUMBER};
use serde::{Deserialize, Serialize};

/// Result of an automated turn. The caller decides whether to commit it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnOutcome {
    pub hand: Hand,
    pub board: Board,
    /// Whether any set was laid down or extended
    pub made_move: bool,
    /// Meld status after the turn; only ever flips from false to true
    pub has_meld: bool,
    /// Points laid down as new sets this turn (extensions don't score)
    pub turn_points: u32,
}

/// Working state of one automated turn
struct Turn {
    hand: Hand,
    board: Board,
    has_meld: bool,
    made_move: bool,
    turn_points: u32,
    threshold: u32,
}

impl Turn {
    /// Lay `candidate` down if the player has melded or it brings the turn
    /// total to the meld threshold.
    fn try_play(&mut self, candidate: Vec<Tile>) -> bool {
        debug_assert!(is_valid_set(&candidate));

        let points = calculate_set_points(&candidate);
        if !self.has_meld && self.turn_points + points < self.threshold {
            return false;
        }
        if self.hand.take(&candidate).is_err() {
            return false;
        }

        log::debug!(
            "automated play: {} for {} points",
            candidate.iter().map(Tile::id).collect::<Vec<_>>().join(" "),
            points
        );

        self.board.add_set(TileSet::new(candidate));
        self.turn_points += points;
        self.made_move = true;
        if self.turn_points >= self.threshold {
            self.has_meld = true;
        }
        true
    }

    /// Groups, by ascending number: three distinct colors, or two plus a wildcard.
    fn play_groups(&mut self) {
        for number in MIN_NUMBER..=MAX_NUMBER {
            let mut candidate: Vec<Tile> = Vec::new();
            for tile in self.hand.iter() {
                if tile.number() == Some(number)
                    && !candidate.iter().any(|c| c.color() == tile.color())
                {
                    candidate.push(*tile);
                }
            }

            if candidate.len() >= 3 {
                candidate.truncate(3);
                self.try_play(candidate);
            } else if candidate.len() == 2 {
                let wild = self.hand.iter().find(|t| t.is_wild()).copied();
                if let Some(wild) = wild {
                    candidate.push(wild);
                    self.try_play(candidate);
                }
            }
        }
    }

    /// Runs without wildcards. Each color plays at most one run per turn.
    fn play_runs(&mut self) {
        for color in Color::SUITS {
            let suited: Vec<Tile> = self
                .hand
                .iter()
                .copied()
                .filter(|t| t.color() == color)
                .collect();
            let suited = sort_hand(&suited, SortKey::Number);

            for start in 0..suited.len() {
                let mut run = vec![suited[start]];
                for tile in &suited[start + 1..] {
                    let next = run.last().and_then(Tile::number).map(|n| n + 1);
                    if tile.number() != next {
                        break;
                    }
                    run.push(*tile);
                }

                if run.len() >= 3 && self.try_play(run) {
                    break;
                }
            }
        }
    }

    /// First (set, hand tile) pair, in board then hand order, that stays valid
    fn find_extension(&self) -> Option<(usize, Tile)> {
        self.board.sets().iter().enumerate().find_map(|(idx, set)| {
            self.hand
                .iter()
                .find(|tile| is_valid_set(set.with(**tile).tiles()))
                .map(|tile| (idx, *tile))
        })
    }

    /// Keep adding single hand tiles to board sets until nothing fits
    fn extend_board(&mut self) {
        while let Some((idx, tile)) = self.find_extension() {
            if self.board.try_extend(idx, tile).is_err() || !self.hand.remove(&tile) {
                break;
            }
            log::debug!("automated extension: {} onto set {}", tile, idx);
            self.made_move = true;
        }
    }
}

/// Play an automated turn with the standard 30-point initial meld.
///
/// Greedy and deterministic, in three passes over working copies of the inputs:
/// 1. Groups, by ascending number
/// 2. Runs, by color (Red, Blue, Orange, Black)
/// 3. Single-tile extensions of board sets, only once the player has melded
///
/// A new set is only laid down if the player has already melded or the
/// points laid down this turn reach the threshold.
pub fn ai_play_turn(hand: &Hand, board: &Board, has_meld: bool) -> TurnOutcome {
    ai_play_turn_with_threshold(hand, board, has_meld, INITIAL_MELD_POINTS)
}

/// [`ai_play_turn`] with a custom initial meld threshold
pub fn ai_play_turn_with_threshold(
    hand: &Hand,
    board: &Board,
    has_meld: bool,
    threshold: u32,
) -> TurnOutcome {
    let mut turn = Turn {
        hand: hand.clone(),
        board: board.clone(),
        has_meld,
        made_move: false,
        turn_points: 0,
        threshold,
    };

    turn.play_groups();
    turn.play_runs();
    if turn.has_meld {
        turn.extend_board();
    }

    TurnOutcome {
        hand: turn.hand,
        board: turn.board,
        made_move: turn.made_move,
        has_meld: turn.has_meld,
        turn_points: turn.turn_points,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tile(s: &str) -> Tile {
        s.parse().unwrap()
    }

    fn hand(ids: &[&str]) -> Hand {
        Hand::from(ids.iter().map(|s| tile(s)).collect::<Vec<_>>())
    }

    fn set(ids: &[&str]) -> TileSet {
        TileSet::new(ids.iter().map(|s| tile(s)).collect())
    }

    fn ids(tiles: &[Tile]) -> Vec<String> {
        tiles.iter().map(Tile::id).collect()
    }

    #[test]
    fn test_group_reaches_initial_meld() {
        let result = ai_play_turn(&hand(&["r10", "b10", "o10", "k2"]), &Board::new(), false);

        assert!(result.made_move);
        assert!(result.has_meld);
        assert_eq!(result.turn_points, 30);
        assert_eq!(result.board.len(), 1);
        assert_eq!(ids(result.board.sets()[0].tiles()), ["r10a", "b10a", "o10a"]);
        assert_eq!(ids(result.hand.tiles()), ["k2a"]);
    }

    #[test]
    fn test_group_uses_first_three_colors_then_extends() {
        let result = ai_play_turn(&hand(&["r11", "b11", "o11", "k11"]), &Board::new(), false);

        // The fourth color goes on during the extension pass
        assert!(result.hand.is_empty());
        assert_eq!(result.board.len(), 1);
        assert_eq!(ids(result.board.sets()[0].tiles()), ["r11a", "b11a", "o11a", "k11a"]);
        assert_eq!(result.turn_points, 33);
    }

    #[test]
    fn test_group_dedupes_colors() {
        let result = ai_play_turn(&hand(&["r12a", "r12b", "b12", "o12"]), &Board::new(), false);

        assert_eq!(ids(result.board.sets()[0].tiles()), ["r12a", "b12a", "o12a"]);
        assert_eq!(ids(result.hand.tiles()), ["r12b"]);
    }

    #[test]
    fn test_pair_plus_wild() {
        let result = ai_play_turn(&hand(&["r12", "k5", "b12", "w"]), &Board::new(), false);

        assert!(result.made_move);
        assert_eq!(ids(result.board.sets()[0].tiles()), ["r12a", "b12a", "wa"]);
        assert_eq!(result.turn_points, 36);
        assert_eq!(ids(result.hand.tiles()), ["k5a"]);
    }

    #[test]
    fn test_below_threshold_makes_no_move() {
        let start = hand(&["r5", "b5", "o5", "k1", "k2", "k3"]);
        let board = Board::from(vec![set(&["r1", "r2", "r3"])]);

        let result = ai_play_turn(&start, &board, false);

        assert!(!result.made_move);
        assert!(!result.has_meld);
        assert_eq!(result.hand, start);
        assert_eq!(result.board, board);
    }

    #[test]
    fn test_melded_player_plays_small_sets() {
        let result = ai_play_turn(&hand(&["r5", "b5", "o5", "k1", "k2", "k3"]), &Board::new(), true);

        assert!(result.made_move);
        assert!(result.hand.is_empty());
        assert_eq!(result.board.len(), 2);
        assert_eq!(result.turn_points, 21);
    }

    #[test]
    fn test_run_reaches_initial_meld() {
        let result = ai_play_turn(&hand(&["r11", "r9", "r10"]), &Board::new(), false);

        assert!(result.made_move);
        assert_eq!(ids(result.board.sets()[0].tiles()), ["r9a", "r10a", "r11a"]);
        assert_eq!(result.turn_points, 30);
    }

    #[test]
    fn test_run_scan_stops_at_gap() {
        let result = ai_play_turn(&hand(&["b1", "b2", "b4", "b5", "b6"]), &Board::new(), true);

        assert_eq!(ids(result.board.sets()[0].tiles()), ["b4a", "b5a", "b6a"]);
        assert_eq!(ids(result.hand.tiles()), ["b1a", "b2a"]);
    }

    #[test]
    fn test_run_skips_duplicate_start() {
        let result = ai_play_turn(&hand(&["o5a", "o5b", "o6", "o7"]), &Board::new(), true);

        // The first o5 dead-ends on its twin; the run starts at the second
        assert_eq!(ids(result.board.sets()[0].tiles()), ["o5b", "o6a", "o7a"]);
        assert_eq!(ids(result.hand.tiles()), ["o5a"]);
    }

    #[test]
    fn test_one_run_per_color() {
        let result = ai_play_turn(
            &hand(&["r1", "r2", "r3", "r5", "r6", "r7"]),
            &Board::new(),
            true,
        );

        assert_eq!(result.board.len(), 1);
        assert_eq!(ids(result.board.sets()[0].tiles()), ["r1a", "r2a", "r3a"]);
        assert_eq!(ids(result.hand.tiles()), ["r5a", "r6a", "r7a"]);
    }

    #[test]
    fn test_run_gate_retries_later_starts() {
        // 1 2 3 = 6 fails the gate; the scan moves on and 10 11 12 = 33 passes
        let result = ai_play_turn(
            &hand(&["k1", "k2", "k3", "k10", "k11", "k12"]),
            &Board::new(),
            false,
        );

        assert!(result.made_move);
        assert!(result.has_meld);
        assert_eq!(result.board.len(), 1);
        assert_eq!(ids(result.board.sets()[0].tiles()), ["k10a", "k11a", "k12a"]);
        assert_eq!(ids(result.hand.tiles()), ["k1a", "k2a", "k3a"]);
        assert_eq!(result.turn_points, 33);

        // 7 8 9 = 24 fails the gate, as do the shorter tails
        let start = hand(&["k7", "k8", "k9"]);
        let result = ai_play_turn(&start, &Board::new(), false);
        assert!(!result.made_move);
        assert_eq!(result.hand, start);
    }

    #[test]
    fn test_extension_chain_terminates() {
        let board = Board::from(vec![set(&["r5", "r6", "r7"])]);
        let result = ai_play_turn(&hand(&["r8", "r9", "r4", "w"]), &board, true);

        assert!(result.made_move);
        assert!(result.hand.is_empty());
        assert_eq!(result.board.len(), 1);
        assert_eq!(result.board.sets()[0].len(), 7);
        assert!(result.board.sets()[0].is_valid());
        assert_eq!(result.turn_points, 0);
    }

    #[test]
    fn test_extension_uses_each_tile_once() {
        let board = Board::from(vec![set(&["r5", "r6", "r7"]), set(&["b5", "b6", "b7"])]);
        let result = ai_play_turn(&hand(&["w"]), &board, true);

        assert!(result.hand.is_empty());
        assert_eq!(result.board.sets()[0].len(), 4);
        assert_eq!(result.board.sets()[1].len(), 3);
    }

    #[test]
    fn test_no_extension_before_meld() {
        let board = Board::from(vec![set(&["r5", "r6", "r7"])]);
        let result = ai_play_turn(&hand(&["r8"]), &board, false);

        assert!(!result.made_move);
        assert_eq!(result.board, board);
    }

    #[test]
    fn test_meld_this_turn_enables_extension() {
        let board = Board::from(vec![set(&["k1", "k2", "k3"])]);
        let result = ai_play_turn(&hand(&["r10", "b10", "o10", "k4"]), &board, false);

        assert!(result.has_meld);
        assert!(result.hand.is_empty());
        assert_eq!(result.board.sets()[0].len(), 4);
    }

    #[test]
    fn test_tiles_are_conserved() {
        let start = hand(&["r10", "b10", "o10", "k10", "k11", "k12", "w", "b3", "r1"]);
        let board = Board::from(vec![set(&["o1", "o2", "o3"])]);
        let before = start.len() + board.tile_count();

        let result = ai_play_turn(&start, &board, false);

        assert_eq!(result.hand.len() + result.board.tile_count(), before);
    }

    #[test]
    fn test_custom_threshold() {
        let start = hand(&["r5", "b5", "o5"]);
        assert!(!ai_play_turn(&start, &Board::new(), false).made_move);
        assert!(ai_play_turn_with_threshold(&start, &Board::new(), false, 15).made_move);
    }
}
