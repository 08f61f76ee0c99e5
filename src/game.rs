//! Game state for a UI or driver loop to call into.
//!
//! [`Game`] owns the pool, every hand and the board, and moves tiles between
//! them one turn at a time. Human turns go through `play_set`, `extend_set`,
//! `undo` and `end_turn`; automated turns are computed with `plan_ai_turn` and
//! applied with `commit_ai_turn`. Each deal bumps a generation counter and
//! every state change bumps a turn counter, so a result planned against an
//! older table can't be committed. A committed result is also checked against
//! the live hand and board before it replaces them.

use crate::deck::{create_deck_with_rng, DECK_SIZE};
use crate::rules::{calculate_set_points, is_valid_set};
use crate::solver::{ai_play_turn_with_threshold, TurnOutcome};
use crate::{Board, EngineError, Hand, Result, Tile, TileSet, INITIAL_MELD_POINTS};
use std::collections::HashSet;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Number of hands dealt (2-4)
    pub players: usize,
    /// Tiles per hand at the deal
    pub hand_size: usize,
    /// Points needed in one turn for a first meld
    pub meld_threshold: u32,
    /// Seed for reproducible deals; fresh entropy when absent
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            players: 4,
            hand_size: 14,
            meld_threshold: INITIAL_MELD_POINTS,
            seed: None,
        }
    }
}

impl GameConfig {
    pub fn validate(&self) -> Result<()> {
        if !(2..=4).contains(&self.players) {
            return Err(EngineError::BadConfig(format!(
                "players must be 2-4, got {}",
                self.players
            )));
        }
        if self.hand_size == 0 {
            return Err(EngineError::BadConfig("hand_size must be positive".to_string()));
        }
        if self.players * self.hand_size > DECK_SIZE {
            return Err(EngineError::BadConfig(format!(
                "{} hands of {} need more than {} tiles",
                self.players, self.hand_size, DECK_SIZE
            )));
        }
        Ok(())
    }
}

/// What `undo` restores: the active hand and the board, nothing else.
/// The pool and the other hands are never rolled back.
#[derive(Debug, Clone)]
struct TurnSnapshot {
    hand: Hand,
    board: Board,
}

/// An automated turn computed against a given table state, not yet applied
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingTurn {
    pub generation: u64,
    pub turn: u64,
    pub player: usize,
    pub outcome: TurnOutcome,
}

#[derive(Debug, Clone)]
pub struct Game {
    config: GameConfig,
    rng: ChaCha8Rng,
    pool: Vec<Tile>,
    hands: Vec<Hand>,
    board: Board,
    melded: Vec<bool>,
    current: usize,
    generation: u64,
    /// Bumped on every change to a hand or the board
    turn: u64,
    snapshot: Option<TurnSnapshot>,
    turn_points: u32,
    played_this_turn: bool,
}

impl Game {
    /// Validate `config` and deal the first game
    pub fn new(config: GameConfig) -> Result<Self> {
        config.validate()?;

        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        let mut game = Game {
            rng,
            pool: Vec::new(),
            hands: Vec::new(),
            board: Board::new(),
            melded: vec![false; config.players],
            current: 0,
            generation: 0,
            turn: 0,
            snapshot: None,
            turn_points: 0,
            played_this_turn: false,
            config,
        };
        game.deal();
        Ok(game)
    }

    /// Shuffle a new deck, hand out fixed-size prefixes and keep the rest as pool
    fn deal(&mut self) {
        let deck = create_deck_with_rng(&mut self.rng);
        let dealt = self.config.players * self.config.hand_size;

        self.hands = deck[..dealt]
            .chunks(self.config.hand_size)
            .map(|chunk| Hand::from(chunk.to_vec()))
            .collect();
        self.pool = deck[dealt..].to_vec();
        self.board = Board::new();
        self.melded = vec![false; self.config.players];
        self.current = 0;

        log::info!(
            "dealt {} hands of {}, {} tiles in pool (generation {})",
            self.config.players,
            self.config.hand_size,
            self.pool.len(),
            self.generation
        );
        self.begin_turn();
    }

    /// Throw away the current game and deal a new one. Pending automated turns
    /// from before the reset become stale.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.turn += 1;
        self.deal();
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn current_player(&self) -> usize {
        self.current
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn turn(&self) -> u64 {
        self.turn
    }

    pub fn players(&self) -> usize {
        self.hands.len()
    }

    pub fn hand(&self, player: usize) -> Result<&Hand> {
        self.hands.get(player).ok_or(EngineError::NoSuchPlayer(player))
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn pool_len(&self) -> usize {
        self.pool.len()
    }

    pub fn has_melded(&self, player: usize) -> Result<bool> {
        self.melded
            .get(player)
            .copied()
            .ok_or(EngineError::NoSuchPlayer(player))
    }

    /// Points laid down as new sets by the active player this turn
    pub fn turn_points(&self) -> u32 {
        self.turn_points
    }

    /// Tiles across pool, hands and board; always the full deck
    pub fn tile_count(&self) -> usize {
        self.pool.len() + self.hands.iter().map(Hand::len).sum::<usize>() + self.board.tile_count()
    }

    /// First player whose hand is empty
    pub fn winner(&self) -> Option<usize> {
        self.hands.iter().position(Hand::is_empty)
    }

    fn begin_turn(&mut self) {
        self.snapshot = Some(TurnSnapshot {
            hand: self.hands[self.current].clone(),
            board: self.board.clone(),
        });
        self.turn_points = 0;
        self.played_this_turn = false;
    }

    fn advance(&mut self) {
        self.current = (self.current + 1) % self.hands.len();
        self.turn += 1;
        log::info!("player {} to move", self.current);
        self.begin_turn();
    }

    /// Move the last pool tile into the active hand
    fn draw(&mut self) -> Result<Tile> {
        let tile = self.pool.pop().ok_or(EngineError::EmptyPool)?;
        self.hands[self.current].add(tile);
        Ok(tile)
    }

    /// Lay a new set from the active hand. Returns its points.
    pub fn play_set(&mut self, tiles: &[Tile]) -> Result<u32> {
        if !is_valid_set(tiles) {
            return Err(EngineError::InvalidSet);
        }
        self.hands[self.current].take(tiles)?;

        let points = calculate_set_points(tiles);
        self.board.add_set(TileSet::new(tiles.to_vec()));
        self.turn_points += points;
        self.played_this_turn = true;
        self.turn += 1;
        Ok(points)
    }

    /// Add one tile from the active hand to a board set. Allowed once the
    /// player has melded, including earlier in this same turn.
    pub fn extend_set(&mut self, index: usize, tile: Tile) -> Result<()> {
        if !self.melded[self.current] && self.turn_points < self.config.meld_threshold {
            return Err(EngineError::NotMelded);
        }
        if !self.hands[self.current].contains(&tile) {
            return Err(EngineError::TileNotInHand(tile));
        }

        self.board.try_extend(index, tile)?;
        self.hands[self.current].remove(&tile);
        self.played_this_turn = true;
        self.turn += 1;
        Ok(())
    }

    /// Put the active hand and the board back to how they were at turn start
    pub fn undo(&mut self) -> Result<()> {
        let snapshot = self.snapshot.clone().ok_or(EngineError::NoSnapshot)?;
        self.hands[self.current] = snapshot.hand;
        self.board = snapshot.board;
        self.turn_points = 0;
        self.played_this_turn = false;
        self.turn += 1;
        Ok(())
    }

    /// Finish a human turn. A player who laid nothing down draws a tile (if the
    /// pool has any). A first meld under the threshold is refused; the caller
    /// is expected to `undo` or keep playing.
    pub fn end_turn(&mut self) -> Result<Option<Tile>> {
        let player = self.current;
        let threshold = self.config.meld_threshold;

        if self.played_this_turn && !self.melded[player] {
            if self.turn_points < threshold {
                return Err(EngineError::MeldRequired {
                    required: threshold,
                    got: self.turn_points,
                });
            }
            self.melded[player] = true;
        }

        let drawn = self.draw_if_idle();
        self.advance();
        Ok(drawn)
    }

    fn draw_if_idle(&mut self) -> Option<Tile> {
        if self.played_this_turn {
            return None;
        }
        match self.draw() {
            Ok(tile) => Some(tile),
            Err(_) => {
                log::debug!("player {} passes, pool is empty", self.current);
                None
            }
        }
    }

    /// Compute the automated turn for the active player without applying it
    pub fn plan_ai_turn(&self) -> PendingTurn {
        let player = self.current;
        PendingTurn {
            generation: self.generation,
            turn: self.turn,
            player,
            outcome: ai_play_turn_with_threshold(
                &self.hands[player],
                &self.board,
                self.melded[player],
                self.config.meld_threshold,
            ),
        }
    }

    /// Apply a planned automated turn and pass play on. Results planned
    /// against another table state are discarded, and the outcome must be a
    /// legal continuation of the live hand and board.
    pub fn commit_ai_turn(&mut self, pending: PendingTurn) -> Result<Option<Tile>> {
        if pending.generation != self.generation
            || pending.turn != self.turn
            || pending.player != self.current
        {
            log::warn!(
                "discarding stale turn for player {} (generation {}, turn {}; now {}, {})",
                pending.player,
                pending.generation,
                pending.turn,
                self.generation,
                self.turn
            );
            return Err(EngineError::StaleTurn {
                generation: pending.generation,
                turn: pending.turn,
            });
        }

        let outcome = pending.outcome;
        let points = self.check_outcome(&outcome)?;
        let moved = outcome.board != self.board;

        self.hands[self.current] = outcome.hand;
        self.board = outcome.board;
        self.turn_points = points;
        self.played_this_turn = moved;
        if moved && points >= self.config.meld_threshold {
            self.melded[self.current] = true;
        }

        let drawn = self.draw_if_idle();
        self.advance();
        Ok(drawn)
    }

    /// Check that `outcome` only moves tiles from the active hand onto the
    /// board: existing sets may grow at the end, new sets are appended, every
    /// set is valid and no tile appears or disappears. Returns the points of
    /// the new sets.
    fn check_outcome(&self, outcome: &TurnOutcome) -> Result<u32> {
        let illegal = |why: &str| Err(EngineError::IllegalTurn(why.to_string()));

        let old_sets = self.board.sets();
        let new_sets = outcome.board.sets();
        if new_sets.len() < old_sets.len() {
            return illegal("board sets were removed");
        }
        let kept = old_sets
            .iter()
            .zip(new_sets)
            .all(|(old, new)| new.tiles().starts_with(old.tiles()));
        if !kept {
            return illegal("board sets were rearranged");
        }
        if let Some(set) = new_sets.iter().find(|set| !set.is_valid()) {
            let ids: Vec<String> = set.tiles().iter().map(Tile::id).collect();
            return illegal(&format!("[{}] is not a valid set", ids.join(", ")));
        }

        let hand = &self.hands[self.current];
        let before: Vec<Tile> = hand.iter().copied().chain(board_tiles(&self.board)).collect();
        let after: Vec<Tile> = outcome
            .hand
            .iter()
            .copied()
            .chain(board_tiles(&outcome.board))
            .collect();
        let distinct: HashSet<Tile> = after.iter().copied().collect();
        if before.len() != after.len()
            || distinct.len() != after.len()
            || !before.iter().all(|tile| distinct.contains(tile))
        {
            return illegal("tiles do not match the hand and board");
        }

        let points: u32 = new_sets[old_sets.len()..].iter().map(TileSet::points).sum();
        let moved = outcome.board != self.board;
        if moved && !self.melded[self.current] && points < self.config.meld_threshold {
            return Err(EngineError::MeldRequired {
                required: self.config.meld_threshold,
                got: points,
            });
        }
        Ok(points)
    }
}

fn board_tiles(board: &Board) -> impl Iterator<Item = Tile> + '_ {
    board.sets().iter().flat_map(|set| set.tiles().iter().copied())
}
