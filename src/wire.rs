//! JSON encoding of engine calls, shared by the WebAssembly bindings.
//!
//! Tiles travel as identity strings ("r7a", "wb"), sets as arrays of tiles and
//! the board as an array of sets. Every response is an envelope:
//! `{"success": true, "result": ...}` or `{"success": false, "error": "..."}`.

use crate::game::{Game, PendingTurn};
use crate::rules::{calculate_set_points, classify_set, is_valid_set, SetKind};
use crate::solver::{ai_play_turn, TurnOutcome};
use crate::sort::{sort_hand, SortKey};
use crate::{Board, EngineError, Hand, Result, Tile};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Response envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct Response<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Wrap a result in the response envelope and serialize it
pub fn respond<T: Serialize>(result: Result<T>) -> String {
    let response = match result {
        Ok(value) => Response {
            success: true,
            result: Some(value),
            error: None,
        },
        Err(e) => Response {
            success: false,
            result: None,
            error: Some(e.to_string()),
        },
    };
    serde_json::to_string(&response).unwrap_or_else(|e| {
        format!(r#"{{"success":false,"error":"Serialization error: {}"}}"#, e)
    })
}

fn decode<T: DeserializeOwned>(what: &str, json: &str) -> Result<T> {
    serde_json::from_str(json).map_err(|e| EngineError::InvalidJson(format!("{}: {}", what, e)))
}

/// Validity and, for legal sets, kind and points
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetReport {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<u32>,
}

pub fn check_set(tiles_json: &str) -> Result<SetReport> {
    let tiles: Vec<Tile> = decode("tiles", tiles_json)?;
    let kind = classify_set(&tiles).map(|kind| match kind {
        SetKind::Group => "group".to_string(),
        SetKind::Run => "run".to_string(),
    });
    Ok(SetReport {
        valid: kind.is_some(),
        points: kind.as_ref().map(|_| calculate_set_points(&tiles)),
        kind,
    })
}

pub fn validate_set(tiles_json: &str) -> Result<bool> {
    let tiles: Vec<Tile> = decode("tiles", tiles_json)?;
    Ok(is_valid_set(&tiles))
}

/// Points of a set; refuses illegal sets rather than guessing a score
pub fn set_points(tiles_json: &str) -> Result<u32> {
    let tiles: Vec<Tile> = decode("tiles", tiles_json)?;
    if !is_valid_set(&tiles) {
        return Err(EngineError::InvalidSet);
    }
    Ok(calculate_set_points(&tiles))
}

pub fn sorted_hand(hand_json: &str, key: &str) -> Result<Vec<Tile>> {
    let tiles: Vec<Tile> = decode("hand", hand_json)?;
    let key: SortKey = key.parse()?;
    Ok(sort_hand(&tiles, key))
}

pub fn automated_turn(hand_json: &str, board_json: &str, has_meld: bool) -> Result<TurnOutcome> {
    let hand: Hand = decode("hand", hand_json)?;
    let board: Board = decode("board", board_json)?;
    Ok(ai_play_turn(&hand, &board, has_meld))
}

/// Everything a UI needs to draw the table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameView {
    pub generation: u64,
    pub turn: u64,
    pub current_player: usize,
    pub hands: Vec<Hand>,
    pub board: Board,
    pub pool_len: usize,
    pub melded: Vec<bool>,
    pub turn_points: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<usize>,
}

impl From<&Game> for GameView {
    fn from(game: &Game) -> Self {
        let players = 0..game.players();
        GameView {
            generation: game.generation(),
            turn: game.turn(),
            current_player: game.current_player(),
            hands: players
                .clone()
                .filter_map(|p| game.hand(p).ok().cloned())
                .collect(),
            board: game.board().clone(),
            pool_len: game.pool_len(),
            melded: players.filter_map(|p| game.has_melded(p).ok()).collect(),
            turn_points: game.turn_points(),
            winner: game.winner(),
        }
    }
}

/// Plan an automated turn; the caller holds the JSON until it commits
pub fn plan_turn(game: &Game) -> PendingTurn {
    game.plan_ai_turn()
}

pub fn commit_turn(game: &mut Game, pending_json: &str) -> Result<GameView> {
    let pending: PendingTurn = decode("pending turn", pending_json)?;
    game.commit_ai_turn(pending)?;
    Ok(GameView::from(&*game))
}

pub fn play_set(game: &mut Game, tiles_json: &str) -> Result<u32> {
    let tiles: Vec<Tile> = decode("tiles", tiles_json)?;
    game.play_set(&tiles)
}

pub fn extend_set(game: &mut Game, index: usize, tile: &str) -> Result<GameView> {
    let tile: Tile = tile.parse()?;
    game.extend_set(index, tile)?;
    Ok(GameView::from(&*game))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameConfig;
    use serde_json::Value;

    fn parse(json: &str) -> Value {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_respond_success() {
        let value = parse(&respond(validate_set(r#"["r7","b7","o7"]"#)));
        assert_eq!(value["success"], true);
        assert_eq!(value["result"], true);
        assert!(value.get("error").is_none());
    }

    #[test]
    fn test_respond_error() {
        let value = parse(&respond(validate_set(r#"["r7","x7"]"#)));
        assert_eq!(value["success"], false);
        assert!(value["error"].as_str().unwrap().contains("invalid tile"));
        assert!(value.get("result").is_none());

        let value = parse(&respond(validate_set("not json")));
        assert!(value["error"].as_str().unwrap().starts_with("invalid JSON: tiles"));
    }

    #[test]
    fn test_check_set() {
        let report = check_set(r#"["r5","w","r7"]"#).unwrap();
        assert_eq!(
            report,
            SetReport {
                valid: true,
                kind: Some("run".to_string()),
                points: Some(18)
            }
        );

        let report = check_set(r#"["r5","b6","r7"]"#).unwrap();
        assert!(!report.valid);
        assert_eq!(report.points, None);
    }

    #[test]
    fn test_set_points_refuses_invalid() {
        assert_eq!(set_points(r#"["r7a","b7a","o7b"]"#), Ok(21));
        assert_eq!(set_points(r#"["r7","r7b"]"#), Err(EngineError::InvalidSet));
    }

    #[test]
    fn test_sorted_hand() {
        let sorted = sorted_hand(r#"["w","r3","b3"]"#, "number").unwrap();
        let ids: Vec<String> = sorted.iter().map(Tile::id).collect();
        assert_eq!(ids, ["b3a", "r3a", "wa"]);

        assert_eq!(
            sorted_hand("[]", "weight"),
            Err(EngineError::InvalidSortKey("weight".to_string()))
        );
    }

    #[test]
    fn test_automated_turn_json() {
        let outcome = automated_turn(r#"["r10","b10","o10","k1"]"#, "[]", false).unwrap();
        let value = parse(&respond(Ok(outcome)));

        assert_eq!(value["result"]["made_move"], true);
        assert_eq!(value["result"]["hand"], serde_json::json!(["k1a"]));
        assert_eq!(
            value["result"]["board"],
            serde_json::json!([["r10a", "b10a", "o10a"]])
        );
    }

    #[test]
    fn test_plan_and_commit_through_json() {
        let mut game = Game::new(GameConfig {
            seed: Some(21),
            ..GameConfig::default()
        })
        .unwrap();

        let pending = serde_json::to_string(&plan_turn(&game)).unwrap();
        let view = commit_turn(&mut game, &pending).unwrap();
        assert_eq!(view.current_player, 1);
        assert_eq!(view.hands.len(), 4);

        // Same plan again is now for the wrong player
        assert!(matches!(
            commit_turn(&mut game, &pending),
            Err(EngineError::StaleTurn { .. })
        ));
    }

    #[test]
    fn test_forged_turn_json_is_rejected() {
        let mut game = Game::new(GameConfig {
            players: 2,
            seed: Some(1),
            ..GameConfig::default()
        })
        .unwrap();

        let mut pending: Value = serde_json::to_value(plan_turn(&game)).unwrap();
        pending["outcome"]["hand"] = serde_json::json!([]);
        pending["outcome"]["board"] = serde_json::json!([["r1a", "b5a", "k9a"]]);

        let result = commit_turn(&mut game, &pending.to_string());
        assert!(matches!(result, Err(EngineError::IllegalTurn(_))));
        assert_eq!(game.winner(), None);
        assert!(game.board().is_empty());
        assert_eq!(game.tile_count(), crate::DECK_SIZE);
    }

    #[test]
    fn test_game_view_counts() {
        let game = Game::new(GameConfig {
            players: 2,
            seed: Some(2),
            ..GameConfig::default()
        })
        .unwrap();
        let view = GameView::from(&game);

        let in_hands: usize = view.hands.iter().map(Hand::len).sum();
        assert_eq!(in_hands + view.pool_len + view.board.tile_count(), crate::DECK_SIZE);
        assert_eq!(view.melded, vec![false, false]);
        assert_eq!(view.winner, None);
    }
}
