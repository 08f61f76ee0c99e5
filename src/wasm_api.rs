use crate::game::{Game, GameConfig};
use crate::wire::{self, respond, GameView};
use crate::EngineError;
use wasm_bindgen::prelude::*;

/// Initialize panic hook for better error messages in the browser console
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// A freshly shuffled deck as a JSON array of tile ids
#[wasm_bindgen]
pub fn create_deck() -> String {
    respond(Ok(crate::create_deck()))
}

/// `tiles` - JSON array of tile ids (e.g., ["r5", "w", "r7"])
#[wasm_bindgen]
pub fn is_valid_set(tiles: &str) -> String {
    respond(wire::validate_set(tiles))
}

/// Validity, kind ("group"/"run") and points of a set in one call
#[wasm_bindgen]
pub fn check_set(tiles: &str) -> String {
    respond(wire::check_set(tiles))
}

#[wasm_bindgen]
pub fn calculate_set_points(tiles: &str) -> String {
    respond(wire::set_points(tiles))
}

/// `key` - "number" or "color"
#[wasm_bindgen]
pub fn sort_hand(hand: &str, key: &str) -> String {
    respond(wire::sorted_hand(hand, key))
}

/// `hand` - JSON array of tile ids
/// `board` - JSON array of sets, each a JSON array of tile ids
#[wasm_bindgen]
pub fn ai_play_turn(hand: &str, board: &str, has_meld: bool) -> String {
    respond(wire::automated_turn(hand, board, has_meld))
}

/// A game session held on the Rust side. Every method answers with the
/// JSON response envelope.
#[wasm_bindgen]
pub struct GameSession {
    game: Game,
}

#[wasm_bindgen]
impl GameSession {
    /// `config` - JSON object with optional players, hand_size, meld_threshold, seed
    #[wasm_bindgen(constructor)]
    pub fn new(config: &str) -> Result<GameSession, JsValue> {
        let config: GameConfig = serde_json::from_str(config)
            .map_err(|e| JsValue::from_str(&EngineError::InvalidJson(e.to_string()).to_string()))?;
        let game = Game::new(config).map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(GameSession { game })
    }

    pub fn view(&self) -> String {
        respond(Ok(GameView::from(&self.game)))
    }

    pub fn reset(&mut self) -> String {
        self.game.reset();
        self.view()
    }

    pub fn play_set(&mut self, tiles: &str) -> String {
        respond(wire::play_set(&mut self.game, tiles))
    }

    pub fn extend_set(&mut self, index: usize, tile: &str) -> String {
        respond(wire::extend_set(&mut self.game, index, tile))
    }

    pub fn undo(&mut self) -> String {
        respond(self.game.undo().map(|_| GameView::from(&self.game)))
    }

    pub fn end_turn(&mut self) -> String {
        respond(self.game.end_turn().map(|_| GameView::from(&self.game)))
    }

    /// Compute the active player's automated turn. Hold the result through any
    /// "thinking" delay and pass it back to `commit_ai_turn`.
    pub fn plan_ai_turn(&self) -> String {
        respond(Ok(wire::plan_turn(&self.game)))
    }

    /// Apply a planned turn; fails if the game was reset or moved on since
    pub fn commit_ai_turn(&mut self, pending: &str) -> String {
        respond(wire::commit_turn(&mut self.game, pending))
    }
}

/// Get the git commit hash that this WASM module was built from
///
/// Returns the first 8 characters of the commit hash, or "unknown" if not available
#[wasm_bindgen]
pub fn get_build_commit() -> String {
    env!("BUILD_COMMIT").to_string()
}
