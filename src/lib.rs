use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod deck;
pub mod game;
pub mod rules;
pub mod solver;
pub mod sort;
#[cfg(target_arch = "wasm32")]
pub mod wasm_api;
pub mod wire;

pub use deck::{create_deck, create_deck_with_rng, DECK_SIZE};
pub use game::{Game, GameConfig, PendingTurn};
pub use rules::{calculate_set_points, classify_set, is_valid_set, SetKind};
pub use solver::{ai_play_turn, TurnOutcome};
pub use sort::{sort_hand, SortKey};

/// Lowest number printed on a tile.
pub const MIN_NUMBER: u8 = 1;
/// Highest number printed on a tile.
pub const MAX_NUMBER: u8 = 13;
/// Points a player must lay down in a single turn before their first meld counts.
pub const INITIAL_MELD_POINTS: u32 = 30;

/// Errors raised at the fallible edges of the engine: parsing, decoding and
/// game-state transitions. The rules themselves never fail.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("invalid tile: {0}")]
    InvalidTile(String),

    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("unknown sort key: {0}")]
    InvalidSortKey(String),

    #[error("invalid group or run")]
    InvalidSet,

    #[error("tile {0} is not in the hand")]
    TileNotInHand(Tile),

    #[error("no set at board index {0}")]
    NoSuchSet(usize),

    #[error("the pool is empty")]
    EmptyPool,

    #[error("player {0} does not exist")]
    NoSuchPlayer(usize),

    #[error("stale turn result (planned at generation {generation}, turn {turn})")]
    StaleTurn { generation: u64, turn: u64 },

    #[error("illegal turn result: {0}")]
    IllegalTurn(String),

    #[error("initial meld needs at least {required} points, got {got}")]
    MeldRequired { required: u32, got: u32 },

    #[error("board extension requires an initial meld")]
    NotMelded,

    #[error("no turn snapshot to restore")]
    NoSnapshot,

    #[error("bad game config: {0}")]
    BadConfig(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;

/// Tile colors. `Wild` is only ever carried by wildcard tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Color {
    Red = 0,
    Blue = 1,
    Orange = 2,
    Black = 3,
    Wild = 4,
}

impl Color {
    /// The four numbered colors, in the order the automated player scans them.
    pub const SUITS: [Color; 4] = [Color::Red, Color::Blue, Color::Orange, Color::Black];

    pub fn name(self) -> &'static str {
        match self {
            Color::Red => "Red",
            Color::Blue => "Blue",
            Color::Orange => "Orange",
            Color::Black => "Black",
            Color::Wild => "Wild",
        }
    }

    fn letter(self) -> char {
        match self {
            Color::Red => 'r',
            Color::Blue => 'b',
            Color::Orange => 'o',
            Color::Black => 'k',
            Color::Wild => 'w',
        }
    }

    fn from_letter(c: char) -> Option<Self> {
        match c {
            'r' => Some(Color::Red),
            'b' => Some(Color::Blue),
            'o' => Some(Color::Orange),
            'k' => Some(Color::Black),
            'w' => Some(Color::Wild),
            _ => None,
        }
    }

    fn from_bits(bits: u8) -> Self {
        match bits {
            0 => Color::Red,
            1 => Color::Blue,
            2 => Color::Orange,
            3 => Color::Black,
            _ => Color::Wild,
        }
    }
}

/// A single tile, packed into a u8.
/// - Bits 0-2: Color (0 = Red, 1 = Blue, 2 = Orange, 3 = Black, 4 = Wild)
/// - Bits 3-6: Number (1-13, 0 for wildcards)
/// - Bit 7: Copy index (every tile exists twice)
///
/// The packed value is the tile's identity: two Red 7s differ in their copy bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Tile(u8);

impl Tile {
    const COLOR_MASK: u8 = 0b0000_0111;
    const NUMBER_MASK: u8 = 0b0111_1000;
    const NUMBER_SHIFT: u8 = 3;
    const COPY_SHIFT: u8 = 7;

    /// Create the first copy of a numbered tile
    pub fn new(color: Color, number: u8) -> Self {
        assert!(color != Color::Wild, "Use Tile::wild() for wildcards");
        assert!(
            (MIN_NUMBER..=MAX_NUMBER).contains(&number),
            "Number must be 1-13"
        );
        Tile((number << Self::NUMBER_SHIFT) | color as u8)
    }

    /// Create the first wildcard
    pub fn wild() -> Self {
        Tile(Color::Wild as u8)
    }

    /// Same tile face, copy `copy` (0 or 1)
    pub fn with_copy(self, copy: u8) -> Self {
        assert!(copy < 2, "Copy must be 0 or 1");
        Tile((self.0 & !(1 << Self::COPY_SHIFT)) | (copy << Self::COPY_SHIFT))
    }

    pub fn color(&self) -> Color {
        Color::from_bits(self.0 & Self::COLOR_MASK)
    }

    /// Get the number (1-13), or None for wild
    pub fn number(&self) -> Option<u8> {
        if self.is_wild() {
            None
        } else {
            Some((self.0 & Self::NUMBER_MASK) >> Self::NUMBER_SHIFT)
        }
    }

    pub fn is_wild(&self) -> bool {
        self.0 & Self::COLOR_MASK == Color::Wild as u8
    }

    pub fn copy_index(&self) -> u8 {
        self.0 >> Self::COPY_SHIFT
    }

    /// Stable identity string, e.g. "r7a" or "wb"
    pub fn id(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let copy = (b'a' + self.copy_index()) as char;
        match self.number() {
            Some(n) => write!(f, "{}{}{}", self.color().letter(), n, copy),
            None => write!(f, "w{}", copy),
        }
    }
}

/// Parse a tile from its identity string.
/// Format: "r13b" (red 13, second copy), "o7" (orange 7, first copy), "wb" (second wild).
/// The trailing copy letter is optional and defaults to "a".
impl FromStr for Tile {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || EngineError::InvalidTile(s.to_string());

        let mut chars = s.chars();
        let color = chars.next().and_then(Color::from_letter).ok_or_else(invalid)?;
        let rest = chars.as_str();

        let (body, copy) = match rest.chars().last() {
            Some('a') => (&rest[..rest.len() - 1], 0),
            Some('b') => (&rest[..rest.len() - 1], 1),
            _ => (rest, 0),
        };

        if color == Color::Wild {
            if !body.is_empty() {
                return Err(invalid());
            }
            return Ok(Tile::wild().with_copy(copy));
        }

        let number: u8 = body.parse().map_err(|_| invalid())?;
        if !(MIN_NUMBER..=MAX_NUMBER).contains(&number) {
            return Err(invalid());
        }

        Ok(Tile::new(color, number).with_copy(copy))
    }
}

impl From<Tile> for String {
    fn from(tile: Tile) -> Self {
        tile.to_string()
    }
}

impl TryFrom<String> for Tile {
    type Error = EngineError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

/// One meld on the board. Tiles stay in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TileSet {
    tiles: Vec<Tile>,
}

impl TileSet {
    pub fn new(tiles: Vec<Tile>) -> Self {
        TileSet { tiles }
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn push(&mut self, tile: Tile) {
        self.tiles.push(tile);
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn is_valid(&self) -> bool {
        is_valid_set(&self.tiles)
    }

    /// Point value; only meaningful for a valid set
    pub fn points(&self) -> u32 {
        calculate_set_points(&self.tiles)
    }

    /// Copy of this set with `tile` appended
    pub fn with(&self, tile: Tile) -> TileSet {
        let mut tiles = self.tiles.clone();
        tiles.push(tile);
        TileSet { tiles }
    }
}

impl From<Vec<Tile>> for TileSet {
    fn from(tiles: Vec<Tile>) -> Self {
        TileSet::new(tiles)
    }
}

/// A player's hand, in the order tiles were received
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hand(Vec<Tile>);

impl Hand {
    pub fn new() -> Self {
        Hand(Vec::new())
    }

    pub fn add(&mut self, tile: Tile) {
        self.0.push(tile);
    }

    /// Remove a tile by identity
    pub fn remove(&mut self, tile: &Tile) -> bool {
        match self.0.iter().position(|t| t == tile) {
            Some(idx) => {
                self.0.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Remove every tile in `tiles`, or none of them if any is missing
    pub fn take(&mut self, tiles: &[Tile]) -> Result<()> {
        let mut remaining = self.0.clone();
        for tile in tiles {
            let idx = remaining
                .iter()
                .position(|t| t == tile)
                .ok_or(EngineError::TileNotInHand(*tile))?;
            remaining.remove(idx);
        }
        self.0 = remaining;
        Ok(())
    }

    pub fn contains(&self, tile: &Tile) -> bool {
        self.0.contains(tile)
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tile> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Face value left in the hand; wildcards count as zero
    pub fn points(&self) -> u32 {
        self.0
            .iter()
            .filter_map(|t| t.number())
            .map(u32::from)
            .sum()
    }

}

impl From<Vec<Tile>> for Hand {
    fn from(tiles: Vec<Tile>) -> Self {
        Hand(tiles)
    }
}

/// All sets currently laid down
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board(Vec<TileSet>);

impl Board {
    pub fn new() -> Self {
        Board(Vec::new())
    }

    pub fn add_set(&mut self, set: TileSet) {
        self.0.push(set);
    }

    pub fn sets(&self) -> &[TileSet] {
        &self.0
    }

    /// Append `tile` to the set at `index` if the whole augmented set is still valid
    pub fn try_extend(&mut self, index: usize, tile: Tile) -> Result<()> {
        let set = self.0.get_mut(index).ok_or(EngineError::NoSuchSet(index))?;
        if !is_valid_set(set.with(tile).tiles()) {
            return Err(EngineError::InvalidSet);
        }
        set.push(tile);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn tile_count(&self) -> usize {
        self.0.iter().map(TileSet::len).sum()
    }
}

impl From<Vec<TileSet>> for Board {
    fn from(sets: Vec<TileSet>) -> Self {
        Board(sets)
    }
}
