//! Display ordering for a hand.

use crate::{EngineError, Tile};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

/// Primary key for [`sort_hand`]; the other attribute breaks ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Number,
    Color,
}

impl FromStr for SortKey {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "number" => Ok(SortKey::Number),
            "color" => Ok(SortKey::Color),
            _ => Err(EngineError::InvalidSortKey(s.to_string())),
        }
    }
}

/// Compare two tiles under `key`. Wildcards sort after every numbered tile and
/// compare equal to each other.
pub fn compare_tiles(a: &Tile, b: &Tile, key: SortKey) -> Ordering {
    match (a.is_wild(), b.is_wild()) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Greater,
        (false, true) => return Ordering::Less,
        (false, false) => {}
    }

    let by_number = a.number().cmp(&b.number());
    let by_color = a.color().name().cmp(b.color().name());
    match key {
        SortKey::Number => by_number.then(by_color),
        SortKey::Color => by_color.then(by_number),
    }
}

/// Return the hand reordered by `key`. The sort is stable, so identical faces
/// keep their relative order.
pub fn sort_hand(hand: &[Tile], key: SortKey) -> Vec<Tile> {
    let mut sorted = hand.to_vec();
    sorted.sort_by(|a, b| compare_tiles(a, b, key));
    sorted
}
