//! Building and shuffling the full tile population.

use crate::{Color, Tile, MAX_NUMBER, MIN_NUMBER};
use rand::Rng;

/// 2 copies × 4 colors × 13 numbers, plus 2 wildcards.
pub const DECK_SIZE: usize = 106;

/// Every tile in the game, unshuffled: copy 0 of each color/number, then copy 1,
/// then both wildcards.
pub fn full_tile_set() -> Vec<Tile> {
    let mut tiles = Vec::with_capacity(DECK_SIZE);
    for copy in 0..2 {
        for color in Color::SUITS {
            for number in MIN_NUMBER..=MAX_NUMBER {
                tiles.push(Tile::new(color, number).with_copy(copy));
            }
        }
    }
    tiles.push(Tile::wild());
    tiles.push(Tile::wild().with_copy(1));
    tiles
}

/// A freshly shuffled deck drawn from the thread-local entropy source.
pub fn create_deck() -> Vec<Tile> {
    create_deck_with_rng(&mut rand::thread_rng())
}

/// A shuffled deck; deterministic for a seeded `rng`.
pub fn create_deck_with_rng<R: Rng + ?Sized>(rng: &mut R) -> Vec<Tile> {
    let mut tiles = full_tile_set();
    shuffle(&mut tiles, rng);
    log::trace!("shuffled deck of {} tiles", tiles.len());
    tiles
}

/// Fisher-Yates: walk from the last index down to 1, swapping each slot with a
/// uniformly chosen index in [0, i].
pub fn shuffle<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.gen_range(0..=i);
        items.swap(i, j);
    }
}
