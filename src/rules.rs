//! Set validation and scoring.
//!
//! A set is legal when it is a group (one number, distinct colors, at most 4
//! tiles) or a run (one color, consecutive numbers, at most 13 tiles).
//! Wildcards stand in for whatever tile the set is missing.

use crate::{Tile, MAX_NUMBER, MIN_NUMBER};
use std::collections::HashSet;

/// Smallest legal set.
pub const MIN_SET_LEN: usize = 3;
/// Largest legal group: one tile per color.
pub const MAX_GROUP_LEN: usize = 4;
/// Largest legal run: every number of one color.
pub const MAX_RUN_LEN: usize = MAX_NUMBER as usize;

/// Type of a legal set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetKind {
    /// Same number, different colors
    Group,
    /// Consecutive numbers, same color
    Run,
}

/// Split a set into its numbered tiles, dropping wildcards
fn numbered(tiles: &[Tile]) -> Vec<Tile> {
    tiles.iter().copied().filter(|t| !t.is_wild()).collect()
}

/// Numbers of the numbered tiles, in set order
fn numbers(tiles: &[Tile]) -> Vec<u8> {
    tiles.iter().filter_map(|t| t.number()).collect()
}

fn is_group(size: usize, numbered: &[Tile]) -> bool {
    if size > MAX_GROUP_LEN {
        return false;
    }

    let Some(first) = numbered.first().and_then(|t| t.number()) else {
        return false;
    };
    if numbered.iter().any(|t| t.number() != Some(first)) {
        return false;
    }

    let mut colors = HashSet::new();
    numbered.iter().all(|t| colors.insert(t.color()))
}

fn is_run(size: usize, numbered: &[Tile]) -> bool {
    if size > MAX_RUN_LEN {
        return false;
    }

    let Some(color) = numbered.first().map(|t| t.color()) else {
        return false;
    };
    if numbered.iter().any(|t| t.color() != color) {
        return false;
    }

    let mut nums = numbers(numbered);
    nums.sort_unstable();
    if nums.windows(2).any(|w| w[0] == w[1]) {
        return false;
    }

    let (min, max) = match (nums.first(), nums.last()) {
        (Some(&min), Some(&max)) => (i32::from(min), i32::from(max)),
        _ => return false,
    };
    let size = size as i32;

    // Gaps wider than the wildcards can fill
    if max - min + 1 > size {
        return false;
    }

    // The run's first number must keep all `size` numbers inside [1, 13]
    // while still covering [min, max].
    let lowest_start = (max - size + 1).max(i32::from(MIN_NUMBER));
    let highest_start = (i32::from(MAX_NUMBER) - size + 1).min(min);
    lowest_start <= highest_start
}

/// Check whether `tiles` form a legal group or run.
pub fn is_valid_set(tiles: &[Tile]) -> bool {
    if tiles.len() < MIN_SET_LEN {
        return false;
    }

    let numbered = numbered(tiles);
    if numbered.is_empty() {
        // All wildcards: could still become a group
        return tiles.len() <= MAX_GROUP_LEN;
    }

    is_group(tiles.len(), &numbered) || is_run(tiles.len(), &numbered)
}

/// Classify a set, preferring `Group` when both readings are legal.
/// Returns None for an illegal set.
pub fn classify_set(tiles: &[Tile]) -> Option<SetKind> {
    if !is_valid_set(tiles) {
        return None;
    }

    let numbered = numbered(tiles);
    if numbered.is_empty() || is_group(tiles.len(), &numbered) {
        Some(SetKind::Group)
    } else {
        Some(SetKind::Run)
    }
}

/// Point value of a set already known to be valid.
///
/// Groups score number × size. In a run, wildcards first fill internal gaps;
/// any left over extend the run below its lowest tile (never below 1), and the
/// score is the sum of the resulting consecutive numbers. The result for an
/// invalid set is unspecified.
pub fn calculate_set_points(tiles: &[Tile]) -> u32 {
    let numbered = numbered(tiles);
    if numbered.is_empty() {
        return 0;
    }

    let size = tiles.len() as u32;
    let mut nums = numbers(&numbered);

    let first = nums[0];
    if tiles.len() <= MAX_GROUP_LEN && nums.iter().all(|&n| n == first) {
        return u32::from(first) * size;
    }

    nums.sort_unstable();
    let internal_gaps: u32 = nums
        .windows(2)
        .map(|w| u32::from(w[1].saturating_sub(w[0]).saturating_sub(1)))
        .sum();

    let lowest = u32::from(nums[0]);
    let spare_wilds = size
        .saturating_sub(nums.len() as u32)
        .saturating_sub(internal_gaps);
    let left_push = spare_wilds.min(lowest - 1);
    let start = lowest - left_push;

    // Sum of `size` consecutive numbers from `start`
    size * (2 * start + size - 1) / 2
}
