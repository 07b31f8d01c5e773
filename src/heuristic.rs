//! Heuristic estimates of the remaining distance to the goal.

use crate::{Board, Tile};

/// Number of tiles not at their goal position, ignoring the blank.
///
/// Every misplaced tile needs at least one slide, so this never overestimates
/// the true distance.
pub fn misplaced(board: &Board, goal: &Board) -> u32 {
    board
        .tiles()
        .iter()
        .zip(goal.tiles())
        .filter(|&(&tile, &target)| tile != Tile::Blank && tile != target)
        .count() as u32
}
