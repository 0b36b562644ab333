//! Occupancy-aware rook, bishop and queen attacks built on per-square line
//! masks.

use crate::game_state::chess_types::Square;
use crate::moves::bit_utils::line_attacks;
use crate::moves::ray_masks::{ANTI_DIAGONAL_LINES, DIAGONAL_LINES, FILE_LINES, RANK_LINES};

#[inline]
pub fn rook_attacks(square: Square, occupancy: u64) -> u64 {
    let sq = square as usize;
    line_attacks(square, occupancy, FILE_LINES[sq]) | line_attacks(square, occupancy, RANK_LINES[sq])
}

#[inline]
pub fn bishop_attacks(square: Square, occupancy: u64) -> u64 {
    let sq = square as usize;
    line_attacks(square, occupancy, DIAGONAL_LINES[sq])
        | line_attacks(square, occupancy, ANTI_DIAGONAL_LINES[sq])
}

#[inline]
pub fn queen_attacks(square: Square, occupancy: u64) -> u64 {
    rook_attacks(square, occupancy) | bishop_attacks(square, occupancy)
}
