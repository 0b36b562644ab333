//! Bitboard primitives.
//!
//! Bit `i` of a `u64` stands for square `i` (`0 == a1`). Sliding attacks use
//! the subtraction trick `o ^ (o - 2s)` applied forwards and, via bit reversal,
//! backwards along a single line mask.

use crate::game_state::chess_types::Square;

pub const FILE_A: u64 = 0x0101_0101_0101_0101;
pub const FILE_H: u64 = FILE_A << 7;
pub const NOT_FILE_A: u64 = !FILE_A;
pub const NOT_FILE_H: u64 = !FILE_H;
pub const RANK_1: u64 = 0xFF;
pub const RANK_2: u64 = RANK_1 << 8;
pub const RANK_4: u64 = RANK_1 << 24;
pub const RANK_5: u64 = RANK_1 << 32;
pub const RANK_7: u64 = RANK_1 << 48;
pub const RANK_8: u64 = RANK_1 << 56;

pub const FILE_MASKS: [u64; 8] = build_file_masks();

#[inline]
pub const fn square_bit(square: Square) -> u64 {
    1u64 << square
}

#[inline]
pub const fn contains_square(bitboard: u64, square: Square) -> bool {
    (bitboard >> square) & 1 != 0
}

/// Remove and return the least significant set square. The board must be
/// non-empty.
#[inline]
pub fn pop_lsb(bitboard: &mut u64) -> Square {
    debug_assert!(*bitboard != 0, "pop_lsb on an empty bitboard");
    let square = bitboard.trailing_zeros() as Square;
    *bitboard &= *bitboard - 1;
    square
}

/// Iterate the set squares of a bitboard from a1 towards h8.
#[inline]
pub fn squares(mut bitboard: u64) -> impl Iterator<Item = Square> {
    std::iter::from_fn(move || {
        if bitboard == 0 {
            None
        } else {
            Some(pop_lsb(&mut bitboard))
        }
    })
}

/// Shift towards h8 for positive amounts and towards a1 for negative ones.
#[inline]
pub const fn shift(bitboard: u64, amount: i32) -> u64 {
    if amount >= 0 {
        bitboard << amount
    } else {
        bitboard >> -amount
    }
}

/// Attacks of a slider on `square` along `line` (which must exclude `square`).
#[inline]
pub const fn line_attacks(square: Square, occupancy: u64, line: u64) -> u64 {
    let s = square_bit(square);
    let o = occupancy & line;
    let forward = o.wrapping_sub(s.wrapping_mul(2));
    let reverse = o
        .reverse_bits()
        .wrapping_sub(s.reverse_bits().wrapping_mul(2))
        .reverse_bits();
    (forward ^ reverse) & line
}

const fn build_file_masks() -> [u64; 8] {
    let mut masks = [0u64; 8];
    let mut file = 0;
    while file < 8 {
        masks[file] = FILE_A << file;
        file += 1;
    }
    masks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pop_lsb_walks_squares_in_ascending_order() {
        let mut bb = square_bit(3) | square_bit(17) | square_bit(63);
        assert_eq!(pop_lsb(&mut bb), 3);
        assert_eq!(pop_lsb(&mut bb), 17);
        assert_eq!(pop_lsb(&mut bb), 63);
        assert_eq!(bb, 0);
    }

    #[test]
    fn squares_iterator_matches_popcount() {
        let bb = RANK_2 | square_bit(40);
        assert_eq!(squares(bb).count(), bb.count_ones() as usize);
        assert_eq!(squares(0).next(), None);
    }

    #[test]
    fn shift_handles_both_directions() {
        assert_eq!(shift(square_bit(12), 8), square_bit(20));
        assert_eq!(shift(square_bit(12), -8), square_bit(4));
    }

    #[test]
    fn line_attacks_stop_at_first_blocker_each_way() {
        let rank = RANK_1 & !square_bit(3);
        let occupancy = square_bit(1) | square_bit(6);
        let attacks = line_attacks(3, occupancy, rank);
        let expected = square_bit(1) | square_bit(2) | square_bit(4) | square_bit(5) | square_bit(6);
        assert_eq!(attacks, expected);
    }
}
