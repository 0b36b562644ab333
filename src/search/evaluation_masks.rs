//! Precomputed masks and distances used by the evaluator.

use std::sync::OnceLock;

use crate::game_state::chess_types::*;
use crate::moves::bit_utils::FILE_MASKS;

#[derive(Debug)]
struct EvaluationMasks {
    passed_pawn: [[u64; 64]; 2],
    pawn_shield: [Vec<Square>; 128],
}

static MASKS: OnceLock<EvaluationMasks> = OnceLock::new();

#[inline]
fn masks() -> &'static EvaluationMasks {
    MASKS.get_or_init(build_masks)
}

/// Files directly left and right of `file`.
pub const ADJACENT_FILE_MASKS: [u64; 8] = build_adjacent_file_masks();

/// Manhattan distance from each square to the nearest of the four centre
/// squares.
pub const CENTRE_MANHATTAN_DISTANCE: [i32; 64] = build_centre_distance();

const fn build_adjacent_file_masks() -> [u64; 8] {
    let mut out = [0u64; 8];
    let mut file = 0;
    while file < 8 {
        if file > 0 {
            out[file] |= FILE_MASKS[file - 1];
        }
        if file < 7 {
            out[file] |= FILE_MASKS[file + 1];
        }
        file += 1;
    }
    out
}

const fn build_centre_distance() -> [i32; 64] {
    let mut out = [0i32; 64];
    let mut sq = 0;
    while sq < 64 {
        let file = (sq % 8) as i32;
        let rank = (sq / 8) as i32;
        let file_dist = if file < 4 { 3 - file } else { file - 4 };
        let rank_dist = if rank < 4 { 3 - rank } else { rank - 4 };
        out[sq] = file_dist + rank_dist;
        sq += 1;
    }
    out
}

fn build_masks() -> EvaluationMasks {
    let mut passed_pawn = [[0u64; 64]; 2];
    for sq in 0..64u8 {
        let file = file_of(sq) as usize;
        let rank = rank_of(sq);
        let files = FILE_MASKS[file] | ADJACENT_FILE_MASKS[file];

        let ahead_of_light = if rank == 7 { 0 } else { u64::MAX << ((rank as u32 + 1) * 8) };
        let ahead_of_dark = if rank == 0 { 0 } else { u64::MAX >> ((8 - rank as u32) * 8) };
        passed_pawn[Color::Light.index()][sq as usize] = files & ahead_of_light;
        passed_pawn[Color::Dark.index()][sq as usize] = files & ahead_of_dark;
    }

    let pawn_shield = std::array::from_fn(|index| {
        let color = if index < 64 { Color::Light } else { Color::Dark };
        shield_squares(color, (index % 64) as Square)
    });

    EvaluationMasks {
        passed_pawn,
        pawn_shield,
    }
}

fn shield_squares(color: Color, king: Square) -> Vec<Square> {
    let file = file_of(king).clamp(1, 6) as i32;
    let rank = rank_of(king) as i32;
    let forward = color.sign();

    let mut out = Vec::with_capacity(6);
    for distance in 1..=2 {
        let shield_rank = rank + forward * distance;
        if !(0..8).contains(&shield_rank) {
            continue;
        }
        for shield_file in file - 1..=file + 1 {
            out.push(square_at(shield_file as u8, shield_rank as u8));
        }
    }
    out
}

/// Squares in front of a pawn (own and adjacent files) that must be free of
/// enemy pawns for it to count as passed.
#[inline]
pub fn passed_pawn_mask(color: Color, square: Square) -> u64 {
    masks().passed_pawn[color.index()][square as usize]
}

/// Shield squares for a king: the three squares one rank ahead, then the three
/// two ranks ahead, with the king's file clamped away from the board edge.
/// Empty or three long when the king sits near the far edge.
#[inline]
pub fn pawn_shield_squares(color: Color, king: Square) -> &'static [Square] {
    &masks().pawn_shield[color.index() * 64 + king as usize]
}

#[inline]
pub fn orthogonal_distance(a: Square, b: Square) -> i32 {
    (file_of(a) as i32 - file_of(b) as i32).abs() + (rank_of(a) as i32 - rank_of(b) as i32).abs()
}

#[inline]
pub fn adjacent_file_mask(file: u8) -> u64 {
    ADJACENT_FILE_MASKS[file as usize]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::bit_utils::square_bit;
    use crate::utils::algebraic::algebraic_to_square as sq;

    fn s(name: &str) -> Square {
        sq(name).expect("square")
    }

    #[test]
    fn passed_pawn_mask_covers_three_files_ahead() {
        let mask = passed_pawn_mask(Color::Light, s("e4"));
        assert!(mask & square_bit(s("d5")) != 0);
        assert!(mask & square_bit(s("f8")) != 0);
        assert!(mask & square_bit(s("e5")) != 0);
        assert_eq!(mask & square_bit(s("e4")), 0);
        assert_eq!(mask & square_bit(s("d4")), 0);
        assert_eq!(mask & square_bit(s("c5")), 0);
        assert_eq!(mask.count_ones(), 12);

        let edge = passed_pawn_mask(Color::Dark, s("a6"));
        assert_eq!(edge.count_ones(), 10);
        assert!(edge & square_bit(s("b1")) != 0);
        assert_eq!(edge & square_bit(s("a7")), 0);
    }

    #[test]
    fn shield_squares_are_clamped_and_ordered() {
        let shield = pawn_shield_squares(Color::Light, s("g1"));
        let expected: Vec<Square> = ["f2", "g2", "h2", "f3", "g3", "h3"].iter().map(|n| s(n)).collect();
        assert_eq!(shield, expected.as_slice());

        let dark = pawn_shield_squares(Color::Dark, s("a8"));
        let expected: Vec<Square> = ["a7", "b7", "c7", "a6", "b6", "c6"].iter().map(|n| s(n)).collect();
        assert_eq!(dark, expected.as_slice());

        assert_eq!(pawn_shield_squares(Color::Light, s("e7")).len(), 3);
        assert!(pawn_shield_squares(Color::Light, s("e8")).is_empty());
    }

    #[test]
    fn distances() {
        assert_eq!(CENTRE_MANHATTAN_DISTANCE[s("e4") as usize], 0);
        assert_eq!(CENTRE_MANHATTAN_DISTANCE[s("a1") as usize], 6);
        assert_eq!(CENTRE_MANHATTAN_DISTANCE[s("h5") as usize], 3);
        assert_eq!(orthogonal_distance(s("a1"), s("h8")), 14);
        assert_eq!(orthogonal_distance(s("e4"), s("e4")), 0);
        assert_eq!(adjacent_file_mask(0), FILE_MASKS[1]);
    }
}
