//! Per-square line masks plus the align/between tables used for pin and
//! check-ray detection.

use std::sync::OnceLock;

use crate::game_state::chess_types::Square;
use crate::moves::bit_utils::{line_attacks, square_bit};

/// Lines through each square, excluding the square itself.
pub const FILE_LINES: [u64; 64] = build_lines(0, 1);
pub const RANK_LINES: [u64; 64] = build_lines(1, 0);
pub const DIAGONAL_LINES: [u64; 64] = build_lines(1, 1);
pub const ANTI_DIAGONAL_LINES: [u64; 64] = build_lines(-1, 1);

struct AlignmentTables {
    align: Box<[[u64; 64]; 64]>,
    between: Box<[[u64; 64]; 64]>,
}

static TABLES: OnceLock<AlignmentTables> = OnceLock::new();

#[inline]
fn tables() -> &'static AlignmentTables {
    TABLES.get_or_init(build_alignment_tables)
}

/// Full board line through `a` and `b` (both included), or zero if the two
/// squares share no rank, file or diagonal.
#[inline]
pub fn align_mask(a: Square, b: Square) -> u64 {
    tables().align[a as usize][b as usize]
}

/// Squares strictly between `a` and `b` on their common line, or zero.
#[inline]
pub fn between_mask(a: Square, b: Square) -> u64 {
    tables().between[a as usize][b as usize]
}

fn build_alignment_tables() -> AlignmentTables {
    let mut align = Box::new([[0u64; 64]; 64]);
    let mut between = Box::new([[0u64; 64]; 64]);

    for a in 0..64u8 {
        for b in 0..64u8 {
            if a == b {
                continue;
            }
            let lines = [
                FILE_LINES[a as usize],
                RANK_LINES[a as usize],
                DIAGONAL_LINES[a as usize],
                ANTI_DIAGONAL_LINES[a as usize],
            ];
            if let Some(line) = lines.into_iter().find(|line| line & square_bit(b) != 0) {
                let full_line = line | square_bit(a);
                align[a as usize][b as usize] = full_line;
                between[a as usize][b as usize] = line_attacks(a, square_bit(b), line)
                    & line_attacks(b, square_bit(a), full_line & !square_bit(b));
            }
        }
    }

    AlignmentTables { align, between }
}

const fn build_lines(file_step: i32, rank_step: i32) -> [u64; 64] {
    let mut table = [0u64; 64];
    let mut sq = 0usize;

    while sq < 64 {
        let file = (sq % 8) as i32;
        let rank = (sq / 8) as i32;
        let mut mask = 0u64;

        let mut direction = -1;
        while direction <= 1 {
            let mut f = file + file_step * direction;
            let mut r = rank + rank_step * direction;
            while f >= 0 && f < 8 && r >= 0 && r < 8 {
                mask |= 1u64 << (r * 8 + f);
                f += file_step * direction;
                r += rank_step * direction;
            }
            direction += 2;
        }

        table[sq] = mask;
        sq += 1;
    }

    table
}
