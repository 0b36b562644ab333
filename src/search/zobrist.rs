//! Zobrist keys for board positions: the board updates its key incrementally,
//! and the transposition and repetition tables compare keys.
//!
//! The keys are drawn from a `StdRng` with a fixed seed so hashes are
//! deterministic across runs, which keeps search results reproducible.

use std::sync::OnceLock;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::game_state::{board::Board, chess_types::*};
use crate::moves::bit_utils::squares;

const ZOBRIST_SEED: u64 = 0x2961_0F3B_C0DA_5EED;

#[derive(Debug)]
struct ZobristTables {
    piece_square: [[[u64; 64]; 6]; 2],
    side_to_move: u64,
    castling: [u64; 16],
    en_passant_file: [u64; 8],
}

static TABLES: OnceLock<ZobristTables> = OnceLock::new();

#[inline]
fn tables() -> &'static ZobristTables {
    TABLES.get_or_init(build_tables)
}

fn build_tables() -> ZobristTables {
    let mut rng = StdRng::seed_from_u64(ZOBRIST_SEED);

    let mut piece_square = [[[0u64; 64]; 6]; 2];
    for color in &mut piece_square {
        for piece in color {
            for sq in piece {
                *sq = rng.random();
            }
        }
    }

    let side_to_move = rng.random();

    // Index 0 (no rights) is zero so positions without castling rights hash
    // the same whether or not the field was ever touched.
    let mut castling = [0u64; 16];
    for key in castling.iter_mut().skip(1) {
        *key = rng.random();
    }

    let mut en_passant_file = [0u64; 8];
    for key in &mut en_passant_file {
        *key = rng.random();
    }

    ZobristTables {
        piece_square,
        side_to_move,
        castling,
        en_passant_file,
    }
}

#[inline]
pub fn piece_square_key(piece: Piece, square: Square) -> u64 {
    tables().piece_square[piece.color.index()][piece.kind.index()][square as usize]
}

/// Key contribution for a castling rights mask (`0..=15`).
#[inline]
pub fn castling_key(castling_rights: CastlingRights) -> u64 {
    tables().castling[(castling_rights & 0x0F) as usize]
}

#[inline]
pub fn en_passant_file_key(file: u8) -> u64 {
    tables().en_passant_file[file as usize]
}

/// Side-to-move toggle (xored in when dark is to move).
#[inline]
pub fn side_to_move_key() -> u64 {
    tables().side_to_move
}

/// Full key computed from scratch. Only used when loading a position; every
/// other key update is incremental.
pub fn compute_zobrist_key(board: &Board) -> u64 {
    let mut key = 0u64;

    for color in Color::ALL {
        for kind in PieceKind::ALL {
            let piece = Piece::new(color, kind);
            for sq in squares(board.pieces[color.index()][kind.index()]) {
                key ^= piece_square_key(piece, sq);
            }
        }
    }

    if board.side_to_move == Color::Dark {
        key ^= side_to_move_key();
    }

    key ^= castling_key(board.state.castling_rights);

    if let Some(file) = board.state.en_passant_file {
        key ^= en_passant_file_key(file);
    }

    key
}
