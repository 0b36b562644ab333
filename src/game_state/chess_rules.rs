//! Canonical chess-rule constants.
//!
//! Starting position, castling geometry and the per-square castling-rights
//! masks used for irreversible rights clearing during make-move.

use crate::game_state::chess_types::*;

/// Standard chess starting position in Forsyth-Edwards Notation (FEN).
pub const STARTING_POSITION_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Halfmove-clock value at which the fifty-move rule applies.
pub const FIFTY_MOVE_RULE_PLIES: u16 = 100;

pub const A1: Square = 0;
pub const C1: Square = 2;
pub const D1: Square = 3;
pub const E1: Square = 4;
pub const F1: Square = 5;
pub const G1: Square = 6;
pub const H1: Square = 7;
pub const A8: Square = 56;
pub const C8: Square = 58;
pub const D8: Square = 59;
pub const E8: Square = 60;
pub const F8: Square = 61;
pub const G8: Square = 62;
pub const H8: Square = 63;

/// `castling_rights & CASTLING_RIGHTS_MASK[from] & CASTLING_RIGHTS_MASK[to]`
/// clears every right whose king or rook square was touched by a move.
pub const CASTLING_RIGHTS_MASK: [CastlingRights; 64] = build_castling_rights_mask();

const fn build_castling_rights_mask() -> [CastlingRights; 64] {
    let mut table = [CASTLE_ALL; 64];
    table[A1 as usize] = CASTLE_ALL & !CASTLE_LIGHT_QUEENSIDE;
    table[H1 as usize] = CASTLE_ALL & !CASTLE_LIGHT_KINGSIDE;
    table[E1 as usize] = CASTLE_ALL & !(CASTLE_LIGHT_KINGSIDE | CASTLE_LIGHT_QUEENSIDE);
    table[A8 as usize] = CASTLE_ALL & !CASTLE_DARK_QUEENSIDE;
    table[H8 as usize] = CASTLE_ALL & !CASTLE_DARK_KINGSIDE;
    table[E8 as usize] = CASTLE_ALL & !(CASTLE_DARK_KINGSIDE | CASTLE_DARK_QUEENSIDE);
    table
}

#[inline]
pub const fn castling_rights_mask(square: Square) -> CastlingRights {
    CASTLING_RIGHTS_MASK[square as usize]
}

/// Rook (from, to) squares for a castling king move ending on `king_to`.
#[inline]
pub const fn castling_rook_squares(king_to: Square) -> (Square, Square) {
    match king_to {
        G1 => (H1, F1),
        C1 => (A1, D1),
        G8 => (H8, F8),
        _ => (A8, D8),
    }
}
