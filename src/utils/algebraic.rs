//! Conversion between coordinate names (`e4`) and square indices.

use crate::chess_errors::{ChessError, ChessResult};
use crate::game_state::chess_types::{file_of, rank_of, square_at, Square};

pub fn algebraic_to_square(name: &str) -> ChessResult<Square> {
    let bytes = name.as_bytes();
    if bytes.len() != 2 || !(b'a'..=b'h').contains(&bytes[0]) || !(b'1'..=b'8').contains(&bytes[1]) {
        return Err(ChessError::InvalidSquareName(name.to_owned()));
    }
    Ok(square_at(bytes[0] - b'a', bytes[1] - b'1'))
}

pub fn square_to_algebraic(square: Square) -> String {
    let file = char::from(b'a' + file_of(square));
    let rank = char::from(b'1' + rank_of(square));
    format!("{file}{rank}")
}
