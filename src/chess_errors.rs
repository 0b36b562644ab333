//! Errors used throughout the chess engine.
//!
//! `ChessError` is the single error type returned by position loading, move
//! string parsing and the background search handle. Move generation, make /
//! unmake and the search itself never fail for a structurally valid board.
//!
//! Usage guidelines:
//! - Parsing functions return `ChessResult<T>` and fail fast; a half-loaded
//!   board is never handed back to the caller.
//! - Moving a piece from an empty square is a programmer error and panics
//!   instead of surfacing here.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChessError {
    #[error("FEN is missing the {0} field")]
    MissingFenField(&'static str),

    #[error("FEN has {0} fields, expected at most 6")]
    TooManyFenFields(usize),

    #[error("invalid FEN {field} field: '{value}'")]
    InvalidFenField { field: &'static str, value: String },

    #[error("invalid FEN board: {0}")]
    InvalidFenBoard(String),

    #[error("invalid square name: '{0}'")]
    InvalidSquareName(String),

    #[error("malformed UCI move: '{0}'")]
    MalformedUciMove(String),

    #[error("UCI move '{0}' does not name a legal move in this position")]
    IllegalUciMove(String),

    #[error("malformed UCI command: '{0}'")]
    MalformedUciCommand(String),

    #[error("search worker stopped without reporting a result")]
    SearchWorkerLost,
}

pub type ChessResult<T> = Result<T, ChessError>;
