//! Game-result classification, usable after any move of a real game line.
//!
//! Checks are applied in a fixed order: no legal moves (checkmate or
//! stalemate), then the fifty-move rule, threefold repetition and finally
//! insufficient material.

use crate::game_state::board::Board;
use crate::game_state::chess_rules::FIFTY_MOVE_RULE_PLIES;
use crate::game_state::chess_types::*;
use crate::move_generation::legal_move_generator::{MoveGenerator, PromotionMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameResult {
    InProgress,
    Checkmate { winner: Color },
    Stalemate,
    FiftyMoveRule,
    Repetition,
    InsufficientMaterial,
}

impl GameResult {
    pub fn is_draw(self) -> bool {
        matches!(
            self,
            GameResult::Stalemate
                | GameResult::FiftyMoveRule
                | GameResult::Repetition
                | GameResult::InsufficientMaterial
        )
    }

    pub fn is_game_over(self) -> bool {
        self != GameResult::InProgress
    }
}

pub fn classify(board: &Board) -> GameResult {
    let mut generator = MoveGenerator::new(PromotionMode::All);
    let moves = generator.generate_moves(board, false);

    if moves.is_empty() {
        return if generator.in_check() {
            GameResult::Checkmate {
                winner: board.side_to_move.opposite(),
            }
        } else {
            GameResult::Stalemate
        };
    }

    if board.fifty_move_counter() >= FIFTY_MOVE_RULE_PLIES {
        return GameResult::FiftyMoveRule;
    }

    if is_threefold_repetition(board) {
        return GameResult::Repetition;
    }

    if is_insufficient_material(board) {
        return GameResult::InsufficientMaterial;
    }

    GameResult::InProgress
}

/// The current position has occurred at least three times since the last
/// irreversible move.
pub fn is_threefold_repetition(board: &Board) -> bool {
    let key = board.zobrist_key();
    board.repetition_history().iter().filter(|&&k| k == key).count() >= 3
}

/// Lone kings, a single minor piece, or one bishop each on the same square
/// color. Other theoretically drawn material is left to the other rules.
pub fn is_insufficient_material(board: &Board) -> bool {
    let heavy_or_pawns = [PieceKind::Pawn, PieceKind::Rook, PieceKind::Queen];
    for color in Color::ALL {
        if heavy_or_pawns.iter().any(|&kind| board.bitboard(color, kind) != 0) {
            return false;
        }
    }

    let light_bishops = board.piece_list(Color::Light, PieceKind::Bishop);
    let dark_bishops = board.piece_list(Color::Dark, PieceKind::Bishop);
    let minors = light_bishops.len()
        + dark_bishops.len()
        + board.piece_list(Color::Light, PieceKind::Knight).len()
        + board.piece_list(Color::Dark, PieceKind::Knight).len();

    if minors <= 1 {
        return true;
    }

    if minors == 2 && light_bishops.len() == 1 && dark_bishops.len() == 1 {
        return is_light_square(light_bishops.as_slice()[0]) == is_light_square(dark_bishops.as_slice()[0]);
    }

    false
}
