//! UCI long algebraic move strings (`e2e4`, `e7e8q`).
//!
//! Parsing resolves the string against the full legal move list of the
//! position, so flags (castle, en passant, double push) come from the board
//! and anything illegal or under-specified is rejected.

use crate::chess_errors::{ChessError, ChessResult};
use crate::game_state::board::Board;
use crate::game_state::chess_types::PieceKind;
use crate::move_generation::legal_move_generator::{MoveGenerator, PromotionMode};
use crate::moves::move_descriptions::Move;
use crate::utils::algebraic::{algebraic_to_square, square_to_algebraic};

pub fn move_to_uci(mv: Move) -> String {
    let mut out = square_to_algebraic(mv.from());
    out.push_str(&square_to_algebraic(mv.to()));
    if let Some(kind) = mv.promotion_kind() {
        out.push(kind.fen_char());
    }
    out
}

pub fn uci_to_move(board: &Board, text: &str) -> ChessResult<Move> {
    let malformed = || ChessError::MalformedUciMove(text.to_owned());
    if !text.is_ascii() || (text.len() != 4 && text.len() != 5) {
        return Err(malformed());
    }

    let from = algebraic_to_square(&text[0..2]).map_err(|_| malformed())?;
    let to = algebraic_to_square(&text[2..4]).map_err(|_| malformed())?;
    let promotion = match text[4..].chars().next() {
        None => None,
        Some(ch) => match PieceKind::from_fen_char(ch) {
            Some(kind @ (PieceKind::Queen | PieceKind::Rook | PieceKind::Bishop | PieceKind::Knight))
                if ch.is_ascii_lowercase() =>
            {
                Some(kind)
            }
            _ => return Err(malformed()),
        },
    };

    let mut generator = MoveGenerator::new(PromotionMode::All);
    generator
        .generate_moves(board, false)
        .into_iter()
        .find(|mv| mv.from() == from && mv.to() == to && mv.promotion_kind() == promotion)
        .ok_or_else(|| ChessError::IllegalUciMove(text.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::move_descriptions::MoveFlag;

    #[test]
    fn flags_are_resolved_from_the_position() {
        let board = Board::new_game();
        let mv = uci_to_move(&board, "e2e4").expect("double push");
        assert_eq!(mv.flag(), MoveFlag::DoublePawnPush);
        assert_eq!(move_to_uci(mv), "e2e4");
        assert_eq!(uci_to_move(&board, "g1f3").map(|m| m.flag()), Ok(MoveFlag::Quiet));
    }

    #[test]
    fn promotion_suffix_is_required_exactly_when_promoting() {
        let board = Board::from_fen("4k3/P7/8/8/8/8/8/4K3 w - - 0 1").expect("fen");
        let mv = uci_to_move(&board, "a7a8r").expect("promotion");
        assert_eq!(mv.flag(), MoveFlag::PromoteRook);
        assert_eq!(move_to_uci(mv), "a7a8r");
        assert_eq!(
            uci_to_move(&board, "a7a8"),
            Err(ChessError::IllegalUciMove("a7a8".to_owned()))
        );
        assert_eq!(
            uci_to_move(&board, "e1e2q"),
            Err(ChessError::IllegalUciMove("e1e2q".to_owned()))
        );
    }

    #[test]
    fn malformed_and_illegal_strings_are_rejected() {
        let board = Board::new_game();
        for bad in ["", "e2", "e2e9", "e2e4x", "e7e8K", "e2e4qq", "é2e4"] {
            assert_eq!(
                uci_to_move(&board, bad),
                Err(ChessError::MalformedUciMove(bad.to_owned())),
                "{bad}"
            );
        }
        assert_eq!(
            uci_to_move(&board, "e2e5"),
            Err(ChessError::IllegalUciMove("e2e5".to_owned()))
        );
        assert_eq!(
            uci_to_move(&board, "e7e5"),
            Err(ChessError::IllegalUciMove("e7e5".to_owned()))
        );
    }
}
