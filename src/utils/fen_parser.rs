//! FEN-to-Board parser.
//!
//! Parses into a scratch board and only hands it back once every field has
//! validated, so callers never see a half-loaded position. The halfmove clock
//! and fullmove number may be omitted and default to `0` and `1`.
//!
//! Castling rights and the en passant square are checked against the pieces
//! on the board, since move generation and make-move trust both.

use crate::chess_errors::{ChessError, ChessResult};
use crate::game_state::board::Board;
use crate::game_state::chess_rules::{A1, A8, E1, E8, H1, H8};
use crate::game_state::chess_types::*;
use crate::game_state::piece_list::MAX_PIECES;
use crate::utils::algebraic::algebraic_to_square;

pub fn parse_fen(fen: &str) -> ChessResult<Board> {
    let parts: Vec<&str> = fen.split_whitespace().collect();
    if parts.len() > 6 {
        return Err(ChessError::TooManyFenFields(parts.len()));
    }

    let field = |index: usize, name: &'static str| parts.get(index).copied().ok_or(ChessError::MissingFenField(name));
    let board_part = field(0, "board")?;
    let side_part = field(1, "side-to-move")?;
    let castling_part = field(2, "castling")?;
    let en_passant_part = field(3, "en-passant")?;
    let halfmove_part = parts.get(4).copied().unwrap_or("0");
    let fullmove_part = parts.get(5).copied().unwrap_or("1");

    let mut board = Board::empty();
    parse_board(board_part, &mut board)?;
    board.side_to_move = parse_side_to_move(side_part)?;
    board.state.castling_rights = parse_castling_rights(castling_part, &board)?;
    board.state.en_passant_file = parse_en_passant_file(en_passant_part, &board)?;
    board.state.fifty_move_counter = halfmove_part.parse::<u16>().map_err(|_| ChessError::InvalidFenField {
        field: "halfmove",
        value: halfmove_part.to_owned(),
    })?;
    let fullmove_number = fullmove_part
        .parse::<u32>()
        .ok()
        .filter(|n| *n >= 1)
        .ok_or_else(|| ChessError::InvalidFenField {
            field: "fullmove",
            value: fullmove_part.to_owned(),
        })?;

    let ply_count = (fullmove_number - 1) * 2 + u32::from(board.side_to_move == Color::Dark);
    board.finish_setup(fen.trim().to_owned(), ply_count);
    Ok(board)
}

fn parse_board(board_part: &str, board: &mut Board) -> ChessResult<()> {
    let ranks: Vec<&str> = board_part.split('/').collect();
    if ranks.len() != 8 {
        return Err(ChessError::InvalidFenBoard(format!(
            "expected 8 ranks, found {}",
            ranks.len()
        )));
    }

    let mut king_counts = [0u8; 2];
    for (fen_rank_idx, rank_str) in ranks.iter().enumerate() {
        let rank = 7 - fen_rank_idx as u8;
        let mut file = 0u8;

        for ch in rank_str.chars() {
            if let Some(empty_count) = ch.to_digit(10) {
                if !(1..=8).contains(&empty_count) {
                    return Err(ChessError::InvalidFenBoard(format!("invalid empty-square count '{ch}'")));
                }
                file += empty_count as u8;
                if file > 8 {
                    return Err(ChessError::InvalidFenBoard(format!("rank {} has more than 8 files", rank + 1)));
                }
                continue;
            }

            let piece = Piece::from_fen_char(ch)
                .ok_or_else(|| ChessError::InvalidFenBoard(format!("invalid piece character '{ch}'")))?;
            if file >= 8 {
                return Err(ChessError::InvalidFenBoard(format!("rank {} has more than 8 files", rank + 1)));
            }
            if piece.kind == PieceKind::Pawn && (rank == 0 || rank == 7) {
                return Err(ChessError::InvalidFenBoard(format!("pawn on back rank {}", rank + 1)));
            }
            if piece.kind == PieceKind::King {
                king_counts[piece.color.index()] += 1;
            }
            let limit = if piece.kind == PieceKind::Pawn { 8 } else { MAX_PIECES };
            if board.piece_list(piece.color, piece.kind).len() >= limit {
                return Err(ChessError::InvalidFenBoard(format!(
                    "too many {:?} {:?} pieces",
                    piece.color, piece.kind
                )));
            }

            board.place_piece(piece, square_at(file, rank));
            file += 1;
        }

        if file != 8 {
            return Err(ChessError::InvalidFenBoard(format!("rank {} does not sum to 8 files", rank + 1)));
        }
    }

    if king_counts != [1, 1] {
        return Err(ChessError::InvalidFenBoard(format!(
            "expected one king per side, found {} light and {} dark",
            king_counts[0], king_counts[1]
        )));
    }

    Ok(())
}

fn parse_side_to_move(side_part: &str) -> ChessResult<Color> {
    match side_part {
        "w" => Ok(Color::Light),
        "b" => Ok(Color::Dark),
        _ => Err(ChessError::InvalidFenField {
            field: "side-to-move",
            value: side_part.to_owned(),
        }),
    }
}

/// Every right needs its king and rook on their original squares.
fn parse_castling_rights(castling_part: &str, board: &Board) -> ChessResult<CastlingRights> {
    if castling_part == "-" {
        return Ok(0);
    }

    let invalid = || ChessError::InvalidFenField {
        field: "castling",
        value: castling_part.to_owned(),
    };
    let mut rights: CastlingRights = 0;
    for ch in castling_part.chars() {
        let (bit, color, king_square, rook_square) = match ch {
            'K' => (CASTLE_LIGHT_KINGSIDE, Color::Light, E1, H1),
            'Q' => (CASTLE_LIGHT_QUEENSIDE, Color::Light, E1, A1),
            'k' => (CASTLE_DARK_KINGSIDE, Color::Dark, E8, H8),
            'q' => (CASTLE_DARK_QUEENSIDE, Color::Dark, E8, A8),
            _ => return Err(invalid()),
        };
        if board.piece_at(king_square) != Some(Piece::new(color, PieceKind::King))
            || board.piece_at(rook_square) != Some(Piece::new(color, PieceKind::Rook))
        {
            return Err(invalid());
        }
        rights |= bit;
    }

    Ok(rights)
}

/// The en passant square must sit behind a pawn that could just have
/// double-pushed: rank 6 with light to move, rank 3 with dark to move. The
/// pushed pawn must be there and the squares it crossed must be empty.
fn parse_en_passant_file(en_passant_part: &str, board: &Board) -> ChessResult<Option<u8>> {
    if en_passant_part == "-" {
        return Ok(None);
    }

    let invalid = || ChessError::InvalidFenField {
        field: "en-passant",
        value: en_passant_part.to_owned(),
    };
    let square = algebraic_to_square(en_passant_part).map_err(|_| invalid())?;
    let (expected_rank, victim, origin) = match board.side_to_move {
        Color::Light => (5, square.wrapping_sub(8), square.wrapping_add(8)),
        Color::Dark => (2, square.wrapping_add(8), square.wrapping_sub(8)),
    };
    if rank_of(square) != expected_rank {
        return Err(invalid());
    }
    let pushed_pawn = Piece::new(board.side_to_move.opposite(), PieceKind::Pawn);
    if board.piece_at(victim) != Some(pushed_pawn)
        || board.piece_at(square).is_some()
        || board.piece_at(origin).is_some()
    {
        return Err(invalid());
    }
    Ok(Some(file_of(square)))
}

#[cfg(test)]
mod tests {
    use super::parse_fen;
    use crate::chess_errors::ChessError;
    use crate::game_state::chess_rules::STARTING_POSITION_FEN;
    use crate::game_state::chess_types::*;

    #[test]
    fn starting_fen_matches_the_built_in_start_position() {
        let parsed = parse_fen(STARTING_POSITION_FEN).expect("starting FEN should parse");
        let built = crate::game_state::board::Board::new_game();
        assert_eq!(parsed.side_to_move, Color::Light);
        assert_eq!(parsed.fullmove_number(), 1);
        assert_eq!(parsed.fifty_move_counter(), 0);
        assert_eq!(parsed.state.castling_rights, CASTLE_ALL);
        assert_eq!(parsed.zobrist_key(), built.zobrist_key());
        assert_eq!(parsed.pieces, built.pieces);
    }

    #[test]
    fn clocks_are_optional() {
        let board = parse_fen("4k3/8/8/8/8/8/8/4K3 b - -").expect("four-field FEN");
        assert_eq!(board.fifty_move_counter(), 0);
        assert_eq!(board.fullmove_number(), 1);
        assert_eq!(board.ply_count(), 1);
    }

    #[test]
    fn en_passant_square_sets_the_file() {
        let board = parse_fen("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 2").expect("fen");
        assert_eq!(board.state.en_passant_file, Some(3));
    }

    #[test]
    fn malformed_fields_fail_fast_with_the_field_named() {
        assert_eq!(parse_fen("").err(), Some(ChessError::MissingFenField("board")));
        assert_eq!(
            parse_fen("4k3/8/8/8/8/8/8/4K3 w").err(),
            Some(ChessError::MissingFenField("castling"))
        );
        assert_eq!(
            parse_fen("4k3/8/8/8/8/8/8/4K3 x - - 0 1").err(),
            Some(ChessError::InvalidFenField {
                field: "side-to-move",
                value: "x".to_owned()
            })
        );
        assert!(matches!(
            parse_fen("4k3/8/8/8/8/8/8/4K3 w KX - 0 1"),
            Err(ChessError::InvalidFenField { field: "castling", .. })
        ));
        assert!(matches!(
            parse_fen("4k3/8/8/8/8/8/8/4K3 w - e4 0 1"),
            Err(ChessError::InvalidFenField { field: "en-passant", .. })
        ));
        assert!(matches!(
            parse_fen("4k3/8/8/8/8/8/8/4K3 w - - x 1"),
            Err(ChessError::InvalidFenField { field: "halfmove", .. })
        ));
        assert!(matches!(
            parse_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 0"),
            Err(ChessError::InvalidFenField { field: "fullmove", .. })
        ));
        assert_eq!(
            parse_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 1 extra").err(),
            Some(ChessError::TooManyFenFields(7))
        );
    }

    #[test]
    fn en_passant_square_needs_the_pushed_pawn_behind_it() {
        for bad in [
            "4k3/8/8/4P3/8/8/8/4K3 w - d6 0 1",
            "4k3/3n4/8/3pP3/8/8/8/4K3 w - d6 0 1",
            "4k3/8/3n4/3pP3/8/8/8/4K3 w - d6 0 1",
            "4k3/8/8/8/3p4/8/8/4K3 b - d3 0 1",
        ] {
            assert!(
                matches!(parse_fen(bad), Err(ChessError::InvalidFenField { field: "en-passant", .. })),
                "expected en-passant error for {bad}"
            );
        }
        let board = parse_fen("4k3/8/8/8/3Pp3/8/8/4K3 b - d3 0 1").expect("fen");
        assert_eq!(board.state.en_passant_file, Some(3));
    }

    #[test]
    fn castling_rights_need_king_and_rook_at_home() {
        for bad in [
            "4k3/8/8/8/8/8/8/3K3R w K - 0 1",
            "4k3/8/8/8/8/8/8/4K2R w Q - 0 1",
            "r3k3/8/8/8/8/8/8/4K3 w k - 0 1",
            "4k3/8/8/8/8/8/8/4K2r w K - 0 1",
        ] {
            assert!(
                matches!(parse_fen(bad), Err(ChessError::InvalidFenField { field: "castling", .. })),
                "expected castling error for {bad}"
            );
        }
        let board = parse_fen("r3k3/8/8/8/8/8/8/4K2R w Kq - 0 1").expect("fen");
        assert_eq!(board.state.castling_rights, CASTLE_LIGHT_KINGSIDE | CASTLE_DARK_QUEENSIDE);
    }

    #[test]
    fn piece_counts_beyond_a_full_side_are_rejected() {
        assert!(matches!(
            parse_fen("QQQQQQQQ/QQQQQQQQ/Q7/8/8/8/8/k6K w - - 0 1"),
            Err(ChessError::InvalidFenBoard(_))
        ));
        assert!(matches!(
            parse_fen("4k3/8/8/8/8/p7/pppppppp/4K3 w - - 0 1"),
            Err(ChessError::InvalidFenBoard(_))
        ));
    }

    #[test]
    fn malformed_boards_are_rejected() {
        for bad in [
            "4k3/8/8/8/8/8/4K3 w - - 0 1",
            "4k3/8/8/8/8/8/8/4K4 w - - 0 1",
            "4k3/8/8/8/8/8/8/4X3 w - - 0 1",
            "8/8/8/8/8/8/8/4K3 w - - 0 1",
            "4k3/8/8/8/8/8/8/3KK3 w - - 0 1",
            "P3k3/8/8/8/8/8/8/4K3 w - - 0 1",
            "4k3/8/8/8/8/8/8/4K3/8 w - - 0 1",
        ] {
            assert!(
                matches!(parse_fen(bad), Err(ChessError::InvalidFenBoard(_))),
                "expected board error for {bad}"
            );
        }
    }
}
