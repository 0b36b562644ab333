//! Terminal-oriented Unicode board renderer for debugging and the UCI `d`
//! command.

use crate::game_state::{board::Board, chess_types::*};

/// Render the board with rank 8 at the top.
pub fn render_board(board: &Board) -> String {
    let mut out = String::new();
    out.push_str("  a b c d e f g h\n");

    for rank in (0..8u8).rev() {
        let rank_char = char::from(b'1' + rank);
        out.push(rank_char);
        out.push(' ');

        for file in 0..8u8 {
            let glyph = board.piece_at(square_at(file, rank)).map_or('·', piece_to_unicode);
            out.push(glyph);
            if file < 7 {
                out.push(' ');
            }
        }

        out.push(' ');
        out.push(rank_char);
        out.push('\n');
    }

    out.push_str("  a b c d e f g h");
    out
}

fn piece_to_unicode(piece: Piece) -> char {
    match (piece.color, piece.kind) {
        (Color::Light, PieceKind::King) => '♔',
        (Color::Light, PieceKind::Queen) => '♕',
        (Color::Light, PieceKind::Rook) => '♖',
        (Color::Light, PieceKind::Bishop) => '♗',
        (Color::Light, PieceKind::Knight) => '♘',
        (Color::Light, PieceKind::Pawn) => '♙',
        (Color::Dark, PieceKind::King) => '♚',
        (Color::Dark, PieceKind::Queen) => '♛',
        (Color::Dark, PieceKind::Rook) => '♜',
        (Color::Dark, PieceKind::Bishop) => '♝',
        (Color::Dark, PieceKind::Knight) => '♞',
        (Color::Dark, PieceKind::Pawn) => '♟',
    }
}

#[cfg(test)]
mod tests {
    use super::render_board;
    use crate::game_state::board::Board;

    #[test]
    fn start_position_renders_back_ranks_in_place() {
        let text = render_board(&Board::new_game());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 10);
        assert_eq!(lines[1], "8 ♜ ♞ ♝ ♛ ♚ ♝ ♞ ♜ 8");
        assert_eq!(lines[8], "1 ♖ ♘ ♗ ♕ ♔ ♗ ♘ ♖ 1");
        assert_eq!(lines[4], "5 · · · · · · · · 5");
    }
}
