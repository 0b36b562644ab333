use crate::game_state::chess_types::*;

/// Irreversible part of a position, snapshotted on every make-move and
/// restored verbatim on unmake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GameState {
    /// Kind captured by the move that produced this state.
    pub captured_piece: Option<PieceKind>,
    /// File of the pawn that just double-pushed, if any.
    pub en_passant_file: Option<u8>,
    pub castling_rights: CastlingRights,
    pub fifty_move_counter: u16,
    pub zobrist_key: u64,
    /// Index into the board's repetition history where the current
    /// reversible stretch of the game line begins.
    pub repetition_start: usize,
}

impl GameState {
    #[inline]
    pub const fn has_kingside_right(&self, color: Color) -> bool {
        let bit = match color {
            Color::Light => CASTLE_LIGHT_KINGSIDE,
            Color::Dark => CASTLE_DARK_KINGSIDE,
        };
        self.castling_rights & bit != 0
    }

    #[inline]
    pub const fn has_queenside_right(&self, color: Color) -> bool {
        let bit = match color {
            Color::Light => CASTLE_LIGHT_QUEENSIDE,
            Color::Dark => CASTLE_DARK_QUEENSIDE,
        };
        self.castling_rights & bit != 0
    }
}
