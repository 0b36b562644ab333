//! Canonical mutable board.
//!
//! `squares` is the authoritative record of what stands where; the per-kind
//! bitboards, color occupancies, piece lists and king squares are derived
//! indexes kept in step on every mutation. Moves are applied in place and
//! reversed exactly with `unmake_move`, using the `GameState` history stack as
//! the only record of irreversible information.

use std::cell::Cell;

use crate::chess_errors::ChessResult;
use crate::game_state::chess_rules::{castling_rights_mask, castling_rook_squares, STARTING_POSITION_FEN};
use crate::game_state::chess_types::*;
use crate::game_state::game_state::GameState;
use crate::game_state::piece_list::PieceList;
use crate::moves::bit_utils::square_bit;
use crate::moves::leaper_attacks::{knight_attacks, pawn_attacks};
use crate::moves::move_descriptions::{Move, MoveFlag};
use crate::moves::slider_attacks::{bishop_attacks, rook_attacks};
use crate::search::zobrist::{
    castling_key, compute_zobrist_key, en_passant_file_key, piece_square_key, side_to_move_key,
};
use crate::utils::{fen_generator::generate_fen, fen_parser::parse_fen};

#[derive(Debug, Clone)]
pub struct Board {
    squares: [Option<Piece>; 64],
    pub pieces: [[u64; 6]; 2],
    pub occupancy_by_color: [u64; 2],
    pub occupancy_all: u64,
    piece_lists: [[PieceList; 6]; 2],
    king_squares: [Square; 2],
    pub side_to_move: Color,
    pub state: GameState,
    ply_count: u32,
    state_history: Vec<GameState>,
    /// Keys of every position of the real game line, current position
    /// included. Only grows and shrinks with real make/unmake.
    repetition_history: Vec<u64>,
    all_game_moves: Vec<Move>,
    start_fen: String,
    cached_in_check: Cell<Option<bool>>,
}

impl Board {
    pub(crate) fn empty() -> Self {
        Self {
            squares: [None; 64],
            pieces: [[0; 6]; 2],
            occupancy_by_color: [0; 2],
            occupancy_all: 0,
            piece_lists: Default::default(),
            king_squares: [0; 2],
            side_to_move: Color::Light,
            state: GameState::default(),
            ply_count: 0,
            state_history: Vec::with_capacity(256),
            repetition_history: Vec::with_capacity(128),
            all_game_moves: Vec::new(),
            start_fen: String::new(),
            cached_in_check: Cell::new(None),
        }
    }

    /// Standard starting position.
    pub fn new_game() -> Self {
        const BACK_RANK: [PieceKind; 8] = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];

        let mut board = Self::empty();
        for (file, kind) in (0u8..).zip(BACK_RANK) {
            board.place_piece(Piece::new(Color::Light, kind), square_at(file, 0));
            board.place_piece(Piece::new(Color::Light, PieceKind::Pawn), square_at(file, 1));
            board.place_piece(Piece::new(Color::Dark, PieceKind::Pawn), square_at(file, 6));
            board.place_piece(Piece::new(Color::Dark, kind), square_at(file, 7));
        }
        board.state.castling_rights = CASTLE_ALL;
        board.finish_setup(STARTING_POSITION_FEN.to_owned(), 0);
        board
    }

    /// Load a position from FEN. Fails without producing a partial board.
    pub fn from_fen(fen: &str) -> ChessResult<Self> {
        parse_fen(fen)
    }

    pub fn to_fen(&self) -> String {
        generate_fen(self)
    }

    /// Independent copy built by replaying this board's move list from its
    /// starting position, for handing to a background search.
    pub fn replay_copy(&self) -> ChessResult<Self> {
        let mut copy = Self::from_fen(&self.start_fen)?;
        for &mv in &self.all_game_moves {
            copy.make_move(mv, false);
        }
        Ok(copy)
    }

    /// Place a piece on an empty square during setup.
    pub(crate) fn place_piece(&mut self, piece: Piece, square: Square) {
        self.add_piece(piece, square);
        if piece.kind == PieceKind::King {
            self.king_squares[piece.color.index()] = square;
        }
    }

    /// Derive the key and history from the placed pieces and state fields.
    pub(crate) fn finish_setup(&mut self, start_fen: String, ply_count: u32) {
        self.ply_count = ply_count;
        self.start_fen = start_fen;
        self.state.captured_piece = None;
        self.state.zobrist_key = compute_zobrist_key(self);
        self.state_history.clear();
        self.all_game_moves.clear();
        self.repetition_history.clear();
        self.repetition_history.push(self.state.zobrist_key);
        self.state.repetition_start = 0;
        self.cached_in_check.set(None);
    }

    #[inline]
    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.squares[square as usize]
    }

    #[inline]
    pub fn king_square(&self, color: Color) -> Square {
        self.king_squares[color.index()]
    }

    #[inline]
    pub fn piece_list(&self, color: Color, kind: PieceKind) -> &PieceList {
        &self.piece_lists[color.index()][kind.index()]
    }

    #[inline]
    pub fn bitboard(&self, color: Color, kind: PieceKind) -> u64 {
        self.pieces[color.index()][kind.index()]
    }

    /// Rooks and queens of `color`.
    #[inline]
    pub fn orthogonal_sliders(&self, color: Color) -> u64 {
        self.bitboard(color, PieceKind::Rook) | self.bitboard(color, PieceKind::Queen)
    }

    /// Bishops and queens of `color`.
    #[inline]
    pub fn diagonal_sliders(&self, color: Color) -> u64 {
        self.bitboard(color, PieceKind::Bishop) | self.bitboard(color, PieceKind::Queen)
    }

    #[inline]
    pub fn zobrist_key(&self) -> u64 {
        self.state.zobrist_key
    }

    #[inline]
    pub fn fifty_move_counter(&self) -> u16 {
        self.state.fifty_move_counter
    }

    #[inline]
    pub fn ply_count(&self) -> u32 {
        self.ply_count
    }

    #[inline]
    pub fn fullmove_number(&self) -> u32 {
        self.ply_count / 2 + 1
    }

    pub fn start_fen(&self) -> &str {
        &self.start_fen
    }

    pub fn all_game_moves(&self) -> &[Move] {
        &self.all_game_moves
    }

    /// Keys of the real game line since its last irreversible move, current
    /// position included.
    pub fn repetition_history(&self) -> &[u64] {
        &self.repetition_history[self.state.repetition_start..]
    }

    /// Whether the side to move is in check. Memoized until the next
    /// make/unmake.
    pub fn is_in_check(&self) -> bool {
        if let Some(cached) = self.cached_in_check.get() {
            return cached;
        }
        let in_check = self.compute_in_check();
        self.cached_in_check.set(Some(in_check));
        in_check
    }

    fn compute_in_check(&self) -> bool {
        let us = self.side_to_move;
        let them = us.opposite();
        let king = self.king_square(us);
        let blockers = self.occupancy_all;

        rook_attacks(king, blockers) & self.orthogonal_sliders(them) != 0
            || bishop_attacks(king, blockers) & self.diagonal_sliders(them) != 0
            || knight_attacks(king) & self.bitboard(them, PieceKind::Knight) != 0
            || pawn_attacks(us, king) & self.bitboard(them, PieceKind::Pawn) != 0
    }

    /// Apply `mv`, which must be legal in the current position. With
    /// `in_search` set the move is not recorded in the game move list or the
    /// repetition history.
    pub fn make_move(&mut self, mv: Move, in_search: bool) {
        let from = mv.from();
        let to = mv.to();
        let flag = mv.flag();
        let us = self.side_to_move;
        let them = us.opposite();

        let Some(moved) = self.piece_at(from) else {
            panic!("make_move {mv}: no piece on the start square");
        };
        debug_assert_eq!(moved.color, us, "make_move {mv}: piece belongs to the side not on move");

        let prev_state = self.state;
        let mut key = prev_state.zobrist_key;

        let captured_kind = if flag == MoveFlag::EnPassant {
            let captured_square = en_passant_victim_square(to, us);
            let victim = Piece::new(them, PieceKind::Pawn);
            self.remove_piece(victim, captured_square);
            key ^= piece_square_key(victim, captured_square);
            Some(PieceKind::Pawn)
        } else if let Some(victim) = self.piece_at(to) {
            self.remove_piece(victim, to);
            key ^= piece_square_key(victim, to);
            Some(victim.kind)
        } else {
            None
        };

        self.relocate_piece(moved, from, to);
        key ^= piece_square_key(moved, from) ^ piece_square_key(moved, to);

        if moved.kind == PieceKind::King {
            self.king_squares[us.index()] = to;
            if flag == MoveFlag::Castle {
                let (rook_from, rook_to) = castling_rook_squares(to);
                let rook = Piece::new(us, PieceKind::Rook);
                self.relocate_piece(rook, rook_from, rook_to);
                key ^= piece_square_key(rook, rook_from) ^ piece_square_key(rook, rook_to);
            }
        }

        if let Some(promoted_kind) = mv.promotion_kind() {
            let promoted = Piece::new(us, promoted_kind);
            self.remove_piece(moved, to);
            self.add_piece(promoted, to);
            key ^= piece_square_key(moved, to) ^ piece_square_key(promoted, to);
        }

        let en_passant_file = (flag == MoveFlag::DoublePawnPush).then_some(file_of(from));
        if let Some(file) = prev_state.en_passant_file {
            key ^= en_passant_file_key(file);
        }
        if let Some(file) = en_passant_file {
            key ^= en_passant_file_key(file);
        }

        let castling_rights = prev_state.castling_rights & castling_rights_mask(from) & castling_rights_mask(to);
        key ^= castling_key(prev_state.castling_rights) ^ castling_key(castling_rights);
        key ^= side_to_move_key();

        let irreversible = moved.kind == PieceKind::Pawn || captured_kind.is_some();
        let fifty_move_counter = if irreversible {
            0
        } else {
            prev_state.fifty_move_counter.saturating_add(1)
        };
        let repetition_start = if irreversible && !in_search {
            self.repetition_history.len()
        } else {
            prev_state.repetition_start
        };

        self.state_history.push(prev_state);
        self.state = GameState {
            captured_piece: captured_kind,
            en_passant_file,
            castling_rights,
            fifty_move_counter,
            zobrist_key: key,
            repetition_start,
        };
        self.side_to_move = them;
        self.ply_count += 1;
        self.cached_in_check.set(None);

        if !in_search {
            self.all_game_moves.push(mv);
            self.repetition_history.push(key);
        }
    }

    /// Exact inverse of `make_move(mv, in_search)`.
    pub fn unmake_move(&mut self, mv: Move, in_search: bool) {
        let from = mv.from();
        let to = mv.to();
        let flag = mv.flag();
        let us = self.side_to_move.opposite();
        let them = self.side_to_move;
        let undone = self.state;

        if let Some(promoted_kind) = mv.promotion_kind() {
            self.remove_piece(Piece::new(us, promoted_kind), to);
            self.add_piece(Piece::new(us, PieceKind::Pawn), to);
        }

        let Some(moved) = self.piece_at(to) else {
            panic!("unmake_move {mv}: no piece on the target square");
        };
        self.relocate_piece(moved, to, from);

        if moved.kind == PieceKind::King {
            self.king_squares[us.index()] = from;
            if flag == MoveFlag::Castle {
                let (rook_from, rook_to) = castling_rook_squares(to);
                self.relocate_piece(Piece::new(us, PieceKind::Rook), rook_to, rook_from);
            }
        }

        if let Some(kind) = undone.captured_piece {
            let victim = Piece::new(them, kind);
            if flag == MoveFlag::EnPassant {
                self.add_piece(victim, en_passant_victim_square(to, us));
            } else {
                self.add_piece(victim, to);
            }
        }

        if let Some(previous) = self.state_history.pop() {
            self.state = previous;
        }
        self.side_to_move = us;
        self.ply_count -= 1;
        self.cached_in_check.set(None);

        if !in_search {
            self.all_game_moves.pop();
            self.repetition_history.pop();
        }
    }

    /// Pass the turn without moving a piece. Clears any en passant file.
    pub fn make_null_move(&mut self) {
        let prev_state = self.state;
        let mut key = prev_state.zobrist_key ^ side_to_move_key();
        if let Some(file) = prev_state.en_passant_file {
            key ^= en_passant_file_key(file);
        }

        self.state_history.push(prev_state);
        self.state = GameState {
            captured_piece: None,
            en_passant_file: None,
            castling_rights: prev_state.castling_rights,
            fifty_move_counter: prev_state.fifty_move_counter.saturating_add(1),
            zobrist_key: key,
            repetition_start: prev_state.repetition_start,
        };
        self.side_to_move = self.side_to_move.opposite();
        self.ply_count += 1;
        self.cached_in_check.set(None);
    }

    pub fn unmake_null_move(&mut self) {
        if let Some(previous) = self.state_history.pop() {
            self.state = previous;
        }
        self.side_to_move = self.side_to_move.opposite();
        self.ply_count -= 1;
        self.cached_in_check.set(None);
    }

    #[inline]
    fn add_piece(&mut self, piece: Piece, square: Square) {
        debug_assert!(self.squares[square as usize].is_none(), "add_piece onto an occupied square");
        let bit = square_bit(square);
        self.squares[square as usize] = Some(piece);
        self.pieces[piece.color.index()][piece.kind.index()] |= bit;
        self.occupancy_by_color[piece.color.index()] |= bit;
        self.occupancy_all |= bit;
        self.piece_lists[piece.color.index()][piece.kind.index()].add(square);
    }

    #[inline]
    fn remove_piece(&mut self, piece: Piece, square: Square) {
        debug_assert_eq!(self.squares[square as usize], Some(piece), "remove_piece mismatch");
        let bit = !square_bit(square);
        self.squares[square as usize] = None;
        self.pieces[piece.color.index()][piece.kind.index()] &= bit;
        self.occupancy_by_color[piece.color.index()] &= bit;
        self.occupancy_all &= bit;
        self.piece_lists[piece.color.index()][piece.kind.index()].remove(square);
    }

    #[inline]
    fn relocate_piece(&mut self, piece: Piece, from: Square, to: Square) {
        let delta = square_bit(from) | square_bit(to);
        self.squares[from as usize] = None;
        self.squares[to as usize] = Some(piece);
        self.pieces[piece.color.index()][piece.kind.index()] ^= delta;
        self.occupancy_by_color[piece.color.index()] ^= delta;
        self.occupancy_all ^= delta;
        self.piece_lists[piece.color.index()][piece.kind.index()].relocate(from, to);
    }
}

/// Square of the pawn removed by an en passant capture landing on `target`.
#[inline]
fn en_passant_victim_square(target: Square, mover: Color) -> Square {
    match mover {
        Color::Light => target - 8,
        Color::Dark => target + 8,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::move_generation::legal_move_generator::{MoveGenerator, PromotionMode};
    use crate::utils::long_algebraic::uci_to_move;

    /// Every derived index agrees with `squares`.
    fn assert_consistent(board: &Board) {
        let mut by_color = [0u64; 2];
        for color in Color::ALL {
            for kind in PieceKind::ALL {
                let bb = board.bitboard(color, kind);
                by_color[color.index()] |= bb;
                let list = board.piece_list(color, kind);
                assert_eq!(list.len(), bb.count_ones() as usize, "{color:?} {kind:?} list length");
                for &sq in list.as_slice() {
                    assert!(bb & square_bit(sq) != 0, "{color:?} {kind:?} list has stray {sq}");
                }
            }
        }
        assert_eq!(by_color, board.occupancy_by_color);
        assert_eq!(by_color[0] | by_color[1], board.occupancy_all);
        assert_eq!(by_color[0] & by_color[1], 0);
        for sq in 0..64u8 {
            match board.piece_at(sq) {
                Some(piece) => assert!(board.bitboard(piece.color, piece.kind) & square_bit(sq) != 0),
                None => assert_eq!(board.occupancy_all & square_bit(sq), 0),
            }
        }
        for color in Color::ALL {
            assert_eq!(
                board.bitboard(color, PieceKind::King),
                square_bit(board.king_square(color))
            );
        }
        assert_eq!(board.zobrist_key(), compute_zobrist_key(board));
    }

    fn snapshot(board: &Board) -> ([Option<Piece>; 64], [[u64; 6]; 2], GameState, Color, u32, [Square; 2]) {
        (
            board.squares,
            board.pieces,
            board.state,
            board.side_to_move,
            board.ply_count,
            board.king_squares,
        )
    }

    fn check_symmetry_recursively(board: &mut Board, generator: &mut MoveGenerator, depth: u32) {
        if depth == 0 {
            return;
        }
        let moves = generator.generate_moves(board, false);
        for mv in moves {
            let before = snapshot(board);
            board.make_move(mv, true);
            assert_consistent(board);
            check_symmetry_recursively(board, generator, depth - 1);
            board.unmake_move(mv, true);
            assert_eq!(snapshot(board), before, "make/unmake of {mv} was not symmetric");
        }
    }

    #[test]
    fn make_unmake_restores_everything_in_tactical_positions() {
        let fens = [
            crate::game_state::chess_rules::STARTING_POSITION_FEN,
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
            "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
        ];
        let mut generator = MoveGenerator::new(PromotionMode::All);
        for fen in fens {
            let mut board = Board::from_fen(fen).expect("fen");
            assert_consistent(&board);
            check_symmetry_recursively(&mut board, &mut generator, 2);
        }
    }

    #[test]
    fn castling_moves_the_rook_and_clears_both_rights() {
        let mut board = Board::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").expect("fen");
        let castle = uci_to_move(&board, "e1g1").expect("castle");
        assert_eq!(castle.flag(), MoveFlag::Castle);
        board.make_move(castle, false);
        assert_eq!(board.piece_at(6), Some(Piece::new(Color::Light, PieceKind::King)));
        assert_eq!(board.piece_at(5), Some(Piece::new(Color::Light, PieceKind::Rook)));
        assert_eq!(board.piece_at(7), None);
        assert_eq!(board.state.castling_rights, CASTLE_DARK_KINGSIDE | CASTLE_DARK_QUEENSIDE);
        assert_consistent(&board);
    }

    #[test]
    fn capturing_a_rook_on_its_home_square_clears_that_right() {
        let mut board = Board::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").expect("fen");
        let capture = uci_to_move(&board, "a1a8").expect("capture");
        board.make_move(capture, false);
        assert_eq!(board.state.castling_rights, CASTLE_LIGHT_KINGSIDE | CASTLE_DARK_KINGSIDE);
        assert_eq!(board.state.captured_piece, Some(PieceKind::Rook));
    }

    #[test]
    fn en_passant_removes_the_pawn_beside_the_target() {
        let mut board = Board::from_fen("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1").expect("fen");
        let ep = uci_to_move(&board, "e5d6").expect("en passant");
        assert_eq!(ep.flag(), MoveFlag::EnPassant);
        board.make_move(ep, false);
        assert_eq!(board.piece_at(35), None);
        assert_eq!(board.piece_at(43), Some(Piece::new(Color::Light, PieceKind::Pawn)));
        assert_consistent(&board);
        board.unmake_move(ep, false);
        assert_eq!(board.piece_at(35), Some(Piece::new(Color::Dark, PieceKind::Pawn)));
        assert_consistent(&board);
    }

    #[test]
    fn unmaking_a_promotion_recreates_the_pawn() {
        let mut board = Board::from_fen("4k3/1P6/8/8/8/8/8/4K3 w - - 0 1").expect("fen");
        let promote = uci_to_move(&board, "b7b8n").expect("promotion");
        board.make_move(promote, false);
        assert_eq!(board.piece_list(Color::Light, PieceKind::Knight).len(), 1);
        assert_eq!(board.piece_list(Color::Light, PieceKind::Pawn).len(), 0);
        board.unmake_move(promote, false);
        assert_eq!(board.piece_list(Color::Light, PieceKind::Knight).len(), 0);
        assert_eq!(board.piece_at(49), Some(Piece::new(Color::Light, PieceKind::Pawn)));
        assert_consistent(&board);
    }

    #[test]
    fn irreversible_moves_start_a_new_repetition_window() {
        let mut board = Board::new_game();
        let knight_out = uci_to_move(&board, "g1f3").expect("move");
        board.make_move(knight_out, false);
        assert_eq!(board.repetition_history().len(), 2);
        let pawn_push = uci_to_move(&board, "e7e5").expect("move");
        board.make_move(pawn_push, false);
        assert_eq!(board.repetition_history(), &[board.zobrist_key()]);
        assert_eq!(board.fifty_move_counter(), 0);
    }

    #[test]
    fn unmaking_a_real_pawn_move_restores_the_earlier_history() {
        let mut board = Board::new_game();
        for lan in ["g1f3", "g8f6", "f3g1", "f6g8", "g1f3", "g8f6", "f3g1"] {
            let mv = uci_to_move(&board, lan).expect("move");
            board.make_move(mv, false);
        }
        let before: Vec<u64> = board.repetition_history().to_vec();
        assert_eq!(before.len(), 8);

        let pawn_push = uci_to_move(&board, "e7e5").expect("move");
        board.make_move(pawn_push, false);
        assert_eq!(board.repetition_history().len(), 1);
        board.unmake_move(pawn_push, false);
        assert_eq!(board.repetition_history(), before.as_slice());
    }

    #[test]
    fn in_search_irreversible_moves_keep_the_window() {
        let mut board = Board::new_game();
        let knight_out = uci_to_move(&board, "g1f3").expect("move");
        board.make_move(knight_out, false);
        let pawn_push = uci_to_move(&board, "e7e5").expect("move");
        board.make_move(pawn_push, true);
        assert_eq!(board.repetition_history().len(), 2);
        board.unmake_move(pawn_push, true);
        assert_eq!(board.repetition_history().len(), 2);
    }

    #[test]
    fn in_search_moves_leave_game_records_alone() {
        let mut board = Board::new_game();
        let mv = uci_to_move(&board, "e2e4").expect("move");
        board.make_move(mv, true);
        assert!(board.all_game_moves().is_empty());
        assert_eq!(board.repetition_history().len(), 1);
        board.unmake_move(mv, true);
        assert_eq!(board.zobrist_key(), Board::new_game().zobrist_key());
    }

    #[test]
    fn null_move_flips_side_and_restores_exactly() {
        let mut board = Board::from_fen("4k3/8/8/3pP3/8/8/8/4K3 w - d6 3 1").expect("fen");
        let before = snapshot(&board);
        board.make_null_move();
        assert_eq!(board.side_to_move, Color::Dark);
        assert_eq!(board.state.en_passant_file, None);
        assert_eq!(board.zobrist_key(), compute_zobrist_key(&board));
        board.unmake_null_move();
        assert_eq!(snapshot(&board), before);
    }

    #[test]
    fn in_check_cache_is_invalidated_by_moves() {
        let mut board = Board::from_fen("4k3/8/8/8/8/8/8/R3K3 w - - 0 1").expect("fen");
        assert!(!board.is_in_check());
        let check = uci_to_move(&board, "a1a8").expect("move");
        board.make_move(check, true);
        assert!(board.is_in_check());
        board.unmake_move(check, true);
        assert!(!board.is_in_check());
    }

    #[test]
    fn replay_copy_reproduces_the_position_and_history() {
        let mut board = Board::new_game();
        for lan in ["e2e4", "c7c5", "g1f3", "d7d6"] {
            let mv = uci_to_move(&board, lan).expect("move");
            board.make_move(mv, false);
        }
        let copy = board.replay_copy().expect("replay");
        assert_eq!(copy.to_fen(), board.to_fen());
        assert_eq!(copy.zobrist_key(), board.zobrist_key());
        assert_eq!(copy.repetition_history(), board.repetition_history());
        assert_eq!(copy.all_game_moves(), board.all_game_moves());
    }
}
