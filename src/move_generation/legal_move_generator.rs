//! Fully legal move generation.
//!
//! Each call first derives, for the side to move, the opponent's attack map,
//! the check-ray mask (squares that capture or block the single checker, or
//! every square when not in check) and the pin rays running from the king to
//! each pinning slider. Destinations are then masked by those sets so no
//! king-exposing move is ever produced and nothing has to be filtered after
//! the fact.

use crate::game_state::board::Board;
use crate::game_state::chess_rules::{A1, A8, E1, E8, H1, H8};
use crate::game_state::chess_types::*;
use crate::moves::bit_utils::*;
use crate::moves::leaper_attacks::{king_attacks, knight_attacks, pawn_attacks};
use crate::moves::move_descriptions::{Move, MoveFlag};
use crate::moves::ray_masks::{align_mask, between_mask};
use crate::moves::slider_attacks::{bishop_attacks, rook_attacks};

/// Which promotion pieces are generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PromotionMode {
    #[default]
    All,
    QueenAndKnight,
    QueenOnly,
}

impl PromotionMode {
    const fn pieces(self) -> &'static [PieceKind] {
        match self {
            PromotionMode::All => &[PieceKind::Queen, PieceKind::Knight, PieceKind::Rook, PieceKind::Bishop],
            PromotionMode::QueenAndKnight => &[PieceKind::Queen, PieceKind::Knight],
            PromotionMode::QueenOnly => &[PieceKind::Queen],
        }
    }
}

const LIGHT_KINGSIDE_PATH: u64 = square_bit(5) | square_bit(6);
const LIGHT_QUEENSIDE_PATH: u64 = square_bit(2) | square_bit(3);
const LIGHT_QUEENSIDE_BLOCKERS: u64 = LIGHT_QUEENSIDE_PATH | square_bit(1);
const DARK_KINGSIDE_PATH: u64 = LIGHT_KINGSIDE_PATH << 56;
const DARK_QUEENSIDE_PATH: u64 = LIGHT_QUEENSIDE_PATH << 56;
const DARK_QUEENSIDE_BLOCKERS: u64 = LIGHT_QUEENSIDE_BLOCKERS << 56;

/// Reusable generator. The attack data of the most recent call stays readable
/// (`in_check`, `opponent_attack_map`, ...) until the next call.
#[derive(Debug, Clone)]
pub struct MoveGenerator {
    promotion_mode: PromotionMode,
    us: Color,
    them: Color,
    friendly_king: Square,
    friendly: u64,
    enemy: u64,
    all: u64,
    empty: u64,
    empty_or_enemy: u64,
    move_type_mask: u64,
    captures_only: bool,
    in_check: bool,
    in_double_check: bool,
    check_ray_mask: u64,
    pin_rays: u64,
    opponent_attack_map: u64,
    opponent_pawn_attack_map: u64,
}

impl Default for MoveGenerator {
    fn default() -> Self {
        Self::new(PromotionMode::All)
    }
}

impl MoveGenerator {
    pub fn new(promotion_mode: PromotionMode) -> Self {
        Self {
            promotion_mode,
            us: Color::Light,
            them: Color::Dark,
            friendly_king: 0,
            friendly: 0,
            enemy: 0,
            all: 0,
            empty: 0,
            empty_or_enemy: 0,
            move_type_mask: u64::MAX,
            captures_only: false,
            in_check: false,
            in_double_check: false,
            check_ray_mask: u64::MAX,
            pin_rays: 0,
            opponent_attack_map: 0,
            opponent_pawn_attack_map: 0,
        }
    }

    pub fn promotion_mode(&self) -> PromotionMode {
        self.promotion_mode
    }

    pub fn set_promotion_mode(&mut self, promotion_mode: PromotionMode) {
        self.promotion_mode = promotion_mode;
    }

    /// All legal moves, or with `captures_only` the legal captures and
    /// promotions.
    pub fn generate_moves(&mut self, board: &Board, captures_only: bool) -> Vec<Move> {
        let mut moves = Vec::with_capacity(64);
        self.generate_moves_into(board, captures_only, &mut moves);
        moves
    }

    pub fn generate_moves_into(&mut self, board: &Board, captures_only: bool, moves: &mut Vec<Move>) {
        moves.clear();
        self.init(board, captures_only);
        self.calculate_attack_data(board);

        self.generate_king_moves(board, moves);

        // Only the king can answer a double check.
        if self.in_double_check {
            return;
        }

        self.generate_slider_moves(board, moves);
        self.generate_knight_moves(board, moves);
        self.generate_pawn_moves(board, moves);
    }

    #[inline]
    pub fn in_check(&self) -> bool {
        self.in_check
    }

    #[inline]
    pub fn opponent_attack_map(&self) -> u64 {
        self.opponent_attack_map
    }

    #[inline]
    pub fn opponent_pawn_attack_map(&self) -> u64 {
        self.opponent_pawn_attack_map
    }

    fn init(&mut self, board: &Board, captures_only: bool) {
        self.us = board.side_to_move;
        self.them = self.us.opposite();
        self.friendly_king = board.king_square(self.us);
        self.friendly = board.occupancy_by_color[self.us.index()];
        self.enemy = board.occupancy_by_color[self.them.index()];
        self.all = board.occupancy_all;
        self.empty = !self.all;
        self.empty_or_enemy = !self.friendly;
        self.captures_only = captures_only;
        self.move_type_mask = if captures_only { self.enemy } else { u64::MAX };
    }

    fn calculate_attack_data(&mut self, board: &Board) {
        let them = self.them;
        let king = self.friendly_king;

        self.in_check = false;
        self.in_double_check = false;
        self.check_ray_mask = 0;
        self.pin_rays = 0;

        // The king must not shelter behind itself when stepping back along a
        // slider's line, so it is removed from the blockers.
        let blockers = self.all & !square_bit(king);
        let mut slider_attacks = 0u64;
        for sq in squares(board.orthogonal_sliders(them)) {
            slider_attacks |= rook_attacks(sq, blockers);
        }
        for sq in squares(board.diagonal_sliders(them)) {
            slider_attacks |= bishop_attacks(sq, blockers);
        }

        // Looking from the king through friendly pieces, the first enemy
        // slider on each line either checks (nothing between) or pins (one
        // friendly piece between).
        let snipers = (rook_attacks(king, self.enemy) & board.orthogonal_sliders(them))
            | (bishop_attacks(king, self.enemy) & board.diagonal_sliders(them));
        for sniper in squares(snipers) {
            let ray = between_mask(king, sniper);
            let between = ray & self.all;
            if between == 0 {
                self.register_check(ray | square_bit(sniper));
            } else if between.count_ones() == 1 && between & self.friendly != 0 {
                self.pin_rays |= ray | square_bit(sniper);
            }
        }

        let enemy_knights = board.bitboard(them, PieceKind::Knight);
        let mut knight_map = 0u64;
        for sq in squares(enemy_knights) {
            knight_map |= knight_attacks(sq);
        }
        let knight_checkers = knight_attacks(king) & enemy_knights;
        if knight_checkers != 0 {
            self.register_check(knight_checkers);
        }

        let enemy_pawns = board.bitboard(them, PieceKind::Pawn);
        self.opponent_pawn_attack_map = match them {
            Color::Light => ((enemy_pawns & NOT_FILE_A) << 7) | ((enemy_pawns & NOT_FILE_H) << 9),
            Color::Dark => ((enemy_pawns & NOT_FILE_H) >> 7) | ((enemy_pawns & NOT_FILE_A) >> 9),
        };
        let pawn_checkers = pawn_attacks(self.us, king) & enemy_pawns;
        if pawn_checkers != 0 {
            self.register_check(pawn_checkers);
        }

        let enemy_king_map = king_attacks(board.king_square(them));
        self.opponent_attack_map =
            slider_attacks | knight_map | enemy_king_map | self.opponent_pawn_attack_map;

        if !self.in_check {
            self.check_ray_mask = u64::MAX;
        }
    }

    #[inline]
    fn register_check(&mut self, resolving_squares: u64) {
        self.in_double_check = self.in_check;
        self.in_check = true;
        self.check_ray_mask |= resolving_squares;
    }

    #[inline]
    fn is_pinned(&self, square: Square) -> bool {
        contains_square(self.pin_rays, square)
    }

    /// A pinned piece may only travel along the line through its king.
    #[inline]
    fn keeps_pin_line(&self, from: Square, to: Square) -> bool {
        !self.is_pinned(from) || align_mask(from, self.friendly_king) == align_mask(to, self.friendly_king)
    }

    fn generate_king_moves(&self, board: &Board, moves: &mut Vec<Move>) {
        let king = self.friendly_king;
        let legal = !(self.opponent_attack_map | self.friendly);
        for to in squares(king_attacks(king) & legal & self.move_type_mask) {
            moves.push(Move::quiet(king, to));
        }

        if self.in_check || self.captures_only {
            return;
        }

        let rooks = board.bitboard(self.us, PieceKind::Rook);
        let (home, kingside_path, queenside_path, queenside_blockers, kingside_rook, queenside_rook) = match self.us {
            Color::Light => (E1, LIGHT_KINGSIDE_PATH, LIGHT_QUEENSIDE_PATH, LIGHT_QUEENSIDE_BLOCKERS, H1, A1),
            Color::Dark => (E8, DARK_KINGSIDE_PATH, DARK_QUEENSIDE_PATH, DARK_QUEENSIDE_BLOCKERS, H8, A8),
        };
        if king != home {
            return;
        }

        if board.state.has_kingside_right(self.us)
            && contains_square(rooks, kingside_rook)
            && kingside_path & (self.opponent_attack_map | self.all) == 0
        {
            moves.push(Move::new(king, king + 2, MoveFlag::Castle));
        }

        if board.state.has_queenside_right(self.us)
            && contains_square(rooks, queenside_rook)
            && queenside_path & self.opponent_attack_map == 0
            && queenside_blockers & self.all == 0
        {
            moves.push(Move::new(king, king - 2, MoveFlag::Castle));
        }
    }

    fn generate_slider_moves(&self, board: &Board, moves: &mut Vec<Move>) {
        let move_mask = self.empty_or_enemy & self.check_ray_mask & self.move_type_mask;
        let mut orthogonal = board.orthogonal_sliders(self.us);
        let mut diagonal = board.diagonal_sliders(self.us);

        // A pinned slider can never resolve a check.
        if self.in_check {
            orthogonal &= !self.pin_rays;
            diagonal &= !self.pin_rays;
        }

        for from in squares(orthogonal) {
            self.push_slider_targets(from, rook_attacks(from, self.all) & move_mask, moves);
        }
        for from in squares(diagonal) {
            self.push_slider_targets(from, bishop_attacks(from, self.all) & move_mask, moves);
        }
    }

    #[inline]
    fn push_slider_targets(&self, from: Square, mut targets: u64, moves: &mut Vec<Move>) {
        if self.is_pinned(from) {
            targets &= align_mask(from, self.friendly_king);
        }
        for to in squares(targets) {
            moves.push(Move::quiet(from, to));
        }
    }

    fn generate_knight_moves(&self, board: &Board, moves: &mut Vec<Move>) {
        let knights = board.bitboard(self.us, PieceKind::Knight) & !self.pin_rays;
        let move_mask = self.empty_or_enemy & self.check_ray_mask & self.move_type_mask;
        for from in squares(knights) {
            for to in squares(knight_attacks(from) & move_mask) {
                moves.push(Move::quiet(from, to));
            }
        }
    }

    fn generate_pawn_moves(&self, board: &Board, moves: &mut Vec<Move>) {
        let pawns = board.bitboard(self.us, PieceKind::Pawn);
        let (push, promotion_rank, double_push_rank, ep_rank) = match self.us {
            Color::Light => (8, RANK_8, RANK_4, 5),
            Color::Dark => (-8, RANK_1, RANK_5, 2),
        };
        // Capture towards the a-file ("west") and towards the h-file ("east").
        let (west, east) = (push - 1, push + 1);

        let single = shift(pawns, push) & self.empty;
        let push_promotions = single & promotion_rank & self.check_ray_mask;
        let west_captures = shift(pawns & NOT_FILE_A, west) & self.enemy & self.check_ray_mask;
        let east_captures = shift(pawns & NOT_FILE_H, east) & self.enemy & self.check_ray_mask;

        if !self.captures_only {
            let single_quiet = single & !promotion_rank & self.check_ray_mask;
            for to in squares(single_quiet) {
                let from = offset(to, -push);
                if self.keeps_pin_line(from, to) {
                    moves.push(Move::quiet(from, to));
                }
            }

            let double = shift(single, push) & self.empty & double_push_rank & self.check_ray_mask;
            for to in squares(double) {
                let from = offset(to, -2 * push);
                if self.keeps_pin_line(from, to) {
                    moves.push(Move::new(from, to, MoveFlag::DoublePawnPush));
                }
            }
        }

        for (targets, step) in [(west_captures, west), (east_captures, east)] {
            for to in squares(targets & !promotion_rank) {
                let from = offset(to, -step);
                if self.keeps_pin_line(from, to) {
                    moves.push(Move::quiet(from, to));
                }
            }
            for to in squares(targets & promotion_rank) {
                let from = offset(to, -step);
                if self.keeps_pin_line(from, to) {
                    self.push_promotions(from, to, moves);
                }
            }
        }

        for to in squares(push_promotions) {
            let from = offset(to, -push);
            if self.keeps_pin_line(from, to) {
                self.push_promotions(from, to, moves);
            }
        }

        if let Some(file) = board.state.en_passant_file {
            let target = square_at(file, ep_rank);
            let victim = offset(target, -push);
            let victim_present = contains_square(board.bitboard(self.them, PieceKind::Pawn), victim);
            // The capture must remove the checker or block its ray.
            if victim_present && self.check_ray_mask & (square_bit(victim) | square_bit(target)) != 0 {
                let capturers = pawns & pawn_attacks(self.them, target);
                for from in squares(capturers) {
                    if self.keeps_pin_line(from, target)
                        && !self.in_check_after_en_passant(board, from, target, victim)
                    {
                        moves.push(Move::new(from, target, MoveFlag::EnPassant));
                    }
                }
            }
        }
    }

    #[inline]
    fn push_promotions(&self, from: Square, to: Square, moves: &mut Vec<Move>) {
        for &kind in self.promotion_mode.pieces() {
            moves.push(Move::new(from, to, MoveFlag::for_promotion(kind)));
        }
    }

    /// En passant lifts two pawns off the same rank at once, which can expose
    /// the king to a rook or queen along that rank.
    fn in_check_after_en_passant(&self, board: &Board, from: Square, target: Square, victim: Square) -> bool {
        let enemy_orthogonal = board.orthogonal_sliders(self.them);
        if enemy_orthogonal == 0 {
            return false;
        }
        let blockers = self.all ^ (square_bit(from) | square_bit(victim) | square_bit(target));
        rook_attacks(self.friendly_king, blockers) & enemy_orthogonal != 0
    }
}

#[inline]
fn offset(square: Square, delta: i32) -> Square {
    (square as i32 + delta) as Square
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::long_algebraic::move_to_uci;

    fn legal_uci(fen: &str) -> Vec<String> {
        let board = Board::from_fen(fen).expect("fen");
        let mut generator = MoveGenerator::new(PromotionMode::All);
        let mut moves: Vec<String> = generator
            .generate_moves(&board, false)
            .into_iter()
            .map(move_to_uci)
            .collect();
        moves.sort();
        moves
    }

    #[test]
    fn startpos_has_twenty_moves() {
        let board = Board::new_game();
        let mut generator = MoveGenerator::default();
        assert_eq!(generator.generate_moves(&board, false).len(), 20);
        assert!(!generator.in_check());
    }

    #[test]
    fn pinned_bishop_stays_on_the_pin_line() {
        // Bishop d2 pinned by the queen on a5 against the king on e1.
        let moves = legal_uci("4k3/8/8/q7/8/8/3B4/4K3 w - - 0 1");
        let bishop_moves: Vec<_> = moves.iter().filter(|m| m.starts_with("d2")).collect();
        assert_eq!(bishop_moves, vec!["d2a5", "d2b4", "d2c3"]);
    }

    #[test]
    fn orthogonally_pinned_bishop_cannot_move() {
        let moves = legal_uci("4r1k1/8/8/8/8/8/4B3/4K3 w - - 0 1");
        assert!(moves.iter().all(|m| !m.starts_with("e2")));
    }

    #[test]
    fn knight_check_restricts_non_king_moves_to_capturing_the_knight() {
        // Knight f3 checks e1; only the queen on d1 and pawn on g2 can take it.
        let moves = legal_uci("4k3/8/8/8/8/5n2/6P1/3QK3 w - - 0 1");
        let non_king: Vec<_> = moves.iter().filter(|m| !m.starts_with("e1")).cloned().collect();
        assert_eq!(non_king, vec!["d1f3".to_owned(), "g2f3".to_owned()]);
    }

    #[test]
    fn double_check_allows_only_king_moves() {
        // Rook e8 and knight d3 both check the king on e1.
        let moves = legal_uci("k3r3/8/8/8/8/3n4/8/3QK2R w K - 0 1");
        assert!(!moves.is_empty());
        assert!(moves.iter().all(|m| m.starts_with("e1")));
        assert!(!moves.contains(&"e1g1".to_owned()));
    }

    #[test]
    fn slider_check_can_be_blocked() {
        let moves = legal_uci("4k3/8/8/8/r7/8/8/4K2R w K - 0 1");
        // Rook a4 does not check; castling is allowed.
        assert!(moves.contains(&"e1g1".to_owned()));
        let moves = legal_uci("4k3/8/8/8/8/8/8/r3K2R w K - 0 1");
        // Rook a1 checks along the first rank, so castling is out.
        assert!(!moves.contains(&"e1g1".to_owned()));
        assert!(moves.contains(&"e1e2".to_owned()));
    }

    #[test]
    fn castling_through_an_attacked_square_is_illegal() {
        // Bishop c4 covers f1.
        let moves = legal_uci("4k3/8/8/8/2b5/8/8/4K2R w K - 0 1");
        assert!(!moves.contains(&"e1g1".to_owned()));
        // Queenside: b1 may be attacked, only c1/d1 matter; here b1 is blocked.
        let moves = legal_uci("4k3/8/8/8/8/8/8/RN2K3 w Q - 0 1");
        assert!(!moves.contains(&"e1c1".to_owned()));
    }

    #[test]
    fn en_passant_that_exposes_the_king_along_the_rank_is_excluded() {
        let moves = legal_uci("8/8/8/K2pP2r/8/8/8/7k w - d6 0 1");
        assert!(!moves.contains(&"e5d6".to_owned()));
        let moves = legal_uci("8/8/8/K2pP3/8/8/8/7k w - d6 0 1");
        assert!(moves.contains(&"e5d6".to_owned()));
    }

    #[test]
    fn en_passant_capturing_the_checking_pawn_is_allowed() {
        // d7-d5 gave check to the king on e4; exd6 removes the checker.
        let moves = legal_uci("8/8/8/3pP3/4K3/8/8/7k w - d6 0 1");
        assert!(moves.contains(&"e5d6".to_owned()));
    }

    #[test]
    fn stale_en_passant_file_without_a_victim_yields_no_capture() {
        let mut board = Board::from_fen("4k3/8/8/4P3/8/8/8/4K3 w - - 0 1").expect("fen");
        board.state.en_passant_file = Some(3);
        let mut generator = MoveGenerator::new(PromotionMode::All);
        let moves = generator.generate_moves(&board, false);
        assert!(moves.iter().all(|mv| mv.flag() != MoveFlag::EnPassant));
    }

    #[test]
    fn castling_right_with_the_king_off_its_home_square_is_ignored() {
        let mut board = Board::from_fen("4k3/8/8/8/8/8/8/3K3R w - - 0 1").expect("fen");
        board.state.castling_rights = CASTLE_LIGHT_KINGSIDE;
        let mut generator = MoveGenerator::new(PromotionMode::All);
        let moves = generator.generate_moves(&board, false);
        assert!(moves.iter().all(|mv| mv.flag() != MoveFlag::Castle));
    }

    #[test]
    fn promotion_mode_controls_generated_promotions() {
        let board = Board::from_fen("7k/P7/8/8/8/8/8/K7 w - - 0 1").expect("fen");
        let count = |mode| {
            let mut generator = MoveGenerator::new(mode);
            generator
                .generate_moves(&board, false)
                .into_iter()
                .filter(|mv| mv.is_promotion())
                .count()
        };
        assert_eq!(count(PromotionMode::All), 4);
        assert_eq!(count(PromotionMode::QueenAndKnight), 2);
        assert_eq!(count(PromotionMode::QueenOnly), 1);
    }

    #[test]
    fn captures_only_returns_captures_and_promotions() {
        let board = Board::from_fen("r3k3/1P6/8/8/8/8/3n4/4K3 w - - 0 1").expect("fen");
        let mut generator = MoveGenerator::new(PromotionMode::QueenOnly);
        let mut moves: Vec<String> = generator
            .generate_moves(&board, true)
            .into_iter()
            .map(move_to_uci)
            .collect();
        moves.sort();
        assert_eq!(moves, vec!["b7a8q", "b7b8q", "e1d2"]);
    }
}
