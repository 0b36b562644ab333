//! Pluggable board evaluation interfaces and implementations.
//!
//! Search delegates static scoring to the `BoardScorer` trait so alternate
//! heuristics can be swapped without touching search code. Every scorer
//! returns a score from the perspective of the side to move.

use crate::game_state::{board::Board, chess_types::*};
use crate::moves::bit_utils::FILE_MASKS;
use crate::search::evaluation_masks::{
    adjacent_file_mask, orthogonal_distance, passed_pawn_mask, pawn_shield_squares,
    CENTRE_MANHATTAN_DISTANCE,
};
use crate::search::piece_square_tables::{self as pst, read};

pub trait BoardScorer: Send + Sync {
    /// Score from the perspective of the side to move.
    fn score(&self, board: &Board) -> i32;
}

/// Score of a side that is mated on the board; mates found deeper in the tree
/// score lower by one per ply.
pub const IMMEDIATE_MATE_SCORE: i32 = 100_000;
const MAX_MATE_DEPTH: i32 = 1_000;

#[inline]
pub const fn is_mate_score(score: i32) -> bool {
    score.abs() > IMMEDIATE_MATE_SCORE - MAX_MATE_DEPTH
}

/// Plies to the mate behind a mate score.
#[inline]
pub const fn mate_distance(score: i32) -> i32 {
    IMMEDIATE_MATE_SCORE - score.abs()
}

pub const PAWN_VALUE: i32 = 100;
pub const KNIGHT_VALUE: i32 = 300;
pub const BISHOP_VALUE: i32 = 320;
pub const ROOK_VALUE: i32 = 500;
pub const QUEEN_VALUE: i32 = 900;

/// Material value of a piece kind. Kings are never traded so they count zero.
#[inline]
pub const fn piece_value(kind: PieceKind) -> i32 {
    match kind {
        PieceKind::Pawn => PAWN_VALUE,
        PieceKind::Knight => KNIGHT_VALUE,
        PieceKind::Bishop => BISHOP_VALUE,
        PieceKind::Rook => ROOK_VALUE,
        PieceKind::Queen => QUEEN_VALUE,
        PieceKind::King => 0,
    }
}

#[inline]
fn perspective(board: &Board, light_minus_dark: i32) -> i32 {
    light_minus_dark * board.side_to_move.sign()
}

/// Plain material count.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaterialScorer;

impl BoardScorer for MaterialScorer {
    fn score(&self, board: &Board) -> i32 {
        let light = MaterialInfo::of(board, Color::Light).material_score;
        let dark = MaterialInfo::of(board, Color::Dark).material_score;
        perspective(board, light - dark)
    }
}

/// Material summary of one side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialInfo {
    pub material_score: i32,
    pub num_pawns: u32,
    pub num_knights: u32,
    pub num_bishops: u32,
    pub num_rooks: u32,
    pub num_queens: u32,
    /// 0 with the full complement of pieces, 1 once only kings and pawns
    /// remain.
    pub endgame_t: f32,
}

impl MaterialInfo {
    const QUEEN_ENDGAME_WEIGHT: u32 = 45;
    const ROOK_ENDGAME_WEIGHT: u32 = 20;
    const BISHOP_ENDGAME_WEIGHT: u32 = 10;
    const KNIGHT_ENDGAME_WEIGHT: u32 = 10;
    const ENDGAME_START_WEIGHT: u32 = 2 * Self::ROOK_ENDGAME_WEIGHT
        + 2 * Self::BISHOP_ENDGAME_WEIGHT
        + 2 * Self::KNIGHT_ENDGAME_WEIGHT
        + Self::QUEEN_ENDGAME_WEIGHT;

    pub fn of(board: &Board, color: Color) -> Self {
        let count = |kind| board.piece_list(color, kind).len() as u32;
        let num_pawns = count(PieceKind::Pawn);
        let num_knights = count(PieceKind::Knight);
        let num_bishops = count(PieceKind::Bishop);
        let num_rooks = count(PieceKind::Rook);
        let num_queens = count(PieceKind::Queen);

        let material_score = num_pawns as i32 * PAWN_VALUE
            + num_knights as i32 * KNIGHT_VALUE
            + num_bishops as i32 * BISHOP_VALUE
            + num_rooks as i32 * ROOK_VALUE
            + num_queens as i32 * QUEEN_VALUE;

        let weight = num_queens * Self::QUEEN_ENDGAME_WEIGHT
            + num_rooks * Self::ROOK_ENDGAME_WEIGHT
            + num_bishops * Self::BISHOP_ENDGAME_WEIGHT
            + num_knights * Self::KNIGHT_ENDGAME_WEIGHT;
        let endgame_t = 1.0 - (weight as f32 / Self::ENDGAME_START_WEIGHT as f32).min(1.0);

        Self {
            material_score,
            num_pawns,
            num_knights,
            num_bishops,
            num_rooks,
            num_queens,
            endgame_t,
        }
    }
}

/// Per-side breakdown of the tapered evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvaluationTerms {
    pub material: i32,
    pub piece_square: i32,
    pub pawns: i32,
    pub pawn_shield: i32,
    pub mop_up: i32,
}

impl EvaluationTerms {
    #[inline]
    pub fn sum(&self) -> i32 {
        self.material + self.piece_square + self.pawns + self.pawn_shield + self.mop_up
    }
}

/// Full evaluator: material, tapered piece-square tables, pawn structure,
/// king safety and an endgame mop-up term.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaperedScorer;

impl TaperedScorer {
    const PASSED_PAWN_BONUSES: [i32; 7] = [0, 120, 80, 50, 30, 15, 15];
    const ISOLATED_PAWN_PENALTY_BY_COUNT: [i32; 9] = [0, -10, -25, -50, -75, -75, -75, -75, -75];
    const KING_PAWN_SHIELD_SCORES: [i32; 6] = [4, 7, 4, 3, 6, 3];

    /// Both sides' terms, indexed by `Color::index`.
    pub fn terms(&self, board: &Board) -> [EvaluationTerms; 2] {
        let material = [
            MaterialInfo::of(board, Color::Light),
            MaterialInfo::of(board, Color::Dark),
        ];

        let mut terms = [EvaluationTerms::default(); 2];
        for color in Color::ALL {
            let us = color.index();
            let them = color.opposite().index();
            terms[us].material = material[us].material_score;
            terms[us].piece_square = piece_square_score(board, color, material[them].endgame_t);
            terms[us].pawns = Self::pawn_score(board, color);
            terms[us].mop_up = mop_up_score(board, color, &material[us], &material[them]);
        }

        for color in Color::ALL {
            let us = color.index();
            let them = color.opposite().index();
            terms[us].pawn_shield =
                Self::king_safety_score(board, color, &material[them], terms[them].piece_square);
        }

        terms
    }

    fn pawn_score(board: &Board, color: Color) -> i32 {
        let friendly_pawns = board.bitboard(color, PieceKind::Pawn);
        let enemy_pawns = board.bitboard(color.opposite(), PieceKind::Pawn);

        let mut bonus = 0;
        let mut isolated = 0usize;
        for &square in board.piece_list(color, PieceKind::Pawn).as_slice() {
            if enemy_pawns & passed_pawn_mask(color, square) == 0 {
                let rank = rank_of(square) as usize;
                let squares_from_promotion = match color {
                    Color::Light => 7 - rank,
                    Color::Dark => rank,
                };
                bonus += Self::PASSED_PAWN_BONUSES[squares_from_promotion];
            }
            if friendly_pawns & adjacent_file_mask(file_of(square)) == 0 {
                isolated += 1;
            }
        }

        bonus + Self::ISOLATED_PAWN_PENALTY_BY_COUNT[isolated.min(8)]
    }

    /// Penalty for a weakened pawn shield, an uncastled king facing developed
    /// enemy pieces, and open files next to the king. Fades out as the enemy
    /// trades pieces.
    fn king_safety_score(
        board: &Board,
        color: Color,
        enemy: &MaterialInfo,
        enemy_piece_square_score: i32,
    ) -> i32 {
        if enemy.endgame_t >= 1.0 {
            return 0;
        }

        let king = board.king_square(color);
        let king_file = file_of(king);
        let friendly_pawn = Some(Piece::new(color, PieceKind::Pawn));

        let mut shield_penalty = 0;
        let mut uncastled_penalty = 0;
        if king_file <= 2 || king_file >= 5 {
            let shield = pawn_shield_squares(color, king);
            for (i, &square) in shield.iter().enumerate().take(3.min(shield.len())) {
                if board.piece_at(square) != friendly_pawn {
                    if shield.len() > 3 && board.piece_at(shield[i + 3]) == friendly_pawn {
                        shield_penalty += Self::KING_PAWN_SHIELD_SCORES[i + 3];
                    } else {
                        shield_penalty += Self::KING_PAWN_SHIELD_SCORES[i];
                    }
                }
            }
            shield_penalty *= shield_penalty;
        } else {
            let enemy_development = ((enemy_piece_square_score + 10) as f32 / 130.0).clamp(0.0, 1.0);
            uncastled_penalty = (50.0 * enemy_development) as i32;
        }

        let mut open_file_penalty = 0;
        if enemy.num_rooks > 1 || (enemy.num_rooks > 0 && enemy.num_queens > 0) {
            let clamped_file = king_file.clamp(1, 6);
            let friendly_pawns = board.bitboard(color, PieceKind::Pawn);
            let enemy_pawns = board.bitboard(color.opposite(), PieceKind::Pawn);
            for attack_file in clamped_file - 1..=clamped_file + 1 {
                let file_mask = FILE_MASKS[attack_file as usize];
                let is_king_file = attack_file == king_file;
                if friendly_pawns & file_mask == 0 {
                    open_file_penalty += if is_king_file { 25 } else { 15 };
                    if enemy_pawns & file_mask == 0 {
                        open_file_penalty += if is_king_file { 15 } else { 10 };
                    }
                }
            }
        }

        let mut weight = 1.0 - enemy.endgame_t;
        if enemy.num_queens == 0 {
            weight *= 0.6;
        }

        ((-shield_penalty - uncastled_penalty - open_file_penalty) as f32 * weight) as i32
    }
}

impl BoardScorer for TaperedScorer {
    fn score(&self, board: &Board) -> i32 {
        let [light, dark] = self.terms(board);
        perspective(board, light.sum() - dark.sum())
    }
}

fn piece_square_score(board: &Board, color: Color, enemy_endgame_t: f32) -> i32 {
    let table_sum = |table: &[i32; 64], kind: PieceKind| -> i32 {
        board
            .piece_list(color, kind)
            .as_slice()
            .iter()
            .map(|&square| read(table, square, color))
            .sum()
    };

    let mut value = table_sum(&pst::ROOKS, PieceKind::Rook)
        + table_sum(&pst::KNIGHTS, PieceKind::Knight)
        + table_sum(&pst::BISHOPS, PieceKind::Bishop)
        + table_sum(&pst::QUEENS, PieceKind::Queen);

    let pawns_early = table_sum(&pst::PAWNS, PieceKind::Pawn) as f32;
    let pawns_late = table_sum(&pst::PAWNS_END, PieceKind::Pawn) as f32;
    value += (pawns_early * (1.0 - enemy_endgame_t)) as i32;
    value += (pawns_late * enemy_endgame_t) as i32;

    let king = board.king_square(color);
    let king_early = read(&pst::KING_START, king, color) as f32;
    let king_late = read(&pst::KING_END, king, color) as f32;
    value += (king_early * (1.0 - enemy_endgame_t)) as i32;
    value += (king_late * enemy_endgame_t) as i32;

    value
}

/// Reward pushing the enemy king to the edge and approaching it with our own
/// king once we are clearly ahead and the enemy is short of pieces.
fn mop_up_score(board: &Board, color: Color, ours: &MaterialInfo, enemy: &MaterialInfo) -> i32 {
    if ours.material_score > enemy.material_score + PAWN_VALUE * 2 && enemy.endgame_t > 0.0 {
        let friendly_king = board.king_square(color);
        let enemy_king = board.king_square(color.opposite());
        let mut score = (14 - orthogonal_distance(friendly_king, enemy_king)) * 4;
        score += CENTRE_MANHATTAN_DISTANCE[enemy_king as usize] * 10;
        return (score as f32 * enemy.endgame_t) as i32;
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(fen: &str) -> Board {
        Board::from_fen(fen).expect("fen")
    }

    #[test]
    fn mate_scores_are_recognised() {
        assert!(is_mate_score(IMMEDIATE_MATE_SCORE - 3));
        assert!(is_mate_score(-(IMMEDIATE_MATE_SCORE - 40)));
        assert!(!is_mate_score(QUEEN_VALUE * 9));
        assert_eq!(mate_distance(-(IMMEDIATE_MATE_SCORE - 5)), 5);
    }

    #[test]
    fn start_position_is_balanced() {
        let start = Board::new_game();
        assert_eq!(TaperedScorer.score(&start), 0);
        assert_eq!(MaterialScorer.score(&start), 0);
        let [light, dark] = TaperedScorer.terms(&start);
        assert_eq!(light, dark);
        assert_eq!(light.material, 8 * PAWN_VALUE + 2 * (KNIGHT_VALUE + BISHOP_VALUE + ROOK_VALUE) + QUEEN_VALUE);
    }

    #[test]
    fn score_is_from_side_to_move() {
        let light_to_move = board("4k3/8/8/8/8/8/8/3QK3 w - - 0 1");
        let dark_to_move = board("4k3/8/8/8/8/8/8/3QK3 b - - 0 1");
        assert!(TaperedScorer.score(&light_to_move) > 0);
        assert_eq!(TaperedScorer.score(&light_to_move), -TaperedScorer.score(&dark_to_move));
        assert_eq!(MaterialScorer.score(&light_to_move), QUEEN_VALUE);
        assert_eq!(MaterialScorer.score(&dark_to_move), -QUEEN_VALUE);
    }

    #[test]
    fn mirrored_positions_score_the_same_for_the_mover() {
        let light = board("r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3");
        let dark = board("rnbqkb1r/pppp1ppp/5n2/4p3/4P3/2N5/PPPP1PPP/R1BQKBNR b KQkq - 2 3");
        assert_eq!(TaperedScorer.score(&light), TaperedScorer.score(&dark));
    }

    #[test]
    fn endgame_weight_tracks_remaining_pieces() {
        let start = Board::new_game();
        assert_eq!(MaterialInfo::of(&start, Color::Light).endgame_t, 0.0);
        let bare = board("4k3/pppp4/8/8/8/8/PPPP4/4K3 w - - 0 1");
        assert_eq!(MaterialInfo::of(&bare, Color::Dark).endgame_t, 1.0);
        let rook_only = board("4k2r/8/8/8/8/8/8/R3K3 w - - 0 1");
        let t = MaterialInfo::of(&rook_only, Color::Dark).endgame_t;
        assert!(t > 0.0 && t < 1.0);
    }

    #[test]
    fn passed_pawns_outscore_blocked_ones() {
        let passed = board("4k3/8/8/3P4/8/8/8/4K3 w - - 0 1");
        let opposed = board("4k3/3p4/8/3P4/8/8/8/4K3 w - - 0 1");
        let [light_passed, _] = TaperedScorer.terms(&passed);
        let [light_opposed, _] = TaperedScorer.terms(&opposed);
        assert!(light_passed.pawns > light_opposed.pawns);
        // Lone pawn: passed bonus for three squares from promotion plus one
        // isolated pawn.
        assert_eq!(light_passed.pawns, 50 - 10);
    }

    #[test]
    fn isolated_pawns_are_penalised_by_count() {
        let connected = board("4k3/8/8/8/8/8/PP6/4K3 w - - 0 1");
        let split = board("4k3/8/8/8/8/8/P1P5/4K3 w - - 0 1");
        let [connected_terms, _] = TaperedScorer.terms(&connected);
        let [split_terms, _] = TaperedScorer.terms(&split);
        assert_eq!(connected_terms.pawns - split_terms.pawns, 25);
    }

    #[test]
    fn broken_pawn_shield_costs_safety() {
        let intact = board("r2qk2r/pppppppp/8/8/8/8/PPPPPPPP/R2Q1RK1 w kq - 0 1");
        let broken = board("r2qk2r/pppppppp/8/8/8/6P1/PPPPPP1P/R2Q1RK1 w kq - 0 1");
        let [intact_terms, _] = TaperedScorer.terms(&intact);
        let [broken_terms, _] = TaperedScorer.terms(&broken);
        assert_eq!(intact_terms.pawn_shield, 0);
        assert!(broken_terms.pawn_shield < 0);
    }

    #[test]
    fn mop_up_rewards_cornering_the_lone_king() {
        let cornered = board("k7/8/1K6/8/8/8/8/7Q w - - 0 1");
        let central = board("8/8/8/3k4/8/8/8/K6Q w - - 0 1");
        let [cornered_terms, _] = TaperedScorer.terms(&cornered);
        let [central_terms, _] = TaperedScorer.terms(&central);
        assert!(cornered_terms.mop_up > central_terms.mop_up);
        assert_eq!(cornered_terms.mop_up, (14 - 3) * 4 + 6 * 10);
    }
}
