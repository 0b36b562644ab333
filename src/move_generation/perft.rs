//! Move-path enumeration for validating the generator and make/unmake.

use crate::game_state::board::Board;
use crate::move_generation::legal_move_generator::{MoveGenerator, PromotionMode};
use crate::moves::move_descriptions::{Move, MoveFlag};

/// Leaf-level tallies; the categories describe the final move of each path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PerftCounts {
    pub nodes: u64,
    pub captures: u64,
    pub en_passant: u64,
    pub castles: u64,
    pub promotions: u64,
    pub checks: u64,
}

impl PerftCounts {
    fn merge(&mut self, rhs: PerftCounts) {
        self.nodes += rhs.nodes;
        self.captures += rhs.captures;
        self.en_passant += rhs.en_passant;
        self.castles += rhs.castles;
        self.promotions += rhs.promotions;
        self.checks += rhs.checks;
    }
}

/// Leaf node count only, bulk-counting at depth one.
pub fn perft(board: &mut Board, depth: u8) -> u64 {
    let mut generator = MoveGenerator::new(PromotionMode::All);
    perft_nodes(board, &mut generator, depth)
}

fn perft_nodes(board: &mut Board, generator: &mut MoveGenerator, depth: u8) -> u64 {
    if depth == 0 {
        return 1;
    }
    let moves = generator.generate_moves(board, false);
    if depth == 1 {
        return moves.len() as u64;
    }

    let mut nodes = 0;
    for mv in moves {
        board.make_move(mv, true);
        nodes += perft_nodes(board, generator, depth - 1);
        board.unmake_move(mv, true);
    }
    nodes
}

/// Full per-category counts at `depth`.
pub fn perft_counts(board: &mut Board, depth: u8) -> PerftCounts {
    let mut generator = MoveGenerator::new(PromotionMode::All);
    let mut total = PerftCounts::default();
    if depth == 0 {
        total.nodes = 1;
        return total;
    }
    count_recurse(board, &mut generator, depth, &mut total);
    total
}

fn count_recurse(board: &mut Board, generator: &mut MoveGenerator, depth: u8, total: &mut PerftCounts) {
    let moves = generator.generate_moves(board, false);
    for mv in moves {
        let is_capture = mv.flag() == MoveFlag::EnPassant || board.piece_at(mv.to()).is_some();
        board.make_move(mv, true);
        if depth == 1 {
            let mut leaf = PerftCounts {
                nodes: 1,
                ..PerftCounts::default()
            };
            leaf.captures = u64::from(is_capture);
            leaf.en_passant = u64::from(mv.flag() == MoveFlag::EnPassant);
            leaf.castles = u64::from(mv.flag() == MoveFlag::Castle);
            leaf.promotions = u64::from(mv.is_promotion());
            leaf.checks = u64::from(board.is_in_check());
            total.merge(leaf);
        } else {
            count_recurse(board, generator, depth - 1, total);
        }
        board.unmake_move(mv, true);
    }
}

/// Node counts below each root move, in generation order.
pub fn perft_divide(board: &mut Board, depth: u8) -> Vec<(Move, u64)> {
    let mut generator = MoveGenerator::new(PromotionMode::All);
    let root_moves = generator.generate_moves(board, false);
    let mut out = Vec::with_capacity(root_moves.len());
    for mv in root_moves {
        board.make_move(mv, true);
        let nodes = perft_nodes(board, &mut generator, depth.saturating_sub(1));
        board.unmake_move(mv, true);
        out.push((mv, nodes));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";

    #[test]
    fn perft_startpos_depths_one_to_three() {
        let mut board = Board::new_game();
        assert_eq!(perft(&mut board, 1), 20);
        assert_eq!(perft(&mut board, 2), 400);
        assert_eq!(perft(&mut board, 3), 8_902);
    }

    #[test]
    fn perft_startpos_depth_four_matches_reference() {
        let mut board = Board::new_game();
        assert_eq!(perft(&mut board, 4), 197_281);
    }

    #[test]
    fn perft_startpos_depth_four_categories() {
        let mut board = Board::new_game();
        let counts = perft_counts(&mut board, 4);
        assert_eq!(counts.nodes, 197_281);
        assert_eq!(counts.captures, 1_576);
        assert_eq!(counts.en_passant, 0);
        assert_eq!(counts.castles, 0);
        assert_eq!(counts.promotions, 0);
        assert_eq!(counts.checks, 469);
    }

    #[test]
    fn perft_kiwipete_exercises_castling_and_en_passant() {
        let mut board = Board::from_fen(KIWIPETE).expect("fen");
        assert_eq!(perft(&mut board, 1), 48);
        let counts = perft_counts(&mut board, 2);
        assert_eq!(counts.nodes, 2_039);
        assert_eq!(counts.captures, 351);
        assert_eq!(counts.en_passant, 1);
        assert_eq!(counts.castles, 91);
        assert_eq!(counts.checks, 3);
        assert_eq!(perft(&mut board, 3), 97_862);
    }

    #[test]
    fn perft_endgame_position_three() {
        let mut board = Board::from_fen("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1").expect("fen");
        assert_eq!(perft(&mut board, 1), 14);
        assert_eq!(perft(&mut board, 2), 191);
        assert_eq!(perft(&mut board, 3), 2_812);
        assert_eq!(perft(&mut board, 4), 43_238);
    }

    #[test]
    fn perft_promotion_heavy_position_four() {
        let mut board =
            Board::from_fen("r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1").expect("fen");
        assert_eq!(perft(&mut board, 1), 6);
        assert_eq!(perft(&mut board, 2), 264);
        assert_eq!(perft(&mut board, 3), 9_467);
    }

    #[test]
    fn perft_position_five() {
        let mut board = Board::from_fen("rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8").expect("fen");
        assert_eq!(perft(&mut board, 1), 44);
        assert_eq!(perft(&mut board, 2), 1_486);
        assert_eq!(perft(&mut board, 3), 62_379);
    }

    #[test]
    fn divide_sums_to_perft() {
        let mut board = Board::from_fen(KIWIPETE).expect("fen");
        let divide = perft_divide(&mut board, 2);
        assert_eq!(divide.len(), 48);
        assert_eq!(divide.iter().map(|(_, n)| n).sum::<u64>(), 2_039);
        assert_eq!(board.to_fen(), KIWIPETE);
    }
}
