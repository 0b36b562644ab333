//! Iterative deepening negamax alpha-beta search.
//!
//! Each iteration searches the root to a fixed depth with a transposition
//! table, check and seventh-rank pawn extensions, late move reductions for
//! quiet moves, and a capture-only quiescence search at the horizon. The best
//! move of the deepest fully completed iteration is reported; a cancelled
//! iteration only contributes if it searched at least one root move.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Instant;

use tracing::{debug, debug_span, info, trace};

use crate::game_state::board::Board;
use crate::game_state::chess_rules::FIFTY_MOVE_RULE_PLIES;
use crate::game_state::chess_types::{rank_of, PieceKind};
use crate::move_generation::legal_move_generator::{MoveGenerator, PromotionMode};
use crate::moves::move_descriptions::{Move, MoveFlag};
use crate::search::board_scoring::{is_mate_score, mate_distance, BoardScorer, TaperedScorer, IMMEDIATE_MATE_SCORE};
use crate::search::move_ordering::MoveOrderer;
use crate::search::repetition_table::RepetitionTable;
use crate::search::transposition_table::{Bound, TTStats, TranspositionTable};

pub const POSITIVE_INFINITY: i32 = 9_999_999;
pub const NEGATIVE_INFINITY: i32 = -POSITIVE_INFINITY;

/// Depth cut applied to late quiet moves before any full-depth re-search.
const LMR_REDUCTION: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchConfig {
    pub max_depth: u8,
    pub tt_size_mb: usize,
    pub promotion_mode: PromotionMode,
    /// Cap on the number of one-ply extensions along any path.
    pub max_extensions: u8,
    pub use_late_move_reductions: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_depth: 64,
            tt_size_mb: 64,
            promotion_mode: PromotionMode::QueenAndKnight,
            max_extensions: 16,
            use_late_move_reductions: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchEndReason {
    Cancelled,
    /// A forced mate no longer than the completed depth was found.
    MateFound,
    DepthExhausted,
    /// The root position is checkmate or stalemate.
    NoLegalMoves,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchReport {
    pub best_move: Option<Move>,
    /// From the perspective of the side to move at the root.
    pub score: i32,
    /// Deepest fully completed iteration.
    pub depth: u8,
    /// Plies to mate when `score` is a mate score; the sign of `score` says
    /// who mates.
    pub mate_in_plies: Option<u32>,
    pub nodes: u64,
    pub elapsed_ms: u64,
    pub end_reason: SearchEndReason,
    pub tt_stats: TTStats,
}

pub struct Searcher<S: BoardScorer = TaperedScorer> {
    board: Board,
    scorer: S,
    config: SearchConfig,
    generator: MoveGenerator,
    orderer: MoveOrderer,
    tt: TranspositionTable,
    repetition_table: RepetitionTable,
    stop: Arc<AtomicBool>,

    best_move: Option<Move>,
    best_eval: i32,
    best_move_this_iteration: Option<Move>,
    best_eval_this_iteration: i32,
    has_searched_at_least_one_move: bool,
    completed_depth: u8,
    nodes: u64,
}

impl Searcher<TaperedScorer> {
    pub fn new(board: Board, config: SearchConfig) -> Self {
        Self::with_scorer(board, config, TaperedScorer)
    }
}

impl<S: BoardScorer> Searcher<S> {
    pub fn with_scorer(board: Board, config: SearchConfig, scorer: S) -> Self {
        Self {
            board,
            scorer,
            generator: MoveGenerator::new(config.promotion_mode),
            orderer: MoveOrderer::new(),
            tt: TranspositionTable::new_with_mb(config.tt_size_mb),
            repetition_table: RepetitionTable::new(),
            stop: Arc::new(AtomicBool::new(false)),
            config,
            best_move: None,
            best_eval: 0,
            best_move_this_iteration: None,
            best_eval_this_iteration: 0,
            has_searched_at_least_one_move: false,
            completed_depth: 0,
            nodes: 0,
        }
    }

    /// Share an externally owned cancellation flag.
    pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = stop;
        self
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Request cancellation. The flag stays set, so later searches with the
    /// same flag return at once.
    pub fn cancel(&self) {
        trace!("search cancellation requested");
        self.stop.store(true, Ordering::Relaxed);
    }

    #[inline]
    fn is_cancelled(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    /// Best move and score of the most recent search.
    pub fn search_result(&self) -> (Option<Move>, i32) {
        (self.best_move, self.best_eval)
    }

    pub fn clear_transposition_table(&mut self) {
        self.tt.clear();
    }

    /// Run iterative deepening on the owned board until cancelled, a short
    /// enough mate is found or `max_depth` is completed.
    pub fn start_search(&mut self) -> SearchReport {
        let span = debug_span!("search", fen = %self.board.to_fen(), max_depth = self.config.max_depth);
        let _enter = span.enter();
        let started_at = Instant::now();

        self.best_move = None;
        self.best_eval = 0;
        self.best_move_this_iteration = None;
        self.best_eval_this_iteration = 0;
        self.completed_depth = 0;
        self.nodes = 0;
        self.orderer.clear_history();
        self.repetition_table.init(&self.board);

        let root_moves = self.generator.generate_moves(&self.board, false);
        let end_reason = if root_moves.is_empty() {
            self.best_eval = if self.generator.in_check() { -IMMEDIATE_MATE_SCORE } else { 0 };
            SearchEndReason::NoLegalMoves
        } else {
            let reason = self.run_iterative_deepening();
            if self.best_move.is_none() {
                self.best_move = root_moves.first().copied();
            }
            reason
        };

        let report = SearchReport {
            best_move: self.best_move,
            score: self.best_eval,
            depth: self.completed_depth,
            mate_in_plies: is_mate_score(self.best_eval).then(|| mate_distance(self.best_eval) as u32),
            nodes: self.nodes,
            elapsed_ms: started_at.elapsed().as_millis() as u64,
            end_reason,
            tt_stats: self.tt.stats(),
        };

        info!(
            reason = ?report.end_reason,
            depth = report.depth,
            score = report.score,
            best_move = %report.best_move.map_or_else(|| "none".to_owned(), |mv| mv.to_string()),
            nodes = report.nodes,
            elapsed_ms = report.elapsed_ms,
            "search finished"
        );
        report
    }

    fn run_iterative_deepening(&mut self) -> SearchEndReason {
        for depth in 1..=self.config.max_depth.max(1) {
            self.has_searched_at_least_one_move = false;
            self.search(depth as i32, 0, NEGATIVE_INFINITY, POSITIVE_INFINITY, 0);

            if self.is_cancelled() {
                if self.has_searched_at_least_one_move {
                    self.best_move = self.best_move_this_iteration;
                    self.best_eval = self.best_eval_this_iteration;
                }
                trace!(depth, "iteration cancelled");
                return SearchEndReason::Cancelled;
            }

            self.completed_depth = depth;
            self.best_move = self.best_move_this_iteration;
            self.best_eval = self.best_eval_this_iteration;
            self.best_move_this_iteration = None;
            self.best_eval_this_iteration = NEGATIVE_INFINITY;

            debug!(
                depth,
                score = self.best_eval,
                best_move = %self.best_move.map_or_else(|| "none".to_owned(), |mv| mv.to_string()),
                nodes = self.nodes,
                "iteration complete"
            );

            if is_mate_score(self.best_eval) && mate_distance(self.best_eval) <= depth as i32 {
                return SearchEndReason::MateFound;
            }
        }
        SearchEndReason::DepthExhausted
    }

    fn search(&mut self, ply_remaining: i32, ply_from_root: u32, mut alpha: i32, mut beta: i32, num_extensions: u8) -> i32 {
        if self.is_cancelled() {
            return 0;
        }
        self.nodes += 1;

        let key = self.board.zobrist_key();
        if ply_from_root > 0 {
            if self.board.fifty_move_counter() >= FIFTY_MOVE_RULE_PLIES || self.repetition_table.contains(key) {
                return 0;
            }

            // A mate closer to the root than this node has already been found
            // if the window collapses.
            alpha = alpha.max(-IMMEDIATE_MATE_SCORE + ply_from_root as i32);
            beta = beta.min(IMMEDIATE_MATE_SCORE - ply_from_root as i32);
            if alpha >= beta {
                return alpha;
            }
        }

        let tt_depth = ply_remaining.clamp(0, u8::MAX as i32) as u8;
        if let Some(tt_score) = self.tt.lookup(key, tt_depth, ply_from_root, alpha, beta) {
            if ply_from_root > 0 {
                return tt_score;
            }
            if let Some(stored) = self.tt.stored_move(key) {
                self.best_move_this_iteration = Some(stored);
                self.best_eval_this_iteration = tt_score;
                self.has_searched_at_least_one_move = true;
                return tt_score;
            }
        }

        if ply_remaining <= 0 {
            return self.quiescence_search(alpha, beta);
        }

        let mut moves = self.generator.generate_moves(&self.board, false);
        if moves.is_empty() {
            return if self.generator.in_check() {
                -(IMMEDIATE_MATE_SCORE - ply_from_root as i32)
            } else {
                0
            };
        }

        let hash_move = if ply_from_root == 0 {
            self.best_move
        } else {
            self.tt.stored_move(key)
        }
        .unwrap_or(Move::NULL);
        self.orderer.order_moves(
            &self.board,
            &mut moves,
            hash_move,
            self.generator.opponent_attack_map(),
            self.generator.opponent_pawn_attack_map(),
            false,
            ply_from_root as usize,
        );

        if ply_from_root > 0 {
            let reached_irreversibly = self.board.fifty_move_counter() == 0;
            self.repetition_table.push(key, reached_irreversibly);
        }

        let mut bound = Bound::UpperBound;
        let mut best_move_here = None;

        for (i, &mv) in moves.iter().enumerate() {
            let is_quiet =
                !mv.is_promotion() && mv.flag() != MoveFlag::EnPassant && self.board.piece_at(mv.to()).is_none();
            self.board.make_move(mv, true);

            let mut extension = 0;
            if num_extensions < self.config.max_extensions {
                let moved_pawn = self.board.piece_at(mv.to()).is_some_and(|p| p.kind == PieceKind::Pawn);
                let target_rank = rank_of(mv.to());
                if self.board.is_in_check() || (moved_pawn && (target_rank == 1 || target_rank == 6)) {
                    extension = 1;
                }
            }

            let mut needs_full_search = true;
            let mut eval = 0;
            if self.config.use_late_move_reductions && extension == 0 && ply_remaining >= 3 && i >= 3 && is_quiet {
                eval = -self.search(
                    ply_remaining - 1 - LMR_REDUCTION,
                    ply_from_root + 1,
                    -alpha - 1,
                    -alpha,
                    num_extensions,
                );
                needs_full_search = eval > alpha;
            }
            if needs_full_search {
                eval = -self.search(
                    ply_remaining - 1 + extension as i32,
                    ply_from_root + 1,
                    -beta,
                    -alpha,
                    num_extensions + extension,
                );
            }

            self.board.unmake_move(mv, true);

            if self.is_cancelled() {
                if ply_from_root > 0 {
                    self.repetition_table.try_pop();
                }
                return 0;
            }

            if eval >= beta {
                self.tt.store(key, tt_depth, ply_from_root, beta, Bound::LowerBound, Some(mv));
                if is_quiet {
                    self.orderer.add_killer(ply_from_root as usize, mv);
                    self.orderer
                        .add_history(self.board.side_to_move, mv, ply_remaining * ply_remaining);
                }
                if ply_from_root > 0 {
                    self.repetition_table.try_pop();
                }
                return beta;
            }

            if eval > alpha {
                bound = Bound::Exact;
                best_move_here = Some(mv);
                alpha = eval;
                if ply_from_root == 0 {
                    self.best_move_this_iteration = Some(mv);
                    self.best_eval_this_iteration = eval;
                    self.has_searched_at_least_one_move = true;
                }
            }
        }

        if ply_from_root > 0 {
            self.repetition_table.try_pop();
        }
        self.tt.store(key, tt_depth, ply_from_root, alpha, bound, best_move_here);
        alpha
    }

    /// Capture-only search from a static evaluation until the position is
    /// quiet.
    fn quiescence_search(&mut self, mut alpha: i32, beta: i32) -> i32 {
        if self.is_cancelled() {
            return 0;
        }
        self.nodes += 1;

        let stand_pat = self.scorer.score(&self.board);
        if stand_pat >= beta {
            return beta;
        }
        alpha = alpha.max(stand_pat);

        let mut moves = self.generator.generate_moves(&self.board, true);
        self.orderer.order_moves(
            &self.board,
            &mut moves,
            Move::NULL,
            self.generator.opponent_attack_map(),
            self.generator.opponent_pawn_attack_map(),
            true,
            0,
        );

        for mv in moves {
            self.board.make_move(mv, true);
            let eval = -self.quiescence_search(-beta, -alpha);
            self.board.unmake_move(mv, true);

            if eval >= beta {
                return beta;
            }
            alpha = alpha.max(eval);
        }

        alpha
    }
}
