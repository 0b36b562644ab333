//! Move ordering heuristics: hash move, capture ordering aware of recaptures,
//! promotions, killer moves and the history table.

use crate::game_state::{board::Board, chess_types::*};
use crate::moves::bit_utils::contains_square;
use crate::moves::move_descriptions::{Move, MoveFlag};
use crate::search::board_scoring::piece_value;
use crate::search::piece_square_tables::{read, table_for};

pub const MAX_KILLER_PLY: usize = 32;

const HASH_MOVE_SCORE: i32 = 100_000_000;
const WINNING_CAPTURE_BIAS: i32 = 8_000_000;
const PROMOTE_BIAS: i32 = 6_000_000;
const KILLER_BIAS: i32 = 4_000_000;
const LOSING_CAPTURE_BIAS: i32 = 2_000_000;

/// The two most recent quiet cutoff moves at one ply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Killers {
    pub move_a: Move,
    pub move_b: Move,
}

impl Killers {
    pub fn add(&mut self, mv: Move) {
        if mv != self.move_a {
            self.move_b = self.move_a;
            self.move_a = mv;
        }
    }

    #[inline]
    pub fn matches(&self, mv: Move) -> bool {
        !mv.is_null() && (mv == self.move_a || mv == self.move_b)
    }
}

#[derive(Debug, Clone)]
pub struct MoveOrderer {
    killers: [Killers; MAX_KILLER_PLY],
    history: Box<[[[i32; 64]; 64]; 2]>,
    scored: Vec<(i32, Move)>,
}

impl Default for MoveOrderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MoveOrderer {
    pub fn new() -> Self {
        Self {
            killers: [Killers::default(); MAX_KILLER_PLY],
            history: Box::new([[[0; 64]; 64]; 2]),
            scored: Vec::with_capacity(128),
        }
    }

    pub fn clear_history(&mut self) {
        self.history.iter_mut().flatten().for_each(|row| row.fill(0));
    }

    pub fn clear_killers(&mut self) {
        self.killers = [Killers::default(); MAX_KILLER_PLY];
    }

    pub fn clear(&mut self) {
        self.clear_history();
        self.clear_killers();
    }

    /// Remember a quiet move that caused a beta cutoff at `ply`.
    pub fn add_killer(&mut self, ply: usize, mv: Move) {
        if ply < MAX_KILLER_PLY {
            self.killers[ply].add(mv);
        }
    }

    pub fn killers(&self, ply: usize) -> Option<&Killers> {
        self.killers.get(ply)
    }

    pub fn add_history(&mut self, color: Color, mv: Move, bonus: i32) {
        let entry = &mut self.history[color.index()][mv.from() as usize][mv.to() as usize];
        *entry = entry.saturating_add(bonus);
    }

    pub fn history(&self, color: Color, mv: Move) -> i32 {
        self.history[color.index()][mv.from() as usize][mv.to() as usize]
    }

    /// Heuristic score of a single move; higher is searched earlier.
    #[allow(clippy::too_many_arguments)]
    pub fn score_move(
        &self,
        board: &Board,
        mv: Move,
        hash_move: Move,
        opponent_attacks: u64,
        opponent_pawn_attacks: u64,
        in_quiescence: bool,
        ply: usize,
    ) -> i32 {
        if !hash_move.is_null() && mv == hash_move {
            return HASH_MOVE_SCORE;
        }

        let from = mv.from();
        let to = mv.to();
        let Some(moving) = board.piece_at(from) else {
            return 0;
        };
        let captured = match mv.flag() {
            MoveFlag::EnPassant => Some(PieceKind::Pawn),
            _ => board.piece_at(to).map(|piece| piece.kind),
        };

        let mut score = 0;
        if let Some(victim) = captured {
            let delta = piece_value(victim) - piece_value(moving.kind);
            let can_recapture = contains_square(opponent_attacks | opponent_pawn_attacks, to);
            let bias = if can_recapture && delta < 0 {
                LOSING_CAPTURE_BIAS
            } else {
                WINNING_CAPTURE_BIAS
            };
            score += bias + delta;
        }

        match moving.kind {
            PieceKind::Pawn => {
                if mv.flag() == MoveFlag::PromoteQueen && captured.is_none() {
                    score += PROMOTE_BIAS;
                }
            }
            PieceKind::King => {}
            kind => {
                let table = table_for(kind);
                score += read(table, to, moving.color) - read(table, from, moving.color);
                if contains_square(opponent_pawn_attacks, to) {
                    score -= 50;
                } else if contains_square(opponent_attacks, to) {
                    score -= 25;
                }
            }
        }

        if captured.is_none() {
            if !in_quiescence && ply < MAX_KILLER_PLY && self.killers[ply].matches(mv) {
                score += KILLER_BIAS;
            }
            score += self.history(moving.color, mv);
        }

        score
    }

    /// Sort `moves` best first. Equal scores keep generation order.
    #[allow(clippy::too_many_arguments)]
    pub fn order_moves(
        &mut self,
        board: &Board,
        moves: &mut [Move],
        hash_move: Move,
        opponent_attacks: u64,
        opponent_pawn_attacks: u64,
        in_quiescence: bool,
        ply: usize,
    ) {
        let mut scored = std::mem::take(&mut self.scored);
        scored.clear();
        scored.extend(moves.iter().map(|&mv| {
            let score = self.score_move(
                board,
                mv,
                hash_move,
                opponent_attacks,
                opponent_pawn_attacks,
                in_quiescence,
                ply,
            );
            (score, mv)
        }));
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        for (slot, &(_, mv)) in moves.iter_mut().zip(scored.iter()) {
            *slot = mv;
        }
        self.scored = scored;
    }
}
