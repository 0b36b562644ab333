//! Position keys along the current search path, seeded with the game's
//! repetition history, for in-search repetition draws.
//!
//! Each pushed key records where the reversible stretch containing it starts,
//! so lookups never scan past the last pawn move or capture.

use crate::game_state::board::Board;

#[derive(Debug, Clone, Default)]
pub struct RepetitionTable {
    hashes: Vec<u64>,
    /// `start_indices[n]` is the first index to scan when `n` keys are held.
    start_indices: Vec<usize>,
}

impl RepetitionTable {
    pub fn new() -> Self {
        Self {
            hashes: Vec::with_capacity(256),
            start_indices: vec![0],
        }
    }

    /// Reset to the positions of the real game since its last irreversible
    /// move, the current position included.
    pub fn init(&mut self, board: &Board) {
        self.hashes.clear();
        self.hashes.extend_from_slice(board.repetition_history());
        self.start_indices.clear();
        self.start_indices.resize(self.hashes.len() + 1, 0);
    }

    /// Push a key; `reset` marks a position reached by an irreversible move.
    pub fn push(&mut self, hash: u64, reset: bool) {
        let count = self.hashes.len();
        let start = if reset { count } else { self.start_indices[count] };
        self.hashes.push(hash);
        self.start_indices.push(start);
    }

    pub fn try_pop(&mut self) {
        if self.hashes.pop().is_some() {
            self.start_indices.pop();
        }
    }

    pub fn contains(&self, hash: u64) -> bool {
        let count = self.hashes.len();
        self.hashes[self.start_indices[count]..].contains(&hash)
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }
}
