//! Fixed-size transposition table keyed by Zobrist hash.
//!
//! Slots are addressed by `key % capacity` and every store overwrites its
//! slot. Readers compare the full key, so a slot holding another position is
//! a miss. Mate scores are stored relative to the node that produced them and
//! converted back to root-relative scores on retrieval.

use tracing::trace;

use crate::moves::move_descriptions::Move;
use crate::search::board_scoring::is_mate_score;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Exact,
    /// The true score is at least the stored one (fail high).
    LowerBound,
    /// The true score is at most the stored one (no move raised alpha).
    UpperBound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TTEntry {
    pub key: u64,
    pub score: i32,
    pub depth: u8,
    pub bound: Bound,
    pub best_move: Option<Move>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TTStats {
    pub probes: u64,
    pub hits: u64,
    pub stores: u64,
}

#[derive(Debug, Clone)]
pub struct TranspositionTable {
    entries: Vec<Option<TTEntry>>,
    stats: TTStats,
}

impl TranspositionTable {
    pub fn new_with_mb(size_mb: usize) -> Self {
        let bytes = size_mb.max(1) * 1024 * 1024;
        let entry_size = std::mem::size_of::<Option<TTEntry>>().max(1);
        let capacity = bytes / entry_size;
        trace!(size_mb, capacity, "allocating transposition table");
        Self::with_capacity(capacity)
    }

    pub fn with_capacity(entries: usize) -> Self {
        Self {
            entries: vec![None; entries.max(1)],
            stats: TTStats::default(),
        }
    }

    #[inline]
    pub fn clear(&mut self) {
        self.entries.fill(None);
        self.stats = TTStats::default();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn stats(&self) -> TTStats {
        self.stats
    }

    #[inline]
    fn idx(&self, key: u64) -> usize {
        (key % self.entries.len() as u64) as usize
    }

    /// Entry stored for exactly this key, if the slot still holds it.
    pub fn probe(&self, key: u64) -> Option<TTEntry> {
        self.entries[self.idx(key)].filter(|entry| entry.key == key)
    }

    /// Cached score usable at this node: the stored search was at least as
    /// deep as `depth` and its bound settles the `(alpha, beta)` window.
    pub fn lookup(&mut self, key: u64, depth: u8, ply_from_root: u32, alpha: i32, beta: i32) -> Option<i32> {
        self.stats.probes += 1;
        let entry = self.probe(key).filter(|entry| entry.depth >= depth)?;
        let score = correct_retrieved_mate_score(entry.score, ply_from_root);
        let usable = match entry.bound {
            Bound::Exact => true,
            Bound::UpperBound => score <= alpha,
            Bound::LowerBound => score >= beta,
        };
        if usable {
            self.stats.hits += 1;
            Some(score)
        } else {
            None
        }
    }

    pub fn stored_move(&self, key: u64) -> Option<Move> {
        self.probe(key).and_then(|entry| entry.best_move)
    }

    pub fn store(&mut self, key: u64, depth: u8, ply_from_root: u32, score: i32, bound: Bound, best_move: Option<Move>) {
        self.stats.stores += 1;
        let idx = self.idx(key);
        self.entries[idx] = Some(TTEntry {
            key,
            score: correct_mate_score_for_storage(score, ply_from_root),
            depth,
            bound,
            best_move: best_move.filter(|mv| !mv.is_null()),
        });
    }
}

/// Mate scores found in search are relative to the root; stored entries make
/// them relative to the node so a transposition at another depth reads the
/// right distance.
#[inline]
fn correct_mate_score_for_storage(score: i32, ply_from_root: u32) -> i32 {
    if is_mate_score(score) {
        score.signum() * (score.abs() + ply_from_root as i32)
    } else {
        score
    }
}

#[inline]
fn correct_retrieved_mate_score(score: i32, ply_from_root: u32) -> i32 {
    if is_mate_score(score) {
        score.signum() * (score.abs() - ply_from_root as i32)
    } else {
        score
    }
}
