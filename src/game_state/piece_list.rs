//! Dense per-(color, kind) square lists with an inverse index, so adding,
//! removing and relocating a piece are all O(1).

use crate::game_state::chess_types::Square;

pub const MAX_PIECES: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PieceList {
    squares: [Square; MAX_PIECES],
    /// `slot_of[square]` is the position of `square` inside `squares`; only
    /// meaningful for squares currently in the list.
    slot_of: [u8; 64],
    len: usize,
}

impl Default for PieceList {
    fn default() -> Self {
        Self {
            squares: [0; MAX_PIECES],
            slot_of: [0; 64],
            len: 0,
        }
    }
}

impl PieceList {
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn as_slice(&self) -> &[Square] {
        &self.squares[..self.len]
    }

    #[inline]
    pub fn add(&mut self, square: Square) {
        debug_assert!(self.len < MAX_PIECES, "piece list overflow");
        self.squares[self.len] = square;
        self.slot_of[square as usize] = self.len as u8;
        self.len += 1;
    }

    /// Remove `square`, filling the hole with the last entry.
    #[inline]
    pub fn remove(&mut self, square: Square) {
        debug_assert!(self.len > 0, "piece list underflow");
        let slot = self.slot_of[square as usize] as usize;
        debug_assert_eq!(self.squares[slot], square, "square not in piece list");
        let last = self.squares[self.len - 1];
        self.squares[slot] = last;
        self.slot_of[last as usize] = slot as u8;
        self.len -= 1;
    }

    #[inline]
    pub fn relocate(&mut self, from: Square, to: Square) {
        let slot = self.slot_of[from as usize] as usize;
        debug_assert_eq!(self.squares[slot], from, "square not in piece list");
        self.squares[slot] = to;
        self.slot_of[to as usize] = slot as u8;
    }
}
