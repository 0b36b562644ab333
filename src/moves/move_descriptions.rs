//! Packed move representation.
//!
//! Bits 0..6 hold the start square, bits 6..12 the target square and bits
//! 12..16 a `MoveFlag`. Equality is bitwise; the all-zero value is the null
//! move (a1a1 is never a legal move).

use std::fmt;

use crate::game_state::chess_types::{PieceKind, Square};

const FROM_SHIFT: u16 = 0;
const TO_SHIFT: u16 = 6;
const FLAG_SHIFT: u16 = 12;
const SQUARE_MASK: u16 = 0x3F;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MoveFlag {
    Quiet = 0,
    DoublePawnPush = 1,
    EnPassant = 2,
    Castle = 3,
    PromoteQueen = 4,
    PromoteRook = 5,
    PromoteBishop = 6,
    PromoteKnight = 7,
}

impl MoveFlag {
    #[inline]
    const fn from_bits(bits: u16) -> Self {
        match bits {
            1 => MoveFlag::DoublePawnPush,
            2 => MoveFlag::EnPassant,
            3 => MoveFlag::Castle,
            4 => MoveFlag::PromoteQueen,
            5 => MoveFlag::PromoteRook,
            6 => MoveFlag::PromoteBishop,
            7 => MoveFlag::PromoteKnight,
            _ => MoveFlag::Quiet,
        }
    }

    pub const fn for_promotion(kind: PieceKind) -> Self {
        match kind {
            PieceKind::Rook => MoveFlag::PromoteRook,
            PieceKind::Bishop => MoveFlag::PromoteBishop,
            PieceKind::Knight => MoveFlag::PromoteKnight,
            _ => MoveFlag::PromoteQueen,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Move(u16);

impl Move {
    pub const NULL: Move = Move(0);

    #[inline]
    pub const fn new(from: Square, to: Square, flag: MoveFlag) -> Self {
        Move(
            ((from as u16) << FROM_SHIFT)
                | ((to as u16) << TO_SHIFT)
                | ((flag as u16) << FLAG_SHIFT),
        )
    }

    #[inline]
    pub const fn quiet(from: Square, to: Square) -> Self {
        Self::new(from, to, MoveFlag::Quiet)
    }

    #[inline]
    pub const fn from(self) -> Square {
        ((self.0 >> FROM_SHIFT) & SQUARE_MASK) as Square
    }

    #[inline]
    pub const fn to(self) -> Square {
        ((self.0 >> TO_SHIFT) & SQUARE_MASK) as Square
    }

    #[inline]
    pub const fn flag(self) -> MoveFlag {
        MoveFlag::from_bits(self.0 >> FLAG_SHIFT)
    }

    #[inline]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_promotion(self) -> bool {
        (self.0 >> FLAG_SHIFT) >= MoveFlag::PromoteQueen as u16
    }

    /// Piece kind a pawn turns into, if this move promotes.
    #[inline]
    pub const fn promotion_kind(self) -> Option<PieceKind> {
        match self.flag() {
            MoveFlag::PromoteQueen => Some(PieceKind::Queen),
            MoveFlag::PromoteRook => Some(PieceKind::Rook),
            MoveFlag::PromoteBishop => Some(PieceKind::Bishop),
            MoveFlag::PromoteKnight => Some(PieceKind::Knight),
            _ => None,
        }
    }

    #[inline]
    pub const fn raw(self) -> u16 {
        self.0
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::utils::long_algebraic::move_to_uci(*self))
    }
}
