//! Per-cell flag set for the occupancy grid.
//!
//! Every cell is one byte. Terrain knowledge (`FREE_SPACE`, `SAFE_SPACE`,
//! `OBSTACLE`) sits next to map-sharing bookkeeping (`KNOWN_AT_BASE`,
//! `GOT_RELAYED`) and the topological freeze bit (`FINAL_TOPOLOGICAL_MAP`).
//!
//! ```text
//! bit:   7 6   5        4        3        2        1      0
//!        - -   FINAL    RELAYED  AT_BASE  OBST     SAFE   FREE
//! ```

use serde::{Deserialize, Serialize};
use std::ops::{BitOr, BitOrAssign};

/// One byte of independent cell flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct CellFlags(u8);

impl CellFlags {
    /// No flags: the cell is unknown.
    pub const EMPTY: CellFlags = CellFlags(0);
    /// Observed traversable.
    pub const FREE_SPACE: CellFlags = CellFlags(1 << 0);
    /// Confirmed clear of walls; resists being overwritten by obstacle data.
    pub const SAFE_SPACE: CellFlags = CellFlags(1 << 1);
    /// Observed obstacle.
    pub const OBSTACLE: CellFlags = CellFlags(1 << 2);
    /// Already delivered to the base station.
    pub const KNOWN_AT_BASE: CellFlags = CellFlags(1 << 3);
    /// A teammate has taken responsibility for delivering this cell.
    pub const GOT_RELAYED: CellFlags = CellFlags(1 << 4);
    /// Topological region assignment is frozen.
    pub const FINAL_TOPOLOGICAL_MAP: CellFlags = CellFlags(1 << 5);

    const ALL_BITS: u8 = 0b0011_1111;

    /// Raw byte
    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// From a raw byte; unknown bits are dropped.
    #[inline]
    pub const fn from_bits(bits: u8) -> Self {
        CellFlags(bits & Self::ALL_BITS)
    }

    /// True if every flag in `other` is set.
    #[inline]
    pub const fn contains(self, other: CellFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// True if any flag in `other` is set.
    #[inline]
    pub const fn intersects(self, other: CellFlags) -> bool {
        self.0 & other.0 != 0
    }

    #[inline]
    pub fn insert(&mut self, other: CellFlags) {
        self.0 |= other.0;
    }

    #[inline]
    pub fn remove(&mut self, other: CellFlags) {
        self.0 &= !other.0;
    }

    /// Insert or remove depending on `value`.
    #[inline]
    pub fn set(&mut self, other: CellFlags, value: bool) {
        if value {
            self.insert(other);
        } else {
            self.remove(other);
        }
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Free space flag
    #[inline]
    pub const fn is_free(self) -> bool {
        self.contains(Self::FREE_SPACE)
    }

    /// Obstacle flag
    #[inline]
    pub const fn is_obstacle(self) -> bool {
        self.contains(Self::OBSTACLE)
    }

    /// Safe space flag
    #[inline]
    pub const fn is_safe(self) -> bool {
        self.contains(Self::SAFE_SPACE)
    }

    /// Neither free nor obstacle.
    #[inline]
    pub const fn is_unknown(self) -> bool {
        !self.intersects(CellFlags(Self::FREE_SPACE.0 | Self::OBSTACLE.0))
    }

    /// Free, not yet at the base station and not handed to a relay.
    #[inline]
    pub const fn is_owned(self) -> bool {
        self.is_free()
            && !self.intersects(CellFlags(Self::KNOWN_AT_BASE.0 | Self::GOT_RELAYED.0))
    }

    /// The flags that describe terrain, as opposed to bookkeeping.
    #[inline]
    pub const fn terrain(self) -> CellFlags {
        CellFlags(self.0 & (Self::FREE_SPACE.0 | Self::SAFE_SPACE.0 | Self::OBSTACLE.0))
    }

    /// Single character representation for debugging
    pub fn as_char(self) -> char {
        if self.is_obstacle() {
            '#'
        } else if self.is_safe() {
            ','
        } else if self.is_free() {
            '.'
        } else {
            '?'
        }
    }
}

impl BitOr for CellFlags {
    type Output = CellFlags;

    #[inline]
    fn bitor(self, rhs: CellFlags) -> CellFlags {
        CellFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for CellFlags {
    #[inline]
    fn bitor_assign(&mut self, rhs: CellFlags) {
        self.0 |= rhs.0;
    }
}
