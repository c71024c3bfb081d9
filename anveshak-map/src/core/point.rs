//! Grid coordinate type.
//!
//! Grids use image coordinates: `x` is the column, `y` is the row, and rows
//! grow downward. "Above" a cell therefore means `y - 1`.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

/// Grid coordinates (integer cell indices)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct GridCoord {
    /// Column index
    pub x: i32,
    /// Row index (grows downward)
    pub y: i32,
}

impl GridCoord {
    /// Create a new grid coordinate
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance to another coordinate
    #[inline]
    pub fn manhattan_distance(&self, other: &GridCoord) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// Chebyshev distance (max of x and y distance) - used for 8-connected grids
    #[inline]
    pub fn chebyshev_distance(&self, other: &GridCoord) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }

    /// Euclidean distance in cells
    #[inline]
    pub fn distance(&self, other: &GridCoord) -> f64 {
        self.distance_squared(other).sqrt()
    }

    /// Squared Euclidean distance in cells
    #[inline]
    pub fn distance_squared(&self, other: &GridCoord) -> f64 {
        let dx = (self.x - other.x) as f64;
        let dy = (self.y - other.y) as f64;
        dx * dx + dy * dy
    }

    /// True when the two cells touch under 8-connectivity (or are equal)
    #[inline]
    pub fn is_adjacent(&self, other: &GridCoord) -> bool {
        self.chebyshev_distance(other) <= 1
    }

    /// The 4 cardinal neighbors (N, S, E, W)
    #[inline]
    pub fn neighbors_4(&self) -> [GridCoord; 4] {
        [
            GridCoord::new(self.x, self.y - 1), // N
            GridCoord::new(self.x, self.y + 1), // S
            GridCoord::new(self.x + 1, self.y), // E
            GridCoord::new(self.x - 1, self.y), // W
        ]
    }

    /// The 8 neighbors, cardinals first, then diagonals.
    ///
    /// The order is N, S, E, W, NE, NW, SE, SW. Region growing relies on it
    /// as its tie-break precedence.
    #[inline]
    pub fn neighbors_8(&self) -> [GridCoord; 8] {
        [
            GridCoord::new(self.x, self.y - 1),     // N
            GridCoord::new(self.x, self.y + 1),     // S
            GridCoord::new(self.x + 1, self.y),     // E
            GridCoord::new(self.x - 1, self.y),     // W
            GridCoord::new(self.x + 1, self.y - 1), // NE
            GridCoord::new(self.x - 1, self.y - 1), // NW
            GridCoord::new(self.x + 1, self.y + 1), // SE
            GridCoord::new(self.x - 1, self.y + 1), // SW
        ]
    }
}

impl Add for GridCoord {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        GridCoord::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for GridCoord {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        GridCoord::new(self.x - other.x, self.y - other.y)
    }
}

impl std::fmt::Display for GridCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
