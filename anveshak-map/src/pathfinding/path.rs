//! Grid path value with a read cursor.

use serde::{Deserialize, Serialize};

use crate::core::{GridCoord, cells_along_line};

/// Reason for path failure
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathFailure {
    /// Start position is not traversable
    StartBlocked,
    /// Goal position is not traversable
    GoalBlocked,
    /// No path exists between start and goal
    NoPath,
    /// Maximum iterations exceeded
    MaxIterationsExceeded,
    /// Start or goal is out of bounds
    OutOfBounds,
}

impl std::fmt::Display for PathFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PathFailure::StartBlocked => "start blocked",
            PathFailure::GoalBlocked => "goal blocked",
            PathFailure::NoPath => "no path",
            PathFailure::MaxIterationsExceeded => "max iterations exceeded",
            PathFailure::OutOfBounds => "out of bounds",
        };
        f.write_str(s)
    }
}

/// Ordered grid points from start to goal.
///
/// The cursor marks the point the agent currently stands on; [`Path::advance`]
/// moves it forward instead of popping points off a shared list.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Path {
    points: Vec<GridCoord>,
    found: bool,
    length: f64,
    cursor: usize,
    failure: Option<PathFailure>,
}

impl Path {
    /// A found path over `points`. An empty list yields a not-found path.
    pub fn new(points: Vec<GridCoord>) -> Self {
        if points.is_empty() {
            return Self::failed(PathFailure::NoPath);
        }
        let mut path = Self {
            points,
            found: true,
            length: 0.0,
            cursor: 0,
            failure: None,
        };
        path.recompute_length();
        path
    }

    /// A not-found path
    pub fn failed(reason: PathFailure) -> Self {
        Self {
            points: Vec::new(),
            found: false,
            length: 0.0,
            cursor: 0,
            failure: Some(reason),
        }
    }

    #[inline]
    pub fn found(&self) -> bool {
        self.found
    }

    #[inline]
    pub fn failure_reason(&self) -> Option<PathFailure> {
        self.failure
    }

    #[inline]
    pub fn points(&self) -> &[GridCoord] {
        &self.points
    }

    /// Euclidean length over consecutive points.
    #[inline]
    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn start_point(&self) -> Option<GridCoord> {
        self.points.first().copied()
    }

    pub fn goal_point(&self) -> Option<GridCoord> {
        self.points.last().copied()
    }

    /// Recompute and cache the length from the point list.
    pub fn recompute_length(&mut self) -> f64 {
        self.length = self
            .points
            .windows(2)
            .map(|pair| pair[0].distance(&pair[1]))
            .sum();
        self.length
    }

    /// Every cell touched by the path, filling gaps between waypoints.
    pub fn all_pixels(&self) -> Vec<GridCoord> {
        let Some(&first) = self.points.first() else {
            return Vec::new();
        };
        let mut pixels = vec![first];
        for pair in self.points.windows(2) {
            pixels.extend(cells_along_line(pair[0], pair[1]).into_iter().skip(1));
        }
        pixels
    }

    /// Same path walked from goal to start, cursor reset.
    pub fn reversed(&self) -> Path {
        if !self.found {
            return self.clone();
        }
        let mut points = self.points.clone();
        points.reverse();
        Path::new(points)
    }

    /// Append `other`, dropping its first point when it repeats our last.
    pub fn concat(&self, other: &Path) -> Path {
        if !self.found {
            return other.clone();
        }
        if !other.found {
            return self.clone();
        }
        let mut points = self.points.clone();
        let skip = usize::from(points.last() == other.points.first());
        points.extend(other.points.iter().skip(skip));
        Path::new(points)
    }

    // === Cursor ===

    /// Point the cursor is on
    pub fn current_point(&self) -> Option<GridCoord> {
        self.points.get(self.cursor).copied()
    }

    /// Point after the cursor
    pub fn next_point(&self) -> Option<GridCoord> {
        self.points.get(self.cursor + 1).copied()
    }

    /// Points after the cursor
    pub fn remaining(&self) -> &[GridCoord] {
        self.points.get(self.cursor + 1..).unwrap_or(&[])
    }

    /// Move the cursor one point forward and return the new current point.
    pub fn advance(&mut self) -> Option<GridCoord> {
        if self.cursor + 1 < self.points.len() {
            self.cursor += 1;
            self.current_point()
        } else {
            None
        }
    }

    /// Move the cursor up to `steps` points forward.
    pub fn advance_by(&mut self, steps: usize) -> Option<GridCoord> {
        let mut last = None;
        for _ in 0..steps {
            match self.advance() {
                Some(p) => last = Some(p),
                None => break,
            }
        }
        last
    }

    /// True once the cursor sits on the goal (or the path is empty).
    pub fn is_finished(&self) -> bool {
        self.cursor + 1 >= self.points.len()
    }
}
