//! Bresenham line rasterization.
//!
//! Used by the simulator's ray-cast sensing and by [`Path::all_pixels`]
//! to recover every cell touched by a path with gaps between waypoints.
//!
//! ```text
//! From (0,0) to (7,3):
//!
//!     0 ●●
//!     1   ●●
//!     2     ●●
//!     3        ●
//!       └──────────
//!        0 1 2 3 4 5 6 7
//! ```
//!
//! [`Path::all_pixels`]: crate::pathfinding::Path::all_pixels

use super::GridCoord;

/// Bresenham's line algorithm iterator.
///
/// Yields every grid cell from `start` to `end`, both inclusive.
pub struct BresenhamLine {
    x: i32,
    y: i32,
    dx: i32,
    dy: i32,
    x_inc: i32,
    y_inc: i32,
    error: i32,
    steep: bool,
    end_x: i32,
    end_y: i32,
    done: bool,
}

impl BresenhamLine {
    /// Create a new Bresenham line iterator from start to end coordinates.
    pub fn new(start: GridCoord, end: GridCoord) -> Self {
        let dx = (end.x - start.x).abs();
        let dy = (end.y - start.y).abs();
        let steep = dy > dx;

        let (x, y, end_x, end_y, dx, dy) = if steep {
            (start.y, start.x, end.y, end.x, dy, dx)
        } else {
            (start.x, start.y, end.x, end.y, dx, dy)
        };

        let x_inc = if end_x > x { 1 } else { -1 };
        let y_inc = if end_y > y { 1 } else { -1 };

        Self {
            x,
            y,
            dx,
            dy,
            x_inc,
            y_inc,
            error: dx / 2,
            steep,
            end_x,
            end_y,
            done: false,
        }
    }
}

impl Iterator for BresenhamLine {
    type Item = GridCoord;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let result = if self.steep {
            GridCoord::new(self.y, self.x)
        } else {
            GridCoord::new(self.x, self.y)
        };

        if self.x == self.end_x && self.y == self.end_y {
            self.done = true;
            return Some(result);
        }

        self.error -= self.dy;
        if self.error < 0 {
            self.y += self.y_inc;
            self.error += self.dx;
        }
        self.x += self.x_inc;

        Some(result)
    }
}

/// Collect all cells along a line from start to end.
pub fn cells_along_line(start: GridCoord, end: GridCoord) -> Vec<GridCoord> {
    BresenhamLine::new(start, end).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bresenham_horizontal() {
        let cells = cells_along_line(GridCoord::new(0, 0), GridCoord::new(5, 0));
        assert_eq!(cells.len(), 6);
        assert_eq!(cells[5], GridCoord::new(5, 0));
    }

    #[test]
    fn test_bresenham_steep_negative() {
        let cells = cells_along_line(GridCoord::new(2, 5), GridCoord::new(0, 0));
        assert_eq!(cells.len(), 6);
        assert_eq!(cells[0], GridCoord::new(2, 5));
        assert_eq!(cells[5], GridCoord::new(0, 0));
        for pair in cells.windows(2) {
            assert!(pair[0].is_adjacent(&pair[1]));
        }
    }

    #[test]
    fn test_single_cell_line() {
        let p = GridCoord::new(3, 3);
        assert_eq!(cells_along_line(p, p), vec![p]);
    }
}
