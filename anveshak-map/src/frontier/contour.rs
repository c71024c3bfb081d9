//! Moore-neighbour contour tracing over frontier cells.
//!
//! Directions are indexed clockwise in image coordinates (y down):
//!
//! ```text
//!   5 NW   6 N   7 NE
//!   4 W      *   0 E
//!   3 SW   2 S   1 SE
//! ```
//!
//! A trace starts at a frontier cell whose upper neighbour is not a
//! frontier cell, so N is known background and the first search begins at
//! NE. After stepping in direction `d` the search resumes at `(d + 5) % 8`,
//! the neighbour just clockwise of the cell we came from.

use log::{trace, warn};

use crate::core::GridCoord;
use crate::grid::OccupancyGrid;

/// Ordered boundary points of one frontier region.
pub type Contour = Vec<GridCoord>;

const DIRECTIONS: [GridCoord; 8] = [
    GridCoord::new(1, 0),   // E
    GridCoord::new(1, 1),   // SE
    GridCoord::new(0, 1),   // S
    GridCoord::new(-1, 1),  // SW
    GridCoord::new(-1, 0),  // W
    GridCoord::new(-1, -1), // NW
    GridCoord::new(0, -1),  // N
    GridCoord::new(1, -1),  // NE
];

const NORTH_EAST: usize = 7;

/// Traces every frontier region of one grid.
pub struct ContourTracer<'a> {
    grid: &'a OccupancyGrid,
    visited: Vec<bool>,
    max_steps: usize,
}

impl<'a> ContourTracer<'a> {
    pub fn new(grid: &'a OccupancyGrid) -> Self {
        Self {
            grid,
            visited: vec![false; grid.cell_count()],
            max_steps: 8 * grid.cell_count(),
        }
    }

    /// All contours that touch genuinely unknown space, in scan order.
    pub fn find_all_contours(mut self) -> Vec<Contour> {
        let width = self.grid.width() as i32;
        let height = self.grid.height() as i32;
        let mut contours = Vec::new();

        for y in 0..height {
            for x in 0..width {
                let coord = GridCoord::new(x, y);
                if self.is_visited(coord) || !self.grid.frontier_cell_at(coord) {
                    continue;
                }
                if self.grid.frontier_cell_at(GridCoord::new(x, y - 1)) {
                    continue;
                }

                let contour = self.trace(coord);
                if contour.iter().any(|p| self.grid.borders_unknown(*p)) {
                    contours.push(contour);
                } else {
                    trace!(
                        "[Contour] dropped {}-point contour at {}: no unknown border",
                        contour.len(),
                        coord
                    );
                }
            }
        }

        contours
    }

    fn trace(&mut self, start: GridCoord) -> Contour {
        let mut contour = vec![start];
        self.mark_visited(start);

        let mut current = start;
        let mut search = NORTH_EAST;
        let mut second: Option<GridCoord> = None;
        let mut steps = 0usize;

        loop {
            steps += 1;
            if steps > self.max_steps {
                warn!(
                    "[Contour] trace from {} exceeded {} steps, truncating",
                    start, self.max_steps
                );
                break;
            }

            let Some((next, dir)) = self.find_next(current, search) else {
                // isolated pixel
                break;
            };

            if current == start {
                match second {
                    None => second = Some(next),
                    Some(s) if s == next => break,
                    Some(_) => contour.push(start),
                }
            }

            if next != start {
                contour.push(next);
                self.mark_visited(next);
            }

            current = next;
            search = (dir + 5) % 8;
        }

        contour
    }

    fn find_next(&self, current: GridCoord, search: usize) -> Option<(GridCoord, usize)> {
        (0..8).map(|i| (search + i) % 8).find_map(|dir| {
            let candidate = current + DIRECTIONS[dir];
            self.grid
                .frontier_cell_at(candidate)
                .then_some((candidate, dir))
        })
    }

    #[inline]
    fn is_visited(&self, coord: GridCoord) -> bool {
        self.visited[coord.y as usize * self.grid.width() + coord.x as usize]
    }

    #[inline]
    fn mark_visited(&mut self, coord: GridCoord) {
        let idx = coord.y as usize * self.grid.width() + coord.x as usize;
        self.visited[idx] = true;
    }
}

/// Trace all frontier contours of `grid`.
pub fn find_all_contours(grid: &OccupancyGrid) -> Vec<Contour> {
    ContourTracer::new(grid).find_all_contours()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sensed_square(size: usize, known: i32) -> OccupancyGrid {
        let mut grid = OccupancyGrid::new(size, size);
        for y in 0..known {
            for x in 0..known {
                grid.set_free_space_at(GridCoord::new(x, y));
            }
        }
        grid
    }

    #[test]
    fn test_corner_region_contour() {
        let grid = sensed_square(10, 3);
        let contours = find_all_contours(&grid);

        assert_eq!(contours.len(), 1);
        let contour = &contours[0];
        assert_eq!(contour[0], GridCoord::new(2, 0));
        assert_eq!(
            *contour,
            vec![
                GridCoord::new(2, 0),
                GridCoord::new(2, 1),
                GridCoord::new(2, 2),
                GridCoord::new(1, 2),
                GridCoord::new(0, 2),
                GridCoord::new(1, 2),
                GridCoord::new(2, 1),
            ]
        );
        assert!(contour.last().unwrap().is_adjacent(&contour[0]));
    }

    #[test]
    fn test_isolated_pixel() {
        let mut grid = OccupancyGrid::new(5, 5);
        grid.set_free_space_at(GridCoord::new(2, 2));

        let contours = find_all_contours(&grid);
        assert_eq!(contours, vec![vec![GridCoord::new(2, 2)]]);
    }

    #[test]
    fn test_no_frontier_when_fully_known() {
        let mut grid = OccupancyGrid::new(4, 4);
        for y in 0..4 {
            for x in 0..4 {
                grid.set_free_space_at(GridCoord::new(x, y));
            }
        }
        assert!(find_all_contours(&grid).is_empty());
    }

    #[test]
    fn test_two_separate_regions() {
        let mut grid = OccupancyGrid::new(12, 5);
        for y in 1..4 {
            grid.set_free_space_at(GridCoord::new(1, y));
            grid.set_free_space_at(GridCoord::new(2, y));
            grid.set_free_space_at(GridCoord::new(8, y));
            grid.set_free_space_at(GridCoord::new(9, y));
        }

        let contours = find_all_contours(&grid);
        assert_eq!(contours.len(), 2);
        for contour in &contours {
            assert!(contour.len() == 1 || contour.last().unwrap().is_adjacent(&contour[0]));
        }
    }
}
