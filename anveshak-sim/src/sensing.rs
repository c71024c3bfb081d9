//! Ray-cast range sensing.
//!
//! Rays run from the agent to every cell on the square of half-width
//! `ceil(sensor_range)` and stop at the first obstacle or at the range.

use anveshak_map::{BresenhamLine, GridCoord, OccupancyGrid};

use crate::environment::{Environment, Status};

/// Sensor geometry in cells.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SensorModel {
    pub range: f64,
    pub safe_range: f64,
}

/// What one sensing pass changed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SenseResult {
    /// Cells seen for the first time
    pub discovered: usize,
    pub obstacles: usize,
}

impl SensorModel {
    pub fn new(range: f64, safe_range: f64) -> Self {
        Self { range, safe_range }
    }

    /// Sense the ground truth around `position` into `grid`.
    pub fn sense(
        &self,
        env: &Environment,
        grid: &mut OccupancyGrid,
        position: GridCoord,
    ) -> SenseResult {
        let mut result = SenseResult::default();
        if !env.location_exists(position) {
            return result;
        }
        self.mark_free(grid, position, position, &mut result);

        let r = self.range.ceil() as i32;
        for target in square_ring(position, r) {
            for cell in BresenhamLine::new(position, target).skip(1) {
                if cell.distance(&position) > self.range || !env.location_exists(cell) {
                    break;
                }
                match env.status_at(cell) {
                    Status::Free => self.mark_free(grid, cell, position, &mut result),
                    Status::Obstacle => {
                        if grid.is_unknown(cell) {
                            result.discovered += 1;
                        }
                        if !grid.safe_space_at(cell) && !grid.obstacle_at(cell) {
                            grid.set_obstacle_at(cell);
                            result.obstacles += 1;
                        }
                        break;
                    }
                }
            }
        }
        result
    }

    fn mark_free(
        &self,
        grid: &mut OccupancyGrid,
        cell: GridCoord,
        origin: GridCoord,
        result: &mut SenseResult,
    ) {
        if grid.is_unknown(cell) {
            result.discovered += 1;
        }
        if cell.distance(&origin) <= self.safe_range {
            grid.set_safe_space_at(cell);
        } else {
            grid.set_free_space_at(cell);
        }
    }
}

/// Cells on the boundary of the square of half-width `r` around `centre`.
fn square_ring(centre: GridCoord, r: i32) -> impl Iterator<Item = GridCoord> {
    let top_bottom = (-r..=r).flat_map(move |dx| [(dx, -r), (dx, r)]);
    let sides = (-r + 1..r).flat_map(move |dy| [(-r, dy), (r, dy)]);
    top_bottom
        .chain(sides)
        .map(move |(dx, dy)| GridCoord::new(centre.x + dx, centre.y + dy))
}
