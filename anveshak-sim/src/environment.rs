//! Ground-truth world the agents explore.
//!
//! Only sensing and movement read it. Everything an agent plans with comes
//! from its own occupancy grid.

use std::path::Path;

use anveshak_map::{GridCoord, MapError, cells_along_line};
use image::GrayImage;
use tracing::info;

use crate::config::EnvironmentConfig;
use crate::error::{Result, SimError};

/// True state of one cell
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Free,
    Obstacle,
}

/// Ground-truth occupancy.
#[derive(Clone, Debug)]
pub struct Environment {
    width: usize,
    height: usize,
    cells: Vec<Status>,
    free_cells: usize,
}

impl Environment {
    pub fn from_cells(width: usize, height: usize, cells: Vec<Status>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(MapError::InvalidDimensions { width, height }.into());
        }
        if cells.len() != width * height {
            return Err(MapError::DimensionMismatch {
                expected: (width, height),
                actual: (cells.len(), 1),
            }
            .into());
        }
        let free_cells = cells.iter().filter(|s| **s == Status::Free).count();
        Ok(Self {
            width,
            height,
            cells,
            free_cells,
        })
    }

    /// World with no obstacles.
    pub fn open(width: usize, height: usize) -> Result<Self> {
        Self::from_cells(width, height, vec![Status::Free; width * height])
    }

    /// Pixels darker than `threshold` are obstacles.
    pub fn from_gray(img: &GrayImage, threshold: u8) -> Result<Self> {
        let (width, height) = (img.width() as usize, img.height() as usize);
        let cells = img
            .pixels()
            .map(|p| {
                if p.0[0] < threshold {
                    Status::Obstacle
                } else {
                    Status::Free
                }
            })
            .collect();
        Self::from_cells(width, height, cells)
    }

    /// Load a PNG or PGM bitmap.
    pub fn from_image(path: &Path, threshold: u8) -> Result<Self> {
        let img = image::open(path)?.into_luma8();
        Self::from_gray(&img, threshold)
    }

    /// `#` is an obstacle, anything else free. Short rows are padded with obstacles.
    pub fn from_ascii(text: &str) -> Result<Self> {
        let rows: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
        let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
        let height = rows.len();

        let mut cells = vec![Status::Obstacle; width * height];
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                if ch != '#' {
                    cells[y * width + x] = Status::Free;
                }
            }
        }
        Self::from_cells(width, height, cells)
    }

    /// Walled grid of `rooms_x` by `rooms_y` rooms joined by doorways.
    pub fn rooms(
        width: usize,
        height: usize,
        rooms_x: usize,
        rooms_y: usize,
        door_width: usize,
    ) -> Result<Self> {
        if rooms_x == 0 || rooms_y == 0 {
            return Err(SimError::InvalidConfig("room counts must be positive".into()));
        }
        let min_room = door_width + 2;
        if width / rooms_x < min_room || height / rooms_y < min_room {
            return Err(SimError::InvalidConfig(format!(
                "{}x{} world too small for {}x{} rooms with {}-cell doors",
                width, height, rooms_x, rooms_y, door_width
            )));
        }

        let mut cells = vec![Status::Free; width * height];
        let mut wall = |x: usize, y: usize, status: Status| cells[y * width + x] = status;

        for x in 0..width {
            wall(x, 0, Status::Obstacle);
            wall(x, height - 1, Status::Obstacle);
        }
        for y in 0..height {
            wall(0, y, Status::Obstacle);
            wall(width - 1, y, Status::Obstacle);
        }

        let xs: Vec<usize> = (1..rooms_x).map(|k| k * width / rooms_x).collect();
        let ys: Vec<usize> = (1..rooms_y).map(|k| k * height / rooms_y).collect();
        let mut x_bounds = vec![0];
        x_bounds.extend(&xs);
        x_bounds.push(width - 1);
        let mut y_bounds = vec![0];
        y_bounds.extend(&ys);
        y_bounds.push(height - 1);

        for &wx in &xs {
            for y in 0..height {
                wall(wx, y, Status::Obstacle);
            }
        }
        for &wy in &ys {
            for x in 0..width {
                wall(x, wy, Status::Obstacle);
            }
        }

        // one doorway per wall segment, centred between the crossing walls
        for &wx in &xs {
            for span in y_bounds.windows(2) {
                for y in door_span(span[0], span[1], door_width) {
                    wall(wx, y, Status::Free);
                }
            }
        }
        for &wy in &ys {
            for span in x_bounds.windows(2) {
                for x in door_span(span[0], span[1], door_width) {
                    wall(x, wy, Status::Free);
                }
            }
        }

        Self::from_cells(width, height, cells)
    }

    /// Build the configured world.
    pub fn from_config(config: &EnvironmentConfig) -> Result<Self> {
        let env = match &config.map {
            Some(map) => {
                let path = Path::new(map);
                let is_ascii = path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("txt"));
                if is_ascii {
                    Self::from_ascii(&std::fs::read_to_string(path)?)?
                } else {
                    Self::from_image(path, config.obstacle_threshold)?
                }
            }
            None => Self::rooms(
                config.width,
                config.height,
                config.rooms_x,
                config.rooms_y,
                config.door_width,
            )?,
        };
        info!(
            "Environment {}x{} with {} free cells",
            env.width, env.height, env.free_cells
        );
        Ok(env)
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn location_exists(&self, coord: GridCoord) -> bool {
        coord.x >= 0
            && coord.y >= 0
            && (coord.x as usize) < self.width
            && (coord.y as usize) < self.height
    }

    /// Outside the world counts as obstacle.
    pub fn status_at(&self, coord: GridCoord) -> Status {
        if !self.location_exists(coord) {
            return Status::Obstacle;
        }
        self.cells[coord.y as usize * self.width + coord.x as usize]
    }

    #[inline]
    pub fn is_free(&self, coord: GridCoord) -> bool {
        self.status_at(coord) == Status::Free
    }

    pub fn free_cell_count(&self) -> usize {
        self.free_cells
    }

    /// No obstacle on the Bresenham line between the two cells.
    pub fn line_of_sight(&self, a: GridCoord, b: GridCoord) -> bool {
        cells_along_line(a, b).into_iter().all(|c| self.is_free(c))
    }
}

fn door_span(lo: usize, hi: usize, door_width: usize) -> impl Iterator<Item = usize> {
    let mid = (lo + hi) / 2;
    let start = mid.saturating_sub(door_width / 2);
    (start..start + door_width).filter(move |v| *v > lo && *v < hi)
}
