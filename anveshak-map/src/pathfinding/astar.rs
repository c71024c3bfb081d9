//! A* pathfinding on the occupancy grid.
//!
//! 8-connected search with the octile heuristic. A cell is passable when its
//! terrain class does not exceed the agent's ability:
//!
//! | Terrain        | Class |
//! |----------------|-------|
//! | safe free      | 0     |
//! | free           | 1     |
//! | unknown        | 2     |
//! | obstacle       | never |
//!
//! Diagonal steps are refused when both orthogonal cells beside them are
//! impassable.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use super::path::{Path, PathFailure};
use crate::core::GridCoord;
use crate::grid::{CellFlags, OccupancyGrid};

/// Terrain class of safe free space
pub const TERRAIN_SAFE: u8 = 0;
/// Terrain class of free space
pub const TERRAIN_FREE: u8 = 1;
/// Terrain class of unknown space
pub const TERRAIN_UNKNOWN: u8 = 2;

/// Ability of an agent that only drives over known free space.
pub const DEFAULT_ABILITY: u8 = TERRAIN_FREE;

/// Terrain class of a cell, `None` for obstacles.
#[inline]
pub fn terrain_class(flags: CellFlags) -> Option<u8> {
    if flags.is_obstacle() {
        None
    } else if flags.is_safe() {
        Some(TERRAIN_SAFE)
    } else if flags.is_free() {
        Some(TERRAIN_FREE)
    } else {
        Some(TERRAIN_UNKNOWN)
    }
}

/// A node in the A* search
#[derive(Clone, Debug)]
struct AStarNode {
    coord: GridCoord,
    g_cost: f64, // Cost from start
    f_cost: f64, // g_cost + heuristic
}

impl Eq for AStarNode {}

impl PartialEq for AStarNode {
    fn eq(&self, other: &Self) -> bool {
        self.coord == other.coord
    }
}

impl Ord for AStarNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap behavior
        other
            .f_cost
            .partial_cmp(&self.f_cost)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.coord.cmp(&self.coord))
    }
}

impl PartialOrd for AStarNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A* pathfinding configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AStarConfig {
    /// Allow diagonal movement (8-connected vs 4-connected)
    pub allow_diagonal: bool,
    /// Diagonal movement cost (sqrt(2))
    pub diagonal_cost: f64,
    /// Maximum number of nodes to expand before giving up
    pub max_iterations: usize,
}

impl Default for AStarConfig {
    fn default() -> Self {
        Self {
            allow_diagonal: true,
            diagonal_cost: std::f64::consts::SQRT_2,
            max_iterations: 200_000,
        }
    }
}

/// A* pathfinder over one agent's grid.
pub struct AStarPlanner<'a> {
    grid: &'a OccupancyGrid,
    config: AStarConfig,
    ability: u8,
    region: Option<&'a dyn Fn(GridCoord) -> bool>,
}

impl<'a> AStarPlanner<'a> {
    /// Create a new A* planner
    pub fn new(grid: &'a OccupancyGrid, config: AStarConfig) -> Self {
        Self {
            grid,
            config,
            ability: DEFAULT_ABILITY,
            region: None,
        }
    }

    /// Create with default configuration
    pub fn with_defaults(grid: &'a OccupancyGrid) -> Self {
        Self::new(grid, AStarConfig::default())
    }

    /// Highest terrain class the agent may enter.
    pub fn with_ability(mut self, ability: u8) -> Self {
        self.ability = ability;
        self
    }

    /// Only expand cells for which `region` returns true.
    pub fn restricted_to(mut self, region: &'a dyn Fn(GridCoord) -> bool) -> Self {
        self.region = Some(region);
        self
    }

    /// Check if a cell may be entered.
    #[inline]
    pub fn is_passable(&self, coord: GridCoord) -> bool {
        if !self.grid.location_exists(coord) {
            return false;
        }
        let Some(class) = terrain_class(self.grid.flags_at(coord)) else {
            return false;
        };
        class <= self.ability && self.region.is_none_or(|allowed| allowed(coord))
    }

    /// Find a path from start to goal
    pub fn find_path(&self, start: GridCoord, goal: GridCoord) -> Path {
        trace!("[AStar] find_path: start={} goal={}", start, goal);

        if !self.grid.location_exists(start) || !self.grid.location_exists(goal) {
            debug!("[AStar] FAILED: OutOfBounds - start or goal outside grid");
            return Path::failed(PathFailure::OutOfBounds);
        }
        if !self.is_passable(start) {
            debug!("[AStar] FAILED: StartBlocked at {}", start);
            return Path::failed(PathFailure::StartBlocked);
        }
        if !self.is_passable(goal) {
            debug!("[AStar] FAILED: GoalBlocked at {}", goal);
            return Path::failed(PathFailure::GoalBlocked);
        }

        let mut open_set = BinaryHeap::new();
        let mut closed_set = HashSet::new();
        let mut came_from: HashMap<GridCoord, GridCoord> = HashMap::new();
        let mut g_scores: HashMap<GridCoord, f64> = HashMap::new();

        open_set.push(AStarNode {
            coord: start,
            g_cost: 0.0,
            f_cost: self.heuristic(start, goal),
        });
        g_scores.insert(start, 0.0);

        let mut nodes_expanded = 0;

        while let Some(current) = open_set.pop() {
            nodes_expanded += 1;

            if nodes_expanded > self.config.max_iterations {
                debug!(
                    "[AStar] FAILED: MaxIterationsExceeded ({} nodes)",
                    nodes_expanded
                );
                return Path::failed(PathFailure::MaxIterationsExceeded);
            }

            if current.coord == goal {
                return self.reconstruct_path(&came_from, goal, current.g_cost, nodes_expanded);
            }

            if !closed_set.insert(current.coord) {
                continue;
            }

            let neighbors = current.coord.neighbors_8();
            let count = if self.config.allow_diagonal { 8 } else { 4 };

            for (i, neighbor) in neighbors.iter().take(count).enumerate() {
                if closed_set.contains(neighbor) || !self.is_passable(*neighbor) {
                    continue;
                }

                let is_diagonal = i >= 4;
                if is_diagonal && self.cuts_corner(current.coord, *neighbor) {
                    continue;
                }

                let move_cost = if is_diagonal {
                    self.config.diagonal_cost
                } else {
                    1.0
                };
                let tentative_g = current.g_cost + move_cost;

                let current_g = g_scores.get(neighbor).copied().unwrap_or(f64::INFINITY);
                if tentative_g < current_g {
                    came_from.insert(*neighbor, current.coord);
                    g_scores.insert(*neighbor, tentative_g);
                    open_set.push(AStarNode {
                        coord: *neighbor,
                        g_cost: tentative_g,
                        f_cost: tentative_g + self.heuristic(*neighbor, goal),
                    });
                }
            }
        }

        debug!(
            "[AStar] FAILED: NoPath from {} to {} after expanding {} nodes",
            start, goal, nodes_expanded
        );
        Path::failed(PathFailure::NoPath)
    }

    /// Both orthogonal cells beside a diagonal step are blocked.
    #[inline]
    fn cuts_corner(&self, from: GridCoord, to: GridCoord) -> bool {
        !self.is_passable(GridCoord::new(to.x, from.y))
            && !self.is_passable(GridCoord::new(from.x, to.y))
    }

    /// Heuristic function (octile distance for 8-connected grid)
    fn heuristic(&self, from: GridCoord, to: GridCoord) -> f64 {
        let dx = (from.x - to.x).abs() as f64;
        let dy = (from.y - to.y).abs() as f64;

        if self.config.allow_diagonal {
            let min = dx.min(dy);
            let max = dx.max(dy);
            min * self.config.diagonal_cost + (max - min)
        } else {
            dx + dy
        }
    }

    fn reconstruct_path(
        &self,
        came_from: &HashMap<GridCoord, GridCoord>,
        goal: GridCoord,
        cost: f64,
        nodes_expanded: usize,
    ) -> Path {
        let mut points = Vec::new();
        let mut current = goal;

        while let Some(&prev) = came_from.get(&current) {
            points.push(current);
            current = prev;
        }
        points.push(current); // Add start
        points.reverse();

        trace!(
            "[AStar] SUCCESS: path length={} cells, cost={:.2}, nodes_expanded={}",
            points.len(),
            cost,
            nodes_expanded
        );

        Path::new(points)
    }
}

/// Quick path finding with default configuration
pub fn find_path(grid: &OccupancyGrid, start: GridCoord, goal: GridCoord) -> Path {
    AStarPlanner::with_defaults(grid).find_path(start, goal)
}

/// Check if a path exists
pub fn path_exists(grid: &OccupancyGrid, start: GridCoord, goal: GridCoord) -> bool {
    find_path(grid, start, goal).found()
}
