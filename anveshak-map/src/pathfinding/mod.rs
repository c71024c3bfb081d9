//! Path planning on the occupancy grid.
//!
//! - **A* Search**: 8-connected shortest paths with an agent ability threshold
//! - **Hierarchical planning**: routes through topological nodes and their
//!   cached paths, falling back to A*
//! - **Path**: the resulting value, with a read cursor
//!
//! ```rust,ignore
//! use anveshak_map::pathfinding::{AStarPlanner, AStarConfig};
//!
//! let planner = AStarPlanner::new(&grid, AStarConfig::default());
//! let path = planner.find_path(start, goal);
//! if path.found() {
//!     println!("{} waypoints, length {:.1}", path.points().len(), path.length());
//! }
//! ```

pub mod astar;
pub mod hierarchical;
pub mod path;

pub use astar::{
    AStarConfig, AStarPlanner, DEFAULT_ABILITY, TERRAIN_FREE, TERRAIN_SAFE, TERRAIN_UNKNOWN,
    find_path, path_exists, terrain_class,
};
pub use hierarchical::{HierarchicalPlanner, plan_path};
pub use path::{Path, PathFailure};
