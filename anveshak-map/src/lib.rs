//! # Anveshak-Map
//!
//! Map-side building blocks for multi-robot frontier exploration on a
//! 2D grid.
//!
//! ## Overview
//!
//! Every agent keeps its own [`OccupancyGrid`]: one byte of flags per cell
//! (free, safe, obstacle, known-at-base, relayed, final) plus counters that
//! stay in sync with every flag write. On top of the grid:
//!
//! - **Frontiers**: free cells bordering unknown space, traced into closed
//!   contours and summarised as polygons with an area and a centre
//! - **Topology**: skeleton, key points and regions, turned into a graph of
//!   nodes with cached paths between neighbours
//! - **Path planning**: A* with terrain classes plus a hierarchical
//!   planner that routes through the topological graph
//! - **Assignment**: a greedy auction that hands each agent the frontier
//!   with the best utility, bidding for teammates too
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use anveshak_map::{AStarConfig, AuctionConfig, Bidder, FrontierAuction};
//! use anveshak_map::{GridCoord, OccupancyGrid};
//! use anveshak_map::frontier::extract_frontiers;
//!
//! let mut grid = OccupancyGrid::new(100, 100);
//! grid.set_free_space_at(GridCoord::new(10, 10));
//!
//! let frontiers = extract_frontiers(&grid);
//! let astar = AStarConfig::default();
//! let config = AuctionConfig::default();
//! let auction = FrontierAuction::new(&grid, &frontiers, &astar, &config);
//! ```
//!
//! ## Coordinate System
//!
//! Image convention: `(0, 0)` is the top-left cell, X grows to the right and
//! Y grows downward. North is `y - 1`.
//!
//! ## Data Flow
//!
//! ```text
//!   sensing / merging
//!          │
//!          ▼
//!   ┌──────────────┐   contours   ┌────────────┐
//!   │ OccupancyGrid│─────────────►│ Frontiers  │──┐
//!   └──────┬───────┘              └────────────┘  │
//!          │ skeleton                             ▼
//!          ▼                               ┌────────────┐
//!   ┌──────────────┐   cached paths        │  Auction   │──► target + path
//!   │ TopologicalMap│─────────────────────►│            │
//!   └──────────────┘   (hierarchical A*)   └────────────┘
//! ```

// Core types
pub mod core;

// Error handling
pub mod error;

// Occupancy grid and merge policy
pub mod grid;

// Frontier contours and polygons
pub mod frontier;

// Skeleton, key points, regions, node graph
pub mod topology;

// A* and hierarchical planning
pub mod pathfinding;

// Frontier utility and auction
pub mod assignment;

// PNG export
pub mod io;

// Re-export commonly used types
pub use core::{BresenhamLine, GridCoord, cells_along_line};

pub use error::{MapError, Result};

pub use grid::{CellFlags, GridCounts, OccupancyGrid};

pub use frontier::{Frontier, FrontierId, extract_frontiers};

pub use topology::{NodeId, TopologicalMap, TopologicalNode, TopologyConfig};

pub use pathfinding::{AStarConfig, AStarPlanner, Path, PathFailure, plan_path};

pub use assignment::{
    Assignment, AuctionConfig, AuctionResult, Bidder, FrontierAuction, RendezvousBudget,
};
