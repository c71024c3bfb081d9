//! Occupancy grid: per-cell flag sets with aggregate counters.
//!
//! ## Key Types
//!
//! - [`CellFlags`]: one byte of independent cell flags
//! - [`OccupancyGrid`]: the grid, its counters and the merge policy used
//!   when two agents swap map knowledge
//! - [`GridCounts`]: counter snapshot

mod cell;
mod occupancy;

pub use cell::CellFlags;
pub use occupancy::{GridCounts, OccupancyGrid};
