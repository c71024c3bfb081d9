//! Frontier extraction.
//!
//! A frontier cell is a free cell with at least one in-bounds unknown
//! 4-neighbour. Connected frontier cells are traced into closed contours
//! ([`ContourTracer`]) and each contour becomes a [`Frontier`] polygon with
//! an area and a centre.
//!
//! ```rust,ignore
//! use anveshak_map::frontier::extract_frontiers;
//!
//! for frontier in extract_frontiers(&grid) {
//!     println!("{} area={:.1}", frontier.centre(), frontier.area());
//! }
//! ```

mod contour;
mod region;

pub use contour::{Contour, ContourTracer, find_all_contours};
pub use region::{Frontier, FrontierId};

use crate::grid::OccupancyGrid;

/// Trace all contours of `grid` and build their frontiers.
pub fn extract_frontiers(grid: &OccupancyGrid) -> Vec<Frontier> {
    let frontiers: Vec<Frontier> = find_all_contours(grid)
        .into_iter()
        .filter_map(Frontier::new)
        .collect();
    log::debug!("[Frontier] extracted {} frontiers", frontiers.len());
    frontiers
}
