//! Key-point extraction from a skeleton.

use log::debug;
use serde::{Deserialize, Serialize};

use super::skeleton::Mask;
use crate::core::GridCoord;
use crate::grid::OccupancyGrid;

/// Key-point selection parameters (cells).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyPointConfig {
    /// Skeleton pixels farther than this from every chosen point become key points
    pub gap_fill_distance: f64,
    /// Minimum spacing between retained key points
    pub min_spacing: f64,
    /// Key points this close to an obstacle are dropped
    pub obstacle_clearance: f64,
}

impl Default for KeyPointConfig {
    fn default() -> Self {
        Self {
            gap_fill_distance: 40.0,
            min_spacing: 20.0,
            obstacle_clearance: 1.0,
        }
    }
}

/// Junctions, gap-fill points and endpoints of the skeleton, pruned.
///
/// Falls back to the first skeleton pixel, then to the first free cell of
/// `grid`, when pruning leaves nothing.
pub fn find_key_points(
    skeleton: Mask<'_>,
    grid: &OccupancyGrid,
    config: &KeyPointConfig,
) -> Vec<GridCoord> {
    let pixels: Vec<GridCoord> = skeleton.pixels().collect();

    let mut candidates: Vec<GridCoord> = pixels
        .iter()
        .copied()
        .filter(|p| skeleton.neighbour_count(*p) >= 3 && skeleton.transitions(*p) >= 3)
        .collect();
    let junctions = candidates.len();

    for p in &pixels {
        if skeleton.neighbour_count(*p) == 1 && !candidates.contains(p) {
            candidates.push(*p);
        }
    }

    let gap_sq = config.gap_fill_distance * config.gap_fill_distance;
    for p in &pixels {
        if candidates.iter().all(|c| c.distance_squared(p) > gap_sq) {
            candidates.push(*p);
        }
    }

    let spacing_sq = config.min_spacing * config.min_spacing;
    let mut retained: Vec<GridCoord> = Vec::new();
    for p in candidates {
        if grid.obstacle_within_distance(p, config.obstacle_clearance) {
            continue;
        }
        if retained.iter().any(|r| r.distance_squared(&p) < spacing_sq) {
            continue;
        }
        retained.push(p);
    }

    if retained.is_empty() {
        let fallback = pixels
            .first()
            .copied()
            .or_else(|| grid.free_cells().first().copied());
        retained.extend(fallback);
    }

    debug!(
        "[KeyPoints] {} skeleton pixels, {} junctions, {} key points",
        pixels.len(),
        junctions,
        retained.len()
    );
    retained
}
