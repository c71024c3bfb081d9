//! Frontier utility.
//!
//! `utility = area * 1e8 / distance^4`. The estimate uses the straight-line
//! distance to the frontier centre; the exact value uses the planned path to
//! the frontier's closest point plus the straight hop from there to the
//! centre. Any grid path is at least as long as the straight line, so the
//! exact value never exceeds the estimate.

use serde::{Deserialize, Serialize};

use crate::core::GridCoord;

/// Numerator scale
pub const UTILITY_SCALE: f64 = 1e8;

/// Utility of a frontier whose centre the agent is standing on.
pub const ON_CENTRE_UTILITY: f64 = -1001.0;

/// Factor applied when the rendezvous deadline cannot be met.
pub const BUDGET_PENALTY: f64 = 1e-6;

/// Time budget imposed by a pending rendezvous.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RendezvousBudget {
    /// Where the agent has to be
    pub point: GridCoord,
    /// Ticks left until the rendezvous
    pub ticks_remaining: u64,
    /// Agent speed in cells per tick
    pub speed: f64,
}

impl RendezvousBudget {
    /// True when reaching `target` after `path_length` cells and then the
    /// rendezvous point overruns the deadline.
    pub fn exceeded(&self, path_length: f64, target: GridCoord) -> bool {
        let speed = self.speed.max(f64::EPSILON);
        (path_length + target.distance(&self.point)) / speed > self.ticks_remaining as f64
    }
}

#[inline]
fn scaled(area: f64, distance: f64) -> f64 {
    area * UTILITY_SCALE / distance.powi(4)
}

/// Straight-line estimate.
pub fn estimate_utility(area: f64, agent: GridCoord, centre: GridCoord) -> f64 {
    let distance = agent.distance(&centre);
    if distance == 0.0 {
        return ON_CENTRE_UTILITY;
    }
    scaled(area, distance)
}

/// Path-based utility.
///
/// `path_length` is the planned distance from `agent` to `closest`, the
/// frontier outline point the agent heads for.
pub fn exact_utility(
    area: f64,
    agent: GridCoord,
    closest: GridCoord,
    centre: GridCoord,
    path_length: f64,
    budget: Option<&RendezvousBudget>,
) -> f64 {
    let distance = path_length + closest.distance(&centre);
    if agent == centre || distance == 0.0 {
        return ON_CENTRE_UTILITY;
    }
    let utility = scaled(area, distance);
    match budget {
        Some(budget) if budget.exceeded(path_length, closest) => utility * BUDGET_PENALTY,
        _ => utility,
    }
}
