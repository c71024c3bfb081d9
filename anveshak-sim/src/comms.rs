//! Communication predicates.
//!
//! Whether two nodes (agents or the base station) can exchange maps this
//! tick. Models only answer yes or no; there is no bandwidth or latency.

use anveshak_map::GridCoord;

use crate::config::{CommunicationConfig, CommunicationKind};
use crate::environment::Environment;

/// Link predicate between two positions.
pub trait CommunicationModel: Send + Sync {
    fn can_communicate(&self, a: GridCoord, b: GridCoord, env: &Environment) -> bool;

    fn name(&self) -> &'static str;
}

/// Every pair is always connected.
#[derive(Clone, Copy, Debug, Default)]
pub struct Unlimited;

impl CommunicationModel for Unlimited {
    fn can_communicate(&self, _a: GridCoord, _b: GridCoord, _env: &Environment) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "unlimited"
    }
}

/// Connected within a Euclidean range, walls ignored.
#[derive(Clone, Copy, Debug)]
pub struct CircularRange {
    pub range: f64,
}

impl CommunicationModel for CircularRange {
    fn can_communicate(&self, a: GridCoord, b: GridCoord, _env: &Environment) -> bool {
        a.distance(&b) <= self.range
    }

    fn name(&self) -> &'static str {
        "circular_range"
    }
}

/// Connected within range when no wall blocks the straight line.
#[derive(Clone, Copy, Debug)]
pub struct LineOfSight {
    pub range: f64,
}

impl CommunicationModel for LineOfSight {
    fn can_communicate(&self, a: GridCoord, b: GridCoord, env: &Environment) -> bool {
        a.distance(&b) <= self.range && env.line_of_sight(a, b)
    }

    fn name(&self) -> &'static str {
        "line_of_sight"
    }
}

/// Build the configured model.
pub fn from_config(config: &CommunicationConfig) -> Box<dyn CommunicationModel> {
    match config.model {
        CommunicationKind::Unlimited => Box::new(Unlimited),
        CommunicationKind::CircularRange => Box::new(CircularRange {
            range: config.range,
        }),
        CommunicationKind::LineOfSight => Box::new(LineOfSight {
            range: config.range,
        }),
    }
}
