//! Baseline: wander to random known cells.

use anveshak_map::GridCoord;
use rand::Rng;

use super::{ExplorationState, ExplorationStrategy};
use crate::agent::{Agent, PlanContext};

/// Picks a random known-free cell within `radius` and walks there.
#[derive(Clone, Copy, Debug)]
pub struct RandomWalk {
    radius: i32,
}

impl Default for RandomWalk {
    fn default() -> Self {
        Self { radius: 10 }
    }
}

impl RandomWalk {
    pub fn with_radius(radius: i32) -> Self {
        Self { radius: radius.max(1) }
    }
}

impl ExplorationStrategy for RandomWalk {
    fn name(&self) -> &'static str {
        "random_walk"
    }

    fn replan(&mut self, agent: &mut Agent, ctx: &PlanContext<'_>) -> ExplorationState {
        let here = agent.position();
        let candidates: Vec<GridCoord> = agent
            .grid()
            .free_cells()
            .into_iter()
            .filter(|c| *c != here && c.chebyshev_distance(&here) <= self.radius)
            .collect();

        if candidates.is_empty() {
            agent.random_step();
            return ExplorationState::Exploring;
        }

        let goal = candidates[agent.rng_mut().random_range(0..candidates.len())];
        let path = agent.plan_to(goal, ctx.astar);
        if path.found() {
            agent.set_path(None, path);
        } else {
            agent.random_step();
        }
        ExplorationState::Exploring
    }
}
