//! Frontier exploration, alone or coordinated through the shared auction.

use super::{ExplorationState, ExplorationStrategy, head_home};
use crate::agent::{Agent, PlanContext};

/// Go to the frontier with the best utility.
///
/// Coordinated agents also bid for recently heard teammates and leave the
/// frontiers those teammates win.
#[derive(Clone, Copy, Debug)]
pub struct FrontierExploration {
    coordinated: bool,
}

impl FrontierExploration {
    pub fn solo() -> Self {
        Self { coordinated: false }
    }

    pub fn coordinated() -> Self {
        Self { coordinated: true }
    }
}

impl ExplorationStrategy for FrontierExploration {
    fn name(&self) -> &'static str {
        if self.coordinated {
            "coordinated"
        } else {
            "frontier"
        }
    }

    fn replan(&mut self, agent: &mut Agent, ctx: &PlanContext<'_>) -> ExplorationState {
        let choice = agent.assign_frontier(ctx, self.coordinated, None);
        match choice.assignment {
            Some(assignment) => {
                agent.set_path(Some(assignment.frontier), assignment.path);
                ExplorationState::Exploring
            }
            None => head_home(agent, ctx, choice.candidates),
        }
    }
}
