//! Exploration strategies.
//!
//! A strategy turns an agent's map into its next path. The simulation calls
//! [`ExplorationStrategy::replan`] after the agent moved and sensed, when its
//! path ran out or the replan interval elapsed.
//!
//! ```text
//!   Initial ──► Exploring ◄──────► ReturningToBase
//!                   │                    │
//!                   └──────► Complete ◄──┘
//! ```

mod frontier;
mod random_walk;
mod role_based;

pub use frontier::FrontierExploration;
pub use random_walk::RandomWalk;
pub use role_based::RoleBased;

use crate::agent::{Agent, PlanContext};
use crate::config::{RoleConfig, StrategyKind};

/// State of one agent's exploration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExplorationState {
    /// Not planned yet
    Initial,
    /// Heading for a frontier, or idle waiting for one
    Exploring,
    ReturningToBase,
    /// Nothing left to explore; parked at base
    Complete,
}

/// Next-path policy for one agent.
pub trait ExplorationStrategy: Send {
    fn name(&self) -> &'static str;

    /// Set the agent's next path and return its new state.
    fn replan(&mut self, agent: &mut Agent, ctx: &PlanContext<'_>) -> ExplorationState;
}

/// Build the configured strategy.
pub fn from_kind(kind: StrategyKind, role: &RoleConfig) -> Box<dyn ExplorationStrategy> {
    match kind {
        StrategyKind::Frontier => Box::new(FrontierExploration::solo()),
        StrategyKind::Coordinated => Box::new(FrontierExploration::coordinated()),
        StrategyKind::RoleBased => Box::new(RoleBased::new(role.return_interval)),
        StrategyKind::RandomWalk => Box::new(RandomWalk::default()),
    }
}

/// Head for the base station, or settle there.
///
/// At base the agent is done once no candidate frontier is left; with
/// candidates left (claimed by teammates) it waits.
pub(crate) fn head_home(
    agent: &mut Agent,
    ctx: &PlanContext<'_>,
    candidates: usize,
) -> ExplorationState {
    if agent.position() == ctx.base {
        agent.clear_path();
        return if candidates == 0 {
            ExplorationState::Complete
        } else {
            ExplorationState::Exploring
        };
    }

    let path = agent.plan_to(ctx.base, ctx.astar);
    if path.found() {
        agent.set_path(None, path);
    } else {
        agent.random_step();
    }
    ExplorationState::ReturningToBase
}
