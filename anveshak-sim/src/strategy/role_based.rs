//! Explorer that must report back to base on a fixed schedule.
//!
//! Every visit to the base station opens a window of `return_interval`
//! ticks. While the window is open the agent explores through the
//! coordinated auction with a rendezvous budget, so frontiers it could not
//! come back from in time are penalised. Once the remaining ticks barely
//! cover the trip home it turns around, and teammates that meet it on the
//! way relay their maps through it.

use anveshak_map::RendezvousBudget;
use tracing::debug;

use super::{ExplorationState, ExplorationStrategy, head_home};
use crate::agent::{Agent, PlanContext};

#[derive(Clone, Debug)]
pub struct RoleBased {
    return_interval: u64,
    deadline: Option<u64>,
}

impl RoleBased {
    pub fn new(return_interval: u64) -> Self {
        Self {
            return_interval,
            deadline: None,
        }
    }

    /// Tick by which the agent has to be back at base.
    pub fn deadline(&self) -> Option<u64> {
        self.deadline
    }
}

impl ExplorationStrategy for RoleBased {
    fn name(&self) -> &'static str {
        "role_based"
    }

    fn replan(&mut self, agent: &mut Agent, ctx: &PlanContext<'_>) -> ExplorationState {
        if agent.position() == ctx.base || self.deadline.is_none() {
            self.deadline = Some(ctx.tick + self.return_interval);
        }
        let deadline = self.deadline.unwrap_or(ctx.tick + self.return_interval);
        let remaining = deadline.saturating_sub(ctx.tick);

        if agent.position() != ctx.base {
            if agent.is_returning_to_base() {
                if agent.path().is_finished() {
                    return head_home(agent, ctx, 1);
                }
                return ExplorationState::ReturningToBase;
            }

            let home = agent.plan_to(ctx.base, ctx.astar);
            let ticks_home = home.length() / agent.speed();
            if home.found() && remaining as f64 <= ticks_home + ctx.replan_interval as f64 {
                debug!(
                    "Agent {}: {} ticks left, {:.1} needed, returning to base",
                    agent.id(),
                    remaining,
                    ticks_home
                );
                agent.set_path(None, home);
                return ExplorationState::ReturningToBase;
            }
        }

        let budget = RendezvousBudget {
            point: ctx.base,
            ticks_remaining: remaining,
            speed: agent.speed(),
        };
        let choice = agent.assign_frontier(ctx, true, Some(budget));
        match choice.assignment {
            Some(assignment) => {
                agent.set_path(Some(assignment.frontier), assignment.path);
                ExplorationState::Exploring
            }
            None => head_home(agent, ctx, choice.candidates),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AgentConfig;
    use crate::environment::Environment;
    use anveshak_map::{AStarConfig, AuctionConfig, GridCoord};

    #[test]
    fn test_turns_home_when_deadline_is_close() {
        let env = Environment::open(30, 5).unwrap();
        let base = GridCoord::new(1, 2);
        let config = AgentConfig::default();
        let mut agent = Agent::new(0, GridCoord::new(20, 2), (30, 5), &config, None, 3);
        // corridor from base to the agent is known
        for x in 0..=25 {
            for y in 0..5 {
                agent.grid_mut().set_free_space_at(GridCoord::new(x, y));
            }
        }
        agent.sense(&env);

        let astar = AStarConfig::default();
        let auction = AuctionConfig::default();
        let mut strategy = RoleBased::new(100);

        let early = PlanContext {
            tick: 0,
            base,
            replan_interval: 5,
            astar: &astar,
            auction: &auction,
        };
        assert_eq!(strategy.replan(&mut agent, &early), ExplorationState::Exploring);
        assert_eq!(strategy.deadline(), Some(100));

        let late = PlanContext { tick: 80, ..early };
        let state = strategy.replan(&mut agent, &late);
        assert_eq!(state, ExplorationState::ReturningToBase);
        assert_eq!(agent.path().goal_point(), Some(base));
    }
}
