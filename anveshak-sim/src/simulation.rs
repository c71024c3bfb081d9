//! Batch-stepped simulation loop.
//!
//! Each tick has three phases:
//!
//! 1. **Move/sense/replan**: one scoped thread per agent (`agent-<id>`),
//!    each owning its agent's map, topology and RNG for the phase.
//! 2. **Communication**: single-threaded, in fixed order. Agents in range
//!    of the base merge with it first, then every linked agent pair merges
//!    both ways and updates its teammate tables.
//! 3. **Statistics**: coverage is measured on the base station's map.

use std::thread;

use anveshak_map::{GridCoord, OccupancyGrid};
use tracing::{debug, info, warn};

use crate::agent::{Agent, AgentStats, PlanContext};
use crate::comms::{self, CommunicationModel};
use crate::config::SimConfig;
use crate::environment::Environment;
use crate::error::{Result, SimError};
use crate::strategy::{self, ExplorationState, ExplorationStrategy};

/// Why a run stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EndReason {
    TargetCoverage,
    AllComplete,
    MaxTicks,
}

/// Snapshot after one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TickStats {
    pub tick: u64,
    /// Free cells known at base over free cells in the world
    pub coverage: f64,
    pub base_known_free: usize,
    pub cells_merged: usize,
    pub agents_complete: usize,
}

/// Summary of a finished run.
#[derive(Clone, Debug)]
pub struct SimulationReport {
    pub ticks: u64,
    pub end_reason: EndReason,
    pub coverage: f64,
    pub agents: Vec<AgentStats>,
}

pub struct Simulation {
    config: SimConfig,
    env: Environment,
    base: OccupancyGrid,
    agents: Vec<Agent>,
    strategies: Vec<Box<dyn ExplorationStrategy>>,
    comms: Box<dyn CommunicationModel>,
    tick: u64,
    last: TickStats,
}

impl Simulation {
    pub fn new(config: SimConfig, env: Environment) -> Result<Self> {
        config.validate()?;
        let base_position = config.simulation.base;
        if !env.is_free(base_position) {
            return Err(SimError::InvalidConfig(format!(
                "base station {} is not a free cell",
                base_position
            )));
        }

        let dims = (env.width(), env.height());
        let topology = config
            .simulation
            .use_topology
            .then(|| config.topology.clone());
        let agents: Vec<Agent> = (0..config.simulation.agents)
            .map(|id| {
                Agent::new(
                    id,
                    base_position,
                    dims,
                    &config.agent,
                    topology.clone(),
                    config.simulation.seed,
                )
            })
            .collect();
        let strategies = (0..agents.len())
            .map(|_| strategy::from_kind(config.simulation.strategy, &config.role))
            .collect();
        let comms = comms::from_config(&config.communication);

        info!(
            "Simulation: {} agents, strategy {:?}, communication {}, base at {}",
            agents.len(),
            config.simulation.strategy,
            comms.name(),
            base_position
        );

        Ok(Self {
            base: OccupancyGrid::new(dims.0, dims.1),
            config,
            env,
            agents,
            strategies,
            comms,
            tick: 0,
            last: TickStats::default(),
        })
    }

    /// Build the environment named in the configuration.
    pub fn from_config(config: SimConfig) -> Result<Self> {
        let env = Environment::from_config(&config.environment)?;
        Self::new(config, env)
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    pub fn base_grid(&self) -> &OccupancyGrid {
        &self.base
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn base_position(&self) -> GridCoord {
        self.config.simulation.base
    }

    pub fn last_stats(&self) -> TickStats {
        self.last
    }

    /// Fraction of the world's free cells known at base.
    pub fn coverage(&self) -> f64 {
        let total = self.env.free_cell_count();
        if total == 0 {
            return 1.0;
        }
        let known = self.base.cells_marked_as_free_and_known_at_base();
        (known as f64 / total as f64).min(1.0)
    }

    /// Advance one tick.
    pub fn step(&mut self) -> Result<TickStats> {
        self.tick += 1;
        self.movement_phase()?;
        let cells_merged = self.communication_phase();

        let stats = TickStats {
            tick: self.tick,
            coverage: self.coverage(),
            base_known_free: self.base.cells_marked_as_free_and_known_at_base(),
            cells_merged,
            agents_complete: self
                .agents
                .iter()
                .filter(|a| a.state() == ExplorationState::Complete)
                .count(),
        };
        self.last = stats;

        let interval = self.config.simulation.progress_interval.max(1);
        if self.tick % interval == 0 {
            info!(
                "Tick {}: coverage {:.1}% ({} cells at base), {} of {} agents complete",
                stats.tick,
                stats.coverage * 100.0,
                stats.base_known_free,
                stats.agents_complete,
                self.agents.len()
            );
        }
        Ok(stats)
    }

    /// Step until an end condition holds.
    pub fn run(&mut self) -> Result<SimulationReport> {
        let sim = self.config.simulation.clone();
        let end_reason = loop {
            if self.tick >= sim.max_ticks {
                break EndReason::MaxTicks;
            }
            let stats = self.step()?;
            if stats.coverage >= sim.target_coverage {
                break EndReason::TargetCoverage;
            }
            if stats.agents_complete == self.agents.len() {
                break EndReason::AllComplete;
            }
        };

        let report = SimulationReport {
            ticks: self.tick,
            end_reason,
            coverage: self.coverage(),
            agents: self.agents.iter().map(|a| a.stats().clone()).collect(),
        };
        info!(
            "Finished after {} ticks ({:?}): coverage {:.1}%",
            report.ticks,
            report.end_reason,
            report.coverage * 100.0
        );
        Ok(report)
    }

    fn movement_phase(&mut self) -> Result<()> {
        let ctx = PlanContext {
            tick: self.tick,
            base: self.config.simulation.base,
            replan_interval: self.config.simulation.replan_interval,
            astar: &self.config.astar,
            auction: &self.config.auction,
        };
        let env = &self.env;
        let agents = &mut self.agents;
        let strategies = &mut self.strategies;

        thread::scope(|scope| {
            let mut handles = Vec::with_capacity(agents.len());
            for (agent, strategy) in agents.iter_mut().zip(strategies.iter_mut()) {
                let id = agent.id();
                let ctx = &ctx;
                let handle = thread::Builder::new()
                    .name(format!("agent-{}", id))
                    .spawn_scoped(scope, move || {
                        run_agent_tick(agent, strategy.as_mut(), env, ctx)
                    })
                    .map_err(|e| SimError::ThreadSpawn(e.to_string()))?;
                handles.push((id, handle));
            }

            let mut result = Ok(());
            for (id, handle) in handles {
                if handle.join().is_err() {
                    warn!("Agent {} thread panicked", id);
                    if result.is_ok() {
                        result = Err(SimError::AgentPanicked(id));
                    }
                }
            }
            result
        })
    }

    fn communication_phase(&mut self) -> usize {
        let tick = self.tick;
        let base_position = self.config.simulation.base;
        let mut merged = 0;

        for agent in self.agents.iter_mut() {
            if !self
                .comms
                .can_communicate(agent.position(), base_position, &self.env)
            {
                continue;
            }
            merged += self.base.merge_grid(agent.grid(), true);
            merged += agent.grid_mut().merge_grid(&self.base, true);
            agent.heard_from_base(tick);
        }

        let n = self.agents.len();
        for i in 0..n {
            for j in i + 1..n {
                let (left, right) = self.agents.split_at_mut(j);
                let (a, b) = (&mut left[i], &mut right[0]);
                if !self
                    .comms
                    .can_communicate(a.position(), b.position(), &self.env)
                {
                    continue;
                }
                merged += exchange(a, b, tick);
            }
        }

        merged
    }
}

/// One agent's share of the movement phase.
fn run_agent_tick(
    agent: &mut Agent,
    strategy: &mut dyn ExplorationStrategy,
    env: &Environment,
    ctx: &PlanContext<'_>,
) {
    if agent.state() != ExplorationState::Initial {
        agent.follow_path(env);
    }
    agent.sense(env);

    if agent.take_environment_error() {
        debug!("Agent {}: recovering with a random step", agent.id());
        agent.random_step();
        return;
    }

    let due = agent.state() == ExplorationState::Initial
        || agent.path().is_finished()
        || ctx.tick % ctx.replan_interval.max(1) == 0;
    if due {
        let state = strategy.replan(agent, ctx);
        agent.set_state(state);
    }
}

/// Two-way merge between linked agents. Returns cells changed.
fn exchange(a: &mut Agent, b: &mut Agent, tick: u64) -> usize {
    let mut changed = a.grid_mut().merge_grid(b.grid(), false);
    changed += b.grid_mut().merge_grid(a.grid(), false);

    if b.is_returning_to_base() {
        let relayed = a.relay_owned_cells();
        debug!("Agent {} relayed {} cells through agent {}", a.id(), relayed, b.id());
    }
    if a.is_returning_to_base() {
        let relayed = b.relay_owned_cells();
        debug!("Agent {} relayed {} cells through agent {}", b.id(), relayed, a.id());
    }

    let (a_info, b_info) = (a.teammate_info(tick), b.teammate_info(tick));
    a.hear(b.id(), b_info);
    b.hear(a.id(), a_info);
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CommunicationKind, StrategyKind};

    fn small_config(agents: usize, strategy: StrategyKind) -> SimConfig {
        let mut config = SimConfig::default();
        config.simulation.agents = agents;
        config.simulation.strategy = strategy;
        config.simulation.max_ticks = 400;
        config.simulation.base = GridCoord::new(0, 0);
        config.simulation.use_topology = false;
        config.communication.model = CommunicationKind::Unlimited;
        config.agent.sensor_range = 5.0;
        config.agent.safe_range = 1.0;
        config
    }

    #[test]
    fn test_rejects_base_on_obstacle() {
        let env = Environment::from_ascii("#..\n...\n").unwrap();
        let config = small_config(1, StrategyKind::Frontier);
        assert!(matches!(
            Simulation::new(config, env),
            Err(SimError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_first_tick_senses_and_plans() {
        let env = Environment::open(10, 10).unwrap();
        let mut sim = Simulation::new(small_config(1, StrategyKind::Frontier), env).unwrap();

        let stats = sim.step().unwrap();
        assert_eq!(stats.tick, 1);
        assert!(stats.base_known_free > 9);

        let agent = &sim.agents()[0];
        assert_eq!(agent.state(), ExplorationState::Exploring);
        let target = agent.target().expect("frontier target").centre;
        assert!(target.x >= 3 || target.y >= 3);
        assert_ne!(agent.path().next_point(), Some(GridCoord::new(0, 0)));
    }

    #[test]
    fn test_agents_share_maps_and_teammates() {
        let env = Environment::open(12, 12).unwrap();
        let mut sim = Simulation::new(small_config(2, StrategyKind::Coordinated), env).unwrap();
        sim.step().unwrap();

        let (a, b) = (&sim.agents()[0], &sim.agents()[1]);
        assert_eq!(a.grid(), b.grid());
        assert_eq!(a.teammates().get(&1).map(|t| t.last_heard), Some(1));
        assert_eq!(b.teammates().get(&0).map(|t| t.last_heard), Some(1));
    }

    #[test]
    fn test_relay_to_returning_teammate() {
        let env = Environment::open(8, 8).unwrap();
        let config = small_config(2, StrategyKind::Coordinated);
        let mut a = Agent::new(0, GridCoord::new(0, 0), (8, 8), &config.agent, None, 1);
        let mut b = Agent::new(1, GridCoord::new(4, 4), (8, 8), &config.agent, None, 1);
        a.sense(&env);
        b.set_state(ExplorationState::ReturningToBase);

        let owned = a.grid().owned_cells().len();
        assert!(owned > 0);
        exchange(&mut a, &mut b, 3);

        assert!(a.grid().owned_cells().is_empty());
        assert_eq!(a.stats().cells_relayed, owned);
        assert_eq!(
            a.grid().cells_marked_as_free_and_relayed_and_not_known_at_base(),
            owned
        );
        // the returning agent still owns what it received
        assert_eq!(b.grid().owned_cells().len(), owned);
    }

    #[test]
    fn test_open_world_is_fully_explored() {
        let env = Environment::open(10, 10).unwrap();
        let mut config = small_config(1, StrategyKind::Frontier);
        config.simulation.target_coverage = 0.95;
        let mut sim = Simulation::new(config, env).unwrap();

        let report = sim.run().unwrap();
        assert_ne!(report.end_reason, EndReason::MaxTicks);
        assert!(report.coverage >= 0.9, "coverage {}", report.coverage);
    }
}
