//! Simulated agent: private map, path, teammate table and statistics.

use std::collections::{BTreeMap, HashSet};

use anveshak_map::{
    AStarConfig, Assignment, AuctionConfig, Bidder, FrontierAuction, FrontierId, GridCoord,
    OccupancyGrid, Path, RendezvousBudget, TopologicalMap, TopologyConfig, extract_frontiers,
    plan_path,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace, warn};

use crate::config::AgentConfig;
use crate::environment::Environment;
use crate::sensing::{SenseResult, SensorModel};
use crate::strategy::ExplorationState;

/// Last thing heard from a teammate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TeammateInfo {
    pub position: GridCoord,
    pub ability: u8,
    pub last_heard: u64,
    pub returning_to_base: bool,
}

/// Per-agent counters.
#[derive(Clone, Debug, Default)]
pub struct AgentStats {
    pub distance_travelled: f64,
    pub replans: u64,
    pub environment_errors: u64,
    pub cells_relayed: usize,
    pub last_base_contact: Option<u64>,
}

/// Read-only inputs to one planning step.
#[derive(Clone, Copy, Debug)]
pub struct PlanContext<'a> {
    pub tick: u64,
    pub base: GridCoord,
    pub replan_interval: u64,
    pub astar: &'a AStarConfig,
    pub auction: &'a AuctionConfig,
}

/// Outcome of one frontier auction for this agent.
#[derive(Clone, Debug, Default)]
pub struct FrontierChoice {
    pub assignment: Option<Assignment>,
    /// Frontiers that made it into the interest set
    pub candidates: usize,
}

pub struct Agent {
    id: usize,
    position: GridCoord,
    speed: f64,
    ability: u8,
    sensor: SensorModel,
    grid: OccupancyGrid,
    topology: Option<TopologicalMap>,
    path: Path,
    target: Option<FrontierId>,
    blacklist: HashSet<FrontierId>,
    teammates: BTreeMap<usize, TeammateInfo>,
    state: ExplorationState,
    environment_error: bool,
    move_budget: f64,
    rng: StdRng,
    stats: AgentStats,
}

impl Agent {
    pub fn new(
        id: usize,
        position: GridCoord,
        (width, height): (usize, usize),
        config: &AgentConfig,
        topology: Option<TopologyConfig>,
        seed: u64,
    ) -> Self {
        let agent_seed = seed ^ (id as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
        Self {
            id,
            position,
            speed: config.speed,
            ability: config.ability,
            sensor: SensorModel::new(config.sensor_range, config.safe_range),
            grid: OccupancyGrid::new(width, height),
            topology: topology.map(TopologicalMap::new),
            path: Path::default(),
            target: None,
            blacklist: HashSet::new(),
            teammates: BTreeMap::new(),
            state: ExplorationState::Initial,
            environment_error: false,
            move_budget: 0.0,
            rng: StdRng::seed_from_u64(agent_seed),
            stats: AgentStats::default(),
        }
    }

    // === Accessors ===

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn position(&self) -> GridCoord {
        self.position
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn ability(&self) -> u8 {
        self.ability
    }

    pub fn grid(&self) -> &OccupancyGrid {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut OccupancyGrid {
        &mut self.grid
    }

    pub fn topology(&self) -> Option<&TopologicalMap> {
        self.topology.as_ref()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn target(&self) -> Option<FrontierId> {
        self.target
    }

    pub fn blacklist(&self) -> &HashSet<FrontierId> {
        &self.blacklist
    }

    pub fn teammates(&self) -> &BTreeMap<usize, TeammateInfo> {
        &self.teammates
    }

    pub fn state(&self) -> ExplorationState {
        self.state
    }

    pub fn set_state(&mut self, state: ExplorationState) {
        if state != self.state {
            debug!("Agent {}: {:?} -> {:?}", self.id, self.state, state);
            self.state = state;
        }
    }

    pub fn is_returning_to_base(&self) -> bool {
        self.state == ExplorationState::ReturningToBase
    }

    pub fn stats(&self) -> &AgentStats {
        &self.stats
    }

    pub fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    // === Movement and sensing ===

    /// Walk along the current path as far as this tick's budget allows.
    ///
    /// A step into a cell the environment rejects marks that cell as an
    /// obstacle, drops the path and raises the environment-error flag.
    /// Returns the number of steps taken.
    pub fn follow_path(&mut self, env: &Environment) -> usize {
        if self.path.is_finished() {
            self.move_budget = 0.0;
            return 0;
        }
        self.move_budget += self.speed;

        let mut steps = 0;
        while let Some(next) = self.path.next_point() {
            if next == self.position || !next.is_adjacent(&self.position) {
                warn!(
                    "Agent {}: path jumps from {} to {}, dropping it",
                    self.id, self.position, next
                );
                self.path = Path::default();
                break;
            }
            let cost = self.position.distance(&next);
            if self.move_budget + 1e-9 < cost {
                break;
            }
            if !env.is_free(next) {
                debug!("Agent {}: move {} -> {} blocked", self.id, self.position, next);
                self.grid.set_obstacle_at(next);
                self.environment_error = true;
                self.stats.environment_errors += 1;
                self.path = Path::default();
                break;
            }
            self.move_budget -= cost;
            self.position = next;
            self.path.advance();
            self.stats.distance_travelled += cost;
            steps += 1;
        }

        if self.path.is_finished() {
            self.move_budget = 0.0;
        }
        steps
    }

    pub fn sense(&mut self, env: &Environment) -> SenseResult {
        let result = self.sensor.sense(env, &mut self.grid, self.position);
        trace!(
            "Agent {}: sensed {} new cells, {} obstacles at {}",
            self.id, result.discovered, result.obstacles, self.position
        );
        result
    }

    /// Read and clear the environment-error flag.
    pub fn take_environment_error(&mut self) -> bool {
        std::mem::take(&mut self.environment_error)
    }

    /// Replace the path with one step to a random known-free neighbour.
    pub fn random_step(&mut self) {
        let options: Vec<GridCoord> = self
            .position
            .neighbors_8()
            .into_iter()
            .filter(|n| self.grid.free_space_at(*n))
            .collect();
        self.target = None;
        if options.is_empty() {
            self.path = Path::default();
            return;
        }
        let next = options[self.rng.random_range(0..options.len())];
        trace!("Agent {}: random step to {}", self.id, next);
        self.path = Path::new(vec![self.position, next]);
    }

    // === Planning ===

    pub fn update_topology(&mut self, force: bool) -> bool {
        match self.topology.as_mut() {
            Some(topology) => topology.update(&mut self.grid, force),
            None => false,
        }
    }

    /// Plan on this agent's map, through its topology when it has one.
    pub fn plan_to(&self, goal: GridCoord, astar: &AStarConfig) -> Path {
        plan_path(
            &self.grid,
            self.topology.as_ref(),
            self.position,
            goal,
            astar,
            self.ability,
        )
    }

    pub fn set_path(&mut self, target: Option<FrontierId>, path: Path) {
        self.target = target;
        self.path = path;
    }

    pub fn clear_path(&mut self) {
        self.target = None;
        self.path = Path::default();
    }

    /// Teammates heard from within `recency` ticks, as auction bidders.
    pub fn recent_teammates(&self, tick: u64, recency: u64) -> Vec<Bidder> {
        self.teammates
            .iter()
            .filter(|(_, info)| tick.saturating_sub(info.last_heard) <= recency)
            .map(|(id, info)| Bidder {
                agent_id: *id,
                position: info.position,
                ability: info.ability,
            })
            .collect()
    }

    /// Run the frontier auction on this agent's map.
    pub fn assign_frontier(
        &mut self,
        ctx: &PlanContext<'_>,
        coordinate: bool,
        budget: Option<RendezvousBudget>,
    ) -> FrontierChoice {
        self.update_topology(false);
        self.stats.replans += 1;

        let frontiers = extract_frontiers(&self.grid);
        let me = Bidder {
            agent_id: self.id,
            position: self.position,
            ability: self.ability,
        };
        let teammates = if coordinate && ctx.auction.coordinate {
            self.recent_teammates(ctx.tick, ctx.auction.teammate_recency_ticks)
        } else {
            Vec::new()
        };

        let mut auction = FrontierAuction::new(&self.grid, &frontiers, ctx.astar, ctx.auction)
            .with_budget(budget);
        if let Some(topology) = self.topology.as_ref() {
            auction = auction.with_topology(topology);
        }

        let interest = auction.interest_set(&me, Some(ctx.base), self.target, &mut self.blacklist);
        let result = auction.run(&me, &teammates, &interest, &mut self.blacklist);

        debug!(
            "Agent {}: {} frontiers, {} candidates, {} teammates, assigned {:?}",
            self.id,
            frontiers.len(),
            interest.len(),
            teammates.len(),
            result.assignment.as_ref().map(|a| a.frontier.centre)
        );

        FrontierChoice {
            assignment: result.assignment,
            candidates: interest.len(),
        }
    }

    // === Communication ===

    /// What teammates record about this agent when they hear it.
    pub fn teammate_info(&self, tick: u64) -> TeammateInfo {
        TeammateInfo {
            position: self.position,
            ability: self.ability,
            last_heard: tick,
            returning_to_base: self.is_returning_to_base(),
        }
    }

    pub fn hear(&mut self, teammate: usize, info: TeammateInfo) {
        if teammate != self.id {
            self.teammates.insert(teammate, info);
        }
    }

    pub fn heard_from_base(&mut self, tick: u64) {
        self.stats.last_base_contact = Some(tick);
    }

    /// Hand every owned cell to a teammate carrying it home.
    pub fn relay_owned_cells(&mut self) -> usize {
        let relayed = self.grid.relay_owned_cells();
        self.stats.cells_relayed += relayed;
        relayed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent_at(position: GridCoord, size: usize) -> Agent {
        Agent::new(0, position, (size, size), &AgentConfig::default(), None, 7)
    }

    #[test]
    fn test_follow_path_respects_speed() {
        let env = Environment::open(10, 10).unwrap();
        let mut agent = agent_at(GridCoord::new(0, 0), 10);
        agent.sense(&env);
        let path = Path::new((0..5).map(|x| GridCoord::new(x, 0)).collect());
        agent.set_path(None, path);

        assert_eq!(agent.follow_path(&env), 1);
        assert_eq!(agent.position(), GridCoord::new(1, 0));
        assert_eq!(agent.follow_path(&env), 1);
        assert_eq!(agent.position(), GridCoord::new(2, 0));
        assert!((agent.stats().distance_travelled - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_diagonal_step_waits_for_budget() {
        let env = Environment::open(5, 5).unwrap();
        let mut agent = agent_at(GridCoord::new(0, 0), 5);
        agent.set_path(None, Path::new(vec![GridCoord::new(0, 0), GridCoord::new(1, 1)]));

        assert_eq!(agent.follow_path(&env), 0);
        assert_eq!(agent.follow_path(&env), 1);
        assert_eq!(agent.position(), GridCoord::new(1, 1));
    }

    #[test]
    fn test_blocked_move_flags_environment_error() {
        let env = Environment::from_ascii("..#..\n").unwrap();
        let mut agent = agent_at(GridCoord::new(1, 0), 5);
        agent.grid_mut().set_safe_space_at(GridCoord::new(2, 0));
        agent.set_path(None, Path::new(vec![GridCoord::new(1, 0), GridCoord::new(2, 0)]));

        assert_eq!(agent.follow_path(&env), 0);
        assert_eq!(agent.position(), GridCoord::new(1, 0));
        assert!(agent.grid().obstacle_at(GridCoord::new(2, 0)));
        assert!(!agent.grid().safe_space_at(GridCoord::new(2, 0)));
        assert!(agent.take_environment_error());
        assert!(!agent.take_environment_error());
        assert_eq!(agent.stats().environment_errors, 1);
    }

    #[test]
    fn test_random_step_targets_known_free_neighbour() {
        let env = Environment::open(5, 5).unwrap();
        let mut agent = agent_at(GridCoord::new(2, 2), 5);
        agent.sense(&env);
        agent.random_step();

        let next = agent.path().next_point().expect("step");
        assert!(next.is_adjacent(&agent.position()));
        assert_ne!(next, agent.position());
        assert!(agent.grid().free_space_at(next));
    }

    #[test]
    fn test_recent_teammates() {
        let mut agent = agent_at(GridCoord::new(0, 0), 5);
        let info = |tick| TeammateInfo {
            position: GridCoord::new(3, 3),
            ability: 1,
            last_heard: tick,
            returning_to_base: false,
        };
        agent.hear(1, info(90));
        agent.hear(2, info(50));
        agent.hear(0, info(100));

        let recent = agent.recent_teammates(100, 10);
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].agent_id, 1);
    }
}
