//! Configuration loading for the simulator

use std::path::Path;

use anveshak_map::{AStarConfig, AuctionConfig, GridCoord, TopologyConfig};
use serde::Deserialize;

use crate::error::{Result, SimError};

/// Main configuration structure
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SimConfig {
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub environment: EnvironmentConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub communication: CommunicationConfig,
    #[serde(default)]
    pub role: RoleConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub topology: TopologyConfig,
    #[serde(default)]
    pub astar: AStarConfig,
    #[serde(default)]
    pub auction: AuctionConfig,
}

/// Exploration strategy run by every agent
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Own frontiers only
    Frontier,
    /// Auction shared with recently heard teammates
    Coordinated,
    /// Coordinated exploration with periodic returns to base
    RoleBased,
    RandomWalk,
}

/// Run-level settings
#[derive(Clone, Debug, Deserialize)]
pub struct SimulationConfig {
    /// Number of agents (default: 3)
    #[serde(default = "default_agents")]
    pub agents: usize,

    /// Tick limit (default: 2000)
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,

    /// Stop once this fraction of free cells is known at base (default: 0.99)
    #[serde(default = "default_target_coverage")]
    pub target_coverage: f64,

    /// RNG seed (default: 42)
    #[serde(default = "default_seed")]
    pub seed: u64,

    #[serde(default = "default_strategy")]
    pub strategy: StrategyKind,

    /// Replan at least every this many ticks (default: 5)
    #[serde(default = "default_replan_interval")]
    pub replan_interval: u64,

    /// Log progress every this many ticks (default: 50)
    #[serde(default = "default_progress_interval")]
    pub progress_interval: u64,

    /// Plan through each agent's topological map (default: true)
    #[serde(default = "default_use_topology")]
    pub use_topology: bool,

    /// Base station cell; agents start here (default: (1, 1))
    #[serde(default = "default_base")]
    pub base: GridCoord,
}

/// Ground-truth world
#[derive(Clone, Debug, Deserialize)]
pub struct EnvironmentConfig {
    /// PNG/PGM bitmap or ASCII `.txt` map. Generated rooms when absent.
    #[serde(default)]
    pub map: Option<String>,

    /// Pixels darker than this are obstacles (default: 128)
    #[serde(default = "default_obstacle_threshold")]
    pub obstacle_threshold: u8,

    /// Generated world width (default: 60)
    #[serde(default = "default_width")]
    pub width: usize,

    /// Generated world height (default: 40)
    #[serde(default = "default_height")]
    pub height: usize,

    /// Rooms per row (default: 3)
    #[serde(default = "default_rooms_x")]
    pub rooms_x: usize,

    /// Rooms per column (default: 2)
    #[serde(default = "default_rooms_y")]
    pub rooms_y: usize,

    /// Doorway width in cells (default: 3)
    #[serde(default = "default_door_width")]
    pub door_width: usize,
}

/// Per-agent capabilities
#[derive(Clone, Debug, Deserialize)]
pub struct AgentConfig {
    /// Cells per tick (default: 1.0)
    #[serde(default = "default_speed")]
    pub speed: f64,

    /// Highest terrain class the agent may enter (default: 1)
    #[serde(default = "default_ability")]
    pub ability: u8,

    /// Sensor ray length in cells (default: 6.0)
    #[serde(default = "default_sensor_range")]
    pub sensor_range: f64,

    /// Cells within this range are marked safe (default: 2.0)
    #[serde(default = "default_safe_range")]
    pub safe_range: f64,
}

/// Communication predicate
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommunicationKind {
    Unlimited,
    CircularRange,
    LineOfSight,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CommunicationConfig {
    #[serde(default = "default_communication_model")]
    pub model: CommunicationKind,

    /// Range in cells for the ranged models (default: 15.0)
    #[serde(default = "default_communication_range")]
    pub range: f64,
}

/// Role-based strategy settings
#[derive(Clone, Debug, Deserialize)]
pub struct RoleConfig {
    /// Ticks between mandatory returns to base (default: 150)
    #[serde(default = "default_return_interval")]
    pub return_interval: u64,
}

/// Output configuration
#[derive(Clone, Debug, Deserialize)]
pub struct OutputConfig {
    /// Where to save the base station's map (default: output/base_map.png)
    #[serde(default = "default_map_path")]
    pub map_path: Option<String>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            agents: default_agents(),
            max_ticks: default_max_ticks(),
            target_coverage: default_target_coverage(),
            seed: default_seed(),
            strategy: default_strategy(),
            replan_interval: default_replan_interval(),
            progress_interval: default_progress_interval(),
            use_topology: default_use_topology(),
            base: default_base(),
        }
    }
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            map: None,
            obstacle_threshold: default_obstacle_threshold(),
            width: default_width(),
            height: default_height(),
            rooms_x: default_rooms_x(),
            rooms_y: default_rooms_y(),
            door_width: default_door_width(),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            speed: default_speed(),
            ability: default_ability(),
            sensor_range: default_sensor_range(),
            safe_range: default_safe_range(),
        }
    }
}

impl Default for CommunicationConfig {
    fn default() -> Self {
        Self {
            model: default_communication_model(),
            range: default_communication_range(),
        }
    }
}

impl Default for RoleConfig {
    fn default() -> Self {
        Self {
            return_interval: default_return_interval(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            map_path: default_map_path(),
        }
    }
}

// Default value functions
fn default_agents() -> usize {
    3
}
fn default_max_ticks() -> u64 {
    2000
}
fn default_target_coverage() -> f64 {
    0.99
}
fn default_seed() -> u64 {
    42
}
fn default_strategy() -> StrategyKind {
    StrategyKind::Coordinated
}
fn default_replan_interval() -> u64 {
    5
}
fn default_progress_interval() -> u64 {
    50
}
fn default_use_topology() -> bool {
    true
}
fn default_base() -> GridCoord {
    GridCoord::new(1, 1)
}

// Environment defaults
fn default_obstacle_threshold() -> u8 {
    128
}
fn default_width() -> usize {
    60
}
fn default_height() -> usize {
    40
}
fn default_rooms_x() -> usize {
    3
}
fn default_rooms_y() -> usize {
    2
}
fn default_door_width() -> usize {
    3
}

// Agent defaults
fn default_speed() -> f64 {
    1.0
}
fn default_ability() -> u8 {
    anveshak_map::pathfinding::DEFAULT_ABILITY
}
fn default_sensor_range() -> f64 {
    6.0
}
fn default_safe_range() -> f64 {
    2.0
}

fn default_communication_model() -> CommunicationKind {
    CommunicationKind::CircularRange
}
fn default_communication_range() -> f64 {
    15.0
}
fn default_return_interval() -> u64 {
    150
}
fn default_map_path() -> Option<String> {
    Some("output/base_map.png".to_string())
}

impl SimConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: SimConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the simulation cannot run with.
    pub fn validate(&self) -> Result<()> {
        let sim = &self.simulation;
        if sim.agents == 0 {
            return Err(SimError::InvalidConfig("agents must be at least 1".into()));
        }
        if !(sim.target_coverage > 0.0 && sim.target_coverage <= 1.0) {
            return Err(SimError::InvalidConfig(format!(
                "target_coverage {} outside (0, 1]",
                sim.target_coverage
            )));
        }
        if sim.replan_interval == 0 {
            return Err(SimError::InvalidConfig(
                "replan_interval must be at least 1".into(),
            ));
        }
        if self.agent.speed <= 0.0 {
            return Err(SimError::InvalidConfig(format!(
                "agent speed {} must be positive",
                self.agent.speed
            )));
        }
        if self.agent.sensor_range < 1.0 {
            return Err(SimError::InvalidConfig(format!(
                "sensor_range {} must be at least one cell",
                self.agent.sensor_range
            )));
        }
        if self.agent.safe_range > self.agent.sensor_range {
            return Err(SimError::InvalidConfig(format!(
                "safe_range {} exceeds sensor_range {}",
                self.agent.safe_range, self.agent.sensor_range
            )));
        }
        Ok(())
    }
}
