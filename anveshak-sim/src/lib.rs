//! Anveshak - multi-robot exploration simulator
//!
//! Agents explore a ground-truth [`Environment`] they cannot see directly.
//! Each one senses into its own occupancy grid, picks frontiers through the
//! auction in `anveshak-map`, and shares its map with teammates and the base
//! station whenever the [`CommunicationModel`] links them.
//!
//! ## Tick structure
//!
//! - **Movement**: one scoped thread per agent moves, senses and replans
//! - **Communication**: deterministic base and pairwise merges, relaying
//! - **Statistics**: coverage of the base station's map
//!
//! ```rust,ignore
//! use anveshak_sim::{SimConfig, Simulation};
//!
//! let mut sim = Simulation::from_config(SimConfig::default())?;
//! let report = sim.run()?;
//! println!("{:.1}% after {} ticks", report.coverage * 100.0, report.ticks);
//! ```

pub mod agent;
pub mod comms;
pub mod config;
pub mod environment;
pub mod error;
pub mod sensing;
pub mod simulation;
pub mod strategy;

pub use agent::{Agent, AgentStats, PlanContext, TeammateInfo};
pub use comms::{CircularRange, CommunicationModel, LineOfSight, Unlimited};
pub use config::{CommunicationKind, SimConfig, StrategyKind};
pub use environment::{Environment, Status};
pub use error::{Result, SimError};
pub use sensing::{SenseResult, SensorModel};
pub use simulation::{EndReason, Simulation, SimulationReport, TickStats};
pub use strategy::{ExplorationState, ExplorationStrategy};
