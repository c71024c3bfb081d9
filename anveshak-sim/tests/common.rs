//! Test utilities for anveshak-sim.

#![allow(dead_code)]

use anveshak_sim::{CommunicationKind, SimConfig, StrategyKind};
use anveshak_map::GridCoord;

/// Small, fast configuration without topology.
pub fn quick_config(agents: usize, strategy: StrategyKind) -> SimConfig {
    let mut config = SimConfig::default();
    config.simulation.agents = agents;
    config.simulation.strategy = strategy;
    config.simulation.max_ticks = 300;
    config.simulation.base = GridCoord::new(1, 1);
    config.simulation.use_topology = false;
    config.simulation.progress_interval = 1000;
    config.communication.model = CommunicationKind::Unlimited;
    config.agent.sensor_range = 5.0;
    config.agent.safe_range = 1.0;
    config.output.map_path = None;
    config
}

/// Scratch directory unique to one test.
pub fn scratch_dir(name: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("anveshak-{}-{}", name, std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}
