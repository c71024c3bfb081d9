//! `anveshak` - run one exploration simulation and save the base station's map.
//!
//! ```text
//! anveshak --config anveshak.toml --agents 4 --output output/base.png
//! RUST_LOG=anveshak_sim=debug anveshak --map maps/office.png
//! ```

use std::path::{Path, PathBuf};

use anveshak_sim::{Result, SimConfig, Simulation};
use clap::Parser;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Environment bitmap (PNG/PGM) or ASCII (.txt) map
    #[arg(short, long)]
    map: Option<String>,

    /// Number of agents
    #[arg(short, long)]
    agents: Option<usize>,

    /// Maximum ticks
    #[arg(short, long)]
    ticks: Option<u64>,

    /// RNG seed
    #[arg(short, long)]
    seed: Option<u64>,

    /// Where to write the base station map
    #[arg(short, long)]
    output: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("anveshak_sim=info".parse().unwrap()),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            SimConfig::load(path)?
        }
        None if Path::new("anveshak.toml").exists() => {
            info!("Loading configuration from anveshak.toml");
            SimConfig::load(Path::new("anveshak.toml"))?
        }
        None => {
            info!("Using default configuration");
            SimConfig::default()
        }
    };

    // Command line overrides
    if let Some(map) = args.map {
        config.environment.map = Some(map);
    }
    if let Some(agents) = args.agents {
        config.simulation.agents = agents;
    }
    if let Some(ticks) = args.ticks {
        config.simulation.max_ticks = ticks;
    }
    if let Some(seed) = args.seed {
        config.simulation.seed = seed;
    }
    if let Some(output) = args.output {
        config.output.map_path = Some(output);
    }
    config.validate()?;

    info!("Anveshak v{}", env!("CARGO_PKG_VERSION"));
    let output = config.output.map_path.clone();

    let mut sim = Simulation::from_config(config)?;
    let report = sim.run()?;

    for (id, stats) in report.agents.iter().enumerate() {
        info!(
            "Agent {}: travelled {:.1} cells, {} replans, {} cells relayed",
            id, stats.distance_travelled, stats.replans, stats.cells_relayed
        );
    }

    if let Some(output) = output {
        let path = Path::new(&output);
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        sim.base_grid().save_png(path)?;
        info!("Base station map saved to {}", path.display());
    }

    Ok(())
}
