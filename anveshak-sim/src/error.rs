//! Error types for anveshak-sim

use anveshak_map::MapError;
use thiserror::Error;

/// Simulator error type
#[derive(Error, Debug)]
pub enum SimError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Map error: {0}")]
    Map(#[from] MapError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Agent {0} thread panicked")]
    AgentPanicked(usize),

    #[error("Failed to spawn agent thread: {0}")]
    ThreadSpawn(String),
}

pub type Result<T> = std::result::Result<T, SimError>;
