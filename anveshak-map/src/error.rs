//! Error types for anveshak-map

use thiserror::Error;

/// Map-layer error type
#[derive(Error, Debug)]
pub enum MapError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Grid dimensions {width}x{height} are invalid")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Grid dimension mismatch: expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },
}

pub type Result<T> = std::result::Result<T, MapError>;
