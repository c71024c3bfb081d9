//! Core types shared by every layer of the pipeline.

mod line;
mod point;

pub use line::{BresenhamLine, cells_along_line};
pub use point::GridCoord;
