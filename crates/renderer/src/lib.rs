//! Concurrent 2-D point rasterization.
//!
//! Renders batches of plane-space points onto a shared pixel canvas using
//! short-lived worker threads. Three operations cover the canvas:
//! - chunk rendering: every pending point chunk painted once
//! - solid fill: every pixel colored from its plane position
//! - clear: every pixel reset to the background color

pub mod coloring;
pub mod config;
pub mod plot;
pub mod png;
pub mod pool;
mod plotter;
pub mod transform;

pub use coloring::{ColoringRule, FlatColoring, GradientColoring};
pub use config::{ColoringConfig, PlotConfig};
pub use plot::RasterPlot;
pub use pool::ChunkPool;
pub use transform::PlaneTransform;
