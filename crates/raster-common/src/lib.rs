//! Common types shared across the raster-plot crates.

pub mod bounds;
pub mod color;
pub mod error;

pub use bounds::Bounds;
pub use color::{Color, PixelFormat};
pub use error::{RasterError, RasterResult};
