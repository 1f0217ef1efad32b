//! Error types for the raster-plot crates.

use thiserror::Error;

/// Result type alias using RasterError.
pub type RasterResult<T> = Result<T, RasterError>;

/// Primary error type for plot operations.
#[derive(Debug, Error)]
pub enum RasterError {
    // === Configuration Errors ===
    #[error("Invalid bounds: {0}")]
    InvalidBounds(String),

    #[error("Invalid resolution: {width}x{height} (both dimensions must be positive)")]
    InvalidResolution { width: u32, height: u32 },

    #[error("Invalid thread count: 0 (must be positive)")]
    InvalidThreadCount,

    #[error("Invalid plot configuration: {0}")]
    InvalidConfig(String),

    // === Encoding Errors ===
    #[error("PNG encoding failed: {0}")]
    Encode(String),

    // === Infrastructure Errors ===
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
