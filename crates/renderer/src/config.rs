//! Plot configuration loaded from JSON.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use raster_common::{Bounds, Color, PixelFormat, RasterError, RasterResult};

use crate::coloring::{ColoringRule, FlatColoring, GradientColoring};

/// Plot configuration.
///
/// Only the resolution is required; everything else falls back to the
/// engine defaults (unit bounds, flat black/white coloring, RGBA packing,
/// the host's available parallelism).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlotConfig {
    pub width: u32,
    pub height: u32,
    /// Plane window as [min_x, min_y, max_x, max_y].
    pub bounds: Option<[f64; 4]>,
    pub pixel_format: Option<PixelFormat>,
    /// Worker thread budget.
    pub max_threads: Option<usize>,
    pub coloring: Option<ColoringConfig>,
}

/// Coloring rule selection.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ColoringConfig {
    Flat {
        background: String,
        foreground: String,
    },
    Gradient {
        background: String,
        start: String,
        end: String,
    },
}

impl PlotConfig {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            bounds: None,
            pixel_format: None,
            max_threads: None,
            coloring: None,
        }
    }

    /// Load plot configuration from a JSON string.
    pub fn from_json(json_str: &str) -> RasterResult<Self> {
        serde_json::from_str(json_str).map_err(|e| RasterError::InvalidConfig(e.to_string()))
    }

    /// Load plot configuration from a file.
    pub fn from_file(path: impl AsRef<Path>) -> RasterResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Resolve the configured plane window, validating it.
    pub fn resolve_bounds(&self) -> RasterResult<Bounds> {
        match self.bounds {
            Some([min_x, min_y, max_x, max_y]) => Bounds::new(min_x, min_y, max_x, max_y),
            None => Ok(Bounds::default()),
        }
    }

    /// Build the configured coloring rule against the given window.
    pub fn resolve_coloring(&self, bounds: Bounds) -> RasterResult<Arc<dyn ColoringRule>> {
        match &self.coloring {
            None => Ok(Arc::new(FlatColoring::default())),
            Some(ColoringConfig::Flat {
                background,
                foreground,
            }) => Ok(Arc::new(FlatColoring::new(
                parse_hex_color(background)?,
                parse_hex_color(foreground)?,
            ))),
            Some(ColoringConfig::Gradient {
                background,
                start,
                end,
            }) => Ok(Arc::new(GradientColoring::new(
                parse_hex_color(background)?,
                parse_hex_color(start)?,
                parse_hex_color(end)?,
                bounds,
            ))),
        }
    }
}

/// Parse a hex color string: "#rrggbb" or "#rrggbbaa".
pub fn parse_hex_color(hex: &str) -> RasterResult<Color> {
    let digits = hex.trim_start_matches('#');
    if digits.len() != 6 && digits.len() != 8 {
        return Err(RasterError::InvalidConfig(format!(
            "invalid hex color: {}",
            hex
        )));
    }

    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&digits[range], 16)
            .map_err(|_| RasterError::InvalidConfig(format!("invalid hex color: {}", hex)))
    };

    let r = channel(0..2)?;
    let g = channel(2..4)?;
    let b = channel(4..6)?;
    let a = if digits.len() == 8 { channel(6..8)? } else { 255 };

    Ok(Color::new(r, g, b, a))
}
