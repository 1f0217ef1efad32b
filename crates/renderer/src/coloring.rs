//! Color-selection policies for plotted points and background fills.

use raster_common::{Bounds, Color};

/// Policy assigning colors to plotted units.
///
/// `color_at` receives a plane position: the point itself during chunk
/// rendering, or the pixel's sampled plane position during a solid fill.
/// The engine never inspects how the color is produced; rules are shared
/// read-only by all workers of an operation.
pub trait ColoringRule: Send + Sync {
    /// Color used by clears and as the canvas background.
    fn background(&self) -> Color;

    /// Color for the plotted unit at the given plane position.
    fn color_at(&self, x: f64, y: f64) -> Color;
}

/// Fixed background and foreground colors. The default rule.
#[derive(Debug, Clone, Copy)]
pub struct FlatColoring {
    pub background: Color,
    pub foreground: Color,
}

impl FlatColoring {
    pub fn new(background: Color, foreground: Color) -> Self {
        Self {
            background,
            foreground,
        }
    }
}

impl Default for FlatColoring {
    /// Opaque black background, opaque white foreground.
    fn default() -> Self {
        Self {
            background: Color::opaque(0, 0, 0),
            foreground: Color::opaque(255, 255, 255),
        }
    }
}

impl ColoringRule for FlatColoring {
    fn background(&self) -> Color {
        self.background
    }

    fn color_at(&self, _x: f64, _y: f64) -> Color {
        self.foreground
    }
}

/// Two-stop linear gradient across the horizontal span of the plot window.
#[derive(Debug, Clone)]
pub struct GradientColoring {
    background: Color,
    start: Color,
    end: Color,
    min_x: f64,
    span: f64,
}

impl GradientColoring {
    /// Gradient from `start` at the window's left edge to `end` at its
    /// right edge. Positions outside the window clamp to the nearer stop.
    pub fn new(background: Color, start: Color, end: Color, bounds: Bounds) -> Self {
        Self {
            background,
            start,
            end,
            min_x: bounds.min_x(),
            span: bounds.width(),
        }
    }
}

impl ColoringRule for GradientColoring {
    fn background(&self) -> Color {
        self.background
    }

    fn color_at(&self, x: f64, _y: f64) -> Color {
        let t = ((x - self.min_x) / self.span) as f32;
        interpolate_color(self.start, self.end, t)
    }
}

/// Linear color interpolation.
pub fn interpolate_color(color1: Color, color2: Color, t: f32) -> Color {
    let t = t.clamp(0.0, 1.0);
    let t_inv = 1.0 - t;

    Color::new(
        ((color1.r as f32 * t_inv) + (color2.r as f32 * t)) as u8,
        ((color1.g as f32 * t_inv) + (color2.g as f32 * t)) as u8,
        ((color1.b as f32 * t_inv) + (color2.b as f32 * t)) as u8,
        ((color1.a as f32 * t_inv) + (color2.a as f32 * t)) as u8,
    )
}
