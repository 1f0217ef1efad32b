//! Color values and packed pixel formats.

use serde::{Deserialize, Serialize};

/// Color value in RGBA components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn transparent() -> Self {
        Self {
            r: 0,
            g: 0,
            b: 0,
            a: 0,
        }
    }
}

/// Channel layout of one packed pixel word.
///
/// The canvas stores one `u32` per pixel; the coloring rules and the PNG
/// encoder agree on the layout through this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelFormat {
    /// r | g<<8 | b<<16 | a<<24
    #[default]
    Rgba8888,
    /// b | g<<8 | r<<16 | a<<24
    Argb8888,
}

impl PixelFormat {
    /// Pack RGBA components into a single pixel word.
    #[inline(always)]
    pub fn pack(self, color: Color) -> u32 {
        match self {
            PixelFormat::Rgba8888 => {
                (color.r as u32)
                    | ((color.g as u32) << 8)
                    | ((color.b as u32) << 16)
                    | ((color.a as u32) << 24)
            }
            PixelFormat::Argb8888 => {
                (color.b as u32)
                    | ((color.g as u32) << 8)
                    | ((color.r as u32) << 16)
                    | ((color.a as u32) << 24)
            }
        }
    }

    /// Unpack a pixel word back into RGBA components.
    #[inline(always)]
    pub fn unpack(self, packed: u32) -> Color {
        match self {
            PixelFormat::Rgba8888 => Color::new(
                packed as u8,
                (packed >> 8) as u8,
                (packed >> 16) as u8,
                (packed >> 24) as u8,
            ),
            PixelFormat::Argb8888 => Color::new(
                (packed >> 16) as u8,
                (packed >> 8) as u8,
                packed as u8,
                (packed >> 24) as u8,
            ),
        }
    }
}
