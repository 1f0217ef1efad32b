//! PNG encoding for the packed pixel canvas.
//!
//! Supports two encoding modes:
//! - **Indexed PNG (color type 3)**: used when the canvas holds ≤256 unique
//!   colors. Point plots usually carry a background plus a handful of rule
//!   colors, so this is the common case and produces much smaller files.
//! - **RGBA PNG (color type 6)**: fallback for canvases with >256 colors.
//!
//! `encode` selects the mode automatically. The canvas stores one packed
//! word per pixel; scanlines are unpacked according to the active
//! `PixelFormat`.

use rayon::prelude::*;
use std::collections::HashMap;
use std::io::Write;

use raster_common::{Color, PixelFormat, RasterError, RasterResult};

/// Maximum colors for indexed PNG (PNG8)
const MAX_PALETTE_SIZE: usize = 256;

/// Minimum pixels to benefit from parallel palette extraction
const PARALLEL_THRESHOLD: usize = 4096; // 64x64 or larger

/// Encode a packed pixel canvas as a PNG with automatic format selection.
///
/// # Arguments
/// - `pixels`: packed pixel words, row-major, `width * height` long
/// - `width`: canvas width in pixels
/// - `height`: canvas height in pixels
/// - `format`: channel layout of the packed words
pub fn encode(
    pixels: &[u32],
    width: usize,
    height: usize,
    format: PixelFormat,
) -> RasterResult<Vec<u8>> {
    if pixels.len() != width * height {
        return Err(RasterError::Encode(format!(
            "buffer holds {} pixels, expected {}x{}",
            pixels.len(),
            width,
            height
        )));
    }

    let palette_result = if pixels.len() >= PARALLEL_THRESHOLD {
        extract_palette_parallel(pixels)
    } else {
        extract_palette_sequential(pixels)
    };

    match palette_result {
        Some((palette, indices)) => {
            let colors: Vec<Color> = palette.iter().map(|&packed| format.unpack(packed)).collect();
            encode_indexed(width, height, &colors, &indices)
        }
        None => encode_rgba(pixels, width, height, format),
    }
}

/// Sequential palette extraction for small canvases.
fn extract_palette_sequential(pixels: &[u32]) -> Option<(Vec<u32>, Vec<u8>)> {
    let mut color_to_index: HashMap<u32, u8> = HashMap::with_capacity(MAX_PALETTE_SIZE);
    let mut palette: Vec<u32> = Vec::with_capacity(MAX_PALETTE_SIZE);
    let mut indices: Vec<u8> = Vec::with_capacity(pixels.len());

    for &packed in pixels {
        let index = match color_to_index.get(&packed) {
            Some(&idx) => idx,
            None => {
                if palette.len() >= MAX_PALETTE_SIZE {
                    return None;
                }
                let idx = palette.len() as u8;
                palette.push(packed);
                color_to_index.insert(packed, idx);
                idx
            }
        };
        indices.push(index);
    }

    Some((palette, indices))
}

/// Parallel palette extraction for larger canvases.
///
/// Strategy:
/// 1. Parallel pass: collect unique colors per chunk with thread-local maps
/// 2. Merge unique colors and check if ≤256
/// 3. Parallel pass: map each pixel to its palette index
fn extract_palette_parallel(pixels: &[u32]) -> Option<(Vec<u32>, Vec<u8>)> {
    let chunk_size = (pixels.len() / rayon::current_num_threads()).max(256);

    let unique_colors: Vec<u32> = pixels
        .par_chunks(chunk_size)
        .flat_map(|chunk| {
            let mut local_colors: HashMap<u32, ()> = HashMap::with_capacity(MAX_PALETTE_SIZE);
            for &packed in chunk {
                local_colors.insert(packed, ());
                // Early exit once this chunk alone rules out a palette
                if local_colors.len() > MAX_PALETTE_SIZE {
                    break;
                }
            }
            local_colors.into_keys().collect::<Vec<_>>()
        })
        .collect();

    let mut color_to_index: HashMap<u32, u8> = HashMap::with_capacity(MAX_PALETTE_SIZE);
    let mut palette: Vec<u32> = Vec::with_capacity(MAX_PALETTE_SIZE);

    for packed in unique_colors {
        if !color_to_index.contains_key(&packed) {
            if palette.len() >= MAX_PALETTE_SIZE {
                return None;
            }
            let idx = palette.len() as u8;
            color_to_index.insert(packed, idx);
            palette.push(packed);
        }
    }

    let mut indices = vec![0u8; pixels.len()];
    indices
        .par_chunks_mut(chunk_size)
        .zip(pixels.par_chunks(chunk_size))
        .for_each(|(index_chunk, pixel_chunk)| {
            for (index, &packed) in index_chunk.iter_mut().zip(pixel_chunk) {
                *index = *color_to_index.get(&packed).unwrap_or(&0);
            }
        });

    Some((palette, indices))
}

/// Create an indexed PNG (color type 3) from palette and indices.
///
/// More efficient than RGBA when the canvas has few unique colors:
/// 1 byte per pixel instead of 4, and less data to compress.
fn encode_indexed(
    width: usize,
    height: usize,
    palette: &[Color],
    indices: &[u8],
) -> RasterResult<Vec<u8>> {
    let mut png = Vec::new();

    // PNG signature
    png.extend_from_slice(&[137, 80, 78, 71, 13, 10, 26, 10]);

    // IHDR chunk
    let mut ihdr_data = Vec::with_capacity(13);
    ihdr_data.extend_from_slice(&(width as u32).to_be_bytes());
    ihdr_data.extend_from_slice(&(height as u32).to_be_bytes());
    ihdr_data.push(8); // bit depth (8 bits per palette index)
    ihdr_data.push(3); // color type 3 = indexed
    ihdr_data.push(0); // compression method
    ihdr_data.push(0); // filter method
    ihdr_data.push(0); // interlace method
    write_chunk(&mut png, b"IHDR", &ihdr_data);

    // PLTE chunk (palette)
    let mut plte_data = Vec::with_capacity(palette.len() * 3);
    for color in palette {
        plte_data.push(color.r);
        plte_data.push(color.g);
        plte_data.push(color.b);
    }
    write_chunk(&mut png, b"PLTE", &plte_data);

    // tRNS chunk (transparency) - only if any color has alpha < 255
    let has_transparency = palette.iter().any(|color| color.a < 255);
    if has_transparency {
        let trns_data: Vec<u8> = palette.iter().map(|color| color.a).collect();
        write_chunk(&mut png, b"tRNS", &trns_data);
    }

    // IDAT chunk (image data)
    let idat_data = deflate_idat_indexed(indices, width, height)
        .map_err(|e| RasterError::Encode(format!("IDAT compression failed: {}", e)))?;
    write_chunk(&mut png, b"IDAT", &idat_data);

    // IEND chunk
    write_chunk(&mut png, b"IEND", &[]);

    Ok(png)
}

/// Deflate indexed image data for the IDAT chunk.
fn deflate_idat_indexed(indices: &[u8], width: usize, height: usize) -> std::io::Result<Vec<u8>> {
    // Each scanline: 1 filter byte (0 = none) + width index bytes
    let mut uncompressed = Vec::with_capacity(height * (1 + width));

    for row in indices.chunks_exact(width) {
        uncompressed.push(0); // filter type: none
        uncompressed.extend_from_slice(row);
    }

    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::fast());
    encoder.write_all(&uncompressed)?;
    encoder.finish()
}

/// Create an RGBA PNG (color type 6). Fallback for >256 unique colors.
fn encode_rgba(
    pixels: &[u32],
    width: usize,
    height: usize,
    format: PixelFormat,
) -> RasterResult<Vec<u8>> {
    let mut png = Vec::new();

    // PNG signature
    png.extend_from_slice(&[137, 80, 78, 71, 13, 10, 26, 10]);

    // IHDR chunk
    let mut ihdr_data = Vec::new();
    ihdr_data.extend_from_slice(&(width as u32).to_be_bytes());
    ihdr_data.extend_from_slice(&(height as u32).to_be_bytes());
    ihdr_data.push(8); // bit depth
    ihdr_data.push(6); // color type (RGBA)
    ihdr_data.push(0); // compression method
    ihdr_data.push(0); // filter method
    ihdr_data.push(0); // interlace method
    write_chunk(&mut png, b"IHDR", &ihdr_data);

    // IDAT chunk (image data)
    let idat_data = deflate_idat_rgba(pixels, width, height, format)
        .map_err(|e| RasterError::Encode(format!("IDAT compression failed: {}", e)))?;
    write_chunk(&mut png, b"IDAT", &idat_data);

    // IEND chunk
    write_chunk(&mut png, b"IEND", &[]);

    Ok(png)
}

/// Deflate RGBA image data for the IDAT chunk, unpacking each pixel word.
fn deflate_idat_rgba(
    pixels: &[u32],
    width: usize,
    height: usize,
    format: PixelFormat,
) -> std::io::Result<Vec<u8>> {
    let mut uncompressed = Vec::with_capacity(height * (1 + width * 4));

    for row in pixels.chunks_exact(width) {
        uncompressed.push(0); // filter type: none
        for &packed in row {
            let color = format.unpack(packed);
            uncompressed.extend_from_slice(&[color.r, color.g, color.b, color.a]);
        }
    }

    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::fast());
    encoder.write_all(&uncompressed)?;
    encoder.finish()
}

/// Write a PNG chunk: length, type, data, CRC.
fn write_chunk(png: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());
    png.extend_from_slice(chunk_type);
    png.extend_from_slice(data);

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(chunk_type);
    hasher.update(data);
    png.extend_from_slice(&hasher.finalize().to_be_bytes());
}
