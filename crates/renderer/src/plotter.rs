//! Per-worker rendering logic.
//!
//! Every render operation hands each worker one of three jobs: draining the
//! chunk pool, filling a band of rows from the coloring rule, or clearing a
//! band of the buffer. Solid and clear workers own disjoint slices of the
//! canvas; chunk workers share an atomic view of the whole buffer and accept
//! last-write-wins on pixels hit by more than one chunk.

use std::sync::atomic::{AtomicU32, Ordering};

use raster_common::PixelFormat;

use crate::coloring::ColoringRule;
use crate::pool::ChunkPool;
use crate::transform::PlaneTransform;

/// View a mutable pixel slice as atomic words.
///
/// Chunk workers write through this view without locking: each store is a
/// single word, so concurrent writes to one pixel leave it holding one of
/// the candidate colors, never a torn value.
pub(crate) fn as_atomic(pixels: &mut [u32]) -> &[AtomicU32] {
    // SAFETY: AtomicU32 has the same size and alignment as u32, and the
    // exclusive borrow rules out non-atomic access for the view's lifetime.
    unsafe { &*(pixels as *mut [u32] as *const [AtomicU32]) }
}

/// Chunk mode: drain the pool, plotting every point of every claimed chunk.
///
/// Points whose pixel position falls outside the canvas are dropped.
pub(crate) fn plot_chunks(
    pixels: &[AtomicU32],
    pool: &ChunkPool,
    transform: &PlaneTransform,
    rule: &dyn ColoringRule,
    format: PixelFormat,
) {
    let width = transform.width() as usize;
    while let Some(chunk) = pool.take() {
        for pair in chunk.chunks_exact(2) {
            let (x, y) = (pair[0] as f64, pair[1] as f64);
            if let Some((px, py)) = transform.plane_to_pixel(x, y) {
                let packed = format.pack(rule.color_at(x, y));
                pixels[py as usize * width + px as usize].store(packed, Ordering::Relaxed);
            }
        }
    }
}

/// Solid mode: fill a band of whole rows, coloring each pixel from the
/// plane position it samples.
///
/// `band` must hold exactly the pixels of the rows starting at `row_start`.
pub(crate) fn fill_rows(
    band: &mut [u32],
    row_start: u32,
    transform: &PlaneTransform,
    rule: &dyn ColoringRule,
    format: PixelFormat,
) {
    let width = transform.width() as usize;
    for (i, pixel) in band.iter_mut().enumerate() {
        let px = (i % width) as u32;
        let py = row_start + (i / width) as u32;
        let (x, y) = transform.pixel_to_plane(px, py);
        *pixel = format.pack(rule.color_at(x, y));
    }
}

/// Clear mode: reset every pixel of the band to the packed background color.
pub(crate) fn clear_band(band: &mut [u32], background: u32) {
    band.fill(background);
}
