//! Canvas state and render orchestration.

use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Instant;

use raster_common::{Bounds, PixelFormat, RasterError, RasterResult};

use crate::coloring::{ColoringRule, FlatColoring};
use crate::config::PlotConfig;
use crate::plotter;
use crate::png;
use crate::pool::ChunkPool;
use crate::transform::PlaneTransform;

/// The plot canvas and its render configuration.
///
/// Owns the pixel buffer, the pending chunk list, the plane window and the
/// coloring rule, and drives every operation by partitioning work across
/// short-lived worker threads. Each public render/clear call spawns its
/// workers, joins them all and only then returns; a worker that fails to
/// join is logged and the operation keeps the remaining workers' results.
///
/// Chunks accumulate across render passes: `render_chunks` paints the whole
/// pending list every time, and only `clear_data` empties it.
pub struct RasterPlot {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
    chunks: Mutex<Vec<Arc<[f32]>>>,
    bounds: Bounds,
    transform: PlaneTransform,
    rule: Arc<dyn ColoringRule>,
    format: PixelFormat,
    max_threads: usize,
}

impl RasterPlot {
    /// Create a plot with the default window, coloring rule, pixel format
    /// and thread budget.
    pub fn new(width: u32, height: u32) -> RasterResult<Self> {
        Self::with_options(
            width,
            height,
            Bounds::default(),
            Arc::new(FlatColoring::default()),
            PixelFormat::default(),
            default_thread_count(),
        )
    }

    /// Create a plot with explicit configuration.
    ///
    /// Rejects zero canvas dimensions and a zero thread budget; bounds are
    /// already validated by construction.
    pub fn with_options(
        width: u32,
        height: u32,
        bounds: Bounds,
        rule: Arc<dyn ColoringRule>,
        format: PixelFormat,
        max_threads: usize,
    ) -> RasterResult<Self> {
        if width == 0 || height == 0 {
            return Err(RasterError::InvalidResolution { width, height });
        }
        if max_threads == 0 {
            return Err(RasterError::InvalidThreadCount);
        }
        Ok(Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize],
            chunks: Mutex::new(Vec::new()),
            bounds,
            transform: PlaneTransform::new(bounds, width, height),
            rule,
            format,
            max_threads,
        })
    }

    /// Create a plot from a loaded configuration.
    pub fn from_config(config: &PlotConfig) -> RasterResult<Self> {
        let bounds = config.resolve_bounds()?;
        let rule = config.resolve_coloring(bounds)?;
        Self::with_options(
            config.width,
            config.height,
            bounds,
            rule,
            config.pixel_format.unwrap_or_default(),
            config.max_threads.unwrap_or_else(default_thread_count),
        )
    }

    /// Queue a chunk of interleaved (x, y) plane coordinates for rendering.
    ///
    /// A chunk of odd length does not describe whole points and is dropped
    /// without touching the pending list. Safe to call from any number of
    /// threads; a render pass snapshots the list once at its start, so
    /// chunks queued while it runs land in the next pass.
    pub fn put_chunk(&self, points: impl Into<Arc<[f32]>>) {
        let points = points.into();
        if points.len() % 2 != 0 {
            tracing::debug!(len = points.len(), "Dropping odd-length chunk");
            return;
        }
        self.lock_chunks().push(points);
    }

    /// Drop every pending chunk. The pixel buffer is untouched.
    pub fn clear_data(&self) {
        self.lock_chunks().clear();
    }

    /// Number of chunks currently queued.
    pub fn pending_chunks(&self) -> usize {
        self.lock_chunks().len()
    }

    /// Render every pending chunk onto the canvas.
    ///
    /// Workers pull chunks from a shared pool until it runs dry; each point
    /// is transformed, clipped against the canvas and painted with the
    /// coloring rule. Pixels hit by more than one chunk keep one of the
    /// candidate colors (single-word stores, no locking). With nothing
    /// pending, no workers are spawned and the buffer is left as is.
    pub fn render_chunks(&mut self) {
        let started = Instant::now();
        let snapshot = self.lock_chunks().clone();
        let pool = ChunkPool::new(snapshot);
        let threads = pool.len().min(self.max_threads);
        if threads == 0 {
            tracing::info!("No pending chunks to render");
            return;
        }
        tracing::info!(chunks = pool.len(), threads, "Started rendering chunks");

        let pixels = plotter::as_atomic(&mut self.pixels);
        let transform = &self.transform;
        let rule = self.rule.as_ref();
        let format = self.format;
        thread::scope(|scope| {
            let handles: Vec<_> = (0..threads)
                .map(|_| scope.spawn(|| plotter::plot_chunks(pixels, &pool, transform, rule, format)))
                .collect();
            join_workers(handles);
        });

        tracing::info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Chunk rendering finished"
        );
    }

    /// Fill the whole canvas, coloring every pixel from the plane position
    /// it samples.
    ///
    /// Spawns the full thread budget; each worker owns a disjoint band of
    /// rows, with the remainder rows on the last worker, so the canvas is
    /// covered exactly once.
    pub fn render_solid(&mut self) {
        let started = Instant::now();
        let max_threads = self.max_threads;
        tracing::info!(threads = max_threads, "Rendering solid fill");

        let width = self.width as usize;
        let transform = &self.transform;
        let rule = self.rule.as_ref();
        let format = self.format;
        let bands = partition(&mut self.pixels, max_threads, width);

        thread::scope(|scope| {
            let mut handles = Vec::with_capacity(max_threads);
            let mut row_start = 0u32;
            for band in bands {
                let rows = (band.len() / width) as u32;
                let start = row_start;
                handles.push(
                    scope.spawn(move || plotter::fill_rows(band, start, transform, rule, format)),
                );
                row_start += rows;
            }
            join_workers(handles);
        });

        tracing::info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Solid fill finished"
        );
    }

    /// Reset every pixel to the coloring rule's background color.
    ///
    /// Spawns the full thread budget over disjoint index bands, remainder
    /// on the last worker.
    pub fn clear_plot(&mut self) {
        let started = Instant::now();
        let max_threads = self.max_threads;
        tracing::info!(threads = max_threads, "Clearing plot");

        let background = self.format.pack(self.rule.background());
        let bands = partition(&mut self.pixels, max_threads, 1);

        thread::scope(|scope| {
            let handles: Vec<_> = bands
                .into_iter()
                .map(|band| scope.spawn(move || plotter::clear_band(band, background)))
                .collect();
            join_workers(handles);
        });

        tracing::info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Clearing finished"
        );
    }

    /// Replace the plane window and rebuild the transform.
    pub fn set_bounds(&mut self, bounds: Bounds) {
        self.bounds = bounds;
        self.transform = PlaneTransform::new(bounds, self.width, self.height);
    }

    /// Replace the canvas resolution.
    ///
    /// Reallocates the pixel buffer and rebuilds the transform. The new
    /// buffer's contents are unspecified until the next clear or render.
    pub fn set_resolution(&mut self, width: u32, height: u32) -> RasterResult<()> {
        if width == 0 || height == 0 {
            return Err(RasterError::InvalidResolution { width, height });
        }
        self.width = width;
        self.height = height;
        self.pixels = vec![0; width as usize * height as usize];
        self.transform = PlaneTransform::new(self.bounds, width, height);
        Ok(())
    }

    /// Replace the coloring rule. Takes effect from the next operation.
    pub fn set_coloring_rule(&mut self, rule: Arc<dyn ColoringRule>) {
        self.rule = rule;
    }

    /// Replace the worker thread budget.
    pub fn set_max_threads(&mut self, max_threads: usize) -> RasterResult<()> {
        if max_threads == 0 {
            return Err(RasterError::InvalidThreadCount);
        }
        self.max_threads = max_threads;
        Ok(())
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn coloring_rule(&self) -> &dyn ColoringRule {
        self.rule.as_ref()
    }

    pub fn pixel_format(&self) -> PixelFormat {
        self.format
    }

    pub fn max_threads(&self) -> usize {
        self.max_threads
    }

    /// The active plane↔pixel transform.
    pub fn transform(&self) -> &PlaneTransform {
        &self.transform
    }

    /// The packed pixel buffer, row-major from the top-left corner.
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// Encode the current canvas as a PNG and write it to `path`.
    ///
    /// An I/O or encoding failure is returned to the caller; the in-memory
    /// buffer is unaffected either way.
    pub fn save_png(&self, path: impl AsRef<Path>) -> RasterResult<()> {
        let started = Instant::now();
        let path = path.as_ref();
        tracing::info!(path = %path.display(), "Writing plot image");

        let encoded = png::encode(
            &self.pixels,
            self.width as usize,
            self.height as usize,
            self.format,
        )?;
        std::fs::write(path, encoded)?;

        tracing::info!(
            path = %path.display(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "File written"
        );
        Ok(())
    }

    fn lock_chunks(&self) -> MutexGuard<'_, Vec<Arc<[f32]>>> {
        self.chunks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The host's available parallelism, falling back to one worker.
fn default_thread_count() -> usize {
    thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

/// Split the buffer into exactly `workers` contiguous bands sized in
/// multiples of `unit` pixels, with the remainder on the last band.
///
/// Bands are disjoint and cover the buffer exactly once, so workers can
/// write without synchronization.
fn partition(mut rest: &mut [u32], workers: usize, unit: usize) -> Vec<&mut [u32]> {
    let per_worker = (rest.len() / unit) / workers * unit;
    let mut bands = Vec::with_capacity(workers);
    for worker in 0..workers {
        let slice = std::mem::take(&mut rest);
        let mid = if worker == workers - 1 {
            slice.len()
        } else {
            per_worker
        };
        let (band, tail) = slice.split_at_mut(mid);
        rest = tail;
        bands.push(band);
    }
    bands
}

/// Join every worker, logging any that failed instead of aborting the
/// operation.
fn join_workers(handles: Vec<thread::ScopedJoinHandle<'_, ()>>) {
    for handle in handles {
        if handle.join().is_err() {
            tracing::error!("Worker thread terminated abnormally; keeping partial results");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_resolution_rejected() {
        assert!(RasterPlot::new(0, 100).is_err());
        assert!(RasterPlot::new(100, 0).is_err());
    }

    #[test]
    fn test_zero_thread_budget_rejected() {
        let mut plot = RasterPlot::new(16, 16).unwrap();
        assert!(plot.set_max_threads(0).is_err());
        assert!(plot.set_max_threads(3).is_ok());
        assert_eq!(plot.max_threads(), 3);
    }

    #[test]
    fn test_set_resolution_reallocates_buffer() {
        let mut plot = RasterPlot::new(16, 16).unwrap();
        plot.set_resolution(8, 4).unwrap();
        assert_eq!(plot.resolution(), (8, 4));
        assert_eq!(plot.pixels().len(), 32);
        assert!(plot.set_resolution(0, 4).is_err());
        // Failed setter leaves the previous resolution in place
        assert_eq!(plot.resolution(), (8, 4));
    }

    #[test]
    fn test_partition_covers_buffer_with_remainder_on_last() {
        let mut buffer = vec![0u32; 10 * 7]; // 10 rows of width 7
        let bands = partition(&mut buffer, 3, 7);
        let rows: Vec<usize> = bands.iter().map(|band| band.len() / 7).collect();
        assert_eq!(rows, vec![3, 3, 4]);
        assert_eq!(rows.iter().sum::<usize>(), 10);
    }

    #[test]
    fn test_partition_with_more_workers_than_rows() {
        let mut buffer = vec![0u32; 2 * 4]; // 2 rows of width 4
        let bands = partition(&mut buffer, 5, 4);
        assert_eq!(bands.len(), 5);
        let total: usize = bands.iter().map(|band| band.len()).sum();
        assert_eq!(total, 8);
        // All rows land on the last worker, the others stay idle
        assert_eq!(bands[4].len(), 8);
    }
}
