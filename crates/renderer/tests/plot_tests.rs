//! Integration tests for plot orchestration and worker coordination.

use std::sync::Arc;

use raster_common::{Bounds, Color, PixelFormat};
use renderer::{ColoringRule, FlatColoring, GradientColoring, PlotConfig, RasterPlot};

/// Opaque white packs to all-ones in either pixel format.
const WHITE: u32 = u32::MAX;

fn gradient_rule(bounds: Bounds) -> Arc<GradientColoring> {
    Arc::new(GradientColoring::new(
        Color::opaque(0, 0, 0),
        Color::opaque(0, 0, 255),
        Color::opaque(255, 0, 0),
        bounds,
    ))
}

fn gradient_plot(width: u32, height: u32, threads: usize) -> RasterPlot {
    let bounds = Bounds::default();
    RasterPlot::with_options(
        width,
        height,
        bounds,
        gradient_rule(bounds),
        PixelFormat::Rgba8888,
        threads,
    )
    .unwrap()
}

// ============================================================================
// Chunk rendering
// ============================================================================

#[test]
fn test_single_origin_point_paints_one_center_pixel() {
    let mut plot = RasterPlot::new(100, 100).unwrap();
    plot.put_chunk(vec![0.0f32, 0.0]);
    plot.render_chunks();

    let painted: Vec<usize> = plot
        .pixels()
        .iter()
        .enumerate()
        .filter(|(_, &pixel)| pixel != 0)
        .map(|(i, _)| i)
        .collect();
    assert_eq!(painted.len(), 1, "exactly one pixel painted");

    let (px, py) = (painted[0] % 100, painted[0] / 100);
    assert!((49..=50).contains(&px), "px = {}", px);
    assert!((49..=50).contains(&py), "py = {}", py);
    assert_eq!(plot.pixels()[painted[0]], WHITE);
}

#[test]
fn test_points_outside_window_are_clipped() {
    let mut plot = RasterPlot::new(64, 64).unwrap();
    plot.put_chunk(vec![5.0f32, 5.0, -3.0, 0.25, 0.0, 2.0]);
    plot.render_chunks();
    assert!(
        plot.pixels().iter().all(|&pixel| pixel == 0),
        "clipped points must not write into the buffer"
    );
}

#[test]
fn test_every_in_window_point_is_painted() {
    let mut plot = RasterPlot::new(64, 64).unwrap();
    // Submit points at the plane positions the pixels sample, so each
    // point lands in a known pixel.
    let targets = [(3u32, 7u32), (0, 0), (63, 63), (31, 2)];
    let mut chunk = Vec::new();
    for &(px, py) in &targets {
        let (x, y) = plot.transform().pixel_to_plane(px, py);
        chunk.push(x as f32);
        chunk.push(y as f32);
    }
    plot.put_chunk(chunk);
    plot.render_chunks();

    for &(px, py) in &targets {
        assert_eq!(
            plot.pixels()[(py * 64 + px) as usize],
            WHITE,
            "pixel ({}, {}) must be painted",
            px,
            py
        );
    }
    let painted = plot.pixels().iter().filter(|&&pixel| pixel != 0).count();
    assert_eq!(painted, targets.len());
}

#[test]
fn test_overlapping_points_keep_one_candidate_color() {
    let bounds = Bounds::default();
    let rule = gradient_rule(bounds);
    let mut plot = RasterPlot::with_options(
        10,
        10,
        bounds,
        rule.clone(),
        PixelFormat::Rgba8888,
        4,
    )
    .unwrap();

    let (x1, y1) = plot.transform().pixel_to_plane(5, 5);
    // Second point nudged within the same pixel cell
    let x2 = x1 + plot.transform().scale_x() * 0.25;
    plot.put_chunk(vec![x1 as f32, y1 as f32]);
    plot.put_chunk(vec![x2 as f32, y1 as f32]);
    plot.render_chunks();

    // Workers see the f32 coordinates, so compute the candidates the same way.
    let candidate1 = PixelFormat::Rgba8888.pack(rule.color_at(x1 as f32 as f64, y1 as f32 as f64));
    let candidate2 = PixelFormat::Rgba8888.pack(rule.color_at(x2 as f32 as f64, y1 as f32 as f64));
    let got = plot.pixels()[5 * 10 + 5];
    assert!(
        got == candidate1 || got == candidate2,
        "pixel must hold one of the candidate colors, got {:#010x}",
        got
    );
}

// ============================================================================
// Pending chunk list
// ============================================================================

#[test]
fn test_odd_length_chunk_is_ignored() {
    let plot = RasterPlot::new(16, 16).unwrap();
    plot.put_chunk(vec![1.0f32, 2.0, 3.0]);
    assert_eq!(plot.pending_chunks(), 0);
    plot.put_chunk(vec![0.5f32, 0.5]);
    assert_eq!(plot.pending_chunks(), 1);
}

#[test]
fn test_render_does_not_consume_pending_chunks() {
    let mut plot = RasterPlot::new(32, 32).unwrap();
    plot.put_chunk(vec![0.0f32, 0.0]);
    plot.render_chunks();
    assert_eq!(plot.pending_chunks(), 1);

    // A second pass re-renders the same chunk onto a cleared canvas.
    plot.clear_plot();
    plot.render_chunks();
    let painted = plot.pixels().iter().filter(|&&pixel| pixel == WHITE).count();
    assert_eq!(painted, 1);
}

#[test]
fn test_clear_data_empties_pending_and_render_is_noop() {
    let mut plot = RasterPlot::new(32, 32).unwrap();
    plot.put_chunk(vec![0.1f32, 0.1]);
    plot.put_chunk(vec![-0.5f32, 0.25, 0.3, 0.3]);
    assert_eq!(plot.pending_chunks(), 2);

    plot.clear_data();
    assert_eq!(plot.pending_chunks(), 0);

    let before = plot.pixels().to_vec();
    plot.render_chunks();
    assert_eq!(
        plot.pixels(),
        &before[..],
        "render with no chunks must leave the buffer unchanged"
    );
}

#[test]
fn test_put_chunk_is_safe_under_concurrent_callers() {
    let plot = RasterPlot::new(16, 16).unwrap();
    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                for _ in 0..50 {
                    plot.put_chunk(vec![0.0f32, 0.0]);
                }
            });
        }
    });
    assert_eq!(plot.pending_chunks(), 200);
}

// ============================================================================
// Solid fills and clears
// ============================================================================

#[test]
fn test_render_solid_matches_single_threaded_reference() {
    // 97x61 is not divisible by most budgets, exercising remainder rows.
    let mut reference = gradient_plot(97, 61, 1);
    reference.render_solid();

    for threads in [2usize, 3, 5, 8] {
        let mut parallel = gradient_plot(97, 61, threads);
        parallel.render_solid();
        assert_eq!(
            reference.pixels(),
            parallel.pixels(),
            "thread budget {}",
            threads
        );
    }
}

#[test]
fn test_clear_plot_matches_single_threaded_reference() {
    let mut reference = gradient_plot(50, 33, 1);
    reference.clear_plot();
    let mut parallel = gradient_plot(50, 33, 4);
    parallel.clear_plot();
    assert_eq!(reference.pixels(), parallel.pixels());
}

#[test]
fn test_clear_plot_is_idempotent() {
    let mut plot = gradient_plot(40, 25, 3);
    plot.clear_plot();
    let once = plot.pixels().to_vec();
    plot.clear_plot();
    assert_eq!(plot.pixels(), &once[..]);
}

#[test]
fn test_solid_fill_covers_every_row_with_uneven_split() {
    // 10 rows against a budget of 3: the split must cover all 10 rows.
    let mut plot = RasterPlot::with_options(
        8,
        10,
        Bounds::default(),
        Arc::new(FlatColoring::default()),
        PixelFormat::Rgba8888,
        3,
    )
    .unwrap();
    plot.render_solid();
    assert!(
        plot.pixels().iter().all(|&pixel| pixel == WHITE),
        "every row must be filled exactly once"
    );
}

#[test]
fn test_thread_budget_larger_than_canvas() {
    let mut plot = RasterPlot::with_options(
        4,
        2,
        Bounds::default(),
        Arc::new(FlatColoring::default()),
        PixelFormat::Rgba8888,
        16,
    )
    .unwrap();
    plot.render_solid();
    assert!(plot.pixels().iter().all(|&pixel| pixel == WHITE));
    plot.clear_plot();
    let background = PixelFormat::Rgba8888.pack(Color::opaque(0, 0, 0));
    assert!(plot.pixels().iter().all(|&pixel| pixel == background));
}

#[test]
fn test_argb_format_packs_through_the_pipeline() {
    let foreground = Color::opaque(200, 40, 10);
    let mut plot = RasterPlot::with_options(
        20,
        20,
        Bounds::default(),
        Arc::new(FlatColoring::new(Color::opaque(0, 0, 0), foreground)),
        PixelFormat::Argb8888,
        2,
    )
    .unwrap();
    plot.put_chunk(vec![0.0f32, 0.0]);
    plot.render_chunks();

    let expected = PixelFormat::Argb8888.pack(foreground);
    let painted: Vec<u32> = plot.pixels().iter().copied().filter(|&pixel| pixel != 0).collect();
    assert_eq!(painted, vec![expected]);
}

// ============================================================================
// Configuration and persistence
// ============================================================================

#[test]
fn test_from_config_builds_working_plot() {
    let config = PlotConfig::from_json(
        r##"{
            "width": 40,
            "height": 30,
            "bounds": [-2.0, -2.0, 2.0, 2.0],
            "max_threads": 2,
            "coloring": {"type": "flat", "background": "#101010", "foreground": "#ffffff"}
        }"##,
    )
    .unwrap();
    let mut plot = RasterPlot::from_config(&config).unwrap();
    assert_eq!(plot.resolution(), (40, 30));
    assert_eq!(plot.max_threads(), 2);

    plot.put_chunk(vec![0.0f32, 0.0]);
    plot.render_chunks();
    let painted = plot.pixels().iter().filter(|&&pixel| pixel == WHITE).count();
    assert_eq!(painted, 1);
}

#[test]
fn test_save_png_writes_decodable_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plot.png");

    let mut plot = RasterPlot::new(32, 32).unwrap();
    plot.clear_plot();
    plot.put_chunk(vec![0.0f32, 0.0]);
    plot.render_chunks();
    plot.save_png(&path).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(&bytes[0..8], &[137, 80, 78, 71, 13, 10, 26, 10]);
    let width = u32::from_be_bytes(bytes[16..20].try_into().unwrap());
    let height = u32::from_be_bytes(bytes[20..24].try_into().unwrap());
    assert_eq!((width, height), (32, 32));
}

#[test]
fn test_save_png_to_invalid_path_keeps_buffer_intact() {
    let mut plot = RasterPlot::new(16, 16).unwrap();
    plot.clear_plot();
    let before = plot.pixels().to_vec();

    let result = plot.save_png("/nonexistent-dir/plot.png");
    assert!(result.is_err());
    assert_eq!(plot.pixels(), &before[..]);
}
