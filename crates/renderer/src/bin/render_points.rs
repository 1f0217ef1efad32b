//! CLI tool that rasterizes a generated point cloud to a PNG.
//!
//! Renders a parametric rose curve so the output is deterministic and easy
//! to eyeball, then writes the canvas through the PNG encoder.
//!
//! Usage:
//!   cargo run --release --bin render-points -- --output plot.png
//!   cargo run --release --bin render-points -- --config plot.json --output plot.png

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use renderer::{PlotConfig, RasterPlot};

#[derive(Parser, Debug)]
#[command(name = "render-points")]
#[command(about = "Rasterize a generated point cloud to a PNG")]
struct Args {
    /// Output PNG path
    #[arg(short, long, default_value = "plot.png")]
    output: PathBuf,

    /// Optional plot configuration JSON (overrides width/height flags)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Canvas width in pixels
    #[arg(long, default_value_t = 1024)]
    width: u32,

    /// Canvas height in pixels
    #[arg(long, default_value_t = 1024)]
    height: u32,

    /// Total number of points to generate
    #[arg(short, long, default_value_t = 1_000_000)]
    points: usize,

    /// Number of chunks the points are split into
    #[arg(long, default_value_t = 64)]
    chunks: usize,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut plot = match &args.config {
        Some(path) => {
            info!(path = %path.display(), "Loading plot configuration");
            RasterPlot::from_config(&PlotConfig::from_file(path)?)?
        }
        None => RasterPlot::new(args.width, args.height)?,
    };

    let (width, height) = plot.resolution();
    info!(
        width,
        height,
        points = args.points,
        chunks = args.chunks,
        "Generating point cloud"
    );
    for chunk in rose_curve(args.points, args.chunks.max(1)) {
        plot.put_chunk(chunk);
    }

    plot.clear_plot();
    plot.render_chunks();
    plot.save_png(&args.output)?;
    info!(path = %args.output.display(), "Done");
    Ok(())
}

/// Sample a 7-petal rose curve scaled to the default unit window, split
/// into `chunks` equally sized point batches.
fn rose_curve(points: usize, chunks: usize) -> Vec<Vec<f32>> {
    let per_chunk = (points / chunks).max(1);
    (0..chunks)
        .map(|chunk| {
            let mut data = Vec::with_capacity(per_chunk * 2);
            for i in 0..per_chunk {
                let t = (chunk * per_chunk + i) as f64 / points as f64 * std::f64::consts::TAU;
                let r = 0.95 * (7.0 * t).cos();
                data.push((r * t.cos()) as f32);
                data.push((r * t.sin()) as f32);
            }
            data
        })
        .collect()
}
