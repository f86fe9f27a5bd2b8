//! edgeview-bench: CLI tool for edge detection parameter experimentation and diagnostics.
//!
//! Runs the decode, fit and Sobel detection stages on a given image file
//! with configurable parameters, printing per-stage diagnostics. Useful for:
//!
//! - Tuning the threshold and working resolution
//! - Measuring per-stage durations to identify bottlenecks
//! - Comparing the viewer's dirty-flag render loop against recomputing
//!   every frame
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin edgeview-bench -- [OPTIONS] <IMAGE_PATH>
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use edgeview_pipeline::diagnostics::{Clock, DetectionDiagnostics};
use edgeview_pipeline::{FitConfig, FpsMeter, Parameters, ResizeFilter, Viewer, ViewerConfig};

/// Edge detection parameter experimentation and diagnostics for edgeview.
///
/// Runs the edge detection pipeline on a given image with configurable
/// parameters and prints per-stage timing and edge count diagnostics.
#[derive(Parser)]
#[command(name = "edgeview-bench", version)]
struct Cli {
    /// Path to the input image (PNG, JPEG, BMP, WebP).
    image_path: PathBuf,

    /// Edge threshold (0-255; values outside are clamped).
    #[arg(long, default_value_t = Parameters::DEFAULT_THRESHOLD, allow_negative_numbers = true)]
    threshold: i32,

    /// Widest working width in pixels; wider images are scaled down.
    #[arg(long, default_value_t = FitConfig::DEFAULT_MAX_WIDTH, value_parser = clap::builder::RangedU64ValueParser::<u32>::new().range(1..))]
    max_width: u32,

    /// Narrowest working width in pixels.
    #[arg(long, default_value_t = FitConfig::DEFAULT_MIN_WIDTH)]
    min_width: u32,

    /// Shortest working height in pixels.
    #[arg(long, default_value_t = FitConfig::DEFAULT_MIN_HEIGHT)]
    min_height: u32,

    /// Resize filter (nearest, triangle, catmull-rom, gaussian, lanczos3).
    #[arg(long, value_enum, default_value_t = CLI_DEFAULT_FILTER)]
    filter: Filter,

    /// Write the edge map of the first run to a PNG file.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Number of runs for averaging.
    #[arg(long, default_value_t = 1, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    runs: usize,

    /// Drive the viewer render loop for this many frames and report FPS.
    #[arg(long)]
    frames: Option<u32>,

    /// Force a recomputation on every frame of the render loop instead of
    /// only when the inputs change.
    #[arg(long, requires = "frames")]
    every_frame: bool,

    /// Output diagnostics as JSON instead of human-readable report.
    #[arg(long)]
    json: bool,

    /// Full viewer config as a JSON string.
    ///
    /// When provided, all other parameter flags are ignored.
    /// The JSON must be a valid `ViewerConfig` serialization.
    #[arg(long)]
    config_json: Option<String>,
}

/// Resize filter selection.
#[derive(Clone, Copy, ValueEnum)]
enum Filter {
    /// Nearest-neighbor (fastest, blocky).
    Nearest,
    /// Bilinear interpolation (fast, decent quality).
    Triangle,
    /// Bicubic Catmull-Rom (moderate, good quality).
    CatmullRom,
    /// Gaussian (moderate, smooth).
    Gaussian,
    /// Lanczos with 3 lobes (slowest, sharpest).
    Lanczos3,
}

/// Maps a [`ResizeFilter`] to the local CLI [`Filter`] enum.
const fn filter_from_pipeline(f: ResizeFilter) -> Filter {
    match f {
        ResizeFilter::Nearest => Filter::Nearest,
        ResizeFilter::Triangle => Filter::Triangle,
        ResizeFilter::CatmullRom => Filter::CatmullRom,
        ResizeFilter::Gaussian => Filter::Gaussian,
        ResizeFilter::Lanczos3 => Filter::Lanczos3,
    }
}

/// The CLI default filter, derived from [`FitConfig::DEFAULT_FILTER`].
const CLI_DEFAULT_FILTER: Filter = filter_from_pipeline(FitConfig::DEFAULT_FILTER);

/// Build a [`ViewerConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual parameter flags are ignored.
fn config_from_cli(cli: &Cli) -> Result<ViewerConfig, String> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    Ok(ViewerConfig {
        fit: FitConfig {
            max_width: cli.max_width,
            min_width: cli.min_width,
            min_height: cli.min_height,
            filter: match cli.filter {
                Filter::Nearest => ResizeFilter::Nearest,
                Filter::Triangle => ResizeFilter::Triangle,
                Filter::CatmullRom => ResizeFilter::CatmullRom,
                Filter::Gaussian => ResizeFilter::Gaussian,
                Filter::Lanczos3 => ResizeFilter::Lanczos3,
            },
        },
        parameters: Parameters::new(cli.threshold),
    })
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let image_bytes = match std::fs::read(&cli.image_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error reading {}: {e}", cli.image_path.display());
            return ExitCode::FAILURE;
        }
    };

    eprintln!(
        "Image: {} ({} bytes)",
        cli.image_path.display(),
        image_bytes.len(),
    );
    eprintln!("Config: {config:#?}");
    eprintln!("Runs: {}", cli.runs);
    eprintln!();

    let mut all_diagnostics = Vec::with_capacity(cli.runs);
    let mut first_result = None;

    for run in 0..cli.runs {
        if cli.runs > 1 {
            eprintln!("--- Run {}/{} ---", run + 1, cli.runs);
        }

        let (result, diagnostics) = match edgeview_pipeline::diagnostics::process_with_diagnostics(
            &image_bytes,
            &config,
            &StdClock,
        ) {
            Ok(pair) => pair,
            Err(e) => {
                eprintln!("Detection error: {e}");
                return ExitCode::FAILURE;
            }
        };

        if cli.json {
            match serde_json::to_string_pretty(&diagnostics) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    eprintln!("Error serializing diagnostics: {e}");
                    return ExitCode::FAILURE;
                }
            }
        } else {
            println!("{}", diagnostics.report());
        }

        if run == 0 {
            if let Some(ref png_path) = cli.output {
                write_png(png_path, &result.edges);
            }
            first_result = Some(result);
        }

        all_diagnostics.push(diagnostics);

        if cli.runs > 1 {
            eprintln!();
        }
    }

    if cli.runs > 1 {
        print_multi_run_summary(&all_diagnostics);
    }

    if let (Some(frames), Some(result)) = (cli.frames, first_result) {
        let mut viewer = Viewer::new(config.parameters);
        if let Err(e) = viewer
            .load_source(result.source)
            .and_then(|_| run_render_loop(&mut viewer, frames, cli.every_frame))
        {
            eprintln!("Render loop error: {e}");
            return ExitCode::FAILURE;
        }
    }

    ExitCode::SUCCESS
}

/// Write an edge map as PNG, reporting the outcome on stderr.
fn write_png(path: &std::path::Path, edges: &edgeview_pipeline::EdgeMap) {
    let png = match edgeview_export::to_png(edges) {
        Ok(png) => png,
        Err(e) => {
            eprintln!("Error encoding PNG: {e}");
            return;
        }
    };
    match std::fs::write(path, &png) {
        Ok(()) => {
            eprintln!("PNG written to {} ({} bytes)", path.display(), png.len());
        }
        Err(e) => {
            eprintln!("Error writing PNG to {}: {e}", path.display());
        }
    }
}

/// Drive the viewer for `frames` uncapped frames, printing the measured
/// frame rate and how many frames actually recomputed.
fn run_render_loop(
    viewer: &mut Viewer,
    frames: u32,
    every_frame: bool,
) -> Result<(), edgeview_pipeline::DetectError> {
    let origin = Instant::now();
    let mut meter = FpsMeter::new(origin.elapsed());
    viewer.start()?;

    for _ in 0..frames {
        if every_frame {
            viewer.invalidate();
        }
        viewer.tick(&mut meter, origin.elapsed())?;
    }
    viewer.stop();

    let elapsed = origin.elapsed();
    let mean_fps = if elapsed.is_zero() {
        0.0
    } else {
        f64::from(frames) / elapsed.as_secs_f64()
    };

    println!();
    println!("Render loop\n{}", "=".repeat(60));
    println!(
        "Mode:        {}",
        if every_frame {
            "recompute every frame"
        } else {
            "recompute on change"
        }
    );
    println!("Frames:      {frames}");
    println!("Recomputed:  {}", viewer.recompute_count());
    if let Some(max) = viewer.detector().max_magnitude() {
        println!("Max |grad|:  {max:.1}");
    }
    println!("Elapsed:     {:.3}ms", elapsed.as_secs_f64() * 1000.0);
    println!("Mean FPS:    {mean_fps:.1}");
    println!("Last window: {} fps ({:?})", meter.current(), meter.class());
    Ok(())
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}

/// Function pointer type for extracting a stage duration from diagnostics.
type StageExtractor = fn(&DetectionDiagnostics) -> Duration;

/// Print aggregated statistics across multiple runs.
#[allow(clippy::cast_precision_loss)]
fn print_multi_run_summary(all_diagnostics: &[DetectionDiagnostics]) {
    println!();
    println!(
        "Summary ({} runs)\n{}",
        all_diagnostics.len(),
        "=".repeat(60),
    );

    if all_diagnostics.is_empty() {
        println!("Warning: no diagnostics to summarize");
        return;
    }

    let durations: Vec<f64> = all_diagnostics
        .iter()
        .map(|d| d.total_duration.as_secs_f64() * 1000.0)
        .collect();

    let min = durations.iter().copied().reduce(f64::min).unwrap_or(0.0);
    let max = durations.iter().copied().reduce(f64::max).unwrap_or(0.0);
    let mean = durations.iter().sum::<f64>() / durations.len() as f64;

    println!("Total duration: min={min:.3}ms  mean={mean:.3}ms  max={max:.3}ms");

    println!();
    println!("{:<24} {:>12}", "Stage", "Mean (ms)");
    println!("{}", "-".repeat(40));

    let stage_extractors: &[(&str, StageExtractor)] = &[
        ("Decode", |d| d.decode.duration),
        ("Fit", |d| d.fit.duration),
        ("Detect", |d| d.detect.duration),
    ];

    for (name, extractor) in stage_extractors {
        let stage_mean = all_diagnostics
            .iter()
            .map(|d| extractor(d).as_secs_f64() * 1000.0)
            .sum::<f64>()
            / all_diagnostics.len() as f64;
        println!("{name:<24} {stage_mean:>10.3}ms");
    }
}
