//! Example: measure one SLO image from its segmentation PNGs.
//!
//! Reads a binary vessel mask and an RGB artery/disc/vein map (red = artery,
//! green = optic disc, blue = vein), runs the full analysis and writes the
//! report rows, warnings and timing to a JSON file next to the binary mask.
//!
//! Run from the workspace root:
//!   cargo run -p slo-vessels --example measure_masks -- --help
//!   cargo run -p slo-vessels --example measure_masks -- \
//!       --binary data/slo_binary.png --av data/slo_avod.png --location "Optic disc"

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use image::ImageReader;
use serde::Serialize;
use slo_vessels::{
    AnalysisConfig, AnalysisInput, GlobalMetrics, Image, MetricRow, ScaleInput, ScanLocation,
    SegmentationMasks,
};

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(about = "Measure retinal vessel metrics from SLO segmentation masks")]
struct Args {
    /// Binary vessel mask (any non-zero pixel is vessel)
    #[arg(long)]
    binary: PathBuf,

    /// RGB artery / optic disc / vein map
    #[arg(long)]
    av: PathBuf,

    /// "Macula" or "Optic disc"
    #[arg(long, default_value = "Macula")]
    location: ScanLocation,

    /// Microns per pixel; calibres stay in pixels when absent or out of range
    #[arg(long)]
    scale: Option<String>,

    /// Report fractal dimension, density and global calibre for the whole
    /// image only
    #[arg(long)]
    whole_image_globals: bool,

    /// Output JSON path (default: <binary stem>_metrics.json next to input)
    #[arg(long)]
    out: Option<PathBuf>,
}

// ── JSON DTOs ─────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct Output {
    width: usize,
    height: usize,
    location: String,
    units: slo_vessels::MeasurementUnits,
    /// Wall-clock time of the analysis, in milliseconds.
    elapsed_ms: f64,
    warnings: Vec<String>,
    rows: Vec<MetricRow>,
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn load_luma(path: &Path) -> Result<Image<u8>> {
    let gray = ImageReader::open(path)
        .with_context(|| format!("opening {}", path.display()))?
        .decode()
        .with_context(|| format!("decoding {}", path.display()))?
        .into_luma8();

    let (w, h) = (gray.width() as usize, gray.height() as usize);
    Image::from_vec(w, h, gray.into_raw()).context("building mask Image")
}

fn load_rgb(path: &Path) -> Result<Image<[u8; 3]>> {
    let rgb = ImageReader::open(path)
        .with_context(|| format!("opening {}", path.display()))?
        .decode()
        .with_context(|| format!("decoding {}", path.display()))?
        .into_rgb8();

    let (w, h) = (rgb.width() as usize, rgb.height() as usize);
    let pixels = rgb.pixels().map(|p| p.0).collect();
    Image::from_vec(w, h, pixels).context("building artery/disc/vein Image")
}

// ── Main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let args = Args::parse();

    let out_path = args.out.clone().unwrap_or_else(|| {
        let stem = args.binary.file_stem().unwrap_or_default().to_string_lossy();
        let dir = args.binary.parent().unwrap_or(Path::new("."));
        dir.join(format!("{stem}_metrics.json"))
    });

    let binary = load_luma(&args.binary)?;
    let av = load_rgb(&args.av)?;
    println!(
        "loaded {}: {}x{}",
        args.binary.display(),
        binary.width(),
        binary.height()
    );

    let masks = SegmentationMasks::from_av_disc(binary, &av).context("mask sizes differ")?;
    let mut input = AnalysisInput::new(masks, args.location);
    input.scale = args.scale.map_or(ScaleInput::Absent, ScaleInput::Text);

    let t0 = Instant::now();
    let report = slo_vessels::analyse(&input, &AnalysisConfig::default())?;
    let elapsed_ms = t0.elapsed().as_secs_f64() * 1e3;
    println!("analysis time: {elapsed_ms:.2} ms");

    for w in &report.warnings {
        println!("  warning: {w}");
    }

    let globals = if args.whole_image_globals {
        GlobalMetrics::WholeImageOnly
    } else {
        GlobalMetrics::EveryZone
    };
    let output = Output {
        width: report.width,
        height: report.height,
        location: report.location.to_string(),
        units: report.units,
        elapsed_ms,
        warnings: report.warnings.iter().map(ToString::to_string).collect(),
        rows: report.rows_with(globals),
    };

    let out_file = std::fs::File::create(&out_path)
        .with_context(|| format!("creating {}", out_path.display()))?;
    serde_json::to_writer_pretty(out_file, &output)
        .with_context(|| format!("writing JSON to {}", out_path.display()))?;

    println!("results written to {}", out_path.display());
    Ok(())
}
