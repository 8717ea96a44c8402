use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use image::{GrayImage, Rgb, RgbImage};
use serde::{Deserialize, Serialize};
use slo_vessels::mask::count_foreground;
use slo_vessels::{
    AnalysisConfig, AnalysisInput, Image, MetricConfig, MetricRow, NodeKind, OpticDisc, Pairing,
    Point2f, ScaleInput, ScanLocation, SegmentConfig, SegmentationMasks, VesselGraph,
    build_zones, distance_to_background, estimate_optic_disc, extract_segments, thin_guo_hall,
};

#[derive(Parser, Debug)]
#[command(name = "sv_gallery")]
#[command(about = "Run SLO vessel measurement stages on mask fixtures")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(name = "skeleton")]
    Skeleton(SkeletonArgs),
    #[command(name = "segments")]
    Segments(SegmentsArgs),
    #[command(name = "zones")]
    Zones(ZonesArgs),
    #[command(name = "analyse")]
    Analyse(AnalyseArgs),
}

#[derive(Args, Debug, Clone)]
struct CommonArgs {
    #[arg(long, required = true)]
    input: PathBuf,
    #[arg(long, required = true)]
    truth: PathBuf,
    #[arg(long, default_value = "docs/fig/raw")]
    out: PathBuf,
}

#[derive(Args, Debug, Clone)]
struct DiscArgs {
    /// Optic disc mask; geometry is estimated from it when no centre is given
    #[arg(long)]
    disc_mask: Option<PathBuf>,
    #[arg(long)]
    disc_x: Option<f32>,
    #[arg(long)]
    disc_y: Option<f32>,
    #[arg(long)]
    disc_radius: Option<f32>,
}

#[derive(Args, Debug, Clone)]
struct SkeletonArgs {
    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Args, Debug, Clone)]
struct SegmentsArgs {
    #[command(flatten)]
    common: CommonArgs,
    #[command(flatten)]
    disc: DiscArgs,
    #[arg(long, default_value_t = 10.0)]
    min_length: f32,
}

#[derive(Args, Debug, Clone)]
struct ZonesArgs {
    #[command(flatten)]
    common: CommonArgs,
    #[command(flatten)]
    disc: DiscArgs,
    #[arg(long, default_value = "Optic disc")]
    location: ScanLocation,
}

#[derive(Args, Debug, Clone)]
struct AnalyseArgs {
    #[command(flatten)]
    common: CommonArgs,
    /// RGB map: red = artery, green = optic disc, blue = vein
    #[arg(long, required = true)]
    av: PathBuf,
    #[arg(long, default_value = "Macula")]
    location: ScanLocation,
    #[arg(long)]
    disc_x: Option<f32>,
    #[arg(long)]
    disc_y: Option<f32>,
    #[arg(long)]
    disc_radius: Option<f32>,
    /// Microns per pixel
    #[arg(long)]
    scale: Option<String>,
    #[arg(long, default_value_t = 10.0)]
    min_length: f32,
    #[arg(long, default_value_t = 6)]
    whole_image_vessels: usize,
    /// Pair the two largest calibres each round instead of largest with smallest
    #[arg(long, default_value_t = false)]
    pair_two_largest: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TruthEnvelope {
    case: String,
    width: usize,
    height: usize,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    truth: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
struct AnalyseTruthPayload {
    rows: Vec<MetricRow>,
}

#[derive(Debug, Clone, Serialize)]
struct MetaSkeleton {
    thinning: &'static str,
    pixel_rule: &'static str,
    foreground: usize,
    skeleton: usize,
    max_distance: f32,
}

#[derive(Debug, Clone, Serialize)]
struct GraphNodeDto {
    id: usize,
    kind: &'static str,
    x: usize,
    y: usize,
    degree: usize,
}

#[derive(Debug, Clone, Serialize)]
struct SegmentDto {
    id: usize,
    a: usize,
    b: usize,
    is_loop: bool,
    length: f32,
    chord: f32,
    tortuosity: Option<f32>,
    mean_width: Option<f32>,
    points: Vec<[usize; 2]>,
    widths: Option<Vec<f32>>,
}

#[derive(Debug, Clone, Serialize)]
struct GraphDto {
    width: usize,
    height: usize,
    nodes: Vec<GraphNodeDto>,
    segments: Vec<SegmentDto>,
}

#[derive(Debug, Clone, Serialize)]
struct MetaSegments {
    connectivity: &'static str,
    min_length: f32,
    disc: Option<DiscDto>,
    node_count: usize,
    segment_count: usize,
    branch_points: usize,
    ends: usize,
    total_length: f32,
}

#[derive(Debug, Clone, Copy, Serialize)]
struct DiscDto {
    x: f32,
    y: f32,
    radius: f32,
}

#[derive(Debug, Clone, Serialize)]
struct ZoneDto {
    zone: &'static str,
    area: usize,
}

#[derive(Debug, Clone, Serialize)]
struct MetaZones {
    location: String,
    disc: Option<DiscDto>,
    geometry_undefined: bool,
    zones: Vec<ZoneDto>,
}

#[derive(Debug, Clone, Serialize)]
struct ReportDto {
    width: usize,
    height: usize,
    location: String,
    units: slo_vessels::MeasurementUnits,
    microns_per_pixel: Option<f64>,
    disc: Option<DiscDto>,
    segments: Vec<(&'static str, usize)>,
    warnings: Vec<String>,
    rows: Vec<MetricRow>,
    summary: Vec<(String, f64)>,
}

#[derive(Debug, Clone, Serialize)]
struct MetaAnalyse {
    min_length: f32,
    whole_image_vessels: usize,
    pairing: &'static str,
    row_count: usize,
    warning_count: usize,
    /// Largest absolute difference against the truth rows, when present.
    max_abs_error: Option<f64>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.cmd {
        Command::Skeleton(args) => run_skeleton(args),
        Command::Segments(args) => run_segments(args),
        Command::Zones(args) => run_zones(args),
        Command::Analyse(args) => run_analyse(args),
    }
}

fn run_skeleton(args: SkeletonArgs) -> Result<()> {
    let (case_dir, truth) = prepare_case(&args.common, "skeleton")?;
    let img = load_input_u8(&args.common.input)?;
    validate_dims(&truth, &img)?;

    let skel = thin_guo_hall(&img.as_view());
    let dist = distance_to_background(&img.as_view());

    save_u8_image(case_dir.join("skeleton.png"), &skel)?;
    save_luma_raw(
        case_dir.join("distance.png"),
        dist.width(),
        dist.height(),
        f32_to_u8_vis(dist.data()),
    )?;

    write_json(
        case_dir.join("meta.json"),
        &MetaSkeleton {
            thinning: "guo-hall",
            pixel_rule: "binary pixel set iff value > 0",
            foreground: count_foreground(&img.as_view()),
            skeleton: count_foreground(&skel.as_view()),
            max_distance: dist.data().iter().copied().fold(0.0, f32::max),
        },
    )?;

    Ok(())
}

fn run_segments(args: SegmentsArgs) -> Result<()> {
    let (case_dir, truth) = prepare_case(&args.common, "segments")?;
    let img = load_input_u8(&args.common.input)?;
    validate_dims(&truth, &img)?;

    let disc_mask = load_disc_mask(&args.disc, &img)?;
    let disc = resolve_disc(&args.disc, disc_mask.as_ref())?;

    let cfg = SegmentConfig {
        min_length: args.min_length,
        ..SegmentConfig::default()
    };
    let graph = extract_segments(
        &img.as_view(),
        disc_mask.as_ref().map(|m| m.as_view()).as_ref(),
        disc.map(|d| d.center),
        &cfg,
    )
    .context("extracting vessel segments")?;

    write_json(case_dir.join("graph.json"), &graph_dto(&graph))?;
    render_segment_overlay(&img, &graph)
        .save(case_dir.join("overlay.png"))
        .context("saving segment overlay")?;

    write_json(
        case_dir.join("meta.json"),
        &MetaSegments {
            connectivity: "C8, diagonal dropped when an orthogonal path exists",
            min_length: cfg.min_length,
            disc: disc.map(disc_dto),
            node_count: graph.nodes.len(),
            segment_count: graph.segments.len(),
            branch_points: graph.num_branch_points(),
            ends: graph.num_ends(),
            total_length: graph.total_length(),
        },
    )?;

    Ok(())
}

fn run_zones(args: ZonesArgs) -> Result<()> {
    let (case_dir, truth) = prepare_case(&args.common, "zones")?;
    let img = load_input_u8(&args.common.input)?;
    validate_dims(&truth, &img)?;

    let disc_mask = load_disc_mask(&args.disc, &img)?;
    let disc = resolve_disc(&args.disc, disc_mask.as_ref())?;
    let layout = build_zones(img.width(), img.height(), disc, args.location);

    for zone in layout.iter() {
        save_u8_image(case_dir.join(format!("zone_{}.png", zone.zone.name())), &zone.mask)?;
    }

    write_json(
        case_dir.join("meta.json"),
        &MetaZones {
            location: args.location.to_string(),
            disc: disc.map(disc_dto),
            geometry_undefined: layout.geometry_undefined,
            zones: layout
                .iter()
                .map(|z| ZoneDto {
                    zone: z.zone.name(),
                    area: z.area,
                })
                .collect(),
        },
    )?;

    Ok(())
}

fn run_analyse(args: AnalyseArgs) -> Result<()> {
    let (case_dir, truth) = prepare_case(&args.common, "analyse")?;
    let binary = load_input_u8(&args.common.input)?;
    validate_dims(&truth, &binary)?;

    ensure_file_exists(&args.av, "artery/disc/vein map")?;
    let av = load_input_rgb(&args.av)?;
    let masks = SegmentationMasks::from_av_disc(binary, &av)
        .context("binary and artery/disc/vein maps differ in size")?;

    let mut input = AnalysisInput::new(masks, args.location);
    input.scale = args.scale.clone().map_or(ScaleInput::Absent, ScaleInput::Text);
    if let (Some(x), Some(y), Some(r)) = (args.disc_x, args.disc_y, args.disc_radius) {
        input.disc = Some(OpticDisc::new(Point2f::new(x, y), r));
    }

    let pairing = if args.pair_two_largest {
        Pairing::TwoLargest
    } else {
        Pairing::LargestWithSmallest
    };
    let cfg = AnalysisConfig {
        segments: SegmentConfig {
            min_length: args.min_length,
            ..SegmentConfig::default()
        },
        metrics: MetricConfig {
            whole_image_vessels: args.whole_image_vessels,
            pairing,
        },
    };

    let report = slo_vessels::analyse(&input, &cfg).context("analysing masks")?;
    for w in &report.warnings {
        eprintln!("warning: {w}");
    }

    let rows = report.rows();
    write_rows_csv(case_dir.join("metrics.csv"), &rows)?;
    write_json(
        case_dir.join("report.json"),
        &ReportDto {
            width: report.width,
            height: report.height,
            location: report.location.to_string(),
            units: report.units,
            microns_per_pixel: report.scale.map(|s| s.microns_per_pixel()),
            disc: report.disc.map(disc_dto),
            segments: report
                .segment_counts
                .iter()
                .map(|(v, n)| (v.name(), *n))
                .collect(),
            warnings: report.warnings.iter().map(ToString::to_string).collect(),
            rows: rows.clone(),
            summary: report.summary_columns(),
        },
    )?;

    let max_abs_error = if truth.truth.is_null() {
        None
    } else {
        let payload: AnalyseTruthPayload = serde_json::from_value(truth.truth.clone())
            .with_context(|| format!("parsing analyse truth rows for case '{}'", truth.case))?;
        Some(compare_rows(&payload.rows, &rows)?)
    };

    write_json(
        case_dir.join("meta.json"),
        &MetaAnalyse {
            min_length: cfg.segments.min_length,
            whole_image_vessels: cfg.metrics.whole_image_vessels,
            pairing: match pairing {
                Pairing::LargestWithSmallest => "largest-with-smallest",
                Pairing::TwoLargest => "two-largest",
            },
            row_count: rows.len(),
            warning_count: report.warnings.len(),
            max_abs_error,
        },
    )?;

    Ok(())
}

fn prepare_case(common: &CommonArgs, case_name: &str) -> Result<(PathBuf, TruthEnvelope)> {
    ensure_file_exists(&common.input, "input")?;
    ensure_file_exists(&common.truth, "truth")?;

    let truth: TruthEnvelope = read_json(&common.truth)
        .with_context(|| format!("reading truth json at {}", common.truth.display()))?;

    if truth.case != case_name {
        bail!(
            "truth case mismatch: expected '{}', got '{}'.",
            case_name,
            truth.case
        );
    }

    let case_dir = common.out.join(case_name);
    fs::create_dir_all(&case_dir)
        .with_context(|| format!("creating output directory {}", case_dir.display()))?;

    fs::copy(&common.input, case_dir.join("input.png")).with_context(|| {
        format!(
            "copying input {} -> {}",
            common.input.display(),
            case_dir.join("input.png").display()
        )
    })?;
    fs::copy(&common.truth, case_dir.join("truth.json")).with_context(|| {
        format!(
            "copying truth {} -> {}",
            common.truth.display(),
            case_dir.join("truth.json").display()
        )
    })?;

    Ok((case_dir, truth))
}

fn load_input_u8(path: &Path) -> Result<Image<u8>> {
    let dyn_img =
        image::open(path).with_context(|| format!("opening input image {}", path.display()))?;
    let luma = dyn_img.to_luma8();
    let (w, h) = luma.dimensions();
    let data = luma.into_raw();

    Image::from_vec(w as usize, h as usize, data)
        .with_context(|| format!("constructing mask image from {}", path.display()))
}

fn load_input_rgb(path: &Path) -> Result<Image<[u8; 3]>> {
    let rgb = image::open(path)
        .with_context(|| format!("opening input image {}", path.display()))?
        .to_rgb8();
    let (w, h) = rgb.dimensions();
    let data = rgb.pixels().map(|p| p.0).collect();

    Image::from_vec(w as usize, h as usize, data)
        .with_context(|| format!("constructing RGB image from {}", path.display()))
}

fn load_disc_mask(args: &DiscArgs, img: &Image<u8>) -> Result<Option<Image<u8>>> {
    let Some(path) = &args.disc_mask else {
        return Ok(None);
    };

    ensure_file_exists(path, "disc mask")?;
    let disc = load_input_u8(path)?;
    if disc.dims() != img.dims() {
        bail!(
            "disc mask dimensions {:?} do not match input dimensions {:?}.",
            disc.dims(),
            img.dims()
        );
    }
    Ok(Some(disc))
}

fn resolve_disc(args: &DiscArgs, disc_mask: Option<&Image<u8>>) -> Result<Option<OpticDisc>> {
    match (args.disc_x, args.disc_y, args.disc_radius) {
        (Some(x), Some(y), Some(r)) => Ok(Some(OpticDisc::new(Point2f::new(x, y), r))),
        (None, None, None) => Ok(disc_mask.and_then(|m| estimate_optic_disc(&m.as_view()))),
        _ => bail!("--disc-x, --disc-y and --disc-radius must be given together."),
    }
}

fn validate_dims(truth: &TruthEnvelope, img: &Image<u8>) -> Result<()> {
    if truth.width != img.width() || truth.height != img.height() {
        bail!(
            "truth dimensions ({}, {}) do not match input dimensions ({}, {}).",
            truth.width,
            truth.height,
            img.width(),
            img.height()
        );
    }
    Ok(())
}

fn compare_rows(expected: &[MetricRow], actual: &[MetricRow]) -> Result<f64> {
    let mut worst = 0.0_f64;
    for want in expected {
        let Some(got) = actual
            .iter()
            .find(|r| r.vessel_map == want.vessel_map && r.zone == want.zone)
        else {
            bail!(
                "truth row ({}, {}) has no measured counterpart.",
                want.vessel_map,
                want.zone
            );
        };

        for (w, g) in want.values().iter().zip(got.values()) {
            worst = worst.max((w - g).abs());
        }
    }
    Ok(worst)
}

fn graph_dto(graph: &VesselGraph) -> GraphDto {
    let nodes = graph
        .nodes
        .iter()
        .map(|n| GraphNodeDto {
            id: n.id,
            kind: node_kind_name(n.kind),
            x: n.idx.0,
            y: n.idx.1,
            degree: n.degree,
        })
        .collect();

    let segments = graph
        .segments
        .iter()
        .map(|s| SegmentDto {
            id: s.id,
            a: s.a,
            b: s.b,
            is_loop: s.is_loop,
            length: s.length,
            chord: s.chord,
            tortuosity: s.tortuosity(),
            mean_width: s.mean_width(),
            points: s.pixels.iter().map(|&(x, y)| [x, y]).collect(),
            widths: s.widths.clone(),
        })
        .collect();

    GraphDto {
        width: graph.width,
        height: graph.height,
        nodes,
        segments,
    }
}

fn disc_dto(disc: OpticDisc) -> DiscDto {
    DiscDto {
        x: disc.center.x,
        y: disc.center.y,
        radius: disc.radius,
    }
}

fn save_u8_image(path: PathBuf, img: &Image<u8>) -> Result<()> {
    save_luma_raw(path, img.width(), img.height(), img.data().to_vec())
}

fn save_luma_raw(path: PathBuf, width: usize, height: usize, data: Vec<u8>) -> Result<()> {
    let gray = GrayImage::from_raw(width as u32, height as u32, data)
        .context("constructing GrayImage from raw bytes")?;
    gray.save(&path)
        .with_context(|| format!("saving image {}", path.display()))
}

fn f32_to_u8_vis(data: &[f32]) -> Vec<u8> {
    if data.is_empty() {
        return Vec::new();
    }

    let mut min_v = f32::INFINITY;
    let mut max_v = f32::NEG_INFINITY;
    for &v in data {
        min_v = min_v.min(v);
        max_v = max_v.max(v);
    }

    if (max_v - min_v).abs() < 1e-12 {
        return vec![0u8; data.len()];
    }

    let scale = 255.0 / (max_v - min_v);
    data.iter()
        .map(|&v| ((v - min_v) * scale).round().clamp(0.0, 255.0) as u8)
        .collect()
}

fn render_segment_overlay(input: &Image<u8>, graph: &VesselGraph) -> RgbImage {
    const PALETTE: [Rgb<u8>; 4] = [
        Rgb([64, 200, 255]),
        Rgb([255, 200, 64]),
        Rgb([120, 255, 120]),
        Rgb([220, 120, 255]),
    ];

    let mut rgb = RgbImage::from_fn(input.width() as u32, input.height() as u32, |x, y| {
        let on = input
            .get(x as usize, y as usize)
            .is_some_and(|&v| v > 0);
        if on { Rgb([70, 70, 70]) } else { Rgb([0, 0, 0]) }
    });

    for seg in &graph.segments {
        let color = PALETTE[seg.id % PALETTE.len()];
        for &(x, y) in &seg.pixels {
            rgb.put_pixel(x as u32, y as u32, color);
        }
    }

    for node in graph.iter_branch_points() {
        draw_dot(&mut rgb, node.idx.0, node.idx.1, Rgb([255, 64, 64]));
    }

    rgb
}

fn draw_dot(img: &mut RgbImage, x: usize, y: usize, color: Rgb<u8>) {
    let (xi, yi) = (x as i64, y as i64);
    for dy in -1..=1 {
        for dx in -1..=1 {
            let nx = xi + dx;
            let ny = yi + dy;
            if nx < 0 || ny < 0 {
                continue;
            }
            let (ux, uy) = (nx as u32, ny as u32);
            if ux >= img.width() || uy >= img.height() {
                continue;
            }
            img.put_pixel(ux, uy, color);
        }
    }
}

fn node_kind_name(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::End => "End",
        NodeKind::Branch => "Branch",
        NodeKind::Isolated => "Isolated",
        NodeKind::LoopAnchor => "LoopAnchor",
    }
}

fn write_json(path: PathBuf, value: &impl Serialize) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(value).context("serializing json")?;
    fs::write(&path, bytes).with_context(|| format!("writing json {}", path.display()))
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_slice(&data).with_context(|| format!("parsing json {}", path.display()))
}

fn write_rows_csv(path: PathBuf, rows: &[MetricRow]) -> Result<()> {
    let mut file =
        fs::File::create(&path).with_context(|| format!("creating {}", path.display()))?;
    writeln!(file, "{}", MetricRow::COLUMNS.join(",")).context("writing csv header")?;
    for row in rows {
        let values: Vec<String> = row.values().iter().map(|v| v.to_string()).collect();
        writeln!(file, "{},{},{}", row.vessel_map, row.zone, values.join(","))
            .context("writing csv row")?;
    }
    Ok(())
}

fn ensure_file_exists(path: &Path, what: &str) -> Result<()> {
    if !path.exists() {
        bail!("{} file does not exist: {}", what, path.display());
    }
    if !path.is_file() {
        bail!("{} path is not a file: {}", what, path.display());
    }
    Ok(())
}
