use log::{debug, warn};
use sv_core::{Error, Point2f};
use sv_graph::{SegmentConfig, extract_segments};
use sv_measure::{MetricConfig, VesselType, ZoneMetrics, combine_avr, compute_metrics};
use sv_zones::{OpticDisc, ScanLocation, Zone, ZoneLayout, build_zones, estimate_optic_disc};

use crate::{
    AnalysisReport, AnalysisWarning, MeasurementUnits, PixelScale, ScaleInput, SegmentationMasks,
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisConfig {
    pub segments: SegmentConfig,
    pub metrics: MetricConfig,
}

/// One image to analyse.
#[derive(Debug, Clone)]
pub struct AnalysisInput {
    pub masks: SegmentationMasks,
    pub location: ScanLocation,
    /// Explicit disc geometry. When absent it is estimated from the disc map.
    pub disc: Option<OpticDisc>,
    /// Carried into the report unchanged.
    pub fovea: Option<Point2f>,
    pub scale: ScaleInput,
}

impl AnalysisInput {
    pub fn new(masks: SegmentationMasks, location: ScanLocation) -> Self {
        Self {
            masks,
            location,
            disc: None,
            fovea: None,
            scale: ScaleInput::Absent,
        }
    }
}

struct VesselMeasurement {
    vessel: VesselType,
    segments: usize,
    metrics: Vec<ZoneMetrics>,
}

/// Measures every vessel map of one image in every zone.
///
/// Only inconsistent input sizes are fatal. Everything else that goes wrong
/// is reported through [`AnalysisReport::warnings`] and `None` metrics.
pub fn analyse(input: &AnalysisInput, cfg: &AnalysisConfig) -> Result<AnalysisReport, Error> {
    let (width, height) = input.masks.dims();
    let mut warnings = Vec::new();

    let scale = match input.scale.resolve() {
        Ok(scale) => scale,
        Err(given) => {
            warnings.push(AnalysisWarning::InvalidScale { given });
            None
        }
    };

    let disc = input.disc.or_else(|| {
        let estimated = estimate_optic_disc(&input.masks.disc.as_view());
        if let Some(d) = estimated {
            debug!(
                "analyse: disc estimated at ({:.1}, {:.1}), radius {:.1}",
                d.center.x, d.center.y, d.radius
            );
        }
        estimated
    });

    let zones = build_zones(width, height, disc, input.location);
    if zones.geometry_undefined {
        warnings.push(AnalysisWarning::GeometryUndefined);
    }

    let measured = measure_all(input, disc, &zones, scale, cfg)?;

    let mut metrics = Vec::new();
    let mut segment_counts = Vec::new();
    for m in measured {
        segment_counts.push((m.vessel, m.segments));
        metrics.extend(m.metrics);
    }

    for m in &metrics {
        for metric in m.record.missing(m.vessel) {
            warnings.push(AnalysisWarning::DegenerateMeasurement {
                vessel: m.vessel,
                zone: m.zone,
                metric,
            });
        }
    }

    let record_of = |vessel: VesselType, zone: Zone| {
        metrics
            .iter()
            .find(|m| m.vessel == vessel && m.zone == zone)
            .map(|m| m.record)
    };
    let mut avr = Vec::new();
    for zone in zones.iter().map(|z| z.zone) {
        let crae = record_of(VesselType::Artery, zone).and_then(|r| r.crae_knudtson);
        let crve = record_of(VesselType::Vein, zone).and_then(|r| r.crve_knudtson);
        let rec = combine_avr(zone, crae, crve);
        if rec.is_implausible()
            && let Some(value) = rec.avr
        {
            warnings.push(AnalysisWarning::ImplausibleAvr { zone, avr: value });
        }
        avr.push(rec);
    }

    for w in &warnings {
        match w {
            AnalysisWarning::DegenerateMeasurement { .. } => debug!("analyse: {w}"),
            _ => warn!("{w}"),
        }
    }

    Ok(AnalysisReport {
        width,
        height,
        location: input.location,
        disc,
        fovea: input.fovea,
        scale,
        units: MeasurementUnits::of(scale),
        zones: zones.iter().map(|z| z.zone).collect(),
        segment_counts,
        metrics,
        avr,
        warnings,
    })
}

#[cfg(not(feature = "parallel"))]
fn measure_all(
    input: &AnalysisInput,
    disc: Option<OpticDisc>,
    zones: &ZoneLayout,
    scale: Option<PixelScale>,
    cfg: &AnalysisConfig,
) -> Result<Vec<VesselMeasurement>, Error> {
    VesselType::ALL
        .iter()
        .map(|&vessel| measure_vessel(input, vessel, disc, zones, scale, cfg))
        .collect()
}

#[cfg(feature = "parallel")]
fn measure_all(
    input: &AnalysisInput,
    disc: Option<OpticDisc>,
    zones: &ZoneLayout,
    scale: Option<PixelScale>,
    cfg: &AnalysisConfig,
) -> Result<Vec<VesselMeasurement>, Error> {
    use rayon::prelude::*;

    VesselType::ALL
        .par_iter()
        .map(|&vessel| measure_vessel(input, vessel, disc, zones, scale, cfg))
        .collect()
}

fn measure_vessel(
    input: &AnalysisInput,
    vessel: VesselType,
    disc: Option<OpticDisc>,
    zones: &ZoneLayout,
    scale: Option<PixelScale>,
    cfg: &AnalysisConfig,
) -> Result<VesselMeasurement, Error> {
    let map = input.masks.vessel_map(vessel)?;
    let graph = extract_segments(
        &map.as_view(),
        Some(&input.masks.disc.as_view()),
        disc.map(|d| d.center),
        &cfg.segments,
    )?;

    let metrics = compute_metrics(
        &map.as_view(),
        &graph.segments,
        zones,
        scale.map(PixelScale::microns_per_pixel),
        vessel,
        &cfg.metrics,
    )?;

    debug!(
        "analyse: {} map, {} segments, {} branch points",
        vessel,
        graph.segments.len(),
        graph.num_branch_points()
    );

    Ok(VesselMeasurement {
        vessel,
        segments: graph.segments.len(),
        metrics,
    })
}
