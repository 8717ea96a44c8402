//! Retinal vessel metrics for scanning-laser-ophthalmoscopy (SLO) images.
//!
//! Given the binary, artery, vein and optic-disc segmentations of one image,
//! [`analyse`] builds the measurement zones, traces vessel segments per map,
//! and measures density, fractal dimension, calibre, tortuosity and the
//! Knudtson CRAE/CRVE with the derived AVR.
//!
//! ```no_run
//! use slo_vessels::{AnalysisConfig, AnalysisInput, Image, ScanLocation, SegmentationMasks};
//!
//! let empty = || Image::new_fill(768, 768, 0u8);
//! let masks = SegmentationMasks::new(empty(), empty(), empty(), empty())?;
//! let mut input = AnalysisInput::new(masks, ScanLocation::Macula);
//! input.scale = 11.2.into();
//!
//! let report = slo_vessels::analyse(&input, &AnalysisConfig::default())?;
//! for row in report.rows() {
//!     println!("{} {} {}", row.vessel_map, row.zone, row.vessel_density);
//! }
//! # Ok::<(), slo_vessels::Error>(())
//! ```
//!
//! The building blocks are re-exported: masks and geometry from `sv-core`,
//! morphology from `sv-morph`, box counting from `sv-pyr`, segments from
//! `sv-graph`, zones from `sv-zones` and metrics from `sv-measure`.

mod masks;
mod pipeline;
mod report;
mod scale;
mod warning;

pub use masks::SegmentationMasks;
pub use pipeline::{AnalysisConfig, AnalysisInput, analyse};
pub use report::{ARTERY_VEIN, AnalysisReport, GlobalMetrics, MISSING, MetricRow};
pub use scale::{
    MAX_MICRONS_PER_PIXEL, MIN_MICRONS_PER_PIXEL, MeasurementUnits, PixelScale, ScaleInput,
};
pub use warning::AnalysisWarning;

pub use sv_core::*;
pub use sv_graph::*;
pub use sv_measure::*;
pub use sv_morph::*;
pub use sv_pyr::*;
pub use sv_zones::*;
