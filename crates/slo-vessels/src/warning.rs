use core::fmt;

use sv_measure::VesselType;
use sv_zones::Zone;

/// Non-fatal conditions met while analysing one image.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisWarning {
    /// Scale missing from the accepted range or unparseable; measured in pixels.
    InvalidScale { given: String },
    /// Optic-disc scan without usable disc geometry; whole-image zone only.
    GeometryUndefined,
    DegenerateMeasurement {
        vessel: VesselType,
        zone: Zone,
        metric: &'static str,
    },
    ImplausibleAvr { zone: Zone, avr: f64 },
}

impl fmt::Display for AnalysisWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidScale { given } => write!(
                f,
                "scale {given:?} is not a valid microns-per-pixel value, measuring in pixels"
            ),
            Self::GeometryUndefined => {
                write!(f, "optic disc geometry undefined, measuring the whole image only")
            }
            Self::DegenerateMeasurement {
                vessel,
                zone,
                metric,
            } => write!(f, "{metric} undefined for the {vessel} map in zone {zone}"),
            Self::ImplausibleAvr { zone, avr } => write!(
                f,
                "AVR {avr:.3} exceeds 1 in zone {zone}, check the artery-vein segmentation"
            ),
        }
    }
}
