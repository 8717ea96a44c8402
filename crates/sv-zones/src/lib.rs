//! Measurement zones for SLO vessel metrics.
//!
//! Macula-centred scans are measured over the whole image. Optic-disc-centred
//! scans add the standard annuli B and C, expressed in disc diameters from
//! the disc centre. Zones overlap and are measured independently.

mod disc;
mod layout;

pub use disc::{OpticDisc, estimate_optic_disc};
pub use layout::{ParseScanLocationError, ScanLocation, Zone, ZoneLayout, ZoneMask, build_zones};
