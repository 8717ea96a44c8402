//! Per-zone vessel metrics and the Knudtson arterio-venous combination.
//!
//! [`compute_metrics`] measures one vessel map against every zone of a
//! [`sv_zones::ZoneLayout`]. Values that cannot be computed stay `None`; the
//! reporting layer decides how to print them.

mod fractal;
mod knudtson;
mod metrics;
mod record;

pub use fractal::{box_counts, fractal_dimension};
pub use knudtson::{ARTERY_COEFFICIENT, Pairing, VEIN_COEFFICIENT, combine_avr, knudtson_equivalent};
pub use metrics::{MetricConfig, compute_metrics};
pub use record::{AvrRecord, MetricRecord, VesselType, ZoneMetrics};
