use core::fmt;
use core::str::FromStr;

use sv_zones::Zone;

/// Which vessel map a measurement was taken on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VesselType {
    Binary,
    Artery,
    Vein,
}

impl VesselType {
    pub const ALL: [VesselType; 3] = [VesselType::Binary, VesselType::Artery, VesselType::Vein];

    pub fn name(self) -> &'static str {
        match self {
            Self::Binary => "binary",
            Self::Artery => "artery",
            Self::Vein => "vein",
        }
    }

    /// Artery and vein maps carry a Knudtson equivalent; the binary map does not.
    pub fn has_equivalent(self) -> bool {
        !matches!(self, Self::Binary)
    }
}

impl fmt::Display for VesselType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for VesselType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "binary" => Ok(Self::Binary),
            "artery" => Ok(Self::Artery),
            "vein" => Ok(Self::Vein),
            other => Err(format!("unknown vessel type {other:?}")),
        }
    }
}

/// Metrics of one vessel map inside one zone. `None` means not computed.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MetricRecord {
    pub fractal_dimension: Option<f64>,
    pub vessel_density: Option<f64>,
    pub average_global_calibre: Option<f64>,
    pub average_local_calibre: Option<f64>,
    pub tortuosity_density: Option<f64>,
    pub tortuosity_distance: Option<f64>,
    pub crae_knudtson: Option<f64>,
    pub crve_knudtson: Option<f64>,
}

impl MetricRecord {
    /// Names of the metrics that apply to `vessel` but were not computed.
    pub fn missing(&self, vessel: VesselType) -> Vec<&'static str> {
        let mut out = Vec::new();
        let fields = [
            ("fractal_dimension", self.fractal_dimension),
            ("vessel_density", self.vessel_density),
            ("average_global_calibre", self.average_global_calibre),
            ("average_local_calibre", self.average_local_calibre),
            ("tortuosity_density", self.tortuosity_density),
            ("tortuosity_distance", self.tortuosity_distance),
        ];
        for (name, value) in fields {
            if value.is_none() {
                out.push(name);
            }
        }

        match vessel {
            VesselType::Artery if self.crae_knudtson.is_none() => out.push("CRAE_Knudtson"),
            VesselType::Vein if self.crve_knudtson.is_none() => out.push("CRVE_Knudtson"),
            _ => {}
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ZoneMetrics {
    pub vessel: VesselType,
    pub zone: Zone,
    /// Segments with at least one sample inside the zone.
    pub segments: usize,
    pub record: MetricRecord,
}

/// Arterio-venous ratio of one zone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AvrRecord {
    pub zone: Zone,
    pub crae: Option<f64>,
    pub crve: Option<f64>,
    pub avr: Option<f64>,
}

impl AvrRecord {
    /// Arteries wider than veins; recorded but suspicious.
    pub fn is_implausible(&self) -> bool {
        self.avr.is_some_and(|v| v > 1.0)
    }
}
