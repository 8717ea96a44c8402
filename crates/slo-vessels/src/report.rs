use serde::{Deserialize, Serialize};
use sv_core::Point2f;
use sv_measure::{AvrRecord, MetricRecord, VesselType, ZoneMetrics};
use sv_zones::{OpticDisc, ScanLocation, Zone};

use crate::{AnalysisWarning, MeasurementUnits, PixelScale};

/// Printed in place of a metric that was not computed.
pub const MISSING: f64 = -1.0;

/// `vessel_map` value of the per-zone AVR rows.
pub const ARTERY_VEIN: &str = "artery-vein";

/// One row of the tabular report. Missing metrics are [`MISSING`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRow {
    pub vessel_map: String,
    pub zone: String,
    pub fractal_dimension: f64,
    pub vessel_density: f64,
    pub average_global_calibre: f64,
    pub average_local_calibre: f64,
    pub tortuosity_density: f64,
    pub tortuosity_distance: f64,
    #[serde(rename = "CRAE_Knudtson")]
    pub crae_knudtson: f64,
    #[serde(rename = "CRVE_Knudtson")]
    pub crve_knudtson: f64,
    #[serde(rename = "AVR")]
    pub avr: f64,
}

impl MetricRow {
    pub const COLUMNS: [&'static str; 11] = [
        "vessel_map",
        "zone",
        "fractal_dimension",
        "vessel_density",
        "average_global_calibre",
        "average_local_calibre",
        "tortuosity_density",
        "tortuosity_distance",
        "CRAE_Knudtson",
        "CRVE_Knudtson",
        "AVR",
    ];

    pub fn from_record(vessel: VesselType, zone: Zone, record: &MetricRecord) -> Self {
        let v = |m: Option<f64>| m.unwrap_or(MISSING);
        Self {
            vessel_map: vessel.name().to_owned(),
            zone: zone.name().to_owned(),
            fractal_dimension: v(record.fractal_dimension),
            vessel_density: v(record.vessel_density),
            average_global_calibre: v(record.average_global_calibre),
            average_local_calibre: v(record.average_local_calibre),
            tortuosity_density: v(record.tortuosity_density),
            tortuosity_distance: v(record.tortuosity_distance),
            crae_knudtson: v(record.crae_knudtson),
            crve_knudtson: v(record.crve_knudtson),
            avr: MISSING,
        }
    }

    pub fn from_avr(avr: &AvrRecord) -> Self {
        Self {
            vessel_map: ARTERY_VEIN.to_owned(),
            zone: avr.zone.name().to_owned(),
            fractal_dimension: MISSING,
            vessel_density: MISSING,
            average_global_calibre: MISSING,
            average_local_calibre: MISSING,
            tortuosity_density: MISSING,
            tortuosity_distance: MISSING,
            crae_knudtson: MISSING,
            crve_knudtson: MISSING,
            avr: avr.avr.unwrap_or(MISSING),
        }
    }

    /// Metric columns in [`Self::COLUMNS`] order, without the two keys.
    pub fn values(&self) -> [f64; 9] {
        [
            self.fractal_dimension,
            self.vessel_density,
            self.average_global_calibre,
            self.average_local_calibre,
            self.tortuosity_density,
            self.tortuosity_distance,
            self.crae_knudtson,
            self.crve_knudtson,
            self.avr,
        ]
    }
}

/// Zones whose rows carry the whole-map metrics: fractal dimension, vessel
/// density and global calibre.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GlobalMetrics {
    #[default]
    EveryZone,
    /// Blanked to [`MISSING`] in the annular zones.
    WholeImageOnly,
}

/// Everything measured on one image.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub width: usize,
    pub height: usize,
    pub location: ScanLocation,
    pub disc: Option<OpticDisc>,
    pub fovea: Option<Point2f>,
    pub scale: Option<PixelScale>,
    pub units: MeasurementUnits,
    pub zones: Vec<Zone>,
    /// Segments kept per vessel map.
    pub segment_counts: Vec<(VesselType, usize)>,
    pub metrics: Vec<ZoneMetrics>,
    pub avr: Vec<AvrRecord>,
    pub warnings: Vec<AnalysisWarning>,
}

impl AnalysisReport {
    pub fn record(&self, vessel: VesselType, zone: Zone) -> Option<&MetricRecord> {
        self.metrics
            .iter()
            .find(|m| m.vessel == vessel && m.zone == zone)
            .map(|m| &m.record)
    }

    pub fn avr(&self, zone: Zone) -> Option<&AvrRecord> {
        self.avr.iter().find(|a| a.zone == zone)
    }

    pub fn segment_count(&self, vessel: VesselType) -> usize {
        self.segment_counts
            .iter()
            .find(|(v, _)| *v == vessel)
            .map_or(0, |(_, n)| *n)
    }

    /// Report table: every vessel map in every zone, then one AVR row per zone.
    pub fn rows(&self) -> Vec<MetricRow> {
        self.rows_with(GlobalMetrics::EveryZone)
    }

    pub fn rows_with(&self, globals: GlobalMetrics) -> Vec<MetricRow> {
        let mut rows: Vec<MetricRow> = self
            .metrics
            .iter()
            .map(|m| {
                let mut row = MetricRow::from_record(m.vessel, m.zone, &m.record);
                if globals == GlobalMetrics::WholeImageOnly && m.zone != Zone::Whole {
                    row.fractal_dimension = MISSING;
                    row.vessel_density = MISSING;
                    row.average_global_calibre = MISSING;
                }
                row
            })
            .collect();
        rows.extend(self.avr.iter().map(MetricRow::from_avr));
        rows
    }

    pub fn zone_rows(&self, zone: Zone) -> Vec<MetricRow> {
        let name = zone.name();
        self.rows().into_iter().filter(|r| r.zone == name).collect()
    }

    /// Single-row summary keyed `{metric}_{vessel_map}_{zone}`, outer zones
    /// first. Columns that are missing are left out and the AVR columns are
    /// shortened to `AVR_{zone}`.
    pub fn summary_columns(&self) -> Vec<(String, f64)> {
        self.summary_columns_with(GlobalMetrics::EveryZone)
    }

    pub fn summary_columns_with(&self, globals: GlobalMetrics) -> Vec<(String, f64)> {
        const ORDER: [&str; 9] = [
            "fractal_dimension",
            "vessel_density",
            "average_global_calibre",
            "average_local_calibre",
            "tortuosity_distance",
            "tortuosity_density",
            "CRAE_Knudtson",
            "CRVE_Knudtson",
            "AVR",
        ];

        let rows = self.rows_with(globals);
        let mut out = Vec::new();
        for zone in self.zones.iter().rev() {
            for row in rows.iter().filter(|r| r.zone == zone.name()) {
                for col in ORDER {
                    let value = column(row, col);
                    if value == MISSING {
                        continue;
                    }
                    let key = if row.vessel_map == ARTERY_VEIN {
                        format!("AVR_{}", zone.name())
                    } else {
                        format!("{col}_{}_{}", row.vessel_map, zone.name())
                    };
                    out.push((key, value));
                }
            }
        }
        out
    }
}

fn column(row: &MetricRow, name: &str) -> f64 {
    match name {
        "fractal_dimension" => row.fractal_dimension,
        "vessel_density" => row.vessel_density,
        "average_global_calibre" => row.average_global_calibre,
        "average_local_calibre" => row.average_local_calibre,
        "tortuosity_density" => row.tortuosity_density,
        "tortuosity_distance" => row.tortuosity_distance,
        "CRAE_Knudtson" => row.crae_knudtson,
        "CRVE_Knudtson" => row.crve_knudtson,
        "AVR" => row.avr,
        _ => MISSING,
    }
}
