use core::fmt;

use serde::{Deserialize, Serialize};

/// Accepted microns-per-pixel range for SLO scans.
pub const MIN_MICRONS_PER_PIXEL: f64 = 3.0;
pub const MAX_MICRONS_PER_PIXEL: f64 = 20.0;

/// A validated microns-per-pixel factor.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct PixelScale(f64);

impl PixelScale {
    /// `None` unless `microns_per_pixel` is finite and inside
    /// `[MIN_MICRONS_PER_PIXEL, MAX_MICRONS_PER_PIXEL]`.
    pub fn new(microns_per_pixel: f64) -> Option<Self> {
        let ok = microns_per_pixel.is_finite()
            && (MIN_MICRONS_PER_PIXEL..=MAX_MICRONS_PER_PIXEL).contains(&microns_per_pixel);
        ok.then_some(Self(microns_per_pixel))
    }

    pub fn parse(text: &str) -> Option<Self> {
        text.trim().parse::<f64>().ok().and_then(Self::new)
    }

    pub fn microns_per_pixel(self) -> f64 {
        self.0
    }
}

impl fmt::Display for PixelScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} µm/px", self.0)
    }
}

/// Raw scale as handed in by the caller, before validation.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ScaleInput {
    #[default]
    Absent,
    Value(f64),
    Text(String),
}

impl ScaleInput {
    /// Validated scale, or the rejected input rendered for a warning.
    pub fn resolve(&self) -> Result<Option<PixelScale>, String> {
        match self {
            Self::Absent => Ok(None),
            Self::Value(v) => PixelScale::new(*v).map(Some).ok_or_else(|| v.to_string()),
            Self::Text(t) => PixelScale::parse(t).map(Some).ok_or_else(|| t.clone()),
        }
    }
}

impl From<f64> for ScaleInput {
    fn from(v: f64) -> Self {
        Self::Value(v)
    }
}

impl From<Option<f64>> for ScaleInput {
    fn from(v: Option<f64>) -> Self {
        v.map_or(Self::Absent, Self::Value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasurementUnits {
    Pixels,
    Microns,
}

impl MeasurementUnits {
    pub fn of(scale: Option<PixelScale>) -> Self {
        if scale.is_some() {
            Self::Microns
        } else {
            Self::Pixels
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{MeasurementUnits, PixelScale, ScaleInput};

    #[test]
    fn scale_range_is_inclusive() {
        assert!(PixelScale::new(3.0).is_some());
        assert!(PixelScale::new(20.0).is_some());
        assert_eq!(PixelScale::new(11.5).map(|s| s.microns_per_pixel()), Some(11.5));

        assert!(PixelScale::new(2.99).is_none());
        assert!(PixelScale::new(20.01).is_none());
        assert!(PixelScale::new(f64::NAN).is_none());
        assert!(PixelScale::new(f64::INFINITY).is_none());
    }

    #[test]
    fn textual_scale() {
        assert_eq!(PixelScale::parse(" 10 "), PixelScale::new(10.0));
        assert!(PixelScale::parse("ten").is_none());
        assert!(PixelScale::parse("").is_none());
    }

    #[test]
    fn resolve_reports_rejected_input() {
        assert_eq!(ScaleInput::Absent.resolve(), Ok(None));
        assert_eq!(ScaleInput::from(10.0).resolve(), Ok(PixelScale::new(10.0)));
        assert_eq!(ScaleInput::from(42.0).resolve(), Err("42".to_owned()));
        assert_eq!(
            ScaleInput::Text("abc".into()).resolve(),
            Err("abc".to_owned())
        );

        assert_eq!(MeasurementUnits::of(PixelScale::new(5.0)), MeasurementUnits::Microns);
        assert_eq!(MeasurementUnits::of(None), MeasurementUnits::Pixels);
    }
}
