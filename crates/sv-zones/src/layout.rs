use core::fmt;
use core::str::FromStr;

use log::debug;
use sv_core::Image;
use sv_core::mask::{FOREGROUND, count_foreground, full_mask};

use crate::OpticDisc;

/// Where the scan is centred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanLocation {
    Macula,
    OpticDisc,
}

impl ScanLocation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Macula => "Macula",
            Self::OpticDisc => "Optic disc",
        }
    }
}

impl fmt::Display for ScanLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseScanLocationError(String);

impl fmt::Display for ParseScanLocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown scan location {:?} (expected \"Macula\" or \"Optic disc\")",
            self.0
        )
    }
}

impl std::error::Error for ParseScanLocationError {}

impl FromStr for ScanLocation {
    type Err = ParseScanLocationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace(['_', '-'], " ");
        match key.as_str() {
            "macula" => Ok(Self::Macula),
            "optic disc" | "disc" => Ok(Self::OpticDisc),
            _ => Err(ParseScanLocationError(s.to_owned())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Zone {
    Whole,
    B,
    C,
}

impl Zone {
    pub const ALL: [Zone; 3] = [Zone::Whole, Zone::B, Zone::C];

    pub fn name(self) -> &'static str {
        match self {
            Self::Whole => "whole",
            Self::B => "B",
            Self::C => "C",
        }
    }

    /// Half-open band `[lo, hi)` of distance from the disc centre, in disc
    /// diameters. `None` for the whole image.
    pub fn band(self) -> Option<(f64, f64)> {
        match self {
            Self::Whole => None,
            Self::B => Some((0.5, 1.0)),
            Self::C => Some((0.0, 2.0)),
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A zone and its image-congruent mask.
#[derive(Debug, Clone)]
pub struct ZoneMask {
    pub zone: Zone,
    pub mask: Image<u8>,
    /// Number of pixels inside the zone.
    pub area: usize,
}

impl ZoneMask {
    fn new(zone: Zone, mask: Image<u8>) -> Self {
        let area = count_foreground(&mask.as_view());
        Self { zone, mask, area }
    }

    pub fn contains(&self, x: usize, y: usize) -> bool {
        self.mask.get(x, y).is_some_and(|&v| v > 0)
    }
}

#[derive(Debug, Clone)]
pub struct ZoneLayout {
    pub width: usize,
    pub height: usize,
    pub location: ScanLocation,
    pub disc: Option<OpticDisc>,
    pub zones: Vec<ZoneMask>,
    /// Optic-disc scan whose disc geometry was missing or degenerate; only
    /// the whole-image zone was built.
    pub geometry_undefined: bool,
}

impl ZoneLayout {
    pub fn get(&self, zone: Zone) -> Option<&ZoneMask> {
        self.zones.iter().find(|z| z.zone == zone)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ZoneMask> {
        self.zones.iter()
    }

    pub fn zone_names(&self) -> Vec<&'static str> {
        self.zones.iter().map(|z| z.zone.name()).collect()
    }
}

/// Builds the zone masks for one image.
///
/// A macula scan gets the whole image only. An optic-disc scan also gets the
/// B and C annuli around a valid disc; with no usable disc it falls back to
/// the whole image and flags `geometry_undefined`.
pub fn build_zones(
    width: usize,
    height: usize,
    disc: Option<OpticDisc>,
    location: ScanLocation,
) -> ZoneLayout {
    let mut zones = vec![ZoneMask::new(Zone::Whole, full_mask(width, height))];
    let mut geometry_undefined = false;

    if location == ScanLocation::OpticDisc {
        match disc.filter(OpticDisc::is_valid) {
            Some(d) => {
                for zone in [Zone::B, Zone::C] {
                    if let Some(band) = zone.band() {
                        zones.push(ZoneMask::new(zone, annulus(width, height, &d, band)));
                    }
                }
            }
            None => {
                debug!("build_zones: optic disc scan without usable disc geometry ({disc:?})");
                geometry_undefined = true;
            }
        }
    }

    ZoneLayout {
        width,
        height,
        location,
        disc,
        zones,
        geometry_undefined,
    }
}

fn annulus(width: usize, height: usize, disc: &OpticDisc, (lo, hi): (f64, f64)) -> Image<u8> {
    let cx = f64::from(disc.center.x);
    let cy = f64::from(disc.center.y);
    let diameter = f64::from(disc.diameter());

    Image::from_fn(width, height, |x, y| {
        let dx = x as f64 - cx;
        let dy = y as f64 - cy;
        let d = (dx * dx + dy * dy).sqrt() / diameter;
        if d >= lo && d < hi { FOREGROUND } else { 0 }
    })
}
