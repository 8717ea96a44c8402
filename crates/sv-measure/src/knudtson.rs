use crate::{AvrRecord, VesselType};
use sv_zones::Zone;

pub const ARTERY_COEFFICIENT: f64 = 0.88;
pub const VEIN_COEFFICIENT: f64 = 0.95;

/// How calibres are paired in each Knudtson round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pairing {
    /// Largest with smallest, second largest with second smallest, and so
    /// on; an odd median is carried to the next round unchanged.
    #[default]
    LargestWithSmallest,
    /// Repeatedly merge the two largest calibres.
    TwoLargest,
}

/// Knudtson central retinal equivalent (CRAE for arteries, CRVE for veins).
///
/// `None` for the binary map and for fewer than two calibres.
pub fn knudtson_equivalent(calibres: &[f64], vessel: VesselType, pairing: Pairing) -> Option<f64> {
    let coef = match vessel {
        VesselType::Artery => ARTERY_COEFFICIENT,
        VesselType::Vein => VEIN_COEFFICIENT,
        VesselType::Binary => return None,
    };
    if calibres.len() < 2 {
        return None;
    }

    let mut w = calibres.to_vec();
    sort_descending(&mut w);

    let pair = |a: f64, b: f64| coef * (a * a + b * b).sqrt();
    while w.len() > 1 {
        match pairing {
            Pairing::LargestWithSmallest => {
                let n = w.len();
                let mut next: Vec<f64> = (0..n / 2).map(|i| pair(w[i], w[n - 1 - i])).collect();
                if n % 2 == 1 {
                    next.push(w[n / 2]);
                }
                w = next;
            }
            Pairing::TwoLargest => {
                let merged = pair(w[0], w[1]);
                w.drain(..2);
                w.push(merged);
            }
        }
        sort_descending(&mut w);
    }

    w.first().copied()
}

/// AVR of one zone: `crae / crve` when both are present and `crve > 0`.
pub fn combine_avr(zone: Zone, crae: Option<f64>, crve: Option<f64>) -> AvrRecord {
    let avr = match (crae, crve) {
        (Some(a), Some(v)) if v > 0.0 => Some(a / v),
        _ => None,
    };
    AvrRecord {
        zone,
        crae,
        crve,
        avr,
    }
}

/// Stable: equal calibres keep their discovery order.
pub(crate) fn sort_descending(w: &mut [f64]) {
    w.sort_by(|a, b| b.total_cmp(a));
}
