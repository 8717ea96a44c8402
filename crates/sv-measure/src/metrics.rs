use log::debug;
use sv_core::mask::{bounding_box, count_foreground, ensure_same_dims, intersect};
use sv_core::{Error, ImageView};
use sv_graph::VesselSegment;
use sv_zones::{Zone, ZoneLayout, ZoneMask};

use crate::fractal::fractal_dimension;
use crate::knudtson::{Pairing, knudtson_equivalent, sort_descending};
use crate::{MetricRecord, VesselType, ZoneMetrics};

#[derive(Debug, Clone, PartialEq)]
pub struct MetricConfig {
    /// Number of largest calibres entering the Knudtson equivalent of the
    /// whole-image zone. Annular zones use every qualifying segment.
    pub whole_image_vessels: usize,
    pub pairing: Pairing,
}

impl Default for MetricConfig {
    fn default() -> Self {
        Self {
            whole_image_vessels: 6,
            pairing: Pairing::LargestWithSmallest,
        }
    }
}

/// Measures one vessel map in every zone of `zones`.
///
/// `scale` is a validated microns-per-pixel factor; it converts calibres
/// only. Density, fractal dimension and tortuosity stay in pixel units.
pub fn compute_metrics(
    vessel: &ImageView<'_, u8>,
    segments: &[VesselSegment],
    zones: &ZoneLayout,
    scale: Option<f64>,
    vessel_type: VesselType,
    cfg: &MetricConfig,
) -> Result<Vec<ZoneMetrics>, Error> {
    ensure_same_dims("zone layout", vessel.dims(), (zones.width, zones.height))?;

    let factor = scale.unwrap_or(1.0);
    let mut out = Vec::with_capacity(zones.zones.len());
    for zone in zones.iter() {
        let metrics = measure_zone(vessel, segments, zone, factor, vessel_type, cfg)?;
        debug!(
            "compute_metrics: {} / {}: {} segments, density {:?}, fd {:?}",
            vessel_type,
            zone.zone,
            metrics.segments,
            metrics.record.vessel_density,
            metrics.record.fractal_dimension
        );
        out.push(metrics);
    }

    Ok(out)
}

fn measure_zone(
    vessel: &ImageView<'_, u8>,
    segments: &[VesselSegment],
    zone: &ZoneMask,
    factor: f64,
    vessel_type: VesselType,
    cfg: &MetricConfig,
) -> Result<ZoneMetrics, Error> {
    let zone_view = zone.mask.as_view();
    let in_zone = intersect(vessel, &zone_view)?;
    let in_zone_view = in_zone.as_view();

    let mut record = MetricRecord::default();

    let vessel_pixels = count_foreground(&in_zone_view);
    if zone.area > 0 && vessel_pixels > 0 {
        record.vessel_density = Some(vessel_pixels as f64 / zone.area as f64);
    }

    if let Some((x0, y0, x1, y1)) = bounding_box(&zone_view) {
        let crop = in_zone_view.subview(x0, y0, x1 - x0, y1 - y0)?;
        record.fractal_dimension = fractal_dimension(&crop);
    }

    let mut hits = 0_usize;
    let mut arc_sum = 0.0_f64;
    let mut tortuosities = Vec::new();
    let mut global_sum = 0.0_f64;
    let mut global_n = 0_usize;
    let mut calibres = Vec::new();

    for seg in segments {
        let inside: Vec<usize> = seg
            .pixels
            .iter()
            .enumerate()
            .filter(|&(_, &(x, y))| zone.contains(x, y))
            .map(|(i, _)| i)
            .collect();
        if inside.is_empty() {
            continue;
        }

        hits += 1;
        arc_sum += f64::from(seg.length);
        if let Some(t) = seg.tortuosity() {
            tortuosities.push(f64::from(t));
        }

        if let Some(widths) = &seg.widths {
            let sum: f64 = inside.iter().map(|&i| f64::from(widths[i])).sum();
            global_sum += sum;
            global_n += inside.len();
            calibres.push(sum / inside.len() as f64);
        }
    }

    if hits > 0 {
        record.tortuosity_distance = mean(&tortuosities);
        if zone.area > 0 {
            record.tortuosity_density = Some(arc_sum / zone.area as f64);
        }
    }

    if global_n > 0 {
        record.average_global_calibre = Some(global_sum / global_n as f64 * factor);
    }
    record.average_local_calibre = mean(&calibres).map(|c| c * factor);

    if vessel_type.has_equivalent() {
        let mut scaled: Vec<f64> = calibres.iter().map(|c| c * factor).collect();
        sort_descending(&mut scaled);
        if zone.zone == Zone::Whole {
            scaled.truncate(cfg.whole_image_vessels);
        }

        let equivalent = knudtson_equivalent(&scaled, vessel_type, cfg.pairing);
        match vessel_type {
            VesselType::Artery => record.crae_knudtson = equivalent,
            VesselType::Vein => record.crve_knudtson = equivalent,
            VesselType::Binary => {}
        }
    }

    Ok(ZoneMetrics {
        vessel: vessel_type,
        zone: zone.zone,
        segments: hits,
        record,
    })
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

#[cfg(test)]
mod tests {
    use sv_core::mask::FOREGROUND;
    use sv_core::{Error, Image, Point2f};
    use sv_graph::{SegmentConfig, VesselSegment, extract_segments};
    use sv_zones::{OpticDisc, ScanLocation, Zone, ZoneLayout, ZoneMask, build_zones};

    use super::{MetricConfig, compute_metrics};
    use crate::{VesselType, ZoneMetrics};

    fn mask(width: usize, height: usize, f: impl Fn(usize, usize) -> bool) -> Image<u8> {
        Image::from_fn(width, height, |x, y| if f(x, y) { FOREGROUND } else { 0 })
    }

    fn segments_of(img: &Image<u8>) -> Vec<VesselSegment> {
        extract_segments(&img.as_view(), None, None, &SegmentConfig::default())
            .expect("congruent inputs")
            .segments
    }

    fn measure(
        img: &Image<u8>,
        layout: &ZoneLayout,
        scale: Option<f64>,
        vessel: VesselType,
        cfg: &MetricConfig,
    ) -> Vec<ZoneMetrics> {
        let segments = segments_of(img);
        compute_metrics(&img.as_view(), &segments, layout, scale, vessel, cfg)
            .expect("congruent inputs")
    }

    fn whole(width: usize, height: usize) -> ZoneLayout {
        build_zones(width, height, None, ScanLocation::Macula)
    }

    #[test]
    fn all_background_mask_has_no_metrics() {
        let img = Image::new_fill(64, 64, 0u8);
        for vessel in VesselType::ALL {
            let out = measure(&img, &whole(64, 64), None, vessel, &MetricConfig::default());
            assert_eq!(out.len(), 1);
            assert_eq!(out[0].segments, 0);
            assert_eq!(out[0].record, Default::default());
        }
    }

    #[test]
    fn straight_vessel_of_width_five() {
        let img = mask(128, 32, |x, y| (10..110).contains(&x) && (14..19).contains(&y));
        let out = measure(&img, &whole(128, 32), None, VesselType::Binary, &MetricConfig::default());
        let rec = out[0].record;
        let area = (128 * 32) as f64;

        assert_eq!(out[0].segments, 1);
        assert_eq!(rec.average_local_calibre, Some(5.0));
        assert_eq!(rec.average_global_calibre, Some(5.0));
        assert_eq!(rec.tortuosity_distance, Some(0.0));
        assert_eq!(rec.vessel_density, Some(500.0 / area));

        let td = rec.tortuosity_density.expect("one segment");
        let expected = 100.0 / area;
        assert!((td - expected).abs() < 0.1 * expected, "td = {td}");

        let fd = rec.fractal_dimension.expect("several box sizes");
        assert!(fd > 0.9 && fd < 2.0, "fd = {fd}");
        assert_eq!(rec.crae_knudtson, None);
    }

    #[test]
    fn scale_multiplies_calibres_only() {
        let img = mask(128, 32, |x, y| (10..110).contains(&x) && (14..19).contains(&y));
        let cfg = MetricConfig::default();
        let px = measure(&img, &whole(128, 32), None, VesselType::Binary, &cfg)[0].record;
        let um = measure(&img, &whole(128, 32), Some(10.0), VesselType::Binary, &cfg)[0].record;

        assert_eq!(um.average_local_calibre, Some(50.0));
        assert_eq!(um.average_global_calibre, Some(50.0));
        assert_eq!(um.tortuosity_density, px.tortuosity_density);
        assert_eq!(um.vessel_density, px.vessel_density);
        assert_eq!(um.fractal_dimension, px.fractal_dimension);
    }

    #[test]
    fn knudtson_uses_the_largest_whole_image_vessels() {
        let img = mask(128, 64, |x, y| {
            (10..110).contains(&x)
                && ((5..8).contains(&y) || (20..25).contains(&y) || (40..47).contains(&y))
        });
        let layout = whole(128, 64);

        let all = measure(&img, &layout, None, VesselType::Artery, &MetricConfig::default());
        let first = 0.88 * (7.0_f64 * 7.0 + 3.0 * 3.0).sqrt();
        let expected = 0.88 * (first * first + 5.0 * 5.0).sqrt();
        let crae = all[0].record.crae_knudtson.expect("three arteries");
        assert!((crae - expected).abs() < 1e-9);
        assert_eq!(all[0].record.crve_knudtson, None);

        let top_two = MetricConfig {
            whole_image_vessels: 2,
            ..MetricConfig::default()
        };
        let out = measure(&img, &layout, None, VesselType::Vein, &top_two);
        let crve = out[0].record.crve_knudtson.expect("two largest veins");
        assert!((crve - 0.95 * (49.0_f64 + 25.0).sqrt()).abs() < 1e-9);
    }

    #[test]
    fn annular_zones_use_every_qualifying_segment() {
        let img = mask(128, 128, |x, y| {
            (10..118).contains(&x) && ((30..33).contains(&y) || (90..97).contains(&y))
        });
        let disc = OpticDisc::new(Point2f::new(64.0, 64.0), 20.0);
        let layout = build_zones(128, 128, Some(disc), ScanLocation::OpticDisc);
        let cfg = MetricConfig {
            whole_image_vessels: 1,
            ..MetricConfig::default()
        };

        let out = measure(&img, &layout, None, VesselType::Artery, &cfg);
        let zones: Vec<Zone> = out.iter().map(|m| m.zone).collect();
        assert_eq!(zones, vec![Zone::Whole, Zone::B, Zone::C]);

        // One vessel left in the whole image after the top-1 cut.
        assert_eq!(out[0].record.crae_knudtson, None);
        assert_eq!(out[1].segments, 2);
        let crae = out[1].record.crae_knudtson.expect("both vessels cross zone B");
        assert!((crae - 0.88 * (49.0_f64 + 9.0).sqrt()).abs() < 1e-9);
    }

    #[test]
    fn empty_zone_has_no_density() {
        let img = mask(64, 64, |_, y| (30..33).contains(&y));
        let layout = ZoneLayout {
            width: 64,
            height: 64,
            location: ScanLocation::OpticDisc,
            disc: None,
            zones: vec![ZoneMask {
                zone: Zone::B,
                mask: Image::new_fill(64, 64, 0u8),
                area: 0,
            }],
            geometry_undefined: false,
        };

        let out = measure(&img, &layout, None, VesselType::Binary, &MetricConfig::default());
        let rec = out[0].record;
        assert_eq!(rec.vessel_density, None);
        assert_eq!(rec.fractal_dimension, None);
        assert_eq!(rec.tortuosity_density, None);
        assert_eq!(out[0].segments, 0);
    }

    #[test]
    fn tortuosity_distance_is_never_negative() {
        let img = mask(96, 96, |x, y| {
            let wave = 48.0 + 12.0 * ((x as f32) / 9.0).sin();
            let on_wave = (y as f32 - wave).abs() < 2.0 && (4..92).contains(&x);
            let straight = (70..92).contains(&x) && (10..13).contains(&y);
            on_wave || straight
        });
        let out = measure(&img, &whole(96, 96), None, VesselType::Binary, &MetricConfig::default());
        let td = out[0].record.tortuosity_distance.expect("open segments");
        assert!(td >= 0.0);
        assert!(td > 0.05, "a sine vessel is tortuous, got {td}");
    }

    #[test]
    fn mismatched_zone_layout_fails_fast() {
        let img = Image::new_fill(32, 32, 0u8);
        let layout = whole(16, 16);
        let err = compute_metrics(
            &img.as_view(),
            &[],
            &layout,
            None,
            VesselType::Binary,
            &MetricConfig::default(),
        )
        .expect_err("dims differ");
        assert!(matches!(err, Error::DimensionMismatch { .. }));
    }
}
