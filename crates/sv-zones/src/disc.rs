use sv_core::mask::is_foreground;
use sv_core::{ImageView, Point2f};

/// Optic disc geometry in pixel-centre coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpticDisc {
    pub center: Point2f,
    pub radius: f32,
}

impl OpticDisc {
    pub fn new(center: Point2f, radius: f32) -> Self {
        Self { center, radius }
    }

    pub fn diameter(&self) -> f32 {
        2.0 * self.radius
    }

    /// Finite centre and a strictly positive, finite radius.
    pub fn is_valid(&self) -> bool {
        self.center.x.is_finite()
            && self.center.y.is_finite()
            && self.radius.is_finite()
            && self.radius > 0.0
    }
}

/// Disc geometry from a disc segmentation: centroid and equal-area radius.
///
/// Returns `None` for an empty mask.
pub fn estimate_optic_disc(mask: &ImageView<'_, u8>) -> Option<OpticDisc> {
    let mut area = 0_u64;
    let mut sx = 0.0_f64;
    let mut sy = 0.0_f64;

    for y in 0..mask.height() {
        for (x, &v) in mask.row(y).iter().enumerate() {
            if is_foreground(v) {
                area += 1;
                sx += x as f64;
                sy += y as f64;
            }
        }
    }

    if area == 0 {
        return None;
    }

    let n = area as f64;
    let radius = (n / std::f64::consts::PI).sqrt();
    Some(OpticDisc {
        center: Point2f::new((sx / n) as f32, (sy / n) as f32),
        radius: radius as f32,
    })
}

#[cfg(test)]
mod tests {
    use sv_core::{Image, Point2f};

    use super::{OpticDisc, estimate_optic_disc};

    #[test]
    fn filled_disc_recovers_centre_and_radius() {
        let (cx, cy, r) = (60.0_f32, 45.0_f32, 18.0_f32);
        let mask = Image::from_fn(128, 96, |x, y| {
            let dx = x as f32 - cx;
            let dy = y as f32 - cy;
            if dx * dx + dy * dy <= r * r { 255 } else { 0 }
        });

        let disc = estimate_optic_disc(&mask.as_view()).expect("non-empty mask");
        assert!((disc.center.x - cx).abs() < 1e-3);
        assert!((disc.center.y - cy).abs() < 1e-3);
        assert!((disc.radius - r).abs() < 0.5, "radius {}", disc.radius);
    }

    #[test]
    fn empty_mask_has_no_disc() {
        let mask = Image::new_fill(16, 16, 0u8);
        assert_eq!(estimate_optic_disc(&mask.as_view()), None);
    }

    #[test]
    fn degenerate_radius_is_invalid() {
        let c = Point2f::new(10.0, 10.0);
        assert!(OpticDisc::new(c, 4.0).is_valid());
        assert!(!OpticDisc::new(c, 0.0).is_valid());
        assert!(!OpticDisc::new(c, -3.0).is_valid());
        assert!(!OpticDisc::new(c, f32::NAN).is_valid());
        assert!(!OpticDisc::new(Point2f::new(f32::INFINITY, 0.0), 4.0).is_valid());
    }
}
