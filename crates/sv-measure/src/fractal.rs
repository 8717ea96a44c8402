use sv_core::ImageView;
use sv_pyr::OccupancyPyramid;

/// Occupied box counts `(side, N(side))` for sides `1, 2, 4, ..` up to the
/// largest power of two not exceeding the shorter image side.
///
/// Boxes are anchored at the top-left corner; partial boxes at the right and
/// bottom edges count like full ones.
pub fn box_counts(mask: &ImageView<'_, u8>) -> Vec<(usize, usize)> {
    let side = mask.width().min(mask.height());
    if side == 0 {
        return Vec::new();
    }

    let levels = side.ilog2() as usize + 1;
    let mut pyr = OccupancyPyramid::new();
    pyr.build(mask, levels);
    pyr.box_counts()
}

/// Box-counting (Minkowski-Bouligand) dimension of a binary mask.
///
/// Least-squares slope of `ln N(s)` against `ln(1/s)` over box sizes with at
/// least one occupied box. `None` when fewer than two sizes qualify.
pub fn fractal_dimension(mask: &ImageView<'_, u8>) -> Option<f64> {
    let samples: Vec<(f64, f64)> = box_counts(mask)
        .into_iter()
        .filter(|&(_, n)| n > 0)
        .map(|(s, n)| (-(s as f64).ln(), (n as f64).ln()))
        .collect();

    least_squares_slope(&samples)
}

fn least_squares_slope(samples: &[(f64, f64)]) -> Option<f64> {
    if samples.len() < 2 {
        return None;
    }

    let n = samples.len() as f64;
    let mean_x = samples.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = samples.iter().map(|p| p.1).sum::<f64>() / n;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for &(x, y) in samples {
        sxx += (x - mean_x) * (x - mean_x);
        sxy += (x - mean_x) * (y - mean_y);
    }

    if sxx <= f64::EPSILON {
        return None;
    }
    Some(sxy / sxx)
}
