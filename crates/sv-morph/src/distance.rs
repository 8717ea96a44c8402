use sv_core::mask::is_foreground;
use sv_core::{Image, ImageView};

// Stand-in for +inf in the squared-distance lower envelope; keeps the
// parabola intersections finite.
const FAR: f64 = 1e20;

/// Exact Euclidean distance transform (Felzenszwalb-Huttenlocher).
///
/// Background pixels map to `0`; a foreground pixel maps to the distance
/// between its centre and the nearest background pixel centre. Pixels outside
/// the image count as background, so a foreground pixel on the border has
/// distance `1`.
pub fn distance_to_background(src: &ImageView<'_, u8>) -> Image<f32> {
    let (width, height) = src.dims();
    if width == 0 || height == 0 {
        return Image::new_fill(width, height, 0.0f32);
    }

    let pw = width + 2;
    let ph = height + 2;
    let mut grid = vec![0.0f64; pw * ph];
    for y in 0..height {
        for (x, &v) in src.row(y).iter().enumerate() {
            if is_foreground(v) {
                grid[(y + 1) * pw + x + 1] = FAR;
            }
        }
    }

    let n = pw.max(ph);
    let mut f = vec![0.0f64; n];
    let mut d = vec![0.0f64; n];
    let mut v = vec![0usize; n];
    let mut z = vec![0.0f64; n + 1];

    for x in 0..pw {
        for y in 0..ph {
            f[y] = grid[y * pw + x];
        }
        squared_distance_1d(&f[..ph], &mut d[..ph], &mut v, &mut z);
        for y in 0..ph {
            grid[y * pw + x] = d[y];
        }
    }

    for y in 0..ph {
        let row = &mut grid[y * pw..(y + 1) * pw];
        f[..pw].copy_from_slice(row);
        squared_distance_1d(&f[..pw], &mut d[..pw], &mut v, &mut z);
        row.copy_from_slice(&d[..pw]);
    }

    Image::from_fn(width, height, |x, y| grid[(y + 1) * pw + x + 1].sqrt() as f32)
}

/// Lower envelope of parabolas rooted at `(q, f[q])`.
fn squared_distance_1d(f: &[f64], d: &mut [f64], v: &mut [usize], z: &mut [f64]) {
    let n = f.len();
    if n == 0 {
        return;
    }

    let intersect = |q: usize, r: usize| -> f64 {
        let (qf, rf) = (q as f64, r as f64);
        ((f[q] + qf * qf) - (f[r] + rf * rf)) / (2.0 * qf - 2.0 * rf)
    };

    let mut k = 0usize;
    v[0] = 0;
    z[0] = f64::NEG_INFINITY;
    z[1] = f64::INFINITY;

    for q in 1..n {
        let mut s = intersect(q, v[k]);
        while k > 0 && s <= z[k] {
            k -= 1;
            s = intersect(q, v[k]);
        }
        k += 1;
        v[k] = q;
        z[k] = s;
        z[k + 1] = f64::INFINITY;
    }

    k = 0;
    for (q, dq) in d.iter_mut().enumerate().take(n) {
        while z[k + 1] < q as f64 {
            k += 1;
        }
        let delta = q as f64 - v[k] as f64;
        *dq = delta * delta + f[v[k]];
    }
}

#[cfg(test)]
mod tests {
    use sv_core::Image;

    use crate::distance_to_background;

    #[test]
    fn bar_centre_is_three_pixels_deep() {
        let img = Image::from_fn(30, 11, |x, y| {
            if (3..27).contains(&x) && (3..8).contains(&y) {
                255u8
            } else {
                0
            }
        });
        let dist = distance_to_background(&img.as_view());

        for x in 6..24 {
            assert_eq!(dist.get(x, 5), Some(&3.0));
            assert_eq!(dist.get(x, 4), Some(&2.0));
            assert_eq!(dist.get(x, 3), Some(&1.0));
        }
        assert_eq!(dist.get(0, 0), Some(&0.0));
        assert_eq!(dist.get(3, 3), Some(&1.0));
    }

    #[test]
    fn image_border_counts_as_background() {
        let img = Image::new_fill(7, 7, 255u8);
        let dist = distance_to_background(&img.as_view());

        assert_eq!(dist.get(0, 0), Some(&1.0));
        assert_eq!(dist.get(3, 3), Some(&4.0));
        assert_eq!(dist.get(1, 3), Some(&2.0));
    }

    #[test]
    fn diagonal_distance_is_euclidean() {
        // A single background pixel inside an all-foreground field.
        let img = Image::from_fn(9, 9, |x, y| if (x, y) == (2, 2) { 0u8 } else { 255 });
        let dist = distance_to_background(&img.as_view());

        let d = *dist.get(4, 4).expect("in bounds");
        assert!((d - 8.0_f32.sqrt()).abs() < 1e-6, "got {d}");
        assert_eq!(dist.get(2, 3), Some(&1.0));
    }
}
