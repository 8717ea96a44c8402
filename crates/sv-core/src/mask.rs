//! Binary mask helpers.
//!
//! A mask is an `Image<u8>`; a pixel is foreground iff its value is `> 0`.
//! Derived masks are written as `0` / `255`.

use crate::{Error, Image, ImageView};

pub const FOREGROUND: u8 = 255;

#[inline]
pub fn is_foreground(v: u8) -> bool {
    v > 0
}

/// Fails with [`Error::DimensionMismatch`] unless `actual` has the `expected` size.
pub fn ensure_same_dims(
    what: &'static str,
    expected: (usize, usize),
    actual: (usize, usize),
) -> Result<(), Error> {
    if expected != actual {
        return Err(Error::DimensionMismatch {
            what,
            expected,
            actual,
        });
    }
    Ok(())
}

pub fn count_foreground(mask: &ImageView<'_, u8>) -> usize {
    (0..mask.height())
        .map(|y| mask.row(y).iter().filter(|&&v| is_foreground(v)).count())
        .sum()
}

pub fn full_mask(width: usize, height: usize) -> Image<u8> {
    Image::new_fill(width, height, FOREGROUND)
}

/// Pixel-wise `a ∩ b`.
pub fn intersect(a: &ImageView<'_, u8>, b: &ImageView<'_, u8>) -> Result<Image<u8>, Error> {
    combine(a, b, |pa, pb| pa && pb)
}

/// Pixel-wise `a ∪ b`.
pub fn union(a: &ImageView<'_, u8>, b: &ImageView<'_, u8>) -> Result<Image<u8>, Error> {
    combine(a, b, |pa, pb| pa || pb)
}

/// Pixel-wise `a ∖ b`.
pub fn subtract(a: &ImageView<'_, u8>, b: &ImageView<'_, u8>) -> Result<Image<u8>, Error> {
    combine(a, b, |pa, pb| pa && !pb)
}

fn combine(
    a: &ImageView<'_, u8>,
    b: &ImageView<'_, u8>,
    op: impl Fn(bool, bool) -> bool,
) -> Result<Image<u8>, Error> {
    ensure_same_dims("mask", a.dims(), b.dims())?;

    let mut data = Vec::with_capacity(a.width() * a.height());
    for y in 0..a.height() {
        for (&pa, &pb) in a.row(y).iter().zip(b.row(y)) {
            let set = op(is_foreground(pa), is_foreground(pb));
            data.push(if set { FOREGROUND } else { 0 });
        }
    }

    Image::from_vec(a.width(), a.height(), data)
}

/// Inclusive-exclusive bounding box `(x0, y0, x1, y1)` of the foreground.
pub fn bounding_box(mask: &ImageView<'_, u8>) -> Option<(usize, usize, usize, usize)> {
    let mut x0 = usize::MAX;
    let mut y0 = usize::MAX;
    let mut x1 = 0;
    let mut y1 = 0;

    for y in 0..mask.height() {
        for (x, &v) in mask.row(y).iter().enumerate() {
            if !is_foreground(v) {
                continue;
            }
            x0 = x0.min(x);
            y0 = y0.min(y);
            x1 = x1.max(x + 1);
            y1 = y1.max(y + 1);
        }
    }

    (x0 != usize::MAX).then_some((x0, y0, x1, y1))
}

#[cfg(test)]
mod tests {
    use super::{bounding_box, count_foreground, intersect, subtract, union};
    use crate::{Error, Image};

    fn mask(width: usize, height: usize, on: &[(usize, usize)]) -> Image<u8> {
        Image::from_fn(width, height, |x, y| if on.contains(&(x, y)) { 1 } else { 0 })
    }

    #[test]
    fn set_operations_treat_nonzero_as_foreground() {
        let a = mask(3, 3, &[(0, 0), (1, 1), (2, 2)]);
        let b = mask(3, 3, &[(1, 1), (2, 0)]);

        let i = intersect(&a.as_view(), &b.as_view()).expect("same dims");
        assert_eq!(count_foreground(&i.as_view()), 1);
        assert_eq!(i.get(1, 1), Some(&255));

        let u = union(&a.as_view(), &b.as_view()).expect("same dims");
        assert_eq!(count_foreground(&u.as_view()), 4);

        let s = subtract(&a.as_view(), &b.as_view()).expect("same dims");
        assert_eq!(count_foreground(&s.as_view()), 2);
        assert_eq!(s.get(1, 1), Some(&0));
    }

    #[test]
    fn mismatched_dims_fail_fast() {
        let a = mask(3, 3, &[]);
        let b = mask(4, 3, &[]);
        let err = union(&a.as_view(), &b.as_view()).expect_err("dims differ");
        assert!(matches!(
            err,
            Error::DimensionMismatch {
                expected: (3, 3),
                actual: (4, 3),
                ..
            }
        ));
    }

    #[test]
    fn bounding_box_of_sparse_mask() {
        let m = mask(8, 6, &[(2, 1), (5, 4)]);
        assert_eq!(bounding_box(&m.as_view()), Some((2, 1, 6, 5)));
        assert_eq!(bounding_box(&mask(4, 4, &[]).as_view()), None);
    }
}
