use sv_core::mask::{FOREGROUND, is_foreground};
use sv_core::{Image, ImageView};

#[inline]
fn dst_dims(src_w: usize, src_h: usize) -> (usize, usize) {
    (src_w.div_ceil(2), src_h.div_ceil(2))
}

pub fn downsample2x2_any_u8(src: &ImageView<'_, u8>) -> Image<u8> {
    let (dst_w, dst_h) = dst_dims(src.width(), src.height());
    let mut dst = Image::new_fill(dst_w, dst_h, 0u8);
    downsample2x2_any_u8_into(src, &mut dst);
    dst
}

pub(crate) fn downsample2x2_any_u8_into(src: &ImageView<'_, u8>, dst: &mut Image<u8>) {
    let (dst_w, dst_h) = dst_dims(src.width(), src.height());
    debug_assert_eq!(dst.width(), dst_w);
    debug_assert_eq!(dst.height(), dst_h);

    if dst_w == 0 || dst_h == 0 {
        return;
    }

    if src.is_contiguous()
        && src.width().is_multiple_of(2)
        && src.height().is_multiple_of(2)
        && let Some(src_contig) = src.as_contiguous_slice()
    {
        downsample_any_contiguous_even(src_contig, src.width(), dst.data_mut(), dst_w, dst_h);
        return;
    }

    downsample_any_fallback(src, dst.data_mut(), dst_w, dst_h);
}

fn downsample_any_contiguous_even(
    src: &[u8],
    src_w: usize,
    dst: &mut [u8],
    dst_w: usize,
    dst_h: usize,
) {
    for y in 0..dst_h {
        let row0 = &src[(2 * y) * src_w..(2 * y + 1) * src_w];
        let row1 = &src[(2 * y + 1) * src_w..(2 * y + 2) * src_w];
        let dst_row = &mut dst[y * dst_w..(y + 1) * dst_w];
        for (x, out) in dst_row.iter_mut().enumerate() {
            let sx = 2 * x;
            let any = (row0[sx] | row0[sx + 1] | row1[sx] | row1[sx + 1]) != 0;
            *out = if any { FOREGROUND } else { 0 };
        }
    }
}

fn downsample_any_fallback(src: &ImageView<'_, u8>, dst: &mut [u8], dst_w: usize, dst_h: usize) {
    for y in 0..dst_h {
        let y0 = 2 * y;
        let y1 = (y0 + 1).min(src.height() - 1);
        let row0 = src.row(y0);
        let row1 = src.row(y1);
        let dst_row = &mut dst[y * dst_w..(y + 1) * dst_w];
        for (x, out) in dst_row.iter_mut().enumerate() {
            let x0 = 2 * x;
            let x1 = (x0 + 1).min(src.width() - 1);
            let any = is_foreground(row0[x0])
                || is_foreground(row0[x1])
                || is_foreground(row1[x0])
                || is_foreground(row1[x1]);
            *out = if any { FOREGROUND } else { 0 };
        }
    }
}

#[cfg(test)]
mod tests {
    use sv_core::Image;

    use crate::downsample::downsample2x2_any_u8;

    #[test]
    fn any_rule_on_4x4_known_values() {
        let src = Image::from_vec(
            4,
            4,
            vec![
                0u8, 0, 0, 0, //
                0, 1, 0, 0, //
                0, 0, 0, 0, //
                0, 0, 0, 9, //
            ],
        )
        .expect("valid image");

        let dst = downsample2x2_any_u8(&src.as_view());
        assert_eq!(dst.dims(), (2, 2));
        assert_eq!(dst.data(), &[255, 0, 0, 255]);
    }

    #[test]
    fn odd_dimensions_keep_last_row_col() {
        let src = Image::from_vec(
            5,
            3,
            vec![
                0u8, 0, 0, 0, 0, //
                0, 0, 0, 0, 0, //
                0, 0, 0, 0, 1, //
            ],
        )
        .expect("valid image");

        let dst = downsample2x2_any_u8(&src.as_view());
        assert_eq!(dst.dims(), (3, 2));
        assert_eq!(dst.data(), &[0, 0, 0, 0, 0, 255]);
    }

    #[test]
    fn downsample_non_contiguous_view() {
        let src = Image::from_fn(6, 4, |x, y| u8::from((x, y) == (4, 2)));
        let sub = src.as_view().subview(1, 1, 4, 2).expect("valid subview");
        assert!(!sub.is_contiguous());

        let dst = downsample2x2_any_u8(&sub);
        assert_eq!(dst.dims(), (2, 1));
        assert_eq!(dst.data(), &[0, 255]);
    }
}
