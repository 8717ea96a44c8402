use sv_core::mask::{FOREGROUND, count_foreground, is_foreground};
use sv_core::{Image, ImageView};

use crate::downsample::downsample2x2_any_u8_into;

/// Reusable binary occupancy pyramid.
///
/// Level 0 is a `0`/`255` copy of the input. Each next level is a 2x2 "any"
/// downsample of the previous one, so level `k` holds one pixel per box of
/// side `2^k`.
///
/// Building stops early once a level is `1x1`.
#[derive(Debug, Default, Clone)]
pub struct OccupancyPyramid {
    levels: Vec<Image<u8>>,
}

impl OccupancyPyramid {
    pub fn new() -> Self {
        Self { levels: Vec::new() }
    }

    /// Ensures that internal buffers match the size chain implied by
    /// `(base_w, base_h, num_levels)`.
    ///
    /// Level dimensions are computed with ceiling halving:
    /// `(w, h), (ceil(w/2), ceil(h/2)), ...`.
    pub fn ensure(&mut self, base_w: usize, base_h: usize, num_levels: usize) {
        if num_levels == 0 {
            self.levels.clear();
            return;
        }

        self.levels.truncate(num_levels);
        self.levels
            .resize_with(num_levels, || Image::new_fill(0, 0, 0u8));

        let mut w = base_w;
        let mut h = base_h;
        for level in &mut self.levels {
            if level.width() != w || level.height() != h {
                *level = Image::new_fill(w, h, 0u8);
            }
            w = w.div_ceil(2);
            h = h.div_ceil(2);
        }
    }

    pub fn build(&mut self, src: &ImageView<'_, u8>, num_levels: usize) {
        let build_levels = max_build_levels(src.width(), src.height(), num_levels);
        if build_levels == 0 {
            self.levels.clear();
            return;
        }

        self.ensure(src.width(), src.height(), build_levels);
        copy_binary(src, &mut self.levels[0]);

        for level_idx in 1..build_levels {
            let (prev_levels, curr_and_tail) = self.levels.split_at_mut(level_idx);
            let prev = &prev_levels[level_idx - 1];
            let curr = &mut curr_and_tail[0];
            downsample2x2_any_u8_into(&prev.as_view(), curr);
        }
    }

    pub fn level(&self, i: usize) -> Option<&Image<u8>> {
        self.levels.get(i)
    }

    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    /// `(box_side, occupied_boxes)` for every built level.
    pub fn box_counts(&self) -> Vec<(usize, usize)> {
        self.levels
            .iter()
            .enumerate()
            .map(|(k, level)| (1usize << k, count_foreground(&level.as_view())))
            .collect()
    }
}

fn max_build_levels(base_w: usize, base_h: usize, requested_levels: usize) -> usize {
    if requested_levels == 0 || base_w == 0 || base_h == 0 {
        return 0;
    }

    let mut levels = 1usize;
    let mut w = base_w;
    let mut h = base_h;
    while levels < requested_levels && (w > 1 || h > 1) {
        w = w.div_ceil(2);
        h = h.div_ceil(2);
        levels += 1;
    }
    levels
}

fn copy_binary(src: &ImageView<'_, u8>, dst: &mut Image<u8>) {
    debug_assert_eq!(src.width(), dst.width());
    debug_assert_eq!(src.height(), dst.height());

    let dst_w = dst.width();
    let out = dst.data_mut();
    for y in 0..src.height() {
        let dst_row = &mut out[y * dst_w..(y + 1) * dst_w];
        for (d, &s) in dst_row.iter_mut().zip(src.row(y).iter()) {
            *d = if is_foreground(s) { FOREGROUND } else { 0 };
        }
    }
}
