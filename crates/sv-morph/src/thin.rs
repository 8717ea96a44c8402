use sv_core::mask::{FOREGROUND, is_foreground};
use sv_core::{Image, ImageView};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubIteration {
    First,
    Second,
}

/// Guo-Hall parallel thinning.
///
/// Each sub-iteration decides every deletion against the state left by the
/// previous sub-iteration, so the result does not depend on scan order.
/// Neighbour components are counted under 8-connectivity, which keeps
/// two-pixel-thick diagonal lines alive as one-pixel diagonals.
pub fn thin_guo_hall(src: &ImageView<'_, u8>) -> Image<u8> {
    let (width, height) = src.dims();
    if width == 0 || height == 0 {
        return Image::new_fill(width, height, 0u8);
    }

    // One pixel of zero padding so neighbour reads never leave the buffer.
    let pw = width + 2;
    let ph = height + 2;
    let mut buf = vec![0u8; pw * ph];
    let mut candidates = Vec::new();
    for y in 0..height {
        for (x, &v) in src.row(y).iter().enumerate() {
            if is_foreground(v) {
                let p = (y + 1) * pw + x + 1;
                buf[p] = 1;
                candidates.push(p);
            }
        }
    }

    let mut to_clear = Vec::new();
    loop {
        let mut changed = false;
        for pass in [SubIteration::First, SubIteration::Second] {
            to_clear.clear();
            for &p in &candidates {
                if buf[p] != 0 && is_deletable(&buf, p, pw, pass) {
                    to_clear.push(p);
                }
            }

            for &p in &to_clear {
                buf[p] = 0;
            }
            changed |= !to_clear.is_empty();
        }

        candidates.retain(|&p| buf[p] != 0);
        if !changed {
            break;
        }
    }

    Image::from_fn(width, height, |x, y| {
        if buf[(y + 1) * pw + x + 1] != 0 {
            FOREGROUND
        } else {
            0
        }
    })
}

#[inline]
fn is_deletable(buf: &[u8], p: usize, pw: usize, pass: SubIteration) -> bool {
    let on = |q: usize| buf[q] != 0;
    // P2..P9 clockwise from north.
    let (p2, p3, p4, p5) = (on(p - pw), on(p - pw + 1), on(p + 1), on(p + pw + 1));
    let (p6, p7, p8, p9) = (on(p + pw), on(p + pw - 1), on(p - 1), on(p - pw - 1));

    let components = usize::from(!p2 && (p3 || p4))
        + usize::from(!p4 && (p5 || p6))
        + usize::from(!p6 && (p7 || p8))
        + usize::from(!p8 && (p9 || p2));
    if components != 1 {
        return false;
    }

    let n1 = usize::from(p9 || p2)
        + usize::from(p3 || p4)
        + usize::from(p5 || p6)
        + usize::from(p7 || p8);
    let n2 = usize::from(p2 || p3)
        + usize::from(p4 || p5)
        + usize::from(p6 || p7)
        + usize::from(p8 || p9);
    if !(2..=3).contains(&n1.min(n2)) {
        return false;
    }

    let boundary = match pass {
        SubIteration::First => (p6 || p7 || !p9) && p8,
        SubIteration::Second => (p2 || p3 || !p5) && p4,
    };
    !boundary
}
