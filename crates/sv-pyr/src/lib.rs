//! Occupancy pyramids for box counting over binary masks.
//!
//! `sv-pyr` uses a fixed 2x2 "any" downsample: a destination pixel is set iff
//! at least one pixel of its 2x2 source block is foreground (`> 0`). Level `k`
//! therefore marks the occupied boxes of side `2^k` on a grid anchored at the
//! top-left corner of level 0.
//!
//! Pad-odd policy:
//! - Output size is `(ceil(src.width() / 2), ceil(src.height() / 2))`.
//! - If source width or height is odd, the last column/row forms a partial
//!   block on its own. No foreground pixel is ever dropped, so occupied-box
//!   counts stay exact at every level.

mod downsample;
mod pyramid;

pub use downsample::downsample2x2_any_u8;
pub use pyramid::OccupancyPyramid;
