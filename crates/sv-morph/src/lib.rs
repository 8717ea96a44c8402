//! Binary morphology for vessel masks.
//!
//! Pixels are treated as binary with threshold `> 0`.
//! - [`thin_guo_hall`] reduces a mask to a 1-pixel-wide skeleton that keeps
//!   endpoints and 8-connectivity. Output is `0` or `255` in `u8`.
//! - [`distance_to_background`] is the exact Euclidean distance from every
//!   foreground pixel centre to the nearest background pixel centre, with
//!   everything outside the image counted as background.

mod distance;
mod thin;

pub use distance::distance_to_background;
pub use thin::thin_guo_hall;
