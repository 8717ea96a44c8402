//! Foundational primitives for SLO vessel measurement.
//!
//! ## Image Views and Stride
//! Images use element stride (not byte stride). `stride` is the distance, in
//! elements, between adjacent row starts and may be greater than `width`.
//! This allows borrowed views over padded buffers and zone crops.
//!
//! ## Masks
//! Segmentation masks are `Image<u8>`; any value `> 0` is foreground. Mask
//! helpers in [`mask`] write `0` / `255`.
//!
//! ## Coordinates
//! Integer coordinates refer to pixel centres; `x` runs along a row and `y`
//! down the columns.

mod error;
mod geom;
mod image;
pub mod mask;

pub use error::Error;
pub use geom::{Point2f, Vec2f, arc_length};
pub use image::{Image, ImageView};
