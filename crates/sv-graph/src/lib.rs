//! Vessel segment extraction from binary vessel masks.
//!
//! The mask is thinned to a one-pixel skeleton and cut into segments:
//! - Node pixels have degree `!= 2` under 8-connectivity, with a diagonal
//!   link dropped whenever an orthogonal path already joins the pair.
//! - Degree-2 pixels are traced as segment samples between nodes. Branch
//!   pixels themselves are left out of every segment.
//! - Pure loop components (all degree-2) become one loop segment anchored at
//!   a `LoopAnchor` node.
//!
//! Segments shorter than [`SegmentConfig::min_length`] are skeleton spurs and
//! are dropped. Local widths come from the distance map of the unthinned mask.

mod build;
mod graph;

pub use build::{SegmentConfig, build_graph_from_skeleton, extract_segments};
pub use graph::{Node, NodeId, NodeKind, SegmentId, VesselGraph, VesselSegment};
