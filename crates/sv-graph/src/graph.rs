use sv_core::Point2f;

pub type NodeId = usize;
pub type SegmentId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    End,
    Branch,
    Isolated,
    LoopAnchor,
}

/// A topological event on the skeleton.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub idx: (usize, usize),
    pub degree: usize,
    pub incident_segments: Vec<SegmentId>,
}

/// One traced vessel branch between two topological events.
///
/// `pixels` never contains a branch-point pixel: branch points bound a
/// segment from the outside.
#[derive(Debug, Clone)]
pub struct VesselSegment {
    pub id: SegmentId,
    pub a: NodeId,
    pub b: NodeId,
    pub pixels: Vec<(usize, usize)>,
    pub points: Vec<Point2f>,
    /// Local vessel width per sample, in pixels.
    pub widths: Option<Vec<f32>>,
    pub length: f32,
    pub chord: f32,
    pub is_loop: bool,
}

impl VesselSegment {
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Arc-to-chord excess, `None` for loops and single points.
    pub fn tortuosity(&self) -> Option<f32> {
        if self.is_loop || self.chord <= 0.0 {
            return None;
        }
        Some((self.length / self.chord - 1.0).max(0.0))
    }

    pub fn mean_width(&self) -> Option<f32> {
        let widths = self.widths.as_ref()?;
        if widths.is_empty() {
            return None;
        }
        Some(widths.iter().sum::<f32>() / widths.len() as f32)
    }
}

#[derive(Debug, Clone, Default)]
pub struct VesselGraph {
    pub width: usize,
    pub height: usize,
    pub nodes: Vec<Node>,
    pub segments: Vec<VesselSegment>,
}

impl VesselGraph {
    pub fn num_branch_points(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| n.kind == NodeKind::Branch)
            .count()
    }

    pub fn num_ends(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| n.kind == NodeKind::End)
            .count()
    }

    pub fn iter_branch_points(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.kind == NodeKind::Branch)
    }

    pub fn iter_segments(&self) -> impl Iterator<Item = &VesselSegment> {
        self.segments.iter()
    }

    pub fn total_length(&self) -> f32 {
        self.segments.iter().map(|s| s.length).sum()
    }
}
