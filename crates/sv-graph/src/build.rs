use log::debug;
use sv_core::mask::{ensure_same_dims, is_foreground, subtract};
use sv_core::{Error, Image, ImageView, Point2f, arc_length};
use sv_morph::{distance_to_background, thin_guo_hall};

use crate::graph::{Node, NodeId, NodeKind, VesselGraph, VesselSegment};

const DX: [isize; 8] = [1, 1, 0, -1, -1, -1, 0, 1];
const DY: [isize; 8] = [0, -1, -1, -1, 0, 1, 1, 1];
const DIRS: [u8; 8] = [0, 1, 2, 3, 4, 5, 6, 7];

#[derive(Debug, Clone, PartialEq)]
pub struct SegmentConfig {
    /// Segments with a shorter arc length (pixels) are skeleton artefacts.
    pub min_length: f32,
    pub record_widths: bool,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            min_length: 10.0,
            record_widths: true,
        }
    }
}

/// Splits a vessel mask into individual vessel segments.
///
/// Disc pixels are removed first, the rest is thinned, and the skeleton is
/// cut at every endpoint and branch point. Widths are read from the distance
/// map of the uncut mask so the disc margin does not narrow vessels running
/// into it. When `disc_center` is known each open segment starts at its end
/// nearest the disc.
pub fn extract_segments(
    vessel: &ImageView<'_, u8>,
    disc: Option<&ImageView<'_, u8>>,
    disc_center: Option<Point2f>,
    cfg: &SegmentConfig,
) -> Result<VesselGraph, Error> {
    let cleaned = match disc {
        Some(disc) => subtract(vessel, disc)?,
        None => vessel.to_image(),
    };

    let skeleton = thin_guo_hall(&cleaned.as_view());
    let distance = cfg
        .record_widths
        .then(|| distance_to_background(vessel));

    let mut graph =
        build_graph_from_skeleton(&skeleton.as_view(), distance.as_ref(), cfg.min_length)?;
    if let Some(center) = disc_center {
        orient_from(&mut graph, center);
    }

    debug!(
        "extract_segments: {}x{} mask -> {} segments, {} branch points, {} ends",
        graph.width,
        graph.height,
        graph.segments.len(),
        graph.num_branch_points(),
        graph.num_ends()
    );

    Ok(graph)
}

/// Builds the segment graph of an already thinned mask.
///
/// `distance` is the distance-to-background map of the unthinned mask; when
/// given, each sample gets a local width measured across the centreline
/// (see [`local_width`]).
pub fn build_graph_from_skeleton(
    skeleton: &ImageView<'_, u8>,
    distance: Option<&Image<f32>>,
    min_length: f32,
) -> Result<VesselGraph, Error> {
    let (width, height) = skeleton.dims();
    if let Some(distance) = distance {
        ensure_same_dims("distance map", skeleton.dims(), distance.dims())?;
    }

    let empty = VesselGraph {
        width,
        height,
        nodes: Vec::new(),
        segments: Vec::new(),
    };
    let Some(n) = width.checked_mul(height) else {
        return Ok(empty);
    };
    if n == 0 {
        return Ok(empty);
    }

    let mut active = vec![0_u8; n];
    for y in 0..height {
        for (x, &v) in skeleton.row(y).iter().enumerate() {
            if is_foreground(v) {
                active[y * width + x] = 1;
            }
        }
    }

    let mut deg = vec![0_u8; n];
    for p in 0..n {
        if active[p] == 0 {
            continue;
        }
        let d = DIRS
            .iter()
            .filter(|&&dir| connected_neighbor(p, dir, &active, width, height).is_some())
            .count();
        deg[p] = d as u8;
    }

    let mut nodes = Vec::new();
    let mut node_at: Vec<Option<NodeId>> = vec![None; n];
    for p in 0..n {
        if active[p] == 0 || deg[p] == 2 {
            continue;
        }

        let node_id = nodes.len();
        node_at[p] = Some(node_id);
        nodes.push(Node {
            id: node_id,
            kind: kind_from_degree(deg[p]),
            idx: (p % width, p / width),
            degree: deg[p] as usize,
            incident_segments: Vec::new(),
        });
    }

    let mut chains = Vec::new();
    let mut used_link = vec![0_u8; n];

    let mut start_node = 0_usize;
    while start_node < nodes.len() {
        let (sx, sy) = nodes[start_node].idx;
        let start_idx = sy * width + sx;

        for &dir in &DIRS {
            let Some(first) = connected_neighbor(start_idx, dir, &active, width, height) else {
                continue;
            };
            if is_link_used(&used_link, start_idx, dir) {
                continue;
            }

            let chain = trace_chain(
                start_idx,
                first,
                dir,
                &active,
                &node_at,
                &mut used_link,
                width,
                height,
            );

            let end_node = match chain.end {
                Some(id) => id,
                None => ensure_terminal_node(
                    chain.last(),
                    &mut node_at,
                    &mut nodes,
                    &deg,
                    width,
                    NodeKind::End,
                ),
            };

            chains.push(RawSegment {
                a: start_node,
                b: end_node,
                pixels: chain.pixels,
                closed: chain.closed,
            });
        }

        start_node += 1;
    }

    // Closed vessel loops have no degree != 2 pixel to start from.
    for p in 0..n {
        if active[p] == 0 {
            continue;
        }

        for &dir in &DIRS {
            let Some(next) = connected_neighbor(p, dir, &active, width, height) else {
                continue;
            };
            if is_link_used(&used_link, p, dir) {
                continue;
            }

            let anchor = ensure_terminal_node(
                p,
                &mut node_at,
                &mut nodes,
                &deg,
                width,
                NodeKind::LoopAnchor,
            );
            let chain = trace_chain(
                p,
                next,
                dir,
                &active,
                &node_at,
                &mut used_link,
                width,
                height,
            );

            let b = if chain.closed {
                anchor
            } else {
                match chain.end {
                    Some(id) => id,
                    None => ensure_terminal_node(
                        chain.last(),
                        &mut node_at,
                        &mut nodes,
                        &deg,
                        width,
                        NodeKind::End,
                    ),
                }
            };

            chains.push(RawSegment {
                a: anchor,
                b,
                pixels: chain.pixels,
                closed: chain.closed,
            });
        }
    }

    let mut segments = Vec::new();
    for raw in chains {
        let Some(mut segment) = finish_segment(raw, &nodes, distance, width) else {
            continue;
        };
        if segment.length < min_length {
            continue;
        }

        segment.id = segments.len();
        segments.push(segment);
    }

    for segment in &segments {
        nodes[segment.a].incident_segments.push(segment.id);
        if segment.a != segment.b {
            nodes[segment.b].incident_segments.push(segment.id);
        }
    }

    Ok(VesselGraph {
        width,
        height,
        nodes,
        segments,
    })
}

struct RawSegment {
    a: NodeId,
    b: NodeId,
    pixels: Vec<usize>,
    closed: bool,
}

struct Chain {
    pixels: Vec<usize>,
    end: Option<NodeId>,
    closed: bool,
}

impl Chain {
    fn last(&self) -> usize {
        self.pixels[self.pixels.len() - 1]
    }
}

fn finish_segment(
    raw: RawSegment,
    nodes: &[Node],
    distance: Option<&Image<f32>>,
    width: usize,
) -> Option<VesselSegment> {
    let RawSegment {
        a,
        b,
        mut pixels,
        closed,
    } = raw;

    // Branch pixels bound segments but never belong to them.
    if nodes[a].kind == NodeKind::Branch && !pixels.is_empty() {
        pixels.remove(0);
    }
    if !closed && nodes[b].kind == NodeKind::Branch {
        let (bx, by) = nodes[b].idx;
        if pixels.last() == Some(&(by * width + bx)) {
            pixels.pop();
        }
    }
    if pixels.is_empty() {
        return None;
    }

    let pixels: Vec<(usize, usize)> = pixels.iter().map(|&p| (p % width, p / width)).collect();
    let points: Vec<Point2f> = pixels.iter().map(|&idx| Point2f::from_idx(idx)).collect();
    let widths = distance.map(|dist| {
        (0..pixels.len())
            .map(|i| local_width(dist, &pixels, i))
            .collect()
    });

    let is_loop = closed;
    let length = arc_length(&points, is_loop);
    let chord = if is_loop {
        0.0
    } else {
        points[0].distance(points[points.len() - 1])
    };

    Some(VesselSegment {
        id: 0,
        a,
        b,
        pixels,
        points,
        widths,
        length,
        chord,
        is_loop,
    })
}

/// Samples on either side of `i` spanned by the local tangent.
const TANGENT_REACH: usize = 2;
const TAN_PI_8: f32 = 0.414_213_57;

/// Vessel width at sample `i` of a segment, in pixels.
///
/// Each side reaches the nearest background centre less a half-pixel margin,
/// shrunk for diagonal normals. The near side comes from the sample's own
/// distance. The far side is the larger of that and what the neighbour across
/// the centreline sees plus the step to it, which recovers the extra pixel of
/// even-width vessels whose skeleton sits off-centre.
fn local_width(dist: &Image<f32>, pixels: &[(usize, usize)], i: usize) -> f32 {
    let (x, y) = pixels[i];
    let d = dist.get(x, y).copied().unwrap_or(0.0);

    let lo = pixels[i.saturating_sub(TANGENT_REACH)];
    let hi = pixels[(i + TANGENT_REACH).min(pixels.len() - 1)];
    let tx = hi.0 as f32 - lo.0 as f32;
    let ty = hi.1 as f32 - lo.1 as f32;
    let Some((sx, sy)) = normal_step(tx, ty) else {
        return (2.0 * d - 1.0).max(0.0);
    };

    let step = ((sx * sx + sy * sy) as f32).sqrt();
    let half = 0.5 / step;
    let near = d - half;
    let mut far = near;
    for sign in [1_isize, -1] {
        let qx = x as isize + sign * sx;
        let qy = y as isize + sign * sy;
        if qx < 0 || qy < 0 {
            continue;
        }
        if let Some(&dq) = dist.get(qx as usize, qy as usize)
            && dq > 0.0
        {
            far = far.max(dq - half + step);
        }
    }

    (near + far).max(0.0)
}

/// Unit pixel step closest to the normal of the tangent `(tx, ty)`.
fn normal_step(tx: f32, ty: f32) -> Option<(isize, isize)> {
    let (nx, ny) = (-ty, tx);
    let major = nx.abs().max(ny.abs());
    if major == 0.0 {
        return None;
    }

    // Components below tan(22.5 deg) of the major one snap to zero.
    let snap = |c: f32| {
        if c.abs() <= TAN_PI_8 * major {
            0
        } else if c > 0.0 {
            1
        } else {
            -1
        }
    };
    Some((snap(nx), snap(ny)))
}

/// Reverses open segments whose far end lies closer to `center`.
fn orient_from(graph: &mut VesselGraph, center: Point2f) {
    for segment in &mut graph.segments {
        if segment.is_loop || segment.points.len() < 2 {
            continue;
        }

        let first = segment.points[0].distance(center);
        let last = segment.points[segment.points.len() - 1].distance(center);
        if last < first {
            segment.pixels.reverse();
            segment.points.reverse();
            if let Some(widths) = &mut segment.widths {
                widths.reverse();
            }
            std::mem::swap(&mut segment.a, &mut segment.b);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn trace_chain(
    start: usize,
    first: usize,
    start_dir: u8,
    active: &[u8],
    node_at: &[Option<NodeId>],
    used_link: &mut [u8],
    width: usize,
    height: usize,
) -> Chain {
    let mut pixels = vec![start];
    let mut prev = start;
    let mut cur = first;
    let mut dir = start_dir;
    let mut end = None;
    let mut closed = false;

    let max_steps = active.len().max(1);
    for _ in 0..max_steps {
        mark_link_both(used_link, prev, dir, cur);

        if cur == start {
            closed = true;
            end = node_at[start];
            break;
        }

        pixels.push(cur);
        if node_at[cur].is_some() {
            end = node_at[cur];
            break;
        }

        let Some((next_dir, next)) =
            find_next_neighbor(cur, prev, active, used_link, width, height)
        else {
            break;
        };

        if next == start {
            mark_link_both(used_link, cur, next_dir, start);
            closed = true;
            end = node_at[start];
            break;
        }

        prev = cur;
        cur = next;
        dir = next_dir;
    }

    Chain {
        pixels,
        end,
        closed,
    }
}

fn find_next_neighbor(
    cur: usize,
    prev: usize,
    active: &[u8],
    used_link: &[u8],
    width: usize,
    height: usize,
) -> Option<(u8, usize)> {
    let mut fallback = None;
    for &dir in &DIRS {
        let Some(nb) = connected_neighbor(cur, dir, active, width, height) else {
            continue;
        };
        if nb == prev {
            continue;
        }

        if !is_link_used(used_link, cur, dir) {
            return Some((dir, nb));
        }

        if fallback.is_none() {
            fallback = Some((dir, nb));
        }
    }

    fallback
}

fn ensure_terminal_node(
    pixel: usize,
    node_at: &mut [Option<NodeId>],
    nodes: &mut Vec<Node>,
    deg: &[u8],
    width: usize,
    fallback_kind: NodeKind,
) -> NodeId {
    if let Some(id) = node_at[pixel] {
        return id;
    }

    let degree = deg[pixel] as usize;
    let kind = match degree {
        0 => NodeKind::Isolated,
        1 => NodeKind::End,
        2 => fallback_kind,
        _ => NodeKind::Branch,
    };

    let node_id = nodes.len();
    node_at[pixel] = Some(node_id);
    nodes.push(Node {
        id: node_id,
        kind,
        idx: (pixel % width, pixel / width),
        degree,
        incident_segments: Vec::new(),
    });

    node_id
}

fn kind_from_degree(d: u8) -> NodeKind {
    match d {
        0 => NodeKind::Isolated,
        1 => NodeKind::End,
        _ => NodeKind::Branch,
    }
}

#[inline]
fn opposite_dir(dir: u8) -> u8 {
    (dir + 4) & 7
}

#[inline]
fn is_link_used(used_link: &[u8], p: usize, dir: u8) -> bool {
    let bit = 1_u8 << dir;
    (used_link[p] & bit) != 0
}

#[inline]
fn mark_link_both(used_link: &mut [u8], a: usize, dir_ab: u8, b: usize) {
    used_link[a] |= 1_u8 << dir_ab;
    used_link[b] |= 1_u8 << opposite_dir(dir_ab);
}

#[inline]
fn neighbor_index(p: usize, dir: u8, width: usize, height: usize) -> Option<usize> {
    let x = p % width;
    let y = p / width;
    index_if_in_bounds(
        x as isize + DX[dir as usize],
        y as isize + DY[dir as usize],
        width,
        height,
    )
}

/// 8-neighbour link, except that a diagonal is dropped when an orthogonal
/// two-step path already joins the pair.
#[inline]
fn connected_neighbor(
    p: usize,
    dir: u8,
    occupancy: &[u8],
    width: usize,
    height: usize,
) -> Option<usize> {
    let nb = neighbor_index(p, dir, width, height)?;
    if occupancy[nb] == 0 {
        return None;
    }

    if is_diagonal_dir(dir) {
        let x = p % width;
        let y = p / width;
        let dx = DX[dir as usize];
        let dy = DY[dir as usize];

        let side_a = index_if_in_bounds(x as isize + dx, y as isize, width, height);
        let side_b = index_if_in_bounds(x as isize, y as isize + dy, width, height);
        if side_a.is_some_and(|i| occupancy[i] != 0) || side_b.is_some_and(|i| occupancy[i] != 0) {
            return None;
        }
    }

    Some(nb)
}

#[inline]
fn is_diagonal_dir(dir: u8) -> bool {
    DX[dir as usize] != 0 && DY[dir as usize] != 0
}

#[inline]
fn index_if_in_bounds(x: isize, y: isize, width: usize, height: usize) -> Option<usize> {
    if x < 0 || y < 0 {
        return None;
    }

    let (xu, yu) = (x as usize, y as usize);
    if xu >= width || yu >= height {
        return None;
    }

    Some(yu * width + xu)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use sv_core::{Error, Image, Point2f};

    use crate::{NodeKind, SegmentConfig, VesselGraph, extract_segments};

    fn mask(width: usize, height: usize, f: impl Fn(usize, usize) -> bool) -> Image<u8> {
        Image::from_fn(width, height, |x, y| if f(x, y) { 255 } else { 0 })
    }

    fn extract(img: &Image<u8>) -> VesselGraph {
        extract_segments(&img.as_view(), None, None, &SegmentConfig::default())
            .expect("congruent inputs")
    }

    fn assert_no_branch_pixels(g: &VesselGraph) {
        let branch: HashSet<(usize, usize)> = g.iter_branch_points().map(|n| n.idx).collect();
        for seg in g.iter_segments() {
            assert!(
                seg.pixels.iter().all(|p| !branch.contains(p)),
                "segment {} crosses a branch point",
                seg.id
            );
        }
    }

    #[test]
    fn thin_t_junction_splits_into_three_arms() {
        let img = mask(50, 50, |x, y| {
            (x == 10 && (2..=40).contains(&y)) || (y == 20 && (11..=40).contains(&x))
        });
        let g = extract(&img);

        assert_eq!(g.num_branch_points(), 1);
        assert_eq!(g.num_ends(), 3);
        let j = g.iter_branch_points().next().expect("branch point");
        // Thinning cuts the corner, so the junction sits on the arm.
        assert_eq!(j.idx, (11, 20));
        assert_eq!(j.degree, 3);
        assert_eq!(j.incident_segments.len(), 3);

        let lens: Vec<usize> = g.iter_segments().map(|s| s.len()).collect();
        assert_eq!(lens, vec![18, 29, 20]);
        let arcs: Vec<f32> = g.iter_segments().map(|s| s.length).collect();
        assert_eq!(arcs, vec![17.0, 28.0, 19.0]);

        assert_no_branch_pixels(&g);
    }

    #[test]
    fn thick_t_junction_keeps_branch_points_outside_segments() {
        let img = mask(50, 50, |x, y| {
            let stem = (8..13).contains(&x) && (2..46).contains(&y);
            let arm = (13..46).contains(&x) && (18..23).contains(&y);
            stem || arm
        });
        let g = extract(&img);

        assert_eq!(g.segments.len(), 3);
        assert_eq!(g.num_branch_points(), 1);
        let sqrt2 = std::f32::consts::SQRT_2;
        let arcs: Vec<f32> = g.iter_segments().map(|s| s.length).collect();
        let expected = [14.0 + sqrt2, 30.0, 21.0 + sqrt2];
        for (arc, want) in arcs.iter().zip(expected) {
            assert!((arc - want).abs() < 1e-3, "arcs {arcs:?}");
        }
        assert_no_branch_pixels(&g);

        // Away from the junction the arm reads its true width.
        let arm = &g.segments[1];
        assert!(arm.widths.as_ref().expect("widths recorded").iter().all(|&w| w == 5.0));
        assert!(g.iter_segments().all(|s| s.length >= 10.0));
    }

    #[test]
    fn straight_bar_is_one_segment_of_constant_width() {
        let img = mask(110, 15, |x, y| (5..105).contains(&x) && (5..10).contains(&y));
        let g = extract(&img);

        assert_eq!(g.segments.len(), 1);
        let seg = &g.segments[0];
        assert_eq!(seg.len(), 96);
        assert_eq!(seg.length, 95.0);
        assert_eq!(seg.chord, 95.0);
        assert_eq!(seg.tortuosity(), Some(0.0));
        assert_eq!(g.total_length(), 95.0);

        let widths = seg.widths.as_ref().expect("widths recorded");
        assert!(widths.iter().all(|&w| w == 5.0), "widths {widths:?}");
        assert_eq!(seg.mean_width(), Some(5.0));
    }

    #[test]
    fn even_width_bars_measure_their_full_width() {
        for (rows, pixels, expected) in [(5..9, 97, 4.0), (5..7, 99, 2.0)] {
            let img = mask(110, 15, |x, y| (5..105).contains(&x) && rows.contains(&y));
            let g = extract(&img);

            assert_eq!(g.segments.len(), 1);
            let seg = &g.segments[0];
            assert_eq!(seg.len(), pixels);
            let widths = seg.widths.as_ref().expect("widths recorded");
            assert!(widths.iter().all(|&w| w == expected), "widths {widths:?}");
        }
    }

    #[test]
    fn two_pixel_diagonal_is_one_segment() {
        let img = mask(60, 60, |x, y| (5..55).contains(&x) && (y == x || y == x + 1));
        let g = extract(&img);

        assert_eq!(g.segments.len(), 1);
        let seg = &g.segments[0];
        assert_eq!(seg.len(), 51);
        // 49 diagonal steps and one straight step.
        assert!((seg.length - (49.0 * std::f32::consts::SQRT_2 + 1.0)).abs() < 1e-3);

        // Two pixels per column lie sqrt(2) across the vessel.
        let mean = seg.mean_width().expect("widths recorded");
        assert!((mean - std::f32::consts::SQRT_2).abs() < 0.2, "mean width {mean}");
    }

    #[test]
    fn three_pixel_diagonal_is_one_segment() {
        let img = mask(60, 60, |x, y| (5..55).contains(&x) && (x..x + 3).contains(&y));
        let g = extract(&img);

        assert_eq!(g.segments.len(), 1);
        let seg = &g.segments[0];
        assert_eq!(seg.len(), 52);
        assert!((seg.length - (49.0 * std::f32::consts::SQRT_2 + 2.0)).abs() < 1e-3);

        let mean = seg.mean_width().expect("widths recorded");
        let across = 3.0 / std::f32::consts::SQRT_2;
        assert!((mean - across).abs() < 0.2, "mean width {mean}");
    }

    #[test]
    fn disc_margin_does_not_narrow_the_vessel() {
        let img = mask(40, 80, |x, _| (18..23).contains(&x));
        let disc = mask(40, 80, |_, y| (36..=44).contains(&y));

        let g = extract_segments(
            &img.as_view(),
            Some(&disc.as_view()),
            Some(Point2f::new(20.0, 40.0)),
            &SegmentConfig::default(),
        )
        .expect("congruent inputs");

        assert_eq!(g.segments.len(), 2);
        for seg in g.iter_segments() {
            let widths = seg.widths.as_ref().expect("widths recorded");
            assert!(widths.iter().all(|&w| w == 5.0), "widths {widths:?}");
        }
    }

    #[test]
    fn short_spurs_are_discarded() {
        let img = mask(50, 50, |x, y| {
            (x == 10 && (2..=40).contains(&y)) || (y == 20 && (11..=15).contains(&x))
        });
        let g = extract(&img);

        assert_eq!(g.num_branch_points(), 1);
        assert_eq!(g.segments.len(), 2);
        assert!(g.iter_segments().all(|s| s.length >= 10.0));

        let strict = SegmentConfig {
            min_length: 18.0,
            ..SegmentConfig::default()
        };
        let g = extract_segments(&img.as_view(), None, None, &strict).expect("congruent");
        assert_eq!(g.segments.len(), 1);
        assert_eq!(g.segments[0].length, 19.0);
    }

    #[test]
    fn empty_mask_has_no_segments() {
        let img = Image::new_fill(64, 48, 0u8);
        let g = extract(&img);
        assert!(g.segments.is_empty());
        assert!(g.nodes.is_empty());
    }

    #[test]
    fn disc_pixels_are_excluded_and_segments_start_near_disc() {
        let img = mask(40, 60, |x, _| x == 20);
        let disc = mask(40, 60, |_, y| (25..=35).contains(&y));
        let center = Point2f::new(20.0, 30.0);

        let g = extract_segments(
            &img.as_view(),
            Some(&disc.as_view()),
            Some(center),
            &SegmentConfig::default(),
        )
        .expect("congruent inputs");

        assert_eq!(g.segments.len(), 2);
        let upper = &g.segments[0];
        assert_eq!(upper.pixels.first(), Some(&(20, 24)));
        assert_eq!(upper.pixels.last(), Some(&(20, 0)));
        assert_eq!(upper.length, 24.0);

        let lower = &g.segments[1];
        assert_eq!(lower.pixels.first(), Some(&(20, 36)));
        assert_eq!(lower.pixels.last(), Some(&(20, 59)));
        assert!(g.iter_segments().flat_map(|s| s.pixels.iter()).all(|&(_, y)| !(25..=35).contains(&y)));
    }

    #[test]
    fn ring_becomes_a_single_loop() {
        let img = mask(50, 50, |x, y| {
            let r = ((x as f32 - 25.0).powi(2) + (y as f32 - 25.0).powi(2)).sqrt();
            (10.0..=14.0).contains(&r)
        });
        let g = extract(&img);

        assert_eq!(g.segments.len(), 1);
        let seg = &g.segments[0];
        assert!(seg.is_loop);
        assert_eq!(seg.a, seg.b);
        assert_eq!(seg.chord, 0.0);
        assert_eq!(seg.tortuosity(), None);
        assert_eq!(g.nodes[seg.a].kind, NodeKind::LoopAnchor);
        assert!(seg.length > 2.0 * std::f32::consts::PI * 11.0);
    }

    #[test]
    fn extraction_is_idempotent() {
        let img = mask(80, 80, |x, y| {
            let horizontal = (38..43).contains(&y) && (5..75).contains(&x);
            let vertical = (20..24).contains(&x) && (5..75).contains(&y);
            let diagonal = x.abs_diff(y) <= 1 && (45..75).contains(&x);
            horizontal || vertical || diagonal
        });

        let first = extract(&img);
        let second = extract(&img);
        assert!(!first.segments.is_empty());

        let pixels = |g: &VesselGraph| -> Vec<Vec<(usize, usize)>> {
            g.iter_segments().map(|s| s.pixels.clone()).collect()
        };
        assert_eq!(pixels(&first), pixels(&second));
        assert_no_branch_pixels(&first);
    }

    #[test]
    fn mismatched_disc_mask_fails_fast() {
        let img = Image::new_fill(32, 32, 0u8);
        let disc = Image::new_fill(16, 32, 0u8);
        let err = extract_segments(
            &img.as_view(),
            Some(&disc.as_view()),
            None,
            &SegmentConfig::default(),
        )
        .expect_err("dims differ");
        assert!(matches!(err, Error::DimensionMismatch { .. }));
    }
}
