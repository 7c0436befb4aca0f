//! Point KD-tree over photons for fixed-radius gathering.
//!
//! One photon per node: each level partitions its range around the median
//! on the current axis (cycling x, y, z) and keeps the median photon. Node
//! boxes are exact (unpadded) unions of the subtree's positions, so pruning
//! by box distance never drops a photon inside the radius.

use crate::photon::Photon;
use lumen_math::{Aabb, Vec3};

/// Ranges at least this long are built with `rayon::join`.
const PARALLEL_THRESHOLD: usize = 8192;

#[derive(Debug, Clone)]
struct PhotonNode {
    photon: Photon,
    bbox: Aabb,
    left: Option<usize>,
    right: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct PhotonTree {
    nodes: Vec<PhotonNode>,
    root: Option<usize>,
}

impl PhotonTree {
    pub fn new(mut photons: Vec<Photon>) -> Self {
        let nodes = build(&mut photons, 0);
        let root = nodes.len().checked_sub(1);
        Self { nodes, root }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Every photon within `radius` of `point` (boundary included).
    pub fn collect(&self, point: Vec3, radius: f32) -> Vec<Photon> {
        let mut out = Vec::new();
        self.collect_into(point, radius, &mut out);
        out
    }

    /// Like [`PhotonTree::collect`], appending to `out`.
    pub fn collect_into(&self, point: Vec3, radius: f32, out: &mut Vec<Photon>) {
        self.for_each_within(point, radius, |photon| out.push(*photon));
    }

    /// Visit every photon within `radius` of `point`.
    pub fn for_each_within<F: FnMut(&Photon)>(&self, point: Vec3, radius: f32, mut f: F) {
        if let Some(root) = self.root {
            self.visit(root, point, radius * radius, &mut f);
        }
    }

    fn visit<F: FnMut(&Photon)>(&self, node: usize, point: Vec3, radius_sq: f32, f: &mut F) {
        let node = &self.nodes[node];
        if node.bbox.distance_squared(point) > radius_sq {
            return;
        }
        if (node.photon.position - point).length_squared() <= radius_sq {
            f(&node.photon);
        }
        if let Some(left) = node.left {
            self.visit(left, point, radius_sq, f);
        }
        if let Some(right) = node.right {
            self.visit(right, point, radius_sq, f);
        }
    }
}

/// Build an arena for `photons`; the root is the last node.
fn build(photons: &mut [Photon], axis: usize) -> Vec<PhotonNode> {
    if photons.len() < PARALLEL_THRESHOLD {
        let mut nodes = Vec::with_capacity(photons.len());
        build_into(photons, axis, &mut nodes);
        return nodes;
    }

    let mid = partition(photons, axis);
    let (lower, rest) = photons.split_at_mut(mid);
    let (median, upper) = rest.split_at_mut(1);
    let next_axis = (axis + 1) % 3;
    let (mut nodes, right_nodes) = rayon::join(|| build(lower, next_axis), || build(upper, next_axis));

    let left = nodes.len().checked_sub(1);
    let offset = nodes.len();
    nodes.extend(right_nodes.into_iter().map(|mut node| {
        node.left = node.left.map(|i| i + offset);
        node.right = node.right.map(|i| i + offset);
        node
    }));
    let right = (nodes.len() > offset).then(|| nodes.len() - 1);

    push_node(&mut nodes, median[0], left, right);
    nodes
}

/// Sequential post-order build into `nodes`; returns the subtree root.
fn build_into(photons: &mut [Photon], axis: usize, nodes: &mut Vec<PhotonNode>) -> Option<usize> {
    if photons.is_empty() {
        return None;
    }
    let mid = partition(photons, axis);
    let (lower, rest) = photons.split_at_mut(mid);
    let (median, upper) = rest.split_at_mut(1);
    let next_axis = (axis + 1) % 3;
    let left = build_into(lower, next_axis, nodes);
    let right = build_into(upper, next_axis, nodes);
    Some(push_node(nodes, median[0], left, right))
}

/// Move the median photon on `axis` to the middle; returns its index.
fn partition(photons: &mut [Photon], axis: usize) -> usize {
    let mid = photons.len() / 2;
    photons.select_nth_unstable_by(mid, |a, b| a.position[axis].total_cmp(&b.position[axis]));
    mid
}

fn push_node(
    nodes: &mut Vec<PhotonNode>,
    photon: Photon,
    left: Option<usize>,
    right: Option<usize>,
) -> usize {
    let mut bbox = Aabb::point(photon.position);
    for child in [left, right].into_iter().flatten() {
        bbox = Aabb::surrounding(&bbox, &nodes[child].bbox);
    }
    nodes.push(PhotonNode {
        photon,
        bbox,
        left,
        right,
    });
    nodes.len() - 1
}
