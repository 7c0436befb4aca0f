//! Bounding Volume Hierarchy over scene objects.
//!
//! Split planes are chosen with the surface area heuristic along one axis
//! per level (cycling x, y, z). A primitive whose box straddles the chosen
//! plane goes into both children with its box clipped to each side, so a
//! leaf's entries never extend past the leaf's region.
//!
//! Unbounded primitives (planes) skip the tree and are tested linearly on
//! every query.

use crate::primitive::Primitive;
use crate::Hit;
use lumen_math::{Aabb, Ray};

/// Cost of one traversal step relative to one primitive test.
const K_TRAVERSE: f32 = 0.5;
/// Cost of testing a primitive in a leaf.
const K_LEAF: f32 = 1.0;

/// A primitive's (possibly clipped) box inside a leaf.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxEntry {
    pub bbox: Aabb,
    /// Index into [`ObjectBvh::primitives`]
    pub index: usize,
}

#[derive(Debug, Clone)]
enum BvhNode {
    Internal {
        bbox: Aabb,
        axis: usize,
        split: f32,
        left: usize,
        right: usize,
    },
    Leaf {
        bbox: Aabb,
        entries: Vec<BoxEntry>,
    },
}

impl BvhNode {
    fn bbox(&self) -> &Aabb {
        match self {
            BvhNode::Internal { bbox, .. } | BvhNode::Leaf { bbox, .. } => bbox,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ObjectBvh {
    primitives: Vec<Primitive>,
    /// Indices of primitives without bounds
    unbounded: Vec<usize>,
    nodes: Vec<BvhNode>,
    root: Option<usize>,
}

impl ObjectBvh {
    /// Build with the default depth `8 + 1.3 ln(n)`, starting on the x axis.
    pub fn new(primitives: Vec<Primitive>) -> Self {
        let primitives = flatten(primitives);
        let depth = (8.0 + 1.3 * (primitives.len().max(1) as f32).ln()) as u32;
        Self::build(primitives, depth, 0)
    }

    /// Build with an explicit maximum depth and first split axis.
    ///
    /// Top-level groups are flattened so their members are bounded
    /// individually.
    pub fn build(primitives: Vec<Primitive>, max_depth: u32, axis: usize) -> Self {
        let primitives = flatten(primitives);

        let mut entries = Vec::new();
        let mut unbounded = Vec::new();
        for (index, primitive) in primitives.iter().enumerate() {
            match primitive.bounding_box() {
                Some(bbox) => entries.push(BoxEntry { bbox, index }),
                None => unbounded.push(index),
            }
        }

        let mut bvh = Self {
            primitives,
            unbounded,
            nodes: Vec::new(),
            root: None,
        };
        if !entries.is_empty() {
            let region = entries
                .iter()
                .fold(Aabb::EMPTY, |acc, e| Aabb::surrounding(&acc, &e.bbox));
            bvh.root = Some(bvh.build_node(entries, region, max_depth, axis % 3));
        }

        log::debug!(
            "Object BVH: {} primitives ({} unbounded), {} nodes, {} leaf entries",
            bvh.primitives.len(),
            bvh.unbounded.len(),
            bvh.nodes.len(),
            bvh.collect_boxes().len()
        );
        bvh
    }

    /// Post-order build; returns the arena index of the new node.
    fn build_node(&mut self, entries: Vec<BoxEntry>, region: Aabb, depth: u32, axis: usize) -> usize {
        let bbox = entries
            .iter()
            .fold(Aabb::EMPTY, |acc, e| Aabb::surrounding(&acc, &e.bbox));

        let split = if depth == 0 || entries.len() <= 1 {
            None
        } else {
            best_split(&entries, &region, axis)
        };
        let Some(split) = split else {
            self.nodes.push(BvhNode::Leaf { bbox, entries });
            return self.nodes.len() - 1;
        };

        let (left_region, right_region) = region.split(axis, split);
        let mut left_entries = Vec::new();
        let mut right_entries = Vec::new();
        for entry in &entries {
            if entry.bbox.min[axis] < split {
                left_entries.push(BoxEntry {
                    bbox: entry.bbox.clip(&left_region),
                    index: entry.index,
                });
            }
            if entry.bbox.max[axis] > split {
                right_entries.push(BoxEntry {
                    bbox: entry.bbox.clip(&right_region),
                    index: entry.index,
                });
            }
        }

        let next_axis = (axis + 1) % 3;
        let left = self.build_node(left_entries, left_region, depth - 1, next_axis);
        let right = self.build_node(right_entries, right_region, depth - 1, next_axis);

        self.nodes.push(BvhNode::Internal {
            bbox,
            axis,
            split,
            left,
            right,
        });
        self.nodes.len() - 1
    }

    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    /// Bounds of all bounded primitives, `None` if there are none.
    pub fn bounding_box(&self) -> Option<Aabb> {
        self.root.map(|root| *self.nodes[root].bbox())
    }

    /// Every leaf entry, duplicates of straddling primitives included.
    pub fn collect_boxes(&self) -> Vec<BoxEntry> {
        self.nodes
            .iter()
            .filter_map(|node| match node {
                BvhNode::Leaf { entries, .. } => Some(entries.iter().copied()),
                BvhNode::Internal { .. } => None,
            })
            .flatten()
            .collect()
    }

    /// Closest hit in `(tmin, hit.t)`, updating `hit` in place.
    pub fn intersect<'a>(&'a self, ray: &Ray, hit: &mut Hit<'a>, tmin: f32) -> bool {
        let mut flag = false;
        for &i in &self.unbounded {
            flag |= self.primitives[i].intersect(ray, hit, tmin);
        }
        if let Some(root) = self.root {
            flag |= self.intersect_node(root, ray, hit, tmin);
        }
        flag
    }

    fn intersect_node<'a>(&'a self, node: usize, ray: &Ray, hit: &mut Hit<'a>, tmin: f32) -> bool {
        match &self.nodes[node] {
            BvhNode::Leaf { bbox, entries } => {
                if !bbox.hit(ray, tmin) {
                    return false;
                }
                let mut flag = false;
                for entry in entries {
                    flag |= self.primitives[entry.index].intersect(ray, hit, tmin);
                }
                flag
            }
            BvhNode::Internal {
                bbox,
                axis,
                left,
                right,
                ..
            } => {
                if !bbox.hit(ray, tmin) {
                    return false;
                }
                let (near, far) = if ray.direction[*axis] > 0.0 {
                    (*left, *right)
                } else {
                    (*right, *left)
                };

                // A straddling primitive can report a hit outside the near
                // region; only a hit inside it rules out the far side.
                let flag = self.intersect_node(near, ray, hit, tmin);
                if flag && self.nodes[near].bbox().contains(ray.at(hit.t)) {
                    return true;
                }
                self.intersect_node(far, ray, hit, tmin) || flag
            }
        }
    }

    /// Test every primitive without the tree.
    pub fn intersect_linear<'a>(&'a self, ray: &Ray, hit: &mut Hit<'a>, tmin: f32) -> bool {
        let mut flag = false;
        for primitive in &self.primitives {
            flag |= primitive.intersect(ray, hit, tmin);
        }
        flag
    }

    /// Split plane coordinate of every internal node, for diagnostics.
    pub fn split_planes(&self) -> Vec<(usize, f32)> {
        self.nodes
            .iter()
            .filter_map(|node| match node {
                BvhNode::Internal { axis, split, .. } => Some((*axis, *split)),
                BvhNode::Leaf { .. } => None,
            })
            .collect()
    }
}

fn flatten(primitives: Vec<Primitive>) -> Vec<Primitive> {
    let mut out = Vec::with_capacity(primitives.len());
    for primitive in primitives {
        primitive.flatten_into(&mut out);
    }
    out
}

/// Cheapest SAH plane strictly inside `region` along `axis`, if any beats a leaf.
///
/// Counts are inclusive: an entry with `min < p` counts left and one with
/// `max > p` counts right, so straddlers count on both sides.
fn best_split(entries: &[BoxEntry], region: &Aabb, axis: usize) -> Option<f32> {
    let total_area = region.surface_area();
    if total_area <= 0.0 {
        return None;
    }

    let mut mins: Vec<f32> = entries.iter().map(|e| e.bbox.min[axis]).collect();
    let mut maxs: Vec<f32> = entries.iter().map(|e| e.bbox.max[axis]).collect();
    mins.sort_unstable_by(f32::total_cmp);
    maxs.sort_unstable_by(f32::total_cmp);

    // Candidate planes: every box's min and max event, min events first on ties
    let mut events: Vec<(f32, u8)> = mins
        .iter()
        .map(|&m| (m, 0))
        .chain(maxs.iter().map(|&m| (m, 1)))
        .collect();
    events.sort_unstable_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
    events.dedup_by(|a, b| a.0 == b.0);

    let n = entries.len();
    let mut best: Option<(f32, f32)> = None;
    for &(p, _) in &events {
        if p <= region.min[axis] || p >= region.max[axis] {
            continue;
        }
        let count_left = mins.partition_point(|&m| m < p);
        let count_right = n - maxs.partition_point(|&m| m <= p);
        let (left_region, right_region) = region.split(axis, p);
        let cost = K_TRAVERSE
            + (left_region.surface_area() * count_left as f32
                + right_region.surface_area() * count_right as f32)
                / total_area;
        if best.map_or(true, |(c, _)| cost < c) {
            best = Some((cost, p));
        }
    }

    best.filter(|&(cost, _)| cost < K_LEAF * n as f32)
        .map(|(_, p)| p)
}
