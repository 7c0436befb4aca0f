//! Median-split KD-tree over the triangles of a single mesh.
//!
//! Each level splits the node box at the median triangle centroid on the
//! current axis. Triangles lying on both sides of the plane are stored in
//! both children, so traversal must check that a near-side hit really lies
//! inside the near child before skipping the far one.
//!
//! Nodes live in one arena (`Vec<MeshNode>`) and refer to their children by
//! index.

use crate::triangle::{intersect_triangle, triangle_normal};
use crate::{Hit, Material};
use lumen_math::{Aabb, Ray, Vec3};

#[derive(Debug, Clone)]
enum MeshNode {
    Internal {
        bbox: Aabb,
        axis: usize,
        left: usize,
        right: usize,
    },
    Leaf {
        bbox: Aabb,
        triangles: Vec<u32>,
    },
}

impl MeshNode {
    fn bbox(&self) -> &Aabb {
        match self {
            MeshNode::Internal { bbox, .. } | MeshNode::Leaf { bbox, .. } => bbox,
        }
    }
}

/// Build statistics, logged at debug level.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MeshTreeStats {
    pub nodes: usize,
    pub leaves: usize,
    /// Triangle references across all leaves (duplicates included)
    pub references: usize,
    pub max_leaf_size: usize,
}

#[derive(Debug, Clone)]
pub struct MeshKdTree {
    nodes: Vec<MeshNode>,
    root: usize,
}

impl MeshKdTree {
    /// Build the tree with the default depth `floor(8 ln(n + 1.3))`.
    pub fn new(vertices: &[Vec3], triangles: &[[u32; 3]]) -> Self {
        let depth = (8.0 * (triangles.len() as f32 + 1.3).ln()) as u32;
        Self::build(vertices, triangles, depth)
    }

    /// Build the tree with an explicit maximum depth.
    pub fn build(vertices: &[Vec3], triangles: &[[u32; 3]], max_depth: u32) -> Self {
        let bbox = Aabb::from_iter_points(
            triangles
                .iter()
                .flat_map(|tri| tri.iter().map(|&i| vertices[i as usize])),
        );
        let ids: Vec<u32> = (0..triangles.len() as u32).collect();

        let mut tree = Self {
            nodes: Vec::new(),
            root: 0,
        };
        tree.root = tree.build_node(vertices, triangles, ids, bbox, max_depth, 0);
        tree
    }

    /// Post-order build; returns the arena index of the new node.
    fn build_node(
        &mut self,
        vertices: &[Vec3],
        triangles: &[[u32; 3]],
        ids: Vec<u32>,
        bbox: Aabb,
        depth: u32,
        axis: usize,
    ) -> usize {
        if depth == 0 || ids.len() <= 1 {
            return self.push_leaf(bbox, ids);
        }

        let coord = |i: u32, k: usize| vertices[triangles[i as usize][k] as usize][axis];

        let mut centroids: Vec<f32> = ids
            .iter()
            .map(|&i| (coord(i, 0) + coord(i, 1) + coord(i, 2)) / 3.0)
            .collect();
        let mid = centroids.len() / 2;
        let (_, &mut split, _) = centroids.select_nth_unstable_by(mid, f32::total_cmp);

        if split < bbox.min[axis] || split > bbox.max[axis] {
            return self.push_leaf(bbox, ids);
        }

        let mut left_ids = Vec::new();
        let mut right_ids = Vec::new();
        for &i in &ids {
            let below = (0..3).all(|k| coord(i, k) < split);
            let above = (0..3).all(|k| coord(i, k) > split);
            if below {
                left_ids.push(i);
            } else if above {
                right_ids.push(i);
            } else {
                left_ids.push(i);
                right_ids.push(i);
            }
        }

        if left_ids.len() == ids.len() || right_ids.len() == ids.len() {
            return self.push_leaf(bbox, ids);
        }

        let (left_box, right_box) = bbox.split(axis, split);
        let next_axis = (axis + 1) % 3;
        let left = self.build_node(vertices, triangles, left_ids, left_box, depth - 1, next_axis);
        let right = self.build_node(vertices, triangles, right_ids, right_box, depth - 1, next_axis);

        self.nodes.push(MeshNode::Internal {
            bbox,
            axis,
            left,
            right,
        });
        self.nodes.len() - 1
    }

    fn push_leaf(&mut self, bbox: Aabb, triangles: Vec<u32>) -> usize {
        self.nodes.push(MeshNode::Leaf { bbox, triangles });
        self.nodes.len() - 1
    }

    pub fn bounding_box(&self) -> Aabb {
        *self.nodes[self.root].bbox()
    }

    pub fn stats(&self) -> MeshTreeStats {
        let mut stats = MeshTreeStats {
            nodes: self.nodes.len(),
            ..Default::default()
        };
        for node in &self.nodes {
            if let MeshNode::Leaf { triangles, .. } = node {
                stats.leaves += 1;
                stats.references += triangles.len();
                stats.max_leaf_size = stats.max_leaf_size.max(triangles.len());
            }
        }
        stats
    }

    /// Closest hit among the mesh triangles, updating `hit` in place.
    pub fn intersect<'a>(
        &self,
        vertices: &[Vec3],
        triangles: &[[u32; 3]],
        material: &'a Material,
        ray: &Ray,
        hit: &mut Hit<'a>,
        tmin: f32,
    ) -> bool {
        let query = Query {
            vertices,
            triangles,
            material,
        };
        self.intersect_node(self.root, &query, ray, hit, tmin)
    }

    fn intersect_node<'a>(
        &self,
        node: usize,
        query: &Query<'_, 'a>,
        ray: &Ray,
        hit: &mut Hit<'a>,
        tmin: f32,
    ) -> bool {
        match &self.nodes[node] {
            MeshNode::Leaf { bbox, triangles } => {
                if !bbox.hit(ray, tmin) {
                    return false;
                }
                let mut flag = false;
                for &i in triangles {
                    flag |= query.triangle(i, ray, hit, tmin);
                }
                flag
            }
            MeshNode::Internal {
                bbox,
                axis,
                left,
                right,
            } => {
                if !bbox.hit(ray, tmin) {
                    return false;
                }
                let (near, far) = if ray.direction[*axis] > 0.0 {
                    (*left, *right)
                } else {
                    (*right, *left)
                };

                let flag = self.intersect_node(near, query, ray, hit, tmin);
                if flag && self.nodes[near].bbox().contains(ray.at(hit.t)) {
                    return true;
                }
                self.intersect_node(far, query, ray, hit, tmin) || flag
            }
        }
    }
}

struct Query<'q, 'a> {
    vertices: &'q [Vec3],
    triangles: &'q [[u32; 3]],
    material: &'a Material,
}

impl<'q, 'a> Query<'q, 'a> {
    #[inline]
    fn triangle(&self, i: u32, ray: &Ray, hit: &mut Hit<'a>, tmin: f32) -> bool {
        let [a, b, c] = self.triangles[i as usize].map(|v| self.vertices[v as usize]);
        match intersect_triangle(a, b, c, ray) {
            Some((t, _, _)) if hit.accepts(t, tmin) => {
                hit.set(t, self.material, triangle_normal(a, b, c));
                true
            }
            _ => false,
        }
    }
}
