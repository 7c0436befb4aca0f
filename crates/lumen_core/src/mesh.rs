//! Mesh geometry representation for Lumen scenes.
//!
//! A renderer-agnostic triangle soup that can be populated from OBJ files
//! (see [`crate::loader::load_obj`]) or built procedurally, then handed to
//! the renderer, which builds its own acceleration structure over it.

use lumen_math::{Aabb, Vec3};

/// A mesh consisting of vertex positions and triangle indices.
#[derive(Clone, Debug)]
pub struct Mesh {
    /// Vertex positions (one Vec3 per vertex)
    pub positions: Vec<Vec3>,

    /// Triangle indices (every 3 indices form a triangle)
    pub indices: Vec<u32>,

    /// Axis-aligned bounding box
    pub bounds: Aabb,
}

impl Mesh {
    /// Create a new mesh from positions and indices.
    pub fn new(positions: Vec<Vec3>, indices: Vec<u32>) -> Self {
        let bounds = Aabb::from_iter_points(positions.iter().copied());
        Self {
            positions,
            indices,
            bounds,
        }
    }

    /// Get the number of triangles in the mesh.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Get the number of vertices in the mesh.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Get the mesh center (center of bounding box).
    pub fn center(&self) -> Vec3 {
        self.bounds.centroid()
    }

    /// Iterate over valid triangles as index triplets.
    ///
    /// Triangles referencing out-of-range vertices are skipped with a warning.
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        let vertex_count = self.positions.len();
        self.indices.chunks_exact(3).filter_map(move |chunk| {
            let tri = [chunk[0], chunk[1], chunk[2]];
            if tri.iter().any(|&i| i as usize >= vertex_count) {
                log::warn!(
                    "Invalid triangle indices: {:?}, vertex count: {}",
                    tri,
                    vertex_count
                );
                return None;
            }
            Some(tri)
        })
    }

    /// Extract triangle vertices as [v0, v1, v2] triplets.
    pub fn extract_triangle_vertices(&self) -> Vec<[Vec3; 3]> {
        self.triangles()
            .map(|[a, b, c]| {
                [
                    self.positions[a as usize],
                    self.positions[b as usize],
                    self.positions[c as usize],
                ]
            })
            .collect()
    }
}
