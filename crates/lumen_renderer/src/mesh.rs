//! Triangle mesh primitive backed by its own KD-tree.

use crate::error::GeometryError;
use crate::mesh_kdtree::{MeshKdTree, MeshTreeStats};
use crate::triangle::{intersect_triangle, triangle_normal};
use crate::{Hit, Material};
use lumen_math::{Aabb, Ray, Vec3};

/// An indexed triangle mesh sharing one material.
#[derive(Debug, Clone)]
pub struct TriangleMesh {
    vertices: Vec<Vec3>,
    triangles: Vec<[u32; 3]>,
    material: Material,
    tree: MeshKdTree,
}

impl TriangleMesh {
    /// Build a mesh and its KD-tree.
    ///
    /// Triangles with out-of-range indices are dropped (see
    /// [`lumen_core::Mesh::triangles`]); a mesh left with none is an error.
    pub fn new(
        vertices: Vec<Vec3>,
        triangles: Vec<[u32; 3]>,
        material: Material,
    ) -> Result<Self, GeometryError> {
        let vertex_count = vertices.len();
        let triangles: Vec<[u32; 3]> = triangles
            .into_iter()
            .filter(|tri| tri.iter().all(|&i| (i as usize) < vertex_count))
            .collect();
        if triangles.is_empty() {
            return Err(GeometryError::EmptyMesh);
        }

        let tree = MeshKdTree::new(&vertices, &triangles);
        let stats = tree.stats();
        log::debug!(
            "Mesh KD-tree: {} triangles, {} nodes, {} leaves, {} references, largest leaf {}",
            triangles.len(),
            stats.nodes,
            stats.leaves,
            stats.references,
            stats.max_leaf_size
        );

        Ok(Self {
            vertices,
            triangles,
            material,
            tree,
        })
    }

    /// Build from a loaded mesh.
    pub fn from_mesh(mesh: &lumen_core::Mesh, material: Material) -> Result<Self, GeometryError> {
        Self::new(mesh.positions.clone(), mesh.triangles().collect(), material)
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    pub fn triangles(&self) -> &[[u32; 3]] {
        &self.triangles
    }

    pub fn tree_stats(&self) -> MeshTreeStats {
        self.tree.stats()
    }

    pub fn intersect<'a>(&'a self, ray: &Ray, hit: &mut Hit<'a>, tmin: f32) -> bool {
        self.tree.intersect(
            &self.vertices,
            &self.triangles,
            &self.material,
            ray,
            hit,
            tmin,
        )
    }

    /// Test every triangle without the tree.
    pub fn intersect_linear<'a>(&'a self, ray: &Ray, hit: &mut Hit<'a>, tmin: f32) -> bool {
        let mut flag = false;
        for tri in &self.triangles {
            let [a, b, c] = tri.map(|v| self.vertices[v as usize]);
            if let Some((t, _, _)) = intersect_triangle(a, b, c, ray) {
                if hit.accepts(t, tmin) {
                    hit.set(t, &self.material, triangle_normal(a, b, c));
                    flag = true;
                }
            }
        }
        flag
    }

    pub fn bounding_box(&self) -> Aabb {
        self.tree.bounding_box()
    }
}
