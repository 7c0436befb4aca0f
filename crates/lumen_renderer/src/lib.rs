//! Lumen Renderer - CPU photon mapping
//!
//! A stochastic progressive photon mapper for offline rendering of
//! caustics and indirect diffuse light, plus a fast direct-lighting
//! preview. Geometry sits in an object-level SAH BVH; triangle meshes
//! carry their own KD-tree; photons are gathered from a point KD-tree
//! rebuilt every pass.

mod bucket;
mod bvh;
mod camera;
mod curve;
mod error;
mod hit;
mod light;
mod material;
mod mesh;
mod mesh_kdtree;
mod photon;
mod photon_tree;
mod plane;
mod primitive;
mod renderer;
mod revsurface;
mod sampling;
mod scene;
mod sphere;
mod sppm;
mod transform;
mod triangle;

pub use bucket::{generate_buckets, render_bucket, Bucket, BucketResult};
pub use bvh::{BoxEntry, ObjectBvh};
pub use camera::Camera;
pub use curve::{Curve, CurvePoint};
pub use error::{GeometryError, SceneError};
pub use hit::Hit;
pub use light::{Illumination, Light};
pub use material::{fresnel_reflectance, reflect, specular_scatter, Material, SpecularScatter};
pub use mesh::TriangleMesh;
pub use mesh_kdtree::{MeshKdTree, MeshTreeStats};
pub use photon::{trace_into, trace_ray, Deposit, Photon};
pub use photon_tree::PhotonTree;
pub use plane::Plane;
pub use primitive::Primitive;
pub use renderer::{color_to_rgba, ray_color, render_direct, render_pixel, ImageBuffer};
pub use revsurface::RevSurface;
pub use sampling::{gen_f32, stream_rng};
pub use scene::Scene;
pub use sphere::Sphere;
pub use sppm::{PassStats, SppmRenderer, ViewPoint, VisiblePoint};
pub use transform::Transform;
pub use triangle::Triangle;

/// Re-export common math types from lumen_math
pub use lumen_math::{Aabb, Color, Ray, Vec3};
