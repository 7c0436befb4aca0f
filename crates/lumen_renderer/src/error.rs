//! Construction-time errors.
//!
//! Intersection and tracing never fail; a miss is a normal result. These
//! errors only surface while primitives and scenes are being built.

use lumen_core::{ConfigError, LoadError};
use thiserror::Error;

/// Invalid geometry requested at construction time.
#[derive(Error, Debug, PartialEq)]
pub enum GeometryError {
    #[error("Bezier curve needs 3k + 1 control points (k >= 1), got {0}")]
    BezierControlCount(usize),

    #[error("B-spline curve needs at least 4 control points, got {0}")]
    BsplineControlCount(usize),

    #[error("Revolution profile must lie in the XY plane (control point {index} has z = {z})")]
    NonPlanarProfile { index: usize, z: f32 },

    #[error("Transform matrix is not invertible")]
    SingularTransform,

    #[error("Mesh has no valid triangles")]
    EmptyMesh,

    #[error("Sphere radius must be positive, got {0}")]
    Radius(f32),

    #[error("Plane normal must be non-zero")]
    PlaneNormal,
}

/// Errors raised while turning a scene description into a renderable scene.
#[derive(Error, Debug)]
pub enum SceneError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Object references material {index}, but the scene defines {count}")]
    MissingMaterial { index: usize, count: usize },

    #[error("Invalid camera: {0}")]
    Camera(&'static str),

    #[error("Invalid light: {0}")]
    Light(&'static str),

    #[error("Photon mapping needs at least one light")]
    NoLights,
}
