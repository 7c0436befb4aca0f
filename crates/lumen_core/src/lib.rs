//! Lumen Core - Scene description, meshes and render configuration.
//!
//! This crate provides:
//!
//! - **Scene description**: the JSON scene format (`SceneDescription`)
//! - **Meshes**: `Mesh` and OBJ loading through `tobj`
//! - **Configuration**: tracer and integrator settings with defaults
//!
//! # Example
//!
//! ```ignore
//! use lumen_core::load_scene;
//!
//! let scene = load_scene("cornell.json")?;
//! println!("{} objects, {} passes", scene.object_count(), scene.render.passes);
//! ```

pub mod config;
pub mod loader;
pub mod mesh;
pub mod scene;

// Re-export commonly used types
pub use config::{ConfigError, PreviewConfig, SppmConfig, TracerConfig};
pub use loader::{load_obj, load_scene, load_scene_from_str, LoadError, LoadResult};
pub use mesh::Mesh;
pub use scene::{
    CameraDescription, CurveDescription, LightDescription, MaterialDescription,
    ObjectDescription, SceneDescription, TransformDescription,
};
