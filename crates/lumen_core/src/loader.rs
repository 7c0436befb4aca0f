//! Scene and mesh file loading.
//!
//! Scenes are JSON documents deserialized into [`SceneDescription`];
//! meshes are Wavefront OBJ files read through `tobj`.

use std::path::Path;

use lumen_math::Vec3;
use thiserror::Error;

use crate::mesh::Mesh;
use crate::scene::SceneDescription;

/// Errors that can occur while loading scene or mesh files.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Scene parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("OBJ error: {0}")]
    Obj(#[from] tobj::LoadError),

    #[error("No geometry found in {0}")]
    NoGeometry(String),
}

/// Result type for loading operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// Load a scene description from a JSON file.
pub fn load_scene<P: AsRef<Path>>(path: P) -> LoadResult<SceneDescription> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path)?;
    let scene = load_scene_from_str(&source)?;
    log::info!(
        "Loaded scene {}: {} objects, {} lights, {} materials",
        path.display(),
        scene.object_count(),
        scene.lights.len(),
        scene.materials.len()
    );
    Ok(scene)
}

/// Parse a scene description from a JSON string.
pub fn load_scene_from_str(source: &str) -> LoadResult<SceneDescription> {
    Ok(serde_json::from_str(source)?)
}

/// Load an OBJ file as a single triangulated mesh.
///
/// All models in the file are merged.
pub fn load_obj<P: AsRef<Path>>(path: P) -> LoadResult<Mesh> {
    let path = path.as_ref();
    let (models, _materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            single_index: true,
            triangulate: true,
            ..Default::default()
        },
    )?;

    let mut positions = Vec::new();
    let mut indices = Vec::new();
    for model in &models {
        let base = positions.len() as u32;
        positions.extend(model.mesh.positions.chunks_exact(3).map(Vec3::from_slice));
        indices.extend(model.mesh.indices.iter().map(|&i| base + i));
    }

    if indices.is_empty() {
        return Err(LoadError::NoGeometry(path.display().to_string()));
    }

    let mesh = Mesh::new(positions, indices);
    log::info!(
        "Loaded mesh {}: {} vertices, {} triangles",
        path.display(),
        mesh.vertex_count(),
        mesh.triangle_count()
    );
    Ok(mesh)
}
