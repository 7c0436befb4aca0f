//! Scene description types for Lumen.
//!
//! This is the on-disk shape of a scene: a camera, lights, a material
//! table and a tree of objects. It stays renderer-agnostic; the renderer
//! turns it into primitives and acceleration structures.
//!
//! Vectors are plain `[f32; 3]` arrays so the JSON reads naturally:
//!
//! ```json
//! {
//!   "camera": { "center": [0, 1, 5], "direction": [0, 0, -1], "up": [0, 1, 0],
//!               "width": 320, "height": 240, "fov": 45 },
//!   "lights": [{ "type": "point", "position": [0, 4, 0], "color": [1, 1, 1] }],
//!   "materials": [{ "diffuse": [0.8, 0.8, 0.8] }],
//!   "objects": [{ "type": "sphere", "center": [0, 1, 0], "radius": 1, "material": 0 }]
//! }
//! ```

use std::path::PathBuf;

use lumen_math::{EulerRot, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::config::{PreviewConfig, SppmConfig};

/// A complete scene file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SceneDescription {
    pub camera: CameraDescription,

    /// Color returned by camera rays that escape the scene (preview only)
    #[serde(default)]
    pub background: [f32; 3],

    #[serde(default)]
    pub lights: Vec<LightDescription>,

    /// Material table; objects refer to entries by index
    #[serde(default)]
    pub materials: Vec<MaterialDescription>,

    #[serde(default)]
    pub objects: Vec<ObjectDescription>,

    #[serde(default)]
    pub render: SppmConfig,

    #[serde(default)]
    pub preview: PreviewConfig,
}

impl SceneDescription {
    /// Number of objects including everything nested in groups and transforms.
    pub fn object_count(&self) -> usize {
        self.objects.iter().map(ObjectDescription::count).sum()
    }
}

/// Perspective camera with an optional thin lens.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CameraDescription {
    pub center: [f32; 3],
    pub direction: [f32; 3],
    pub up: [f32; 3],
    pub width: u32,
    pub height: u32,

    /// Vertical field of view in degrees
    pub fov: f32,

    /// Lens radius; zero is a pinhole
    #[serde(default)]
    pub aperture: f32,

    #[serde(default = "default_focus_distance")]
    pub focus_distance: f32,
}

fn default_focus_distance() -> f32 {
    1.0
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LightDescription {
    Point {
        position: [f32; 3],
        color: [f32; 3],
    },
    Directional {
        /// Direction the light travels in
        direction: [f32; 3],
        color: [f32; 3],
    },
    /// Rectangle spanned by `x_axis * width` and `y_axis * height` around
    /// `center`, emitting towards `x_axis × y_axis`.
    Area {
        center: [f32; 3],
        x_axis: [f32; 3],
        y_axis: [f32; 3],
        width: f32,
        height: f32,
        color: [f32; 3],
    },
}

/// Phong-style material with a specular/diffuse energy split.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MaterialDescription {
    pub diffuse: [f32; 3],

    #[serde(default)]
    pub specular: [f32; 3],

    #[serde(default)]
    pub shininess: f32,

    /// Fraction of incoming power that scatters specularly
    #[serde(default)]
    pub specular_ratio: f32,

    /// Present for dielectrics; absent means an opaque mirror
    #[serde(default)]
    pub refractive_index: Option<f32>,
}

impl Default for MaterialDescription {
    fn default() -> Self {
        Self {
            diffuse: [0.5, 0.5, 0.5],
            specular: [0.0; 3],
            shininess: 0.0,
            specular_ratio: 0.0,
            refractive_index: None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ObjectDescription {
    Sphere {
        center: [f32; 3],
        radius: f32,
        material: usize,
    },
    /// Infinite plane `normal · x = offset`
    Plane {
        normal: [f32; 3],
        offset: f32,
        material: usize,
    },
    Triangle {
        vertices: [[f32; 3]; 3],
        material: usize,
    },
    /// OBJ mesh; relative paths resolve against the scene file's directory
    Mesh {
        path: PathBuf,
        material: usize,
    },
    /// Profile curve in the XY plane swept around the +Y axis
    RevSurface {
        profile: CurveDescription,
        material: usize,
    },
    Group {
        objects: Vec<ObjectDescription>,
    },
    Transform {
        transform: TransformDescription,
        object: Box<ObjectDescription>,
    },
}

impl ObjectDescription {
    fn count(&self) -> usize {
        match self {
            ObjectDescription::Group { objects } => objects.iter().map(Self::count).sum(),
            ObjectDescription::Transform { object, .. } => object.count(),
            _ => 1,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CurveDescription {
    /// Piecewise cubic Bezier; needs `3k + 1` control points
    Bezier { controls: Vec<[f32; 3]> },
    /// Uniform cubic B-spline; needs at least 4 control points
    #[serde(rename = "bspline")]
    BSpline { controls: Vec<[f32; 3]> },
}

impl CurveDescription {
    pub fn controls(&self) -> Vec<Vec3> {
        let controls = match self {
            CurveDescription::Bezier { controls } | CurveDescription::BSpline { controls } => {
                controls
            }
        };
        controls.iter().map(|&c| Vec3::from_array(c)).collect()
    }
}

/// Object-to-parent transform.
///
/// Either an explicit row-major `matrix`, or translate/rotate/scale
/// components composed in SRT order.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformDescription {
    pub translate: [f32; 3],

    /// Euler angles in degrees, applied X then Y then Z
    pub rotate: [f32; 3],

    pub scale: [f32; 3],

    pub matrix: Option<[[f32; 4]; 4]>,
}

impl Default for TransformDescription {
    fn default() -> Self {
        Self {
            translate: [0.0; 3],
            rotate: [0.0; 3],
            scale: [1.0; 3],
            matrix: None,
        }
    }
}

impl TransformDescription {
    /// Convert to a 4x4 transformation matrix.
    ///
    /// Order: Scale -> Rotate -> Translate (SRT)
    pub fn to_matrix(&self) -> Mat4 {
        if let Some(rows) = self.matrix {
            return Mat4::from_cols_array_2d(&rows).transpose();
        }

        let [rx, ry, rz] = self.rotate;
        let rotation = Quat::from_euler(
            EulerRot::ZYX,
            rz.to_radians(),
            ry.to_radians(),
            rx.to_radians(),
        );
        Mat4::from_scale_rotation_translation(
            Vec3::from_array(self.scale),
            rotation,
            Vec3::from_array(self.translate),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_srt_order() {
        let transform = TransformDescription {
            translate: [1.0, 0.0, 0.0],
            scale: [2.0, 2.0, 2.0],
            ..Default::default()
        };
        let p = transform.to_matrix().transform_point3(Vec3::ONE);

        assert!((p - Vec3::new(3.0, 2.0, 2.0)).length() < 1e-5);
    }

    #[test]
    fn test_transform_rotation_degrees() {
        let transform = TransformDescription {
            rotate: [0.0, 90.0, 0.0],
            ..Default::default()
        };
        let p = transform.to_matrix().transform_point3(Vec3::X);

        assert!((p - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-5);
    }

    #[test]
    fn test_transform_matrix_is_row_major() {
        let transform = TransformDescription {
            matrix: Some([
                [1.0, 0.0, 0.0, 5.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ]),
            ..Default::default()
        };
        let p = transform.to_matrix().transform_point3(Vec3::ZERO);

        assert_eq!(p, Vec3::new(5.0, 0.0, 0.0));
    }

    #[test]
    fn test_object_count_recurses() {
        let json = r#"{
            "camera": { "center": [0, 0, 5], "direction": [0, 0, -1], "up": [0, 1, 0],
                        "width": 8, "height": 8, "fov": 45 },
            "objects": [
                { "type": "plane", "normal": [0, 1, 0], "offset": 0, "material": 0 },
                { "type": "group", "objects": [
                    { "type": "sphere", "center": [0, 0, 0], "radius": 1, "material": 0 },
                    { "type": "transform", "transform": { "translate": [1, 0, 0] },
                      "object": { "type": "sphere", "center": [0, 0, 0], "radius": 1, "material": 0 } }
                ] }
            ]
        }"#;
        let desc: SceneDescription = serde_json::from_str(json).unwrap();

        assert_eq!(desc.object_count(), 3);
        assert_eq!(desc.camera.focus_distance, 1.0);
        assert_eq!(desc.render.passes, SppmConfig::default().passes);
    }

    #[test]
    fn test_curve_and_light_tags() {
        let curve: CurveDescription =
            serde_json::from_str(r#"{ "type": "bspline", "controls": [[0,0,0],[1,1,0],[1,2,0],[0,3,0]] }"#)
                .unwrap();
        assert!(matches!(curve, CurveDescription::BSpline { .. }));
        assert_eq!(curve.controls().len(), 4);

        let light: LightDescription = serde_json::from_str(
            r#"{ "type": "area", "center": [0, 2, 0], "x_axis": [1, 0, 0], "y_axis": [0, 0, 1],
                 "width": 1, "height": 1, "color": [5, 5, 5] }"#,
        )
        .unwrap();
        assert!(matches!(light, LightDescription::Area { .. }));
    }
}
