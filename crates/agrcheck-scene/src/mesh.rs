//! Mesh objects, transforms and the topology accessors the geometry kernel
//! consumes.

use crate::material::Material;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Type of a scene object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Mesh,
    Light,
    Empty,
    Camera,
    Curve,
    Armature,
    Other,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObjectKind::Mesh => "MESH",
            ObjectKind::Light => "LIGHT",
            ObjectKind::Empty => "EMPTY",
            ObjectKind::Camera => "CAMERA",
            ObjectKind::Curve => "CURVE",
            ObjectKind::Armature => "ARMATURE",
            ObjectKind::Other => "OTHER",
        };
        f.write_str(name)
    }
}

/// Object transform. Rotation is XYZ euler in radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    #[serde(default)]
    pub location: [f64; 3],
    #[serde(default)]
    pub rotation: [f64; 3],
    #[serde(default = "unit_scale")]
    pub scale: [f64; 3],
}

fn unit_scale() -> [f64; 3] {
    [1.0, 1.0, 1.0]
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            location: [0.0; 3],
            rotation: [0.0; 3],
            scale: unit_scale(),
        }
    }
}

impl Transform {
    /// Identity transform moved to `location`.
    pub fn at(location: [f64; 3]) -> Self {
        Self {
            location,
            ..Default::default()
        }
    }
}

/// Light source type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LightType {
    Point,
    Spot,
    Sun,
    Area,
}

impl fmt::Display for LightType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LightType::Point => write!(f, "POINT"),
            LightType::Spot => write!(f, "SPOT"),
            LightType::Sun => write!(f, "SUN"),
            LightType::Area => write!(f, "AREA"),
        }
    }
}

/// Light data attached to a light object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightData {
    pub light_type: LightType,
    /// Custom falloff distance switched on.
    #[serde(default)]
    pub use_custom_distance: bool,
}

/// One UV map. `faces[i]` holds the corner coordinates of mesh face `i`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UvLayer {
    #[serde(default)]
    pub name: String,
    pub faces: Vec<Vec<[f64; 2]>>,
}

/// Polygon mesh in object space.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshData {
    pub vertices: Vec<[f64; 3]>,
    /// Faces as vertex index loops.
    pub faces: Vec<Vec<u32>>,
    /// Edges not used by any face.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub loose_edges: Vec<[u32; 2]>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Number of unique undirected edges, face edges and loose edges
    /// combined.
    pub fn edge_count(&self) -> usize {
        let mut edges: HashSet<(u32, u32)> = HashSet::new();
        for face in &self.faces {
            let n = face.len();
            if n < 2 {
                continue;
            }
            for i in 0..n {
                let a = face[i];
                let b = face[(i + 1) % n];
                if a != b {
                    edges.insert((a.min(b), a.max(b)));
                }
            }
        }
        for [a, b] in &self.loose_edges {
            if a != b {
                edges.insert((*a.min(b), *a.max(b)));
            }
        }
        edges.len()
    }

    /// Resolved corner positions of face `index`. Out-of-range vertex
    /// indices are dropped.
    pub fn face_positions(&self, index: usize) -> Vec<[f64; 3]> {
        self.faces
            .get(index)
            .map(|face| {
                face.iter()
                    .filter_map(|&v| self.vertices.get(v as usize).copied())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Axis aligned bounds in object space, `None` for an empty mesh.
    pub fn bounds(&self) -> Option<([f64; 3], [f64; 3])> {
        let first = *self.vertices.first()?;
        let mut min = first;
        let mut max = first;
        for v in &self.vertices[1..] {
            for axis in 0..3 {
                min[axis] = min[axis].min(v[axis]);
                max[axis] = max[axis].max(v[axis]);
            }
        }
        Some((min, max))
    }
}

/// One object of an imported geometry file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshObject {
    pub name: String,
    pub kind: ObjectKind,
    /// Name of the parent object within the same file. The file owns every
    /// object; this is a lookup key, not ownership.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default)]
    pub transform: Transform,
    #[serde(default)]
    pub mesh: MeshData,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub uv_layers: Vec<UvLayer>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub materials: Vec<Material>,
    #[serde(default)]
    pub color_attribute_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub light: Option<LightData>,
}

impl MeshObject {
    /// Creates a mesh object with identity transform and no attributes.
    pub fn new_mesh(name: impl Into<String>, mesh: MeshData) -> Self {
        Self {
            name: name.into(),
            kind: ObjectKind::Mesh,
            parent: None,
            transform: Transform::default(),
            mesh,
            uv_layers: Vec::new(),
            materials: Vec::new(),
            color_attribute_count: 0,
            light: None,
        }
    }

    /// Creates a light object.
    pub fn new_light(name: impl Into<String>, light: LightData) -> Self {
        Self {
            kind: ObjectKind::Light,
            light: Some(light),
            ..Self::new_mesh(name, MeshData::default())
        }
    }

    /// Creates an empty (locator) object.
    pub fn new_empty(name: impl Into<String>) -> Self {
        Self {
            kind: ObjectKind::Empty,
            ..Self::new_mesh(name, MeshData::default())
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_uv_layer(mut self, layer: UvLayer) -> Self {
        self.uv_layers.push(layer);
        self
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.materials.push(material);
        self
    }

    pub fn is_mesh(&self) -> bool {
        self.kind == ObjectKind::Mesh
    }

    /// Active UV layer (the first one).
    pub fn active_uv_layer(&self) -> Option<&UvLayer> {
        self.uv_layers.first()
    }

    /// Object dimensions: object-space bounds times scale.
    pub fn dimensions(&self) -> [f64; 3] {
        match self.mesh.bounds() {
            Some((min, max)) => {
                let s = self.transform.scale;
                [
                    (max[0] - min[0]) * s[0].abs(),
                    (max[1] - min[1]) * s[1].abs(),
                    (max[2] - min[2]) * s[2].abs(),
                ]
            }
            None => [0.0; 3],
        }
    }
}
