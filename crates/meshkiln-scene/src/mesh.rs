// meshkiln-scene/src/mesh.rs
//! Triangulated mesh geometry and skin bindings

use glam::{Mat4, Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// A triangulated mesh as delivered by the importer
///
/// Vertex attributes are parallel arrays indexed by the face indices.
/// Only `positions` is mandatory; the other attribute arrays may be
/// empty, in which case exported vertices keep zeroed fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mesh {
    /// Mesh name
    pub name: String,
    /// Index into the scene's material list
    pub material: usize,
    /// Vertex positions
    pub positions: Vec<Vec3>,
    /// Vertex normals, or empty
    pub normals: Vec<Vec3>,
    /// Texture coordinates, or empty
    pub uvs: Vec<Vec2>,
    /// Tangent vectors, or empty
    pub tangents: Vec<Vec3>,
    /// Triangle faces as vertex index triples
    pub faces: Vec<[u32; 3]>,
    /// Bone bindings; empty for unskinned meshes
    pub bones: Vec<BoneBinding>,
}

impl Mesh {
    /// Create an empty mesh referencing a material
    pub fn new(name: impl Into<String>, material: usize) -> Self {
        Self {
            name: name.into(),
            material,
            positions: Vec::new(),
            normals: Vec::new(),
            uvs: Vec::new(),
            tangents: Vec::new(),
            faces: Vec::new(),
            bones: Vec::new(),
        }
    }

    /// Get vertex count
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Get index count (three per face)
    pub fn index_count(&self) -> usize {
        self.faces.len() * 3
    }

    /// Check if the mesh carries bone bindings
    pub fn is_skinned(&self) -> bool {
        !self.bones.is_empty()
    }
}

/// One bone's influence over a mesh's vertices
///
/// Bone-centric: the binding names the node acting as the bone and
/// lists the vertices it moves. The export pipeline consolidates this
/// into per-vertex form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoneBinding {
    /// Name of the node acting as this bone
    pub name: String,
    /// Inverse bind-pose matrix (mesh space to bone space)
    pub offset: Mat4,
    /// Weighted vertices affected by this bone
    pub weights: Vec<VertexWeight>,
}

impl BoneBinding {
    /// Create a binding with an identity offset and no weights
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            offset: Mat4::IDENTITY,
            weights: Vec::new(),
        }
    }
}

/// A single (vertex, weight) influence pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VertexWeight {
    /// Index into the mesh's vertex arrays
    pub vertex: u32,
    /// Influence weight; sources are expected to deliver normalized sets
    pub weight: f32,
}
