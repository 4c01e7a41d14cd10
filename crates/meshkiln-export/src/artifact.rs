//! Flattened artifact structures
//!
//! These mirror the on-disk layout one-to-one: the writer emits exactly
//! these fields, in declaration order, and the reader rebuilds them.

use glam::{Mat4, Vec2, Vec3};
use meshkiln_scene::{QuatKey, VectorKey};
use serde::{Deserialize, Serialize};

/// A draw-ready range of the merged static buffers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticSubmesh {
    /// Name of the first node that contributed to this range
    pub name: String,
    /// Number of indices in this range
    pub index_count: u32,
    /// Start of this range in the merged index buffer
    pub start_index: u32,
    /// Vertex offset added to each index at draw time
    pub base_vertex: u32,
    /// Diffuse texture path, empty when the material has none
    pub diffuse_texture: String,
    /// Normal map path, empty when the material has none
    pub normal_texture: String,
}

/// A vertex with its node's global transform already applied
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StaticVertex {
    pub position: Vec3,
    pub uv: Vec2,
    pub normal: Vec3,
    pub tangent: Vec3,
}

/// Static mesh artifact: merged submeshes over shared buffers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StaticMeshArtifact {
    pub submeshes: Vec<StaticSubmesh>,
    pub vertices: Vec<StaticVertex>,
    pub indices: Vec<u32>,
}

/// One flattened hierarchy node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoneEntry {
    pub name: String,
    /// Transform relative to the parent bone
    pub transform: Mat4,
}

/// A per-node submesh with its local bone table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiggedSubmesh {
    /// Name of the node this submesh is attached to
    pub name: String,
    pub index_count: u32,
    pub start_index: u32,
    pub base_vertex: u32,
    /// Index of the owning node in the bone array, -1 when unresolved
    pub node_id: i32,
    /// Names of the bones deforming this submesh, in submesh-local order
    pub bone_names: Vec<String>,
    /// Inverse bind-pose matrices aligned with `bone_names`
    pub bone_offsets: Vec<Mat4>,
}

/// A vertex in node-local space with packed skinning attributes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiggedVertex {
    pub position: Vec3,
    pub uv: Vec2,
    pub normal: Vec3,
    pub tangent: Vec3,
    /// Four submesh-local bone slots packed as one byte each
    pub bone_indices: u32,
    /// Weights aligned with the packed slots
    pub bone_weights: [f32; 4],
}

/// Rigged mesh artifact: full bone hierarchy plus per-node submeshes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiggedMeshArtifact {
    pub bones: Vec<BoneEntry>,
    /// Parent bone index per bone, -1 for the root
    pub parents: Vec<i32>,
    pub submeshes: Vec<RiggedSubmesh>,
    pub vertices: Vec<RiggedVertex>,
    pub indices: Vec<u32>,
}

/// Keyframe tracks for the bone at the same array position
///
/// Bones without an authored channel keep the default: empty name and
/// no keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClipChannel {
    pub name: String,
    pub position_keys: Vec<VectorKey>,
    pub rotation_keys: Vec<QuatKey>,
    pub scale_keys: Vec<VectorKey>,
}

impl ClipChannel {
    /// Check whether any track carries keys
    pub fn has_keys(&self) -> bool {
        !self.position_keys.is_empty()
            || !self.rotation_keys.is_empty()
            || !self.scale_keys.is_empty()
    }
}

/// One animation with channels aligned to the bone array
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationClip {
    pub name: String,
    /// Keyframe time unit; never zero in a built artifact
    pub ticks_per_second: f32,
    /// Clip length in ticks
    pub duration: f32,
    /// Exactly one channel per bone, in bone order
    pub channels: Vec<ClipChannel>,
}

/// Animation clip artifact: bone hierarchy plus aligned channels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationClipArtifact {
    pub bones: Vec<BoneEntry>,
    /// Parent bone index per bone, -1 for the root
    pub parents: Vec<i32>,
    pub animations: Vec<AnimationClip>,
}
