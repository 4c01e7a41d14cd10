//! Shared types for the meshkiln pipeline

use serde::{Deserialize, Serialize};
use std::fmt;

/// The three artifact kinds the pipeline can produce
///
/// Exactly one kind is produced per export call. The variant is chosen
/// by [`ArtifactKind::classify`] unless the caller forces one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArtifactKind {
    /// Mesh with ancestor transforms baked into vertex data, no skeleton
    StaticMesh,
    /// Mesh with per-vertex bone influences and a flattened skeleton
    RiggedMesh,
    /// Keyframe clip aligned to a flattened skeleton
    AnimationClip,
}

impl ArtifactKind {
    /// Classify a scene by what it contains.
    ///
    /// Meshes with bone bindings yield a rigged mesh, meshes without
    /// yield a static mesh, and a mesh-less scene with animation tracks
    /// yields an animation clip. `None` means nothing is exportable.
    #[must_use]
    pub const fn classify(has_meshes: bool, has_bones: bool, has_animations: bool) -> Option<Self> {
        if has_meshes {
            if has_bones {
                Some(Self::RiggedMesh)
            } else {
                Some(Self::StaticMesh)
            }
        } else if has_animations {
            Some(Self::AnimationClip)
        } else {
            None
        }
    }

    /// File extension used for artifacts of this kind
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::StaticMesh => "mesh",
            Self::RiggedMesh => "skin",
            Self::AnimationClip => "anim",
        }
    }

    /// Recognize an artifact kind from a file extension
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "mesh" => Some(Self::StaticMesh),
            "skin" => Some(Self::RiggedMesh),
            "anim" => Some(Self::AnimationClip),
            _ => None,
        }
    }

    /// Human-readable kind name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::StaticMesh => "static mesh",
            Self::RiggedMesh => "rigged mesh",
            Self::AnimationClip => "animation clip",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
