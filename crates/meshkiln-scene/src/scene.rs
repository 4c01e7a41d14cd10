// meshkiln-scene/src/scene.rs
//! The imported scene handed to the export pipeline

use meshkiln_core::ArtifactKind;
use serde::{Deserialize, Serialize};

use crate::animation::Animation;
use crate::material::Material;
use crate::mesh::Mesh;
use crate::node::SceneNode;

/// A fully imported scene
///
/// Everything the exporters need: the transform hierarchy, the meshes it
/// references, the materials those reference in turn, and any authored
/// animations. The pipeline treats the whole structure as read-only for
/// the duration of one export call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    /// Root of the transform hierarchy
    pub root: SceneNode,
    /// All meshes, referenced by node mesh indices
    pub meshes: Vec<Mesh>,
    /// All materials, referenced by mesh material indices
    pub materials: Vec<Material>,
    /// Authored animations; only the first is exported
    pub animations: Vec<Animation>,
}

impl Scene {
    /// Create a scene holding only a hierarchy
    pub fn new(root: SceneNode) -> Self {
        Self {
            root,
            meshes: Vec::new(),
            materials: Vec::new(),
            animations: Vec::new(),
        }
    }

    /// Check whether the scene carries any mesh geometry
    pub fn has_meshes(&self) -> bool {
        !self.meshes.is_empty()
    }

    /// Check whether any mesh carries bone bindings
    pub fn has_bones(&self) -> bool {
        self.meshes.iter().any(Mesh::is_skinned)
    }

    /// Check whether the scene carries animation tracks
    pub fn has_animations(&self) -> bool {
        !self.animations.is_empty()
    }

    /// Pick the artifact kind this scene produces
    ///
    /// `None` means the scene holds nothing exportable.
    pub fn classify(&self) -> Option<ArtifactKind> {
        ArtifactKind::classify(self.has_meshes(), self.has_bones(), self.has_animations())
    }
}
