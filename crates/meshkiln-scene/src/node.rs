// meshkiln-scene/src/node.rs
//! Scene transform hierarchy

use glam::Mat4;
use serde::{Deserialize, Serialize};

/// A node in the source scene's transform hierarchy
///
/// Names are assumed unique within one hierarchy but this is not
/// enforced; duplicate names degrade lookups downstream rather than
/// failing import.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneNode {
    /// Node name
    pub name: String,
    /// Transform relative to the parent node
    pub transform: Mat4,
    /// Indices into the scene's mesh list
    pub meshes: Vec<usize>,
    /// Child nodes in authored order
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    /// Create a leaf node with an identity transform
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Mat4::IDENTITY,
            meshes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Count this node and all descendants
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }

    /// Check whether any node in this subtree references a mesh
    pub fn references_meshes(&self) -> bool {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if !node.meshes.is_empty() {
                return true;
            }
            stack.extend(node.children.iter());
        }
        false
    }
}
