//! Hierarchy flattening
//!
//! Turns the scene's node tree into the flat bone array shared by the
//! rigged mesh and animation clip artifacts. Traversal is depth-first
//! with an explicit stack: children are pushed in authored order and
//! popped in reverse, so siblings land in the array back to front.
//! Every parent is visited before its children, which keeps parent
//! indices strictly smaller than child indices.

use std::collections::HashMap;

use glam::Mat4;
use meshkiln_scene::SceneNode;

use crate::artifact::BoneEntry;

/// A node flattened into the bone array
#[derive(Debug, Clone)]
pub struct FlatBone {
    /// Node name
    pub name: String,
    /// Transform relative to the parent bone
    pub transform: Mat4,
    /// Index of the parent bone, -1 for the root
    pub parent: i32,
}

/// A mesh reference recorded while flattening
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshAttachment {
    /// Index of the owning node in the bone array
    pub node: usize,
    /// Index into the scene's mesh list
    pub mesh: usize,
}

/// The scene hierarchy in flat, index-addressed form
#[derive(Debug, Clone)]
pub struct Hierarchy {
    /// Bones in visit order; parents precede children
    pub bones: Vec<FlatBone>,
    /// Mesh references in visit order
    pub attachments: Vec<MeshAttachment>,
    index: HashMap<String, usize>,
}

impl Hierarchy {
    /// Flatten a node tree into bone order
    pub fn flatten(root: &SceneNode) -> Self {
        let mut bones = Vec::with_capacity(root.node_count());
        let mut attachments = Vec::new();
        let mut index = HashMap::new();

        let mut stack = vec![(root, -1i32)];
        while let Some((node, parent)) = stack.pop() {
            let id = bones.len();
            bones.push(FlatBone {
                name: node.name.clone(),
                transform: node.transform,
                parent,
            });
            // Duplicate names resolve to the bone visited last
            index.insert(node.name.clone(), id);

            for &mesh in &node.meshes {
                attachments.push(MeshAttachment { node: id, mesh });
            }
            for child in &node.children {
                stack.push((child, id as i32));
            }
        }

        Self {
            bones,
            attachments,
            index,
        }
    }

    /// Number of bones
    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    /// Look up a bone index by node name
    pub fn find(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Bones converted to artifact entries
    pub fn bone_entries(&self) -> Vec<BoneEntry> {
        self.bones
            .iter()
            .map(|bone| BoneEntry {
                name: bone.name.clone(),
                transform: bone.transform,
            })
            .collect()
    }

    /// Parent indices in bone order
    pub fn parent_indices(&self) -> Vec<i32> {
        self.bones.iter().map(|bone| bone.parent).collect()
    }
}
