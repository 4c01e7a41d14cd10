//! Global transform baking
//!
//! The static path collapses the hierarchy entirely: every vertex is
//! pre-multiplied by its node's global transform so the artifact needs
//! no tree at runtime. Globals accumulate breadth-first, each node
//! looking up its parent's global by name. The map keeps the first
//! write for a name, so when names collide the later node is shadowed
//! and descendants resolve against the first holder's global.

use std::collections::{HashMap, VecDeque};

use glam::Mat4;
use meshkiln_scene::SceneNode;

/// Name-keyed global transforms for one hierarchy
#[derive(Debug, Clone)]
pub struct GlobalTransforms {
    map: HashMap<String, Mat4>,
}

impl GlobalTransforms {
    /// Accumulate global transforms breadth-first from the root
    pub fn compute(root: &SceneNode) -> Self {
        let mut map: HashMap<String, Mat4> = HashMap::new();
        let mut queue: VecDeque<(&SceneNode, Option<&str>)> = VecDeque::new();
        queue.push_back((root, None));

        while let Some((node, parent)) = queue.pop_front() {
            let parent_global = parent
                .and_then(|name| map.get(name))
                .copied()
                .unwrap_or(Mat4::IDENTITY);
            let global = parent_global * node.transform;
            map.entry(node.name.clone()).or_insert(global);

            for child in &node.children {
                queue.push_back((child, Some(node.name.as_str())));
            }
        }

        Self { map }
    }

    /// Global transform for a node name, identity when unknown
    pub fn get(&self, name: &str) -> Mat4 {
        self.map.get(name).copied().unwrap_or(Mat4::IDENTITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_globals_accumulate_root_first() {
        let mut root = SceneNode::new("root");
        root.transform = Mat4::from_rotation_z(FRAC_PI_2);
        let mut child = SceneNode::new("child");
        child.transform = Mat4::from_translation(Vec3::X);
        child.children.push(SceneNode::new("tip"));
        root.children.push(child);

        let globals = GlobalTransforms::compute(&root);
        let baked = globals.get("tip").transform_point3(Vec3::ZERO);

        // Rotation applies to the translated point, not the reverse
        assert!(baked.abs_diff_eq(Vec3::Y, 1e-6));
    }

    #[test]
    fn test_unknown_name_is_identity() {
        let globals = GlobalTransforms::compute(&SceneNode::new("root"));
        assert_eq!(globals.get("phantom"), Mat4::IDENTITY);
    }

    #[test]
    fn test_first_write_wins_for_duplicate_names() {
        let mut root = SceneNode::new("root");
        let mut first = SceneNode::new("twin");
        first.transform = Mat4::from_translation(Vec3::X);
        let mut second = SceneNode::new("twin");
        second.transform = Mat4::from_translation(Vec3::Y);
        root.children.push(first);
        root.children.push(second);

        let globals = GlobalTransforms::compute(&root);
        assert_eq!(globals.get("twin").transform_point3(Vec3::ZERO), Vec3::X);
    }

    #[test]
    fn test_children_inherit_the_first_holder() {
        // The leaf hangs under the second twin but resolves its parent
        // global by name, landing on the first twin's transform
        let mut root = SceneNode::new("root");
        let mut first = SceneNode::new("twin");
        first.transform = Mat4::from_translation(Vec3::X);
        let mut second = SceneNode::new("twin");
        second.transform = Mat4::from_translation(Vec3::Y);
        second.children.push(SceneNode::new("leaf"));
        root.children.push(first);
        root.children.push(second);

        let globals = GlobalTransforms::compute(&root);
        assert_eq!(globals.get("leaf").transform_point3(Vec3::ZERO), Vec3::X);
    }
}
