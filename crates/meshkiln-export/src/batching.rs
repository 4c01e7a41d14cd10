//! Submesh batching
//!
//! Builds the drawable payload for both mesh artifacts. The static
//! path merges every instance of a material into one submesh over
//! shared buffers, baking node transforms into the vertices. The
//! rigged path keeps one submesh per (node, mesh) attachment with
//! vertices left in node-local space for runtime posing.

use std::collections::VecDeque;

use meshkiln_scene::Scene;
use tracing::warn;

use crate::artifact::{
    RiggedMeshArtifact, RiggedSubmesh, RiggedVertex, StaticMeshArtifact, StaticSubmesh,
    StaticVertex,
};
use crate::baking::GlobalTransforms;
use crate::hierarchy::Hierarchy;
use crate::skinning::consolidate;

/// A mesh occurrence discovered while walking the scene
#[derive(Debug, Clone)]
struct MeshInstance {
    material: usize,
    mesh: usize,
    node: String,
}

/// Build the static artifact for a scene
///
/// Instances are gathered breadth-first, stable-sorted by material and
/// merged into one submesh per run, so every instance sharing a
/// material becomes part of a single draw call while ties keep their
/// encounter order.
pub fn build_static(scene: &Scene) -> StaticMeshArtifact {
    let mut instances = collect_instances(scene);
    instances.sort_by_key(|instance| instance.material);

    let globals = GlobalTransforms::compute(&scene.root);
    batch_instances(scene, &instances, &globals)
}

/// Build the rigged artifact for a scene
///
/// Submeshes appear in hierarchy visit order, one per attachment, and
/// carry their own bone tables. Returns the artifact together with the
/// number of influences dropped during weight consolidation.
pub fn build_rigged(scene: &Scene, hierarchy: &Hierarchy) -> (RiggedMeshArtifact, usize) {
    let mut artifact = RiggedMeshArtifact {
        bones: hierarchy.bone_entries(),
        parents: hierarchy.parent_indices(),
        submeshes: Vec::with_capacity(hierarchy.attachments.len()),
        vertices: Vec::new(),
        indices: Vec::new(),
    };
    let mut dropped = 0usize;
    let mut vertex_cursor = 0u32;
    let mut index_cursor = 0u32;

    for attachment in &hierarchy.attachments {
        let Some(mesh) = scene.meshes.get(attachment.mesh) else {
            warn!(
                mesh = attachment.mesh,
                "attachment references a mesh the scene does not have, skipped"
            );
            continue;
        };
        let name = hierarchy.bones[attachment.node].name.clone();
        let node_id = hierarchy.find(&name).map_or(-1, |id| id as i32);
        let skin = consolidate(mesh);
        dropped += skin.dropped;

        artifact.submeshes.push(RiggedSubmesh {
            name,
            index_count: mesh.index_count() as u32,
            start_index: index_cursor,
            base_vertex: vertex_cursor,
            node_id,
            bone_names: skin.bone_names,
            bone_offsets: skin.bone_offsets,
        });

        // Indices stay mesh-local; the base vertex carries the offset
        for face in &mesh.faces {
            artifact.indices.extend_from_slice(face);
        }
        for (i, &position) in mesh.positions.iter().enumerate() {
            let influence = skin.influences.get(i).copied().unwrap_or_default();
            artifact.vertices.push(RiggedVertex {
                position,
                uv: mesh.uvs.get(i).copied().unwrap_or_default(),
                normal: mesh.normals.get(i).copied().unwrap_or_default(),
                tangent: mesh.tangents.get(i).copied().unwrap_or_default(),
                bone_indices: influence.indices,
                bone_weights: influence.weights,
            });
        }

        vertex_cursor += mesh.vertex_count() as u32;
        index_cursor += mesh.index_count() as u32;
    }

    (artifact, dropped)
}

/// Gather (material, mesh, node) instances breadth-first
fn collect_instances(scene: &Scene) -> Vec<MeshInstance> {
    let mut instances = Vec::new();
    let mut queue = VecDeque::from([&scene.root]);

    while let Some(node) = queue.pop_front() {
        for &mesh in &node.meshes {
            let Some(referenced) = scene.meshes.get(mesh) else {
                warn!(
                    node = %node.name,
                    mesh,
                    "node references a mesh the scene does not have, skipped"
                );
                continue;
            };
            instances.push(MeshInstance {
                material: referenced.material,
                mesh,
                node: node.name.clone(),
            });
        }
        queue.extend(node.children.iter());
    }

    instances
}

/// Merge a material-sorted instance sequence into submesh runs
fn batch_instances(
    scene: &Scene,
    instances: &[MeshInstance],
    globals: &GlobalTransforms,
) -> StaticMeshArtifact {
    let mut artifact = StaticMeshArtifact::default();
    let mut current_material = None;
    let mut vertex_cursor = 0u32;
    let mut index_cursor = 0u32;

    for instance in instances {
        let mesh = &scene.meshes[instance.mesh];

        if current_material != Some(instance.material) {
            let (diffuse_texture, normal_texture) = texture_paths(scene, instance.material);
            artifact.submeshes.push(StaticSubmesh {
                name: instance.node.clone(),
                index_count: 0,
                start_index: index_cursor,
                base_vertex: vertex_cursor,
                diffuse_texture,
                normal_texture,
            });
            current_material = Some(instance.material);
        }
        let slot = artifact.submeshes.len() - 1;

        // Later instances in a run address vertices past the run's base
        let local_base = vertex_cursor - artifact.submeshes[slot].base_vertex;
        for face in &mesh.faces {
            for &index in face {
                artifact.indices.push(index + local_base);
            }
        }
        artifact.submeshes[slot].index_count += mesh.index_count() as u32;

        let global = globals.get(&instance.node);
        for (i, &position) in mesh.positions.iter().enumerate() {
            artifact.vertices.push(StaticVertex {
                position: global.transform_point3(position),
                uv: mesh.uvs.get(i).copied().unwrap_or_default(),
                normal: mesh
                    .normals
                    .get(i)
                    .map(|&normal| global.transform_vector3(normal))
                    .unwrap_or_default(),
                tangent: mesh
                    .tangents
                    .get(i)
                    .map(|&tangent| global.transform_vector3(tangent))
                    .unwrap_or_default(),
            });
        }

        vertex_cursor += mesh.vertex_count() as u32;
        index_cursor += mesh.index_count() as u32;
    }

    artifact
}

/// Resolve a material's texture paths, empty when absent
fn texture_paths(scene: &Scene, material: usize) -> (String, String) {
    scene.materials.get(material).map_or_else(
        || (String::new(), String::new()),
        |material| {
            (
                material.diffuse_texture.clone().unwrap_or_default(),
                material.normal_texture.clone().unwrap_or_default(),
            )
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Mat4, Vec2, Vec3};
    use meshkiln_scene::{BoneBinding, Material, Mesh, SceneNode, VertexWeight};

    fn tri_mesh(name: &str, material: usize) -> Mesh {
        let mut mesh = Mesh::new(name, material);
        mesh.positions = vec![Vec3::ZERO, Vec3::X, Vec3::Y];
        mesh.normals = vec![Vec3::Z; 3];
        mesh.uvs = vec![Vec2::ZERO, Vec2::X, Vec2::Y];
        mesh.faces = vec![[0, 1, 2]];
        mesh
    }

    fn skinned_tri(name: &str, bone: &str) -> Mesh {
        let mut mesh = tri_mesh(name, 0);
        let mut binding = BoneBinding::new(bone);
        binding.weights = (0..3)
            .map(|vertex| VertexWeight {
                vertex,
                weight: 1.0,
            })
            .collect();
        mesh.bones.push(binding);
        mesh
    }

    fn scene_with(root: SceneNode, meshes: Vec<Mesh>, materials: Vec<Material>) -> Scene {
        let mut scene = Scene::new(root);
        scene.meshes = meshes;
        scene.materials = materials;
        scene
    }

    #[test]
    fn test_same_material_instances_merge() {
        let mut left = SceneNode::new("left");
        left.meshes.push(0);
        let mut right = SceneNode::new("right");
        right.meshes.push(0);
        let mut root = SceneNode::new("root");
        root.children.extend([left, right]);

        let scene = scene_with(root, vec![tri_mesh("tri", 0)], vec![Material::new("mat")]);
        let artifact = build_static(&scene);

        assert_eq!(artifact.submeshes.len(), 1);
        assert_eq!(artifact.vertices.len(), 6);
        assert_eq!(artifact.indices, [0, 1, 2, 3, 4, 5]);

        let submesh = &artifact.submeshes[0];
        assert_eq!(submesh.name, "left");
        assert_eq!(submesh.index_count, 6);
        assert_eq!(submesh.start_index, 0);
        assert_eq!(submesh.base_vertex, 0);
    }

    #[test]
    fn test_material_runs_follow_encounter_order() {
        // Walk order is a(mat 1), b(mat 0), c(mat 1); the sort is
        // stable so the mat-1 run keeps a before c and takes a's name
        let mut a = SceneNode::new("a");
        a.meshes.push(0);
        let mut b = SceneNode::new("b");
        b.meshes.push(1);
        let mut c = SceneNode::new("c");
        c.meshes.push(0);
        let mut root = SceneNode::new("root");
        root.children.extend([a, b, c]);

        let meshes = vec![tri_mesh("one", 1), tri_mesh("zero", 0)];
        let scene = scene_with(
            root,
            meshes,
            vec![Material::new("m0"), Material::new("m1")],
        );
        let artifact = build_static(&scene);

        assert_eq!(artifact.submeshes.len(), 2);
        assert_eq!(artifact.submeshes[0].name, "b");
        assert_eq!(artifact.submeshes[1].name, "a");
        assert_eq!(artifact.submeshes[0].start_index, 0);
        assert_eq!(artifact.submeshes[0].base_vertex, 0);
        assert_eq!(artifact.submeshes[1].start_index, 3);
        assert_eq!(artifact.submeshes[1].base_vertex, 3);
        assert_eq!(artifact.submeshes[1].index_count, 6);
    }

    #[test]
    fn test_vertices_bake_node_transforms() {
        let mut node = SceneNode::new("node");
        node.transform = Mat4::from_translation(Vec3::new(0.0, 0.0, 5.0));
        node.meshes.push(0);
        let mut root = SceneNode::new("root");
        root.children.push(node);

        let scene = scene_with(root, vec![tri_mesh("tri", 0)], vec![Material::new("m")]);
        let artifact = build_static(&scene);

        // Positions pick up the translation; direction vectors do not
        assert_eq!(artifact.vertices[1].position, Vec3::new(1.0, 0.0, 5.0));
        assert_eq!(artifact.vertices[1].normal, Vec3::Z);
        assert_eq!(artifact.vertices[1].uv, Vec2::X);
    }

    #[test]
    fn test_missing_attributes_default_to_zero() {
        let mut bare = Mesh::new("bare", 0);
        bare.positions = vec![Vec3::X];
        bare.faces = vec![[0, 0, 0]];
        let mut root = SceneNode::new("root");
        root.meshes.push(0);

        let scene = scene_with(root, vec![bare], vec![Material::new("m")]);
        let artifact = build_static(&scene);

        assert_eq!(artifact.vertices[0].normal, Vec3::ZERO);
        assert_eq!(artifact.vertices[0].tangent, Vec3::ZERO);
        assert_eq!(artifact.vertices[0].uv, Vec2::ZERO);
    }

    #[test]
    fn test_submesh_textures_resolve_once() {
        let mut textured = Material::new("textured");
        textured.diffuse_texture = Some("skin/diffuse.png".to_string());
        textured.normal_texture = Some("skin/normal.png".to_string());

        let mut node = SceneNode::new("node");
        node.meshes.extend([0, 1]);

        let meshes = vec![tri_mesh("t", 0), tri_mesh("u", 1)];
        let scene = scene_with(node, meshes, vec![textured]);
        let artifact = build_static(&scene);

        assert_eq!(artifact.submeshes[0].diffuse_texture, "skin/diffuse.png");
        assert_eq!(artifact.submeshes[0].normal_texture, "skin/normal.png");
        // Material 1 does not exist; paths stay empty
        assert_eq!(artifact.submeshes[1].diffuse_texture, "");
        assert_eq!(artifact.submeshes[1].normal_texture, "");
    }

    #[test]
    fn test_indices_stay_inside_their_submesh_span() {
        let mut quad = Mesh::new("quad", 2);
        quad.positions = vec![Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::ONE];
        quad.faces = vec![[0, 1, 2], [2, 1, 3]];

        let mut a = SceneNode::new("a");
        a.meshes.extend([0, 1]);
        let mut b = SceneNode::new("b");
        b.meshes.extend([2, 0]);
        let mut root = SceneNode::new("root");
        root.children.extend([a, b]);

        let meshes = vec![tri_mesh("t1", 1), quad, tri_mesh("t0", 0)];
        let scene = scene_with(
            root,
            meshes,
            vec![Material::new("m0"), Material::new("m1"), Material::new("m2")],
        );
        let artifact = build_static(&scene);
        assert_eq!(artifact.submeshes.len(), 3);

        for (i, submesh) in artifact.submeshes.iter().enumerate() {
            let vertex_end = artifact
                .submeshes
                .get(i + 1)
                .map_or(artifact.vertices.len() as u32, |next| next.base_vertex);
            let start = submesh.start_index as usize;
            let end = start + submesh.index_count as usize;
            for &index in &artifact.indices[start..end] {
                assert!(submesh.base_vertex + index < vertex_end);
            }
        }
    }

    #[test]
    fn test_rigged_submeshes_follow_hierarchy_order() {
        let mut left = SceneNode::new("left");
        left.meshes.push(0);
        let mut right = SceneNode::new("right");
        right.meshes.push(1);
        let mut root = SceneNode::new("root");
        root.children.extend([left, right]);

        let meshes = vec![skinned_tri("lm", "left"), skinned_tri("rm", "right")];
        let scene = scene_with(root, meshes, vec![Material::new("m")]);
        let hierarchy = Hierarchy::flatten(&scene.root);
        let (artifact, dropped) = build_rigged(&scene, &hierarchy);

        assert_eq!(dropped, 0);
        assert_eq!(artifact.bones.len(), 3);
        assert_eq!(artifact.parents, [-1, 0, 0]);

        // Flattening visits right before left
        assert_eq!(artifact.submeshes.len(), 2);
        assert_eq!(artifact.submeshes[0].name, "right");
        assert_eq!(artifact.submeshes[0].node_id, 1);
        assert_eq!(artifact.submeshes[1].name, "left");
        assert_eq!(artifact.submeshes[1].node_id, 2);

        assert_eq!(artifact.submeshes[1].start_index, 3);
        assert_eq!(artifact.submeshes[1].base_vertex, 3);
        assert_eq!(artifact.indices, [0, 1, 2, 0, 1, 2]);

        assert_eq!(artifact.submeshes[0].bone_names, ["right"]);
        assert_eq!(artifact.submeshes[1].bone_names, ["left"]);
    }

    #[test]
    fn test_rigged_vertices_carry_influences() {
        let mut node = SceneNode::new("node");
        node.transform = Mat4::from_translation(Vec3::Z);
        node.meshes.push(0);

        let scene = scene_with(node, vec![skinned_tri("sm", "node")], Vec::new());
        let hierarchy = Hierarchy::flatten(&scene.root);
        let (artifact, _) = build_rigged(&scene, &hierarchy);

        // Node-local space: the transform is not baked in
        assert_eq!(artifact.vertices[1].position, Vec3::X);
        assert_eq!(artifact.vertices[1].bone_indices, 0);
        assert_eq!(artifact.vertices[1].bone_weights, [1.0, 0.0, 0.0, 0.0]);
        assert_eq!(artifact.submeshes[0].bone_offsets, [Mat4::IDENTITY]);
    }

    #[test]
    fn test_rigged_dropped_influences_accumulate() {
        let mut mesh = tri_mesh("over", 0);
        for i in 0..5 {
            let mut binding = BoneBinding::new(format!("b{i}"));
            binding.weights.push(VertexWeight {
                vertex: 0,
                weight: 0.2,
            });
            mesh.bones.push(binding);
        }
        let mut root = SceneNode::new("root");
        root.meshes.push(0);

        let scene = scene_with(root, vec![mesh], Vec::new());
        let hierarchy = Hierarchy::flatten(&scene.root);
        let (_, dropped) = build_rigged(&scene, &hierarchy);

        assert_eq!(dropped, 1);
    }
}
