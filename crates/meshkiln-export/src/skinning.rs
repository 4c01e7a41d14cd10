//! Skin weight consolidation
//!
//! Sources deliver skinning bone-centric: each bone lists the vertices
//! it influences. GPU skinning wants the transpose, per-vertex bone
//! slots with aligned weights. This module flips the mapping, keeping
//! at most four influences per vertex.

use glam::Mat4;
use meshkiln_scene::Mesh;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Influences kept per vertex
pub const MAX_INFLUENCES: usize = 4;

/// Packed per-vertex skinning attributes
///
/// `indices` holds four submesh-local bone slots, one byte each, with
/// the first influence in the lowest byte. `weights` aligns with the
/// packed slots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VertexInfluences {
    pub indices: u32,
    pub weights: [f32; 4],
}

/// Consolidated per-vertex skinning for one mesh
#[derive(Debug, Clone)]
pub struct MeshSkin {
    /// One entry per vertex, defaulted where nothing influences it
    pub influences: Vec<VertexInfluences>,
    /// Bone names in submesh-local slot order
    pub bone_names: Vec<String>,
    /// Inverse bind-pose matrices aligned with `bone_names`
    pub bone_offsets: Vec<Mat4>,
    /// Influences discarded because their vertex already had four
    pub dropped: usize,
}

/// Flip a mesh's bone-centric weights into per-vertex form
///
/// Weights past the fourth influence of a vertex are dropped without
/// renormalizing the ones already packed. Weights naming a vertex the
/// mesh does not have are skipped.
pub fn consolidate(mesh: &Mesh) -> MeshSkin {
    let mut influences = vec![VertexInfluences::default(); mesh.vertex_count()];
    let mut filled = vec![0u8; mesh.vertex_count()];
    let mut dropped = 0usize;

    for (slot, bone) in mesh.bones.iter().enumerate() {
        for entry in &bone.weights {
            let vertex = entry.vertex as usize;
            let Some(influence) = influences.get_mut(vertex) else {
                warn!(
                    mesh = %mesh.name,
                    bone = %bone.name,
                    vertex = entry.vertex,
                    "skin weight references a vertex outside the mesh, skipped"
                );
                continue;
            };
            let count = usize::from(filled[vertex]);
            if count >= MAX_INFLUENCES {
                dropped += 1;
                warn!(
                    mesh = %mesh.name,
                    bone = %bone.name,
                    vertex = entry.vertex,
                    "vertex already carries four influences, extra influence dropped"
                );
                continue;
            }
            influence.indices |= ((slot as u32) & 0xFF) << (8 * count as u32);
            influence.weights[count] = entry.weight;
            filled[vertex] += 1;
        }
    }

    MeshSkin {
        influences,
        bone_names: mesh.bones.iter().map(|b| b.name.clone()).collect(),
        bone_offsets: mesh.bones.iter().map(|b| b.offset).collect(),
        dropped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshkiln_scene::{BoneBinding, VertexWeight};

    fn weighted_bone(name: &str, weights: &[(u32, f32)]) -> BoneBinding {
        let mut bone = BoneBinding::new(name);
        bone.weights = weights
            .iter()
            .map(|&(vertex, weight)| VertexWeight { vertex, weight })
            .collect();
        bone
    }

    fn skinned_mesh(bones: Vec<BoneBinding>) -> Mesh {
        let mut mesh = Mesh::new("skinned", 0);
        mesh.positions = vec![glam::Vec3::ZERO; 3];
        mesh.faces = vec![[0, 1, 2]];
        mesh.bones = bones;
        mesh
    }

    #[test]
    fn test_influences_pack_in_arrival_order() {
        let mesh = skinned_mesh(vec![
            weighted_bone("hip", &[(0, 0.75), (1, 1.0)]),
            weighted_bone("knee", &[(0, 0.25)]),
        ]);

        let skin = consolidate(&mesh);
        assert_eq!(skin.dropped, 0);
        assert_eq!(skin.bone_names, ["hip", "knee"]);

        // Vertex 0: slot 0 in byte 0, slot 1 in byte 1
        assert_eq!(skin.influences[0].indices, 0x0000_0100);
        assert_eq!(skin.influences[0].weights, [0.75, 0.25, 0.0, 0.0]);

        // Vertex 1 only sees the first bone
        assert_eq!(skin.influences[1].indices, 0);
        assert_eq!(skin.influences[1].weights, [1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_fifth_influence_is_dropped() {
        let bones = (0..5)
            .map(|i| weighted_bone(&format!("bone{i}"), &[(0, 0.2)]))
            .collect();

        let skin = consolidate(&skinned_mesh(bones));
        assert_eq!(skin.dropped, 1);

        let packed = skin.influences[0];
        assert_eq!(packed.indices, u32::from_le_bytes([0, 1, 2, 3]));
        assert_eq!(packed.weights, [0.2; 4]);
    }

    #[test]
    fn test_unweighted_vertex_keeps_defaults() {
        let mesh = skinned_mesh(vec![weighted_bone("hip", &[(1, 1.0)])]);
        let skin = consolidate(&mesh);

        assert_eq!(skin.influences[0], VertexInfluences::default());
        assert_eq!(skin.influences[0].weights, [0.0; 4]);
    }

    #[test]
    fn test_out_of_range_vertex_is_skipped() {
        let mesh = skinned_mesh(vec![weighted_bone("hip", &[(7, 1.0), (2, 0.5)])]);
        let skin = consolidate(&mesh);

        // The bad reference neither panics nor consumes a slot
        assert_eq!(skin.dropped, 0);
        assert_eq!(skin.influences[2].weights[0], 0.5);
    }

    #[test]
    fn test_slot_bytes_wrap_past_255() {
        let mut bones: Vec<BoneBinding> = (0..=256)
            .map(|i| weighted_bone(&format!("bone{i}"), &[]))
            .collect();
        bones[256].weights.push(VertexWeight {
            vertex: 0,
            weight: 1.0,
        });

        let skin = consolidate(&skinned_mesh(bones));
        assert_eq!(skin.influences[0].indices, 0);
        assert_eq!(skin.influences[0].weights[0], 1.0);
    }
}
