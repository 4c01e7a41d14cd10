//! Binary artifact deserialization
//!
//! Mirrors the writer field for field. Reads are incremental, so a
//! truncated artifact surfaces as an I/O error at the first field past
//! the end, and counts only preallocate up to a fixed cap so a corrupt
//! header cannot balloon memory before the stream runs dry.

use std::io::Read;

use byteorder::{NativeEndian, ReadBytesExt};
use glam::{Mat4, Quat, Vec2, Vec3};
use meshkiln_core::{Error, Result};
use meshkiln_scene::{QuatKey, VectorKey};

use crate::artifact::{
    AnimationClip, AnimationClipArtifact, BoneEntry, ClipChannel, RiggedMeshArtifact,
    RiggedSubmesh, RiggedVertex, StaticMeshArtifact, StaticSubmesh, StaticVertex,
};

/// Elements preallocated per sequence before the stream proves more
const PREALLOC_CAP: usize = 1 << 16;

/// Longest accepted string, in bytes
const MAX_STRING: usize = 1 << 16;

/// Deserialize a static mesh artifact
pub fn read_static<R: Read>(reader: &mut R) -> Result<StaticMeshArtifact> {
    let submesh_count = read_count(reader)?;
    let mut submeshes = Vec::with_capacity(submesh_count.min(PREALLOC_CAP));
    for _ in 0..submesh_count {
        submeshes.push(StaticSubmesh {
            name: read_string(reader)?,
            index_count: reader.read_u32::<NativeEndian>()?,
            start_index: reader.read_u32::<NativeEndian>()?,
            base_vertex: reader.read_u32::<NativeEndian>()?,
            diffuse_texture: read_string(reader)?,
            normal_texture: read_string(reader)?,
        });
    }

    let vertex_count = read_count(reader)?;
    let mut vertices = Vec::with_capacity(vertex_count.min(PREALLOC_CAP));
    for _ in 0..vertex_count {
        vertices.push(StaticVertex {
            position: read_vec3(reader)?,
            uv: read_vec2(reader)?,
            normal: read_vec3(reader)?,
            tangent: read_vec3(reader)?,
        });
    }

    let indices = read_indices(reader)?;
    Ok(StaticMeshArtifact {
        submeshes,
        vertices,
        indices,
    })
}

/// Deserialize a rigged mesh artifact
pub fn read_rigged<R: Read>(reader: &mut R) -> Result<RiggedMeshArtifact> {
    let (bones, parents) = read_bones(reader)?;

    let submesh_count = read_count(reader)?;
    let mut submeshes = Vec::with_capacity(submesh_count.min(PREALLOC_CAP));
    for _ in 0..submesh_count {
        let name = read_string(reader)?;
        let index_count = reader.read_u32::<NativeEndian>()?;
        let start_index = reader.read_u32::<NativeEndian>()?;
        let base_vertex = reader.read_u32::<NativeEndian>()?;
        let node_id = reader.read_i32::<NativeEndian>()?;

        let bone_count = read_count(reader)?;
        let mut bone_names = Vec::with_capacity(bone_count.min(PREALLOC_CAP));
        for _ in 0..bone_count {
            bone_names.push(read_string(reader)?);
        }
        let mut bone_offsets = Vec::with_capacity(bone_count.min(PREALLOC_CAP));
        for _ in 0..bone_count {
            bone_offsets.push(read_mat4(reader)?);
        }

        submeshes.push(RiggedSubmesh {
            name,
            index_count,
            start_index,
            base_vertex,
            node_id,
            bone_names,
            bone_offsets,
        });
    }

    let vertex_count = read_count(reader)?;
    let mut vertices = Vec::with_capacity(vertex_count.min(PREALLOC_CAP));
    for _ in 0..vertex_count {
        vertices.push(RiggedVertex {
            position: read_vec3(reader)?,
            uv: read_vec2(reader)?,
            normal: read_vec3(reader)?,
            tangent: read_vec3(reader)?,
            bone_indices: reader.read_u32::<NativeEndian>()?,
            bone_weights: read_weights(reader)?,
        });
    }

    let indices = read_indices(reader)?;
    Ok(RiggedMeshArtifact {
        bones,
        parents,
        submeshes,
        vertices,
        indices,
    })
}

/// Deserialize an animation clip artifact
pub fn read_animation<R: Read>(reader: &mut R) -> Result<AnimationClipArtifact> {
    let (bones, parents) = read_bones(reader)?;

    let animation_count = read_count(reader)?;
    let mut animations = Vec::with_capacity(animation_count.min(PREALLOC_CAP));
    for _ in 0..animation_count {
        let name = read_string(reader)?;
        let ticks_per_second = reader.read_f32::<NativeEndian>()?;
        let duration = reader.read_f32::<NativeEndian>()?;

        let channel_count = read_count(reader)?;
        let mut channels = Vec::with_capacity(channel_count.min(PREALLOC_CAP));
        for _ in 0..channel_count {
            channels.push(ClipChannel {
                name: read_string(reader)?,
                position_keys: read_vector_keys(reader)?,
                rotation_keys: read_quat_keys(reader)?,
                scale_keys: read_vector_keys(reader)?,
            });
        }

        animations.push(AnimationClip {
            name,
            ticks_per_second,
            duration,
            channels,
        });
    }

    Ok(AnimationClipArtifact {
        bones,
        parents,
        animations,
    })
}

/// Read the shared bone block: entries, then bare parent indices
fn read_bones<R: Read>(reader: &mut R) -> Result<(Vec<BoneEntry>, Vec<i32>)> {
    let bone_count = read_count(reader)?;
    let mut bones = Vec::with_capacity(bone_count.min(PREALLOC_CAP));
    for _ in 0..bone_count {
        bones.push(BoneEntry {
            name: read_string(reader)?,
            transform: read_mat4(reader)?,
        });
    }

    let mut parents = Vec::with_capacity(bone_count.min(PREALLOC_CAP));
    for _ in 0..bone_count {
        parents.push(reader.read_i32::<NativeEndian>()?);
    }
    Ok((bones, parents))
}

fn read_count<R: Read>(reader: &mut R) -> Result<usize> {
    let count = reader.read_u64::<NativeEndian>()?;
    usize::try_from(count)
        .map_err(|_| Error::invalid_artifact(format!("count {count} exceeds addressable memory")))
}

fn read_string<R: Read>(reader: &mut R) -> Result<String> {
    let length = read_count(reader)?;
    if length > MAX_STRING {
        return Err(Error::invalid_artifact(format!(
            "string of {length} bytes is not plausible for a name or path"
        )));
    }
    let mut buffer = vec![0u8; length];
    reader.read_exact(&mut buffer)?;
    String::from_utf8(buffer).map_err(|_| Error::invalid_artifact("string is not valid UTF-8"))
}

fn read_vec2<R: Read>(reader: &mut R) -> Result<Vec2> {
    Ok(Vec2::new(
        reader.read_f32::<NativeEndian>()?,
        reader.read_f32::<NativeEndian>()?,
    ))
}

fn read_vec3<R: Read>(reader: &mut R) -> Result<Vec3> {
    Ok(Vec3::new(
        reader.read_f32::<NativeEndian>()?,
        reader.read_f32::<NativeEndian>()?,
        reader.read_f32::<NativeEndian>()?,
    ))
}

fn read_quat<R: Read>(reader: &mut R) -> Result<Quat> {
    Ok(Quat::from_xyzw(
        reader.read_f32::<NativeEndian>()?,
        reader.read_f32::<NativeEndian>()?,
        reader.read_f32::<NativeEndian>()?,
        reader.read_f32::<NativeEndian>()?,
    ))
}

fn read_mat4<R: Read>(reader: &mut R) -> Result<Mat4> {
    let mut elements = [0.0f32; 16];
    for element in &mut elements {
        *element = reader.read_f32::<NativeEndian>()?;
    }
    Ok(Mat4::from_cols_array(&elements))
}

fn read_weights<R: Read>(reader: &mut R) -> Result<[f32; 4]> {
    let mut weights = [0.0f32; 4];
    for weight in &mut weights {
        *weight = reader.read_f32::<NativeEndian>()?;
    }
    Ok(weights)
}

fn read_indices<R: Read>(reader: &mut R) -> Result<Vec<u32>> {
    let index_count = read_count(reader)?;
    let mut indices = Vec::with_capacity(index_count.min(PREALLOC_CAP));
    for _ in 0..index_count {
        indices.push(reader.read_u32::<NativeEndian>()?);
    }
    Ok(indices)
}

fn read_vector_keys<R: Read>(reader: &mut R) -> Result<Vec<VectorKey>> {
    let key_count = read_count(reader)?;
    let mut keys = Vec::with_capacity(key_count.min(PREALLOC_CAP));
    for _ in 0..key_count {
        keys.push(VectorKey {
            time: reader.read_f32::<NativeEndian>()?,
            value: read_vec3(reader)?,
        });
    }
    Ok(keys)
}

fn read_quat_keys<R: Read>(reader: &mut R) -> Result<Vec<QuatKey>> {
    let key_count = read_count(reader)?;
    let mut keys = Vec::with_capacity(key_count.min(PREALLOC_CAP));
    for _ in 0..key_count {
        keys.push(QuatKey {
            time: reader.read_f32::<NativeEndian>()?,
            value: read_quat(reader)?,
        });
    }
    Ok(keys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer;
    use std::io::Cursor;

    fn fixture_bones() -> (Vec<BoneEntry>, Vec<i32>) {
        (
            vec![
                BoneEntry {
                    name: "root".to_string(),
                    transform: Mat4::IDENTITY,
                },
                BoneEntry {
                    name: "spine".to_string(),
                    transform: Mat4::from_translation(Vec3::new(0.0, 1.5, 0.0)),
                },
            ],
            vec![-1, 0],
        )
    }

    fn rigged_fixture() -> RiggedMeshArtifact {
        let (bones, parents) = fixture_bones();
        RiggedMeshArtifact {
            bones,
            parents,
            submeshes: vec![RiggedSubmesh {
                name: "spine".to_string(),
                index_count: 6,
                start_index: 0,
                base_vertex: 0,
                node_id: 1,
                bone_names: vec!["root".to_string(), "spine".to_string()],
                bone_offsets: vec![Mat4::IDENTITY, Mat4::from_translation(Vec3::NEG_Y)],
            }],
            vertices: (0..4)
                .map(|i| RiggedVertex {
                    position: Vec3::new(i as f32, 0.0, 0.0),
                    uv: Vec2::new(0.25 * i as f32, 0.5),
                    normal: Vec3::Z,
                    tangent: Vec3::X,
                    bone_indices: 0x0100,
                    bone_weights: [0.5, 0.5, 0.0, 0.0],
                })
                .collect(),
            indices: vec![0, 1, 2, 2, 1, 3],
        }
    }

    #[test]
    fn test_static_round_trip() {
        let artifact = StaticMeshArtifact {
            submeshes: vec![StaticSubmesh {
                name: "hull".to_string(),
                index_count: 6,
                start_index: 0,
                base_vertex: 0,
                diffuse_texture: "hull_d.png".to_string(),
                normal_texture: "hull_n.png".to_string(),
            }],
            vertices: (0..4)
                .map(|i| StaticVertex {
                    position: Vec3::new(i as f32, 1.0, -1.0),
                    uv: Vec2::splat(0.5),
                    normal: Vec3::Y,
                    tangent: Vec3::X,
                })
                .collect(),
            indices: vec![0, 1, 2, 2, 1, 3],
        };

        let mut bytes = Vec::new();
        writer::write_static(&mut bytes, &artifact).unwrap();

        let restored = read_static(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(restored, artifact);
    }

    #[test]
    fn test_rigged_round_trip() {
        let artifact = rigged_fixture();
        let mut bytes = Vec::new();
        writer::write_rigged(&mut bytes, &artifact).unwrap();

        let restored = read_rigged(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(restored, artifact);
    }

    #[test]
    fn test_animation_round_trip() {
        let (bones, parents) = fixture_bones();
        let artifact = AnimationClipArtifact {
            bones,
            parents,
            animations: vec![AnimationClip {
                name: "walk".to_string(),
                ticks_per_second: 30.0,
                duration: 60.0,
                channels: vec![
                    ClipChannel::default(),
                    ClipChannel {
                        name: "spine".to_string(),
                        position_keys: vec![
                            VectorKey {
                                time: 0.0,
                                value: Vec3::ZERO,
                            },
                            VectorKey {
                                time: 30.0,
                                value: Vec3::Y,
                            },
                        ],
                        rotation_keys: vec![QuatKey {
                            time: 0.0,
                            value: Quat::from_rotation_z(0.5),
                        }],
                        scale_keys: Vec::new(),
                    },
                ],
            }],
        };

        let mut bytes = Vec::new();
        writer::write_animation(&mut bytes, &artifact).unwrap();

        let restored = read_animation(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(restored, artifact);
    }

    #[test]
    fn test_truncated_artifact_reports_io() {
        let mut bytes = Vec::new();
        writer::write_rigged(&mut bytes, &rigged_fixture()).unwrap();
        bytes.truncate(bytes.len() / 2);

        let error = read_rigged(&mut Cursor::new(bytes)).unwrap_err();
        assert!(error.is_io());
    }

    #[test]
    fn test_invalid_utf8_is_rejected() {
        let mut bytes = Vec::new();
        bytes.extend(1u64.to_ne_bytes());
        bytes.extend(2u64.to_ne_bytes());
        bytes.extend([0xFF, 0xFE]);

        let error = read_static(&mut Cursor::new(bytes)).unwrap_err();
        assert!(error.is_invalid_artifact());
    }

    #[test]
    fn test_absurd_string_length_is_rejected() {
        let mut bytes = Vec::new();
        bytes.extend(1u64.to_ne_bytes());
        bytes.extend(u64::MAX.to_ne_bytes());

        let error = read_static(&mut Cursor::new(bytes)).unwrap_err();
        assert!(error.is_invalid_artifact());
    }

    #[test]
    fn test_huge_count_fails_before_exhausting_memory() {
        // A submesh count far beyond what the stream could ever hold
        let mut bytes = Vec::new();
        bytes.extend(u64::MAX.to_ne_bytes());

        let error = read_static(&mut Cursor::new(bytes)).unwrap_err();
        assert!(error.is_io() || error.is_invalid_artifact());
    }
}
