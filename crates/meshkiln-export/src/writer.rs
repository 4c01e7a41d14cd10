//! Binary artifact serialization
//!
//! All three layouts are positional and versionless: no magic, no
//! header, native endianness. Strings are a u64 byte length followed
//! by UTF-8 bytes; sequences are a u64 element count followed by the
//! elements. Matrices serialize as 16 floats in column-major order,
//! quaternions as x, y, z, w.

use std::io::{self, Write};

use byteorder::{NativeEndian, WriteBytesExt};
use glam::{Mat4, Quat, Vec2, Vec3};
use meshkiln_scene::{QuatKey, VectorKey};

use crate::artifact::{AnimationClipArtifact, BoneEntry, RiggedMeshArtifact, StaticMeshArtifact};

/// Serialize a static mesh artifact
pub fn write_static<W: Write>(writer: &mut W, artifact: &StaticMeshArtifact) -> io::Result<()> {
    write_count(writer, artifact.submeshes.len())?;
    for submesh in &artifact.submeshes {
        write_string(writer, &submesh.name)?;
        writer.write_u32::<NativeEndian>(submesh.index_count)?;
        writer.write_u32::<NativeEndian>(submesh.start_index)?;
        writer.write_u32::<NativeEndian>(submesh.base_vertex)?;
        write_string(writer, &submesh.diffuse_texture)?;
        write_string(writer, &submesh.normal_texture)?;
    }

    write_count(writer, artifact.vertices.len())?;
    for vertex in &artifact.vertices {
        write_vec3(writer, vertex.position)?;
        write_vec2(writer, vertex.uv)?;
        write_vec3(writer, vertex.normal)?;
        write_vec3(writer, vertex.tangent)?;
    }

    write_count(writer, artifact.indices.len())?;
    for &index in &artifact.indices {
        writer.write_u32::<NativeEndian>(index)?;
    }
    Ok(())
}

/// Serialize a rigged mesh artifact
pub fn write_rigged<W: Write>(writer: &mut W, artifact: &RiggedMeshArtifact) -> io::Result<()> {
    write_bones(writer, &artifact.bones, &artifact.parents)?;

    write_count(writer, artifact.submeshes.len())?;
    for submesh in &artifact.submeshes {
        debug_assert_eq!(submesh.bone_names.len(), submesh.bone_offsets.len());
        write_string(writer, &submesh.name)?;
        writer.write_u32::<NativeEndian>(submesh.index_count)?;
        writer.write_u32::<NativeEndian>(submesh.start_index)?;
        writer.write_u32::<NativeEndian>(submesh.base_vertex)?;
        writer.write_i32::<NativeEndian>(submesh.node_id)?;
        // One count covers both bone lists: all names, then all offsets
        write_count(writer, submesh.bone_names.len())?;
        for name in &submesh.bone_names {
            write_string(writer, name)?;
        }
        for &offset in &submesh.bone_offsets {
            write_mat4(writer, offset)?;
        }
    }

    write_count(writer, artifact.vertices.len())?;
    for vertex in &artifact.vertices {
        write_vec3(writer, vertex.position)?;
        write_vec2(writer, vertex.uv)?;
        write_vec3(writer, vertex.normal)?;
        write_vec3(writer, vertex.tangent)?;
        writer.write_u32::<NativeEndian>(vertex.bone_indices)?;
        for &weight in &vertex.bone_weights {
            writer.write_f32::<NativeEndian>(weight)?;
        }
    }

    write_count(writer, artifact.indices.len())?;
    for &index in &artifact.indices {
        writer.write_u32::<NativeEndian>(index)?;
    }
    Ok(())
}

/// Serialize an animation clip artifact
pub fn write_animation<W: Write>(
    writer: &mut W,
    artifact: &AnimationClipArtifact,
) -> io::Result<()> {
    write_bones(writer, &artifact.bones, &artifact.parents)?;

    write_count(writer, artifact.animations.len())?;
    for animation in &artifact.animations {
        write_string(writer, &animation.name)?;
        writer.write_f32::<NativeEndian>(animation.ticks_per_second)?;
        writer.write_f32::<NativeEndian>(animation.duration)?;
        write_count(writer, animation.channels.len())?;
        for channel in &animation.channels {
            write_string(writer, &channel.name)?;
            write_vector_keys(writer, &channel.position_keys)?;
            write_quat_keys(writer, &channel.rotation_keys)?;
            write_vector_keys(writer, &channel.scale_keys)?;
        }
    }
    Ok(())
}

/// Write the shared bone block: entries, then bare parent indices
fn write_bones<W: Write>(writer: &mut W, bones: &[BoneEntry], parents: &[i32]) -> io::Result<()> {
    debug_assert_eq!(bones.len(), parents.len());
    write_count(writer, bones.len())?;
    for bone in bones {
        write_string(writer, &bone.name)?;
        write_mat4(writer, bone.transform)?;
    }
    // The parent array reuses the bone count; no count of its own
    for &parent in parents {
        writer.write_i32::<NativeEndian>(parent)?;
    }
    Ok(())
}

fn write_count<W: Write>(writer: &mut W, count: usize) -> io::Result<()> {
    writer.write_u64::<NativeEndian>(count as u64)
}

fn write_string<W: Write>(writer: &mut W, value: &str) -> io::Result<()> {
    writer.write_u64::<NativeEndian>(value.len() as u64)?;
    writer.write_all(value.as_bytes())
}

fn write_vec2<W: Write>(writer: &mut W, value: Vec2) -> io::Result<()> {
    writer.write_f32::<NativeEndian>(value.x)?;
    writer.write_f32::<NativeEndian>(value.y)
}

fn write_vec3<W: Write>(writer: &mut W, value: Vec3) -> io::Result<()> {
    writer.write_f32::<NativeEndian>(value.x)?;
    writer.write_f32::<NativeEndian>(value.y)?;
    writer.write_f32::<NativeEndian>(value.z)
}

fn write_quat<W: Write>(writer: &mut W, value: Quat) -> io::Result<()> {
    writer.write_f32::<NativeEndian>(value.x)?;
    writer.write_f32::<NativeEndian>(value.y)?;
    writer.write_f32::<NativeEndian>(value.z)?;
    writer.write_f32::<NativeEndian>(value.w)
}

fn write_mat4<W: Write>(writer: &mut W, value: Mat4) -> io::Result<()> {
    for element in value.to_cols_array() {
        writer.write_f32::<NativeEndian>(element)?;
    }
    Ok(())
}

fn write_vector_keys<W: Write>(writer: &mut W, keys: &[VectorKey]) -> io::Result<()> {
    write_count(writer, keys.len())?;
    for key in keys {
        writer.write_f32::<NativeEndian>(key.time)?;
        write_vec3(writer, key.value)?;
    }
    Ok(())
}

fn write_quat_keys<W: Write>(writer: &mut W, keys: &[QuatKey]) -> io::Result<()> {
    write_count(writer, keys.len())?;
    for key in keys {
        writer.write_f32::<NativeEndian>(key.time)?;
        write_quat(writer, key.value)?;
    }
    Ok(())
}
