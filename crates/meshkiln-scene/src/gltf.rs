// meshkiln-scene/src/gltf.rs
//! glTF 2.0 scene import
//!
//! Loads `.gltf` and `.glb` files into the in-memory scene model. Each
//! glTF primitive becomes one mesh entry per referencing node, so
//! node-level skins attach directly to the meshes they deform. Images
//! are never decoded; only texture URI strings are carried through.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use glam::{Mat4, Quat, Vec2, Vec3};
use gltf::accessor::Iter;
use gltf::animation::util::ReadOutputs;
use gltf::buffer::Data;
use gltf::image::Source;
use gltf::mesh::util::{ReadJoints, ReadNormals, ReadPositions, ReadTangents};
use gltf::mesh::Mode;
use gltf::{Document, Gltf};
use tracing::{debug, warn};

use crate::animation::{Animation, NodeChannel, QuatKey, VectorKey};
use crate::material::Material;
use crate::mesh::{BoneBinding, Mesh, VertexWeight};
use crate::node::SceneNode;
use crate::scene::Scene;
use crate::source::{ImportError, ImportResult, SceneSource};

/// Importer for glTF 2.0 scenes, text and binary
#[derive(Debug, Clone, Copy, Default)]
pub struct GltfSource;

impl SceneSource for GltfSource {
    fn name(&self) -> &str {
        "gltf"
    }

    fn extensions(&self) -> &[&str] {
        &["gltf", "glb"]
    }

    fn load(&self, path: &Path) -> ImportResult<Scene> {
        load_scene(path)
    }
}

fn load_scene(path: &Path) -> ImportResult<Scene> {
    let file = File::open(path)?;
    let gltf = Gltf::from_reader(BufReader::new(file)).map_err(|e| ImportError::Malformed {
        message: e.to_string(),
    })?;
    let Gltf { document, blob } = gltf;
    let buffers = gltf::import_buffers(&document, path.parent(), blob).map_err(|e| {
        ImportError::Malformed {
            message: e.to_string(),
        }
    })?;

    let names = node_names(&document);
    let materials = read_materials(&document);
    let mut meshes = Vec::new();
    let root = build_hierarchy(&document, &buffers, &names, &mut meshes)?;
    let animations = read_animations(&document, &buffers, &names)?;

    debug!(
        path = %path.display(),
        nodes = root.node_count(),
        meshes = meshes.len(),
        materials = materials.len(),
        animations = animations.len(),
        "loaded gltf scene"
    );

    Ok(Scene {
        root,
        meshes,
        materials,
        animations,
    })
}

/// Resolve every node's display name up front so hierarchy, skins and
/// animation channels all agree on the fallback spelling.
fn node_names(document: &Document) -> Vec<String> {
    document
        .nodes()
        .map(|node| {
            node.name()
                .map_or_else(|| format!("node.{}", node.index()), ToString::to_string)
        })
        .collect()
}

fn read_materials(document: &Document) -> Vec<Material> {
    document
        .materials()
        .map(|material| {
            let name = material.name().map_or_else(
                || format!("material.{}", material.index().unwrap_or(0)),
                ToString::to_string,
            );
            let mut out = Material::new(name);
            out.diffuse_texture = material
                .pbr_metallic_roughness()
                .base_color_texture()
                .and_then(|info| texture_path(&info.texture()));
            out.normal_texture = material
                .normal_texture()
                .and_then(|info| texture_path(&info.texture()));
            out
        })
        .collect()
}

fn texture_path(texture: &gltf::Texture) -> Option<String> {
    match texture.source().source() {
        Source::Uri { uri, .. } => Some(uri.to_string()),
        // Embedded images carry no usable path
        Source::View { .. } => None,
    }
}

fn build_hierarchy(
    document: &Document,
    buffers: &[Data],
    names: &[String],
    meshes: &mut Vec<Mesh>,
) -> ImportResult<SceneNode> {
    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or_else(|| ImportError::Malformed {
            message: "file contains no scene".into(),
        })?;

    // Wrap the scene roots in a single synthetic root so the rest of
    // the pipeline always sees one tree.
    let mut root = SceneNode::new(scene.name().unwrap_or("Scene"));
    for node in scene.nodes() {
        root.children
            .push(convert_node(&node, buffers, names, meshes)?);
    }
    Ok(root)
}

fn convert_node(
    node: &gltf::Node,
    buffers: &[Data],
    names: &[String],
    meshes: &mut Vec<Mesh>,
) -> ImportResult<SceneNode> {
    let mut out = SceneNode::new(names[node.index()].clone());
    out.transform = Mat4::from_cols_array_2d(&node.transform().matrix());

    if let Some(mesh) = node.mesh() {
        let skin = node.skin();
        let primitive_count = mesh.primitives().count();
        for (primitive_index, primitive) in mesh.primitives().enumerate() {
            let converted = convert_primitive(
                &mesh,
                primitive_index,
                primitive_count,
                &primitive,
                skin.as_ref(),
                buffers,
                names,
            )?;
            out.meshes.push(meshes.len());
            meshes.push(converted);
        }
    }

    for child in node.children() {
        out.children
            .push(convert_node(&child, buffers, names, meshes)?);
    }
    Ok(out)
}

fn convert_primitive(
    mesh: &gltf::Mesh,
    primitive_index: usize,
    primitive_count: usize,
    primitive: &gltf::Primitive,
    skin: Option<&gltf::Skin>,
    buffers: &[Data],
    names: &[String],
) -> ImportResult<Mesh> {
    if primitive.mode() != Mode::Triangles {
        return Err(ImportError::Unsupported {
            message: format!("primitive mode {:?}, triangles required", primitive.mode()),
        });
    }

    let base = mesh
        .name()
        .map_or_else(|| format!("mesh.{}", mesh.index()), ToString::to_string);
    let name = if primitive_count > 1 {
        format!("{base}.{primitive_index}")
    } else {
        base
    };
    let material = primitive.material().index().unwrap_or(0);
    let mut out = Mesh::new(name, material);

    let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()][..]));

    let positions = reader
        .read_positions()
        .ok_or_else(|| ImportError::Malformed {
            message: format!("primitive of mesh {} has no positions", mesh.index()),
        })?;
    let ReadPositions::Standard(positions) = positions else {
        return Err(ImportError::Unsupported {
            message: "sparse position accessor".into(),
        });
    };
    out.positions = positions.map(Vec3::from_array).collect();

    if let Some(normals) = reader.read_normals() {
        let ReadNormals::Standard(normals) = normals else {
            return Err(ImportError::Unsupported {
                message: "sparse normal accessor".into(),
            });
        };
        out.normals = normals.map(Vec3::from_array).collect();
    }

    if let Some(uvs) = reader.read_tex_coords(0) {
        out.uvs = uvs.into_f32().map(Vec2::from_array).collect();
    }

    if let Some(tangents) = reader.read_tangents() {
        let ReadTangents::Standard(tangents) = tangents else {
            return Err(ImportError::Unsupported {
                message: "sparse tangent accessor".into(),
            });
        };
        // The w component only carries handedness
        out.tangents = tangents.map(|t| Vec3::new(t[0], t[1], t[2])).collect();
    }

    let indices = reader.read_indices().ok_or_else(|| ImportError::Malformed {
        message: format!("primitive of mesh {} has no indices", mesh.index()),
    })?;
    let flat: Vec<u32> = indices.into_u32().collect();
    if flat.len() % 3 != 0 {
        return Err(ImportError::Malformed {
            message: format!("index count {} is not a multiple of three", flat.len()),
        });
    }
    out.faces = flat.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect();

    if let Some(skin) = skin {
        let joints = read_joint_ids(&reader);
        let weights = read_weight_values(&reader);
        match (joints, weights) {
            (Some(joints), Some(weights)) => {
                out.bones = build_bindings(skin, buffers, names, &joints, &weights);
            }
            _ => {
                warn!(
                    mesh = %out.name,
                    "node has a skin but the primitive lacks joints or weights"
                );
            }
        }
    }

    Ok(out)
}

fn read_joint_ids<'a, 's, F>(reader: &gltf::mesh::Reader<'a, 's, F>) -> Option<Vec<[u16; 4]>>
where
    F: Clone + Fn(gltf::Buffer<'a>) -> Option<&'s [u8]>,
{
    reader.read_joints(0).map(|joints| match joints {
        ReadJoints::U8(it) => it.map(|j| j.map(u16::from)).collect(),
        ReadJoints::U16(it) => it.collect(),
    })
}

fn read_weight_values<'a, 's, F>(reader: &gltf::mesh::Reader<'a, 's, F>) -> Option<Vec<[f32; 4]>>
where
    F: Clone + Fn(gltf::Buffer<'a>) -> Option<&'s [u8]>,
{
    reader.read_weights(0).map(|weights| weights.into_f32().collect())
}

/// Invert vertex-major joint/weight attributes into per-bone weighted
/// vertex lists, in the skin's joint order.
fn build_bindings(
    skin: &gltf::Skin,
    buffers: &[Data],
    names: &[String],
    joints: &[[u16; 4]],
    weights: &[[f32; 4]],
) -> Vec<BoneBinding> {
    let mut bindings: Vec<BoneBinding> = skin
        .joints()
        .map(|joint| BoneBinding::new(names[joint.index()].clone()))
        .collect();

    let reader = skin.reader(|buffer| Some(&buffers[buffer.index()][..]));
    if let Some(matrices) = reader.read_inverse_bind_matrices() {
        for (binding, matrix) in bindings.iter_mut().zip(matrices) {
            binding.offset = Mat4::from_cols_array_2d(&matrix);
        }
    }

    for (vertex, (ids, values)) in joints.iter().zip(weights).enumerate() {
        for (id, weight) in ids.iter().zip(values) {
            if *weight <= 0.0 {
                continue;
            }
            let Some(binding) = bindings.get_mut(*id as usize) else {
                warn!(joint = *id, "joint index outside skin joint list, influence skipped");
                continue;
            };
            binding.weights.push(VertexWeight {
                vertex: vertex as u32,
                weight: *weight,
            });
        }
    }

    bindings
}

fn read_animations(
    document: &Document,
    buffers: &[Data],
    names: &[String],
) -> ImportResult<Vec<Animation>> {
    let mut out = Vec::new();

    for animation in document.animations() {
        let name = animation.name().map_or_else(
            || format!("animation.{}", animation.index()),
            ToString::to_string,
        );

        // Merge the per-property samplers into one channel per target
        // node, keeping first-seen node order.
        let mut channels: Vec<NodeChannel> = Vec::new();
        let mut slots: HashMap<usize, usize> = HashMap::new();
        let mut duration = 0.0f32;

        for channel in animation.channels() {
            if channel.sampler().interpolation() == gltf::animation::Interpolation::CubicSpline {
                return Err(ImportError::Unsupported {
                    message: "cubic-spline animation sampler".into(),
                });
            }

            let node = channel.target().node();
            let reader = channel.reader(|buffer| Some(&buffers[buffer.index()][..]));
            let times: Vec<f32> = match reader.read_inputs() {
                Some(Iter::Standard(it)) => it.collect(),
                Some(Iter::Sparse(_)) => {
                    return Err(ImportError::Unsupported {
                        message: "sparse animation sampler".into(),
                    });
                }
                None => continue,
            };
            duration = times.iter().copied().fold(duration, f32::max);

            let slot = *slots.entry(node.index()).or_insert_with(|| {
                channels.push(NodeChannel::new(names[node.index()].clone()));
                channels.len() - 1
            });
            let target = &mut channels[slot];

            match reader.read_outputs() {
                Some(ReadOutputs::Translations(values)) => {
                    target.position_keys = times
                        .iter()
                        .copied()
                        .zip(values.map(Vec3::from_array))
                        .map(|(time, value)| VectorKey { time, value })
                        .collect();
                }
                Some(ReadOutputs::Rotations(rotations)) => {
                    target.rotation_keys = times
                        .iter()
                        .copied()
                        .zip(rotations.into_f32().map(Quat::from_array))
                        .map(|(time, value)| QuatKey { time, value })
                        .collect();
                }
                Some(ReadOutputs::Scales(values)) => {
                    target.scale_keys = times
                        .iter()
                        .copied()
                        .zip(values.map(Vec3::from_array))
                        .map(|(time, value)| VectorKey { time, value })
                        .collect();
                }
                Some(ReadOutputs::MorphTargetWeights(_)) => {
                    warn!(animation = %name, "morph target channel ignored");
                }
                None => {}
            }
        }

        // glTF key times are seconds; leave ticks-per-second at 0 so the
        // exporter's default makes one tick equal one second.
        out.push(Animation {
            name,
            ticks_per_second: 0.0,
            duration,
            channels,
        });
    }

    Ok(out)
}
