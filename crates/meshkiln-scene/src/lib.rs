//! Meshkiln Scene Library
//!
//! In-memory model of an imported 3D scene: a node hierarchy with
//! transforms, triangulated meshes with skin bindings, materials, and
//! keyframe animations. Scenes are produced by a [`SceneSource`]
//! importer and consumed read-only by the export pipeline.

pub mod animation;
pub mod material;
pub mod mesh;
pub mod node;
pub mod scene;
pub mod source;

#[cfg(feature = "gltf")]
pub mod gltf;

pub use animation::{Animation, NodeChannel, QuatKey, VectorKey};
pub use material::Material;
pub use mesh::{BoneBinding, Mesh, VertexWeight};
pub use node::SceneNode;
pub use scene::Scene;
pub use source::{ImportError, ImportResult, SceneSource};

#[cfg(feature = "gltf")]
pub use self::gltf::GltfSource;
