// meshkiln-scene/src/material.rs
//! Surface materials referenced by meshes

use serde::{Deserialize, Serialize};

/// A material with the texture slots the exporters care about
///
/// Only texture path strings survive export; shading parameters are not
/// carried. Missing slots degrade to empty paths in the artifact.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Material {
    /// Material name
    pub name: String,
    /// Diffuse/albedo texture path, if authored
    pub diffuse_texture: Option<String>,
    /// Normal map texture path, if authored
    pub normal_texture: Option<String>,
}

impl Material {
    /// Create a material with no textures
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            diffuse_texture: None,
            normal_texture: None,
        }
    }
}
