//! Meshkiln Export Pipeline
//!
//! Converts an imported scene into one of three flat binary artifacts:
//! - Static meshes (`.mesh`): merged material batches with node
//!   transforms baked into the vertices
//! - Rigged meshes (`.skin`): bone hierarchy, per-node submeshes and
//!   packed skin weights
//! - Animation clips (`.anim`): bone hierarchy plus per-bone keyframe
//!   channels
//!
//! [`export_scene`] picks the artifact kind the caller classified; the
//! per-kind entry points force one.

pub mod artifact;
pub mod baking;
pub mod batching;
pub mod channels;
pub mod hierarchy;
pub mod reader;
pub mod skinning;
pub mod writer;

pub use artifact::{
    AnimationClip, AnimationClipArtifact, BoneEntry, ClipChannel, RiggedMeshArtifact,
    RiggedSubmesh, RiggedVertex, StaticMeshArtifact, StaticSubmesh, StaticVertex,
};
pub use hierarchy::Hierarchy;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use meshkiln_core::{ArtifactKind, Error, Result};
use meshkiln_scene::Scene;
use tracing::debug;

/// Advisory counters from one export
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportStats {
    /// Skin influences dropped because a vertex already had four
    pub dropped_influences: usize,
    /// Animation channels dropped because their target matched no bone
    pub dropped_channels: usize,
}

impl ExportStats {
    /// Fold another export's counters into this one
    pub fn absorb(&mut self, other: ExportStats) {
        self.dropped_influences += other.dropped_influences;
        self.dropped_channels += other.dropped_channels;
    }

    /// Check whether nothing was dropped
    pub fn is_clean(&self) -> bool {
        self.dropped_influences == 0 && self.dropped_channels == 0
    }
}

/// Export a scene as the given artifact kind
pub fn export_scene(scene: &Scene, kind: ArtifactKind, path: &Path) -> Result<ExportStats> {
    match kind {
        ArtifactKind::StaticMesh => export_static_mesh(scene, path),
        ArtifactKind::RiggedMesh => export_rigged_mesh(scene, path),
        ArtifactKind::AnimationClip => export_animation_clip(scene, path),
    }
}

/// Export the static mesh artifact for a scene
pub fn export_static_mesh(scene: &Scene, path: &Path) -> Result<ExportStats> {
    let artifact = batching::build_static(scene);

    let mut writer = BufWriter::new(create_artifact(path)?);
    writer::write_static(&mut writer, &artifact)?;
    writer.flush()?;

    debug!(
        path = %path.display(),
        submeshes = artifact.submeshes.len(),
        vertices = artifact.vertices.len(),
        indices = artifact.indices.len(),
        "wrote static mesh artifact"
    );
    Ok(ExportStats::default())
}

/// Export the rigged mesh artifact for a scene
pub fn export_rigged_mesh(scene: &Scene, path: &Path) -> Result<ExportStats> {
    let hierarchy = Hierarchy::flatten(&scene.root);
    let (artifact, dropped_influences) = batching::build_rigged(scene, &hierarchy);

    let mut writer = BufWriter::new(create_artifact(path)?);
    writer::write_rigged(&mut writer, &artifact)?;
    writer.flush()?;

    debug!(
        path = %path.display(),
        bones = artifact.bones.len(),
        submeshes = artifact.submeshes.len(),
        vertices = artifact.vertices.len(),
        "wrote rigged mesh artifact"
    );
    Ok(ExportStats {
        dropped_influences,
        ..ExportStats::default()
    })
}

/// Export the animation clip artifact for a scene
///
/// Fails with [`Error::NoAnimations`] when the scene has none.
pub fn export_animation_clip(scene: &Scene, path: &Path) -> Result<ExportStats> {
    if !scene.has_animations() {
        return Err(Error::NoAnimations);
    }
    let hierarchy = Hierarchy::flatten(&scene.root);
    let (artifact, dropped_channels) = channels::build_animation(scene, &hierarchy);

    let mut writer = BufWriter::new(create_artifact(path)?);
    writer::write_animation(&mut writer, &artifact)?;
    writer.flush()?;

    debug!(
        path = %path.display(),
        bones = artifact.bones.len(),
        animations = artifact.animations.len(),
        "wrote animation clip artifact"
    );
    Ok(ExportStats {
        dropped_channels,
        ..ExportStats::default()
    })
}

/// Create the destination file, truncating any previous artifact
fn create_artifact(path: &Path) -> Result<File> {
    File::create(path).map_err(|source| Error::CreateArtifact {
        path: path.to_path_buf(),
        source,
    })
}
