//! Animation channel remapping
//!
//! The clip artifact stores exactly one channel per bone, at that
//! bone's index. Source animations name their targets instead, so each
//! channel is resolved through the flattened hierarchy and written at
//! the resolved slot; targets matching no bone are dropped. Only the
//! scene's first animation is exported.

use meshkiln_scene::Scene;
use tracing::{debug, warn};

use crate::artifact::{AnimationClip, AnimationClipArtifact, ClipChannel};
use crate::hierarchy::Hierarchy;

/// Build the clip artifact from the scene's first animation
///
/// Returns the artifact together with the number of channels dropped
/// because their target resolved to no bone.
pub fn build_animation(scene: &Scene, hierarchy: &Hierarchy) -> (AnimationClipArtifact, usize) {
    let mut artifact = AnimationClipArtifact {
        bones: hierarchy.bone_entries(),
        parents: hierarchy.parent_indices(),
        animations: Vec::new(),
    };
    let mut dropped = 0usize;

    let Some(source) = scene.animations.first() else {
        return (artifact, dropped);
    };
    if scene.animations.len() > 1 {
        debug!(
            count = scene.animations.len(),
            "scene carries multiple animations, exporting the first"
        );
    }

    let mut channels = vec![ClipChannel::default(); hierarchy.bone_count()];
    for channel in &source.channels {
        let Some(bone) = hierarchy.find(&channel.target) else {
            dropped += 1;
            warn!(
                target = %channel.target,
                "animation channel targets no bone in the hierarchy, dropped"
            );
            continue;
        };
        channels[bone] = ClipChannel {
            name: channel.target.clone(),
            position_keys: channel.position_keys.clone(),
            rotation_keys: channel.rotation_keys.clone(),
            scale_keys: channel.scale_keys.clone(),
        };
    }

    // Sources leave the tick rate at zero when unspecified
    let ticks_per_second = if source.ticks_per_second == 0.0 {
        1.0
    } else {
        source.ticks_per_second
    };
    artifact.animations.push(AnimationClip {
        name: source.name.clone(),
        ticks_per_second,
        duration: source.duration,
        channels,
    });

    (artifact, dropped)
}
