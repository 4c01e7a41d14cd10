// meshkiln-scene/src/animation.rs
//! Keyframe animation tracks

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// A keyframe holding a 3-vector value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VectorKey {
    /// Key time in ticks
    pub time: f32,
    /// Key value
    pub value: Vec3,
}

/// A keyframe holding a rotation quaternion
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuatKey {
    /// Key time in ticks
    pub time: f32,
    /// Key value
    pub value: Quat,
}

/// Keyframe tracks animating one target node
///
/// The three tracks are independently timed and independently sized;
/// any of them may be empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeChannel {
    /// Name of the node this channel animates
    pub target: String,
    /// Translation keys
    pub position_keys: Vec<VectorKey>,
    /// Rotation keys
    pub rotation_keys: Vec<QuatKey>,
    /// Scale keys
    pub scale_keys: Vec<VectorKey>,
}

impl NodeChannel {
    /// Create an empty channel for a target node
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            position_keys: Vec::new(),
            rotation_keys: Vec::new(),
            scale_keys: Vec::new(),
        }
    }

    /// Total key count across all three tracks
    pub fn key_count(&self) -> usize {
        self.position_keys.len() + self.rotation_keys.len() + self.scale_keys.len()
    }
}

/// A named animation built from per-node channels
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Animation {
    /// Animation name
    pub name: String,
    /// Keys per second; 0 means unspecified and is defaulted downstream
    pub ticks_per_second: f32,
    /// Clip length in ticks
    pub duration: f32,
    /// Channels, one per animated node
    pub channels: Vec<NodeChannel>,
}

impl Animation {
    /// Create an empty animation
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ticks_per_second: 0.0,
            duration: 0.0,
            channels: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_key_count() {
        let mut channel = NodeChannel::new("spine");
        assert_eq!(channel.key_count(), 0);

        channel.position_keys.push(VectorKey {
            time: 0.0,
            value: Vec3::ZERO,
        });
        channel.rotation_keys.push(QuatKey {
            time: 0.0,
            value: Quat::IDENTITY,
        });
        assert_eq!(channel.key_count(), 2);
    }
}
