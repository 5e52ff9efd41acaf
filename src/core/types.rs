//! Core type definitions used throughout the codebase

use glam::Vec3;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for guard agents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GuardId(pub Uuid);

impl GuardId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for GuardId {
    fn default() -> Self {
        Self::new()
    }
}

/// Unique identifier for security cameras
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CameraId(pub Uuid);

impl CameraId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CameraId {
    fn default() -> Self {
        Self::new()
    }
}

/// Identity of a physical body the spatial service can report as a raycast hit
///
/// Actors (the player) and obstructions both carry one; perception compares
/// the nearest hit against the intended target to decide occlusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BodyId(pub Uuid);

impl BodyId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BodyId {
    fn default() -> Self {
        Self::new()
    }
}

/// Identity of an event-bus subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListenerId(pub Uuid);

impl ListenerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ListenerId {
    fn default() -> Self {
        Self::new()
    }
}

/// Simulation tick counter
pub type Tick = u64;

/// Read-only snapshot of the player actor handed to perception consumers
#[derive(Debug, Clone, Copy)]
pub struct PlayerTarget {
    pub body: BodyId,
    pub pose: Pose,
}

/// Position plus facing direction for an actor
///
/// The core reads poses; external movement systems write them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub forward: Vec3,
}

impl Pose {
    pub fn new(position: Vec3, forward: Vec3) -> Self {
        Self { position, forward }
    }

    /// Pose at `position` facing toward `target`
    ///
    /// Falls back to +Z when the two points coincide.
    pub fn facing(position: Vec3, target: Vec3) -> Self {
        let dir = (target - position).normalize_or_zero();
        let forward = if dir == Vec3::ZERO { Vec3::Z } else { dir };
        Self { position, forward }
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            forward: Vec3::Z,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_id_equality() {
        let a = GuardId::new();
        let b = a;
        assert_eq!(a, b);
        assert_ne!(a, GuardId::new());
    }

    #[test]
    fn test_body_id_hash() {
        use std::collections::HashMap;
        let id = BodyId::new();
        let mut map: HashMap<BodyId, &str> = HashMap::new();
        map.insert(id, "crate");
        assert_eq!(map.get(&id), Some(&"crate"));
    }

    #[test]
    fn test_pose_facing() {
        let pose = Pose::facing(Vec3::ZERO, Vec3::new(0.0, 0.0, 10.0));
        assert!((pose.forward - Vec3::Z).length() < 1e-6);
    }

    #[test]
    fn test_pose_facing_coincident_points() {
        let pose = Pose::facing(Vec3::ONE, Vec3::ONE);
        assert_eq!(pose.forward, Vec3::Z);
    }
}
