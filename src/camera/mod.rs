//! Oscillating security cameras
//!
//! Cameras sweep a fixed arc and run their own cone-plus-occlusion player
//! test every tick. They feed presentation layers only: a sighting sets the
//! `player_detected` flag and nothing else. Cameras do not raise the alarm
//! and do not touch the detection meter.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::core::types::{CameraId, PlayerTarget, Pose};
use crate::perception::bearing_deg;
use crate::spatial::SpatialQuery;

/// Authored per-camera tuning
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Sweep speed, degrees per second
    pub rotation_speed: f32,
    /// Sweep limit to either side of the mount forward, degrees
    pub rotation_angle: f32,
    /// Whether the camera sweeps at all
    pub can_rotate: bool,
    pub detection_range: f32,
    /// Full detection cone angle, degrees
    pub detection_fov: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            rotation_speed: 20.0,
            rotation_angle: 60.0,
            can_rotate: true,
            detection_range: 15.0,
            detection_fov: 90.0,
        }
    }
}

/// A wall-mounted security camera
#[derive(Debug, Clone)]
pub struct SecurityCamera {
    id: CameraId,
    pub name: String,
    /// Mount pose; `forward` is the sweep's center direction
    pub pose: Pose,
    config: CameraConfig,
    active: bool,
    /// Current sweep deflection from center, degrees
    deflection: f32,
    sweeping_right: bool,
    player_detected: bool,
}

impl SecurityCamera {
    pub fn new(name: impl Into<String>, pose: Pose, config: CameraConfig) -> Self {
        Self {
            id: CameraId::new(),
            name: name.into(),
            pose,
            config,
            active: true,
            deflection: 0.0,
            sweeping_right: true,
            player_detected: false,
        }
    }

    pub fn id(&self) -> CameraId {
        self.id
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn player_detected(&self) -> bool {
        self.player_detected
    }

    /// Current deflection from the sweep center, degrees
    pub fn deflection(&self) -> f32 {
        self.deflection
    }

    /// Facing direction at the current deflection
    pub fn current_forward(&self) -> Vec3 {
        Quat::from_rotation_y(self.deflection.to_radians()) * self.pose.forward
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
        if !active {
            self.player_detected = false;
        }
    }

    /// Advance the sweep and re-run the player test
    pub fn tick(&mut self, dt: f32, player: Option<&PlayerTarget>, spatial: &dyn SpatialQuery) {
        if !self.active {
            return;
        }

        if self.config.can_rotate {
            self.advance_sweep(dt);
        }

        let was_detected = self.player_detected;
        self.player_detected = player.map_or(false, |p| self.sees(p, spatial));
        if self.player_detected && !was_detected {
            tracing::debug!("camera {} picked up the player", self.name);
        }
    }

    fn advance_sweep(&mut self, dt: f32) {
        let step = self.config.rotation_speed * dt;
        if self.sweeping_right {
            self.deflection += step;
            if self.deflection >= self.config.rotation_angle {
                self.deflection = self.config.rotation_angle;
                self.sweeping_right = false;
            }
        } else {
            self.deflection -= step;
            if self.deflection <= -self.config.rotation_angle {
                self.deflection = -self.config.rotation_angle;
                self.sweeping_right = true;
            }
        }
    }

    /// Cone test against the swept forward, then an occlusion ray that must
    /// reach the player body first
    fn sees(&self, player: &PlayerTarget, spatial: &dyn SpatialQuery) -> bool {
        let to_player = player.pose.position - self.pose.position;
        if to_player.length() > self.config.detection_range {
            return false;
        }
        if bearing_deg(self.current_forward(), to_player) >= self.config.detection_fov * 0.5 {
            return false;
        }

        matches!(
            spatial.line_of_sight(self.pose.position, player.pose.position),
            Some(hit) if hit == player.body
        )
    }
}
