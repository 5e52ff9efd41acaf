//! Global detection meter
//!
//! Aggregates per-tick guard visibility of the player into one clamped
//! [0, 1] level. The meter runs its own visibility test with a wider, fixed
//! cone independent of any guard's authored vision, so the pressure the
//! player feels is uniform across guard loadouts.

use serde::{Deserialize, Serialize};

use glam::Vec3;

use crate::core::types::{PlayerTarget, Pose};
use crate::perception::bearing_deg;
use crate::spatial::SpatialQuery;

/// Tuning for the detection meter
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Level gained per second while any guard sees the player
    pub detection_speed: f32,
    /// Level lost per second while no guard sees the player
    pub detection_decay_speed: f32,
    /// Sample range of the meter's own visibility cone
    pub range: f32,
    /// Full angle of the meter's own visibility cone, degrees
    pub fov_degrees: f32,
    /// Vertical offset of the sample ray origin above a guard position
    pub eye_height: f32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            detection_speed: 0.5,
            detection_decay_speed: 1.0,
            range: 15.0,
            fov_degrees: 90.0,
            eye_height: 1.0,
        }
    }
}

/// Clamped detection level with a one-way terminal caught state
#[derive(Debug, Clone)]
pub struct DetectionMeter {
    config: DetectionConfig,
    level: f32,
    caught: bool,
    caught_signal: bool,
}

impl DetectionMeter {
    pub fn new(config: DetectionConfig) -> Self {
        Self {
            config,
            level: 0.0,
            caught: false,
            caught_signal: false,
        }
    }

    /// Current level in [0, 1]
    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn is_caught(&self) -> bool {
        self.caught
    }

    /// One-shot caught signal: true exactly once, on the tick the level
    /// first saturates
    pub fn take_caught_event(&mut self) -> bool {
        std::mem::take(&mut self.caught_signal)
    }

    /// The meter's own guard-vs-player visibility sample: distance, cone,
    /// and an occlusion ray that must reach the player first
    pub fn guard_sees_player(
        &self,
        guard: &Pose,
        player: &PlayerTarget,
        spatial: &dyn SpatialQuery,
    ) -> bool {
        let to_player = player.pose.position - guard.position;
        if to_player.length() >= self.config.range {
            return false;
        }
        if bearing_deg(guard.forward, to_player) >= self.config.fov_degrees * 0.5 {
            return false;
        }

        let origin = guard.position + Vec3::Y * self.config.eye_height;
        matches!(
            spatial.line_of_sight(origin, player.pose.position),
            Some(hit) if hit == player.body
        )
    }

    /// Advance the meter by one tick
    ///
    /// Fill while seen, decay while unseen, clamp both ways. Saturation
    /// latches the caught state and freezes the level until [`reset`].
    ///
    /// [`reset`]: DetectionMeter::reset
    pub fn update(&mut self, dt: f32, any_guard_sees: bool) {
        if self.caught {
            return;
        }

        if any_guard_sees {
            self.level = (self.level + self.config.detection_speed * dt).min(1.0);
            if self.level >= 1.0 {
                self.caught = true;
                self.caught_signal = true;
                tracing::info!("detection level saturated: player caught");
            }
        } else if self.level > 0.0 {
            self.level = (self.level - self.config.detection_decay_speed * dt).max(0.0);
        }
    }

    /// Restore the meter to its initial state, clearing the caught latch
    pub fn reset(&mut self) {
        self.level = 0.0;
        self.caught = false;
        self.caught_signal = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::BodyId;

    fn meter() -> DetectionMeter {
        DetectionMeter::new(DetectionConfig::default())
    }

    #[test]
    fn test_fill_saturates_and_signals_once() {
        let mut meter = meter();
        // detection_speed 0.5/s, dt 0.125 -> exactly 1.0 after 16 ticks
        let mut caught_ticks = Vec::new();
        for tick in 0..20 {
            meter.update(0.125, true);
            if meter.take_caught_event() {
                caught_ticks.push(tick);
            }
        }
        assert_eq!(meter.level(), 1.0);
        assert!(meter.is_caught());
        assert_eq!(caught_ticks, vec![15]);
    }

    #[test]
    fn test_decay_clamps_at_zero() {
        let mut meter = meter();
        meter.update(0.5, true); // level 0.25
        assert!((meter.level() - 0.25).abs() < 1e-6);

        meter.update(0.125, false);
        meter.update(0.125, false);
        assert_eq!(meter.level(), 0.0);

        meter.update(0.125, false);
        assert_eq!(meter.level(), 0.0);
    }

    #[test]
    fn test_level_frozen_after_caught() {
        let mut meter = meter();
        for _ in 0..16 {
            meter.update(0.125, true);
        }
        assert!(meter.is_caught());

        meter.update(1.0, false);
        assert_eq!(meter.level(), 1.0);
    }

    #[test]
    fn test_reset_clears_caught() {
        let mut meter = meter();
        for _ in 0..16 {
            meter.update(0.125, true);
        }
        assert!(meter.take_caught_event());

        meter.reset();
        assert_eq!(meter.level(), 0.0);
        assert!(!meter.is_caught());
        assert!(!meter.take_caught_event());

        meter.update(0.125, true);
        assert!(meter.level() > 0.0);
    }

    #[test]
    fn test_visibility_sample_requires_hit_on_player() {
        use crate::spatial::SpatialQuery;
        use glam::Vec3;

        struct NoHit;
        impl SpatialQuery for NoHit {
            fn line_of_sight(&self, _: Vec3, _: Vec3) -> Option<BodyId> {
                None
            }
            fn sample_light(&self, _: Vec3) -> f32 {
                1.0
            }
            fn sample_navigable(&self, origin: Vec3, _: f32) -> Option<Vec3> {
                Some(origin)
            }
        }

        let meter = meter();
        let player = PlayerTarget {
            body: BodyId::new(),
            pose: Pose::new(Vec3::new(0.0, 0.0, 5.0), Vec3::Z),
        };
        let guard = Pose::new(Vec3::ZERO, Vec3::Z);

        // Ray that reaches nothing at all reads as not seeing the player
        assert!(!meter.guard_sees_player(&guard, &player, &NoHit));
    }

    #[test]
    fn test_visibility_sample_hit_on_player() {
        use crate::spatial::SpatialQuery;
        use glam::Vec3;

        struct HitPlayer(BodyId);
        impl SpatialQuery for HitPlayer {
            fn line_of_sight(&self, _: Vec3, _: Vec3) -> Option<BodyId> {
                Some(self.0)
            }
            fn sample_light(&self, _: Vec3) -> f32 {
                1.0
            }
            fn sample_navigable(&self, origin: Vec3, _: f32) -> Option<Vec3> {
                Some(origin)
            }
        }

        let meter = meter();
        let body = BodyId::new();
        let player = PlayerTarget {
            body,
            pose: Pose::new(Vec3::new(0.0, 0.0, 5.0), Vec3::Z),
        };
        let guard = Pose::new(Vec3::ZERO, Vec3::Z);
        assert!(meter.guard_sees_player(&guard, &player, &HitPlayer(body)));

        // Out of the 90 degree cone
        let guard_away = Pose::new(Vec3::ZERO, -Vec3::Z);
        assert!(!meter.guard_sees_player(&guard_away, &player, &HitPlayer(body)));

        // Out of range
        let far_player = PlayerTarget {
            body,
            pose: Pose::new(Vec3::new(0.0, 0.0, 16.0), Vec3::Z),
        };
        assert!(!meter.guard_sees_player(&guard, &far_player, &HitPlayer(body)));
    }
}
