//! Vision test combining distance, field of view, occlusion, and lighting
//!
//! [`can_observe`] is the full gate used for chase/alarm decisions. The
//! cheaper cone-only test (no occlusion, no lighting) that patrol layers on
//! top lives with the guard; both share [`bearing_deg`].

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::core::types::{BodyId, Pose};
use crate::spatial::SpatialQuery;

/// Ambient light level above which a target is visible
pub const LIGHT_VISIBILITY_THRESHOLD: f32 = 0.3;

/// Vision cone parameters for one observer
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    /// Maximum sight distance in world units
    pub range: f32,
    /// Full horizontal field of view, degrees
    pub fov_degrees: f32,
    /// Vertical offset of the eye above the observer position
    pub eye_height: f32,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            range: 10.0,
            fov_degrees: 60.0,
            eye_height: 1.2,
        }
    }
}

/// Angle in degrees between `forward` and the direction of `to_target`
///
/// A degenerate (near-zero) target vector reads as dead ahead, so a target
/// standing exactly on the observer is never rejected by the cone gate.
pub fn bearing_deg(forward: Vec3, to_target: Vec3) -> f32 {
    if to_target.length_squared() < 1e-8 {
        return 0.0;
    }
    forward.angle_between(to_target).to_degrees()
}

/// Full visibility test: distance, cone, occlusion, then lighting
///
/// Occlusion casts from the observer's eye point to the target position; any
/// hit that is not the target body blocks sight. Pure: deterministic given
/// its inputs and the spatial service's answers.
pub fn can_observe(
    observer: &Pose,
    target_body: BodyId,
    target_position: Vec3,
    vision: &VisionConfig,
    spatial: &dyn SpatialQuery,
) -> bool {
    let to_target = target_position - observer.position;

    if to_target.length() > vision.range {
        return false;
    }
    if bearing_deg(observer.forward, to_target) > vision.fov_degrees * 0.5 {
        return false;
    }

    let eye = observer.position + Vec3::Y * vision.eye_height;
    if let Some(hit) = spatial.line_of_sight(eye, target_position) {
        if hit != target_body {
            return false;
        }
    }

    spatial.sample_light(target_position) > LIGHT_VISIBILITY_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Spatial stub with forced answers
    struct StubSpatial {
        hit: Option<BodyId>,
        light: f32,
    }

    impl SpatialQuery for StubSpatial {
        fn line_of_sight(&self, _from: Vec3, _to: Vec3) -> Option<BodyId> {
            self.hit
        }

        fn sample_light(&self, _position: Vec3) -> f32 {
            self.light
        }

        fn sample_navigable(&self, origin: Vec3, _max_distance: f32) -> Option<Vec3> {
            Some(origin)
        }
    }

    fn observer() -> Pose {
        Pose::new(Vec3::ZERO, Vec3::Z)
    }

    fn default_vision() -> VisionConfig {
        VisionConfig::default()
    }

    #[test]
    fn test_sees_lit_target_ahead() {
        let spatial = StubSpatial { hit: None, light: 0.5 };
        assert!(can_observe(
            &observer(),
            BodyId::new(),
            Vec3::new(0.0, 0.0, 5.0),
            &default_vision(),
            &spatial,
        ));
    }

    #[test]
    fn test_dark_target_invisible() {
        let spatial = StubSpatial { hit: None, light: 0.2 };
        assert!(!can_observe(
            &observer(),
            BodyId::new(),
            Vec3::new(0.0, 0.0, 5.0),
            &default_vision(),
            &spatial,
        ));
    }

    #[test]
    fn test_light_threshold_is_exclusive() {
        let spatial = StubSpatial {
            hit: None,
            light: LIGHT_VISIBILITY_THRESHOLD,
        };
        assert!(!can_observe(
            &observer(),
            BodyId::new(),
            Vec3::new(0.0, 0.0, 5.0),
            &default_vision(),
            &spatial,
        ));
    }

    #[test]
    fn test_occluder_blocks() {
        let target = BodyId::new();
        let spatial = StubSpatial {
            hit: Some(BodyId::new()),
            light: 1.0,
        };
        assert!(!can_observe(
            &observer(),
            target,
            Vec3::new(0.0, 0.0, 5.0),
            &default_vision(),
            &spatial,
        ));
    }

    #[test]
    fn test_hit_on_target_itself_passes() {
        let target = BodyId::new();
        let spatial = StubSpatial {
            hit: Some(target),
            light: 1.0,
        };
        assert!(can_observe(
            &observer(),
            target,
            Vec3::new(0.0, 0.0, 5.0),
            &default_vision(),
            &spatial,
        ));
    }

    #[test]
    fn test_out_of_range_invisible() {
        let spatial = StubSpatial { hit: None, light: 1.0 };
        assert!(!can_observe(
            &observer(),
            BodyId::new(),
            Vec3::new(0.0, 0.0, 10.5),
            &default_vision(),
            &spatial,
        ));
    }

    #[test]
    fn test_behind_observer_invisible() {
        let spatial = StubSpatial { hit: None, light: 1.0 };
        assert!(!can_observe(
            &observer(),
            BodyId::new(),
            Vec3::new(0.0, 0.0, -5.0),
            &default_vision(),
            &spatial,
        ));
    }

    #[test]
    fn test_bearing_of_degenerate_vector_is_zero() {
        assert_eq!(bearing_deg(Vec3::Z, Vec3::ZERO), 0.0);
    }

    proptest! {
        /// Beyond vision range nothing is visible, whatever the angle or light
        #[test]
        fn far_targets_never_visible(
            x in -100.0f32..100.0,
            y in -5.0f32..5.0,
            z in -100.0f32..100.0,
            light in 0.0f32..1.0,
        ) {
            let vision = default_vision();
            let target = Vec3::new(x, y, z);
            prop_assume!(target.length() > vision.range);

            let spatial = StubSpatial { hit: None, light };
            prop_assert!(!can_observe(&observer(), BodyId::new(), target, &vision, &spatial));
        }

        /// Outside the half-angle cone nothing is visible, whatever the distance
        #[test]
        fn off_cone_targets_never_visible(
            x in -100.0f32..100.0,
            y in -5.0f32..5.0,
            z in -100.0f32..100.0,
        ) {
            let vision = default_vision();
            let target = Vec3::new(x, y, z);
            prop_assume!(target.length_squared() > 1e-6);
            prop_assume!(bearing_deg(Vec3::Z, target) > vision.fov_degrees * 0.5);

            let spatial = StubSpatial { hit: None, light: 1.0 };
            prop_assert!(!can_observe(&observer(), BodyId::new(), target, &vision, &spatial));
        }
    }
}
