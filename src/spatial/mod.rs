//! Spatial queries consumed by perception and search behavior
//!
//! The core never raycasts or samples geometry itself; it talks to whatever
//! implements [`SpatialQuery`]. `StaticWorld` is the concrete implementation
//! used by the headless runner and the integration tests.

pub mod static_world;

use glam::Vec3;

use crate::core::types::BodyId;

pub use static_world::{Aabb, PointLight, StaticWorld, WalkableArea, WorldBody};

/// Opaque spatial service: occlusion, ambient light, and navigable-surface
/// sampling
pub trait SpatialQuery {
    /// Identity of the nearest body obstructing the segment `from -> to`,
    /// or `None` when the segment is clear
    fn line_of_sight(&self, from: Vec3, to: Vec3) -> Option<BodyId>;

    /// Ambient light at a position, normalized to [0, 1]
    fn sample_light(&self, position: Vec3) -> f32;

    /// Nearest point on the navigable surface within `max_distance` of
    /// `origin`, or `None` when sampling fails
    fn sample_navigable(&self, origin: Vec3, max_distance: f32) -> Option<Vec3>;
}
