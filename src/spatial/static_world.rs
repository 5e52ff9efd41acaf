//! Static obstacle-and-lights world
//!
//! Minimal geometry backing for the headless runner and the integration
//! tests: axis-aligned boxes with body identities, point lights, and a
//! walkable rectangle on the ground plane. Not a physics engine; precision
//! stops where the perception tests stop needing it.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::SpatialQuery;
use crate::core::types::BodyId;

/// Radius around a query point within which lights contribute
pub const LIGHT_SAMPLE_RADIUS: f32 = 3.0;

/// Summed light intensity that maps to fully lit (1.0)
pub const LIGHT_NORMALIZATION: f32 = 5.0;

const RAY_EPSILON: f32 = 1e-4;

/// Axis-aligned box
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// Entry parameter of the segment `from + t * delta`, `t` in
    /// `(RAY_EPSILON, 1.0]`, or `None` when the segment misses.
    ///
    /// A segment that starts inside the box reports no hit; casts never
    /// collide with the volume they originate in.
    fn segment_entry(&self, from: Vec3, delta: Vec3) -> Option<f32> {
        if self.contains(from) {
            return None;
        }

        let mut t_min = 0.0f32;
        let mut t_max = 1.0f32;

        for axis in 0..3 {
            let origin = from[axis];
            let dir = delta[axis];
            let (lo, hi) = (self.min[axis], self.max[axis]);

            if dir.abs() < RAY_EPSILON {
                if origin < lo || origin > hi {
                    return None;
                }
                continue;
            }

            let mut t1 = (lo - origin) / dir;
            let mut t2 = (hi - origin) / dir;
            if t1 > t2 {
                std::mem::swap(&mut t1, &mut t2);
            }
            t_min = t_min.max(t1);
            t_max = t_max.min(t2);
            if t_min > t_max {
                return None;
            }
        }

        (t_min > RAY_EPSILON).then_some(t_min)
    }
}

/// A solid body the line-of-sight test can report
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WorldBody {
    pub id: BodyId,
    pub bounds: Aabb,
}

/// Point light contributing to ambient light sampling
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PointLight {
    pub position: Vec3,
    pub intensity: f32,
}

/// Walkable rectangle on the y = 0 ground plane
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WalkableArea {
    pub min_x: f32,
    pub max_x: f32,
    pub min_z: f32,
    pub max_z: f32,
}

impl WalkableArea {
    /// Closest point of the area to `point`, on the ground plane
    pub fn clamp(&self, point: Vec3) -> Vec3 {
        Vec3::new(
            point.x.clamp(self.min_x, self.max_x),
            0.0,
            point.z.clamp(self.min_z, self.max_z),
        )
    }
}

/// Static scene geometry implementing [`SpatialQuery`]
#[derive(Debug, Clone, Default)]
pub struct StaticWorld {
    bodies: Vec<WorldBody>,
    lights: Vec<PointLight>,
    walkable: Option<WalkableArea>,
}

impl StaticWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a solid body; returns its identity
    pub fn add_body(&mut self, bounds: Aabb) -> BodyId {
        let id = BodyId::new();
        self.bodies.push(WorldBody { id, bounds });
        id
    }

    /// Register a body under a caller-chosen identity (actor bodies whose id
    /// the simulation already knows)
    pub fn add_body_with_id(&mut self, id: BodyId, bounds: Aabb) {
        self.bodies.push(WorldBody { id, bounds });
    }

    pub fn add_light(&mut self, position: Vec3, intensity: f32) {
        self.lights.push(PointLight { position, intensity });
    }

    pub fn set_walkable(&mut self, area: WalkableArea) {
        self.walkable = Some(area);
    }

    /// Move a body's bounds (actor bodies follow their poses)
    pub fn move_body(&mut self, id: BodyId, bounds: Aabb) {
        if let Some(body) = self.bodies.iter_mut().find(|b| b.id == id) {
            body.bounds = bounds;
        }
    }
}

impl SpatialQuery for StaticWorld {
    fn line_of_sight(&self, from: Vec3, to: Vec3) -> Option<BodyId> {
        let delta = to - from;
        let mut nearest: Option<(f32, BodyId)> = None;

        for body in &self.bodies {
            if let Some(t) = body.bounds.segment_entry(from, delta) {
                if nearest.map_or(true, |(best, _)| t < best) {
                    nearest = Some((t, body.id));
                }
            }
        }

        nearest.map(|(_, id)| id)
    }

    fn sample_light(&self, position: Vec3) -> f32 {
        let sum: f32 = self
            .lights
            .iter()
            .filter(|l| l.position.distance(position) <= LIGHT_SAMPLE_RADIUS)
            .map(|l| l.intensity)
            .sum();
        (sum / LIGHT_NORMALIZATION).clamp(0.0, 1.0)
    }

    fn sample_navigable(&self, origin: Vec3, max_distance: f32) -> Option<Vec3> {
        let area = self.walkable?;
        let snapped = area.clamp(origin);
        (origin.distance(snapped) <= max_distance).then_some(snapped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wall() -> Aabb {
        Aabb::new(Vec3::new(-1.0, 0.0, 4.0), Vec3::new(1.0, 3.0, 5.0))
    }

    #[test]
    fn test_segment_hits_box() {
        let mut world = StaticWorld::new();
        let id = world.add_body(wall());
        let hit = world.line_of_sight(Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, 1.0, 10.0));
        assert_eq!(hit, Some(id));
    }

    #[test]
    fn test_segment_misses_box() {
        let mut world = StaticWorld::new();
        world.add_body(wall());
        let hit = world.line_of_sight(Vec3::new(5.0, 1.0, 0.0), Vec3::new(5.0, 1.0, 10.0));
        assert_eq!(hit, None);
    }

    #[test]
    fn test_segment_stops_before_box() {
        let mut world = StaticWorld::new();
        world.add_body(wall());
        // Target short of the wall
        let hit = world.line_of_sight(Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, 1.0, 3.0));
        assert_eq!(hit, None);
    }

    #[test]
    fn test_nearest_body_wins() {
        let mut world = StaticWorld::new();
        let far = world.add_body(wall());
        let near = world.add_body(Aabb::new(
            Vec3::new(-1.0, 0.0, 1.0),
            Vec3::new(1.0, 3.0, 2.0),
        ));
        let hit = world.line_of_sight(Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, 1.0, 10.0));
        assert_eq!(hit, Some(near));
        assert_ne!(hit, Some(far));
    }

    #[test]
    fn test_cast_ignores_enclosing_volume() {
        let mut world = StaticWorld::new();
        world.add_body(Aabb::new(Vec3::splat(-2.0), Vec3::splat(2.0)));
        let hit = world.line_of_sight(Vec3::ZERO, Vec3::new(0.0, 0.0, 10.0));
        assert_eq!(hit, None);
    }

    #[test]
    fn test_light_sum_and_normalization() {
        let mut world = StaticWorld::new();
        world.add_light(Vec3::new(0.0, 2.0, 0.0), 1.5);
        world.add_light(Vec3::new(1.0, 2.0, 0.0), 1.0);
        // Out of sample radius
        world.add_light(Vec3::new(10.0, 2.0, 0.0), 5.0);

        let level = world.sample_light(Vec3::ZERO);
        assert!((level - 2.5 / LIGHT_NORMALIZATION).abs() < 1e-6);
    }

    #[test]
    fn test_light_clamps_to_one() {
        let mut world = StaticWorld::new();
        world.add_light(Vec3::ZERO, 50.0);
        assert_eq!(world.sample_light(Vec3::ZERO), 1.0);
    }

    #[test]
    fn test_navigable_clamps_into_area() {
        let mut world = StaticWorld::new();
        world.set_walkable(WalkableArea {
            min_x: -10.0,
            max_x: 10.0,
            min_z: -10.0,
            max_z: 10.0,
        });

        let inside = world.sample_navigable(Vec3::new(3.0, 0.0, 4.0), 1.0);
        assert_eq!(inside, Some(Vec3::new(3.0, 0.0, 4.0)));

        let edge = world.sample_navigable(Vec3::new(11.0, 0.0, 0.0), 2.0);
        assert_eq!(edge, Some(Vec3::new(10.0, 0.0, 0.0)));
    }

    #[test]
    fn test_navigable_fails_far_from_area() {
        let mut world = StaticWorld::new();
        world.set_walkable(WalkableArea {
            min_x: -10.0,
            max_x: 10.0,
            min_z: -10.0,
            max_z: 10.0,
        });
        assert_eq!(world.sample_navigable(Vec3::new(20.0, 0.0, 0.0), 2.0), None);
    }

    #[test]
    fn test_navigable_fails_without_area() {
        let world = StaticWorld::new();
        assert_eq!(world.sample_navigable(Vec3::ZERO, 5.0), None);
    }
}
