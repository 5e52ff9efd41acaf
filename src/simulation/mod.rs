//! Simulation context and tick orchestration
//!
//! One explicitly constructed context replaces every engine-side singleton:
//! it owns the guard roster, the cameras, the event bus, the alarm, the
//! detection meter, the player actor, and the seeded RNG. The spatial service
//! stays with the caller and is lent to [`Simulation::tick`], so scene
//! geometry can move between ticks without sharing ownership.
//!
//! Tick order is fixed: each active guard steps and its events fan out
//! synchronously before the next guard steps; then the movement glue
//! advances poses; then cameras sweep; then the detection meter samples.

use glam::Vec3;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::camera::SecurityCamera;
use crate::core::config::{MovementNoise, ScenarioConfig};
use crate::core::error::{Result, WatchError};
use crate::core::types::{BodyId, CameraId, GuardId, PlayerTarget, Pose, Tick};
use crate::detection::{DetectionConfig, DetectionMeter};
use crate::events::{AiEvent, AlarmCoordinator, EventBus, EventListener};
use crate::guard::{Guard, GuardState, TickContext};
use crate::spatial::static_world::Aabb;
use crate::spatial::{SpatialQuery, StaticWorld};

/// Noise loudness classes the player can emit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoiseKind {
    Walk,
    Run,
}

/// Walk/run noise radii for an actor
#[derive(Debug, Clone, Copy)]
pub struct NoiseProfile {
    pub walk_radius: f32,
    pub run_radius: f32,
}

impl NoiseProfile {
    pub fn radius(&self, kind: NoiseKind) -> f32 {
        match kind {
            NoiseKind::Walk => self.walk_radius,
            NoiseKind::Run => self.run_radius,
        }
    }
}

impl Default for NoiseProfile {
    fn default() -> Self {
        Self {
            walk_radius: 2.0,
            run_radius: 6.0,
        }
    }
}

/// The player as the simulation tracks it
#[derive(Debug, Clone, Copy)]
pub struct PlayerActor {
    pub body: BodyId,
    pub pose: Pose,
    pub noise: NoiseProfile,
}

/// The stealth simulation context
pub struct Simulation {
    guards: Vec<Guard>,
    cameras: Vec<SecurityCamera>,
    bus: EventBus,
    alarm: AlarmCoordinator,
    detection: DetectionMeter,
    player: Option<PlayerActor>,
    rng: ChaCha8Rng,
    tick: Tick,
    /// Whether the built-in straight-line mover advances guard poses;
    /// disable when an external navigation system owns movement
    pub integrate_movement: bool,
}

impl Simulation {
    pub fn new(seed: u64, detection: DetectionConfig) -> Self {
        let mut bus = EventBus::new();
        let alarm = AlarmCoordinator::new();
        bus.subscribe(alarm.listener_id());

        Self {
            guards: Vec::new(),
            cameras: Vec::new(),
            bus,
            alarm,
            detection: DetectionMeter::new(detection),
            player: None,
            rng: ChaCha8Rng::seed_from_u64(seed),
            tick: 0,
            integrate_movement: true,
        }
    }

    /// Build a simulation and its static world from a scenario
    pub fn from_scenario(config: &ScenarioConfig) -> Result<(Self, StaticWorld)> {
        config.validate().map_err(WatchError::InvalidScenario)?;

        let mut world = StaticWorld::new();
        for obstacle in &config.world.obstacles {
            world.add_body(Aabb::new(obstacle.min, obstacle.max));
        }
        for light in &config.world.lights {
            world.add_light(light.position, light.intensity);
        }
        if let Some(area) = config.world.walkable {
            world.set_walkable(area);
        }

        let mut sim = Self::new(config.seed, config.detection);

        for (index, spawn) in config.guards.iter().enumerate() {
            let name = if spawn.name.is_empty() {
                format!("guard-{index}")
            } else {
                spawn.name.clone()
            };
            let forward = default_forward(spawn.forward);
            let guard = Guard::new(
                name,
                Pose::new(spawn.position, forward),
                spawn.waypoints.clone(),
                spawn.config.clone(),
            );
            sim.add_guard(guard);
        }

        for (index, spawn) in config.cameras.iter().enumerate() {
            let name = if spawn.name.is_empty() {
                format!("camera-{index}")
            } else {
                spawn.name.clone()
            };
            let forward = default_forward(spawn.forward);
            sim.add_camera(SecurityCamera::new(
                name,
                Pose::new(spawn.position, forward),
                spawn.config,
            ));
        }

        if let Some(player) = &config.player {
            let body = BodyId::new();
            world.add_body_with_id(body, player_bounds(player.position, player.half_extents));
            sim.spawn_player(
                body,
                Pose::new(player.position, default_forward(player.forward)),
                NoiseProfile {
                    walk_radius: player.walk_noise_radius,
                    run_radius: player.run_noise_radius,
                },
            );
        }

        Ok((sim, world))
    }

    /// Register a guard; it subscribes to the event bus for as long as it
    /// stays active
    pub fn add_guard(&mut self, guard: Guard) -> GuardId {
        let id = guard.id();
        self.bus.subscribe(guard.listener_id());
        self.guards.push(guard);
        id
    }

    pub fn add_camera(&mut self, camera: SecurityCamera) -> CameraId {
        let id = camera.id();
        self.cameras.push(camera);
        id
    }

    pub fn spawn_player(&mut self, body: BodyId, pose: Pose, noise: NoiseProfile) {
        self.player = Some(PlayerActor { body, pose, noise });
    }

    pub fn despawn_player(&mut self) {
        self.player = None;
    }

    pub fn set_player_pose(&mut self, pose: Pose) {
        if let Some(player) = &mut self.player {
            player.pose = pose;
        }
    }

    pub fn player(&self) -> Option<&PlayerActor> {
        self.player.as_ref()
    }

    pub fn current_tick(&self) -> Tick {
        self.tick
    }

    pub fn guards(&self) -> &[Guard] {
        &self.guards
    }

    pub fn cameras(&self) -> &[SecurityCamera] {
        &self.cameras
    }

    pub fn guard(&self, id: GuardId) -> Result<&Guard> {
        self.guards
            .iter()
            .find(|g| g.id() == id)
            .ok_or(WatchError::GuardNotFound(id))
    }

    pub fn is_alarmed(&self) -> bool {
        self.alarm.is_alarmed()
    }

    pub fn detection_level(&self) -> f32 {
        self.detection.level()
    }

    pub fn is_caught(&self) -> bool {
        self.detection.is_caught()
    }

    /// One-shot caught signal; true exactly once per saturation
    pub fn take_caught_event(&mut self) -> bool {
        self.detection.take_caught_event()
    }

    pub fn reset_detection(&mut self) {
        self.detection.reset();
    }

    /// Damage intake for a guard; lethal damage deactivates it and removes
    /// it from the event bus immediately
    pub fn apply_damage(&mut self, id: GuardId, amount: f32) -> Result<()> {
        let guard = self
            .guards
            .iter_mut()
            .find(|g| g.id() == id)
            .ok_or(WatchError::GuardNotFound(id))?;
        guard.apply_damage(amount);
        if !guard.is_active() {
            let listener = guard.listener_id();
            self.bus.unsubscribe(listener);
        }
        Ok(())
    }

    pub fn set_camera_active(&mut self, id: CameraId, active: bool) -> Result<()> {
        let camera = self
            .cameras
            .iter_mut()
            .find(|c| c.id() == id)
            .ok_or(WatchError::CameraNotFound(id))?;
        camera.set_active(active);
        Ok(())
    }

    /// Publish an event to every subscribed listener, synchronously
    pub fn publish_event(&mut self, event: AiEvent) {
        let mut roster: Vec<&mut dyn EventListener> = Vec::with_capacity(self.guards.len() + 1);
        for guard in &mut self.guards {
            roster.push(guard);
        }
        roster.push(&mut self.alarm);
        self.bus.publish(event, &mut roster);
    }

    /// Raise a noise at a position, audible within `radius`
    pub fn raise_noise(&mut self, position: Vec3, radius: f32) {
        self.publish_event(AiEvent::Noise { position, radius });
    }

    /// Raise noise at the player's position using its noise profile
    pub fn emit_player_noise(&mut self, kind: NoiseKind) {
        let Some(player) = self.player else {
            return;
        };
        self.raise_noise(player.pose.position, player.noise.radius(kind));
    }

    /// Advance the whole simulation by `dt` seconds
    pub fn tick(&mut self, dt: f32, spatial: &dyn SpatialQuery) {
        self.tick += 1;
        let player = self.player_target();

        for i in 0..self.guards.len() {
            if !self.guards[i].is_active() {
                continue;
            }
            let events = self.guards[i].step(&mut TickContext {
                dt,
                player,
                spatial,
                rng: &mut self.rng,
            });
            for event in events {
                self.publish_event(event);
            }
        }

        if self.integrate_movement {
            for guard in self.guards.iter_mut().filter(|g| g.is_active()) {
                advance_movement(guard, dt);
            }
        }

        for camera in &mut self.cameras {
            camera.tick(dt, player.as_ref(), spatial);
        }

        let any_guard_sees = player.map_or(false, |p| {
            self.guards
                .iter()
                .filter(|g| g.is_active())
                .any(|g| self.detection.guard_sees_player(&g.pose, &p, spatial))
        });
        self.detection.update(dt, any_guard_sees);
    }

    /// Snapshot of the run for logging and the headless runner
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            tick: self.tick,
            alarmed: self.alarm.is_alarmed(),
            detection_level: self.detection.level(),
            caught: self.detection.is_caught(),
            guards: self
                .guards
                .iter()
                .map(|g| GuardSummary {
                    name: g.name.clone(),
                    state: g.state(),
                    health: g.health(),
                    active: g.is_active(),
                    position: g.pose.position,
                    speed: g.speed(),
                })
                .collect(),
            cameras: self
                .cameras
                .iter()
                .map(|c| CameraSummary {
                    name: c.name.clone(),
                    active: c.is_active(),
                    player_detected: c.player_detected(),
                })
                .collect(),
        }
    }

    fn player_target(&self) -> Option<PlayerTarget> {
        self.player.map(|p| PlayerTarget {
            body: p.body,
            pose: p.pose,
        })
    }
}

/// Straight-line stand-in for the external navigation system: walk the pose
/// toward the nav destination and report the realized speed back through the
/// navigation seam
pub fn advance_movement(guard: &mut Guard, dt: f32) {
    let Some(destination) = guard.nav.destination else {
        guard.nav.speed = 0.0;
        return;
    };

    let delta = destination - guard.pose.position;
    let distance = delta.length();
    let step = guard.config.move_speed * dt;

    if distance <= step || distance < 1e-4 {
        guard.pose.position = destination;
        guard.nav.speed = if dt > 0.0 { distance / dt } else { 0.0 };
    } else {
        let direction = delta / distance;
        guard.pose.position += direction * step;
        guard.pose.forward = direction;
        guard.nav.speed = guard.config.move_speed;
    }
    guard.nav.path_pending = false;
}

/// Scripted player movement used by the headless runner: walk the route in
/// order, looping, and report whether the player moved this tick
pub fn advance_player_route(
    sim: &mut Simulation,
    route: &[Vec3],
    speed: f32,
    route_index: &mut usize,
    dt: f32,
) -> bool {
    if route.is_empty() {
        return false;
    }
    let Some(player) = sim.player().copied() else {
        return false;
    };

    let target = route[*route_index % route.len()];
    let delta = target - player.pose.position;
    let distance = delta.length();
    let step = speed * dt;

    let new_position = if distance <= step || distance < 1e-4 {
        *route_index = (*route_index + 1) % route.len();
        target
    } else {
        player.pose.position + delta / distance * step
    };

    let forward = if distance > 1e-4 {
        delta / distance
    } else {
        player.pose.forward
    };
    sim.set_player_pose(Pose::new(new_position, forward));
    true
}

/// Noise kind for a scripted movement class, if it makes any
pub fn movement_noise_kind(noise: MovementNoise) -> Option<NoiseKind> {
    match noise {
        MovementNoise::Silent => None,
        MovementNoise::Walk => Some(NoiseKind::Walk),
        MovementNoise::Run => Some(NoiseKind::Run),
    }
}

/// Serializable run snapshot
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub tick: Tick,
    pub alarmed: bool,
    pub detection_level: f32,
    pub caught: bool,
    pub guards: Vec<GuardSummary>,
    pub cameras: Vec<CameraSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GuardSummary {
    pub name: String,
    pub state: GuardState,
    pub health: f32,
    pub active: bool,
    pub position: Vec3,
    pub speed: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct CameraSummary {
    pub name: String,
    pub active: bool,
    pub player_detected: bool,
}

fn default_forward(forward: Vec3) -> Vec3 {
    if forward == Vec3::ZERO {
        Vec3::Z
    } else {
        forward.normalize()
    }
}

fn player_bounds(position: Vec3, half_extents: Vec3) -> Aabb {
    Aabb::new(position - half_extents, position + half_extents)
}
