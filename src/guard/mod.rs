//! Guard agents and their patrol/alert state machine
//!
//! Each guard owns one finite-state machine driven by an externally supplied
//! elapsed-time step. All waiting is explicit timer fields counted down
//! against that step; nothing suspends. Randomized destinations (search
//! sweeps, flee hops) draw from the simulation's injected RNG so runs
//! replay exactly from a seed.

use glam::Vec3;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::core::types::{GuardId, ListenerId, PlayerTarget, Pose};
use crate::events::{AiEvent, EventListener};
use crate::perception::{bearing_deg, can_observe, VisionConfig};
use crate::spatial::SpatialQuery;

/// Distance at which a patrol waypoint counts as reached
pub const WAYPOINT_ARRIVAL_RADIUS: f32 = 0.5;

/// Distance at which the return-to-post waypoint counts as reached
pub const RETURN_ARRIVAL_RADIUS: f32 = 0.6;

/// How far a fleeing guard projects its next hop away from the player
pub const FLEE_STEP_DISTANCE: f32 = 8.0;

/// Sampling radius around the projected flee hop
pub const FLEE_SAMPLE_RADIUS: f32 = 2.0;

/// Player distance beyond which a fleeing guard stands down
pub const FLEE_SAFE_DISTANCE: f32 = 12.0;

/// Behavior states of a guard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GuardState {
    /// Walking the waypoint loop
    Patrol,
    /// Heading to the last heard position to investigate
    Alerted,
    /// Direct pursuit of the visible player
    Chase,
    /// Sweeping random points around the last known position
    Search,
    /// Running from the player after taking too much damage
    Flee,
    /// Walking back to the nearest waypoint
    Return,
}

/// Authored per-guard tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    pub vision: VisionConfig,
    /// Scales an incoming noise radius to this guard's hearing range
    pub hearing_radius_multiplier: f32,
    /// Starting health
    pub health: f32,
    /// Below this health the guard abandons everything and flees
    pub flee_health_threshold: f32,
    /// Seconds a search lasts before giving up
    pub search_duration: f32,
    /// Radius of the search sweep around the last known position
    pub search_radius: f32,
    /// Seconds between successive search destinations
    pub time_between_search_points: f32,
    /// Arrival distance that turns an investigation into a search
    pub investigate_radius: f32,
    /// Walking speed, consumed by the movement glue and animation
    pub move_speed: f32,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            vision: VisionConfig::default(),
            hearing_radius_multiplier: 1.0,
            health: 100.0,
            flee_health_threshold: 25.0,
            search_duration: 6.0,
            search_radius: 4.0,
            time_between_search_points: 2.0,
            investigate_radius: 0.5,
            move_speed: 3.5,
        }
    }
}

/// Navigation intent: the seam between the state machine and whatever moves
/// the guard
///
/// The core writes `destination`; the external navigation system consumes it,
/// keeps `path_pending` honest while it computes a route, and reports the
/// realized `speed` back for animation.
#[derive(Debug, Clone, Copy, Default)]
pub struct NavState {
    pub destination: Option<Vec3>,
    pub path_pending: bool,
    pub speed: f32,
}

impl NavState {
    pub fn set_destination(&mut self, target: Vec3) {
        self.destination = Some(target);
    }

    /// Straight-line distance from `from` to the current destination; zero
    /// when there is none, so an idle agent re-issues its next target
    /// immediately
    pub fn remaining_distance(&self, from: Vec3) -> f32 {
        self.destination.map_or(0.0, |d| from.distance(d))
    }
}

/// Per-tick inputs to a guard step
pub struct TickContext<'a> {
    pub dt: f32,
    pub player: Option<PlayerTarget>,
    pub spatial: &'a dyn SpatialQuery,
    pub rng: &'a mut ChaCha8Rng,
}

/// One guard agent
#[derive(Debug)]
pub struct Guard {
    id: GuardId,
    listener: ListenerId,
    pub name: String,
    pub pose: Pose,
    pub nav: NavState,
    state: GuardState,
    waypoints: Vec<Vec3>,
    waypoint_index: usize,
    last_known_position: Option<Vec3>,
    health: f32,
    active: bool,
    search_timer: f32,
    next_search_point_timer: f32,
    pub config: GuardConfig,
}

impl Guard {
    pub fn new(name: impl Into<String>, pose: Pose, waypoints: Vec<Vec3>, config: GuardConfig) -> Self {
        let name = name.into();
        if waypoints.is_empty() {
            tracing::warn!("guard {} has no patrol waypoints; patrol will hold position", name);
        }

        let mut guard = Self {
            id: GuardId::new(),
            listener: ListenerId::new(),
            name,
            pose,
            nav: NavState::default(),
            state: GuardState::Patrol,
            waypoints,
            waypoint_index: 0,
            last_known_position: None,
            health: config.health,
            active: true,
            search_timer: 0.0,
            next_search_point_timer: 0.0,
            config,
        };
        guard.goto_next_waypoint();
        guard
    }

    pub fn id(&self) -> GuardId {
        self.id
    }

    pub fn state(&self) -> GuardState {
        self.state
    }

    pub fn health(&self) -> f32 {
        self.health
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn last_known_position(&self) -> Option<Vec3> {
        self.last_known_position
    }

    /// Current movement speed as reported by the navigation seam
    pub fn speed(&self) -> f32 {
        self.nav.speed
    }

    /// Advance the state machine by one tick
    ///
    /// Fixed evaluation order: top-of-tick vision test, then the body of the
    /// current state, then the health override. The returned events are
    /// published by the caller before the next agent steps.
    pub fn step(&mut self, ctx: &mut TickContext<'_>) -> Vec<AiEvent> {
        if !self.active {
            return Vec::new();
        }

        let mut events = Vec::new();

        // 1. Vision: direct sight forces pursuit and reports the sighting.
        if let Some(player) = ctx.player {
            if can_observe(
                &self.pose,
                player.body,
                player.pose.position,
                &self.config.vision,
                ctx.spatial,
            ) {
                self.last_known_position = Some(player.pose.position);
                self.set_state(GuardState::Chase);
                events.push(AiEvent::Spotted {
                    observer: self.id,
                    position: player.pose.position,
                });
            }
        }

        // 2. Current state's behavior.
        match self.state {
            GuardState::Patrol => self.patrol(ctx),
            GuardState::Alerted => self.alerted(),
            GuardState::Chase => self.chase(ctx),
            GuardState::Search => self.search(ctx),
            GuardState::Flee => self.flee(ctx),
            GuardState::Return => self.return_to_post(),
        }

        // 3. Health override wins over whatever the state body decided.
        if self.health < self.config.flee_health_threshold && self.state != GuardState::Flee {
            self.set_state(GuardState::Flee);
        }

        events
    }

    /// Reduce health, clamped at zero; zero health deactivates the guard for
    /// good
    pub fn apply_damage(&mut self, amount: f32) {
        self.health = (self.health - amount).max(0.0);
        if self.health <= 0.0 && self.active {
            self.active = false;
            tracing::debug!("guard {} incapacitated", self.name);
        }
    }

    fn set_state(&mut self, next: GuardState) {
        if self.state != next {
            tracing::debug!("guard {} {:?} -> {:?}", self.name, self.state, next);
            self.state = next;
        }
    }

    fn goto_next_waypoint(&mut self) {
        if self.waypoints.is_empty() {
            return;
        }
        self.nav.set_destination(self.waypoints[self.waypoint_index]);
        self.waypoint_index = (self.waypoint_index + 1) % self.waypoints.len();
    }

    fn patrol(&mut self, ctx: &TickContext<'_>) {
        if !self.nav.path_pending
            && self.nav.remaining_distance(self.pose.position) < WAYPOINT_ARRIVAL_RADIUS
        {
            self.goto_next_waypoint();
        }
        self.detect_player_close(ctx);
    }

    /// Short-range cone check layered on top of full perception: no
    /// occlusion, no lighting. Forces pursuit but records nothing and
    /// reports nothing.
    fn detect_player_close(&mut self, ctx: &TickContext<'_>) {
        let Some(player) = ctx.player else {
            return;
        };
        let to_player = player.pose.position - self.pose.position;
        if bearing_deg(self.pose.forward, to_player) < self.config.vision.fov_degrees * 0.5
            && to_player.length() < self.config.vision.range
        {
            self.set_state(GuardState::Chase);
        }
    }

    fn alerted(&mut self) {
        let Some(target) = self.last_known_position else {
            tracing::warn!("guard {} alerted with no last known position", self.name);
            self.set_state(GuardState::Return);
            return;
        };

        if !self.nav.path_pending {
            self.nav.set_destination(target);
            if self.pose.position.distance(target) <= self.config.investigate_radius {
                self.enter_search();
            }
        }
    }

    fn enter_search(&mut self) {
        self.set_state(GuardState::Search);
        self.search_timer = self.config.search_duration;
        self.next_search_point_timer = 0.0;
    }

    fn chase(&mut self, ctx: &mut TickContext<'_>) {
        let Some(player) = ctx.player else {
            self.set_state(GuardState::Return);
            return;
        };

        self.nav.set_destination(player.pose.position);

        if !can_observe(
            &self.pose,
            player.body,
            player.pose.position,
            &self.config.vision,
            ctx.spatial,
        ) {
            self.last_known_position = Some(player.pose.position);
            self.enter_search();
        }
    }

    fn search(&mut self, ctx: &mut TickContext<'_>) {
        self.search_timer -= ctx.dt;
        self.next_search_point_timer -= ctx.dt;

        if self.search_timer <= 0.0 {
            self.set_state(GuardState::Return);
            return;
        }

        if self.next_search_point_timer <= 0.0 {
            let Some(center) = self.last_known_position else {
                tracing::warn!("guard {} searching with no last known position", self.name);
                self.set_state(GuardState::Return);
                return;
            };
            // Sampling failure keeps the previous destination for this round.
            if let Some(point) = sample_point_near(center, self.config.search_radius, ctx) {
                self.nav.set_destination(point);
            }
            self.next_search_point_timer = self.config.time_between_search_points;
        }
    }

    fn flee(&mut self, ctx: &mut TickContext<'_>) {
        let Some(player) = ctx.player else {
            self.set_state(GuardState::Return);
            return;
        };

        let away = (self.pose.position - player.pose.position).normalize_or_zero();
        let flee_target = self.pose.position + away * FLEE_STEP_DISTANCE;
        if let Some(point) = sample_point_near(flee_target, FLEE_SAMPLE_RADIUS, ctx) {
            self.nav.set_destination(point);
        }

        if self.pose.position.distance(player.pose.position) > FLEE_SAFE_DISTANCE {
            self.set_state(GuardState::Return);
        }
    }

    fn return_to_post(&mut self) {
        if self.waypoints.is_empty() {
            self.set_state(GuardState::Patrol);
            return;
        }

        let closest = self
            .waypoints
            .iter()
            .copied()
            .min_by(|a, b| {
                self.pose
                    .position
                    .distance(*a)
                    .total_cmp(&self.pose.position.distance(*b))
            })
            .unwrap_or(self.waypoints[0]);

        self.nav.set_destination(closest);

        if !self.nav.path_pending
            && self.nav.remaining_distance(self.pose.position) < RETURN_ARRIVAL_RADIUS
        {
            self.set_state(GuardState::Patrol);
        }
    }
}

impl EventListener for Guard {
    fn listener_id(&self) -> ListenerId {
        self.listener
    }

    fn on_event(&mut self, event: &AiEvent) -> Vec<AiEvent> {
        if let AiEvent::Noise { position, radius } = event {
            let distance = self.pose.position.distance(*position);
            if distance <= radius * self.config.hearing_radius_multiplier {
                // Heard it. Store the position either way; engaged guards
                // (chasing, fleeing) do not break off to investigate.
                self.last_known_position = Some(*position);
                if self.state != GuardState::Chase && self.state != GuardState::Flee {
                    self.set_state(GuardState::Alerted);
                }
            }
        }
        Vec::new()
    }
}

/// Random offset inside the unit sphere, scaled by `distance`, snapped to the
/// navigable surface
fn sample_point_near(origin: Vec3, distance: f32, ctx: &mut TickContext<'_>) -> Option<Vec3> {
    let candidate = origin + random_in_sphere(ctx.rng) * distance;
    ctx.spatial.sample_navigable(candidate, distance)
}

fn random_in_sphere(rng: &mut ChaCha8Rng) -> Vec3 {
    loop {
        let v = Vec3::new(
            rng.gen_range(-1.0f32..1.0),
            rng.gen_range(-1.0f32..1.0),
            rng.gen_range(-1.0f32..1.0),
        );
        if v.length_squared() <= 1.0 {
            return v;
        }
    }
}
