//! Scenario configuration
//!
//! A scenario TOML file authors everything a level needs: the world geometry
//! handed to the spatial service, the player actor, the guard roster with
//! per-guard tuning, the camera placements, and the detection meter rates.
//! Values the file leaves out fall back to the same defaults the original
//! level data shipped with.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::camera::CameraConfig;
use crate::core::error::Result;
use crate::detection::DetectionConfig;
use crate::guard::GuardConfig;
use crate::spatial::WalkableArea;

/// Complete scenario description
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    /// RNG seed; identical seeds replay identical runs
    pub seed: u64,
    pub run: RunConfig,
    pub detection: DetectionConfig,
    pub player: Option<PlayerConfig>,
    pub guards: Vec<GuardSpawnConfig>,
    pub cameras: Vec<CameraSpawnConfig>,
    pub world: WorldConfig,
}

impl ScenarioConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    /// Structural checks the runner depends on
    ///
    /// Behavior scalars are accepted as authored; only values that break the
    /// tick loop itself are rejected.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.run.ticks == 0 {
            return Err("run.ticks must be at least 1".into());
        }
        if self.run.dt <= 0.0 {
            return Err(format!("run.dt must be positive, got {}", self.run.dt));
        }
        Ok(())
    }
}

/// Headless run settings
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Number of ticks to simulate
    pub ticks: u32,
    /// Simulated seconds per tick
    pub dt: f32,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self { ticks: 600, dt: 0.1 }
    }
}

/// The player actor as authored
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub position: Vec3,
    pub forward: Vec3,
    /// Noise radius while sneaking
    pub walk_noise_radius: f32,
    /// Noise radius while running
    pub run_noise_radius: f32,
    /// Half-extents of the player's body box in the spatial world
    pub half_extents: Vec3,
    /// Optional scripted movement for headless runs
    pub movement: Option<PlayerRoute>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            forward: Vec3::Z,
            walk_noise_radius: 2.0,
            run_noise_radius: 6.0,
            half_extents: Vec3::new(0.4, 0.9, 0.4),
            movement: None,
        }
    }
}

/// Scripted player path for the headless runner
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerRoute {
    /// Positions visited in order, looping
    pub route: Vec<Vec3>,
    pub speed: f32,
    /// Noise the player makes while moving
    pub noise: MovementNoise,
}

impl Default for PlayerRoute {
    fn default() -> Self {
        Self {
            route: Vec::new(),
            speed: 5.0,
            noise: MovementNoise::Run,
        }
    }
}

/// How loudly the scripted player moves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementNoise {
    Silent,
    Walk,
    Run,
}

/// One guard as authored
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardSpawnConfig {
    /// Display name; empty names get numbered at spawn
    pub name: String,
    pub position: Vec3,
    pub forward: Vec3,
    /// Patrol stops in visit order
    pub waypoints: Vec<Vec3>,
    pub config: GuardConfig,
}

/// One security camera as authored
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSpawnConfig {
    pub name: String,
    pub position: Vec3,
    pub forward: Vec3,
    pub config: CameraConfig,
}

/// Static world geometry handed to the spatial service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub obstacles: Vec<ObstacleConfig>,
    pub lights: Vec<LightConfig>,
    pub walkable: Option<WalkableArea>,
}

/// An axis-aligned blocking box
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ObstacleConfig {
    pub min: Vec3,
    pub max: Vec3,
}

/// A point light
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LightConfig {
    pub position: Vec3,
    pub intensity: f32,
}
