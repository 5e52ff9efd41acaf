//! Night Watch - headless scenario runner
//!
//! Loads a TOML scenario (or falls back to a built-in demo level), drives the
//! simulation for the configured number of ticks, and prints a JSON summary
//! of the outcome. Presentation glue only; everything interesting lives in
//! the library.

use clap::Parser;

use night_watch::core::config::ScenarioConfig;
use night_watch::core::error::Result;
use night_watch::simulation::{advance_player_route, movement_noise_kind, Simulation};
use night_watch::spatial::Aabb;

#[derive(Parser, Debug)]
#[command(name = "night-watch", about = "Headless stealth-simulation runner")]
struct Args {
    /// Scenario TOML file; omit to run the built-in demo level
    #[arg(short, long)]
    scenario: Option<std::path::PathBuf>,

    /// Override the scenario tick count
    #[arg(long)]
    ticks: Option<u32>,

    /// Override the scenario RNG seed
    #[arg(long)]
    seed: Option<u64>,

    /// Print the full JSON summary instead of the one-line outcome
    #[arg(long)]
    json: bool,
}

/// Demo level: two guards on crossing patrol routes, one camera, a lit
/// corridor, and a player scripted to sprint through it.
const DEMO_SCENARIO: &str = r#"
seed = 42

[run]
ticks = 600
dt = 0.1

[player]
position = [0.0, 0.0, 14.0]

[player.movement]
route = [[12.0, 0.0, 14.0], [-12.0, 0.0, 14.0]]
speed = 4.0
noise = "run"

[[guards]]
name = "east-wing"
position = [-8.0, 0.0, 0.0]
forward = [0.0, 0.0, 1.0]
waypoints = [[-8.0, 0.0, 0.0], [-8.0, 0.0, 12.0], [8.0, 0.0, 12.0], [8.0, 0.0, 0.0]]

[[guards]]
name = "west-wing"
position = [8.0, 0.0, 6.0]
forward = [0.0, 0.0, -1.0]
waypoints = [[8.0, 0.0, 6.0], [-8.0, 0.0, 6.0]]

[guards.config]
hearing_radius_multiplier = 1.5

[[cameras]]
name = "corridor"
position = [0.0, 3.0, 20.0]
forward = [0.0, 0.0, -1.0]

[[world.obstacles]]
min = [-2.0, 0.0, 8.0]
max = [2.0, 3.0, 9.0]

[[world.lights]]
position = [0.0, 2.5, 14.0]
intensity = 3.0

[[world.lights]]
position = [0.0, 2.5, 4.0]
intensity = 2.0

[world.walkable]
min_x = -15.0
max_x = 15.0
min_z = -5.0
max_z = 25.0
"#;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "night_watch=info".into()),
        )
        .init();

    let args = Args::parse();

    let mut scenario = match &args.scenario {
        Some(path) => ScenarioConfig::load(path)?,
        None => {
            tracing::info!("no scenario given, running the built-in demo level");
            ScenarioConfig::from_toml_str(DEMO_SCENARIO)?
        }
    };
    if let Some(ticks) = args.ticks {
        scenario.run.ticks = ticks;
    }
    if let Some(seed) = args.seed {
        scenario.seed = seed;
    }

    let (mut sim, mut world) = Simulation::from_scenario(&scenario)?;
    let dt = scenario.run.dt;
    let movement = scenario.player.as_ref().and_then(|p| p.movement.clone());
    let player_extents = scenario.player.as_ref().map(|p| p.half_extents);
    let mut route_index = 0;

    tracing::info!(
        "running {} ticks of {}s with {} guards and {} cameras",
        scenario.run.ticks,
        dt,
        sim.guards().len(),
        sim.cameras().len()
    );

    for _ in 0..scenario.run.ticks {
        if let Some(movement) = &movement {
            let moved =
                advance_player_route(&mut sim, &movement.route, movement.speed, &mut route_index, dt);

            // Keep the player's body box in the world aligned with its pose
            if let (Some(player), Some(half_extents)) = (sim.player().copied(), player_extents) {
                world.move_body(
                    player.body,
                    Aabb::new(
                        player.pose.position - half_extents,
                        player.pose.position + half_extents,
                    ),
                );
            }

            if moved {
                if let Some(kind) = movement_noise_kind(movement.noise) {
                    sim.emit_player_noise(kind);
                }
            }
        }

        sim.tick(dt, &world);

        if sim.take_caught_event() {
            tracing::info!("player caught on tick {}", sim.current_tick());
            break;
        }
    }

    let summary = sim.summary();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "tick {}: alarm={} detection={:.2} caught={}",
            summary.tick, summary.alarmed, summary.detection_level, summary.caught
        );
        for guard in &summary.guards {
            println!(
                "  {} {:?} health={:.0}{}",
                guard.name,
                guard.state,
                guard.health,
                if guard.active { "" } else { " (down)" }
            );
        }
        for camera in &summary.cameras {
            println!(
                "  {} {}{}",
                camera.name,
                if camera.active { "active" } else { "off" },
                if camera.player_detected { ", player on screen" } else { "" }
            );
        }
    }

    Ok(())
}
