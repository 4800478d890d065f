use anyhow::Context;
use clap::{Parser, Subcommand};
use glam::DVec3;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use vantage_assets::StaticScene;
use vantage_camera::CameraManager;
use vantage_common::EngineConfig;
use vantage_common::precision::{round_trip_tolerance, to_double, to_float};
use vantage_input::{Action, InputState};
use vantage_render::{HeadlessBackend, RenderBackend};

#[derive(Parser)]
#[command(name = "vantage-cli", about = "CLI tool for vantage maps and cameras")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Engine configuration (YAML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print engine version and crate info
    Info,
    /// Load a map headlessly and list its static geometry
    Inspect {
        /// Map file (JSON)
        map: PathBuf,
    },
    /// Load each map and report failures
    Validate {
        #[arg(required = true)]
        maps: Vec<PathBuf>,
    },
    /// Fly a camera away from the origin and report floating-origin shifts
    Drift {
        /// Total distance to travel along +X
        #[arg(short, long, default_value = "10000000")]
        distance: f64,
        /// Distance covered per simulated frame
        #[arg(short, long, default_value = "100")]
        step: f64,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = EngineConfig::load_or_default(cli.config.as_deref())
        .context("failed to load configuration")?;

    match cli.command {
        Commands::Info => {
            println!("vantage-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", vantage_common::crate_info());
            println!("input: {}", vantage_input::crate_info());
            println!("camera: {}", vantage_camera::crate_info());
            println!("render: {}", vantage_render::crate_info());
            println!("assets: {}", vantage_assets::crate_info());
            println!(
                "camera: precision={:?}, fov={}°, floating origin={} (threshold {})",
                config.camera.precision,
                config.camera.fov_horizontal_degrees,
                if config.floating_origin.enabled { "on" } else { "off" },
                config.floating_origin.threshold
            );
        }
        Commands::Inspect { map } => inspect(&map)?,
        Commands::Validate { maps } => {
            let mut failed = 0;
            for map in &maps {
                match load_headless(map) {
                    Ok((scene, _)) => println!("OK    {} ({} meshes)", map.display(), scene.len()),
                    Err(e) => {
                        failed += 1;
                        println!("FAIL  {}: {e:#}", map.display());
                    }
                }
            }
            if failed > 0 {
                anyhow::bail!("{failed} of {} maps failed to load", maps.len());
            }
        }
        Commands::Drift { distance, step } => drift(&config, distance, step)?,
    }

    Ok(())
}

fn load_headless(path: &Path) -> anyhow::Result<(StaticScene, HeadlessBackend)> {
    let mut backend = HeadlessBackend::new();
    backend.init((), 1, 1)?;
    let mut scene = StaticScene::new();
    let report = scene
        .load_map_file(&mut backend, path)
        .with_context(|| format!("loading {}", path.display()))?;
    tracing::debug!(loaded = report.loaded, skipped = report.skipped, "headless load");
    Ok((scene, backend))
}

fn inspect(path: &Path) -> anyhow::Result<()> {
    let (scene, mut backend) = load_headless(path)?;

    println!("Map: {}", path.display());
    match scene.player_start() {
        Some(start) => println!(
            "Player start: ({:.3}, {:.3}, {:.3}) yaw={}",
            start.origin[0], start.origin[1], start.origin[2], start.yaw
        ),
        None => println!("Player start: none"),
    }
    println!("Static meshes: {}", scene.len());
    for (i, instance) in scene.instances().iter().enumerate() {
        println!(
            "  [{i}] {:<6} {} indices={} at ({:.3}, {:.3}, {:.3})",
            instance.kind,
            instance.mesh,
            instance.index_count,
            instance.position.x,
            instance.position.y,
            instance.position.z
        );
    }

    backend.begin_frame()?;
    scene.draw(&mut backend, DVec3::ZERO)?;
    backend.end_frame()?;
    let stats = backend.last_frame_stats();
    println!(
        "Frame: draws={}, binds={}, triangles={}",
        stats.draws, stats.binds, stats.triangles
    );
    Ok(())
}

/// Distance between `x` and the next representable f32.
fn f32_spacing(x: f32) -> f32 {
    let x = x.abs();
    f32::from_bits(x.to_bits() + 1) - x
}

fn drift(config: &EngineConfig, distance: f64, step: f64) -> anyhow::Result<()> {
    anyhow::ensure!(step > 0.0, "step must be positive");
    anyhow::ensure!(distance >= 0.0, "distance must not be negative");

    let mut manager = CameraManager::new(&config.camera, &config.floating_origin);
    manager.set_angles(0.0, 0.0);
    let mut input = InputState::new();
    input.press(Action::MoveForward);
    let dt = (step / config.camera.move_speed) as f32;

    let frames = (distance / step).ceil() as u64;
    let mut shifts = 0u64;
    let mut max_local = 0.0f32;
    for _ in 0..frames {
        manager.update(dt, &input, 0.0, 0.0);
        if manager
            .update_floating_origin(manager.camera_position())
            .is_some()
        {
            shifts += 1;
        }
        max_local = max_local.max(manager.local_camera_position().length());
    }

    let absolute = manager.camera_position();
    let local = manager.local_camera_position();
    let naive_error = (to_double(to_float(absolute)) - absolute).length();

    println!("Frames: {frames} (step {step})");
    println!("Origin shifts: {shifts}");
    println!(
        "Camera (absolute): ({:.3}, {:.3}, {:.3})",
        absolute.x, absolute.y, absolute.z
    );
    let origin = manager.world_origin();
    println!(
        "World origin: ({:.3}, {:.3}, {:.3})",
        origin.x, origin.y, origin.z
    );
    println!(
        "Camera (local): ({:.3}, {:.3}, {:.3}), max |local| seen {max_local:.3}",
        local.x, local.y, local.z
    );
    println!(
        "f32 spacing at local position: {:e}",
        f32_spacing(local.abs().max_element())
    );
    println!(
        "f32 spacing at absolute position: {:e} (round-trip error {naive_error:.6}, bound {:.6})",
        f32_spacing(absolute.abs().max_element() as f32),
        round_trip_tolerance(absolute)
    );
    Ok(())
}
