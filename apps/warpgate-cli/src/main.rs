mod config;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use glam::DVec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing_subscriber::EnvFilter;
use warpgate_common::{ActorId, Coordinate, Orientation, WorldId};
use warpgate_kernel::{CommandBuffer, Notifier, SharedWorld, Terrain, World, WorldEvent};
use warpgate_protect::{ProtectedArea, RegionTracker};
use warpgate_search::SafeLocationSearch;
use warpgate_teleport::{
    PendingActionRegistry, RandomTeleport, RtpTask, Target, TeleportRequest, TickStatus,
};

use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "warpgate-cli", about = "CLI tool for delayed teleport coordination")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// YAML config file; defaults apply when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Print the effective configuration as JSON
    Config,
    /// Drive delayed teleports over an in-memory world
    Simulate {
        /// Number of actors requesting a teleport
        #[arg(short, long, default_value = "6")]
        actors: usize,
        /// Number of ticks to run
        #[arg(short, long, default_value = "100")]
        ticks: u64,
        /// Seconds per tick
        #[arg(long, default_value = "0.05")]
        dt: f32,
        /// RNG seed for terrain, destinations and who fidgets
        #[arg(short, long, default_value = "42")]
        seed: u64,
    },
    /// Random teleport over generated terrain
    Rtp {
        /// RNG seed for terrain and sampling
        #[arg(short, long, default_value = "7")]
        seed: u64,
        /// Search radius
        #[arg(short, long, default_value = "64")]
        radius: i32,
        /// Start the actor in another world so the search runs asynchronously
        #[arg(long)]
        cross_world: bool,
    },
    /// Check a position against the protected spawn area
    Protect {
        /// Position to test, as x y z
        #[arg(num_args = 3, value_names = ["X", "Y", "Z"], allow_negative_numbers = true)]
        position: Vec<f64>,
        /// Spawn point, as x y z
        #[arg(long, num_args = 3, default_values_t = [0.0, 64.0, 0.0], allow_negative_numbers = true)]
        spawn: Vec<f64>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Info => {
            println!("warpgate-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("kernel: tick={}", World::new().tick());
            println!("search: {}", warpgate_search::crate_info());
            println!("teleport: {}", warpgate_teleport::crate_info());
            println!("protect: {}", warpgate_protect::crate_info());
        }
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Commands::Simulate {
            actors,
            ticks,
            dt,
            seed,
        } => simulate(&config, actors, ticks, dt, seed),
        Commands::Rtp {
            seed,
            radius,
            cross_world,
        } => rtp(&config, seed, radius, cross_world),
        Commands::Protect { position, spawn } => {
            let at = vec3(&position)?;
            let area = ProtectedArea::new(Some(vec3(&spawn)?), &config.protection);
            println!(
                "{}",
                serde_json::json!({
                    "position": [at.x, at.y, at.z],
                    "inside": area.contains(at),
                    "block-inside": area.contains_block(at.floor().as_ivec3()),
                })
            );
        }
    }

    Ok(())
}

fn vec3(values: &[f64]) -> anyhow::Result<DVec3> {
    match values {
        [x, y, z] => Ok(DVec3::new(*x, *y, *z)),
        _ => anyhow::bail!("expected 3 coordinates, got {}", values.len()),
    }
}

fn simulate(config: &AppConfig, actors: usize, ticks: u64, dt: f32, seed: u64) {
    println!("Teleport simulation: actors={actors}, ticks={ticks}, dt={dt}, seed={seed}");
    let mut rng = StdRng::seed_from_u64(seed);
    let overworld = WorldId::new("overworld");

    let mut terrain = Terrain::generate(seed, 48);
    terrain.load_all();
    let mut world = World::new();
    world.load_world(overworld.clone(), terrain);
    let ids: Vec<ActorId> = (0..actors)
        .map(|i| {
            world.join(Coordinate::new(
                overworld.clone(),
                DVec3::new(i as f64 * 4.0, 80.0, 0.0),
                Orientation::new(rng.gen_range(-180.0..180.0), rng.gen_range(-90.0..90.0)),
            ))
        })
        .collect();
    let shared = SharedWorld::new(world);

    let registry = PendingActionRegistry::for_host(Arc::new(shared.clone()), config.teleport.clone());
    let spawn = config.protection.clone();
    let tracker = RegionTracker::new(ProtectedArea::new(Some(DVec3::new(0.0, 80.0, 0.0)), &spawn), spawn);
    let buffer = CommandBuffer::new();

    let mut restless = Vec::new();
    for (i, &actor) in ids.iter().enumerate() {
        let start = DVec3::new(i as f64 * 4.0, 80.0, 0.0);
        let target = if i % 3 == 2 {
            Target::follow(ids[i - 1])
        } else {
            Target::coordinate(Coordinate::new(
                overworld.clone(),
                DVec3::new(rng.gen_range(-40.0..40.0), 0.0, rng.gen_range(-40.0..40.0)),
                Orientation::new(rng.gen_range(-180.0..180.0), 0.0),
            ))
        };
        let request = TeleportRequest::with_config(actor, start, target, &config.teleport)
            .with_message("Teleported!");
        let outcome = registry.request(request);
        if let Some(notice) = outcome.notice() {
            shared.notify(actor, &notice);
        }
        if rng.gen_range(0..4) == 0 {
            restless.push(actor);
        }
        tracker.observe(actor, start);
    }

    let (mut dispatched, mut cancelled) = (0usize, 0usize);
    for _ in 0..ticks {
        for &actor in &restless {
            let position = shared.read().get(actor).map(|a| a.coordinate.position);
            if let Some(position) = position {
                shared.write().move_to(actor, position + DVec3::new(0.3, 0.0, 0.0));
            }
        }
        for actor in registry.pending_actors() {
            let position = shared.read().get(actor).map(|a| a.coordinate.position);
            let Some(position) = position else {
                registry.disconnect(actor);
                continue;
            };
            match registry.tick(actor, position, dt, &buffer) {
                TickStatus::Dispatched => dispatched += 1,
                TickStatus::Cancelled => cancelled += 1,
                TickStatus::Idle | TickStatus::Waiting { .. } => {}
            }
        }
        buffer.drain();
        shared.write().step();
        for &actor in &ids {
            let position = shared.read().get(actor).map(|a| a.coordinate.position);
            if let Some(transition) = position.and_then(|p| tracker.observe(actor, p)) {
                tracing::debug!(actor = %actor, ?transition, "spawn boundary crossed");
            }
        }
    }

    let events = shared.write().drain_events();
    let relocated = events
        .iter()
        .filter(|e| matches!(e, WorldEvent::Relocated { .. }))
        .count();
    println!(
        "Result: dispatched={dispatched}, cancelled={cancelled}, relocated={relocated}, still pending={}",
        registry.pending_count()
    );
    for &actor in &ids {
        let messages = shared.take_messages(actor);
        let position = shared.read().get(actor).map(|a| a.coordinate.position);
        println!("  {actor}: at {position:?}, messages {messages:?}");
    }
    registry.shutdown();
}

fn rtp(config: &AppConfig, seed: u64, radius: i32, cross_world: bool) {
    let overworld = WorldId::new("overworld");
    let lobby = WorldId::new("lobby");
    println!("Random teleport: seed={seed}, radius={radius}, cross_world={cross_world}");

    // Same terrain twice: one resident for the blocking search, one cold.
    let generated = Terrain::generate(seed, radius.max(0));
    let mut resident = generated.clone();
    resident.load_all();

    let mut reference = World::new();
    reference.load_world(overworld.clone(), resident.clone());
    let reference = SharedWorld::new(reference);
    let search = SafeLocationSearch::new(Arc::new(reference), config.rtp.search.clone());
    let mut agree = 0;
    for sample in 0..16u64 {
        let mut rng = StdRng::seed_from_u64(seed + sample);
        let blocking = search.find_blocking(&overworld, radius, &mut rng);
        let fetched = pollster::block_on(search.find(
            overworld.clone(),
            radius,
            StdRng::seed_from_u64(seed + sample),
        ));
        if blocking == fetched {
            agree += 1;
        }
    }
    println!("Blocking and async searches agree on {agree}/16 seeds");

    let mut world = World::new();
    world.load_world(overworld.clone(), if cross_world { generated } else { resident });
    world.load_world(lobby.clone(), Terrain::flat(8, 1));
    let home = if cross_world { lobby } else { overworld.clone() };
    let actor = world.join(Coordinate::new(home, DVec3::new(0.5, 2.0, 0.5), Orientation::default()));
    let shared = SharedWorld::new(world);

    let mut rtp_config = config.rtp.clone();
    rtp_config.radii.insert(overworld.as_str().to_owned(), radius);
    rtp_config.default_world = overworld.as_str().to_owned();
    let registry = Arc::new(PendingActionRegistry::for_host(
        Arc::new(shared.clone()),
        config.teleport.clone(),
    ));
    let host = Arc::new(shared.clone());
    let service = RandomTeleport::new(
        Arc::clone(&registry),
        host.clone(),
        host.clone(),
        host.clone(),
        host,
        rtp_config,
    );

    let result = match service.start(actor, StdRng::seed_from_u64(seed)) {
        RtpTask::Ready(result) => result,
        RtpTask::Searching(search) => {
            println!("Searching another world without blocking the tick thread...");
            pollster::block_on(search)
        }
    };
    println!("Outcome: {result:?}");

    // Let the delay run out while standing still.
    let buffer = CommandBuffer::new();
    let start = shared.read().get(actor).map(|a| a.coordinate.position);
    if let Some(start) = start {
        let dt = 0.05;
        while registry.has_pending(actor) {
            registry.tick(actor, start, dt, &buffer);
            buffer.drain();
            shared.write().step();
        }
    }
    let landed = shared.read().get(actor).map(|a| a.coordinate.clone());
    println!("Landed: {landed:?}");
    println!("Messages: {:?}", shared.take_messages(actor));
}
