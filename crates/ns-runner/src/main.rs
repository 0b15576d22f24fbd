//! Standalone host loop for smoke-testing the pipeline.
//!
//! This binary:
//! 1. Builds an in-memory world with a small redstone line
//! 2. Selects and compiles it with the backend named by `NS_BACKEND`
//! 3. Runs the host loop at `host_tps` for `RUN_TICKS` ticks
//!
//! Environment:
//! - `NORESTONE_CONFIG` - path to a JSON config file (defaults otherwise)
//! - `NS_BACKEND` - backend id, `null` by default
//! - `NS_FLAGS` - comma separated compile flags
//! - `RUN_TICKS` - host ticks to run, 200 by default

use std::time::{Duration, Instant};

use ns_sim::backend::{BackendRegistry, NullBackend};
use ns_sim::memory::MemoryWorld;
use ns_sim::perms::AllowAll;
use ns_sim::volume::{BlockPos, nbt};
use ns_sim::{Actor, Corner, LiveWorld, Norestone, NorestoneConfig, OwnerId, WorldId};
use tracing::info;

fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ns_runner=info".parse()?)
                .add_directive("ns_sim=info".parse()?)
                .add_directive("ns_backend=info".parse()?),
        )
        .init();

    let config = match std::env::var("NORESTONE_CONFIG") {
        Ok(path) => {
            info!("Loading config from {}", path);
            NorestoneConfig::load(path)?
        }
        Err(_) => NorestoneConfig::default(),
    };

    let run_ticks: u64 = std::env::var("RUN_TICKS")
        .ok()
        .and_then(|t| t.parse().ok())
        .unwrap_or(200);
    let backend = std::env::var("NS_BACKEND").unwrap_or_else(|_| NullBackend::ID.to_string());
    let flags: Vec<String> = std::env::var("NS_FLAGS")
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();

    let world = demo_world();
    let owner = Actor::new(OwnerId::random(), world.id());
    let host_tps = config.host_tps;
    let mut ns = Norestone::new(config, BackendRegistry::with_builtin(), AllowAll);

    ns.set_sim_sel_corner(owner, BlockPos::new(0, 64, 0), Corner::First)?;
    ns.set_sim_sel_corner(owner, BlockPos::new(15, 65, 3), Corner::Second)?;
    let took = ns.compile_sim(owner.id, &world, &backend, flags)?;
    info!("Compiled with backend '{}' in {:?}", backend, took);

    let target_delta = Duration::from_secs_f64(1.0 / host_tps);
    let mut advanced: u64 = 0;

    for tick in 1..=run_ticks {
        let start = Instant::now();

        advanced += ns.tick();

        if tick.is_multiple_of((host_tps.round() as u64).max(1)) {
            match ns.sims().owner_sim(owner.id) {
                Some(sim) => info!(
                    "host tick {}: {} backend ticks at {} TPS",
                    tick,
                    sim.ticks_advanced(),
                    sim.tps()
                ),
                None => {
                    info!("Simulation ended after {} host ticks", tick);
                    break;
                }
            }
        }

        // Sleep to hold the host rate
        let elapsed = start.elapsed();
        if elapsed < target_delta {
            std::thread::sleep(target_delta - elapsed);
        }
    }

    info!("Done: {} backend ticks in total", advanced);
    Ok(())
}

/// A lever feeding a 14 block dust line into a lamp, with a sign next to the lever.
fn demo_world() -> MemoryWorld {
    let mut world = MemoryWorld::new(WorldId::random());
    for x in 0..16 {
        world.set_block(BlockPos::new(x, 63, 1), "minecraft:stone");
    }
    world.set_block(BlockPos::new(0, 64, 1), "minecraft:lever[face=floor,facing=east,powered=false]");
    for x in 1..15 {
        world.set_block(
            BlockPos::new(x, 64, 1),
            "minecraft:redstone_wire[east=side,north=none,power=0,south=none,west=side]",
        );
    }
    world.set_block(BlockPos::new(15, 64, 1), "minecraft:redstone_lamp[lit=false]");

    let sign = BlockPos::new(0, 64, 2);
    world.set_block(sign, "minecraft:oak_sign[rotation=0]");
    world.set_tile(sign, nbt! { "id" => "minecraft:sign", "Text1" => "demo" });
    world
}
