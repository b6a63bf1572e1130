//! Stock garden demonstration of the Eden simulation.
//!
//! Run with: cargo run --example garden_demo -- [ticks] [seed]
//! Set `RUST_LOG=eden_sim=debug` for per-agent logging. Point
//! `EDEN_TERRAIN` and `EDEN_POPULATION` at JSON files to run a custom scene
//! instead of the stock garden.

use eden_sim::{
    population_from_json_string, terrain_rows_from_json_string, PopulationCounts, SimConfig, SimEvent, SimWorld,
};
use std::ops::ControlFlow;
use tracing::info;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let mut args = std::env::args().skip(1);
    let ticks: u64 = args.next().map(|s| s.parse()).transpose()?.unwrap_or(100);
    let seed: u64 = args.next().map(|s| s.parse()).transpose()?.unwrap_or(0);

    let mut sim = match (std::env::var("EDEN_TERRAIN"), std::env::var("EDEN_POPULATION")) {
        (Ok(terrain_path), Ok(population_path)) => {
            let rows = terrain_rows_from_json_string(&std::fs::read_to_string(&terrain_path)?)?;
            let population = population_from_json_string(&std::fs::read_to_string(&population_path)?)?;
            info!(terrain = %terrain_path, population = %population_path, records = population.len(), "loading scene");
            let config = SimConfig {
                seed,
                ..Default::default()
            };
            SimWorld::from_rows(rows, &population, config)?
        }
        _ => SimWorld::new_default_garden(seed)?,
    };
    log_counts("start", &sim.counts());

    let mut eaten = 0;
    let mut emerged = 0;
    let mut fossilized = 0;
    let ran = sim.run_while(ticks, |snapshot| {
        for event in &snapshot.events {
            match event {
                SimEvent::FlyerEaten { .. } => eaten += 1,
                SimEvent::Emerged { .. } => emerged += 1,
                SimEvent::GrowerDied { .. } => fossilized += 1,
                _ => {}
            }
        }
        if snapshot.counts.flyers == 0 && snapshot.larvae.is_empty() {
            info!(tick = snapshot.tick, "no flyers left, stopping");
            return ControlFlow::Break(());
        }
        ControlFlow::Continue(())
    });

    let end = sim.counts();
    log_counts("end", &end);
    info!(ticks = ran, eaten, emerged, fossilized, "run complete");

    println!("{}", sim.snapshot().to_json_pretty()?);
    Ok(())
}

fn log_counts(label: &str, counts: &PopulationCounts) {
    info!(
        label,
        burrowers = counts.burrowers,
        flyers = counts.flyers,
        larvae = counts.larvae,
        predators = counts.predators,
        growers = counts.growers,
        flowers = counts.flowers,
        fossils = counts.fossils,
        larvae_spawned = counts.larvae_spawned,
        "population"
    );
}
