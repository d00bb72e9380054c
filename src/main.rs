//! Pawn Rules Benchmark
//!
//! Standalone benchmark/demo for the rules and scheduling engine.

use pawnrules::components::TICKS_PER_DAY;
use pawnrules::{ApparelRestrictions, Settings, SimulationWorld};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Pawn rules engine starting...");

    let settings = Settings {
        auto_track_all_pawns: true,
        ..Default::default()
    };
    let mut world = SimulationWorld::with_settings(settings);

    let initial_pop = 10_000;
    info!("Seeding {} pawns...", initial_pop);
    world.seed_pawns(initial_pop);
    world.add_trackers_now();

    // Give a slice of the population a gene-style restriction source.
    let restricted: Vec<_> = world
        .world
        .query::<&pawnrules::Pawn>()
        .iter()
        .take(initial_pop / 10)
        .map(|(entity, _)| entity)
        .collect();
    for pawn in restricted {
        world.grant_restrictions(
            pawn,
            ApparelRestrictions {
                no_armor: true,
                ..Default::default()
            },
        );
    }

    info!(
        "Seeded. Pawns: {}, pending events: {}",
        world.pawn_count(),
        world.scheduler.pending_events()
    );

    // Run a 120-day benchmark, one day per step.
    info!("Running 120 day benchmark...");
    let start = std::time::Instant::now();
    let mut events_fired = 0usize;
    let mut deaths = 0u32;
    for day in 1..=120u64 {
        let report = world.advance_to(day * TICKS_PER_DAY);
        events_fired += report.events_fired;
        deaths += report.deaths;
    }
    let elapsed = start.elapsed();

    info!(
        "Benchmark complete: {:?} total, {} events fired, {} deaths, {} pawns alive, {} events pending",
        elapsed,
        events_fired,
        deaths,
        world.live_pawn_count(),
        world.scheduler.pending_events()
    );

    Ok(())
}
