//! Death System
//!
//! Determines mortality based on age and marks dead pawns. Dead pawns are
//! kept around briefly so late references (scheduled events, widows) can
//! observe the death before cleanup despawns them.

use hecs::World;
use rand::Rng;

use crate::components::{Alive, BirthTick, Dead, DAYS_PER_YEAR};

/// Base mortality rates by age bracket (annual probability)
const MORTALITY_RATES: &[(u64, f64)] = &[
    (0, 0.04),   // Infant mortality
    (5, 0.004),  // Child
    (15, 0.002), // Teen
    (30, 0.004), // Adult
    (50, 0.015), // Middle age
    (70, 0.06),  // Elderly
    (90, 0.25),  // Ancient
];

/// Get daily mortality rate for a given age
fn daily_mortality_rate(years: u64) -> f64 {
    let annual = MORTALITY_RATES
        .iter()
        .rev()
        .find(|(age, _)| years >= *age)
        .map(|(_, rate)| *rate)
        .unwrap_or(0.002);

    // Convert annual to daily: 1 - (1 - annual)^(1/days_per_year)
    1.0 - (1.0 - annual).powf(1.0 / DAYS_PER_YEAR as f64)
}

/// Process death for all living pawns. Returns the number of deaths.
pub fn death_system(world: &mut World, current_tick: u64) -> u32 {
    let mut rng = rand::thread_rng();
    let mut deaths = Vec::new();

    for (entity, birth) in world.query::<&BirthTick>().with::<&Alive>().iter() {
        let rate = daily_mortality_rate(birth.age_years(current_tick));
        if rng.gen::<f64>() < rate {
            deaths.push(entity);
        }
    }

    let count = deaths.len() as u32;
    for entity in deaths {
        let _ = world.remove_one::<Alive>(entity);
        let _ = world.insert_one(
            entity,
            Dead {
                tick_of_death: current_tick,
            },
        );
    }
    count
}

/// Despawn pawns that have been dead long enough. Returns despawn count.
pub fn cleanup_dead(world: &mut World, ticks_to_keep: u64, current_tick: u64) -> u32 {
    let mut to_despawn = Vec::new();

    for (entity, dead) in world.query::<&Dead>().iter() {
        if current_tick.saturating_sub(dead.tick_of_death) > ticks_to_keep {
            to_despawn.push(entity);
        }
    }

    let count = to_despawn.len() as u32;
    for entity in to_despawn {
        let _ = world.despawn(entity);
    }
    count
}
