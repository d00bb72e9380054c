//! Tracking System
//!
//! Attaches and detaches the health-tracker hediff in bulk. Attaching also
//! seeds the tracker's first scheduled checkup.

use hecs::World;
use tracing::error;

use crate::components::{Alive, TICKS_PER_DAY};
use crate::hediffs::HediffSet;
use crate::scheduler::{HealthEvent, HealthScheduler};
use crate::settings::Settings;

/// Base delay before a freshly attached tracker's first checkup.
const FIRST_CHECKUP_INTERVAL: u64 = TICKS_PER_DAY;

/// Ensure every live pawn has a health tracker attached, scheduling the
/// first checkup for each new one. Returns the number attached.
pub fn ensure_trackers(
    world: &mut World,
    scheduler: &mut HealthScheduler,
    current_tick: u64,
    settings: &Settings,
) -> u32 {
    let mut attached = 0;
    for (entity, set) in world.query::<&mut HediffSet>().with::<&Alive>().iter() {
        if set.has_tracker() {
            continue;
        }
        let id = set.attach_tracker();
        scheduler.schedule_with_jitter(
            current_tick,
            FIRST_CHECKUP_INTERVAL,
            settings,
            HealthEvent {
                pawn: entity,
                hediff: id,
                name: "checkup".to_string(),
            },
        );
        attached += 1;
    }
    attached
}

/// Detach the health tracker from every pawn that has one. A failure on one
/// pawn is logged and does not abort the rest.
pub fn remove_all_trackers(world: &mut World) -> u32 {
    let mut removed = 0;
    for (entity, set) in world.query::<&mut HediffSet>().iter() {
        if !set.has_tracker() {
            continue;
        }
        match set.remove_tracker() {
            Ok(_) => removed += 1,
            Err(e) => {
                error!(pawn = ?entity, error = %e, "failed to remove health tracker");
            }
        }
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Dead;

    #[test]
    fn test_ensure_attaches_and_schedules() {
        let mut world = World::new();
        let mut sched = HealthScheduler::new();
        let settings = Settings::default();

        let a = world.spawn((Alive, HediffSet::new()));
        let b = world.spawn((Alive, HediffSet::new()));
        let dead = world.spawn((Dead { tick_of_death: 0 }, HediffSet::new()));

        assert_eq!(ensure_trackers(&mut world, &mut sched, 0, &settings), 2);
        assert!(world.get::<&HediffSet>(a).unwrap().has_tracker());
        assert!(world.get::<&HediffSet>(b).unwrap().has_tracker());
        assert!(!world.get::<&HediffSet>(dead).unwrap().has_tracker());
        assert_eq!(sched.pending_events(), 2);

        // Idempotent: nothing new on a second pass.
        assert_eq!(ensure_trackers(&mut world, &mut sched, 1, &settings), 0);
        assert_eq!(sched.pending_events(), 2);
    }

    #[test]
    fn test_remove_all_trackers() {
        let mut world = World::new();
        let mut sched = HealthScheduler::new();
        let settings = Settings::default();

        let a = world.spawn((Alive, HediffSet::new()));
        world.spawn((Alive, HediffSet::new()));

        ensure_trackers(&mut world, &mut sched, 0, &settings);
        assert_eq!(remove_all_trackers(&mut world), 2);
        assert!(!world.get::<&HediffSet>(a).unwrap().has_tracker());
        assert_eq!(remove_all_trackers(&mut world), 0);
    }
}
