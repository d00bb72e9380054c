//! Tick-keyed health event scheduler
//!
//! Events are bucketed by the absolute tick they fire on. The scheduler is
//! driven by the main simulation loop and catches up over any ticks skipped
//! since its last invocation, in ascending order. Events hold only weak
//! references (entity id + hediff id); anything stale at fire time is
//! dropped silently.

use hecs::{Entity, World};
use rand_distr::{Distribution, Normal};
use std::collections::HashMap;
use tracing::debug;

use crate::components::{Dead, TICKS_PER_DAY};
use crate::hediffs::{HediffId, HediffSet};
use crate::settings::Settings;
use crate::systems::tracking;

/// How often the optional scheduler diagnostic may fire.
const DIAGNOSTIC_INTERVAL: u64 = 500;

/// A future health effect, addressed by owner lookup rather than ownership.
#[derive(Debug, Clone)]
pub struct HealthEvent {
    pub pawn: Entity,
    pub hediff: HediffId,
    pub name: String,
}

#[derive(Debug, Default)]
pub struct HealthScheduler {
    /// tick -> events due that tick. Keys present in the map always hold a
    /// non-empty list; processed keys are removed outright.
    schedule: HashMap<u64, Vec<HealthEvent>>,
    /// First tick ever observed. Monotonic reference, never reset.
    launch_tick: Option<u64>,
    last_tick: Option<u64>,
}

impl HealthScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an event at an absolute tick. No dedup; events at the same
    /// tick fire in insertion order.
    pub fn schedule_event(&mut self, tick: u64, event: HealthEvent) {
        self.schedule.entry(tick).or_default().push(event);
    }

    /// Register an event `base_interval` ticks out, with Normal jitter and
    /// the dev acceleration divisor applied. Returns the target tick.
    pub fn schedule_with_jitter(
        &mut self,
        current_tick: u64,
        base_interval: u64,
        settings: &Settings,
        event: HealthEvent,
    ) -> u64 {
        let mean = (base_interval.max(1) / settings.acceleration()).max(1) as f64;
        let delay = Normal::new(mean, mean * 0.1)
            .map(|n| n.sample(&mut rand::thread_rng()))
            .unwrap_or(mean)
            .max(1.0) as u64;
        let target = current_tick + delay.max(1);
        self.schedule_event(target, event);
        target
    }

    /// Set the reference ticks for a scheduler reconstructed from a save,
    /// so the first `tick` call after import still catches up from the
    /// saved position. No-op once the scheduler has run.
    pub fn resume_at(&mut self, tick: u64) {
        self.launch_tick.get_or_insert(tick);
        self.last_tick.get_or_insert(tick);
    }

    pub fn next_event_tick(&self) -> Option<u64> {
        self.schedule.keys().min().copied()
    }

    pub fn pending_events(&self) -> usize {
        self.schedule.values().map(Vec::len).sum()
    }

    pub fn events(&self) -> impl Iterator<Item = (u64, &[HealthEvent])> {
        self.schedule.iter().map(|(t, evs)| (*t, evs.as_slice()))
    }

    /// Advance to `current_tick`, processing every tick since the last call
    /// in ascending order. Must be invoked for each elapsed time unit, but
    /// tolerates gaps: skipped ticks are caught up here. Returns the number
    /// of events fired.
    pub fn tick(&mut self, world: &mut World, current_tick: u64, settings: &Settings) -> usize {
        let launch = *self.launch_tick.get_or_insert(current_tick);
        let last = *self.last_tick.get_or_insert(current_tick);

        if current_tick % DIAGNOSTIC_INTERVAL == 0
            && settings.cheap_logging
            && settings.dev_event_time_acceleration > 1000
        {
            if let Some(next) = self.next_event_tick() {
                let simulated_days = (current_tick - launch) as f64
                    / settings.acceleration() as f64
                    / TICKS_PER_DAY as f64;
                debug!(
                    tick = current_tick,
                    next_event = next,
                    ticks_away = next.saturating_sub(current_tick),
                    simulated_days,
                    "health scheduler status"
                );
            }
        }

        let mut fired = 0;
        for t in (last + 1)..=current_tick {
            fired += self.run_tick(world, t, settings);
        }
        self.last_tick = Some(current_tick);
        fired
    }

    fn run_tick(&mut self, world: &mut World, tick: u64, settings: &Settings) -> usize {
        let mut fired = 0;
        if let Some(events) = self.schedule.remove(&tick) {
            for ev in events {
                // The owner may have diverged since scheduling: despawned,
                // dead, or the hediff detached. Stale events drop silently.
                if world.get::<&Dead>(ev.pawn).is_ok() {
                    continue;
                }
                let Ok(mut set) = world.get::<&mut HediffSet>(ev.pawn) else {
                    continue;
                };
                let Some(hediff) = set.get_mut(ev.hediff) else {
                    continue;
                };

                let recur = hediff.apply_event(&ev.name);
                fired += 1;
                if let Some(interval) = recur {
                    drop(set);
                    self.schedule_with_jitter(
                        tick,
                        interval,
                        settings,
                        HealthEvent {
                            pawn: ev.pawn,
                            hediff: ev.hediff,
                            name: ev.name,
                        },
                    );
                }
            }
        }

        if settings.auto_track_all_pawns && tick % TICKS_PER_DAY == 0 {
            tracking::ensure_trackers(world, self, tick, settings);
        }
        fired
    }
}
