//! Simulation World - main orchestrator

use hecs::{Entity, World};
use rand::Rng;
use tracing::warn;

use crate::apparel::{ApparelRestrictions, WearDenial};
use crate::components::{
    Alive, BirthTick, Dead, Pawn, PawnId, RestrictionSources, TICKS_PER_DAY,
};
use crate::defs::{DefDatabase, DefName};
use crate::hediffs::HediffSet;
use crate::scheduler::HealthScheduler;
use crate::settings::Settings;
use crate::systems;

/// How long dead pawns linger before cleanup despawns them.
const DEAD_RETENTION_TICKS: u64 = 15 * TICKS_PER_DAY;

/// Outcome of one tick, for callers that report progress.
#[derive(Debug, Clone, Copy)]
pub struct TickReport {
    pub tick: u64,
    pub deaths: u32,
    pub events_fired: usize,
}

pub struct SimulationWorld {
    pub world: World,
    pub tick: u64,
    pub scheduler: HealthScheduler,
    pub settings: Settings,
    pub defs: DefDatabase,
    pub next_pawn_id: u64,
}

impl SimulationWorld {
    pub fn new() -> Self {
        Self::with_settings(Settings::default())
    }

    pub fn with_settings(settings: Settings) -> Self {
        Self {
            world: World::new(),
            tick: 0,
            scheduler: HealthScheduler::new(),
            settings,
            defs: DefDatabase::new(),
            next_pawn_id: 1,
        }
    }

    /// Seed an initial population of pawns with random ages.
    pub fn seed_pawns(&mut self, count: usize) {
        let mut rng = rand::thread_rng();
        for _ in 0..count {
            let id = PawnId(self.next_pawn_id);
            self.next_pawn_id += 1;

            let age_years: u64 = rng.gen_range(0..60);
            self.world.spawn((
                Pawn {
                    id,
                    name: format!("Pawn_{}", id.0),
                },
                BirthTick::from_age_years(age_years, self.tick),
                Alive,
                HediffSet::new(),
            ));
        }
    }

    /// Run one simulation tick.
    pub fn tick(&mut self) -> TickReport {
        self.advance_to(self.tick + 1)
    }

    /// Jump the clock forward, catching up every skipped tick's scheduled
    /// events in order. A target at or before the current tick is a no-op.
    pub fn advance_to(&mut self, target: u64) -> TickReport {
        if target <= self.tick {
            return TickReport {
                tick: self.tick,
                deaths: 0,
                events_fired: 0,
            };
        }
        let prev = self.tick;
        self.tick = target;

        // Daily systems run once per crossed day boundary batch; the
        // scheduler handles its own per-tick catch-up.
        let mut deaths = 0;
        if prev / TICKS_PER_DAY != target / TICKS_PER_DAY {
            deaths = systems::death_system(&mut self.world, target);
            systems::cleanup_dead(&mut self.world, DEAD_RETENTION_TICKS, target);
        }

        let events_fired = self.scheduler.tick(&mut self.world, target, &self.settings);

        TickReport {
            tick: target,
            deaths,
            events_fired,
        }
    }

    // ------------------------------------------------------------------
    // Pawn queries
    // ------------------------------------------------------------------

    pub fn pawn_count(&self) -> usize {
        self.world.query::<&Pawn>().iter().count()
    }

    pub fn live_pawn_count(&self) -> usize {
        self.world.query::<&Pawn>().with::<&Alive>().iter().count()
    }

    pub fn dead_pawn_count(&self) -> usize {
        self.world.query::<&Pawn>().with::<&Dead>().iter().count()
    }

    // ------------------------------------------------------------------
    // Restrictions
    // ------------------------------------------------------------------

    /// Grant a pawn another restriction source (a gene, a race rule). Def
    /// references are resolved against the database first.
    pub fn grant_restrictions(&mut self, pawn: Entity, mut restrictions: ApparelRestrictions) {
        restrictions.resolve_refs(&self.defs);
        if let Ok(mut sources) = self.world.get::<&mut RestrictionSources>(pawn) {
            sources.0.push(restrictions);
            return;
        }
        if self
            .world
            .insert_one(pawn, RestrictionSources(vec![restrictions]))
            .is_err()
        {
            warn!(pawn = ?pawn, "cannot grant restrictions to a despawned pawn");
        }
    }

    /// The pawn's restriction sources folded into one effective record.
    pub fn effective_restrictions(&self, pawn: Entity) -> Option<ApparelRestrictions> {
        self.world
            .get::<&RestrictionSources>(pawn)
            .ok()
            .and_then(|sources| sources.effective())
    }

    /// Whether the pawn can wear the named thing. `None` means yes; unknown
    /// defs are wearable by default (there is nothing to check against).
    pub fn can_pawn_wear(&self, pawn: Entity, def_name: &DefName) -> Option<WearDenial> {
        let Some(def) = self.defs.get(def_name) else {
            warn!(def = %def_name, "wearability check against unknown def");
            return None;
        };
        self.effective_restrictions(pawn)
            .and_then(|r| r.can_wear(def))
    }

    // ------------------------------------------------------------------
    // Tracking
    // ------------------------------------------------------------------

    pub fn add_trackers_now(&mut self) -> u32 {
        systems::ensure_trackers(
            &mut self.world,
            &mut self.scheduler,
            self.tick,
            &self.settings,
        )
    }

    pub fn remove_all_trackers_now(&mut self) -> u32 {
        systems::remove_all_trackers(&mut self.world)
    }
}

impl Default for SimulationWorld {
    fn default() -> Self {
        Self::new()
    }
}
