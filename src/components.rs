//! ECS components for simulated pawns

use serde::{Deserialize, Serialize};

use crate::apparel::{fuse_restrictions, ApparelRestrictions};

/// The discrete simulation time unit. One day is 60 000 ticks.
pub const TICKS_PER_DAY: u64 = 60_000;

/// Simulated years are short: 60 days each.
pub const DAYS_PER_YEAR: u64 = 60;

// ============================================================================
// Identity Components
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PawnId(pub u64);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pawn {
    pub id: PawnId,
    pub name: String,
}

// ============================================================================
// Lifecycle Components
// ============================================================================

/// Tick the pawn was born on; age is computed on demand.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BirthTick(pub u64);

impl BirthTick {
    pub fn age_days(&self, current_tick: u64) -> u64 {
        current_tick.saturating_sub(self.0) / TICKS_PER_DAY
    }

    pub fn age_years(&self, current_tick: u64) -> u64 {
        self.age_days(current_tick) / DAYS_PER_YEAR
    }

    pub fn from_age_years(years: u64, current_tick: u64) -> Self {
        BirthTick(current_tick.saturating_sub(years * DAYS_PER_YEAR * TICKS_PER_DAY))
    }
}

/// Marker: entity is alive.
#[derive(Debug, Clone, Copy, Default)]
pub struct Alive;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Dead {
    pub tick_of_death: u64,
}

// ============================================================================
// Rule Components
// ============================================================================

/// Apparel restriction sources granted to this pawn (genes, race, per-run
/// config). Folded into one effective record on demand.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RestrictionSources(pub Vec<ApparelRestrictions>);

impl RestrictionSources {
    pub fn effective(&self) -> Option<ApparelRestrictions> {
        fuse_restrictions(self.0.iter())
    }
}
