//! Health conditions attached to pawns
//!
//! A pawn carries a `HediffSet` of conditions. The health tracker is itself
//! a hediff; scheduled events address it by (pawn, hediff id) and dispatch
//! an effect by name.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, warn};

use crate::components::TICKS_PER_DAY;
use crate::defs::DefName;

/// Identifies a hediff within one pawn's `HediffSet`. Ids are never reused,
/// so a stale event's lookup simply misses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HediffId(pub u64);

/// Def name of the health tracker condition.
pub const TRACKER_DEF: &str = "HealthTracker";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HediffError {
    #[error("no hediff with id {0} attached")]
    NotAttached(u64),
    #[error("no health tracker attached")]
    NoTracker,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hediff {
    pub id: HediffId,
    pub def: DefName,
    /// Condition severity in [0, 1].
    pub severity: f32,
}

impl Hediff {
    pub fn is_tracker(&self) -> bool {
        self.def.as_str() == TRACKER_DEF
    }

    /// Apply a named health event to this hediff. Returns the base
    /// recurrence interval when the event repeats. Unknown names are a
    /// no-op; the schedule may outlive a configuration change.
    pub fn apply_event(&mut self, name: &str) -> Option<u64> {
        match EVENT_EFFECTS.get(name) {
            Some(effect) => {
                self.severity = (self.severity + effect.severity_delta).clamp(0.0, 1.0);
                debug!(
                    hediff = %self.def,
                    event = name,
                    severity = self.severity,
                    "health event applied"
                );
                effect.recur_interval
            }
            None => {
                warn!(event = name, "unknown health event name, skipping");
                None
            }
        }
    }
}

struct EventEffect {
    severity_delta: f32,
    /// Base ticks until the event fires again, before jitter and dev
    /// acceleration.
    recur_interval: Option<u64>,
}

static EVENT_EFFECTS: Lazy<HashMap<&'static str, EventEffect>> = Lazy::new(|| {
    HashMap::from([
        (
            "checkup",
            EventEffect {
                severity_delta: 0.0,
                recur_interval: Some(30 * TICKS_PER_DAY),
            },
        ),
        (
            "flareup",
            EventEffect {
                severity_delta: 0.12,
                recur_interval: Some(5 * TICKS_PER_DAY),
            },
        ),
        (
            "remission",
            EventEffect {
                severity_delta: -0.25,
                recur_interval: Some(15 * TICKS_PER_DAY),
            },
        ),
        // One-off acute episode; follow-ups come from flareups, not from
        // re-scheduling the shock itself.
        (
            "shock",
            EventEffect {
                severity_delta: 0.2,
                recur_interval: None,
            },
        ),
    ])
});

/// All health conditions attached to one pawn.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HediffSet {
    pub hediffs: Vec<Hediff>,
    next_id: u64,
}

impl HediffSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a new hediff, allocating its id.
    pub fn add(&mut self, def: DefName, severity: f32) -> HediffId {
        let id = HediffId(self.next_id);
        self.next_id += 1;
        self.hediffs.push(Hediff { id, def, severity });
        id
    }

    /// Re-attach a hediff with a known id (used by import). Bumps the id
    /// counter past it so future ids stay unique.
    pub fn restore(&mut self, hediff: Hediff) {
        self.next_id = self.next_id.max(hediff.id.0 + 1);
        self.hediffs.push(hediff);
    }

    pub fn get(&self, id: HediffId) -> Option<&Hediff> {
        self.hediffs.iter().find(|h| h.id == id)
    }

    pub fn get_mut(&mut self, id: HediffId) -> Option<&mut Hediff> {
        self.hediffs.iter_mut().find(|h| h.id == id)
    }

    pub fn contains(&self, id: HediffId) -> bool {
        self.get(id).is_some()
    }

    pub fn remove(&mut self, id: HediffId) -> Result<Hediff, HediffError> {
        let pos = self
            .hediffs
            .iter()
            .position(|h| h.id == id)
            .ok_or(HediffError::NotAttached(id.0))?;
        Ok(self.hediffs.remove(pos))
    }

    pub fn tracker(&self) -> Option<&Hediff> {
        self.hediffs.iter().find(|h| h.is_tracker())
    }

    pub fn has_tracker(&self) -> bool {
        self.tracker().is_some()
    }

    pub fn attach_tracker(&mut self) -> HediffId {
        self.add(DefName::from(TRACKER_DEF), 0.0)
    }

    pub fn remove_tracker(&mut self) -> Result<Hediff, HediffError> {
        let id = self.tracker().map(|h| h.id).ok_or(HediffError::NoTracker)?;
        self.remove(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_never_reused() {
        let mut set = HediffSet::new();
        let a = set.attach_tracker();
        set.remove(a).unwrap();
        let b = set.attach_tracker();
        assert_ne!(a, b);
        assert!(!set.contains(a));
        assert!(set.contains(b));
    }

    #[test]
    fn test_remove_missing_is_error() {
        let mut set = HediffSet::new();
        assert_eq!(set.remove(HediffId(7)), Err(HediffError::NotAttached(7)));
        assert_eq!(set.remove_tracker(), Err(HediffError::NoTracker));
    }

    #[test]
    fn test_apply_event_severity_clamped() {
        let mut set = HediffSet::new();
        let id = set.attach_tracker();
        let tracker = set.get_mut(id).unwrap();

        for _ in 0..20 {
            tracker.apply_event("flareup");
        }
        assert!((tracker.severity - 1.0).abs() < f32::EPSILON);

        for _ in 0..20 {
            tracker.apply_event("remission");
        }
        assert!(tracker.severity.abs() < f32::EPSILON);
    }

    #[test]
    fn test_apply_event_recurrence() {
        let mut set = HediffSet::new();
        let id = set.attach_tracker();
        let tracker = set.get_mut(id).unwrap();

        assert_eq!(tracker.apply_event("checkup"), Some(30 * TICKS_PER_DAY));
        assert_eq!(tracker.apply_event("no_such_event"), None);
    }

    #[test]
    fn test_restore_bumps_id_counter() {
        let mut set = HediffSet::new();
        set.restore(Hediff {
            id: HediffId(5),
            def: DefName::from(TRACKER_DEF),
            severity: 0.3,
        });
        let next = set.add(DefName::from("Flu"), 0.1);
        assert_eq!(next, HediffId(6));
    }
}
