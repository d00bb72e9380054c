//! Persistence module for export/import of simulation state
//!
//! Serializes pawns, their hediffs and restriction sources, and the pending
//! event schedule. JSON for inspectable saves, bincode for compact ones.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::warn;

use crate::apparel::ApparelRestrictions;
use crate::components::{Alive, BirthTick, Dead, Pawn, PawnId};
use crate::defs::DefName;
use crate::hediffs::{Hediff, HediffId, HediffSet};
use crate::scheduler::{HealthEvent, HealthScheduler};
use crate::systems;
use crate::world::SimulationWorld;

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("binary error: {0}")]
    Binary(#[from] bincode::Error),
    #[error("unsupported export version: {0}")]
    UnsupportedVersion(u8),
}

// ============================================================================
// Export Data Structures
// ============================================================================

/// Complete engine state for persistence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportData {
    pub version: u8, // Schema version for forward compatibility
    pub saved_at: DateTime<Utc>,
    pub tick: u64,
    pub next_pawn_id: u64,
    pub settings: crate::settings::Settings,
    pub pawns: Vec<ExportedPawn>,
    pub events: Vec<ExportedEvent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedPawn {
    pub pawn_id: u64,
    pub name: String,
    pub birth_tick: u64,
    /// Tick of death (None = alive)
    pub dead_at: Option<u64>,
    #[serde(default)]
    pub hediffs: Vec<ExportedHediff>,
    #[serde(default)]
    pub restriction_sources: Vec<ApparelRestrictions>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedHediff {
    pub id: u64,
    pub def: DefName,
    pub severity: f32,
}

impl From<&Hediff> for ExportedHediff {
    fn from(h: &Hediff) -> Self {
        ExportedHediff {
            id: h.id.0,
            def: h.def.clone(),
            severity: h.severity,
        }
    }
}

/// One pending scheduler entry, keyed by the owning pawn's stable id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedEvent {
    pub tick: u64,
    pub pawn_id: u64,
    pub hediff_id: u64,
    pub name: String,
}

/// Result of import operation
#[derive(Debug, Clone)]
pub struct ImportResult {
    pub population: u32,
    pub events: u32,
    pub tick: u64,
}

// ============================================================================
// Export / Import Implementation
// ============================================================================

impl SimulationWorld {
    fn to_export(&self) -> ExportData {
        let mut pawns = Vec::new();
        let mut entity_to_pawn_id: HashMap<hecs::Entity, u64> = HashMap::new();

        for (entity, (pawn, birth)) in self.world.query::<(&Pawn, &BirthTick)>().iter() {
            entity_to_pawn_id.insert(entity, pawn.id.0);

            let dead_at = self
                .world
                .get::<&Dead>(entity)
                .ok()
                .map(|d| d.tick_of_death);
            let hediffs = self
                .world
                .get::<&HediffSet>(entity)
                .map(|set| set.hediffs.iter().map(ExportedHediff::from).collect())
                .unwrap_or_default();
            let restriction_sources = self
                .world
                .get::<&crate::components::RestrictionSources>(entity)
                .map(|s| s.0.clone())
                .unwrap_or_default();

            pawns.push(ExportedPawn {
                pawn_id: pawn.id.0,
                name: pawn.name.clone(),
                birth_tick: birth.0,
                dead_at,
                hediffs,
                restriction_sources,
            });
        }

        let mut events = Vec::new();
        for (tick, pending) in self.scheduler.events() {
            for ev in pending {
                // Events whose owner is already gone are stale; they would
                // be dropped at fire time anyway.
                let Some(&pawn_id) = entity_to_pawn_id.get(&ev.pawn) else {
                    continue;
                };
                events.push(ExportedEvent {
                    tick,
                    pawn_id,
                    hediff_id: ev.hediff.0,
                    name: ev.name.clone(),
                });
            }
        }
        events.sort_by_key(|e| (e.tick, e.pawn_id));

        ExportData {
            version: 1,
            saved_at: Utc::now(),
            tick: self.tick,
            next_pawn_id: self.next_pawn_id,
            settings: self.settings.clone(),
            pawns,
            events,
        }
    }

    /// Export entire engine state to a JSON string.
    pub fn export_world(&self) -> Result<String, SaveError> {
        Ok(serde_json::to_string(&self.to_export())?)
    }

    /// Export entire engine state to compact binary.
    pub fn export_binary(&self) -> Result<Vec<u8>, SaveError> {
        Ok(bincode::serialize(&self.to_export())?)
    }

    /// Import state from a JSON string, replacing current state.
    pub fn import_world(&mut self, json: &str) -> Result<ImportResult, SaveError> {
        let data: ExportData = serde_json::from_str(json)?;
        self.apply_import(data)
    }

    /// Import state from binary, replacing current state.
    pub fn import_binary(&mut self, bytes: &[u8]) -> Result<ImportResult, SaveError> {
        let data: ExportData = bincode::deserialize(bytes)?;
        self.apply_import(data)
    }

    fn apply_import(&mut self, data: ExportData) -> Result<ImportResult, SaveError> {
        if data.version != 1 {
            return Err(SaveError::UnsupportedVersion(data.version));
        }

        self.world.clear();
        self.tick = data.tick;
        self.next_pawn_id = data.next_pawn_id;
        self.settings = data.settings;
        self.scheduler = HealthScheduler::new();
        self.scheduler.resume_at(data.tick);

        // First pass: spawn pawns, build PawnId -> Entity map
        let mut pawn_id_to_entity: HashMap<u64, hecs::Entity> = HashMap::new();

        for pawn in &data.pawns {
            let mut set = HediffSet::new();
            for h in &pawn.hediffs {
                set.restore(Hediff {
                    id: HediffId(h.id),
                    def: h.def.clone(),
                    severity: h.severity,
                });
            }

            let entity = self.world.spawn((
                Pawn {
                    id: PawnId(pawn.pawn_id),
                    name: pawn.name.clone(),
                },
                BirthTick(pawn.birth_tick),
                set,
            ));
            match pawn.dead_at {
                Some(tick_of_death) => {
                    let _ = self.world.insert_one(entity, Dead { tick_of_death });
                }
                None => {
                    let _ = self.world.insert_one(entity, Alive);
                }
            }
            if !pawn.restriction_sources.is_empty() {
                let _ = self.world.insert_one(
                    entity,
                    crate::components::RestrictionSources(pawn.restriction_sources.clone()),
                );
            }

            pawn_id_to_entity.insert(pawn.pawn_id, entity);
        }

        // Second pass: re-register pending events against the new entities
        let mut events_restored = 0u32;
        for ev in &data.events {
            let Some(&entity) = pawn_id_to_entity.get(&ev.pawn_id) else {
                warn!(pawn_id = ev.pawn_id, "pending event references unknown pawn, dropping");
                continue;
            };
            self.scheduler.schedule_event(
                ev.tick,
                HealthEvent {
                    pawn: entity,
                    hediff: HediffId(ev.hediff_id),
                    name: ev.name.clone(),
                },
            );
            events_restored += 1;
        }

        // Loaded games pick up trackers for pawns that gained none before
        // the save, mirroring the attach-on-load behavior.
        if self.settings.auto_track_all_pawns {
            systems::ensure_trackers(
                &mut self.world,
                &mut self.scheduler,
                self.tick,
                &self.settings,
            );
        }

        Ok(ImportResult {
            population: data.pawns.len() as u32,
            events: events_restored,
            tick: data.tick,
        })
    }
}
