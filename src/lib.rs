//! Pawn Rules Engine
//!
//! Composable apparel-restriction rules and a tick-keyed health-event
//! scheduler over an ECS world of pawns. Restriction sources stack without
//! coordination thanks to max-priority result fusion; health events are
//! bucketed by absolute tick and dropped silently when their owner has
//! diverged since scheduling.

pub mod apparel;
pub mod components;
pub mod defs;
pub mod filters;
pub mod hediffs;
pub mod persistence;
pub mod runner;
pub mod scheduler;
pub mod settings;
pub mod systems;
pub mod world;

pub use apparel::{ApparelRestrictions, WearDenial};
pub use components::*;
pub use defs::{ApparelProperties, DefDatabase, DefName, ThingDef};
pub use filters::{FilterKind, FilterList, FilterListSet, FilterResult};
pub use hediffs::{Hediff, HediffId, HediffSet};
pub use persistence::{ExportData, ImportResult, SaveError};
pub use scheduler::{HealthEvent, HealthScheduler};
pub use settings::Settings;
pub use world::{SimulationWorld, TickReport};
