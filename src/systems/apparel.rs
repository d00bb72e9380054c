//! Apparel System
//!
//! Pawn-facing wearability queries over the def database, plus a debug
//! sweep that evaluates one restriction record against every apparel def.

use rayon::prelude::*;
use tracing::{info, warn};

use crate::apparel::{ApparelRestrictions, WearDenial};
use crate::defs::{DefDatabase, DefName, ThingDef};

/// All apparel defs a restriction record permits.
pub fn wearable_defs<'a>(
    db: &'a DefDatabase,
    restrictions: &ApparelRestrictions,
) -> Vec<&'a ThingDef> {
    db.apparel_defs()
        .into_iter()
        .filter(|def| restrictions.can_wear(def).is_none())
        .collect()
}

/// Evaluate every apparel def in the database against one restriction
/// record, logging each denial. Returns the denials for inspection.
pub fn debug_check_all_wearable(
    db: &DefDatabase,
    pawn_label: &str,
    restrictions: &ApparelRestrictions,
) -> Vec<(DefName, WearDenial)> {
    let denials: Vec<(DefName, WearDenial)> = db
        .apparel_defs()
        .par_iter()
        .filter_map(|def| {
            restrictions
                .can_wear(def)
                .map(|denial| (def.def_name.clone(), denial))
        })
        .collect();

    if db.is_empty() {
        warn!(pawn = pawn_label, "wearability sweep over an empty def database");
    }
    for (def, denial) in &denials {
        info!(pawn = pawn_label, def = %def, reason = %denial, "cannot wear");
    }
    denials
}
