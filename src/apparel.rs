//! Apparel restrictions
//!
//! A restriction record combines boolean toggles with up to four filter
//! dimensions (exact item, tag, apparel layer, body-part group). Records
//! from independent sources stack via `fuse_with` without coordination.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::defs::{ApparelProperties, DefDatabase, DefName, ThingDef};
use crate::filters::{FilterListSet, FilterResult};

/// Why an item cannot be worn. The first rule that fires fixes the reason;
/// later lower-priority failures never overwrite it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WearDenial {
    #[error("cannot wear items on this layer")]
    Layer,
    #[error("cannot wear items covering this body part")]
    BodyPart,
    #[error("cannot wear items with this tag")]
    Tag,
    #[error("cannot wear apparel")]
    AnyApparel,
    #[error("this item can never be worn")]
    ExactItem,
    #[error("cannot wear armor")]
    Armor,
    #[error("cannot wear clothing")]
    Clothing,
    #[error("cannot wear this")]
    Other,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApparelRestrictions {
    pub absolutely_nothing: bool,
    pub no_clothes: bool,
    pub no_armor: bool,
    /// Items that do not count as clothing for nudity (belts, packs) stay
    /// wearable even under a total apparel ban.
    pub except_nudist_friendly: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub thing_defs: Option<FilterListSet<DefName>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<FilterListSet<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apparel_layers: Option<FilterListSet<DefName>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_part_groups: Option<FilterListSet<DefName>>,
}

impl ApparelRestrictions {
    pub fn no_apparel(&self) -> bool {
        (self.no_clothes && self.no_armor) || self.absolutely_nothing
    }

    /// Evaluate apparel properties against the structural filters.
    ///
    /// Returns the fused filter result alongside the denial, if any. The
    /// nudist-friendly exception short-circuits to an explicit allow before
    /// the tag filter and the total-apparel ban are consulted.
    pub fn check_apparel(&self, apparel: &ApparelProperties) -> (FilterResult, Option<WearDenial>) {
        let mut result = FilterResult::Neutral;
        let mut denial: Option<WearDenial> = None;

        if let Some(layers) = &self.apparel_layers {
            result = layers.filter_result_from_items(&apparel.layers).fuse(result);
            if denial.is_none() && !result.accepted() {
                denial = Some(WearDenial::Layer);
            }
        }
        if let Some(groups) = &self.body_part_groups {
            result = groups
                .filter_result_from_items(&apparel.body_part_groups)
                .fuse(result);
            if denial.is_none() && !result.accepted() {
                denial = Some(WearDenial::BodyPart);
            }
        }

        if self.except_nudist_friendly && !apparel.counts_as_clothing_for_nudity {
            return (FilterResult::ForceAllow, None);
        }

        if let Some(tags) = &self.tags {
            result = tags.filter_result_from_items(&apparel.tags).fuse(result);
            if denial.is_none() && !result.accepted() {
                denial = Some(WearDenial::Tag);
            }
        }

        if self.no_apparel() {
            return (result, Some(WearDenial::AnyApparel));
        }

        if result.accepted() {
            (result, None)
        } else {
            (result, denial)
        }
    }

    /// Whether apparel with these properties is wearable. `None` means yes.
    pub fn can_wear_props(&self, apparel: &ApparelProperties) -> Option<WearDenial> {
        self.check_apparel(apparel).1
    }

    /// Whether the given thing is wearable. `None` means yes.
    ///
    /// The exact-item filter is consulted first: a ban there is final, a
    /// force-allow skips every further check. Non-apparel things are always
    /// "wearable" (the question is meaningless for them, and the exact-item
    /// banlist has already had its chance).
    pub fn can_wear(&self, thing: &ThingDef) -> Option<WearDenial> {
        let mut result = FilterResult::Neutral;
        if let Some(thing_defs) = &self.thing_defs {
            result = thing_defs.filter_result(&thing.def_name).fuse(result);
            if result.priority_result() {
                return if result.banned() {
                    Some(WearDenial::ExactItem)
                } else {
                    None
                };
            }
        }

        let Some(apparel) = &thing.apparel else {
            return None;
        };

        let (ap_result, denial) = self.check_apparel(apparel);
        if let Some(denial) = denial {
            return Some(denial);
        }
        if ap_result.force_allowed() {
            return None;
        }
        result = result.fuse(ap_result);

        if self.no_armor && is_armor(thing) {
            return Some(WearDenial::Armor);
        }
        if self.no_clothes && is_clothing(thing) {
            return Some(WearDenial::Clothing);
        }

        if result.accepted() {
            None
        } else {
            Some(WearDenial::Other)
        }
    }

    /// Combine two restriction records: booleans OR together, each filter
    /// dimension merges pairwise. An absent record contributes nothing;
    /// callers hold `Option<ApparelRestrictions>` for that.
    pub fn fuse_with(&self, other: &ApparelRestrictions) -> ApparelRestrictions {
        fn merge_dim<T: Clone + PartialEq>(
            a: &Option<FilterListSet<T>>,
            b: &Option<FilterListSet<T>>,
        ) -> Option<FilterListSet<T>> {
            match (a, b) {
                (None, None) => None,
                (Some(x), None) | (None, Some(x)) => Some(x.clone()),
                (Some(x), Some(y)) => Some(x.merge(y)),
            }
        }

        ApparelRestrictions {
            absolutely_nothing: self.absolutely_nothing || other.absolutely_nothing,
            no_clothes: self.no_clothes || other.no_clothes,
            no_armor: self.no_armor || other.no_armor,
            except_nudist_friendly: self.except_nudist_friendly || other.except_nudist_friendly,
            thing_defs: merge_dim(&self.thing_defs, &other.thing_defs),
            tags: merge_dim(&self.tags, &other.tags),
            apparel_layers: merge_dim(&self.apparel_layers, &other.apparel_layers),
            body_part_groups: merge_dim(&self.body_part_groups, &other.body_part_groups),
        }
    }

    /// Validate every def-name entry against the database, dropping
    /// unresolved references. Tag lists carry plain strings and need no
    /// resolution.
    pub fn resolve_refs(&mut self, db: &DefDatabase) {
        if let Some(set) = &mut self.thing_defs {
            db.resolve_refs(set);
        }
        if let Some(set) = &mut self.tags {
            set.normalize_kinds();
        }
        // Layer and body-part-group defs live outside the thing database;
        // only their kind tags get normalized.
        for set in [&mut self.apparel_layers, &mut self.body_part_groups]
            .into_iter()
            .flatten()
        {
            set.normalize_kinds();
        }
    }
}

/// Fold any number of restriction sources into one effective record.
pub fn fuse_restrictions<'a>(
    sources: impl IntoIterator<Item = &'a ApparelRestrictions>,
) -> Option<ApparelRestrictions> {
    merge_all_restrictions(sources.into_iter().cloned())
}

fn merge_all_restrictions(
    sources: impl IntoIterator<Item = ApparelRestrictions>,
) -> Option<ApparelRestrictions> {
    sources.into_iter().reduce(|acc, next| acc.fuse_with(&next))
}

// ============================================================================
// Armor classification heuristic
// ============================================================================

const ARMOR_KEYWORDS: &[&str] = &["armor", "armour"];

fn contains_armor_keyword(s: &str) -> bool {
    let lower = s.to_lowercase();
    ARMOR_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// Keyword classification of a thing as armor. Inherently approximate and
/// kept that way on purpose: this is policy inherited from the rules it
/// implements, not something to "correct". Both spellings apply to apparel
/// tags and the def name; categories and trade tags only know "armor".
pub fn is_armor(thing: &ThingDef) -> bool {
    let name = thing.def_name.as_str().to_lowercase();
    let apparel_tags_hit = thing
        .apparel
        .as_ref()
        .is_some_and(|a| a.tags.iter().any(|t| contains_armor_keyword(t)));

    apparel_tags_hit
        || thing
            .thing_categories
            .iter()
            .any(|c| c.as_str().to_lowercase().contains("armor"))
        || thing.trade_tags.iter().any(|t| t.to_lowercase().contains("armor"))
        || contains_armor_keyword(&name)
        || name.contains("helmet")
        // Suspicious stuffing: smithy-crafted or metallic materials.
        || thing
            .recipe_users
            .iter()
            .any(|r| r.as_str().to_lowercase().contains("smithy"))
        || thing
            .stuff_categories
            .iter()
            .any(|s| s.as_str().to_lowercase().contains("metallic"))
}

pub fn is_clothing(thing: &ThingDef) -> bool {
    !is_armor(thing)
}
