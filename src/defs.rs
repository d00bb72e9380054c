//! Definition records
//!
//! Declarative, data-driven records for items and apparel metadata, loaded
//! from JSON and indexed by name. The database also validates def-name
//! cross-references inside loaded restriction sets: unresolved names are
//! reported and dropped without aborting the rest of the load.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::warn;

use crate::filters::FilterListSet;

/// Name of a definition record. Defs are identified by name; matching is
/// exact identity, never substring.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DefName(pub String);

impl DefName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DefName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DefName {
    fn from(s: &str) -> Self {
        DefName(s.to_string())
    }
}

/// Apparel-specific metadata on a thing def.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApparelProperties {
    /// OnSkin, Middle, Shell, Overhead, etc.
    pub layers: Vec<DefName>,
    /// Torso, Legs, FullHead, etc.
    pub body_part_groups: Vec<DefName>,
    pub tags: Vec<String>,
    /// False for things like belts and packs that leave a pawn "naked".
    pub counts_as_clothing_for_nudity: bool,
}

/// A thing definition: one item kind and the metadata the wearability
/// heuristics consult.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThingDef {
    pub def_name: DefName,
    #[serde(default)]
    pub label: String,
    /// Present iff the thing is apparel.
    #[serde(default)]
    pub apparel: Option<ApparelProperties>,
    #[serde(default)]
    pub thing_categories: Vec<DefName>,
    #[serde(default)]
    pub trade_tags: Vec<String>,
    /// Workbenches whose recipes produce this thing.
    #[serde(default)]
    pub recipe_users: Vec<DefName>,
    /// Material categories this thing can be made from.
    #[serde(default)]
    pub stuff_categories: Vec<DefName>,
}

impl ThingDef {
    pub fn is_apparel(&self) -> bool {
        self.apparel.is_some()
    }
}

/// Indexed def storage, analogous to a content database keyed by def name.
#[derive(Debug, Default)]
pub struct DefDatabase {
    by_name: HashMap<DefName, ThingDef>,
}

impl DefDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a def, replacing any existing def of the same name.
    pub fn add(&mut self, def: ThingDef) {
        let name = def.def_name.clone();
        if self.by_name.insert(name.clone(), def).is_some() {
            warn!(def = %name, "duplicate def registered, previous definition replaced");
        }
    }

    pub fn get(&self, name: &DefName) -> Option<&ThingDef> {
        self.by_name.get(name)
    }

    pub fn contains(&self, name: &DefName) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    pub fn all(&self) -> impl Iterator<Item = &ThingDef> {
        self.by_name.values()
    }

    pub fn apparel_defs(&self) -> Vec<&ThingDef> {
        self.by_name.values().filter(|d| d.is_apparel()).collect()
    }

    /// Load defs from a JSON array.
    pub fn load_from_json(&mut self, json: &str) -> Result<usize, serde_json::Error> {
        let defs: Vec<ThingDef> = serde_json::from_str(json)?;
        let count = defs.len();
        for def in defs {
            self.add(def);
        }
        Ok(count)
    }

    /// Validate def-name entries in a restriction set against known defs.
    /// Unresolved entries are logged and removed; the rest of the set keeps
    /// loading.
    pub fn resolve_refs(&self, set: &mut FilterListSet<DefName>) {
        set.normalize_kinds();
        for list in [
            &mut set.allowlist,
            &mut set.whitelist,
            &mut set.acceptlist,
            &mut set.blacklist,
            &mut set.banlist,
        ]
        .into_iter()
        .flatten()
        {
            list.entries.retain(|name| {
                let known = self.contains(name);
                if !known {
                    warn!(def = %name, "unresolved def reference in filter list, dropping entry");
                }
                known
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::{FilterKind, FilterList};

    fn apparel_def(name: &str) -> ThingDef {
        ThingDef {
            def_name: name.into(),
            label: name.to_lowercase(),
            apparel: Some(ApparelProperties {
                layers: vec!["OnSkin".into()],
                body_part_groups: vec!["Torso".into()],
                tags: vec![],
                counts_as_clothing_for_nudity: true,
            }),
            thing_categories: vec![],
            trade_tags: vec![],
            recipe_users: vec![],
            stuff_categories: vec![],
        }
    }

    #[test]
    fn test_database_lookup() {
        let mut db = DefDatabase::new();
        db.add(apparel_def("Apparel_Shirt"));

        assert!(db.contains(&"Apparel_Shirt".into()));
        assert!(!db.contains(&"Apparel_Hat".into()));
        assert_eq!(db.apparel_defs().len(), 1);
    }

    #[test]
    fn test_load_from_json() {
        let mut db = DefDatabase::new();
        let json = r#"[
            {
                "def_name": "Apparel_Tunic",
                "apparel": {
                    "layers": ["OnSkin"],
                    "body_part_groups": ["Torso"],
                    "counts_as_clothing_for_nudity": true
                }
            },
            { "def_name": "Steel" }
        ]"#;
        let count = db.load_from_json(json).unwrap();
        assert_eq!(count, 2);
        assert!(db.get(&"Apparel_Tunic".into()).unwrap().is_apparel());
        assert!(!db.get(&"Steel".into()).unwrap().is_apparel());
    }

    #[test]
    fn test_resolve_refs_drops_unknown() {
        let mut db = DefDatabase::new();
        db.add(apparel_def("Apparel_Shirt"));

        let mut set = FilterListSet {
            banlist: Some(FilterList::new(
                FilterKind::Banlist,
                vec![DefName::from("Apparel_Shirt"), DefName::from("NoSuchDef")],
            )),
            ..Default::default()
        };
        db.resolve_refs(&mut set);

        let banlist = set.banlist.unwrap();
        assert_eq!(banlist.entries, vec![DefName::from("Apparel_Shirt")]);
    }
}
