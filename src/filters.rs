//! Composable filter lists for rule evaluation
//!
//! Multiple rule sources (genes, race defs, per-run config) each contribute
//! allow/white/black/ban/accept lists. Results from independent lists are
//! fused by a total order, so `Banned` always wins over `ForceAllow`, which
//! wins over `Deny`, without any coordination between sources.

use serde::{Deserialize, Serialize};

use crate::defs::DefName;

// ============================================================================
// Filter Results
// ============================================================================

/// Outcome of evaluating an item against one or more filter lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FilterResult {
    /// No filter produced a result yet.
    #[default]
    None,
    /// Accepted, but fails checks that require explicit permission.
    Neutral,
    /// Accepted, priority over Neutral.
    Allow,
    /// Denied, but can be overridden by ForceAllow.
    Deny,
    /// Accepted, priority over everything except Banned.
    ForceAllow,
    /// Denied, regardless of everything else.
    Banned,
}

impl FilterResult {
    /// Fusion priority. Kept separate from declaration order so a variant
    /// reorder cannot silently change precedence.
    fn rank(self) -> u8 {
        match self {
            FilterResult::None => 0,
            FilterResult::Neutral => 1,
            FilterResult::Allow => 2,
            FilterResult::Deny => 3,
            FilterResult::ForceAllow => 4,
            FilterResult::Banned => 5,
        }
    }

    /// Combine two results, keeping the higher-priority one.
    pub fn fuse(self, other: FilterResult) -> FilterResult {
        if other.rank() > self.rank() {
            other
        } else {
            self
        }
    }

    pub fn banned(self) -> bool {
        self == FilterResult::Banned
    }

    pub fn denied(self) -> bool {
        matches!(self, FilterResult::Deny | FilterResult::Banned)
    }

    pub fn accepted(self) -> bool {
        !self.denied()
    }

    pub fn explicitly_allowed(self) -> bool {
        matches!(self, FilterResult::Allow | FilterResult::ForceAllow)
    }

    pub fn force_allowed(self) -> bool {
        self == FilterResult::ForceAllow
    }

    pub fn neutral_or_worse(self) -> bool {
        self.denied() || self == FilterResult::Neutral
    }

    /// Results that end evaluation early no matter what else is present.
    pub fn priority_result(self) -> bool {
        matches!(self, FilterResult::Banned | FilterResult::ForceAllow)
    }
}

/// Fuse an arbitrary sequence of results. An empty sequence yields `None`.
pub fn fuse_all(results: impl IntoIterator<Item = FilterResult>) -> FilterResult {
    results
        .into_iter()
        .fold(FilterResult::None, FilterResult::fuse)
}

// ============================================================================
// Filter Lists
// ============================================================================

/// How a match hit in a list translates to a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterKind {
    /// Match => Allow, no match => Neutral.
    Acceptlist,
    /// Match => Allow, no match => Deny.
    Whitelist,
    /// Match => Deny, no match => Neutral.
    Blacklist,
    /// Match => ForceAllow, no match => Neutral.
    Allowlist,
    /// Match => Banned, no match => Neutral.
    Banlist,
}

/// Item-vs-pattern matching for filter list entries.
///
/// Def references match by exact name identity, plain strings by exact
/// equality. Keyword-style containment lives in the armor heuristic, not
/// here.
pub trait FilterMatch {
    fn filter_matches(&self, pattern: &Self) -> bool;
}

impl FilterMatch for String {
    fn filter_matches(&self, pattern: &Self) -> bool {
        self == pattern
    }
}

impl FilterMatch for DefName {
    fn filter_matches(&self, pattern: &Self) -> bool {
        self == pattern
    }
}

/// An ordered list of patterns tagged with the kind that decides what a
/// match means.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterList<T> {
    pub kind: FilterKind,
    pub entries: Vec<T>,
}

impl<T> FilterList<T> {
    pub fn new(kind: FilterKind, entries: impl IntoIterator<Item = T>) -> Self {
        Self {
            kind,
            entries: entries.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: FilterMatch> FilterList<T> {
    pub fn any_match(&self, item: &T) -> bool {
        self.entries.iter().any(|p| item.filter_matches(p))
    }

    /// Evaluate one item against this list. Pure, O(len).
    pub fn filter_result(&self, item: &T) -> FilterResult {
        let hit = self.any_match(item);
        match self.kind {
            FilterKind::Allowlist if hit => FilterResult::ForceAllow,
            FilterKind::Whitelist => {
                if hit {
                    FilterResult::Allow
                } else {
                    FilterResult::Deny
                }
            }
            FilterKind::Acceptlist if hit => FilterResult::Allow,
            FilterKind::Blacklist if hit => FilterResult::Deny,
            FilterKind::Banlist if hit => FilterResult::Banned,
            _ => FilterResult::Neutral,
        }
    }
}

// ============================================================================
// Filter List Sets
// ============================================================================

/// At most one list of each kind, evaluated together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterListSet<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowlist: Option<FilterList<T>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whitelist: Option<FilterList<T>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acceptlist: Option<FilterList<T>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blacklist: Option<FilterList<T>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banlist: Option<FilterList<T>>,
}

// Not derived: a derive would demand `T: Default` even though every field
// defaults to `None` on its own.
impl<T> Default for FilterListSet<T> {
    fn default() -> Self {
        Self {
            allowlist: None,
            whitelist: None,
            acceptlist: None,
            blacklist: None,
            banlist: None,
        }
    }
}

impl<T> FilterListSet<T> {
    pub fn lists(&self) -> impl Iterator<Item = &FilterList<T>> {
        [
            self.allowlist.as_ref(),
            self.whitelist.as_ref(),
            self.blacklist.as_ref(),
            self.banlist.as_ref(),
            self.acceptlist.as_ref(),
        ]
        .into_iter()
        .flatten()
    }

    pub fn is_empty(&self) -> bool {
        self.lists().next().is_none()
    }

    /// Force each present list's kind to match the slot it occupies.
    /// Deserialized data may carry a stray kind tag; the slot is
    /// authoritative.
    pub fn normalize_kinds(&mut self) {
        let slots = [
            (&mut self.allowlist, FilterKind::Allowlist),
            (&mut self.whitelist, FilterKind::Whitelist),
            (&mut self.acceptlist, FilterKind::Acceptlist),
            (&mut self.blacklist, FilterKind::Blacklist),
            (&mut self.banlist, FilterKind::Banlist),
        ];
        for (slot, kind) in slots {
            if let Some(list) = slot {
                list.kind = kind;
            }
        }
    }
}

impl<T: FilterMatch> FilterListSet<T> {
    /// Evaluate one item against every present list and fuse the results.
    pub fn filter_result(&self, item: &T) -> FilterResult {
        fuse_all(self.lists().map(|l| l.filter_result(item)))
    }

    /// Cross-product evaluation: every list against every item, all fused.
    /// Used when the item itself carries a list of attributes (an apparel
    /// piece covers several layers) and any one attribute hitting a
    /// Ban/ForceAllow should dominate.
    pub fn filter_result_from_items(&self, items: &[T]) -> FilterResult {
        fuse_all(
            self.lists()
                .flat_map(|l| items.iter().map(move |i| l.filter_result(i))),
        )
    }
}

fn union_lists<T: Clone + PartialEq>(
    a: Option<&FilterList<T>>,
    b: Option<&FilterList<T>>,
    kind: FilterKind,
) -> Option<FilterList<T>> {
    match (a, b) {
        (None, None) => None,
        (Some(x), None) | (None, Some(x)) => Some(x.clone()),
        (Some(x), Some(y)) => {
            let mut entries = x.entries.clone();
            for e in &y.entries {
                if !entries.contains(e) {
                    entries.push(e.clone());
                }
            }
            Some(FilterList { kind, entries })
        }
    }
}

fn intersect_lists<T: Clone + PartialEq>(
    a: Option<&FilterList<T>>,
    b: Option<&FilterList<T>>,
    kind: FilterKind,
) -> Option<FilterList<T>> {
    match (a, b) {
        (None, None) => None,
        // An absent list is no constraint; the present one survives as-is.
        (Some(x), None) | (None, Some(x)) => Some(x.clone()),
        (Some(x), Some(y)) => {
            let entries = x
                .entries
                .iter()
                .filter(|e| y.entries.contains(e))
                .cloned()
                .collect();
            Some(FilterList { kind, entries })
        }
    }
}

impl<T: Clone + PartialEq> FilterListSet<T> {
    /// Combine two sets. Allow/ban/black/accept lists union (either side's
    /// restriction applies); whitelists intersect (an item must satisfy
    /// both to pass).
    pub fn merge(&self, other: &FilterListSet<T>) -> FilterListSet<T> {
        FilterListSet {
            allowlist: union_lists(
                self.allowlist.as_ref(),
                other.allowlist.as_ref(),
                FilterKind::Allowlist,
            ),
            whitelist: intersect_lists(
                self.whitelist.as_ref(),
                other.whitelist.as_ref(),
                FilterKind::Whitelist,
            ),
            acceptlist: union_lists(
                self.acceptlist.as_ref(),
                other.acceptlist.as_ref(),
                FilterKind::Acceptlist,
            ),
            blacklist: union_lists(
                self.blacklist.as_ref(),
                other.blacklist.as_ref(),
                FilterKind::Blacklist,
            ),
            banlist: union_lists(
                self.banlist.as_ref(),
                other.banlist.as_ref(),
                FilterKind::Banlist,
            ),
        }
    }
}

/// Left-fold merge over any number of sets. Empty input yields `None`.
pub fn merge_all<T: Clone + PartialEq>(
    sets: impl IntoIterator<Item = FilterListSet<T>>,
) -> Option<FilterListSet<T>> {
    sets.into_iter().reduce(|acc, next| acc.merge(&next))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(entries: &[&str]) -> Vec<String> {
        entries.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_fuse_ordering() {
        use FilterResult::*;
        assert_eq!(None.fuse(Allow), Allow);
        assert_eq!(Allow.fuse(Deny), Deny);
        assert_eq!(Deny.fuse(ForceAllow), ForceAllow);
        assert_eq!(ForceAllow.fuse(Banned), Banned);
        assert_eq!(Banned.fuse(ForceAllow), Banned);
    }

    #[test]
    fn test_fuse_identity_commutative_associative() {
        use FilterResult::*;
        let all = [None, Neutral, Allow, Deny, ForceAllow, Banned];
        for &x in &all {
            assert_eq!(x.fuse(None), x);
            assert_eq!(None.fuse(x), x);
            for &y in &all {
                assert_eq!(x.fuse(y), y.fuse(x));
                for &z in &all {
                    assert_eq!(x.fuse(y).fuse(z), x.fuse(y.fuse(z)));
                }
            }
        }
    }

    #[test]
    fn test_fuse_all_empty_is_none() {
        assert_eq!(fuse_all(std::iter::empty()), FilterResult::None);
    }

    #[test]
    fn test_result_predicates() {
        use FilterResult::*;

        assert!(Allow.explicitly_allowed());
        assert!(ForceAllow.explicitly_allowed());
        assert!(!Neutral.explicitly_allowed());

        assert!(Neutral.neutral_or_worse());
        assert!(Deny.neutral_or_worse());
        assert!(Banned.neutral_or_worse());
        assert!(!Allow.neutral_or_worse());

        // Only the two extremes end evaluation early.
        for x in [None, Neutral, Allow, Deny] {
            assert!(!x.priority_result());
        }
        assert!(Banned.priority_result());
        assert!(ForceAllow.priority_result());
    }

    #[test]
    fn test_list_kinds() {
        let item = "vest".to_string();
        let other = "hat".to_string();

        let allow = FilterList::new(FilterKind::Allowlist, tags(&["vest"]));
        assert_eq!(allow.filter_result(&item), FilterResult::ForceAllow);
        assert_eq!(allow.filter_result(&other), FilterResult::Neutral);

        let white = FilterList::new(FilterKind::Whitelist, tags(&["vest"]));
        assert_eq!(white.filter_result(&item), FilterResult::Allow);
        assert_eq!(white.filter_result(&other), FilterResult::Deny);

        let accept = FilterList::new(FilterKind::Acceptlist, tags(&["vest"]));
        assert_eq!(accept.filter_result(&item), FilterResult::Allow);
        assert_eq!(accept.filter_result(&other), FilterResult::Neutral);

        let black = FilterList::new(FilterKind::Blacklist, tags(&["vest"]));
        assert_eq!(black.filter_result(&item), FilterResult::Deny);
        assert_eq!(black.filter_result(&other), FilterResult::Neutral);

        let ban = FilterList::new(FilterKind::Banlist, tags(&["vest"]));
        assert_eq!(ban.filter_result(&item), FilterResult::Banned);
        assert_eq!(ban.filter_result(&other), FilterResult::Neutral);
    }

    #[test]
    fn test_banlist_beats_allowlist_in_same_set() {
        let set = FilterListSet {
            allowlist: Some(FilterList::new(FilterKind::Allowlist, tags(&["vest"]))),
            banlist: Some(FilterList::new(FilterKind::Banlist, tags(&["vest"]))),
            ..Default::default()
        };
        assert_eq!(
            set.filter_result(&"vest".to_string()),
            FilterResult::Banned
        );
    }

    #[test]
    fn test_force_allow_beats_deny_but_not_banned() {
        let set = FilterListSet {
            allowlist: Some(FilterList::new(FilterKind::Allowlist, tags(&["vest"]))),
            blacklist: Some(FilterList::new(FilterKind::Blacklist, tags(&["vest"]))),
            ..Default::default()
        };
        assert_eq!(
            set.filter_result(&"vest".to_string()),
            FilterResult::ForceAllow
        );
    }

    #[test]
    fn test_item_list_cross_product() {
        // One banned attribute dominates even when another is force-allowed.
        let set = FilterListSet {
            allowlist: Some(FilterList::new(FilterKind::Allowlist, tags(&["legs"]))),
            banlist: Some(FilterList::new(FilterKind::Banlist, tags(&["torso"]))),
            ..Default::default()
        };
        let attrs = tags(&["legs", "torso"]);
        assert_eq!(set.filter_result_from_items(&attrs), FilterResult::Banned);
    }

    #[test]
    fn test_empty_set_is_none() {
        let set: FilterListSet<String> = FilterListSet::default();
        assert!(set.is_empty());
        assert_eq!(set.filter_result(&"x".to_string()), FilterResult::None);
    }

    #[test]
    fn test_merge_whitelist_intersects() {
        let a = FilterListSet {
            whitelist: Some(FilterList::new(FilterKind::Whitelist, tags(&["x", "y"]))),
            ..Default::default()
        };
        let b = FilterListSet {
            whitelist: Some(FilterList::new(FilterKind::Whitelist, tags(&["y", "z"]))),
            ..Default::default()
        };
        let merged = a.merge(&b);

        assert!(merged.filter_result(&"y".to_string()).accepted());
        assert!(merged.filter_result(&"x".to_string()).denied());
        assert!(merged.filter_result(&"z".to_string()).denied());
    }

    #[test]
    fn test_merge_unions_restrictions() {
        let a = FilterListSet {
            blacklist: Some(FilterList::new(FilterKind::Blacklist, tags(&["x"]))),
            ..Default::default()
        };
        let b = FilterListSet {
            banlist: Some(FilterList::new(FilterKind::Banlist, tags(&["y"]))),
            ..Default::default()
        };
        let merged = a.merge(&b);

        assert_eq!(merged.filter_result(&"x".to_string()), FilterResult::Deny);
        assert_eq!(merged.filter_result(&"y".to_string()), FilterResult::Banned);
    }

    #[test]
    fn test_merge_absent_side_survives() {
        let a = FilterListSet {
            whitelist: Some(FilterList::new(FilterKind::Whitelist, tags(&["x"]))),
            ..Default::default()
        };
        let merged = a.merge(&FilterListSet::default());
        assert!(merged.filter_result(&"x".to_string()).accepted());
        assert!(merged.filter_result(&"q".to_string()).denied());
    }

    #[test]
    fn test_merge_all_folds() {
        let sets = vec![
            FilterListSet {
                whitelist: Some(FilterList::new(FilterKind::Whitelist, tags(&["x", "y"]))),
                ..Default::default()
            },
            FilterListSet {
                whitelist: Some(FilterList::new(FilterKind::Whitelist, tags(&["y", "z"]))),
                ..Default::default()
            },
            FilterListSet {
                banlist: Some(FilterList::new(FilterKind::Banlist, tags(&["q"]))),
                ..Default::default()
            },
        ];
        let merged = merge_all(sets).unwrap();
        assert!(merged.filter_result(&"y".to_string()).accepted());
        assert!(merged.filter_result(&"x".to_string()).denied());
        assert_eq!(merged.filter_result(&"q".to_string()), FilterResult::Banned);

        assert!(merge_all(Vec::<FilterListSet<String>>::new()).is_none());
    }

    #[test]
    fn test_normalize_kinds() {
        let mut set = FilterListSet {
            // Wrong tag in the banlist slot; the slot wins.
            banlist: Some(FilterList::new(FilterKind::Acceptlist, tags(&["x"]))),
            ..Default::default()
        };
        set.normalize_kinds();
        assert_eq!(set.banlist.as_ref().unwrap().kind, FilterKind::Banlist);
        assert_eq!(set.filter_result(&"x".to_string()), FilterResult::Banned);
    }
}
