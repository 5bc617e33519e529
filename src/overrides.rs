//! Override Index: user-authored flag adjustments in a fast-lookup map.
//!
//! Loaded once at engine initialization and passed to flag generation as an
//! explicit, immutable dependency. Absence of an override is the common case
//! and never an error.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::types::{EntityId, EntityKind};
use crate::store::{ProjectStore, StoreResult};

/// The payload of one override, interpreted by the caller (suppress,
/// re-rank, annotate, ...). The engine attaches it verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlagOverride {
    pub payload: serde_json::Value,
}

/// Mapping from (entity kind, entity id, flag code) to the override payload.
/// Keyed by the tuple itself: entity ids are opaque collaborator strings and
/// may contain any character.
#[derive(Debug, Clone, Default)]
pub struct OverrideIndex {
    entries: HashMap<(EntityKind, EntityId, String), FlagOverride>,
}

impl OverrideIndex {
    /// Load all override rows for the project (and period, if given).
    /// Later rows win on duplicate keys.
    pub fn load(
        store: &dyn ProjectStore,
        project: &str,
        period: Option<&str>,
    ) -> StoreResult<Self> {
        let rows = store.override_rows(project, period)?;
        let mut entries = HashMap::with_capacity(rows.len());
        for row in rows {
            entries.insert(
                (row.entity_kind, row.entity_id, row.flag_code),
                FlagOverride {
                    payload: row.payload,
                },
            );
        }
        log::debug!(
            "loaded {} override(s) for project {project} (period: {period:?})",
            entries.len()
        );
        Ok(Self { entries })
    }

    pub fn get(
        &self,
        entity_kind: EntityKind,
        entity_id: &EntityId,
        flag_code: &str,
    ) -> Option<&FlagOverride> {
        self.entries
            .get(&(entity_kind, entity_id.clone(), flag_code.to_string()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::{MemoryStore, ProjectFacts};
    use crate::store::OverrideRow;

    fn row(entity_id: &str, flag_code: &str, period: Option<&str>) -> OverrideRow {
        OverrideRow {
            entity_kind: EntityKind::Objective,
            entity_id: entity_id.into(),
            flag_code: flag_code.into(),
            payload: serde_json::json!({ "suppress": true }),
            period: period.map(Into::into),
        }
    }

    fn store(overrides: Vec<OverrideRow>) -> MemoryStore {
        MemoryStore::new(ProjectFacts {
            project: "p1".into(),
            overrides,
            ..Default::default()
        })
    }

    #[test]
    fn lookup_hits_and_misses() {
        let store = store(vec![row("ob-1", "objective_at_risk", None)]);
        let index = OverrideIndex::load(&store, "p1", None).unwrap();

        assert_eq!(index.len(), 1);
        assert!(index
            .get(EntityKind::Objective, &"ob-1".to_string(), "objective_at_risk")
            .is_some());
        assert!(index
            .get(EntityKind::Objective, &"ob-1".to_string(), "objective_blocked")
            .is_none());
        assert!(index
            .get(EntityKind::Channel, &"ob-1".to_string(), "objective_at_risk")
            .is_none());
    }

    #[test]
    fn empty_store_builds_empty_index() {
        let store = store(Vec::new());
        let index = OverrideIndex::load(&store, "p1", None).unwrap();
        assert!(index.is_empty());
    }

    #[test]
    fn period_scoping_is_delegated_to_the_store() {
        let store = store(vec![
            row("ob-1", "objective_at_risk", None),
            row("ob-2", "objective_at_risk", Some("2026-q1")),
        ]);

        let unscoped = OverrideIndex::load(&store, "p1", None).unwrap();
        assert_eq!(unscoped.len(), 1);

        let scoped = OverrideIndex::load(&store, "p1", Some("2026-q1")).unwrap();
        assert_eq!(scoped.len(), 2);
    }

    #[test]
    fn ids_with_separator_characters_do_not_collide() {
        // Ids are opaque collaborator strings; "a|x" + code "c" must stay
        // distinct from "a" + code "x|c".
        let store = store(vec![row("a|x", "c", None)]);
        let index = OverrideIndex::load(&store, "p1", None).unwrap();

        assert!(index
            .get(EntityKind::Objective, &"a|x".to_string(), "c")
            .is_some());
        assert!(index
            .get(EntityKind::Objective, &"a".to_string(), "x|c")
            .is_none());
    }

    #[test]
    fn duplicate_keys_keep_the_last_row() {
        let mut first = row("ob-1", "objective_at_risk", None);
        first.payload = serde_json::json!({ "suppress": false });
        let second = row("ob-1", "objective_at_risk", None);

        let store = store(vec![first, second]);
        let index = OverrideIndex::load(&store, "p1", None).unwrap();
        let hit = index
            .get(EntityKind::Objective, &"ob-1".to_string(), "objective_at_risk")
            .unwrap();
        assert_eq!(hit.payload, serde_json::json!({ "suppress": true }));
    }
}
