//! In-memory store backed by a JSON fixture.
//!
//! Backs the CLI (`impactmap analyze facts.json`) and the integration tests.
//! All queries answer from one deserialized `ProjectFacts` value; requests
//! for a different project id return empty results, mirroring the scoping
//! behavior of the real database.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{OverrideRow, ProjectStore, StoreError, StoreResult};
use crate::core::types::{
    Activity, ActivityFilter, Asset, Channel, EngagementSignal, EntityId, Indicator, Objective,
    StakeholderGroup, SustainabilityPlan, UptakeOpportunity,
};

/// Everything the engine can ask about one project, as a serde fixture.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectFacts {
    pub project: EntityId,
    #[serde(default)]
    pub settings: Option<serde_json::Value>,
    #[serde(default)]
    pub channels: Vec<Channel>,
    #[serde(default)]
    pub stakeholder_groups: Vec<StakeholderGroup>,
    #[serde(default)]
    pub objectives: Vec<Objective>,
    #[serde(default)]
    pub assets: Vec<Asset>,
    #[serde(default)]
    pub activities: Vec<Activity>,
    #[serde(default)]
    pub indicators: Vec<Indicator>,
    #[serde(default)]
    pub engagement_signals: Vec<EngagementSignal>,
    #[serde(default)]
    pub uptake_opportunities: Vec<UptakeOpportunity>,
    #[serde(default)]
    pub sustainability_plans: Vec<SustainabilityPlan>,
    #[serde(default)]
    pub overrides: Vec<OverrideRow>,
}

#[derive(Debug, Clone)]
pub struct MemoryStore {
    facts: ProjectFacts,
}

impl MemoryStore {
    pub fn new(facts: ProjectFacts) -> Self {
        Self { facts }
    }

    pub fn from_json_str(json: &str) -> Result<Self, StoreError> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    pub fn from_json_file(path: &Path) -> Result<Self, StoreError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// The project id this fixture describes.
    pub fn project_id(&self) -> &str {
        &self.facts.project
    }

    fn scoped(&self, project: &str) -> bool {
        self.facts.project == project
    }
}

impl ProjectStore for MemoryStore {
    fn settings_blob(&self, project: &str) -> StoreResult<Option<serde_json::Value>> {
        if !self.scoped(project) {
            return Ok(None);
        }
        Ok(self.facts.settings.clone())
    }

    fn override_rows(&self, project: &str, period: Option<&str>) -> StoreResult<Vec<OverrideRow>> {
        if !self.scoped(project) {
            return Ok(Vec::new());
        }
        Ok(self
            .facts
            .overrides
            .iter()
            .filter(|row| match (&row.period, period) {
                // Rows without a period are project-wide.
                (None, _) => true,
                (Some(row_period), Some(requested)) => row_period == requested,
                (Some(_), None) => false,
            })
            .cloned()
            .collect())
    }

    fn channels(&self, project: &str) -> StoreResult<Vec<Channel>> {
        if !self.scoped(project) {
            return Ok(Vec::new());
        }
        Ok(self.facts.channels.clone())
    }

    fn stakeholder_groups(&self, project: &str) -> StoreResult<Vec<StakeholderGroup>> {
        if !self.scoped(project) {
            return Ok(Vec::new());
        }
        Ok(self.facts.stakeholder_groups.clone())
    }

    fn objectives(&self, project: &str) -> StoreResult<Vec<Objective>> {
        if !self.scoped(project) {
            return Ok(Vec::new());
        }
        Ok(self.facts.objectives.clone())
    }

    fn assets(&self, project: &str) -> StoreResult<Vec<Asset>> {
        if !self.scoped(project) {
            return Ok(Vec::new());
        }
        Ok(self.facts.assets.clone())
    }

    fn activities(&self, project: &str, filter: &ActivityFilter) -> StoreResult<Vec<Activity>> {
        if !self.scoped(project) {
            return Ok(Vec::new());
        }
        Ok(self
            .facts
            .activities
            .iter()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect())
    }

    fn indicators(&self, project: &str) -> StoreResult<Vec<Indicator>> {
        if !self.scoped(project) {
            return Ok(Vec::new());
        }
        Ok(self.facts.indicators.clone())
    }

    fn engagement_signals(&self, activity_ids: &[EntityId]) -> StoreResult<Vec<EngagementSignal>> {
        let ids: HashSet<&str> = activity_ids.iter().map(String::as_str).collect();
        Ok(self
            .facts
            .engagement_signals
            .iter()
            .filter(|s| ids.contains(s.activity.as_str()))
            .cloned()
            .collect())
    }

    fn uptake_opportunities(&self, project: &str) -> StoreResult<Vec<UptakeOpportunity>> {
        if !self.scoped(project) {
            return Ok(Vec::new());
        }
        Ok(self.facts.uptake_opportunities.clone())
    }

    fn sustainability_plans(&self, project: &str) -> StoreResult<Vec<SustainabilityPlan>> {
        if !self.scoped(project) {
            return Ok(Vec::new());
        }
        Ok(self.facts.sustainability_plans.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Domain, EntityKind, SignalKind};

    fn fixture() -> MemoryStore {
        MemoryStore::from_json_str(
            r#"{
                "project": "p1",
                "activities": [
                    {
                        "id": "a1",
                        "title": "Launch post",
                        "domain": "communication",
                        "effort_hours": 4.0,
                        "stakeholder_groups": ["g1"]
                    },
                    {
                        "id": "a2",
                        "title": "Old webinar",
                        "domain": "dissemination",
                        "deleted": true
                    }
                ],
                "engagement_signals": [
                    { "id": "s1", "activity": "a1", "kind": "survey_response" }
                ],
                "overrides": [
                    {
                        "entity_kind": "objective",
                        "entity_id": "ob-1",
                        "flag_code": "objective_at_risk",
                        "payload": { "suppress": true }
                    },
                    {
                        "entity_kind": "channel",
                        "entity_id": "ch-1",
                        "flag_code": "channel_inefficient",
                        "payload": {},
                        "period": "2026-q1"
                    }
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn deleted_activities_never_surface() {
        let store = fixture();
        let all = store
            .activities("p1", &ActivityFilter::default())
            .unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, "a1");
        assert_eq!(all[0].domain, Domain::Communication);
    }

    #[test]
    fn other_projects_see_nothing() {
        let store = fixture();
        assert!(store
            .activities("p2", &ActivityFilter::default())
            .unwrap()
            .is_empty());
        assert!(store.settings_blob("p2").unwrap().is_none());
    }

    #[test]
    fn signals_are_filtered_by_activity_set() {
        let store = fixture();
        let hits = store.engagement_signals(&["a1".to_string()]).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].kind, SignalKind::SurveyResponse);
        assert!(store
            .engagement_signals(&["a2".to_string()])
            .unwrap()
            .is_empty());
    }

    #[test]
    fn period_scoped_overrides_need_a_matching_period() {
        let store = fixture();
        let project_wide = store.override_rows("p1", None).unwrap();
        assert_eq!(project_wide.len(), 1);
        assert_eq!(project_wide[0].entity_kind, EntityKind::Objective);

        let scoped = store.override_rows("p1", Some("2026-q1")).unwrap();
        assert_eq!(scoped.len(), 2);

        let other = store.override_rows("p1", Some("2026-q2")).unwrap();
        assert_eq!(other.len(), 1);
    }
}
