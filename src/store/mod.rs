//! Storage collaborator boundary.
//!
//! The engine never talks to a concrete database; it consumes this query
//! capability. Implementations must exclude soft-deleted activities and are
//! free to answer each method from separate queries; the engine promises no
//! snapshot isolation across one computation pass.

pub mod memory;

use serde::{Deserialize, Serialize};

use crate::core::types::{
    Activity, ActivityFilter, Asset, Channel, EngagementSignal, EntityId, EntityKind, Indicator,
    Objective, StakeholderGroup, SustainabilityPlan, UptakeOpportunity,
};

pub use crate::core::errors::StoreError;
pub use memory::{MemoryStore, ProjectFacts};

pub type StoreResult<T> = Result<T, StoreError>;

/// A user-authored override row as stored by the dashboard.
///
/// `period: None` marks a project-wide override; a period-scoped row only
/// applies when the engine is scoped to that reporting period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideRow {
    pub entity_kind: EntityKind,
    pub entity_id: EntityId,
    pub flag_code: String,
    /// Opaque payload interpreted by the caller (suppress, re-rank,
    /// annotate, ...). The engine only carries it.
    pub payload: serde_json::Value,
    #[serde(default)]
    pub period: Option<EntityId>,
}

/// Read-only query capability over the project facts.
pub trait ProjectStore: Send + Sync {
    /// The project's settings blob, if any. Malformed blobs are the
    /// resolver's problem, not the store's.
    fn settings_blob(&self, project: &str) -> StoreResult<Option<serde_json::Value>>;

    /// Override rows for the project; when `period` is given, period-scoped
    /// rows for other periods are excluded.
    fn override_rows(&self, project: &str, period: Option<&str>) -> StoreResult<Vec<OverrideRow>>;

    fn channels(&self, project: &str) -> StoreResult<Vec<Channel>>;

    fn stakeholder_groups(&self, project: &str) -> StoreResult<Vec<StakeholderGroup>>;

    fn objectives(&self, project: &str) -> StoreResult<Vec<Objective>>;

    fn assets(&self, project: &str) -> StoreResult<Vec<Asset>>;

    /// Non-deleted activities matching the filter, with their references.
    fn activities(&self, project: &str, filter: &ActivityFilter) -> StoreResult<Vec<Activity>>;

    /// Indicators with their recorded values.
    ///
    /// Contract: `Indicator::values` is in recording order; the engine
    /// treats the last element as the latest value. Stores backed by a
    /// database must preserve insertion order in this query.
    fn indicators(&self, project: &str) -> StoreResult<Vec<Indicator>>;

    /// Engagement signals attached to any of the given activities.
    fn engagement_signals(&self, activity_ids: &[EntityId]) -> StoreResult<Vec<EngagementSignal>>;

    fn uptake_opportunities(&self, project: &str) -> StoreResult<Vec<UptakeOpportunity>>;

    fn sustainability_plans(&self, project: &str) -> StoreResult<Vec<SustainabilityPlan>>;
}
