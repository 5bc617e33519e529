//! Computation results: pure values derived fresh on each engine call.
//!
//! Every type here serializes to JSON so the surrounding dashboard can expose
//! the operations over an API without reshaping.

use im::Vector;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::errors::SubComputationFailure;
use super::types::{EntityId, EntityKind};

/// Severity of a recommendation flag, ordered by rank for the final sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Warn,
    Info,
}

impl Severity {
    /// Sort rank: high sorts first.
    pub fn rank(&self) -> u8 {
        match self {
            Severity::High => 0,
            Severity::Warn => 1,
            Severity::Info => 2,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Severity::High => "HIGH",
            Severity::Warn => "WARN",
            Severity::Info => "INFO",
        }
    }
}

/// Per-channel cost/reach/engagement aggregation.
///
/// `reach_total` and the uptake share of `meaningful_engagement_total` are
/// project-wide figures: every channel reports the same reach and uptake
/// contribution. The underlying data is too sparse to scope them per channel,
/// so callers must treat both as deliberately coarse metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelEffectiveness {
    pub channel_id: EntityId,
    pub channel_name: String,
    pub activities_count: usize,
    pub effort_hours_total: f64,
    pub cost_proxy_total: f64,
    pub reach_total: f64,
    pub evidence_completeness_avg: f64,
    pub meaningful_engagement_total: usize,
    /// meaningful engagement per unit of cost; 0 when cost is 0.
    pub effectiveness_score: f64,
}

/// Per-stakeholder-group targeting/response aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StakeholderResponsiveness {
    pub group_id: EntityId,
    pub group_name: String,
    pub targeted_activities_count: usize,
    pub response_events_count: usize,
    pub responsiveness_ratio: f64,
    /// Heavily targeted but barely responding, per the project thresholds.
    pub flag_high_targeting_low_response: bool,
}

/// Health classification of an objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveStatus {
    OnTrack,
    AtRisk,
    Blocked,
}

impl ObjectiveStatus {
    pub fn display_name(&self) -> &str {
        match self {
            ObjectiveStatus::OnTrack => "On track",
            ObjectiveStatus::AtRisk => "At risk",
            ObjectiveStatus::Blocked => "Blocked",
        }
    }
}

/// Independent diagnoses accumulated for at-risk (and blocked) objectives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosisKind {
    NoActivitiesLinked,
    DisseminationCoverageGap,
    ExecutionGap,
    EffectivenessGap,
    ExploitationGap,
}

/// A diagnosis with its human-readable reason and suggested remediation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnosis {
    pub kind: DiagnosisKind,
    pub reason: String,
    pub suggested_action: String,
    pub deep_link: String,
}

/// Count of linked activities per domain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainBreakdown {
    pub communication: usize,
    pub dissemination: usize,
    pub exploitation: usize,
}

/// Per-objective classification with the inputs that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveDiagnostic {
    pub objective_id: EntityId,
    pub objective_name: String,
    pub status: ObjectiveStatus,
    pub linked_activities_count: usize,
    pub domain_breakdown: DomainBreakdown,
    pub linked_assets_count: usize,
    /// Mean of latest/target over indicators with a positive target and at
    /// least one recorded value; `None` when no indicator qualifies.
    pub indicator_progress_ratio: Option<f64>,
    pub evidence_coverage_ratio: f64,
    pub has_engagement: bool,
    pub diagnoses: Vec<Diagnosis>,
}

/// Cost-per-engagement for a single channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelCostRatio {
    pub channel_id: EntityId,
    pub channel_name: String,
    /// 0 when the channel recorded no meaningful engagement.
    pub cost_per_meaningful_engagement: f64,
}

/// Evidence-adjusted reach for a single channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelAdjustedReach {
    pub channel_id: EntityId,
    pub channel_name: String,
    pub evidence_adjusted_reach: f64,
}

/// Portfolio-wide ratios and time-lag statistics, built atop the channel
/// effectiveness records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    /// `None` when no meaningful engagement was recorded at all.
    pub cost_per_meaningful_engagement_overall: Option<f64>,
    pub cost_per_meaningful_engagement_by_channel: Vec<ChannelCostRatio>,
    pub evidence_adjusted_reach_overall: f64,
    pub evidence_adjusted_reach_by_channel: Vec<ChannelAdjustedReach>,
    /// Median days between an asset's first dissemination end and its first
    /// uptake opportunity; `None` without samples.
    pub uptake_lag_days_median: Option<f64>,
    /// Same median bucketed by asset kind; kinds without samples are omitted.
    pub uptake_lag_days_median_by_asset_kind: BTreeMap<String, f64>,
    pub uptake_lag_samples_count: usize,
}

/// Stable codes identifying each kind of recommendation flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagCode {
    ObjectiveBlocked,
    ObjectiveAtRisk,
    AssetNoUptake,
    ChannelInefficient,
    ActivityLowEvidence,
}

impl FlagCode {
    /// Stable string used in flag ids and override keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            FlagCode::ObjectiveBlocked => "objective_blocked",
            FlagCode::ObjectiveAtRisk => "objective_at_risk",
            FlagCode::AssetNoUptake => "asset_no_uptake",
            FlagCode::ChannelInefficient => "channel_inefficient",
            FlagCode::ActivityLowEvidence => "activity_low_evidence",
        }
    }
}

/// An actionable recommendation, optionally carrying the user override for
/// its (entity, code) pair. The engine attaches overrides but never filters
/// overridden flags; suppression is the caller's call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationFlag {
    /// Stable id: `{entity_kind}-{entity_id}-{code}`.
    pub id: String,
    pub entity_kind: EntityKind,
    pub entity_id: EntityId,
    pub code: FlagCode,
    pub severity: Severity,
    pub explanation: String,
    pub suggested_action: String,
    pub deep_link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_payload: Option<serde_json::Value>,
}

impl RecommendationFlag {
    pub fn stable_id(entity_kind: EntityKind, entity_id: &str, code: FlagCode) -> String {
        format!("{}-{}-{}", entity_kind.as_str(), entity_id, code.as_str())
    }
}

/// Report container for channel effectiveness.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EffectivenessReport {
    pub channels: Vec<ChannelEffectiveness>,
    pub failures: Vec<SubComputationFailure>,
}

/// Report container for stakeholder responsiveness.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponsivenessReport {
    pub groups: Vec<StakeholderResponsiveness>,
    pub failures: Vec<SubComputationFailure>,
}

/// Report container for objective diagnostics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiagnosticsReport {
    pub objectives: Vec<ObjectiveDiagnostic>,
    pub failures: Vec<SubComputationFailure>,
}

/// Report container for derived metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DerivedMetricsReport {
    pub metrics: DerivedMetrics,
    pub failures: Vec<SubComputationFailure>,
}

/// Report container for recommendation flags, severity-ranked.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlagReport {
    pub flags: Vector<RecommendationFlag>,
    pub failures: Vec<SubComputationFailure>,
}

impl EffectivenessReport {
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }
}

impl ResponsivenessReport {
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }
}

impl DiagnosticsReport {
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }
}

impl DerivedMetricsReport {
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }
}

impl FlagReport {
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_ranks_high_first() {
        assert!(Severity::High.rank() < Severity::Warn.rank());
        assert!(Severity::Warn.rank() < Severity::Info.rank());
    }

    #[test]
    fn flag_id_is_stable() {
        assert_eq!(
            RecommendationFlag::stable_id(EntityKind::Objective, "ob-3", FlagCode::ObjectiveBlocked),
            "objective-ob-3-objective_blocked"
        );
    }
}
