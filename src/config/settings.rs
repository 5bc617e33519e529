//! Per-project thresholds applied mechanically by the calculators.
//!
//! Every numeric field has a compiled-in default; a missing or invalid value
//! always resolves to its default so downstream math never runs without a
//! usable threshold.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSettings {
    /// Currency per hour used to price activities without a budget estimate.
    #[serde(default = "default_hourly_rate")]
    pub hourly_rate_default: f64,

    /// 0-100 completeness score at/above which an activity counts as
    /// well-evidenced.
    #[serde(default = "default_evidence_completeness_threshold")]
    pub evidence_completeness_threshold: f64,

    /// Targeted-activity count at/above which a stakeholder group counts as
    /// heavily targeted.
    #[serde(default = "default_high_targeting_threshold")]
    pub stakeholder_high_targeting_threshold: usize,

    /// Responsiveness ratio below which a heavily targeted group is flagged.
    #[serde(default = "default_low_response_ratio_threshold")]
    pub stakeholder_low_response_ratio_threshold: f64,

    /// Days after dissemination without uptake or a sustainability plan
    /// before an asset is flagged.
    #[serde(default = "default_uptake_no_exploitation_days")]
    pub uptake_no_exploitation_days: i64,

    /// Effort hours above which a channel with zero meaningful engagement is
    /// flagged as inefficient.
    #[serde(default = "default_inefficient_channel_effort_hours")]
    pub inefficient_channel_effort_hours_threshold: f64,

    /// Indicator progress ratio at/above which an objective is on track.
    #[serde(default = "default_on_track_progress_threshold")]
    pub objective_on_track_progress_threshold: f64,

    /// Evidence coverage ratio for the secondary on-track rule.
    #[serde(default = "default_evidence_coverage_threshold")]
    pub objective_evidence_coverage_threshold: f64,

    /// Free-text definitions shown in the dashboard; carried opaquely.
    #[serde(default)]
    pub definitions: BTreeMap<String, String>,
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            hourly_rate_default: default_hourly_rate(),
            evidence_completeness_threshold: default_evidence_completeness_threshold(),
            stakeholder_high_targeting_threshold: default_high_targeting_threshold(),
            stakeholder_low_response_ratio_threshold: default_low_response_ratio_threshold(),
            uptake_no_exploitation_days: default_uptake_no_exploitation_days(),
            inefficient_channel_effort_hours_threshold: default_inefficient_channel_effort_hours(),
            objective_on_track_progress_threshold: default_on_track_progress_threshold(),
            objective_evidence_coverage_threshold: default_evidence_coverage_threshold(),
            definitions: BTreeMap::new(),
        }
    }
}

impl ProjectSettings {
    /// Reset out-of-range fields to their defaults, returning one complaint
    /// per fixed field. Ratios must sit in 0..=1, the completeness threshold
    /// in 0..=100, and rates/day counts must be non-negative and finite.
    pub fn sanitize(&mut self) -> Vec<String> {
        let defaults = Self::default();
        let mut fixed = Vec::new();

        let mut fix_f64 = |value: &mut f64, default: f64, name: &str, max: f64| {
            if !value.is_finite() || *value < 0.0 || *value > max {
                fixed.push(format!("{name} out of range ({value}), using {default}"));
                *value = default;
            }
        };

        fix_f64(
            &mut self.hourly_rate_default,
            defaults.hourly_rate_default,
            "hourly_rate_default",
            f64::MAX,
        );
        fix_f64(
            &mut self.evidence_completeness_threshold,
            defaults.evidence_completeness_threshold,
            "evidence_completeness_threshold",
            100.0,
        );
        fix_f64(
            &mut self.stakeholder_low_response_ratio_threshold,
            defaults.stakeholder_low_response_ratio_threshold,
            "stakeholder_low_response_ratio_threshold",
            1.0,
        );
        fix_f64(
            &mut self.inefficient_channel_effort_hours_threshold,
            defaults.inefficient_channel_effort_hours_threshold,
            "inefficient_channel_effort_hours_threshold",
            f64::MAX,
        );
        fix_f64(
            &mut self.objective_on_track_progress_threshold,
            defaults.objective_on_track_progress_threshold,
            "objective_on_track_progress_threshold",
            1.0,
        );
        fix_f64(
            &mut self.objective_evidence_coverage_threshold,
            defaults.objective_evidence_coverage_threshold,
            "objective_evidence_coverage_threshold",
            1.0,
        );

        if self.uptake_no_exploitation_days < 0 {
            fixed.push(format!(
                "uptake_no_exploitation_days negative ({}), using {}",
                self.uptake_no_exploitation_days, defaults.uptake_no_exploitation_days
            ));
            self.uptake_no_exploitation_days = defaults.uptake_no_exploitation_days;
        }

        fixed
    }
}

fn default_hourly_rate() -> f64 {
    50.0
}
fn default_evidence_completeness_threshold() -> f64 {
    60.0
}
fn default_high_targeting_threshold() -> usize {
    3
}
fn default_low_response_ratio_threshold() -> f64 {
    0.25
}
fn default_uptake_no_exploitation_days() -> i64 {
    180
}
fn default_inefficient_channel_effort_hours() -> f64 {
    40.0
}
fn default_on_track_progress_threshold() -> f64 {
    0.7
}
fn default_evidence_coverage_threshold() -> f64 {
    0.6
}
