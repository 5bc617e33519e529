//! Objective Diagnostics: the per-objective health classification state
//! machine. States are recomputed fresh on each call, never stored.

use std::collections::HashSet;

use chrono::{Months, NaiveDate};

use super::Engine;
use crate::config::ProjectSettings;
use crate::core::errors::{EngineError, Result, SubComputationFailure};
use crate::core::results::{
    Diagnosis, DiagnosisKind, DiagnosticsReport, DomainBreakdown, ObjectiveDiagnostic,
    ObjectiveStatus,
};
use crate::core::stats::mean;
use crate::core::types::{Activity, Domain, EntityId, EntityKind, Indicator, Objective};
use crate::store::ProjectStore;

/// Scalar inputs to the classification function; everything the transition
/// rule looks at, already aggregated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ClassificationInputs {
    pub linked_activities_count: usize,
    pub indicator_progress_ratio: Option<f64>,
    pub evidence_coverage_ratio: f64,
    pub has_engagement: bool,
    pub linked_assets_count: usize,
    pub dissemination_count: usize,
    pub has_recent_dissemination: bool,
    pub project_has_uptake: bool,
}

impl<S: ProjectStore> Engine<S> {
    /// Classify every objective as On track, At risk or Blocked, with
    /// reasons and suggested remediations for the unhealthy ones.
    pub fn objective_diagnostics(&self) -> Result<DiagnosticsReport> {
        const OP: &str = "objective_diagnostics";
        let state = self.begin(OP)?;
        let filter = self.activity_filter(None, None);

        let objectives = self
            .store()
            .objectives(self.project())
            .map_err(|e| EngineError::store(OP, e))?;
        let activities = self
            .store()
            .activities(self.project(), &filter)
            .map_err(|e| EngineError::store(OP, e))?;
        let indicators = self
            .store()
            .indicators(self.project())
            .map_err(|e| EngineError::store(OP, e))?;
        // Uptake existence is checked project-wide, not per asset (known
        // coarse behavior).
        let project_has_uptake = !self
            .store()
            .uptake_opportunities(self.project())
            .map_err(|e| EngineError::store(OP, e))?
            .is_empty();

        let progress_ratio = indicator_progress_ratio(&indicators);
        let settings = &state.settings;
        let project = self.project().to_string();
        let as_of = self.as_of();

        let (mut records, failures) = self.fan_out(
            OP,
            objectives,
            |objective| (EntityKind::Objective, objective.id.clone()),
            |objective| {
                let linked: Vec<&Activity> = activities
                    .iter()
                    .filter(|a| a.references_objective(&objective.id))
                    .collect();

                let has_engagement = if linked.is_empty() {
                    false
                } else {
                    let ids: Vec<EntityId> = linked.iter().map(|a| a.id.clone()).collect();
                    let signals = self.store().engagement_signals(&ids).map_err(|e| {
                        SubComputationFailure::new(
                            OP,
                            EntityKind::Objective,
                            objective.id.clone(),
                            e.to_string(),
                        )
                    })?;
                    !signals.is_empty()
                };

                Ok(Some(diagnose_objective(
                    &objective,
                    &linked,
                    progress_ratio,
                    has_engagement,
                    project_has_uptake,
                    as_of,
                    settings,
                    &project,
                )))
            },
        );

        // Fan-in order is nondeterministic; fix it by objective id.
        records.sort_by(|a, b| a.objective_id.cmp(&b.objective_id));
        Ok(DiagnosticsReport {
            objectives: records,
            failures,
        })
    }
}

/// Mean progress (latest value / target) over indicators with a positive
/// target and at least one recorded value; `None` when no indicator
/// qualifies. Project-wide, shared by all objectives.
pub(crate) fn indicator_progress_ratio(indicators: &[Indicator]) -> Option<f64> {
    let ratios: Vec<f64> = indicators
        .iter()
        .filter_map(|i| match (i.target, i.latest_value()) {
            (Some(target), Some(latest)) if target > 0.0 => Some(latest / target),
            _ => None,
        })
        .collect();
    if ratios.is_empty() {
        None
    } else {
        Some(mean(&ratios))
    }
}

/// Fraction of linked activities meeting the evidence completeness
/// threshold; 0 when nothing is linked.
pub(crate) fn evidence_coverage_ratio(linked: &[&Activity], threshold: f64) -> f64 {
    if linked.is_empty() {
        return 0.0;
    }
    let covered = linked
        .iter()
        .filter(|a| a.completeness_score >= threshold)
        .count();
    covered as f64 / linked.len() as f64
}

/// Whether any linked dissemination activity ended within the three calendar
/// months before `as_of`.
pub(crate) fn has_recent_dissemination(linked: &[&Activity], as_of: NaiveDate) -> bool {
    let cutoff = as_of
        .checked_sub_months(Months::new(3))
        .unwrap_or(NaiveDate::MIN);
    linked.iter().any(|a| {
        a.domain == Domain::Dissemination
            && a.end_date
                .is_some_and(|end| end >= cutoff && end <= as_of)
    })
}

/// The transition rule: evaluate in order, first match wins.
pub(crate) fn classify(
    inputs: &ClassificationInputs,
    settings: &ProjectSettings,
) -> (ObjectiveStatus, Vec<DiagnosisKind>) {
    if inputs.linked_activities_count == 0 {
        return (ObjectiveStatus::Blocked, vec![DiagnosisKind::NoActivitiesLinked]);
    }

    if inputs
        .indicator_progress_ratio
        .is_some_and(|r| r >= settings.objective_on_track_progress_threshold)
    {
        return (ObjectiveStatus::OnTrack, Vec::new());
    }

    if inputs.evidence_coverage_ratio >= settings.objective_evidence_coverage_threshold
        && inputs.has_engagement
    {
        return (ObjectiveStatus::OnTrack, Vec::new());
    }

    // At risk: accumulate every independent diagnosis that applies.
    let mut kinds = Vec::new();
    if inputs.linked_assets_count > 0 && inputs.dissemination_count == 0 {
        kinds.push(DiagnosisKind::DisseminationCoverageGap);
    }
    if inputs.evidence_coverage_ratio < 0.5 {
        kinds.push(DiagnosisKind::ExecutionGap);
    }
    if inputs.evidence_coverage_ratio >= 0.5 && !inputs.has_engagement {
        kinds.push(DiagnosisKind::EffectivenessGap);
    }
    if inputs.has_recent_dissemination && !inputs.project_has_uptake {
        kinds.push(DiagnosisKind::ExploitationGap);
    }
    (ObjectiveStatus::AtRisk, kinds)
}

/// Human-readable reason, suggested action and deep link for one diagnosis.
pub(crate) fn diagnosis_for(kind: DiagnosisKind, objective_id: &str, project: &str) -> Diagnosis {
    let (reason, suggested_action, deep_link) = match kind {
        DiagnosisKind::NoActivitiesLinked => (
            "no activities linked".to_string(),
            "create activities".to_string(),
            format!("/projects/{project}/activities/new?objective={objective_id}"),
        ),
        DiagnosisKind::DisseminationCoverageGap => (
            "dissemination coverage gap: assets are linked but no dissemination activities exist"
                .to_string(),
            "plan dissemination activities for the linked assets".to_string(),
            format!("/projects/{project}/activities/new?domain=dissemination&objective={objective_id}"),
        ),
        DiagnosisKind::ExecutionGap => (
            "execution gap: less than half of the linked activities meet the evidence threshold"
                .to_string(),
            "complete the evidence records of the linked activities".to_string(),
            format!("/projects/{project}/objectives/{objective_id}/activities"),
        ),
        DiagnosisKind::EffectivenessGap => (
            "effectiveness gap: evidence is in place but no engagement has been recorded"
                .to_string(),
            "review the channel mix and collect engagement signals".to_string(),
            format!("/projects/{project}/objectives/{objective_id}/engagement"),
        ),
        DiagnosisKind::ExploitationGap => (
            "exploitation gap: recent dissemination but the project has no uptake opportunities"
                .to_string(),
            "log uptake opportunities or revisit the exploitation plan".to_string(),
            format!("/projects/{project}/uptake/new"),
        ),
    };
    Diagnosis {
        kind,
        reason,
        suggested_action,
        deep_link,
    }
}

/// Gather one objective's inputs and classify it.
#[allow(clippy::too_many_arguments)]
pub(crate) fn diagnose_objective(
    objective: &Objective,
    linked: &[&Activity],
    progress_ratio: Option<f64>,
    has_engagement: bool,
    project_has_uptake: bool,
    as_of: NaiveDate,
    settings: &ProjectSettings,
    project: &str,
) -> ObjectiveDiagnostic {
    let mut breakdown = DomainBreakdown::default();
    for activity in linked {
        match activity.domain {
            Domain::Communication => breakdown.communication += 1,
            Domain::Dissemination => breakdown.dissemination += 1,
            Domain::Exploitation => breakdown.exploitation += 1,
        }
    }

    let assets: HashSet<&str> = linked
        .iter()
        .flat_map(|a| a.assets.iter().map(String::as_str))
        .collect();

    let coverage = evidence_coverage_ratio(linked, settings.evidence_completeness_threshold);
    let inputs = ClassificationInputs {
        linked_activities_count: linked.len(),
        indicator_progress_ratio: progress_ratio,
        evidence_coverage_ratio: coverage,
        has_engagement,
        linked_assets_count: assets.len(),
        dissemination_count: breakdown.dissemination,
        has_recent_dissemination: has_recent_dissemination(linked, as_of),
        project_has_uptake,
    };

    let (status, kinds) = classify(&inputs, settings);
    ObjectiveDiagnostic {
        objective_id: objective.id.clone(),
        objective_name: objective.name.clone(),
        status,
        linked_activities_count: linked.len(),
        domain_breakdown: breakdown,
        linked_assets_count: assets.len(),
        indicator_progress_ratio: progress_ratio,
        evidence_coverage_ratio: coverage,
        has_engagement,
        diagnoses: kinds
            .into_iter()
            .map(|kind| diagnosis_for(kind, &objective.id, project))
            .collect(),
    }
}
