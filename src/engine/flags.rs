//! Recommendation Flag Generator: assembles flags from the other
//! calculators, attaches overrides and ranks by severity.

use chrono::NaiveDate;

use super::Engine;
use crate::config::ProjectSettings;
use crate::core::errors::{EngineError, Result};
use crate::core::results::{
    ChannelEffectiveness, FlagCode, FlagReport, ObjectiveDiagnostic, ObjectiveStatus,
    RecommendationFlag, Severity,
};
use crate::core::types::{
    Activity, Asset, Domain, EntityKind, SustainabilityPlan, UptakeOpportunity,
};
use crate::overrides::OverrideIndex;
use crate::store::ProjectStore;

impl<S: ProjectStore> Engine<S> {
    /// The ranked list of actionable flags. Overridden flags stay in the
    /// list with their override payload attached; suppression is up to the
    /// caller.
    pub fn recommendation_flags(&self) -> Result<FlagReport> {
        const OP: &str = "recommendation_flags";
        let state = self.begin(OP)?;
        let settings = &state.settings;
        let project = self.project().to_string();

        let diagnostics = self.objective_diagnostics()?;
        let effectiveness = self.channel_effectiveness(None)?;
        let mut failures = diagnostics.failures.clone();
        failures.extend(effectiveness.failures.clone());

        let mut flags: Vec<RecommendationFlag> = diagnostics
            .objectives
            .iter()
            .filter_map(|d| objective_flag(d, &project))
            .collect();

        let assets = self
            .store()
            .assets(self.project())
            .map_err(|e| EngineError::store(OP, e))?;
        let dissemination = self
            .store()
            .activities(
                self.project(),
                &self.activity_filter(Some(Domain::Dissemination), None),
            )
            .map_err(|e| EngineError::store(OP, e))?;
        let opportunities = self
            .store()
            .uptake_opportunities(self.project())
            .map_err(|e| EngineError::store(OP, e))?;
        let plans = self
            .store()
            .sustainability_plans(self.project())
            .map_err(|e| EngineError::store(OP, e))?;

        let as_of = self.as_of();
        let (mut asset_flags, asset_failures) = self.fan_out(
            OP,
            assets,
            |asset| (EntityKind::Asset, asset.id.clone()),
            |asset| {
                Ok(stale_asset_flag(
                    &asset,
                    &dissemination,
                    &opportunities,
                    &plans,
                    as_of,
                    settings,
                    &project,
                ))
            },
        );
        failures.extend(asset_failures);
        asset_flags.sort_by(|a, b| a.entity_id.cmp(&b.entity_id));
        flags.extend(asset_flags);

        flags.extend(
            effectiveness
                .channels
                .iter()
                .filter_map(|c| inefficient_channel_flag(c, settings, &project)),
        );

        let activities = self
            .store()
            .activities(self.project(), &self.activity_filter(None, None))
            .map_err(|e| EngineError::store(OP, e))?;
        flags.extend(
            activities
                .iter()
                .filter_map(|a| low_evidence_activity_flag(a, settings, &project)),
        );

        attach_overrides(&mut flags, &state.overrides);
        sort_by_severity(&mut flags);

        Ok(FlagReport {
            flags: flags.into_iter().collect(),
            failures,
        })
    }
}

/// Blocked objectives flag high, at-risk warn; on-track objectives produce
/// no flag.
pub(crate) fn objective_flag(
    diagnostic: &ObjectiveDiagnostic,
    project: &str,
) -> Option<RecommendationFlag> {
    let (code, severity) = match diagnostic.status {
        ObjectiveStatus::Blocked => (FlagCode::ObjectiveBlocked, Severity::High),
        ObjectiveStatus::AtRisk => (FlagCode::ObjectiveAtRisk, Severity::Warn),
        ObjectiveStatus::OnTrack => return None,
    };

    let reasons: Vec<&str> = diagnostic
        .diagnoses
        .iter()
        .map(|d| d.reason.as_str())
        .collect();
    let explanation = if reasons.is_empty() {
        format!(
            "objective '{}' is {}",
            diagnostic.objective_name,
            diagnostic.status.display_name().to_lowercase()
        )
    } else {
        format!(
            "objective '{}' is {}: {}",
            diagnostic.objective_name,
            diagnostic.status.display_name().to_lowercase(),
            reasons.join("; ")
        )
    };
    let suggested_action = diagnostic
        .diagnoses
        .first()
        .map(|d| d.suggested_action.clone())
        .unwrap_or_else(|| "review the objective's activities and evidence".to_string());

    Some(RecommendationFlag {
        id: RecommendationFlag::stable_id(EntityKind::Objective, &diagnostic.objective_id, code),
        entity_kind: EntityKind::Objective,
        entity_id: diagnostic.objective_id.clone(),
        code,
        severity,
        explanation,
        suggested_action,
        deep_link: format!(
            "/projects/{project}/objectives/{}",
            diagnostic.objective_id
        ),
        override_payload: None,
    })
}

/// An asset disseminated longer than the exploitation window ago with
/// neither an uptake opportunity nor a sustainability plan.
pub(crate) fn stale_asset_flag(
    asset: &Asset,
    dissemination: &[Activity],
    opportunities: &[UptakeOpportunity],
    plans: &[SustainabilityPlan],
    as_of: NaiveDate,
    settings: &ProjectSettings,
    project: &str,
) -> Option<RecommendationFlag> {
    let first_dissemination_end = dissemination
        .iter()
        .filter(|a| a.domain == Domain::Dissemination && a.references_asset(&asset.id))
        .filter_map(|a| a.end_date)
        .min()?;
    let days_since = (as_of - first_dissemination_end).num_days();
    if days_since <= settings.uptake_no_exploitation_days {
        return None;
    }
    if opportunities.iter().any(|o| o.asset == asset.id) {
        return None;
    }
    if plans.iter().any(|p| p.asset == asset.id) {
        return None;
    }

    Some(RecommendationFlag {
        id: RecommendationFlag::stable_id(EntityKind::Asset, &asset.id, FlagCode::AssetNoUptake),
        entity_kind: EntityKind::Asset,
        entity_id: asset.id.clone(),
        code: FlagCode::AssetNoUptake,
        severity: Severity::Warn,
        explanation: format!(
            "asset '{}' was disseminated {days_since} days ago with no uptake opportunity or sustainability plan",
            asset.name
        ),
        suggested_action: "log an uptake opportunity or draft a sustainability plan".to_string(),
        deep_link: format!("/projects/{project}/assets/{}", asset.id),
        override_payload: None,
    })
}

/// A channel that absorbs effort beyond the threshold without any meaningful
/// engagement.
pub(crate) fn inefficient_channel_flag(
    channel: &ChannelEffectiveness,
    settings: &ProjectSettings,
    project: &str,
) -> Option<RecommendationFlag> {
    if channel.effort_hours_total <= settings.inefficient_channel_effort_hours_threshold
        || channel.meaningful_engagement_total > 0
    {
        return None;
    }

    Some(RecommendationFlag {
        id: RecommendationFlag::stable_id(
            EntityKind::Channel,
            &channel.channel_id,
            FlagCode::ChannelInefficient,
        ),
        entity_kind: EntityKind::Channel,
        entity_id: channel.channel_id.clone(),
        code: FlagCode::ChannelInefficient,
        severity: Severity::Warn,
        explanation: format!(
            "channel '{}' absorbed {:.1} effort hours with no meaningful engagement",
            channel.channel_name, channel.effort_hours_total
        ),
        suggested_action: "reduce investment in this channel or change its content format"
            .to_string(),
        deep_link: format!("/projects/{project}/channels/{}", channel.channel_id),
        override_payload: None,
    })
}

/// A completed public activity whose evidence is below the completeness
/// threshold.
pub(crate) fn low_evidence_activity_flag(
    activity: &Activity,
    settings: &ProjectSettings,
    project: &str,
) -> Option<RecommendationFlag> {
    if !activity.is_completed()
        || !activity.domain.is_public()
        || activity.completeness_score >= settings.evidence_completeness_threshold
    {
        return None;
    }

    Some(RecommendationFlag {
        id: RecommendationFlag::stable_id(
            EntityKind::Activity,
            &activity.id,
            FlagCode::ActivityLowEvidence,
        ),
        entity_kind: EntityKind::Activity,
        entity_id: activity.id.clone(),
        code: FlagCode::ActivityLowEvidence,
        severity: Severity::Info,
        explanation: format!(
            "completed activity '{}' documents only {:.0}% of its evidence",
            activity.title, activity.completeness_score
        ),
        suggested_action: "upload the missing evidence for this activity".to_string(),
        deep_link: format!("/projects/{project}/activities/{}", activity.id),
        override_payload: None,
    })
}

/// Attach override payloads by (entity kind, entity id, flag code); flags
/// without an override keep `None`.
pub(crate) fn attach_overrides(flags: &mut [RecommendationFlag], overrides: &OverrideIndex) {
    for flag in flags {
        if let Some(hit) = overrides.get(flag.entity_kind, &flag.entity_id, flag.code.as_str()) {
            flag.override_payload = Some(hit.payload.clone());
        }
    }
}

/// Final deterministic ordering: ascending severity rank, stable within
/// equal severities.
pub(crate) fn sort_by_severity(flags: &mut [RecommendationFlag]) {
    flags.sort_by_key(|f| f.severity.rank());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::results::{Diagnosis, DiagnosisKind, DomainBreakdown};

    fn flag(id: &str, severity: Severity) -> RecommendationFlag {
        RecommendationFlag {
            id: id.into(),
            entity_kind: EntityKind::Objective,
            entity_id: id.into(),
            code: FlagCode::ObjectiveAtRisk,
            severity,
            explanation: String::new(),
            suggested_action: String::new(),
            deep_link: String::new(),
            override_payload: None,
        }
    }

    #[test]
    fn severity_sort_is_stable() {
        let mut flags = vec![
            flag("f1", Severity::Info),
            flag("f2", Severity::High),
            flag("f3", Severity::Warn),
            flag("f4", Severity::High),
        ];
        sort_by_severity(&mut flags);
        let order: Vec<&str> = flags.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(order, vec!["f2", "f4", "f3", "f1"]);
    }

    fn diagnostic(status: ObjectiveStatus) -> ObjectiveDiagnostic {
        ObjectiveDiagnostic {
            objective_id: "ob-1".into(),
            objective_name: "Grow adoption".into(),
            status,
            linked_activities_count: 0,
            domain_breakdown: DomainBreakdown::default(),
            linked_assets_count: 0,
            indicator_progress_ratio: None,
            evidence_coverage_ratio: 0.0,
            has_engagement: false,
            diagnoses: vec![Diagnosis {
                kind: DiagnosisKind::NoActivitiesLinked,
                reason: "no activities linked".into(),
                suggested_action: "create activities".into(),
                deep_link: "/projects/p1/activities/new?objective=ob-1".into(),
            }],
        }
    }

    #[test]
    fn blocked_objective_flags_high() {
        let flag = objective_flag(&diagnostic(ObjectiveStatus::Blocked), "p1").unwrap();
        assert_eq!(flag.severity, Severity::High);
        assert_eq!(flag.code, FlagCode::ObjectiveBlocked);
        assert!(flag.explanation.contains("no activities linked"));
        assert_eq!(flag.suggested_action, "create activities");
    }

    #[test]
    fn on_track_objective_has_no_flag() {
        assert!(objective_flag(&diagnostic(ObjectiveStatus::OnTrack), "p1").is_none());
    }

    #[test]
    fn inefficient_channel_requires_zero_engagement() {
        let settings = ProjectSettings::default();
        let mut channel = ChannelEffectiveness {
            channel_id: "ch-1".into(),
            channel_name: "Podcast".into(),
            activities_count: 1,
            effort_hours_total: 41.0,
            cost_proxy_total: 0.0,
            reach_total: 0.0,
            evidence_completeness_avg: 0.0,
            meaningful_engagement_total: 0,
            effectiveness_score: 0.0,
        };
        assert!(inefficient_channel_flag(&channel, &settings, "p1").is_some());

        channel.meaningful_engagement_total = 1;
        assert!(inefficient_channel_flag(&channel, &settings, "p1").is_none());

        channel.meaningful_engagement_total = 0;
        channel.effort_hours_total = 40.0;
        assert!(inefficient_channel_flag(&channel, &settings, "p1").is_none());
    }

    #[test]
    fn low_evidence_flag_only_for_completed_public_activities() {
        let settings = ProjectSettings::default();
        let mut activity = Activity {
            id: "a1".into(),
            title: "Press release".into(),
            domain: Domain::Communication,
            status: "completed".into(),
            effort_hours: 0.0,
            budget_estimate: None,
            completeness_score: 30.0,
            end_date: None,
            channels: vec![],
            stakeholder_groups: vec![],
            objectives: vec![],
            assets: vec![],
            deleted: false,
        };
        let flag = low_evidence_activity_flag(&activity, &settings, "p1").unwrap();
        assert_eq!(flag.severity, Severity::Info);

        activity.domain = Domain::Exploitation;
        assert!(low_evidence_activity_flag(&activity, &settings, "p1").is_none());

        activity.domain = Domain::Dissemination;
        activity.status = "planned".into();
        assert!(low_evidence_activity_flag(&activity, &settings, "p1").is_none());

        activity.status = "completed".into();
        activity.completeness_score = 60.0;
        assert!(low_evidence_activity_flag(&activity, &settings, "p1").is_none());
    }

    #[test]
    fn stale_asset_flag_honors_window_uptake_and_plan() {
        let settings = ProjectSettings::default();
        let as_of = NaiveDate::from_ymd_opt(2026, 8, 1).unwrap();
        let asset = Asset {
            id: "as-1".into(),
            name: "Toolkit".into(),
            kind: "tool".into(),
        };
        let old_end = NaiveDate::from_ymd_opt(2026, 1, 1); // 212 days before as_of
        let dissemination = vec![Activity {
            id: "a1".into(),
            title: "Toolkit launch".into(),
            domain: Domain::Dissemination,
            status: "completed".into(),
            effort_hours: 0.0,
            budget_estimate: None,
            completeness_score: 0.0,
            end_date: old_end,
            channels: vec![],
            stakeholder_groups: vec![],
            objectives: vec![],
            assets: vec!["as-1".into()],
            deleted: false,
        }];

        let flag =
            stale_asset_flag(&asset, &dissemination, &[], &[], as_of, &settings, "p1").unwrap();
        assert_eq!(flag.code, FlagCode::AssetNoUptake);

        let opp = UptakeOpportunity {
            id: "u1".into(),
            asset: "as-1".into(),
            created_on: as_of,
        };
        assert!(
            stale_asset_flag(&asset, &dissemination, &[opp], &[], as_of, &settings, "p1").is_none()
        );

        let plan = SustainabilityPlan {
            id: "sp1".into(),
            asset: "as-1".into(),
        };
        assert!(
            stale_asset_flag(&asset, &dissemination, &[], &[plan], as_of, &settings, "p1")
                .is_none()
        );

        // exactly 180 days since dissemination: still inside the window
        let recent = NaiveDate::from_ymd_opt(2026, 6, 30).unwrap();
        assert!(
            stale_asset_flag(&asset, &dissemination, &[], &[], recent, &settings, "p1").is_none()
        );
    }
}
