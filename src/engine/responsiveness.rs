//! Responsiveness Calculator: per-stakeholder-group targeting/response
//! aggregation.

use super::Engine;
use crate::config::ProjectSettings;
use crate::core::errors::{EngineError, Result, SubComputationFailure};
use crate::core::results::{ResponsivenessReport, StakeholderResponsiveness};
use crate::core::types::{Activity, Domain, EntityId, EntityKind, StakeholderGroup};
use crate::store::ProjectStore;

impl<S: ProjectStore> Engine<S> {
    /// One record per stakeholder group with at least one targeted activity,
    /// ordered by descending responsiveness ratio.
    pub fn stakeholder_responsiveness(
        &self,
        domain: Option<Domain>,
    ) -> Result<ResponsivenessReport> {
        const OP: &str = "stakeholder_responsiveness";
        let state = self.begin(OP)?;
        let filter = self.activity_filter(domain, None);

        let groups = self
            .store()
            .stakeholder_groups(self.project())
            .map_err(|e| EngineError::store(OP, e))?;
        let activities = self
            .store()
            .activities(self.project(), &filter)
            .map_err(|e| EngineError::store(OP, e))?;

        let settings = &state.settings;

        let (mut records, failures) = self.fan_out(
            OP,
            groups,
            |group| (EntityKind::StakeholderGroup, group.id.clone()),
            |group| {
                let targeted: Vec<&Activity> = activities
                    .iter()
                    .filter(|a| a.targets_group(&group.id))
                    .collect();
                if targeted.is_empty() {
                    return Ok(None);
                }
                let ids: Vec<EntityId> = targeted.iter().map(|a| a.id.clone()).collect();
                let responses = self.store().engagement_signals(&ids).map_err(|e| {
                    SubComputationFailure::new(
                        OP,
                        EntityKind::StakeholderGroup,
                        group.id.clone(),
                        e.to_string(),
                    )
                })?;
                Ok(Some(group_record(
                    &group,
                    targeted.len(),
                    responses.len(),
                    settings,
                )))
            },
        );

        sort_by_ratio(&mut records);
        Ok(ResponsivenessReport {
            groups: records,
            failures,
        })
    }
}

/// Pure function building one group's record. Callers guarantee
/// `targeted_count > 0`; zero-targeted groups are excluded upstream.
pub(crate) fn group_record(
    group: &StakeholderGroup,
    targeted_count: usize,
    response_count: usize,
    settings: &ProjectSettings,
) -> StakeholderResponsiveness {
    let ratio = if targeted_count == 0 {
        0.0
    } else {
        response_count as f64 / targeted_count as f64
    };
    StakeholderResponsiveness {
        group_id: group.id.clone(),
        group_name: group.name.clone(),
        targeted_activities_count: targeted_count,
        response_events_count: response_count,
        responsiveness_ratio: ratio,
        flag_high_targeting_low_response: high_targeting_low_response(
            targeted_count,
            ratio,
            settings,
        ),
    }
}

/// True iff the group is targeted at/above the high-targeting threshold AND
/// responds below the low-response ratio threshold.
pub(crate) fn high_targeting_low_response(
    targeted_count: usize,
    ratio: f64,
    settings: &ProjectSettings,
) -> bool {
    targeted_count >= settings.stakeholder_high_targeting_threshold
        && ratio < settings.stakeholder_low_response_ratio_threshold
}

/// Deterministic post-fan-in ordering: descending ratio, stable.
pub(crate) fn sort_by_ratio(records: &mut [StakeholderResponsiveness]) {
    records.sort_by(|a, b| b.responsiveness_ratio.total_cmp(&a.responsiveness_ratio));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group() -> StakeholderGroup {
        StakeholderGroup {
            id: "g1".into(),
            name: "Policy makers".into(),
        }
    }

    #[test]
    fn ratio_is_responses_over_targeted() {
        let record = group_record(&group(), 4, 1, &ProjectSettings::default());
        assert_eq!(record.responsiveness_ratio, 0.25);
    }

    #[test]
    fn threshold_comparisons_are_inclusive_exclusive() {
        let settings = ProjectSettings::default();
        // targeted >= 3 (inclusive), ratio < 0.25 (exclusive)
        assert!(high_targeting_low_response(3, 0.2499, &settings));
        assert!(!high_targeting_low_response(2, 0.0, &settings));
        assert!(!high_targeting_low_response(3, 0.25, &settings));
    }

    #[test]
    fn flag_set_on_record() {
        // 5 targeted, 0 responses -> flagged
        let record = group_record(&group(), 5, 0, &ProjectSettings::default());
        assert!(record.flag_high_targeting_low_response);
        // 5 targeted, 4 responses -> healthy
        let record = group_record(&group(), 5, 4, &ProjectSettings::default());
        assert!(!record.flag_high_targeting_low_response);
    }

    #[test]
    fn records_sort_descending_by_ratio() {
        let settings = ProjectSettings::default();
        let mut records = vec![
            group_record(&group(), 4, 1, &settings),
            group_record(&group(), 2, 2, &settings),
        ];
        sort_by_ratio(&mut records);
        assert_eq!(records[0].responsiveness_ratio, 1.0);
    }
}
