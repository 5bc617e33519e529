//! Effectiveness Calculator: per-channel cost/reach/engagement aggregation.

use serde::{Deserialize, Serialize};

use super::Engine;
use crate::config::ProjectSettings;
use crate::core::errors::{EngineError, Result, SubComputationFailure};
use crate::core::results::{ChannelEffectiveness, EffectivenessReport};
use crate::core::stats::{mean, ratio_or_zero};
use crate::core::types::{Activity, Channel, Domain, EntityId, EntityKind, Indicator};
use crate::store::ProjectStore;

/// Optional narrowing for the effectiveness pass (the date range comes from
/// the engine scope).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EffectivenessFilters {
    pub domain: Option<Domain>,
    pub stakeholder_group: Option<EntityId>,
}

impl<S: ProjectStore> Engine<S> {
    /// One record per channel with at least one matching activity, ordered
    /// by descending effectiveness score.
    pub fn channel_effectiveness(
        &self,
        filters: Option<EffectivenessFilters>,
    ) -> Result<EffectivenessReport> {
        const OP: &str = "channel_effectiveness";
        let state = self.begin(OP)?;
        let filters = filters.unwrap_or_default();
        let filter = self.activity_filter(filters.domain, filters.stakeholder_group);

        let channels = self
            .store()
            .channels(self.project())
            .map_err(|e| EngineError::store(OP, e))?;
        let activities = self
            .store()
            .activities(self.project(), &filter)
            .map_err(|e| EngineError::store(OP, e))?;
        let indicators = self
            .store()
            .indicators(self.project())
            .map_err(|e| EngineError::store(OP, e))?;
        let uptake_count = self
            .store()
            .uptake_opportunities(self.project())
            .map_err(|e| EngineError::store(OP, e))?
            .len();

        let reach_total = project_reach_total(&indicators);
        let settings = &state.settings;

        let (mut records, failures) = self.fan_out(
            OP,
            channels,
            |channel| (EntityKind::Channel, channel.id.clone()),
            |channel| {
                let matched: Vec<&Activity> = activities
                    .iter()
                    .filter(|a| a.references_channel(&channel.id))
                    .collect();
                if matched.is_empty() {
                    return Ok(None);
                }
                let ids: Vec<EntityId> = matched.iter().map(|a| a.id.clone()).collect();
                let signals = self.store().engagement_signals(&ids).map_err(|e| {
                    SubComputationFailure::new(
                        OP,
                        EntityKind::Channel,
                        channel.id.clone(),
                        e.to_string(),
                    )
                })?;
                Ok(Some(channel_record(
                    &channel,
                    &matched,
                    signals.len(),
                    reach_total,
                    uptake_count,
                    settings,
                )))
            },
        );

        sort_by_effectiveness(&mut records);
        Ok(EffectivenessReport {
            channels: records,
            failures,
        })
    }
}

/// Sum of the latest values of all reach-category indicators. Project-wide:
/// every channel reports this same figure (known coarse metric).
pub(crate) fn project_reach_total(indicators: &[Indicator]) -> f64 {
    indicators
        .iter()
        .filter(|i| i.is_reach())
        .filter_map(Indicator::latest_value)
        .sum()
}

/// Pure function building one channel's record from its matched activities.
pub(crate) fn channel_record(
    channel: &Channel,
    activities: &[&Activity],
    signal_count: usize,
    reach_total: f64,
    uptake_count: usize,
    settings: &ProjectSettings,
) -> ChannelEffectiveness {
    let effort_hours_total: f64 = activities.iter().map(|a| a.effort_hours).sum();
    let cost_proxy_total: f64 = activities
        .iter()
        .map(|a| a.cost_proxy(settings.hourly_rate_default))
        .sum();
    let completeness: Vec<f64> = activities.iter().map(|a| a.completeness_score).collect();
    // Uptake opportunities count toward meaningful engagement project-wide,
    // same caveat as reach.
    let meaningful_engagement_total = signal_count + uptake_count;

    ChannelEffectiveness {
        channel_id: channel.id.clone(),
        channel_name: channel.name.clone(),
        activities_count: activities.len(),
        effort_hours_total,
        cost_proxy_total,
        reach_total,
        evidence_completeness_avg: mean(&completeness),
        meaningful_engagement_total,
        effectiveness_score: ratio_or_zero(meaningful_engagement_total as f64, cost_proxy_total),
    }
}

/// Deterministic post-fan-in ordering: descending score, stable.
pub(crate) fn sort_by_effectiveness(records: &mut [ChannelEffectiveness]) {
    records.sort_by(|a, b| b.effectiveness_score.total_cmp(&a.effectiveness_score));
}
