//! Derived Metrics Calculator: portfolio-wide ratios and uptake-lag
//! statistics built atop the channel effectiveness records.

use std::collections::BTreeMap;

use super::effectiveness::EffectivenessFilters;
use super::Engine;
use crate::core::errors::{EngineError, Result};
use crate::core::results::{
    ChannelAdjustedReach, ChannelCostRatio, ChannelEffectiveness, DerivedMetrics,
    DerivedMetricsReport,
};
use crate::core::stats::{median, ratio_or_zero};
use crate::core::types::{Activity, Asset, Domain, EntityKind, UptakeOpportunity};
use crate::store::ProjectStore;

impl<S: ProjectStore> Engine<S> {
    /// Portfolio-level cost ratios, evidence-adjusted reach and uptake-lag
    /// medians. Runs the effectiveness pass internally with the same
    /// filters; its per-channel failures carry through to this report.
    pub fn derived_metrics(
        &self,
        filters: Option<EffectivenessFilters>,
    ) -> Result<DerivedMetricsReport> {
        const OP: &str = "derived_metrics";
        self.begin(OP)?;

        let effectiveness = self.channel_effectiveness(filters)?;
        let mut failures = effectiveness.failures;

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

        let (samples, lag_failures) = self.fan_out(
            OP,
            assets,
            |asset| (EntityKind::Asset, asset.id.clone()),
            |asset| {
                Ok(uptake_lag_sample(&asset, &dissemination, &opportunities)
                    .map(|lag| (asset.kind.clone(), lag)))
            },
        );
        failures.extend(lag_failures);

        let metrics = derive_metrics(&effectiveness.channels, &samples);
        Ok(DerivedMetricsReport { metrics, failures })
    }
}

/// Days between an asset's earliest dissemination end and its earliest
/// uptake opportunity; `None` without both, or when the opportunity predates
/// the dissemination.
pub(crate) fn uptake_lag_sample(
    asset: &Asset,
    dissemination: &[Activity],
    opportunities: &[UptakeOpportunity],
) -> Option<f64> {
    let first_dissemination_end = dissemination
        .iter()
        .filter(|a| a.domain == Domain::Dissemination && a.references_asset(&asset.id))
        .filter_map(|a| a.end_date)
        .min()?;
    let first_opportunity = opportunities
        .iter()
        .filter(|o| o.asset == asset.id)
        .map(|o| o.created_on)
        .min()?;
    if first_opportunity < first_dissemination_end {
        return None;
    }
    Some((first_opportunity - first_dissemination_end).num_days() as f64)
}

/// Pure function assembling the derived metrics from the channel records and
/// the collected lag samples.
pub(crate) fn derive_metrics(
    channels: &[ChannelEffectiveness],
    lag_samples: &[(String, f64)],
) -> DerivedMetrics {
    let total_cost: f64 = channels.iter().map(|c| c.cost_proxy_total).sum();
    let total_engagement: usize = channels.iter().map(|c| c.meaningful_engagement_total).sum();

    let cost_per_meaningful_engagement_overall = if total_engagement == 0 {
        None
    } else {
        Some(total_cost / total_engagement as f64)
    };

    let cost_per_meaningful_engagement_by_channel = channels
        .iter()
        .map(|c| ChannelCostRatio {
            channel_id: c.channel_id.clone(),
            channel_name: c.channel_name.clone(),
            cost_per_meaningful_engagement: ratio_or_zero(
                c.cost_proxy_total,
                c.meaningful_engagement_total as f64,
            ),
        })
        .collect();

    let evidence_adjusted_reach_by_channel: Vec<ChannelAdjustedReach> = channels
        .iter()
        .map(|c| ChannelAdjustedReach {
            channel_id: c.channel_id.clone(),
            channel_name: c.channel_name.clone(),
            evidence_adjusted_reach: c.reach_total * (c.evidence_completeness_avg / 100.0),
        })
        .collect();
    let evidence_adjusted_reach_overall = evidence_adjusted_reach_by_channel
        .iter()
        .map(|c| c.evidence_adjusted_reach)
        .sum();

    let all_lags: Vec<f64> = lag_samples.iter().map(|(_, lag)| *lag).collect();
    let mut by_kind: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for (kind, lag) in lag_samples {
        by_kind.entry(kind.clone()).or_default().push(*lag);
    }
    let uptake_lag_days_median_by_asset_kind = by_kind
        .into_iter()
        .filter_map(|(kind, lags)| median(&lags).map(|m| (kind, m)))
        .collect();

    DerivedMetrics {
        cost_per_meaningful_engagement_overall,
        cost_per_meaningful_engagement_by_channel,
        evidence_adjusted_reach_overall,
        evidence_adjusted_reach_by_channel,
        uptake_lag_days_median: median(&all_lags),
        uptake_lag_days_median_by_asset_kind,
        uptake_lag_samples_count: all_lags.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn asset(id: &str, kind: &str) -> Asset {
        Asset {
            id: id.into(),
            name: format!("Asset {id}"),
            kind: kind.into(),
        }
    }

    fn dissemination_activity(asset: &str, end: Option<NaiveDate>) -> Activity {
        Activity {
            id: format!("a-{asset}"),
            title: "Release webinar".into(),
            domain: Domain::Dissemination,
            status: "completed".into(),
            effort_hours: 0.0,
            budget_estimate: None,
            completeness_score: 0.0,
            end_date: end,
            channels: vec![],
            stakeholder_groups: vec![],
            objectives: vec![],
            assets: vec![asset.into()],
            deleted: false,
        }
    }

    fn opportunity(asset: &str, on: NaiveDate) -> UptakeOpportunity {
        UptakeOpportunity {
            id: format!("u-{asset}"),
            asset: asset.into(),
            created_on: on,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn lag_is_days_from_first_dissemination_to_first_uptake() {
        let asset = asset("as-1", "dataset");
        let acts = vec![
            dissemination_activity("as-1", Some(date(2026, 3, 10))),
            dissemination_activity("as-1", Some(date(2026, 1, 10))),
        ];
        let opps = vec![
            opportunity("as-1", date(2026, 2, 9)),
            opportunity("as-1", date(2026, 4, 1)),
        ];
        // earliest end 2026-01-10, earliest opportunity 2026-02-09 -> 30 days
        assert_eq!(uptake_lag_sample(&asset, &acts, &opps), Some(30.0));
    }

    #[test]
    fn opportunity_before_dissemination_yields_no_sample() {
        let asset = asset("as-1", "dataset");
        let acts = vec![dissemination_activity("as-1", Some(date(2026, 3, 1)))];
        let opps = vec![opportunity("as-1", date(2026, 2, 1))];
        assert_eq!(uptake_lag_sample(&asset, &acts, &opps), None);
    }

    #[test]
    fn missing_either_side_yields_no_sample() {
        let asset = asset("as-1", "dataset");
        assert_eq!(
            uptake_lag_sample(&asset, &[], &[opportunity("as-1", date(2026, 2, 1))]),
            None
        );
        assert_eq!(
            uptake_lag_sample(
                &asset,
                &[dissemination_activity("as-1", Some(date(2026, 1, 1)))],
                &[]
            ),
            None
        );
        // undated dissemination cannot anchor a lag
        assert_eq!(
            uptake_lag_sample(
                &asset,
                &[dissemination_activity("as-1", None)],
                &[opportunity("as-1", date(2026, 2, 1))]
            ),
            None
        );
    }

    fn record(cost: f64, engagement: usize, reach: f64, completeness: f64) -> ChannelEffectiveness {
        ChannelEffectiveness {
            channel_id: "ch-1".into(),
            channel_name: "Newsletter".into(),
            activities_count: 1,
            effort_hours_total: 0.0,
            cost_proxy_total: cost,
            reach_total: reach,
            evidence_completeness_avg: completeness,
            meaningful_engagement_total: engagement,
            effectiveness_score: 0.0,
        }
    }

    #[test]
    fn overall_cost_ratio_is_none_without_engagement() {
        let metrics = derive_metrics(&[record(500.0, 0, 0.0, 0.0)], &[]);
        assert_eq!(metrics.cost_per_meaningful_engagement_overall, None);
        assert_eq!(
            metrics.cost_per_meaningful_engagement_by_channel[0].cost_per_meaningful_engagement,
            0.0
        );
    }

    #[test]
    fn overall_cost_ratio_sums_across_channels() {
        let metrics = derive_metrics(
            &[record(500.0, 2, 0.0, 0.0), record(100.0, 1, 0.0, 0.0)],
            &[],
        );
        assert_eq!(metrics.cost_per_meaningful_engagement_overall, Some(200.0));
    }

    #[test]
    fn evidence_adjusted_reach_scales_by_completeness() {
        let metrics = derive_metrics(&[record(0.0, 0, 1000.0, 80.0)], &[]);
        assert_eq!(metrics.evidence_adjusted_reach_overall, 800.0);
    }

    #[test]
    fn lag_medians_bucket_by_asset_kind() {
        let samples = vec![
            ("dataset".to_string(), 10.0),
            ("dataset".to_string(), 30.0),
            ("tool".to_string(), 5.0),
        ];
        let metrics = derive_metrics(&[], &samples);
        assert_eq!(metrics.uptake_lag_days_median, Some(10.0));
        assert_eq!(metrics.uptake_lag_samples_count, 3);
        assert_eq!(
            metrics.uptake_lag_days_median_by_asset_kind.get("dataset"),
            Some(&20.0)
        );
        assert_eq!(
            metrics.uptake_lag_days_median_by_asset_kind.get("tool"),
            Some(&5.0)
        );
    }

    #[test]
    fn no_samples_means_no_median() {
        let metrics = derive_metrics(&[], &[]);
        assert_eq!(metrics.uptake_lag_days_median, None);
        assert!(metrics.uptake_lag_days_median_by_asset_kind.is_empty());
    }
}
