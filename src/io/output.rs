//! Report writers for the CLI: JSON for machines, tables for humans.

use std::io::Write;

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, Table};
use serde::{Deserialize, Serialize};

use crate::core::errors::SubComputationFailure;
use crate::core::results::{
    DerivedMetricsReport, DiagnosticsReport, EffectivenessReport, FlagReport, ObjectiveStatus,
    ResponsivenessReport, Severity,
};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Json,
    Terminal,
}

/// All five operations' results for one engine pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub project: String,
    pub effectiveness: EffectivenessReport,
    pub responsiveness: ResponsivenessReport,
    pub diagnostics: DiagnosticsReport,
    pub derived: DerivedMetricsReport,
    pub flags: FlagReport,
}

pub trait ReportWriter {
    fn write_report(&self, report: &AnalysisReport, out: &mut dyn Write) -> anyhow::Result<()>;
}

pub fn create_writer(format: OutputFormat) -> Box<dyn ReportWriter> {
    match format {
        OutputFormat::Json => Box::new(JsonWriter),
        OutputFormat::Terminal => Box::new(TerminalWriter),
    }
}

struct JsonWriter;

impl ReportWriter for JsonWriter {
    fn write_report(&self, report: &AnalysisReport, out: &mut dyn Write) -> anyhow::Result<()> {
        serde_json::to_writer_pretty(&mut *out, report)?;
        writeln!(out)?;
        Ok(())
    }
}

struct TerminalWriter;

impl ReportWriter for TerminalWriter {
    fn write_report(&self, report: &AnalysisReport, out: &mut dyn Write) -> anyhow::Result<()> {
        writeln!(out, "{}", format!("Project {}", report.project).bold())?;
        writeln!(out)?;

        if !report.effectiveness.channels.is_empty() {
            writeln!(out, "{}", "Channel effectiveness".bold())?;
            writeln!(out, "{}", channels_table(&report.effectiveness))?;
            writeln!(out)?;
        }

        if !report.responsiveness.groups.is_empty() {
            writeln!(out, "{}", "Stakeholder responsiveness".bold())?;
            writeln!(out, "{}", groups_table(&report.responsiveness))?;
            writeln!(out)?;
        }

        if !report.diagnostics.objectives.is_empty() {
            writeln!(out, "{}", "Objective diagnostics".bold())?;
            writeln!(out, "{}", objectives_table(&report.diagnostics))?;
            writeln!(out)?;
        }

        writeln!(out, "{}", "Derived metrics".bold())?;
        write_derived(&report.derived, out)?;
        writeln!(out)?;

        writeln!(out, "{}", "Recommendations".bold())?;
        if report.flags.flags.is_empty() {
            writeln!(out, "  nothing to flag")?;
        } else {
            writeln!(out, "{}", flags_table(&report.flags))?;
        }

        let failures: Vec<&SubComputationFailure> = report
            .effectiveness
            .failures
            .iter()
            .chain(&report.responsiveness.failures)
            .chain(&report.diagnostics.failures)
            .chain(&report.derived.failures)
            .chain(&report.flags.failures)
            .collect();
        if !failures.is_empty() {
            writeln!(out)?;
            writeln!(out, "{}", "Partial results - failed sub-computations:".yellow())?;
            for failure in failures {
                writeln!(
                    out,
                    "  {} {} {}: {}",
                    failure.operation,
                    failure.entity_kind.as_str(),
                    failure.entity_id,
                    failure.message
                )?;
            }
        }
        Ok(())
    }
}

fn channels_table(report: &EffectivenessReport) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED).set_header(vec![
        "Channel",
        "Activities",
        "Effort h",
        "Cost",
        "Engagement",
        "Score",
    ]);
    for c in &report.channels {
        table.add_row(vec![
            Cell::new(&c.channel_name),
            Cell::new(c.activities_count),
            Cell::new(format!("{:.1}", c.effort_hours_total)),
            Cell::new(format!("{:.2}", c.cost_proxy_total)),
            Cell::new(c.meaningful_engagement_total),
            Cell::new(format!("{:.4}", c.effectiveness_score)),
        ]);
    }
    table
}

fn groups_table(report: &ResponsivenessReport) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED).set_header(vec![
        "Group",
        "Targeted",
        "Responses",
        "Ratio",
        "Flagged",
    ]);
    for g in &report.groups {
        table.add_row(vec![
            Cell::new(&g.group_name),
            Cell::new(g.targeted_activities_count),
            Cell::new(g.response_events_count),
            Cell::new(format!("{:.2}", g.responsiveness_ratio)),
            Cell::new(if g.flag_high_targeting_low_response {
                "yes"
            } else {
                ""
            }),
        ]);
    }
    table
}

fn objectives_table(report: &DiagnosticsReport) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED).set_header(vec![
        "Objective",
        "Status",
        "Activities",
        "Coverage",
        "Diagnoses",
    ]);
    for o in &report.objectives {
        let reasons: Vec<&str> = o.diagnoses.iter().map(|d| d.reason.as_str()).collect();
        table.add_row(vec![
            Cell::new(&o.objective_name),
            Cell::new(status_label(o.status)),
            Cell::new(o.linked_activities_count),
            Cell::new(format!("{:.0}%", o.evidence_coverage_ratio * 100.0)),
            Cell::new(reasons.join("; ")),
        ]);
    }
    table
}

fn flags_table(report: &FlagReport) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED).set_header(vec![
        "Severity",
        "Entity",
        "Explanation",
        "Suggested action",
        "Override",
    ]);
    for f in report.flags.iter() {
        table.add_row(vec![
            Cell::new(severity_label(f.severity)),
            Cell::new(format!("{} {}", f.entity_kind.as_str(), f.entity_id)),
            Cell::new(&f.explanation),
            Cell::new(&f.suggested_action),
            Cell::new(if f.override_payload.is_some() {
                "yes"
            } else {
                ""
            }),
        ]);
    }
    table
}

fn write_derived(report: &DerivedMetricsReport, out: &mut dyn Write) -> anyhow::Result<()> {
    let m = &report.metrics;
    match m.cost_per_meaningful_engagement_overall {
        Some(cost) => writeln!(out, "  cost per meaningful engagement: {cost:.2}")?,
        None => writeln!(out, "  cost per meaningful engagement: n/a (no engagement)")?,
    }
    writeln!(
        out,
        "  evidence-adjusted reach: {:.1}",
        m.evidence_adjusted_reach_overall
    )?;
    match m.uptake_lag_days_median {
        Some(days) => writeln!(
            out,
            "  median uptake lag: {days:.1} days ({} sample(s))",
            m.uptake_lag_samples_count
        )?,
        None => writeln!(out, "  median uptake lag: n/a (no samples)")?,
    }
    for (kind, days) in &m.uptake_lag_days_median_by_asset_kind {
        writeln!(out, "    {kind}: {days:.1} days")?;
    }
    Ok(())
}

fn severity_label(severity: Severity) -> String {
    match severity {
        Severity::High => severity.display_name().red().bold().to_string(),
        Severity::Warn => severity.display_name().yellow().to_string(),
        Severity::Info => severity.display_name().normal().to_string(),
    }
}

fn status_label(status: ObjectiveStatus) -> String {
    match status {
        ObjectiveStatus::Blocked => status.display_name().red().to_string(),
        ObjectiveStatus::AtRisk => status.display_name().yellow().to_string(),
        ObjectiveStatus::OnTrack => status.display_name().green().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::results::{DerivedMetrics, DerivedMetricsReport};

    fn empty_report() -> AnalysisReport {
        AnalysisReport {
            project: "p1".into(),
            effectiveness: EffectivenessReport::default(),
            responsiveness: ResponsivenessReport::default(),
            diagnostics: DiagnosticsReport::default(),
            derived: DerivedMetricsReport {
                metrics: DerivedMetrics {
                    cost_per_meaningful_engagement_overall: None,
                    cost_per_meaningful_engagement_by_channel: vec![],
                    evidence_adjusted_reach_overall: 0.0,
                    evidence_adjusted_reach_by_channel: vec![],
                    uptake_lag_days_median: None,
                    uptake_lag_days_median_by_asset_kind: Default::default(),
                    uptake_lag_samples_count: 0,
                },
                failures: vec![],
            },
            flags: FlagReport::default(),
        }
    }

    #[test]
    fn json_writer_emits_valid_json() {
        let mut buf = Vec::new();
        create_writer(OutputFormat::Json)
            .write_report(&empty_report(), &mut buf)
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(parsed["project"], "p1");
    }

    #[test]
    fn terminal_writer_handles_empty_report() {
        let mut buf = Vec::new();
        create_writer(OutputFormat::Terminal)
            .write_report(&empty_report(), &mut buf)
            .unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("nothing to flag"));
    }
}
