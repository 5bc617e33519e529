//! Domain entities consumed read-only from the storage collaborator.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Opaque identifier assigned by the storage collaborator.
pub type EntityId = String;

/// The three categorical buckets activities and objectives fall into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Communication,
    Dissemination,
    Exploitation,
}

impl Domain {
    pub fn display_name(&self) -> &str {
        match self {
            Domain::Communication => "Communication",
            Domain::Dissemination => "Dissemination",
            Domain::Exploitation => "Exploitation",
        }
    }

    /// Communication and dissemination activities are public-facing;
    /// exploitation is internal.
    pub fn is_public(&self) -> bool {
        matches!(self, Domain::Communication | Domain::Dissemination)
    }
}

impl std::str::FromStr for Domain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "communication" => Ok(Domain::Communication),
            "dissemination" => Ok(Domain::Dissemination),
            "exploitation" => Ok(Domain::Exploitation),
            other => Err(format!(
                "unknown domain '{other}' (expected communication, dissemination or exploitation)"
            )),
        }
    }
}

/// Kinds of entities that recommendation flags and overrides attach to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Objective,
    Asset,
    Channel,
    Activity,
    StakeholderGroup,
}

impl EntityKind {
    /// Stable string used in flag ids and override keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Objective => "objective",
            EntityKind::Asset => "asset",
            EntityKind::Channel => "channel",
            EntityKind::Activity => "activity",
            EntityKind::StakeholderGroup => "stakeholder_group",
        }
    }
}

/// An outreach channel (newsletter, conference, social account, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub kind: String,
}

/// A project activity. Only non-deleted activities participate in any
/// computation; the store contract excludes soft-deleted rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub id: EntityId,
    pub title: String,
    pub domain: Domain,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub effort_hours: f64,
    #[serde(default)]
    pub budget_estimate: Option<f64>,
    /// Evidence completeness, 0-100.
    #[serde(default)]
    pub completeness_score: f64,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub channels: Vec<EntityId>,
    #[serde(default)]
    pub stakeholder_groups: Vec<EntityId>,
    #[serde(default)]
    pub objectives: Vec<EntityId>,
    #[serde(default)]
    pub assets: Vec<EntityId>,
    #[serde(default)]
    pub deleted: bool,
}

impl Activity {
    /// The dashboard marks finished activities with a "completed" status;
    /// the marker is matched case-insensitively.
    pub fn is_completed(&self) -> bool {
        self.status.eq_ignore_ascii_case("completed")
    }

    /// Budget estimate when recorded, otherwise effort priced at the
    /// project's default hourly rate.
    pub fn cost_proxy(&self, hourly_rate: f64) -> f64 {
        self.budget_estimate
            .unwrap_or(self.effort_hours * hourly_rate)
    }

    pub fn references_channel(&self, channel: &str) -> bool {
        self.channels.iter().any(|c| c == channel)
    }

    pub fn targets_group(&self, group: &str) -> bool {
        self.stakeholder_groups.iter().any(|g| g == group)
    }

    pub fn references_objective(&self, objective: &str) -> bool {
        self.objectives.iter().any(|o| o == objective)
    }

    pub fn references_asset(&self, asset: &str) -> bool {
        self.assets.iter().any(|a| a == asset)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StakeholderGroup {
    pub id: EntityId,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Objective {
    pub id: EntityId,
    pub name: String,
}

/// A project output (report, dataset, tool, ...) that can be disseminated
/// and taken up. `kind` buckets assets for lag statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub kind: String,
}

/// A project indicator with its recorded values.
///
/// `values` is in recording order; the last element is the latest value.
/// See [`crate::store::ProjectStore::indicators`] for the ordering contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Indicator {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub target: Option<f64>,
    #[serde(default)]
    pub values: Vec<f64>,
}

impl Indicator {
    pub fn latest_value(&self) -> Option<f64> {
        self.values.last().copied()
    }

    /// Reach indicators feed channel effectiveness; the category marker is
    /// matched case-insensitively.
    pub fn is_reach(&self) -> bool {
        self.category.eq_ignore_ascii_case("reach")
    }
}

/// Survey responses and qualitative-outcome log entries count identically
/// toward meaningful engagement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    SurveyResponse,
    QualitativeOutcome,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngagementSignal {
    pub id: EntityId,
    pub activity: EntityId,
    pub kind: SignalKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UptakeOpportunity {
    pub id: EntityId,
    pub asset: EntityId,
    pub created_on: NaiveDate,
}

/// Presence of a plan is all the engine cares about.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SustainabilityPlan {
    pub id: EntityId,
    pub asset: EntityId,
}

/// Inclusive date range used to scope an engine instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(default)]
    pub from: Option<NaiveDate>,
    #[serde(default)]
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self { from, to }
    }

    /// Undated activities stay in scope; only a recorded end date can fall
    /// outside the range.
    pub fn contains(&self, date: Option<NaiveDate>) -> bool {
        let Some(date) = date else { return true };
        if self.from.is_some_and(|from| date < from) {
            return false;
        }
        if self.to.is_some_and(|to| date > to) {
            return false;
        }
        true
    }
}

/// Filters accepted by the activity query (see `ProjectStore::activities`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivityFilter {
    #[serde(default)]
    pub date_range: Option<DateRange>,
    #[serde(default)]
    pub domain: Option<Domain>,
    #[serde(default)]
    pub stakeholder_group: Option<EntityId>,
}

impl ActivityFilter {
    /// Whether a non-deleted activity matches this filter.
    pub fn matches(&self, activity: &Activity) -> bool {
        if activity.deleted {
            return false;
        }
        if self.domain.is_some_and(|d| d != activity.domain) {
            return false;
        }
        if self
            .stakeholder_group
            .as_ref()
            .is_some_and(|g| !activity.targets_group(g))
        {
            return false;
        }
        self.date_range
            .map_or(true, |range| range.contains(activity.end_date))
    }
}
