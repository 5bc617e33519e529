//! Core domain types, results and shared helpers.

pub mod errors;
pub mod results;
pub mod stats;
pub mod types;

pub use errors::{EngineError, Result, StoreError, SubComputationFailure};
pub use results::{
    ChannelAdjustedReach, ChannelCostRatio, ChannelEffectiveness, DerivedMetrics,
    DerivedMetricsReport, Diagnosis, DiagnosisKind, DiagnosticsReport, DomainBreakdown,
    EffectivenessReport, FlagCode, FlagReport, ObjectiveDiagnostic, ObjectiveStatus,
    RecommendationFlag, ResponsivenessReport, Severity, StakeholderResponsiveness,
};
pub use types::{
    Activity, ActivityFilter, Asset, Channel, DateRange, Domain, EngagementSignal, EntityId,
    EntityKind, Indicator, Objective, SignalKind, StakeholderGroup, SustainabilityPlan,
    UptakeOpportunity,
};
