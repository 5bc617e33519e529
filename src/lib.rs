// Export modules for library usage
pub mod cli;
pub mod config;
pub mod core;
pub mod engine;
pub mod io;
pub mod overrides;
pub mod store;

// Re-export commonly used types
pub use crate::core::{
    Activity, ActivityFilter, Asset, Channel, ChannelEffectiveness, DateRange, DerivedMetrics,
    DerivedMetricsReport, Diagnosis, DiagnosisKind, DiagnosticsReport, Domain, DomainBreakdown,
    EffectivenessReport, EngagementSignal, EngineError, EntityId, EntityKind, FlagCode,
    FlagReport, Indicator, Objective, ObjectiveDiagnostic, ObjectiveStatus, RecommendationFlag,
    ResponsivenessReport, Result, Severity, SignalKind, StakeholderGroup,
    StakeholderResponsiveness, StoreError, SubComputationFailure, SustainabilityPlan,
    UptakeOpportunity,
};

pub use crate::config::{resolve_settings, ImpactmapConfig, ParallelConfig, ProjectSettings};
pub use crate::engine::{CancelToken, EffectivenessFilters, Engine};
pub use crate::overrides::{FlagOverride, OverrideIndex};
pub use crate::store::{MemoryStore, OverrideRow, ProjectFacts, ProjectStore};
