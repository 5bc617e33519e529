//! The analysis engine: construction, initialization and the shared
//! per-entity fan-out.
//!
//! A caller constructs the engine for one project (optionally scoped to a
//! reporting period and/or date range), calls [`Engine::init`] once to load
//! settings and overrides, then calls any subset of the five read operations.
//! Every operation is side-effect-free and may be repeated against the same
//! loaded state.

pub mod derived;
pub mod diagnostics;
pub mod effectiveness;
pub mod flags;
pub mod responsiveness;

pub use effectiveness::EffectivenessFilters;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use rayon::prelude::*;

use crate::config::{resolve_settings, ParallelConfig, ProjectSettings};
use crate::core::errors::{EngineError, Result, SubComputationFailure};
use crate::core::types::{ActivityFilter, DateRange, Domain, EntityId, EntityKind};
use crate::overrides::OverrideIndex;
use crate::store::ProjectStore;

/// Caller-supplied cancellation: an explicit trigger plus an optional
/// deadline. Checked before each per-entity sub-computation so an engine
/// pass never hangs on a slow store.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token that fires automatically after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            deadline: Some(Instant::now() + timeout),
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        if self.flag.load(Ordering::Relaxed) {
            return true;
        }
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }
}

/// Settings and overrides loaded by `init()`; immutable for the engine
/// instance lifetime and shared read-only across the fan-out.
#[derive(Debug)]
pub(crate) struct EngineState {
    pub settings: ProjectSettings,
    pub overrides: OverrideIndex,
}

/// The Decision Support & Recommendation Engine for one project.
pub struct Engine<S> {
    store: S,
    project: EntityId,
    period: Option<EntityId>,
    date_range: Option<DateRange>,
    as_of: NaiveDate,
    parallel: ParallelConfig,
    pool: Option<rayon::ThreadPool>,
    cancel: CancelToken,
    state: Option<EngineState>,
}

impl<S: ProjectStore> Engine<S> {
    pub fn new(store: S, project: impl Into<EntityId>) -> Self {
        Self {
            store,
            project: project.into(),
            period: None,
            date_range: None,
            as_of: chrono::Utc::now().date_naive(),
            parallel: ParallelConfig::default(),
            pool: None,
            cancel: CancelToken::new(),
            state: None,
        }
    }

    /// Scope the engine to one reporting period (affects override loading).
    pub fn with_period(mut self, period: impl Into<EntityId>) -> Self {
        self.period = Some(period.into());
        self
    }

    /// Scope all activity queries to a date range.
    pub fn with_date_range(mut self, range: DateRange) -> Self {
        self.date_range = Some(range);
        self
    }

    /// Reference date for "recent" and "stale" checks. Defaults to today;
    /// fix it for reproducible reports and tests.
    pub fn with_as_of(mut self, as_of: NaiveDate) -> Self {
        self.as_of = as_of;
        self
    }

    pub fn with_parallel(mut self, parallel: ParallelConfig) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Load settings and overrides. Must be called before any read
    /// operation; calling it again reloads both.
    pub fn init(&mut self) -> Result<()> {
        let settings = resolve_settings(&self.store, &self.project);
        let overrides = OverrideIndex::load(&self.store, &self.project, self.period.as_deref())
            .map_err(|e| EngineError::store("init", e))?;

        if self.parallel.enabled && self.pool.is_none() {
            if let Some(threads) = self.parallel.max_threads {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| EngineError::External(e.into()))?;
                self.pool = Some(pool);
            }
        }

        log::debug!(
            "engine initialized for project {} ({} override(s))",
            self.project,
            overrides.len()
        );
        self.state = Some(EngineState {
            settings,
            overrides,
        });
        Ok(())
    }

    /// The resolved settings, once initialized.
    pub fn settings(&self) -> Option<&ProjectSettings> {
        self.state.as_ref().map(|s| &s.settings)
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn as_of(&self) -> NaiveDate {
        self.as_of
    }

    pub(crate) fn store(&self) -> &S {
        &self.store
    }

    pub(crate) fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Reject reads on an uninitialized or already-cancelled engine.
    pub(crate) fn begin(&self, operation: &'static str) -> Result<&EngineState> {
        if self.cancel.is_cancelled() {
            return Err(EngineError::Cancelled { operation });
        }
        self.state
            .as_ref()
            .ok_or(EngineError::Uninitialized { operation })
    }

    /// The engine-level activity filter, optionally narrowed further.
    pub(crate) fn activity_filter(
        &self,
        domain: Option<Domain>,
        stakeholder_group: Option<EntityId>,
    ) -> ActivityFilter {
        ActivityFilter {
            date_range: self.date_range,
            domain,
            stakeholder_group,
        }
    }

    fn install<R: Send>(&self, op: impl FnOnce() -> R + Send) -> R {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }

    /// Fan per-entity work out over the worker pool and fan results back in.
    ///
    /// `work` returning `Ok(None)` drops the entity from the result set
    /// (e.g. a channel with no matching activities); an `Err` is collected
    /// as a per-entity failure without touching the other entities. Entities
    /// reached after the cancel token fires surface as cancelled failures.
    /// Ordering of the output is NOT defined; each operation applies its own
    /// deterministic sort after fan-in.
    pub(crate) fn fan_out<T, R>(
        &self,
        operation: &'static str,
        items: Vec<T>,
        ident: impl Fn(&T) -> (EntityKind, EntityId) + Send + Sync,
        work: impl Fn(T) -> std::result::Result<Option<R>, SubComputationFailure> + Send + Sync,
    ) -> (Vec<R>, Vec<SubComputationFailure>)
    where
        T: Send,
        R: Send,
    {
        let run = |item: T| {
            if self.cancel.is_cancelled() {
                let (kind, id) = ident(&item);
                return Err(SubComputationFailure::cancelled(operation, kind, id));
            }
            work(item)
        };

        let outcomes: Vec<std::result::Result<Option<R>, SubComputationFailure>> =
            if self.parallel.enabled {
                self.install(|| items.into_par_iter().map(run).collect())
            } else {
                items.into_iter().map(run).collect()
            };

        let mut results = Vec::with_capacity(outcomes.len());
        let mut failures = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok(Some(result)) => results.push(result),
                Ok(None) => {}
                Err(failure) => failures.push(failure),
            }
        }
        (results, failures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::{MemoryStore, ProjectFacts};

    fn engine() -> Engine<MemoryStore> {
        Engine::new(
            MemoryStore::new(ProjectFacts {
                project: "p1".into(),
                ..Default::default()
            }),
            "p1",
        )
    }

    #[test]
    fn reads_require_init() {
        let engine = engine();
        let err = engine.channel_effectiveness(None).unwrap_err();
        assert!(matches!(err, EngineError::Uninitialized { .. }));
    }

    #[test]
    fn init_loads_settings() {
        let mut engine = engine();
        assert!(engine.settings().is_none());
        engine.init().unwrap();
        assert_eq!(engine.settings().unwrap().hourly_rate_default, 50.0);
    }

    #[test]
    fn cancelled_token_rejects_new_operations() {
        let token = CancelToken::new();
        let mut engine = engine().with_cancel_token(token.clone());
        engine.init().unwrap();
        token.cancel();
        let err = engine.channel_effectiveness(None).unwrap_err();
        assert!(matches!(err, EngineError::Cancelled { .. }));
    }

    #[test]
    fn timeout_token_fires_on_deadline() {
        let token = CancelToken::with_timeout(Duration::from_secs(0));
        assert!(token.is_cancelled());
        let token = CancelToken::with_timeout(Duration::from_secs(3600));
        assert!(!token.is_cancelled());
    }

    #[test]
    fn fan_out_collects_results_and_failures() {
        let mut engine = engine().with_parallel(ParallelConfig::sequential());
        engine.init().unwrap();

        let (results, failures) = engine.fan_out(
            "test",
            vec![1u32, 2, 3, 4],
            |n| (EntityKind::Channel, n.to_string()),
            |n| match n {
                2 => Ok(None),
                3 => Err(SubComputationFailure::new(
                    "test",
                    EntityKind::Channel,
                    "3",
                    "boom",
                )),
                n => Ok(Some(n * 10)),
            },
        );

        let mut sorted = results.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![10, 40]);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].entity_id, "3");
    }
}
