//! Parallelism configuration for the per-entity fan-out.

use serde::{Deserialize, Serialize};

fn default_enabled() -> bool {
    true
}

/// Controls how the engine fans per-entity sub-computations out over a
/// rayon thread pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParallelConfig {
    /// Enable parallel fan-out (default: true). When disabled, entities are
    /// processed sequentially, which is handy for debugging.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Maximum worker threads. `None` uses the rayon global pool sized to
    /// the available cores.
    #[serde(default)]
    pub max_threads: Option<usize>,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            max_threads: None,
        }
    }
}

impl ParallelConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Config with parallel fan-out disabled.
    pub fn sequential() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    /// Effective worker count: the configured cap, or the available cores.
    pub fn effective_threads(&self) -> usize {
        self.max_threads.unwrap_or_else(num_cpus)
    }
}

fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_parallel() {
        let config = ParallelConfig::default();
        assert!(config.enabled);
        assert!(config.max_threads.is_none());
        assert!(config.effective_threads() >= 1);
    }

    #[test]
    fn sequential_disables_fan_out() {
        assert!(!ParallelConfig::sequential().enabled);
    }

    #[test]
    fn explicit_cap_wins() {
        let config = ParallelConfig {
            enabled: true,
            max_threads: Some(4),
        };
        assert_eq!(config.effective_threads(), 4);
    }

    #[test]
    fn serde_round_trip() {
        let config = ParallelConfig {
            enabled: true,
            max_threads: Some(8),
        };
        let json = serde_json::to_string(&config).unwrap();
        let parsed: ParallelConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, parsed);
    }
}
