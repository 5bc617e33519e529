//! Shared error types for the engine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::types::{EntityId, EntityKind};

/// Errors surfaced by the storage collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A backing query failed (connection, timeout, malformed row, ...).
    #[error("query '{query}' failed: {message}")]
    Query { query: String, message: String },

    /// JSON (settings blobs, fixtures) errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// IO errors
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub fn query(query: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Query {
            query: query.into(),
            message: message.into(),
        }
    }
}

/// Main error type for engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A read operation was called before `init()` loaded settings and
    /// overrides. Rejecting the call beats silently computing with empty
    /// defaults.
    #[error("engine not initialized: call init() before {operation}")]
    Uninitialized { operation: &'static str },

    /// The cancel token fired before the operation started.
    #[error("operation {operation} was cancelled")]
    Cancelled { operation: &'static str },

    /// A primary fetch for an operation failed; per-entity failures are
    /// reported inside the operation's result instead.
    #[error("store failure during {operation}")]
    Store {
        operation: &'static str,
        #[source]
        source: StoreError,
    },

    /// Wrapped external errors
    #[error(transparent)]
    External(#[from] anyhow::Error),
}

impl EngineError {
    pub fn store(operation: &'static str, source: StoreError) -> Self {
        Self::Store { operation, source }
    }
}

/// Result type alias using the engine error type.
pub type Result<T> = std::result::Result<T, EngineError>;

/// A per-entity sub-computation that failed without invalidating the rest
/// of the operation. Independent entities still report their results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubComputationFailure {
    pub operation: String,
    pub entity_kind: EntityKind,
    pub entity_id: EntityId,
    pub message: String,
}

impl SubComputationFailure {
    pub fn new(
        operation: &str,
        entity_kind: EntityKind,
        entity_id: impl Into<EntityId>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            operation: operation.to_string(),
            entity_kind,
            entity_id: entity_id.into(),
            message: message.into(),
        }
    }

    /// Failure entry for an entity skipped because the cancel token fired
    /// mid fan-out.
    pub fn cancelled(operation: &str, entity_kind: EntityKind, entity_id: impl Into<EntityId>) -> Self {
        Self::new(operation, entity_kind, entity_id, "cancelled")
    }

    pub fn is_cancelled(&self) -> bool {
        self.message == "cancelled"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_names_operation() {
        let err = EngineError::store(
            "channel_effectiveness",
            StoreError::query("activities_by_project", "connection reset"),
        );
        assert!(err.to_string().contains("channel_effectiveness"));
    }

    #[test]
    fn cancelled_failure_round_trips() {
        let failure =
            SubComputationFailure::cancelled("derived_metrics", EntityKind::Asset, "as-9");
        assert!(failure.is_cancelled());
        assert_eq!(failure.entity_id, "as-9");
    }
}
