use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Which side of a hybrid memory an adapter sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterRole {
    Cache,
    Backend,
}

impl fmt::Display for AdapterRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdapterRole::Cache => f.write_str("cache"),
            AdapterRole::Backend => f.write_str("backend"),
        }
    }
}

/// Adapter operation that was in flight when a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Read,
    Write,
    Delete,
    Clear,
    Keys,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operation::Read => "read",
            Operation::Write => "write",
            Operation::Delete => "delete",
            Operation::Clear => "clear",
            Operation::Keys => "keys",
        };
        f.write_str(s)
    }
}

/// Top-level error type for memswarm.
#[derive(Debug, Error)]
pub enum MemswarmError {
    /// An adapter failed. `applied` names the adapter that had already applied
    /// the change when the failure happened; it is not rolled back.
    #[error("{adapter} adapter failed during {operation}{}: {message}", partial_note(.applied))]
    BackendUnavailable {
        adapter: AdapterRole,
        operation: Operation,
        applied: Option<AdapterRole>,
        message: String,
    },

    #[error("scope query must name at least one of agent_id, group_id or context_id")]
    AmbiguousScopeQuery,

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("key not found: {0}")]
    KeyNotFound(String),

    #[error("corrupt entry at key {key}: {message}")]
    CorruptEntry { key: String, message: String },

    #[error("reranking agent {agent} failed: {message}")]
    AgentFailed { agent: String, message: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn partial_note(applied: &Option<AdapterRole>) -> String {
    match applied {
        Some(role) => format!(" (partially applied: {role} already holds the change)"),
        None => String::new(),
    }
}

impl MemswarmError {
    /// Wrap an adapter failure with the role and operation it happened in.
    pub fn adapter(
        adapter: AdapterRole,
        operation: Operation,
        applied: Option<AdapterRole>,
        err: &anyhow::Error,
    ) -> Self {
        MemswarmError::BackendUnavailable {
            adapter,
            operation,
            applied,
            message: format!("{err:#}"),
        }
    }

    /// True when the failure left one adapter holding a change the other lacks.
    pub fn is_partial(&self) -> bool {
        matches!(
            self,
            MemswarmError::BackendUnavailable { applied: Some(_), .. }
        )
    }
}
