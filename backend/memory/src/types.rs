use chrono::{DateTime, Utc};
use memswarm_core::Metadata;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Metadata field naming the agent that produced an entry.
pub const AGENT_ID_KEY: &str = "agent_id";
/// Metadata field naming the agent group an entry belongs to.
pub const GROUP_ID_KEY: &str = "group_id";

/// A stored unit of shared memory.
///
/// Scope ids are read from `metadata[agent_id]` and `metadata[group_id]`.
/// Numbers are compared by their decimal text, so `42` and `"42"` name the
/// same scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Unique within a backend.
    pub key: String,
    /// Opaque payload, usually text.
    pub value: Value,
    #[serde(default)]
    pub metadata: Metadata,
    /// Groups the entries produced in one interaction; not unique.
    pub context_id: String,
    pub created_at: DateTime<Utc>,
    /// Process-local write counter, breaks `created_at` ties on index rebuild.
    #[serde(default)]
    pub sequence: u64,
}

impl Entry {
    pub fn agent_id(&self) -> Option<String> {
        scope_field(&self.metadata, AGENT_ID_KEY)
    }

    pub fn group_id(&self) -> Option<String> {
        scope_field(&self.metadata, GROUP_ID_KEY)
    }
}

/// Scope ids may be stored as strings or numbers; anything else is not a scope.
fn scope_field(metadata: &Metadata, field: &str) -> Option<String> {
    match metadata.get(field)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// A filter over agent, group and context. Supplied fields are ANDed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_id: Option<String>,
}

impl ScopeQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn agent(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }

    pub fn group(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = Some(group_id.into());
        self
    }

    pub fn context(mut self, context_id: impl Into<String>) -> Self {
        self.context_id = Some(context_id.into());
        self
    }

    /// No dimension supplied.
    pub fn is_empty(&self) -> bool {
        self.agent_id.is_none() && self.group_id.is_none() && self.context_id.is_none()
    }
}

/// Convenience for building entry metadata from agent and group ids.
pub fn scope_metadata(agent_id: Option<&str>, group_id: Option<&str>) -> Metadata {
    let mut metadata = Metadata::new();
    if let Some(agent) = agent_id {
        metadata.insert(AGENT_ID_KEY.to_string(), Value::String(agent.to_string()));
    }
    if let Some(group) = group_id {
        metadata.insert(GROUP_ID_KEY.to_string(), Value::String(group.to_string()));
    }
    metadata
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_query_is_detected() {
        assert!(ScopeQuery::new().is_empty());
        assert!(!ScopeQuery::new().context("c1").is_empty());
    }

    #[test]
    fn entry_exposes_scope_fields() {
        let entry = Entry {
            key: "c1:1".into(),
            value: Value::String("hello".into()),
            metadata: scope_metadata(Some("A"), None),
            context_id: "c1".into(),
            created_at: Utc::now(),
            sequence: 0,
        };
        assert_eq!(entry.agent_id().as_deref(), Some("A"));
        assert_eq!(entry.group_id(), None);
    }

    #[test]
    fn numeric_ids_are_stringified() {
        let mut metadata = Metadata::new();
        metadata.insert(AGENT_ID_KEY.into(), serde_json::json!(42));
        metadata.insert(GROUP_ID_KEY.into(), serde_json::json!(["not", "a", "scope"]));
        let entry = Entry {
            key: "k".into(),
            value: Value::Null,
            metadata,
            context_id: "c".into(),
            created_at: Utc::now(),
            sequence: 0,
        };
        assert_eq!(entry.agent_id().as_deref(), Some("42"));
        assert_eq!(entry.group_id(), None);
    }
}
