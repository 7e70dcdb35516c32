//! Config defaults: fills unset fields of a freshly loaded config.

use crate::schema::{
    BackendConfig, DuplicateScorePolicy, LoggingConfig, MemoryConfig, MemswarmConfig,
    RerankConfig,
};

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Default consensus threshold for multi-agent reranking.
pub const DEFAULT_CONSENSUS_THRESHOLD: f64 = 0.5;

/// Apply all defaults to a freshly loaded config.
pub fn apply_all_defaults(config: MemswarmConfig) -> MemswarmConfig {
    let config = apply_logging_defaults(config);
    let config = apply_memory_defaults(config);
    apply_rerank_defaults(config)
}

fn apply_logging_defaults(mut config: MemswarmConfig) -> MemswarmConfig {
    let logging = config.logging.get_or_insert_with(LoggingConfig::default);
    if logging.level.is_none() {
        logging.level = Some(DEFAULT_LOG_LEVEL.to_string());
    }
    config
}

/// Both sides default to in-memory so a bare config never touches disk.
fn apply_memory_defaults(mut config: MemswarmConfig) -> MemswarmConfig {
    let memory = config.memory.get_or_insert_with(MemoryConfig::default);
    memory.cache.get_or_insert(BackendConfig::InMemory);
    memory.backend.get_or_insert(BackendConfig::InMemory);
    config
}

/// No timeout by default: agents are awaited until they finish.
fn apply_rerank_defaults(mut config: MemswarmConfig) -> MemswarmConfig {
    let rerank = config.rerank.get_or_insert_with(RerankConfig::default);
    rerank.consensus_threshold.get_or_insert(DEFAULT_CONSENSUS_THRESHOLD);
    rerank.duplicate_scores.get_or_insert(DuplicateScorePolicy::CountEach);
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_empty_config() {
        let config = apply_all_defaults(MemswarmConfig::default());
        assert_eq!(config.logging.unwrap().level.as_deref(), Some("info"));
        let memory = config.memory.unwrap();
        assert_eq!(memory.cache, Some(BackendConfig::InMemory));
        assert_eq!(memory.backend, Some(BackendConfig::InMemory));
        let rerank = config.rerank.unwrap();
        assert_eq!(rerank.consensus_threshold, Some(DEFAULT_CONSENSUS_THRESHOLD));
        assert_eq!(rerank.agent_timeout_ms, None);
    }

    #[test]
    fn keeps_explicit_values() {
        let config = MemswarmConfig {
            memory: Some(MemoryConfig {
                cache: None,
                backend: Some(BackendConfig::Sqlite { path: "m.db".into() }),
            }),
            rerank: Some(RerankConfig {
                consensus_threshold: Some(0.9),
                ..Default::default()
            }),
            ..Default::default()
        };
        let config = apply_all_defaults(config);
        let memory = config.memory.unwrap();
        assert_eq!(memory.cache, Some(BackendConfig::InMemory));
        assert_eq!(memory.backend, Some(BackendConfig::Sqlite { path: "m.db".into() }));
        assert_eq!(config.rerank.unwrap().consensus_threshold, Some(0.9));
    }
}
