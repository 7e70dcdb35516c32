//! Config validation: deep schema checks with user-friendly error messages.

use crate::schema::{BackendConfig, MemswarmConfig};
use thiserror::Error;

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// A collection of validation errors found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &MemswarmConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_logging(config, &mut report);
    validate_memory(config, &mut report);
    validate_rerank(config, &mut report);
    report
}

fn validate_logging(config: &MemswarmConfig, report: &mut ValidationReport) {
    let Some(logging) = &config.logging else { return };
    if let Some(level) = &logging.level {
        if level.trim().is_empty() {
            report.error("logging.level", "Log level cannot be empty");
        }
    }
}

fn validate_memory(config: &MemswarmConfig, report: &mut ValidationReport) {
    let Some(memory) = &config.memory else { return };
    for (name, backend) in [("cache", &memory.cache), ("backend", &memory.backend)] {
        if let Some(BackendConfig::Sqlite { path }) = backend {
            if path.trim().is_empty() {
                report.error(format!("memory.{name}.path"), "SQLite path cannot be empty");
            }
        }
    }
    if matches!(memory.cache, Some(BackendConfig::Sqlite { .. })) {
        report.warn("memory.cache", "Cache is durable; reads gain nothing over the backend");
    }
}

fn validate_rerank(config: &MemswarmConfig, report: &mut ValidationReport) {
    let Some(rerank) = &config.rerank else { return };
    if let Some(threshold) = rerank.consensus_threshold {
        if !(threshold > 0.0 && threshold <= 1.0) {
            report.error(
                "rerank.consensusThreshold",
                format!("Consensus threshold must be in (0, 1], got {threshold}"),
            );
        }
    }
    if rerank.agent_timeout_ms == Some(0) {
        report.error("rerank.agentTimeoutMs", "Agent timeout must be positive");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{MemoryConfig, RerankConfig};

    #[test]
    fn empty_config_is_valid() {
        let report = validate(&MemswarmConfig::default());
        assert!(report.is_valid(), "errors: {:?}", report.errors);
    }

    #[test]
    fn threshold_out_of_range_is_error() {
        for bad in [0.0, -0.5, 1.01, f64::NAN] {
            let cfg = MemswarmConfig {
                rerank: Some(RerankConfig {
                    consensus_threshold: Some(bad),
                    ..Default::default()
                }),
                ..Default::default()
            };
            let report = validate(&cfg);
            assert!(!report.is_valid(), "threshold {bad} accepted");
            assert_eq!(report.errors[0].path, "rerank.consensusThreshold");
        }
    }

    #[test]
    fn zero_timeout_and_empty_path_are_errors() {
        let cfg = MemswarmConfig {
            memory: Some(MemoryConfig {
                cache: None,
                backend: Some(BackendConfig::Sqlite { path: "  ".into() }),
            }),
            rerank: Some(RerankConfig {
                agent_timeout_ms: Some(0),
                ..Default::default()
            }),
            ..Default::default()
        };
        let report = validate(&cfg);
        assert_eq!(report.errors.len(), 2);
        assert!(report.errors.iter().any(|e| e.path == "memory.backend.path"));
    }

    #[test]
    fn durable_cache_is_warning() {
        let cfg = MemswarmConfig {
            memory: Some(MemoryConfig {
                cache: Some(BackendConfig::Sqlite { path: "cache.db".into() }),
                backend: None,
            }),
            ..Default::default()
        };
        let report = validate(&cfg);
        assert!(report.is_valid());
        assert_eq!(report.warnings.len(), 1);
    }
}
