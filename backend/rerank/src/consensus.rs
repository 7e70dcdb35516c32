//! Consensus reranking across independent agents.
//!
//! Every agent scores the same document set. A document survives when the
//! fraction of agents that scored it reaches the consensus threshold; its
//! final score is the mean of the scores it received. Documents are keyed by
//! `text`, so identical texts collapse into one.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use memswarm_config::defaults::DEFAULT_CONSENSUS_THRESHOLD;
use memswarm_config::{DuplicateScorePolicy, RerankConfig};
use memswarm_core::{Document, MemswarmError, RerankingAgent, ScoredDocument};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct ConsensusSettings {
    /// Minimum fraction of agents that must score a document, in (0, 1].
    pub threshold: f64,
    /// An agent exceeding this counts as having scored nothing.
    pub agent_timeout: Option<Duration>,
    pub duplicates: DuplicateScorePolicy,
}

impl Default for ConsensusSettings {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_CONSENSUS_THRESHOLD,
            agent_timeout: None,
            duplicates: DuplicateScorePolicy::CountEach,
        }
    }
}

impl From<&RerankConfig> for ConsensusSettings {
    fn from(config: &RerankConfig) -> Self {
        Self {
            threshold: config.consensus_threshold.unwrap_or(DEFAULT_CONSENSUS_THRESHOLD),
            agent_timeout: config.agent_timeout_ms.map(Duration::from_millis),
            duplicates: config.duplicate_scores.unwrap_or_default(),
        }
    }
}

pub struct MultiAgentRerankingWorkflow {
    agents: Vec<Arc<dyn RerankingAgent>>,
    settings: ConsensusSettings,
}

impl MultiAgentRerankingWorkflow {
    /// Fails with `InvalidConfiguration` for an empty agent list or a
    /// threshold outside (0, 1].
    pub fn new(
        agents: Vec<Arc<dyn RerankingAgent>>,
        settings: ConsensusSettings,
    ) -> Result<Self, MemswarmError> {
        if agents.is_empty() {
            return Err(MemswarmError::InvalidConfiguration(
                "multi-agent reranking needs at least one agent".into(),
            ));
        }
        if !(settings.threshold > 0.0 && settings.threshold <= 1.0) {
            return Err(MemswarmError::InvalidConfiguration(format!(
                "consensus threshold must be in (0, 1], got {}",
                settings.threshold
            )));
        }
        if settings.agent_timeout == Some(Duration::ZERO) {
            return Err(MemswarmError::InvalidConfiguration(
                "agent timeout must be positive".into(),
            ));
        }
        Ok(Self { agents, settings })
    }

    pub fn with_threshold(
        agents: Vec<Arc<dyn RerankingAgent>>,
        threshold: f64,
    ) -> Result<Self, MemswarmError> {
        Self::new(
            agents,
            ConsensusSettings {
                threshold,
                ..Default::default()
            },
        )
    }

    pub fn from_config(
        agents: Vec<Arc<dyn RerankingAgent>>,
        config: &RerankConfig,
    ) -> Result<Self, MemswarmError> {
        Self::new(agents, ConsensusSettings::from(config))
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    pub fn settings(&self) -> &ConsensusSettings {
        &self.settings
    }

    /// Aggregate every agent's scores into one ranking.
    ///
    /// Agents run concurrently. Ties keep input document order.
    pub async fn rerank(&self, documents: &[Document]) -> Result<Vec<ScoredDocument>, MemswarmError> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        let mut order: Vec<&str> = Vec::with_capacity(documents.len());
        let mut scores: HashMap<&str, Vec<f64>> = HashMap::with_capacity(documents.len());
        for doc in documents {
            if !scores.contains_key(doc.text.as_str()) {
                order.push(doc.text.as_str());
                scores.insert(doc.text.as_str(), Vec::new());
            }
        }

        let outcomes = join_all(
            self.agents
                .iter()
                .map(|agent| self.invoke(agent.as_ref(), documents)),
        )
        .await;

        for (agent, outcome) in self.agents.iter().zip(outcomes) {
            let mut seen: HashSet<String> = HashSet::new();
            let mut ignored = 0usize;
            let mut non_finite = 0usize;
            for scored in outcome? {
                let Some(list) = scores.get_mut(scored.text.as_str()) else {
                    ignored += 1;
                    continue;
                };
                if !scored.score.is_finite() {
                    non_finite += 1;
                    continue;
                }
                if self.settings.duplicates == DuplicateScorePolicy::FirstPerAgent
                    && !seen.insert(scored.text.clone())
                {
                    continue;
                }
                list.push(scored.score);
            }
            if ignored > 0 {
                warn!(agent = agent.name(), ignored, "Agent scored texts that were not in the input");
            }
            if non_finite > 0 {
                warn!(agent = agent.name(), non_finite, "Dropped non-finite scores");
            }
        }

        let total = self.agents.len() as f64;
        let mut ranked: Vec<ScoredDocument> = order
            .into_iter()
            .filter_map(|text| {
                let received = &scores[text];
                let coverage = received.len() as f64 / total;
                if received.is_empty() || coverage < self.settings.threshold {
                    debug!(text, coverage, "Dropped below consensus");
                    return None;
                }
                let mean = received.iter().sum::<f64>() / received.len() as f64;
                Some(ScoredDocument::new(text, mean))
            })
            .collect();

        // Stable: equal scores keep input order.
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        Ok(ranked)
    }

    async fn invoke(
        &self,
        agent: &dyn RerankingAgent,
        documents: &[Document],
    ) -> Result<Vec<ScoredDocument>, MemswarmError> {
        let outcome = match self.settings.agent_timeout {
            Some(limit) => match tokio::time::timeout(limit, agent.rerank(documents)).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    warn!(
                        agent = agent.name(),
                        timeout_ms = limit.as_millis() as u64,
                        "Reranking agent timed out; counting it as scoring nothing"
                    );
                    return Ok(Vec::new());
                }
            },
            None => agent.rerank(documents).await,
        };
        outcome.map_err(|e| MemswarmError::AgentFailed {
            agent: agent.name().to_string(),
            message: format!("{e:#}"),
        })
    }
}
