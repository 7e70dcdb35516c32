//! Weighted-sum reranking: every agent contributes `weight * score` to each
//! document it scores. Nothing is filtered out.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use memswarm_core::{Document, MemswarmError, RerankingAgent, ScoredDocument};
use tracing::warn;

pub struct CombinedRerankingWorkflow {
    agents: Vec<Arc<dyn RerankingAgent>>,
    weights: Vec<f64>,
}

impl CombinedRerankingWorkflow {
    /// Without explicit weights every agent gets `1 / n`.
    pub fn new(
        agents: Vec<Arc<dyn RerankingAgent>>,
        weights: Option<Vec<f64>>,
    ) -> Result<Self, MemswarmError> {
        if agents.is_empty() {
            return Err(MemswarmError::InvalidConfiguration(
                "combined reranking needs at least one agent".into(),
            ));
        }
        let weights = match weights {
            Some(weights) if weights.len() != agents.len() => {
                return Err(MemswarmError::InvalidConfiguration(format!(
                    "{} weights given for {} agents",
                    weights.len(),
                    agents.len()
                )));
            }
            Some(weights) => {
                if let Some(bad) = weights.iter().find(|w| !w.is_finite()) {
                    return Err(MemswarmError::InvalidConfiguration(format!(
                        "agent weight must be finite, got {bad}"
                    )));
                }
                weights
            }
            None => vec![1.0 / agents.len() as f64; agents.len()],
        };
        Ok(Self { agents, weights })
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub async fn rerank(&self, documents: &[Document]) -> Result<Vec<ScoredDocument>, MemswarmError> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        let mut order: Vec<&str> = Vec::with_capacity(documents.len());
        let mut totals: HashMap<&str, f64> = HashMap::with_capacity(documents.len());
        for doc in documents {
            if !totals.contains_key(doc.text.as_str()) {
                order.push(doc.text.as_str());
                totals.insert(doc.text.as_str(), 0.0);
            }
        }

        let outcomes = join_all(self.agents.iter().map(|agent| agent.rerank(documents))).await;

        for ((agent, weight), outcome) in self.agents.iter().zip(&self.weights).zip(outcomes) {
            let scored = outcome.map_err(|e| MemswarmError::AgentFailed {
                agent: agent.name().to_string(),
                message: format!("{e:#}"),
            })?;
            for doc in scored {
                match totals.get_mut(doc.text.as_str()) {
                    Some(_) if !doc.score.is_finite() => {
                        warn!(agent = agent.name(), score = doc.score, "Ignoring non-finite score")
                    }
                    Some(total) => *total += weight * doc.score,
                    None => warn!(agent = agent.name(), "Ignoring score for unknown text"),
                }
            }
        }

        let mut ranked: Vec<ScoredDocument> = order
            .into_iter()
            .map(|text| ScoredDocument::new(text, totals[text]))
            .collect();
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        Ok(ranked)
    }
}
