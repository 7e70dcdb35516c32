//! Reranking workflows over a set of independent agents.
//!
//! - [`MultiAgentRerankingWorkflow`]: keep documents enough agents scored,
//!   rank them by mean score
//! - [`CombinedRerankingWorkflow`]: weighted sum of every agent's scores
//! - [`KeywordAgent`], [`MetadataAgent`]: small built-in agents

pub mod agents;
pub mod combined;
pub mod consensus;

pub use agents::{KeywordAgent, MetadataAgent};
pub use combined::CombinedRerankingWorkflow;
pub use consensus::{ConsensusSettings, MultiAgentRerankingWorkflow};

#[cfg(test)]
pub(crate) mod testing {
    use std::time::Duration;

    use anyhow::{bail, Result};
    use async_trait::async_trait;
    use memswarm_core::{Document, RerankingAgent, ScoredDocument};

    /// Returns a fixed list of scores regardless of input.
    pub struct ScriptedAgent {
        pub name: String,
        pub scores: Vec<(String, f64)>,
        pub delay: Option<Duration>,
        pub fail: bool,
    }

    impl ScriptedAgent {
        pub fn new(name: &str, scores: &[(&str, f64)]) -> Self {
            Self {
                name: name.to_string(),
                scores: scores.iter().map(|(t, s)| (t.to_string(), *s)).collect(),
                delay: None,
                fail: false,
            }
        }

        pub fn slow(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        pub fn failing(mut self) -> Self {
            self.fail = true;
            self
        }
    }

    #[async_trait]
    impl RerankingAgent for ScriptedAgent {
        fn name(&self) -> &str {
            &self.name
        }

        async fn rerank(&self, _documents: &[Document]) -> Result<Vec<ScoredDocument>> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail {
                bail!("model endpoint returned 503");
            }
            Ok(self
                .scores
                .iter()
                .map(|(text, score)| ScoredDocument::new(text.clone(), *score))
                .collect())
        }
    }

    pub fn docs(texts: &[&str]) -> Vec<Document> {
        texts.iter().map(|t| Document::new(*t)).collect()
    }
}
