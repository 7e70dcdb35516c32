//! Built-in agents that score documents locally, without a model call.

use anyhow::Result;
use async_trait::async_trait;
use memswarm_core::{Document, RerankingAgent, ScoredDocument};

const K1: f64 = 1.5;
const B: f64 = 0.75;

/// BM25 relevance of each document against a fixed query.
///
/// Document frequency is computed over the documents passed to a single
/// `rerank` call. Every document is scored, possibly with 0.0.
pub struct KeywordAgent {
    name: String,
    query_terms: Vec<String>,
}

impl KeywordAgent {
    pub fn new(query: &str) -> Self {
        Self {
            name: "keyword".to_string(),
            query_terms: tokenize(query),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    fn score_all(&self, documents: &[Document]) -> Vec<ScoredDocument> {
        let tokenized: Vec<Vec<String>> = documents.iter().map(|d| tokenize(&d.text)).collect();
        let total = tokenized.len() as f64;
        let avg_len = (tokenized.iter().map(Vec::len).sum::<usize>() as f64 / total).max(1.0);

        let idf: Vec<f64> = self
            .query_terms
            .iter()
            .map(|term| {
                let n = tokenized.iter().filter(|doc| doc.contains(term)).count() as f64;
                ((total - n + 0.5) / (n + 0.5) + 1.0).ln()
            })
            .collect();

        documents
            .iter()
            .zip(&tokenized)
            .map(|(doc, terms)| {
                let doc_len = terms.len() as f64;
                let score = self
                    .query_terms
                    .iter()
                    .zip(&idf)
                    .map(|(term, idf)| {
                        let tf = terms.iter().filter(|t| *t == term).count() as f64;
                        if tf == 0.0 {
                            return 0.0;
                        }
                        idf * tf * (K1 + 1.0) / (tf + K1 * (1.0 - B + B * doc_len / avg_len))
                    })
                    .sum();
                ScoredDocument::new(doc.text.clone(), score)
            })
            .collect()
    }
}

#[async_trait]
impl RerankingAgent for KeywordAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn rerank(&self, documents: &[Document]) -> Result<Vec<ScoredDocument>> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.score_all(documents))
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Scores each document by a numeric metadata field, higher values first.
///
/// Documents without the field, or with a non-numeric or non-finite value,
/// are left unscored.
pub struct MetadataAgent {
    name: String,
    field: String,
    ascending: bool,
}

impl MetadataAgent {
    pub fn new(field: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            name: format!("metadata:{field}"),
            field,
            ascending: false,
        }
    }

    /// Rank lower field values higher by negating them.
    pub fn ascending(mut self) -> Self {
        self.ascending = true;
        self
    }
}

#[async_trait]
impl RerankingAgent for MetadataAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn rerank(&self, documents: &[Document]) -> Result<Vec<ScoredDocument>> {
        Ok(documents
            .iter()
            .filter_map(|doc| {
                let value = doc.metadata.get(&self.field)?;
                let score: f64 = value
                    .as_f64()
                    .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
                    .filter(|score: &f64| score.is_finite())?;
                let score = if self.ascending { -score } else { score };
                Some(ScoredDocument::new(doc.text.clone(), score))
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::docs;
    use crate::MultiAgentRerankingWorkflow;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_keyword_agent_prefers_matching_documents() {
        let agent = KeywordAgent::new("Rust async");
        let scored = agent
            .rerank(&docs(&[
                "gardening notebooks",
                "async Rust runtimes: tokio and async-std",
                "Rust ownership",
            ]))
            .await
            .unwrap();

        assert_eq!(scored.len(), 3);
        assert_eq!(scored[0].score, 0.0);
        assert!(scored[1].score > scored[2].score);
        assert!(scored[2].score > 0.0);
    }

    #[tokio::test]
    async fn test_keyword_agent_empty_input() {
        let agent = KeywordAgent::new("anything").named("kw");
        assert_eq!(agent.name(), "kw");
        assert!(agent.rerank(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_metadata_agent_omits_missing_fields() {
        let agent = MetadataAgent::new("priority");
        let documents = vec![
            Document::new("a").with_metadata("priority", 3),
            Document::new("b"),
            Document::new("c").with_metadata("priority", "1.5"),
            Document::new("d").with_metadata("priority", "high"),
        ];
        let scored = agent.rerank(&documents).await.unwrap();
        assert_eq!(
            scored,
            vec![ScoredDocument::new("a", 3.0), ScoredDocument::new("c", 1.5)]
        );
    }

    #[tokio::test]
    async fn test_metadata_agent_skips_non_finite_values() {
        let agent = MetadataAgent::new("p");
        let documents = vec![
            Document::new("nan").with_metadata("p", "NaN"),
            Document::new("inf").with_metadata("p", "inf"),
            Document::new("neg").with_metadata("p", "-infinity"),
            Document::new("ok").with_metadata("p", 2),
        ];
        let scored = agent.rerank(&documents).await.unwrap();
        assert_eq!(scored, vec![ScoredDocument::new("ok", 2.0)]);
    }

    #[tokio::test]
    async fn test_metadata_agent_ascending() {
        let documents = vec![
            Document::new("late").with_metadata("age_days", 30),
            Document::new("fresh").with_metadata("age_days", 1),
        ];
        let workflow = MultiAgentRerankingWorkflow::with_threshold(
            vec![Arc::new(MetadataAgent::new("age_days").ascending()) as Arc<dyn RerankingAgent>],
            1.0,
        )
        .unwrap();

        let ranked = workflow.rerank(&documents).await.unwrap();
        let texts: Vec<_> = ranked.iter().map(|d| d.text.as_str()).collect();
        assert_eq!(texts, vec!["fresh", "late"]);
        assert_eq!(ranked[0].score, -1.0);
    }

    #[tokio::test]
    async fn test_metadata_values_rank_many_documents() {
        // Every third document carries an unusable value.
        let documents: Vec<Document> = (0..64)
            .map(|i| {
                let doc = Document::new(format!("doc {i}"));
                if i % 3 == 0 {
                    doc.with_metadata("p", "NaN")
                } else {
                    doc.with_metadata("p", i % 7)
                }
            })
            .collect();
        let workflow = MultiAgentRerankingWorkflow::with_threshold(
            vec![Arc::new(MetadataAgent::new("p")) as Arc<dyn RerankingAgent>],
            1.0,
        )
        .unwrap();

        let ranked = workflow.rerank(&documents).await.unwrap();
        assert_eq!(ranked.len(), 64 - 22);
        assert!(ranked.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[tokio::test]
    async fn test_builtin_agents_in_consensus() {
        let documents = vec![
            Document::new("rust memory cache").with_metadata("priority", 2),
            Document::new("gardening tips"),
        ];
        let workflow = MultiAgentRerankingWorkflow::with_threshold(
            vec![
                Arc::new(KeywordAgent::new("rust cache")) as Arc<dyn RerankingAgent>,
                Arc::new(MetadataAgent::new("priority")),
            ],
            1.0,
        )
        .unwrap();

        let ranked = workflow.rerank(&documents).await.unwrap();
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].text, "rust memory cache");
    }
}
