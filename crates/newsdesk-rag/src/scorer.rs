//! Accuracy scoring: how well a newsletter is supported by its context.
//!
//! Both strategies return an [`AccuracyReport`] instead of an error; a
//! failure yields score 0 with the reason attached.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use newsdesk_core::ErrorKind;
use serde::{Deserialize, Serialize};

use crate::embeddings::Embedder;
use crate::error::{Failure, RagError};
use crate::http::{build_client, join_url, send_json, with_deadline};
use crate::similarity::cosine_similarity;

const FACTCHECK_SERVICE: &str = "bespoke factcheck";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMethod {
    FactCheck,
    Cosine,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccuracyReport {
    /// Percentage in `[0, 100]`, two decimals.
    pub score: f64,
    pub method: ScoringMethod,
    pub failure: Option<Failure>,
}

impl AccuracyReport {
    #[must_use]
    pub fn scored(method: ScoringMethod, score: f64) -> Self {
        Self {
            score,
            method,
            failure: None,
        }
    }

    #[must_use]
    pub fn zero(method: ScoringMethod, failure: Failure) -> Self {
        Self {
            score: 0.0,
            method,
            failure: Some(failure),
        }
    }
}

/// Probability (or mean similarity) to a clamped two-decimal percentage.
///
/// Non-finite input scores 0.
#[must_use]
pub fn percent_score(p: f64) -> f64 {
    if !p.is_finite() {
        return 0.0;
    }
    let pct = (p * 100.0).clamp(0.0, 100.0);
    (pct * 100.0).round() / 100.0
}

#[async_trait]
pub trait AccuracyScorer: Send + Sync {
    async fn score(&self, claim: &str, context: &[String]) -> AccuracyReport;

    fn method(&self) -> ScoringMethod;
}

/// Delegates to the Bespoke Labs minicheck fact-check endpoint.
pub struct FactCheckScorer {
    client: reqwest::Client,
    url: String,
    api_key: String,
    call_timeout: Duration,
}

#[derive(Serialize)]
struct FactCheckRequest<'a> {
    claim: &'a str,
    context: String,
}

#[derive(Deserialize)]
struct FactCheckResponse {
    #[serde(default)]
    support_prob: Option<f64>,
}

impl FactCheckScorer {
    /// # Errors
    ///
    /// Returns [`RagError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(base_url: &str, api_key: &str, timeout_secs: u64) -> Result<Self, RagError> {
        Ok(Self {
            client: build_client(timeout_secs)?,
            url: join_url(base_url, "v0/minicheck/factcheck"),
            api_key: api_key.to_owned(),
            call_timeout: Duration::from_secs(timeout_secs),
        })
    }

    async fn support_prob(&self, claim: &str, context: &[String]) -> Result<f64, RagError> {
        let request = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&FactCheckRequest {
                claim,
                context: context.join("\n"),
            });
        let response: FactCheckResponse = with_deadline(
            FACTCHECK_SERVICE,
            self.call_timeout,
            send_json(request, FACTCHECK_SERVICE),
        )
        .await?;

        response.support_prob.ok_or_else(|| RagError::Malformed {
            service: FACTCHECK_SERVICE,
            reason: "response has no support_prob".to_string(),
        })
    }
}

#[async_trait]
impl AccuracyScorer for FactCheckScorer {
    async fn score(&self, claim: &str, context: &[String]) -> AccuracyReport {
        match self.support_prob(claim, context).await {
            Ok(p) => {
                let score = percent_score(p);
                tracing::debug!(support_prob = p, score, "fact-check scored");
                AccuracyReport::scored(ScoringMethod::FactCheck, score)
            }
            Err(e) => {
                tracing::warn!(error = %e, kind = ?e.kind(), "fact-check scoring failed");
                AccuracyReport::zero(ScoringMethod::FactCheck, Failure::from(&e))
            }
        }
    }

    fn method(&self) -> ScoringMethod {
        ScoringMethod::FactCheck
    }
}

/// Mean cosine similarity between the newsletter and each context item.
pub struct CosineScorer {
    embedder: Arc<dyn Embedder>,
    call_timeout: Duration,
}

impl CosineScorer {
    #[must_use]
    pub fn new(embedder: Arc<dyn Embedder>, call_timeout: Duration) -> Self {
        Self {
            embedder,
            call_timeout,
        }
    }

    async fn mean_similarity(&self, claim: &str, context: &[String]) -> Result<f64, RagError> {
        let mut texts = Vec::with_capacity(context.len() + 1);
        texts.push(claim.to_string());
        texts.extend(context.iter().cloned());

        let vectors = with_deadline(
            "openai embeddings",
            self.call_timeout,
            self.embedder.embed(&texts),
        )
        .await?;
        if vectors.len() != texts.len() {
            return Err(RagError::Malformed {
                service: "openai embeddings",
                reason: format!(
                    "expected {} embeddings, got {}",
                    texts.len(),
                    vectors.len()
                ),
            });
        }
        let Some((claim_vec, context_vecs)) = vectors.split_first() else {
            return Err(RagError::Malformed {
                service: "openai embeddings",
                reason: "no embedding for the newsletter".to_string(),
            });
        };

        #[allow(clippy::cast_precision_loss)]
        let mean = context_vecs
            .iter()
            .map(|v| cosine_similarity(claim_vec, v))
            .sum::<f64>()
            / context_vecs.len() as f64;
        Ok(mean)
    }
}

#[async_trait]
impl AccuracyScorer for CosineScorer {
    async fn score(&self, claim: &str, context: &[String]) -> AccuracyReport {
        if context.is_empty() {
            return AccuracyReport::zero(
                ScoringMethod::Cosine,
                Failure::new(ErrorKind::Unknown, "no context to compare against"),
            );
        }
        match self.mean_similarity(claim, context).await {
            Ok(mean) => {
                let score = percent_score(mean);
                tracing::debug!(mean, score, items = context.len(), "cosine scored");
                AccuracyReport::scored(ScoringMethod::Cosine, score)
            }
            Err(e) => {
                tracing::warn!(error = %e, kind = ?e.kind(), "cosine scoring failed");
                AccuracyReport::zero(ScoringMethod::Cosine, Failure::from(&e))
            }
        }
    }

    fn method(&self) -> ScoringMethod {
        ScoringMethod::Cosine
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AxisEmbedder;

    #[async_trait]
    impl Embedder for AxisEmbedder {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
            Ok(texts
                .iter()
                .map(|t| match t.as_str() {
                    "x" => vec![1.0, 0.0],
                    "y" => vec![0.0, 1.0],
                    "-x" => vec![-1.0, 0.0],
                    _ => vec![0.0, 0.0],
                })
                .collect())
        }

        fn dimension(&self) -> usize {
            2
        }
    }

    struct BrokenEmbedder;

    #[async_trait]
    impl Embedder for BrokenEmbedder {
        async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
            Err(RagError::Quota {
                service: "openai embeddings",
                message: "insufficient_quota".into(),
            })
        }

        fn dimension(&self) -> usize {
            2
        }
    }

    /// Returns one vector no matter how many texts it is given.
    struct ShortEmbedder;

    #[async_trait]
    impl Embedder for ShortEmbedder {
        async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
            Ok(vec![vec![1.0, 0.0]])
        }

        fn dimension(&self) -> usize {
            2
        }
    }

    fn cosine(embedder: Arc<dyn Embedder>) -> CosineScorer {
        CosineScorer::new(embedder, Duration::from_secs(5))
    }

    #[test]
    fn percent_score_rounds_to_two_decimals() {
        assert!((percent_score(0.873) - 87.3).abs() < 1e-9);
        assert!((percent_score(0.123_456) - 12.35).abs() < 1e-9);
    }

    #[test]
    fn percent_score_is_clamped() {
        assert!((percent_score(1.7) - 100.0).abs() < f64::EPSILON);
        assert!(percent_score(-0.4).abs() < f64::EPSILON);
        assert!(percent_score(f64::NAN).abs() < f64::EPSILON);
        assert!(percent_score(f64::INFINITY).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn identical_context_scores_full() {
        let report = cosine(Arc::new(AxisEmbedder))
            .score("x", &["x".to_string()])
            .await;
        assert!((report.score - 100.0).abs() < 1e-9);
        assert!(report.failure.is_none());
    }

    #[tokio::test]
    async fn mean_is_taken_over_context_items() {
        let report = cosine(Arc::new(AxisEmbedder))
            .score("x", &["x".to_string(), "y".to_string()])
            .await;
        assert!((report.score - 50.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn negative_similarity_clamps_to_zero() {
        let report = cosine(Arc::new(AxisEmbedder))
            .score("x", &["-x".to_string()])
            .await;
        assert!(report.score.abs() < f64::EPSILON);
        assert!(report.failure.is_none());
    }

    #[tokio::test]
    async fn empty_context_scores_zero_with_reason() {
        let report = cosine(Arc::new(AxisEmbedder)).score("x", &[]).await;
        assert!(report.score.abs() < f64::EPSILON);
        assert!(report.failure.is_some());
    }

    #[tokio::test]
    async fn embedder_failure_scores_zero_with_kind() {
        let report = cosine(Arc::new(BrokenEmbedder))
            .score("x", &["x".to_string()])
            .await;
        assert!(report.score.abs() < f64::EPSILON);
        assert_eq!(report.failure.unwrap().kind, ErrorKind::ProviderQuota);
        assert_eq!(report.method, ScoringMethod::Cosine);
    }

    #[tokio::test]
    async fn short_embedding_batch_scores_zero_with_reason() {
        let report = cosine(Arc::new(ShortEmbedder))
            .score("claim", &["ctx".to_string()])
            .await;
        assert!(report.score.abs() < f64::EPSILON);
        let failure = report.failure.expect("count mismatch is reported");
        assert_eq!(failure.kind, ErrorKind::MalformedResponse);
        assert!(failure.message.contains("expected 2 embeddings, got 1"));
    }
}
