//! Wires concrete clients from [`AppConfig`] into a [`Pipeline`].

use std::sync::Arc;
use std::time::Duration;

use newsdesk_core::{AppConfig, ScorerChoice, VectorBackend};
use newsdesk_market::AlphaVantageClient;

use crate::chat::OpenAiChat;
use crate::embeddings::{Embedder, OpenAiEmbedder};
use crate::error::RagError;
use crate::pipeline::{Pipeline, PipelineOptions, PipelineServices};
use crate::scorer::{AccuracyScorer, CosineScorer, FactCheckScorer};
use crate::sources::AlphaVantageSource;
use crate::vector_store::{DocumentStore, LocalStore, QdrantStore};

/// Build the production pipeline described by `config`.
///
/// # Errors
///
/// Returns [`RagError`] if an HTTP client cannot be constructed, the local
/// store file cannot be read, or a backend URL is missing.
pub async fn build_pipeline(config: &AppConfig) -> Result<Pipeline, RagError> {
    let timeout = config.request_timeout_secs;

    let market = AlphaVantageClient::with_base_url(
        &config.alpha_vantage_api_key,
        timeout,
        &config.alpha_vantage_url,
    )?;
    let source = AlphaVantageSource::new(
        market,
        Some(config.news_limit),
        Some(config.news_sort.clone()),
    );

    let embedder: Arc<dyn Embedder> = Arc::new(OpenAiEmbedder::new(
        &config.openai_url,
        &config.openai_api_key,
        &config.embedding_model,
        config.embedding_dim,
        timeout,
    )?);

    let store: Arc<dyn DocumentStore> = match config.vector_backend {
        VectorBackend::Local => {
            Arc::new(LocalStore::open(Arc::clone(&embedder), &config.store_path).await?)
        }
        VectorBackend::Qdrant => {
            let url = config
                .qdrant_url
                .as_deref()
                .ok_or(RagError::MissingSetting("NEWSDESK_QDRANT_URL"))?;
            Arc::new(QdrantStore::new(url, Arc::clone(&embedder), timeout)?)
        }
    };

    let scorer: Arc<dyn AccuracyScorer> = match (config.effective_scorer(), &config.bespoke_api_key) {
        (ScorerChoice::FactCheck, Some(key)) => {
            Arc::new(FactCheckScorer::new(&config.bespoke_url, key, timeout)?)
        }
        _ => Arc::new(CosineScorer::new(
            Arc::clone(&embedder),
            Duration::from_secs(timeout),
        )),
    };

    let chat = Arc::new(OpenAiChat::new(
        &config.openai_url,
        &config.openai_api_key,
        &config.chat_model,
        timeout,
    )?);

    tracing::info!(
        backend = ?config.vector_backend,
        scorer = ?config.effective_scorer(),
        chat_model = %config.chat_model,
        "pipeline configured"
    );

    Ok(Pipeline::new(
        PipelineServices {
            source: Arc::new(source),
            store,
            chat,
            scorer,
        },
        PipelineOptions::from_config(config),
    ))
}
