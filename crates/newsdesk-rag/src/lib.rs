//! Retrieval-augmented newsletter generation for newsdesk.
//!
//! Stores fetched market records as embedded documents, retrieves the
//! nearest ones per domain, summarizes them with a chat model, composes a
//! newsletter, and scores how well the newsletter is supported by its
//! context.

pub mod bootstrap;
pub mod chat;
pub mod controller;
pub mod embeddings;
pub mod error;
pub mod pipeline;
pub mod scorer;
pub mod similarity;
pub mod sources;
pub mod summarizer;
pub mod types;
pub mod vector_store;

mod http;

pub use bootstrap::build_pipeline;
pub use chat::{ChatMessage, ChatModel, OpenAiChat};
pub use controller::{RunController, RunHandle, RunOutcome};
pub use embeddings::{Embedder, OpenAiEmbedder};
pub use error::{Failure, RagError};
pub use pipeline::{Pipeline, PipelineOptions, PipelineServices};
pub use scorer::{
    percent_score, AccuracyReport, AccuracyScorer, CosineScorer, FactCheckScorer, ScoringMethod,
};
pub use similarity::cosine_similarity;
pub use sources::{AlphaVantageSource, MarketSource};
pub use summarizer::{Draft, Summarizer, SummaryRole, COMPOSE_SENTINEL, SUMMARY_SENTINEL};
pub use types::{
    Domain, IngestReport, NewsletterRun, RetrievalResult, RunReport, RunState, Stage,
    StageFailure, StatusLevel, StatusLine, FALLBACK_NEWSLETTER,
};
pub use vector_store::{AddRequest, DocumentStore, LocalStore, QdrantStore, QueryInput};
