use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

impl Environment {
    /// Whether log output should carry ANSI colours and targets.
    /// Production logs go to collectors as plain lines.
    #[must_use]
    pub fn decorated_logs(&self) -> bool {
        !matches!(self, Environment::Production)
    }
}

/// Which vector store backs the document collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorBackend {
    /// In-process collections persisted as a JSON file.
    Local,
    /// Remote Qdrant instance over HTTP.
    Qdrant,
}

/// Which accuracy scorer the pipeline uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScorerChoice {
    /// Fact-check provider when a key is configured, cosine otherwise.
    Auto,
    FactCheck,
    Cosine,
}

/// What the accuracy scorer compares the newsletter against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccuracyContext {
    /// The raw retrieved document texts of both domains.
    #[default]
    Retrieved,
    /// The company, market and risk summaries.
    Summaries,
    /// Retrieved texts followed by the summaries.
    Both,
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub alpha_vantage_api_key: String,
    pub alpha_vantage_url: String,
    pub openai_api_key: String,
    pub openai_url: String,
    pub chat_model: String,
    pub embedding_model: String,
    pub embedding_dim: usize,
    pub bespoke_api_key: Option<String>,
    pub bespoke_url: String,
    pub scorer: ScorerChoice,
    pub vector_backend: VectorBackend,
    pub store_path: PathBuf,
    pub qdrant_url: Option<String>,
    pub request_timeout_secs: u64,
    pub news_limit: u32,
    pub news_sort: String,
    pub top_k: usize,
    pub accuracy_context: AccuracyContext,
    pub parallel_branches: bool,
}

impl AppConfig {
    /// Resolve [`ScorerChoice::Auto`] against the presence of a fact-check key.
    #[must_use]
    pub fn effective_scorer(&self) -> ScorerChoice {
        match self.scorer {
            ScorerChoice::Auto if self.bespoke_api_key.is_some() => ScorerChoice::FactCheck,
            ScorerChoice::Auto => ScorerChoice::Cosine,
            other => other,
        }
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("alpha_vantage_api_key", &"[redacted]")
            .field("alpha_vantage_url", &self.alpha_vantage_url)
            .field("openai_api_key", &"[redacted]")
            .field("openai_url", &self.openai_url)
            .field("chat_model", &self.chat_model)
            .field("embedding_model", &self.embedding_model)
            .field("embedding_dim", &self.embedding_dim)
            .field(
                "bespoke_api_key",
                &self.bespoke_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("bespoke_url", &self.bespoke_url)
            .field("scorer", &self.scorer)
            .field("vector_backend", &self.vector_backend)
            .field("store_path", &self.store_path)
            .field("qdrant_url", &self.qdrant_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("news_limit", &self.news_limit)
            .field("news_sort", &self.news_sort)
            .field("top_k", &self.top_k)
            .field("accuracy_context", &self.accuracy_context)
            .field("parallel_branches", &self.parallel_branches)
            .finish()
    }
}
