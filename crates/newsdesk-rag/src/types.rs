use chrono::{DateTime, Utc};
use newsdesk_core::MarketRecord;
use serde::Serialize;
use uuid::Uuid;

use crate::error::Failure;
use crate::scorer::AccuracyReport;
use crate::summarizer::{Draft, SummaryRole};

/// Emitted instead of a composed newsletter when there is nothing to compose from.
pub const FALLBACK_NEWSLETTER: &str =
    "No relevant data found. Fetch and store market data, then try again.";

/// The two independent data branches of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Company,
    Market,
}

impl Domain {
    pub const ALL: [Domain; 2] = [Domain::Company, Domain::Market];

    #[must_use]
    pub fn collection(self) -> &'static str {
        match self {
            Self::Company => "news_collection",
            Self::Market => "trends_collection",
        }
    }

    /// Free-text retrieval query for the domain's collection.
    #[must_use]
    pub fn query(self) -> &'static str {
        match self {
            Self::Company => "latest company news",
            Self::Market => "latest market trends",
        }
    }

    #[must_use]
    pub fn role(self) -> SummaryRole {
        match self {
            Self::Company => SummaryRole::CompanyInsights,
            Self::Market => SummaryRole::MarketTrends,
        }
    }

    /// Summary text used when this domain retrieved nothing but the other did.
    #[must_use]
    pub fn empty_placeholder(self) -> &'static str {
        match self {
            Self::Company => "No company insights available.",
            Self::Market => "No market trends available.",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Company => "company",
            Self::Market => "market",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Fetch,
    Store,
    Retrieve,
    Summarize,
    Risk,
    Compose,
    Score,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Fetch => "fetch",
            Self::Store => "store",
            Self::Retrieve => "retrieve",
            Self::Summarize => "summarize",
            Self::Risk => "risk",
            Self::Compose => "compose",
            Self::Score => "score",
        };
        f.write_str(s)
    }
}

/// A branch result tagged with where it came from.
///
/// Branches may finish in any order; the orchestrator routes on
/// `(domain, stage)` rather than on arrival order.
#[derive(Debug, Clone)]
pub struct StageMessage {
    pub domain: Domain,
    pub stage: Stage,
    pub outcome: StageOutcome,
}

#[derive(Debug, Clone)]
pub enum StageOutcome {
    Fetched(Vec<MarketRecord>),
    Stored(usize),
    Retrieved(RetrievalResult),
    Summarized(Draft),
    Failed(Failure),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievedRecord {
    pub id: String,
    pub record: MarketRecord,
    pub text: String,
    pub similarity: f64,
}

/// Records relevant to a query, nearest first, at most top-k long.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RetrievalResult {
    pub query: String,
    pub hits: Vec<RetrievedRecord>,
}

impl RetrievalResult {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    #[must_use]
    pub fn texts(&self) -> Vec<String> {
        self.hits.iter().map(|h| h.text.clone()).collect()
    }

    /// Hit texts joined one per line, as handed to the summarizer.
    #[must_use]
    pub fn joined(&self) -> String {
        self.hits
            .iter()
            .map(|h| h.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusLevel {
    Info,
    Success,
    Error,
}

/// Operator-facing progress line, separate from tracing output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusLine {
    pub level: StatusLevel,
    pub message: String,
}

impl StatusLine {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Error,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for StatusLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self.level {
            StatusLevel::Info => "info",
            StatusLevel::Success => "ok",
            StatusLevel::Error => "error",
        };
        write!(f, "[{tag}] {}", self.message)
    }
}

/// Per-domain outcome of FETCH and STORE.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DomainIngest {
    pub fetched: usize,
    pub stored: usize,
    pub failure: Option<Failure>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IngestReport {
    pub company: DomainIngest,
    pub market: DomainIngest,
    pub status: Vec<StatusLine>,
}

impl IngestReport {
    pub(crate) fn domain_mut(&mut self, domain: Domain) -> &mut DomainIngest {
        match domain {
            Domain::Company => &mut self.company,
            Domain::Market => &mut self.market,
        }
    }

    #[must_use]
    pub fn total_fetched(&self) -> usize {
        self.company.fetched + self.market.fetched
    }

    #[must_use]
    pub fn total_stored(&self) -> usize {
        self.company.stored + self.market.stored
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunState {
    Completed,
    /// Terminal degraded state: placeholder newsletter, score 0.
    Fallback { stage: Stage, reason: String },
}

/// A stage that failed without ending the run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageFailure {
    pub stage: Stage,
    /// `None` for the joined stages after both branches.
    pub domain: Option<Domain>,
    pub failure: Failure,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summaries {
    pub company: String,
    pub market: String,
    pub risk: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewsletterRun {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub state: RunState,
    pub newsletter: String,
    pub accuracy: AccuracyReport,
    pub company: RetrievalResult,
    pub market: RetrievalResult,
    pub summaries: Summaries,
    pub degraded: Vec<StageFailure>,
    pub status: Vec<StatusLine>,
}

impl NewsletterRun {
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        matches!(self.state, RunState::Fallback { .. })
    }
}

/// Ingest followed by generate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub ingest: IngestReport,
    pub newsletter: NewsletterRun,
}
