//! Pipeline orchestration.
//!
//! FETCH and STORE, then RETRIEVE and SUMMARIZE, run once per [`Domain`].
//! The two domain branches run as tasks in a `JoinSet` (or inline when
//! parallelism is off) and report through one channel as tagged
//! [`StageMessage`]s. The orchestrator waits for the channel to close,
//! which happens only after both branches finish, before moving on to
//! RISK, COMPOSE and SCORE.
//!
//! No stage returns an error to the caller. Failures become status lines,
//! sentinel text, a zero score, or the terminal fallback state. Failures
//! that let the run continue are also listed in
//! [`NewsletterRun::degraded`], tagged with their stage.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use newsdesk_core::{AccuracyContext, AppConfig, ErrorKind, MarketRecord};
use newsdesk_market::Fetched;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use uuid::Uuid;

use crate::chat::ChatModel;
use crate::error::{Failure, RagError};
use crate::http::with_deadline;
use crate::scorer::{AccuracyReport, AccuracyScorer};
use crate::sources::MarketSource;
use crate::summarizer::{Draft, Summarizer};
use crate::types::{
    Domain, IngestReport, NewsletterRun, RetrievalResult, RetrievedRecord, RunReport, RunState,
    Stage, StageFailure, StageMessage, StageOutcome, StatusLine, Summaries, FALLBACK_NEWSLETTER,
};
use crate::vector_store::{AddRequest, DocumentStore, QueryInput};

/// Explicitly constructed service handles the pipeline calls into.
#[derive(Clone)]
pub struct PipelineServices {
    pub source: Arc<dyn MarketSource>,
    pub store: Arc<dyn DocumentStore>,
    pub chat: Arc<dyn ChatModel>,
    pub scorer: Arc<dyn AccuracyScorer>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOptions {
    pub top_k: usize,
    /// Deadline applied to each external call the orchestrator makes.
    pub call_timeout: Duration,
    pub parallel_branches: bool,
    pub accuracy_context: AccuracyContext,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            top_k: 5,
            call_timeout: Duration::from_secs(30),
            parallel_branches: true,
            accuracy_context: AccuracyContext::Retrieved,
        }
    }
}

impl PipelineOptions {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            top_k: config.top_k,
            call_timeout: Duration::from_secs(config.request_timeout_secs),
            parallel_branches: config.parallel_branches,
            accuracy_context: config.accuracy_context,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum BranchJob {
    Ingest,
    Retrieve,
}

struct Inner {
    services: PipelineServices,
    summarizer: Summarizer,
    options: PipelineOptions,
}

/// Cheap to clone; clones share the same services.
#[derive(Clone)]
pub struct Pipeline {
    inner: Arc<Inner>,
}

impl Pipeline {
    #[must_use]
    pub fn new(services: PipelineServices, options: PipelineOptions) -> Self {
        let summarizer = Summarizer::new(Arc::clone(&services.chat), options.call_timeout);
        Self {
            inner: Arc::new(Inner {
                services,
                summarizer,
                options,
            }),
        }
    }

    /// Same services, different options.
    #[must_use]
    pub fn with_options(&self, options: PipelineOptions) -> Self {
        Self::new(self.inner.services.clone(), options)
    }

    #[must_use]
    pub fn options(&self) -> &PipelineOptions {
        &self.inner.options
    }

    /// FETCH and STORE for both domains.
    pub async fn ingest(&self) -> IngestReport {
        let mut report = IngestReport::default();
        let mut status = vec![StatusLine::info("Fetching market data...")];

        for msg in self.collect_branches(BranchJob::Ingest).await {
            let label = msg.domain.label();
            let entry = report.domain_mut(msg.domain);
            match msg.outcome {
                StageOutcome::Fetched(records) if records.is_empty() => {
                    status.push(StatusLine::error(format!("No {label} data fetched.")));
                }
                StageOutcome::Fetched(records) => {
                    entry.fetched = records.len();
                    status.push(StatusLine::info(format!(
                        "Fetched {} {label} records.",
                        records.len()
                    )));
                }
                StageOutcome::Stored(n) => {
                    entry.stored = n;
                    status.push(StatusLine::success(format!(
                        "Stored {n} {label} records in {}.",
                        msg.domain.collection()
                    )));
                }
                StageOutcome::Failed(failure) => {
                    status.push(StatusLine::error(format!(
                        "{} failed for {label} data: {failure}",
                        msg.stage
                    )));
                    entry.failure = Some(failure);
                }
                StageOutcome::Retrieved(_) | StageOutcome::Summarized(_) => {}
            }
        }

        tracing::info!(
            company = report.company.stored,
            market = report.market.stored,
            "ingest finished"
        );
        report.status = status;
        report
    }

    /// RETRIEVE and SUMMARIZE per domain, then RISK, COMPOSE and SCORE.
    pub async fn generate(&self) -> NewsletterRun {
        let run_id = Uuid::new_v4();
        let mut status = vec![StatusLine::info("Retrieving stored market data...")];
        let mut company = RetrievalResult::default();
        let mut market = RetrievalResult::default();
        let mut company_draft: Option<Draft> = None;
        let mut market_draft: Option<Draft> = None;
        let mut degraded = Vec::new();

        for msg in self.collect_branches(BranchJob::Retrieve).await {
            let label = msg.domain.label();
            match msg.outcome {
                StageOutcome::Retrieved(result) => {
                    if result.is_empty() {
                        status.push(StatusLine::error(format!(
                            "No relevant {label} data found."
                        )));
                    } else {
                        status.push(StatusLine::info(format!(
                            "Retrieved {} {label} documents.",
                            result.hits.len()
                        )));
                    }
                    match msg.domain {
                        Domain::Company => company = result,
                        Domain::Market => market = result,
                    }
                }
                StageOutcome::Summarized(draft) => {
                    if let Some(failure) = &draft.failure {
                        status.push(StatusLine::error(format!(
                            "{label} summary unavailable: {failure}"
                        )));
                        degraded.push(StageFailure {
                            stage: msg.stage,
                            domain: Some(msg.domain),
                            failure: failure.clone(),
                        });
                    }
                    match msg.domain {
                        Domain::Company => company_draft = Some(draft),
                        Domain::Market => market_draft = Some(draft),
                    }
                }
                StageOutcome::Failed(failure) => {
                    status.push(StatusLine::error(format!(
                        "{} failed for {label} data: {failure}",
                        msg.stage
                    )));
                    degraded.push(StageFailure {
                        stage: msg.stage,
                        domain: Some(msg.domain),
                        failure,
                    });
                }
                StageOutcome::Fetched(_) | StageOutcome::Stored(_) => {}
            }
        }

        if company.is_empty() && market.is_empty() {
            status.push(StatusLine::error("No relevant data found."));
            return self.fallback(
                run_id,
                FallbackParts {
                    stage: Stage::Retrieve,
                    reason: "nothing retrieved for either domain".to_string(),
                    newsletter: FALLBACK_NEWSLETTER,
                    company,
                    market,
                    summaries: Summaries::default(),
                    degraded,
                    status,
                },
            );
        }

        let summary_text = |draft: Option<Draft>, domain: Domain| {
            draft.map_or_else(|| domain.empty_placeholder().to_string(), |d| d.text)
        };
        let mut summaries = Summaries {
            company: summary_text(company_draft, Domain::Company),
            market: summary_text(market_draft, Domain::Market),
            risk: String::new(),
        };

        status.push(StatusLine::info("Analyzing risks..."));
        let risk = self
            .inner
            .summarizer
            .assess_risk(&summaries.company, &summaries.market)
            .await;
        if let Some(failure) = risk.failure {
            status.push(StatusLine::error(format!(
                "Risk assessment unavailable: {failure}"
            )));
            degraded.push(StageFailure {
                stage: Stage::Risk,
                domain: None,
                failure,
            });
        }
        summaries.risk = risk.text;

        status.push(StatusLine::info("Composing newsletter..."));
        let composed = self
            .inner
            .summarizer
            .compose(&summaries.company, &summaries.market, &summaries.risk)
            .await;
        if let Some(failure) = composed.failure {
            status.push(StatusLine::error(format!(
                "Newsletter generation failed: {failure}"
            )));
            return self.fallback(
                run_id,
                FallbackParts {
                    stage: Stage::Compose,
                    reason: failure.to_string(),
                    newsletter: &composed.text,
                    company,
                    market,
                    summaries,
                    degraded,
                    status,
                },
            );
        }
        status.push(StatusLine::success("Newsletter generated."));

        let context = self.accuracy_context(&company, &market, &summaries);
        let accuracy = self.score(&composed.text, &context).await;
        match &accuracy.failure {
            None => status.push(StatusLine::success(format!(
                "Accuracy score: {}%",
                accuracy.score
            ))),
            Some(failure) => {
                status.push(StatusLine::error(format!(
                    "Accuracy scoring failed: {failure}"
                )));
                degraded.push(StageFailure {
                    stage: Stage::Score,
                    domain: None,
                    failure: failure.clone(),
                });
            }
        }

        tracing::info!(run_id = %run_id, score = accuracy.score, "newsletter generated");
        NewsletterRun {
            run_id,
            generated_at: Utc::now(),
            state: RunState::Completed,
            newsletter: composed.text,
            accuracy,
            company,
            market,
            summaries,
            degraded,
            status,
        }
    }

    /// [`Pipeline::ingest`] followed by [`Pipeline::generate`].
    ///
    /// Generation only runs when this ingest stored something. Otherwise
    /// the run falls back at FETCH (nothing fetched) or STORE (nothing
    /// written) without reading older documents.
    pub async fn run(&self) -> RunReport {
        let ingest = self.ingest().await;
        if ingest.total_stored() > 0 {
            let newsletter = self.generate().await;
            return RunReport { ingest, newsletter };
        }

        let (stage, reason) = if ingest.total_fetched() == 0 {
            (Stage::Fetch, "nothing fetched for either domain")
        } else {
            (Stage::Store, "nothing stored for either domain")
        };
        let newsletter = self.fallback(
            Uuid::new_v4(),
            FallbackParts {
                stage,
                reason: reason.to_string(),
                newsletter: FALLBACK_NEWSLETTER,
                company: RetrievalResult::default(),
                market: RetrievalResult::default(),
                summaries: Summaries::default(),
                degraded: Vec::new(),
                status: vec![StatusLine::error("No new market data; skipping generation.")],
            },
        );
        RunReport { ingest, newsletter }
    }

    /// Runs `job` for both domains and returns every tagged message, sorted
    /// by domain with each domain's messages in stage order.
    async fn collect_branches(&self, job: BranchJob) -> Vec<StageMessage> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut tasks = JoinSet::new();

        for domain in Domain::ALL {
            let pipeline = self.clone();
            let tx = tx.clone();
            if self.inner.options.parallel_branches {
                tasks.spawn(async move { pipeline.branch(job, domain, &tx).await });
            } else {
                pipeline.branch(job, domain, &tx).await;
            }
        }
        drop(tx);

        let mut messages = Vec::new();
        while let Some(msg) = rx.recv().await {
            messages.push(msg);
        }
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "pipeline branch task failed");
            }
        }

        messages.sort_by_key(|m| m.domain);
        messages
    }

    async fn branch(&self, job: BranchJob, domain: Domain, tx: &mpsc::UnboundedSender<StageMessage>) {
        let send = |stage: Stage, outcome: StageOutcome| {
            // Receiver outlives every branch.
            let _ = tx.send(StageMessage {
                domain,
                stage,
                outcome,
            });
        };
        match job {
            BranchJob::Ingest => self.ingest_branch(domain, send).await,
            BranchJob::Retrieve => self.retrieve_branch(domain, send).await,
        }
    }

    async fn ingest_branch(&self, domain: Domain, send: impl Fn(Stage, StageOutcome)) {
        let services = &self.inner.services;
        let limit = self.inner.options.call_timeout;

        let fetched = match tokio::time::timeout(limit, services.source.fetch(domain)).await {
            Ok(fetched) => fetched,
            Err(_) => {
                let e = RagError::timeout("market data", limit);
                Fetched::NoData {
                    kind: e.kind(),
                    reason: e.to_string(),
                }
            }
        };
        let records = match fetched {
            Fetched::Data(records) => records,
            Fetched::NoData { kind, reason } => {
                send(Stage::Fetch, StageOutcome::Failed(Failure::new(kind, reason)));
                return;
            }
        };
        tracing::debug!(domain = domain.label(), count = records.len(), "fetched records");
        let empty = records.is_empty();
        let request = AddRequest::new(
            records.iter().map(MarketRecord::document_text).collect(),
            records.iter().map(MarketRecord::metadata).collect(),
        );
        send(Stage::Fetch, StageOutcome::Fetched(records));
        if empty {
            return;
        }

        let collection = domain.collection();
        let stored = with_deadline("document store", limit, async {
            services.store.ensure_collection(collection).await?;
            services.store.add(collection, request).await
        })
        .await;
        match stored {
            Ok(n) => send(Stage::Store, StageOutcome::Stored(n)),
            Err(e) => {
                tracing::warn!(domain = domain.label(), error = %e, kind = ?e.kind(), "store failed");
                send(Stage::Store, StageOutcome::Failed(Failure::from(&e)));
            }
        }
    }

    async fn retrieve_branch(&self, domain: Domain, send: impl Fn(Stage, StageOutcome)) {
        let services = &self.inner.services;
        let options = &self.inner.options;

        let hits = with_deadline(
            "document store",
            options.call_timeout,
            services.store.query(
                domain.collection(),
                QueryInput::Text(domain.query()),
                options.top_k,
            ),
        )
        .await;
        let result = match hits {
            Ok(docs) => RetrievalResult {
                query: domain.query().to_string(),
                hits: docs
                    .into_iter()
                    .map(|doc| RetrievedRecord {
                        record: MarketRecord::from_stored(&doc.document, &doc.metadata),
                        id: doc.id,
                        text: doc.document,
                        similarity: doc.similarity,
                    })
                    .collect(),
            },
            Err(e) => {
                tracing::warn!(domain = domain.label(), error = %e, kind = ?e.kind(), "retrieval failed");
                send(Stage::Retrieve, StageOutcome::Failed(Failure::from(&e)));
                return;
            }
        };
        tracing::debug!(domain = domain.label(), count = result.hits.len(), "retrieved documents");

        let input = result.joined();
        let empty = result.is_empty();
        send(Stage::Retrieve, StageOutcome::Retrieved(result));
        if empty {
            return;
        }

        let draft = self.inner.summarizer.summarize(domain.role(), &input).await;
        send(Stage::Summarize, StageOutcome::Summarized(draft));
    }

    fn accuracy_context(
        &self,
        company: &RetrievalResult,
        market: &RetrievalResult,
        summaries: &Summaries,
    ) -> Vec<String> {
        let retrieved = || {
            let mut texts = company.texts();
            texts.extend(market.texts());
            texts
        };
        let summarized = || {
            vec![
                summaries.company.clone(),
                summaries.market.clone(),
                summaries.risk.clone(),
            ]
        };
        match self.inner.options.accuracy_context {
            AccuracyContext::Retrieved => retrieved(),
            AccuracyContext::Summaries => summarized(),
            AccuracyContext::Both => {
                let mut texts = retrieved();
                texts.extend(summarized());
                texts
            }
        }
    }

    async fn score(&self, newsletter: &str, context: &[String]) -> AccuracyReport {
        let scorer = &self.inner.services.scorer;
        let limit = self.inner.options.call_timeout;
        match tokio::time::timeout(limit, scorer.score(newsletter, context)).await {
            Ok(report) => report,
            Err(_) => {
                let e = RagError::timeout("accuracy scorer", limit);
                tracing::warn!(error = %e, "accuracy scoring timed out");
                AccuracyReport::zero(scorer.method(), Failure::from(&e))
            }
        }
    }

    fn fallback(&self, run_id: Uuid, parts: FallbackParts<'_>) -> NewsletterRun {
        tracing::warn!(
            run_id = %run_id,
            stage = %parts.stage,
            reason = %parts.reason,
            "pipeline reached fallback"
        );
        let accuracy = AccuracyReport::zero(
            self.inner.services.scorer.method(),
            Failure::new(
                ErrorKind::Unknown,
                format!("not scored: {} stage fell back", parts.stage),
            ),
        );
        NewsletterRun {
            run_id,
            generated_at: Utc::now(),
            state: RunState::Fallback {
                stage: parts.stage,
                reason: parts.reason,
            },
            newsletter: parts.newsletter.to_string(),
            accuracy,
            company: parts.company,
            market: parts.market,
            summaries: parts.summaries,
            degraded: parts.degraded,
            status: parts.status,
        }
    }
}

struct FallbackParts<'a> {
    stage: Stage,
    reason: String,
    newsletter: &'a str,
    company: RetrievalResult,
    market: RetrievalResult,
    summaries: Summaries,
    degraded: Vec<StageFailure>,
    status: Vec<StatusLine>,
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod tests;
