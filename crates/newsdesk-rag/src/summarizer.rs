//! Role-specific summaries and final newsletter composition.
//!
//! Every call either returns trimmed model text or a fixed sentinel string
//! alongside the classified failure; nothing here returns an error to the
//! orchestrator.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::chat::{ChatMessage, ChatModel};
use crate::error::{Failure, RagError};
use crate::http::with_deadline;

pub const SUMMARY_SENTINEL: &str = "Summary unavailable due to an error.";
pub const COMPOSE_SENTINEL: &str = "Newsletter generation failed due to an error.";

const SUMMARIZE_SYSTEM: &str = "You are a helpful assistant that summarizes data.";
const COMPOSE_SYSTEM: &str =
    "You are a professional assistant tasked with creating market newsletters.";

/// The three summary roles and the context phrase each one injects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryRole {
    CompanyInsights,
    MarketTrends,
    RiskAssessment,
}

impl SummaryRole {
    #[must_use]
    pub fn context(self) -> &'static str {
        match self {
            Self::CompanyInsights => "company insights",
            Self::MarketTrends => "market trends",
            Self::RiskAssessment => "risk assessment",
        }
    }
}

/// Model output, or the sentinel plus what went wrong.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Draft {
    pub text: String,
    pub failure: Option<Failure>,
}

impl Draft {
    fn ok(text: String) -> Self {
        Self {
            text,
            failure: None,
        }
    }

    fn failed(sentinel: &str, err: &RagError) -> Self {
        Self {
            text: sentinel.to_string(),
            failure: Some(Failure::from(err)),
        }
    }
}

#[must_use]
pub fn summarize_prompt(role: SummaryRole, input: &str) -> String {
    format!(
        "Summarize the following {}:\n\n{input}\n\nProvide a concise summary.",
        role.context()
    )
}

#[must_use]
pub fn risk_input(company: &str, market: &str) -> String {
    format!("Assess risks based on:\n\nCompany Insights:\n{company}\n\nMarket Trends:\n{market}")
}

#[must_use]
pub fn compose_prompt(company: &str, market: &str, risks: &str) -> String {
    format!(
        "Generate a professional daily market newsletter based on the following data:\n\n\
         Company Insights:\n{company}\n\n\
         Market Trends:\n{market}\n\n\
         Risk Analysis:\n{risks}\n\n\
         Format it concisely and professionally, focusing on insights."
    )
}

#[derive(Clone)]
pub struct Summarizer {
    chat: Arc<dyn ChatModel>,
    call_timeout: Duration,
}

impl Summarizer {
    #[must_use]
    pub fn new(chat: Arc<dyn ChatModel>, call_timeout: Duration) -> Self {
        Self { chat, call_timeout }
    }

    async fn try_summarize(&self, role: SummaryRole, input: &str) -> Result<String, RagError> {
        let messages = [
            ChatMessage::system(SUMMARIZE_SYSTEM),
            ChatMessage::user(summarize_prompt(role, input)),
        ];
        self.ask(&messages).await
    }

    /// Summarize `input` for `role`, degrading to [`SUMMARY_SENTINEL`].
    pub async fn summarize(&self, role: SummaryRole, input: &str) -> Draft {
        match self.try_summarize(role, input).await {
            Ok(text) => {
                tracing::debug!(role = role.context(), chars = text.len(), "summary ready");
                Draft::ok(text)
            }
            Err(e) => {
                tracing::warn!(role = role.context(), error = %e, kind = ?e.kind(), "summary failed");
                Draft::failed(SUMMARY_SENTINEL, &e)
            }
        }
    }

    /// Risk summary over the two domain summaries.
    pub async fn assess_risk(&self, company: &str, market: &str) -> Draft {
        self.summarize(SummaryRole::RiskAssessment, &risk_input(company, market))
            .await
    }

    /// Final newsletter, degrading to [`COMPOSE_SENTINEL`].
    pub async fn compose(&self, company: &str, market: &str, risks: &str) -> Draft {
        let messages = [
            ChatMessage::system(COMPOSE_SYSTEM),
            ChatMessage::user(compose_prompt(company, market, risks)),
        ];
        match self.ask(&messages).await {
            Ok(text) => {
                tracing::debug!(chars = text.len(), "newsletter composed");
                Draft::ok(text)
            }
            Err(e) => {
                tracing::warn!(error = %e, kind = ?e.kind(), "newsletter composition failed");
                Draft::failed(COMPOSE_SENTINEL, &e)
            }
        }
    }

    async fn ask(&self, messages: &[ChatMessage]) -> Result<String, RagError> {
        let text = with_deadline(
            "openai chat",
            self.call_timeout,
            self.chat.complete(messages),
        )
        .await?;
        Ok(text.trim().to_string())
    }
}
