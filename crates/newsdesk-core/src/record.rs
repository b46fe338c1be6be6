//! Loosely-typed market records and their defaulting rules.
//!
//! Provider payloads carry a shifting set of keys. Every field here is
//! optional, and the placeholder used when a field is absent is defined
//! once, in the accessor methods below, instead of at each call site.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const NO_SUMMARY: &str = "No summary";
pub const UNKNOWN_SOURCE: &str = "unknown";
pub const UNKNOWN_TICKER: &str = "N/A";
pub const ZERO_PRICE: &str = "0";
pub const ZERO_CHANGE: &str = "0%";

/// What a record was fetched as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    #[default]
    News,
    Mover,
}

/// One news item or ticker movement.
///
/// Created by the fetch step, stored as a serialized document, never
/// mutated afterwards. A later fetch supersedes it; records are not merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketRecord {
    #[serde(default)]
    pub kind: RecordKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_published: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticker: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_amount: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_percentage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub topics: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall_sentiment_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall_sentiment_score: Option<f64>,
}

fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|s| !s.trim().is_empty())
}

impl MarketRecord {
    /// A news record carrying only a summary.
    #[must_use]
    pub fn news(summary: impl Into<String>) -> Self {
        Self {
            kind: RecordKind::News,
            summary: Some(summary.into()),
            ..Self::default()
        }
    }

    /// A mover record carrying ticker, price and change.
    #[must_use]
    pub fn mover(
        ticker: impl Into<String>,
        price: impl Into<String>,
        change_percentage: impl Into<String>,
    ) -> Self {
        Self {
            kind: RecordKind::Mover,
            ticker: Some(ticker.into()),
            price: Some(price.into()),
            change_percentage: Some(change_percentage.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn summary_or_default(&self) -> &str {
        non_blank(self.summary.as_ref()).unwrap_or(NO_SUMMARY)
    }

    #[must_use]
    pub fn title_or_default(&self) -> &str {
        non_blank(self.title.as_ref()).unwrap_or("")
    }

    #[must_use]
    pub fn source_or_default(&self) -> &str {
        non_blank(self.source.as_ref()).unwrap_or(UNKNOWN_SOURCE)
    }

    #[must_use]
    pub fn ticker_or_default(&self) -> &str {
        non_blank(self.ticker.as_ref()).unwrap_or(UNKNOWN_TICKER)
    }

    #[must_use]
    pub fn price_or_default(&self) -> &str {
        non_blank(self.price.as_ref()).unwrap_or(ZERO_PRICE)
    }

    /// Change percentage normalized to carry exactly one trailing `%`.
    #[must_use]
    pub fn change_or_default(&self) -> String {
        match non_blank(self.change_percentage.as_ref()) {
            Some(raw) => format!("{}%", raw.trim().trim_end_matches('%')),
            None => ZERO_CHANGE.to_string(),
        }
    }

    /// The text that gets embedded and handed to the language model.
    ///
    /// News records use their summary; movers render as
    /// `"{ticker} - ${price} ({change})"`.
    #[must_use]
    pub fn document_text(&self) -> String {
        match self.kind {
            RecordKind::News => self.summary_or_default().to_string(),
            RecordKind::Mover => format!(
                "{} - ${} ({})",
                self.ticker_or_default(),
                self.price_or_default(),
                self.change_or_default()
            ),
        }
    }

    /// Flat metadata stored next to the document, plus the full record
    /// under the `record` key so retrieval can rebuild it.
    #[must_use]
    pub fn metadata(&self) -> Map<String, Value> {
        let mut meta = Map::new();
        meta.insert("kind".into(), serde_json::to_value(self.kind).unwrap_or(Value::Null));
        match self.kind {
            RecordKind::News => {
                meta.insert("title".into(), Value::from(self.title_or_default()));
                meta.insert("source".into(), Value::from(self.source_or_default()));
            }
            RecordKind::Mover => {
                meta.insert("ticker".into(), Value::from(self.ticker_or_default()));
                meta.insert("price".into(), Value::from(self.price_or_default()));
                meta.insert("change".into(), Value::from(self.change_or_default()));
            }
        }
        if let Ok(full) = serde_json::to_value(self) {
            meta.insert("record".into(), full);
        }
        meta
    }

    /// Rebuild a record from stored metadata, falling back to a bare news
    /// record around `document` when the metadata carries no full record.
    #[must_use]
    pub fn from_stored(document: &str, metadata: &Map<String, Value>) -> Self {
        metadata
            .get("record")
            .and_then(|v| serde_json::from_value::<Self>(v.clone()).ok())
            .unwrap_or_else(|| {
                let mut record = Self::news(document);
                record.title = metadata
                    .get("title")
                    .and_then(Value::as_str)
                    .map(str::to_string);
                record
            })
    }
}
