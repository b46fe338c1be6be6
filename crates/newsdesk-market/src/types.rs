//! Alpha Vantage response types.
//!
//! Both endpoints share one query URL and differ only in the `function`
//! parameter. Error conditions arrive in-band with HTTP 200: the body is
//! then an object with a single `Note`, `Information`, or `Error Message`
//! key instead of the data payload.

use serde::{Deserialize, Deserializer};

// ---------------------------------------------------------------------------
// NEWS_SENTIMENT
// ---------------------------------------------------------------------------

/// Wrapper for the `NEWS_SENTIMENT` response: `{ "feed": [ ... ] }`.
///
/// A body without `feed` is treated as an empty feed.
#[derive(Debug, Deserialize)]
pub struct NewsSentimentResponse {
    #[serde(default)]
    pub items: Option<String>,
    #[serde(default)]
    pub feed: Vec<NewsArticle>,
}

/// A single article in the news feed.
#[derive(Debug, Deserialize)]
pub struct NewsArticle {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    /// `YYYYMMDDTHHMMSS` in US/Eastern.
    #[serde(default)]
    pub time_published: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default, deserialize_with = "topics_from_any")]
    pub topics: Vec<String>,
    #[serde(default)]
    pub overall_sentiment_score: Option<f64>,
    #[serde(default)]
    pub overall_sentiment_label: Option<String>,
}

/// `topics` is documented as `[{ "topic": ..., "relevance_score": ... }]`
/// but plain string arrays show up in fixtures and older payloads.
fn topics_from_any<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Topic {
        Name(String),
        Scored { topic: String },
    }

    let raw: Option<Vec<Topic>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|t| match t {
            Topic::Name(name) | Topic::Scored { topic: name } => name,
        })
        .collect())
}

// ---------------------------------------------------------------------------
// TOP_GAINERS_LOSERS
// ---------------------------------------------------------------------------

/// Wrapper for the `TOP_GAINERS_LOSERS` response.
#[derive(Debug, Deserialize)]
pub struct TopMoversResponse {
    #[serde(default)]
    pub last_updated: Option<String>,
    #[serde(default)]
    pub top_gainers: Vec<TickerMove>,
    #[serde(default)]
    pub top_losers: Vec<TickerMove>,
    #[serde(default)]
    pub most_actively_traded: Vec<TickerMove>,
}

/// One ticker movement. Alpha Vantage sends every number as a string.
#[derive(Debug, Deserialize)]
pub struct TickerMove {
    #[serde(default)]
    pub ticker: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub change_amount: Option<String>,
    #[serde(default)]
    pub change_percentage: Option<String>,
    #[serde(default)]
    pub volume: Option<String>,
}
