//! HTTP client for the Alpha Vantage query endpoint.
//!
//! Wraps `reqwest` with API key management, in-band error detection, and
//! typed response deserialization. Each fetch is a single GET: no retry,
//! no backoff, no rate-limit bookkeeping.

use std::time::Duration;

use newsdesk_core::{ErrorKind, MarketRecord};
use reqwest::{Client, Url};

use crate::error::MarketError;
use crate::normalize::{normalize_article, normalize_movers, MarketMovers};
use crate::types::{NewsSentimentResponse, TopMoversResponse};

const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co/query";

/// Alpha Vantage functions this client knows how to call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MarketFunction {
    NewsSentiment,
    TopGainersLosers,
}

impl MarketFunction {
    #[must_use]
    fn as_str(self) -> &'static str {
        match self {
            Self::NewsSentiment => "NEWS_SENTIMENT",
            Self::TopGainersLosers => "TOP_GAINERS_LOSERS",
        }
    }
}

/// Result of a best-effort fetch: data, or the designated "no data" signal
/// with the reason the fetch produced nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched<T> {
    Data(T),
    NoData { kind: ErrorKind, reason: String },
}

impl<T> Fetched<T> {
    fn from_result(result: Result<T, MarketError>, what: &'static str) -> Self {
        match result {
            Ok(value) => Self::Data(value),
            Err(e) => {
                let kind = e.kind();
                tracing::warn!(fetch = what, error = %e, kind = %kind, "market fetch failed");
                Self::NoData {
                    kind,
                    reason: format!("Error fetching {what}: {e}"),
                }
            }
        }
    }
}

/// Client for the Alpha Vantage REST API.
///
/// Use [`AlphaVantageClient::new`] for production or
/// [`AlphaVantageClient::with_base_url`] to point at a mock server in tests.
pub struct AlphaVantageClient {
    client: Client,
    api_key: String,
    base_url: Url,
}

impl AlphaVantageClient {
    /// Creates a new client pointed at the production Alpha Vantage API.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(api_key: &str, timeout_secs: u64) -> Result<Self, MarketError> {
        Self::with_base_url(api_key, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a new client with a custom base URL (for testing with wiremock).
    ///
    /// Unlike most REST APIs the base URL here is the full query endpoint,
    /// so it is used as-is rather than joined with a path.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Http`] if the `reqwest::Client` cannot be
    /// constructed, or [`MarketError::InvalidBaseUrl`] if `base_url` does
    /// not parse.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, MarketError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("newsdesk/0.1 (market-newsletter)")
            .build()?;

        let base_url = Url::parse(base_url).map_err(|e| MarketError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            base_url,
        })
    }

    /// Fetches the `NEWS_SENTIMENT` feed as news records.
    ///
    /// `limit` and `sort` are forwarded when present. A body without a
    /// `feed` key yields an empty list.
    ///
    /// # Errors
    ///
    /// - [`MarketError::RateLimited`] / [`MarketError::ApiError`] for in-band errors.
    /// - [`MarketError::Http`] / [`MarketError::UnexpectedStatus`] on transport failure.
    /// - [`MarketError::Deserialize`] if the body is not the expected JSON.
    pub async fn fetch_news(
        &self,
        limit: Option<u32>,
        sort: Option<&str>,
    ) -> Result<Vec<MarketRecord>, MarketError> {
        let limit_str = limit.map(|l| l.to_string());
        let mut params: Vec<(&str, &str)> = Vec::new();
        if let Some(l) = limit_str.as_deref() {
            params.push(("limit", l));
        }
        if let Some(s) = sort {
            params.push(("sort", s));
        }

        let body = self.fetch_raw(MarketFunction::NewsSentiment, &params).await?;
        let response: NewsSentimentResponse =
            serde_json::from_value(body).map_err(|e| MarketError::Deserialize {
                context: MarketFunction::NewsSentiment.as_str().to_string(),
                source: e,
            })?;

        let records: Vec<MarketRecord> = response.feed.into_iter().map(normalize_article).collect();
        tracing::debug!(count = records.len(), "fetched news feed");
        Ok(records)
    }

    /// Fetches `TOP_GAINERS_LOSERS` as normalized mover lists.
    ///
    /// # Errors
    ///
    /// Same as [`AlphaVantageClient::fetch_news`].
    pub async fn fetch_movers(&self) -> Result<MarketMovers, MarketError> {
        let body = self.fetch_raw(MarketFunction::TopGainersLosers, &[]).await?;
        let response: TopMoversResponse =
            serde_json::from_value(body).map_err(|e| MarketError::Deserialize {
                context: MarketFunction::TopGainersLosers.as_str().to_string(),
                source: e,
            })?;

        let movers = normalize_movers(response);
        tracing::debug!(
            gainers = movers.top_gainers.len(),
            losers = movers.top_losers.len(),
            active = movers.most_actively_traded.len(),
            "fetched top movers"
        );
        Ok(movers)
    }

    /// Best-effort news fetch: never errors, reports failures as [`Fetched::NoData`].
    pub async fn news_or_empty(
        &self,
        limit: Option<u32>,
        sort: Option<&str>,
    ) -> Fetched<Vec<MarketRecord>> {
        Fetched::from_result(self.fetch_news(limit, sort).await, "market news")
    }

    /// Best-effort movers fetch: never errors, reports failures as [`Fetched::NoData`].
    pub async fn movers_or_empty(&self) -> Fetched<MarketMovers> {
        Fetched::from_result(self.fetch_movers().await, "gainers and losers")
    }

    /// Performs one GET for `function` and returns the parsed JSON body after
    /// in-band error detection.
    ///
    /// # Errors
    ///
    /// See [`AlphaVantageClient::fetch_news`].
    async fn fetch_raw(
        &self,
        function: MarketFunction,
        extra: &[(&str, &str)],
    ) -> Result<serde_json::Value, MarketError> {
        let url = self.build_url(function, extra);
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MarketError::UnexpectedStatus {
                status: status.as_u16(),
                function: function.as_str().to_string(),
            });
        }

        let text = response.text().await?;
        let body: serde_json::Value =
            serde_json::from_str(&text).map_err(|e| MarketError::Deserialize {
                context: function.as_str().to_string(),
                source: e,
            })?;
        Self::check_api_error(&body)?;
        Ok(body)
    }

    /// Builds the request URL with `function`, `apikey`, and any extra
    /// parameters percent-encoded via [`Url::query_pairs_mut`].
    fn build_url(&self, function: MarketFunction, extra: &[(&str, &str)]) -> Url {
        let mut url = self.base_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("function", function.as_str());
            pairs.append_pair("apikey", &self.api_key);
            for (k, v) in extra {
                pairs.append_pair(k, v);
            }
        }
        url
    }

    /// Detects the in-band error envelopes Alpha Vantage sends with HTTP 200.
    fn check_api_error(body: &serde_json::Value) -> Result<(), MarketError> {
        let text_of = |key: &str| body.get(key).and_then(serde_json::Value::as_str);

        if let Some(msg) = text_of("Error Message") {
            return Err(MarketError::ApiError(msg.to_string()));
        }
        if let Some(msg) = text_of("Note").or_else(|| text_of("Information")) {
            return Err(MarketError::RateLimited(msg.to_string()));
        }
        if !body.is_object() {
            return Err(MarketError::ApiError(
                "response body is not a JSON object".to_string(),
            ));
        }
        Ok(())
    }
}
