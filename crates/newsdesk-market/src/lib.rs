//! Alpha Vantage market-data client.
//!
//! One HTTP GET per fetch, no retry and no backoff. Callers that need the
//! best-effort contract use [`AlphaVantageClient::news_or_empty`] and
//! [`AlphaVantageClient::movers_or_empty`], which never return an error and
//! hand back [`Fetched::NoData`] with the cause instead.

pub mod client;
pub mod error;
pub mod normalize;
pub mod types;

pub use client::{AlphaVantageClient, Fetched};
pub use error::MarketError;
pub use normalize::{normalize_article, normalize_mover, MarketMovers};
