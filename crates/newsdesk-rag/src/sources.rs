//! Market data sources feeding the two domains.

use async_trait::async_trait;
use newsdesk_core::MarketRecord;
use newsdesk_market::{AlphaVantageClient, Fetched};

use crate::types::Domain;

/// Best-effort fetch of one domain's records. Never errors: failures come
/// back as [`Fetched::NoData`] with their classification.
#[async_trait]
pub trait MarketSource: Send + Sync {
    async fn fetch(&self, domain: Domain) -> Fetched<Vec<MarketRecord>>;
}

/// Company news from `NEWS_SENTIMENT`, market trends from the
/// `top_gainers` list of `TOP_GAINERS_LOSERS`.
pub struct AlphaVantageSource {
    client: AlphaVantageClient,
    news_limit: Option<u32>,
    news_sort: Option<String>,
}

impl AlphaVantageSource {
    #[must_use]
    pub fn new(client: AlphaVantageClient, news_limit: Option<u32>, news_sort: Option<String>) -> Self {
        Self {
            client,
            news_limit,
            news_sort,
        }
    }
}

#[async_trait]
impl MarketSource for AlphaVantageSource {
    async fn fetch(&self, domain: Domain) -> Fetched<Vec<MarketRecord>> {
        match domain {
            Domain::Company => {
                self.client
                    .news_or_empty(self.news_limit, self.news_sort.as_deref())
                    .await
            }
            Domain::Market => match self.client.movers_or_empty().await {
                Fetched::Data(movers) => Fetched::Data(movers.top_gainers),
                Fetched::NoData { kind, reason } => Fetched::NoData { kind, reason },
            },
        }
    }
}
