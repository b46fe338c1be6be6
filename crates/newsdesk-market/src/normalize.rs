//! Conversion of Alpha Vantage wire types into [`MarketRecord`]s.

use newsdesk_core::{MarketRecord, RecordKind};

use crate::types::{NewsArticle, TickerMove, TopMoversResponse};

/// All three mover lists from `TOP_GAINERS_LOSERS`, normalized.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarketMovers {
    pub last_updated: Option<String>,
    pub top_gainers: Vec<MarketRecord>,
    pub top_losers: Vec<MarketRecord>,
    pub most_actively_traded: Vec<MarketRecord>,
}

/// Converts a feed article into a news [`MarketRecord`].
#[must_use]
pub fn normalize_article(article: NewsArticle) -> MarketRecord {
    MarketRecord {
        kind: RecordKind::News,
        title: article.title,
        summary: article.summary,
        source: article.source,
        url: article.url,
        time_published: article.time_published,
        topics: article.topics,
        overall_sentiment_label: article.overall_sentiment_label,
        overall_sentiment_score: article.overall_sentiment_score,
        ..MarketRecord::default()
    }
}

/// Converts a ticker movement into a mover [`MarketRecord`].
#[must_use]
pub fn normalize_mover(mv: TickerMove) -> MarketRecord {
    MarketRecord {
        kind: RecordKind::Mover,
        ticker: mv.ticker,
        price: mv.price,
        change_amount: mv.change_amount,
        change_percentage: mv.change_percentage,
        volume: mv.volume,
        ..MarketRecord::default()
    }
}

pub(crate) fn normalize_movers(response: TopMoversResponse) -> MarketMovers {
    MarketMovers {
        last_updated: response.last_updated,
        top_gainers: response.top_gainers.into_iter().map(normalize_mover).collect(),
        top_losers: response.top_losers.into_iter().map(normalize_mover).collect(),
        most_actively_traded: response
            .most_actively_traded
            .into_iter()
            .map(normalize_mover)
            .collect(),
    }
}
