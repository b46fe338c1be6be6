//! Shared plumbing for the provider clients: client construction, status
//! classification, JSON decoding, and per-call deadlines.

use std::future::Future;
use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

use crate::error::RagError;

/// Longest response-body excerpt kept in error messages.
const BODY_EXCERPT: usize = 300;

pub(crate) fn build_client(timeout_secs: u64) -> Result<Client, RagError> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .user_agent("newsdesk/0.1 (market-newsletter)")
        .build()?)
}

/// Sends `request`, maps non-2xx statuses, and decodes the body as `T`.
///
/// 401/402/403/429 and OpenAI-style `insufficient_quota` bodies become
/// [`RagError::Quota`]; other failures become [`RagError::Status`].
pub(crate) async fn send_json<T: DeserializeOwned>(
    request: RequestBuilder,
    service: &'static str,
) -> Result<T, RagError> {
    let response = request.send().await?;
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        let body = excerpt(&text);
        let code = status.as_u16();
        if matches!(code, 401 | 402 | 403 | 429) || text.contains("insufficient_quota") {
            return Err(RagError::Quota {
                service,
                message: format!("status {code}: {body}"),
            });
        }
        return Err(RagError::Status {
            service,
            status: code,
            body,
        });
    }

    serde_json::from_str(&text).map_err(|e| RagError::Malformed {
        service,
        reason: e.to_string(),
    })
}

/// Bounds `fut` by `limit`, surfacing expiry as [`RagError::Timeout`].
pub(crate) async fn with_deadline<T, F>(
    service: &'static str,
    limit: Duration,
    fut: F,
) -> Result<T, RagError>
where
    F: Future<Output = Result<T, RagError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(RagError::timeout(service, limit)),
    }
}

/// Joins `base` and `path` with exactly one slash between them.
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

fn excerpt(text: &str) -> String {
    let trimmed = text.trim();
    match trimmed.char_indices().nth(BODY_EXCERPT) {
        Some((idx, _)) => format!("{}…", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use newsdesk_core::ErrorKind;

    use super::*;

    #[test]
    fn join_url_normalizes_slashes() {
        assert_eq!(
            join_url("https://api.openai.com/v1/", "/embeddings"),
            "https://api.openai.com/v1/embeddings"
        );
        assert_eq!(join_url("http://q:6333", "collections/x"), "http://q:6333/collections/x");
    }

    #[test]
    fn excerpt_truncates_long_bodies() {
        let long = "x".repeat(BODY_EXCERPT + 50);
        let cut = excerpt(&long);
        assert_eq!(cut.chars().count(), BODY_EXCERPT + 1);
        assert!(cut.ends_with('…'));
    }

    #[tokio::test]
    async fn with_deadline_times_out() {
        let result: Result<(), RagError> = with_deadline("slow", Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Timeout);
    }

    #[tokio::test]
    async fn with_deadline_passes_through_results() {
        let result = with_deadline("fast", Duration::from_secs(1), async { Ok::<_, RagError>(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }
}
