//! Embedding generation against an OpenAI-compatible `/embeddings` endpoint.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RagError;
use crate::http::{build_client, join_url, send_json};

/// Maximum number of texts per /embeddings call.
const BATCH_SIZE: usize = 64;

const SERVICE: &str = "openai embeddings";

/// Turns texts into fixed-size vectors.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// One vector per input, in input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError>;

    /// Length of every vector this embedder returns.
    fn dimension(&self) -> usize;
}

pub struct OpenAiEmbedder {
    client: reqwest::Client,
    url: String,
    api_key: String,
    model: String,
    dimension: usize,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedDatum>,
}

#[derive(Deserialize)]
struct EmbedDatum {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

impl OpenAiEmbedder {
    /// # Errors
    ///
    /// Returns [`RagError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(
        base_url: &str,
        api_key: &str,
        model: &str,
        dimension: usize,
        timeout_secs: u64,
    ) -> Result<Self, RagError> {
        Ok(Self {
            client: build_client(timeout_secs)?,
            url: join_url(base_url, "embeddings"),
            api_key: api_key.to_owned(),
            model: model.to_owned(),
            dimension,
        })
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    /// Texts are sent in groups of [`BATCH_SIZE`]; each response is
    /// reordered by its `index` field before being appended.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        let mut all_embeddings = Vec::with_capacity(texts.len());

        for chunk in texts.chunks(BATCH_SIZE) {
            let request = self
                .client
                .post(&self.url)
                .bearer_auth(&self.api_key)
                .json(&EmbedRequest {
                    model: &self.model,
                    input: chunk,
                });
            let mut response: EmbedResponse = send_json(request, SERVICE).await?;

            if response.data.len() != chunk.len() {
                return Err(RagError::Malformed {
                    service: SERVICE,
                    reason: format!(
                        "{} embeddings for {} inputs",
                        response.data.len(),
                        chunk.len()
                    ),
                });
            }

            response.data.sort_by_key(|d| d.index);
            all_embeddings.extend(response.data.into_iter().map(|d| d.embedding));
        }

        tracing::debug!(count = all_embeddings.len(), "embedded texts");
        Ok(all_embeddings)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
