use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use super::{AddRequest, DocumentStore, QueryInput, StoredDocument};
use crate::embeddings::Embedder;
use crate::error::RagError;
use crate::http::{build_client, join_url, send_json};

const SERVICE: &str = "qdrant";

/// Qdrant HTTP adapter. Each collection maps to a Qdrant collection of the
/// same name with cosine distance.
pub struct QdrantStore {
    client: reqwest::Client,
    base_url: String,
    embedder: Arc<dyn Embedder>,
}

#[derive(Serialize)]
struct CreateCollectionRequest {
    vectors: VectorsConfig,
}

#[derive(Serialize)]
struct VectorsConfig {
    size: usize,
    distance: &'static str,
}

#[derive(Serialize)]
struct UpsertPointsRequest {
    points: Vec<Point>,
}

#[derive(Serialize)]
struct Point {
    id: u64,
    vector: Vec<f32>,
    payload: Payload,
}

#[derive(Serialize, Deserialize, Default)]
struct Payload {
    #[serde(default)]
    doc_id: String,
    #[serde(default)]
    document: String,
    #[serde(default)]
    metadata: Map<String, Value>,
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    vector: &'a [f32],
    limit: usize,
    with_payload: bool,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    result: Vec<ScoredPoint>,
}

#[derive(Deserialize)]
struct ScoredPoint {
    id: Value,
    score: f64,
    #[serde(default)]
    payload: Option<Payload>,
}

#[derive(Deserialize)]
struct CountResponse {
    result: CountResult,
}

#[derive(Deserialize)]
struct CountResult {
    count: usize,
}

impl QdrantStore {
    /// # Errors
    ///
    /// Returns [`RagError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(
        qdrant_url: &str,
        embedder: Arc<dyn Embedder>,
        timeout_secs: u64,
    ) -> Result<Self, RagError> {
        Ok(Self {
            client: build_client(timeout_secs)?,
            base_url: qdrant_url.trim_end_matches('/').to_string(),
            embedder,
        })
    }

    fn collection_url(&self, name: &str, suffix: &str) -> String {
        join_url(&self.base_url, &format!("collections/{name}{suffix}"))
    }
}

#[async_trait]
impl DocumentStore for QdrantStore {
    async fn ensure_collection(&self, name: &str) -> Result<(), RagError> {
        let url = self.collection_url(name, "");
        let check = self.client.get(&url).send().await;

        if let Ok(resp) = check {
            if resp.status().is_success() {
                return Ok(());
            }
        }

        let body = CreateCollectionRequest {
            vectors: VectorsConfig {
                size: self.embedder.dimension(),
                distance: "Cosine",
            },
        };
        let _: Value = send_json(self.client.put(&url).json(&body), SERVICE).await?;
        tracing::info!(collection = name, "created qdrant collection");
        Ok(())
    }

    async fn add(&self, name: &str, request: AddRequest) -> Result<usize, RagError> {
        let ids = request.resolved_ids()?;
        if request.documents.is_empty() {
            return Ok(0);
        }
        let embeddings = match &request.embeddings {
            Some(embeddings) => embeddings.clone(),
            None => self.embedder.embed(&request.documents).await?,
        };

        let points: Vec<Point> = ids
            .into_iter()
            .zip(&request.documents)
            .zip(embeddings)
            .enumerate()
            .map(|(index, ((doc_id, document), vector))| Point {
                id: point_id(&doc_id),
                vector,
                payload: Payload {
                    doc_id,
                    document: document.clone(),
                    metadata: request.metadata_at(index),
                },
            })
            .collect();

        let written = points.len();
        let url = self.collection_url(name, "/points?wait=true");
        let _: Value = send_json(
            self.client.put(&url).json(&UpsertPointsRequest { points }),
            SERVICE,
        )
        .await?;
        tracing::debug!(collection = name, written, "qdrant upsert");
        Ok(written)
    }

    async fn query(
        &self,
        name: &str,
        input: QueryInput<'_>,
        top_k: usize,
    ) -> Result<Vec<StoredDocument>, RagError> {
        if top_k == 0 {
            return Ok(Vec::new());
        }
        let owned;
        let vector: &[f32] = match input {
            QueryInput::Embedding(v) => v,
            QueryInput::Text(text) => {
                owned = self
                    .embedder
                    .embed(&[text.to_string()])
                    .await?
                    .into_iter()
                    .next()
                    .unwrap_or_default();
                &owned
            }
        };

        let url = self.collection_url(name, "/points/search");
        let body = SearchRequest {
            vector,
            limit: top_k,
            with_payload: true,
        };
        let response: SearchResponse =
            match send_json(self.client.post(&url).json(&body), SERVICE).await {
                Ok(response) => response,
                Err(RagError::Status { status: 404, .. }) => return Ok(Vec::new()),
                Err(e) => return Err(e),
            };

        Ok(response
            .result
            .into_iter()
            .map(|point| {
                let payload = point.payload.unwrap_or_default();
                let id = if payload.doc_id.is_empty() {
                    point.id.to_string()
                } else {
                    payload.doc_id
                };
                StoredDocument {
                    id,
                    document: payload.document,
                    metadata: payload.metadata,
                    similarity: point.score,
                }
            })
            .collect())
    }

    async fn count(&self, name: &str) -> Result<usize, RagError> {
        let url = self.collection_url(name, "/points/count");
        let body = serde_json::json!({ "exact": true });
        match send_json::<CountResponse>(self.client.post(&url).json(&body), SERVICE).await {
            Ok(response) => Ok(response.result.count),
            Err(RagError::Status { status: 404, .. }) => Ok(0),
            Err(e) => Err(e),
        }
    }
}

/// Qdrant point id for a document id.
///
/// Numeric ids are used as-is, so positional ids overwrite in place. Any
/// other id maps to the first 8 bytes of its SHA-256 as a big-endian u64.
#[must_use]
pub fn point_id(doc_id: &str) -> u64 {
    if let Ok(n) = doc_id.parse::<u64>() {
        return n;
    }
    let hash = Sha256::digest(doc_id.as_bytes());
    let mut bytes = [0_u8; 8];
    bytes.copy_from_slice(&hash[..8]);
    u64::from_be_bytes(bytes)
}
