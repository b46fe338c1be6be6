//! Named document collections with nearest-neighbour query.
//!
//! Two backends share the [`DocumentStore`] trait: an in-process store
//! persisted as JSON, and a Qdrant HTTP adapter. Neither offers batch
//! atomicity. A failure part-way through `add` leaves whatever the backend
//! had already written, and callers see only the first error.
//!
//! Collections are single-writer by convention. Two concurrent ingest runs
//! against the same name interleave their writes.

mod local;
mod qdrant;

pub use local::LocalStore;
pub use qdrant::{point_id, QdrantStore};

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::RagError;

/// One batch for [`DocumentStore::add`].
#[derive(Debug, Clone, Default)]
pub struct AddRequest {
    pub documents: Vec<String>,
    pub metadatas: Vec<Map<String, Value>>,
    /// Positional ids `"0".."n-1"` when `None`.
    pub ids: Option<Vec<String>>,
    /// Computed by the store's embedder when `None`.
    pub embeddings: Option<Vec<Vec<f32>>>,
}

impl AddRequest {
    #[must_use]
    pub fn new(documents: Vec<String>, metadatas: Vec<Map<String, Value>>) -> Self {
        Self {
            documents,
            metadatas,
            ids: None,
            embeddings: None,
        }
    }

    /// Resolved ids, checking every parallel list against `documents`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidBatch`] when a list length disagrees.
    pub fn resolved_ids(&self) -> Result<Vec<String>, RagError> {
        let n = self.documents.len();
        if !self.metadatas.is_empty() && self.metadatas.len() != n {
            return Err(RagError::InvalidBatch(format!(
                "{} metadatas for {n} documents",
                self.metadatas.len()
            )));
        }
        if let Some(embeddings) = &self.embeddings {
            if embeddings.len() != n {
                return Err(RagError::InvalidBatch(format!(
                    "{} embeddings for {n} documents",
                    embeddings.len()
                )));
            }
        }
        match &self.ids {
            Some(ids) if ids.len() != n => Err(RagError::InvalidBatch(format!(
                "{} ids for {n} documents",
                ids.len()
            ))),
            Some(ids) => Ok(ids.clone()),
            None => Ok(positional_ids(n)),
        }
    }

    pub(crate) fn metadata_at(&self, index: usize) -> Map<String, Value> {
        self.metadatas.get(index).cloned().unwrap_or_default()
    }
}

/// `"0".."n-1"`, reassigned on every ingest run.
#[must_use]
pub fn positional_ids(n: usize) -> Vec<String> {
    (0..n).map(|i| i.to_string()).collect()
}

/// What to search a collection with.
#[derive(Debug, Clone, Copy)]
pub enum QueryInput<'a> {
    Text(&'a str),
    Embedding(&'a [f32]),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub document: String,
    pub metadata: Map<String, Value>,
    /// Backend similarity, higher is nearer.
    pub similarity: f64,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Return the named collection, creating it when absent.
    async fn ensure_collection(&self, name: &str) -> Result<(), RagError>;

    /// Write a batch, overwriting entries whose id already exists.
    /// Returns the number of documents written.
    async fn add(&self, name: &str, request: AddRequest) -> Result<usize, RagError>;

    /// Up to `top_k` documents, nearest first.
    async fn query(
        &self,
        name: &str,
        input: QueryInput<'_>,
        top_k: usize,
    ) -> Result<Vec<StoredDocument>, RagError>;

    async fn count(&self, name: &str) -> Result<usize, RagError>;
}
