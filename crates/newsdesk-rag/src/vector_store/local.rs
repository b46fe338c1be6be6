use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use super::{AddRequest, DocumentStore, QueryInput, StoredDocument};
use crate::embeddings::Embedder;
use crate::error::RagError;
use crate::similarity::cosine_similarity;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Entry {
    id: String,
    document: String,
    #[serde(default)]
    metadata: Map<String, Value>,
    embedding: Vec<f32>,
}

type Collections = HashMap<String, Vec<Entry>>;

/// In-process collections ranked by cosine similarity.
///
/// With a path, the whole store is rewritten to disk after every `add`.
pub struct LocalStore {
    embedder: Arc<dyn Embedder>,
    path: Option<PathBuf>,
    collections: RwLock<Collections>,
}

impl LocalStore {
    /// A store that lives only as long as the process.
    #[must_use]
    pub fn in_memory(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            path: None,
            collections: RwLock::new(HashMap::new()),
        }
    }

    /// Open (or start) a store persisted at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Io`] if the file exists but cannot be read, or
    /// [`RagError::Malformed`] if it is not a store snapshot.
    pub async fn open(embedder: Arc<dyn Embedder>, path: impl Into<PathBuf>) -> Result<Self, RagError> {
        let path = path.into();
        let collections = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| RagError::Malformed {
                service: "local store",
                reason: format!("{}: {e}", path.display()),
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };

        tracing::debug!(path = %path.display(), "opened local store");
        Ok(Self {
            embedder,
            path: Some(path),
            collections: RwLock::new(collections),
        })
    }

    async fn persist(&self, collections: &Collections) -> Result<(), RagError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let bytes = serde_json::to_vec(collections).map_err(|e| RagError::Malformed {
            service: "local store",
            reason: e.to_string(),
        })?;
        write_atomically(path, &bytes).await
    }
}

async fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), RagError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

#[async_trait]
impl DocumentStore for LocalStore {
    async fn ensure_collection(&self, name: &str) -> Result<(), RagError> {
        let mut collections = self.collections.write().await;
        if !collections.contains_key(name) {
            collections.insert(name.to_string(), Vec::new());
            self.persist(&collections).await?;
        }
        Ok(())
    }

    async fn add(&self, name: &str, request: AddRequest) -> Result<usize, RagError> {
        let ids = request.resolved_ids()?;
        let embeddings = match &request.embeddings {
            Some(embeddings) => embeddings.clone(),
            None if request.documents.is_empty() => Vec::new(),
            None => self.embedder.embed(&request.documents).await?,
        };

        let mut collections = self.collections.write().await;
        let entries = collections.entry(name.to_string()).or_default();
        for (index, ((id, document), embedding)) in ids
            .into_iter()
            .zip(&request.documents)
            .zip(embeddings)
            .enumerate()
        {
            let entry = Entry {
                id,
                document: document.clone(),
                metadata: request.metadata_at(index),
                embedding,
            };
            match entries.iter_mut().find(|e| e.id == entry.id) {
                Some(existing) => *existing = entry,
                None => entries.push(entry),
            }
        }

        let written = request.documents.len();
        tracing::debug!(collection = name, written, total = entries.len(), "local add");
        self.persist(&collections).await?;
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
        let query_vector = match input {
            QueryInput::Embedding(v) => v.to_vec(),
            QueryInput::Text(text) => self
                .embedder
                .embed(&[text.to_string()])
                .await?
                .into_iter()
                .next()
                .unwrap_or_default(),
        };

        let collections = self.collections.read().await;
        let Some(entries) = collections.get(name) else {
            return Ok(Vec::new());
        };

        let mut hits: Vec<StoredDocument> = entries
            .iter()
            .map(|e| StoredDocument {
                id: e.id.clone(),
                document: e.document.clone(),
                metadata: e.metadata.clone(),
                similarity: cosine_similarity(&query_vector, &e.embedding),
            })
            .collect();
        // Stable: ties keep insertion order.
        hits.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        hits.truncate(top_k);
        Ok(hits)
    }

    async fn count(&self, name: &str) -> Result<usize, RagError> {
        Ok(self
            .collections
            .read()
            .await
            .get(name)
            .map_or(0, Vec::len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Maps each text to a vector keyed on a few words, so similarity is
    /// predictable without a model.
    struct KeywordEmbedder;

    #[async_trait]
    impl Embedder for KeywordEmbedder {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
            Ok(texts
                .iter()
                .map(|t| {
                    let t = t.to_lowercase();
                    vec![
                        f32::from(u8::from(t.contains("acme"))),
                        f32::from(u8::from(t.contains("widget"))),
                        1.0,
                    ]
                })
                .collect())
        }

        fn dimension(&self) -> usize {
            3
        }
    }

    fn store() -> LocalStore {
        LocalStore::in_memory(Arc::new(KeywordEmbedder))
    }

    fn docs(texts: &[&str]) -> AddRequest {
        AddRequest::new(texts.iter().map(|s| (*s).to_string()).collect(), Vec::new())
    }

    #[tokio::test]
    async fn query_ranks_by_similarity() {
        let store = store();
        store.ensure_collection("news").await.unwrap();
        store
            .add("news", docs(&["Widget Co misses forecast", "Acme beats earnings"]))
            .await
            .unwrap();

        let hits = store
            .query("news", QueryInput::Text("acme outlook"), 2)
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].document, "Acme beats earnings");
        assert!(hits[0].similarity > hits[1].similarity);
    }

    #[tokio::test]
    async fn query_respects_top_k() {
        let store = store();
        store.add("news", docs(&["a", "b", "c"])).await.unwrap();
        let hits = store
            .query("news", QueryInput::Embedding(&[0.0, 0.0, 1.0]), 2)
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "0");
        assert_eq!(hits[1].id, "1");
    }

    #[tokio::test]
    async fn unknown_collection_is_empty() {
        let hits = store()
            .query("missing", QueryInput::Text("anything"), 5)
            .await
            .unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn identical_reingest_keeps_count() {
        let store = store();
        store.add("news", docs(&["a", "b"])).await.unwrap();
        store.add("news", docs(&["a", "b"])).await.unwrap();
        assert_eq!(store.count("news").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn shorter_batch_leaves_stale_tail() {
        let store = store();
        store.add("news", docs(&["old 0", "old 1", "old 2"])).await.unwrap();
        store.add("news", docs(&["new 0"])).await.unwrap();

        assert_eq!(store.count("news").await.unwrap(), 3);
        let hits = store
            .query("news", QueryInput::Embedding(&[0.0, 0.0, 1.0]), 3)
            .await
            .unwrap();
        let texts: Vec<&str> = hits.iter().map(|h| h.document.as_str()).collect();
        assert_eq!(texts, vec!["new 0", "old 1", "old 2"]);
    }

    #[tokio::test]
    async fn precomputed_embeddings_skip_the_embedder() {
        let store = store();
        let mut request = docs(&["x"]);
        request.embeddings = Some(vec![vec![9.0, 0.0, 0.0]]);
        store.add("news", request).await.unwrap();

        let hits = store
            .query("news", QueryInput::Embedding(&[1.0, 0.0, 0.0]), 1)
            .await
            .unwrap();
        assert!((hits[0].similarity - 1.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn persisted_store_reopens_with_documents() {
        let dir = std::env::temp_dir().join(format!("newsdesk-store-{}", uuid::Uuid::new_v4()));
        let path = dir.join("collections.json");

        let store = LocalStore::open(Arc::new(KeywordEmbedder), &path).await.unwrap();
        let mut meta = Map::new();
        meta.insert("title".into(), Value::from("Acme Q3"));
        store
            .add(
                "news",
                AddRequest::new(vec!["Acme beats earnings".into()], vec![meta]),
            )
            .await
            .unwrap();
        drop(store);

        let reopened = LocalStore::open(Arc::new(KeywordEmbedder), &path).await.unwrap();
        let hits = reopened
            .query("news", QueryInput::Text("acme"), 1)
            .await
            .unwrap();
        assert_eq!(hits[0].metadata["title"], "Acme Q3");

        let _ = std::fs::remove_dir_all(dir);
    }
}
