use crate::error::{Result, VectorStoreError};
use crate::flat_index::FlatIndex;
use crate::types::{matches_filter, EmbeddingEntry, Metadata, SearchResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Candidates fetched per requested result before metadata filtering
pub const FILTER_OVERFETCH: usize = 3;

/// Candidates fetched per requested result before keyword re-scoring
pub const HYBRID_OVERFETCH: usize = 2;

/// Storage and retrieval of embedded text.
///
/// Implementations assume a single writer; reads may be shared.
pub trait VectorStore: Send + Sync {
    /// Insert or overwrite one entry
    fn store(&mut self, id: &str, vector: Vec<f32>, text: &str, metadata: Metadata) -> Result<()>;

    /// Insert or overwrite many entries. Nothing is written if any entry is invalid.
    fn store_batch(&mut self, entries: Vec<EmbeddingEntry>) -> Result<()>;

    /// Up to `limit` entries by descending cosine similarity
    fn search(&self, query: &[f32], limit: usize) -> Result<Vec<SearchResult>>;

    /// Vector search restricted to entries whose metadata matches every key of `filter`.
    ///
    /// Only the best `3 * limit` vector candidates are filtered, so a highly selective
    /// filter can return fewer than `limit` results even when more matches exist.
    fn search_with_filter(
        &self,
        query: &[f32],
        limit: usize,
        filter: &Metadata,
    ) -> Result<Vec<SearchResult>>;

    /// Vector candidates re-scored by case-insensitive keyword containment:
    /// `score * vector_weight + keyword_fraction * (1 - vector_weight)`.
    fn hybrid_search(
        &self,
        query: &[f32],
        keywords: &[String],
        limit: usize,
        vector_weight: f32,
    ) -> Result<Vec<SearchResult>>;

    fn get(&self, id: &str) -> Option<EmbeddingEntry>;

    /// Remove one entry; returns whether it existed
    fn delete(&mut self, id: &str) -> bool;

    /// Remove every entry matching `filter`; returns how many were removed
    fn delete_by_metadata(&mut self, filter: &Metadata) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn clear(&mut self);

    /// Flush to durable storage, if the implementation has any
    fn persist(&self) -> Result<()>;
}

#[derive(Debug, Clone)]
struct Record {
    text: String,
    metadata: Metadata,
}

#[derive(Serialize, Deserialize)]
struct Snapshot {
    dimension: Option<usize>,
    entries: Vec<EmbeddingEntry>,
}

/// In-memory store over a brute-force index.
///
/// Deleting (by id, by metadata, or via `clear`) also drops the vector from the
/// index, so every stored id always has exactly one vector.
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    records: HashMap<String, Record>,
    index: FlatIndex,
    snapshot_path: Option<PathBuf>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose `persist` writes a JSON snapshot to `path`
    pub fn with_snapshot_path(path: impl AsRef<Path>) -> Self {
        Self {
            snapshot_path: Some(path.as_ref().to_path_buf()),
            ..Self::default()
        }
    }

    /// Restore a store from a snapshot written by `persist`
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::info!("Loading vector store from {}", path.display());

        if !path.exists() {
            return Err(VectorStoreError::NotFound(format!(
                "no snapshot at {}",
                path.display()
            )));
        }
        let data = std::fs::read_to_string(path)?;
        let snapshot: Snapshot = serde_json::from_str(&data)?;

        let mut store = Self::with_snapshot_path(path);
        store.store_batch(snapshot.entries)?;
        if let (Some(expected), Some(actual)) = (snapshot.dimension, store.dimension()) {
            if expected != actual {
                return Err(VectorStoreError::InvalidDimension { expected, actual });
            }
        }

        log::info!("Loaded {} entries", store.len());
        Ok(store)
    }

    #[must_use]
    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot_path.as_deref()
    }

    /// Vector dimension, fixed by the first stored entry
    #[must_use]
    pub const fn dimension(&self) -> Option<usize> {
        self.index.dimension()
    }

    /// All ids, in insertion order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.index.ids()
    }

    fn validate(id: &str, vector: &[f32]) -> Result<()> {
        if id.is_empty() {
            return Err(VectorStoreError::invalid_argument("id must not be empty"));
        }
        if vector.is_empty() {
            return Err(VectorStoreError::invalid_argument(format!(
                "vector for '{id}' must not be empty"
            )));
        }
        Ok(())
    }

    fn to_result(&self, id: &str, score: f32) -> Option<SearchResult> {
        self.records.get(id).map(|record| SearchResult {
            id: Some(id.to_string()),
            text: record.text.clone(),
            metadata: record.metadata.clone(),
            score,
        })
    }

    fn ranked(&self, query: &[f32], limit: usize) -> Result<Vec<SearchResult>> {
        if query.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        Ok(self
            .index
            .search(query, limit)?
            .into_iter()
            .filter_map(|(id, score)| self.to_result(id, score))
            .collect())
    }

    fn snapshot(&self) -> Snapshot {
        let entries = self
            .index
            .ids()
            .filter_map(|id| self.get(id))
            .collect();
        Snapshot {
            dimension: self.index.dimension(),
            entries,
        }
    }
}

impl VectorStore for InMemoryVectorStore {
    fn store(&mut self, id: &str, vector: Vec<f32>, text: &str, metadata: Metadata) -> Result<()> {
        Self::validate(id, &vector)?;
        self.index.upsert(id, vector)?;
        self.records.insert(
            id.to_string(),
            Record {
                text: text.to_string(),
                metadata,
            },
        );
        Ok(())
    }

    fn store_batch(&mut self, entries: Vec<EmbeddingEntry>) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }

        let mut expected = self.index.dimension();
        for entry in &entries {
            Self::validate(&entry.id, &entry.vector)?;
            let dimension = *expected.get_or_insert(entry.vector.len());
            if dimension != entry.vector.len() {
                return Err(VectorStoreError::InvalidDimension {
                    expected: dimension,
                    actual: entry.vector.len(),
                });
            }
        }

        let count = entries.len();
        for entry in entries {
            self.index.upsert(&entry.id, entry.vector)?;
            self.records.insert(
                entry.id,
                Record {
                    text: entry.text,
                    metadata: entry.metadata,
                },
            );
        }

        log::info!("Stored {count} entries. Total: {}", self.records.len());
        Ok(())
    }

    fn search(&self, query: &[f32], limit: usize) -> Result<Vec<SearchResult>> {
        let results = self.ranked(query, limit)?;
        log::debug!("Vector search returned {} results (limit {limit})", results.len());
        Ok(results)
    }

    fn search_with_filter(
        &self,
        query: &[f32],
        limit: usize,
        filter: &Metadata,
    ) -> Result<Vec<SearchResult>> {
        let mut results = self.ranked(query, limit.saturating_mul(FILTER_OVERFETCH))?;
        results.retain(|result| matches_filter(&result.metadata, filter));
        results.truncate(limit);
        Ok(results)
    }

    fn hybrid_search(
        &self,
        query: &[f32],
        keywords: &[String],
        limit: usize,
        vector_weight: f32,
    ) -> Result<Vec<SearchResult>> {
        let mut candidates = self.ranked(query, limit.saturating_mul(HYBRID_OVERFETCH))?;
        if keywords.is_empty() {
            candidates.truncate(limit);
            return Ok(candidates);
        }

        let keywords: Vec<String> = keywords.iter().map(|k| k.to_lowercase()).collect();
        let keyword_weight = 1.0 - vector_weight;

        let mut rescored: Vec<SearchResult> = candidates
            .into_iter()
            .filter_map(|mut result| {
                let text = result.text.to_lowercase();
                let hits = keywords.iter().filter(|k| text.contains(k.as_str())).count();
                let keyword_score = hits as f32 / keywords.len() as f32;

                result.score = result.score * vector_weight + keyword_score * keyword_weight;
                (result.score > 0.0).then_some(result)
            })
            .collect();

        rescored.sort_by(|a, b| b.score.total_cmp(&a.score));
        rescored.truncate(limit);

        log::debug!(
            "Hybrid search over {} keywords returned {} results",
            keywords.len(),
            rescored.len()
        );
        Ok(rescored)
    }

    fn get(&self, id: &str) -> Option<EmbeddingEntry> {
        let record = self.records.get(id)?;
        let vector = self.index.get(id)?;
        Some(EmbeddingEntry {
            id: id.to_string(),
            vector: vector.to_vec(),
            text: record.text.clone(),
            metadata: record.metadata.clone(),
        })
    }

    fn delete(&mut self, id: &str) -> bool {
        let removed = self.records.remove(id).is_some();
        self.index.remove(id);
        removed
    }

    fn delete_by_metadata(&mut self, filter: &Metadata) -> usize {
        if filter.is_empty() {
            return 0;
        }

        let doomed: Vec<String> = self
            .records
            .iter()
            .filter(|(_, record)| matches_filter(&record.metadata, filter))
            .map(|(id, _)| id.clone())
            .collect();

        for id in &doomed {
            self.records.remove(id);
        }
        self.index.remove_all(doomed.iter().map(String::as_str));
        doomed.len()
    }

    fn len(&self) -> usize {
        self.records.len()
    }

    fn clear(&mut self) {
        self.records.clear();
        self.index.clear();
    }

    fn persist(&self) -> Result<()> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };

        log::info!("Saving vector store to {}", path.display());
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let data = serde_json::to_vec(&self.snapshot())?;
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, data)?;
        std::fs::rename(&tmp, path)?;

        log::info!("Vector store saved ({} entries)", self.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::TempDir;

    fn meta(path: &str) -> Metadata {
        Metadata::from([("path".to_string(), json!(path))])
    }

    fn abc_store() -> InMemoryVectorStore {
        let mut store = InMemoryVectorStore::new();
        store
            .store("a", vec![1.0, 0.0, 0.0, 0.0], "alpha parser", meta("a.rs"))
            .unwrap();
        store
            .store("b", vec![0.0, 1.0, 0.0, 0.0], "beta parser", meta("b.rs"))
            .unwrap();
        store
            .store("c", vec![0.9, 0.1, 0.0, 0.0], "gamma lexer", meta("a.rs"))
            .unwrap();
        store
    }

    fn ids(results: &[SearchResult]) -> Vec<&str> {
        results.iter().filter_map(|r| r.id.as_deref()).collect()
    }

    #[test]
    fn test_search_orders_by_similarity() {
        let store = abc_store();
        let results = store.search(&[1.0, 0.0, 0.0, 0.0], 2).unwrap();

        assert_eq!(ids(&results), vec!["a", "c"]);
        assert!((results[0].score - 1.0).abs() < 1e-6);
        assert!(results[1].score > 0.9);
        assert_eq!(results[0].text, "alpha parser");
    }

    #[test]
    fn test_search_degenerate_inputs() {
        let store = abc_store();
        assert!(store.search(&[], 5).unwrap().is_empty());
        assert!(store.search(&[1.0, 0.0, 0.0, 0.0], 0).unwrap().is_empty());
        assert!(matches!(
            store.search(&[1.0, 0.0], 3),
            Err(VectorStoreError::InvalidDimension { .. })
        ));
    }

    #[test]
    fn test_store_rejects_invalid_input() {
        let mut store = InMemoryVectorStore::new();
        assert!(matches!(
            store.store("", vec![1.0], "t", Metadata::new()),
            Err(VectorStoreError::InvalidArgument(_))
        ));
        assert!(matches!(
            store.store("x", Vec::new(), "t", Metadata::new()),
            Err(VectorStoreError::InvalidArgument(_))
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_overwrites_same_id() {
        let mut store = abc_store();
        store
            .store("a", vec![0.0, 0.0, 1.0, 0.0], "replaced", Metadata::new())
            .unwrap();

        assert_eq!(store.len(), 3);
        let entry = store.get("a").unwrap();
        assert_eq!(entry.text, "replaced");
        assert_eq!(entry.vector, vec![0.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_store_batch_is_all_or_nothing() {
        let mut store = abc_store();
        let entries = vec![
            EmbeddingEntry::new("d", vec![0.0, 0.0, 0.0, 1.0], "delta", Metadata::new()),
            EmbeddingEntry::new("e", vec![1.0, 1.0], "epsilon", Metadata::new()),
        ];

        assert!(store.store_batch(entries).is_err());
        assert_eq!(store.len(), 3);
        assert!(store.get("d").is_none());

        store.store_batch(Vec::new()).unwrap();
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_search_with_filter() {
        let store = abc_store();
        let results = store
            .search_with_filter(&[0.0, 1.0, 0.0, 0.0], 5, &meta("a.rs"))
            .unwrap();
        assert_eq!(ids(&results), vec!["c", "a"]);

        let missing = store
            .search_with_filter(&[1.0, 0.0, 0.0, 0.0], 5, &meta("z.rs"))
            .unwrap();
        assert!(missing.is_empty());
    }

    #[test]
    fn test_filter_under_fetch() {
        let mut store = InMemoryVectorStore::new();
        for i in 0..10 {
            store
                .store(&format!("n{i}"), vec![1.0, i as f32 * 0.01], "noise", meta("noise.rs"))
                .unwrap();
        }
        store
            .store("target", vec![0.0, 1.0], "target", meta("target.rs"))
            .unwrap();

        // Only the best 3 candidates are inspected
        let results = store
            .search_with_filter(&[1.0, 0.0], 1, &meta("target.rs"))
            .unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_hybrid_without_keywords_matches_search() {
        let store = abc_store();
        let query = [0.7, 0.3, 0.0, 0.0];
        assert_eq!(
            store.hybrid_search(&query, &[], 2, 0.7).unwrap(),
            store.search(&query, 2).unwrap()
        );
    }

    #[test]
    fn test_hybrid_full_vector_weight_keeps_vector_order() {
        let store = abc_store();
        let query = [1.0, 0.0, 0.0, 0.0];
        let keywords = vec!["beta".to_string()];

        let hybrid = store.hybrid_search(&query, &keywords, 3, 1.0).unwrap();
        let plain = store.search(&query, 3).unwrap();
        let positive: Vec<_> = plain.iter().filter(|r| r.score > 0.0).cloned().collect();
        assert_eq!(ids(&hybrid), ids(&positive));
    }

    #[test]
    fn test_hybrid_keywords_rerank() {
        let store = abc_store();
        let keywords = vec!["LEXER".to_string(), "gamma".to_string()];

        let results = store
            .hybrid_search(&[1.0, 0.0, 0.0, 0.0], &keywords, 2, 0.5)
            .unwrap();
        assert_eq!(ids(&results), vec!["c", "a"]);
        // 0.5 * cos(c) + 0.5 * 1.0
        assert!(results[0].score > 0.95);
        assert!((results[1].score - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_hybrid_drops_non_positive_scores() {
        let store = abc_store();
        let keywords = vec!["nothing-matches".to_string()];
        let results = store
            .hybrid_search(&[0.0, 0.0, 1.0, 0.0], &keywords, 3, 0.7)
            .unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_delete_and_delete_by_metadata() {
        let mut store = abc_store();
        assert!(store.delete("b"));
        assert!(!store.delete("b"));

        assert_eq!(store.delete_by_metadata(&Metadata::new()), 0);
        assert_eq!(store.delete_by_metadata(&meta("a.rs")), 2);
        assert!(store.is_empty());
        assert!(store.search(&[1.0, 0.0, 0.0, 0.0], 5).unwrap().is_empty());
    }

    #[test]
    fn test_clear_drops_vectors() {
        let mut store = abc_store();
        store.clear();
        assert_eq!(store.len(), 0);
        assert_eq!(store.dimension(), None);
        store.store("x", vec![1.0, 2.0], "two dims", Metadata::new()).unwrap();
    }

    #[test]
    fn test_persist_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("index").join("store.json");

        let mut store = abc_store();
        store.snapshot_path = Some(path.clone());
        store.persist().unwrap();
        assert!(!path.with_extension("tmp").exists());

        let loaded = InMemoryVectorStore::load(&path).unwrap();
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded.ids().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(loaded.get("c"), store.get("c"));
        assert_eq!(loaded.snapshot_path(), Some(path.as_path()));
    }

    #[test]
    fn test_load_missing_snapshot_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let result = InMemoryVectorStore::load(temp_dir.path().join("absent.json"));
        assert!(matches!(result, Err(VectorStoreError::NotFound(_))));
    }

    #[test]
    fn test_persist_without_path_is_noop() {
        abc_store().persist().unwrap();
    }
}
