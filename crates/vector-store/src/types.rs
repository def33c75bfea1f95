use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Free-form entry metadata. A JSON `null` value and a missing key both mean "nothing".
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// One stored vector with the text it was computed from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingEntry {
    pub id: String,
    pub vector: Vec<f32>,
    pub text: String,
    #[serde(default)]
    pub metadata: Metadata,
}

impl EmbeddingEntry {
    pub fn new(
        id: impl Into<String>,
        vector: Vec<f32>,
        text: impl Into<String>,
        metadata: Metadata,
    ) -> Self {
        Self {
            id: id.into(),
            vector,
            text: text.into(),
            metadata,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: Option<String>,
    pub text: String,
    pub metadata: Metadata,
    /// Cosine similarity, or the weighted combination for hybrid search
    pub score: f32,
}

/// Whether `metadata` satisfies every key of `filter` by exact value equality.
/// A filter value of `null` requires the entry to have nothing under that key.
#[must_use]
pub fn matches_filter(metadata: &Metadata, filter: &Metadata) -> bool {
    filter.iter().all(|(key, expected)| {
        let actual = metadata.get(key).filter(|value| !value.is_null());
        if expected.is_null() {
            actual.is_none()
        } else {
            actual == Some(expected)
        }
    })
}
