use crate::error::{Result, VectorStoreError};
use crate::similarity::cosine_similarity;
use std::collections::{HashMap, HashSet};

/// Brute-force cosine index keyed by string id.
///
/// Vectors keep their insertion order, which also breaks score ties. The dimension is
/// fixed by the first vector added and released again when the index becomes empty.
#[derive(Debug, Default, Clone)]
pub struct FlatIndex {
    dimension: Option<usize>,
    ids: Vec<String>,
    vectors: Vec<Vec<f32>>,
    positions: HashMap<String, usize>,
}

impl FlatIndex {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// Check that `vector` could be added without changing the index dimension
    pub fn check_dimension(&self, vector: &[f32]) -> Result<()> {
        match self.dimension {
            Some(expected) if expected != vector.len() => Err(VectorStoreError::InvalidDimension {
                expected,
                actual: vector.len(),
            }),
            _ => Ok(()),
        }
    }

    /// Add or replace the vector stored under `id`
    pub fn upsert(&mut self, id: &str, vector: Vec<f32>) -> Result<()> {
        if vector.is_empty() {
            return Err(VectorStoreError::invalid_argument("vector must not be empty"));
        }
        self.check_dimension(&vector)?;

        if let Some(&pos) = self.positions.get(id) {
            self.vectors[pos] = vector;
        } else {
            self.dimension.get_or_insert(vector.len());
            self.positions.insert(id.to_string(), self.ids.len());
            self.ids.push(id.to_string());
            self.vectors.push(vector);
        }
        Ok(())
    }

    /// Remove a vector; returns whether it was present
    pub fn remove(&mut self, id: &str) -> bool {
        let Some(pos) = self.positions.remove(id) else {
            return false;
        };

        self.ids.remove(pos);
        self.vectors.remove(pos);
        for shifted in &self.ids[pos..] {
            if let Some(p) = self.positions.get_mut(shifted) {
                *p -= 1;
            }
        }

        if self.ids.is_empty() {
            self.dimension = None;
        }
        true
    }

    /// Remove every listed id in a single compaction pass; returns how many were present
    pub fn remove_all<'a>(&mut self, ids: impl IntoIterator<Item = &'a str>) -> usize {
        let doomed: HashSet<usize> = ids
            .into_iter()
            .filter_map(|id| self.positions.get(id).copied())
            .collect();
        if doomed.is_empty() {
            return 0;
        }

        let ids = std::mem::take(&mut self.ids);
        let vectors = std::mem::take(&mut self.vectors);
        self.positions.clear();
        for (pos, (id, vector)) in ids.into_iter().zip(vectors).enumerate() {
            if doomed.contains(&pos) {
                continue;
            }
            self.positions.insert(id.clone(), self.ids.len());
            self.ids.push(id);
            self.vectors.push(vector);
        }

        if self.ids.is_empty() {
            self.dimension = None;
        }
        doomed.len()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&[f32]> {
        self.positions.get(id).map(|&pos| self.vectors[pos].as_slice())
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.positions.contains_key(id)
    }

    /// Search for k nearest neighbors using cosine similarity.
    /// Returns (id, score) sorted by score descending.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(&str, f32)>> {
        if k == 0 || self.ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut scores = Vec::with_capacity(self.ids.len());
        for (id, vector) in self.ids.iter().zip(&self.vectors) {
            scores.push((id.as_str(), cosine_similarity(query, vector)?));
        }

        // Stable sort keeps insertion order between equal scores
        scores.sort_by(|a, b| b.1.total_cmp(&a.1));
        scores.truncate(k);

        Ok(scores)
    }

    /// Ids in insertion order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
        self.vectors.clear();
        self.positions.clear();
        self.dimension = None;
    }
}
