use serde::{Deserialize, Serialize};

/// Chunks shorter than this (in bytes) are too small to carry meaning on their own.
pub const MIN_CHUNK_SIZE: usize = 100;

/// Default upper bound for a single chunk (in bytes).
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 2000;

/// Recursion budget for refining oversized boundary nodes.
pub const DEFAULT_MAX_DEPTH: usize = 5;

/// Configuration for code chunking behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkerConfig {
    /// Maximum chunk size in bytes (hard limit for boundary chunks)
    pub max_chunk_size: usize,

    /// Minimum chunk size in bytes (smaller fragments get merged or dropped)
    pub min_chunk_size: usize,

    /// How many times an oversized boundary node may be refined into its children
    pub max_depth: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
            min_chunk_size: MIN_CHUNK_SIZE,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ChunkerConfig {
    /// Create config optimized for embeddings (smaller, focused chunks)
    pub fn for_embeddings() -> Self {
        Self {
            max_chunk_size: 1500,
            ..Default::default()
        }
    }

    /// Create config optimized for LLM context (larger, comprehensive chunks)
    pub fn for_llm_context() -> Self {
        Self {
            max_chunk_size: 4000,
            ..Default::default()
        }
    }

    /// Lines per window when no syntax tree is available.
    #[must_use]
    pub fn fallback_window_lines(&self) -> usize {
        (self.max_chunk_size / 50).max(10)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_chunk_size == 0 {
            return Err("max_chunk_size must be > 0".to_string());
        }

        if self.min_chunk_size > self.max_chunk_size {
            return Err(format!(
                "min_chunk_size ({}) cannot exceed max_chunk_size ({})",
                self.min_chunk_size, self.max_chunk_size
            ));
        }

        Ok(())
    }
}
