//! Code search over chunked, token-enriched source files
//!
//! [`CodeIndex`] ties the pieces together: files found by [`FileScanner`] are
//! split by the chunker, enriched with identifier tokens from [`CodeTokenizer`],
//! embedded, and stored. Queries run as hybrid vector plus keyword searches.

mod config;
mod error;
mod keywords;
mod pipeline;
mod scanner;
mod tokenizer;

pub use config::{
    EmbeddingConfig, EmbeddingMode, SearchConfig, DEFAULT_EMBEDDING_DIMENSION,
    DEFAULT_EMBEDDING_MODEL, DEFAULT_LIMIT, DEFAULT_MAX_LIMIT, DEFAULT_VECTOR_WEIGHT,
};
pub use error::{Result, SearchError};
pub use keywords::{extract_keywords, is_stop_word};
pub use pipeline::{chunk_content, CodeIndex, IndexStats, TOKENS_MARKER};
pub use scanner::{FileScanner, ScanResult, MAX_FILE_SIZE_BYTES};
pub use tokenizer::{CodeTokenizer, TokenSet};
