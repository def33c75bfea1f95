//! # Recall Code Chunker
//!
//! Syntax-aware code chunking for semantic search.
//!
//! ## Philosophy
//!
//! Chunks follow the syntax tree rather than raw line counts:
//! - Functions, classes and other declarations become whole chunks
//! - Oversized declarations are refined into their children, then split by lines
//! - Fragments too small to carry meaning are merged with their neighbour
//!
//! ## Architecture
//!
//! ```text
//! Source Code
//!     │
//!     ├──> Language Detection (ParserRegistry, by extension)
//!     │
//!     ├──> SyntaxTreeProvider → SyntaxNode tree
//!     │         └─> unavailable / failed → fixed line windows (`line_based`)
//!     │
//!     ├──> Boundary walk
//!     │    ├─> emit boundary nodes that fit
//!     │    ├─> refine oversized nodes through children (depth-capped)
//!     │    └─> split unrefinable nodes by lines (`<kind>_split`)
//!     │
//!     └──> Merge pass (`<kind>_merged`)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use recall_code_chunker::Chunker;
//!
//! let chunker = Chunker::with_defaults();
//!
//! let code = r#"
//! fn process_data(input: &str) -> Result<String, String> {
//!     let cleaned = input.trim();
//!     Ok(cleaned.to_uppercase())
//! }
//! "#;
//!
//! for chunk in chunker.chunk(code, "example.rs") {
//!     println!("{} at lines {}-{}", chunk.node_kind, chunk.start_line, chunk.end_line);
//! }
//! ```

mod chunker;
mod config;
mod error;
mod language;
mod registry;
mod strategy;
mod syntax;
mod types;

pub use chunker::Chunker;
pub use config::{ChunkerConfig, DEFAULT_MAX_CHUNK_SIZE, DEFAULT_MAX_DEPTH, MIN_CHUNK_SIZE};
pub use error::{ChunkerError, Result};
pub use language::{Language, LanguageProfile};
pub use registry::ParserRegistry;
pub use syntax::{SyntaxNode, SyntaxTreeProvider, TreeSitterProvider};
pub use types::{CodeChunk, LINE_BASED_KIND, MERGED_SUFFIX, SPLIT_SUFFIX};
