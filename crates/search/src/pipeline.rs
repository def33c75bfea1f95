use crate::config::SearchConfig;
use crate::error::{Result, SearchError};
use crate::keywords::extract_keywords;
use crate::scanner::FileScanner;
use crate::tokenizer::CodeTokenizer;
use recall_code_chunker::{Chunker, CodeChunk, ParserRegistry};
use recall_vector_store::{
    ConcurrentEmbedder, EmbeddingEntry, EmbeddingService, Metadata, SearchResult, VectorStore,
};
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Separator between chunk content and its token line in stored text
pub const TOKENS_MARKER: &str = "\n\nTokens: ";

/// Upper bound on enrichment tokens per chunk
const MAX_ENRICHMENT_TOKENS: usize = 64;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub files_indexed: usize,
    pub files_skipped: usize,
    pub chunks_indexed: usize,
}

/// Chunks, enriches, embeds and stores source files; answers queries against them.
pub struct CodeIndex<S: VectorStore> {
    chunker: Chunker,
    tokenizer: CodeTokenizer,
    embedder: ConcurrentEmbedder,
    store: S,
    config: SearchConfig,
}

impl<S: VectorStore> CodeIndex<S> {
    /// Built-in languages and the embedding backend named by `config`
    pub fn new(config: SearchConfig, store: S) -> Result<Self> {
        let service = config.embedding.build_service()?;
        Self::with_parts(
            config,
            store,
            service,
            Arc::new(ParserRegistry::with_defaults()),
        )
    }

    pub fn with_parts(
        mut config: SearchConfig,
        store: S,
        service: Arc<dyn EmbeddingService>,
        registry: Arc<ParserRegistry>,
    ) -> Result<Self> {
        config.validate_and_normalize()?;
        let chunker = Chunker::new(config.chunker, registry)?;
        let embedder = ConcurrentEmbedder::new(service, config.embedding.workers);

        Ok(Self {
            chunker,
            tokenizer: CodeTokenizer::new(),
            embedder,
            store,
            config,
        })
    }

    pub const fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub const fn chunker(&self) -> &Chunker {
        &self.chunker
    }

    /// Replace everything stored for `path` with fresh chunks of `content`
    pub async fn index_source(&mut self, path: &str, content: &str) -> Result<usize> {
        let removed = self.store.delete_by_metadata(&path_filter(path));
        if removed > 0 {
            log::debug!("Removed {removed} stale chunks for {path}");
        }

        let chunks = self.chunker.chunk(content, path);
        if chunks.is_empty() {
            return Ok(0);
        }

        let language = self
            .chunker
            .registry()
            .language_for_path(path)
            .map(|profile| profile.id.clone());

        let texts: Vec<String> = chunks.iter().map(|chunk| self.enrich(chunk)).collect();
        let vectors = self.embedder.embed_batch(&texts).await?;

        let entries: Vec<EmbeddingEntry> = chunks
            .iter()
            .zip(entry_ids(&chunks))
            .zip(texts)
            .zip(vectors)
            .map(|(((chunk, id), text), vector)| {
                EmbeddingEntry::new(
                    id,
                    vector,
                    text,
                    chunk_metadata(chunk, language.as_deref()),
                )
            })
            .collect();

        let count = entries.len();
        self.store.store_batch(entries)?;
        Ok(count)
    }

    pub async fn index_file(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await?;
        self.index_source(&path.to_string_lossy(), &content).await
    }

    /// Index every file of a registered language under `root`. Stored paths are
    /// relative to `root`; unreadable files are skipped.
    pub async fn index_directory(&mut self, root: impl AsRef<Path>) -> Result<IndexStats> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(SearchError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} is not a directory", root.display()),
            )));
        }

        let scan = FileScanner::new(root, self.chunker.registry()).scan();
        let mut stats = IndexStats {
            files_skipped: scan.skipped,
            ..IndexStats::default()
        };

        for file in scan.files {
            let relative = file.strip_prefix(root).unwrap_or(&file);
            let display = relative.to_string_lossy().replace('\\', "/");

            let content = match tokio::fs::read_to_string(&file).await {
                Ok(content) => content,
                Err(e) => {
                    log::warn!("Skipping {display}: {e}");
                    stats.files_skipped += 1;
                    continue;
                }
            };

            stats.chunks_indexed += self.index_source(&display, &content).await?;
            stats.files_indexed += 1;
        }

        log::info!(
            "Indexed {} files ({} chunks, {} skipped) under {}",
            stats.files_indexed,
            stats.chunks_indexed,
            stats.files_skipped,
            root.display()
        );
        Ok(stats)
    }

    /// Hybrid (or pure vector) search for a natural-language query
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        let limit = self.config.effective_limit(Some(limit));
        let vector = self.embedder.embed(query).await?;

        let results = if self.config.use_hybrid_search {
            let keywords = extract_keywords(query);
            log::debug!("Hybrid search for '{query}' with keywords {keywords:?}");
            self.store
                .hybrid_search(&vector, &keywords, limit, self.config.vector_weight)?
        } else {
            log::debug!("Vector search for '{query}'");
            self.store.search(&vector, limit)?
        };

        Ok(results)
    }

    /// Vector search restricted to chunks of one file
    pub async fn search_in_path(
        &self,
        query: &str,
        limit: usize,
        path: &str,
    ) -> Result<Vec<SearchResult>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        let limit = self.config.effective_limit(Some(limit));
        let vector = self.embedder.embed(query).await?;
        Ok(self
            .store
            .search_with_filter(&vector, limit, &path_filter(path))?)
    }

    pub fn persist(&self) -> Result<()> {
        Ok(self.store.persist()?)
    }

    fn enrich(&self, chunk: &CodeChunk) -> String {
        let tokens = self
            .tokenizer
            .identifier_tokens(&chunk.content, MAX_ENRICHMENT_TOKENS);
        if tokens.is_empty() {
            return chunk.content.clone();
        }
        format!("{}{TOKENS_MARKER}{}", chunk.content, tokens.join(" "))
    }
}

/// Stored text without the enrichment token line
#[must_use]
pub fn chunk_content(text: &str) -> &str {
    text.split_once(TOKENS_MARKER).map_or(text, |(content, _)| content)
}

/// `path:start:end` per chunk; chunks sharing a line span (several declarations on one
/// line) get `#2`, `#3`, ... in chunk order.
fn entry_ids(chunks: &[CodeChunk]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    chunks
        .iter()
        .map(|chunk| {
            let id = chunk.chunk_id();
            let count = seen.entry(id.clone()).or_insert(0);
            *count += 1;
            if *count == 1 {
                id
            } else {
                format!("{id}#{count}")
            }
        })
        .collect()
}

fn path_filter(path: &str) -> Metadata {
    Metadata::from([("path".to_string(), json!(path))])
}

fn chunk_metadata(chunk: &CodeChunk, language: Option<&str>) -> Metadata {
    Metadata::from([
        ("path".to_string(), json!(chunk.source_path)),
        ("start_line".to_string(), json!(chunk.start_line)),
        ("end_line".to_string(), json!(chunk.end_line)),
        ("node_kind".to_string(), json!(chunk.node_kind)),
        ("language".to_string(), json!(language)),
    ])
}
