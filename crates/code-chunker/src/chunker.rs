use crate::config::ChunkerConfig;
use crate::error::{ChunkerError, Result};
use crate::language::LanguageProfile;
use crate::registry::ParserRegistry;
use crate::strategy::LineSplitter;
use crate::syntax::SyntaxNode;
use crate::types::CodeChunk;
use std::path::Path;
use std::sync::Arc;

/// Main chunker interface for processing code
pub struct Chunker {
    config: ChunkerConfig,
    registry: Arc<ParserRegistry>,
    splitter: LineSplitter,
}

/// Per-file state threaded through the tree walk
struct WalkContext<'a> {
    source: &'a str,
    file_path: &'a str,
    profile: &'a LanguageProfile,
}

impl Chunker {
    /// Create a new chunker over a shared parser registry
    pub fn new(config: ChunkerConfig, registry: Arc<ParserRegistry>) -> Result<Self> {
        config.validate().map_err(ChunkerError::invalid_config)?;
        Ok(Self {
            config,
            registry,
            splitter: LineSplitter::new(config),
        })
    }

    /// Default configuration with every built-in language
    pub fn with_defaults() -> Self {
        let config = ChunkerConfig::default();
        Self {
            config,
            registry: Arc::new(ParserRegistry::with_defaults()),
            splitter: LineSplitter::new(config),
        }
    }

    #[must_use]
    pub const fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<ParserRegistry> {
        &self.registry
    }

    /// Chunk source text. The language comes from `file_path`'s extension; when no
    /// tree can be produced the content is cut into fixed line windows instead.
    pub fn chunk(&self, content: &str, file_path: &str) -> Vec<CodeChunk> {
        let Some(profile) = self.registry.language_for_path(file_path) else {
            log::warn!("No language registered for {file_path}, using line-based chunking");
            return self.line_fallback(content, file_path);
        };

        let Some(provider) = self.registry.provider(&profile.id) else {
            log::warn!(
                "No parser available for {} ({file_path}), using line-based chunking",
                profile.id
            );
            return self.line_fallback(content, file_path);
        };

        let root = match provider.parse(content) {
            Ok(root) => root,
            Err(e) => {
                log::warn!("Parsing {file_path} failed, using line-based chunking: {e}");
                return self.line_fallback(content, file_path);
            }
        };

        let ctx = WalkContext {
            source: content,
            file_path,
            profile,
        };
        let mut chunks = Vec::new();
        self.visit(&root, &ctx, 0, &mut chunks);

        let chunks = self.merge_small_adjacent_chunks(chunks);
        log::debug!("Chunked {file_path} ({}) into {} chunks", profile.id, chunks.len());
        chunks
    }

    /// Chunk code from a file
    pub fn chunk_file(&self, path: impl AsRef<Path>) -> Result<Vec<CodeChunk>> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let file_path = path.to_string_lossy();

        Ok(self.chunk(&content, &file_path))
    }

    fn line_fallback(&self, content: &str, file_path: &str) -> Vec<CodeChunk> {
        let chunks = self.splitter.line_windows(content, file_path);
        log::debug!("Line-based chunking of {file_path} produced {} chunks", chunks.len());
        chunks
    }

    fn visit(&self, node: &SyntaxNode, ctx: &WalkContext<'_>, depth: usize, out: &mut Vec<CodeChunk>) {
        let text = node.text(ctx.source);
        if text.trim().is_empty() {
            return;
        }

        let min = self.config.min_chunk_size;

        if ctx.profile.is_boundary(&node.kind) && text.len() >= min {
            if text.len() <= self.config.max_chunk_size {
                out.push(CodeChunk::new(
                    text.to_string(),
                    ctx.file_path,
                    node.start_line(),
                    node.end_line(),
                    node.kind.as_str(),
                ));
            } else if depth < self.config.max_depth && !node.is_leaf() {
                for child in &node.children {
                    self.visit(child, ctx, depth + 1, out);
                }
            } else {
                out.extend(self.splitter.split_oversized(
                    text,
                    ctx.file_path,
                    &node.kind,
                    node.start_line(),
                ));
            }
            return;
        }

        if !node.is_leaf() {
            // Searching for boundaries does not spend the depth budget
            for child in &node.children {
                self.visit(child, ctx, depth, out);
            }
        } else if text.trim().len() >= min {
            out.push(CodeChunk::new(
                text.to_string(),
                ctx.file_path,
                node.start_line(),
                node.end_line(),
                node.kind.as_str(),
            ));
        }
    }

    /// Single left-to-right pass; a merged chunk is not reconsidered.
    fn merge_small_adjacent_chunks(&self, chunks: Vec<CodeChunk>) -> Vec<CodeChunk> {
        let mut merged = Vec::with_capacity(chunks.len());
        let mut iter = chunks.into_iter().peekable();

        while let Some(current) = iter.next() {
            let absorbs_next = current.size < self.config.min_chunk_size
                && iter
                    .peek()
                    .is_some_and(|next| current.size + next.size <= self.config.max_chunk_size);

            if absorbs_next {
                if let Some(next) = iter.next() {
                    merged.push(current.merged_with(&next));
                    continue;
                }
            }
            merged.push(current);
        }

        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::SyntaxTreeProvider;
    use pretty_assertions::assert_eq;

    /// Returns a fixed tree regardless of input.
    struct StaticTree(SyntaxNode);

    impl SyntaxTreeProvider for StaticTree {
        fn parse(&self, _source: &str) -> Result<SyntaxNode> {
            Ok(self.0.clone())
        }
    }

    struct FailingProvider;

    impl SyntaxTreeProvider for FailingProvider {
        fn parse(&self, _source: &str) -> Result<SyntaxNode> {
            Err(ChunkerError::parse("boom"))
        }
    }

    fn chunker_with(provider: Arc<dyn SyntaxTreeProvider>, config: ChunkerConfig) -> Chunker {
        let mut registry = ParserRegistry::new();
        registry.register(
            LanguageProfile::new("toy")
                .extensions(["toy"])
                .boundary_kinds(["function", "class"]),
            provider,
        );
        Chunker::new(config, Arc::new(registry)).unwrap()
    }

    /// Source made of `lines` lines of `width` bytes each.
    fn block(lines: usize, width: usize) -> String {
        (0..lines)
            .map(|i| format!("{:<width$}", format!("line{i}"), width = width))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn line_offsets(source: &str) -> Vec<usize> {
        std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect()
    }

    fn span(source: &str, kind: &str, first_row: usize, last_row: usize) -> SyntaxNode {
        let offsets = line_offsets(source);
        let start = offsets[first_row];
        let end = offsets
            .get(last_row + 1)
            .map_or(source.len(), |next| next - 1);
        SyntaxNode::leaf(kind, start, end, first_row, last_row)
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ChunkerConfig {
            max_chunk_size: 50,
            min_chunk_size: 100,
            ..Default::default()
        };
        let result = Chunker::new(config, Arc::new(ParserRegistry::new()));
        assert!(matches!(result, Err(ChunkerError::InvalidConfig(_))));
    }

    #[test]
    fn test_boundary_node_emitted_whole() {
        let source = block(4, 40);
        let root = SyntaxNode::leaf("file", 0, source.len(), 0, 3)
            .with_children(vec![span(&source, "function", 0, 3)]);
        let chunker = chunker_with(Arc::new(StaticTree(root)), ChunkerConfig::default());

        let chunks = chunker.chunk(&source, "a.toy");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].node_kind, "function");
        assert_eq!((chunks[0].start_line, chunks[0].end_line), (1, 4));
        assert_eq!(chunks[0].content, source);
    }

    #[test]
    fn test_oversized_boundary_refines_into_children() {
        let source = block(20, 30);
        let class = span(&source, "class", 0, 19).with_children(vec![
            span(&source, "function", 1, 6),
            span(&source, "function", 8, 13),
        ]);
        let root = SyntaxNode::leaf("file", 0, source.len(), 0, 19).with_children(vec![class]);
        let config = ChunkerConfig {
            max_chunk_size: 400,
            ..Default::default()
        };
        let chunker = chunker_with(Arc::new(StaticTree(root)), config);

        let chunks = chunker.chunk(&source, "a.toy");
        let spans: Vec<_> = chunks
            .iter()
            .map(|c| (c.node_kind.as_str(), c.start_line, c.end_line))
            .collect();
        assert_eq!(spans, vec![("function", 2, 7), ("function", 9, 14)]);
    }

    #[test]
    fn test_oversized_leaf_is_split() {
        let source = block(30, 30);
        let root = SyntaxNode::leaf("file", 0, source.len(), 0, 29)
            .with_children(vec![span(&source, "class", 0, 29)]);
        let config = ChunkerConfig {
            max_chunk_size: 400,
            ..Default::default()
        };
        let chunker = chunker_with(Arc::new(StaticTree(root)), config);

        let chunks = chunker.chunk(&source, "a.toy");
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.is_split(), "unexpected kind {}", chunk.node_kind);
            assert!(chunk.size <= 400);
        }
    }

    #[test]
    fn test_depth_budget_forces_split() {
        let source = block(30, 30);
        let inner = span(&source, "class", 0, 29).with_children(vec![span(&source, "body", 0, 29)]);
        let root = SyntaxNode::leaf("file", 0, source.len(), 0, 29).with_children(vec![inner]);
        let config = ChunkerConfig {
            max_chunk_size: 400,
            max_depth: 0,
            ..Default::default()
        };
        let chunker = chunker_with(Arc::new(StaticTree(root)), config);

        let chunks = chunker.chunk(&source, "a.toy");
        assert!(!chunks.is_empty());
        assert!(chunks.iter().all(|c| c.node_kind == "class_split"));
    }

    #[test]
    fn test_small_boundary_descends_and_non_boundary_leaf_emitted() {
        let source = block(5, 40);
        // `function` spans a single short line, so it is not emitted as a boundary
        let function = span(&source, "function", 0, 0);
        let stmt = span(&source, "statement", 1, 4);
        let root =
            SyntaxNode::leaf("file", 0, source.len(), 0, 4).with_children(vec![function, stmt]);
        let chunker = chunker_with(Arc::new(StaticTree(root)), ChunkerConfig::default());

        let chunks = chunker.chunk(&source, "a.toy");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].node_kind, "statement");
        assert_eq!((chunks[0].start_line, chunks[0].end_line), (2, 5));
    }

    #[test]
    fn test_whitespace_only_nodes_are_skipped() {
        let source = format!("{}\n{}", " ".repeat(150), "x".repeat(150));
        let root = SyntaxNode::leaf("file", 0, source.len(), 0, 1).with_children(vec![
            SyntaxNode::leaf("padding", 0, 150, 0, 0),
            SyntaxNode::leaf("statement", 151, 301, 1, 1),
        ]);
        let chunker = chunker_with(Arc::new(StaticTree(root)), ChunkerConfig::default());

        let chunks = chunker.chunk(&source, "a.toy");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].node_kind, "statement");
    }

    #[test]
    fn test_merge_is_single_pass() {
        let chunker = Chunker::with_defaults();
        let small = |start: usize, kind: &str| {
            CodeChunk::new("s".repeat(40), "a.java", start, start, kind)
        };
        let chunks = vec![
            small(1, "method_declaration"),
            small(2, "constructor_declaration"),
            small(3, "method_declaration"),
            CodeChunk::new("b".repeat(300), "a.java", 4, 10, "class_declaration"),
        ];

        let merged = chunker.merge_small_adjacent_chunks(chunks);
        let kinds: Vec<_> = merged.iter().map(|c| c.node_kind.as_str()).collect();
        assert_eq!(
            kinds,
            vec!["method_declaration_merged", "method_declaration_merged"]
        );
        assert_eq!((merged[0].start_line, merged[0].end_line), (1, 2));
        assert_eq!((merged[1].start_line, merged[1].end_line), (3, 10));
        assert_eq!(merged[1].size, merged[1].content.len());
    }

    #[test]
    fn test_merge_respects_max_size() {
        let chunker = Chunker::with_defaults();
        let chunks = vec![
            CodeChunk::new("a".repeat(50), "a.java", 1, 1, "method_declaration"),
            CodeChunk::new("b".repeat(1990), "a.java", 2, 40, "class_declaration"),
        ];

        let merged = chunker.merge_small_adjacent_chunks(chunks.clone());
        assert_eq!(merged, chunks);
    }

    #[test]
    fn test_unknown_extension_falls_back_to_lines() {
        let chunker = Chunker::with_defaults();
        let content = block(25, 20);

        let chunks = chunker.chunk(&content, "notes.txt");
        assert!(!chunks.is_empty());
        assert!(chunks.iter().all(CodeChunk::is_line_based));
    }

    #[test]
    fn test_parse_failure_falls_back_to_lines() {
        let chunker = chunker_with(Arc::new(FailingProvider), ChunkerConfig::default());
        let content = block(25, 20);

        let chunks = chunker.chunk(&content, "a.toy");
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].is_line_based());
        assert_eq!((chunks[0].start_line, chunks[0].end_line), (1, 25));
    }

    #[test]
    fn test_kotlin_has_no_parser() {
        let chunker = Chunker::with_defaults();
        let content = block(12, 30);

        let chunks = chunker.chunk(&content, "Main.kt");
        assert!(chunks.iter().all(CodeChunk::is_line_based));
    }

    #[test]
    fn test_chunk_file_reports_io_errors() {
        let chunker = Chunker::with_defaults();
        let result = chunker.chunk_file("/definitely/not/here.rs");
        assert!(matches!(result, Err(ChunkerError::IoError(_))));
    }
}
