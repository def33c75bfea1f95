use serde::{Deserialize, Serialize};

/// Node kind assigned to chunks produced without a syntax tree.
pub const LINE_BASED_KIND: &str = "line_based";

/// Suffix for pieces of an oversized node that was divided line by line.
pub const SPLIT_SUFFIX: &str = "_split";

/// Suffix for a chunk that absorbed its right-hand neighbour.
pub const MERGED_SUFFIX: &str = "_merged";

/// A contiguous span of source text selected as one indexing unit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CodeChunk {
    /// The actual code content
    pub content: String,

    /// Source file path
    pub source_path: String,

    /// Start line (1-indexed)
    pub start_line: usize,

    /// End line (1-indexed, inclusive)
    pub end_line: usize,

    /// Syntax node kind, optionally suffixed with `_split`/`_merged`, or `line_based`
    pub node_kind: String,

    /// Byte length of `content`
    pub size: usize,
}

impl CodeChunk {
    /// Create a new code chunk; `size` is derived from the content.
    #[must_use]
    pub fn new(
        content: String,
        source_path: impl Into<String>,
        start_line: usize,
        end_line: usize,
        node_kind: impl Into<String>,
    ) -> Self {
        let start_line = start_line.max(1);
        Self {
            size: content.len(),
            content,
            source_path: source_path.into(),
            start_line,
            end_line: end_line.max(start_line),
            node_kind: node_kind.into(),
        }
    }

    /// Stable identifier used when storing the chunk: `path:start:end`.
    #[must_use]
    pub fn chunk_id(&self) -> String {
        format!("{}:{}:{}", self.source_path, self.start_line, self.end_line)
    }

    /// Get the number of lines in this chunk
    #[must_use]
    pub const fn line_count(&self) -> usize {
        self.end_line.saturating_sub(self.start_line) + 1
    }

    /// Check if chunk contains a specific line
    #[must_use]
    pub const fn contains_line(&self, line: usize) -> bool {
        line >= self.start_line && line <= self.end_line
    }

    #[must_use]
    pub fn is_split(&self) -> bool {
        self.node_kind.ends_with(SPLIT_SUFFIX)
    }

    #[must_use]
    pub fn is_merged(&self) -> bool {
        self.node_kind.ends_with(MERGED_SUFFIX)
    }

    #[must_use]
    pub fn is_line_based(&self) -> bool {
        self.node_kind == LINE_BASED_KIND
    }

    /// Combine with the following chunk, keeping this chunk's start and kind.
    #[must_use]
    pub(crate) fn merged_with(&self, next: &Self) -> Self {
        let mut content = String::with_capacity(self.content.len() + next.content.len() + 1);
        content.push_str(&self.content);
        content.push('\n');
        content.push_str(&next.content);

        Self::new(
            content,
            self.source_path.clone(),
            self.start_line,
            next.end_line,
            format!("{}{MERGED_SUFFIX}", self.node_kind),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(start: usize, end: usize, kind: &str) -> CodeChunk {
        CodeChunk::new("code".to_string(), "test.java", start, end, kind)
    }

    #[test]
    fn test_chunk_line_count() {
        assert_eq!(chunk(10, 15, "method_declaration").line_count(), 6);
    }

    #[test]
    fn test_chunk_contains_line() {
        let chunk = chunk(10, 15, "method_declaration");
        assert!(chunk.contains_line(10));
        assert!(chunk.contains_line(12));
        assert!(chunk.contains_line(15));
        assert!(!chunk.contains_line(9));
        assert!(!chunk.contains_line(16));
    }

    #[test]
    fn test_size_tracks_content() {
        let chunk = CodeChunk::new("héllo".to_string(), "a.rs", 1, 1, "function_item");
        assert_eq!(chunk.size, chunk.content.len());
        assert_eq!(chunk.size, 6);
    }

    #[test]
    fn test_kind_markers() {
        assert!(chunk(1, 2, "class_declaration_split").is_split());
        assert!(chunk(1, 2, "class_declaration_merged").is_merged());
        assert!(chunk(1, 2, LINE_BASED_KIND).is_line_based());
        assert!(!chunk(1, 2, "class_declaration").is_split());
    }

    #[test]
    fn test_merged_with() {
        let first = CodeChunk::new("a".repeat(10), "a.py", 1, 2, "function_definition");
        let second = CodeChunk::new("b".repeat(20), "a.py", 3, 9, "class_definition");
        let merged = first.merged_with(&second);

        assert_eq!(merged.start_line, 1);
        assert_eq!(merged.end_line, 9);
        assert_eq!(merged.node_kind, "function_definition_merged");
        assert_eq!(merged.content, format!("{}\n{}", "a".repeat(10), "b".repeat(20)));
        assert_eq!(merged.size, 31);
    }

    #[test]
    fn test_chunk_id() {
        assert_eq!(chunk(3, 7, "x").chunk_id(), "test.java:3:7");
    }
}
