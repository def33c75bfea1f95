use crate::config::ChunkerConfig;
use crate::types::{CodeChunk, LINE_BASED_KIND, SPLIT_SUFFIX};

/// Line-oriented chunking used when no syntax tree is available, and for
/// dividing oversized nodes that cannot be refined through their children.
pub struct LineSplitter {
    config: ChunkerConfig,
}

impl LineSplitter {
    pub const fn new(config: ChunkerConfig) -> Self {
        Self { config }
    }

    /// Fixed windows of `fallback_window_lines()` lines; windows whose trimmed text
    /// does not exceed the minimum size are dropped.
    pub fn line_windows(&self, content: &str, file_path: &str) -> Vec<CodeChunk> {
        let lines: Vec<&str> = content.lines().collect();
        let window = self.config.fallback_window_lines();
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < lines.len() {
            let end = (start + window).min(lines.len());
            let text = lines[start..end].join("\n");

            if text.trim().len() > self.config.min_chunk_size {
                if let Some((content, first, last)) = trimmed_span(&text, start + 1, end) {
                    chunks.push(CodeChunk::new(content, file_path, first, last, LINE_BASED_KIND));
                }
            }

            start = end;
        }

        chunks
    }

    /// Divide an oversized node into sequential line runs of at most `max_chunk_size`
    /// bytes, tagged `<kind>_split`. A trailing run under the minimum size is dropped.
    pub fn split_oversized(
        &self,
        text: &str,
        file_path: &str,
        node_kind: &str,
        start_line: usize,
    ) -> Vec<CodeChunk> {
        let kind = format!("{node_kind}{SPLIT_SUFFIX}");
        let max = self.config.max_chunk_size;
        let min = self.config.min_chunk_size;

        let mut chunks = Vec::new();
        let mut pending: Vec<&str> = Vec::new();
        let mut pending_len = 0usize;
        let mut pending_start = 0usize;

        let lines: Vec<&str> = text.lines().collect();
        for (idx, line) in lines.iter().enumerate() {
            if !pending.is_empty() && pending_len + 1 + line.len() > max {
                let joined = pending.join("\n");
                if joined.trim().len() >= min {
                    if let Some((content, first, last)) =
                        trimmed_span(&joined, start_line + pending_start, start_line + idx - 1)
                    {
                        chunks.push(CodeChunk::new(content, file_path, first, last, kind.clone()));
                    }
                    pending.clear();
                    pending_len = 0;
                    pending_start = idx;
                }
            }

            pending_len = if pending.is_empty() {
                line.len()
            } else {
                pending_len + 1 + line.len()
            };
            pending.push(line);
        }

        if !pending.is_empty() {
            let joined = pending.join("\n");
            if joined.trim().len() >= min {
                let last = start_line + lines.len() - 1;
                if let Some((content, first, last)) =
                    trimmed_span(&joined, start_line + pending_start, last)
                {
                    chunks.push(CodeChunk::new(content, file_path, first, last, kind));
                }
            }
        }

        chunks
    }
}

/// Trim `text` and shift its line span past any blank lines that were removed.
fn trimmed_span(text: &str, first_line: usize, last_line: usize) -> Option<(String, usize, usize)> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    let leading = &text[..text.len() - text.trim_start().len()];
    let trailing = &text[text.trim_end().len()..];
    let first = first_line + leading.matches('\n').count();
    let last = last_line
        .saturating_sub(trailing.matches('\n').count())
        .max(first);

    Some((trimmed.to_string(), first, last))
}
