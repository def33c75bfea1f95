use crate::error::{ChunkerError, Result};
use std::sync::Mutex;
use tree_sitter::{Node, Parser};

/// Owned syntax-tree node: a kind label, a byte span and 0-based rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxNode {
    pub kind: String,
    pub start_byte: usize,
    pub end_byte: usize,
    /// 0-based row of the first byte
    pub start_row: usize,
    /// 0-based row of the last byte
    pub end_row: usize,
    pub children: Vec<SyntaxNode>,
}

impl SyntaxNode {
    /// Leaf node constructor, mostly useful for hand-built trees.
    pub fn leaf(
        kind: impl Into<String>,
        start_byte: usize,
        end_byte: usize,
        start_row: usize,
        end_row: usize,
    ) -> Self {
        Self {
            kind: kind.into(),
            start_byte,
            end_byte,
            start_row,
            end_row,
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_children(mut self, children: Vec<SyntaxNode>) -> Self {
        self.children = children;
        self
    }

    /// Source text covered by this node. Out-of-range or non-UTF-8-aligned spans yield "".
    #[must_use]
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        if self.start_byte >= self.end_byte {
            return "";
        }
        source.get(self.start_byte..self.end_byte).unwrap_or("")
    }

    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// 1-based line of the node start
    #[must_use]
    pub const fn start_line(&self) -> usize {
        self.start_row + 1
    }

    /// 1-based line of the node end
    #[must_use]
    pub const fn end_line(&self) -> usize {
        self.end_row + 1
    }

    fn from_tree_sitter(node: Node<'_>) -> Self {
        let mut cursor = node.walk();
        let children = node
            .children(&mut cursor)
            .map(Self::from_tree_sitter)
            .collect();

        Self {
            kind: node.kind().to_string(),
            start_byte: node.start_byte(),
            end_byte: node.end_byte(),
            start_row: node.start_position().row,
            end_row: node.end_position().row,
            children,
        }
    }
}

/// Produces a parse tree for source text of one language.
pub trait SyntaxTreeProvider: Send + Sync {
    fn parse(&self, source: &str) -> Result<SyntaxNode>;
}

/// Tree-sitter backed provider; the parser is built once and reused.
pub struct TreeSitterProvider {
    parser: Mutex<Parser>,
}

impl TreeSitterProvider {
    pub fn new(language: tree_sitter::Language) -> Result<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(&language)
            .map_err(|e| ChunkerError::tree_sitter(format!("Failed to set language: {e}")))?;

        Ok(Self {
            parser: Mutex::new(parser),
        })
    }
}

impl SyntaxTreeProvider for TreeSitterProvider {
    fn parse(&self, source: &str) -> Result<SyntaxNode> {
        let mut parser = self
            .parser
            .lock()
            .map_err(|_| ChunkerError::tree_sitter("parser lock poisoned"))?;
        let tree = parser
            .parse(source, None)
            .ok_or_else(|| ChunkerError::parse("Failed to parse source code"))?;

        Ok(SyntaxNode::from_tree_sitter(tree.root_node()))
    }
}
