use crate::error::{ChunkerError, Result};
use std::collections::BTreeSet;
use std::path::Path;

/// Built-in language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Rust,
    Python,
    JavaScript,
    TypeScript,
    Java,
    Kotlin,
}

impl Language {
    pub const ALL: [Language; 6] = [
        Language::Rust,
        Language::Python,
        Language::JavaScript,
        Language::TypeScript,
        Language::Java,
        Language::Kotlin,
    ];

    /// Detect language from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|lang| lang.extensions().contains(&ext.as_str()))
    }

    /// Detect language from file path
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Get language name as string
    pub const fn as_str(self) -> &'static str {
        match self {
            Language::Rust => "rust",
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Java => "java",
            Language::Kotlin => "kotlin",
        }
    }

    pub const fn extensions(self) -> &'static [&'static str] {
        match self {
            Language::Rust => &["rs"],
            Language::Python => &["py", "pyw"],
            Language::JavaScript => &["js", "jsx", "mjs", "cjs"],
            Language::TypeScript => &["ts", "tsx"],
            Language::Java => &["java"],
            Language::Kotlin => &["kt", "kts"],
        }
    }

    /// Node kinds that make natural chunk boundaries
    pub const fn boundary_kinds(self) -> &'static [&'static str] {
        match self {
            Language::Rust => &[
                "function_item",
                "impl_item",
                "struct_item",
                "enum_item",
                "trait_item",
                "mod_item",
            ],
            Language::Python => &[
                "function_definition",
                "class_definition",
                "decorated_definition",
            ],
            Language::JavaScript => &[
                "function_declaration",
                "function_expression",
                "arrow_function",
                "class_declaration",
                "method_definition",
                "export_statement",
            ],
            Language::TypeScript => &[
                "function_declaration",
                "function_expression",
                "arrow_function",
                "class_declaration",
                "abstract_class_declaration",
                "method_definition",
                "export_statement",
                "interface_declaration",
                "enum_declaration",
            ],
            Language::Java => &[
                "method_declaration",
                "constructor_declaration",
                "class_declaration",
                "interface_declaration",
                "enum_declaration",
                "annotation_type_declaration",
            ],
            Language::Kotlin => &[
                "function_declaration",
                "class_declaration",
                "object_declaration",
                "interface_declaration",
                "property_declaration",
            ],
        }
    }

    /// Whether a tree-sitter grammar ships with this crate
    pub const fn supports_ast(self) -> bool {
        !matches!(self, Language::Kotlin)
    }

    /// Get Tree-sitter language instance
    pub fn tree_sitter_language(self) -> Result<tree_sitter::Language> {
        match self {
            Language::Rust => Ok(tree_sitter_rust::LANGUAGE.into()),
            Language::Python => Ok(tree_sitter_python::LANGUAGE.into()),
            Language::JavaScript => Ok(tree_sitter_javascript::LANGUAGE.into()),
            Language::TypeScript => Ok(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()),
            Language::Java => Ok(tree_sitter_java::LANGUAGE.into()),
            Language::Kotlin => Err(ChunkerError::unsupported_language(self.as_str())),
        }
    }

    pub fn profile(self) -> LanguageProfile {
        LanguageProfile::new(self.as_str())
            .extensions(self.extensions().iter().copied())
            .boundary_kinds(self.boundary_kinds().iter().copied())
    }
}

/// Per-language chunking settings: which extensions map to it and which node kinds
/// are chunk boundaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageProfile {
    pub id: String,
    pub extensions: BTreeSet<String>,
    pub boundary_kinds: BTreeSet<String>,
}

impl LanguageProfile {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            extensions: BTreeSet::new(),
            boundary_kinds: BTreeSet::new(),
        }
    }

    /// Builder: add extensions (case-insensitive, without the dot)
    #[must_use]
    pub fn extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions.extend(
            extensions
                .into_iter()
                .map(|ext| ext.as_ref().trim_start_matches('.').to_ascii_lowercase()),
        );
        self
    }

    /// Builder: add boundary node kinds
    #[must_use]
    pub fn boundary_kinds<I, S>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.boundary_kinds.extend(kinds.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn is_boundary(&self, kind: &str) -> bool {
        self.boundary_kinds.contains(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_extension() {
        assert_eq!(Language::from_extension("rs"), Some(Language::Rust));
        assert_eq!(Language::from_extension("RS"), Some(Language::Rust));
        assert_eq!(Language::from_extension("py"), Some(Language::Python));
        assert_eq!(Language::from_extension("jsx"), Some(Language::JavaScript));
        assert_eq!(Language::from_extension("tsx"), Some(Language::TypeScript));
        assert_eq!(Language::from_extension("java"), Some(Language::Java));
        assert_eq!(Language::from_extension("kt"), Some(Language::Kotlin));
        assert_eq!(Language::from_extension("unknown"), None);
    }

    #[test]
    fn test_from_path() {
        assert_eq!(Language::from_path("test.rs"), Some(Language::Rust));
        assert_eq!(Language::from_path("src/Main.java"), Some(Language::Java));
        assert_eq!(Language::from_path("index.ts"), Some(Language::TypeScript));
        assert_eq!(Language::from_path("no_extension"), None);
    }

    #[test]
    fn test_tree_sitter_language() {
        for lang in Language::ALL {
            assert_eq!(lang.tree_sitter_language().is_ok(), lang.supports_ast());
        }
    }

    #[test]
    fn test_profile_boundaries() {
        let java = Language::Java.profile();
        assert!(java.is_boundary("method_declaration"));
        assert!(java.is_boundary("class_declaration"));
        assert!(!java.is_boundary("block"));
        assert!(java.extensions.contains("java"));
    }

    #[test]
    fn test_profile_builder_normalizes_extensions() {
        let profile = LanguageProfile::new("go")
            .extensions([".GO"])
            .boundary_kinds(["function_declaration"]);
        assert!(profile.extensions.contains("go"));
        assert!(profile.is_boundary("function_declaration"));
    }
}
