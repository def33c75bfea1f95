use crate::language::{Language, LanguageProfile};
use crate::syntax::{SyntaxTreeProvider, TreeSitterProvider};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

struct RegisteredLanguage {
    profile: LanguageProfile,
    provider: Option<Arc<dyn SyntaxTreeProvider>>,
}

/// Maps language ids to their chunking profile and (optionally) a parser.
///
/// Built once by the caller and handed to every `Chunker`, so parser construction
/// happens a single time per language. A language registered without a provider
/// is known but unparseable and chunks through the line-based fallback.
#[derive(Default)]
pub struct ParserRegistry {
    languages: HashMap<String, RegisteredLanguage>,
    by_extension: HashMap<String, String>,
}

impl ParserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in language; grammars that fail to load are
    /// registered without a provider.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for language in Language::ALL {
            let provider: Option<Arc<dyn SyntaxTreeProvider>> = if language.supports_ast() {
                match language
                    .tree_sitter_language()
                    .and_then(TreeSitterProvider::new)
                {
                    Ok(provider) => Some(Arc::new(provider)),
                    Err(e) => {
                        log::warn!("Failed to load grammar for {}: {e}", language.as_str());
                        None
                    }
                }
            } else {
                None
            };

            registry.insert(language.profile(), provider);
        }
        registry
    }

    /// Register a language together with its parser (replaces an existing entry).
    pub fn register(
        &mut self,
        profile: LanguageProfile,
        provider: Arc<dyn SyntaxTreeProvider>,
    ) -> &mut Self {
        self.insert(profile, Some(provider));
        self
    }

    /// Register a language without a parser.
    pub fn register_profile(&mut self, profile: LanguageProfile) -> &mut Self {
        self.insert(profile, None);
        self
    }

    fn insert(&mut self, profile: LanguageProfile, provider: Option<Arc<dyn SyntaxTreeProvider>>) {
        self.by_extension.retain(|_, id| id != &profile.id);
        for ext in &profile.extensions {
            self.by_extension.insert(ext.clone(), profile.id.clone());
        }
        self.languages
            .insert(profile.id.clone(), RegisteredLanguage { profile, provider });
    }

    pub fn profile(&self, language_id: &str) -> Option<&LanguageProfile> {
        self.languages.get(language_id).map(|lang| &lang.profile)
    }

    pub fn provider(&self, language_id: &str) -> Option<Arc<dyn SyntaxTreeProvider>> {
        self.languages
            .get(language_id)
            .and_then(|lang| lang.provider.clone())
    }

    /// Resolve the language of a file from its extension
    pub fn language_for_path(&self, path: impl AsRef<Path>) -> Option<&LanguageProfile> {
        let ext = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        let id = self.by_extension.get(&ext)?;
        self.profile(id)
    }

    pub fn language_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.languages.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

impl std::fmt::Debug for ParserRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParserRegistry")
            .field("languages", &self.language_ids())
            .finish_non_exhaustive()
    }
}
