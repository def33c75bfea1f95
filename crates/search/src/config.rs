use crate::error::{Result, SearchError};
use recall_code_chunker::ChunkerConfig;
use recall_vector_store::{
    default_embedding_workers, EmbeddingService, HttpEmbedding, StubEmbedding,
    MAX_EMBEDDING_WORKERS,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

pub const DEFAULT_VECTOR_WEIGHT: f32 = 0.7;
pub const DEFAULT_LIMIT: usize = 10;
pub const DEFAULT_MAX_LIMIT: usize = 100;
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding";
pub const DEFAULT_EMBEDDING_DIMENSION: usize = 384;

/// Which embedding backend to build
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingMode {
    #[default]
    Stub,
    Http,
}

impl FromStr for EmbeddingMode {
    type Err = SearchError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "stub" => Ok(Self::Stub),
            "http" => Ok(Self::Http),
            other => Err(SearchError::invalid_config(format!(
                "unsupported embedding mode '{other}' (expected 'stub' or 'http')"
            ))),
        }
    }
}

impl fmt::Display for EmbeddingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Stub => "stub",
            Self::Http => "http",
        })
    }
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub mode: EmbeddingMode,
    pub base_url: Option<String>,
    pub model: String,
    pub api_key: Option<String>,
    pub dimension: usize,
    pub workers: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            mode: EmbeddingMode::default(),
            base_url: None,
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            api_key: None,
            dimension: DEFAULT_EMBEDDING_DIMENSION,
            workers: default_embedding_workers(),
        }
    }
}

impl fmt::Debug for EmbeddingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbeddingConfig")
            .field("mode", &self.mode)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("dimension", &self.dimension)
            .field("workers", &self.workers)
            .finish()
    }
}

impl EmbeddingConfig {
    /// Build the configured backend
    pub fn build_service(&self) -> Result<Arc<dyn EmbeddingService>> {
        match self.mode {
            EmbeddingMode::Stub => Ok(Arc::new(StubEmbedding::new(self.dimension))),
            EmbeddingMode::Http => {
                let base_url = self.base_url.as_deref().ok_or_else(|| {
                    SearchError::invalid_config("embedding.base_url is required in http mode")
                })?;
                let mut http = HttpEmbedding::new(base_url, &self.model, self.dimension)?;
                if let Some(key) = &self.api_key {
                    http = http.with_api_key(key);
                }
                log::info!("Using HTTP embedding model '{}' at {base_url}", http.model());
                Ok(Arc::new(http))
            }
        }
    }
}

/// Search and indexing settings, read from TOML and adjusted by `RECALL_*` variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub use_hybrid_search: bool,
    /// Share of the vector score in hybrid ranking; keywords get the rest
    pub vector_weight: f32,
    pub default_limit: usize,
    pub max_limit: usize,
    pub chunker: ChunkerConfig,
    pub embedding: EmbeddingConfig,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            use_hybrid_search: true,
            vector_weight: DEFAULT_VECTOR_WEIGHT,
            default_limit: DEFAULT_LIMIT,
            max_limit: DEFAULT_MAX_LIMIT,
            chunker: ChunkerConfig::default(),
            embedding: EmbeddingConfig::default(),
        }
    }
}

impl SearchConfig {
    /// Read a TOML file, apply environment overrides, then normalize
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::debug!("Loading search config from {}", path.display());
        let raw = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&raw)?;
        config.apply_env()?;
        config.validate_and_normalize()?;
        Ok(config)
    }

    /// Defaults plus environment overrides
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        config.validate_and_normalize()?;
        Ok(config)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply `RECALL_*` overrides from an arbitrary variable source
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(raw) = get("RECALL_HYBRID") {
            self.use_hybrid_search = !(raw == "0"
                || raw.eq_ignore_ascii_case("false")
                || raw.eq_ignore_ascii_case("off"));
        }
        if let Some(raw) = get("RECALL_VECTOR_WEIGHT") {
            self.vector_weight = parse_var("RECALL_VECTOR_WEIGHT", &raw)?;
        }
        if let Some(raw) = get("RECALL_MAX_CHUNK_SIZE") {
            self.chunker.max_chunk_size = parse_var("RECALL_MAX_CHUNK_SIZE", &raw)?;
        }
        if let Some(raw) = get("RECALL_EMBEDDING_MODE") {
            self.embedding.mode = raw.parse()?;
        }
        if let Some(raw) = get("RECALL_EMBEDDING_URL") {
            self.embedding.base_url = Some(raw);
        }
        if let Some(raw) = get("RECALL_EMBEDDING_MODEL") {
            self.embedding.model = raw;
        }
        if let Some(raw) = get("RECALL_EMBEDDING_API_KEY") {
            self.embedding.api_key = Some(raw);
        }
        if let Some(raw) = get("RECALL_EMBEDDING_WORKERS") {
            self.embedding.workers = parse_var("RECALL_EMBEDDING_WORKERS", &raw)?;
        }
        Ok(())
    }

    /// Clamp numeric settings into range; reject combinations that cannot work.
    pub fn validate_and_normalize(&mut self) -> Result<()> {
        self.vector_weight = if self.vector_weight.is_nan() {
            DEFAULT_VECTOR_WEIGHT
        } else {
            self.vector_weight.clamp(0.0, 1.0)
        };

        self.max_limit = self.max_limit.max(1);
        self.default_limit = self.default_limit.clamp(1, self.max_limit);
        self.embedding.workers = self.embedding.workers.clamp(1, MAX_EMBEDDING_WORKERS);

        if self.embedding.dimension == 0 {
            return Err(SearchError::invalid_config("embedding.dimension must be > 0"));
        }
        if self.embedding.mode == EmbeddingMode::Http && self.embedding.base_url.is_none() {
            return Err(SearchError::invalid_config(
                "embedding.base_url is required in http mode (or set RECALL_EMBEDDING_URL)",
            ));
        }
        self.chunker.validate().map_err(SearchError::invalid_config)?;

        Ok(())
    }

    /// The requested limit, or the default, capped at `max_limit`
    #[must_use]
    pub fn effective_limit(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_limit)
            .clamp(1, self.max_limit.max(1))
    }
}

fn parse_var<T: FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.parse()
        .map_err(|_| SearchError::invalid_config(format!("{key}: cannot parse '{raw}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn overrides(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = SearchConfig::default();
        assert!(config.use_hybrid_search);
        assert!((config.vector_weight - 0.7).abs() < f32::EPSILON);
        assert_eq!(config.default_limit, 10);
        assert_eq!(config.max_limit, 100);
        assert_eq!(config.chunker, ChunkerConfig::default());
        assert_eq!(config.embedding.mode, EmbeddingMode::Stub);
        assert_eq!(config.embedding.model, "text-embedding");
        assert_eq!(config.embedding.dimension, 384);
    }

    #[test]
    fn test_from_toml() {
        let config = SearchConfig::from_toml_str(
            r#"
use_hybrid_search = false
vector_weight = 0.5

[chunker]
max_chunk_size = 1500

[embedding]
mode = "http"
base_url = "http://localhost:11434"
dimension = 768
"#,
        )
        .unwrap();

        assert!(!config.use_hybrid_search);
        assert!((config.vector_weight - 0.5).abs() < f32::EPSILON);
        assert_eq!(config.chunker.max_chunk_size, 1500);
        assert_eq!(config.chunker.min_chunk_size, 100);
        assert_eq!(config.embedding.mode, EmbeddingMode::Http);
        assert_eq!(config.embedding.dimension, 768);
        assert_eq!(config.embedding.model, "text-embedding");
        assert_eq!(config.default_limit, 10);
    }

    #[test]
    fn test_unknown_mode_rejected() {
        assert!(SearchConfig::from_toml_str("[embedding]\nmode = \"gpu\"").is_err());
        assert!("gpu".parse::<EmbeddingMode>().is_err());
        assert_eq!("HTTP".parse::<EmbeddingMode>().unwrap(), EmbeddingMode::Http);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = SearchConfig::default();
        config
            .apply_overrides(overrides(&[
                ("RECALL_HYBRID", "off"),
                ("RECALL_VECTOR_WEIGHT", "0.25"),
                ("RECALL_MAX_CHUNK_SIZE", "1200"),
                ("RECALL_EMBEDDING_MODE", "http"),
                ("RECALL_EMBEDDING_URL", "http://embed:8080"),
                ("RECALL_EMBEDDING_WORKERS", "  "),
            ]))
            .unwrap();

        assert!(!config.use_hybrid_search);
        assert!((config.vector_weight - 0.25).abs() < f32::EPSILON);
        assert_eq!(config.chunker.max_chunk_size, 1200);
        assert_eq!(config.embedding.mode, EmbeddingMode::Http);
        assert_eq!(config.embedding.base_url.as_deref(), Some("http://embed:8080"));
        assert_eq!(config.embedding.workers, default_embedding_workers());
    }

    #[test]
    fn test_bad_env_value_is_reported() {
        let mut config = SearchConfig::default();
        let err = config
            .apply_overrides(overrides(&[("RECALL_VECTOR_WEIGHT", "heavy")]))
            .unwrap_err();
        assert!(err.to_string().contains("RECALL_VECTOR_WEIGHT"));
    }

    #[test]
    fn test_normalize_clamps() {
        let mut config = SearchConfig {
            vector_weight: 1.7,
            default_limit: 500,
            max_limit: 50,
            ..SearchConfig::default()
        };
        config.embedding.workers = 0;
        config.validate_and_normalize().unwrap();

        assert!((config.vector_weight - 1.0).abs() < f32::EPSILON);
        assert_eq!(config.default_limit, 50);
        assert_eq!(config.embedding.workers, 1);

        config.vector_weight = -3.0;
        config.validate_and_normalize().unwrap();
        assert_eq!(config.vector_weight, 0.0);
    }

    #[test]
    fn test_normalize_rejects_unusable_settings() {
        let mut http_without_url = SearchConfig::default();
        http_without_url.embedding.mode = EmbeddingMode::Http;
        assert!(http_without_url.validate_and_normalize().is_err());

        let mut bad_chunker = SearchConfig::default();
        bad_chunker.chunker.max_chunk_size = 10;
        assert!(matches!(
            bad_chunker.validate_and_normalize(),
            Err(SearchError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_effective_limit() {
        let config = SearchConfig::default();
        assert_eq!(config.effective_limit(None), 10);
        assert_eq!(config.effective_limit(Some(0)), 1);
        assert_eq!(config.effective_limit(Some(1000)), 100);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recall.toml");
        std::fs::write(&path, "default_limit = 5\n").unwrap();

        let config = SearchConfig::load(&path).unwrap();
        assert_eq!(config.default_limit, 5);
    }

    #[test]
    fn test_build_service_honours_mode_and_dimension() {
        let mut config = EmbeddingConfig {
            dimension: 64,
            ..EmbeddingConfig::default()
        };
        assert_eq!(config.build_service().unwrap().dimension(), 64);

        config.mode = EmbeddingMode::Http;
        assert!(config.build_service().is_err());

        config.base_url = Some("http://127.0.0.1:9".to_string());
        config.api_key = Some("sk-secret".to_string());
        assert_eq!(config.build_service().unwrap().dimension(), 64);
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let mut config = EmbeddingConfig::default();
        config.api_key = Some("sk-secret".to_string());
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
    }
}
