use crate::error::{Result, VectorStoreError};
use crate::similarity::normalize;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Upper bound for concurrent embedding requests
pub const MAX_EMBEDDING_WORKERS: usize = 32;

const DEFAULT_WORKER_CAP: usize = 4;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Text to fixed-dimension vectors
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    fn dimension(&self) -> usize;

    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Output order matches input order
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }
}

/// Deterministic hash-seeded unit vectors, for tests and offline use
#[derive(Debug, Clone, Copy)]
pub struct StubEmbedding {
    dimension: usize,
}

impl StubEmbedding {
    pub const fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

#[async_trait]
impl EmbeddingService for StubEmbedding {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Ok(vec![0.0; self.dimension]);
        }
        Ok(stub_embed(text, self.dimension))
    }
}

fn stub_embed(text: &str, dimension: usize) -> Vec<f32> {
    let mut state =
        fnv1a_64(text.as_bytes()) ^ (dimension as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    let mut vec = Vec::with_capacity(dimension);
    for _ in 0..dimension {
        let bits = splitmix64(&mut state);
        let high = (bits >> 32) as u32;
        let mantissa = high >> 9;
        let unit = f32::from_bits(0x3f80_0000 | mantissa) - 1.0;
        vec.push(unit.mul_add(2.0, -1.0));
    }
    normalize(&mut vec);
    vec
}

fn fnv1a_64(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

const fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

#[derive(Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedDataItem>,
}

#[derive(Deserialize)]
struct EmbedDataItem {
    embedding: Vec<f32>,
}

/// Client for an OpenAI-style `POST {base_url}/api/embeddings` endpoint.
pub struct HttpEmbedding {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    dimension: usize,
}

impl std::fmt::Debug for HttpEmbedding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpEmbedding")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("dimension", &self.dimension)
            .finish_non_exhaustive()
    }
}

impl HttpEmbedding {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, dimension: usize) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| VectorStoreError::embedding(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: None,
            dimension,
        })
    }

    /// Send `Authorization: Bearer <key>` with every request
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/api/embeddings", self.base_url)
    }

    async fn request(&self, input: Vec<&str>) -> Result<Vec<Vec<f32>>> {
        let expected = input.len();
        let mut request = self.client.post(self.endpoint()).json(&EmbedRequest {
            model: &self.model,
            input,
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| VectorStoreError::embedding(format!("HTTP request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read response body".into());
            return Err(VectorStoreError::embedding(format!(
                "embedding endpoint returned {status}: {body}"
            )));
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| VectorStoreError::embedding(format!("failed to parse response: {e}")))?;

        if parsed.data.len() != expected {
            return Err(VectorStoreError::embedding(format!(
                "expected {expected} embeddings, got {}",
                parsed.data.len()
            )));
        }

        parsed
            .data
            .into_iter()
            .map(|item| {
                if item.embedding.len() == self.dimension {
                    Ok(item.embedding)
                } else {
                    Err(VectorStoreError::InvalidDimension {
                        expected: self.dimension,
                        actual: item.embedding.len(),
                    })
                }
            })
            .collect()
    }
}

#[async_trait]
impl EmbeddingService for HttpEmbedding {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Ok(vec![0.0; self.dimension]);
        }
        let mut vectors = self.request(vec![text]).await?;
        vectors
            .pop()
            .ok_or_else(|| VectorStoreError::embedding("Empty embedding result"))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = vec![vec![0.0; self.dimension]; texts.len()];
        let (positions, input): (Vec<usize>, Vec<&str>) = texts
            .iter()
            .enumerate()
            .filter(|(_, text)| !text.trim().is_empty())
            .map(|(idx, text)| (idx, text.as_str()))
            .unzip();

        if input.is_empty() {
            return Ok(vectors);
        }

        for (pos, vector) in positions.into_iter().zip(self.request(input).await?) {
            vectors[pos] = vector;
        }
        Ok(vectors)
    }
}

/// `min(available cores, 4)`
pub fn default_embedding_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(DEFAULT_WORKER_CAP)
}

/// Fans a batch out as one task per text behind a bounded worker pool.
///
/// A text whose embedding fails (or comes back with the wrong dimension) gets a
/// zero vector so the rest of the batch survives.
#[derive(Clone)]
pub struct ConcurrentEmbedder {
    inner: Arc<dyn EmbeddingService>,
    permits: Arc<Semaphore>,
    workers: usize,
}

impl ConcurrentEmbedder {
    pub fn new(inner: Arc<dyn EmbeddingService>, workers: usize) -> Self {
        let workers = workers.clamp(1, MAX_EMBEDDING_WORKERS);
        Self {
            inner,
            permits: Arc::new(Semaphore::new(workers)),
            workers,
        }
    }

    pub fn with_default_workers(inner: Arc<dyn EmbeddingService>) -> Self {
        Self::new(inner, default_embedding_workers())
    }

    #[must_use]
    pub const fn workers(&self) -> usize {
        self.workers
    }

    fn zero(&self) -> Vec<f32> {
        vec![0.0; self.inner.dimension()]
    }
}

impl std::fmt::Debug for ConcurrentEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConcurrentEmbedder")
            .field("dimension", &self.inner.dimension())
            .field("workers", &self.workers)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl EmbeddingService for ConcurrentEmbedder {
    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| VectorStoreError::embedding(format!("worker pool closed: {e}")))?;
        self.inner.embed(text).await
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let dimension = self.inner.dimension();
        let mut handles = Vec::with_capacity(texts.len());

        for text in texts {
            let inner = Arc::clone(&self.inner);
            let permits = Arc::clone(&self.permits);
            let text = text.clone();
            handles.push(tokio::spawn(async move {
                let _permit = permits
                    .acquire_owned()
                    .await
                    .map_err(|e| VectorStoreError::embedding(format!("worker pool closed: {e}")))?;
                inner.embed(&text).await
            }));
        }

        let mut vectors = Vec::with_capacity(handles.len());
        for (idx, handle) in handles.into_iter().enumerate() {
            let vector = match handle.await {
                Ok(Ok(vector)) if vector.len() == dimension => vector,
                Ok(Ok(vector)) => {
                    log::warn!(
                        "Embedding {idx} has dimension {}, expected {dimension}; using zero vector",
                        vector.len()
                    );
                    self.zero()
                }
                Ok(Err(e)) => {
                    log::warn!("Embedding {idx} failed, using zero vector: {e}");
                    self.zero()
                }
                Err(e) => {
                    log::warn!("Embedding task {idx} panicked or was cancelled: {e}");
                    self.zero()
                }
            };
            vectors.push(vector);
        }

        Ok(vectors)
    }
}
