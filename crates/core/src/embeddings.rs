use crate::error::EmbedError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Vector size of all-MiniLM-L6-v2, the default remote model.
pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 384;

/// Maps text to fixed-length dense vectors. Implementations must be
/// deterministic: the same text always yields the same vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    fn dimensions(&self) -> usize;

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError>;

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors.pop().ok_or(EmbedError::CountMismatch {
            expected: 1,
            got: 0,
        })
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingRow>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingRow {
    embedding: Vec<f32>,
}

/// Client for an OpenAI-compatible `/v1/embeddings` endpoint serving a
/// pretrained sentence-embedding model.
pub struct RemoteEmbedder {
    endpoint: String,
    model: String,
    dimensions: usize,
    api_key: Option<String>,
    client: Client,
}

impl RemoteEmbedder {
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        dimensions: usize,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            model: model.into(),
            dimensions,
            api_key: None,
            client: Client::new(),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

#[async_trait]
impl Embedder for RemoteEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/v1/embeddings", self.endpoint.trim_end_matches('/'));
        let mut request = self.client.post(url).json(&EmbeddingRequest {
            model: &self.model,
            input: texts,
        });

        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(EmbedError::BackendResponse {
                details: response.status().to_string(),
            });
        }

        let payload: EmbeddingResponse = response.json().await?;
        rows_to_vectors(payload, texts.len(), self.dimensions)
    }
}

fn rows_to_vectors(
    payload: EmbeddingResponse,
    expected_count: usize,
    dimensions: usize,
) -> Result<Vec<Vec<f32>>, EmbedError> {
    if payload.data.len() != expected_count {
        return Err(EmbedError::CountMismatch {
            expected: expected_count,
            got: payload.data.len(),
        });
    }

    let mut vectors = Vec::with_capacity(payload.data.len());
    for row in payload.data {
        if row.embedding.len() != dimensions {
            return Err(EmbedError::DimensionMismatch {
                expected: dimensions,
                got: row.embedding.len(),
            });
        }
        vectors.push(row.embedding);
    }
    Ok(vectors)
}

/// Local character-trigram embedder: hashes each trigram into a bucket
/// and L2-normalizes the counts. Deterministic and dependency-free,
/// used as the offline fallback and the test backend.
#[derive(Debug, Clone, Copy)]
pub struct HashEmbedder {
    pub dimensions: usize,
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self { dimensions: 128 }
    }
}

impl HashEmbedder {
    fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0f32; self.dimensions.max(1)];
        let lowered = text.to_lowercase();
        let chars: Vec<char> = lowered.chars().collect();

        if chars.is_empty() {
            return vector;
        }

        for window in chars.windows(3) {
            let token = window.iter().collect::<String>();
            let mut hash = 1469598103934665603u64;
            for byte in token.bytes() {
                hash ^= byte as u64;
                hash = hash.wrapping_mul(1099511628211);
            }
            let bucket = (hash % vector.len() as u64) as usize;
            vector[bucket] += 1.0;
        }

        let magnitude = vector.iter().map(|value| value * value).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for value in &mut vector {
                *value /= magnitude;
            }
        }

        vector
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        Ok(texts.iter().map(|text| self.embed(text)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_embedder_is_deterministic() {
        let embedder = HashEmbedder::default();
        let first = embedder.embed_one("The mitochondria is the powerhouse").await.unwrap();
        let second = embedder.embed_one("The mitochondria is the powerhouse").await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn hash_embedder_outputs_expected_length() {
        let embedder = HashEmbedder { dimensions: 32 };
        let vectors = embedder
            .embed_batch(&["abc".to_string(), "def".to_string()])
            .await
            .unwrap();
        assert_eq!(vectors.len(), 2);
        assert_eq!(vectors[0].len(), 32);
    }

    #[test]
    fn embedding_response_rows_are_validated() {
        let payload: EmbeddingResponse = serde_json::from_str(
            r#"{"data":[{"embedding":[0.1,0.2]},{"embedding":[0.3,0.4]}]}"#,
        )
        .unwrap();

        let vectors = rows_to_vectors(payload, 2, 2).unwrap();
        assert_eq!(vectors, vec![vec![0.1, 0.2], vec![0.3, 0.4]]);
    }

    #[test]
    fn embedding_response_count_mismatch_is_rejected() {
        let payload: EmbeddingResponse =
            serde_json::from_str(r#"{"data":[{"embedding":[0.1,0.2]}]}"#).unwrap();
        let result = rows_to_vectors(payload, 2, 2);
        assert!(matches!(result, Err(EmbedError::CountMismatch { .. })));
    }

    #[test]
    fn embedding_response_dimension_mismatch_is_rejected() {
        let payload: EmbeddingResponse =
            serde_json::from_str(r#"{"data":[{"embedding":[0.1,0.2,0.3]}]}"#).unwrap();
        let result = rows_to_vectors(payload, 1, 2);
        assert!(matches!(result, Err(EmbedError::DimensionMismatch { .. })));
    }
}
