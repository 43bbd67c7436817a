//! Embedding provider backed by a remote embedding server.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::EmbeddingProvider;
use crate::error::EmbeddingError;
use crate::models::{Embedding, EmbeddingConfig};

/// Request body for the /embed endpoint.
#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    inputs: &'a [String],
    truncate: bool,
    normalize: bool,
}

/// Response from the /embed endpoint.
#[derive(Debug, Deserialize)]
struct EmbedResponse(Vec<Vec<f32>>);

/// Client for a text-embeddings server exposing `POST /embed`.
#[derive(Debug, Clone)]
pub struct HttpProvider {
    client: Client,
    base_url: String,
    normalize: bool,
}

impl HttpProvider {
    /// Create a new provider with the given configuration.
    pub fn new(config: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EmbeddingError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            normalize: config.normalize,
        })
    }

    /// Get the base URL of the embedding server.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl EmbeddingProvider for HttpProvider {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/embed", self.base_url);
        let request = EmbedRequest {
            inputs: texts,
            truncate: true,
            normalize: self.normalize,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EmbeddingError::Timeout
                } else if e.is_connect() {
                    EmbeddingError::ConnectionError(e.to_string())
                } else {
                    EmbeddingError::RequestError(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::ServerError(format!(
                "status {}: {}",
                status, body
            )));
        }

        let embed_response: EmbedResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;

        Ok(embed_response.0)
    }

    fn name(&self) -> &str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let config = EmbeddingConfig::default();
        let provider = HttpProvider::new(&config);
        assert!(provider.is_ok());
    }

    #[test]
    fn test_base_url_trimming() {
        let config = EmbeddingConfig {
            url: "http://localhost:11411/".to_string(),
            ..Default::default()
        };
        let provider = HttpProvider::new(&config).unwrap();
        assert_eq!(provider.base_url(), "http://localhost:11411");
    }

    #[test]
    fn test_request_serialization() {
        let inputs = vec!["a".to_string(), "b".to_string()];
        let request = EmbedRequest {
            inputs: &inputs,
            truncate: true,
            normalize: false,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["inputs"], serde_json::json!(["a", "b"]));
        assert_eq!(json["truncate"], true);
        assert_eq!(json["normalize"], false);
    }

    #[test]
    fn test_response_deserialization() {
        let response: EmbedResponse = serde_json::from_str("[[0.1, 0.2], [0.3, 0.4]]").unwrap();
        assert_eq!(response.0.len(), 2);
        assert_eq!(response.0[1], vec![0.3, 0.4]);
    }

    #[tokio::test]
    async fn test_empty_batch_skips_request() {
        let config = EmbeddingConfig {
            url: "http://127.0.0.1:9".to_string(),
            ..Default::default()
        };
        let provider = HttpProvider::new(&config).unwrap();
        assert!(provider.embed(&[]).await.unwrap().is_empty());
    }
}
