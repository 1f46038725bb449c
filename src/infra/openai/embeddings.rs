use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use count_unify::fetch::{BasicClient, HttpClient, auth::ApiKey, post_json};

use super::{checked_body, transport_error};
use crate::infra::documents::EmbeddingConfig;
use crate::services::ProviderError;
use crate::services::embeddings::Embedder;

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Deserialize)]
struct EmbeddingItem {
    #[serde(default)]
    index: Option<usize>,
    embedding: Vec<f32>,
}

pub struct OpenAiEmbedder<C = ApiKey<BasicClient>> {
    client: C,
    model: String,
    url: String,
    timeout: Duration,
}

impl OpenAiEmbedder {
    /// Builds an embedder authenticated with the configured bearer key.
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self> {
        let key = config
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow!("OPENAI_API_KEY must be set to use the embedding service"))?;
        Ok(Self::with_client(ApiKey::bearer(BasicClient::new(), key)?, config))
    }
}

impl<C> OpenAiEmbedder<C> {
    pub fn with_client(client: C, config: &EmbeddingConfig) -> Self {
        Self {
            client,
            model: config.model.clone(),
            url: config.base_url.clone(),
            timeout: config.timeout,
        }
    }
}

#[async_trait]
impl<C: HttpClient> Embedder for OpenAiEmbedder<C> {
    #[tracing::instrument(skip_all, fields(model = %self.model, inputs = texts.len()))]
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let request = EmbeddingRequest {
            model: &self.model,
            input: texts,
        };
        let response = post_json(&self.client, &self.url, &request, self.timeout)
            .await
            .map_err(transport_error)?;
        let body = checked_body(response).await?;

        let vectors = parse_embeddings(&body, texts.len())?;
        debug!(dims = vectors.first().map_or(0, Vec::len), "Embeddings received");
        Ok(vectors)
    }
}

/// Extracts the vectors from an embeddings response, ordered by `index`
/// when the provider reports one.
pub fn parse_embeddings(body: &str, expected: usize) -> Result<Vec<Vec<f32>>> {
    let mut parsed: EmbeddingResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

    if parsed.data.len() != expected {
        return Err(ProviderError::InvalidResponse(format!(
            "expected {expected} embeddings, got {}",
            parsed.data.len()
        ))
        .into());
    }

    parsed.data.sort_by_key(|item| item.index);
    Ok(parsed.data.into_iter().map(|item| item.embedding).collect())
}
