use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use crate::normalize::l2_normalize_in_place;
use crate::retry::{retry_transient, RetryConfig};
use crate::{Encoder, SemanticConfig, SemanticError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ApiProviderKind {
    HuggingFace,
    OpenAI,
    Custom,
}

impl ApiProviderKind {
    fn from_config(cfg: &SemanticConfig) -> Self {
        let provider = cfg
            .api_provider
            .as_deref()
            .unwrap_or("custom")
            .to_ascii_lowercase();
        match provider.as_str() {
            "hf" | "huggingface" => ApiProviderKind::HuggingFace,
            "openai" | "gpt" => ApiProviderKind::OpenAI,
            _ => ApiProviderKind::Custom,
        }
    }
}

/// Encoder backed by a remote embedding HTTP endpoint.
///
/// Supports three request shapes: Hugging Face (`{"inputs": ...}`), OpenAI
/// (`{"input": ..., "model": ...}`) and a custom `{"texts": [...]}` /
/// `{"text": ...}` shape. Transient failures are retried per the configured
/// [`RetryConfig`].
#[derive(Debug, Clone)]
pub struct ApiEncoder {
    client: reqwest::Client,
    url: String,
    auth_header: Option<String>,
    provider: ApiProviderKind,
    model_name: String,
    normalize: bool,
    retry: RetryConfig,
}

impl ApiEncoder {
    pub fn from_config(cfg: &SemanticConfig) -> Result<Self, SemanticError> {
        let url = cfg
            .api_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| SemanticError::InvalidConfig("api_url is required for api mode".into()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.api_timeout_secs.max(1)))
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(32)
            .build()
            .map_err(|e| SemanticError::InvalidConfig(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: url.to_owned(),
            auth_header: cfg.api_auth_header.clone(),
            provider: ApiProviderKind::from_config(cfg),
            model_name: cfg.model_name.clone(),
            normalize: cfg.normalize,
            retry: cfg.retry,
        })
    }

    async fn request(&self, payload: Value) -> Result<Vec<Vec<f32>>, SemanticError> {
        let response = retry_transient(&self.retry, |attempt| {
            let payload = payload.clone();
            async move {
                if attempt > 0 {
                    debug!(attempt, url = %self.url, "encoder_api_attempt");
                }
                self.send(payload).await
            }
        })
        .await?;

        let mut vectors = parse_embeddings_from_value(response)?;
        if self.normalize {
            for vector in &mut vectors {
                l2_normalize_in_place(vector);
            }
        }
        Ok(vectors)
    }

    async fn send(&self, payload: Value) -> Result<Value, SemanticError> {
        let mut request = self.client.post(&self.url);
        if let Some(header) = self.auth_header.as_deref() {
            request = request.header(reqwest::header::AUTHORIZATION, header);
        }

        let response = request
            .json(&payload)
            .send()
            .await
            .map_err(|e| SemanticError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SemanticError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| SemanticError::Inference(format!("invalid JSON response: {e}")))
    }
}

#[async_trait]
impl Encoder for ApiEncoder {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, SemanticError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let payload = build_api_payload(self.provider, texts, &self.model_name, true);
        let vectors = self.request(payload).await?;
        if vectors.len() != texts.len() {
            return Err(SemanticError::Inference(format!(
                "API returned {} embeddings for {} inputs",
                vectors.len(),
                texts.len()
            )));
        }
        Ok(vectors)
    }

    async fn encode(&self, text: &str) -> Result<Vec<f32>, SemanticError> {
        let texts = [text.to_owned()];
        let payload = build_api_payload(self.provider, &texts, &self.model_name, false);
        self.request(payload)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| SemanticError::Inference("API response did not contain embeddings".into()))
    }
}

fn build_api_payload(
    provider: ApiProviderKind,
    texts: &[String],
    model_name: &str,
    batch: bool,
) -> Value {
    let first = texts.first().map(String::as_str).unwrap_or("");
    match (provider, batch) {
        (ApiProviderKind::HuggingFace, true) => json!({ "inputs": texts }),
        (ApiProviderKind::HuggingFace, false) => json!({ "inputs": first }),
        (ApiProviderKind::OpenAI, true) => json!({ "input": texts, "model": model_name }),
        (ApiProviderKind::OpenAI, false) => json!({ "input": first, "model": model_name }),
        (ApiProviderKind::Custom, true) => json!({ "texts": texts }),
        (ApiProviderKind::Custom, false) => json!({ "text": first }),
    }
}

fn parse_embeddings_from_value(value: Value) -> Result<Vec<Vec<f32>>, SemanticError> {
    match value {
        Value::Object(mut map) => {
            if let Some(embeddings) = map.remove("embeddings") {
                return parse_embedding_collection(embeddings);
            }

            if let Some(Value::Array(items)) = map.remove("data") {
                return items
                    .into_iter()
                    .map(|item| match item {
                        Value::Object(mut obj) => obj
                            .remove("embedding")
                            .ok_or_else(|| {
                                SemanticError::Inference(
                                    "missing `embedding` field in data item".into(),
                                )
                            })
                            .and_then(parse_embedding_vector),
                        _ => Err(SemanticError::Inference(
                            "unexpected entry inside `data` array".into(),
                        )),
                    })
                    .collect();
            }

            Err(SemanticError::Inference(
                "unsupported API response shape".into(),
            ))
        }
        other => parse_embedding_collection(other),
    }
}

fn parse_embedding_collection(value: Value) -> Result<Vec<Vec<f32>>, SemanticError> {
    match value {
        Value::Array(items) => {
            if items.is_empty() {
                Ok(Vec::new())
            } else if items.iter().all(|item| matches!(item, Value::Array(_))) {
                items.into_iter().map(parse_embedding_vector).collect()
            } else {
                parse_embedding_vector(Value::Array(items)).map(|vec| vec![vec])
            }
        }
        other => parse_embedding_vector(other).map(|vec| vec![vec]),
    }
}

fn parse_embedding_vector(value: Value) -> Result<Vec<f32>, SemanticError> {
    match value {
        Value::Array(values) => values
            .into_iter()
            .map(|entry| match entry {
                Value::Number(num) => num
                    .as_f64()
                    .map(|f| f as f32)
                    .ok_or_else(|| SemanticError::Inference("non-finite embedding value".into())),
                other => Err(SemanticError::Inference(format!(
                    "embedding entries must be numbers, got {other:?}"
                ))),
            })
            .collect(),
        other => Err(SemanticError::Inference(format!(
            "embedding vector must be an array, got {other:?}"
        ))),
    }
}
