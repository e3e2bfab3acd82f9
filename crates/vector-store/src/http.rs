use crate::config::EmbeddingConfig;
use crate::error::{Result, VectorStoreError};
use crate::provider::EmbeddingProvider;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Embeddings over an OpenAI-compatible `/embeddings` endpoint.
pub struct HttpEmbeddingProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    max_batch: usize,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    #[serde(default)]
    index: Option<usize>,
    embedding: Vec<f32>,
}

impl HttpEmbeddingProvider {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        if !config.is_configured() {
            return Err(VectorStoreError::NotConfigured);
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint(),
            api_key: config.api_key.trim().to_string(),
            model: config.model.clone(),
            max_batch: config.batch_size.max(1),
        })
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    fn model_id(&self) -> &str {
        &self.model
    }

    fn max_batch(&self) -> usize {
        self.max_batch
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&EmbeddingRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .await?
            .error_for_status()?;
        let body = response.bytes().await?;
        let parsed: EmbeddingResponse = serde_json::from_slice(&body)?;

        order_embeddings(parsed.data, texts.len())
    }
}

fn order_embeddings(data: Vec<EmbeddingDatum>, expected: usize) -> Result<Vec<Vec<f32>>> {
    if data.len() != expected {
        return Err(VectorStoreError::CountMismatch {
            expected,
            actual: data.len(),
        });
    }

    let mut slots: Vec<Option<Vec<f32>>> = vec![None; expected];
    for (position, datum) in data.into_iter().enumerate() {
        let index = datum.index.unwrap_or(position);
        let Some(slot) = slots.get_mut(index) else {
            return Err(VectorStoreError::MalformedResponse(format!(
                "embedding index {index} out of range for {expected} inputs"
            )));
        };
        if slot.is_some() {
            return Err(VectorStoreError::MalformedResponse(format!(
                "duplicate embedding index {index}"
            )));
        }
        *slot = Some(datum.embedding);
    }

    slots
        .into_iter()
        .map(|slot| {
            slot.ok_or_else(|| {
                VectorStoreError::MalformedResponse("missing embedding index".to_string())
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(json: &str) -> Vec<EmbeddingDatum> {
        serde_json::from_str::<EmbeddingResponse>(json).unwrap().data
    }

    #[test]
    fn reorders_by_index() {
        let data = parse(
            r#"{"data":[{"index":1,"embedding":[2.0]},{"index":0,"embedding":[1.0]}]}"#,
        );
        assert_eq!(order_embeddings(data, 2).unwrap(), vec![vec![1.0], vec![2.0]]);
    }

    #[test]
    fn missing_index_falls_back_to_position() {
        let data = parse(r#"{"data":[{"embedding":[1.0]},{"embedding":[2.0]}]}"#);
        assert_eq!(order_embeddings(data, 2).unwrap(), vec![vec![1.0], vec![2.0]]);
    }

    #[test]
    fn duplicate_or_out_of_range_indices_are_malformed() {
        let dup = parse(
            r#"{"data":[{"index":0,"embedding":[1.0]},{"index":0,"embedding":[2.0]}]}"#,
        );
        assert!(matches!(
            order_embeddings(dup, 2),
            Err(VectorStoreError::MalformedResponse(_))
        ));

        let out_of_range = parse(r#"{"data":[{"index":5,"embedding":[1.0]}]}"#);
        assert!(matches!(
            order_embeddings(out_of_range, 1),
            Err(VectorStoreError::MalformedResponse(_))
        ));
    }

    #[test]
    fn unconfigured_credentials_are_rejected() {
        let err = HttpEmbeddingProvider::new(&EmbeddingConfig::default())
            .err()
            .unwrap();
        assert!(matches!(err, VectorStoreError::NotConfigured));
    }
}
