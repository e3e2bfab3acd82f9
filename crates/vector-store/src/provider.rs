use crate::config::DEFAULT_EMBEDDING_BATCH_SIZE;
use crate::error::{Result, VectorStoreError};
use async_trait::async_trait;

/// Anything that can turn a batch of texts into dense vectors.
///
/// Implementations may fail for any reason; callers treat every error as "embeddings
/// unavailable for this call".
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Identifier of the underlying model, used for logging.
    fn model_id(&self) -> &str;

    /// Largest batch a single `embed` call should receive.
    fn max_batch(&self) -> usize {
        DEFAULT_EMBEDDING_BATCH_SIZE
    }

    /// Embed one batch. The result must contain exactly one vector per input, in order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Embed `texts` in provider-sized batches, validating counts and a consistent dimension.
pub async fn embed_batched(
    provider: &dyn EmbeddingProvider,
    texts: &[String],
) -> Result<Vec<Vec<f32>>> {
    let batch_size = provider.max_batch().max(1);
    let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(texts.len());
    let mut dimension: Option<usize> = None;

    for batch in texts.chunks(batch_size) {
        let embedded = provider.embed(batch).await?;
        if embedded.len() != batch.len() {
            return Err(VectorStoreError::CountMismatch {
                expected: batch.len(),
                actual: embedded.len(),
            });
        }
        for vector in embedded {
            if vector.is_empty() {
                return Err(VectorStoreError::MalformedResponse(
                    "empty embedding vector".to_string(),
                ));
            }
            match dimension {
                Some(expected) if expected != vector.len() => {
                    return Err(VectorStoreError::InvalidDimension {
                        expected,
                        actual: vector.len(),
                    });
                }
                Some(_) => {}
                None => dimension = Some(vector.len()),
            }
            vectors.push(vector);
        }
    }

    log::debug!(
        "Embedded {} texts with '{}' in {} batches",
        texts.len(),
        provider.model_id(),
        texts.len().div_ceil(batch_size)
    );
    Ok(vectors)
}
