use crate::provider::{embed_batched, EmbeddingProvider};
use crate::single_flight::SingleFlight;
use std::sync::Arc;

/// Settled outcome of a document's embedding computation.
#[derive(Clone, Debug)]
pub enum EmbeddingState {
    Ready(Arc<Vec<Vec<f32>>>),
    Failed(String),
}

/// Per-document chunk embeddings, computed lazily and at most once.
///
/// A failure is recorded and never retried for this slot; callers fall back to lexical
/// scoring instead.
#[derive(Debug, Default)]
pub struct EmbeddingSlot {
    flight: SingleFlight<EmbeddingState>,
}

impl EmbeddingSlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached vectors, if the computation already succeeded.
    #[must_use]
    pub fn vectors(&self) -> Option<Arc<Vec<Vec<f32>>>> {
        match self.flight.get() {
            Some(EmbeddingState::Ready(vectors)) => Some(Arc::clone(vectors)),
            _ => None,
        }
    }

    #[must_use]
    pub fn has_failed(&self) -> bool {
        matches!(self.flight.get(), Some(EmbeddingState::Failed(_)))
    }

    #[must_use]
    pub fn failure_reason(&self) -> Option<&str> {
        match self.flight.get() {
            Some(EmbeddingState::Failed(reason)) => Some(reason.as_str()),
            _ => None,
        }
    }

    /// Make sure one vector exists per text. Returns true when usable embeddings are cached.
    ///
    /// Concurrent callers share a single in-flight computation.
    pub async fn ensure(&self, texts: &[String], provider: &dyn EmbeddingProvider) -> bool {
        let state = self
            .flight
            .run(|| async {
                match embed_batched(provider, texts).await {
                    Ok(vectors) if vectors.len() == texts.len() => {
                        EmbeddingState::Ready(Arc::new(vectors))
                    }
                    Ok(vectors) => EmbeddingState::Failed(format!(
                        "expected {} vectors, got {}",
                        texts.len(),
                        vectors.len()
                    )),
                    Err(err) => {
                        log::warn!(
                            "Chunk embeddings with '{}' failed; continuing without semantic search: {err}",
                            provider.model_id()
                        );
                        EmbeddingState::Failed(err.to_string())
                    }
                }
            })
            .await;

        match state {
            EmbeddingState::Ready(vectors) => vectors.len() == texts.len(),
            EmbeddingState::Failed(_) => false,
        }
    }
}
