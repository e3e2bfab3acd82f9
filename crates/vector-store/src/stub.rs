use crate::config::DEFAULT_EMBEDDING_BATCH_SIZE;
use crate::error::Result;
use crate::provider::EmbeddingProvider;
use crate::vector::normalize;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Deterministic, offline embeddings.
///
/// Each lowercase alphanumeric word is hashed into a signed bucket, so texts sharing words
/// land close together. Good enough to exercise the hybrid path without a network.
#[derive(Debug)]
pub struct StubEmbeddingProvider {
    dimension: usize,
    max_batch: usize,
    batch_calls: AtomicUsize,
}

impl StubEmbeddingProvider {
    #[must_use]
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
            max_batch: DEFAULT_EMBEDDING_BATCH_SIZE,
            batch_calls: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn with_max_batch(mut self, max_batch: usize) -> Self {
        self.max_batch = max_batch.max(1);
        self
    }

    /// Number of `embed` calls served so far.
    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::Relaxed)
    }
}

impl Default for StubEmbeddingProvider {
    fn default() -> Self {
        Self::new(64)
    }
}

#[async_trait]
impl EmbeddingProvider for StubEmbeddingProvider {
    fn model_id(&self) -> &str {
        "stub"
    }

    fn max_batch(&self) -> usize {
        self.max_batch
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.batch_calls.fetch_add(1, Ordering::Relaxed);
        Ok(texts
            .iter()
            .map(|text| stub_embed(text, self.dimension))
            .collect())
    }
}

fn stub_embed(text: &str, dimension: usize) -> Vec<f32> {
    let mut vec = vec![0.0f32; dimension];
    for word in text
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let mut state = fnv1a_64(word.to_ascii_lowercase().as_bytes());
        let bits = splitmix64(&mut state);
        #[allow(clippy::cast_possible_truncation)]
        let bucket = (bits % dimension as u64) as usize;
        let sign = if bits >> 63 == 0 { 1.0 } else { -1.0 };
        vec[bucket] += sign;
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::cosine_similarity;

    #[test]
    fn identical_texts_embed_identically() {
        assert_eq!(stub_embed("Common Result", 32), stub_embed("common result", 32));
    }

    #[test]
    fn shared_words_are_closer_than_disjoint_words() {
        let query = stub_embed("common result", 64);
        let related = stub_embed("the common result appears again", 64);
        let unrelated = stub_embed("method details", 64);

        assert!(
            cosine_similarity(&query, &related) > cosine_similarity(&query, &unrelated)
        );
    }

    #[test]
    fn empty_text_yields_zero_vector() {
        assert!(stub_embed("", 8).iter().all(|v| *v == 0.0));
    }
}
