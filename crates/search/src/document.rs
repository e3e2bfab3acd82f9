use crate::bm25::{build_chunk_index, ChunkIndex};
use paper_protocol::PaperRef;
use paper_text_chunker::Chunker;
use paper_vector_store::{EmbeddingProvider, EmbeddingSlot};
use std::sync::Arc;

/// Chunked, indexed text of one paper, built once per text version.
///
/// Chunk embeddings are attached lazily through [`DocumentContext::ensure_embeddings`].
#[derive(Debug)]
pub struct DocumentContext {
    title: String,
    full_text: String,
    chunks: Vec<String>,
    index: ChunkIndex,
    embeddings: EmbeddingSlot,
}

impl DocumentContext {
    pub fn from_text(title: impl Into<String>, text: &str, chunker: &Chunker) -> Self {
        let chunks = chunker.chunk_str(text);
        Self::build(title.into(), text.to_string(), chunks)
    }

    /// Build from pre-split chunks; the full text is their paragraph-joined concatenation.
    pub fn from_chunks(title: impl Into<String>, chunks: Vec<String>) -> Self {
        let full_text = chunks.join("\n\n");
        Self::build(title.into(), full_text, chunks)
    }

    fn build(title: String, full_text: String, chunks: Vec<String>) -> Self {
        let index = build_chunk_index(&chunks);
        log::debug!(
            "Indexed '{}': {} chunks, avg {:.1} terms",
            title,
            chunks.len(),
            index.avg_chunk_length
        );
        Self {
            title,
            full_text,
            chunks,
            index,
            embeddings: EmbeddingSlot::new(),
        }
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn full_text(&self) -> &str {
        &self.full_text
    }

    #[must_use]
    pub fn total_chars(&self) -> usize {
        self.full_text.chars().count()
    }

    #[must_use]
    pub fn chunks(&self) -> &[String] {
        &self.chunks
    }

    #[must_use]
    pub fn index(&self) -> &ChunkIndex {
        &self.index
    }

    #[must_use]
    pub fn has_text(&self) -> bool {
        !self.chunks.is_empty()
    }

    #[must_use]
    pub fn embeddings(&self) -> Option<Arc<Vec<Vec<f32>>>> {
        self.embeddings.vectors()
    }

    #[must_use]
    pub fn embeddings_failed(&self) -> bool {
        self.embeddings.has_failed()
    }

    /// Compute chunk embeddings at most once; true when one vector per chunk is available.
    pub async fn ensure_embeddings(&self, provider: &dyn EmbeddingProvider) -> bool {
        if self.chunks.is_empty() {
            return false;
        }
        self.embeddings.ensure(&self.chunks, provider).await
    }
}

/// A paper together with its built context; `None` when no text could be extracted.
#[derive(Debug, Clone)]
pub struct PaperSource {
    pub paper: PaperRef,
    pub context: Option<Arc<DocumentContext>>,
}

impl PaperSource {
    pub fn new(paper: PaperRef, context: Option<Arc<DocumentContext>>) -> Self {
        Self { paper, context }
    }

    /// Extracted text, empty when unavailable.
    #[must_use]
    pub fn text(&self) -> &str {
        self.context.as_deref().map_or("", DocumentContext::full_text)
    }
}
