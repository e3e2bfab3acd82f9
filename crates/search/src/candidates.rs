use crate::bm25::Bm25Config;
use crate::document::DocumentContext;
use crate::fusion::{fuse_scores, min_max_normalize, HybridWeights};
use paper_protocol::{estimate_text_tokens, DocumentKey, PaperRef};
use paper_text_chunker::unique_terms;
use paper_vector_store::{cosine_similarity, EmbeddingProvider};
use serde::Serialize;
use std::cmp::Ordering;

/// One chunk scored against the question.
///
/// Scores are per-document min-max normalised; `hybrid_score` is their weighted fusion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredCandidate {
    pub key: DocumentKey,
    pub chunk_index: usize,
    pub text: String,
    pub estimated_tokens: usize,
    pub bm25_score: f32,
    pub embedding_score: f32,
    pub hybrid_score: f32,
}

/// How a paper's candidates were scored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalMode {
    Hybrid,
    LexicalOnly,
    NoCandidates,
}

impl RetrievalMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hybrid => "hybrid",
            Self::LexicalOnly => "lexical_only",
            Self::NoCandidates => "no_candidates",
        }
    }
}

/// Per-paper candidate list tagged with the scoring path that produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum RetrievalResult {
    Hybrid(Vec<ScoredCandidate>),
    LexicalOnly(Vec<ScoredCandidate>),
    NoCandidates,
}

impl RetrievalResult {
    #[must_use]
    pub fn mode(&self) -> RetrievalMode {
        match self {
            Self::Hybrid(_) => RetrievalMode::Hybrid,
            Self::LexicalOnly(_) => RetrievalMode::LexicalOnly,
            Self::NoCandidates => RetrievalMode::NoCandidates,
        }
    }

    #[must_use]
    pub fn candidates(&self) -> &[ScoredCandidate] {
        match self {
            Self::Hybrid(c) | Self::LexicalOnly(c) => c,
            Self::NoCandidates => &[],
        }
    }

    #[must_use]
    pub fn into_candidates(self) -> Vec<ScoredCandidate> {
        match self {
            Self::Hybrid(c) | Self::LexicalOnly(c) => c,
            Self::NoCandidates => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateOptions {
    pub top_k: usize,
    pub bm25: Bm25Config,
    pub weights: HybridWeights,
}

impl Default for CandidateOptions {
    fn default() -> Self {
        Self {
            top_k: 12,
            bm25: Bm25Config::default(),
            weights: HybridWeights::default(),
        }
    }
}

/// Score every chunk of one paper and keep the best `top_k`.
///
/// With an embedder the chunk embeddings are ensured (once per document) and the question is
/// embedded; any failure along that path degrades this call to lexical scoring. Candidates are
/// ordered by hybrid score descending, ties by chunk index ascending.
pub async fn build_paper_retrieval_candidates(
    paper: &PaperRef,
    doc: Option<&DocumentContext>,
    question: &str,
    embedder: Option<&dyn EmbeddingProvider>,
    options: &CandidateOptions,
) -> RetrievalResult {
    let Some(doc) = doc.filter(|d| d.has_text()) else {
        return RetrievalResult::NoCandidates;
    };
    if options.top_k == 0 {
        return RetrievalResult::NoCandidates;
    }

    let query_terms = unique_terms(question);
    let bm25 = min_max_normalize(&doc.index().score_all(&query_terms, &options.bm25));

    let semantic = match embedder {
        Some(embedder) if !question.trim().is_empty() => {
            semantic_scores(doc, question, embedder).await
        }
        _ => None,
    };

    let weights = if semantic.is_some() {
        options.weights
    } else {
        HybridWeights::LEXICAL_ONLY
    };
    let hybrid = fuse_scores(&bm25, semantic.as_deref(), weights);

    let key = paper.key();
    let mut candidates: Vec<ScoredCandidate> = doc
        .chunks()
        .iter()
        .enumerate()
        .map(|(i, text)| ScoredCandidate {
            key,
            chunk_index: i,
            text: text.clone(),
            estimated_tokens: estimate_text_tokens(text),
            bm25_score: bm25[i],
            embedding_score: semantic.as_ref().map_or(0.0, |s| s[i]),
            hybrid_score: hybrid[i],
        })
        .collect();

    candidates.sort_by(|a, b| {
        b.hybrid_score
            .partial_cmp(&a.hybrid_score)
            .unwrap_or(Ordering::Equal)
            .then(a.chunk_index.cmp(&b.chunk_index))
    });
    candidates.truncate(options.top_k);

    log::debug!(
        "Paper {} '{}': {} candidates ({})",
        key,
        paper.display_title(),
        candidates.len(),
        if semantic.is_some() { "hybrid" } else { "lexical" }
    );

    if semantic.is_some() {
        RetrievalResult::Hybrid(candidates)
    } else {
        RetrievalResult::LexicalOnly(candidates)
    }
}

/// Normalised cosine similarity of each chunk to the question, or `None` on any failure.
async fn semantic_scores(
    doc: &DocumentContext,
    question: &str,
    embedder: &dyn EmbeddingProvider,
) -> Option<Vec<f32>> {
    if !doc.ensure_embeddings(embedder).await {
        return None;
    }
    let chunk_vectors = doc.embeddings()?;

    let query_vector = match embedder.embed(&[question.to_string()]).await {
        Ok(mut vectors) if vectors.len() == 1 => vectors.pop()?,
        Ok(vectors) => {
            log::warn!(
                "Query embedding returned {} vectors; using lexical scores",
                vectors.len()
            );
            return None;
        }
        Err(err) => {
            log::warn!("Query embedding failed; using lexical scores: {err}");
            return None;
        }
    };

    let raw: Vec<f32> = chunk_vectors
        .iter()
        .map(|chunk| cosine_similarity(chunk, &query_vector))
        .collect();
    Some(min_max_normalize(&raw))
}
