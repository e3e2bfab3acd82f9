//! Budgeted multi-paper evidence packing.
//!
//! Selection runs in two passes over one global candidate pool:
//!
//! 1. **Coverage**: each paper (active paper first) gets its top few candidates, as long as
//!    they fit, so no document is starved by a more relevant one.
//! 2. **Greedy MMR**: the rest of the budget goes to the candidate with the best
//!    `(λ·relevance − (1−λ)·maxJaccard) / max(1, tokens)`, until nothing fits or every
//!    remaining candidate would only add redundancy.
//!
//! Relevance is the min-max normalised hybrid score across the whole pool.

use crate::bm25::Bm25Config;
use crate::candidates::{
    build_paper_retrieval_candidates, CandidateOptions, RetrievalMode, ScoredCandidate,
};
use crate::document::PaperSource;
use crate::fusion::{min_max_normalize, HybridWeights};
use crate::render::{render_evidence_pack, render_metadata_only};
use paper_protocol::{DocumentKey, PaperRef};
use paper_text_chunker::diversity_signature;
use paper_vector_store::EmbeddingProvider;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackerConfig {
    /// Candidates kept per paper before packing
    pub top_k_per_paper: usize,
    /// Coverage floor for the paper the user is looking at
    pub active_paper_min_chunks: usize,
    /// Coverage floor for every other paper
    pub other_paper_min_chunks: usize,
    /// Relevance vs. novelty trade-off in [0, 1]
    pub mmr_lambda: f32,
    pub bm25: Bm25Config,
    pub weights: HybridWeights,
}

impl Default for PackerConfig {
    fn default() -> Self {
        Self {
            top_k_per_paper: 12,
            active_paper_min_chunks: 2,
            other_paper_min_chunks: 1,
            mmr_lambda: 0.7,
            bm25: Bm25Config::default(),
            weights: HybridWeights::default(),
        }
    }
}

impl PackerConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.top_k_per_paper == 0 {
            return Err("top_k_per_paper must be > 0".to_string());
        }
        if !(0.0..=1.0).contains(&self.mmr_lambda) {
            return Err(format!(
                "mmr_lambda must be within [0, 1], got {}",
                self.mmr_lambda
            ));
        }
        if self.weights.bm25 < 0.0 || self.weights.embedding < 0.0 {
            return Err("hybrid weights must be non-negative".to_string());
        }
        if self.bm25.k1 < 0.0 || !(0.0..=1.0).contains(&self.bm25.b) {
            return Err("bm25 requires k1 >= 0 and b within [0, 1]".to_string());
        }
        Ok(())
    }

    #[must_use]
    pub fn candidate_options(&self) -> CandidateOptions {
        CandidateOptions {
            top_k: self.top_k_per_paper,
            bm25: self.bm25,
            weights: self.weights,
        }
    }
}

/// Outcome of [`pack_candidates`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PackSelection {
    /// Ordered by paper, then chunk index
    pub selected: Vec<ScoredCandidate>,
    pub used_tokens: usize,
    /// How many of `selected` came from the coverage pass
    pub coverage_chunks: usize,
}

struct Entry {
    candidate: ScoredCandidate,
    paper_pos: usize,
    relevance: f32,
    signature: BTreeSet<String>,
}

struct Packer {
    entries: Vec<Entry>,
    taken: Vec<bool>,
    max_similarity: Vec<f32>,
    remaining: usize,
    picks: Vec<usize>,
}

impl Packer {
    fn fits(&self, i: usize) -> bool {
        !self.taken[i] && self.entries[i].candidate.estimated_tokens <= self.remaining
    }

    fn take(&mut self, i: usize) {
        self.taken[i] = true;
        self.remaining -= self.entries[i].candidate.estimated_tokens;
        self.picks.push(i);
        for j in 0..self.entries.len() {
            if self.taken[j] {
                continue;
            }
            let sim = jaccard(&self.entries[i].signature, &self.entries[j].signature);
            if sim > self.max_similarity[j] {
                self.max_similarity[j] = sim;
            }
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn utility(&self, i: usize, lambda: f32) -> f32 {
        let entry = &self.entries[i];
        let gain = lambda * entry.relevance - (1.0 - lambda) * self.max_similarity[i];
        gain / entry.candidate.estimated_tokens.max(1) as f32
    }

    /// Higher relevance first, then earlier chunk.
    fn coverage_order(&self, a: usize, b: usize) -> Ordering {
        let (ea, eb) = (&self.entries[a], &self.entries[b]);
        eb.relevance
            .partial_cmp(&ea.relevance)
            .unwrap_or(Ordering::Equal)
            .then(ea.candidate.chunk_index.cmp(&eb.candidate.chunk_index))
    }

    /// `Greater` when `a` should win over `b`.
    fn greedy_order(&self, a: (usize, f32), b: (usize, f32)) -> Ordering {
        let (ea, eb) = (&self.entries[a.0], &self.entries[b.0]);
        a.1.partial_cmp(&b.1)
            .unwrap_or(Ordering::Equal)
            .then(
                ea.relevance
                    .partial_cmp(&eb.relevance)
                    .unwrap_or(Ordering::Equal),
            )
            .then(eb.paper_pos.cmp(&ea.paper_pos))
            .then(eb.candidate.chunk_index.cmp(&ea.candidate.chunk_index))
    }
}

fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f32 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let inter = a.intersection(b).count();
    let union = a.len() + b.len() - inter;
    if union == 0 {
        0.0
    } else {
        #[allow(clippy::cast_precision_loss)]
        let ratio = inter as f32 / union as f32;
        ratio
    }
}

/// Choose which candidates to include under `budget_tokens`.
///
/// Candidates for papers not listed in `papers` are ignored, as are duplicate
/// `(key, chunk_index)` pairs. The summed `estimated_tokens` of the result never exceeds the
/// budget.
#[must_use]
pub fn pack_candidates(
    papers: &[PaperRef],
    pool: Vec<ScoredCandidate>,
    budget_tokens: usize,
    active_paper: Option<DocumentKey>,
    config: &PackerConfig,
) -> PackSelection {
    let mut positions: HashMap<DocumentKey, usize> = HashMap::new();
    for paper in papers {
        let next = positions.len();
        positions.entry(paper.key()).or_insert(next);
    }

    let mut seen: HashSet<(DocumentKey, usize)> = HashSet::new();
    let pool: Vec<(ScoredCandidate, usize)> = pool
        .into_iter()
        .filter_map(|c| {
            let pos = *positions.get(&c.key)?;
            seen.insert((c.key, c.chunk_index)).then_some((c, pos))
        })
        .collect();
    if pool.is_empty() || budget_tokens == 0 {
        return PackSelection::default();
    }

    let relevance =
        min_max_normalize(&pool.iter().map(|(c, _)| c.hybrid_score).collect::<Vec<_>>());
    let entries: Vec<Entry> = pool
        .into_iter()
        .zip(relevance)
        .map(|((candidate, paper_pos), relevance)| Entry {
            signature: diversity_signature(&candidate.text),
            candidate,
            paper_pos,
            relevance,
        })
        .collect();

    let n = entries.len();
    let mut packer = Packer {
        entries,
        taken: vec![false; n],
        max_similarity: vec![0.0; n],
        remaining: budget_tokens,
        picks: Vec::new(),
    };

    // Coverage: active paper first, then the rest in caller order.
    let active_pos = active_paper.and_then(|key| positions.get(&key).copied());
    let mut paper_order: Vec<usize> = (0..positions.len()).collect();
    if let Some(active) = active_pos {
        paper_order.retain(|&p| p != active);
        paper_order.insert(0, active);
    }

    for pos in paper_order {
        let quota = if Some(pos) == active_pos {
            config.active_paper_min_chunks
        } else {
            config.other_paper_min_chunks
        };
        if quota == 0 {
            continue;
        }
        let mut group: Vec<usize> = (0..n).filter(|&i| packer.entries[i].paper_pos == pos).collect();
        group.sort_by(|&a, &b| packer.coverage_order(a, b));

        let mut granted = 0;
        for i in group {
            if granted == quota {
                break;
            }
            if packer.fits(i) {
                packer.take(i);
                granted += 1;
            }
        }
    }
    let coverage_chunks = packer.picks.len();

    // Greedy MMR over whatever budget is left.
    let lambda = config.mmr_lambda.clamp(0.0, 1.0);
    loop {
        let best = (0..n)
            .filter(|&i| packer.fits(i))
            .map(|i| (i, packer.utility(i, lambda)))
            .max_by(|&a, &b| packer.greedy_order(a, b));
        match best {
            Some((i, utility)) if utility > 0.0 => packer.take(i),
            _ => break,
        }
    }

    let used_tokens = budget_tokens - packer.remaining;
    let mut picks = packer.picks;
    picks.sort_by_key(|&i| {
        let entry = &packer.entries[i];
        (entry.paper_pos, entry.candidate.chunk_index)
    });

    let mut slots: Vec<Option<ScoredCandidate>> =
        packer.entries.into_iter().map(|e| Some(e.candidate)).collect();
    let selected = picks.into_iter().filter_map(|i| slots[i].take()).collect();

    PackSelection {
        selected,
        used_tokens,
        coverage_chunks,
    }
}

/// Inputs shared by retrieval and full-context assembly.
#[derive(Clone, Copy)]
pub struct ContextRequest<'a> {
    pub papers: &'a [PaperSource],
    pub question: &'a str,
    pub context_budget_tokens: usize,
    /// Paper currently open in the reader, if any
    pub active_paper: Option<DocumentKey>,
    /// `None` when no embedding credentials are configured
    pub embedder: Option<&'a dyn EmbeddingProvider>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaperRetrieval {
    pub key: DocumentKey,
    pub mode: RetrievalMode,
    pub candidates: usize,
    pub selected: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievedContext {
    pub context_text: String,
    pub selected_chunk_count: usize,
    pub used_tokens: usize,
    pub papers: Vec<PaperRetrieval>,
    /// Embeddings were requested but at least one paper fell back to lexical scoring
    pub semantic_degraded: bool,
    /// No chunk could be selected; the text lists paper metadata only
    pub metadata_only: bool,
    #[serde(skip)]
    pub selected: Vec<ScoredCandidate>,
}

/// Retrieve, pack and render evidence from every paper in `request`.
///
/// Never fails: with no usable candidates (or a budget too small for any of them) the result
/// is a metadata-only listing.
pub async fn assemble_retrieved_multi_paper_context(
    request: &ContextRequest<'_>,
    config: &PackerConfig,
) -> RetrievedContext {
    let options = config.candidate_options();
    let mut seen: HashSet<DocumentKey> = HashSet::new();
    let sources: Vec<&PaperSource> = request
        .papers
        .iter()
        .filter(|s| seen.insert(s.paper.key()))
        .collect();
    let papers: Vec<PaperRef> = sources.iter().map(|s| s.paper.clone()).collect();

    let mut pool: Vec<ScoredCandidate> = Vec::new();
    let mut retrievals: Vec<PaperRetrieval> = Vec::with_capacity(sources.len());
    for source in &sources {
        let result = build_paper_retrieval_candidates(
            &source.paper,
            source.context.as_deref(),
            request.question,
            request.embedder,
            &options,
        )
        .await;
        retrievals.push(PaperRetrieval {
            key: source.paper.key(),
            mode: result.mode(),
            candidates: result.candidates().len(),
            selected: 0,
        });
        pool.extend(result.into_candidates());
    }

    let semantic_requested = request.embedder.is_some() && !request.question.trim().is_empty();
    let semantic_degraded = semantic_requested
        && retrievals
            .iter()
            .any(|r| r.mode == RetrievalMode::LexicalOnly);
    if semantic_degraded {
        log::warn!("Semantic scoring unavailable for some papers; using lexical scores");
    }

    let selection = pack_candidates(
        &papers,
        pool,
        request.context_budget_tokens,
        request.active_paper,
        config,
    );

    for retrieval in &mut retrievals {
        retrieval.selected = selection
            .selected
            .iter()
            .filter(|c| c.key == retrieval.key)
            .count();
    }

    let evidence = render_evidence_pack(&papers, &selection.selected);
    let metadata_only = evidence.is_empty();
    let context_text = if metadata_only {
        log::info!(
            "No evidence fits {} tokens across {} papers; sending metadata only",
            request.context_budget_tokens,
            papers.len()
        );
        render_metadata_only(&papers)
    } else {
        evidence
    };

    log::info!(
        "Packed {} chunks ({} tokens, {} from coverage) from {} papers",
        selection.selected.len(),
        selection.used_tokens,
        selection.coverage_chunks,
        papers.len()
    );

    RetrievedContext {
        context_text,
        selected_chunk_count: selection.selected.len(),
        used_tokens: selection.used_tokens,
        papers: retrievals,
        semantic_degraded,
        metadata_only,
        selected: selection.selected,
    }
}
