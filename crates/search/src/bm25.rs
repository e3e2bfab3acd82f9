//! Per-document BM25 index over chunk terms.

use paper_text_chunker::extract_terms;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bm25Config {
    pub k1: f32,
    pub b: f32,
}

impl Default for Bm25Config {
    fn default() -> Self {
        Self { k1: 1.2, b: 0.75 }
    }
}

/// Term statistics for one chunk.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChunkStats {
    /// Number of (filtered) terms in the chunk
    pub term_count: usize,
    pub term_freq: HashMap<String, usize>,
    /// Distinct terms in first-seen order
    pub unique_terms: Vec<String>,
}

impl ChunkStats {
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        let terms = extract_terms(text);
        let mut term_freq: HashMap<String, usize> = HashMap::new();
        let mut unique_terms = Vec::new();
        for term in &terms {
            let count = term_freq.entry(term.clone()).or_insert(0);
            if *count == 0 {
                unique_terms.push(term.clone());
            }
            *count += 1;
        }
        Self {
            term_count: terms.len(),
            term_freq,
            unique_terms,
        }
    }
}

/// Lexical index over all chunks of one document.
#[derive(Clone, Debug, Default)]
pub struct ChunkIndex {
    pub chunk_stats: Vec<ChunkStats>,
    /// term → number of chunks containing it
    pub doc_freq: HashMap<String, usize>,
    pub avg_chunk_length: f32,
}

impl ChunkIndex {
    #[must_use]
    pub fn len(&self) -> usize {
        self.chunk_stats.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunk_stats.is_empty()
    }

    /// Raw BM25 score of every chunk, in chunk order.
    #[must_use]
    pub fn score_all(&self, query_terms: &[String], config: &Bm25Config) -> Vec<f32> {
        self.chunk_stats
            .iter()
            .map(|stats| {
                score_chunk_bm25(
                    stats,
                    query_terms,
                    &self.doc_freq,
                    self.chunk_stats.len(),
                    self.avg_chunk_length,
                    config,
                )
            })
            .collect()
    }
}

#[must_use]
pub fn build_chunk_index(chunks: &[String]) -> ChunkIndex {
    let chunk_stats: Vec<ChunkStats> = chunks.iter().map(|c| ChunkStats::from_text(c)).collect();

    let mut doc_freq: HashMap<String, usize> = HashMap::new();
    for stats in &chunk_stats {
        for term in &stats.unique_terms {
            *doc_freq.entry(term.clone()).or_insert(0) += 1;
        }
    }

    let total_terms: usize = chunk_stats.iter().map(|s| s.term_count).sum();
    #[allow(clippy::cast_precision_loss)]
    let avg_chunk_length = if chunk_stats.is_empty() {
        0.0
    } else {
        total_terms as f32 / chunk_stats.len() as f32
    };

    ChunkIndex {
        chunk_stats,
        doc_freq,
        avg_chunk_length,
    }
}

#[must_use]
pub fn bm25_idf(total_chunks: f32, df: f32) -> f32 {
    (1.0 + (total_chunks - df + 0.5) / (df + 0.5)).ln()
}

/// Standard BM25 with duplicate query terms ignored.
///
/// Chunks or queries without terms score 0; an average length of 0 is treated as 1.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn score_chunk_bm25(
    stats: &ChunkStats,
    query_terms: &[String],
    doc_freq: &HashMap<String, usize>,
    total_chunks: usize,
    avg_chunk_length: f32,
    config: &Bm25Config,
) -> f32 {
    if stats.term_count == 0 || query_terms.is_empty() {
        return 0.0;
    }

    let avg_len = if avg_chunk_length > 0.0 {
        avg_chunk_length
    } else {
        1.0
    };
    let doc_len = stats.term_count as f32;
    let total = total_chunks as f32;
    let mut seen: HashSet<&str> = HashSet::new();
    let mut score = 0.0f32;

    for term in query_terms {
        if !seen.insert(term.as_str()) {
            continue;
        }
        let Some(&tf) = stats.term_freq.get(term) else {
            continue;
        };
        let tf = tf as f32;
        let df = doc_freq.get(term).copied().unwrap_or(0) as f32;
        let idf = bm25_idf(total, df);
        let denom = tf + config.k1 * (1.0 - config.b + config.b * doc_len / avg_len);
        if denom > 0.0 {
            score += idf * (tf * (config.k1 + 1.0)) / denom;
        }
    }

    if score.is_finite() {
        score
    } else {
        0.0
    }
}
