//! # Paper Search
//!
//! Question-driven evidence retrieval across one or more papers.
//!
//! ```text
//! papers + question + budget
//!     │
//!     ├─ full text fits? ──> "Full Paper Contexts:" (every paper, whole)
//!     │
//!     └─ otherwise, per paper:
//!          BM25 over chunk terms ──┐
//!          cosine(chunk, question) ┴─> min-max + weighted fusion ─> top-k
//!                                              │
//!          global pool ─> coverage pass ─> greedy MMR under budget
//!                                              │
//!          [P1-C3] … grouped evidence, or a metadata-only listing
//! ```
//!
//! Semantic scoring is optional: without an embedder, or whenever embedding fails, the same
//! pipeline runs on lexical scores alone.

mod assembly;
mod bm25;
mod cache;
mod candidates;
mod document;
mod fusion;
mod packer;
mod render;

pub use assembly::{
    assemble_paper_context, select_context_assembly_mode, AssembledContext, AssemblyMode,
};
pub use bm25::{bm25_idf, build_chunk_index, score_chunk_bm25, Bm25Config, ChunkIndex, ChunkStats};
pub use cache::{DocumentContextCache, DEFAULT_CACHE_CAPACITY};
pub use candidates::{
    build_paper_retrieval_candidates, CandidateOptions, RetrievalMode, RetrievalResult,
    ScoredCandidate,
};
pub use document::{DocumentContext, PaperSource};
pub use fusion::{fuse_scores, min_max_normalize, HybridWeights};
pub use packer::{
    assemble_retrieved_multi_paper_context, pack_candidates, ContextRequest, PackSelection,
    PackerConfig, PaperRetrieval, RetrievedContext,
};
pub use render::{
    evidence_label, render_evidence_pack, render_full_paper_contexts, render_metadata_only,
    EVIDENCE_HEADER, FULL_CONTEXT_HEADER, METADATA_ONLY_HEADER,
};
