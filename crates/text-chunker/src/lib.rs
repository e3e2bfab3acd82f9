//! # Paper Text Chunker
//!
//! Splits extracted paper text into bounded, paragraph-aware chunks and extracts the lexical
//! terms the retrieval layer scores against.
//!
//! ## Philosophy
//!
//! Chunks should be roughly uniform in size: the packer's token arithmetic treats each chunk
//! as one unit of evidence, so a single oversized chunk would distort every budget decision.
//!
//! - Paragraphs are accumulated until the next one would overflow the target length
//! - A paragraph longer than the target is hard-split into overlapping windows
//! - Whitespace-only input produces no chunks at all
//!
//! ## Example
//!
//! ```rust
//! use paper_text_chunker::{Chunker, ChunkerConfig};
//!
//! let chunker = Chunker::new(ChunkerConfig::default()).unwrap();
//! let chunks = chunker.chunk_str("Introduction\n\nWe study BM25.\n\nResults follow.");
//! assert_eq!(chunks.len(), 1);
//! ```

mod chunker;
mod config;
mod error;
mod terms;

pub use chunker::{split_into_chunks, Chunker};
pub use config::ChunkerConfig;
pub use error::{ChunkerError, Result};
pub use terms::{diversity_signature, extract_terms, is_stopword, unique_terms, MIN_TERM_CHARS};
