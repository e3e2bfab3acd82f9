//! # Paper Vector Store
//!
//! Dense embeddings for paper chunks.
//!
//! ## Features
//!
//! - **Pluggable providers** behind the async [`EmbeddingProvider`] trait
//! - **OpenAI-compatible HTTP** embeddings (`POST {api_base}/embeddings`)
//! - **Deterministic stub** embeddings for tests and offline runs
//! - **Single-flight slots**: concurrent callers for one document share one computation,
//!   and a failure is remembered for the lifetime of the slot
//!
//! ## Architecture
//!
//! ```text
//! chunk texts
//!     │
//!     ├──> EmbeddingSlot (per document)
//!     │      ├─> Ready(vectors)  → reuse
//!     │      ├─> Failed(reason)  → never retried
//!     │      └─> empty           → SingleFlight::run
//!     │
//!     └──> embed_batched(provider, texts)
//!            └─> provider.embed(batch) × ceil(n / max_batch)
//! ```

mod config;
mod error;
mod http;
mod provider;
mod single_flight;
mod slot;
mod stub;
mod vector;

pub use config::{EmbeddingConfig, DEFAULT_EMBEDDING_BATCH_SIZE};
pub use error::{Result, VectorStoreError};
pub use http::HttpEmbeddingProvider;
pub use provider::{embed_batched, EmbeddingProvider};
pub use single_flight::SingleFlight;
pub use slot::{EmbeddingSlot, EmbeddingState};
pub use stub::StubEmbeddingProvider;
pub use vector::{cosine_similarity, normalize};
