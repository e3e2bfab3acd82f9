use crate::document::DocumentContext;
use lru::LruCache;
use paper_protocol::{DocumentKey, PaperRef};
use paper_text_chunker::Chunker;
use sha2::{Digest, Sha256};
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};

pub const DEFAULT_CACHE_CAPACITY: usize = 64;

struct CachedDocument {
    fingerprint: [u8; 32],
    context: Arc<DocumentContext>,
}

/// Session cache of built document contexts, keyed by document identity.
///
/// An entry is reused only while the extracted text hashes to the same fingerprint, so a
/// re-extracted attachment gets re-chunked and its embeddings recomputed.
pub struct DocumentContextCache {
    chunker: Chunker,
    entries: Mutex<LruCache<DocumentKey, CachedDocument>>,
}

impl DocumentContextCache {
    #[must_use]
    pub fn new(chunker: Chunker, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            chunker,
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    #[must_use]
    pub fn chunker(&self) -> &Chunker {
        &self.chunker
    }

    /// Return the cached context for `paper` if its text is unchanged, else build a new one.
    pub fn get_or_build(&self, paper: &PaperRef, text: &str) -> Arc<DocumentContext> {
        let key = paper.key();
        let fingerprint = fingerprint(text);

        {
            let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(cached) = entries.get(&key) {
                if cached.fingerprint == fingerprint {
                    return Arc::clone(&cached.context);
                }
                log::debug!("Text for {key} changed; rebuilding document context");
            }
        }

        // Chunking happens outside the lock; a racing builder for the same key just wins last.
        let context = Arc::new(DocumentContext::from_text(
            paper.display_title(),
            text,
            &self.chunker,
        ));

        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.put(
            key,
            CachedDocument {
                fingerprint,
                context: Arc::clone(&context),
            },
        );
        context
    }

    #[must_use]
    pub fn get(&self, key: &DocumentKey) -> Option<Arc<DocumentContext>> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.get(key).map(|cached| Arc::clone(&cached.context))
    }

    /// Drop one document; returns whether it was cached.
    pub fn invalidate(&self, key: &DocumentKey) -> bool {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.pop(key).is_some()
    }

    pub fn clear(&self) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn fingerprint(text: &str) -> [u8; 32] {
    Sha256::digest(text.as_bytes()).into()
}
