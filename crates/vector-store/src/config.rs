use serde::{Deserialize, Serialize};

pub const DEFAULT_EMBEDDING_BATCH_SIZE: usize = 16;

/// Caller-supplied embedding API settings.
///
/// Absent or blank credentials disable the semantic path; retrieval then runs lexical-only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub api_base: String,
    pub api_key: String,
    pub model: String,
    pub batch_size: usize,
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            api_base: String::new(),
            api_key: String::new(),
            model: "text-embedding-3-small".to_string(),
            batch_size: DEFAULT_EMBEDDING_BATCH_SIZE,
            timeout_secs: 60,
        }
    }
}

impl EmbeddingConfig {
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.api_base.trim().is_empty() && !self.api_key.trim().is_empty()
    }

    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("{}/embeddings", self.api_base.trim().trim_end_matches('/'))
    }
}
