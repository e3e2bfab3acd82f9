use serde::{Deserialize, Serialize};

/// Configuration for paper text chunking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkerConfig {
    /// Target chunk length in characters; paragraphs are merged up to this size
    pub target_chunk_chars: usize,

    /// Characters shared by consecutive windows when a paragraph is hard-split
    pub overlap_chars: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            target_chunk_chars: 1_800,
            overlap_chars: 200,
        }
    }
}

impl ChunkerConfig {
    /// Smaller chunks: more precise evidence at the cost of more embedding calls
    pub fn fine_grained() -> Self {
        Self {
            target_chunk_chars: 900,
            overlap_chars: 120,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.target_chunk_chars == 0 {
            return Err("target_chunk_chars must be > 0".to_string());
        }

        if self.overlap_chars >= self.target_chunk_chars {
            return Err(format!(
                "overlap_chars ({}) must be smaller than target_chunk_chars ({})",
                self.overlap_chars, self.target_chunk_chars
            ));
        }

        Ok(())
    }
}
