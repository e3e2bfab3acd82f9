use crate::config::ChunkerConfig;
use crate::error::{ChunkerError, Result};
use once_cell::sync::Lazy;
use regex::Regex;

static PARAGRAPH_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n[ \t]*\n").expect("paragraph break regex"));

/// Paragraph-aware chunker for extracted paper text
#[derive(Debug, Clone)]
pub struct Chunker {
    config: ChunkerConfig,
}

impl Chunker {
    /// Create a new chunker with configuration
    pub fn new(config: ChunkerConfig) -> Result<Self> {
        config.validate().map_err(ChunkerError::invalid_config)?;
        Ok(Self { config })
    }

    #[must_use]
    pub const fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Chunk extracted text. Empty or whitespace-only input yields no chunks.
    #[must_use]
    pub fn chunk_str(&self, text: &str) -> Vec<String> {
        chunk_paragraphs(
            text,
            self.config.target_chunk_chars,
            self.config.overlap_chars,
        )
    }
}

/// Split `text` into chunks of at most `target_length` characters using the default overlap.
///
/// The overlap is clamped below `target_length` so tiny targets still make progress.
#[must_use]
pub fn split_into_chunks(text: &str, target_length: usize) -> Vec<String> {
    let target_length = target_length.max(1);
    let overlap = ChunkerConfig::default()
        .overlap_chars
        .min(target_length / 4);
    chunk_paragraphs(text, target_length, overlap)
}

fn chunk_paragraphs(text: &str, target: usize, overlap: usize) -> Vec<String> {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for paragraph in PARAGRAPH_BREAK
        .split(&normalized)
        .map(str::trim)
        .filter(|p| !p.is_empty())
    {
        let paragraph_len = paragraph.chars().count();

        if paragraph_len > target {
            flush(&mut chunks, &mut current, &mut current_len);
            chunks.extend(hard_split(paragraph, target, overlap));
            continue;
        }

        // "\n\n" joins paragraphs inside one chunk
        let joined_len = if current.is_empty() {
            paragraph_len
        } else {
            current_len + 2 + paragraph_len
        };

        if joined_len > target {
            flush(&mut chunks, &mut current, &mut current_len);
            current.push_str(paragraph);
            current_len = paragraph_len;
        } else {
            if !current.is_empty() {
                current.push_str("\n\n");
            }
            current.push_str(paragraph);
            current_len = joined_len;
        }
    }
    flush(&mut chunks, &mut current, &mut current_len);

    log::debug!(
        "Chunked {} chars into {} chunks (target={target}, overlap={overlap})",
        text.len(),
        chunks.len()
    );
    chunks
}

fn flush(chunks: &mut Vec<String>, current: &mut String, current_len: &mut usize) {
    if !current.is_empty() {
        chunks.push(std::mem::take(current));
    }
    *current_len = 0;
}

fn hard_split(paragraph: &str, target: usize, overlap: usize) -> Vec<String> {
    let chars: Vec<char> = paragraph.chars().collect();
    let step = target.saturating_sub(overlap).max(1);
    let mut windows = Vec::new();
    let mut start = 0usize;

    while start < chars.len() {
        let end = (start + target).min(chars.len());
        let window: String = chars[start..end].iter().collect();
        let window = window.trim();
        if !window.is_empty() {
            windows.push(window.to_string());
        }
        if end == chars.len() {
            break;
        }
        start += step;
    }

    windows
}
