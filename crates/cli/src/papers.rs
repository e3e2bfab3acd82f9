use anyhow::{bail, Context as AnyhowContext, Result};
use paper_protocol::{ChatMessage, DocumentKey, PaperRef};
use paper_search::{DocumentContextCache, PaperSource};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Owner id given to every paper loaded from the command line.
const LOCAL_OWNER_ID: u64 = 1;

/// `PATH[::TITLE[::AUTHOR[::YEAR[::CITATION_KEY]]]]`; empty segments are skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PaperSpec {
    pub path: PathBuf,
    pub title: Option<String>,
    pub first_creator: Option<String>,
    pub year: Option<String>,
    pub citation_key: Option<String>,
}

impl FromStr for PaperSpec {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let mut segments = raw.split("::").map(str::trim);
        let path = segments.next().unwrap_or_default();
        if path.is_empty() {
            return Err("paper path must not be empty".to_string());
        }
        let mut next = || {
            segments
                .next()
                .filter(|segment| !segment.is_empty())
                .map(str::to_string)
        };
        let spec = Self {
            path: PathBuf::from(path),
            title: next(),
            first_creator: next(),
            year: next(),
            citation_key: next(),
        };
        if segments.next().is_some() {
            return Err(format!("too many '::' segments in '{raw}'"));
        }
        Ok(spec)
    }
}

impl PaperSpec {
    fn paper_ref(&self, content_item_id: u64) -> PaperRef {
        let title = self.title.clone().unwrap_or_else(|| file_title(&self.path));
        let mut paper = PaperRef::new(LOCAL_OWNER_ID, content_item_id, title);
        if let Some(author) = &self.first_creator {
            paper = paper.first_creator(author);
        }
        if let Some(year) = &self.year {
            paper = paper.year(year);
        }
        if let Some(key) = &self.citation_key {
            paper = paper.citation_key(key);
        }
        paper
    }
}

fn file_title(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Key of the 1-based `position`-th paper.
pub(crate) fn paper_key(position: usize, paper_count: usize) -> Result<DocumentKey> {
    if position == 0 || position > paper_count {
        bail!("--active {position} is out of range (1..={paper_count})");
    }
    Ok(DocumentKey::new(LOCAL_OWNER_ID, position as u64))
}

/// Read each paper's extracted text; blank files become metadata-only papers.
pub(crate) fn load_papers(
    specs: &[PaperSpec],
    cache: &DocumentContextCache,
) -> Result<Vec<PaperSource>> {
    let mut papers = Vec::with_capacity(specs.len());
    for (idx, spec) in specs.iter().enumerate() {
        let paper = spec.paper_ref(idx as u64 + 1);
        let text = fs::read_to_string(&spec.path)
            .with_context(|| format!("Failed to read paper {}", spec.path.display()))?;

        let context = if text.trim().is_empty() {
            log::warn!(
                "No extractable text in {}; using metadata only",
                spec.path.display()
            );
            None
        } else {
            Some(cache.get_or_build(&paper, &text))
        };
        if let Some(context) = &context {
            log::debug!(
                "Loaded '{}' ({} chars, {} chunks)",
                paper.display_title(),
                context.total_chars(),
                context.chunks().len()
            );
        }
        papers.push(PaperSource::new(paper, context));
    }
    Ok(papers)
}

/// Prior turns as a JSON array of `{ "role", "content" }` messages.
pub(crate) fn load_history(path: Option<&Path>) -> Result<Vec<ChatMessage>> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read history {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid history JSON {}", path.display()))
}
