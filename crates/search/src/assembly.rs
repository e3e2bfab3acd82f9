use crate::document::PaperSource;
use crate::packer::{
    assemble_retrieved_multi_paper_context, ContextRequest, PackerConfig, PaperRetrieval,
};
use crate::render::render_full_paper_contexts;
use paper_protocol::{estimate_text_tokens, DocumentKey, PaperRef};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Whether papers are sent whole or as retrieved evidence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssemblyMode {
    Full,
    Retrieval,
}

impl AssemblyMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Retrieval => "retrieval",
        }
    }
}

/// Full text wins when it is non-empty and fits the budget; otherwise retrieve.
#[must_use]
pub fn select_context_assembly_mode(
    full_context_text: &str,
    full_context_tokens: usize,
    context_budget_tokens: usize,
) -> AssemblyMode {
    if full_context_text.trim().is_empty() || full_context_tokens > context_budget_tokens {
        AssemblyMode::Retrieval
    } else {
        AssemblyMode::Full
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssembledContext {
    pub mode: AssemblyMode,
    pub context_text: String,
    pub context_tokens: usize,
    pub full_context_tokens: usize,
    pub context_budget_tokens: usize,
    pub selected_chunk_count: usize,
    /// Per-paper retrieval outcome; empty in full mode
    pub papers: Vec<PaperRetrieval>,
    pub semantic_degraded: bool,
    pub metadata_only: bool,
}

/// Build the document context for one question.
pub async fn assemble_paper_context(
    request: &ContextRequest<'_>,
    config: &PackerConfig,
) -> AssembledContext {
    let mut seen: HashSet<DocumentKey> = HashSet::new();
    let sources: Vec<&PaperSource> = request
        .papers
        .iter()
        .filter(|s| seen.insert(s.paper.key()))
        .collect();

    let full_context_text = if sources.iter().any(|s| !s.text().trim().is_empty()) {
        let pairs: Vec<(&PaperRef, &str)> = sources.iter().map(|s| (&s.paper, s.text())).collect();
        render_full_paper_contexts(&pairs)
    } else {
        String::new()
    };
    let full_context_tokens = estimate_text_tokens(&full_context_text);

    let mode = select_context_assembly_mode(
        &full_context_text,
        full_context_tokens,
        request.context_budget_tokens,
    );
    log::info!(
        "Context mode {}: full text ~{} tokens, budget {} tokens, {} papers",
        mode.as_str(),
        full_context_tokens,
        request.context_budget_tokens,
        sources.len()
    );

    match mode {
        AssemblyMode::Full => AssembledContext {
            mode,
            context_tokens: full_context_tokens,
            context_text: full_context_text,
            full_context_tokens,
            context_budget_tokens: request.context_budget_tokens,
            selected_chunk_count: 0,
            papers: Vec::new(),
            semantic_degraded: false,
            metadata_only: false,
        },
        AssemblyMode::Retrieval => {
            let retrieved = assemble_retrieved_multi_paper_context(request, config).await;
            AssembledContext {
                mode,
                context_tokens: estimate_text_tokens(&retrieved.context_text),
                context_text: retrieved.context_text,
                full_context_tokens,
                context_budget_tokens: request.context_budget_tokens,
                selected_chunk_count: retrieved.selected_chunk_count,
                papers: retrieved.papers,
                semantic_degraded: retrieved.semantic_degraded,
                metadata_only: retrieved.metadata_only,
            }
        }
    }
}
