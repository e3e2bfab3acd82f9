use paper_budget::{
    is_document_context_message, CapOutcome, ContextBudget, DOCUMENT_CONTEXT_PREFIX,
};
use paper_search::AssembledContext;
use serde::Serialize;

/// Everything decided for one turn, as printed by `--json`.
#[derive(Debug, Serialize)]
pub(crate) struct Report {
    pub model: String,
    pub embed_mode: &'static str,
    pub budget: ContextBudget,
    pub context: AssembledContext,
    /// Final conversation, after the input cap
    pub cap: CapOutcome,
}

impl Report {
    /// The context as it will actually be sent, after capping.
    pub(crate) fn document_context(&self) -> &str {
        self.cap
            .messages
            .iter()
            .find(|message| is_document_context_message(message))
            .and_then(|message| message.text())
            .map_or("", strip_context_prefix)
    }
}

fn strip_context_prefix(text: &str) -> &str {
    text.strip_prefix(DOCUMENT_CONTEXT_PREFIX)
        .map_or(text, |rest| rest.strip_prefix('\n').unwrap_or(rest))
}
