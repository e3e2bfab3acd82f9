//! # Paper Budget
//!
//! Token accounting around a paper-grounded chat turn:
//!
//! - [`ModelLimitTable`]: model name → input ceiling, most specific pattern wins
//! - [`estimate_available_context_budget`]: how many tokens the document context may use
//!   after output, reasoning, history and images are accounted for
//! - [`build_conversation`]: the canonical message layout
//! - [`apply_model_input_token_cap`]: best-effort trimming of the final conversation
//!
//! All counts come from the conservative estimator in `paper-protocol`.

mod cap;
mod conversation;
mod models;
mod planner;

pub use cap::{
    apply_model_input_token_cap, input_soft_limit, CapOutcome, CONTEXT_TRUNCATION_NOTICE,
    IMAGES_REMOVED_NOTICE, MIN_CONTEXT_CHARS, MIN_USER_CHARS, USER_TRUNCATION_NOTICE,
};
pub use conversation::{
    build_conversation, document_context_message, is_document_context_message,
    ConversationParts, DOCUMENT_CONTEXT_PREFIX,
};
pub use models::{resolve_input_limit, ModelLimitTable, DEFAULT_MODEL_INPUT_LIMIT};
pub use planner::{
    base_input_tokens, estimate_available_context_budget, output_reserve_tokens, BudgetRequest,
    ContextBudget, ReasoningConfig, ReasoningLevel, ReasoningProvider,
    DEFAULT_OUTPUT_RESERVE_TOKENS, MIN_CONTEXT_BUDGET_TOKENS, MIN_SOFT_LIMIT_TOKENS,
};
