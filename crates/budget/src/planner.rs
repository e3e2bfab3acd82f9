//! Context budget planning.
//!
//! ```text
//! ceiling            = override or model table
//! soft limit         = min(ceiling − output reserve − reasoning reserve, input soft limit)
//! base input         = system prompt + history + question + images + envelopes
//! context budget     = max(MIN_CONTEXT_BUDGET_TOKENS, soft limit − base input)
//! ```
//!
//! The soft limit never exceeds what [`crate::apply_model_input_token_cap`] accepts for the
//! same ceiling, so a planned conversation passes the cap untouched unless estimates drift.

use crate::cap::input_soft_limit;
use crate::conversation::DOCUMENT_CONTEXT_PREFIX;
use crate::models::{resolve_input_limit, ModelLimitTable};
use paper_protocol::{
    estimate_conversation_tokens, estimate_text_tokens, ChatMessage, IMAGE_TOKEN_ESTIMATE,
    MESSAGE_OVERHEAD_TOKENS,
};
use serde::{Deserialize, Serialize};

/// Output reserve when the caller does not request a maximum.
pub const DEFAULT_OUTPUT_RESERVE_TOKENS: usize = 4_096;
/// Smallest output reserve ever planned.
pub const MIN_OUTPUT_RESERVE_TOKENS: usize = 1_024;
/// Output reserve floor for high-effort reasoning.
pub const HIGH_REASONING_OUTPUT_RESERVE_TOKENS: usize = 8_192;
/// Soft limit floor, applied before subtracting base input.
pub const MIN_SOFT_LIMIT_TOKENS: usize = 2_048;
/// Smallest context budget ever returned.
pub const MIN_CONTEXT_BUDGET_TOKENS: usize = 1_024;

/// How a provider spends reasoning tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReasoningProvider {
    /// `reasoning_effort`-style APIs
    #[default]
    OpenaiCompatible,
    /// Explicit thinking budget
    Anthropic,
    /// Explicit thinking budget
    Gemini,
    /// Models that always reason regardless of the requested level
    AlwaysOn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReasoningLevel {
    #[default]
    Off,
    Minimal,
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReasoningConfig {
    pub provider: ReasoningProvider,
    pub level: ReasoningLevel,
}

impl ReasoningConfig {
    #[must_use]
    pub const fn new(provider: ReasoningProvider, level: ReasoningLevel) -> Self {
        Self { provider, level }
    }

    /// Level after accounting for providers that cannot switch reasoning off.
    #[must_use]
    pub fn effective_level(&self) -> ReasoningLevel {
        match self.provider {
            ReasoningProvider::AlwaysOn => self.level.max(ReasoningLevel::Low),
            _ => self.level,
        }
    }

    /// Tokens held back for hidden reasoning.
    #[must_use]
    pub fn reserve_tokens(&self) -> usize {
        let thinking_budget = matches!(
            self.provider,
            ReasoningProvider::Anthropic | ReasoningProvider::Gemini
        );
        match (self.effective_level(), thinking_budget) {
            (ReasoningLevel::Off, _) => 0,
            (ReasoningLevel::Minimal, false) => 1_024,
            (ReasoningLevel::Low, false) => 4_096,
            (ReasoningLevel::Medium, false) => 8_192,
            (ReasoningLevel::High, false) => 16_384,
            (ReasoningLevel::Minimal, true) => 2_048,
            (ReasoningLevel::Low, true) => 8_192,
            (ReasoningLevel::Medium, true) => 16_384,
            (ReasoningLevel::High, true) => 32_768,
        }
    }
}

/// Room for the visible answer: the request plus 10%, with a larger floor for high effort.
#[must_use]
pub fn output_reserve_tokens(max_output_tokens: Option<usize>, reasoning: &ReasoningConfig) -> usize {
    let requested = max_output_tokens
        .filter(|t| *t > 0)
        .unwrap_or(DEFAULT_OUTPUT_RESERVE_TOKENS);
    let padded = requested.saturating_add(requested.div_ceil(10));
    let reserve = padded.max(MIN_OUTPUT_RESERVE_TOKENS);
    if reasoning.effective_level() >= ReasoningLevel::High {
        reserve.max(HIGH_REASONING_OUTPUT_RESERVE_TOKENS)
    } else {
        reserve
    }
}

/// Everything the planner needs to know about the upcoming request.
#[derive(Debug, Clone, Copy)]
pub struct BudgetRequest<'a> {
    pub model: &'a str,
    pub question: &'a str,
    pub system_prompt: &'a str,
    pub history: &'a [ChatMessage],
    pub image_count: usize,
    pub reasoning: ReasoningConfig,
    pub max_output_tokens: Option<usize>,
    pub input_token_cap: Option<usize>,
}

impl<'a> BudgetRequest<'a> {
    #[must_use]
    pub fn new(model: &'a str, question: &'a str) -> Self {
        Self {
            model,
            question,
            system_prompt: "",
            history: &[],
            image_count: 0,
            reasoning: ReasoningConfig::default(),
            max_output_tokens: None,
            input_token_cap: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ContextBudget {
    pub model_limit_tokens: usize,
    pub output_reserve_tokens: usize,
    pub reasoning_reserve_tokens: usize,
    pub base_input_tokens: usize,
    pub soft_limit_tokens: usize,
    pub context_budget_tokens: usize,
    /// The budget was raised to its floor; inclusion quality is not guaranteed
    pub is_floored: bool,
}

/// Tokens the conversation costs before any document context is added.
#[must_use]
pub fn base_input_tokens(request: &BudgetRequest<'_>) -> usize {
    let system = if request.system_prompt.trim().is_empty() {
        0
    } else {
        MESSAGE_OVERHEAD_TOKENS + estimate_text_tokens(request.system_prompt)
    };
    let context_envelope = MESSAGE_OVERHEAD_TOKENS + estimate_text_tokens(DOCUMENT_CONTEXT_PREFIX);
    let user = MESSAGE_OVERHEAD_TOKENS
        + estimate_text_tokens(request.question)
        + request.image_count.saturating_mul(IMAGE_TOKEN_ESTIMATE);

    system + context_envelope + user + estimate_conversation_tokens(request.history)
}

#[must_use]
pub fn estimate_available_context_budget(
    request: &BudgetRequest<'_>,
    limits: &ModelLimitTable,
) -> ContextBudget {
    let model_limit_tokens = resolve_input_limit(limits, request.model, request.input_token_cap);
    let output_reserve_tokens = output_reserve_tokens(request.max_output_tokens, &request.reasoning);
    let reasoning_reserve_tokens = request.reasoning.reserve_tokens();

    let soft_limit_tokens = model_limit_tokens
        .saturating_sub(output_reserve_tokens)
        .saturating_sub(reasoning_reserve_tokens)
        .min(input_soft_limit(model_limit_tokens))
        .max(MIN_SOFT_LIMIT_TOKENS);

    let base_input_tokens = base_input_tokens(request);
    let available = soft_limit_tokens.saturating_sub(base_input_tokens);
    let is_floored = available < MIN_CONTEXT_BUDGET_TOKENS;
    let context_budget_tokens = available.max(MIN_CONTEXT_BUDGET_TOKENS);

    if is_floored {
        log::warn!(
            "Context budget for '{}' floored at {} tokens (soft limit {}, base input {})",
            request.model,
            context_budget_tokens,
            soft_limit_tokens,
            base_input_tokens
        );
    } else {
        log::debug!(
            "Context budget for '{}': {} tokens (limit {}, output {}, reasoning {}, base {})",
            request.model,
            context_budget_tokens,
            model_limit_tokens,
            output_reserve_tokens,
            reasoning_reserve_tokens,
            base_input_tokens
        );
    }

    ContextBudget {
        model_limit_tokens,
        output_reserve_tokens,
        reasoning_reserve_tokens,
        base_input_tokens,
        soft_limit_tokens,
        context_budget_tokens,
        is_floored,
    }
}
