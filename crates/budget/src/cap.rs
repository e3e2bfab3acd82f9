//! Last-resort input trimming.
//!
//! Runs on the fully assembled conversation. Each step re-measures and stops as soon as the
//! estimate is at or under the soft limit:
//!
//! 1. drop history (everything except system messages and the last user message), oldest first
//! 2. shrink the `Document Context:` system message, keeping a trailing notice
//! 3. shrink the last user message's text, then drop its images one by one
//! 4. collapse to system messages + last user message and repeat step 3
//!
//! Every step only ever removes characters or parts, so the estimate never grows.

use crate::conversation::is_document_context_message;
use crate::models::{resolve_input_limit, ModelLimitTable};
use paper_protocol::{
    estimate_conversation_tokens, ChatMessage, ChatRole, MessageContent, CHARS_PER_TOKEN,
};
use serde::Serialize;

pub const CONTEXT_TRUNCATION_NOTICE: &str =
    "[Document context truncated to fit the model input limit.]";
pub const USER_TRUNCATION_NOTICE: &str = "[Message truncated to fit the model input limit.]";
pub const IMAGES_REMOVED_NOTICE: &str =
    "[Attached images were removed to fit the model input limit.]";

/// The document context body never shrinks below this many characters.
pub const MIN_CONTEXT_CHARS: usize = 2_000;
/// The last user message never shrinks below this many characters.
pub const MIN_USER_CHARS: usize = 1_000;

/// Share of the ceiling kept free for estimation drift, in percent.
const INPUT_HEADROOM_PERCENT: usize = 10;
const MAX_SHRINK_PASSES: usize = 32;

/// Highest estimate the cap accepts for a given ceiling.
#[must_use]
pub const fn input_soft_limit(limit_tokens: usize) -> usize {
    // floor(limit * pct / 100) without the overflowing product.
    let headroom = limit_tokens / 100 * INPUT_HEADROOM_PERCENT
        + limit_tokens % 100 * INPUT_HEADROOM_PERCENT / 100;
    limit_tokens - headroom
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapOutcome {
    pub messages: Vec<ChatMessage>,
    pub capped: bool,
    pub limit_tokens: usize,
    pub soft_limit_tokens: usize,
    pub estimated_before_tokens: usize,
    pub estimated_after_tokens: usize,
}

fn truncate_to_chars(input: &str, max_chars: usize) -> &str {
    match input.char_indices().nth(max_chars) {
        Some((idx, _)) => &input[..idx],
        None => input,
    }
}

fn strip_notice<'a>(text: &'a str, notice: &str) -> &'a str {
    text.strip_suffix(notice)
        .map_or(text, |rest| rest.trim_end())
}

/// Shrink `text` so the whole conversation sheds about `excess_tokens`, keeping `floor` chars.
///
/// Returns `None` when no shorter rendition exists.
fn shrink_text(text: &str, notice: &str, floor: usize, excess_tokens: usize) -> Option<String> {
    let current_chars = text.chars().count();
    let body = strip_notice(text, notice);
    let body_chars = body.chars().count();
    if body_chars <= floor {
        return None;
    }

    let suffix_chars = notice.chars().count() + 2;
    let target = current_chars
        .saturating_sub(excess_tokens.saturating_mul(CHARS_PER_TOKEN))
        .saturating_sub(suffix_chars)
        .max(floor)
        .min(body_chars);

    let shrunk = format!(
        "{}\n\n{notice}",
        truncate_to_chars(body, target).trim_end()
    );
    (shrunk.chars().count() < current_chars).then_some(shrunk)
}

struct Trimmer {
    messages: Vec<ChatMessage>,
    soft_limit: usize,
    total: usize,
}

impl Trimmer {
    fn remeasure(&mut self) -> bool {
        self.total = estimate_conversation_tokens(&self.messages);
        self.fits()
    }

    fn fits(&self) -> bool {
        self.total <= self.soft_limit
    }

    fn excess(&self) -> usize {
        self.total.saturating_sub(self.soft_limit)
    }

    fn last_user(&self) -> Option<usize> {
        self.messages.iter().rposition(|m| m.role == ChatRole::User)
    }

    fn drop_history(&mut self) -> bool {
        loop {
            let last_user = self.last_user();
            let oldest = self
                .messages
                .iter()
                .enumerate()
                .position(|(i, m)| m.role != ChatRole::System && Some(i) != last_user);
            let Some(index) = oldest else {
                return false;
            };
            self.messages.remove(index);
            if self.remeasure() {
                return true;
            }
        }
    }

    fn shrink_document_context(&mut self) -> bool {
        let Some(index) = self
            .messages
            .iter()
            .position(|m| m.role == ChatRole::System && is_document_context_message(m))
        else {
            return false;
        };
        self.shrink_message_text(index, CONTEXT_TRUNCATION_NOTICE, MIN_CONTEXT_CHARS)
    }

    fn shrink_message_text(&mut self, index: usize, notice: &str, floor: usize) -> bool {
        for _ in 0..MAX_SHRINK_PASSES {
            let Some(text) = self.messages[index].text() else {
                return false;
            };
            let Some(shrunk) = shrink_text(text, notice, floor, self.excess()) else {
                return false;
            };
            self.messages[index].content.set_primary_text(shrunk);
            if self.remeasure() {
                return true;
            }
        }
        false
    }

    fn shrink_last_user(&mut self) -> bool {
        let Some(index) = self.last_user() else {
            return false;
        };
        if self.shrink_message_text(index, USER_TRUNCATION_NOTICE, MIN_USER_CHARS) {
            return true;
        }

        while self.messages[index].content.pop_last_image() {
            let content = &mut self.messages[index].content;
            if matches!(content, MessageContent::Parts(parts) if parts.is_empty()) {
                *content = MessageContent::Text(IMAGES_REMOVED_NOTICE.to_string());
            }
            if self.remeasure() {
                return true;
            }
        }
        false
    }

    fn collapse(&mut self) -> bool {
        let last_user = self.last_user();
        let mut index = 0;
        self.messages.retain(|m| {
            let keep = m.role == ChatRole::System || Some(index) == last_user;
            index += 1;
            keep
        });
        self.remeasure()
    }
}

/// Trim `messages` until their estimate fits the model's input soft limit.
///
/// Messages already under the limit come back untouched with `capped == false`. When nothing
/// more can be removed the smallest achievable set is returned, even if still over.
#[must_use]
pub fn apply_model_input_token_cap(
    messages: Vec<ChatMessage>,
    model: &str,
    input_token_cap: Option<usize>,
    limits: &ModelLimitTable,
) -> CapOutcome {
    let limit_tokens = resolve_input_limit(limits, model, input_token_cap);
    let soft_limit_tokens = input_soft_limit(limit_tokens);
    let estimated_before_tokens = estimate_conversation_tokens(&messages);

    if estimated_before_tokens <= soft_limit_tokens {
        return CapOutcome {
            messages,
            capped: false,
            limit_tokens,
            soft_limit_tokens,
            estimated_before_tokens,
            estimated_after_tokens: estimated_before_tokens,
        };
    }

    let mut trimmer = Trimmer {
        messages,
        soft_limit: soft_limit_tokens,
        total: estimated_before_tokens,
    };
    let _fits = trimmer.drop_history()
        || trimmer.shrink_document_context()
        || trimmer.shrink_last_user()
        || trimmer.collapse()
        || trimmer.shrink_last_user();

    if trimmer.fits() {
        log::info!(
            "Capped input for '{}': {} → {} tokens (soft limit {})",
            model,
            estimated_before_tokens,
            trimmer.total,
            soft_limit_tokens
        );
    } else {
        log::warn!(
            "Input for '{}' still ~{} tokens after trimming (soft limit {})",
            model,
            trimmer.total,
            soft_limit_tokens
        );
    }

    CapOutcome {
        capped: true,
        limit_tokens,
        soft_limit_tokens,
        estimated_before_tokens,
        estimated_after_tokens: trimmer.total,
        messages: trimmer.messages,
    }
}
