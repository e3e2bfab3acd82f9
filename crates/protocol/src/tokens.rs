//! Provider-agnostic token estimation.
//!
//! Counts are deliberately conservative: four characters per token, a fixed per-message
//! envelope and a flat cost per image regardless of resolution. Budget code relies on these
//! overestimating real usage.

use crate::message::{ChatMessage, ContentPart, MessageContent};

/// Characters per estimated token.
pub const CHARS_PER_TOKEN: usize = 4;

/// Role/envelope overhead charged to every message.
pub const MESSAGE_OVERHEAD_TOKENS: usize = 4;

/// Flat estimate for one image part.
pub const IMAGE_TOKEN_ESTIMATE: usize = 1_024;

/// `ceil(chars / 4)`; empty text costs nothing.
#[must_use]
pub fn estimate_text_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(CHARS_PER_TOKEN)
}

#[must_use]
pub fn estimate_content_tokens(content: &MessageContent) -> usize {
    match content {
        MessageContent::Text(text) => estimate_text_tokens(text),
        MessageContent::Parts(parts) => parts
            .iter()
            .map(|part| match part {
                ContentPart::Text { text } => estimate_text_tokens(text),
                ContentPart::ImageUrl { .. } => IMAGE_TOKEN_ESTIMATE,
            })
            .sum(),
    }
}

#[must_use]
pub fn estimate_message_tokens(message: &ChatMessage) -> usize {
    MESSAGE_OVERHEAD_TOKENS + estimate_content_tokens(&message.content)
}

#[must_use]
pub fn estimate_conversation_tokens(messages: &[ChatMessage]) -> usize {
    messages.iter().map(estimate_message_tokens).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_tokens_round_up() {
        assert_eq!(estimate_text_tokens(""), 0);
        assert_eq!(estimate_text_tokens("abc"), 1);
        assert_eq!(estimate_text_tokens("abcd"), 1);
        assert_eq!(estimate_text_tokens("abcde"), 2);
    }

    #[test]
    fn counts_characters_not_bytes() {
        // 4 characters, 12 bytes
        assert_eq!(estimate_text_tokens("日本語字"), 1);
    }

    #[test]
    fn images_cost_a_flat_estimate() {
        let message = ChatMessage::user(MessageContent::Parts(vec![
            ContentPart::text("abcdefgh"),
            ContentPart::image("data:image/png;base64,AAAA"),
            ContentPart::image("data:image/png;base64,BBBB"),
        ]));
        assert_eq!(
            estimate_message_tokens(&message),
            MESSAGE_OVERHEAD_TOKENS + 2 + 2 * IMAGE_TOKEN_ESTIMATE
        );
    }

    #[test]
    fn conversation_sums_overhead_per_message() {
        let messages = vec![
            ChatMessage::system(""),
            ChatMessage::user("abcd"),
            ChatMessage::assistant("abcdabcd"),
        ];
        assert_eq!(
            estimate_conversation_tokens(&messages),
            3 * MESSAGE_OVERHEAD_TOKENS + 1 + 2
        );
    }
}
