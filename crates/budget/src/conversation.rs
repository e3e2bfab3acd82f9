use paper_protocol::{ChatMessage, ContentPart, MessageContent};

/// First line of the system message carrying assembled paper context.
pub const DOCUMENT_CONTEXT_PREFIX: &str = "Document Context:";

#[must_use]
pub fn document_context_message(context_text: &str) -> ChatMessage {
    ChatMessage::system(format!("{DOCUMENT_CONTEXT_PREFIX}\n{}", context_text.trim()))
}

#[must_use]
pub fn is_document_context_message(message: &ChatMessage) -> bool {
    message
        .text()
        .is_some_and(|text| text.starts_with(DOCUMENT_CONTEXT_PREFIX))
}

/// Pieces of one chat turn.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConversationParts<'a> {
    pub system_prompt: &'a str,
    pub document_context: &'a str,
    pub history: &'a [ChatMessage],
    pub question: &'a str,
    pub image_urls: &'a [String],
}

/// `[system prompt, document context, history…, user]`, skipping blank system parts.
#[must_use]
pub fn build_conversation(parts: &ConversationParts<'_>) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(parts.history.len() + 3);
    if !parts.system_prompt.trim().is_empty() {
        messages.push(ChatMessage::system(parts.system_prompt.trim()));
    }
    if !parts.document_context.trim().is_empty() {
        messages.push(document_context_message(parts.document_context));
    }
    messages.extend(parts.history.iter().cloned());

    let content = if parts.image_urls.is_empty() {
        MessageContent::Text(parts.question.to_string())
    } else {
        let mut content_parts = Vec::with_capacity(parts.image_urls.len() + 1);
        content_parts.push(ContentPart::text(parts.question));
        content_parts.extend(parts.image_urls.iter().map(ContentPart::image));
        MessageContent::Parts(content_parts)
    };
    messages.push(ChatMessage::user(content));
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use paper_protocol::ChatRole;
    use pretty_assertions::assert_eq;

    #[test]
    fn builds_in_canonical_order() {
        let history = vec![ChatMessage::user("earlier"), ChatMessage::assistant("reply")];
        let images = vec!["data:image/png;base64,AAAA".to_string()];
        let messages = build_conversation(&ConversationParts {
            system_prompt: "You are a research assistant.",
            document_context: "Full Paper Contexts:\n\nPaper 1: X",
            history: &history,
            question: "What is new?",
            image_urls: &images,
        });

        let roles: Vec<ChatRole> = messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                ChatRole::System,
                ChatRole::System,
                ChatRole::User,
                ChatRole::Assistant,
                ChatRole::User
            ]
        );
        assert!(is_document_context_message(&messages[1]));
        assert!(!is_document_context_message(&messages[0]));
        assert_eq!(messages[4].content.image_count(), 1);
        assert_eq!(messages[4].content.primary_text(), Some("What is new?"));
    }

    #[test]
    fn blank_parts_are_skipped() {
        let messages = build_conversation(&ConversationParts {
            question: "hi",
            ..ConversationParts::default()
        });
        assert_eq!(messages, vec![ChatMessage::user("hi")]);
    }

    #[test]
    fn context_message_has_prefix_line() {
        let message = document_context_message("  body  ");
        assert_eq!(message.text(), Some("Document Context:\nbody"));
    }
}
