use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl ChatRole {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

/// One part of a multi-part message, in the OpenAI-compatible wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn image(url: impl Into<String>) -> Self {
        Self::ImageUrl {
            image_url: ImageUrl { url: url.into() },
        }
    }

    #[must_use]
    pub const fn is_image(&self) -> bool {
        matches!(self, Self::ImageUrl { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl MessageContent {
    /// The text a reader would see first: the whole string, or the first text part.
    #[must_use]
    pub fn primary_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Parts(parts) => parts.iter().find_map(|part| match part {
                ContentPart::Text { text } => Some(text.as_str()),
                ContentPart::ImageUrl { .. } => None,
            }),
        }
    }

    /// Replaces the primary text; returns false when there is no text part to replace.
    pub fn set_primary_text(&mut self, value: String) -> bool {
        match self {
            Self::Text(text) => {
                *text = value;
                true
            }
            Self::Parts(parts) => {
                for part in parts.iter_mut() {
                    if let ContentPart::Text { text } = part {
                        *text = value;
                        return true;
                    }
                }
                false
            }
        }
    }

    #[must_use]
    pub fn image_count(&self) -> usize {
        match self {
            Self::Text(_) => 0,
            Self::Parts(parts) => parts.iter().filter(|part| part.is_image()).count(),
        }
    }

    /// Drops the last image part. Returns true if one was removed.
    pub fn pop_last_image(&mut self) -> bool {
        let Self::Parts(parts) = self else {
            return false;
        };
        let Some(pos) = parts.iter().rposition(ContentPart::is_image) else {
            return false;
        };
        parts.remove(pos);
        true
    }
}

impl From<String> for MessageContent {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for MessageContent {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: MessageContent,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<MessageContent>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<MessageContent>) -> Self {
        Self::new(ChatRole::System, content)
    }

    pub fn user(content: impl Into<MessageContent>) -> Self {
        Self::new(ChatRole::User, content)
    }

    pub fn assistant(content: impl Into<MessageContent>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }

    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.content.primary_text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parts_use_openai_wire_shape() {
        let message = ChatMessage::user(MessageContent::Parts(vec![
            ContentPart::text("describe"),
            ContentPart::image("data:image/png;base64,AAAA"),
        ]));
        let json = serde_json::to_value(&message).unwrap();

        assert_eq!(json["role"], "user");
        assert_eq!(json["content"][0]["type"], "text");
        assert_eq!(json["content"][1]["type"], "image_url");
        assert_eq!(
            json["content"][1]["image_url"]["url"],
            "data:image/png;base64,AAAA"
        );
    }

    #[test]
    fn plain_string_content_round_trips_untagged() {
        let parsed: ChatMessage =
            serde_json::from_str(r#"{"role":"assistant","content":"hello"}"#).unwrap();
        assert_eq!(parsed, ChatMessage::assistant("hello"));
    }

    #[test]
    fn pop_last_image_removes_trailing_image_first() {
        let mut content = MessageContent::Parts(vec![
            ContentPart::image("a"),
            ContentPart::text("q"),
            ContentPart::image("b"),
        ]);
        assert!(content.pop_last_image());
        assert_eq!(
            content,
            MessageContent::Parts(vec![ContentPart::image("a"), ContentPart::text("q")])
        );
        assert_eq!(content.image_count(), 1);
    }

    #[test]
    fn set_primary_text_without_text_part_fails() {
        let mut content = MessageContent::Parts(vec![ContentPart::image("a")]);
        assert!(!content.set_primary_text("x".to_string()));
        assert_eq!(content.primary_text(), None);
    }
}
