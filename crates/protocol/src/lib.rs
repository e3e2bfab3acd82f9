//! # Paper Protocol
//!
//! Types shared by every layer of paper context assembly: document identity, chat messages
//! with multi-part content, and the conservative token estimator all budget arithmetic is
//! built on.

mod message;
mod paper;
pub mod tokens;

pub use message::{ChatMessage, ChatRole, ContentPart, ImageUrl, MessageContent};
pub use paper::{DocumentKey, PaperRef};
pub use tokens::{
    estimate_content_tokens, estimate_conversation_tokens, estimate_message_tokens,
    estimate_text_tokens, CHARS_PER_TOKEN, IMAGE_TOKEN_ESTIMATE, MESSAGE_OVERHEAD_TOKENS,
};
