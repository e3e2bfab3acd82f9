use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of one source document: the owning item plus the attachment holding its text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentKey {
    pub owner_id: u64,
    pub content_item_id: u64,
}

impl DocumentKey {
    #[must_use]
    pub const fn new(owner_id: u64, content_item_id: u64) -> Self {
        Self {
            owner_id,
            content_item_id,
        }
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.owner_id, self.content_item_id)
    }
}

/// Reference to a paper as the caller knows it.
///
/// Two references describe the same document iff their [`DocumentKey`]s match; display
/// metadata does not participate in identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperRef {
    pub owner_id: u64,
    pub content_item_id: u64,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citation_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_creator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
}

impl PaperRef {
    pub fn new(owner_id: u64, content_item_id: u64, title: impl Into<String>) -> Self {
        Self {
            owner_id,
            content_item_id,
            title: title.into(),
            citation_key: None,
            first_creator: None,
            year: None,
        }
    }

    #[must_use]
    pub fn citation_key(mut self, key: impl Into<String>) -> Self {
        self.citation_key = Some(key.into());
        self
    }

    #[must_use]
    pub fn first_creator(mut self, creator: impl Into<String>) -> Self {
        self.first_creator = Some(creator.into());
        self
    }

    #[must_use]
    pub fn year(mut self, year: impl Into<String>) -> Self {
        self.year = Some(year.into());
        self
    }

    #[must_use]
    pub const fn key(&self) -> DocumentKey {
        DocumentKey::new(self.owner_id, self.content_item_id)
    }

    /// Title with a stable placeholder for untitled items.
    #[must_use]
    pub fn display_title(&self) -> &str {
        let title = self.title.trim();
        if title.is_empty() {
            "Untitled"
        } else {
            title
        }
    }
}

impl PartialEq for PaperRef {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for PaperRef {}
