use clap::ValueEnum;
use paper_budget::{ReasoningLevel, ReasoningProvider};

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum EmbedMode {
    /// Lexical-only retrieval
    None,
    /// Deterministic offline embeddings
    Stub,
    /// OpenAI-compatible embeddings API from `[embedding]`
    Http,
}

impl EmbedMode {
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            EmbedMode::None => "none",
            EmbedMode::Stub => "stub",
            EmbedMode::Http => "http",
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub(crate) enum ReasoningProviderFlag {
    OpenaiCompatible,
    Anthropic,
    Gemini,
    AlwaysOn,
}

impl ReasoningProviderFlag {
    pub(crate) const fn as_domain(self) -> ReasoningProvider {
        match self {
            ReasoningProviderFlag::OpenaiCompatible => ReasoningProvider::OpenaiCompatible,
            ReasoningProviderFlag::Anthropic => ReasoningProvider::Anthropic,
            ReasoningProviderFlag::Gemini => ReasoningProvider::Gemini,
            ReasoningProviderFlag::AlwaysOn => ReasoningProvider::AlwaysOn,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub(crate) enum ReasoningLevelFlag {
    Off,
    Minimal,
    Low,
    Medium,
    High,
}

impl ReasoningLevelFlag {
    pub(crate) const fn as_domain(self) -> ReasoningLevel {
        match self {
            ReasoningLevelFlag::Off => ReasoningLevel::Off,
            ReasoningLevelFlag::Minimal => ReasoningLevel::Minimal,
            ReasoningLevelFlag::Low => ReasoningLevel::Low,
            ReasoningLevelFlag::Medium => ReasoningLevel::Medium,
            ReasoningLevelFlag::High => ReasoningLevel::High,
        }
    }
}
