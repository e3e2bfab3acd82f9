use std::collections::BTreeMap;

/// Input ceiling for models no pattern matches.
pub const DEFAULT_MODEL_INPUT_LIMIT: usize = 32_768;

/// Built-in model-name patterns (case-insensitive substrings) and their input ceilings.
const BUILTIN_LIMITS: &[(&str, usize)] = &[
    ("gpt-3.5-turbo", 16_385),
    ("gpt-4", 8_192),
    ("gpt-4-32k", 32_768),
    ("gpt-4-turbo", 128_000),
    ("gpt-4o", 128_000),
    ("gpt-4.1", 1_047_576),
    ("gpt-5", 400_000),
    ("o1", 200_000),
    ("o1-mini", 128_000),
    ("o3", 200_000),
    ("o4-mini", 200_000),
    ("claude", 200_000),
    ("gemini", 1_048_576),
    ("gemini-1.5-pro", 2_097_152),
    ("deepseek", 128_000),
    ("qwen", 131_072),
    ("llama-3", 131_072),
    ("mistral", 32_768),
    ("mistral-large", 131_072),
    ("grok", 131_072),
    ("kimi", 131_072),
];

/// Pattern → input-token ceiling lookup.
///
/// The longest pattern contained in the model name wins, so `gpt-4o-mini` resolves through
/// `gpt-4o` rather than `gpt-4`. Adding a model means adding a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelLimitTable {
    patterns: BTreeMap<String, usize>,
    default_limit: usize,
}

impl Default for ModelLimitTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ModelLimitTable {
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            patterns: BUILTIN_LIMITS
                .iter()
                .map(|(pattern, limit)| ((*pattern).to_string(), *limit))
                .collect(),
            default_limit: DEFAULT_MODEL_INPUT_LIMIT,
        }
    }

    #[must_use]
    pub fn empty(default_limit: usize) -> Self {
        Self {
            patterns: BTreeMap::new(),
            default_limit: default_limit.max(1),
        }
    }

    /// Add or replace a pattern. Blank patterns and zero limits are ignored.
    pub fn insert(&mut self, pattern: &str, limit: usize) {
        let pattern = pattern.trim().to_ascii_lowercase();
        if pattern.is_empty() || limit == 0 {
            return;
        }
        self.patterns.insert(pattern, limit);
    }

    #[must_use]
    pub fn with_overrides<'a, I>(mut self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a usize)>,
    {
        for (pattern, limit) in overrides {
            self.insert(pattern, *limit);
        }
        self
    }

    #[must_use]
    pub fn with_default_limit(mut self, limit: usize) -> Self {
        self.default_limit = limit.max(1);
        self
    }

    #[must_use]
    pub const fn default_limit(&self) -> usize {
        self.default_limit
    }

    /// Ceiling of the most specific matching pattern, if any.
    #[must_use]
    pub fn lookup(&self, model: &str) -> Option<usize> {
        let model = model.trim().to_ascii_lowercase();
        self.patterns
            .iter()
            .filter(|(pattern, _)| model.contains(pattern.as_str()))
            .max_by_key(|(pattern, _)| pattern.len())
            .map(|(_, limit)| *limit)
    }

    #[must_use]
    pub fn resolve(&self, model: &str) -> usize {
        self.lookup(model).unwrap_or(self.default_limit)
    }
}

/// The explicit override is authoritative when positive; otherwise the table decides.
#[must_use]
pub fn resolve_input_limit(
    limits: &ModelLimitTable,
    model: &str,
    input_token_cap: Option<usize>,
) -> usize {
    input_token_cap
        .filter(|cap| *cap > 0)
        .unwrap_or_else(|| limits.resolve(model))
}
