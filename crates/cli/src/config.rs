use anyhow::{bail, Context as AnyhowContext, Result};
use paper_budget::ModelLimitTable;
use paper_search::PackerConfig;
use paper_text_chunker::ChunkerConfig;
use paper_vector_store::EmbeddingConfig;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Settings read from `--config FILE`.
///
/// ```toml
/// [chunker]
/// target_chunk_chars = 1800
///
/// [retrieval]
/// active_paper_min_chunks = 3
///
/// [embedding]
/// api_base = "https://api.openai.com/v1"
///
/// [models]
/// "my-local-model" = 65536
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct AppConfig {
    pub chunker: ChunkerConfig,
    pub retrieval: PackerConfig,
    pub embedding: EmbeddingConfig,
    /// Model-name pattern → input-token ceiling
    pub models: HashMap<String, usize>,
}

impl AppConfig {
    pub(crate) fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub(crate) fn parse(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        self.chunker
            .validate()
            .map_err(|msg| anyhow::anyhow!("[chunker] {msg}"))?;
        self.retrieval
            .validate()
            .map_err(|msg| anyhow::anyhow!("[retrieval] {msg}"))?;
        if self.embedding.batch_size == 0 {
            bail!("[embedding] batch_size must be > 0");
        }
        if let Some((pattern, _)) = self.models.iter().find(|(_, limit)| **limit == 0) {
            bail!("[models] limit for '{pattern}' must be > 0");
        }
        Ok(())
    }

    pub(crate) fn model_limits(&self) -> ModelLimitTable {
        ModelLimitTable::builtin().with_overrides(&self.models)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_file_is_all_defaults() {
        assert_eq!(AppConfig::parse("").unwrap(), AppConfig::default());
    }

    #[test]
    fn sections_override_defaults() {
        let config = AppConfig::parse(
            r#"
            [chunker]
            target_chunk_chars = 600
            overlap_chars = 50

            [retrieval]
            active_paper_min_chunks = 3
            mmr_lambda = 0.5

            [embedding]
            api_base = "http://localhost:8080/v1"
            model = "nomic-embed"

            [models]
            "my-local" = 65536
            "#,
        )
        .unwrap();

        assert_eq!(config.chunker.target_chunk_chars, 600);
        assert_eq!(config.retrieval.active_paper_min_chunks, 3);
        assert_eq!(config.retrieval.other_paper_min_chunks, 1);
        assert_eq!(config.embedding.model, "nomic-embed");
        assert_eq!(config.model_limits().resolve("my-local-model"), 65_536);
        assert_eq!(config.model_limits().resolve("deepseek-chat"), 128_000);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = AppConfig::parse("[retrieval]\nmmr_lambda = 1.5\n").unwrap_err();
        assert!(format!("{err:#}").contains("mmr_lambda"));

        let err = AppConfig::parse("[chunker]\ntarget_chunk_chars = 100\noverlap_chars = 100\n")
            .unwrap_err();
        assert!(format!("{err:#}").contains("[chunker]"));

        assert!(AppConfig::parse("[models]\n\"tiny\" = 0\n").is_err());
        assert!(AppConfig::parse("[unknown]\nkey = 1\n").is_err());
    }
}
