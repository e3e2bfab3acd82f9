use anyhow::{Context as AnyhowContext, Result};
use clap::Parser;
use config::AppConfig;
use flags::{EmbedMode, ReasoningLevelFlag, ReasoningProviderFlag};
use paper_budget::{
    apply_model_input_token_cap, build_conversation, estimate_available_context_budget,
    BudgetRequest, ConversationParts, ReasoningConfig,
};
use paper_search::{
    assemble_paper_context, ContextRequest, DocumentContextCache, DEFAULT_CACHE_CAPACITY,
};
use paper_text_chunker::Chunker;
use paper_vector_store::{EmbeddingProvider, HttpEmbeddingProvider, StubEmbeddingProvider};
use papers::PaperSpec;
use std::path::PathBuf;

mod config;
mod flags;
mod papers;
mod report;

const DEFAULT_SYSTEM_PROMPT: &str = "You are a research assistant. Answer from the provided \
paper context and cite evidence labels such as [P1-C2] when you rely on them.";

#[derive(Parser)]
#[command(name = "paper-context")]
#[command(about = "Assemble budgeted multi-paper context for a chat turn", long_about = None)]
#[command(version)]
struct Cli {
    /// Paper text file: PATH[::TITLE[::AUTHOR[::YEAR[::CITATION_KEY]]]] (repeatable)
    #[arg(short, long = "paper", value_name = "SPEC", required = true)]
    papers: Vec<PaperSpec>,

    /// The user's question
    #[arg(short, long)]
    question: String,

    /// Target chat model (selects the input ceiling)
    #[arg(short, long, default_value = "gpt-4o")]
    model: String,

    /// 1-based position of the paper the user is reading
    #[arg(long, value_name = "N")]
    active: Option<usize>,

    /// Prior turns as a JSON array of {"role", "content"} messages
    #[arg(long, value_name = "FILE")]
    history: Option<PathBuf>,

    /// Image attachment URL for the question (repeatable)
    #[arg(long = "image", value_name = "URL")]
    images: Vec<String>,

    /// System prompt placed before the document context
    #[arg(long, default_value = DEFAULT_SYSTEM_PROMPT)]
    system_prompt: String,

    /// Requested completion size
    #[arg(long)]
    max_output_tokens: Option<usize>,

    /// Explicit input ceiling, overriding the model table
    #[arg(long)]
    input_token_cap: Option<usize>,

    #[arg(long, value_enum, default_value = "openai-compatible")]
    reasoning_provider: ReasoningProviderFlag,

    #[arg(long, value_enum, default_value = "off")]
    reasoning_level: ReasoningLevelFlag,

    /// Embedding backend for hybrid retrieval
    #[arg(long, value_enum, default_value = "none")]
    embed_mode: EmbedMode,

    /// Embeddings API base URL (overrides [embedding].api_base)
    #[arg(long)]
    api_base: Option<String>,

    /// Embeddings API key (overrides [embedding].api_key)
    #[arg(long, env = "PAPER_CONTEXT_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Embedding model id (overrides [embedding].model)
    #[arg(long)]
    embed_model: Option<String>,

    /// TOML file with [chunker], [retrieval], [embedding] and [models] sections
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print a JSON report instead of the context text
    #[arg(long)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let config = load_config(&cli)?;
    let report = run(&cli, &config).await?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to encode report")?
        );
    } else {
        println!("{}", report.document_context());
    }
    Ok(())
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(base) = &cli.api_base {
        config.embedding.api_base = base.clone();
    }
    if let Some(key) = &cli.api_key {
        config.embedding.api_key = key.clone();
    }
    if let Some(model) = &cli.embed_model {
        config.embedding.model = model.clone();
    }
    config.validate()?;
    Ok(config)
}

fn build_embedder(
    mode: EmbedMode,
    config: &AppConfig,
) -> Result<Option<Box<dyn EmbeddingProvider>>> {
    let provider: Box<dyn EmbeddingProvider> = match mode {
        EmbedMode::None => return Ok(None),
        EmbedMode::Stub => Box::new(StubEmbeddingProvider::default()),
        EmbedMode::Http if !config.embedding.is_configured() => {
            log::warn!("Embedding API is not configured; continuing with lexical retrieval");
            return Ok(None);
        }
        EmbedMode::Http => Box::new(
            HttpEmbeddingProvider::new(&config.embedding)
                .context("Failed to create embedding client")?,
        ),
    };
    log::debug!(
        "Embedding mode {} with model {}",
        mode.as_str(),
        provider.model_id()
    );
    Ok(Some(provider))
}

async fn run(cli: &Cli, config: &AppConfig) -> Result<report::Report> {
    let chunker = Chunker::new(config.chunker.clone()).context("Invalid chunker config")?;
    let cache = DocumentContextCache::new(chunker, DEFAULT_CACHE_CAPACITY);
    let papers = papers::load_papers(&cli.papers, &cache)?;
    let active_paper = cli
        .active
        .map(|position| papers::paper_key(position, papers.len()))
        .transpose()?;
    let history = papers::load_history(cli.history.as_deref())?;
    let embedder = build_embedder(cli.embed_mode, config)?;
    let limits = config.model_limits();

    let budget = estimate_available_context_budget(
        &BudgetRequest {
            system_prompt: &cli.system_prompt,
            history: &history,
            image_count: cli.images.len(),
            reasoning: ReasoningConfig::new(
                cli.reasoning_provider.as_domain(),
                cli.reasoning_level.as_domain(),
            ),
            max_output_tokens: cli.max_output_tokens,
            input_token_cap: cli.input_token_cap,
            ..BudgetRequest::new(&cli.model, &cli.question)
        },
        &limits,
    );

    let request = ContextRequest {
        papers: &papers,
        question: &cli.question,
        context_budget_tokens: budget.context_budget_tokens,
        active_paper,
        embedder: embedder.as_deref(),
    };
    let assembled = assemble_paper_context(&request, &config.retrieval).await;
    if assembled.semantic_degraded {
        log::warn!("Embeddings unavailable; continuing without semantic search");
    }
    log::info!(
        "Assembled {} context: {} chunks, {}/{} tokens",
        assembled.mode.as_str(),
        assembled.selected_chunk_count,
        assembled.context_tokens,
        assembled.context_budget_tokens
    );

    let messages = build_conversation(&ConversationParts {
        system_prompt: &cli.system_prompt,
        document_context: &assembled.context_text,
        history: &history,
        question: &cli.question,
        image_urls: &cli.images,
    });
    let cap = apply_model_input_token_cap(messages, &cli.model, cli.input_token_cap, &limits);
    if cap.capped {
        log::warn!(
            "Trimmed conversation from ~{} to ~{} tokens (limit {})",
            cap.estimated_before_tokens,
            cap.estimated_after_tokens,
            cap.limit_tokens
        );
    }

    Ok(report::Report {
        model: cli.model.clone(),
        embed_mode: cli.embed_mode.as_str(),
        budget,
        context: assembled,
        cap,
    })
}
