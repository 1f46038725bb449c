//! CLI entry point for the count unification tool.
//!
//! Provides subcommands for building the unified summary from the raw count
//! tables, printing the explore view, checking the document-retrieval
//! artifacts, and sending a single assistant chat turn.

mod infra;
mod services;

use crate::infra::documents::{DocumentConfig, DocumentIndex};
use crate::infra::openai::{ChatConfig, OpenAiChat, OpenAiEmbedder};
use crate::services::chat::{ChatMessage, ChatProvider, ChatRequest};
use crate::services::embeddings::Embedder;
use anyhow::{Result, anyhow};
use clap::{Args, Parser, Subcommand};
use count_unify::config::{BucketScheme, EcoLayout, PedestrianFacility, Preset, Ruleset};
use count_unify::explore::{ExploreQuery, explore};
use count_unify::input::load_tables;
use count_unify::output::{print_pretty, to_json, write_summary};
use count_unify::unify::merge::{in_merge_order, totals_by_source};
use count_unify::unify::types::UnifiedSummaryRecord;
use count_unify::unify::{Policies, unify_concurrent};
use std::ffi::OsStr;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "count_unify")]
#[command(about = "Unify pedestrian, bicycle and trail counts into one summary", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Ruleset selection shared by the commands that run the engine.
#[derive(Args)]
struct RulesetArgs {
    /// JSON ruleset file
    #[arg(long, conflicts_with = "preset")]
    config: Option<String>,

    /// Named ruleset to start from
    #[arg(long, value_enum)]
    preset: Option<Preset>,

    #[arg(long, value_enum)]
    bucket_scheme: Option<BucketScheme>,

    /// Upper bound in hours of the `Short-term` bucket
    #[arg(long)]
    short_term_max_hours: Option<f64>,

    #[arg(long, value_enum)]
    pedestrian_facility: Option<PedestrianFacility>,

    #[arg(long, value_enum)]
    eco_layout: Option<EcoLayout>,
}

impl RulesetArgs {
    /// Preset or file, then `UNIFY_*` environment overrides, then flags.
    fn resolve(&self) -> Result<Ruleset> {
        let base = match &self.config {
            Some(path) => Ruleset::load(path)?,
            None => Ruleset::preset(self.preset.unwrap_or(Preset::Legacy)),
        };
        let mut ruleset = base.with_env()?;

        if let Some(v) = self.bucket_scheme {
            ruleset.bucket_scheme = v;
        }
        if let Some(v) = self.short_term_max_hours {
            ruleset.short_term_max_hours = v;
        }
        if let Some(v) = self.pedestrian_facility {
            ruleset.pedestrian_facility = v;
        }
        if let Some(v) = self.eco_layout {
            ruleset.eco_layout = v;
        }

        debug!(?ruleset, "Ruleset resolved");
        Ok(ruleset)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Build the unified summary and write it as CSV
    Unify {
        /// Directory containing the raw table CSVs
        #[arg(short, long, default_value = "data")]
        input_dir: String,

        /// CSV file to write the summary to (replaced if present)
        #[arg(short, long, default_value = "unified_summary.csv")]
        output: String,

        #[command(flatten)]
        ruleset: RulesetArgs,

        /// Gzip compress the summary file
        #[arg(long, default_value_t = false)]
        gzip: bool,

        /// Also print the summary as JSON on stdout
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print the explore view as JSON
    Explore {
        /// Directory containing the raw table CSVs
        #[arg(short, long, default_value = "data")]
        input_dir: String,

        /// Pedestrian, Bicyclist, Both or All
        #[arg(long)]
        mode: Option<String>,

        /// Winter, Spring, Summer, Fall or All
        #[arg(long)]
        season: Option<String>,

        /// A duration bucket label of the active ruleset, or All
        #[arg(long)]
        duration: Option<String>,

        /// Facility type label (e.g. Intersection, Off-Street Trail) or All
        #[arg(long)]
        facility_type: Option<String>,

        #[command(flatten)]
        ruleset: RulesetArgs,
    },
    /// Validate the document-retrieval artifacts
    CheckDocs {
        /// Embed this text and report the closest indexed chunks
        #[arg(long)]
        probe: Option<String>,

        /// Number of chunks to report for --probe
        #[arg(long, default_value_t = 3)]
        top_k: usize,
    },
    /// Send one message to the assistant and print the reply
    Ask {
        #[arg(short, long)]
        message: String,

        #[arg(long)]
        system_prompt: Option<String>,

        /// Request a single JSON reply instead of a stream
        #[arg(long, default_value_t = false)]
        no_stream: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/count_unify.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("count_unify.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Unify {
            input_dir,
            output,
            ruleset,
            gzip,
            json,
        } => {
            let ruleset = ruleset.resolve()?;
            let policies = Arc::new(Policies::from_ruleset(&ruleset));
            let records = build_summary(&input_dir, ruleset.eco_layout, policies).await?;
            print_pretty(&records);

            for ((source, mode), total) in totals_by_source(&records) {
                info!(source = %source, mode = %mode, total, "Source total");
            }

            write_summary(&output, &records, gzip)?;

            if json {
                println!("{}", to_json(&records)?);
            }
        }
        Commands::Explore {
            input_dir,
            mode,
            season,
            duration,
            facility_type,
            ruleset,
        } => {
            let ruleset = ruleset.resolve()?;
            let policies = Arc::new(Policies::from_ruleset(&ruleset));
            let query = ExploreQuery::parse(mode.as_deref(), season.as_deref())?
                .with_duration(duration.as_deref(), policies.buckets.as_ref())?
                .with_facility_type(facility_type.as_deref())?;
            let records = build_summary(&input_dir, ruleset.eco_layout, policies).await?;

            let response = explore(&records, &query);
            info!(summary = %response.summary, "Explore view built");
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Commands::CheckDocs { probe, top_k } => {
            check_docs(probe, top_k).await?;
        }
        Commands::Ask {
            message,
            system_prompt,
            no_stream,
        } => {
            let chat = OpenAiChat::from_config(ChatConfig::from_env()?)?;
            let request = ChatRequest {
                messages: vec![ChatMessage::user(message)],
                stream: !no_stream,
                system_prompt,
            };

            let reply = chat.reply(&request).await?;
            println!("{}", reply.content);
        }
    }

    Ok(())
}

/// Loads the raw tables under `input_dir` and runs the engine with `policies`.
#[tracing::instrument(skip(policies))]
async fn build_summary(
    input_dir: &str,
    layout: EcoLayout,
    policies: Arc<Policies>,
) -> Result<Vec<UnifiedSummaryRecord>> {
    let tables = load_tables(Path::new(input_dir), layout)?;

    unify_concurrent(in_merge_order(tables), policies).await
}

/// Runs the boot-time artifact checks and, with `probe`, one retrieval round trip.
#[tracing::instrument(skip(probe))]
async fn check_docs(probe: Option<String>, top_k: usize) -> Result<()> {
    let config = DocumentConfig::from_env()?;
    config.validate()?;

    let Some(text) = probe else {
        return Ok(());
    };

    let embedder = OpenAiEmbedder::from_config(&config.embedding)?;
    let query = embedder
        .embed(&[text])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("embedding service returned no vector"))?;
    info!(dims = query.len(), model = %config.embedding.model, "Probe embedded");

    if !config.enabled {
        info!("Document retrieval disabled, not searching the index");
        return Ok(());
    }

    let index = DocumentIndex::load(&config.index_path)?;
    if index.is_empty() {
        warn!(index = %config.index_path.display(), "RAG index holds no chunks");
        return Ok(());
    }

    info!(chunks = index.len(), top_k, "Searching RAG index");
    for hit in index.search(&query, top_k) {
        info!(
            score = hit.score,
            id = %hit.chunk.id,
            text = %hit.chunk.text,
            metadata = %hit.chunk.metadata,
            "Probe hit"
        );
    }

    Ok(())
}
