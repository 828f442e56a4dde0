//! policy-lens command line.
//!
//! Usage:
//!   policy-lens keywords seed
//!   policy-lens analyze --file policy.txt --summarize --store
//!   policy-lens policies
//!   policy-lens history 3

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use prettytable::{Table, row};
use tracing::info;
use tracing_subscriber::EnvFilter;

use policy_lens::config::Config;
use policy_lens::dictionary::{KeywordEntry, default_entries, parse_dictionary_toml};
use policy_lens::matcher::{MatchRecord, ScanObserver};
use policy_lens::report::render_overview;
use policy_lens::store::{RecordStore, SqliteStore};
use policy_lens::summarizer::{OllamaClient, SummarizationClient, SummaryOrchestrator};
use policy_lens::{AnalysisSession, PolicyLensError};

#[derive(Parser)]
#[command(name = "policy-lens")]
#[command(about = "Keyword analysis and summaries for privacy policies", long_about = None)]
struct Cli {
    /// Database file (overrides config and POLICY_LENS_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run keyword analysis on a policy
    Analyze {
        /// Read the policy from a file
        #[arg(long, conflicts_with = "text", required_unless_present = "text")]
        file: Option<PathBuf>,
        /// Use the given text as the policy
        #[arg(long)]
        text: Option<String>,
        /// Compose an AI summary after the analysis
        #[arg(long)]
        summarize: bool,
        /// Archive the policy and its analysis
        #[arg(long)]
        store: bool,
        /// Print each match as it is found
        #[arg(long)]
        verbose: bool,
    },
    /// Manage the keyword dictionary
    Keywords {
        #[command(subcommand)]
        action: KeywordCommands,
    },
    /// List stored policies, newest first
    Policies {
        /// Preview length in characters
        #[arg(long, default_value_t = 100)]
        preview: usize,
    },
    /// Show stored analyses for a policy
    History { policy_id: i64 },
    /// Check whether the summarization service responds
    Probe,
}

#[derive(Subcommand)]
enum KeywordCommands {
    /// Show the stored dictionary
    List,
    /// Insert the built-in starter dictionary
    Seed,
    /// Import `[[keyword]]` entries from a TOML file
    Import { file: PathBuf },
}

/// Prints matches as they are found
struct ConsoleObserver;

impl ScanObserver for ConsoleObserver {
    fn on_match(&mut self, record: &MatchRecord) {
        println!(
            "  found '{}' ({}) at offset {}",
            record.term, record.category, record.offset
        );
    }

    fn on_term_complete(&mut self, entry: &KeywordEntry, occurrences: usize) {
        if occurrences > 0 {
            println!("Keyword '{}': {} occurrence(s)", entry.term, occurrences);
        }
    }
}

fn advise(err: PolicyLensError) -> anyhow::Error {
    anyhow::anyhow!(err.advisory())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        e
    })?;
    if let Some(db) = cli.db {
        config.store.database_path = db;
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.runtime.log_level))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Analyze {
            file,
            text,
            summarize,
            store,
            verbose,
        } => analyze(&config, file, text, summarize, store, verbose).await,
        Commands::Keywords { action } => keywords(&config, action),
        Commands::Policies { preview } => policies(&config, preview),
        Commands::History { policy_id } => history(&config, policy_id),
        Commands::Probe => probe(&config).await,
    }
}

fn open_store(config: &Config) -> Result<Arc<SqliteStore>> {
    let store = SqliteStore::open(&config.store.database_path)
        .map_err(advise)
        .with_context(|| format!("opening {}", config.store.database_path.display()))?;
    Ok(Arc::new(store))
}

fn build_session(config: &Config, store: Arc<SqliteStore>) -> Result<AnalysisSession> {
    let summarizer = OllamaClient::new(&config.summarizer).map_err(advise)?;
    Ok(AnalysisSession::new(
        store,
        Arc::new(summarizer),
        SummaryOrchestrator::from_config(&config.summarizer),
    ))
}

async fn analyze(
    config: &Config,
    file: Option<PathBuf>,
    text: Option<String>,
    summarize: bool,
    store: bool,
    verbose: bool,
) -> Result<()> {
    let mut session = build_session(config, open_store(config)?)?;

    match (file, text) {
        (Some(path), _) => session.load_from_file(&path).map_err(advise)?,
        (None, Some(text)) => session.load_text(text),
        (None, None) => return Err(advise(PolicyLensError::NoTextLoaded)),
    }

    let report = if verbose {
        session.analyze_with_observer(&mut ConsoleObserver)
    } else {
        session.analyze()
    }
    .map_err(advise)?;
    println!("{}", report);
    println!("{}", render_overview(session.aggregates().map_err(advise)?));

    if store {
        let id = session.store_current_policy().map_err(advise)?;
        println!("Policy stored with ID {}", id);
    }

    if summarize {
        let summary = session.compose_summary().await.map_err(advise)?;
        println!("{}", summary);
    }

    if store {
        let id = session
            .store_current_analysis_with_summary()
            .map_err(advise)?;
        println!("Analysis stored for policy ID {}", id);
    }

    Ok(())
}

fn keywords(config: &Config, action: KeywordCommands) -> Result<()> {
    let store = open_store(config)?;
    match action {
        KeywordCommands::List => {
            let entries = store.list_keywords().map_err(advise)?;
            if entries.is_empty() {
                println!("{}", PolicyLensError::NoDictionaryLoaded.advisory());
                return Ok(());
            }
            let mut table = Table::new();
            table.add_row(row!["Keyword", "Category"]);
            for entry in &entries {
                table.add_row(row![entry.term, entry.category]);
            }
            table.printstd();
            println!("{} keywords", entries.len());
        }
        KeywordCommands::Seed => {
            let added = store.insert_keywords(&default_entries()).map_err(advise)?;
            println!("Added {} keywords", added);
        }
        KeywordCommands::Import { file } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let entries = parse_dictionary_toml(&content).map_err(advise)?;
            let added = store.insert_keywords(&entries).map_err(advise)?;
            info!("Imported {} from {}", added, file.display());
            println!("Added {} of {} keywords", added, entries.len());
        }
    }
    Ok(())
}

fn policies(config: &Config, preview: usize) -> Result<()> {
    let store = open_store(config)?;
    let policies = store.list_policies().map_err(advise)?;
    if policies.is_empty() {
        println!("No stored policies found.");
        return Ok(());
    }

    let mut table = Table::new();
    table.add_row(row![
        "ID", "Source", "Filename", "Chars", "Created", "Analyses", "Preview"
    ]);
    for policy in &policies {
        let analyses = store.list_analyses(policy.id).map_err(advise)?.len();
        table.add_row(row![
            policy.id,
            policy.source,
            policy.filename.as_deref().unwrap_or("-"),
            policy.char_count,
            policy.created_at,
            analyses,
            policy.preview(preview).replace(['\r', '\n'], " "),
        ]);
    }
    table.printstd();
    Ok(())
}

fn history(config: &Config, policy_id: i64) -> Result<()> {
    let store = open_store(config)?;
    let Some(policy) = store.get_policy(policy_id).map_err(advise)? else {
        println!("No stored policy with ID {}", policy_id);
        return Ok(());
    };
    println!(
        "Policy {} ({}, {} characters, stored {})",
        policy.id, policy.source, policy.char_count, policy.created_at
    );

    let analyses = store.list_analyses(policy_id).map_err(advise)?;
    if analyses.is_empty() {
        println!("No analysis history for this policy.");
        return Ok(());
    }
    for analysis in analyses {
        println!("\n=== Analysis {} ({}) ===", analysis.id, analysis.created_at);
        println!("{}", analysis.keyword_analysis);
        if let Some(summary) = analysis.ai_summary {
            println!("{}", summary);
        }
    }
    Ok(())
}

async fn probe(config: &Config) -> Result<()> {
    let client = OllamaClient::new(&config.summarizer).map_err(advise)?;
    if client.is_available().await {
        println!(
            "Summarizer at {} is available (model {})",
            client.endpoint(),
            client.model()
        );
    } else {
        println!("Summarizer at {} is not responding", client.endpoint());
    }
    Ok(())
}
