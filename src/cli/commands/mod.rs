//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific
//! modules.

mod analytics_cmd;
mod bundle;
mod init;
mod ingest;
mod query;
mod show;
mod transfer;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::analytics::{TrendOverrides, YearTotalsCache};
use crate::config::Settings;
use crate::repository::DocumentRepository;

#[derive(Parser)]
#[command(name = "vsarchiv")]
#[command(about = "Archive and full-text search for German domestic intelligence reports")]
#[command(version)]
pub struct Cli {
    /// Data directory (defaults to ./data)
    #[arg(long, global = true, env = "VSARCHIV_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory and database
    Init,

    /// Ingest report PDFs from the pdf directory
    Ingest {
        /// Glob pattern over PDF filenames
        #[arg(default_value = "*.pdf")]
        pattern: String,
    },

    /// Remove one document and its derived data
    Remove {
        /// PDF filename, e.g. vsbericht-by-2004.pdf
        file: String,
    },

    /// Drop and recreate the whole corpus
    Reset {
        /// Skip the confirmation prompt
        #[arg(long)]
        force: bool,
    },

    /// Synchronize the bulk-download bundles
    Bundle {
        /// Rebuild from scratch even when up to date
        #[arg(long)]
        force: bool,
        /// Sync the PDF bundle (default: both)
        #[arg(long)]
        pdfs: bool,
        /// Rebuild the text bundle (default: both)
        #[arg(long)]
        texts: bool,
    },

    /// Export raw data as a tar archive
    Export {
        /// Output path for the tar file
        path: PathBuf,
    },

    /// Import raw data from a tar archive
    Import {
        /// Path of a tar file produced by export
        path: PathBuf,
    },

    /// Search the page corpus
    Search {
        /// Query, websearch syntax ("phrase", -not, or)
        query: String,
        /// Result page (1-based)
        #[arg(short, long, default_value = "1")]
        page: usize,
        /// Restrict to one jurisdiction
        #[arg(short, long)]
        jurisdiction: Option<String>,
        /// Earliest report year
        #[arg(long)]
        from: Option<i32>,
        /// Latest report year
        #[arg(long)]
        to: Option<i32>,
    },

    /// Suggest query completions
    Suggest {
        /// Partial query
        query: String,
    },

    /// Frequency-over-time series for a query
    Trend {
        /// Query term or quoted phrase
        query: String,
        /// Restrict to one jurisdiction
        #[arg(short, long)]
        jurisdiction: Option<String>,
        /// Emit the series as JSON
        #[arg(long)]
        json: bool,
    },

    /// Jurisdiction-by-year mentions matrix for a query
    Mentions {
        /// Query term or quoted phrase
        query: String,
        /// Earliest year of the matrix
        #[arg(long)]
        from: Option<i32>,
        /// Latest year of the matrix
        #[arg(long)]
        to: Option<i32>,
        /// Emit semicolon-separated rows instead of a table
        #[arg(long)]
        csv: bool,
        /// Emit the matrix as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one document
    Show {
        /// Jurisdiction name or code, e.g. Bayern or by
        jurisdiction: String,
        /// Report year
        year: i32,
        /// Print the full plain text instead of the metadata
        #[arg(long)]
        text: bool,
    },

    /// List all documents in the archive
    List,
}

/// Everything a command needs: settings, the repository and the shared
/// analytics state.
pub struct AppContext {
    pub settings: Settings,
    pub repo: DocumentRepository,
    pub totals_cache: Arc<YearTotalsCache>,
    pub overrides: TrendOverrides,
}

impl AppContext {
    fn open(data_dir: &std::path::Path) -> anyhow::Result<Self> {
        let settings = Settings::load(data_dir)?;
        settings.ensure_directories()?;
        let repo = DocumentRepository::new(&settings.database_path())?;
        Ok(Self {
            settings,
            repo,
            totals_cache: Arc::new(YearTotalsCache::new()),
            overrides: TrendOverrides::default(),
        })
    }
}

/// Parse the command line and run the selected command.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let data_dir = cli.data_dir.unwrap_or_else(|| PathBuf::from("data"));
    let ctx = AppContext::open(&data_dir)?;

    match cli.command {
        Commands::Init => init::cmd_init(&ctx).await,
        Commands::Ingest { pattern } => ingest::cmd_ingest(&ctx, &pattern).await,
        Commands::Remove { file } => ingest::cmd_remove(&ctx, &file),
        Commands::Reset { force } => ingest::cmd_reset(&ctx, force),
        Commands::Bundle {
            force,
            pdfs,
            texts,
        } => bundle::cmd_bundle(&ctx, force, pdfs, texts),
        Commands::Export { path } => transfer::cmd_export(&ctx, &path),
        Commands::Import { path } => transfer::cmd_import(&ctx, &path),
        Commands::Search {
            query,
            page,
            jurisdiction,
            from,
            to,
        } => query::cmd_search(&ctx, &query, page, jurisdiction, from, to),
        Commands::Suggest { query } => query::cmd_suggest(&ctx, &query),
        Commands::Trend {
            query,
            jurisdiction,
            json,
        } => analytics_cmd::cmd_trend(&ctx, &query, jurisdiction, json),
        Commands::Mentions {
            query,
            from,
            to,
            csv,
            json,
        } => analytics_cmd::cmd_mentions(&ctx, &query, from, to, csv, json),
        Commands::Show {
            jurisdiction,
            year,
            text,
        } => show::cmd_show(&ctx, &jurisdiction, year, text),
        Commands::List => show::cmd_list(&ctx),
    }
}
