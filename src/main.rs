//! # Aozora CLI (`aozora`)
//!
//! Collects works from Aozora Bunko into a local SQLite index and queries it.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `aozora init` | Create the SQLite database and schema |
//! | `aozora collect [URL...]` | Discover, extract, segment, and store works |
//! | `aozora authors` | List stored authors |
//! | `aozora titles <author_id>` | List an author's stored works |
//! | `aozora content <author_id> <title_id>` | Print a work's full text |
//! | `aozora query "<text>"` | Find works containing every word of the text |
//!
//! Logs go to stderr and are filtered with `RUST_LOG` (default `info,sqlx=warn`).

use aozora_index::progress::ProgressMode;
use aozora_index::{config, get, ingest, migrate, search};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Aozora Bunko harvester and Japanese full-text search.
#[derive(Parser)]
#[command(
    name = "aozora",
    about = "Harvest Aozora Bunko works into a searchable SQLite index",
    version
)]
struct Cli {
    /// Path to configuration file (TOML). Built-in defaults apply if it does not exist.
    #[arg(long, global = true, default_value = "./config/aozora.toml")]
    config: PathBuf,

    /// Database file; overrides `[db].path`.
    #[arg(short = 'd', long = "db", global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Idempotent: running it again leaves existing data in place.
    Init,

    /// Collect works from listing pages into the index.
    ///
    /// Each work's archive is fetched, decoded, segmented, and stored one
    /// at a time. A work that fails is logged and skipped.
    Collect {
        /// Listing pages to collect. Defaults to `[crawler].listing_urls`.
        listing_urls: Vec<String>,

        /// Maximum number of works to process.
        #[arg(long)]
        limit: Option<usize>,

        /// Discover and print works without downloading archives or writing.
        #[arg(long)]
        dry_run: bool,

        /// Progress output on stderr. Defaults to `human` on a terminal, `off` otherwise.
        #[arg(long, value_enum)]
        progress: Option<ProgressMode>,
    },

    /// List stored authors.
    Authors,

    /// List the stored works of an author.
    Titles { author_id: String },

    /// Print the full text of a work.
    Content { author_id: String, title_id: String },

    /// Find works containing every word of the query.
    Query { query: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut cfg = config::load_config(&cli.config)?;
    if let Some(db) = cli.db {
        cfg.db.path = db;
    }

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Collect {
            listing_urls,
            limit,
            dry_run,
            progress,
        } => {
            let progress = progress.unwrap_or_else(ProgressMode::default_for_tty);
            ingest::run_collect(&cfg, listing_urls, limit, dry_run, progress).await?;
        }
        Commands::Authors => {
            search::run_authors(&cfg).await?;
        }
        Commands::Titles { author_id } => {
            search::run_titles(&cfg, &author_id).await?;
        }
        Commands::Content {
            author_id,
            title_id,
        } => {
            get::run_content(&cfg, &author_id, &title_id).await?;
        }
        Commands::Query { query } => {
            search::run_query(&cfg, &query).await?;
        }
    }

    Ok(())
}
