//! # docgraph CLI (`dgx`)
//!
//! The `dgx` binary drives the indexing pipeline and serves the graph.
//!
//! ## Usage
//!
//! ```bash
//! dgx --config ./config/docgraph.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `dgx init` | Create the SQLite database and schema |
//! | `dgx index <corpus-id>` | Index every new or changed document in a corpus |
//! | `dgx index-doc <doc-id>` | Index a single document, bypassing discovery |
//! | `dgx backlinks <doc-id>` | List the backlinks of a document |
//! | `dgx serve` | Start the HTTP server |

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use docgraph::backlinks::list_backlinks;
use docgraph::client::HttpCorpusClient;
use docgraph::config::load_config;
use docgraph::indexer::Indexer;
use docgraph::server::run_server;
use docgraph::store::Datastore;

/// docgraph CLI — an incremental indexer that turns a cloud document corpus
/// into a backlink and entity graph.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/docgraph.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "dgx",
    about = "docgraph — an incremental document-graph indexer",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/docgraph.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and all required tables. Idempotent;
    /// running it multiple times is safe.
    Init,

    /// Index every new or changed document in a corpus.
    ///
    /// Lists the corpus, upserts a reference per discovered document, then
    /// runs the per-document pipeline over everything the change gate
    /// selects. One document's failure does not abort the batch.
    Index {
        /// Corpus (shared drive) id to index.
        corpus_id: String,
    },

    /// Index a single document, bypassing corpus discovery.
    IndexDoc {
        /// External id of the document.
        doc_id: String,
    },

    /// List the backlinks of a document.
    Backlinks {
        /// Document id (namespaced or bare external id).
        doc_id: String,
    },

    /// Start the HTTP server.
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            let store = Datastore::open(&config.db.path).await?;
            store.close().await;
            println!("initialized {}", config.db.path.display());
        }
        Commands::Index { corpus_id } => {
            let store = Datastore::open(&config.db.path).await?;
            let client = HttpCorpusClient::new(config.source.clone());
            let indexer = Indexer::new(client.clone(), client.clone(), client, store);

            let report = indexer.index(&corpus_id).await?;
            println!("index {}", corpus_id);
            println!("  discovered: {}", report.discovered);
            println!("  indexed: {}", report.indexed.len());
            println!("  skipped: {}", report.skipped.len());
            println!("  degraded: {}", report.degraded.len());
            println!("  failed: {}", report.failed.len());
            for failure in &report.failed {
                println!("    {}: {}", failure.doc_id, failure.error);
            }
            println!("ok");
        }
        Commands::IndexDoc { doc_id } => {
            let store = Datastore::open(&config.db.path).await?;
            let client = HttpCorpusClient::new(config.source.clone());
            let indexer = Indexer::new(client.clone(), client.clone(), client, store);

            indexer.index_document(&doc_id).await?;
            println!("indexed {}", doc_id);
        }
        Commands::Backlinks { doc_id } => {
            let store = Datastore::open(&config.db.path).await?;
            let list = list_backlinks(&store, &doc_id).await?;
            if list.items.is_empty() {
                println!("no backlinks for {}", doc_id);
            } else {
                for item in &list.items {
                    println!("{:<40} {}", item.doc_id, item.text);
                }
            }
        }
        Commands::Serve => {
            run_server(&config).await?;
        }
    }

    Ok(())
}
