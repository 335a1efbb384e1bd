//! # docgraph
//!
//! An incremental indexer that turns a cloud document corpus into a
//! backlink and entity graph.
//!
//! docgraph discovers documents in a corpus, decides which ones changed
//! since the last pass, walks each document's content tree to extract
//! hyperlinks and plain text, resolves extracted named entities against a
//! known-entity registry, and persists the resulting graph in SQLite. A
//! small HTTP server answers "who links to this document" queries over the
//! persisted graph.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────────┐   ┌──────────┐
//! │ Source APIs  │──▶│  Index pipeline  │──▶│  SQLite   │
//! │ list/fetch/  │   │ gate → extract → │   │  graph    │
//! │ entities     │   │ resolve → upsert │   └────┬─────┘
//! └──────────────┘   └──────────────────┘        │
//!                                ┌───────────────┤
//!                                ▼               ▼
//!                           ┌──────────┐   ┌──────────┐
//!                           │   CLI    │   │   HTTP   │
//!                           │  (dgx)   │   │backlinks │
//!                           └──────────┘   └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! dgx init                      # create the database
//! dgx index <corpus-id>         # index every new/changed document
//! dgx index-doc <doc-id>        # index a single document
//! dgx backlinks <doc-id>        # who links to this document?
//! dgx serve                     # start the HTTP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Graph records and deterministic keys |
//! | [`document`] | Document content tree |
//! | [`extract`] | Text and link extraction |
//! | [`reference`] | Corpus document URI resolution |
//! | [`entities`] | Entity candidate filtering and resolution |
//! | [`indexer`] | Indexing orchestration |
//! | [`client`] | HTTP collaborators (listing, fetch, entity analysis) |
//! | [`store`] | SQLite graph store |
//! | [`backlinks`] | Backlink queries |
//! | [`server`] | HTTP API |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema creation |

pub mod backlinks;
pub mod client;
pub mod config;
pub mod db;
pub mod document;
pub mod entities;
pub mod error;
pub mod extract;
pub mod indexer;
pub mod migrate;
pub mod models;
pub mod reference;
pub mod server;
pub mod store;
