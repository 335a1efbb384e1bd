//! Backlink queries.
//!
//! Answers "who links to document X" from the persisted graph. Used by both
//! the `dgx backlinks` CLI command and the HTTP server.

use serde::Serialize;

use crate::error::IndexError;
use crate::models::{doc_key, BackLink};
use crate::store::Datastore;

/// Response shape for a backlink listing.
#[derive(Debug, Serialize)]
pub struct BackLinkList {
    pub items: Vec<BackLink>,
}

/// Lists the backlinks of a document.
///
/// Accepts either the namespaced graph id (`gdrive.{id}`) or the bare
/// external id.
pub async fn list_backlinks(store: &Datastore, doc_id: &str) -> Result<BackLinkList, IndexError> {
    let dest = if doc_id.contains('.') {
        doc_id.to_string()
    } else {
        doc_key(doc_id)
    };

    let items = store.backlinks(&dest).await?;
    Ok(BackLinkList { items })
}
