//! Error taxonomy for the indexing pipeline.
//!
//! Stage-local failures (a single link, a single entity, a single document
//! in a batch) are logged and skipped by the orchestrator; only
//! discovery-phase failures abort a whole `index` run. Ambiguous entity
//! resolution is not an error at all — it is logged and resolved
//! first-match-wins.

use thiserror::Error;

/// Errors produced by the indexing pipeline and its collaborators.
#[derive(Debug, Error)]
pub enum IndexError {
    /// A required argument or field was missing or inconsistent.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A link target could not be parsed as a URL.
    #[error("failed to parse URI: {0}")]
    Parse(String),

    /// A link target parsed as a URL on the corpus host but did not have
    /// the expected `document/d/{id}` path shape.
    #[error("malformed document reference: {0}")]
    MalformedReference(String),

    /// The document does not exist (or no longer exists) in the source.
    #[error("document not found: {0}")]
    NotFound(String),

    /// The source rejected the request for this document.
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// A store read or write failed.
    #[error("datastore error: {0}")]
    Store(#[from] sqlx::Error),

    /// A collaborator HTTP call failed.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

impl IndexError {
    /// True when retrying on a later run could succeed (the document stays
    /// eligible for re-indexing because its version marker is untouched).
    pub fn is_transient(&self) -> bool {
        matches!(self, IndexError::Store(_) | IndexError::Http(_))
    }
}
