//! Resolution of link targets to corpus document references.
//!
//! A hyperlink found in a document may point anywhere. [`parse_doc_uri`]
//! decides whether a target is a document in the corpus, and if so extracts
//! the document id and an optional heading anchor from the URL fragment.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::error::IndexError;

/// Host under which corpus documents are served.
pub const DOCS_HOST: &str = "docs.google.com";

static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"heading=(h\.[0-9a-zA-Z]+)").expect("heading regex is valid"));

/// A parsed reference to a corpus document.
#[derive(Debug, Clone, PartialEq)]
pub struct DocUri {
    /// External id of the referenced document.
    pub id: String,
    /// Heading anchor within the document, or empty.
    pub heading: String,
}

/// Parses a link target as a corpus document URI.
///
/// Returns `Ok(None)` when the URL is well formed but simply not a corpus
/// document (different host). A URL on the corpus host whose path does not
/// have the `document/d/{id}` shape is a [`IndexError::MalformedReference`].
pub fn parse_doc_uri(uri: &str) -> Result<Option<DocUri>, IndexError> {
    let parsed = Url::parse(uri)
        .map_err(|e| IndexError::Parse(format!("failed to parse URL {}: {}", uri, e)))?;

    if parsed.host_str() != Some(DOCS_HOST) {
        return Ok(None);
    }

    let segments: Vec<&str> = parsed
        .path_segments()
        .map(|s| s.filter(|p| !p.is_empty()).collect())
        .unwrap_or_default();

    if segments.len() < 3 || segments[0] != "document" || segments[1] != "d" {
        return Err(IndexError::MalformedReference(format!(
            "{} does not have path document/d/{{id}}...",
            uri
        )));
    }

    let mut heading = String::new();
    if let Some(fragment) = parsed.fragment() {
        if let Some(captures) = HEADING_RE.captures(fragment) {
            heading = captures[1].to_string();
        }
    }

    Ok(Some(DocUri {
        id: segments[2].to_string(),
        heading,
    }))
}
