//! Core records of the document graph.
//!
//! Four record kinds are persisted: document references, directed links
//! between documents, canonical entities, and entity mentions. Each carries
//! a deterministic primary key so that re-indexing the same document is an
//! update rather than a duplicate insert.

use serde::Serialize;

/// Namespace prefix for document ids.
///
/// WARNING: changing this breaks existing databases — persisted keys are
/// derived from it and are never regenerated.
pub const DRIVE_NAMESPACE: &str = "gdrive";

/// Primary key for a corpus document: `gdrive.{external_id}`.
pub fn doc_key(external_id: &str) -> String {
    format!("{}.{}", DRIVE_NAMESPACE, external_id)
}

/// Primary key for a [`DocLink`]: `{source}-{dest}-{start}-{end}`.
///
/// Two links between the same pair of documents at different offsets are
/// distinct edges; a re-extracted link at identical offsets collapses onto
/// the same row.
pub fn link_key(link: &DocLink) -> String {
    format!(
        "{}-{}-{}-{}",
        link.source_id, link.dest_id, link.start_index, link.end_index
    )
}

/// Primary key for an [`EntityMention`]: `{doc}-{entity}-{start}-{end}`.
pub fn mention_key(m: &EntityMention) -> String {
    format!("{}-{}-{}-{}", m.doc_id, m.entity_id, m.start_index, m.end_index)
}

/// A reference to a document stored in the source system.
///
/// `revision` is the source's opaque content-version marker for the
/// document; `last_indexed_revision` is the marker at which the document
/// was last fully indexed. The two are compared by the change-detection
/// gate to decide whether a document needs re-indexing, and are only
/// advanced together after a successful pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocReference {
    /// `gdrive.{external_id}`; assigned on first discovery, never changed.
    pub id: String,
    /// The id of the document in the source system.
    pub external_id: String,
    pub name: String,
    /// MIME type reported by the source.
    pub content_type: String,
    pub revision: String,
    pub last_indexed_revision: String,
}

/// A directed hyperlink between two documents.
///
/// `dest_id` is empty when the link target is not a corpus document (e.g.
/// a link to an external website). A document may link to the same
/// destination more than once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocLink {
    pub source_id: String,
    pub dest_id: String,
    /// Raw target URI as it appeared in the document.
    pub uri: String,
    /// Anchor text of the link.
    pub text: String,
    pub start_index: i64,
    pub end_index: i64,
}

/// A canonical real-world entity.
///
/// Ids are UUIDs minted by the resolver on first sight; the store defaults
/// a missing id to the name as a legacy fallback. Multiple entities may
/// share a name — resolution is best-effort, not guaranteed-unique.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Entity {
    pub id: String,
    /// Canonical name of the entity.
    pub name: String,
    /// Type tag from the extraction service (e.g. `PERSON`).
    pub kind: String,
    /// Wikipedia URL if the extraction service linked one.
    pub wikipedia_url: String,
    /// Knowledge-graph id if the extraction service linked one.
    pub mid: String,
}

/// An occurrence of an [`Entity`] in a document's text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityMention {
    pub doc_id: String,
    pub entity_id: String,
    /// The mention text as it appeared in the document.
    pub text: String,
    pub start_index: i64,
    pub end_index: i64,
}

/// An item discovered during corpus listing, before fetch.
#[derive(Debug, Clone)]
pub struct DiscoveredDoc {
    pub id: String,
    pub name: String,
    pub content_type: String,
    pub revision: String,
}

/// One backlink of a document: who links to it and with what text.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BackLink {
    pub text: String,
    #[serde(rename = "docId")]
    pub doc_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doc_key_is_namespaced() {
        assert_eq!(doc_key("abc123"), "gdrive.abc123");
    }

    #[test]
    fn link_key_includes_offsets() {
        let link = DocLink {
            source_id: "gdrive.a".to_string(),
            dest_id: "gdrive.b".to_string(),
            start_index: 10,
            end_index: 20,
            ..Default::default()
        };
        assert_eq!(link_key(&link), "gdrive.a-gdrive.b-10-20");
    }

    #[test]
    fn mention_key_includes_entity_and_offsets() {
        let m = EntityMention {
            doc_id: "gdrive.a".to_string(),
            entity_id: "e1".to_string(),
            start_index: 5,
            end_index: 9,
            ..Default::default()
        };
        assert_eq!(mention_key(&m), "gdrive.a-e1-5-9");
    }
}
