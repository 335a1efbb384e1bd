//! Entity candidate filtering and resolution.
//!
//! The extraction service is noisy, so raw results go through two steps:
//! [`new_entity_candidates`] keeps only entities worth tracking, and
//! [`resolve_entity`] links a candidate to a previously recorded canonical
//! entity, minting a new one when no match exists.

use tracing::warn;
use uuid::Uuid;

use crate::error::IndexError;
use crate::models::Entity;
use crate::store::{Datastore, EntityQuery};

/// Metadata key under which the extraction service reports a Wikipedia URL.
pub const WIKIPEDIA_KEY: &str = "wikipedia_url";
/// Metadata key under which the extraction service reports a knowledge-graph id.
pub const MID_KEY: &str = "mid";

/// Mention type tag for a proper-noun mention.
pub const MENTION_PROPER: &str = "PROPER";

/// Entity types that are not "things" we track. Dates, quantities,
/// addresses and the like are suppressed outright, as is OTHER, which
/// returns a lot of spammy organizations.
const SUPPRESSED_KINDS: [&str; 8] = [
    "ADDRESS",
    "DATE",
    "NUMBER",
    "PHONE_NUMBER",
    "PRICE",
    "LOCATION",
    "WORK_OF_ART",
    "OTHER",
];

/// A raw entity from the extraction service, not yet linked to a canonical
/// record.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct RawEntity {
    #[serde(default)]
    pub name: String,
    /// Type tag (e.g. `PERSON`, `ORGANIZATION`).
    #[serde(default, rename = "type")]
    pub kind: String,
    /// Service-provided metadata; external knowledge-base fields are read
    /// from here by key.
    #[serde(default)]
    pub metadata: std::collections::HashMap<String, String>,
    #[serde(default)]
    pub mentions: Vec<RawMention>,
}

/// One occurrence of a raw entity in the analyzed text.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct RawMention {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub start_index: i64,
    #[serde(default)]
    pub end_index: i64,
    /// Mention type tag (`PROPER` or `COMMON`).
    #[serde(default, rename = "type")]
    pub kind: String,
}

impl RawEntity {
    /// The Wikipedia URL the service linked, or empty.
    pub fn wikipedia_url(&self) -> &str {
        self.metadata.get(WIKIPEDIA_KEY).map(String::as_str).unwrap_or("")
    }

    /// The knowledge-graph id the service linked, or empty.
    pub fn mid(&self) -> &str {
        self.metadata.get(MID_KEY).map(String::as_str).unwrap_or("")
    }
}

/// Filters raw extraction results down to entities worth tracking.
///
/// Discovery of new entities uses stricter criteria than mentions of known
/// ones: suppressed types are rejected outright, and the rest must either
/// carry a knowledge-base cross-reference or have at least one proper-noun
/// mention. Input order is preserved.
pub fn new_entity_candidates(entities: Vec<RawEntity>) -> Vec<RawEntity> {
    let mut cleaned = Vec::with_capacity(entities.len());

    for e in entities {
        if SUPPRESSED_KINDS.contains(&e.kind.as_str()) {
            continue;
        }

        // To be included as a possible new entity one of two things must
        // be true: the service linked it to its knowledge graph, or it is
        // a proper noun as opposed to a common noun.
        if !e.wikipedia_url().is_empty() || !e.mid().is_empty() {
            cleaned.push(e);
            continue;
        }

        if e.mentions.iter().any(|m| m.kind == MENTION_PROPER) {
            cleaned.push(e);
        }
    }

    cleaned
}

/// Resolves a candidate against the known-entity registry.
///
/// Looks up existing entities matching the candidate's name, Wikipedia URL,
/// or knowledge-graph id (logical OR over whichever are present). Multiple
/// matches are logged and resolved first-match-wins; zero matches mint a
/// new canonical entity with a fresh UUID. Only store failures propagate.
pub async fn resolve_entity(
    candidate: &RawEntity,
    store: &Datastore,
) -> Result<Entity, IndexError> {
    let query = EntityQuery {
        name: candidate.name.clone(),
        wikipedia_url: candidate.wikipedia_url().to_string(),
        mid: candidate.mid().to_string(),
    };

    let matches = store.find_entities(&query).await?;

    if let Some(first) = matches.first() {
        if matches.len() > 1 {
            warn!(
                name = %candidate.name,
                count = matches.len(),
                resolved = %first.id,
                "ambiguous entity resolution; taking first match"
            );
        }
        return Ok(first.clone());
    }

    let entity = Entity {
        id: Uuid::new_v4().to_string(),
        name: candidate.name.clone(),
        kind: candidate.kind.clone(),
        wikipedia_url: candidate.wikipedia_url().to_string(),
        mid: candidate.mid().to_string(),
    };
    store.upsert_entity(&entity).await?;

    Ok(entity)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(name: &str, mention_kind: &str) -> RawEntity {
        RawEntity {
            name: name.to_string(),
            kind: "PERSON".to_string(),
            mentions: vec![RawMention {
                text: name.to_string(),
                kind: mention_kind.to_string(),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn proper_noun_person_is_accepted() {
        let candidates = new_entity_candidates(vec![person("Ada Lovelace", MENTION_PROPER)]);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].name, "Ada Lovelace");
    }

    #[test]
    fn common_noun_without_kb_link_is_rejected() {
        let candidates = new_entity_candidates(vec![person("engineer", "COMMON")]);
        assert!(candidates.is_empty());
    }

    #[test]
    fn kb_linked_common_noun_is_accepted() {
        let mut e = person("turing machine", "COMMON");
        e.metadata.insert(
            WIKIPEDIA_KEY.to_string(),
            "https://en.wikipedia.org/wiki/Turing_machine".to_string(),
        );
        let candidates = new_entity_candidates(vec![e]);
        assert_eq!(candidates.len(), 1);
    }

    #[test]
    fn mid_alone_is_enough() {
        let mut e = person("widget", "COMMON");
        e.metadata.insert(MID_KEY.to_string(), "/m/0abc".to_string());
        assert_eq!(new_entity_candidates(vec![e]).len(), 1);
    }

    #[test]
    fn suppressed_types_are_rejected_even_with_kb_metadata() {
        let mut e = person("something", MENTION_PROPER);
        e.kind = "OTHER".to_string();
        e.metadata.insert(
            WIKIPEDIA_KEY.to_string(),
            "https://en.wikipedia.org/wiki/Something".to_string(),
        );
        e.metadata.insert(MID_KEY.to_string(), "/m/0xyz".to_string());
        assert!(new_entity_candidates(vec![e]).is_empty());
    }

    #[test]
    fn all_suppressed_types_are_rejected() {
        for kind in SUPPRESSED_KINDS {
            let mut e = person("x", MENTION_PROPER);
            e.kind = kind.to_string();
            assert!(
                new_entity_candidates(vec![e]).is_empty(),
                "expected {} to be rejected",
                kind
            );
        }
    }

    #[test]
    fn input_order_is_preserved() {
        let candidates = new_entity_candidates(vec![
            person("Ada Lovelace", MENTION_PROPER),
            person("engineer", "COMMON"),
            person("Alan Turing", MENTION_PROPER),
        ]);
        let names: Vec<&str> = candidates.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Ada Lovelace", "Alan Turing"]);
    }
}
