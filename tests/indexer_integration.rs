//! End-to-end pipeline tests over fake collaborators and a tempfile-backed
//! SQLite store.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tempfile::TempDir;

use docgraph::document::{
    Document, Paragraph, ParagraphElement, StructuralNode, TextRun,
};
use docgraph::entities::{resolve_entity, RawEntity, RawMention};
use docgraph::error::IndexError;
use docgraph::indexer::{
    CorpusSearch, DocumentFetcher, EntityAnalyzer, Indexer, DOCUMENT_MIME_TYPE,
};
use docgraph::models::DiscoveredDoc;
use docgraph::store::Datastore;

/// In-memory corpus listing.
struct FakeSearch {
    docs: Vec<DiscoveredDoc>,
}

#[async_trait]
impl CorpusSearch for FakeSearch {
    async fn search(
        &self,
        _query: &str,
        _corpus_id: &str,
        _corpora: &str,
        on_result: &mut (dyn FnMut(DiscoveredDoc) -> Result<(), IndexError> + Send),
    ) -> Result<(), IndexError> {
        for d in &self.docs {
            on_result(d.clone())?;
        }
        Ok(())
    }
}

/// In-memory document fetch; ids in `fail` simulate revoked access.
#[derive(Default)]
struct FakeFetcher {
    docs: HashMap<String, Document>,
    fail: HashSet<String>,
}

#[async_trait]
impl DocumentFetcher for FakeFetcher {
    async fn get_document(&self, external_id: &str) -> Result<Document, IndexError> {
        if self.fail.contains(external_id) {
            return Err(IndexError::AccessDenied(external_id.to_string()));
        }
        self.docs
            .get(external_id)
            .cloned()
            .ok_or_else(|| IndexError::NotFound(external_id.to_string()))
    }
}

/// Returns the same raw entities for any text; `fail` simulates an outage.
#[derive(Default)]
struct FakeAnalyzer {
    entities: Vec<RawEntity>,
    fail: bool,
}

#[async_trait]
impl EntityAnalyzer for FakeAnalyzer {
    async fn analyze_entities(&self, _text: &str) -> Result<Vec<RawEntity>, IndexError> {
        if self.fail {
            return Err(IndexError::AccessDenied("analysis unavailable".to_string()));
        }
        Ok(self.entities.clone())
    }
}

fn discovered(id: &str, revision: &str) -> DiscoveredDoc {
    DiscoveredDoc {
        id: id.to_string(),
        name: format!("doc {}", id),
        content_type: DOCUMENT_MIME_TYPE.to_string(),
        revision: revision.to_string(),
    }
}

fn link_paragraph(text: &str, url: &str, start: i64, end: i64) -> StructuralNode {
    StructuralNode::Paragraph(Paragraph {
        elements: vec![ParagraphElement {
            start_index: start,
            end_index: end,
            text_run: Some(TextRun {
                content: text.to_string(),
                link_url: Some(url.to_string()),
            }),
            rich_link: None,
        }],
    })
}

fn simple_doc(id: &str, revision: &str, body: Vec<StructuralNode>) -> Document {
    Document {
        document_id: id.to_string(),
        title: format!("doc {}", id),
        revision_id: revision.to_string(),
        body,
    }
}

fn proper_person(name: &str, start: i64, end: i64) -> RawEntity {
    RawEntity {
        name: name.to_string(),
        kind: "PERSON".to_string(),
        mentions: vec![RawMention {
            text: name.to_string(),
            start_index: start,
            end_index: end,
            kind: "PROPER".to_string(),
        }],
        ..Default::default()
    }
}

async fn test_store() -> (TempDir, Datastore) {
    let tmp = TempDir::new().unwrap();
    let store = Datastore::open(&tmp.path().join("graph.db")).await.unwrap();
    (tmp, store)
}

#[tokio::test]
async fn index_commits_documents_and_links() {
    let (_tmp, store) = test_store().await;

    let searcher = FakeSearch {
        docs: vec![discovered("one", "r1"), discovered("two", "r1")],
    };
    let fetcher = FakeFetcher {
        docs: HashMap::from([
            (
                "one".to_string(),
                simple_doc(
                    "one",
                    "r1",
                    vec![
                        link_paragraph(
                            "Link to doc two",
                            "https://docs.google.com/document/d/two/edit",
                            51,
                            74,
                        ),
                        link_paragraph(
                            "same target again",
                            "https://docs.google.com/document/d/two/edit",
                            97,
                            98,
                        ),
                        link_paragraph("external", "https://example.com/page", 120, 128),
                    ],
                ),
            ),
            ("two".to_string(), simple_doc("two", "r1", vec![])),
        ]),
        ..Default::default()
    };

    let indexer = Indexer::new(searcher, fetcher, FakeAnalyzer::default(), store);
    let report = indexer.index("someDrive").await.unwrap();

    assert_eq!(report.discovered, 2);
    assert_eq!(report.indexed, vec!["gdrive.one", "gdrive.two"]);
    assert!(report.failed.is_empty());

    let links = indexer.store().list_doc_links(None).await.unwrap();
    assert_eq!(links.len(), 3);
    // Two distinct edges to the same destination (different offsets).
    let to_two: Vec<_> = links.iter().filter(|l| l.dest_id == "gdrive.two").collect();
    assert_eq!(to_two.len(), 2);
    assert_eq!(to_two[0].source_id, "gdrive.one");
    // A non-corpus target persists with an empty destination.
    let external: Vec<_> = links.iter().filter(|l| l.dest_id.is_empty()).collect();
    assert_eq!(external.len(), 1);
    assert_eq!(external[0].uri, "https://example.com/page");

    // Both documents committed: version markers advanced, nothing pending.
    assert!(indexer.store().to_be_indexed().await.unwrap().is_empty());

    let backlinks = indexer.store().backlinks("gdrive.two").await.unwrap();
    assert_eq!(backlinks.len(), 2);
    assert_eq!(backlinks[0].text, "Link to doc two");
    assert_eq!(backlinks[0].doc_id, "gdrive.one");
}

#[tokio::test]
async fn second_run_over_unchanged_corpus_processes_nothing() {
    let (_tmp, store) = test_store().await;

    let fetcher = FakeFetcher {
        docs: HashMap::from([(
            "one".to_string(),
            simple_doc(
                "one",
                "r1",
                vec![link_paragraph(
                    "self-ish",
                    "https://docs.google.com/document/d/two/edit",
                    0,
                    8,
                )],
            ),
        )]),
        ..Default::default()
    };

    let indexer = Indexer::new(
        FakeSearch {
            docs: vec![discovered("one", "r1")],
        },
        fetcher,
        FakeAnalyzer::default(),
        store,
    );

    let first = indexer.index("someDrive").await.unwrap();
    assert_eq!(first.indexed.len(), 1);

    // Re-discovery must not clobber the committed marker.
    let second = indexer.index("someDrive").await.unwrap();
    assert!(second.indexed.is_empty());
    assert!(second.failed.is_empty());

    let links = indexer.store().list_doc_links(None).await.unwrap();
    assert_eq!(links.len(), 1);
}

#[tokio::test]
async fn repeated_single_document_indexing_is_idempotent() {
    let (_tmp, store) = test_store().await;

    let fetcher = FakeFetcher {
        docs: HashMap::from([(
            "one".to_string(),
            simple_doc(
                "one",
                "r1",
                vec![link_paragraph(
                    "Link",
                    "https://docs.google.com/document/d/two/edit",
                    10,
                    14,
                )],
            ),
        )]),
        ..Default::default()
    };
    let analyzer = FakeAnalyzer {
        entities: vec![proper_person("Ada Lovelace", 4, 16)],
        ..Default::default()
    };

    let indexer = Indexer::new(FakeSearch { docs: vec![] }, fetcher, analyzer, store);

    indexer.index_document("one").await.unwrap();
    indexer.index_document("one").await.unwrap();

    assert_eq!(indexer.store().list_doc_links(None).await.unwrap().len(), 1);
    assert_eq!(
        indexer
            .store()
            .list_entity_mentions(Some("gdrive.one"))
            .await
            .unwrap()
            .len(),
        1
    );
    assert_eq!(indexer.store().list_entities().await.unwrap().len(), 1);
}

#[tokio::test]
async fn one_failing_document_does_not_abort_the_batch() {
    let (_tmp, store) = test_store().await;

    let searcher = FakeSearch {
        docs: vec![
            discovered("one", "r1"),
            discovered("two", "r1"),
            discovered("three", "r1"),
        ],
    };
    let fetcher = FakeFetcher {
        docs: HashMap::from([
            ("one".to_string(), simple_doc("one", "r1", vec![])),
            ("three".to_string(), simple_doc("three", "r1", vec![])),
        ]),
        fail: HashSet::from(["two".to_string()]),
    };

    let indexer = Indexer::new(searcher, fetcher, FakeAnalyzer::default(), store);
    let report = indexer.index("someDrive").await.unwrap();

    assert_eq!(report.indexed, vec!["gdrive.one", "gdrive.three"]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].doc_id, "gdrive.two");
    assert!(matches!(report.failed[0].error, IndexError::AccessDenied(_)));

    // The failed document's markers are untouched: still eligible next run.
    let pending = indexer.store().to_be_indexed().await.unwrap();
    let ids: Vec<&str> = pending.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["gdrive.two"]);
}

#[tokio::test]
async fn entity_mentions_are_persisted_and_deduplicated_across_documents() {
    let (_tmp, store) = test_store().await;

    let searcher = FakeSearch {
        docs: vec![discovered("one", "r1"), discovered("two", "r1")],
    };
    let fetcher = FakeFetcher {
        docs: HashMap::from([
            (
                "one".to_string(),
                simple_doc(
                    "one",
                    "r1",
                    vec![StructuralNode::Paragraph(Paragraph::text(
                        "Ada Lovelace wrote the first program.",
                    ))],
                ),
            ),
            (
                "two".to_string(),
                simple_doc(
                    "two",
                    "r1",
                    vec![StructuralNode::Paragraph(Paragraph::text(
                        "Ada Lovelace appears here too.",
                    ))],
                ),
            ),
        ]),
        ..Default::default()
    };
    // A trackable person plus a date the filter must reject.
    let analyzer = FakeAnalyzer {
        entities: vec![
            proper_person("Ada Lovelace", 0, 12),
            RawEntity {
                name: "1843".to_string(),
                kind: "DATE".to_string(),
                mentions: vec![RawMention {
                    text: "1843".to_string(),
                    start_index: 20,
                    end_index: 24,
                    kind: "PROPER".to_string(),
                }],
                ..Default::default()
            },
        ],
        ..Default::default()
    };

    let indexer = Indexer::new(searcher, fetcher, analyzer, store);
    let report = indexer.index("someDrive").await.unwrap();
    assert!(report.is_clean());

    // One canonical entity, resolved to the same id from both documents.
    let entities = indexer.store().list_entities().await.unwrap();
    assert_eq!(entities.len(), 1);
    assert_eq!(entities[0].name, "Ada Lovelace");

    let mentions = indexer.store().list_entity_mentions(None).await.unwrap();
    assert_eq!(mentions.len(), 2);
    assert!(mentions.iter().all(|m| m.entity_id == entities[0].id));
}

#[tokio::test]
async fn entity_analysis_failure_still_commits_the_document() {
    let (_tmp, store) = test_store().await;

    let fetcher = FakeFetcher {
        docs: HashMap::from([(
            "one".to_string(),
            simple_doc(
                "one",
                "r1",
                vec![
                    StructuralNode::Paragraph(Paragraph::text("some text ")),
                    link_paragraph(
                        "Link",
                        "https://docs.google.com/document/d/two/edit",
                        10,
                        14,
                    ),
                ],
            ),
        )]),
        ..Default::default()
    };
    let analyzer = FakeAnalyzer {
        fail: true,
        ..Default::default()
    };

    let indexer = Indexer::new(
        FakeSearch {
            docs: vec![discovered("one", "r1")],
        },
        fetcher,
        analyzer,
        store,
    );

    let report = indexer.index("someDrive").await.unwrap();
    assert_eq!(report.indexed, vec!["gdrive.one"]);
    assert_eq!(report.degraded, vec!["gdrive.one"]);
    assert!(report.failed.is_empty());

    // Links committed earlier in the pass remain valid, and the version
    // marker advanced despite the entity failure.
    assert_eq!(indexer.store().list_doc_links(None).await.unwrap().len(), 1);
    assert!(indexer.store().to_be_indexed().await.unwrap().is_empty());
}

#[tokio::test]
async fn non_document_items_are_skipped() {
    let (_tmp, store) = test_store().await;

    let searcher = FakeSearch {
        docs: vec![
            discovered("one", "r1"),
            DiscoveredDoc {
                id: "sheet".to_string(),
                name: "a spreadsheet".to_string(),
                content_type: "application/vnd.google-apps.spreadsheet".to_string(),
                revision: "r1".to_string(),
            },
        ],
    };
    let fetcher = FakeFetcher {
        docs: HashMap::from([("one".to_string(), simple_doc("one", "r1", vec![]))]),
        ..Default::default()
    };

    let indexer = Indexer::new(searcher, fetcher, FakeAnalyzer::default(), store);
    let report = indexer.index("someDrive").await.unwrap();

    assert_eq!(report.indexed, vec!["gdrive.one"]);
    assert_eq!(report.skipped, vec!["gdrive.sheet"]);
}

#[tokio::test]
async fn resolve_entity_is_first_match_wins() {
    let (_tmp, store) = test_store().await;

    let first = resolve_entity(&proper_person("Grace Hopper", 0, 12), &store)
        .await
        .unwrap();
    let second = resolve_entity(&proper_person("Grace Hopper", 30, 42), &store)
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(store.list_entities().await.unwrap().len(), 1);
}
