//! Indexing orchestration.
//!
//! Coordinates the full pipeline per document: fetch → link extraction →
//! reference resolution → entity extraction/resolution → persistence →
//! version-marker advance. One document's failure never aborts the batch;
//! its version marker stays put, so it remains eligible on the next run.
//! Each stage persists independently — there is no cross-stage transaction,
//! and a degraded index (some links or entities missing) is preferred over
//! a failed one.
//!
//! Documents are processed strictly sequentially within one [`Indexer::index`]
//! call. Concurrent indexing of the same document from two processes is not
//! supported; callers must serialize it externally.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::document::Document;
use crate::entities::{new_entity_candidates, resolve_entity, RawEntity};
use crate::error::IndexError;
use crate::extract::{read_links, read_text};
use crate::models::{doc_key, DiscoveredDoc, DocLink, DocReference, EntityMention};
use crate::reference::parse_doc_uri;
use crate::store::Datastore;

/// MIME type of indexable documents; other corpus items are skipped.
pub const DOCUMENT_MIME_TYPE: &str = "application/vnd.google-apps.document";

/// Lists documents in a corpus.
///
/// `on_result` is invoked once per discovered item, in listing order; an
/// error from it aborts the remaining pages and propagates. Implementations
/// paginate internally.
#[async_trait]
pub trait CorpusSearch: Send + Sync {
    async fn search(
        &self,
        query: &str,
        corpus_id: &str,
        corpora: &str,
        on_result: &mut (dyn FnMut(DiscoveredDoc) -> Result<(), IndexError> + Send),
    ) -> Result<(), IndexError>;
}

/// Fetches a document's content tree and revision identifier.
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn get_document(&self, external_id: &str) -> Result<Document, IndexError>;
}

/// Runs named-entity extraction over plain text.
#[async_trait]
pub trait EntityAnalyzer: Send + Sync {
    async fn analyze_entities(&self, text: &str) -> Result<Vec<RawEntity>, IndexError>;
}

/// One document that failed during a batch run.
#[derive(Debug)]
pub struct DocFailure {
    pub doc_id: String,
    pub error: IndexError,
}

/// Outcome of one `index` run.
///
/// Per-document failures land here instead of aborting the batch, so
/// callers (and tests) can see exactly which documents failed and why.
#[derive(Debug, Default)]
pub struct IndexReport {
    /// Items discovered during the listing phase.
    pub discovered: usize,
    /// Documents that completed through commit.
    pub indexed: Vec<String>,
    /// Committed documents whose entity stage failed this pass.
    pub degraded: Vec<String>,
    /// Items skipped because they are not indexable documents.
    pub skipped: Vec<String>,
    /// Documents abandoned mid-pipeline; still eligible next run.
    pub failed: Vec<DocFailure>,
}

impl IndexReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.degraded.is_empty()
    }
}

/// Indexes a document corpus into the graph store.
pub struct Indexer<S, F, A> {
    searcher: S,
    fetcher: F,
    analyzer: A,
    store: Datastore,
}

impl<S, F, A> Indexer<S, F, A>
where
    S: CorpusSearch,
    F: DocumentFetcher,
    A: EntityAnalyzer,
{
    pub fn new(searcher: S, fetcher: F, analyzer: A, store: Datastore) -> Self {
        Self {
            searcher,
            fetcher,
            analyzer,
            store,
        }
    }

    pub fn store(&self) -> &Datastore {
        &self.store
    }

    /// Indexes every new or changed document in the corpus.
    ///
    /// Discovery failures (listing, reference upsert) are fatal — the batch
    /// cannot proceed without a document list. Everything after that is
    /// per-document and recorded in the report.
    pub async fn index(&self, corpus_id: &str) -> Result<IndexReport, IndexError> {
        info!(corpus_id, "indexing corpus");

        let mut discovered: Vec<DiscoveredDoc> = Vec::new();
        self.searcher
            .search("", corpus_id, "drive", &mut |item| {
                discovered.push(item);
                Ok(())
            })
            .await?;

        let mut report = IndexReport {
            discovered: discovered.len(),
            ..Default::default()
        };

        for item in &discovered {
            self.store
                .upsert_doc_reference(&DocReference {
                    external_id: item.id.clone(),
                    name: item.name.clone(),
                    content_type: item.content_type.clone(),
                    revision: item.revision.clone(),
                    // Preserved by the gate: a fresh row has an empty
                    // last-indexed marker and is selected; an existing row
                    // keeps whatever the last pass committed.
                    last_indexed_revision: self
                        .last_indexed_revision(&doc_key(&item.id))
                        .await?,
                    ..Default::default()
                })
                .await?;
        }

        let pending = self.store.to_be_indexed().await?;

        for r in pending {
            if r.content_type != DOCUMENT_MIME_TYPE {
                debug!(doc_id = %r.id, content_type = %r.content_type, "skipping; not an indexable document");
                report.skipped.push(r.id.clone());
                continue;
            }

            match self.index_reference(&r).await {
                Ok(entities_ok) => {
                    report.indexed.push(r.id.clone());
                    if !entities_ok {
                        report.degraded.push(r.id.clone());
                    }
                }
                Err(error) => {
                    warn!(doc_id = %r.id, %error, "abandoning document; will retry next run");
                    report.failed.push(DocFailure {
                        doc_id: r.id.clone(),
                        error,
                    });
                }
            }
        }

        info!(
            discovered = report.discovered,
            indexed = report.indexed.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "corpus indexing finished"
        );
        Ok(report)
    }

    /// Indexes exactly one document, bypassing corpus discovery.
    ///
    /// The reference is created or refreshed from the fetched document, so
    /// the id does not need to be known to the store beforehand.
    pub async fn index_document(&self, external_id: &str) -> Result<(), IndexError> {
        let doc = self.fetcher.get_document(external_id).await?;

        let r = self
            .store
            .upsert_doc_reference(&DocReference {
                external_id: external_id.to_string(),
                name: doc.title.clone(),
                content_type: DOCUMENT_MIME_TYPE.to_string(),
                revision: doc.revision_id.clone(),
                last_indexed_revision: self
                    .last_indexed_revision(&doc_key(external_id))
                    .await?,
                ..Default::default()
            })
            .await?;

        let entities_ok = self.index_fetched(&r, &doc).await?;
        if !entities_ok {
            warn!(doc_id = %r.id, "document committed without entities for this pass");
        }
        Ok(())
    }

    async fn last_indexed_revision(&self, id: &str) -> Result<String, IndexError> {
        Ok(self
            .store
            .get_doc_reference(id)
            .await?
            .map(|existing| existing.last_indexed_revision)
            .unwrap_or_default())
    }

    /// Fetches and indexes one known reference. Returns whether the entity
    /// stage succeeded; a fetch or commit failure is the document's error.
    async fn index_reference(&self, r: &DocReference) -> Result<bool, IndexError> {
        let doc = self.fetcher.get_document(&r.external_id).await?;
        self.index_fetched(r, &doc).await
    }

    /// Runs the post-fetch stages and commits the version marker.
    async fn index_fetched(&self, r: &DocReference, doc: &Document) -> Result<bool, IndexError> {
        self.process_links(r, doc).await;
        let entities_ok = self.process_entities(r, doc).await;

        // Commit: advance both markers to the fetched revision. Only now
        // does the document stop being selected by the change gate.
        let mut committed = r.clone();
        committed.revision = doc.revision_id.clone();
        committed.last_indexed_revision = doc.revision_id.clone();
        self.store.upsert_doc_reference(&committed).await?;

        Ok(entities_ok)
    }

    /// Extracts and persists the document's links. Per-link failures are
    /// logged and skipped; the link is simply not recorded this pass.
    async fn process_links(&self, r: &DocReference, doc: &Document) {
        for link in read_links(doc) {
            let dest_id = match parse_doc_uri(&link.url) {
                Ok(Some(doc_uri)) => doc_key(&doc_uri.id),
                Ok(None) => String::new(),
                Err(error) => {
                    warn!(doc_id = %r.id, url = %link.url, %error, "failed to parse link target; skipping link");
                    continue;
                }
            };

            let doc_link = DocLink {
                source_id: r.id.clone(),
                dest_id,
                uri: link.url,
                text: link.text,
                start_index: link.start_index,
                end_index: link.end_index,
            };

            if let Err(error) = self.store.upsert_doc_link(&doc_link).await {
                warn!(doc_id = %r.id, uri = %doc_link.uri, %error, "failed to persist link");
            }
        }
    }

    /// Extracts, resolves, and persists the document's entity mentions.
    /// Returns false when the analysis call itself failed; the caller still
    /// commits — links already persisted this pass remain valid.
    async fn process_entities(&self, r: &DocReference, doc: &Document) -> bool {
        let text = read_text(doc);
        if text.trim().is_empty() {
            return true;
        }

        let raw = match self.analyzer.analyze_entities(&text).await {
            Ok(raw) => raw,
            Err(error) => {
                warn!(doc_id = %r.id, %error, "entity extraction failed; committing without entities");
                return false;
            }
        };

        for candidate in new_entity_candidates(raw) {
            let entity = match resolve_entity(&candidate, &self.store).await {
                Ok(entity) => entity,
                Err(error) => {
                    warn!(doc_id = %r.id, name = %candidate.name, %error, "failed to resolve entity; skipping");
                    continue;
                }
            };

            for mention in &candidate.mentions {
                let m = EntityMention {
                    doc_id: r.id.clone(),
                    entity_id: entity.id.clone(),
                    text: mention.text.clone(),
                    start_index: mention.start_index,
                    end_index: mention.end_index,
                };
                if let Err(error) = self.store.upsert_entity_mention(&m).await {
                    warn!(doc_id = %r.id, entity = %entity.id, %error, "failed to persist mention");
                }
            }
        }

        true
    }
}
