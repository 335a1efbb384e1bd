//! SQLite-backed graph store.
//!
//! All writes are upserts keyed by the deterministic ids of [`crate::models`],
//! so re-indexing a document updates rows in place instead of duplicating
//! them. The change-detection gate ([`Datastore::to_be_indexed`]) is a store
//! query, not an in-memory scan — the corpus may be large.
//!
//! This store assumes a single indexer instance writes a given document's
//! records at a time; upsert-by-derived-key does not serialize concurrent
//! writers. Rows are never deleted here.

use std::path::Path;

use sqlx::{Row, SqlitePool};

use crate::db;
use crate::error::IndexError;
use crate::migrate;
use crate::models::{doc_key, link_key, mention_key};
use crate::models::{BackLink, DocLink, DocReference, Entity, EntityMention};

/// Lookup predicates for entity resolution. Non-empty fields are combined
/// with logical OR; at least one must be set.
#[derive(Debug, Clone, Default)]
pub struct EntityQuery {
    pub name: String,
    pub wikipedia_url: String,
    pub mid: String,
}

#[derive(Clone)]
pub struct Datastore {
    pool: SqlitePool,
}

impl Datastore {
    /// Opens (creating if missing) the database at `path` and ensures the
    /// schema exists.
    pub async fn open(path: &Path) -> anyhow::Result<Self> {
        let pool = db::connect(path).await?;
        migrate::run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn close(self) {
        self.pool.close().await;
    }

    /// Updates or creates the DocReference.
    ///
    /// The primary key is derived from the external id and never
    /// regenerated; an explicit id inconsistent with the derived key is
    /// rejected. Returns the stored record with the id filled in.
    pub async fn upsert_doc_reference(
        &self,
        r: &DocReference,
    ) -> Result<DocReference, IndexError> {
        if r.external_id.is_empty() {
            return Err(IndexError::InvalidArgument(
                "external_id must be set".to_string(),
            ));
        }

        let id = doc_key(&r.external_id);
        if !r.id.is_empty() && r.id != id {
            return Err(IndexError::InvalidArgument(format!(
                "id and external_id are inconsistent; id should be empty or {}",
                id
            )));
        }

        let now = chrono::Utc::now().timestamp();
        sqlx::query(
            r#"
            INSERT INTO doc_references (id, external_id, name, content_type, revision, last_indexed_revision, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                content_type = excluded.content_type,
                revision = excluded.revision,
                last_indexed_revision = excluded.last_indexed_revision,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&id)
        .bind(&r.external_id)
        .bind(&r.name)
        .bind(&r.content_type)
        .bind(&r.revision)
        .bind(&r.last_indexed_revision)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let mut stored = r.clone();
        stored.id = id;
        Ok(stored)
    }

    pub async fn get_doc_reference(&self, id: &str) -> Result<Option<DocReference>, IndexError> {
        let row = sqlx::query(
            "SELECT id, external_id, name, content_type, revision, last_indexed_revision FROM doc_references WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| doc_reference_from_row(&row)))
    }

    pub async fn list_doc_references(&self) -> Result<Vec<DocReference>, IndexError> {
        let rows = sqlx::query(
            "SELECT id, external_id, name, content_type, revision, last_indexed_revision FROM doc_references ORDER BY created_at ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(doc_reference_from_row).collect())
    }

    /// Returns the references that need (re-)indexing: never indexed, or
    /// changed since the last successful pass.
    pub async fn to_be_indexed(&self) -> Result<Vec<DocReference>, IndexError> {
        let rows = sqlx::query(
            r#"
            SELECT id, external_id, name, content_type, revision, last_indexed_revision
            FROM doc_references
            WHERE last_indexed_revision = '' OR revision != last_indexed_revision
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(doc_reference_from_row).collect())
    }

    /// Updates or creates the DocLink.
    ///
    /// The destination is not required — not all links point at corpus
    /// documents. A second occurrence at identical offsets updates the
    /// existing edge rather than duplicating it.
    pub async fn upsert_doc_link(&self, l: &DocLink) -> Result<(), IndexError> {
        if l.source_id.is_empty() {
            return Err(IndexError::InvalidArgument(
                "source_id must be set".to_string(),
            ));
        }

        let id = link_key(l);
        let now = chrono::Utc::now().timestamp();
        sqlx::query(
            r#"
            INSERT INTO doc_links (id, source_id, dest_id, uri, text, start_index, end_index, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                uri = excluded.uri,
                text = excluded.text,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&id)
        .bind(&l.source_id)
        .bind(&l.dest_id)
        .bind(&l.uri)
        .bind(&l.text)
        .bind(l.start_index)
        .bind(l.end_index)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Lists links, optionally filtered to those pointing at `dest_id`.
    pub async fn list_doc_links(&self, dest_id: Option<&str>) -> Result<Vec<DocLink>, IndexError> {
        let rows = match dest_id {
            Some(dest) => {
                sqlx::query(
                    "SELECT source_id, dest_id, uri, text, start_index, end_index FROM doc_links WHERE dest_id = ? ORDER BY created_at ASC, start_index ASC",
                )
                .bind(dest)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    "SELECT source_id, dest_id, uri, text, start_index, end_index FROM doc_links ORDER BY created_at ASC, start_index ASC",
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows
            .iter()
            .map(|row| DocLink {
                source_id: row.get("source_id"),
                dest_id: row.get("dest_id"),
                uri: row.get("uri"),
                text: row.get("text"),
                start_index: row.get("start_index"),
                end_index: row.get("end_index"),
            })
            .collect())
    }

    /// Backlinks of a document: the text and source of every link pointing
    /// at it, in insertion order.
    pub async fn backlinks(&self, dest_id: &str) -> Result<Vec<BackLink>, IndexError> {
        let links = self.list_doc_links(Some(dest_id)).await?;
        Ok(links
            .into_iter()
            .map(|l| BackLink {
                text: l.text,
                doc_id: l.source_id,
            })
            .collect())
    }

    /// Updates or creates the Entity. A missing id defaults to the name
    /// (legacy fallback); resolved entities arrive with UUIDs.
    pub async fn upsert_entity(&self, e: &Entity) -> Result<Entity, IndexError> {
        if e.name.is_empty() {
            return Err(IndexError::InvalidArgument("name is required".to_string()));
        }

        let id = if e.id.is_empty() {
            e.name.clone()
        } else {
            e.id.clone()
        };

        let now = chrono::Utc::now().timestamp();
        sqlx::query(
            r#"
            INSERT INTO entities (id, name, kind, wikipedia_url, mid, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                kind = excluded.kind,
                wikipedia_url = excluded.wikipedia_url,
                mid = excluded.mid,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&id)
        .bind(&e.name)
        .bind(&e.kind)
        .bind(&e.wikipedia_url)
        .bind(&e.mid)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let mut stored = e.clone();
        stored.id = id;
        Ok(stored)
    }

    pub async fn list_entities(&self) -> Result<Vec<Entity>, IndexError> {
        let rows = sqlx::query(
            "SELECT id, name, kind, wikipedia_url, mid FROM entities ORDER BY created_at ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(entity_from_row).collect())
    }

    /// Finds entities matching any of the query's non-empty predicates.
    ///
    /// Results are ordered oldest-first so that first-match resolution is
    /// deterministic. A query with no predicates is a caller error.
    pub async fn find_entities(&self, q: &EntityQuery) -> Result<Vec<Entity>, IndexError> {
        let mut clauses: Vec<&str> = Vec::new();
        let mut binds: Vec<&str> = Vec::new();

        if !q.name.is_empty() {
            clauses.push("name = ?");
            binds.push(&q.name);
        }
        if !q.wikipedia_url.is_empty() {
            clauses.push("wikipedia_url = ?");
            binds.push(&q.wikipedia_url);
        }
        if !q.mid.is_empty() {
            clauses.push("mid = ?");
            binds.push(&q.mid);
        }

        if clauses.is_empty() {
            return Err(IndexError::InvalidArgument(
                "entity query must have at least one predicate".to_string(),
            ));
        }

        let sql = format!(
            "SELECT id, name, kind, wikipedia_url, mid FROM entities WHERE {} ORDER BY created_at ASC, id ASC",
            clauses.join(" OR ")
        );

        let mut query = sqlx::query(&sql);
        for bind in binds {
            query = query.bind(bind);
        }

        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows.iter().map(entity_from_row).collect())
    }

    /// Updates or creates the EntityMention.
    pub async fn upsert_entity_mention(&self, m: &EntityMention) -> Result<(), IndexError> {
        if m.doc_id.is_empty() {
            return Err(IndexError::InvalidArgument(
                "doc_id must be set".to_string(),
            ));
        }

        let id = mention_key(m);
        let now = chrono::Utc::now().timestamp();
        sqlx::query(
            r#"
            INSERT INTO entity_mentions (id, doc_id, entity_id, text, start_index, end_index, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                text = excluded.text,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&id)
        .bind(&m.doc_id)
        .bind(&m.entity_id)
        .bind(&m.text)
        .bind(m.start_index)
        .bind(m.end_index)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Lists mentions, optionally filtered to one document.
    pub async fn list_entity_mentions(
        &self,
        doc_id: Option<&str>,
    ) -> Result<Vec<EntityMention>, IndexError> {
        let rows = match doc_id {
            Some(doc) => {
                sqlx::query(
                    "SELECT doc_id, entity_id, text, start_index, end_index FROM entity_mentions WHERE doc_id = ? ORDER BY start_index ASC",
                )
                .bind(doc)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    "SELECT doc_id, entity_id, text, start_index, end_index FROM entity_mentions ORDER BY doc_id ASC, start_index ASC",
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows
            .iter()
            .map(|row| EntityMention {
                doc_id: row.get("doc_id"),
                entity_id: row.get("entity_id"),
                text: row.get("text"),
                start_index: row.get("start_index"),
                end_index: row.get("end_index"),
            })
            .collect())
    }
}

fn doc_reference_from_row(row: &sqlx::sqlite::SqliteRow) -> DocReference {
    DocReference {
        id: row.get("id"),
        external_id: row.get("external_id"),
        name: row.get("name"),
        content_type: row.get("content_type"),
        revision: row.get("revision"),
        last_indexed_revision: row.get("last_indexed_revision"),
    }
}

fn entity_from_row(row: &sqlx::sqlite::SqliteRow) -> Entity {
    Entity {
        id: row.get("id"),
        name: row.get("name"),
        kind: row.get("kind"),
        wikipedia_url: row.get("wikipedia_url"),
        mid: row.get("mid"),
    }
}
