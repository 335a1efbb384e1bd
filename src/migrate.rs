use anyhow::Result;
use sqlx::SqlitePool;

/// Creates the graph schema. Idempotent; safe to run on every startup.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    // Document references
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS doc_references (
            id TEXT PRIMARY KEY,
            external_id TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL DEFAULT '',
            content_type TEXT NOT NULL DEFAULT '',
            revision TEXT NOT NULL DEFAULT '',
            last_indexed_revision TEXT NOT NULL DEFAULT '',
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Directed links between documents
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS doc_links (
            id TEXT PRIMARY KEY,
            source_id TEXT NOT NULL,
            dest_id TEXT NOT NULL DEFAULT '',
            uri TEXT NOT NULL DEFAULT '',
            text TEXT NOT NULL DEFAULT '',
            start_index INTEGER NOT NULL,
            end_index INTEGER NOT NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Canonical entities
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS entities (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            kind TEXT NOT NULL DEFAULT '',
            wikipedia_url TEXT NOT NULL DEFAULT '',
            mid TEXT NOT NULL DEFAULT '',
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Entity mentions within documents
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS entity_mentions (
            id TEXT PRIMARY KEY,
            doc_id TEXT NOT NULL,
            entity_id TEXT NOT NULL DEFAULT '',
            text TEXT NOT NULL DEFAULT '',
            start_index INTEGER NOT NULL,
            end_index INTEGER NOT NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_doc_links_source_id ON doc_links(source_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_doc_links_dest_id ON doc_links(dest_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_entities_name ON entities(name)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_entity_mentions_doc_id ON entity_mentions(doc_id)")
        .execute(pool)
        .await?;

    Ok(())
}
