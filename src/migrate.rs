use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    ensure_schema(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Create the authors, contents, and token index tables if absent.
pub async fn ensure_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS authors (
            author_id TEXT NOT NULL PRIMARY KEY,
            author TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // `id` is the FTS rowid of the work's postings; an INTEGER PRIMARY KEY is
    // never renumbered by VACUUM.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS contents (
            id INTEGER PRIMARY KEY,
            author_id TEXT NOT NULL,
            title_id TEXT NOT NULL,
            title TEXT NOT NULL,
            content TEXT NOT NULL,
            UNIQUE (author_id, title_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // FTS5 CREATE is not idempotent natively, so we check first
    let fts_exists: bool = sqlx::query_scalar(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='contents_fts'",
    )
    .fetch_one(pool)
    .await?;

    if !fts_exists {
        // Tokens arrive pre-segmented and space-joined; unicode61 only splits on
        // the spaces and must not fold kana voicing marks.
        sqlx::query(
            r#"
            CREATE VIRTUAL TABLE contents_fts USING fts5(
                words,
                tokenize = 'unicode61 remove_diacritics 0'
            )
            "#,
        )
        .execute(pool)
        .await?;
    }

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_contents_author_id ON contents(author_id)")
        .execute(pool)
        .await?;

    Ok(())
}
