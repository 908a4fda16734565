//! SQLite-backed author/work store with a token index.
//!
//! Works live in `contents`, unique on `(author_id, title_id)`. Each work's
//! segmented text is stored in the FTS5 table `contents_fts` with its rowid
//! set to the work's `id`, so a token match joins straight back to the work
//! and its author. `id` is an `INTEGER PRIMARY KEY` and survives `VACUUM`.
//!
//! | Method | Purpose |
//! |--------|---------|
//! | [`put`](IndexStore::put) | Upsert author + work, replace the work's postings |
//! | [`query`](IndexStore::query) | Works containing every token of the query |
//! | [`get`](IndexStore::get) | Full text of one work |
//! | [`authors`](IndexStore::authors) | All authors |
//! | [`titles`](IndexStore::titles) | Works of one author |

use anyhow::Context;
use sqlx::{Row, SqlitePool};

use crate::config::Config;
use crate::error::{HarvestError, HarvestResult};
use crate::models::{Author, Entry, QueryHit, Title};
use crate::tokenizer::{self, Segmenter};
use crate::{db, migrate};

pub struct IndexStore {
    pool: SqlitePool,
    segmenter: Box<dyn Segmenter>,
}

impl IndexStore {
    /// The schema must already exist; see [`crate::migrate::ensure_schema`].
    pub fn new(pool: SqlitePool, segmenter: Box<dyn Segmenter>) -> Self {
        Self { pool, segmenter }
    }

    /// Connect to the configured database, create the schema if needed, and
    /// build the configured segmenter.
    pub async fn open(config: &Config) -> anyhow::Result<Self> {
        let pool = db::connect(config)
            .await
            .with_context(|| format!("Failed to open database {}", config.db.path.display()))?;
        migrate::ensure_schema(&pool).await?;
        let segmenter = tokenizer::from_config(&config.tokenizer)?;
        Ok(Self::new(pool, segmenter))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Store `text` as the body of `entry`, replacing any previous version.
    ///
    /// The author row, the contents row, and the postings are written in
    /// one transaction: on error nothing of this call is visible.
    pub async fn put(&self, entry: &Entry, text: &str) -> HarvestResult<()> {
        let words = self.segmenter.segment(text)?.join(" ");

        self.write_entry(entry, text, &words)
            .await
            .map_err(|source| HarvestError::StoreWrite {
                author_id: entry.author_id.clone(),
                title_id: entry.title_id.clone(),
                source,
            })
    }

    async fn write_entry(&self, entry: &Entry, text: &str, words: &str) -> sqlx::Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO authors (author_id, author) VALUES (?, ?)
            ON CONFLICT(author_id) DO UPDATE SET author = excluded.author
            "#,
        )
        .bind(&entry.author_id)
        .bind(&entry.author)
        .execute(&mut *tx)
        .await?;

        // DO UPDATE keeps the id stable, so the old postings can be found.
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO contents (author_id, title_id, title, content) VALUES (?, ?, ?, ?)
            ON CONFLICT(author_id, title_id) DO UPDATE SET
                title = excluded.title,
                content = excluded.content
            RETURNING id
            "#,
        )
        .bind(&entry.author_id)
        .bind(&entry.title_id)
        .bind(&entry.title)
        .bind(text)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM contents_fts WHERE rowid = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("INSERT INTO contents_fts (rowid, words) VALUES (?, ?)")
            .bind(id)
            .bind(words)
            .execute(&mut *tx)
            .await?;

        tx.commit().await
    }

    /// Works whose postings contain every token of `text`.
    ///
    /// Row order is whatever the index yields.
    pub async fn query(&self, text: &str) -> HarvestResult<Vec<QueryHit>> {
        let tokens = self.segmenter.segment(text)?;
        let Some(expr) = match_expression(&tokens) else {
            return Ok(Vec::new());
        };

        let rows = sqlx::query(
            r#"
            SELECT a.author_id, a.author, c.title_id, c.title
            FROM contents_fts f
            INNER JOIN contents c ON c.id = f.rowid
            INNER JOIN authors a ON a.author_id = c.author_id
            WHERE contents_fts MATCH ?
            "#,
        )
        .bind(expr)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| QueryHit {
                author_id: row.get("author_id"),
                author: row.get("author"),
                title_id: row.get("title_id"),
                title: row.get("title"),
            })
            .collect())
    }

    /// Full text of a stored work.
    pub async fn get(&self, author_id: &str, title_id: &str) -> HarvestResult<String> {
        let content: Option<String> =
            sqlx::query_scalar("SELECT content FROM contents WHERE author_id = ? AND title_id = ?")
                .bind(author_id)
                .bind(title_id)
                .fetch_optional(&self.pool)
                .await?;

        content.ok_or_else(|| HarvestError::NotFound {
            author_id: author_id.to_string(),
            title_id: title_id.to_string(),
        })
    }

    pub async fn authors(&self) -> HarvestResult<Vec<Author>> {
        let rows = sqlx::query("SELECT author_id, author FROM authors ORDER BY author_id")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(|row| Author {
                author_id: row.get("author_id"),
                author: row.get("author"),
            })
            .collect())
    }

    pub async fn titles(&self, author_id: &str) -> HarvestResult<Vec<Title>> {
        let rows = sqlx::query(
            "SELECT author_id, title_id, title FROM contents WHERE author_id = ? ORDER BY title_id",
        )
        .bind(author_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| Title {
                author_id: row.get("author_id"),
                title_id: row.get("title_id"),
                title: row.get("title"),
            })
            .collect())
    }
}

/// FTS5 expression requiring every token: each token becomes a quoted
/// string so FTS syntax characters in the text are taken literally.
///
/// Tokens without any letter or digit (punctuation) index as nothing and
/// are left out. `None` when no searchable token remains.
fn match_expression(tokens: &[String]) -> Option<String> {
    let terms: Vec<String> = tokens
        .iter()
        .filter(|t| t.chars().any(char::is_alphanumeric))
        .map(|t| format!("\"{}\"", t.replace('"', "\"\"")))
        .collect();

    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" "))
    }
}
