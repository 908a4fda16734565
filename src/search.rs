//! Read-side CLI commands: `authors`, `titles`, and `query`.

use anyhow::Result;

use crate::config::Config;
use crate::models::{Author, QueryHit, Title};
use crate::store::IndexStore;

pub async fn run_authors(config: &Config) -> Result<()> {
    let store = IndexStore::open(config).await?;
    for author in store.authors().await? {
        println!("{}", format_author(&author));
    }
    store.pool().close().await;
    Ok(())
}

pub async fn run_titles(config: &Config, author_id: &str) -> Result<()> {
    let store = IndexStore::open(config).await?;
    for title in store.titles(author_id).await? {
        println!("{}", format_title(&title));
    }
    store.pool().close().await;
    Ok(())
}

pub async fn run_query(config: &Config, query: &str) -> Result<()> {
    if query.trim().is_empty() {
        println!("No results.");
        return Ok(());
    }

    let store = IndexStore::open(config).await?;
    let hits = store.query(query).await?;
    if hits.is_empty() {
        println!("No results.");
    }
    for hit in &hits {
        println!("{}", format_hit(hit));
    }
    store.pool().close().await;
    Ok(())
}

fn format_author(author: &Author) -> String {
    format!("Author ID: {}, Author: {}", author.author_id, author.author)
}

fn format_title(title: &Title) -> String {
    format!(
        "Author ID: {}, Title ID: {}, Title: {}",
        title.author_id, title.title_id, title.title
    )
}

fn format_hit(hit: &QueryHit) -> String {
    format!(
        "{} {:>5}: {} ({})",
        hit.author_id, hit.title_id, hit.title, hit.author
    )
}
