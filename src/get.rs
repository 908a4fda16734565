//! Work retrieval by `(author_id, title_id)`, for `aozora content`.

use anyhow::Result;

use crate::config::Config;
use crate::store::IndexStore;

/// Print the stored text of one work. A missing work is an error.
pub async fn run_content(config: &Config, author_id: &str, title_id: &str) -> Result<()> {
    let store = IndexStore::open(config).await?;
    let content = store.get(author_id, title_id).await;
    store.pool().close().await;

    println!("{}", content?);
    Ok(())
}
