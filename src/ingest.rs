//! Collection pipeline orchestration.
//!
//! Runs discovery over each listing page, then processes entries one at a
//! time: extract archive text → segment → store. Only a listing page
//! failure or a store connection failure aborts the run; a bad archive or a
//! failed write is logged and the next entry proceeds.

use anyhow::{Context, Result};
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::discover::Discoverer;
use crate::error::HarvestResult;
use crate::extract::Extractor;
use crate::fetch::HttpFetcher;
use crate::models::Entry;
use crate::progress::{CollectProgressEvent, CollectProgressReporter, ProgressMode};
use crate::store::IndexStore;

/// Outcome counts of one ingestion pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectSummary {
    pub stored: u64,
    pub failed: u64,
}

pub async fn run_collect(
    config: &Config,
    listing_urls: Vec<String>,
    limit: Option<usize>,
    dry_run: bool,
    progress: ProgressMode,
) -> Result<()> {
    let listing_urls = if listing_urls.is_empty() {
        config.crawler.listing_urls.clone()
    } else {
        listing_urls
    };
    if listing_urls.is_empty() {
        anyhow::bail!("No listing URLs given and none configured in [crawler].listing_urls");
    }

    // Open the store before crawling so a bad database fails fast.
    let store = if dry_run {
        None
    } else {
        Some(IndexStore::open(config).await?)
    };

    let fetcher = HttpFetcher::new(&config.crawler)?;
    let reporter = progress.reporter();
    let discoverer = Discoverer::new(&fetcher, config.crawler.detail_url_template.clone());

    let entries = discover_all(&discoverer, &listing_urls, limit, reporter.as_ref()).await?;
    info!(entries = entries.len(), "found entries");

    let Some(store) = store else {
        println!("collect (dry-run)");
        for entry in &entries {
            println!(
                "  {} {:>5}: {} ({}) {}",
                entry.author_id, entry.title_id, entry.title, entry.author, entry.zip_url
            );
        }
        println!("  entries found: {}", entries.len());
        return Ok(());
    };

    let extractor = Extractor::new(&fetcher, config.crawler.max_archive_bytes);
    let summary = ingest_entries(&extractor, &store, &entries, reporter.as_ref()).await;

    println!("collect");
    println!("  listings: {}", listing_urls.len());
    println!("  entries found: {}", entries.len());
    println!("  stored: {}", summary.stored);
    println!("  failed: {}", summary.failed);
    println!("ok");

    store.pool().close().await;
    Ok(())
}

/// Discover every listing page in order. A work listed on several pages
/// is kept once, at its first position. With a `limit`, discovery stops as
/// soon as that many entries are in hand.
pub async fn discover_all(
    discoverer: &Discoverer<'_>,
    listing_urls: &[String],
    limit: Option<usize>,
    reporter: &dyn CollectProgressReporter,
) -> Result<Vec<Entry>> {
    let limit = limit.unwrap_or(usize::MAX);
    let mut seen = HashSet::new();
    let mut entries = Vec::new();

    for listing in listing_urls {
        if entries.len() >= limit {
            break;
        }
        reporter.report(CollectProgressEvent::Discovering {
            listing: listing.clone(),
        });
        let found = discoverer
            .discover_up_to(listing, limit - entries.len())
            .await
            .with_context(|| format!("Failed to discover entries on {}", listing))?;

        for entry in found {
            if seen.insert((entry.author_id.clone(), entry.title_id.clone())) {
                entries.push(entry);
            } else {
                debug!(author_id = %entry.author_id, title_id = %entry.title_id, "duplicate entry");
            }
        }
    }

    Ok(entries)
}

/// Extract and store each entry in turn; failures are logged and counted.
pub async fn ingest_entries(
    extractor: &Extractor<'_>,
    store: &IndexStore,
    entries: &[Entry],
    reporter: &dyn CollectProgressReporter,
) -> CollectSummary {
    let mut summary = CollectSummary::default();
    let total = entries.len();

    for (i, entry) in entries.iter().enumerate() {
        info!(
            author_id = %entry.author_id,
            title_id = %entry.title_id,
            title = %entry.title,
            zip_url = %entry.zip_url,
            "adding entry"
        );

        let stored = match ingest_entry(extractor, store, entry).await {
            Ok(()) => {
                summary.stored += 1;
                true
            }
            Err(e) => {
                warn!(
                    author_id = %entry.author_id,
                    title_id = %entry.title_id,
                    error = %e,
                    "skipping entry"
                );
                summary.failed += 1;
                false
            }
        };

        reporter.report(CollectProgressEvent::Ingested {
            n: i + 1,
            total,
            author_id: entry.author_id.clone(),
            title_id: entry.title_id.clone(),
            stored,
        });
    }

    summary
}

async fn ingest_entry(
    extractor: &Extractor<'_>,
    store: &IndexStore,
    entry: &Entry,
) -> HarvestResult<()> {
    let text = extractor.extract(&entry.zip_url).await?;
    store.put(entry, &text).await
}
