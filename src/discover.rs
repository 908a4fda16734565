//! Entry discovery from Aozora Bunko listing pages.
//!
//! A listing page (e.g. `index_pages/person879.html`) links every work of an
//! author from an ordered list. Each link is normalized to its card (detail)
//! page, which carries the author's display name and the download table with
//! the work's zip archive.
//!
//! ```text
//! listing ──▶ ol li a[href=.../cards/<author>/card<title>.html]
//!                 │
//!                 ▼
//!            detail page ──▶ author name + last `.zip` link ──▶ Entry
//! ```
//!
//! Only the listing page is load-bearing: a detail page that cannot be
//! fetched or parsed, or that has no archive, drops that one entry.

use encoding_rs::{Encoding, UTF_8};
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use tracing::{debug, info, warn};

use crate::config::{AUTHOR_ID_PLACEHOLDER, TITLE_ID_PLACEHOLDER};
use crate::error::{HarvestError, HarvestResult};
use crate::fetch::Fetch;
use crate::models::Entry;
use crate::resolve::resolve;

static CARD_HREF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r".*/cards/([0-9]+)/card([0-9]+)\.html$").expect("static regex"));

/// `charset=` in a `<meta>` tag; only the head of the page is scanned.
static META_CHARSET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)charset\s*=\s*["']?([A-Za-z0-9_.:-]+)"#).expect("static regex")
});

/// How much of a page is searched for a charset declaration.
const CHARSET_PRESCAN_BYTES: usize = 1024;

static LISTING_ANCHORS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("ol li a").expect("static selector"));

static AUTHOR_CELL: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"table[summary="作家データ"] tr:nth-child(2) td:nth-child(2)"#)
        .expect("static selector")
});

static DOWNLOAD_ANCHORS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table.download a").expect("static selector"));

/// A work linked from a listing page, before its detail page is visited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingLink {
    pub author_id: String,
    pub title_id: String,
    pub title: String,
}

/// What a detail page yields.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DetailPage {
    pub author: String,
    /// Raw href of the last `.zip` link in the download table.
    pub zip_href: Option<String>,
}

/// Discovers [`Entry`] records, fetching through an injected [`Fetch`].
pub struct Discoverer<'a> {
    fetcher: &'a dyn Fetch,
    detail_url_template: String,
}

impl<'a> Discoverer<'a> {
    /// `detail_url_template` must contain `{author_id}` and `{title_id}`.
    pub fn new(fetcher: &'a dyn Fetch, detail_url_template: impl Into<String>) -> Self {
        Self {
            fetcher,
            detail_url_template: detail_url_template.into(),
        }
    }

    /// Canonical detail page URL for a work.
    pub fn detail_url(&self, author_id: &str, title_id: &str) -> String {
        self.detail_url_template
            .replace(AUTHOR_ID_PLACEHOLDER, author_id)
            .replace(TITLE_ID_PLACEHOLDER, title_id)
    }

    /// Discover every work on `listing_url` that has a downloadable archive.
    ///
    /// Entries keep listing order. Fails only when the listing page itself
    /// cannot be fetched or parsed.
    pub async fn discover(&self, listing_url: &str) -> HarvestResult<Vec<Entry>> {
        self.discover_up_to(listing_url, usize::MAX).await
    }

    /// Like [`discover`](Self::discover), but stops visiting detail pages
    /// once `max` entries have been found.
    pub async fn discover_up_to(
        &self,
        listing_url: &str,
        max: usize,
    ) -> HarvestResult<Vec<Entry>> {
        let body = self.fetcher.fetch(listing_url).await?;
        let links = parse_listing(listing_url, &body)?;
        info!(listing = listing_url, links = links.len(), "parsed listing page");

        let mut entries = Vec::with_capacity(links.len().min(max));
        for link in links {
            if entries.len() >= max {
                break;
            }
            let page_url = self.detail_url(&link.author_id, &link.title_id);
            let Some((author, zip_url)) = self.find_author_and_zip(&page_url).await else {
                debug!(page = %page_url, "no archive, skipping");
                continue;
            };
            entries.push(Entry {
                author_id: link.author_id,
                author,
                title_id: link.title_id,
                title: link.title,
                site_url: listing_url.to_string(),
                zip_url,
            });
        }

        Ok(entries)
    }

    /// Author name and resolved archive URL, or `None` when the page is
    /// unavailable or has no archive.
    async fn find_author_and_zip(&self, page_url: &str) -> Option<(String, String)> {
        let page = match self.fetch_detail(page_url).await {
            Ok(page) => page,
            Err(e) => {
                warn!(page = %page_url, error = %e, "detail page unavailable");
                return None;
            }
        };

        let href = page.zip_href?;
        match resolve(page_url, &href) {
            Ok(zip_url) => Some((page.author, zip_url)),
            Err(e) => {
                warn!(page = %page_url, href = %href, error = %e, "could not resolve archive link");
                None
            }
        }
    }

    async fn fetch_detail(&self, page_url: &str) -> HarvestResult<DetailPage> {
        let body = self.fetcher.fetch(page_url).await?;
        parse_detail(page_url, &body)
    }
}

/// Extract card links from a listing page. Non-card anchors are skipped.
pub fn parse_listing(url: &str, body: &[u8]) -> HarvestResult<Vec<ListingLink>> {
    let document = parse_html(url, body)?;

    let links = document
        .select(&LISTING_ANCHORS)
        .filter_map(|anchor| {
            let href = anchor.value().attr("href").unwrap_or("");
            let caps = CARD_HREF.captures(href)?;
            Some(ListingLink {
                author_id: caps[1].to_string(),
                title_id: caps[2].to_string(),
                title: anchor.text().collect(),
            })
        })
        .collect();

    Ok(links)
}

/// Extract the author name and archive link from a detail page.
pub fn parse_detail(url: &str, body: &[u8]) -> HarvestResult<DetailPage> {
    let document = parse_html(url, body)?;

    let author = document
        .select(&AUTHOR_CELL)
        .next()
        .map(|cell| cell.text().collect::<String>().trim().to_string())
        .unwrap_or_default();

    // Last match wins.
    let mut zip_href = None;
    for anchor in document.select(&DOWNLOAD_ANCHORS) {
        if let Some(href) = anchor.value().attr("href") {
            if href.ends_with(".zip") {
                zip_href = Some(href.to_string());
            }
        }
    }

    Ok(DetailPage { author, zip_href })
}

/// Decode a page in its declared charset (UTF-8 when none is declared) and
/// parse it. Malformed byte sequences are replaced rather than rejected; an
/// unknown charset label makes the page unusable.
fn parse_html(url: &str, body: &[u8]) -> HarvestResult<Html> {
    let head = String::from_utf8_lossy(&body[..body.len().min(CHARSET_PRESCAN_BYTES)]);
    let encoding = match META_CHARSET.captures(&head) {
        Some(caps) => Encoding::for_label(caps[1].as_bytes()).ok_or_else(|| HarvestError::Parse {
            url: url.to_string(),
            reason: format!("unsupported charset '{}'", &caps[1]),
        })?,
        None => UTF_8,
    };

    let (text, used, had_errors) = encoding.decode(body);
    if had_errors {
        debug!(page = url, encoding = used.name(), "replaced malformed bytes");
    }
    Ok(Html::parse_document(&text))
}
