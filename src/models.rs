//! Core data models used throughout the harvester.
//!
//! An [`Entry`] is produced by discovery and consumed by ingestion; the
//! remaining types are rows read back from the index store.

/// One discovered work, keyed by `(author_id, title_id)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub author_id: String,
    /// Display name from the detail page; empty when the page had none.
    pub author: String,
    pub title_id: String,
    /// Anchor text from the listing page, verbatim.
    pub title: String,
    /// Listing page this entry was discovered on.
    pub site_url: String,
    /// Absolute URL of the archive holding the work's text.
    pub zip_url: String,
}

/// A row of the `authors` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub author_id: String,
    pub author: String,
}

/// A work listed under an author, without its body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Title {
    pub author_id: String,
    pub title_id: String,
    pub title: String,
}

/// A document matched by a token query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryHit {
    pub author_id: String,
    pub author: String,
    pub title_id: String,
    pub title: String,
}
