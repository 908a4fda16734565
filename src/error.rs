//! Typed errors for the harvesting pipeline.
//!
//! Each variant corresponds to one failure class of the pipeline. The
//! discovery, extraction, and store layers return [`HarvestError`]; the
//! CLI layer wraps them in `anyhow` with context.

use thiserror::Error;

/// Errors raised by discovery, extraction, and the index store.
#[derive(Debug, Error)]
pub enum HarvestError {
    /// Transport failure or a non-success HTTP status.
    #[error("fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// A fetched page could not be decoded or parsed as markup.
    #[error("could not parse {url}: {reason}")]
    Parse { url: String, reason: String },

    /// The base page URL is not a valid absolute URL.
    #[error("malformed URL {url}: {source}")]
    MalformedUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The fetched bytes are not a readable zip archive.
    #[error("invalid archive {url}: {reason}")]
    ArchiveFormat { url: String, reason: String },

    /// The text member is not valid Shift_JIS.
    #[error("{member} in {url} is not valid Shift_JIS")]
    Encoding { url: String, member: String },

    /// The archive holds no `.txt` member.
    #[error("content not found in {url}")]
    ContentNotFound { url: String },

    /// No stored document for the key.
    #[error("content not found: author {author_id}, title {title_id}")]
    NotFound { author_id: String, title_id: String },

    /// Persisting an entry failed; none of its writes were committed.
    #[error("failed to store {author_id}/{title_id}: {source}")]
    StoreWrite {
        author_id: String,
        title_id: String,
        #[source]
        source: sqlx::Error,
    },

    /// Read-side or connection-level store failure.
    #[error("store error: {0}")]
    Store(#[from] sqlx::Error),

    /// The segmenter rejected its input.
    #[error("segmentation failed: {0}")]
    Segment(String),
}

pub type HarvestResult<T> = Result<T, HarvestError>;
