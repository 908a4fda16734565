//! Progress output for `aozora collect`.
//!
//! Events are written to **stderr** so the summary on stdout stays
//! parseable. Three renderings are available through [`ProgressMode`]:
//!
//! ```text
//! human:  listing https://www.aozora.gr.jp/index_pages/person879.html
//!         [  3/148] 000879/127 stored
//! json:   {"phase":"ingested","n":3,"total":148,"author_id":"000879","title_id":"127","stored":true}
//! off:    (nothing)
//! ```

use serde::Serialize;
use std::io::Write;

/// Something `collect` has just done.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum CollectProgressEvent {
    /// A listing page is about to be crawled; the entry count is not known yet.
    Discovering { listing: String },
    /// Entry `n` of `total` has been handled.
    Ingested {
        n: usize,
        total: usize,
        author_id: String,
        title_id: String,
        stored: bool,
    },
}

pub trait CollectProgressReporter {
    fn report(&self, event: CollectProgressEvent);
}

fn human_line(event: &CollectProgressEvent) -> String {
    match event {
        CollectProgressEvent::Discovering { listing } => format!("listing {}", listing),
        CollectProgressEvent::Ingested {
            n,
            total,
            author_id,
            title_id,
            stored,
        } => {
            let width = total.to_string().len();
            format!(
                "[{:>width$}/{}] {}/{} {}",
                n,
                total,
                author_id,
                title_id,
                if *stored { "stored" } else { "failed" },
                width = width
            )
        }
    }
}

pub struct StderrProgress;

impl CollectProgressReporter for StderrProgress {
    fn report(&self, event: CollectProgressEvent) {
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(stderr, "{}", human_line(&event));
    }
}

/// Newline-delimited JSON, one object per event.
pub struct JsonProgress;

impl CollectProgressReporter for JsonProgress {
    fn report(&self, event: CollectProgressEvent) {
        if let Ok(line) = serde_json::to_string(&event) {
            let mut stderr = std::io::stderr().lock();
            let _ = writeln!(stderr, "{}", line);
        }
    }
}

pub struct NoProgress;

impl CollectProgressReporter for NoProgress {
    fn report(&self, _event: CollectProgressEvent) {}
}

/// `--progress` values.
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// `Human` on an interactive stderr, `Off` when redirected.
    pub fn default_for_tty() -> Self {
        match atty::is(atty::Stream::Stderr) {
            true => Self::Human,
            false => Self::Off,
        }
    }

    pub fn reporter(self) -> Box<dyn CollectProgressReporter> {
        match self {
            Self::Off => Box::new(NoProgress),
            Self::Human => Box::new(StderrProgress),
            Self::Json => Box::new(JsonProgress),
        }
    }
}
