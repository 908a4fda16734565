//! Archive link resolution.
//!
//! Detail pages link their archives relative to the page's own directory
//! (`./files/171_ruby_1273.zip` on `/cards/000879/card171.html`). This
//! module turns such a reference into an absolute, fetchable URL.

use url::Url;

use crate::error::{HarvestError, HarvestResult};

/// Scheme prefixes that mark a reference as already absolute.
const ABSOLUTE_PREFIXES: [&str; 2] = ["http://", "https://"];

/// Resolve `candidate` against the directory of `base_page_url`.
///
/// References with an explicit `http`/`https` scheme are returned as-is.
/// Anything else, including `/rooted` and `//host-relative` forms, is
/// appended to `dirname(base.path)` and keeps the base's scheme and host.
/// The base's query and fragment are not carried over.
pub fn resolve(base_page_url: &str, candidate: &str) -> HarvestResult<String> {
    if ABSOLUTE_PREFIXES.iter().any(|p| candidate.starts_with(p)) {
        return Ok(candidate.to_string());
    }

    let malformed = |source| HarvestError::MalformedUrl {
        url: base_page_url.to_string(),
        source,
    };

    let mut base = Url::parse(base_page_url).map_err(malformed)?;
    base.set_query(None);
    base.set_fragment(None);

    // A leading `./` pins the reference below the page's directory: it can
    // no longer be read as rooted, host-relative, or carrying a scheme.
    // `join` then cleans `.` and `..` segments.
    let relative = format!("./{}", candidate.trim_start_matches(['/', '\\']));
    let resolved = base.join(&relative).map_err(malformed)?;
    Ok(resolved.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://host/cards/999999/card000001.html";

    #[test]
    fn absolute_refs_are_unchanged() {
        for href in [
            "http://other.example/files/a.zip",
            "https://www.aozora.gr.jp/cards/000879/files/171_ruby_1273.zip",
        ] {
            assert_eq!(resolve(BASE, href).unwrap(), href);
        }
    }

    #[test]
    fn absolute_refs_skip_base_validation() {
        assert_eq!(
            resolve("not a url", "https://host/a.zip").unwrap(),
            "https://host/a.zip"
        );
    }

    #[test]
    fn relative_ref_joins_page_directory() {
        assert_eq!(
            resolve(BASE, "./files/a.zip").unwrap(),
            "https://host/cards/999999/files/a.zip"
        );
        assert_eq!(
            resolve(BASE, "files/a.zip").unwrap(),
            "https://host/cards/999999/files/a.zip"
        );
    }

    #[test]
    fn parent_segments_are_cleaned() {
        assert_eq!(
            resolve(BASE, "../000880/files/b.zip").unwrap(),
            "https://host/cards/000880/files/b.zip"
        );
    }

    #[test]
    fn base_port_and_scheme_are_kept() {
        assert_eq!(
            resolve("http://127.0.0.1:8080/cards/1/card2.html?x=1#top", "./files/1_2.zip").unwrap(),
            "http://127.0.0.1:8080/cards/1/files/1_2.zip"
        );
    }

    #[test]
    fn rooted_ref_stays_under_page_directory() {
        assert_eq!(
            resolve(BASE, "/files/a.zip").unwrap(),
            "https://host/cards/999999/files/a.zip"
        );
    }

    #[test]
    fn host_relative_ref_keeps_base_host() {
        let resolved = resolve(BASE, "//evil.example/a.zip").unwrap();
        assert_eq!(resolved, "https://host/cards/999999/evil.example/a.zip");
        assert_eq!(Url::parse(&resolved).unwrap().host_str(), Some("host"));
    }

    #[test]
    fn scheme_like_first_segment_is_a_path() {
        assert_eq!(
            resolve(BASE, "ftp:a.zip").unwrap(),
            "https://host/cards/999999/ftp:a.zip"
        );
    }

    #[test]
    fn malformed_base_is_rejected() {
        let err = resolve("cards/1/card2.html", "./files/a.zip").unwrap_err();
        assert!(matches!(err, HarvestError::MalformedUrl { .. }));
    }
}
