//! Archive text extraction.
//!
//! Aozora Bunko ships each work as a zip archive holding one Shift_JIS
//! (Windows-31J) text file, sometimes next to illustrations. This module
//! fetches the archive, picks that text member, and decodes it to UTF-8.

use encoding_rs::SHIFT_JIS;
use std::io::{Cursor, Read};
use tracing::debug;

use crate::error::{HarvestError, HarvestResult};
use crate::fetch::Fetch;

const TEXT_EXTENSION: &str = ".txt";

/// Fetches archives and returns their decoded text.
pub struct Extractor<'a> {
    fetcher: &'a dyn Fetch,
    max_member_bytes: u64,
}

impl<'a> Extractor<'a> {
    pub fn new(fetcher: &'a dyn Fetch, max_member_bytes: u64) -> Self {
        Self {
            fetcher,
            max_member_bytes,
        }
    }

    /// Fetch `zip_url` and return the text of its first `.txt` member.
    pub async fn extract(&self, zip_url: &str) -> HarvestResult<String> {
        let bytes = self.fetcher.fetch(zip_url).await?;
        extract_text(zip_url, &bytes, self.max_member_bytes)
    }
}

/// Decode the first `.txt` member of an in-memory archive.
///
/// Members are scanned in stored order; the first whose name ends in
/// exactly `.txt` is used even if others follow.
pub fn extract_text(url: &str, bytes: &[u8], max_member_bytes: u64) -> HarvestResult<String> {
    let archive_err = |reason: String| HarvestError::ArchiveFormat {
        url: url.to_string(),
        reason,
    };

    let mut archive =
        zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| archive_err(e.to_string()))?;

    for i in 0..archive.len() {
        let member = archive.by_index(i).map_err(|e| archive_err(e.to_string()))?;
        if member.is_dir() || !has_text_extension(member.name()) {
            continue;
        }

        let name = member.name().to_string();
        debug!(archive = url, member = %name, size = member.size(), "extracting text member");

        let mut raw = Vec::new();
        member
            .take(max_member_bytes.saturating_add(1))
            .read_to_end(&mut raw)
            .map_err(|e| archive_err(e.to_string()))?;
        if raw.len() as u64 > max_member_bytes {
            return Err(archive_err(format!(
                "{} exceeds size limit ({} bytes)",
                name, max_member_bytes
            )));
        }

        return decode_shift_jis(&raw).ok_or(HarvestError::Encoding {
            url: url.to_string(),
            member: name,
        });
    }

    Err(HarvestError::ContentNotFound {
        url: url.to_string(),
    })
}

/// Strict Shift_JIS decode; `None` on any malformed sequence.
pub fn decode_shift_jis(raw: &[u8]) -> Option<String> {
    SHIFT_JIS
        .decode_without_bom_handling_and_without_replacement(raw)
        .map(|text| text.into_owned())
}

/// Case-sensitive extension check on the final path component.
fn has_text_extension(name: &str) -> bool {
    let file_name = name.rsplit('/').next().unwrap_or(name);
    file_name
        .rfind('.')
        .is_some_and(|dot| &file_name[dot..] == TEXT_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    const LIMIT: u64 = 1024 * 1024;

    fn sjis(text: &str) -> Vec<u8> {
        let (bytes, _, had_errors) = SHIFT_JIS.encode(text);
        assert!(!had_errors);
        bytes.into_owned()
    }

    fn build_zip(members: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in members {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    struct MapFetcher(HashMap<String, Vec<u8>>);

    #[async_trait::async_trait]
    impl Fetch for MapFetcher {
        async fn fetch(&self, url: &str) -> HarvestResult<Vec<u8>> {
            self.0.get(url).cloned().ok_or_else(|| HarvestError::Fetch {
                url: url.to_string(),
                reason: "HTTP 404 Not Found".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn extracts_shift_jis_text() {
        let data = sjis("テストデータ\n");
        let archive = build_zip(&[("example/example.txt", &data)]);
        let fetcher = MapFetcher(HashMap::from([(
            "http://host/example.zip".to_string(),
            archive,
        )]));

        let text = Extractor::new(&fetcher, LIMIT)
            .extract("http://host/example.zip")
            .await
            .unwrap();
        assert_eq!(text, "テストデータ\n");
    }

    #[tokio::test]
    async fn fetch_failure_is_reported() {
        let fetcher = MapFetcher(HashMap::new());
        let err = Extractor::new(&fetcher, LIMIT)
            .extract("http://host/missing.zip")
            .await
            .unwrap_err();
        assert!(matches!(err, HarvestError::Fetch { .. }));
    }

    #[test]
    fn archive_without_text_member_is_content_not_found() {
        let archive = build_zip(&[("cover.png", b"\x89PNG"), ("README.TXT", b"upper")]);
        let err = extract_text("http://host/a.zip", &archive, LIMIT).unwrap_err();
        assert!(matches!(err, HarvestError::ContentNotFound { .. }));
    }

    #[test]
    fn first_text_member_wins() {
        let first = sjis("一番目");
        let second = sjis("二番目");
        let archive = build_zip(&[
            ("images/fig1.png", b"\x89PNG"),
            ("a.txt", &first),
            ("b.txt", &second),
        ]);
        assert_eq!(extract_text("http://host/a.zip", &archive, LIMIT).unwrap(), "一番目");
    }

    #[test]
    fn non_zip_bytes_are_an_archive_error() {
        let err = extract_text("http://host/a.zip", b"<html>not found</html>", LIMIT).unwrap_err();
        assert!(matches!(err, HarvestError::ArchiveFormat { .. }));
    }

    #[test]
    fn malformed_shift_jis_is_an_encoding_error() {
        // 0x82 is a lead byte; 0x20 is not a valid trail byte.
        let archive = build_zip(&[("a.txt", b"\x82\x20abc")]);
        let err = extract_text("http://host/a.zip", &archive, LIMIT).unwrap_err();
        assert!(matches!(err, HarvestError::Encoding { .. }));
    }

    #[test]
    fn oversized_member_is_rejected() {
        let archive = build_zip(&[("a.txt", &[b'a'; 64])]);
        let err = extract_text("http://host/a.zip", &archive, 16).unwrap_err();
        assert!(matches!(err, HarvestError::ArchiveFormat { .. }));
    }

    #[test]
    fn extension_match_is_exact() {
        assert!(has_text_extension("a.txt"));
        assert!(has_text_extension("dir.v2/a.txt"));
        assert!(!has_text_extension("a.TXT"));
        assert!(!has_text_extension("a.txt.bak"));
        assert!(!has_text_extension("txt"));
        assert!(!has_text_extension("dir.txt/readme"));
    }
}
