use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::mpsc;

use axum::extract::Path as UrlPath;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tempfile::TempDir;

fn aozora_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_aozora"))
}

const AUTHOR_TABLE: &str = r#"
    <table summary="作家データ">
      <tbody>
        <tr><td class="header">分類：</td><td>著者</td></tr>
        <tr><td class="header">作家名：</td><td><font size="+2">テスト 太郎</font></td></tr>
        <tr><td class="header">作家名読み：</td><td>てすと たろう</td></tr>
      </tbody>
    </table>"#;

async fn listing() -> String {
    format!(
        r#"<html><body>{}
        <ol>
          <li><a href="/cards/999999/card000001.html">テスト書籍001</a></li>
          <li><a href="/cards/999999/card000002.html">テスト書籍002</a></li>
          <li><a href="/cards/999999/card000003.html">テスト書籍003</a></li>
        </ol></body></html>"#,
        AUTHOR_TABLE
    )
}

/// Card pages: 000003 has no archive link.
async fn card(UrlPath((author_id, card)): UrlPath<(String, String)>) -> String {
    let title_id = card.trim_start_matches("card").trim_end_matches(".html");
    let download = if title_id == "000003" {
        String::new()
    } else {
        format!(
            r#"<table border="1" summary="ダウンロードデータ" class="download">
              <tr><td><a href="./files/{a}_{t}.zip">{a}_{t}.zip</a></td></tr>
            </table>"#,
            a = author_id,
            t = title_id
        )
    };
    format!("<html><body>{}{}</body></html>", AUTHOR_TABLE, download)
}

/// Archives: 000002 is not a zip at all.
async fn archive(UrlPath((_author_id, file)): UrlPath<(String, String)>) -> Response {
    if file.contains("000002") {
        return b"<html>moved</html>".to_vec().into_response();
    }
    let (text, _, _) = encoding_rs::SHIFT_JIS.encode("テストデータ\n");
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file("example.txt", zip::write::SimpleFileOptions::default())
        .unwrap();
    writer.write_all(&text).unwrap();
    writer.finish().unwrap().into_inner().into_response()
}

/// Serve a miniature catalog on a background thread; returns its base URL.
fn spawn_catalog() -> String {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async move {
            let app = Router::new()
                .route("/", get(listing))
                .route("/cards/{author_id}/{card}", get(card))
                .route("/cards/{author_id}/files/{file}", get(archive));
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            tx.send(listener.local_addr().unwrap()).unwrap();
            axum::serve(listener, app).await.unwrap();
        });
    });
    format!("http://{}", rx.recv().unwrap())
}

fn setup_test_env(base_url: &str) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let config_content = format!(
        r#"[db]
path = "{}/data/aozora.sqlite"

[crawler]
listing_urls = []
detail_url_template = "{}/cards/{{author_id}}/card{{title_id}}.html"
timeout_secs = 10

[tokenizer]
kind = "script"
"#,
        root.display(),
        base_url
    );

    let config_path = config_dir.join("aozora.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_aozora_output(config_path: &Path, args: &[&str]) -> Output {
    let binary = aozora_binary();
    Command::new(&binary)
        .arg("--config")
        .arg(config_path)
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run aozora binary at {:?}: {}", binary, e))
}

fn run_aozora(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let output = run_aozora_output(config_path, args);
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

#[test]
fn test_init_creates_database() {
    let (tmp, config_path) = setup_test_env("http://127.0.0.1:9");

    let (stdout, stderr, success) = run_aozora(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
    assert!(tmp.path().join("data").join("aozora.sqlite").exists());
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env("http://127.0.0.1:9");

    let (_, _, success1) = run_aozora(&config_path, &["init"]);
    assert!(success1, "First init failed");
    let (_, _, success2) = run_aozora(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_usage_errors_exit_with_2() {
    let (_tmp, config_path) = setup_test_env("http://127.0.0.1:9");

    for args in [
        &[][..],
        &["titles"][..],
        &["content", "999999"][..],
        &["query"][..],
        &["unknown"][..],
    ] {
        let output = run_aozora_output(&config_path, args);
        assert_eq!(output.status.code(), Some(2), "args {:?}", args);
    }
}

#[test]
fn test_empty_store_lists_nothing() {
    let (_tmp, config_path) = setup_test_env("http://127.0.0.1:9");

    let (stdout, _, success) = run_aozora(&config_path, &["authors"]);
    assert!(success);
    assert!(stdout.trim().is_empty());

    let (stdout, _, success) = run_aozora(&config_path, &["query", "テスト"]);
    assert!(success);
    assert!(stdout.contains("No results"));
}

#[test]
fn test_content_missing_fails() {
    let (_tmp, config_path) = setup_test_env("http://127.0.0.1:9");

    run_aozora(&config_path, &["init"]);
    let (_, stderr, success) = run_aozora(&config_path, &["content", "999999", "000001"]);
    assert!(!success, "content with missing work should fail");
    assert!(
        stderr.contains("not found"),
        "Should report not found, got: {}",
        stderr
    );
}

#[test]
fn test_collect_without_listing_fails() {
    let (_tmp, config_path) = setup_test_env("http://127.0.0.1:9");

    let (_, stderr, success) = run_aozora(&config_path, &["collect", "--progress", "off"]);
    assert!(!success);
    assert!(stderr.contains("No listing URLs"), "got: {}", stderr);
}

#[test]
fn test_collect_unreachable_listing_is_fatal() {
    let base = spawn_catalog();
    let (_tmp, config_path) = setup_test_env(&base);

    let missing = format!("{}/index_pages/missing.html", base);
    let (stdout, stderr, success) =
        run_aozora(&config_path, &["collect", &missing, "--progress", "off"]);
    assert!(!success, "collect should fail: stdout={}", stdout);
    assert!(stderr.contains("missing.html"), "got: {}", stderr);
}

#[test]
fn test_collect_dry_run_writes_nothing() {
    let base = spawn_catalog();
    let (_tmp, config_path) = setup_test_env(&base);

    let (stdout, stderr, success) =
        run_aozora(&config_path, &["collect", &base, "--dry-run", "--progress", "off"]);
    assert!(success, "dry run failed: {}", stderr);
    assert!(stdout.contains("dry-run"));
    assert!(stdout.contains("entries found: 2"));
    assert!(stdout.contains("/cards/999999/files/999999_000001.zip"));

    let (stdout, _, _) = run_aozora(&config_path, &["authors"]);
    assert!(stdout.trim().is_empty());
}

#[test]
fn test_collect_limit_caps_entries() {
    let base = spawn_catalog();
    let (_tmp, config_path) = setup_test_env(&base);

    let (stdout, stderr, success) = run_aozora(
        &config_path,
        &["collect", &base, "--limit", "1", "--dry-run", "--progress", "off"],
    );
    assert!(success, "collect failed: {}", stderr);
    assert!(stdout.contains("entries found: 1"), "got: {}", stdout);
    assert!(stdout.contains("999999_000001.zip"));
    assert!(!stdout.contains("999999_000002.zip"));
}

#[test]
fn test_collect_then_search() {
    let base = spawn_catalog();
    let (_tmp, config_path) = setup_test_env(&base);

    let (stdout, stderr, success) =
        run_aozora(&config_path, &["collect", &base, "--progress", "off"]);
    assert!(success, "collect failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("entries found: 2"), "got: {}", stdout);
    assert!(stdout.contains("stored: 1"), "got: {}", stdout);
    assert!(stdout.contains("failed: 1"), "got: {}", stdout);
    assert!(stdout.contains("ok"));

    let (stdout, _, success) = run_aozora(&config_path, &["authors"]);
    assert!(success);
    assert_eq!(stdout.trim(), "Author ID: 999999, Author: テスト 太郎");

    let (stdout, _, success) = run_aozora(&config_path, &["titles", "999999"]);
    assert!(success);
    assert_eq!(
        stdout.trim(),
        "Author ID: 999999, Title ID: 000001, Title: テスト書籍001"
    );

    let (stdout, _, success) = run_aozora(&config_path, &["content", "999999", "000001"]);
    assert!(success);
    assert_eq!(stdout, "テストデータ\n\n");

    let (stdout, _, success) = run_aozora(&config_path, &["query", "テストデータ"]);
    assert!(success);
    assert_eq!(stdout.trim(), "999999 000001: テスト書籍001 (テスト 太郎)");

    let (_, _, success) = run_aozora(&config_path, &["content", "999999", "000002"]);
    assert!(!success, "failed archive must not leave a partial entry");
}

#[test]
fn test_recollect_does_not_duplicate() {
    let base = spawn_catalog();
    let (_tmp, config_path) = setup_test_env(&base);

    run_aozora(&config_path, &["collect", &base, "--progress", "off"]);
    let (stdout, _, success) = run_aozora(&config_path, &["collect", &base, "--progress", "off"]);
    assert!(success);
    assert!(stdout.contains("stored: 1"));

    let (stdout, _, _) = run_aozora(&config_path, &["query", "テストデータ"]);
    assert_eq!(stdout.trim().lines().count(), 1);
}

#[test]
fn test_db_flag_overrides_config() {
    let (tmp, config_path) = setup_test_env("http://127.0.0.1:9");
    let override_path = tmp.path().join("other.sqlite");

    let (_, _, success) = run_aozora(
        &config_path,
        &["-d", override_path.to_str().unwrap(), "init"],
    );
    assert!(success);
    assert!(override_path.exists());
    assert!(!tmp.path().join("data").join("aozora.sqlite").exists());
}
