use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const AUTHOR_ID_PLACEHOLDER: &str = "{author_id}";
pub const TITLE_ID_PLACEHOLDER: &str = "{title_id}";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub tokenizer: TokenizerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CrawlerConfig {
    /// Listing pages collected when `collect` is given no URLs.
    #[serde(default = "default_listing_urls")]
    pub listing_urls: Vec<String>,
    /// Detail page URL with `{author_id}` and `{title_id}` placeholders.
    #[serde(default = "default_detail_url_template")]
    pub detail_url_template: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Request timeout; 0 leaves the transport default in place.
    #[serde(default)]
    pub timeout_secs: u64,
    /// Upper bound on the decompressed size of an archive's text member.
    #[serde(default = "default_max_archive_bytes")]
    pub max_archive_bytes: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            listing_urls: default_listing_urls(),
            detail_url_template: default_detail_url_template(),
            user_agent: default_user_agent(),
            timeout_secs: 0,
            max_archive_bytes: default_max_archive_bytes(),
        }
    }
}

fn default_listing_urls() -> Vec<String> {
    vec!["https://www.aozora.gr.jp/index_pages/person879.html".to_string()]
}
fn default_detail_url_template() -> String {
    "https://www.aozora.gr.jp/cards/{author_id}/card{title_id}.html".to_string()
}
fn default_user_agent() -> String {
    concat!("aozora-index/", env!("CARGO_PKG_VERSION")).to_string()
}
fn default_max_archive_bytes() -> u64 {
    64 * 1024 * 1024
}

#[derive(Debug, Deserialize, Clone)]
pub struct TokenizerConfig {
    #[serde(default = "default_tokenizer_kind")]
    pub kind: String,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            kind: default_tokenizer_kind(),
        }
    }
}

fn default_tokenizer_kind() -> String {
    if cfg!(feature = "ipadic") {
        "ipadic".to_string()
    } else {
        "script".to_string()
    }
}

impl Config {
    /// Defaults used when no config file is present.
    pub fn minimal() -> Self {
        Self {
            db: DbConfig {
                path: PathBuf::from("./data/aozora.sqlite"),
            },
            crawler: CrawlerConfig::default(),
            tokenizer: TokenizerConfig::default(),
        }
    }
}

/// Load and validate a config file. A missing file yields [`Config::minimal`].
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::minimal());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    let template = &config.crawler.detail_url_template;
    if !template.contains(AUTHOR_ID_PLACEHOLDER) || !template.contains(TITLE_ID_PLACEHOLDER) {
        anyhow::bail!(
            "crawler.detail_url_template must contain {} and {}",
            AUTHOR_ID_PLACEHOLDER,
            TITLE_ID_PLACEHOLDER
        );
    }

    if config.crawler.max_archive_bytes == 0 {
        anyhow::bail!("crawler.max_archive_bytes must be > 0");
    }

    match config.tokenizer.kind.as_str() {
        "script" => {}
        "ipadic" if cfg!(feature = "ipadic") => {}
        "ipadic" => anyhow::bail!("tokenizer.kind 'ipadic' requires the `ipadic` feature"),
        other => anyhow::bail!(
            "Unknown tokenizer kind: '{}'. Must be ipadic or script.",
            other
        ),
    }

    Ok(())
}
