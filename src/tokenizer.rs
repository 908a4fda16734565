//! Word segmentation for Japanese text.
//!
//! Japanese has no spaces between words, so the index cannot rely on the
//! full-text engine's own tokenizer. Text is segmented here instead, and
//! the single-space join of [`Segmenter::segment`]'s output is the literal
//! value stored in (and matched against) the FTS table.
//!
//! Two segmenters are available:
//!
//! | Kind | Type | Notes |
//! |------|------|-------|
//! | `ipadic` | [`IpadicSegmenter`] | Morphological analysis with lindera and the embedded IPADIC dictionary |
//! | `script` | [`ScriptSegmenter`] | Splits on script changes (kanji / hiragana / katakana / latin); no dictionary |
//!
//! Both are deterministic, omit begin/end-of-sentence markers, and never
//! emit whitespace tokens.

use anyhow::Result;

use crate::config::TokenizerConfig;
use crate::error::HarvestResult;

/// Splits text into an ordered sequence of word tokens.
///
/// Every token is a substring of the input, and concatenating the tokens
/// yields the input with its whitespace removed.
pub trait Segmenter {
    fn segment(&self, text: &str) -> HarvestResult<Vec<String>>;
}

/// Build the segmenter named by `[tokenizer] kind`.
pub fn from_config(config: &TokenizerConfig) -> Result<Box<dyn Segmenter>> {
    match config.kind.as_str() {
        "script" => Ok(Box::new(ScriptSegmenter)),
        #[cfg(feature = "ipadic")]
        "ipadic" => Ok(Box::new(IpadicSegmenter::new()?)),
        other => anyhow::bail!("Unsupported tokenizer kind: '{}'", other),
    }
}

#[cfg(feature = "ipadic")]
pub use ipadic::IpadicSegmenter;

#[cfg(feature = "ipadic")]
mod ipadic {
    use lindera::dictionary::{load_dictionary_from_kind, DictionaryKind};
    use lindera::mode::Mode;
    use lindera::segmenter::Segmenter as LinderaSegmenter;
    use lindera::tokenizer::Tokenizer;

    use super::Segmenter;
    use crate::error::{HarvestError, HarvestResult};

    /// Lindera tokenizer over the IPADIC dictionary compiled into the binary.
    pub struct IpadicSegmenter {
        tokenizer: Tokenizer,
    }

    impl IpadicSegmenter {
        /// Loads the dictionary; build once and reuse.
        pub fn new() -> anyhow::Result<Self> {
            let dictionary = load_dictionary_from_kind(DictionaryKind::IPADIC)
                .map_err(|e| anyhow::anyhow!("failed to load IPADIC dictionary: {}", e))?;
            let segmenter = LinderaSegmenter::new(Mode::Normal, dictionary, None);
            Ok(Self {
                tokenizer: Tokenizer::new(segmenter),
            })
        }
    }

    impl Segmenter for IpadicSegmenter {
        fn segment(&self, text: &str) -> HarvestResult<Vec<String>> {
            let tokens = self
                .tokenizer
                .tokenize(text)
                .map_err(|e| HarvestError::Segment(e.to_string()))?;

            Ok(tokens
                .iter()
                .filter(|token| !token.text.trim().is_empty())
                .map(|token| token.text.to_string())
                .collect())
        }
    }
}

/// Character classes whose boundaries delimit [`ScriptSegmenter`] tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Script {
    Kanji,
    Hiragana,
    Katakana,
    Alnum,
    Space,
    /// Punctuation and symbols; each character is its own token.
    Symbol,
}

fn classify(c: char) -> Script {
    match c {
        _ if c.is_whitespace() => Script::Space,
        // Iteration marks and 〆 read as part of a kanji word.
        '々' | '〆' | '〇' | 'ヶ' => Script::Kanji,
        '\u{3400}'..='\u{4DBF}' | '\u{4E00}'..='\u{9FFF}' | '\u{F900}'..='\u{FAFF}' => {
            Script::Kanji
        }
        '\u{3041}'..='\u{309F}' => Script::Hiragana,
        // Includes the prolonged sound mark ー.
        '\u{30A0}'..='\u{30FF}' | '\u{31F0}'..='\u{31FF}' | '\u{FF66}'..='\u{FF9F}' => {
            match c {
                '・' | '゠' => Script::Symbol,
                _ => Script::Katakana,
            }
        }
        _ if c.is_alphanumeric() => Script::Alnum,
        _ => Script::Symbol,
    }
}

/// Dictionary-free segmenter that cuts wherever the script changes.
///
/// Coarser than morphological analysis (`東京に行く` yields `東京`, `に`,
/// `行`, `く`) but stable across builds, which makes it the fallback when
/// the `ipadic` feature is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptSegmenter;

impl Segmenter for ScriptSegmenter {
    fn segment(&self, text: &str) -> HarvestResult<Vec<String>> {
        let mut tokens = Vec::new();
        let mut start = 0;
        let mut current: Option<Script> = None;

        for (idx, c) in text.char_indices() {
            let script = classify(c);
            if let Some(prev) = current {
                if prev != script || prev == Script::Symbol {
                    if prev != Script::Space {
                        tokens.push(text[start..idx].to_string());
                    }
                    start = idx;
                }
            }
            current = Some(script);
        }

        if let Some(prev) = current {
            if prev != Script::Space {
                tokens.push(text[start..].to_string());
            }
        }

        Ok(tokens)
    }
}
