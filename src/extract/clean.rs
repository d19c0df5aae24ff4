//! Text normalisation applied to every extracted string.

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Normalises loader text before it is stored in a record.
pub struct TextCleaner {
    whitespace: Regex,
    blank_lines: Regex,
    trailing_space: Regex,
}

impl TextCleaner {
    /// Create a cleaner.
    pub fn new() -> Self {
        Self {
            whitespace: Regex::new(r"\s+").unwrap(),
            blank_lines: Regex::new(r"\n{3,}").unwrap(),
            trailing_space: Regex::new(r"(?m)[ \t]+$").unwrap(),
        }
    }

    /// Clean flowing text.
    ///
    /// Trims, decodes the common HTML entities, applies NFKC (which also
    /// folds ligatures like `ﬁ`), drops U+FFFD, and collapses all whitespace
    /// runs to a single space.
    pub fn clean(&self, text: &str) -> String {
        let normalized = self.normalize(text);
        self.whitespace
            .replace_all(&normalized, " ")
            .trim()
            .to_string()
    }

    /// Clean text whose line structure matters (code, formulas).
    ///
    /// Same as [`clean`](Self::clean) but keeps newlines, only trimming
    /// trailing spaces and squeezing runs of blank lines.
    pub fn clean_preformatted(&self, text: &str) -> String {
        let normalized = self.normalize(text).replace("\r\n", "\n");
        let trimmed = self.trailing_space.replace_all(&normalized, "");
        self.blank_lines
            .replace_all(&trimmed, "\n\n")
            .trim_matches('\n')
            .to_string()
    }

    fn normalize(&self, text: &str) -> String {
        let unescaped = unescape_entities(text.trim());
        unescaped
            .nfkc()
            .filter(|&c| c != '\u{FFFD}')
            .collect()
    }
}

impl Default for TextCleaner {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode the handful of entities loaders leave in extracted text.
fn unescape_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}
