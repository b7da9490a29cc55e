//! Trend data model: the fetched page and the ranked labels pulled out of it.

use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// One fetched HTML page. Created per run, read once by the extractor.
#[derive(Debug, Clone)]
pub struct RawDocument {
    url: String,
    encoding: &'static str,
    html: String,
}

impl RawDocument {
    pub fn new(url: impl Into<String>, encoding: &'static str, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            encoding,
            html: html.into(),
        }
    }

    /// Wrap an in-memory document (fixtures).
    pub fn from_html(html: impl Into<String>) -> Self {
        Self::new("about:blank", "UTF-8", html)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn encoding(&self) -> &'static str {
        self.encoding
    }

    pub fn as_str(&self) -> &str {
        &self.html
    }

    pub fn len(&self) -> usize {
        self.html.len()
    }

    pub fn is_empty(&self) -> bool {
        self.html.is_empty()
    }
}

fn rank_prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+\.?\s*").expect("rank prefix pattern is valid"))
}

/// Strip a leading rank numeral, collapse whitespace runs to one space, trim.
///
/// ```
/// use twittrend_web::trend::normalize_label;
///
/// assert_eq!(normalize_label("1. 東京都"), "東京都");
/// assert_eq!(normalize_label("23.foo"), "foo");
/// assert_eq!(normalize_label("#123 trending"), "#123 trending");
/// assert_eq!(normalize_label("foo\n\n  bar"), "foo bar");
/// ```
pub fn normalize_label(raw: &str) -> String {
    let stripped = rank_prefix_re().replace(raw.trim_start(), "");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A single normalized trend label. May be empty when the item carried no
/// text besides its rank; it still holds its place in the ranking.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrendEntry(String);

impl TrendEntry {
    pub fn parse(raw: &str) -> Self {
        Self(normalize_label(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for TrendEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TrendEntry {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Ranked trend labels; index 0 is the most trending. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrendList {
    entries: Vec<TrendEntry>,
}

impl TrendList {
    pub fn new(entries: Vec<TrendEntry>) -> Option<Self> {
        (!entries.is_empty()).then_some(Self { entries })
    }

    pub fn entries(&self) -> &[TrendEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TrendEntry> {
        self.entries.iter()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.entries.iter().map(TrendEntry::as_str).collect()
    }
}

impl<'a> IntoIterator for &'a TrendList {
    type Item = &'a TrendEntry;
    type IntoIter = std::slice::Iter<'a, TrendEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
