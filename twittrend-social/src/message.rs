//! Renders a ranked trend list into the text of one chat message.
use chrono::{DateTime, FixedOffset, TimeZone};
use twittrend_common::{Result, TrendError};

pub const DEFAULT_HEADER: &str = "【日本のトレンド TOP50】";
pub const DEFAULT_MAX_CHARS: usize = 4800;
pub const DEFAULT_OMITTED_MARKER: &str = "\n…(以下省略)";
/// JST.
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = 9 * 60;

const SEPARATOR: &str = "--------------------";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Clone)]
pub struct MessageBuilder {
    header: String,
    offset: FixedOffset,
    max_chars: usize,
    omitted_marker: String,
}

impl Default for MessageBuilder {
    fn default() -> Self {
        Self {
            header: DEFAULT_HEADER.to_string(),
            offset: jst(),
            max_chars: DEFAULT_MAX_CHARS,
            omitted_marker: DEFAULT_OMITTED_MARKER.to_string(),
        }
    }
}

fn jst() -> FixedOffset {
    FixedOffset::east_opt(DEFAULT_UTC_OFFSET_MINUTES * 60).expect("JST is a valid offset")
}

impl MessageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = header.into();
        self
    }

    /// Offsets outside ±24h are a config error.
    pub fn with_utc_offset_minutes(mut self, minutes: i32) -> Result<Self> {
        self.offset = minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                TrendError::config(
                    "message.utc_offset_minutes",
                    format!("{minutes} is not a valid UTC offset"),
                )
            })?;
        Ok(self)
    }

    pub fn with_max_chars(mut self, max_chars: usize, omitted_marker: impl Into<String>) -> Self {
        self.max_chars = max_chars;
        self.omitted_marker = omitted_marker.into();
        self
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Header, timestamp (minute precision, in the configured offset),
    /// separator, then `"<rank>. <label>"` per entry starting at 1.
    ///
    /// Output longer than `max_chars` characters is cut at exactly that many
    /// characters and the omitted marker is appended. The cut ignores line
    /// boundaries.
    pub fn build<I, Tz>(&self, labels: I, at: &DateTime<Tz>) -> String
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
        Tz: TimeZone,
    {
        let local = at.with_timezone(&self.offset);
        let mut text = String::new();
        text.push_str(&self.header);
        text.push('\n');
        text.push_str(&local.format(TIMESTAMP_FORMAT).to_string());
        text.push('\n');
        text.push_str(SEPARATOR);
        for (i, label) in labels.into_iter().enumerate() {
            text.push_str(&format!("\n{}. {}", i + 1, label.as_ref()));
        }

        match text.char_indices().nth(self.max_chars) {
            Some((cut, _)) => {
                tracing::warn!(
                    max_chars = self.max_chars,
                    total_chars = text.chars().count(),
                    "message.truncated"
                );
                text.truncate(cut);
                text.push_str(&self.omitted_marker);
                text
            }
            None => text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_instant() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 3, 4, 59).unwrap()
    }

    #[test]
    fn renders_header_timestamp_separator_and_ranks() {
        let text = MessageBuilder::new().build(["A", "B", "C"], &sample_instant());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                DEFAULT_HEADER,
                "2024-05-01 12:04",
                SEPARATOR,
                "1. A",
                "2. B",
                "3. C",
            ]
        );
    }

    #[test]
    fn empty_label_keeps_its_rank_line() {
        let text = MessageBuilder::new().build(["A", "", "C"], &sample_instant());
        let body: Vec<&str> = text.lines().skip(3).collect();
        assert_eq!(body, vec!["1. A", "2. ", "3. C"]);
    }

    #[test]
    fn timestamp_follows_configured_offset() {
        let text = MessageBuilder::new()
            .with_utc_offset_minutes(0)
            .unwrap()
            .build(["x"], &sample_instant());
        assert_eq!(text.lines().nth(1), Some("2024-05-01 03:04"));
    }

    #[test]
    fn rejects_impossible_offsets() {
        assert!(MessageBuilder::new().with_utc_offset_minutes(24 * 60).is_err());
        assert!(MessageBuilder::new().with_utc_offset_minutes(i32::MAX).is_err());
    }

    #[test]
    fn short_messages_are_untouched() {
        let builder = MessageBuilder::new();
        let text = builder.build(["東京都"; 50], &sample_instant());
        assert!(text.chars().count() <= builder.max_chars());
        assert!(!text.ends_with(DEFAULT_OMITTED_MARKER));
    }

    #[test]
    fn long_messages_are_cut_at_char_count() {
        let label = "あ".repeat(200);
        let labels = vec![label.as_str(); 50];
        let text = MessageBuilder::new().build(&labels, &sample_instant());

        assert!(text.ends_with(DEFAULT_OMITTED_MARKER));
        let body: String = text.chars().take(DEFAULT_MAX_CHARS).collect();
        assert_eq!(format!("{body}{DEFAULT_OMITTED_MARKER}"), text);
        assert_eq!(
            text.chars().count(),
            DEFAULT_MAX_CHARS + DEFAULT_OMITTED_MARKER.chars().count()
        );
    }

    #[test]
    fn cut_lands_mid_line() {
        let text = MessageBuilder::new()
            .with_header("H")
            .with_max_chars(20, "~")
            .build(["abcdefghij"], &sample_instant());
        // "H\n2024-05-01 12:04\n" is 19 chars; one more from the separator.
        assert_eq!(text, "H\n2024-05-01 12:04\n-~");
    }
}
