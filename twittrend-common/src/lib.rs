//! Common types and utilities shared across twittrend crates.
//!
//! This crate defines the closed error set every pipeline stage reports
//! through, plus the observability helpers binaries and tests use to set up
//! `tracing`. It is intentionally lightweight so that every crate can depend
//! on it without pulling in the HTTP or parsing stacks.
//!
//! # Overview
//!
//! - [`TrendError`] and [`Result`]: shared error handling
//! - [`ExtractionFailure`]: why the trend list could not be located
//! - [`observability`]: centralised tracing/logging initialisation
//!
//! # Examples
//!
//! Discriminating failure kinds without string matching:
//!
//! ```rust
//! use twittrend_common::{ErrorKind, ExtractionFailure, TrendError};
//!
//! let err = TrendError::Extraction(ExtractionFailure::ListTooShort {
//!     best_count: 8,
//!     threshold: 20,
//!     lists_scanned: 3,
//! });
//! assert_eq!(err.kind(), ErrorKind::Extraction);
//! assert!(err.to_string().contains("8 items"));
//! ```

pub mod observability;

/// Why the extractor could not produce a trend list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionFailure {
    /// No list element reached the item threshold.
    ListTooShort {
        best_count: usize,
        threshold: usize,
        lists_scanned: usize,
    },
    /// The winning list existed but every item normalized to an empty label.
    NoUsableEntries { candidates: usize },
}

impl std::fmt::Display for ExtractionFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ListTooShort {
                best_count,
                threshold,
                lists_scanned,
            } => write!(
                f,
                "trend list not found or too short: longest list has {best_count} items, \
                 need at least {threshold} ({lists_scanned} lists scanned)"
            ),
            Self::NoUsableEntries { candidates } => write!(
                f,
                "trend list has no usable entries: all {candidates} items were empty after normalization"
            ),
        }
    }
}

/// Error types used across a trend run. Every variant is terminal.
#[derive(thiserror::Error, Debug)]
pub enum TrendError {
    /// The source page could not be retrieved.
    #[error("fetch failed for {url}{}: {message}", status_suffix(.status))]
    Fetch {
        url: String,
        status: Option<u16>,
        message: String,
    },

    /// The trend list could not be located in the document.
    #[error("extraction failed: {0}")]
    Extraction(ExtractionFailure),

    /// A required setting was missing or malformed.
    #[error("configuration error ({key}): {message}")]
    Config { key: String, message: String },

    /// The push API did not accept the message.
    #[error("delivery failed{}: {message}, body: {body}", status_suffix(.status))]
    Delivery {
        status: Option<u16>,
        message: String,
        body: String,
    },
}

/// Fieldless discriminant of [`TrendError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Fetch,
    Extraction,
    Config,
    Delivery,
}

impl TrendError {
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config {
            key: key.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Fetch { .. } => ErrorKind::Fetch,
            Self::Extraction(_) => ErrorKind::Extraction,
            Self::Config { .. } => ErrorKind::Config,
            Self::Delivery { .. } => ErrorKind::Delivery,
        }
    }

    /// HTTP status attached to fetch/delivery failures, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Fetch { status, .. } | Self::Delivery { status, .. } => *status,
            _ => None,
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (status {s})")).unwrap_or_default()
}

/// Convenient alias for results that use [`TrendError`].
pub type Result<T> = std::result::Result<T, TrendError>;
