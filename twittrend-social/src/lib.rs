//! Outbound side of a run: turning a trend list into one chat message and
//! delivering it.
//!
//! [`message::MessageBuilder`] renders the text, [`Notifier`] is the delivery
//! seam. [`line::LinePushClient`] pushes to a LINE group; [`StdoutNotifier`]
//! prints instead (dry runs).
use async_trait::async_trait;
use std::io::Write;
use twittrend_common::{Result, TrendError};

pub mod line;
pub mod message;

pub use line::{LineCredentials, LinePushClient};
pub use message::MessageBuilder;

/// Delivers one fully rendered message. One attempt, no retries.
#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;

    async fn notify(&self, message: &str) -> Result<()>;
}

/// Writes the message to stdout. Used by `--dry-run`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutNotifier;

#[async_trait]
impl Notifier for StdoutNotifier {
    fn name(&self) -> &str {
        "stdout"
    }

    async fn notify(&self, message: &str) -> Result<()> {
        let mut out = std::io::stdout().lock();
        writeln!(out, "{message}")
            .and_then(|_| out.flush())
            .map_err(|e| TrendError::Delivery {
                status: None,
                message: format!("writing to stdout: {e}"),
                body: String::new(),
            })
    }
}
