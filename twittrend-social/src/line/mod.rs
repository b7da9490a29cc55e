//! LINE Messaging API push delivery.
//!
//! Credentials are checked when they are built, so a bad destination id or
//! token is reported before anything touches the network.
pub mod client;
pub mod types;

pub use client::{LineCredentials, LinePushClient};
