//! One run: fetch, extract, format, deliver. Strictly in that order.
use chrono::Utc;
use std::time::Duration;
use twittrend_common::Result;
use twittrend_config::TrendConfig;
use twittrend_social::{
    LineCredentials, LinePushClient, MessageBuilder, Notifier, StdoutNotifier,
};
use twittrend_web::{Landmarks, PageFetcher, SourcePage, TrendExtractor};

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub dry_run: bool,
    pub landmark_fallback: bool,
}

/// What a successful run delivered.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub entries: usize,
    pub chars: usize,
    pub notifier: String,
}

pub struct Pipeline {
    fetcher: PageFetcher,
    extractor: TrendExtractor,
    builder: MessageBuilder,
    notifier: Box<dyn Notifier>,
}

/// Wire every stage from config. Credentials are checked here, so a missing
/// or malformed LINE setting fails before any request is made.
pub fn build_from_config(cfg: &TrendConfig, opts: RunOptions) -> Result<Pipeline> {
    let notifier: Box<dyn Notifier> = if opts.dry_run {
        Box::new(StdoutNotifier)
    } else {
        let creds = LineCredentials::new(
            cfg.line.channel_access_token.as_deref(),
            cfg.line.group_id.as_deref(),
        )?;
        Box::new(
            LinePushClient::new(&cfg.line.endpoint, creds)?
                .with_timeout(Duration::from_secs(cfg.line.timeout_secs)),
        )
    };

    let fetcher = PageFetcher::new(SourcePage {
        url: cfg.source.url.clone(),
        timeout: Duration::from_secs(cfg.source.timeout_secs),
        user_agent: cfg.source.user_agent.clone(),
        accept_language: cfg.source.accept_language.clone(),
    })?;

    let mut extractor =
        TrendExtractor::new().with_limits(cfg.extract.min_items, cfg.extract.max_items);
    if opts.landmark_fallback {
        extractor = extractor.with_landmark_fallback(Landmarks {
            region_marker: cfg.extract.region_marker.clone(),
            current_marker: cfg.extract.current_marker.clone(),
        });
    }

    let builder = MessageBuilder::new()
        .with_header(cfg.message.header.clone())
        .with_utc_offset_minutes(cfg.message.utc_offset_minutes)?
        .with_max_chars(cfg.message.max_chars, cfg.message.omitted_marker.clone());

    tracing::debug!(
        source = fetcher.url(),
        notifier = notifier.name(),
        min_items = extractor.min_items(),
        max_items = extractor.max_items(),
        landmark_fallback = opts.landmark_fallback,
        "pipeline.ready"
    );

    Ok(Pipeline {
        fetcher,
        extractor,
        builder,
        notifier,
    })
}

impl Pipeline {
    pub async fn run(&self) -> Result<RunReport> {
        let page = self.fetcher.fetch().await?;
        let trends = self.extractor.extract_document(&page)?;
        tracing::info!(entries = trends.len(), "extract.ok");

        let message = self.builder.build(&trends, &Utc::now());
        self.notifier.notify(&message).await?;

        Ok(RunReport {
            entries: trends.len(),
            chars: message.chars().count(),
            notifier: self.notifier.name().to_string(),
        })
    }
}
