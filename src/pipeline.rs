//! Drives one scan-and-notify run: fetch the feed, parse it, scan every item
//! and, only when something matched, notify the recipient.

use std::time::Duration;

use reqwest::Client;
use tracing::info;

use crate::config::{Credentials, WatchConfig};
use crate::error::Result;
use crate::rss::{fetch_feed, parse_feed, scan_items, HttpFetcher, PageFetcher};
use crate::session::{ChatBackend, NotificationSession};
use crate::slack::SlackBackend;
use crate::{WatchRequest, TARGET_WEB_REQUEST};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOutcome {
    pub items: usize,
    pub matched: usize,
    pub message: Option<String>,
    pub notified: bool,
}

/// Run the pipeline once. `connect` builds the chat backend and is only
/// called when a notification is actually going to be sent.
pub async fn run<F, B, C>(
    fetcher: &F,
    request: &WatchRequest,
    settle_delay: Duration,
    connect: C,
) -> Result<RunOutcome>
where
    F: PageFetcher + ?Sized,
    B: ChatBackend,
    C: FnOnce() -> B,
{
    let document = fetch_feed(fetcher, &request.feed_url).await?;
    let parsed = parse_feed(&document)?;
    drop(document);

    let items = parsed.items.len();
    info!(target: TARGET_WEB_REQUEST, "Scanning {} warnings for \"{}\"", items, request.keyword);
    let scan = scan_items(fetcher, parsed.items, &request.keyword).await?;

    let Some(message) = scan.message else {
        info!("No warnings mention \"{}\", nothing to send", request.keyword);
        return Ok(RunOutcome {
            items,
            matched: scan.matched,
            message: None,
            notified: false,
        });
    };

    NotificationSession::new(connect(), settle_delay)
        .notify(&request.recipient, &message)
        .await?;

    let outcome = RunOutcome {
        items,
        matched: scan.matched,
        message: Some(message),
        notified: true,
    };
    info!(
        "Scanned {} warnings, {} matched, notified {}",
        outcome.items, outcome.matched, request.recipient
    );
    Ok(outcome)
}

/// Run against real HTTP endpoints with Slack as the chat backend.
pub async fn run_with_slack(
    client: &Client,
    request: &WatchRequest,
    watch: &WatchConfig,
    credentials: Credentials,
) -> Result<RunOutcome> {
    let fetcher = HttpFetcher::new(client.clone());
    run(&fetcher, request, watch.settle_delay(), || {
        SlackBackend::new(client.clone(), credentials)
    })
    .await
}
