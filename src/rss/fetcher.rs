//! Feed fetching and keyword scanning of detail pages.

use tracing::{debug, info};

use super::client::PageFetcher;
use super::types::{ScanOutcome, WarningItem};
use super::util::is_valid_url;
use crate::error::{Error, Result};
use crate::TARGET_WEB_REQUEST;

/// Fetch the raw feed document. One attempt, HTTP 200 only.
pub async fn fetch_feed<F>(fetcher: &F, feed_url: &str) -> Result<Vec<u8>>
where
    F: PageFetcher + ?Sized,
{
    if !is_valid_url(feed_url) {
        return Err(Error::transport(feed_url, "not an http(s) URL"));
    }

    info!(target: TARGET_WEB_REQUEST, "Loading feed from {}", feed_url);
    let page = fetcher.fetch(feed_url).await?;
    debug!(target: TARGET_WEB_REQUEST, "Feed Content-Type: {:?}", page.content_type);
    Ok(page.body)
}

/// Notification text for a matching item.
pub fn compose_message(item: &WarningItem) -> String {
    format!("Watch out wyn! ({}: {})", item.title, item.link)
}

/// Fetch every item's detail page and look for `keyword` in the body.
///
/// The comparison is a case-sensitive substring test. Every item is fetched
/// even after a match, and a later match replaces an earlier one. The first
/// failed fetch aborts the scan and discards any pending match.
pub async fn scan_items<F>(fetcher: &F, items: Vec<WarningItem>, keyword: &str) -> Result<ScanOutcome>
where
    F: PageFetcher + ?Sized,
{
    let mut outcome = ScanOutcome::default();

    for item in items {
        debug!(target: TARGET_WEB_REQUEST, "Checking \"{}\" at {}", item.title, item.link);
        let page = fetcher.fetch(&item.link).await?;
        outcome.scanned += 1;

        if page.text().contains(keyword) {
            info!(target: TARGET_WEB_REQUEST, "\"{}\" mentions {}", item.title, keyword);
            outcome.matched += 1;
            outcome.message = Some(compose_message(&item));
        }
    }

    Ok(outcome)
}
