//! Feed parsing: RSS item lists into `(title, link)` pairs.

use std::io::Cursor;

use feed_rs::model::{Feed, FeedType};
use feed_rs::parser;
use tracing::{debug, warn};

use super::types::{ParsedFeed, WarningItem};
use super::util::{cleanup_xml, preview};
use crate::error::{Error, Result};
use crate::TARGET_WEB_REQUEST;

/// Parse a fetched feed document into warning items.
///
/// A payload that fails to parse gets one pass through [`cleanup_xml`] before
/// the error is reported.
pub fn parse_feed(bytes: &[u8]) -> Result<ParsedFeed> {
    match parser::parse(Cursor::new(bytes)) {
        Ok(feed) => Ok(ParsedFeed {
            items: extract_items(feed)?,
            needed_cleanup: false,
        }),
        Err(first_err) => {
            debug!(target: TARGET_WEB_REQUEST, "Feed parse failed ({}), retrying after cleanup", first_err);
            let text = String::from_utf8_lossy(bytes);
            let cleaned = cleanup_xml(&text);

            if !cleaned.contains("<rss") && !cleaned.contains("<item") {
                return Err(Error::parse(format!(
                    "document is not an item list: {}",
                    preview(&text, 100)
                )));
            }

            match parser::parse(Cursor::new(cleaned.as_bytes())) {
                Ok(feed) => {
                    warn!(target: TARGET_WEB_REQUEST, "Feed only parsed after XML cleanup");
                    Ok(ParsedFeed {
                        items: extract_items(feed)?,
                        needed_cleanup: true,
                    })
                }
                Err(second_err) => Err(Error::parse(format!(
                    "{}; after cleanup: {}",
                    first_err, second_err
                ))),
            }
        }
    }
}

/// Pairs each item's title with its link.
///
/// Every item must carry both. A feed with an incomplete item is rejected
/// instead of being truncated to the shorter list.
fn extract_items(feed: Feed) -> Result<Vec<WarningItem>> {
    match feed.feed_type {
        FeedType::RSS0 | FeedType::RSS1 | FeedType::RSS2 => {}
        other => {
            return Err(Error::parse(format!(
                "unsupported feed type {:?}, expected an RSS item list",
                other
            )))
        }
    }

    let titles: Vec<Option<String>> = feed
        .entries
        .iter()
        .map(|entry| {
            entry
                .title
                .as_ref()
                .map(|t| t.content.trim().to_string())
                .filter(|t| !t.is_empty())
        })
        .collect();
    let links: Vec<Option<String>> = feed
        .entries
        .iter()
        .map(|entry| {
            entry
                .links
                .first()
                .map(|link| link.href.trim().to_string())
                .filter(|href| !href.is_empty())
        })
        .collect();

    let title_count = titles.iter().flatten().count();
    let link_count = links.iter().flatten().count();
    if title_count != feed.entries.len() || link_count != feed.entries.len() {
        return Err(Error::Mismatch {
            items: feed.entries.len(),
            titles: title_count,
            links: link_count,
        });
    }

    let items: Vec<WarningItem> = titles
        .into_iter()
        .flatten()
        .zip(links.into_iter().flatten())
        .map(|(title, link)| WarningItem { title, link })
        .collect();

    debug!(target: TARGET_WEB_REQUEST, "Parsed feed with {} items", items.len());
    Ok(items)
}
