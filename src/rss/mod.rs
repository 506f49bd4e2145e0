//! Feed processing for wynweather.
//!
//! Fetches a warning feed, extracts its items and scans each item's detail
//! page for a keyword.

mod client;
mod fetcher;
mod parser;
mod types;
mod util;

pub use self::types::*;

pub use self::client::{create_http_client, FetchedPage, HttpFetcher, PageFetcher};
pub use self::fetcher::{compose_message, fetch_feed, scan_items};
pub use self::parser::parse_feed;
pub use self::test::test_rss_feed;
pub use self::util::{cleanup_xml, is_valid_url};
