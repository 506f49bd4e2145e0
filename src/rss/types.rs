//! Type definitions for the RSS module.

use serde::Serialize;

/// One `<item>` of a warning feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WarningItem {
    pub title: String,
    pub link: String,
}

impl WarningItem {
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
        }
    }
}

/// Items extracted from one feed document.
#[derive(Debug, Clone, Default)]
pub struct ParsedFeed {
    pub items: Vec<WarningItem>,
    /// The raw payload only parsed after `cleanup_xml`.
    pub needed_cleanup: bool,
}

/// Outcome of scanning every item's detail page for the keyword.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOutcome {
    /// Message for the last matching item, if any matched.
    pub message: Option<String>,
    pub scanned: usize,
    pub matched: usize,
}

/// Diagnostic status codes for feed testing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RssFeedStatus {
    Success,
    RequestFailed,
    ParseError,
    ItemMismatch,
}

/// Detailed test results for a feed
#[derive(Debug, Clone, Serialize)]
pub struct TestRssFeedResult {
    pub status: RssFeedStatus,
    pub content_type: Option<String>,
    pub decoded_preview: Option<String>,
    pub entries_found: usize,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub entries: Vec<WarningItem>,
}

impl TestRssFeedResult {
    pub fn new() -> Self {
        Self {
            status: RssFeedStatus::Success,
            content_type: None,
            decoded_preview: None,
            entries_found: 0,
            errors: Vec::new(),
            warnings: Vec::new(),
            entries: Vec::new(),
        }
    }
}

impl Default for TestRssFeedResult {
    fn default() -> Self {
        Self::new()
    }
}
