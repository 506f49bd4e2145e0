pub mod config;
pub mod environment;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod rss;
pub mod session;
pub mod slack;

#[cfg(test)]
mod testing;

pub use error::{Error, Result};

pub const APP_NAME: &str = "wynweather";

pub const TARGET_WEB_REQUEST: &str = "web_request";
pub const TARGET_CHAT: &str = "chat";

/// Everything the core needs for one scan-and-notify run.
#[derive(Clone, Debug)]
pub struct WatchRequest {
    pub feed_url: String,
    pub keyword: String,
    pub recipient: String,
}
