use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures of a scan-and-notify run. None of them are recovered locally.
#[derive(Debug, Error)]
pub enum Error {
    /// A feed or detail page request failed or returned something other than 200.
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    /// The feed payload is not a well-formed item list.
    #[error("failed to parse feed: {message}")]
    Parse { message: String },

    /// Some feed items lack a title or a link.
    #[error("feed has {items} items but {titles} titles and {links} links")]
    Mismatch {
        items: usize,
        titles: usize,
        links: usize,
    },

    /// The chat session could not be established.
    #[error("unable to connect to chat backend: {message}")]
    Connection { message: String },

    /// The chat session failed after connecting.
    #[error("chat session error: {message}")]
    Session { message: String },

    #[error("configuration error: {message}")]
    Config { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    #[must_use]
    pub fn transport(url: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Transport {
            url: url.into(),
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn parse(message: impl std::fmt::Display) -> Self {
        Self::Parse {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn connection(message: impl std::fmt::Display) -> Self {
        Self::Connection {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn session(message: impl std::fmt::Display) -> Self {
        Self::Session {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn config(message: impl std::fmt::Display) -> Self {
        Self::Config {
            message: message.to_string(),
        }
    }
}
