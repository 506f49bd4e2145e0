//! HTTP client creation and request handling for feeds and detail pages.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, StatusCode};
use tracing::debug;

use crate::error::{Error, Result};
use crate::TARGET_WEB_REQUEST;

/// Create the client shared by every request of a run.
pub fn create_http_client(timeout: Duration, user_agent: &str) -> Result<reqwest::Client> {
    debug!(target: TARGET_WEB_REQUEST, "Creating HTTP client with {:?} timeout", timeout);
    reqwest::Client::builder()
        .gzip(true)
        .timeout(timeout)
        .user_agent(user_agent)
        .redirect(reqwest::redirect::Policy::default())
        .build()
        .map_err(|e| Error::config(format!("failed to build HTTP client: {}", e)))
}

/// A successfully fetched (HTTP 200) response body.
#[derive(Debug, Clone, Default)]
pub struct FetchedPage {
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl FetchedPage {
    pub fn new(content_type: Option<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            content_type,
            body: body.into(),
        }
    }

    /// Decodes the body using the charset from `Content-Type`, defaulting to UTF-8.
    pub fn text(&self) -> String {
        let encoding = self
            .content_type
            .as_deref()
            .and_then(charset_from_content_type)
            .and_then(|label| encoding_rs::Encoding::for_label(label.as_bytes()))
            .unwrap_or(encoding_rs::UTF_8);
        let (decoded, _, _) = encoding.decode(&self.body);
        decoded.into_owned()
    }
}

fn charset_from_content_type(content_type: &str) -> Option<&str> {
    content_type
        .split(';')
        .map(str::trim)
        .find(|part| part.to_lowercase().starts_with("charset="))
        .and_then(|part| part.split('=').nth(1))
        .map(|charset| charset.trim_matches('"'))
}

/// Single-attempt GET used for the feed and every detail page.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches `url`. Anything other than HTTP 200 is a transport error.
    async fn fetch(&self, url: &str) -> Result<FetchedPage>;
}

#[derive(Clone, Debug)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        debug!(target: TARGET_WEB_REQUEST, "GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::transport(url, e))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(Error::transport(url, format!("HTTP {}", status)));
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|ct| ct.to_str().ok())
            .map(|s| s.to_lowercase());

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::transport(url, format!("failed to read body: {}", e)))?;

        debug!(target: TARGET_WEB_REQUEST, "Fetched {} bytes from {}", body.len(), url);
        Ok(FetchedPage::new(content_type, body.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new(create_http_client(Duration::from_secs(5), "wynweather-test").unwrap())
    }

    #[tokio::test]
    async fn fetch_returns_body_on_200() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/feed.xml")
            .with_status(200)
            .with_header("content-type", "application/rss+xml")
            .with_body("<rss/>")
            .create_async()
            .await;

        let page = fetcher()
            .fetch(&format!("{}/feed.xml", server.url()))
            .await
            .unwrap();

        assert_eq!(page.body, b"<rss/>");
        assert_eq!(page.content_type.as_deref(), Some("application/rss+xml"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn fetch_rejects_non_200_success_codes() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/feed.xml")
            .with_status(204)
            .create_async()
            .await;

        let err = fetcher()
            .fetch(&format!("{}/feed.xml", server.url()))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Transport { .. }));
        assert!(err.to_string().contains("204"));
    }

    #[tokio::test]
    async fn fetch_rejects_server_errors() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/feed.xml")
            .with_status(503)
            .create_async()
            .await;

        let err = fetcher()
            .fetch(&format!("{}/feed.xml", server.url()))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Transport { .. }));
    }

    #[test]
    fn text_honours_declared_charset() {
        let page = FetchedPage::new(
            Some("text/html; charset=iso-8859-1".to_string()),
            vec![b'C', 0xe9, b'r', b'e', b's'],
        );
        assert_eq!(page.text(), "Céres");
    }

    #[test]
    fn text_defaults_to_utf8() {
        let page = FetchedPage::new(None, "Hawthorn East".as_bytes());
        assert_eq!(page.text(), "Hawthorn East");
    }
}
