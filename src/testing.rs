//! In-process doubles for fetch and chat backends.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::rss::{FetchedPage, PageFetcher};
use crate::session::ChatBackend;

/// Serves canned pages by URL and records every request.
#[derive(Default)]
pub struct StaticFetcher {
    pages: HashMap<String, (u16, String)>,
    requests: Mutex<Vec<String>>,
}

impl StaticFetcher {
    pub fn page(mut self, url: &str, body: &str) -> Self {
        self.pages.insert(url.to_string(), (200, body.to_string()));
        self
    }

    pub fn status(mut self, url: &str, status: u16) -> Self {
        self.pages.insert(url.to_string(), (status, String::new()));
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        self.requests.lock().unwrap().push(url.to_string());
        match self.pages.get(url) {
            Some((200, body)) => Ok(FetchedPage::new(None, body.as_bytes())),
            Some((status, _)) => Err(Error::transport(url, format!("HTTP {}", status))),
            None => Err(Error::transport(url, "HTTP 404 Not Found")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendEvent {
    Connect,
    ProcessStarted,
    Send {
        recipients: Vec<String>,
        message: String,
    },
    Disconnect,
    ProcessStopped,
}

/// Chat backend that records each call with the (tokio) time it happened.
#[derive(Clone, Default)]
pub struct RecordingBackend {
    events: Arc<Mutex<Vec<(BackendEvent, Instant)>>>,
    fail_connect: bool,
    fail_send: bool,
    fail_events: bool,
}

impl RecordingBackend {
    pub fn failing_connect(mut self) -> Self {
        self.fail_connect = true;
        self
    }

    pub fn failing_send(mut self) -> Self {
        self.fail_send = true;
        self
    }

    pub fn failing_events(mut self) -> Self {
        self.fail_events = true;
        self
    }

    pub fn events(&self) -> Vec<(BackendEvent, Instant)> {
        self.events.lock().unwrap().clone()
    }

    pub fn send_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|(event, _)| matches!(event, BackendEvent::Send { .. }))
            .count()
    }

    fn record(&self, event: BackendEvent) {
        self.events.lock().unwrap().push((event, Instant::now()));
    }
}

#[async_trait]
impl ChatBackend for RecordingBackend {
    async fn connect(&self) -> Result<()> {
        if self.fail_connect {
            return Err(Error::connection("invalid_auth"));
        }
        self.record(BackendEvent::Connect);
        Ok(())
    }

    async fn process_events(&self, shutdown: CancellationToken) -> Result<()> {
        self.record(BackendEvent::ProcessStarted);
        if self.fail_events {
            return Err(Error::session("roster sync failed"));
        }
        shutdown.cancelled().await;
        self.record(BackendEvent::ProcessStopped);
        Ok(())
    }

    async fn send_to(&self, recipients: &[String], message: &str) -> Result<()> {
        if self.fail_send {
            return Err(Error::session("message rejected"));
        }
        self.record(BackendEvent::Send {
            recipients: recipients.to_vec(),
            message: message.to_string(),
        });
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.record(BackendEvent::Disconnect);
        Ok(())
    }
}
