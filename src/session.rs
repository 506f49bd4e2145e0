//! One-shot chat notification session.
//!
//! A session walks `Disconnected → Connecting → Connected → RosterSettling →
//! Sent → Disconnecting → Closed`. Connecting spawns the backend's event
//! processing as a background task; disconnecting cancels it and, when asked
//! to wait, joins it before returning.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::TARGET_CHAT;

/// A session-oriented chat protocol.
#[async_trait]
pub trait ChatBackend: Send + Sync + 'static {
    /// Establish and authenticate the connection.
    async fn connect(&self) -> Result<()>;

    /// Service incoming protocol events (directory/roster updates) until
    /// `shutdown` is cancelled.
    async fn process_events(&self, shutdown: CancellationToken) -> Result<()>;

    /// Send one direct message to each recipient.
    async fn send_to(&self, recipients: &[String], message: &str) -> Result<()>;

    /// Tear down the connection.
    async fn disconnect(&self) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected,
    RosterSettling,
    Sent,
    Disconnecting,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

pub struct NotificationSession<B: ChatBackend> {
    backend: Arc<B>,
    state: SessionState,
    settle_delay: Duration,
    shutdown: CancellationToken,
    events: Option<JoinHandle<Result<()>>>,
}

impl<B: ChatBackend> NotificationSession<B> {
    pub fn new(backend: B, settle_delay: Duration) -> Self {
        Self {
            backend: Arc::new(backend),
            state: SessionState::Disconnected,
            settle_delay,
            shutdown: CancellationToken::new(),
            events: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Connect, settle, send `message` to `recipient`, then disconnect and
    /// wait for teardown. The session is closed whether or not the send
    /// succeeded; the first error wins.
    pub async fn notify(mut self, recipient: &str, message: &str) -> Result<()> {
        self.connect().await?;

        let delivered = match self.settle().await {
            Ok(()) => self.send(recipient, message).await,
            Err(e) => Err(e),
        };
        let closed = self.disconnect(true).await;

        delivered?;
        closed
    }

    /// Authenticate against the backend and start event processing in the
    /// background. Any failure here is a connection error.
    pub async fn connect(&mut self) -> Result<()> {
        self.expect_state(SessionState::Disconnected, "connect")?;
        self.state = SessionState::Connecting;
        debug!(target: TARGET_CHAT, "Connecting to chat backend");

        if let Err(err) = self.backend.connect().await {
            self.state = SessionState::Closed;
            return Err(match err {
                Error::Connection { .. } => err,
                other => Error::connection(other),
            });
        }

        self.state = SessionState::Connected;
        info!(target: TARGET_CHAT, "Connected to chat backend");

        let backend = Arc::clone(&self.backend);
        let shutdown = self.shutdown.clone();
        self.events = Some(tokio::spawn(async move {
            backend.process_events(shutdown).await
        }));
        Ok(())
    }

    /// Give the backend's directory time to propagate before sending.
    pub async fn settle(&mut self) -> Result<()> {
        self.expect_state(SessionState::Connected, "settle")?;
        self.state = SessionState::RosterSettling;
        debug!(target: TARGET_CHAT, "Waiting {:?} for roster to settle", self.settle_delay);
        tokio::time::sleep(self.settle_delay).await;
        Ok(())
    }

    pub async fn send(&mut self, recipient: &str, message: &str) -> Result<()> {
        self.expect_state(SessionState::RosterSettling, "send")?;
        info!(target: TARGET_CHAT, "Sending notification to {}", recipient);
        self.backend
            .send_to(&[recipient.to_string()], message)
            .await?;
        self.state = SessionState::Sent;
        Ok(())
    }

    /// Stop event processing and tear down the connection. With `wait` the
    /// background task is joined and its failure, if any, is returned.
    pub async fn disconnect(&mut self, wait: bool) -> Result<()> {
        match self.state {
            SessionState::Closed => return Ok(()),
            SessionState::Disconnected => {
                self.state = SessionState::Closed;
                return Ok(());
            }
            _ => {}
        }

        self.state = SessionState::Disconnecting;
        debug!(target: TARGET_CHAT, "Disconnecting from chat backend");
        self.shutdown.cancel();
        let teardown = self.backend.disconnect().await;

        let events = match self.events.take() {
            Some(handle) if wait => match handle.await {
                Ok(result) => result,
                Err(join_err) => Err(Error::session(format!(
                    "event processing task failed: {}",
                    join_err
                ))),
            },
            Some(_) => {
                debug!(target: TARGET_CHAT, "Not waiting for event processing to finish");
                Ok(())
            }
            None => Ok(()),
        };

        self.state = SessionState::Closed;
        teardown?;
        events?;
        info!(target: TARGET_CHAT, "Chat session closed");
        Ok(())
    }

    fn expect_state(&self, expected: SessionState, operation: &str) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(Error::session(format!(
                "cannot {} while {} (expected {})",
                operation, self.state, expected
            )))
        }
    }
}

impl<B: ChatBackend> Drop for NotificationSession<B> {
    fn drop(&mut self) {
        if self.events.is_some() {
            warn!(target: TARGET_CHAT, "Chat session dropped without disconnecting");
        }
        self.shutdown.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{BackendEvent, RecordingBackend};

    const SETTLE: Duration = Duration::from_secs(5);

    #[tokio::test(start_paused = true)]
    async fn notify_runs_connect_settle_send_disconnect_in_order() {
        let backend = RecordingBackend::default();
        let session = NotificationSession::new(backend.clone(), SETTLE);

        session
            .notify("wyn@example.test", "Watch out wyn! (A: http://example.test/a)")
            .await
            .unwrap();

        let events = backend.events();
        let kinds: Vec<&BackendEvent> = events.iter().map(|(event, _)| event).collect();
        assert_eq!(
            kinds,
            vec![
                &BackendEvent::Connect,
                &BackendEvent::ProcessStarted,
                &BackendEvent::Send {
                    recipients: vec!["wyn@example.test".to_string()],
                    message: "Watch out wyn! (A: http://example.test/a)".to_string(),
                },
                &BackendEvent::Disconnect,
                &BackendEvent::ProcessStopped,
            ]
        );

        let connected_at = events[0].1;
        let sent_at = events[2].1;
        assert!(sent_at.duration_since(connected_at) >= SETTLE);
    }

    #[tokio::test(start_paused = true)]
    async fn states_advance_through_the_handshake() {
        let backend = RecordingBackend::default();
        let mut session = NotificationSession::new(backend.clone(), SETTLE);
        assert_eq!(session.state(), SessionState::Disconnected);

        session.connect().await.unwrap();
        assert_eq!(session.state(), SessionState::Connected);

        session.settle().await.unwrap();
        assert_eq!(session.state(), SessionState::RosterSettling);

        session.send("wyn", "hello").await.unwrap();
        assert_eq!(session.state(), SessionState::Sent);

        session.disconnect(true).await.unwrap();
        assert_eq!(session.state(), SessionState::Closed);
        assert_eq!(backend.send_count(), 1);
    }

    #[tokio::test]
    async fn rejected_connect_is_a_connection_error() {
        let backend = RecordingBackend::default().failing_connect();
        let session = NotificationSession::new(backend.clone(), SETTLE);

        let err = session.notify("wyn", "hello").await.unwrap_err();

        assert!(matches!(err, Error::Connection { .. }));
        assert_eq!(backend.send_count(), 0);
        assert!(!backend
            .events()
            .iter()
            .any(|(event, _)| *event == BackendEvent::ProcessStarted));
    }

    #[tokio::test(start_paused = true)]
    async fn send_before_settling_is_refused() {
        let backend = RecordingBackend::default();
        let mut session = NotificationSession::new(backend.clone(), SETTLE);
        session.connect().await.unwrap();

        let err = session.send("wyn", "too early").await.unwrap_err();
        assert!(matches!(err, Error::Session { .. }));
        assert_eq!(backend.send_count(), 0);

        session.disconnect(true).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn failed_send_still_closes_the_session() {
        let backend = RecordingBackend::default().failing_send();
        let session = NotificationSession::new(backend.clone(), SETTLE);

        let err = session.notify("wyn", "hello").await.unwrap_err();

        assert!(matches!(err, Error::Session { .. }));
        let events = backend.events();
        assert_eq!(events.last().map(|(e, _)| e), Some(&BackendEvent::ProcessStopped));
    }

    #[tokio::test(start_paused = true)]
    async fn event_task_failure_surfaces_at_disconnect() {
        let backend = RecordingBackend::default().failing_events();
        let mut session = NotificationSession::new(backend.clone(), SETTLE);

        session.connect().await.unwrap();
        session.settle().await.unwrap();
        session.send("wyn", "hello").await.unwrap();
        let err = session.disconnect(true).await.unwrap_err();

        assert!(matches!(err, Error::Session { .. }));
        assert_eq!(session.state(), SessionState::Closed);
    }

    #[tokio::test]
    async fn disconnect_without_connect_is_a_no_op() {
        let backend = RecordingBackend::default();
        let mut session = NotificationSession::new(backend.clone(), SETTLE);

        session.disconnect(true).await.unwrap();

        assert_eq!(session.state(), SessionState::Closed);
        assert!(backend.events().is_empty());
    }
}
