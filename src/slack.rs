//! Slack Web API as a session-oriented chat backend.
//!
//! `auth.test` authenticates the session, the background task keeps a copy of
//! the workspace directory from `users.list`, and a send opens a DM with
//! `conversations.open` before posting with `chat.postMessage`.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::Credentials;
use crate::error::{Error, Result};
use crate::session::ChatBackend;
use crate::TARGET_CHAT;

/// How often the directory is re-read while the session is open.
pub const ROSTER_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

const USERS_PAGE_SIZE: u32 = 200;

/// Why a single Web API call failed. Callers decide whether that breaks the
/// connection or only the session.
#[derive(Debug, thiserror::Error)]
enum ApiError {
    #[error("{method}: {source}")]
    Request {
        method: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{method}: HTTP {status}: {body}")]
    Http {
        method: &'static str,
        status: StatusCode,
        body: String,
    },

    #[error("{method}: invalid response: {source}")]
    Decode {
        method: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// Slack answered `"ok": false`.
    #[error("{method}: {code}")]
    Rejected { method: &'static str, code: String },
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(flatten)]
    body: T,
}

#[derive(Debug, Default, Deserialize)]
struct AuthTest {
    #[serde(default)]
    user: Option<String>,
    #[serde(default)]
    team: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct UsersList {
    #[serde(default)]
    members: Vec<Member>,
    #[serde(default)]
    response_metadata: Option<ResponseMetadata>,
}

#[derive(Debug, Default, Deserialize)]
struct Member {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    real_name: Option<String>,
    #[serde(default)]
    deleted: bool,
    #[serde(default)]
    profile: Profile,
}

#[derive(Debug, Default, Deserialize)]
struct Profile {
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    real_name: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ResponseMetadata {
    #[serde(default)]
    next_cursor: String,
}

#[derive(Debug, Default, Deserialize)]
struct ConversationsOpen {
    #[serde(default)]
    channel: Option<Channel>,
}

#[derive(Debug, Deserialize)]
struct Channel {
    id: String,
}

#[derive(Debug, Default, Deserialize)]
struct PostMessage {
    #[serde(default)]
    ts: Option<String>,
}

pub struct SlackBackend {
    client: Client,
    credentials: Credentials,
    refresh_interval: Duration,
    /// Lowercased handle, display name, real name and e-mail → user ID.
    roster: RwLock<HashMap<String, String>>,
}

impl SlackBackend {
    pub fn new(client: Client, credentials: Credentials) -> Self {
        Self {
            client,
            credentials,
            refresh_interval: ROSTER_REFRESH_INTERVAL,
            roster: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_refresh_interval(mut self, refresh_interval: Duration) -> Self {
        self.refresh_interval = refresh_interval;
        self
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{}", self.credentials.api_base_url, method)
    }

    /// Issue one Web API call and unwrap Slack's `ok`/`error` envelope.
    async fn call<T: DeserializeOwned>(
        &self,
        method: &'static str,
        request: reqwest::RequestBuilder,
    ) -> std::result::Result<T, ApiError> {
        let response = request
            .bearer_auth(self.credentials.token.expose_secret())
            .send()
            .await
            .map_err(|source| ApiError::Request { method, source })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Http {
                method,
                status,
                body,
            });
        }

        let parsed: ApiResponse<T> = response
            .json()
            .await
            .map_err(|source| ApiError::Decode { method, source })?;

        if parsed.ok {
            Ok(parsed.body)
        } else {
            Err(ApiError::Rejected {
                method,
                code: parsed.error.unwrap_or_else(|| "unknown_error".to_string()),
            })
        }
    }

    /// Read the whole directory, following pagination cursors.
    pub(crate) async fn sync_roster(&self) -> Result<usize> {
        let mut roster = HashMap::new();
        let mut cursor = String::new();

        loop {
            let mut query = vec![("limit", USERS_PAGE_SIZE.to_string())];
            if !cursor.is_empty() {
                query.push(("cursor", cursor.clone()));
            }

            let page: UsersList = self
                .call("users.list", self.client.get(self.url("users.list")).query(&query))
                .await
                .map_err(Error::session)?;

            for member in page.members.iter().filter(|m| !m.deleted) {
                for key in roster_keys(member) {
                    roster.entry(key).or_insert_with(|| member.id.clone());
                }
            }

            cursor = page
                .response_metadata
                .map(|meta| meta.next_cursor)
                .unwrap_or_default();
            if cursor.is_empty() {
                break;
            }
        }

        let count = roster.len();
        match self.roster.write() {
            Ok(mut current) => *current = roster,
            Err(_) => return Err(Error::session("roster lock poisoned")),
        }
        debug!(target: TARGET_CHAT, "Roster synced with {} entries", count);
        Ok(count)
    }

    /// A user ID for `recipient`: a roster match first, otherwise the value
    /// itself when it already looks like an ID.
    fn resolve_recipient(&self, recipient: &str) -> Option<String> {
        let key = recipient.trim().to_lowercase();
        if let Some(id) = self.roster.read().ok().and_then(|r| r.get(&key).cloned()) {
            return Some(id);
        }
        looks_like_user_id(recipient.trim()).then(|| recipient.trim().to_string())
    }

    async fn open_direct_message(&self, user_id: &str) -> Result<String> {
        let opened: ConversationsOpen = self
            .call(
                "conversations.open",
                self.client
                    .post(self.url("conversations.open"))
                    .json(&json!({ "users": user_id })),
            )
            .await
            .map_err(Error::session)?;

        opened
            .channel
            .map(|channel| channel.id)
            .ok_or_else(|| Error::session("conversations.open: no channel returned"))
    }
}

fn roster_keys(member: &Member) -> Vec<String> {
    [
        member.name.as_deref(),
        member.real_name.as_deref(),
        member.profile.display_name.as_deref(),
        member.profile.real_name.as_deref(),
        member.profile.email.as_deref(),
    ]
    .into_iter()
    .flatten()
    .map(|key| key.trim().to_lowercase())
    .filter(|key| !key.is_empty())
    .collect()
}

fn looks_like_user_id(value: &str) -> bool {
    value.len() >= 9
        && (value.starts_with('U') || value.starts_with('W'))
        && value
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}

#[async_trait]
impl ChatBackend for SlackBackend {
    async fn connect(&self) -> Result<()> {
        let auth: AuthTest = self
            .call("auth.test", self.client.post(self.url("auth.test")))
            .await
            .map_err(Error::connection)?;

        info!(
            target: TARGET_CHAT,
            "Authenticated to Slack as {} in {}",
            auth.user.as_deref().unwrap_or("unknown user"),
            auth.team.as_deref().unwrap_or("unknown team")
        );
        Ok(())
    }

    async fn process_events(&self, shutdown: CancellationToken) -> Result<()> {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                synced = self.sync_roster() => {
                    if let Err(e) = synced {
                        error!(target: TARGET_CHAT, "Roster sync failed: {}", e);
                        return Err(e);
                    }
                }
            }

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.refresh_interval) => {}
            }
        }

        debug!(target: TARGET_CHAT, "Event processing stopped");
        Ok(())
    }

    async fn send_to(&self, recipients: &[String], message: &str) -> Result<()> {
        for recipient in recipients {
            let user_id = self.resolve_recipient(recipient).ok_or_else(|| {
                Error::session(format!("recipient {} not found in Slack directory", recipient))
            })?;
            let channel = self.open_direct_message(&user_id).await?;

            let payload = json!({
                "channel": channel,
                "text": message,
                "unfurl_links": false,
                "unfurl_media": false,
            });
            debug!(target: TARGET_CHAT, "Sending Slack message with payload: {}", payload);

            let posted: PostMessage = self
                .call(
                    "chat.postMessage",
                    self.client.post(self.url("chat.postMessage")).json(&payload),
                )
                .await
                .map_err(Error::session)?;

            info!(
                target: TARGET_CHAT,
                " ** Slack notification sent to {} ({})",
                recipient,
                posted.ts.as_deref().unwrap_or("no timestamp")
            );
        }
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        match self.roster.write() {
            Ok(mut roster) => roster.clear(),
            Err(_) => warn!(target: TARGET_CHAT, "Roster lock poisoned during disconnect"),
        }
        debug!(target: TARGET_CHAT, "Slack session torn down");
        Ok(())
    }
}
