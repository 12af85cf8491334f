//! Posting messages to Slack incoming webhooks.
//!
//! The webhook token is either supplied directly or taken from a named
//! connection. When both are given, the connection provides the base URL and
//! the token is used as the endpoint path beneath it.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::connection::ConnectionSource;
use crate::error::{HookError, Result};
use crate::http::{Headers, HttpClient, HttpHook, PostRequest, Proxies};
use crate::payload::SlackMessage;

const LEGACY_TOKEN_KEY: &str = "webhook_token";

/// Everything a caller can set when creating a [`SlackWebhookHook`].
#[derive(Debug, Clone, Default)]
pub struct WebhookOptions {
    /// Connection holding the token in its password field, and the base URL.
    pub http_conn_id: Option<String>,
    pub webhook_token: Option<String>,
    pub message: String,
    pub attachments: Option<Vec<Value>>,
    pub blocks: Option<Vec<Value>>,
    pub channel: Option<String>,
    pub username: Option<String>,
    pub icon_emoji: Option<String>,
    pub icon_url: Option<String>,
    pub link_names: bool,
    pub proxy: Option<String>,
}

/// Pick the webhook token from an explicit value or from a connection.
///
/// An explicit token always wins and skips the lookup. Otherwise the
/// connection's password is used, falling back to the deprecated
/// `extra.webhook_token`. A connection that carries neither yields an empty
/// token; [`SlackWebhookHook::execute`] refuses to send with it.
pub fn resolve_token(
    token: Option<&str>,
    http_conn_id: Option<&str>,
    connections: &dyn ConnectionSource,
) -> Result<String> {
    if let Some(token) = token.filter(|t| !t.is_empty()) {
        return Ok(token.to_string());
    }

    let Some(conn_id) = http_conn_id.filter(|id| !id.is_empty()) else {
        return Err(HookError::Configuration(
            "No valid Slack webhook token nor conn_id supplied".to_string(),
        ));
    };

    let conn = connections.lookup(conn_id)?;
    if let Some(password) = conn.password.as_deref().filter(|p| !p.is_empty()) {
        return Ok(password.to_string());
    }

    let legacy = conn.extra_str(LEGACY_TOKEN_KEY).unwrap_or_default();
    if !legacy.is_empty() {
        warn!(
            connection = conn_id,
            "'webhook_token' in 'extra' is deprecated. Please use 'password' field"
        );
    }
    Ok(legacy.to_string())
}

/// One-shot sender for a Slack incoming webhook.
///
/// Each webhook can be pre-configured with a channel, username and icon;
/// the fields of [`SlackMessage`] override those defaults. The message and
/// proxy may be adjusted after construction, before [`execute`](Self::execute).
pub struct SlackWebhookHook {
    http_conn_id: Option<String>,
    webhook_token: String,
    pub payload: SlackMessage,
    pub proxy: Option<String>,
    http: Box<dyn HttpClient>,
}

impl fmt::Debug for SlackWebhookHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlackWebhookHook")
            .field("http_conn_id", &self.http_conn_id)
            .field("webhook_token", &"<redacted>")
            .field("payload", &self.payload)
            .field("proxy", &self.proxy)
            .finish_non_exhaustive()
    }
}

impl SlackWebhookHook {
    /// Resolve the token and prepare the message. Fails before any network I/O
    /// when no token source was supplied or the connection lookup fails.
    pub fn new(options: WebhookOptions, connections: Arc<dyn ConnectionSource>) -> Result<Self> {
        let webhook_token = resolve_token(
            options.webhook_token.as_deref(),
            options.http_conn_id.as_deref(),
            connections.as_ref(),
        )?;

        let http = HttpHook::new(options.http_conn_id.clone(), connections);

        Ok(Self {
            http_conn_id: options.http_conn_id,
            webhook_token,
            payload: SlackMessage {
                channel: options.channel,
                username: options.username,
                icon_emoji: options.icon_emoji,
                icon_url: options.icon_url,
                link_names: options.link_names,
                attachments: options.attachments,
                blocks: options.blocks,
                message: options.message,
            },
            proxy: options.proxy,
            http: Box::new(http),
        })
    }

    /// Replace the HTTP client used by [`execute`](Self::execute).
    pub fn with_http_client(mut self, http: impl HttpClient + 'static) -> Self {
        self.http = Box::new(http);
        self
    }

    pub fn http_conn_id(&self) -> Option<&str> {
        self.http_conn_id.as_deref()
    }

    pub fn webhook_token(&self) -> &str {
        &self.webhook_token
    }

    /// Proxy settings for the call. Webhook endpoints are HTTPS, so only the
    /// `https` scheme is ever proxied.
    pub fn proxies(&self) -> Proxies {
        let mut proxies = Proxies::new();
        if let Some(proxy) = self.proxy.as_deref().filter(|p| !p.is_empty()) {
            proxies.insert("https".to_string(), proxy.to_string());
        }
        proxies
    }

    /// The JSON body that [`execute`](Self::execute) will post.
    pub fn build_slack_message(&self) -> Result<String> {
        Ok(self.payload.to_json()?)
    }

    /// Post the message. Errors from the HTTP client are returned unchanged.
    pub async fn execute(&self) -> Result<()> {
        if self.webhook_token.is_empty() {
            return Err(HookError::Configuration(format!(
                "connection '{}' has no webhook token in its password field",
                self.http_conn_id.as_deref().unwrap_or_default()
            )));
        }

        let proxies = self.proxies();
        let body = self.build_slack_message()?;

        let mut headers = Headers::new();
        headers.insert("Content-type".to_string(), "application/json".to_string());

        debug!(
            connection = self.http_conn_id.as_deref().unwrap_or("-"),
            channel = self.payload.channel.as_deref().unwrap_or("-"),
            bytes = body.len(),
            "Sending Slack webhook message"
        );

        self.http
            .post(PostRequest {
                endpoint: self.webhook_token.clone(),
                body,
                headers,
                proxies,
                check_response: true,
            })
            .await?;
        Ok(())
    }
}
