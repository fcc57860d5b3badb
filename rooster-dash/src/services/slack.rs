//! Slack delivery of review items
//!
//! Two channels: an incoming webhook (team channel) and a direct message to
//! one configured user through the Web API with a bot token.

use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

const SLACK_API_BASE: &str = "https://slack.com/api";
/// Slack section blocks are limited to 3000 characters
pub const MAX_SECTION_CHARS: usize = 2900;

#[derive(Debug, Error)]
pub enum SlackError {
    #[error("Slack not configured: {0}")]
    NotConfigured(&'static str),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Slack API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Slack rejected request: {0}")]
    Rejected(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// A source as sent by the dashboard: a plain name or a structured reference
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SlackSource {
    Plain(String),
    Detailed {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        source: Option<String>,
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        url: Option<String>,
        #[serde(default)]
        link: Option<String>,
    },
    Other(Value),
}

impl SlackSource {
    /// Display name, falling back through the known fields
    pub fn display_name(&self) -> String {
        match self {
            SlackSource::Plain(name) => name.clone(),
            SlackSource::Detailed { name, source, title, url, link } => name
                .as_ref()
                .or(source.as_ref())
                .or(title.as_ref())
                .or(url.as_ref())
                .or(link.as_ref())
                .cloned()
                .unwrap_or_else(|| "Source".to_string()),
            SlackSource::Other(_) => "(unknown source)".to_string(),
        }
    }

    pub fn link(&self) -> Option<&str> {
        match self {
            SlackSource::Detailed { url, link, .. } => url.as_deref().or(link.as_deref()),
            _ => None,
        }
    }

    /// `• <url|name>` when a link exists, `• name` otherwise
    pub fn mrkdwn_line(&self) -> String {
        match self.link() {
            Some(url) => format!("• <{}|{}>", url, self.display_name()),
            None => format!("• {}", self.display_name()),
        }
    }
}

/// Review item as posted to Slack
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewMessage {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub sources: Vec<SlackSource>,
    #[serde(default)]
    pub created_at: Option<String>,
}

fn display_value(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Null) | None => "n/a".to_string(),
        Some(Value::String(_)) => "n/a".to_string(),
        Some(other) => other.to_string(),
    }
}

impl ReviewMessage {
    pub fn id_display(&self) -> String {
        display_value(self.id.as_ref())
    }

    pub fn created_display(&self) -> String {
        self.created_at
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or("n/a")
            .to_string()
    }
}

/// Cap text to the section limit, marking the cut with an ellipsis
pub fn truncate_for_slack(text: &str) -> String {
    if text.chars().count() > MAX_SECTION_CHARS {
        let mut cut: String = text.chars().take(MAX_SECTION_CHARS).collect();
        cut.push('…');
        cut
    } else {
        text.to_string()
    }
}

/// Webhook payload for a submitted review
pub fn webhook_payload(message: &ReviewMessage) -> Value {
    let id = message.id_display();
    let created = message.created_display();

    let mut blocks = vec![
        json!({ "type": "header", "text": { "type": "plain_text", "text": "New Review Submitted" } }),
        json!({
            "type": "section",
            "fields": [
                { "type": "mrkdwn", "text": format!("*ID:*\n{}", id) },
                { "type": "mrkdwn", "text": format!("*Created:*\n{}", created) },
            ]
        }),
        json!({ "type": "divider" }),
        json!({ "type": "section", "text": { "type": "mrkdwn", "text": truncate_for_slack(&message.text) } }),
    ];

    if !message.sources.is_empty() {
        let lines: Vec<String> = message
            .sources
            .iter()
            .map(|s| format!("• {}", s.display_name()))
            .collect();
        blocks.push(json!({ "type": "divider" }));
        blocks.push(json!({
            "type": "section",
            "text": { "type": "mrkdwn", "text": format!("*Sources:*\n{}", lines.join("\n")) }
        }));
    }

    json!({
        "text": format!("*New Review Submitted*\n*ID:* {}\n*Created:* {}\n\n{}", id, created, message.text),
        "blocks": blocks,
    })
}

/// Blocks for a direct message
pub fn dm_blocks(message: &ReviewMessage) -> Value {
    let mut blocks = vec![
        json!({ "type": "header", "text": { "type": "plain_text", "text": "New Review" } }),
        json!({
            "type": "section",
            "text": {
                "type": "mrkdwn",
                "text": format!("*ID:* {}  •  *Created:* {}", message.id_display(), message.created_display())
            }
        }),
        json!({ "type": "divider" }),
        json!({ "type": "section", "text": { "type": "mrkdwn", "text": truncate_for_slack(&message.text) } }),
    ];

    if !message.sources.is_empty() {
        let lines: Vec<String> = message.sources.iter().map(SlackSource::mrkdwn_line).collect();
        blocks.push(json!({
            "type": "section",
            "text": { "type": "mrkdwn", "text": format!("*Sources:*\n{}", lines.join("\n")) }
        }));
    }

    Value::Array(blocks)
}

#[derive(Debug, Deserialize)]
struct SlackApiResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    channel: Option<Value>,
}

/// Slack client for webhook posts and direct messages
pub struct SlackClient {
    http_client: reqwest::Client,
    webhook_url: Option<String>,
    bot_token: Option<String>,
    user_id: Option<String>,
    api_base: String,
}

impl SlackClient {
    pub fn new(
        webhook_url: Option<String>,
        bot_token: Option<String>,
        user_id: Option<String>,
    ) -> Result<Self, SlackError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| SlackError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            webhook_url,
            bot_token,
            user_id,
            api_base: SLACK_API_BASE.to_string(),
        })
    }

    /// Point Web API calls at another base URL, without a trailing slash
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Client with no delivery channel configured
    pub fn unconfigured() -> Result<Self, SlackError> {
        Self::new(None, None, None)
    }

    pub fn webhook_configured(&self) -> bool {
        self.webhook_url.is_some()
    }

    pub fn dm_configured(&self) -> bool {
        self.bot_token.is_some()
    }

    /// Post a review to the configured incoming webhook
    pub async fn send_webhook(&self, message: &ReviewMessage) -> Result<(), SlackError> {
        let url = self
            .webhook_url
            .as_deref()
            .ok_or(SlackError::NotConfigured("SLACK_WEBHOOK_URL is not set"))?;

        let response = self
            .http_client
            .post(url)
            .json(&webhook_payload(message))
            .send()
            .await
            .map_err(|e| SlackError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(SlackError::ApiError(status.as_u16(), error_text));
        }

        tracing::info!(id = %message.id_display(), "Review posted to Slack webhook");
        Ok(())
    }

    async fn call_api(&self, method: &str, body: Value) -> Result<SlackApiResponse, SlackError> {
        let token = self
            .bot_token
            .as_deref()
            .ok_or(SlackError::NotConfigured("SLACK_BOT_TOKEN is not set"))?;

        let response = self
            .http_client
            .post(format!("{}/{}", self.api_base, method))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| SlackError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(SlackError::ApiError(status.as_u16(), error_text));
        }

        let parsed: SlackApiResponse = response
            .json()
            .await
            .map_err(|e| SlackError::ParseError(e.to_string()))?;

        if !parsed.ok {
            return Err(SlackError::Rejected(
                parsed.error.clone().unwrap_or_else(|| "unknown error".to_string()),
            ));
        }
        Ok(parsed)
    }

    /// Send a review as a direct message to the configured user
    ///
    /// Returns the DM channel id.
    pub async fn send_dm(&self, message: &ReviewMessage) -> Result<String, SlackError> {
        if self.bot_token.is_none() {
            return Err(SlackError::NotConfigured("SLACK_BOT_TOKEN is not set"));
        }
        let user_id = self
            .user_id
            .as_deref()
            .ok_or(SlackError::NotConfigured("SLACK_USER_ID is not set"))?;

        let opened = self
            .call_api("conversations.open", json!({ "users": user_id }))
            .await?;

        let channel = opened
            .channel
            .as_ref()
            .and_then(|c| c.get("id"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                SlackError::Rejected("failed to open DM (check im:write scope)".to_string())
            })?;

        self.call_api(
            "chat.postMessage",
            json!({
                "channel": channel,
                "text": "New Review",
                "blocks": dm_blocks(message),
            }),
        )
        .await?;

        tracing::info!(channel = %channel, id = %message.id_display(), "Review sent as Slack DM");
        Ok(channel)
    }
}
