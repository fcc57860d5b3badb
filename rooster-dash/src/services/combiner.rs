//! AI text combination for drafts
//!
//! Merges the current draft with a newly added text block through an
//! OpenAI-compatible chat-completions endpoint.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::draft::DRAFT_SEPARATOR;

/// Text combination errors
#[derive(Debug, Error)]
pub enum CombineError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Empty completion")]
    EmptyCompletion,
}

/// Merges two text passages into one
#[async_trait]
pub trait TextCombiner: Send + Sync {
    /// Combine `existing` draft text with `new` text
    ///
    /// Implementations return `new` unchanged when `existing` is blank.
    async fn combine(&self, existing: &str, new: &str) -> Result<String, CombineError>;
}

/// Editor prompt for merging two passages
pub fn combine_prompt(existing: &str, new: &str) -> String {
    format!(
        "You are a professional editor. Merge the two passages below into a single, \
fluent and coherent text. Combine their key statements, avoid repetition and keep a \
natural flow. Return ONLY the final combined text, without any introduction, comments \
or quotation marks.\n\n\
Existing text:\n---\n{}\n---\n\n\
New text to add:\n---\n{}\n---\n\n\
Combined text:",
        existing, new
    )
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Chat-completions client
pub struct OpenAiCombiner {
    http_client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
}

impl OpenAiCombiner {
    pub fn new(
        api_key: String,
        base_url: &str,
        model: &str,
        temperature: f32,
    ) -> Result<Self, CombineError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| CombineError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            temperature,
        })
    }
}

#[async_trait]
impl TextCombiner for OpenAiCombiner {
    async fn combine(&self, existing: &str, new: &str) -> Result<String, CombineError> {
        if existing.trim().is_empty() {
            return Ok(new.to_string());
        }

        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: combine_prompt(existing, new),
            }],
            temperature: self.temperature,
        };

        tracing::debug!(model = %self.model, url = %url, "Requesting text combination");

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| CombineError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(CombineError::ApiError(status.as_u16(), error_text));
        }

        let completion: ChatResponse = response
            .json()
            .await
            .map_err(|e| CombineError::ParseError(e.to_string()))?;

        let combined = completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(CombineError::EmptyCompletion)?;

        tracing::info!(chars = combined.len(), "Draft text combined");
        Ok(combined)
    }
}

/// Fallback combiner that appends with the draft separator
pub struct JoinCombiner;

#[async_trait]
impl TextCombiner for JoinCombiner {
    async fn combine(&self, existing: &str, new: &str) -> Result<String, CombineError> {
        if existing.trim().is_empty() {
            return Ok(new.to_string());
        }
        Ok(format!("{}{}{}", existing, DRAFT_SEPARATOR, new))
    }
}
