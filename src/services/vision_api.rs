//! Claude vision identification client.
//!
//! Sends the identification frame to the Anthropic messages API with a
//! prompt asking for structured identification fields. The raw response
//! text goes back to the caller; hint parsing happens in
//! [`crate::resolve::hint`].

use super::http_retry::send_with_backoff;
use super::{ServiceError, ServiceResult, VisionIdentifier};
use async_trait::async_trait;
use base64::Engine;
use tracing::debug;

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";

/// Extraction prompt. Asks for exactly the fields the hint parser expects,
/// as JSON, with nulls for anything unreadable.
const IDENTIFY_PROMPT: &str = "You are identifying what a user is pointing their phone camera at. \
     Look for any identifying text, signage, or distinctive architectural features in the image. \
     Respond with a single JSON object with these keys (use null when unknown): \
     \"name\" (the proper name if readable or recognizable), \
     \"type\" (category such as restaurant, museum, monument, church), \
     \"description\" (one sentence describing what is shown), \
     \"details\" (notable visible details), \
     \"year\" (construction year if evident), \
     \"style\" (architectural style), \
     \"significance\" (historical or cultural significance). \
     Respond with JSON only, no other text.";

/// Vision collaborator backed by the Anthropic messages API.
pub struct ClaudeVision {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    max_tokens: u32,
    max_attempts: u32,
}

impl ClaudeVision {
    pub fn new(client: reqwest::Client, api_key: Option<String>, model: String) -> Self {
        Self {
            client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model,
            max_tokens: 512,
            max_attempts: 2,
        }
    }

    /// Override the response token cap.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    fn build_body(&self, image: &[u8]) -> serde_json::Value {
        let b64 = base64::engine::general_purpose::STANDARD.encode(image);
        serde_json::json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "messages": [{
                "role": "user",
                "content": [
                    {
                        "type": "image",
                        "source": {
                            "type": "base64",
                            "media_type": "image/jpeg",
                            "data": b64
                        }
                    },
                    {
                        "type": "text",
                        "text": IDENTIFY_PROMPT
                    }
                ]
            }]
        })
    }
}

#[async_trait]
impl VisionIdentifier for ClaudeVision {
    async fn identify(&self, image: &[u8]) -> ServiceResult<String> {
        #[derive(serde::Deserialize)]
        struct ApiResponse {
            content: Vec<ContentBlock>,
        }
        #[derive(serde::Deserialize)]
        struct ContentBlock {
            text: String,
        }

        let key = self
            .api_key
            .as_deref()
            .ok_or(ServiceError::MissingCredentials("vision"))?;

        let body = self.build_body(image);
        let response = send_with_backoff(
            &self.client,
            |c| {
                c.post(API_URL)
                    .header("x-api-key", key)
                    .header("anthropic-version", API_VERSION)
                    .header("content-type", "application/json")
                    .json(&body)
            },
            self.max_attempts,
            "vision identify",
        )
        .await
        .ok_or_else(|| ServiceError::Unavailable("vision", "request failed".to_string()))?;

        let parsed: ApiResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::Malformed("vision", e.to_string()))?;

        let text = parsed
            .content
            .first()
            .map(|b| b.text.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ServiceError::Malformed("vision", "empty content".to_string()))?;

        debug!(chars = text.len(), "vision response received");
        Ok(text)
    }
}
