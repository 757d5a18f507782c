//! Chat completion client for OpenAI-compatible APIs

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::history::ChatMessage;
use crate::providers::Responder;
use crate::{Error, Result};

/// Default API base for chat completions
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default chat model
pub const DEFAULT_MODEL: &str = "gpt-4-turbo-preview";

/// Chat completion client
pub struct ChatCompletion {
    client: Client,
    api_key: SecretString,
    base_url: String,
    model: String,
    max_tokens: Option<u32>,
}

impl ChatCompletion {
    /// Create a new client against the default `OpenAI` endpoint
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new(api_key: SecretString, model: String) -> Result<Self> {
        if api_key.expose_secret().is_empty() {
            return Err(Error::Config(
                "OpenAI API key required for chat completion".to_string(),
            ));
        }

        Ok(Self {
            client: Client::new(),
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model,
            max_tokens: None,
        })
    }

    /// Point the client at another OpenAI-compatible endpoint
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Cap the reply length
    #[must_use]
    pub const fn max_tokens(mut self, tokens: Option<u32>) -> Self {
        self.max_tokens = tokens;
        self
    }

    /// Model identifier in use
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    /// Request a completion for the given messages
    ///
    /// A reply without content yields an empty string.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the API returns a non-success status
    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages,
            max_tokens: self.max_tokens,
        };

        tracing::debug!(
            model = %self.model,
            messages = messages.len(),
            "requesting chat completion"
        );

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "chat completion request failed");
                e
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "chat completion API error");
            return Err(Error::Llm(format!("chat completion error {status}: {body}")));
        }

        let result: ChatCompletionResponse = response.json().await?;
        let content = result.into_content();

        tracing::info!(chars = content.len(), "chat completion received");
        Ok(content)
    }
}

#[async_trait]
impl Responder for ChatCompletion {
    async fn respond(&self, messages: &[ChatMessage]) -> Result<String> {
        self.complete(messages).await
    }

    fn name(&self) -> &'static str {
        "chat-completion"
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

impl ChatCompletionResponse {
    fn into_content(self) -> String {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default()
    }
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> SecretString {
        SecretString::from("sk-test".to_string())
    }

    #[test]
    fn rejects_empty_api_key() {
        assert!(ChatCompletion::new(SecretString::from(String::new()), DEFAULT_MODEL.into()).is_err());
    }

    #[test]
    fn endpoint_strips_trailing_slash() {
        let llm = ChatCompletion::new(key(), DEFAULT_MODEL.into())
            .unwrap()
            .base_url("http://localhost:11434/v1/");
        assert_eq!(llm.endpoint(), "http://localhost:11434/v1/chat/completions");
    }

    #[test]
    fn request_serializes_messages_in_order() {
        let messages = vec![
            ChatMessage::system("be brief"),
            ChatMessage::user("hi"),
        ];
        let request = ChatCompletionRequest {
            model: "m",
            messages: &messages,
            max_tokens: None,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "model": "m",
                "messages": [
                    {"role": "system", "content": "be brief"},
                    {"role": "user", "content": "hi"},
                ],
            })
        );
    }

    #[test]
    fn response_content_extraction() {
        let response: ChatCompletionResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"Hello!"}}]}"#,
        )
        .unwrap();
        assert_eq!(response.into_content(), "Hello!");

        let null: ChatCompletionResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":null}}]}"#).unwrap();
        assert_eq!(null.into_content(), "");

        let none: ChatCompletionResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert_eq!(none.into_content(), "");
    }
}
