//! OpenAI chat completions client.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{classify_http_status, ChatMessage, ChatResponse, LlmClient, LlmError, TokenUsage};

/// Credentials and endpoint for the completion service.
///
/// Loaded once at startup and handed to the client; read-only afterwards.
#[derive(Clone)]
pub struct ServiceCredentials {
    pub api_key: String,
    pub organization: Option<String>,
    pub base_url: String,
}

impl fmt::Debug for ServiceCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceCredentials")
            .field("api_key", &"<redacted>")
            .field("organization", &self.organization)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiClient {
    client: reqwest::Client,
    credentials: ServiceCredentials,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<TokenUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiClient {
    /// Create a new client. No request is made until the first completion.
    pub fn new(credentials: ServiceCredentials) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            // Long articles take minutes to generate.
            .timeout(Duration::from_secs(600))
            .build()
            .map_err(LlmError::from)?;
        Ok(Self {
            client,
            credentials,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.credentials.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn chat_completion(
        &self,
        model: &str,
        messages: &[ChatMessage],
    ) -> Result<ChatResponse, LlmError> {
        let mut request = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.credentials.api_key)
            .json(&CompletionRequest { model, messages });
        if let Some(org) = &self.credentials.organization {
            request = request.header("OpenAI-Organization", org);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::new(
                classify_http_status(status.as_u16()),
                format!("HTTP {}: {}", status.as_u16(), body),
            )
            .with_status(status.as_u16()));
        }

        let body: CompletionResponse = response.json().await?;
        parse_completion(body)
    }
}

fn parse_completion(body: CompletionResponse) -> Result<ChatResponse, LlmError> {
    let choice = body
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::malformed("response contained no choices"))?;
    Ok(ChatResponse {
        content: choice.message.content,
        finish_reason: choice.finish_reason,
        usage: body.usage,
        model: body.model,
    })
}
