use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, error, instrument};

use super::assistant::{ResolutionAssistant, Suggestion, SuggestionRequest};
use crate::config::AssistantSettings;
use crate::error::{DeskError, Result};

const SYSTEM_PROMPT: &str = "You are an experienced IT support specialist.";

/// Resolution assistant backed by an OpenAI-compatible chat-completion server.
///
/// The raw reply is returned as-is; deciding whether it is usable is the caller's job
/// (see `interpret_reply`).
pub struct HttpResolutionAssistant {
    client: Client,
    server_url: String,
    auth_token: Option<String>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl HttpResolutionAssistant {
    pub fn new(server_url: impl Into<String>, settings: &AssistantSettings) -> Result<Self> {
        // Transport-level guard; the pipeline enforces its own, usually tighter, deadline.
        let client = Client::builder()
            .timeout(settings.timeout() + Duration::from_secs(5))
            .build()
            .map_err(|e| DeskError::Config(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            server_url: server_url.into().trim_end_matches('/').to_string(),
            auth_token: settings.auth_token.clone(),
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
        })
    }

    /// Builds the assistant from settings, or `None` when no endpoint is configured.
    pub fn from_settings(settings: &AssistantSettings) -> Result<Option<Self>> {
        settings
            .endpoint
            .as_ref()
            .map(|url| Self::new(url.clone(), settings))
            .transpose()
    }

    fn build_prompt(request: &SuggestionRequest) -> String {
        format!(
            "As an IT support specialist, provide a step-by-step resolution for this ticket:\n\n\
             Category: {}\n\
             Title: {}\n\
             Description: {}\n\n\
             Provide a clear, concise resolution that the user can follow.\n\
             If this requires physical intervention or admin access, return None.",
            request.category, request.title, request.description
        )
    }

    fn build_request(&self, payload: &serde_json::Value) -> reqwest::RequestBuilder {
        let builder = self
            .client
            .post(format!("{}/v1/chat/completions", self.server_url))
            .json(payload);
        match &self.auth_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

#[async_trait]
impl ResolutionAssistant for HttpResolutionAssistant {
    #[instrument(skip(self, request), fields(category = %request.category))]
    async fn suggest(&self, request: &SuggestionRequest) -> Result<Suggestion> {
        let payload = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": Self::build_prompt(request)}
            ],
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
            "stream": false
        });

        let res = self.build_request(&payload).send().await?;
        let status = res.status();

        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            error!("Completion request failed with status {}", status);
            return Err(DeskError::ResolutionCapability(format!(
                "Completion request failed with status {}: {}",
                status, body
            )));
        }

        let json: serde_json::Value = res.json().await?;
        let content = json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| {
                DeskError::ResolutionCapability("completion reply has no message content".to_string())
            })?;

        debug!("Assistant replied with {} characters", content.len());
        Ok(Suggestion::Resolution(content.to_string()))
    }
}
