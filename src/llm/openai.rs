//! OpenAI chat completions (also works with OpenAI-compatible APIs)

use super::{ChatModel, ChatRequest, Completion, DeltaStream, TokenUsage};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::{future, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;

pub struct OpenAiChat {
    api_key: String,
    base_url: String,
    client: Client,
}

#[derive(Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAIMessage<'a>>,
    stream: bool,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<Value>,
}

#[derive(Serialize)]
struct OpenAIMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Option<Vec<OpenAIChoice>>,
    usage: Option<OpenAIUsage>,
    error: Option<OpenAIError>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: Option<OpenAIResponseMessage>,
    delta: Option<OpenAIDelta>,
}

#[derive(Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct OpenAIDelta {
    content: Option<String>,
}

#[derive(Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(Deserialize)]
struct OpenAIError {
    message: String,
}

impl OpenAiChat {
    pub fn new(api_key: String, base_url: String, client: Client) -> Self {
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    fn build_request<'a>(&self, request: &'a ChatRequest, stream: bool) -> OpenAIRequest<'a> {
        OpenAIRequest {
            model: &request.model,
            messages: vec![
                OpenAIMessage {
                    role: "system",
                    content: &request.system,
                },
                OpenAIMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            stream,
            max_tokens: request.max_tokens,
            response_format: request
                .json_response
                .then(|| serde_json::json!({ "type": "json_object" })),
        }
    }

    async fn send(&self, body: &OpenAIRequest<'_>) -> Result<reqwest::Response> {
        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;
        Ok(response)
    }
}

/// Extract the content delta of one stream frame.
///
/// Frames without content (role announcements, finish markers) yield `None`.
fn parse_delta(data: &str) -> Result<Option<String>> {
    let frame: OpenAIResponse = match serde_json::from_str(data) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::debug!(error = %e, "skipping unparsable stream frame");
            return Ok(None);
        }
    };

    if let Some(error) = frame.error {
        return Err(anyhow!("OpenAI error: {}", error.message));
    }

    Ok(frame
        .choices
        .and_then(|c| c.into_iter().next())
        .and_then(|c| c.delta)
        .and_then(|d| d.content)
        .filter(|content| !content.is_empty()))
}

#[async_trait]
impl ChatModel for OpenAiChat {
    async fn complete(&self, request: &ChatRequest) -> Result<Completion> {
        let started = Instant::now();
        let response = self.send(&self.build_request(request, false)).await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(anyhow!("OpenAI API error ({}): {}", status, body));
        }

        let response: OpenAIResponse = serde_json::from_str(&body)?;

        if let Some(error) = response.error {
            return Err(anyhow!("OpenAI error: {}", error.message));
        }

        let usage = response
            .usage
            .map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            })
            .unwrap_or_default();

        let text = response
            .choices
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .unwrap_or_default();

        tracing::info!(
            model = %request.model,
            elapsed_ms = started.elapsed().as_millis() as u64,
            total_tokens = usage.total_tokens,
            "completion finished"
        );

        Ok(Completion { text, usage })
    }

    async fn stream(&self, request: &ChatRequest) -> Result<DeltaStream> {
        let response = self.send(&self.build_request(request, true)).await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            return Err(anyhow!("OpenAI API error ({}): {}", status, body));
        }

        let deltas = response
            .bytes_stream()
            .eventsource()
            .take_while(|event| {
                future::ready(!matches!(event, Ok(event) if event.data.trim() == "[DONE]"))
            })
            .filter_map(|event| {
                future::ready(match event {
                    Ok(event) => parse_delta(&event.data).transpose(),
                    Err(e) => Some(Err(anyhow!("OpenAI stream error: {}", e))),
                })
            });

        Ok(deltas.boxed())
    }

    fn name(&self) -> &str {
        "openai"
    }
}
