use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Result, SchedulerError};
use crate::models::transcript::{ChatMessage, ChatRole};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

const ASSISTANT_PERSONA: &str = "You are a friendly appointment booking assistant for an office. \
Reply with one or two short plain-text sentences addressed to the user. \
Follow the latest system instruction exactly; never invent dates, times, event ids or availability.";

#[derive(Debug, Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    messages: Vec<&'a ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    content: Option<String>,
}

/// Sends the whole transcript behind a fixed persona and returns the reply.
pub async fn query_openai(
    http: &Client,
    base_url: &str,
    api_key: &str,
    model: &str,
    transcript: &[ChatMessage],
) -> Result<String> {
    let persona = ChatMessage::new(ChatRole::System, ASSISTANT_PERSONA);
    let request = OpenAIRequest {
        model,
        messages: std::iter::once(&persona).chain(transcript.iter()).collect(),
        max_tokens: 300,
        temperature: 0.2,
    };

    let response = http
        .post(format!("{}/chat/completions", base_url.trim_end_matches('/')))
        .bearer_auth(api_key)
        .json(&request)
        .send()
        .await?;

    let status = response.status();
    let text = response.text().await?; // read the body once

    if !status.is_success() {
        warn!(%status, body = %text, "chat completion request failed");
        return Err(SchedulerError::Backend(format!(
            "Request failed with status {}",
            status
        )));
    }

    let parsed: OpenAIResponse = serde_json::from_str(&text).map_err(|e| {
        SchedulerError::Backend(format!("Failed to parse JSON: {}\nRaw body: {}", e, text))
    })?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
        .ok_or_else(|| SchedulerError::Backend("No response from OpenAI".to_string()))
}
