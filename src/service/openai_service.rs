use async_trait::async_trait;
use reqwest::Client;

use crate::clients::openai_client;
use crate::error::Result;
use crate::models::transcript::ChatMessage;

/// Produces the next assistant utterance for a dialogue transcript.
#[async_trait]
pub trait OpenAIClient: Send + Sync {
    async fn generate(&self, transcript: &[ChatMessage]) -> Result<String>;
}

pub struct OpenAIService {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAIService {
    pub fn new(http: Client, base_url: String, api_key: String, model: String) -> Self {
        Self {
            http,
            base_url,
            api_key,
            model,
        }
    }
}

#[async_trait]
impl OpenAIClient for OpenAIService {
    async fn generate(&self, transcript: &[ChatMessage]) -> Result<String> {
        openai_client::query_openai(
            &self.http,
            &self.base_url,
            &self.api_key,
            &self.model,
            transcript,
        )
        .await
    }
}
