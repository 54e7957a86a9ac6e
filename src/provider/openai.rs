use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{parse_model_json, post_json, Provider};
use crate::errors::BrewError;
use crate::wire::GenerationRequest;

pub const DEFAULT_API_BASE: &str = "https://api.openai.com";

/// OpenAI-compatible chat completions provider.
pub struct OpenAIProvider {
    http: Client,
    model: String,
    api_key: String,
    api_base: String,
}

impl OpenAIProvider {
    pub fn new(http: Client, model: String, api_key: String, api_base: Option<String>) -> Self {
        Self {
            http,
            model,
            api_key,
            api_base: api_base.unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
        }
    }
}

#[derive(Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[async_trait]
impl Provider for OpenAIProvider {
    async fn generate(&self, req: &GenerationRequest) -> Result<Value, BrewError> {
        let url = format!("{}/v1/chat/completions", self.api_base.trim_end_matches('/'));

        let mut body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": req.instruction.system },
                { "role": "user", "content": req.instruction.user }
            ],
            "temperature": 0.7,
        });
        if req.expect_json {
            // Object mode only; array answers come back wrapped and are
            // unwrapped by the decoders.
            body["response_format"] = json!({ "type": "json_object" });
        }

        tracing::debug!(kind = %req.kind, %url, "openai POST");

        let builder = self.http.post(&url).bearer_auth(&self.api_key);
        let text = post_json(builder, &body, "openai").await?;

        let parsed: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| BrewError::schema(format!("failed to parse OpenAI response: {e}")))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        parse_model_json(&content)
    }
}
