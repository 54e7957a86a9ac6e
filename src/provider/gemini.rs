use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{parse_model_json, post_json, Provider};
use crate::errors::BrewError;
use crate::wire::GenerationRequest;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Google Generative Language `generateContent` adapter.
pub struct GeminiProvider {
    http: Client,
    model: String,
    api_key: String,
    api_base: String,
}

impl GeminiProvider {
    pub fn new(http: Client, model: String, api_key: String, api_base: Option<String>) -> Self {
        Self {
            http,
            model,
            api_key,
            api_base: api_base.unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
        }
    }

    fn url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base.trim_end_matches('/'),
            self.model
        )
    }
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

fn request_body(req: &GenerationRequest) -> Value {
    let mut body = json!({
        "systemInstruction": { "parts": [{ "text": req.instruction.system }] },
        "contents": [{ "role": "user", "parts": [{ "text": req.instruction.user }] }],
    });
    if req.expect_json {
        body["generationConfig"] = json!({ "responseMimeType": "application/json" });
    }
    body
}

fn first_text(text: &str) -> Result<String, BrewError> {
    let parsed: GenerateResponse = serde_json::from_str(text)
        .map_err(|e| BrewError::schema(format!("gemini response parse error: {e}")))?;
    parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content.parts.into_iter().map(|p| p.text).find(|t| !t.is_empty()))
        .ok_or_else(|| BrewError::schema("gemini: empty candidates"))
}

#[async_trait]
impl Provider for GeminiProvider {
    async fn generate(&self, req: &GenerationRequest) -> Result<Value, BrewError> {
        let url = self.url();
        tracing::debug!(kind = %req.kind, %url, "gemini POST");

        let builder = self.http.post(&url).header("x-goog-api-key", &self.api_key);
        let text = post_json(builder, &request_body(req), "gemini").await?;
        parse_model_json(&first_text(&text)?)
    }
}
