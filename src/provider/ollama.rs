use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{parse_model_json, post_json, Provider};
use crate::errors::BrewError;
use crate::wire::{GenerationRequest, Instruction};

pub const DEFAULT_URL: &str = "http://localhost:11434";

pub struct Ollama {
    http: Client,
    model: String,
    url: String,
}

impl Ollama {
    pub fn new(http: Client, model: String, url: Option<String>) -> Self {
        Self { http, model, url: url.unwrap_or_else(|| DEFAULT_URL.to_string()) }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Msg<'a>>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'a str>,
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: MsgOut,
}

#[derive(Deserialize)]
struct MsgOut {
    content: String,
}

fn to_messages(ins: &Instruction) -> Vec<Msg<'_>> {
    vec![
        Msg { role: "system", content: &ins.system },
        Msg { role: "user", content: &ins.user },
    ]
}

#[async_trait]
impl Provider for Ollama {
    async fn generate(&self, req: &GenerationRequest) -> Result<Value, BrewError> {
        let url = format!("{}/api/chat", self.url.trim_end_matches('/'));
        let body = ChatRequest {
            model: &self.model,
            messages: to_messages(&req.instruction),
            stream: false,
            format: req.expect_json.then_some("json"),
        };
        let body = serde_json::to_value(&body)
            .map_err(|e| BrewError::Transport(format!("ollama encode body: {e}")))?;

        tracing::debug!(kind = %req.kind, %url, "ollama POST");

        let text = post_json(self.http.post(&url), &body, "ollama").await?;

        // Standard chat envelope first; some proxies return the content bare.
        let content = match serde_json::from_str::<ChatResponse>(&text) {
            Ok(c) => c.message.content,
            Err(_) => text,
        };

        parse_model_json(&content)
    }
}
