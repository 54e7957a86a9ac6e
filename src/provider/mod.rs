use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::cli::ProviderKind;
use crate::config::Config;
use crate::errors::BrewError;
use crate::wire::GenerationRequest;

pub mod gemini;
pub mod ollama;
pub mod openai;
#[cfg(test)]
pub mod scripted;

/// The external generative-text service: request in, parsed JSON out.
#[async_trait]
pub trait Provider: Send + Sync {
    async fn generate(&self, req: &GenerationRequest) -> Result<Value, BrewError>;
}

pub type DynProvider = Arc<dyn Provider>;

pub fn make_provider(cfg: &Config) -> Result<DynProvider, BrewError> {
    let http = reqwest::Client::builder()
        .timeout(cfg.timeout())
        .build()
        .map_err(|e| BrewError::Config(format!("http client: {e}")))?;
    let model = cfg.model();

    match cfg.provider {
        ProviderKind::Gemini => {
            let key = cfg.api_key()?;
            Ok(Arc::new(gemini::GeminiProvider::new(http, model, key, cfg.api_base.clone())))
        }
        ProviderKind::OpenAI => {
            let key = cfg.api_key()?;
            Ok(Arc::new(openai::OpenAIProvider::new(http, model, key, cfg.api_base.clone())))
        }
        ProviderKind::Ollama => Ok(Arc::new(ollama::Ollama::new(http, model, cfg.api_base.clone()))),
    }
}

/// Send a request and fail on non-success status. The body is returned as text.
pub(crate) async fn post_json(
    builder: reqwest::RequestBuilder,
    body: &Value,
    provider: &str,
) -> Result<String, BrewError> {
    let resp = builder
        .json(body)
        .send()
        .await
        .map_err(|e| BrewError::Transport(format!("{provider} request failed: {e}")))?;

    let status = resp.status();
    let text = resp
        .text()
        .await
        .map_err(|e| BrewError::Transport(format!("{provider} read body failed: {e}")))?;

    tracing::debug!(provider, %status, body = %text, "raw response");

    if !status.is_success() {
        return Err(BrewError::Transport(format!("{provider} API error ({status}): {text}")));
    }
    Ok(text)
}

/// Parse the model's text as JSON. Strict parse first; then fall back to the
/// first balanced JSON object or array inside the text (code fences, chatter).
pub fn parse_model_json(content: &str) -> Result<Value, BrewError> {
    if let Ok(v) = serde_json::from_str::<Value>(content.trim()) {
        return Ok(v);
    }
    if let Some(slice) = extract_first_json(content) {
        if let Ok(v) = serde_json::from_str::<Value>(slice) {
            return Ok(v);
        }
    }
    Err(BrewError::schema(format!(
        "model did not return valid JSON.\n--- content start ---\n{content}\n--- content end ---"
    )))
}

/// Extracts the first top-level JSON object or array substring from a string.
/// Handles nesting and brackets inside string literals; returns None if not found.
fn extract_first_json(s: &str) -> Option<&str> {
    let bytes = s.as_bytes();
    let start = bytes.iter().position(|&b| b == b'{' || b == b'[')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' | b'[' => depth += 1,
            b'}' | b']' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&s[start..=i]);
                }
            }
            _ => {}
        }
    }
    None
}
