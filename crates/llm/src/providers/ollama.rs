use async_trait::async_trait;
use jarvis_core::config::SearchOptions;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::provider::{LlmError, TextGenerator, TokenStream};
use crate::stream::{decode_lines, LineEvent};

/// Raw-prompt generation against a local Ollama server.
pub struct OllamaGenerator {
    client: reqwest::Client,
    url: String,
    model: String,
}

impl OllamaGenerator {
    pub fn new(url: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.trim_end_matches('/').to_string(),
            model,
        }
    }

    async fn post(&self, path: &str, body: &Value) -> Result<reqwest::Response, LlmError> {
        let url = format!("{}{}", self.url, path);
        debug!("Ollama request to {}", url);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError { status, body });
        }
        Ok(response)
    }
}

fn generate_body(model: &str, prompt: &str, options: &SearchOptions) -> Value {
    json!({
        "model": model,
        "prompt": prompt,
        "raw": true,
        "stream": true,
        "options": {
            "num_predict": options.max_length,
            "temperature": options.temperature,
            "top_p": options.top_p,
            "top_k": options.top_k,
            "repeat_penalty": options.repetition_penalty,
        },
    })
}

/// One NDJSON line of `/api/generate` output.
fn decode_line(line: &str) -> Result<LineEvent, LlmError> {
    let value: Value = serde_json::from_str(line)
        .map_err(|e| LlmError::ParseError(format!("ollama stream line: {e}")))?;

    if let Some(error) = value["error"].as_str() {
        return Err(LlmError::StreamError(error.to_string()));
    }
    if value["done"].as_bool().unwrap_or(false) {
        let tail = value["response"].as_str().unwrap_or_default();
        return Ok(if tail.is_empty() {
            LineEvent::Done
        } else {
            LineEvent::Token(tail.to_string())
        });
    }
    match value["response"].as_str() {
        Some(text) => Ok(LineEvent::Token(text.to_string())),
        None => Ok(LineEvent::Skip),
    }
}

#[async_trait]
impl TextGenerator for OllamaGenerator {
    async fn load(&self) -> Result<(), LlmError> {
        self.post("/api/show", &json!({ "model": self.model }))
            .await
            .map_err(|e| LlmError::ModelInit(format!("ollama model '{}': {e}", self.model)))?;

        // An empty prompt only loads the weights.
        self.post("/api/generate", &json!({ "model": self.model, "prompt": "", "stream": false }))
            .await
            .map_err(|e| LlmError::ModelInit(format!("warming '{}': {e}", self.model)))?;

        info!(model = %self.model, "ollama model loaded");
        Ok(())
    }

    async fn stream(&self, prompt: &str, options: &SearchOptions) -> Result<TokenStream, LlmError> {
        let response = self
            .post("/api/generate", &generate_body(&self.model, prompt, options))
            .await?;
        Ok(decode_lines(Box::pin(response.bytes_stream()), decode_line))
    }

    async fn unload(&self) -> Result<(), LlmError> {
        self.post("/api/generate", &json!({ "model": self.model, "keep_alive": 0 }))
            .await?;
        info!(model = %self.model, "ollama model unloaded");
        Ok(())
    }

    fn model(&self) -> &str {
        &self.model
    }
}
