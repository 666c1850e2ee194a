use async_trait::async_trait;
use jarvis_core::config::SearchOptions;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::provider::{LlmError, TextGenerator, TokenStream};
use crate::stream::{decode_lines, LineEvent};

/// Raw-prompt generation through an OpenAI-compatible `/v1/completions`
/// endpoint (OpenAI itself, vLLM, llama.cpp server, LM Studio).
pub struct OpenAiCompatGenerator {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl OpenAiCompatGenerator {
    pub fn new(api_key: Option<String>, model: String, base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.header("Authorization", format!("Bearer {key}")),
            None => request,
        }
    }
}

fn completion_body(model: &str, prompt: &str, options: &SearchOptions) -> Value {
    json!({
        "model": model,
        "prompt": prompt,
        "stream": true,
        "max_tokens": options.max_length,
        "temperature": options.temperature,
        "top_p": options.top_p,
        "frequency_penalty": options.repetition_penalty - 1.0,
    })
}

/// One server-sent-events line of a streamed completion.
fn decode_line(line: &str) -> Result<LineEvent, LlmError> {
    let Some(data) = line.strip_prefix("data:") else {
        // event:, id:, retry: and comments carry nothing we need
        return Ok(LineEvent::Skip);
    };
    let data = data.trim();
    if data == "[DONE]" {
        return Ok(LineEvent::Done);
    }

    let value: Value = serde_json::from_str(data)
        .map_err(|e| LlmError::ParseError(format!("completion chunk: {e}")))?;
    if let Some(message) = value["error"]["message"].as_str() {
        return Err(LlmError::StreamError(message.to_string()));
    }
    match value["choices"][0]["text"].as_str() {
        Some(text) => Ok(LineEvent::Token(text.to_string())),
        None => Ok(LineEvent::Skip),
    }
}

#[async_trait]
impl TextGenerator for OpenAiCompatGenerator {
    async fn load(&self) -> Result<(), LlmError> {
        let url = format!("{}/v1/models", self.base_url);
        debug!("OpenAI request to {}", url);

        let response = self
            .authorized(self.client.get(&url))
            .send()
            .await
            .map_err(|e| LlmError::ModelInit(format!("{url}: {e}")))?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::ModelInit(format!("{url}: {status} - {body}")));
        }

        let listing: Value = response.json().await?;
        let known = listing["data"]
            .as_array()
            .map(|models| models.iter().any(|m| m["id"].as_str() == Some(self.model.as_str())))
            .unwrap_or(false);
        if !known {
            return Err(LlmError::ModelInit(format!(
                "model '{}' is not served at {}",
                self.model, self.base_url
            )));
        }

        info!(model = %self.model, "completion model available");
        Ok(())
    }

    async fn stream(&self, prompt: &str, options: &SearchOptions) -> Result<TokenStream, LlmError> {
        let url = format!("{}/v1/completions", self.base_url);
        debug!("OpenAI request to {}", url);

        let response = self
            .authorized(self.client.post(&url))
            .header("Content-Type", "application/json")
            .json(&completion_body(&self.model, prompt, options))
            .send()
            .await?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError { status, body });
        }

        Ok(decode_lines(Box::pin(response.bytes_stream()), decode_line))
    }

    /// Remote servers manage their own memory.
    async fn unload(&self) -> Result<(), LlmError> {
        Ok(())
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_is_a_raw_completion() {
        let body = completion_body("gpt-3.5-turbo-instruct", "prompt", &SearchOptions::default());
        assert_eq!(body["prompt"], "prompt");
        assert_eq!(body["stream"], true);
        assert_eq!(body["max_tokens"], 2048);
        assert!(body.get("messages").is_none());
    }

    #[test]
    fn decodes_sse_lines() {
        assert_eq!(
            decode_line(r#"data: {"choices":[{"text":" world","index":0}]}"#).unwrap(),
            LineEvent::Token(" world".into())
        );
        assert_eq!(decode_line("data: [DONE]").unwrap(), LineEvent::Done);
        assert_eq!(decode_line(": keep-alive").unwrap(), LineEvent::Skip);
        assert_eq!(decode_line("event: message").unwrap(), LineEvent::Skip);
        assert!(matches!(
            decode_line(r#"data: {"error":{"message":"rate limited"}}"#),
            Err(LlmError::StreamError(_))
        ));
    }

    #[tokio::test]
    async fn load_against_nothing_is_model_init() {
        let generator =
            OpenAiCompatGenerator::new(None, "m".into(), "http://127.0.0.1:9/".into());
        assert!(matches!(generator.load().await, Err(LlmError::ModelInit(_))));
    }
}
