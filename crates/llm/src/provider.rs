use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use jarvis_core::config::SearchOptions;

/// Incremental text pieces as the model decodes them.
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String, LlmError>> + Send>>;

/// A generative model backend: raw prompt in, token deltas out.
///
/// The prompt is already fully formatted; backends must not wrap it in
/// their own chat template.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Make the model ready to serve. Fails if it cannot be reached or found.
    async fn load(&self) -> Result<(), LlmError>;

    /// Start decoding `prompt`. Stops at end-of-sequence or
    /// `options.max_length` tokens.
    async fn stream(&self, prompt: &str, options: &SearchOptions) -> Result<TokenStream, LlmError>;

    /// Release whatever `load` acquired. Best effort.
    async fn unload(&self) -> Result<(), LlmError>;

    fn model(&self) -> &str;
}

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("API error: {status} - {body}")]
    ApiError { status: u16, body: String },
    #[error("failed to parse response: {0}")]
    ParseError(String),
    #[error("stream interrupted: {0}")]
    StreamError(String),
    #[error("model initialization failed: {0}")]
    ModelInit(String),
    #[error("model is not loaded")]
    NotLoaded,
    #[error("template error: {0}")]
    Template(String),
    #[error("provider not configured: {0}")]
    NotConfigured(String),
}
