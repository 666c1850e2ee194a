//! Prompt assembly for the generative model.
//!
//! The template is an arbitrary minijinja string (built in or taken from
//! config), so a fresh [`minijinja::Environment`] is created per render.

use jarvis_core::Config;
use serde::Serialize;

use crate::provider::LlmError;

/// Persona and citation rules given to the model on every turn.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are Jarvis, an AI assistant that provides accurate information based strictly on the given context. \n\
Follow these rules:\n\
1. Only use information from the provided context\n\
2. If the information isn't in the context, say \"I don't find this information in the provided context\"\n\
3. Cite sources using [1], [2], [3] etc. when referring to specific information\n\
4. Keep responses clear and concise";

/// Phi-3 instruction format.
pub const PHI3_TEMPLATE: &str = "<|user|>\n\
System: {{ system }}\n\
Context: {{ context }}\n\
Citations: {{ citations }}\n\
User Question: {{ input }}\n\
Remember to answer strictly based on the provided context. If the information is not in the context, say \"I don't find this information in the provided context.\"\n\
<|end|>\n\
<|assistant|>";

pub const NO_CONTEXT: &str = "No specific context provided.";
pub const NO_CITATIONS: &str = "No citations available.";

/// Values exposed to the template.
#[derive(Debug, Clone, Serialize)]
pub struct PromptParts<'a> {
    pub system: &'a str,
    pub context: &'a str,
    pub citations: &'a str,
    pub input: &'a str,
}

impl<'a> PromptParts<'a> {
    /// Missing or empty context and citations fall back to placeholder text.
    pub fn new(
        system: &'a str,
        input: &'a str,
        context: Option<&'a str>,
        citations: Option<&'a str>,
    ) -> Self {
        Self {
            system,
            context: context.filter(|c| !c.is_empty()).unwrap_or(NO_CONTEXT),
            citations: citations.filter(|c| !c.is_empty()).unwrap_or(NO_CITATIONS),
            input,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChatTemplate {
    source: String,
}

impl ChatTemplate {
    /// Wrap a template string, checking its syntax up front.
    pub fn new(source: impl Into<String>) -> Result<Self, LlmError> {
        let source = source.into();
        minijinja::Environment::new()
            .template_from_str(&source)
            .map_err(|e| LlmError::Template(e.to_string()))?;
        Ok(Self { source })
    }

    /// Built-in template unless `chat_template` is set in the config.
    pub fn from_config(config: &Config) -> Result<Self, LlmError> {
        match &config.chat_template {
            Some(custom) => Self::new(custom.clone()),
            None => Ok(Self::default()),
        }
    }

    pub fn render(&self, parts: &PromptParts<'_>) -> Result<String, LlmError> {
        minijinja::Environment::new()
            .render_str(&self.source, parts)
            .map_err(|e| LlmError::Template(e.to_string()))
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

impl Default for ChatTemplate {
    fn default() -> Self {
        Self {
            source: PHI3_TEMPLATE.to_string(),
        }
    }
}

/// System prompt from config, or the built-in persona.
pub fn system_prompt(config: &Config) -> &str {
    config
        .system_prompt
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(DEFAULT_SYSTEM_PROMPT)
}
