use std::env;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::JarvisError;

/// Config file looked up when no explicit path is given.
pub const DEFAULT_CONFIG_PATH: &str = "config.json";

pub const PROVIDER_OLLAMA: &str = "ollama";
pub const PROVIDER_OPENAI: &str = "openai";

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

fn default_vector_store_path() -> PathBuf {
    PathBuf::from("vectors")
}

fn default_chunk_size() -> usize {
    512
}

fn default_chunk_overlap() -> usize {
    32
}

fn default_top_k() -> usize {
    3
}

fn default_provider() -> String {
    PROVIDER_OLLAMA.to_string()
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_openai_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_batch_size() -> usize {
    32
}

// ── Top-level config ──────────────────────────────────────────

/// Process configuration, read once from a JSON file and handed to each
/// component constructor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Generative model identifier (e.g. `phi3`).
    pub model_name: String,
    /// Embedding model identifier. Must stay the same between ingestion and
    /// serving; the snapshot fingerprint enforces this.
    pub embeddings_model_name: String,
    /// Directory scanned recursively by ingestion.
    pub source_dir: PathBuf,
    /// Snapshot path without extension.
    #[serde(default = "default_vector_store_path")]
    pub vector_store_path: PathBuf,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
    /// Number of chunks retrieved per question.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// "ollama" or "openai"
    #[serde(default = "default_provider")]
    pub embedding_provider: String,
    /// "ollama" or "openai"
    #[serde(default = "default_provider")]
    pub generation_provider: String,
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,
    #[serde(default = "default_openai_url")]
    pub openai_base_url: String,
    /// Read from `OPENAI_API_KEY`, never from the file.
    #[serde(skip)]
    pub openai_api_key: Option<String>,
    #[serde(default = "default_batch_size")]
    pub embedding_batch_size: usize,
    /// Overrides the built-in assistant persona.
    #[serde(default)]
    pub system_prompt: Option<String>,
    /// Overrides the built-in prompt template (minijinja syntax).
    #[serde(default)]
    pub chat_template: Option<String>,
    #[serde(default)]
    pub search_options: SearchOptions,
}

impl Config {
    /// Read and validate the config file. A missing file is fatal.
    pub fn from_file(path: &Path) -> Result<Self, JarvisError> {
        if !path.exists() {
            return Err(JarvisError::ConfigNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_json_str(&content)
            .map_err(|e| JarvisError::InvalidConfig(format!("{}: {e}", path.display())))?;
        config.openai_api_key = env_opt("OPENAI_API_KEY");
        Ok(config)
    }

    /// Parse and validate a config from a JSON string.
    pub fn from_json_str(content: &str) -> Result<Self, JarvisError> {
        let config: Self = serde_json::from_str(content)
            .map_err(|e| JarvisError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), JarvisError> {
        if self.model_name.trim().is_empty() {
            return Err(JarvisError::InvalidConfig("model_name is empty".into()));
        }
        if self.embeddings_model_name.trim().is_empty() {
            return Err(JarvisError::InvalidConfig(
                "embeddings_model_name is empty".into(),
            ));
        }
        if self.chunk_size == 0 {
            return Err(JarvisError::InvalidConfig("chunk_size must be positive".into()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(JarvisError::InvalidConfig(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.top_k == 0 {
            return Err(JarvisError::InvalidConfig("top_k must be at least 1".into()));
        }
        if self.embedding_batch_size == 0 {
            return Err(JarvisError::InvalidConfig(
                "embedding_batch_size must be at least 1".into(),
            ));
        }
        for (key, provider) in [
            ("embedding_provider", &self.embedding_provider),
            ("generation_provider", &self.generation_provider),
        ] {
            if provider != PROVIDER_OLLAMA && provider != PROVIDER_OPENAI {
                return Err(JarvisError::InvalidConfig(format!(
                    "unknown {key}: '{provider}'"
                )));
            }
        }
        Ok(())
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded:");
        tracing::info!("  source_dir:  {}", self.source_dir.display());
        tracing::info!("  store:       {}", self.vector_store_path.display());
        tracing::info!(
            "  embedding:   provider={}, model={}",
            self.embedding_provider,
            self.embeddings_model_name
        );
        tracing::info!(
            "  generation:  provider={}, model={}",
            self.generation_provider,
            self.model_name
        );
        tracing::info!(
            "  chunking:    size={}, overlap={}, top_k={}",
            self.chunk_size,
            self.chunk_overlap,
            self.top_k
        );
    }
}

// ── Generation ────────────────────────────────────────────────

/// Decoding parameters forwarded to the generative model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    /// Upper bound on generated tokens.
    pub max_length: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub repetition_penalty: f32,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            max_length: 2048,
            temperature: 0.5,
            top_p: 0.5,
            top_k: 40,
            repetition_penalty: 1.1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "model_name": "phi3",
        "embeddings_model_name": "nomic-embed-text",
        "source_dir": "source_documents"
    }"#;

    #[test]
    fn minimal_config_gets_defaults() {
        let config = Config::from_json_str(MINIMAL).unwrap();
        assert_eq!(config.model_name, "phi3");
        assert_eq!(config.vector_store_path, PathBuf::from("vectors"));
        assert_eq!(config.chunk_size, 512);
        assert_eq!(config.chunk_overlap, 32);
        assert_eq!(config.top_k, 3);
        assert_eq!(config.embedding_provider, "ollama");
        assert_eq!(config.search_options, SearchOptions::default());
        assert!(config.openai_api_key.is_none());
    }

    #[test]
    fn missing_required_key_is_invalid() {
        let err = Config::from_json_str(r#"{ "model_name": "phi3" }"#).unwrap_err();
        assert!(matches!(err, JarvisError::InvalidConfig(_)));
    }

    #[test]
    fn overlap_must_be_smaller_than_size() {
        let json = r#"{
            "model_name": "phi3",
            "embeddings_model_name": "e",
            "source_dir": "docs",
            "chunk_size": 32,
            "chunk_overlap": 32
        }"#;
        let err = Config::from_json_str(json).unwrap_err();
        assert!(err.to_string().contains("chunk_overlap"));
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let json = r#"{
            "model_name": "phi3",
            "embeddings_model_name": "e",
            "source_dir": "docs",
            "generation_provider": "mystery"
        }"#;
        let err = Config::from_json_str(json).unwrap_err();
        assert!(err.to_string().contains("generation_provider"));
    }

    #[test]
    fn partial_search_options_keep_defaults() {
        let json = r#"{
            "model_name": "phi3",
            "embeddings_model_name": "e",
            "source_dir": "docs",
            "search_options": { "temperature": 0.9 }
        }"#;
        let config = Config::from_json_str(json).unwrap();
        assert_eq!(config.search_options.temperature, 0.9);
        assert_eq!(config.search_options.max_length, 2048);
    }

    #[test]
    fn missing_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::from_file(&dir.path().join("config.json")).unwrap_err();
        assert!(matches!(err, JarvisError::ConfigNotFound(_)));
    }

    #[test]
    fn reads_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, MINIMAL).unwrap();
        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.embeddings_model_name, "nomic-embed-text");
    }
}
