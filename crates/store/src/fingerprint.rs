use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Identity of the embedding model that produced a snapshot.
///
/// Vectors from different models (or the same model at a different
/// dimension) are not comparable, so the store refuses to serve queries
/// embedded by anything whose digest differs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelFingerprint {
    /// Backend name, e.g. "ollama".
    pub provider: String,
    /// Model identifier as passed to the backend.
    pub model: String,
    /// Length of every vector.
    pub dimensions: usize,
    /// SHA-256 hex digest over provider, model and dimensions.
    pub digest: String,
}

impl ModelFingerprint {
    pub fn new(provider: impl Into<String>, model: impl Into<String>, dimensions: usize) -> Self {
        let provider = provider.into();
        let model = model.into();
        let digest = compute_digest(&provider, &model, dimensions);
        Self {
            provider,
            model,
            dimensions,
            digest,
        }
    }

    /// True when both fingerprints describe the same model output space.
    pub fn matches(&self, other: &ModelFingerprint) -> bool {
        self.digest == other.digest
    }
}

impl fmt::Display for ModelFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} ({} dims, {})",
            self.provider,
            self.model,
            self.dimensions,
            &self.digest[..self.digest.len().min(12)]
        )
    }
}

fn compute_digest(provider: &str, model: &str, dimensions: usize) -> String {
    let joined = format!("{provider}\n{model}\n{dimensions}");
    let digest = Sha256::digest(joined.as_bytes());
    format!("{digest:x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_deterministic() {
        let a = ModelFingerprint::new("ollama", "nomic-embed-text", 768);
        let b = ModelFingerprint::new("ollama", "nomic-embed-text", 768);
        assert_eq!(a.digest, b.digest);
        assert!(a.matches(&b));
        assert_eq!(a.digest.len(), 64);
    }

    #[test]
    fn any_component_changes_digest() {
        let base = ModelFingerprint::new("ollama", "nomic-embed-text", 768);
        assert!(!base.matches(&ModelFingerprint::new("openai", "nomic-embed-text", 768)));
        assert!(!base.matches(&ModelFingerprint::new("ollama", "mxbai-embed-large", 768)));
        assert!(!base.matches(&ModelFingerprint::new("ollama", "nomic-embed-text", 1024)));
    }

    #[test]
    fn display_is_short() {
        let fp = ModelFingerprint::new("ollama", "m", 4);
        let shown = fp.to_string();
        assert!(shown.starts_with("ollama/m (4 dims, "));
    }
}
