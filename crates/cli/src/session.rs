use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One turn of the conversation. Assistant turns keep the citations that
/// were shown with them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citations: Option<String>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            citations: None,
        }
    }

    pub fn assistant(content: impl Into<String>, citations: Option<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            citations: citations.filter(|c| !c.is_empty()),
        }
    }
}

/// Persisted session metadata and conversation history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Timestamp-based identifier, also the file stem
    pub id: String,
    /// Human-readable session name
    pub name: String,
    /// Generative model used
    pub model: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub messages: Vec<ChatMessage>,
}

impl Session {
    /// Create a new session with auto-generated ID.
    pub fn new(model: String) -> Self {
        let now = Utc::now();
        let id = now.format("%Y%m%d-%H%M%S").to_string();
        Self {
            id: id.clone(),
            name: id,
            model,
            created_at: now,
            updated_at: now,
            messages: Vec::new(),
        }
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
        self.update_name_from_first_message();
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Update the session name based on the first user message.
    pub fn update_name_from_first_message(&mut self) {
        let first_user = self.messages.iter().find(|m| m.role == Role::User);
        if let Some(message) = first_user {
            let sanitized = sanitize_session_name(&message.content);
            if !sanitized.is_empty() {
                self.name = sanitized;
            }
        }
    }

    /// Save to the per-user sessions directory.
    pub fn save(&mut self) -> Result<PathBuf> {
        self.save_in(&config::ensure_sessions_dir()?)
    }

    pub fn save_in(&mut self, dir: &Path) -> Result<PathBuf> {
        self.updated_at = Utc::now();
        let path = dir.join(format!("{}.json", self.id));
        let json = serde_json::to_string_pretty(self).context("failed to serialize session")?;
        std::fs::write(&path, json)
            .with_context(|| format!("failed to write session: {}", path.display()))?;
        debug!(id = %self.id, path = %path.display(), "Session saved");
        Ok(path)
    }

    /// Load a session by ID or name fragment.
    pub fn load(id_or_name: &str) -> Result<Self> {
        Self::load_in(&config::ensure_sessions_dir()?, id_or_name)
    }

    pub fn load_in(sessions_dir: &Path, id_or_name: &str) -> Result<Self> {
        // Try exact ID match first
        let exact_path = sessions_dir.join(format!("{}.json", id_or_name));
        if exact_path.exists() {
            return Self::load_from_path(&exact_path);
        }

        let needle = id_or_name.to_lowercase();
        let mut matches: Vec<Self> = Self::read_all(sessions_dir)?
            .into_iter()
            .filter(|s| s.id.starts_with(id_or_name) || s.name.to_lowercase().contains(&needle))
            .collect();

        match matches.len() {
            0 => anyhow::bail!("no session found matching '{}'", id_or_name),
            1 => Ok(matches.remove(0)),
            n => anyhow::bail!(
                "ambiguous session '{}': {} matches found. Use a more specific identifier.",
                id_or_name,
                n
            ),
        }
    }

    fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read session: {}", path.display()))?;
        let session: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse session: {}", path.display()))?;
        Ok(session)
    }

    /// Every readable session file; unreadable ones are skipped.
    fn read_all(sessions_dir: &Path) -> Result<Vec<Self>> {
        let entries =
            std::fs::read_dir(sessions_dir).context("failed to read sessions directory")?;
        let mut sessions = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                match Self::load_from_path(&path) {
                    Ok(session) => sessions.push(session),
                    Err(e) => debug!(path = %path.display(), error = %e, "Skipping session file"),
                }
            }
        }
        Ok(sessions)
    }

    /// List all saved sessions, most recent first.
    pub fn list_all() -> Result<Vec<SessionSummary>> {
        Self::list_in(&config::ensure_sessions_dir()?)
    }

    pub fn list_in(sessions_dir: &Path) -> Result<Vec<SessionSummary>> {
        let mut summaries: Vec<SessionSummary> = Self::read_all(sessions_dir)?
            .into_iter()
            .map(|session| SessionSummary {
                message_count: session.messages.len(),
                id: session.id,
                name: session.name,
                model: session.model,
                updated_at: session.updated_at,
            })
            .collect();
        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(summaries)
    }
}

/// Lightweight summary of a session for listing.
#[derive(Debug)]
pub struct SessionSummary {
    pub id: String,
    pub name: String,
    pub model: String,
    pub updated_at: DateTime<Utc>,
    pub message_count: usize,
}

/// Sanitize a user message into a valid session name.
/// Takes the first ~50 chars, replaces non-alphanumeric with dashes, lowercases.
fn sanitize_session_name(text: &str) -> String {
    let truncated: String = text.chars().take(50).collect();
    let mut result = String::new();
    let mut prev_dash = false;
    for c in truncated.chars() {
        if c.is_alphanumeric() || c == '_' {
            result.extend(c.to_lowercase());
            prev_dash = false;
        } else {
            if !prev_dash && !result.is_empty() {
                result.push('-');
            }
            prev_dash = true;
        }
    }
    result.trim_end_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_session_name() {
        assert_eq!(sanitize_session_name("Hello World!"), "hello-world");
        assert_eq!(
            sanitize_session_name("What is the refund policy?"),
            "what-is-the-refund-policy"
        );
        assert_eq!(sanitize_session_name("   lots   of   spaces   "), "lots-of-spaces");
        assert_eq!(sanitize_session_name("simple"), "simple");
    }

    #[test]
    fn test_sanitize_long_name() {
        let long = "a".repeat(100);
        assert!(sanitize_session_name(&long).chars().count() <= 50);
    }

    #[test]
    fn name_follows_first_question() {
        let mut session = Session::new("phi3".to_string());
        session.push(ChatMessage::user("Where is the Q3 report?"));
        session.push(ChatMessage::assistant("In finance/ [1]", Some("[1] Source: q3.pdf".into())));
        session.push(ChatMessage::user("Thanks"));
        assert_eq!(session.name, "where-is-the-q3-report");
    }

    #[test]
    fn empty_citations_are_dropped() {
        let message = ChatMessage::assistant("no idea", Some(String::new()));
        assert!(message.citations.is_none());
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json, serde_json::json!({ "role": "assistant", "content": "no idea" }));
    }

    #[test]
    fn save_load_and_list() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::new("phi3".to_string());
        session.push(ChatMessage::user("What does the contract say about notice?"));
        session.push(ChatMessage::assistant(
            "Thirty days [1].",
            Some("[1] Source: contract.pdf - Page: 4".into()),
        ));
        let path = session.save_in(dir.path()).unwrap();
        assert!(path.exists());

        let by_id = Session::load_in(dir.path(), &session.id).unwrap();
        assert_eq!(by_id.messages, session.messages);

        let by_name = Session::load_in(dir.path(), "CONTRACT").unwrap();
        assert_eq!(by_name.id, session.id);

        let listed = Session::list_in(dir.path()).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].message_count, 2);

        assert!(Session::load_in(dir.path(), "nothing-like-this").is_err());
    }
}
