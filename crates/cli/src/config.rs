use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use jarvis_core::config::load_dotenv;
use jarvis_core::Config;
use tracing::debug;

/// Load `.env`, then the JSON config at `path`. A missing file is fatal.
pub fn load(path: &Path) -> Result<Config> {
    load_dotenv();
    debug!(path = %path.display(), "Loading config");
    let config = Config::from_file(path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))?;
    Ok(config)
}

/// Replace the directories named in the config with command-line values.
pub fn apply_overrides(config: &mut Config, source_dir: Option<PathBuf>, store: Option<PathBuf>) {
    if let Some(dir) = source_dir {
        config.source_dir = dir;
    }
    if let Some(store) = store {
        config.vector_store_path = store;
    }
}

/// Per-user state directory: ~/.config/jarvis/
pub fn user_dir() -> Result<PathBuf> {
    let dir = dirs::config_dir()
        .context("could not determine user config directory")?
        .join("jarvis");
    Ok(dir)
}

/// Session directory, created on first use.
pub fn ensure_sessions_dir() -> Result<PathBuf> {
    let dir = user_dir()?.join("sessions");
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create sessions directory: {}", dir.display()))?;
    Ok(dir)
}
