use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum JarvisError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
