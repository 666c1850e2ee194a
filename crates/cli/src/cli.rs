use std::path::PathBuf;

use clap::{Parser, Subcommand};
use jarvis_core::config::DEFAULT_CONFIG_PATH;

/// Answer questions about a folder of documents.
///
/// `ingest` builds the vector store once; `search`, `ask` and `chat` read
/// from it and cite the chunks they used.
#[derive(Parser, Debug)]
#[command(name = "jarvis", about = "Document question answering with citations")]
pub struct CliArgs {
    /// Path to the JSON config file
    #[arg(long, global = true, env = "JARVIS_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Also append logs to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load, chunk and embed every supported file, replacing the store
    Ingest {
        /// Overrides `source_dir` from the config
        #[arg(long)]
        source_dir: Option<PathBuf>,

        /// Overrides `vector_store_path` from the config
        #[arg(long)]
        store: Option<PathBuf>,
    },

    /// Show the chunks closest to a query, without generating an answer
    Search {
        query: String,

        /// Number of chunks to retrieve
        #[arg(short, long)]
        k: Option<usize>,
    },

    /// Answer one question and exit
    Ask {
        question: String,

        #[arg(short, long)]
        k: Option<usize>,
    },

    /// Interactive session (/clear, /reload, /exit)
    Chat {
        #[arg(short, long)]
        k: Option<usize>,

        /// Resume a previous session by name or ID
        #[arg(long)]
        session: Option<String>,

        /// List all saved sessions
        #[arg(long)]
        list_sessions: bool,
    },
}

impl Command {
    /// Default log level when `RUST_LOG` is unset.
    pub fn default_log_level(&self) -> &'static str {
        match self {
            Command::Ingest { .. } => "info",
            _ => "warn",
        }
    }
}
