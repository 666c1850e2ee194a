pub mod handler;
pub mod prompt;
pub mod provider;
pub mod providers;
pub mod stream;

pub use handler::{ModelHandler, SnapshotStream, ERROR_PREFIX};
pub use prompt::{system_prompt, ChatTemplate, PromptParts, DEFAULT_SYSTEM_PROMPT, PHI3_TEMPLATE};
pub use provider::{LlmError, TextGenerator, TokenStream};
pub use providers::create_generator;
