//! Model lifecycle and streamed answers.
//!
//! [`ModelHandler::generate_response`] returns a lazy stream of growing
//! snapshots: each item is the full answer so far, trailing newlines
//! trimmed. Failures never surface as `Err`; the stream ends with a single
//! `"Error during generation: ..."` item instead so a chat session can keep
//! going.

use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::stream::{self, Stream, StreamExt};
use jarvis_core::config::SearchOptions;
use jarvis_core::Config;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{error, info, warn};

use crate::prompt::{ChatTemplate, PromptParts};
use crate::provider::{LlmError, TextGenerator, TokenStream};
use crate::providers::create_generator;

pub const ERROR_PREFIX: &str = "Error during generation: ";

pub type SnapshotStream = Pin<Box<dyn Stream<Item = String> + Send>>;

pub struct ModelHandler {
    generator: Arc<dyn TextGenerator>,
    template: ChatTemplate,
    options: SearchOptions,
    loaded: Arc<AtomicBool>,
    /// Held by the active generation stream and by lifecycle calls.
    busy: Arc<Mutex<()>>,
}

impl ModelHandler {
    pub fn new(generator: Arc<dyn TextGenerator>, template: ChatTemplate, options: SearchOptions) -> Self {
        Self {
            generator,
            template,
            options,
            loaded: Arc::new(AtomicBool::new(false)),
            busy: Arc::new(Mutex::new(())),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, LlmError> {
        Ok(Self::new(
            create_generator(config)?,
            ChatTemplate::from_config(config)?,
            config.search_options.clone(),
        ))
    }

    pub fn model(&self) -> &str {
        self.generator.model()
    }

    /// Load the model. A second call on a loaded handler does nothing.
    pub async fn initialize(&self) -> Result<(), LlmError> {
        let _busy = self.busy.lock().await;
        if self.loaded.load(Ordering::Acquire) {
            return Ok(());
        }
        info!(model = %self.generator.model(), "Initializing model");
        self.generator.load().await.map_err(|e| {
            error!(model = %self.generator.model(), error = %e, "model initialization failed");
            e
        })?;
        self.loaded.store(true, Ordering::Release);
        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }

    /// Release the model. Waits for an in-flight generation to be dropped.
    /// Safe to call repeatedly or before [`ModelHandler::initialize`].
    pub async fn cleanup(&self) {
        let _busy = self.busy.lock().await;
        if !self.loaded.swap(false, Ordering::AcqRel) {
            return;
        }
        if let Err(e) = self.generator.unload().await {
            warn!(model = %self.generator.model(), error = %e, "Error during cleanup");
        }
    }

    /// Drop and load the model again.
    pub async fn reload(&self) -> Result<(), LlmError> {
        self.cleanup().await;
        self.initialize().await
    }

    /// Stream an answer to `user_prompt`. Nothing happens until the stream
    /// is polled; the model is held until the stream is exhausted or dropped.
    pub fn generate_response(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        context: Option<&str>,
        citations: Option<&str>,
    ) -> SnapshotStream {
        let parts = PromptParts::new(system_prompt, user_prompt, context, citations);
        let pending = Pending {
            generator: Arc::clone(&self.generator),
            busy: Arc::clone(&self.busy),
            loaded: Arc::clone(&self.loaded),
            prompt: self.template.render(&parts),
            options: self.options.clone(),
        };
        Box::pin(stream::unfold(Phase::Pending(pending), advance))
    }
}

struct Pending {
    generator: Arc<dyn TextGenerator>,
    busy: Arc<Mutex<()>>,
    loaded: Arc<AtomicBool>,
    prompt: Result<String, LlmError>,
    options: SearchOptions,
}

impl Pending {
    async fn start(self) -> Result<Phase, LlmError> {
        let prompt = self.prompt?;
        let guard = self.busy.lock_owned().await;
        if !self.loaded.load(Ordering::Acquire) {
            return Err(LlmError::NotLoaded);
        }
        let tokens = self.generator.stream(&prompt, &self.options).await?;
        Ok(Phase::Running {
            _guard: guard,
            tokens,
            full: String::new(),
        })
    }
}

enum Phase {
    Pending(Pending),
    Running {
        _guard: OwnedMutexGuard<()>,
        tokens: TokenStream,
        full: String,
    },
    Finished,
}

async fn advance(mut phase: Phase) -> Option<(String, Phase)> {
    loop {
        phase = match phase {
            Phase::Pending(pending) => match pending.start().await {
                Ok(running) => running,
                Err(e) => return Some((failure(&e), Phase::Finished)),
            },
            Phase::Running {
                _guard,
                mut tokens,
                mut full,
            } => {
                return match tokens.next().await {
                    Some(Ok(delta)) => {
                        full.push_str(&delta);
                        let snapshot = full.trim_end_matches('\n').to_string();
                        Some((snapshot, Phase::Running { _guard, tokens, full }))
                    }
                    Some(Err(e)) => Some((failure(&e), Phase::Finished)),
                    None => None,
                };
            }
            Phase::Finished => return None,
        };
    }
}

fn failure(e: &LlmError) -> String {
    error!(error = %e, "Error during generation");
    format!("{ERROR_PREFIX}{e}")
}
