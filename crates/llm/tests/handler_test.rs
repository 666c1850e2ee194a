/// Lifecycle and streaming behavior of the model handler.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use jarvis_core::config::SearchOptions;
use jarvis_llm::{ChatTemplate, LlmError, ModelHandler, TextGenerator, TokenStream, ERROR_PREFIX};

// ============================================================================
// Test Helpers
// ============================================================================

/// Replays a fixed token script. `Err` entries become stream errors.
#[derive(Default)]
struct ScriptedGenerator {
    script: Vec<Result<&'static str, &'static str>>,
    refuse_load: bool,
    refuse_stream: bool,
    loads: AtomicUsize,
    unloads: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    fn tokens(tokens: &[&'static str]) -> Self {
        Self {
            script: tokens.iter().map(|t| Ok(*t)).collect(),
            ..Default::default()
        }
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn load(&self) -> Result<(), LlmError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if self.refuse_load {
            return Err(LlmError::ModelInit("no such model".into()));
        }
        Ok(())
    }

    async fn stream(&self, prompt: &str, _options: &SearchOptions) -> Result<TokenStream, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if self.refuse_stream {
            return Err(LlmError::ApiError {
                status: 500,
                body: "overloaded".into(),
            });
        }
        let items: Vec<Result<String, LlmError>> = self
            .script
            .iter()
            .map(|step| match step {
                Ok(text) => Ok(text.to_string()),
                Err(reason) => Err(LlmError::StreamError(reason.to_string())),
            })
            .collect();
        Ok(Box::pin(stream::iter(items)))
    }

    async fn unload(&self) -> Result<(), LlmError> {
        self.unloads.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn model(&self) -> &str {
        "scripted"
    }
}

fn handler(generator: &Arc<ScriptedGenerator>) -> ModelHandler {
    ModelHandler::new(
        Arc::clone(generator) as Arc<dyn TextGenerator>,
        ChatTemplate::default(),
        SearchOptions::default(),
    )
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn snapshots_grow_and_drop_trailing_newlines() {
    let generator = Arc::new(ScriptedGenerator::tokens(&["Paris", " is", " the capital.", "\n", "\n"]));
    let handler = handler(&generator);
    handler.initialize().await.unwrap();

    let snapshots: Vec<String> = handler
        .generate_response("SYS", "Capital of France?", Some("Paris is the capital."), Some("[1] Source: fr.txt"))
        .collect()
        .await;

    assert_eq!(
        snapshots,
        vec![
            "Paris",
            "Paris is",
            "Paris is the capital.",
            "Paris is the capital.",
            "Paris is the capital.",
        ]
    );
    for pair in snapshots.windows(2) {
        assert!(pair[1].starts_with(&pair[0]));
    }

    let prompts = generator.prompts.lock().unwrap();
    assert!(prompts[0].contains("Context: Paris is the capital.\n"));
    assert!(prompts[0].contains("User Question: Capital of France?\n"));
}

#[tokio::test]
async fn stream_is_lazy() {
    let generator = Arc::new(ScriptedGenerator::tokens(&["x"]));
    let handler = handler(&generator);
    handler.initialize().await.unwrap();

    let stream = handler.generate_response("SYS", "q", None, None);
    assert!(generator.prompts.lock().unwrap().is_empty());
    drop(stream);
    assert!(generator.prompts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn mid_stream_failure_ends_with_one_error() {
    let generator = Arc::new(ScriptedGenerator {
        script: vec![Ok("Hello"), Err("connection reset"), Ok("never")],
        ..Default::default()
    });
    let handler = handler(&generator);
    handler.initialize().await.unwrap();

    let snapshots: Vec<String> = handler.generate_response("SYS", "q", None, None).collect().await;
    assert_eq!(snapshots.len(), 2);
    assert_eq!(snapshots[0], "Hello");
    assert!(snapshots[1].starts_with(ERROR_PREFIX));
    assert!(snapshots[1].contains("connection reset"));
}

#[tokio::test]
async fn backend_refusal_is_a_single_error() {
    let generator = Arc::new(ScriptedGenerator {
        refuse_stream: true,
        ..Default::default()
    });
    let handler = handler(&generator);
    handler.initialize().await.unwrap();

    let snapshots: Vec<String> = handler.generate_response("SYS", "q", None, None).collect().await;
    assert_eq!(snapshots.len(), 1);
    assert!(snapshots[0].starts_with("Error during generation: API error: 500"));
}

#[tokio::test]
async fn generating_before_initialize_is_an_error_snapshot() {
    let generator = Arc::new(ScriptedGenerator::tokens(&["x"]));
    let handler = handler(&generator);

    let snapshots: Vec<String> = handler.generate_response("SYS", "q", None, None).collect().await;
    assert_eq!(snapshots, vec![format!("{ERROR_PREFIX}model is not loaded")]);
    assert!(generator.prompts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn initialize_is_idempotent_and_fails_fast() {
    let generator = Arc::new(ScriptedGenerator::tokens(&[]));
    let handler = handler(&generator);
    handler.initialize().await.unwrap();
    handler.initialize().await.unwrap();
    assert_eq!(generator.loads.load(Ordering::SeqCst), 1);
    assert!(handler.is_loaded());

    let broken = Arc::new(ScriptedGenerator {
        refuse_load: true,
        ..Default::default()
    });
    let handler = self::handler(&broken);
    assert!(matches!(handler.initialize().await, Err(LlmError::ModelInit(_))));
    assert!(!handler.is_loaded());
}

#[tokio::test]
async fn cleanup_is_idempotent_and_safe_before_init() {
    let generator = Arc::new(ScriptedGenerator::tokens(&[]));
    let handler = handler(&generator);

    handler.cleanup().await;
    assert_eq!(generator.unloads.load(Ordering::SeqCst), 0);

    handler.initialize().await.unwrap();
    handler.cleanup().await;
    handler.cleanup().await;
    assert_eq!(generator.unloads.load(Ordering::SeqCst), 1);
    assert!(!handler.is_loaded());
}

#[tokio::test]
async fn reload_unloads_then_loads() {
    let generator = Arc::new(ScriptedGenerator::tokens(&[]));
    let handler = handler(&generator);
    handler.initialize().await.unwrap();
    handler.reload().await.unwrap();
    assert_eq!(generator.loads.load(Ordering::SeqCst), 2);
    assert_eq!(generator.unloads.load(Ordering::SeqCst), 1);
    assert!(handler.is_loaded());
}

#[tokio::test]
async fn live_stream_holds_the_model() {
    let generator = Arc::new(ScriptedGenerator::tokens(&["a", "b"]));
    let handler = handler(&generator);
    handler.initialize().await.unwrap();

    let mut stream = handler.generate_response("SYS", "q", None, None);
    assert_eq!(stream.next().await.as_deref(), Some("a"));

    let blocked = tokio::time::timeout(Duration::from_millis(50), handler.cleanup()).await;
    assert!(blocked.is_err());
    assert!(handler.is_loaded());

    drop(stream);
    handler.cleanup().await;
    assert!(!handler.is_loaded());
}
