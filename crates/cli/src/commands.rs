use anyhow::{Context, Result};
use futures::StreamExt;
use jarvis_core::Config;
use jarvis_ingest::{create_embedder, IngestionPipeline};
use tracing::{error, info, warn};

use crate::assistant::{open_retriever, Assistant, Turn, NO_DOCUMENTS};
use crate::session::{ChatMessage, Session};
use crate::terminal::{SnapshotPrinter, Terminal};

/// Rebuild the store from `config.source_dir`.
pub async fn ingest(config: &Config) -> Result<()> {
    config.log_summary();
    let embedder = create_embedder(config)
        .await
        .context("failed to initialize embedding model")?;
    let pipeline = IngestionPipeline::from_config(config, embedder)?;

    let report = pipeline
        .run(&config.source_dir, &config.vector_store_path)
        .await
        .context("ingestion failed")?;

    let terminal = Terminal::new();
    for skipped in &report.skipped {
        terminal.print_error(&format!("skipped {}: {}", skipped.path.display(), skipped.reason))?;
    }
    terminal.print_info(&format!(
        "Ingested {} of {} files into {} chunks ({} skipped). Store: {}",
        report.files_loaded,
        report.files_discovered,
        report.chunks,
        report.skipped.len(),
        report.snapshot_path.display()
    ))?;
    Ok(())
}

/// Print the nearest chunks and their citations.
pub async fn search(config: &Config, query: &str, k: Option<usize>) -> Result<()> {
    let terminal = Terminal::new();
    let retriever = open_retriever(config).await?;
    let retrieval = retriever
        .retrieve(query, k)
        .await
        .context("failed to retrieve context")?;
    if retrieval.is_empty() {
        terminal.print_info(NO_DOCUMENTS)?;
        return Ok(());
    }
    terminal.print_snippets(&retrieval)
}

/// Answer a single question and exit.
pub async fn ask(config: &Config, question: &str, k: Option<usize>) -> Result<()> {
    let terminal = Terminal::new();
    let assistant = Assistant::connect(config).await?;
    if !assistant.has_documents() {
        terminal.print_info(NO_DOCUMENTS)?;
        return Ok(());
    }
    assistant.start().await?;

    let result = match assistant.turn(question, k).await {
        Ok(Some(turn)) => stream_answer(&terminal, turn).await.map(|_| ()),
        Ok(None) => terminal.print_info(NO_DOCUMENTS),
        Err(e) => Err(e),
    };
    assistant.shutdown().await;
    result
}

pub fn list_sessions() -> Result<()> {
    let sessions = Session::list_all()?;
    Terminal::new().print_sessions(&sessions)
}

/// Interactive question answering with persisted history.
pub async fn chat(config: &Config, k: Option<usize>, session_id: Option<&str>) -> Result<()> {
    let terminal = Terminal::new();
    let assistant = Assistant::connect(config).await?;
    if !assistant.has_documents() {
        terminal.print_info(NO_DOCUMENTS)?;
        return Ok(());
    }
    terminal.print_info(&format!("Loading {} ...", assistant.model()))?;
    assistant.start().await?;

    let mut session = match session_id {
        Some(id) => {
            info!(session = %id, "Resuming session");
            let loaded =
                Session::load(id).with_context(|| format!("failed to load session '{}'", id))?;
            terminal.print_info(&format!(
                "Resumed session: {} ({} messages)",
                loaded.name,
                loaded.messages.len()
            ))?;
            loaded
        }
        None => Session::new(assistant.model().to_string()),
    };

    terminal.print_banner(assistant.model(), assistant.indexed_chunks())?;

    loop {
        let input = match terminal.read_input()? {
            Some(text) => text,
            None => break,
        };

        match input.as_str() {
            "" => continue,
            "/exit" | "/quit" | "exit" | "quit" => break,
            "/clear" => {
                session.clear();
                terminal.print_info("Chat history cleared.")?;
                continue;
            }
            "/reload" => {
                match assistant.reload().await {
                    Ok(()) => terminal.print_info("Model reloaded.")?,
                    Err(e) => {
                        error!(error = %e, "Model reload failed");
                        terminal.print_error(&format!("{:#}", e))?;
                    }
                }
                continue;
            }
            _ => {}
        }

        session.push(ChatMessage::user(input.clone()));
        match assistant.turn(&input, k).await {
            Ok(Some(turn)) => {
                let citations = turn.retrieval.citations.clone();
                let answer = stream_answer(&terminal, turn).await?;
                session.push(ChatMessage::assistant(answer, Some(citations)));
            }
            Ok(None) => terminal.print_info(NO_DOCUMENTS)?,
            Err(e) => {
                error!(error = %e, "Error processing request");
                terminal.print_error(&format!("Error processing your request: {:#}", e))?;
            }
        }

        if let Err(e) = session.save() {
            warn!(error = %e, "Failed to auto-save session");
        }
    }

    assistant.shutdown().await;
    match session.save() {
        Ok(_) => terminal.print_info(&format!("Session saved: {}", session.id))?,
        Err(e) => terminal.print_error(&format!("Failed to save session: {}", e))?,
    }
    Ok(())
}

/// Print the answer as it grows, then its citations. Ctrl+C drops the
/// stream, which stops generation. Returns the final answer text.
async fn stream_answer(terminal: &Terminal, turn: Turn) -> Result<String> {
    let Turn { retrieval, mut answer } = turn;
    let mut printer = SnapshotPrinter::new();
    let mut cancelled = false;
    terminal.print_assistant_label()?;

    loop {
        tokio::select! {
            next = answer.next() => match next {
                Some(snapshot) => printer.show(&snapshot)?,
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                cancelled = true;
                break;
            }
        }
    }
    drop(answer);

    let text = printer.finish()?;
    if cancelled {
        terminal.print_info("[cancelled]")?;
    } else {
        terminal.print_citations(&retrieval.citations)?;
    }
    Ok(text)
}
