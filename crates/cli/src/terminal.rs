use std::io::{self, Write};

use anyhow::Result;
use crossterm::{
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
};
use jarvis_llm::ERROR_PREFIX;
use jarvis_retrieval::Retrieval;

use crate::session::SessionSummary;

/// Color scheme for terminal output.
struct Colors;

impl Colors {
    const USER_PROMPT: Color = Color::Green;
    const ASSISTANT_TEXT: Color = Color::Cyan;
    const CITATION: Color = Color::Yellow;
    const ERROR: Color = Color::Red;
    const DIM: Color = Color::DarkGrey;
    const HEADER: Color = Color::Magenta;
}

/// What to print for the next snapshot given what is already on screen.
#[derive(Debug, PartialEq)]
pub enum Delta<'a> {
    Append(&'a str),
    /// The snapshot no longer extends the printed text (an error replaced
    /// the partial answer).
    Restart(&'a str),
}

pub fn delta<'a>(printed: &str, snapshot: &'a str) -> Delta<'a> {
    match snapshot.strip_prefix(printed) {
        Some(rest) => Delta::Append(rest),
        None => Delta::Restart(snapshot),
    }
}

/// Renders a stream of growing snapshots as incremental output.
#[derive(Debug, Default)]
pub struct SnapshotPrinter {
    printed: String,
}

impl SnapshotPrinter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&mut self, snapshot: &str) -> Result<()> {
        let mut stdout = io::stdout();
        let color = if snapshot.starts_with(ERROR_PREFIX) {
            Colors::ERROR
        } else {
            Colors::ASSISTANT_TEXT
        };
        match delta(&self.printed, snapshot) {
            Delta::Append("") => return Ok(()),
            Delta::Append(rest) => {
                execute!(stdout, SetForegroundColor(color), Print(rest), ResetColor)?;
            }
            Delta::Restart(text) => {
                execute!(stdout, Print("\n"), SetForegroundColor(color), Print(text), ResetColor)?;
            }
        }
        stdout.flush()?;
        self.printed = snapshot.to_string();
        Ok(())
    }

    /// Terminate the answer line and return the final text.
    pub fn finish(self) -> Result<String> {
        let mut stdout = io::stdout();
        execute!(stdout, Print("\n"))?;
        stdout.flush()?;
        Ok(self.printed)
    }
}

/// Manages terminal I/O for the interactive REPL.
pub struct Terminal;

impl Terminal {
    pub fn new() -> Self {
        Self
    }

    /// Print the startup banner.
    pub fn print_banner(&self, model: &str, chunks: usize) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            SetForegroundColor(Colors::HEADER),
            Print("jarvis"),
            ResetColor,
            Print(" - Document Assistant\n"),
            SetForegroundColor(Colors::DIM),
            Print(format!("Model: {} | Indexed chunks: {}\n", model, chunks)),
            Print("Commands: /clear history, /reload model, /exit quit. Ctrl+C stops an answer.\n"),
            Print("---\n"),
            ResetColor,
        )?;
        stdout.flush()?;
        Ok(())
    }

    /// Read a line of user input with prompt. `None` on end of input.
    pub fn read_input(&self) -> Result<Option<String>> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            Print("\n"),
            SetForegroundColor(Colors::USER_PROMPT),
            Print("you> "),
            ResetColor,
        )?;
        stdout.flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            return Ok(None);
        }
        Ok(Some(input.trim().to_string()))
    }

    pub fn print_assistant_label(&self) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            SetForegroundColor(Colors::HEADER),
            Print("jarvis> "),
            ResetColor,
        )?;
        stdout.flush()?;
        Ok(())
    }

    pub fn print_citations(&self, citations: &str) -> Result<()> {
        if citations.is_empty() {
            return Ok(());
        }
        let mut stdout = io::stdout();
        execute!(
            stdout,
            SetForegroundColor(Colors::DIM),
            Print("\nSources & Citations:\n"),
            SetForegroundColor(Colors::CITATION),
            Print(format!("{}\n", citations)),
            ResetColor,
        )?;
        stdout.flush()?;
        Ok(())
    }

    /// Print each retrieved chunk with its score, then the citations.
    pub fn print_snippets(&self, retrieval: &Retrieval) -> Result<()> {
        let mut stdout = io::stdout();
        for (i, hit) in retrieval.hits.iter().enumerate() {
            execute!(
                stdout,
                SetForegroundColor(Colors::HEADER),
                Print(format!("Snippet {} ", i + 1)),
                SetForegroundColor(Colors::DIM),
                Print(format!("(score {:.3})\n", hit.score)),
                ResetColor,
                Print(format!("{}\n---\n", hit.record.chunk_text.trim())),
            )?;
        }
        stdout.flush()?;
        self.print_citations(&retrieval.citations)
    }

    /// Print a session listing.
    pub fn print_sessions(&self, sessions: &[SessionSummary]) -> Result<()> {
        let mut stdout = io::stdout();
        if sessions.is_empty() {
            execute!(
                stdout,
                SetForegroundColor(Colors::DIM),
                Print("No saved sessions found.\n"),
                ResetColor,
            )?;
            return Ok(());
        }

        execute!(
            stdout,
            SetForegroundColor(Colors::HEADER),
            Print("Saved Sessions:\n"),
            SetForegroundColor(Colors::DIM),
            Print(format!("{:<20} {:<40} {:<12} {:<6}\n", "ID", "NAME", "MODEL", "MSGS")),
            Print(format!("{}\n", "-".repeat(80))),
            ResetColor,
        )?;

        for s in sessions {
            let name = if s.name.chars().count() > 38 {
                format!("{}...", s.name.chars().take(35).collect::<String>())
            } else {
                s.name.clone()
            };
            execute!(
                stdout,
                Print(format!("{:<20} {:<40} {:<12} {:<6}\n", s.id, name, s.model, s.message_count)),
            )?;
        }

        stdout.flush()?;
        Ok(())
    }

    /// Print an error message.
    pub fn print_error(&self, msg: &str) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            SetForegroundColor(Colors::ERROR),
            Print(format!("Error: {}\n", msg)),
            ResetColor,
        )?;
        stdout.flush()?;
        Ok(())
    }

    /// Print an info message.
    pub fn print_info(&self, msg: &str) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            SetForegroundColor(Colors::DIM),
            Print(format!("{}\n", msg)),
            ResetColor,
        )?;
        stdout.flush()?;
        Ok(())
    }
}
