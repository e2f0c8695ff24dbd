use anyhow::Result;
use crossterm::{
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
};
use mytuts_core::{ComplexityMode, ScoredChunk};
use mytuts_llm::{Answer, AnswerStatus, Quiz};
use mytuts_retrieval::{IngestReport, KnowledgeBaseStats};
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Color scheme for terminal output.
struct Colors;

impl Colors {
    const USER_PROMPT: Color = Color::Green;
    const ANSWER_TEXT: Color = Color::Cyan;
    const SOURCE: Color = Color::Yellow;
    const WARNING: Color = Color::DarkYellow;
    const ERROR: Color = Color::Red;
    const DIM: Color = Color::DarkGrey;
    const HEADER: Color = Color::Magenta;
}

/// Characters of chunk text shown per search hit.
const SNIPPET_CHARS: usize = 240;
/// Headings listed per document in stats output.
const MAX_HEADINGS: usize = 6;

/// Terminal output for one-shot commands and the chat loop.
pub struct Terminal;

impl Terminal {
    pub fn new() -> Self {
        Self
    }

    /// Print the startup banner.
    pub fn print_banner(&self, provider: &str, model: &str, mode: ComplexityMode) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            SetForegroundColor(Colors::HEADER),
            Print("mytuts"),
            ResetColor,
            Print(" - study assistant\n"),
            SetForegroundColor(Colors::DIM),
            Print(format!("Provider: {} | Model: {} | Mode: {}\n", provider, model, mode)),
            Print("Type :help for commands, :quit to leave.\n"),
            Print("---\n"),
            ResetColor,
        )?;
        stdout.flush()?;
        Ok(())
    }

    /// Read a line of user input with prompt. Returns None at end of input.
    pub fn read_input(&self, mode: ComplexityMode) -> Result<Option<String>> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            Print("\n"),
            SetForegroundColor(Colors::USER_PROMPT),
            Print(format!("you ({})> ", mode)),
            ResetColor,
        )?;
        stdout.flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            return Ok(None);
        }
        Ok(Some(input.trim().to_string()))
    }

    pub fn print_ingest(&self, report: &IngestReport) -> Result<()> {
        self.print_info(&format!(
            "Loaded {} ({} chunks, {} characters)",
            report.filename, report.chunk_count, report.total_chars
        ))?;
        if !report.skipped_pages.is_empty() {
            let pages: Vec<String> = report
                .skipped_pages
                .iter()
                .map(|p| p.page_number.to_string())
                .collect();
            self.print_warning(&format!(
                "{}: skipped unreadable page(s) {}",
                report.filename,
                pages.join(", ")
            ))?;
        }
        if let Some(degraded) = &report.degraded {
            self.print_warning(&degraded.to_string())?;
        }
        Ok(())
    }

    pub fn print_answer(&self, answer: &Answer) -> Result<()> {
        let mut stdout = io::stdout();
        let color = match answer.status {
            AnswerStatus::Grounded => Colors::ANSWER_TEXT,
            AnswerStatus::InsufficientContext => Colors::DIM,
            AnswerStatus::Degraded => Colors::WARNING,
        };
        execute!(
            stdout,
            Print("\n"),
            SetForegroundColor(color),
            Print(format!("{}\n", answer.text)),
            ResetColor,
        )?;

        if !answer.sources.is_empty() {
            execute!(
                stdout,
                Print("\n"),
                SetForegroundColor(Colors::HEADER),
                Print(format!("Sources ({} passages, {} mode):\n", answer.context_used, answer.mode)),
                ResetColor,
            )?;
            for source in &answer.sources {
                let cited = answer.citations.iter().any(|c| c.source == source.source);
                execute!(
                    stdout,
                    SetForegroundColor(Colors::SOURCE),
                    Print(format!(
                        "  [{}] {} p.{}  score {:.2}{}\n",
                        source.source,
                        source.document_id,
                        source.page_number,
                        source.confidence,
                        if cited { "  (cited)" } else { "" }
                    )),
                    SetForegroundColor(Colors::DIM),
                    Print(format!("      terms: {}\n", source.matching_terms.join(", "))),
                    ResetColor,
                )?;
            }
        }
        stdout.flush()?;
        Ok(())
    }

    pub fn print_quiz(&self, quiz: &Quiz) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            SetForegroundColor(Colors::HEADER),
            Print(format!("Quiz ({} questions)\n", quiz.questions_requested)),
            ResetColor,
            Print(format!("{}\n\n", quiz.content)),
            SetForegroundColor(Colors::DIM),
            Print(format!("Based on: {}\n", quiz.source_documents.join(", "))),
            ResetColor,
        )?;
        stdout.flush()?;
        Ok(())
    }

    pub fn print_stats(&self, stats: &KnowledgeBaseStats) -> Result<()> {
        let mut stdout = io::stdout();
        if stats.documents.is_empty() {
            execute!(
                stdout,
                SetForegroundColor(Colors::DIM),
                Print("No documents loaded. Pass files with --doc.\n"),
                ResetColor,
            )?;
            return Ok(());
        }

        execute!(
            stdout,
            SetForegroundColor(Colors::HEADER),
            Print(format!(
                "{} document(s), {} chunk(s)\n",
                stats.total_documents, stats.total_chunks
            )),
            SetForegroundColor(Colors::DIM),
            Print(format!(
                "{:<32} {:<5} {:>7} {:>9} {:<20}\n",
                "ID", "TYPE", "CHUNKS", "CHARS", "INGESTED"
            )),
            Print(format!("{}\n", "-".repeat(76))),
            ResetColor,
        )?;

        for d in &stats.documents {
            execute!(
                stdout,
                Print(format!(
                    "{:<32} {:<5} {:>7} {:>9} {:<20}\n",
                    truncate(&d.id, 32),
                    d.file_type,
                    d.chunk_count,
                    d.total_chars,
                    d.ingested_at.format("%Y-%m-%d %H:%M:%S"),
                )),
                SetForegroundColor(Colors::DIM),
                Print(format!("  {}\n", d.preview)),
                ResetColor,
            )?;
            if !d.headings.is_empty() {
                execute!(
                    stdout,
                    SetForegroundColor(Colors::SOURCE),
                    Print(format!("  headings: {}\n", heading_line(&d.headings))),
                    ResetColor,
                )?;
            }
            if !d.skipped_pages.is_empty() {
                execute!(
                    stdout,
                    SetForegroundColor(Colors::WARNING),
                    Print(format!("  {} page(s) skipped\n", d.skipped_pages.len())),
                    ResetColor,
                )?;
            }
        }

        stdout.flush()?;
        Ok(())
    }

    pub fn print_search(&self, query: &str, hits: &[ScoredChunk]) -> Result<()> {
        let mut stdout = io::stdout();
        if hits.is_empty() {
            return self.print_info(&format!("No passages match '{}'.", query));
        }
        for (i, hit) in hits.iter().enumerate() {
            execute!(
                stdout,
                SetForegroundColor(Colors::SOURCE),
                Print(format!(
                    "{}. {} p.{} chunk {}  score {:.3}\n",
                    i + 1,
                    hit.chunk.document_id,
                    hit.chunk.page_number,
                    hit.chunk.chunk_id,
                    hit.score
                )),
                SetForegroundColor(Colors::DIM),
                Print(format!("   terms: {}\n", hit.matching_terms.join(", "))),
                ResetColor,
                Print(format!("   {}\n\n", truncate(hit.chunk.text.trim(), SNIPPET_CHARS))),
            )?;
        }
        stdout.flush()?;
        Ok(())
    }

    /// Show a spinner/waiting indicator. Returns a handle to stop it.
    pub fn start_spinner(&self, message: &str) -> Result<SpinnerHandle> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            SetForegroundColor(Colors::DIM),
            Print(format!("{} ", message)),
            ResetColor,
        )?;
        stdout.flush()?;

        let running = Arc::new(AtomicBool::new(true));
        let running_clone = running.clone();

        let handle = std::thread::spawn(move || {
            let frames = ['|', '/', '-', '\\'];
            let mut i = 0;
            while running_clone.load(Ordering::SeqCst) {
                let mut stdout = io::stdout();
                execute!(
                    stdout,
                    SetForegroundColor(Colors::DIM),
                    Print(format!("\r{} ", frames[i % frames.len()])),
                    ResetColor,
                )
                .ok();
                stdout.flush().ok();
                i += 1;
                std::thread::sleep(std::time::Duration::from_millis(100));
            }
            let mut stdout = io::stdout();
            execute!(stdout, Print("\r  \r")).ok();
            stdout.flush().ok();
        });

        Ok(SpinnerHandle {
            running,
            thread: Some(handle),
        })
    }

    pub fn print_warning(&self, msg: &str) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            SetForegroundColor(Colors::WARNING),
            Print(format!("Warning: {}\n", msg)),
            ResetColor,
        )?;
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

fn heading_line(headings: &[String]) -> String {
    let shown = headings[..headings.len().min(MAX_HEADINGS)].join(" / ");
    match headings.len().saturating_sub(MAX_HEADINGS) {
        0 => shown,
        more => format!("{shown} (+{more} more)"),
    }
}

/// First `max` characters of `s`, with "..." when cut.
fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &s[..cut]),
        None => s.to_string(),
    }
}

/// Handle to a running spinner. Dropping it stops the animation and waits
/// for the line to be cleared.
pub struct SpinnerHandle {
    running: Arc<AtomicBool>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl Drop for SpinnerHandle {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            thread.join().ok();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdef", 3), "abc...");
        assert_eq!(truncate("ääää", 2), "ää...");
    }

    #[test]
    fn heading_line_caps_the_list() {
        let few = vec!["Optics".to_string(), "Lenses".to_string()];
        assert_eq!(heading_line(&few), "Optics / Lenses");

        let many: Vec<String> = (1..=8).map(|i| format!("H{i}")).collect();
        assert_eq!(heading_line(&many), "H1 / H2 / H3 / H4 / H5 / H6 (+2 more)");
    }
}
