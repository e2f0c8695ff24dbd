//! State and command parsing for the interactive chat loop.

use mytuts_core::ComplexityMode;

/// One line of chat input, interpreted.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    Ask(String),
    SetMode(ComplexityMode),
    Stats,
    Help,
    Quit,
    Empty,
    /// A `:command` that could not be understood; carries the reason.
    Invalid(String),
}

impl ChatCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return ChatCommand::Empty;
        }
        if matches!(line, "exit" | "quit") {
            return ChatCommand::Quit;
        }
        let Some(command) = line.strip_prefix(':').or_else(|| line.strip_prefix('/')) else {
            return ChatCommand::Ask(line.to_string());
        };

        let mut parts = command.split_whitespace();
        match (parts.next(), parts.next()) {
            (Some("quit" | "q" | "exit"), _) => ChatCommand::Quit,
            (Some("stats"), _) => ChatCommand::Stats,
            (Some("help" | "h" | "?"), _) => ChatCommand::Help,
            (Some("mode"), Some(mode)) => match mode.parse() {
                Ok(mode) => ChatCommand::SetMode(mode),
                Err(e) => ChatCommand::Invalid(e),
            },
            (Some("mode"), None) => {
                ChatCommand::Invalid("usage: :mode beginner|advanced".to_string())
            }
            (Some(other), _) => ChatCommand::Invalid(format!("unknown command ':{other}' (try :help)")),
            (None, _) => ChatCommand::Empty,
        }
    }
}

pub const HELP: &str = "Ask a question about your documents, or use:\n  \
:mode beginner|advanced  change the explanation level\n  \
:stats                   show loaded documents\n  \
:quit                    leave";

/// Per-run chat state. Each question is answered independently.
#[derive(Debug, Default)]
pub struct ChatSession {
    pub mode: ComplexityMode,
    pub questions_asked: usize,
}

impl ChatSession {
    pub fn new(mode: ComplexityMode) -> Self {
        Self {
            mode,
            questions_asked: 0,
        }
    }
}
