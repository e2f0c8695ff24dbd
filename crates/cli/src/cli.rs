use std::path::PathBuf;

use clap::{Parser, Subcommand};
use mytuts_core::ComplexityMode;

/// Study assistant that answers questions from your own course materials.
///
/// Every run starts from an empty knowledge base; pass the documents to
/// study with `--doc`.
#[derive(Parser, Debug)]
#[command(name = "mytuts", version, about = "Ask questions about your study materials")]
pub struct CliArgs {
    /// Document to load (PDF, TXT or Markdown). Repeat for several files.
    #[arg(long = "doc", value_name = "PATH", global = true)]
    pub docs: Vec<PathBuf>,

    /// Configuration profile; `{PROFILE}_{KEY}` env vars override `{KEY}`.
    #[arg(long, env = "MYTUTS_PROFILE", global = true)]
    pub profile: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Answer one question from the loaded documents
    Ask {
        question: String,

        /// beginner or advanced
        #[arg(long, default_value_t = ComplexityMode::Beginner)]
        mode: ComplexityMode,

        /// Print the answer as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate study questions
    Quiz {
        /// Focus topic (broad coverage when omitted)
        #[arg(long)]
        topic: Option<String>,

        /// Number of questions
        #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u16).range(1..=20))]
        count: u16,
    },

    /// Show what was loaded
    Stats {
        #[arg(long)]
        json: bool,
    },

    /// Show the best-matching passages without generating an answer
    Search {
        query: String,

        /// Passages to show (defaults to the configured top-k)
        #[arg(long, short)]
        k: Option<usize>,
    },

    /// Interactive question loop
    Chat {
        #[arg(long, default_value_t = ComplexityMode::Beginner)]
        mode: ComplexityMode,
    },

    /// Print the effective configuration with secrets removed
    Config,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_repeated_docs_and_mode() {
        let args = CliArgs::parse_from([
            "mytuts", "--doc", "a.pdf", "--doc", "b.md", "ask", "What is inertia?", "--mode", "advanced",
        ]);
        assert_eq!(args.docs, vec![PathBuf::from("a.pdf"), PathBuf::from("b.md")]);
        match args.command {
            Command::Ask { question, mode, json } => {
                assert_eq!(question, "What is inertia?");
                assert_eq!(mode, ComplexityMode::Advanced);
                assert!(!json);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn quiz_count_is_bounded() {
        assert!(CliArgs::try_parse_from(["mytuts", "quiz", "--count", "0"]).is_err());
        let args = CliArgs::try_parse_from(["mytuts", "quiz", "--count", "3"]).unwrap();
        assert!(matches!(args.command, Command::Quiz { count: 3, topic: None }));
    }

    #[test]
    fn rejects_unknown_mode() {
        assert!(CliArgs::try_parse_from(["mytuts", "ask", "q", "--mode", "expert-plus"]).is_err());
    }
}
