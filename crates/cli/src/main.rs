mod cli;
mod session;
mod terminal;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use mytuts_core::config::{load_dotenv, Config};
use mytuts_core::ComplexityMode;
use mytuts_llm::StudyAssistant;
use mytuts_retrieval::{KnowledgeBase, Retriever};

use crate::cli::{CliArgs, Command};
use crate::session::{ChatCommand, ChatSession, HELP};
use crate::terminal::Terminal;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    load_dotenv();
    let args = CliArgs::parse();

    let config = match args.profile.as_deref() {
        Some(profile) => Config::for_profile(profile),
        None => Config::from_env(),
    };
    config.validate().context("invalid configuration")?;
    config.log_summary();

    let terminal = Terminal::new();
    let kb = KnowledgeBase::new();
    if !matches!(args.command, Command::Config) {
        load_documents(&kb, &args.docs, &config, &terminal)?;
    }

    match args.command {
        Command::Config => {
            println!("{}", serde_json::to_string_pretty(&config.redacted_summary())?);
        }
        Command::Stats { json } => {
            let stats = kb.stats();
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                terminal.print_stats(&stats)?;
            }
        }
        Command::Search { query, k } => {
            let retriever = Retriever::from_config(&config);
            let snapshot = kb.snapshot();
            let mut hits = retriever.rank(&query, snapshot.chunks());
            hits.truncate(k.unwrap_or(retriever.top_k()));
            terminal.print_search(&query, &hits)?;
        }
        Command::Ask { question, mode, json } => {
            let assistant = build_assistant(&config)?;
            let answer = {
                let _spinner = (!json).then(|| terminal.start_spinner("Thinking...")).transpose()?;
                assistant.answer(&kb, &question, mode).await
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&answer)?);
            } else {
                terminal.print_answer(&answer)?;
            }
        }
        Command::Quiz { topic, count } => {
            let assistant = build_assistant(&config)?;
            let quiz = {
                let _spinner = terminal.start_spinner("Writing questions...")?;
                assistant.quiz(&kb, topic.as_deref(), usize::from(count)).await
            };
            terminal.print_quiz(&quiz.context("quiz generation failed")?)?;
        }
        Command::Chat { mode } => {
            let assistant = build_assistant(&config)?;
            run_chat(&assistant, &kb, &config, &terminal, mode).await?;
        }
    }

    Ok(())
}

fn build_assistant(config: &Config) -> Result<StudyAssistant> {
    StudyAssistant::from_config(config).with_context(|| {
        format!(
            "failed to set up the '{}' generation provider",
            config.llm.provider
        )
    })
}

/// Ingest every path; a file that fails is reported and skipped.
fn load_documents(
    kb: &KnowledgeBase,
    paths: &[PathBuf],
    config: &Config,
    terminal: &Terminal,
) -> Result<()> {
    for path in paths {
        match kb.ingest_file(path, &config.chunking) {
            Ok(report) => terminal.print_ingest(&report)?,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to ingest document");
                terminal.print_error(&format!("{}: {}", path.display(), e))?;
            }
        }
    }
    let stats = kb.stats();
    info!(
        documents = stats.total_documents,
        chunks = stats.total_chunks,
        "knowledge base ready"
    );
    Ok(())
}

async fn run_chat(
    assistant: &StudyAssistant,
    kb: &KnowledgeBase,
    config: &Config,
    terminal: &Terminal,
    mode: ComplexityMode,
) -> Result<()> {
    let mut session = ChatSession::new(mode);
    terminal.print_banner(
        &config.llm.provider,
        config.llm.active_model(&config.ollama),
        session.mode,
    )?;
    if kb.snapshot().is_empty() {
        terminal.print_warning("no documents loaded; every question will come back without context")?;
    }

    loop {
        let Some(line) = terminal.read_input(session.mode)? else {
            break;
        };

        match ChatCommand::parse(&line) {
            ChatCommand::Empty => continue,
            ChatCommand::Quit => break,
            ChatCommand::Help => terminal.print_info(HELP)?,
            ChatCommand::Stats => terminal.print_stats(&kb.stats())?,
            ChatCommand::Invalid(reason) => terminal.print_error(&reason)?,
            ChatCommand::SetMode(mode) => {
                session.mode = mode;
                terminal.print_info(&format!("Explanation level set to {}.", mode))?;
            }
            ChatCommand::Ask(question) => {
                let answer = {
                    let _spinner = terminal.start_spinner("Thinking...")?;
                    assistant.answer(kb, &question, session.mode).await
                };
                session.questions_asked += 1;
                terminal.print_answer(&answer)?;
            }
        }
    }

    terminal.print_info(&format!(
        "Goodbye. {} question(s) answered.",
        session.questions_asked
    ))?;
    Ok(())
}
