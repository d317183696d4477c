use crate::agent::{Agent, AgentEvent};
use std::path::Path;
use thiserror::Error;
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::signal;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, error, info};

const DISPLAY_TRUNCATE_CHARS: usize = 200;

#[derive(Debug, Error)]
pub enum ShellError {
    #[error("stdin/stdout I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Line-oriented front end over one agent session: commands, progress
/// display, and turn interruption.
pub struct Shell {
    agent: Agent,
    label: String,
}

impl Shell {
    pub fn new(agent: Agent, label: impl Into<String>) -> Self {
        Self {
            agent,
            label: label.into(),
        }
    }

    pub async fn run(&mut self) -> Result<(), ShellError> {
        let stdin = BufReader::new(io::stdin());
        let mut lines = stdin.lines();
        let mut stdout = io::stdout();

        write_line(&mut stdout, format!("🚀 Starting {}...", self.label)).await?;
        write_line(&mut stdout, format!("🤖 Model: {}", self.agent.model())).await?;
        write_line(
            &mut stdout,
            format!("🔧 Tools available: {}", self.agent.tool_count()),
        )
        .await?;
        write_line(
            &mut stdout,
            format!(
                "💬 {} ready! Type a question (or 'quit' to exit, 'help' for commands)…",
                self.label
            ),
        )
        .await?;
        info!("Interactive shell started");

        loop {
            stdout.write_all("\n› ".as_bytes()).await?;
            stdout.flush().await?;

            let line = tokio::select! {
                line = lines.next_line() => line?,
                _ = signal::ctrl_c() => {
                    write_line(&mut stdout, "\n👋 Goodbye!").await?;
                    break;
                }
            };
            let Some(line) = line else {
                break;
            };

            let input = line.trim();
            let command = input.to_lowercase();
            match command.as_str() {
                "quit" | "exit" | "q" => break,
                "/help" | "help" => {
                    write_line(&mut stdout, "📋 Available commands:").await?;
                    write_line(&mut stdout, "  /help   - Show this help message").await?;
                    write_line(&mut stdout, "  /clear  - Clear conversation history").await?;
                    write_line(&mut stdout, "  /model  - Show current model").await?;
                    write_line(&mut stdout, "  /switch - Switch to a different model").await?;
                    write_line(&mut stdout, "  quit    - Exit the chat (also: exit, q)").await?;
                    write_line(&mut stdout, "  Or just type your question!").await?;
                }
                "/clear" | "clear" => {
                    let dropped = self.agent.snapshot().len();
                    self.agent.reset_history();
                    info!(dropped, "Conversation history cleared");
                    write_line(&mut stdout, "🧹 Conversation history cleared!").await?;
                }
                "/model" => {
                    write_line(
                        &mut stdout,
                        format!("🤖 Current model: {}", self.agent.model()),
                    )
                    .await?;
                }
                "/switch" => self.switch_model(&mut lines, &mut stdout).await?,
                "" => {}
                _ => self.run_question(input, &mut stdout).await?,
            }
        }

        Ok(())
    }

    /// Runs one question to completion without entering the command loop.
    pub async fn run_once(&mut self, question: &str) -> Result<(), ShellError> {
        let mut stdout = io::stdout();
        self.run_question(question, &mut stdout).await
    }

    async fn run_question(
        &mut self,
        question: &str,
        stdout: &mut io::Stdout,
    ) -> Result<(), ShellError> {
        write_line(stdout, "🤔 Processing...").await?;

        let (tx, rx) = mpsc::unbounded_channel();
        let mut events = UnboundedReceiverStream::new(rx);

        // The pinned turn future and the event stream are polled together;
        // Ctrl-C drops the turn mid-flight and returns to the prompt.
        let result = {
            let turn = self.agent.run_turn(question, &tx);
            tokio::pin!(turn);
            loop {
                tokio::select! {
                    outcome = &mut turn => break Some(outcome),
                    Some(event) = events.next() => print_event(stdout, event).await?,
                    _ = signal::ctrl_c() => {
                        write_line(stdout, "\n⏹ Turn interrupted.").await?;
                        break None;
                    }
                }
            }
        };

        drop(tx);
        while let Some(event) = events.next().await {
            print_event(stdout, event).await?;
        }

        match result {
            Some(Ok(outcome)) => {
                info!(
                    tool_rounds = outcome.tool_rounds,
                    answered = outcome.answer.is_some(),
                    "Turn finished"
                );
            }
            // The dropped turn never ran its end-of-turn compaction.
            None => self.agent.abandon_turn(),
            Some(Err(err)) => {
                error!(error = %err, "Turn failed");
                write_line(stdout, format!("❌ Agent Error: {}", err.user_message())).await?;
            }
        }
        Ok(())
    }

    async fn switch_model(
        &mut self,
        lines: &mut io::Lines<BufReader<io::Stdin>>,
        stdout: &mut io::Stdout,
    ) -> Result<(), ShellError> {
        let catalog = self.agent.catalog().to_vec();
        if catalog.is_empty() {
            write_line(stdout, "❌ No models configured").await?;
            return Ok(());
        }

        let current = self.agent.model().to_string();
        write_line(stdout, "🔄 Select model:").await?;
        for (index, name) in catalog.iter().enumerate() {
            let marker = if *name == current { " (current)" } else { "" };
            write_line(stdout, format!("  {}. {name}{marker}", index + 1)).await?;
        }

        stdout.write_all(b"Enter number: ").await?;
        stdout.flush().await?;
        let choice = tokio::select! {
            line = lines.next_line() => line?,
            _ = signal::ctrl_c() => {
                write_line(stdout, "\n❌ Selection cancelled").await?;
                return Ok(());
            }
        };
        let Some(choice) = choice else {
            return Ok(());
        };

        match choice.trim().parse::<usize>() {
            Ok(number) if (1..=catalog.len()).contains(&number) => {
                let selected = &catalog[number - 1];
                if self.agent.swap_model(selected) {
                    write_line(stdout, format!("🤖 Switched to {selected}")).await?;
                } else {
                    write_line(stdout, format!("🤖 Already using {selected}")).await?;
                }
            }
            Ok(_) => write_line(stdout, "❌ Invalid selection").await?,
            Err(_) => write_line(stdout, "❌ Please enter a number").await?,
        }
        Ok(())
    }
}

async fn print_event(stdout: &mut io::Stdout, event: AgentEvent) -> Result<(), ShellError> {
    match event {
        AgentEvent::ModelChunk { text } => {
            stdout.write_all(text.as_bytes()).await?;
            stdout.flush().await?;
        }
        AgentEvent::ToolStarted { name, input } => {
            write_line(stdout, format!("\n\n🛠️ Calling tool `{name}` with input:")).await?;
            write_line(
                stdout,
                format!("   {}\n", truncated(&input.to_string(), DISPLAY_TRUNCATE_CHARS)),
            )
            .await?;
        }
        AgentEvent::ToolFinished { name, output } => {
            write_line(
                stdout,
                format!(
                    "\n`{name}` returned:\n{}\n",
                    truncated(&output, DISPLAY_TRUNCATE_CHARS)
                ),
            )
            .await?;
        }
        AgentEvent::TurnEnded { answer, snapshot } => {
            debug!(
                answered = answer.is_some(),
                messages = snapshot.len(),
                "Turn ended"
            );
            write_line(stdout, "").await?;
        }
    }
    Ok(())
}

async fn write_line(stdout: &mut io::Stdout, line: impl AsRef<str>) -> Result<(), ShellError> {
    stdout.write_all(line.as_ref().as_bytes()).await?;
    stdout.write_all(b"\n").await?;
    stdout.flush().await?;
    Ok(())
}

fn truncated(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{cut}...")
}

/// Display name derived from the prompt file, `cloud_cost_agent.md` →
/// `Cloud-Cost-Agent`.
pub fn agent_label(prompt_file: Option<&Path>) -> String {
    let Some(stem) = prompt_file
        .and_then(|path| path.file_stem())
        .and_then(|stem| stem.to_str())
    else {
        return "Agent".to_string();
    };

    let words: Vec<String> = stem
        .split('_')
        .filter(|word| !word.is_empty())
        .map(capitalize)
        .collect();
    if words.is_empty() {
        "Agent".to_string()
    } else {
        words.join("-")
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}
