use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "orrery",
    version,
    about = "Tool-calling conversational agent with forced retry/finalize decisions"
)]
pub struct Cli {
    /// Configuration file (TOML). Defaults to config/orrery.toml when present.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Model to start with, overriding the configured default.
    #[arg(long)]
    pub model: Option<String>,
    /// Seed prompt template file, overriding the configured one.
    #[arg(long)]
    pub prompt_file: Option<PathBuf>,
    /// Ask one question and exit instead of starting the shell.
    #[arg()]
    pub question: Vec<String>,
}

impl Cli {
    pub fn question(&self) -> Option<String> {
        if self.question.is_empty() {
            None
        } else {
            Some(self.question.join(" "))
        }
    }
}
