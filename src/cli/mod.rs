//! CLI entry point for bugwatch.

pub mod commands;
pub mod render;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Ask about security advisories and defects in plain language.
#[derive(Parser, Debug)]
#[command(name = "bugwatch", version, about = "Streaming advisory and defect assistant")]
pub struct Cli {
    /// Configuration file (TOML). Defaults to $BUGWATCH_CONFIG or the user config dir.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Maximum model invocations per turn
    #[arg(long, global = true)]
    pub max_iterations: Option<u32>,

    /// Model name (or Azure deployment)
    #[arg(short, long, global = true)]
    pub model: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ask a single question and stream the answer
    Ask(AskArgs),
    /// Interactive chat
    Chat(ChatArgs),
    /// Print the tool specs advertised to the model
    Tools,
}

/// Arguments for `bugwatch ask`.
#[derive(Parser, Debug)]
pub struct AskArgs {
    /// The question (words are joined with spaces)
    #[arg(required = true)]
    pub prompt: Vec<String>,
}

/// Arguments for `bugwatch chat`.
#[derive(Parser, Debug)]
pub struct ChatArgs {
    /// Persist history under this session id (lowercase letters, digits, `-`, `_`)
    #[arg(short, long)]
    pub session: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_ask_joins_words() {
        let cli = Cli::try_parse_from(["bugwatch", "ask", "Cisco", "Catalyst", "9800", "bugs"]).unwrap();
        match cli.command {
            Commands::Ask(args) => assert_eq!(args.prompt.join(" "), "Cisco Catalyst 9800 bugs"),
            other => panic!("expected Ask, got {other:?}"),
        }
    }

    #[test]
    fn parse_chat_with_session_and_globals() {
        let cli = Cli::try_parse_from([
            "bugwatch",
            "chat",
            "--session",
            "triage",
            "--max-iterations",
            "3",
            "-m",
            "gpt-4o-mini",
        ])
        .unwrap();
        assert_eq!(cli.max_iterations, Some(3));
        assert_eq!(cli.model.as_deref(), Some("gpt-4o-mini"));
        match cli.command {
            Commands::Chat(args) => assert_eq!(args.session.as_deref(), Some("triage")),
            other => panic!("expected Chat, got {other:?}"),
        }
    }

    #[test]
    fn parse_tools() {
        let cli = Cli::try_parse_from(["bugwatch", "--config", "/tmp/b.toml", "tools"]).unwrap();
        assert!(matches!(cli.command, Commands::Tools));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/b.toml")));
    }

    #[test]
    fn parse_ask_without_prompt_is_error() {
        assert!(Cli::try_parse_from(["bugwatch", "ask"]).is_err());
    }

    #[test]
    fn parse_missing_subcommand_is_error() {
        assert!(Cli::try_parse_from(["bugwatch"]).is_err());
    }
}
