//! bugwatch CLI binary entry point.

use bugwatch::cli::commands::{handle_ask, handle_chat, handle_tools, load_config};
use bugwatch::cli::{Cli, Commands};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("bugwatch=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Tools => handle_tools(),
        Commands::Ask(ref args) => match load_config(&cli) {
            Ok(config) => handle_ask(&config, args.prompt.join(" ")).await,
            Err(e) => Err(e),
        },
        Commands::Chat(ref args) => match load_config(&cli) {
            Ok(config) => handle_chat(&config, args.session.clone()).await,
            Err(e) => Err(e),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
