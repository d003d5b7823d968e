use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use oc_forge::cli::{Cli, Command};
use oc_forge::commands;
use oc_forge::AppConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // A .env file is optional; the key and overrides may come from there.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("oc_forge={log_level},gemini_image={log_level}").into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = AppConfig::load(cli.overrides());
    tracing::debug!(?config, "resolved configuration");

    match cli.command.unwrap_or(Command::Interactive) {
        Command::Interactive => commands::interactive::run(&config).await,
        Command::Generate(args) => commands::generate::run(&config, args).await,
        Command::Key => commands::key::run(&config).await,
        Command::History { limit } => commands::history::run(&config, limit).await,
    }
}
