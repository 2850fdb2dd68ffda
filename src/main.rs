// src/main.rs — RAGnosis entry point

use clap::Parser;

use ragnosis::cli::{Cli, Commands};
use ragnosis::infra::config::Config;
use ragnosis::infra::logger;

#[tokio::main]
async fn main() {
    // Initialize logging (respects RUST_LOG / RAGNOSIS_LOG)
    logger::init_logging("info");

    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Init must work before any config exists
    if let Some(Commands::Init { force }) = cli.command {
        return ragnosis::cli::init::run_init(force).await;
    }

    // Load config (falls back to defaults if no config.toml)
    let mut config = if let Some(ref path) = cli.config {
        Config::load_from(std::path::Path::new(path))?
    } else {
        Config::load()?
    };

    if let Some(model) = cli.model {
        config.model.model = model;
        config.validate()?;
    }

    match cli.command {
        Some(Commands::Chat { ref user }) => ragnosis::cli::chat::run_chat(&config, user).await,
        Some(Commands::Stats { top, json }) => ragnosis::cli::stats::show_stats(top, json).await,
        Some(Commands::Serve) | None => ragnosis::cli::serve::run_serve(&config).await,
        Some(Commands::Init { .. }) => Ok(()),
    }
}
