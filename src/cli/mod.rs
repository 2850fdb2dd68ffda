// src/cli/mod.rs — CLI definition (clap derive) and runtime wiring

pub mod chat;
pub mod init;
pub mod serve;
pub mod stats;

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::dialogue::store::SessionStore;
use crate::dialogue::DialogueController;
use crate::infra::config::Config;
use crate::infra::paths;
use crate::integrations::wikipedia::WikipediaLookup;
use crate::memory::store_server::{spawn_store_server, StoreHandle};
use crate::memory::MemoryManager;
use crate::provider;

#[derive(Parser)]
#[command(name = "ragnosis", about = "Guided symptom intake chatbot", version)]
pub struct Cli {
    /// Model to use (provider/model format)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Config file path
    #[arg(long)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the Telegram bot (default)
    Serve,
    /// Talk to the bot from the terminal
    Chat {
        /// Session key to use
        #[arg(long, default_value = "local")]
        user: String,
    },
    /// Show usage analytics
    Stats {
        /// Number of symptoms to list
        #[arg(long, default_value = "10")]
        top: u32,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Write the default config file
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },
}

/// Open the analytics database and start its actor, if enabled.
/// Analytics are best-effort: failures are logged and the bot runs without them.
pub fn open_analytics(config: &Config) -> Option<StoreHandle> {
    if !config.analytics.enabled {
        return None;
    }
    let db_path = paths::db_path();
    match MemoryManager::open(&db_path) {
        Ok(mm) => {
            let (handle, _task) = spawn_store_server(mm.store);
            tracing::debug!("Analytics database: {}", db_path.display());
            Some(handle)
        }
        Err(e) => {
            tracing::warn!("Analytics disabled, cannot open {}: {}", db_path.display(), e);
            None
        }
    }
}

/// Resolve the model provider from the environment and wire the dialogue.
pub fn build_controller(
    config: &Config,
    analytics: Option<StoreHandle>,
) -> anyhow::Result<DialogueController> {
    let model_ref = config.model.model_ref()?;
    let provider = provider::from_env(&model_ref)?;
    tracing::info!("Using model {}", model_ref);

    let mut controller =
        DialogueController::from_config(config, provider, Arc::new(SessionStore::new()))?;

    if let Some(handle) = analytics {
        controller = controller.with_analytics(handle);
    }

    if config.knowledge.enabled {
        let timeout = Duration::from_secs(config.knowledge.timeout_seconds.max(1));
        match WikipediaLookup::new(&config.knowledge.language, timeout) {
            Ok(lookup) => controller = controller.with_knowledge(Arc::new(lookup)),
            Err(e) => tracing::warn!("Knowledge lookups disabled: {}", e),
        }
    }

    Ok(controller)
}
