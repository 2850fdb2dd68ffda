// src/cli/serve.rs — Run the Telegram bot

use std::sync::Arc;

use crate::infra::config::Config;
use crate::infra::daemon::{run_bot, BotConfig};
use crate::infra::errors::RagnosisError;
use crate::integrations::telegram::TelegramAdapter;

const TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";

pub async fn run_serve(config: &Config) -> anyhow::Result<()> {
    let token = std::env::var(TOKEN_ENV)
        .ok()
        .filter(|t| !t.trim().is_empty())
        .ok_or(RagnosisError::MissingCredential(TOKEN_ENV))?;

    let adapter = TelegramAdapter::new(token);
    let identity = adapter.validate().await?;
    println!("{} ({})", identity, config.bot.name);

    let analytics = super::open_analytics(config);
    let controller = super::build_controller(config, analytics)?;

    run_bot(
        BotConfig::from_config(config),
        Arc::new(controller),
        Arc::new(adapter),
    )
    .await
}
