// src/infra/daemon/mod.rs — Bot runtime: long-poll, dispatch, housekeeping

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::dialogue::DialogueController;
use crate::infra::config::Config;
use crate::integrations::{IncomingMessage, MessagingAdapter};

pub mod dispatcher;

pub use dispatcher::Dispatcher;

const POLL_BACKOFF_START: Duration = Duration::from_secs(2);
const POLL_BACKOFF_MAX: Duration = Duration::from_secs(60);

/// Runtime knobs taken from the config file.
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub poll_timeout_secs: u64,
    pub idle_timeout: chrono::Duration,
    pub housekeeping_interval: Duration,
    pub top_symptoms: usize,
}

impl BotConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            poll_timeout_secs: config.telegram.poll_timeout_seconds,
            idle_timeout: config.dialogue.idle_timeout(),
            housekeeping_interval: config.dialogue.eviction_interval(),
            top_symptoms: config.analytics.top_symptoms as usize,
        }
    }
}

/// Run the bot until Ctrl+C.
pub async fn run_bot(
    bot: BotConfig,
    controller: Arc<DialogueController>,
    adapter: Arc<dyn MessagingAdapter>,
) -> anyhow::Result<()> {
    tracing::info!(adapter = adapter.id(), provider = controller.provider_id(), "Bot starting");

    let (tx, mut rx) = mpsc::channel::<IncomingMessage>(256);
    let poller = tokio::spawn(poll_loop(adapter.clone(), tx, bot.poll_timeout_secs));

    let mut dispatcher = Dispatcher::new(controller.clone(), adapter, bot.housekeeping_interval);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut housekeeping = tokio::time::interval(bot.housekeeping_interval);
    // Consume the immediate first tick
    housekeeping.tick().await;

    println!("Bot running. Press Ctrl+C to stop.");

    loop {
        tokio::select! {
            msg = rx.recv() => match msg {
                Some(msg) => {
                    dispatcher.dispatch(msg);
                }
                None => {
                    tracing::error!("Poller stopped unexpectedly");
                    break;
                }
            },
            _ = housekeeping.tick() => {
                housekeep(&bot, &controller, &mut dispatcher);
            }
            _ = &mut shutdown => {
                tracing::info!("Shutdown signal received");
                println!("\nShutting down bot...");
                break;
            }
        }
    }

    poller.abort();
    dispatcher.shutdown().await;
    tracing::info!("Bot stopped.");
    Ok(())
}

/// Long-poll forever, forwarding messages. Errors back off exponentially.
async fn poll_loop(
    adapter: Arc<dyn MessagingAdapter>,
    tx: mpsc::Sender<IncomingMessage>,
    timeout_secs: u64,
) {
    let mut offset: Option<i64> = None;
    let mut backoff = POLL_BACKOFF_START;

    loop {
        match adapter.poll(offset, timeout_secs).await {
            Ok(batch) => {
                backoff = POLL_BACKOFF_START;
                if batch.next_offset.is_some() {
                    offset = batch.next_offset;
                }
                for msg in batch.messages {
                    if tx.send(msg).await.is_err() {
                        return;
                    }
                }
            }
            Err(e) => {
                tracing::warn!(
                    adapter = adapter.id(),
                    retry_in_secs = backoff.as_secs(),
                    "Poll failed: {}",
                    e
                );
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(POLL_BACKOFF_MAX);
            }
        }
    }
}

fn housekeep(bot: &BotConfig, controller: &DialogueController, dispatcher: &mut Dispatcher) {
    let evicted = controller.store().evict_idle(bot.idle_timeout);
    let workers = dispatcher.prune();
    if evicted > 0 || workers > 0 {
        tracing::debug!(evicted, workers, "Dropped idle sessions and workers");
    }

    let snapshot = controller.stats().snapshot(bot.top_symptoms);
    tracing::info!(
        users = snapshot.distinct_users,
        messages = snapshot.messages,
        analyses = snapshot.analyses,
        sessions = controller.store().len(),
        workers = dispatcher.worker_count(),
        "Stats"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialogue::session::Session;
    use crate::dialogue::store::SessionStore;
    use crate::infra::errors::RagnosisError;
    use crate::integrations::UpdateBatch;
    use crate::provider::{ChatRequest, ChatResponse, ModelProvider};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct NoModel;

    #[async_trait]
    impl ModelProvider for NoModel {
        fn id(&self) -> &str {
            "none"
        }

        fn name(&self) -> &str {
            "None"
        }

        async fn chat(&self, _request: ChatRequest) -> Result<ChatResponse, RagnosisError> {
            Err(RagnosisError::EmptyCompletion)
        }
    }

    /// Fails once, then serves a single batch, then nothing.
    struct FlakyAdapter {
        polls: AtomicUsize,
    }

    #[async_trait]
    impl MessagingAdapter for FlakyAdapter {
        fn id(&self) -> &str {
            "flaky"
        }

        async fn send(&self, _target: &str, _content: &str, _quick_replies: &[String]) -> anyhow::Result<String> {
            Ok(String::new())
        }

        async fn poll(&self, offset: Option<i64>, _timeout_secs: u64) -> anyhow::Result<UpdateBatch> {
            match self.polls.fetch_add(1, Ordering::SeqCst) {
                0 => anyhow::bail!("network down"),
                1 => {
                    assert_eq!(offset, None);
                    Ok(UpdateBatch {
                        messages: vec![IncomingMessage {
                            id: "1".into(),
                            target: "c".into(),
                            sender_id: "u".into(),
                            sender_name: None,
                            content: "/start".into(),
                            timestamp: 0,
                        }],
                        next_offset: Some(8),
                    })
                }
                _ => {
                    assert_eq!(offset, Some(8));
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(UpdateBatch::default())
                }
            }
        }
    }

    #[tokio::test]
    async fn test_poll_loop_recovers_and_advances_offset() {
        let adapter = Arc::new(FlakyAdapter {
            polls: AtomicUsize::new(0),
        });
        let (tx, mut rx) = mpsc::channel(4);
        let task = tokio::spawn(poll_loop(adapter.clone(), tx, 1));

        let msg = rx.recv().await.unwrap();
        assert_eq!(msg.content, "/start");
        task.abort();
        assert!(adapter.polls.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn test_housekeep_evicts_idle_sessions() {
        let controller = Arc::new(
            DialogueController::from_config(
                &Config::default(),
                Arc::new(NoModel),
                Arc::new(SessionStore::new()),
            )
            .unwrap(),
        );
        let mut stale = Session::new("old");
        stale.symptoms.push("🤒 Fever".into());
        stale.last_active = chrono::Utc::now() - chrono::Duration::hours(2);
        controller.store().update("old", stale);
        controller.store().update("fresh", Session::new("fresh"));

        let bot = BotConfig::from_config(&Config::default());
        let adapter: Arc<dyn MessagingAdapter> = Arc::new(FlakyAdapter {
            polls: AtomicUsize::new(0),
        });
        let mut dispatcher = Dispatcher::new(controller.clone(), adapter, Duration::from_secs(1));

        housekeep(&bot, &controller, &mut dispatcher);
        assert!(controller.store().get("old").is_none());
        assert!(controller.store().get("fresh").is_some());
    }
}
