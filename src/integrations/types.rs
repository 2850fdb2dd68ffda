// src/integrations/types.rs — Integration adapter traits

use async_trait::async_trait;

/// An incoming text message from a messaging integration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub id: String,
    /// Where replies go (a chat id for Telegram).
    pub target: String,
    /// Stable per end user; keys the dialogue session.
    pub sender_id: String,
    pub sender_name: Option<String>,
    pub content: String,
    /// Unix seconds.
    pub timestamp: i64,
}

/// One long-poll result.
#[derive(Debug, Clone, Default)]
pub struct UpdateBatch {
    pub messages: Vec<IncomingMessage>,
    /// Offset to pass to the next poll, when the batch advanced it.
    pub next_offset: Option<i64>,
}

/// Adapter for chat transports.
#[async_trait]
pub trait MessagingAdapter: Send + Sync {
    fn id(&self) -> &str;

    /// Deliver `content`, showing `quick_replies` as suggested answers.
    /// An empty list removes any previously shown suggestions.
    async fn send(&self, target: &str, content: &str, quick_replies: &[String]) -> anyhow::Result<String>;

    /// Wait up to `timeout_secs` for new messages after `offset`.
    async fn poll(&self, offset: Option<i64>, timeout_secs: u64) -> anyhow::Result<UpdateBatch>;

    /// Show a "typing" indicator while a slow reply is prepared.
    async fn typing(&self, _target: &str) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Optional reference lookup used to enrich replies.
#[async_trait]
pub trait KnowledgeSource: Send + Sync {
    fn name(&self) -> &str;

    /// A short plain-text summary of `topic`, or `None` when nothing matches.
    async fn lookup(&self, topic: &str) -> anyhow::Result<Option<String>>;
}
