// src/integrations/mod.rs — Chat transport and reference lookups

pub mod telegram;
pub mod types;
pub mod wikipedia;

pub use types::{IncomingMessage, KnowledgeSource, MessagingAdapter, UpdateBatch};
