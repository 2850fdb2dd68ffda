// src/dialogue/mod.rs — Intake dialogue: sessions, transitions, prompts, replies

pub mod controller;
pub mod gateway;
pub mod machine;
pub mod menu;
pub mod prompt;
pub mod replies;
pub mod session;
pub mod stats;
pub mod store;

pub use controller::{DialogueController, OutgoingReply};
pub use session::{Session, Stage};
