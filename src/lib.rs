// src/lib.rs — Library root for RAGnosis

pub mod cli;
pub mod dialogue;
pub mod infra;
pub mod integrations;
pub mod memory;
pub mod provider;
pub mod util;
