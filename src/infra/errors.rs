// src/infra/errors.rs — Error types for RAGnosis

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RagnosisError {
    // Backend errors (recovered with a fallback reply)
    #[error("Provider '{provider}' error: {message}")]
    Provider {
        provider: String,
        message: String,
        retriable: bool,
    },

    #[error("Rate limited by '{provider}', retry after {retry_after_ms}ms")]
    RateLimited {
        provider: String,
        retry_after_ms: u64,
    },

    #[error("Model did not answer within {after_ms}ms")]
    Timeout { after_ms: u64 },

    #[error("Model returned an empty completion")]
    EmptyCompletion,

    // User errors
    #[error("No provider configured for '{0}'. Set GEMINI_API_KEY or pick another model.")]
    NoProvider(String),

    #[error("Missing credential: set {0} in the environment")]
    MissingCredential(&'static str),

    // Infra
    #[error("Prompt template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RagnosisError {
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            RagnosisError::Provider {
                retriable: true,
                ..
            } | RagnosisError::RateLimited { .. }
                | RagnosisError::Timeout { .. }
        )
    }

    /// Failures of the text-generation backend. The dialogue answers these
    /// with a canned fallback and keeps going.
    pub fn is_backend(&self) -> bool {
        matches!(
            self,
            RagnosisError::Provider { .. }
                | RagnosisError::RateLimited { .. }
                | RagnosisError::Timeout { .. }
                | RagnosisError::EmptyCompletion
        )
    }
}
