// src/infra/config.rs — Configuration loading (TOML)

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::dialogue::menu::MenuConfig;
use crate::dialogue::prompt::PromptTemplates;
use crate::dialogue::replies::ReplyConfig;
use crate::infra::errors::RagnosisError;
use crate::infra::paths;
use crate::provider::ModelRef;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub bot: BotConfig,

    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub dialogue: DialogueConfig,

    #[serde(default)]
    pub telegram: TelegramConfig,

    #[serde(default)]
    pub analytics: AnalyticsConfig,

    #[serde(default)]
    pub knowledge: KnowledgeConfig,

    /// Button labels and option vocabularies.
    #[serde(default)]
    pub menu: MenuConfig,

    /// Prompt templates (minijinja).
    #[serde(default)]
    pub prompts: PromptTemplates,

    #[serde(default)]
    pub replies: ReplyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    pub name: String,
    /// Telegram user ids allowed to see analytics.
    pub admin_ids: Vec<String>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: "RAGnosis".into(),
            admin_ids: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// "provider/model"
    pub model: String,
    pub timeout_seconds: u64,
    pub temperature: Option<f32>,
    pub system: Option<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: "google/gemini-2.0-flash".into(),
            timeout_seconds: 30,
            temperature: Some(0.4),
            system: Some(
                "You are a careful health information assistant. You never give a \
                 diagnosis and you always recommend professional care for serious symptoms."
                    .into(),
            ),
        }
    }
}

impl ModelConfig {
    pub fn model_ref(&self) -> Result<ModelRef, RagnosisError> {
        ModelRef::parse(&self.model).ok_or_else(|| {
            RagnosisError::Config(format!(
                "model must look like provider/model, got '{}'",
                self.model
            ))
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.max(1))
    }
}

/// One week.
const MAX_IDLE_TIMEOUT_MINUTES: u64 = 7 * 24 * 60;
/// One day.
const MAX_EVICTION_INTERVAL_SECONDS: u64 = 24 * 60 * 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogueConfig {
    /// Maximum turns kept in a conversation log.
    pub conversation_cap: usize,
    /// Turns included in a conversational prompt.
    pub history_window: usize,
    pub idle_timeout_minutes: u64,
    pub eviction_interval_seconds: u64,
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            conversation_cap: 20,
            history_window: 8,
            idle_timeout_minutes: 30,
            eviction_interval_seconds: 300,
        }
    }
}

impl DialogueConfig {
    pub fn idle_timeout(&self) -> chrono::Duration {
        let minutes = self.idle_timeout_minutes.min(MAX_IDLE_TIMEOUT_MINUTES);
        chrono::Duration::minutes(minutes as i64)
    }

    pub fn eviction_interval(&self) -> Duration {
        Duration::from_secs(
            self.eviction_interval_seconds
                .clamp(1, MAX_EVICTION_INTERVAL_SECONDS),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    pub poll_timeout_seconds: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            poll_timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub enabled: bool,
    pub top_symptoms: u32,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            top_symptoms: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeConfig {
    pub enabled: bool,
    pub language: String,
    pub timeout_seconds: u64,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            language: "en".into(),
            timeout_seconds: 5,
        }
    }
}

impl Config {
    /// Load config from file, falling back to defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path = paths::config_file_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that parse but cannot work.
    pub fn validate(&self) -> Result<(), RagnosisError> {
        self.model.model_ref()?;
        if self.dialogue.conversation_cap == 0 {
            return Err(RagnosisError::Config(
                "dialogue.conversation_cap must be at least 1".into(),
            ));
        }
        if !(1..=MAX_IDLE_TIMEOUT_MINUTES).contains(&self.dialogue.idle_timeout_minutes) {
            return Err(RagnosisError::Config(format!(
                "dialogue.idle_timeout_minutes must be between 1 and {MAX_IDLE_TIMEOUT_MINUTES}"
            )));
        }
        if self.dialogue.eviction_interval_seconds > MAX_EVICTION_INTERVAL_SECONDS {
            return Err(RagnosisError::Config(format!(
                "dialogue.eviction_interval_seconds must be at most {MAX_EVICTION_INTERVAL_SECONDS}"
            )));
        }
        if self.menu.symptom_categories.is_empty() {
            return Err(RagnosisError::Config(
                "menu.symptom_categories must not be empty".into(),
            ));
        }
        Ok(())
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
