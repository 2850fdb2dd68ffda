// src/dialogue/controller.rs — One message in, one reply out
//
// Each turn runs under the per-user lock: load the session, step the machine,
// call the model when the step asks for it, then persist the finished
// session in a single write.

use std::sync::Arc;

use chrono::{Local, Timelike};

use super::gateway::AiGateway;
use super::machine::{OutputAction, StateMachine, StaticReply, Transition};
use super::menu::{Control, Input};
use super::prompt::{PromptBuilder, PromptKind};
use super::replies::{Replies, ReplyContext};
use super::session::{Session, Stage};
use super::stats::GlobalStats;
use super::store::SessionStore;
use crate::infra::config::Config;
use crate::infra::errors::RagnosisError;
use crate::integrations::KnowledgeSource;
use crate::memory::store::AnalyticsSummary;
use crate::memory::store_server::StoreHandle;
use crate::provider::ModelProvider;
use crate::util::{label_text, random_seed, truncate_str};

const KNOWLEDGE_MAX_BYTES: usize = 600;

/// What the transport should deliver back to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingReply {
    pub text: String,
    pub quick_replies: Vec<String>,
    /// Stage after the turn, for logging and tests.
    pub stage: Stage,
}

pub struct DialogueController {
    store: Arc<SessionStore>,
    machine: StateMachine,
    prompts: PromptBuilder,
    gateway: AiGateway,
    replies: Replies,
    stats: Arc<GlobalStats>,
    admin_ids: Vec<String>,
    knowledge: Option<Arc<dyn KnowledgeSource>>,
    analytics: Option<StoreHandle>,
    top_symptoms: u32,
}

impl DialogueController {
    pub fn new(
        store: Arc<SessionStore>,
        machine: StateMachine,
        prompts: PromptBuilder,
        gateway: AiGateway,
        replies: Replies,
    ) -> Self {
        Self {
            store,
            machine,
            prompts,
            gateway,
            replies,
            stats: Arc::new(GlobalStats::new()),
            admin_ids: Vec::new(),
            knowledge: None,
            analytics: None,
            top_symptoms: 5,
        }
    }

    /// Wire every dialogue component from configuration.
    pub fn from_config(
        config: &Config,
        provider: Arc<dyn ModelProvider>,
        store: Arc<SessionStore>,
    ) -> Result<Self, RagnosisError> {
        let model_ref = config.model.model_ref()?;
        let machine = StateMachine::new(config.menu.clone(), config.dialogue.conversation_cap);
        let prompts = PromptBuilder::new(
            config.prompts.clone(),
            &config.bot.name,
            config.dialogue.history_window,
        )?;

        let mut gateway = AiGateway::new(provider, model_ref.model, config.model.timeout());
        if let Some(temperature) = config.model.temperature {
            gateway = gateway.with_temperature(temperature);
        }
        if let Some(ref system) = config.model.system {
            gateway = gateway.with_system(system.clone());
        }

        let replies = Replies::new(&config.bot.name, config.replies.clone(), &config.menu);

        Ok(Self::new(store, machine, prompts, gateway, replies)
            .with_admins(config.bot.admin_ids.clone())
            .with_top_symptoms(config.analytics.top_symptoms))
    }

    pub fn with_admins(mut self, admin_ids: Vec<String>) -> Self {
        self.admin_ids = admin_ids;
        self
    }

    pub fn with_knowledge(mut self, knowledge: Arc<dyn KnowledgeSource>) -> Self {
        self.knowledge = Some(knowledge);
        self
    }

    pub fn with_analytics(mut self, analytics: StoreHandle) -> Self {
        self.analytics = Some(analytics);
        self
    }

    pub fn with_top_symptoms(mut self, top_symptoms: u32) -> Self {
        self.top_symptoms = top_symptoms;
        self
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub fn stats(&self) -> &Arc<GlobalStats> {
        &self.stats
    }

    pub fn provider_id(&self) -> &str {
        self.gateway.provider_id()
    }

    /// Handle one message from `user_id`. Never fails: backend problems
    /// become fallback text and bad input becomes a validation reply.
    pub async fn handle_message(&self, user_id: &str, text: &str) -> OutgoingReply {
        let _turn = self.store.lock_user(user_id).await;
        self.stats.record_message(user_id);

        let session = self.store.get_or_create(user_id);
        let input = self.machine.menu().classify(text);
        let from = session.stage;

        let Transition { session, action } = self.machine.step(session, &input);
        tracing::debug!(
            user = user_id,
            from = %from,
            to = %session.stage,
            input = truncate_str(text, 48),
            "Dialogue step"
        );

        if input == Input::Control(Control::Start) {
            self.record_user(user_id).await;
        }

        let (mut session, text) = match action {
            OutputAction::Static(reply) => {
                let text = self.render_static(&reply, &session, user_id).await;
                (session, text)
            }
            OutputAction::Invalid(issue) => (session, self.replies.validation(issue)),
            OutputAction::Reset(reason) => {
                tracing::warn!(user = user_id, from = %from, ?reason, "Session reset to menu");
                (session, self.replies.reset(reason))
            }
            OutputAction::Prompt(kind) => self.run_prompt(session, kind).await,
        };

        session.touch();
        let stage = session.stage;
        let quick_replies = self.machine.menu().quick_replies(&stage);
        if session.is_blank() {
            self.store.clear(user_id);
        } else {
            self.store.update(user_id, session);
        }

        OutgoingReply {
            text,
            quick_replies,
            stage,
        }
    }

    async fn run_prompt(&self, session: Session, kind: PromptKind) -> (Session, String) {
        let outcome = match self.prompts.render(&kind, &session) {
            Ok(prompt) => self.gateway.complete(&prompt, kind.options()).await,
            Err(e) => Err(e),
        };

        // only analyses the model actually answered are counted
        if outcome.is_ok() && kind == PromptKind::Full {
            self.stats.record_analysis(&session.symptoms);
            self.record_symptoms(&session.symptoms).await;
        }

        let text = match &outcome {
            Ok(answer) => self.replies.ai_result(&kind, answer, &session),
            Err(e) => {
                tracing::warn!(kind = kind.name(), error = %e, "Using fallback reply");
                self.replies.fallback(&kind).to_string()
            }
        };

        let session = self
            .machine
            .settle(session, &kind, outcome.as_deref().ok());
        (session, text)
    }

    async fn render_static(&self, reply: &StaticReply, session: &Session, user_id: &str) -> String {
        let is_admin = self.admin_ids.iter().any(|id| id == user_id);

        let mut stats = self.stats.snapshot(self.top_symptoms as usize);
        stats.active_sessions = self.store.len();

        let analytics = if is_admin && *reply == StaticReply::Stats {
            self.analytics_summary().await
        } else {
            None
        };

        let ctx = ReplyContext {
            hour: Local::now().hour(),
            tip_seed: random_seed(),
            stats,
            analytics,
            is_admin,
        };

        let mut text = self.replies.render_static(reply, session, &ctx);
        if *reply == StaticReply::MoreDetails {
            if let Some(extra) = self.knowledge_note(session).await {
                text.push_str(&extra);
            }
        }
        text
    }

    /// Reference summary for the first selected symptom, if any.
    async fn knowledge_note(&self, session: &Session) -> Option<String> {
        let source = self.knowledge.as_ref()?;
        let topic = session.symptoms.first().and_then(|s| label_text(s))?;

        match source.lookup(topic).await {
            Ok(Some(summary)) => {
                let short = truncate_str(&summary, KNOWLEDGE_MAX_BYTES);
                let ellipsis = if short.len() < summary.len() { "…" } else { "" };
                Some(format!(
                    "\n\n📚 *{topic}* ({}):\n{short}{ellipsis}",
                    source.name()
                ))
            }
            Ok(None) => None,
            Err(e) => {
                tracing::debug!(source = source.name(), topic, "Knowledge lookup failed: {}", e);
                None
            }
        }
    }

    async fn analytics_summary(&self) -> Option<AnalyticsSummary> {
        let handle = self.analytics.as_ref()?;
        match handle.summary(self.top_symptoms).await {
            Ok(summary) => Some(summary),
            Err(e) => {
                tracing::warn!("Failed to read analytics: {}", e);
                None
            }
        }
    }

    async fn record_user(&self, user_id: &str) {
        if let Some(ref handle) = self.analytics {
            if let Err(e) = handle.record_user(user_id).await {
                tracing::warn!("Failed to record user activity: {}", e);
            }
        }
    }

    async fn record_symptoms(&self, symptoms: &[String]) {
        if let Some(ref handle) = self.analytics {
            if let Err(e) = handle.record_symptoms(symptoms.to_vec()).await {
                tracing::warn!("Failed to record symptoms: {}", e);
            }
        }
    }
}
