// tests/dialogue_test.rs — Integration test: full dialogue turns with mock providers

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pretty_assertions::assert_eq;

use ragnosis::dialogue::gateway::AiGateway;
use ragnosis::dialogue::machine::StateMachine;
use ragnosis::dialogue::menu::MenuConfig;
use ragnosis::dialogue::prompt::{PromptBuilder, PromptTemplates};
use ragnosis::dialogue::replies::{Replies, ReplyConfig};
use ragnosis::dialogue::session::DemographicField;
use ragnosis::dialogue::store::SessionStore;
use ragnosis::dialogue::{DialogueController, Stage};
use ragnosis::infra::errors::RagnosisError;
use ragnosis::provider::*;

/// Answers every prompt with a numbered canned reply.
struct MockProvider {
    calls: AtomicUsize,
}

impl MockProvider {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ModelProvider for MockProvider {
    fn id(&self) -> &str {
        "mock"
    }

    fn name(&self) -> &str {
        "Mock Provider"
    }

    async fn chat(&self, _request: ChatRequest) -> Result<ChatResponse, RagnosisError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ChatResponse {
            content: format!("reply {n}"),
            usage: TokenUsage {
                input_tokens: 10,
                output_tokens: 5,
            },
            stop_reason: StopReason::EndTurn,
        })
    }
}

/// Never answers.
struct HangingProvider;

#[async_trait]
impl ModelProvider for HangingProvider {
    fn id(&self) -> &str {
        "hanging"
    }

    fn name(&self) -> &str {
        "Hanging Provider"
    }

    async fn chat(&self, _request: ChatRequest) -> Result<ChatResponse, RagnosisError> {
        std::future::pending().await
    }
}

fn controller_with(provider: Arc<dyn ModelProvider>, timeout: Duration, cap: usize) -> DialogueController {
    let menu = MenuConfig::default();
    let replies = Replies::new("RAGnosis", ReplyConfig::default(), &menu);
    DialogueController::new(
        Arc::new(SessionStore::new()),
        StateMachine::new(menu, cap),
        PromptBuilder::new(PromptTemplates::default(), "RAGnosis", 8).unwrap(),
        AiGateway::new(provider, "mock-model", timeout),
        replies,
    )
}

fn controller() -> DialogueController {
    controller_with(Arc::new(MockProvider::new()), Duration::from_secs(5), 20)
}

async fn send_all(c: &DialogueController, user: &str, messages: &[&str]) {
    for msg in messages {
        c.handle_message(user, msg).await;
    }
}

// ─── End-to-end scenarios ───────────────────────────────────────────────────

#[tokio::test]
async fn test_symptoms_then_done_moves_to_demographics() {
    let c = controller();
    send_all(&c, "u1", &["/analyze", "fever", "cough"]).await;

    let reply = c.handle_message("u1", "✅ Done Selecting").await;
    let session = c.store().get("u1").unwrap();

    assert_eq!(session.symptoms, vec!["fever", "cough"]);
    assert_eq!(session.stage, Stage::Demographics(DemographicField::AgeGroup));
    assert_eq!(reply.stage, session.stage);
    assert!(reply.quick_replies.contains(&"🚫 Skip Age".to_string()));
}

#[tokio::test]
async fn test_done_without_symptoms_stays_in_symptoms() {
    let c = controller();
    c.handle_message("u1", "/analyze").await;

    let reply = c.handle_message("u1", "✅ Done Selecting").await;

    assert_eq!(reply.stage, Stage::Symptoms);
    assert_eq!(reply.text, "❌ Please select at least one symptom to analyze.");
    assert_eq!(c.store().get("u1").unwrap().stage, Stage::Symptoms);
}

#[tokio::test]
async fn test_analysis_timeout_falls_back_and_advances() {
    let c = controller_with(Arc::new(HangingProvider), Duration::from_millis(50), 20);
    send_all(
        &c,
        "u1",
        &["/analyze", "🤕 Headache", "/done", "👴 Senior (50+)", "👨 Male", "🕐 1-3 days"],
    )
    .await;

    let reply = c.handle_message("u1", "😐 Moderate").await;

    assert!(reply.text.starts_with("❌ *Analysis Error*"));
    assert_eq!(reply.stage, Stage::FollowUp);
    assert!(reply.quick_replies.contains(&"🔍 More Details".to_string()));

    let session = c.store().get("u1").unwrap();
    assert_eq!(session.symptoms, vec!["🤕 Headache"]);
    assert_eq!(session.stage, Stage::FollowUp);
}

#[tokio::test]
async fn test_conversation_log_capped_at_most_recent_turns() {
    let c = controller_with(Arc::new(MockProvider::new()), Duration::from_secs(5), 50);
    c.handle_message("u1", "💬 AI Chat").await;

    for i in 0..60 {
        c.handle_message("u1", &format!("message {i}")).await;
    }

    let session = c.store().get("u1").unwrap();
    assert_eq!(session.stage, Stage::FreeformChat);
    assert_eq!(session.conversation_log.len(), 50);
    assert_eq!(session.conversation_log[0].user, "message 10");
    assert_eq!(session.conversation_log[0].assistant, "reply 10");
    assert_eq!(session.conversation_log[49].user, "message 59");
}

// ─── Flow behaviour ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_full_analysis_then_new_analysis() {
    let c = controller();
    send_all(
        &c,
        "u1",
        &["/analyze", "🤒 Fever", "/done", "🚫 Skip Age", "👩 Female", "⏱️ <24 hours"],
    )
    .await;

    let reply = c.handle_message("u1", "🚨 Critical").await;
    assert!(reply.text.contains("AI Analysis Complete"));
    assert!(reply.text.contains("reply 0"));
    assert!(reply.text.contains("Symptoms analyzed: 1"));
    assert_eq!(reply.stage, Stage::FollowUp);

    let reply = c.handle_message("u1", "🔄 New Analysis").await;
    assert_eq!(reply.stage, Stage::Symptoms);
    assert!(c.store().get("u1").unwrap().symptoms.is_empty());
    assert_eq!(c.stats().snapshot(5).analyses, 1);
}

#[tokio::test]
async fn test_reset_clears_symptoms_and_returns_to_flow_entry() {
    let c = controller();
    send_all(&c, "u1", &["/quick", "🤧 Cough", "🤢 Nausea"]).await;

    let reply = c.handle_message("u1", "🔄 Start Over").await;

    let session = c.store().get("u1").unwrap();
    assert_eq!(reply.stage, Stage::QuickSymptoms);
    assert!(session.symptoms.is_empty());
}

#[tokio::test]
async fn test_quick_analysis_returns_to_menu() {
    let c = controller();
    send_all(&c, "u1", &["/quick", "sore throat"]).await;

    let reply = c.handle_message("u1", "🎯 Quick Analyze").await;

    assert!(reply.text.starts_with("🎯 *Quick Analysis Results:*"));
    assert_eq!(reply.stage, Stage::Idle);
    // nothing left worth keeping
    assert!(c.store().get("u1").is_none());
}

#[tokio::test]
async fn test_summary_clears_conversation() {
    let c = controller();
    send_all(&c, "u1", &["/chat", "I slept badly", "and I have a headache"]).await;
    assert_eq!(c.store().get("u1").unwrap().conversation_log.len(), 2);

    let reply = c.handle_message("u1", "📝 Get Summary").await;

    assert!(reply.text.starts_with("📝 *Conversation Summary*"));
    assert_eq!(reply.stage, Stage::Idle);
    assert!(c.store().get("u1").is_none());
}

#[tokio::test]
async fn test_continue_chat_keeps_history_but_new_chat_does_not() {
    let c = controller();
    send_all(&c, "u1", &["/chat", "first question", "/menu"]).await;

    let reply = c.handle_message("u1", "▶️ Continue Chat").await;
    assert!(reply.text.contains("1 earlier messages"));
    assert_eq!(c.store().get("u1").unwrap().conversation_log.len(), 1);

    c.handle_message("u1", "💬 AI Chat").await;
    assert!(c.store().get("u1").unwrap().conversation_log.is_empty());
}

#[tokio::test]
async fn test_global_controls_work_mid_flow() {
    let c = controller();
    send_all(&c, "u1", &["/analyze", "🤒 Fever", "/done"]).await;

    let reply = c.handle_message("u1", "🚨 Emergency").await;
    assert!(reply.text.starts_with("🚨 *Emergency*"));
    assert_eq!(reply.stage, Stage::Demographics(DemographicField::AgeGroup));

    let reply = c.handle_message("u1", "/cancel").await;
    assert_eq!(reply.stage, Stage::Idle);
    assert!(c.store().get("u1").is_none());
}

#[tokio::test]
async fn test_unknown_option_keeps_stage() {
    let c = controller();
    send_all(&c, "u1", &["/analyze", "🤒 Fever", "/done", "🚫 Skip Age", "👩 Female"]).await;

    let reply = c.handle_message("u1", "since last tuesday-ish").await;

    assert_eq!(reply.stage, Stage::Duration);
    assert_eq!(reply.text, "💡 Please choose one of the options below.");
}

// ─── Concurrency ────────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_messages_for_one_user_are_not_lost() {
    let c = Arc::new(controller());
    c.handle_message("u1", "/analyze").await;

    let handles: Vec<_> = (0..10)
        .map(|i| {
            let c = c.clone();
            tokio::spawn(async move { c.handle_message("u1", &format!("symptom {i}")).await })
        })
        .collect();
    for h in handles {
        h.await.unwrap();
    }

    let session = c.store().get("u1").unwrap();
    assert_eq!(session.symptoms.len(), 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_users_are_independent() {
    let c = Arc::new(controller());

    tokio::join!(
        {
            let c = c.clone();
            async move { send_all(&c, "alice", &["/analyze", "🤒 Fever"]).await }
        },
        {
            let c = c.clone();
            async move { send_all(&c, "bob", &["/quick", "🤧 Cough", "🤢 Nausea"]).await }
        }
    );

    assert_eq!(c.store().get("alice").unwrap().symptoms, vec!["🤒 Fever"]);
    assert_eq!(c.store().get("bob").unwrap().stage, Stage::QuickSymptoms);
    assert_eq!(c.stats().snapshot(0).distinct_users, 2);
}
