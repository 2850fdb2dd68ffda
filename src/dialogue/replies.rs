// src/dialogue/replies.rs — User-facing reply text

use serde::{Deserialize, Serialize};

use super::machine::{ResetReason, StaticReply, ValidationIssue};
use super::menu::{Control, MenuConfig};
use super::prompt::PromptKind;
use super::session::{Session, Stage};
use super::stats::StatsSnapshot;
use crate::memory::store::AnalyticsSummary;

/// Values a reply may need that are not part of the session.
#[derive(Debug, Clone, Default)]
pub struct ReplyContext {
    /// Local hour of day, 0-23.
    pub hour: u32,
    /// Any number; reduced modulo the tip pool.
    pub tip_seed: u64,
    pub stats: StatsSnapshot,
    /// Present only when the requester may see analytics.
    pub analytics: Option<AnalyticsSummary>,
    pub is_admin: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplyConfig {
    pub health_tips: Vec<String>,
}

impl Default for ReplyConfig {
    fn default() -> Self {
        Self {
            health_tips: [
                "💧 Stay hydrated - drink at least 8 glasses of water daily",
                "🏃 Move regularly - even short walks boost circulation",
                "😴 Prioritize sleep - 7-9 hours for optimal health",
                "🥗 Eat colorful foods - variety ensures nutrient diversity",
                "🧘 Manage stress - deep breathing reduces cortisol",
                "☀️ Get sunlight - 15 minutes daily for Vitamin D",
                "📱 Digital detox - reduce screen time before bed",
                "🤝 Social connection - relationships boost mental health",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

pub struct Replies {
    bot_name: String,
    tips: Vec<String>,
    done_label: String,
    quick_label: String,
}

pub fn greeting(hour: u32) -> &'static str {
    match hour {
        5..=11 => "🌅 Good morning",
        12..=16 => "☀️ Good afternoon",
        17..=21 => "🌇 Good evening",
        _ => "🌙 Good night",
    }
}

fn join_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "None".to_string()
    } else {
        items.join(", ")
    }
}

impl Replies {
    pub fn new(bot_name: impl Into<String>, config: ReplyConfig, menu: &MenuConfig) -> Self {
        Self {
            bot_name: bot_name.into(),
            tips: config.health_tips,
            done_label: menu
                .controls
                .button(Control::DoneSelecting)
                .unwrap_or_default(),
            quick_label: menu
                .controls
                .button(Control::QuickAnalyze)
                .unwrap_or_default(),
        }
    }

    pub fn tip(&self, seed: u64) -> Option<&str> {
        if self.tips.is_empty() {
            return None;
        }
        let idx = (seed % self.tips.len() as u64) as usize;
        Some(self.tips[idx].as_str())
    }

    pub fn render_static(&self, reply: &StaticReply, session: &Session, ctx: &ReplyContext) -> String {
        match reply {
            StaticReply::Welcome => self.welcome(ctx),
            StaticReply::Cancelled => {
                "👋 Cancelled. Your answers were cleared.\n\nUse the menu below whenever you need me."
                    .to_string()
            }
            StaticReply::SymptomMenu => format!(
                "🔍 *Symptom Analysis*\n\n\
                 Select symptoms from the buttons below or type one in your own words.\n\n\
                 Press '{}' when ready.",
                self.done_label
            ),
            StaticReply::SymptomToggled { symptom, added } => {
                let action = if *added { "✅ Added" } else { "❌ Removed" };
                let finish = if session.stage == Stage::QuickSymptoms {
                    &self.quick_label
                } else {
                    &self.done_label
                };
                format!(
                    "{action} *{symptom}*\n\n\
                     📋 Current selection: {}\n\n\
                     Continue selecting or press '{finish}' when ready.",
                    join_or_none(&session.symptoms)
                )
            }
            StaticReply::AskAgeGroup => format!(
                "👤 *Age Information*\n\n\
                 Based on your symptoms: {}\n\n\
                 Age helps provide more accurate recommendations for your specific situation.",
                join_or_none(&session.symptoms)
            ),
            StaticReply::AskBiologicalSex => {
                "👤 *Biological Sex*\n\nThis helps with condition-specific recommendations:".to_string()
            }
            StaticReply::AskDuration => {
                "⏰ *Symptom Duration*\n\nHow long have you experienced these symptoms?".to_string()
            }
            StaticReply::AskSeverity => {
                "📊 *Symptom Severity*\n\nHow severe are your symptoms currently?".to_string()
            }
            StaticReply::MoreDetails => "🔍 *Detailed Analysis*\n\n\
                 For comprehensive medical information, I recommend:\n\n\
                 • 📚 Reputable medical websites (Mayo Clinic, NHS, MedlinePlus)\n\
                 • 🏥 Consultation with healthcare professionals\n\
                 • 🔬 Further diagnostic tests if recommended"
                .to_string(),
            StaticReply::MedicationInfo => "💊 *Medication Safety*\n\n\
                 Always consult healthcare providers before taking any medication.\n\n\
                 Ask your pharmacist about interactions with anything you already take."
                .to_string(),
            StaticReply::QuickIntro => format!(
                "🎯 *Quick Analysis*\n\n\
                 Please describe your symptoms briefly or pick them below, then press '{}'.",
                self.quick_label
            ),
            StaticReply::ChatIntro { continued: true } => format!(
                "💬 *Welcome back*\n\n\
                 Let's continue where we left off ({} earlier messages). What's new?",
                session.conversation_log.len()
            ),
            StaticReply::ChatIntro { continued: false } => format!(
                "💬 *AI Chat*\n\n\
                 Tell me what's on your mind about your health. {} remembers our \
                 conversation until you ask for a summary.",
                self.bot_name
            ),
            StaticReply::Emergency => EMERGENCY.to_string(),
            StaticReply::HealthTip => match self.tip(ctx.tip_seed) {
                Some(tip) => format!("💡 *Health Tip:*\n\n{tip}"),
                None => "💡 Take care of yourself today.".to_string(),
            },
            StaticReply::HealthTrack => "📊 *Health Tracking*\n\n\
                 Track your symptoms over time:\n\n\
                 • Use /analyze for regular check-ins\n\
                 • Note symptom changes\n\
                 • Monitor improvement patterns\n\
                 • Share trends with your doctor"
                .to_string(),
            StaticReply::Stats => self.stats(ctx),
        }
    }

    fn welcome(&self, ctx: &ReplyContext) -> String {
        let mut text = format!(
            "{}! 👋\n\n\
             🔬 *Welcome to {} - Your AI Medical Assistant*\n\n\
             📊 *Live Stats:*\n\
             • 🧑‍🤝‍🧑 {} users helped\n\
             • 🔍 {} sessions active\n\n\
             🎯 *How can I assist you today?*",
            greeting(ctx.hour),
            self.bot_name,
            ctx.stats.distinct_users,
            ctx.stats.active_sessions,
        );
        if let Some(tip) = self.tip(ctx.tip_seed) {
            text.push_str(&format!("\n\n💡 *Daily Health Tip:*\n{tip}"));
        }
        text
    }

    fn stats(&self, ctx: &ReplyContext) -> String {
        if !ctx.is_admin {
            return "🔒 Analytics available for administrators only.".to_string();
        }

        let mut text = format!(
            "📊 *{} Analytics*\n\n\
             👥 Users this run: {}\n\
             💬 Messages handled: {}\n\
             🔬 Analyses completed: {}\n\
             🔄 Active conversations: {}",
            self.bot_name,
            ctx.stats.distinct_users,
            ctx.stats.messages,
            ctx.stats.analyses,
            ctx.stats.active_sessions,
        );

        let top: Vec<(String, i64)> = match &ctx.analytics {
            Some(summary) => {
                text.push_str(&format!(
                    "\n\n🗄️ Users on record: {}\n📈 Active today: {}",
                    summary.total_users, summary.active_today
                ));
                summary
                    .top_symptoms
                    .iter()
                    .map(|r| (r.symptom.clone(), r.count))
                    .collect()
            }
            None => ctx
                .stats
                .top_symptoms
                .iter()
                .map(|(s, c)| (s.clone(), *c as i64))
                .collect(),
        };

        if !top.is_empty() {
            text.push_str("\n\n🏥 Top Symptoms:");
            for (symptom, count) in top {
                text.push_str(&format!("\n• {symptom}: {count}"));
            }
        }
        text
    }

    pub fn validation(&self, issue: ValidationIssue) -> String {
        match issue {
            ValidationIssue::NoSymptoms => {
                "❌ Please select at least one symptom to analyze.".to_string()
            }
            ValidationIssue::SymptomTooLong => format!(
                "✂️ That's too long for a symptom. Pick a button or type a short name (up to {} characters).",
                super::machine::MAX_SYMPTOM_CHARS
            ),
            ValidationIssue::UnknownOption => "💡 Please choose one of the options below.".to_string(),
            ValidationIssue::ChooseFollowUp => {
                "💡 Please select an option from the menu below.".to_string()
            }
            ValidationIssue::EmptyConversation => {
                "📝 There's nothing to summarize yet. Tell me how you're feeling first.".to_string()
            }
            ValidationIssue::EmptyMessage => {
                "✍️ Please type something or use the buttons below.".to_string()
            }
            ValidationIssue::NotAvailable => {
                "🤔 That option isn't available right now. Use the buttons below or /start for the menu."
                    .to_string()
            }
        }
    }

    pub fn reset(&self, reason: ResetReason) -> String {
        match reason {
            ResetReason::MissingContext => "⚠️ I lost track of your symptom selection, so we're back \
                 at the main menu. Start a new analysis whenever you're ready."
                .to_string(),
            ResetReason::Interrupted => "⏳ Your previous request was interrupted. We're back at \
                 the main menu, please try again."
                .to_string(),
        }
    }

    /// Wrap a model answer. `session` is the state the prompt was built from.
    pub fn ai_result(&self, kind: &PromptKind, text: &str, session: &Session) -> String {
        match kind {
            PromptKind::Full => format!(
                "🔬 *{} AI Analysis Complete*\n\n{text}\n\n\
                 📊 *Session Summary:*\n\
                 • Symptoms analyzed: {}\n\
                 • Analysis time: {}s\n\n\
                 ⚠️ This is not a diagnosis. See a healthcare professional for medical advice.\n\n\
                 💡 *What would you like to do next?*",
                self.bot_name,
                session.symptoms.len(),
                session.elapsed_secs(),
            ),
            PromptKind::Quick => format!(
                "🎯 *Quick Analysis Results:*\n\n{text}\n\n\
                 💡 For comprehensive analysis, use full symptom analysis."
            ),
            PromptKind::Conversational { .. } => text.to_string(),
            PromptKind::Summary => format!("📝 *Conversation Summary*\n\n{text}"),
            PromptKind::General { .. } => format!("🔬 *{} AI:*\n\n{text}", self.bot_name),
        }
    }

    /// Canned text shown when the model could not answer.
    pub fn fallback(&self, kind: &PromptKind) -> &'static str {
        match kind {
            PromptKind::Full => {
                "❌ *Analysis Error*\n\nI encountered an issue. Please try again or use quick analysis."
            }
            PromptKind::Quick => "❌ Quick analysis failed. Please try full analysis.",
            PromptKind::Conversational { .. } => {
                "❌ I couldn't reply just now. Please send your message again."
            }
            PromptKind::Summary => {
                "❌ I couldn't prepare the summary right now. Please ask again in a moment."
            }
            PromptKind::General { .. } => {
                "❌ I couldn't process that. Try rephrasing or use /start for menu."
            }
        }
    }
}

const EMERGENCY: &str = "🚨 *Emergency*\n\n\
If you or someone else is in immediate danger, call your local emergency number now \
(112 in Europe, 911 in North America).\n\n\
Get urgent care for:\n\
• Chest pain or pressure\n\
• Difficulty breathing\n\
• Sudden weakness, numbness or confusion\n\
• Severe bleeding\n\
• Loss of consciousness\n\n\
⚠️ This assistant cannot help in an emergency.";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::store::SymptomCountRow;

    fn replies() -> Replies {
        Replies::new("RAGnosis", ReplyConfig::default(), &MenuConfig::default())
    }

    #[test]
    fn test_greeting_by_hour() {
        assert_eq!(greeting(5), "🌅 Good morning");
        assert_eq!(greeting(12), "☀️ Good afternoon");
        assert_eq!(greeting(21), "🌇 Good evening");
        assert_eq!(greeting(2), "🌙 Good night");
    }

    #[test]
    fn test_welcome_has_stats_and_tip() {
        let ctx = ReplyContext {
            hour: 9,
            tip_seed: 0,
            stats: StatsSnapshot {
                distinct_users: 3,
                active_sessions: 2,
                ..Default::default()
            },
            ..Default::default()
        };
        let text = replies().render_static(&StaticReply::Welcome, &Session::new("1"), &ctx);
        assert!(text.starts_with("🌅 Good morning! 👋"));
        assert!(text.contains("3 users helped"));
        assert!(text.contains("2 sessions active"));
        assert!(text.contains("Stay hydrated"));
    }

    #[test]
    fn test_tip_wraps_seed() {
        let r = replies();
        assert_eq!(r.tip(8), r.tip(0));
        let empty = Replies::new("x", ReplyConfig { health_tips: vec![] }, &MenuConfig::default());
        assert!(empty.tip(3).is_none());
    }

    #[test]
    fn test_toggle_lists_selection() {
        let mut s = Session::new("1");
        s.stage = Stage::Symptoms;
        s.toggle_symptom("fever");
        s.toggle_symptom("cough");
        let text = replies().render_static(
            &StaticReply::SymptomToggled {
                symptom: "cough".into(),
                added: true,
            },
            &s,
            &ReplyContext::default(),
        );
        assert!(text.starts_with("✅ Added *cough*"));
        assert!(text.contains("Current selection: fever, cough"));
        assert!(text.contains("'✅ Done Selecting'"));
    }

    #[test]
    fn test_stats_admin_only() {
        let r = replies();
        let s = Session::new("1");
        let text = r.render_static(&StaticReply::Stats, &s, &ReplyContext::default());
        assert!(text.starts_with("🔒"));

        let ctx = ReplyContext {
            is_admin: true,
            analytics: Some(AnalyticsSummary {
                total_users: 10,
                active_today: 4,
                top_symptoms: vec![SymptomCountRow {
                    symptom: "fever".into(),
                    count: 7,
                }],
            }),
            ..Default::default()
        };
        let text = r.render_static(&StaticReply::Stats, &s, &ctx);
        assert!(text.contains("Users on record: 10"));
        assert!(text.contains("• fever: 7"));
    }

    #[test]
    fn test_ai_wrappers_and_fallbacks() {
        let r = replies();
        let mut s = Session::new("1");
        s.toggle_symptom("fever");
        let full = r.ai_result(&PromptKind::Full, "Likely a cold.", &s);
        assert!(full.contains("Likely a cold."));
        assert!(full.contains("Symptoms analyzed: 1"));
        assert_eq!(
            r.ai_result(
                &PromptKind::Conversational {
                    message: "hi".into()
                },
                "Hello!",
                &s
            ),
            "Hello!"
        );
        assert!(r.fallback(&PromptKind::Quick).starts_with("❌"));
    }
}
