// src/dialogue/prompt.rs — Prompt rendering from a session snapshot
//
// Templates are minijinja sources so bot variants can swap wording through
// config. Rendering is pure: the same session and kind always produce the
// same prompt.

use minijinja::{context, Environment};
use serde::{Deserialize, Serialize};

use super::gateway::CompletionOptions;
use super::session::Session;
use crate::infra::errors::RagnosisError;

const NOT_SPECIFIED: &str = "Not specified";
const QUICK_CHAR_LIMIT: usize = 300;

/// The shape of prompt an AI-backed step needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptKind {
    /// Symptoms only, short structured answer.
    Quick,
    /// Symptoms plus demographics, duration and severity.
    Full,
    /// Recent conversation plus the latest message.
    Conversational { message: String },
    /// Report over the whole conversation log.
    Summary,
    /// One-off question asked from the main menu.
    General { question: String },
}

impl PromptKind {
    pub fn name(&self) -> &'static str {
        match self {
            PromptKind::Quick => "quick",
            PromptKind::Full => "full",
            PromptKind::Conversational { .. } => "conversational",
            PromptKind::Summary => "summary",
            PromptKind::General { .. } => "general",
        }
    }

    /// Length hint passed through to the backend.
    pub fn options(&self) -> CompletionOptions {
        let max_output_tokens = match self {
            PromptKind::Quick => 256,
            PromptKind::Full => 1024,
            PromptKind::Conversational { .. } => 300,
            PromptKind::Summary => 600,
            PromptKind::General { .. } => 512,
        };
        CompletionOptions {
            max_output_tokens: Some(max_output_tokens),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptTemplates {
    pub quick: String,
    pub full: String,
    pub conversational: String,
    pub summary: String,
    pub general: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            quick: DEFAULT_QUICK.to_string(),
            full: DEFAULT_FULL.to_string(),
            conversational: DEFAULT_CONVERSATIONAL.to_string(),
            summary: DEFAULT_SUMMARY.to_string(),
            general: DEFAULT_GENERAL.to_string(),
        }
    }
}

impl PromptTemplates {
    fn source(&self, kind: &PromptKind) -> &str {
        match kind {
            PromptKind::Quick => &self.quick,
            PromptKind::Full => &self.full,
            PromptKind::Conversational { .. } => &self.conversational,
            PromptKind::Summary => &self.summary,
            PromptKind::General { .. } => &self.general,
        }
    }

    fn all(&self) -> [(&'static str, &str); 5] {
        [
            ("quick", &self.quick),
            ("full", &self.full),
            ("conversational", &self.conversational),
            ("summary", &self.summary),
            ("general", &self.general),
        ]
    }
}

pub struct PromptBuilder {
    env: Environment<'static>,
    templates: PromptTemplates,
    bot_name: String,
    history_window: usize,
}

fn configure(env: &mut Environment<'_>) {
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
}

impl PromptBuilder {
    /// Build a renderer, rejecting templates that do not compile.
    pub fn new(
        templates: PromptTemplates,
        bot_name: impl Into<String>,
        history_window: usize,
    ) -> Result<Self, RagnosisError> {
        {
            let mut check = Environment::new();
            configure(&mut check);
            for (name, source) in templates.all() {
                check.template_from_named_str(name, source)?;
            }
        }

        let mut env = Environment::new();
        configure(&mut env);

        Ok(Self {
            env,
            templates,
            bot_name: bot_name.into(),
            history_window,
        })
    }

    pub fn render(&self, kind: &PromptKind, session: &Session) -> Result<String, RagnosisError> {
        let (message, question) = match kind {
            PromptKind::Conversational { message } => (message.as_str(), ""),
            PromptKind::General { question } => ("", question.as_str()),
            _ => ("", ""),
        };

        let ctx = context! {
            bot_name => &self.bot_name,
            symptoms => &session.symptoms,
            age_group => session
                .demographics
                .age_group
                .map(|a| a.describe())
                .unwrap_or(NOT_SPECIFIED),
            biological_sex => session
                .demographics
                .biological_sex
                .map(|s| s.describe())
                .unwrap_or(NOT_SPECIFIED),
            duration => session.duration.map(|d| d.describe()).unwrap_or(NOT_SPECIFIED),
            severity => session.severity.map(|s| s.describe()).unwrap_or(NOT_SPECIFIED),
            history => session.recent_turns(self.history_window),
            conversation => &session.conversation_log,
            message => message,
            question => question,
            quick_char_limit => QUICK_CHAR_LIMIT,
        };

        let rendered =
            self.env
                .render_named_str(kind.name(), self.templates.source(kind), ctx)?;
        Ok(rendered.trim().to_string())
    }
}

const DEFAULT_QUICK: &str = "\
Provide a quick, concise medical analysis for these symptoms: {{ symptoms | join(\", \") }}

Format as:
🎯 QUICK ASSESSMENT
[Brief overview]

⚠️ KEY CONSIDERATIONS
[2-3 bullet points]

🏥 NEXT STEPS
[Immediate actions]

Keep it under {{ quick_char_limit }} characters.
";

const DEFAULT_FULL: &str = "\
Analyze these symptoms with medical intelligence:

PATIENT CONTEXT:
- Symptoms: {{ symptoms | join(\", \") }}
- Age: {{ age_group }}
- Biological sex: {{ biological_sex }}
- Duration: {{ duration }}
- Severity: {{ severity }}

Provide a structured analysis with:

🔍 RISK ASSESSMENT
[Urgency level and immediate concerns]

🎯 LIKELY CONDITIONS
[Top 3 possibilities ranked by likelihood, with brief reasoning]

💡 SMART RECOMMENDATIONS
[Personalized actions based on context]

🏥 MEDICAL GUIDANCE
[When and what type of in-person care to seek]

Format with clear sections and appropriate emojis. Be concise but comprehensive.
";

const DEFAULT_CONVERSATIONAL: &str = "\
You are {{ bot_name }}, a caring health assistant in an ongoing conversation.
{% if history %}

Conversation so far:
{% for turn in history %}
User: {{ turn.user }}
Assistant: {{ turn.assistant }}
{% endfor %}
{% endif %}

User: {{ message }}

Reply briefly and with empathy, using the context above. Ask at most one or two \
follow-up questions. Recommend professional care when the symptoms sound serious.
";

const DEFAULT_SUMMARY: &str = "\
Summarize this health conversation for the user.

{% for turn in conversation %}
User: {{ turn.user }}
Assistant: {{ turn.assistant }}
{% endfor %}

Provide:
📋 REPORTED SYMPTOMS
🔍 KEY POINTS DISCUSSED
🏥 RECOMMENDED NEXT STEPS

Keep it short and clear.
";

const DEFAULT_GENERAL: &str = "\
Answer this health/medical question concisely and helpfully: {{ question }}
";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialogue::session::{AgeGroup, Severity, SymptomDuration};
    use pretty_assertions::assert_eq;

    fn builder() -> PromptBuilder {
        PromptBuilder::new(PromptTemplates::default(), "RAGnosis", 2).unwrap()
    }

    fn session_with(symptoms: &[&str]) -> Session {
        let mut s = Session::new("7");
        for sym in symptoms {
            s.toggle_symptom(sym);
        }
        s
    }

    #[test]
    fn test_quick_lists_symptoms_in_order() {
        let prompt = builder()
            .render(&PromptKind::Quick, &session_with(&["fever", "cough"]))
            .unwrap();
        assert!(prompt.starts_with(
            "Provide a quick, concise medical analysis for these symptoms: fever, cough"
        ));
        assert!(prompt.ends_with("Keep it under 300 characters."));
    }

    #[test]
    fn test_full_marks_missing_answers() {
        let mut s = session_with(&["headache"]);
        s.severity = Some(Severity::Severe);
        let prompt = builder().render(&PromptKind::Full, &s).unwrap();
        assert!(prompt.contains("- Symptoms: headache"));
        assert!(prompt.contains("- Age: Not specified"));
        assert!(prompt.contains("- Duration: Not specified"));
        assert!(prompt.contains("- Severity: Severe"));
    }

    #[test]
    fn test_full_includes_context() {
        let mut s = session_with(&["fever", "rash"]);
        s.demographics.age_group = Some(AgeGroup::Child);
        s.duration = Some(SymptomDuration::OverAMonth);
        let prompt = builder().render(&PromptKind::Full, &s).unwrap();
        assert!(prompt.contains("- Age: Child (0-12)"));
        assert!(prompt.contains("- Duration: >1 month"));
        assert!(prompt.contains("LIKELY CONDITIONS"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let b = builder();
        let mut s = session_with(&["fever"]);
        s.record_turn("I feel warm", "How long?", 10);
        let kinds = [
            PromptKind::Quick,
            PromptKind::Full,
            PromptKind::Summary,
            PromptKind::Conversational {
                message: "Two days".into(),
            },
        ];
        for kind in &kinds {
            assert_eq!(b.render(kind, &s).unwrap(), b.render(kind, &s).unwrap());
        }
    }

    #[test]
    fn test_conversational_uses_recent_window() {
        let mut s = Session::new("7");
        for i in 0..4 {
            s.record_turn(&format!("question {i}"), &format!("answer {i}"), 10);
        }
        let prompt = builder()
            .render(
                &PromptKind::Conversational {
                    message: "what now?".into(),
                },
                &s,
            )
            .unwrap();
        assert!(!prompt.contains("question 1"));
        assert!(prompt.contains("User: question 2"));
        assert!(prompt.contains("Assistant: answer 3"));
        assert!(prompt.contains("User: what now?"));
        assert!(prompt.starts_with("You are RAGnosis"));
    }

    #[test]
    fn test_conversational_without_history() {
        let prompt = builder()
            .render(
                &PromptKind::Conversational {
                    message: "hello".into(),
                },
                &Session::new("7"),
            )
            .unwrap();
        assert!(!prompt.contains("Conversation so far"));
        assert!(prompt.contains("User: hello"));
    }

    #[test]
    fn test_summary_uses_whole_log() {
        let mut s = Session::new("7");
        for i in 0..4 {
            s.record_turn(&format!("question {i}"), "ok", 10);
        }
        let prompt = builder().render(&PromptKind::Summary, &s).unwrap();
        assert!(prompt.contains("question 0"));
        assert!(prompt.contains("question 3"));
    }

    #[test]
    fn test_general_question() {
        let prompt = builder()
            .render(
                &PromptKind::General {
                    question: "Is ibuprofen safe with coffee?".into(),
                },
                &Session::new("7"),
            )
            .unwrap();
        assert_eq!(
            prompt,
            "Answer this health/medical question concisely and helpfully: Is ibuprofen safe with coffee?"
        );
    }

    #[test]
    fn test_custom_template() {
        let templates = PromptTemplates {
            quick: "Symptoms={{ symptoms | join('|') }}".into(),
            ..Default::default()
        };
        let b = PromptBuilder::new(templates, "Bot", 4).unwrap();
        let prompt = b
            .render(&PromptKind::Quick, &session_with(&["a", "b"]))
            .unwrap();
        assert_eq!(prompt, "Symptoms=a|b");
    }

    #[test]
    fn test_broken_template_rejected() {
        let templates = PromptTemplates {
            full: "{% for x in %}".into(),
            ..Default::default()
        };
        let err = PromptBuilder::new(templates, "Bot", 4).err().unwrap();
        assert!(matches!(err, RagnosisError::Template(_)));
    }

    #[test]
    fn test_length_hints() {
        assert_eq!(PromptKind::Quick.options().max_output_tokens, Some(256));
        assert!(
            PromptKind::Full.options().max_output_tokens
                > PromptKind::Quick.options().max_output_tokens
        );
    }
}
