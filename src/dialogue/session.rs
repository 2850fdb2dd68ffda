// src/dialogue/session.rs — Per-user intake session
//
// Serialized layout matches the document form used for durable storage:
// { user_id, stage, symptoms[], demographics{}, duration, severity,
//   conversation_log[], started_at, last_active }.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which demographic question is pending inside the DEMOGRAPHICS stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DemographicField {
    AgeGroup,
    BiologicalSex,
}

/// A point in the dialogue flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Idle,
    Symptoms,
    Demographics(DemographicField),
    Duration,
    Severity,
    Analysis,
    FollowUp,
    QuickSymptoms,
    QuickAnalysis,
    FreeformChat,
    AnalysisSummary,
}

impl Stage {
    /// The flow this stage belongs to. IDLE belongs to none.
    pub fn flow(&self) -> Option<Flow> {
        match self {
            Stage::Idle => None,
            Stage::Symptoms
            | Stage::Demographics(_)
            | Stage::Duration
            | Stage::Severity
            | Stage::Analysis
            | Stage::FollowUp => Some(Flow::Full),
            Stage::QuickSymptoms | Stage::QuickAnalysis => Some(Flow::Quick),
            Stage::FreeformChat | Stage::AnalysisSummary => Some(Flow::Chat),
        }
    }

    /// Stages that only exist while an AI request is in flight.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Stage::Analysis | Stage::QuickAnalysis | Stage::AnalysisSummary
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Idle => "IDLE",
            Stage::Symptoms => "SYMPTOMS",
            Stage::Demographics(_) => "DEMOGRAPHICS",
            Stage::Duration => "DURATION",
            Stage::Severity => "SEVERITY",
            Stage::Analysis => "ANALYSIS",
            Stage::FollowUp => "FOLLOW_UP",
            Stage::QuickSymptoms => "QUICK_SYMPTOMS",
            Stage::QuickAnalysis => "QUICK_ANALYSIS",
            Stage::FreeformChat => "FREEFORM_CHAT",
            Stage::AnalysisSummary => "ANALYSIS_SUMMARY",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flow {
    Full,
    Quick,
    Chat,
}

impl Flow {
    pub fn entry(self) -> Stage {
        match self {
            Flow::Full => Stage::Symptoms,
            Flow::Quick => Stage::QuickSymptoms,
            Flow::Chat => Stage::FreeformChat,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeGroup {
    Child,
    Teen,
    YoungAdult,
    Adult,
    Senior,
}

impl AgeGroup {
    pub fn describe(&self) -> &'static str {
        match self {
            AgeGroup::Child => "Child (0-12)",
            AgeGroup::Teen => "Teen (13-17)",
            AgeGroup::YoungAdult => "Young adult (18-30)",
            AgeGroup::Adult => "Adult (31-50)",
            AgeGroup::Senior => "Senior (50+)",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BiologicalSex {
    Male,
    Female,
    Other,
    Undisclosed,
}

impl BiologicalSex {
    pub fn describe(&self) -> &'static str {
        match self {
            BiologicalSex::Male => "Male",
            BiologicalSex::Female => "Female",
            BiologicalSex::Other => "Other",
            BiologicalSex::Undisclosed => "Prefer not to say",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymptomDuration {
    UnderADay,
    OneToThreeDays,
    ThreeToSevenDays,
    OneToFourWeeks,
    OverAMonth,
    Unsure,
}

impl SymptomDuration {
    pub fn describe(&self) -> &'static str {
        match self {
            SymptomDuration::UnderADay => "<24 hours",
            SymptomDuration::OneToThreeDays => "1-3 days",
            SymptomDuration::ThreeToSevenDays => "3-7 days",
            SymptomDuration::OneToFourWeeks => "1-4 weeks",
            SymptomDuration::OverAMonth => ">1 month",
            SymptomDuration::Unsure => "Not sure",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Mild,
    Moderate,
    Severe,
    Critical,
}

impl Severity {
    pub fn describe(&self) -> &'static str {
        match self {
            Severity::Mild => "Mild",
            Severity::Moderate => "Moderate",
            Severity::Severe => "Severe",
            Severity::Critical => "Critical",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Demographics {
    pub age_group: Option<AgeGroup>,
    pub biological_sex: Option<BiologicalSex>,
}

/// One exchange of the conversational flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub user: String,
    pub assistant: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub stage: Stage,
    /// Insertion order is selection order.
    pub symptoms: Vec<String>,
    #[serde(default)]
    pub demographics: Demographics,
    pub duration: Option<SymptomDuration>,
    pub severity: Option<Severity>,
    /// Bounded FIFO; oldest turns are dropped first.
    #[serde(default)]
    pub conversation_log: VecDeque<ConversationTurn>,
    /// Start of the current intake, used for the analysis-time report.
    pub started_at: DateTime<Utc>,
    /// Last message handled, used for idle eviction.
    pub last_active: DateTime<Utc>,
}

impl Session {
    pub fn new(user_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            user_id: user_id.into(),
            stage: Stage::Idle,
            symptoms: Vec::new(),
            demographics: Demographics::default(),
            duration: None,
            severity: None,
            conversation_log: VecDeque::new(),
            started_at: now,
            last_active: now,
        }
    }

    /// Add the symptom, or remove it when already selected.
    /// Returns `true` when the symptom ended up selected.
    pub fn toggle_symptom(&mut self, symptom: &str) -> bool {
        if let Some(pos) = self.symptoms.iter().position(|s| s == symptom) {
            self.symptoms.remove(pos);
            false
        } else {
            self.symptoms.push(symptom.to_string());
            true
        }
    }

    pub fn has_symptoms(&self) -> bool {
        !self.symptoms.is_empty()
    }

    /// Append a conversational turn, evicting the oldest beyond `cap`.
    pub fn record_turn(&mut self, user: &str, assistant: &str, cap: usize) {
        self.conversation_log.push_back(ConversationTurn {
            user: user.to_string(),
            assistant: assistant.to_string(),
        });
        let cap = cap.max(1);
        while self.conversation_log.len() > cap {
            self.conversation_log.pop_front();
        }
    }

    /// The most recent `n` turns, oldest first.
    pub fn recent_turns(&self, n: usize) -> Vec<&ConversationTurn> {
        let skip = self.conversation_log.len().saturating_sub(n);
        self.conversation_log.iter().skip(skip).collect()
    }

    /// Forget every intake answer and restart the intake clock.
    pub fn reset_intake(&mut self) {
        self.symptoms.clear();
        self.demographics = Demographics::default();
        self.duration = None;
        self.severity = None;
        self.started_at = Utc::now();
    }

    /// Clear the answers belonging to `flow` and move to its entry stage.
    pub fn reset_flow(&mut self, flow: Flow) {
        self.reset_intake();
        if flow == Flow::Chat {
            self.conversation_log.clear();
        }
        self.stage = flow.entry();
    }

    /// Back to IDLE. The conversation log survives so chat can be continued.
    pub fn return_to_menu(&mut self) {
        self.reset_intake();
        self.stage = Stage::Idle;
    }

    /// Nothing worth keeping: the store may drop this session.
    pub fn is_blank(&self) -> bool {
        self.stage == Stage::Idle && self.symptoms.is_empty() && self.conversation_log.is_empty()
    }

    pub fn touch(&mut self) {
        self.last_active = Utc::now();
    }

    /// Seconds since the current intake started.
    pub fn elapsed_secs(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds().max(0)
    }
}
