// src/dialogue/menu.rs — Button labels, control tokens and quick replies
//
// All user-facing vocabulary lives here so that bot variants differ only by
// configuration. Control tokens are matched literally and always win over
// free text.

use serde::{Deserialize, Serialize};

use super::session::{AgeGroup, BiologicalSex, DemographicField, Severity, Stage, SymptomDuration};

/// A recognized control token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    Start,
    MainMenu,
    Cancel,
    Reset,
    DoneSelecting,
    QuickAnalyze,
    BeginFullAnalysis,
    BeginQuickAnalysis,
    BeginChat,
    ContinueChat,
    RequestSummary,
    NewAnalysis,
    MoreDetails,
    MedicationInfo,
    Emergency,
    HealthTip,
    HealthTrack,
    Stats,
}

impl Control {
    /// Controls honoured in every stage.
    pub fn is_global(&self) -> bool {
        matches!(
            self,
            Control::Start
                | Control::MainMenu
                | Control::Cancel
                | Control::Emergency
                | Control::HealthTip
                | Control::Stats
        )
    }
}

/// A classified incoming message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Control(Control),
    Text(String),
}

/// Aliases per control token. The first alias is the button label.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlLabels {
    pub start: Vec<String>,
    pub main_menu: Vec<String>,
    pub cancel: Vec<String>,
    pub reset: Vec<String>,
    pub done_selecting: Vec<String>,
    pub quick_analyze: Vec<String>,
    pub full_analysis: Vec<String>,
    pub quick_analysis: Vec<String>,
    pub chat: Vec<String>,
    pub continue_chat: Vec<String>,
    pub summary: Vec<String>,
    pub new_analysis: Vec<String>,
    pub more_details: Vec<String>,
    pub medication_info: Vec<String>,
    pub emergency: Vec<String>,
    pub health_tip: Vec<String>,
    pub health_track: Vec<String>,
    pub stats: Vec<String>,
}

fn labels(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for ControlLabels {
    fn default() -> Self {
        Self {
            start: labels(&["/start", "/help"]),
            main_menu: labels(&["🏠 Main Menu", "🔙 Main Menu", "/menu"]),
            cancel: labels(&["/cancel", "❌ Cancel"]),
            reset: labels(&["🔄 Start Over", "🔄 Change Categories", "/reset"]),
            done_selecting: labels(&["✅ Done Selecting", "/done"]),
            quick_analyze: labels(&["🎯 Quick Analyze"]),
            full_analysis: labels(&["🔍 Symptom Analysis", "🔍 Morning Check", "/analyze"]),
            quick_analysis: labels(&["🎯 Quick Analysis", "/quick"]),
            chat: labels(&["💬 AI Chat", "/chat"]),
            continue_chat: labels(&["▶️ Continue Chat", "/continue"]),
            summary: labels(&["📝 Get Summary", "/report"]),
            new_analysis: labels(&["🔄 New Analysis"]),
            more_details: labels(&["🔍 More Details"]),
            medication_info: labels(&["💊 Medication Info"]),
            emergency: labels(&["🚨 Emergency", "/emergency"]),
            health_tip: labels(&["🎲 Random Tip", "/tip"]),
            health_track: labels(&["📊 Health Track"]),
            stats: labels(&["/stats"]),
        }
    }
}

impl ControlLabels {
    fn table(&self) -> [(Control, &Vec<String>); 18] {
        [
            (Control::Start, &self.start),
            (Control::MainMenu, &self.main_menu),
            (Control::Cancel, &self.cancel),
            (Control::Reset, &self.reset),
            (Control::DoneSelecting, &self.done_selecting),
            (Control::QuickAnalyze, &self.quick_analyze),
            (Control::BeginFullAnalysis, &self.full_analysis),
            (Control::BeginQuickAnalysis, &self.quick_analysis),
            (Control::BeginChat, &self.chat),
            (Control::ContinueChat, &self.continue_chat),
            (Control::RequestSummary, &self.summary),
            (Control::NewAnalysis, &self.new_analysis),
            (Control::MoreDetails, &self.more_details),
            (Control::MedicationInfo, &self.medication_info),
            (Control::Emergency, &self.emergency),
            (Control::HealthTip, &self.health_tip),
            (Control::HealthTrack, &self.health_track),
            (Control::Stats, &self.stats),
        ]
    }

    pub fn lookup(&self, token: &str) -> Option<Control> {
        self.table()
            .into_iter()
            .find(|(_, aliases)| aliases.iter().any(|a| a == token))
            .map(|(control, _)| control)
    }

    /// Button label for a control (its first alias).
    pub fn button(&self, control: Control) -> Option<String> {
        self.table()
            .into_iter()
            .find(|(c, _)| *c == control)
            .and_then(|(_, aliases)| aliases.first().cloned())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymptomCategory {
    pub name: String,
    pub labels: Vec<String>,
}

/// A button label bound to an enumerated answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice<T> {
    pub value: T,
    pub label: String,
}

fn choice<T>(value: T, label: &str) -> Choice<T> {
    Choice {
        value,
        label: label.to_string(),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MenuConfig {
    pub controls: ControlLabels,
    pub symptom_categories: Vec<SymptomCategory>,
    /// Symptom buttons shown per category on the keyboard.
    pub keyboard_per_category: usize,
    pub age_groups: Vec<Choice<AgeGroup>>,
    pub skip_age: String,
    pub biological_sexes: Vec<Choice<BiologicalSex>>,
    pub durations: Vec<Choice<SymptomDuration>>,
    pub severities: Vec<Choice<Severity>>,
}

impl Default for MenuConfig {
    fn default() -> Self {
        let category = |name: &str, items: &[&str]| SymptomCategory {
            name: name.to_string(),
            labels: labels(items),
        };
        Self {
            controls: ControlLabels::default(),
            symptom_categories: vec![
                category("general", &["🤒 Fever", "😴 Fatigue", "⚖️ Weight Changes", "🌡️ Sweating"]),
                category("respiratory", &["🤧 Cough", "💨 Shortness", "👃 Runny Nose", "🤭 Sneeze"]),
                category("digestive", &["🤢 Nausea", "💩 Diarrhea", "🤰 Bloating", "🍽️ Appetite"]),
                category("neurological", &["🤕 Headache", "😵 Dizziness", "👀 Vision", "💤 Sleep"]),
                category("pain", &["🔴 Pain", "🔥 Burning", "💫 Tingling", "💔 Chest Pain"]),
                category("other", &["🩸 Bleeding", "🔴 Rash", "🦵 Swelling", "🎨 Color Changes"]),
            ],
            keyboard_per_category: 2,
            age_groups: vec![
                choice(AgeGroup::Child, "👶 Child (0-12)"),
                choice(AgeGroup::Teen, "👦 Teen (13-17)"),
                choice(AgeGroup::YoungAdult, "👨 Young Adult (18-30)"),
                choice(AgeGroup::Adult, "👨‍💼 Adult (31-50)"),
                choice(AgeGroup::Senior, "👴 Senior (50+)"),
            ],
            skip_age: "🚫 Skip Age".to_string(),
            biological_sexes: vec![
                choice(BiologicalSex::Male, "👨 Male"),
                choice(BiologicalSex::Female, "👩 Female"),
                choice(BiologicalSex::Other, "⚧ Other"),
                choice(BiologicalSex::Undisclosed, "🚫 Prefer not to say"),
            ],
            durations: vec![
                choice(SymptomDuration::UnderADay, "⏱️ <24 hours"),
                choice(SymptomDuration::OneToThreeDays, "🕐 1-3 days"),
                choice(SymptomDuration::ThreeToSevenDays, "🕑 3-7 days"),
                choice(SymptomDuration::OneToFourWeeks, "🕒 1-4 weeks"),
                choice(SymptomDuration::OverAMonth, "🕓 >1 month"),
                choice(SymptomDuration::Unsure, "❓ Not sure"),
            ],
            severities: vec![
                choice(Severity::Mild, "😊 Mild"),
                choice(Severity::Moderate, "😐 Moderate"),
                choice(Severity::Severe, "😫 Severe"),
                choice(Severity::Critical, "🚨 Critical"),
            ],
        }
    }
}

/// Slash commands are matched on their first word, without `@botname`.
fn normalize_command(text: &str) -> String {
    let word = text.split_whitespace().next().unwrap_or_default();
    let word = word.split('@').next().unwrap_or_default();
    word.to_lowercase()
}

fn pick<T: Copy>(choices: &[Choice<T>], text: &str, describe: impl Fn(&T) -> &'static str) -> Option<T> {
    choices
        .iter()
        .find(|c| c.label == text || describe(&c.value).eq_ignore_ascii_case(text))
        .map(|c| c.value)
}

impl MenuConfig {
    /// Classify raw message text. Control tokens take precedence.
    pub fn classify(&self, text: &str) -> Input {
        let trimmed = text.trim();
        let token = if trimmed.starts_with('/') {
            normalize_command(trimmed)
        } else {
            trimmed.to_string()
        };
        match self.controls.lookup(&token) {
            Some(control) => Input::Control(control),
            None => Input::Text(trimmed.to_string()),
        }
    }

    pub fn is_symptom_label(&self, text: &str) -> bool {
        self.symptom_categories
            .iter()
            .any(|c| c.labels.iter().any(|l| l == text))
    }

    pub fn age_group(&self, text: &str) -> Option<AgeGroup> {
        pick(&self.age_groups, text, AgeGroup::describe)
    }

    pub fn is_skip_age(&self, text: &str) -> bool {
        self.skip_age == text
    }

    pub fn biological_sex(&self, text: &str) -> Option<BiologicalSex> {
        pick(&self.biological_sexes, text, BiologicalSex::describe)
    }

    pub fn duration(&self, text: &str) -> Option<SymptomDuration> {
        pick(&self.durations, text, SymptomDuration::describe)
    }

    pub fn severity(&self, text: &str) -> Option<Severity> {
        pick(&self.severities, text, Severity::describe)
    }

    fn buttons(&self, controls: &[Control]) -> Vec<String> {
        controls
            .iter()
            .filter_map(|c| self.controls.button(*c))
            .collect()
    }

    fn symptom_buttons(&self) -> Vec<String> {
        self.symptom_categories
            .iter()
            .flat_map(|c| c.labels.iter().take(self.keyboard_per_category).cloned())
            .collect()
    }

    fn choice_buttons<T>(choices: &[Choice<T>]) -> Vec<String> {
        choices.iter().map(|c| c.label.clone()).collect()
    }

    /// Suggested replies for a stage, in display order.
    pub fn quick_replies(&self, stage: &Stage) -> Vec<String> {
        use Control::*;

        let mut replies = match stage {
            Stage::Idle | Stage::Analysis | Stage::QuickAnalysis | Stage::AnalysisSummary => {
                return self.buttons(&[
                    BeginFullAnalysis,
                    BeginQuickAnalysis,
                    BeginChat,
                    ContinueChat,
                    HealthTip,
                    HealthTrack,
                    Emergency,
                ]);
            }
            Stage::Symptoms => {
                let mut r = self.symptom_buttons();
                r.extend(self.buttons(&[DoneSelecting, Reset, QuickAnalyze]));
                r
            }
            Stage::QuickSymptoms => {
                let mut r = self.symptom_buttons();
                r.extend(self.buttons(&[QuickAnalyze, Reset]));
                r
            }
            Stage::Demographics(DemographicField::AgeGroup) => {
                let mut r = Self::choice_buttons(&self.age_groups);
                r.push(self.skip_age.clone());
                r.extend(self.buttons(&[Reset]));
                r
            }
            Stage::Demographics(DemographicField::BiologicalSex) => {
                let mut r = Self::choice_buttons(&self.biological_sexes);
                r.extend(self.buttons(&[Reset]));
                r
            }
            Stage::Duration => {
                let mut r = Self::choice_buttons(&self.durations);
                r.extend(self.buttons(&[Reset]));
                r
            }
            Stage::Severity => {
                let mut r = Self::choice_buttons(&self.severities);
                r.extend(self.buttons(&[Reset]));
                r
            }
            Stage::FollowUp => self.buttons(&[MoreDetails, MedicationInfo, NewAnalysis]),
            Stage::FreeformChat => self.buttons(&[RequestSummary, Reset]),
        };
        replies.extend(self.buttons(&[MainMenu]));
        replies
    }
}
