// src/dialogue/machine.rs — Intake state machine
//
// `step` is a pure transition: it takes the session by value and returns the
// next session plus the action the controller must carry out. Nothing here
// touches the network or the store.

use super::menu::{Control, Input, MenuConfig};
use super::prompt::PromptKind;
use super::session::{DemographicField, Flow, Session, Stage};

/// Free-text symptoms longer than this are rejected.
pub const MAX_SYMPTOM_CHARS: usize = 64;

/// Replies whose text does not depend on the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaticReply {
    Welcome,
    Cancelled,
    SymptomMenu,
    SymptomToggled { symptom: String, added: bool },
    AskAgeGroup,
    AskBiologicalSex,
    AskDuration,
    AskSeverity,
    MoreDetails,
    MedicationInfo,
    QuickIntro,
    ChatIntro { continued: bool },
    Emergency,
    HealthTip,
    HealthTrack,
    Stats,
}

/// Input rejected in the current stage. The stage never changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationIssue {
    NoSymptoms,
    SymptomTooLong,
    UnknownOption,
    ChooseFollowUp,
    EmptyConversation,
    EmptyMessage,
    NotAvailable,
}

/// Why the session was forced back to IDLE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetReason {
    /// A stage past SYMPTOMS was reached with no symptoms recorded.
    MissingContext,
    /// A message arrived while an analysis was still marked in flight.
    Interrupted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputAction {
    Static(StaticReply),
    Prompt(PromptKind),
    Invalid(ValidationIssue),
    Reset(ResetReason),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub session: Session,
    pub action: OutputAction,
}

impl Transition {
    fn new(session: Session, action: OutputAction) -> Self {
        Self { session, action }
    }

    fn reply(session: Session, reply: StaticReply) -> Self {
        Self::new(session, OutputAction::Static(reply))
    }

    fn invalid(session: Session, issue: ValidationIssue) -> Self {
        Self::new(session, OutputAction::Invalid(issue))
    }

    fn prompt(session: Session, kind: PromptKind) -> Self {
        Self::new(session, OutputAction::Prompt(kind))
    }
}

pub struct StateMachine {
    menu: MenuConfig,
    conversation_cap: usize,
}

impl StateMachine {
    pub fn new(menu: MenuConfig, conversation_cap: usize) -> Self {
        Self {
            menu,
            conversation_cap: conversation_cap.max(1),
        }
    }

    pub fn menu(&self) -> &MenuConfig {
        &self.menu
    }

    pub fn conversation_cap(&self) -> usize {
        self.conversation_cap
    }

    /// Decide the next session and output for one classified input.
    ///
    /// Precedence: global controls, transient-stage recovery, flow entry
    /// controls, reset, missing-context recovery, then the stage handler.
    pub fn step(&self, mut session: Session, input: &Input) -> Transition {
        if let Input::Control(control) = input {
            if control.is_global() {
                return self.global(session, *control);
            }
        }

        if session.stage.is_transient() {
            session.return_to_menu();
            return Transition::new(session, OutputAction::Reset(ResetReason::Interrupted));
        }

        if let Input::Control(control) = input {
            if let Some(reply) = enter_flow(&mut session, *control) {
                return Transition::reply(session, reply);
            }
            if *control == Control::Reset {
                return match session.stage.flow() {
                    Some(flow) => {
                        session.reset_flow(flow);
                        Transition::reply(session, entry_reply(flow, false))
                    }
                    None => Transition::reply(session, StaticReply::Welcome),
                };
            }
        }

        if requires_symptoms(&session.stage) && !session.has_symptoms() {
            session.return_to_menu();
            return Transition::new(session, OutputAction::Reset(ResetReason::MissingContext));
        }

        let stage = session.stage;
        match stage {
            Stage::Idle => self.idle(session, input),
            Stage::Symptoms => self.symptoms(session, input),
            Stage::QuickSymptoms => self.quick_symptoms(session, input),
            Stage::Demographics(field) => self.demographics(session, field, input),
            Stage::Duration => self.duration(session, input),
            Stage::Severity => self.severity(session, input),
            Stage::FollowUp => self.follow_up(session, input),
            Stage::FreeformChat => self.freeform_chat(session, input),
            // handled above
            Stage::Analysis | Stage::QuickAnalysis | Stage::AnalysisSummary => {
                Transition::new(session, OutputAction::Reset(ResetReason::Interrupted))
            }
        }
    }

    /// Finish an AI-backed step once the gateway has answered.
    /// `reply` is `None` when the gateway failed and a fallback was shown.
    pub fn settle(&self, mut session: Session, kind: &PromptKind, reply: Option<&str>) -> Session {
        match (session.stage, kind) {
            (Stage::Analysis, _) => session.stage = Stage::FollowUp,
            (Stage::QuickAnalysis, _) => session.return_to_menu(),
            (Stage::AnalysisSummary, _) => {
                if reply.is_some() {
                    session.conversation_log.clear();
                    session.return_to_menu();
                } else {
                    // keep the log so the summary can be requested again
                    session.stage = Stage::FreeformChat;
                }
            }
            (Stage::FreeformChat, PromptKind::Conversational { message }) => {
                if let Some(reply) = reply {
                    session.record_turn(message, reply, self.conversation_cap);
                }
            }
            _ => {}
        }
        session
    }

    fn global(&self, mut session: Session, control: Control) -> Transition {
        match control {
            Control::Start | Control::MainMenu => {
                session.return_to_menu();
                Transition::reply(session, StaticReply::Welcome)
            }
            Control::Cancel => {
                session.return_to_menu();
                Transition::reply(session, StaticReply::Cancelled)
            }
            Control::Emergency => Transition::reply(session, StaticReply::Emergency),
            Control::HealthTip => Transition::reply(session, StaticReply::HealthTip),
            Control::Stats => Transition::reply(session, StaticReply::Stats),
            _ => Transition::invalid(session, ValidationIssue::NotAvailable),
        }
    }

    fn idle(&self, session: Session, input: &Input) -> Transition {
        match input {
            Input::Control(Control::HealthTrack) => {
                Transition::reply(session, StaticReply::HealthTrack)
            }
            Input::Control(_) => Transition::invalid(session, ValidationIssue::NotAvailable),
            Input::Text(text) if text.is_empty() => {
                Transition::invalid(session, ValidationIssue::EmptyMessage)
            }
            Input::Text(text) => Transition::prompt(
                session,
                PromptKind::General {
                    question: text.clone(),
                },
            ),
        }
    }

    fn symptoms(&self, mut session: Session, input: &Input) -> Transition {
        match input {
            Input::Control(Control::DoneSelecting) => {
                if !session.has_symptoms() {
                    return Transition::invalid(session, ValidationIssue::NoSymptoms);
                }
                session.stage = Stage::Demographics(DemographicField::AgeGroup);
                Transition::reply(session, StaticReply::AskAgeGroup)
            }
            Input::Control(Control::QuickAnalyze) => {
                if !session.has_symptoms() {
                    // nothing picked yet: switch to the abbreviated flow
                    session.reset_flow(Flow::Quick);
                    return Transition::reply(session, StaticReply::QuickIntro);
                }
                session.stage = Stage::QuickAnalysis;
                Transition::prompt(session, PromptKind::Quick)
            }
            Input::Control(_) => Transition::invalid(session, ValidationIssue::NotAvailable),
            Input::Text(text) => self.toggle(session, text),
        }
    }

    fn quick_symptoms(&self, mut session: Session, input: &Input) -> Transition {
        match input {
            Input::Control(Control::QuickAnalyze | Control::DoneSelecting) => {
                if !session.has_symptoms() {
                    return Transition::invalid(session, ValidationIssue::NoSymptoms);
                }
                session.stage = Stage::QuickAnalysis;
                Transition::prompt(session, PromptKind::Quick)
            }
            Input::Control(_) => Transition::invalid(session, ValidationIssue::NotAvailable),
            Input::Text(text) => self.toggle(session, text),
        }
    }

    fn toggle(&self, mut session: Session, text: &str) -> Transition {
        if text.is_empty() {
            return Transition::invalid(session, ValidationIssue::EmptyMessage);
        }
        if !self.menu.is_symptom_label(text) && text.chars().count() > MAX_SYMPTOM_CHARS {
            return Transition::invalid(session, ValidationIssue::SymptomTooLong);
        }
        let added = session.toggle_symptom(text);
        Transition::reply(
            session,
            StaticReply::SymptomToggled {
                symptom: text.to_string(),
                added,
            },
        )
    }

    fn demographics(&self, mut session: Session, field: DemographicField, input: &Input) -> Transition {
        let Input::Text(text) = input else {
            return Transition::invalid(session, ValidationIssue::UnknownOption);
        };
        match field {
            DemographicField::AgeGroup => {
                let age = self.menu.age_group(text);
                if age.is_none() && !self.menu.is_skip_age(text) {
                    return Transition::invalid(session, ValidationIssue::UnknownOption);
                }
                session.demographics.age_group = age;
                session.stage = Stage::Demographics(DemographicField::BiologicalSex);
                Transition::reply(session, StaticReply::AskBiologicalSex)
            }
            DemographicField::BiologicalSex => match self.menu.biological_sex(text) {
                Some(sex) => {
                    session.demographics.biological_sex = Some(sex);
                    session.stage = Stage::Duration;
                    Transition::reply(session, StaticReply::AskDuration)
                }
                None => Transition::invalid(session, ValidationIssue::UnknownOption),
            },
        }
    }

    fn duration(&self, mut session: Session, input: &Input) -> Transition {
        let picked = match input {
            Input::Text(text) => self.menu.duration(text),
            Input::Control(_) => None,
        };
        match picked {
            Some(duration) => {
                session.duration = Some(duration);
                session.stage = Stage::Severity;
                Transition::reply(session, StaticReply::AskSeverity)
            }
            None => Transition::invalid(session, ValidationIssue::UnknownOption),
        }
    }

    fn severity(&self, mut session: Session, input: &Input) -> Transition {
        let picked = match input {
            Input::Text(text) => self.menu.severity(text),
            Input::Control(_) => None,
        };
        match picked {
            Some(severity) => {
                session.severity = Some(severity);
                session.stage = Stage::Analysis;
                Transition::prompt(session, PromptKind::Full)
            }
            None => Transition::invalid(session, ValidationIssue::UnknownOption),
        }
    }

    fn follow_up(&self, mut session: Session, input: &Input) -> Transition {
        match input {
            Input::Control(Control::MoreDetails) => {
                Transition::reply(session, StaticReply::MoreDetails)
            }
            Input::Control(Control::MedicationInfo) => {
                Transition::reply(session, StaticReply::MedicationInfo)
            }
            Input::Control(Control::NewAnalysis) => {
                session.reset_flow(Flow::Full);
                Transition::reply(session, StaticReply::SymptomMenu)
            }
            _ => Transition::invalid(session, ValidationIssue::ChooseFollowUp),
        }
    }

    fn freeform_chat(&self, mut session: Session, input: &Input) -> Transition {
        match input {
            Input::Control(Control::RequestSummary) => {
                if session.conversation_log.is_empty() {
                    return Transition::invalid(session, ValidationIssue::EmptyConversation);
                }
                session.stage = Stage::AnalysisSummary;
                Transition::prompt(session, PromptKind::Summary)
            }
            Input::Control(_) => Transition::invalid(session, ValidationIssue::NotAvailable),
            Input::Text(text) if text.is_empty() => {
                Transition::invalid(session, ValidationIssue::EmptyMessage)
            }
            Input::Text(text) => Transition::prompt(
                session,
                PromptKind::Conversational {
                    message: text.clone(),
                },
            ),
        }
    }
}

/// Flow entry controls are honoured in every non-transient stage.
fn enter_flow(session: &mut Session, control: Control) -> Option<StaticReply> {
    let reply = match control {
        Control::BeginFullAnalysis => {
            session.reset_flow(Flow::Full);
            entry_reply(Flow::Full, false)
        }
        Control::BeginQuickAnalysis => {
            session.reset_flow(Flow::Quick);
            entry_reply(Flow::Quick, false)
        }
        Control::BeginChat => {
            session.reset_flow(Flow::Chat);
            entry_reply(Flow::Chat, false)
        }
        Control::ContinueChat => {
            session.reset_intake();
            session.stage = Stage::FreeformChat;
            entry_reply(Flow::Chat, !session.conversation_log.is_empty())
        }
        _ => return None,
    };
    Some(reply)
}

fn entry_reply(flow: Flow, continued: bool) -> StaticReply {
    match flow {
        Flow::Full => StaticReply::SymptomMenu,
        Flow::Quick => StaticReply::QuickIntro,
        Flow::Chat => StaticReply::ChatIntro { continued },
    }
}

/// Stages whose handlers only make sense with symptoms on record.
fn requires_symptoms(stage: &Stage) -> bool {
    matches!(
        stage,
        Stage::Demographics(_) | Stage::Duration | Stage::Severity | Stage::FollowUp
    )
}
