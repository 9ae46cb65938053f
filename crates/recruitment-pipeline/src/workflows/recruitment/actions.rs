use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use super::domain::{Application, Stage, Status, UnknownValue};

/// Every action the transition endpoint understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineAction {
    StartScreening,
    ScheduleInterview,
    CompleteInterview,
    SubmitFinalReview,
    Approve,
    Reject,
    AcceptOffer,
    DeclineOffer,
    WithdrawOffer,
}

impl PipelineAction {
    pub const ALL: [PipelineAction; 9] = [
        PipelineAction::StartScreening,
        PipelineAction::ScheduleInterview,
        PipelineAction::CompleteInterview,
        PipelineAction::SubmitFinalReview,
        PipelineAction::Approve,
        PipelineAction::Reject,
        PipelineAction::AcceptOffer,
        PipelineAction::DeclineOffer,
        PipelineAction::WithdrawOffer,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            PipelineAction::StartScreening => "start_screening",
            PipelineAction::ScheduleInterview => "schedule_interview",
            PipelineAction::CompleteInterview => "complete_interview",
            PipelineAction::SubmitFinalReview => "submit_final_review",
            PipelineAction::Approve => "approve",
            PipelineAction::Reject => "reject",
            PipelineAction::AcceptOffer => "accept_offer",
            PipelineAction::DeclineOffer => "decline_offer",
            PipelineAction::WithdrawOffer => "withdraw_offer",
        }
    }

    /// Button caption.
    pub const fn label(self) -> &'static str {
        match self {
            PipelineAction::StartScreening => "Start Screening",
            PipelineAction::ScheduleInterview => "Schedule Interview",
            PipelineAction::CompleteInterview => "Complete Interview",
            PipelineAction::SubmitFinalReview => "Submit Final Review",
            PipelineAction::Approve => "Extend Offer",
            PipelineAction::Reject => "Reject",
            PipelineAction::AcceptOffer => "Accept Offer",
            PipelineAction::DeclineOffer => "Decline Offer",
            PipelineAction::WithdrawOffer => "Withdraw Offer",
        }
    }

    /// The stage whose finalized evaluation must exist before this action is enabled.
    pub const fn gating_stage(self) -> Option<Stage> {
        match self {
            PipelineAction::ScheduleInterview => Some(Stage::Screening),
            PipelineAction::CompleteInterview => Some(Stage::Interview),
            PipelineAction::SubmitFinalReview => Some(Stage::FinalReview),
            _ => None,
        }
    }

    pub const fn requires_interview_date(self) -> bool {
        matches!(self, PipelineAction::ScheduleInterview)
    }
}

impl fmt::Display for PipelineAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PipelineAction {
    type Err = UnknownValue;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        PipelineAction::ALL
            .into_iter()
            .find(|action| action.as_str() == value.trim())
            .ok_or_else(|| UnknownValue {
                kind: "action",
                value: value.to_string(),
            })
    }
}

/// Ordered set of actions offered for a `(stage, status)` pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionSet {
    actions: Vec<PipelineAction>,
}

impl ActionSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn contains(&self, action: PipelineAction) -> bool {
        self.actions.contains(&action)
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = PipelineAction> + '_ {
        self.actions.iter().copied()
    }

    pub fn as_slice(&self) -> &[PipelineAction] {
        &self.actions
    }
}

impl FromIterator<PipelineAction> for ActionSet {
    fn from_iter<T: IntoIterator<Item = PipelineAction>>(iter: T) -> Self {
        let mut actions = Vec::new();
        for action in iter {
            if !actions.contains(&action) {
                actions.push(action);
            }
        }
        Self { actions }
    }
}

/// Actions the UI may offer for a record. Advisory only: the server remains the judge.
pub fn compute_actions(stage: Stage, status: Status) -> ActionSet {
    use PipelineAction::*;

    if status.is_terminal() {
        return ActionSet::empty();
    }

    let offered: &[PipelineAction] = match (stage, status) {
        (Stage::Submitted, Status::Active) => &[StartScreening, Reject],
        (Stage::Screening, Status::Active) => &[ScheduleInterview, Reject],
        (Stage::Interview, Status::Active) => &[CompleteInterview, Reject],
        (Stage::FinalReview, Status::Active) => &[SubmitFinalReview, Reject],
        (Stage::Decision, Status::Active) => &[Approve, Reject],
        (Stage::Decision, Status::OfferExtended) => &[AcceptOffer, DeclineOffer, WithdrawOffer],
        _ => &[],
    };

    offered.iter().copied().collect()
}

/// Whether an offered action may be triggered right now.
///
/// Forward actions out of a scored stage stay disabled until that stage's evaluation is
/// finalized.
pub fn is_enabled(action: PipelineAction, application: &Application) -> bool {
    match action.gating_stage() {
        Some(stage) => {
            application.current_stage == stage && application.current_evaluation_finalized()
        }
        None => true,
    }
}

/// User input collected alongside an action trigger.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionInput {
    pub interview_date: Option<DateTime<Utc>>,
}

impl ActionInput {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn interview_on(date: DateTime<Utc>) -> Self {
        Self {
            interview_date: Some(date),
        }
    }
}

/// Action-specific fields merged into the transition body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionPayload {
    Empty,
    InterviewSchedule { interview_date: DateTime<Utc> },
}

/// Body of `POST /recruitment/{id}/transition`: `{action, ...payload}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionRequest {
    pub action: PipelineAction,
    pub payload: ActionPayload,
}

impl Serialize for TransitionRequest {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let len = match self.payload {
            ActionPayload::Empty => 1,
            ActionPayload::InterviewSchedule { .. } => 2,
        };
        let mut map = serializer.serialize_map(Some(len))?;
        map.serialize_entry("action", self.action.as_str())?;
        if let ActionPayload::InterviewSchedule { interview_date } = &self.payload {
            map.serialize_entry("interview_date", interview_date)?;
        }
        map.end()
    }
}

/// An action could not be turned into a request because required input is missing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{action}' requires {field}")]
pub struct MissingPayload {
    pub action: PipelineAction,
    pub field: &'static str,
}

/// Single mapping from action to payload builder.
pub fn build_request(
    action: PipelineAction,
    input: &ActionInput,
) -> Result<TransitionRequest, MissingPayload> {
    let payload = match action {
        PipelineAction::ScheduleInterview => {
            let interview_date = input.interview_date.ok_or(MissingPayload {
                action,
                field: "interview_date",
            })?;
            ActionPayload::InterviewSchedule { interview_date }
        }
        PipelineAction::StartScreening
        | PipelineAction::CompleteInterview
        | PipelineAction::SubmitFinalReview
        | PipelineAction::Approve
        | PipelineAction::Reject
        | PipelineAction::AcceptOffer
        | PipelineAction::DeclineOffer
        | PipelineAction::WithdrawOffer => ActionPayload::Empty,
    };

    Ok(TransitionRequest { action, payload })
}
