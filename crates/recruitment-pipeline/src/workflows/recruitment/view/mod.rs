//! Pure rendering model for the pipeline screen.
//!
//! [`PipelineScreen::compose`] turns the authoritative application plus UI-only state into a
//! value; [`surface::PipelineRenderer`] writes that value into the regions of a bound surface.

pub mod surface;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::actions::{compute_actions, is_enabled, PipelineAction};
use super::domain::{Application, Criterion, Score, Stage, Status};
use super::draft::EvaluationDraft;
use super::scoring::ScoreDisplay;

pub use surface::{
    BindingError, PipelineRenderer, Region, RegionContent, RenderSurface, TextSurface,
};

/// A control that can be put in flight by a mutating request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case", tag = "control", content = "action")]
pub enum ControlId {
    Action(PipelineAction),
    SaveEvaluation,
    FinalizeEvaluation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Error,
}

/// The single user-facing message line (toast/alert replacement).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderView {
    pub full_name: String,
    pub role: String,
    pub email: String,
    pub stage_badge: &'static str,
    pub status: Status,
    pub interview_date: Option<DateTime<Utc>>,
    pub assigned_reviewer: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentState {
    Completed,
    Active,
    Upcoming,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RibbonSegment {
    pub stage: Stage,
    pub state: SegmentState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActionControl {
    pub action: PipelineAction,
    pub label: &'static str,
    pub enabled: bool,
    pub in_flight: bool,
    pub requires_interview_date: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ActionArea {
    Controls { controls: Vec<ActionControl> },
    Closed { status: Status, message: &'static str },
}

impl ActionArea {
    pub fn controls(&self) -> &[ActionControl] {
        match self {
            ActionArea::Controls { controls } => controls,
            ActionArea::Closed { .. } => &[],
        }
    }

    pub fn enabled_actions(&self) -> Vec<PipelineAction> {
        self.controls()
            .iter()
            .filter(|control| control.enabled)
            .map(|control| control.action)
            .collect()
    }

    pub fn control(&self, action: PipelineAction) -> Option<&ActionControl> {
        self.controls()
            .iter()
            .find(|control| control.action == action)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CriterionRow {
    pub criterion: Criterion,
    pub label: &'static str,
    pub score: Option<Score>,
    pub notes: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationPanel {
    pub title: String,
    pub stage: Stage,
    pub scored: bool,
    pub finalized: bool,
    pub rows: Vec<CriterionRow>,
    pub score_label: String,
    pub bar_percent: f64,
    pub can_save: bool,
    pub can_finalize: bool,
}

impl EvaluationPanel {
    pub fn controls_enabled(&self) -> bool {
        self.rows.iter().any(|row| row.enabled) || self.can_save || self.can_finalize
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineRow {
    pub action: String,
    pub from: String,
    pub to: String,
    pub performed_by: String,
    pub at: DateTime<Utc>,
    pub duration: String,
}

/// Everything visible on the pipeline screen for one application.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineScreen {
    pub header: HeaderView,
    pub ribbon: Vec<RibbonSegment>,
    pub actions: ActionArea,
    pub evaluation: EvaluationPanel,
    pub timeline: Vec<TimelineRow>,
    pub notice: Option<Notice>,
}

/// UI-only state layered over the authoritative record.
#[derive(Debug, Clone, Copy, Default)]
pub struct UiState<'a> {
    pub draft: Option<&'a EvaluationDraft>,
    pub in_flight: Option<ControlId>,
    pub notice: Option<&'a Notice>,
}

impl PipelineScreen {
    pub fn compose(application: &Application, ui: UiState<'_>) -> Self {
        Self {
            header: header(application),
            ribbon: ribbon(application.current_stage),
            actions: action_area(application, ui.in_flight),
            evaluation: evaluation_panel(application, ui),
            timeline: timeline(application),
            notice: ui.notice.cloned(),
        }
    }
}

fn header(application: &Application) -> HeaderView {
    HeaderView {
        full_name: application.full_name(),
        role: application.role_applied_for.clone().unwrap_or_default(),
        email: application.email.clone().unwrap_or_default(),
        stage_badge: application.current_stage.title(),
        status: application.status,
        interview_date: application.interview_date,
        assigned_reviewer: application.assigned_reviewer.clone(),
    }
}

/// Completed/active/upcoming segments in stage order.
pub fn ribbon(current: Stage) -> Vec<RibbonSegment> {
    Stage::ALL
        .into_iter()
        .map(|stage| {
            let state = match stage.position().cmp(&current.position()) {
                std::cmp::Ordering::Less => SegmentState::Completed,
                std::cmp::Ordering::Equal => SegmentState::Active,
                std::cmp::Ordering::Greater => SegmentState::Upcoming,
            };
            RibbonSegment { stage, state }
        })
        .collect()
}

fn action_area(application: &Application, in_flight: Option<ControlId>) -> ActionArea {
    if let Some(message) = application.status.closed_message() {
        return ActionArea::Closed {
            status: application.status,
            message,
        };
    }

    let busy = in_flight.is_some();
    let controls = compute_actions(application.current_stage, application.status)
        .iter()
        .map(|action| ActionControl {
            action,
            label: action.label(),
            enabled: !busy && is_enabled(action, application),
            in_flight: in_flight == Some(ControlId::Action(action)),
            requires_interview_date: action.requires_interview_date(),
        })
        .collect();

    ActionArea::Controls { controls }
}

fn evaluation_panel(application: &Application, ui: UiState<'_>) -> EvaluationPanel {
    let stage = application.current_stage;
    let saved = application.current_evaluation();
    let finalized = saved.map(|evaluation| evaluation.is_finalized).unwrap_or(false);
    let scored = stage.requires_evaluation();
    let editable = scored && !finalized && !application.is_terminal() && ui.in_flight.is_none();

    let fallback;
    let draft = match ui.draft.filter(|draft| draft.stage() == stage) {
        Some(draft) => draft,
        None => {
            fallback = EvaluationDraft::hydrate(stage, saved);
            &fallback
        }
    };

    let rows = Criterion::ALL
        .into_iter()
        .map(|criterion| CriterionRow {
            criterion,
            label: criterion.label(),
            score: draft.score(criterion),
            notes: draft.notes(criterion).to_string(),
            enabled: editable,
        })
        .collect();

    let score = draft.score_display(saved);

    EvaluationPanel {
        title: format!("{} EVALUATION", stage.title()),
        stage,
        scored,
        finalized,
        rows,
        score_label: score.to_string(),
        bar_percent: score_bar(score),
        can_save: editable,
        can_finalize: editable && saved.is_some() && !draft.is_dirty(),
    }
}

fn score_bar(score: ScoreDisplay) -> f64 {
    (score.bar_percent() * 100.0).round() / 100.0
}

fn timeline(application: &Application) -> Vec<TimelineRow> {
    application
        .transition_logs
        .iter()
        .map(|entry| TimelineRow {
            action: humanize(&entry.action),
            from: entry.previous_stage.as_deref().map(humanize).unwrap_or_default(),
            to: entry.new_stage.as_deref().map(humanize).unwrap_or_default(),
            performed_by: entry.performed_by.clone(),
            at: entry.created_at,
            duration: format_duration(entry.duration_seconds),
        })
        .collect()
}

fn humanize(raw: &str) -> String {
    raw.replace('_', " ")
}

/// Compact elapsed time: `45s`, `12m`, `3h 20m`, `2d 4h`.
pub fn format_duration(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let (days, rem) = (seconds / 86_400, seconds % 86_400);
    let (hours, rem) = (rem / 3_600, rem % 3_600);
    let minutes = rem / 60;

    if days > 0 {
        format!("{days}d {hours}h")
    } else if hours > 0 {
        format!("{hours}h {minutes}m")
    } else if minutes > 0 {
        format!("{minutes}m")
    } else {
        format!("{seconds}s")
    }
}
