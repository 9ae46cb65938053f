use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use super::super::actions::PipelineAction;
use super::super::domain::{Application, Evaluation, Stage, Status, TransitionLogEntry};
use super::super::scoring::{round_score, ScoreThresholds};

/// Server-side refusal of an action, reported to clients verbatim as `{detail}`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct InvalidTransition(pub String);

impl InvalidTransition {
    fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Stored application plus every evaluation it has accumulated.
#[derive(Debug, Clone, PartialEq)]
pub struct SandboxRecord {
    pub application: Application,
    pub evaluations: BTreeMap<Stage, Evaluation>,
    pub stage_updated_at: DateTime<Utc>,
}

impl SandboxRecord {
    pub fn new(mut application: Application, now: DateTime<Utc>) -> Self {
        let evaluations = application
            .evaluation
            .take()
            .map(|evaluation| (evaluation.stage, evaluation))
            .into_iter()
            .collect();
        Self {
            application,
            evaluations,
            stage_updated_at: now,
        }
    }

    /// Wire view: the application with the evaluation of its current stage attached.
    pub fn view(&self) -> Application {
        let mut application = self.application.clone();
        application.evaluation = self
            .evaluations
            .get(&application.current_stage)
            .cloned();
        application
    }

    fn finalized(&self, stage: Stage) -> Result<&Evaluation, InvalidTransition> {
        self.evaluations
            .get(&stage)
            .filter(|evaluation| evaluation.is_finalized)
            .ok_or_else(|| {
                InvalidTransition::new(format!("Finalized evaluation required for stage '{stage}'."))
            })
    }
}

/// Action-specific fields that accompanied the request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransitionPayload {
    pub interview_date: Option<String>,
}

/// Reference implementation of the backend's recruitment state machine.
#[derive(Debug, Clone, Default)]
pub struct TransitionEngine {
    thresholds: ScoreThresholds,
}

impl TransitionEngine {
    pub fn new(thresholds: ScoreThresholds) -> Self {
        Self { thresholds }
    }

    /// Applies `action` to the record and appends a transition log entry.
    ///
    /// The record is left untouched when the action is refused.
    pub fn perform(
        &self,
        record: &mut SandboxRecord,
        action: &str,
        actor: &str,
        payload: &TransitionPayload,
        now: DateTime<Utc>,
    ) -> Result<PipelineAction, InvalidTransition> {
        ensure_not_terminal(&record.application)?;

        let action: PipelineAction = action
            .parse()
            .map_err(|_| InvalidTransition::new(format!("Unknown action '{action}'.")))?;

        let mut next = record.clone();
        let previous_stage = next.application.current_stage;

        match action {
            PipelineAction::StartScreening => start_screening(&mut next, actor)?,
            PipelineAction::ScheduleInterview => self.schedule_interview(&mut next, payload)?,
            PipelineAction::CompleteInterview => self.complete_interview(&mut next)?,
            PipelineAction::SubmitFinalReview => self.submit_final_review(&mut next, now)?,
            PipelineAction::Approve => approve(&mut next)?,
            PipelineAction::Reject => reject(&mut next)?,
            PipelineAction::AcceptOffer => {
                settle_offer(&mut next, Status::HireApproved, "No active offer to accept.")?
            }
            PipelineAction::DeclineOffer => {
                settle_offer(&mut next, Status::Rejected, "No active offer to decline.")?
            }
            PipelineAction::WithdrawOffer => {
                settle_offer(&mut next, Status::Withdrawn, "No active offer to withdraw.")?
            }
        }

        let duration = now.signed_duration_since(next.stage_updated_at).num_seconds();
        next.application.transition_logs.push(TransitionLogEntry {
            action: action.as_str().to_string(),
            previous_stage: Some(previous_stage.label().to_string()),
            new_stage: Some(next.application.current_stage.label().to_string()),
            performed_by: actor.to_string(),
            created_at: now,
            duration_seconds: duration.max(0),
        });
        next.stage_updated_at = now;

        *record = next;
        Ok(action)
    }

    fn schedule_interview(
        &self,
        record: &mut SandboxRecord,
        payload: &TransitionPayload,
    ) -> Result<(), InvalidTransition> {
        require_stage(
            record,
            Stage::Screening,
            "Interview scheduling allowed only from screening.",
        )?;

        let evaluation = record.finalized(Stage::Screening)?;
        self.meet_threshold(evaluation, "Screening")?;

        let raw = payload
            .interview_date
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| InvalidTransition::new("Interview date is required."))?;
        let interview_date = parse_interview_date(raw)
            .ok_or_else(|| InvalidTransition::new(format!("Invalid interview date '{raw}'.")))?;

        record.application.interview_date = Some(interview_date);
        record.application.current_stage = Stage::Interview;
        Ok(())
    }

    fn complete_interview(&self, record: &mut SandboxRecord) -> Result<(), InvalidTransition> {
        require_stage(
            record,
            Stage::Interview,
            "Interview completion only allowed from interview stage.",
        )?;

        if self.thresholds.require_interview_date && record.application.interview_date.is_none() {
            return Err(InvalidTransition::new(
                "Interview must be scheduled before completion.",
            ));
        }

        let evaluation = record.finalized(Stage::Interview)?;
        self.meet_threshold(evaluation, "Interview")?;

        record.application.current_stage = Stage::FinalReview;
        Ok(())
    }

    fn submit_final_review(
        &self,
        record: &mut SandboxRecord,
        now: DateTime<Utc>,
    ) -> Result<(), InvalidTransition> {
        require_stage(
            record,
            Stage::FinalReview,
            "Final review only allowed from final_review stage.",
        )?;

        if record.finalized(Stage::FinalReview).is_err() {
            let composite = composite_score(record).ok_or_else(|| {
                InvalidTransition::new(
                    "Finalized screening and interview evaluations are required before submitting the final review.",
                )
            })?;
            let evaluation = record
                .evaluations
                .entry(Stage::FinalReview)
                .or_insert_with(|| Evaluation::blank(Stage::FinalReview));
            evaluation.weighted_score = Some(composite);
            evaluation.is_finalized = true;
            evaluation.created_at.get_or_insert(now);
        }

        let evaluation = record.finalized(Stage::FinalReview)?;
        self.meet_threshold(evaluation, "Final review")?;

        record.application.current_stage = Stage::Decision;
        Ok(())
    }

    fn meet_threshold(&self, evaluation: &Evaluation, label: &str) -> Result<(), InvalidTransition> {
        let Some(threshold) = self.thresholds.for_stage(evaluation.stage) else {
            return Ok(());
        };
        if evaluation.weighted_score.unwrap_or(0.0) < threshold {
            return Err(InvalidTransition::new(format!(
                "{label} threshold not met ({threshold:.1})."
            )));
        }
        Ok(())
    }
}

fn ensure_not_terminal(application: &Application) -> Result<(), InvalidTransition> {
    if application.is_terminal() {
        return Err(InvalidTransition::new("Cannot modify a closed application."));
    }
    Ok(())
}

fn require_stage(
    record: &SandboxRecord,
    stage: Stage,
    message: &str,
) -> Result<(), InvalidTransition> {
    if record.application.current_stage != stage {
        return Err(InvalidTransition::new(message));
    }
    Ok(())
}

fn start_screening(record: &mut SandboxRecord, actor: &str) -> Result<(), InvalidTransition> {
    require_stage(record, Stage::Submitted, "Screening can only start from submitted.")?;
    record.application.current_stage = Stage::Screening;
    record.application.assigned_reviewer = Some(actor.to_string());
    Ok(())
}

fn approve(record: &mut SandboxRecord) -> Result<(), InvalidTransition> {
    require_stage(record, Stage::Decision, "Approval only allowed from decision stage.")?;
    if record.application.status != Status::Active {
        return Err(InvalidTransition::new(
            "Offer can only be extended from active decision state.",
        ));
    }
    record.application.status = Status::OfferExtended;
    Ok(())
}

fn reject(record: &mut SandboxRecord) -> Result<(), InvalidTransition> {
    if record.application.status != Status::Active {
        return Err(InvalidTransition::new(
            "Cannot reject after offer has been extended.",
        ));
    }
    record.application.status = Status::Rejected;
    Ok(())
}

fn settle_offer(
    record: &mut SandboxRecord,
    outcome: Status,
    no_offer: &str,
) -> Result<(), InvalidTransition> {
    require_stage(record, Stage::Decision, "Offer handling only allowed from decision stage.")?;
    if record.application.status != Status::OfferExtended {
        return Err(InvalidTransition::new(no_offer));
    }
    record.application.status = outcome;
    Ok(())
}

/// Average of the finalized screening and interview scores.
fn composite_score(record: &SandboxRecord) -> Option<f64> {
    let screening = record.finalized(Stage::Screening).ok()?.weighted_score?;
    let interview = record.finalized(Stage::Interview).ok()?.weighted_score?;
    Some(round_score((screening + interview) / 2.0))
}

/// Accepts RFC 3339, a `datetime-local` value (`2025-03-01T14:30`) or a bare date.
pub fn parse_interview_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(parsed.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|datetime| datetime.and_utc())
}
