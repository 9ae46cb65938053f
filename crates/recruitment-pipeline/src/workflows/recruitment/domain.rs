use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Opaque identifier for a recruitment application.
///
/// The backend exposes numeric primary keys while the sandbox uses strings, so both forms are
/// accepted on the wire and kept as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ApplicationId(pub String);

impl ApplicationId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ApplicationId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserialize_text_or_number(deserializer).map(ApplicationId)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TextOrNumber {
    Int(i64),
    Float(f64),
    Text(String),
}

fn deserialize_text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match TextOrNumber::deserialize(deserializer)? {
        TextOrNumber::Int(value) => value.to_string(),
        TextOrNumber::Float(value) => value.to_string(),
        TextOrNumber::Text(value) => value,
    })
}

fn deserialize_optional_text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(
        Option::<TextOrNumber>::deserialize(deserializer)?.map(|value| match value {
            TextOrNumber::Int(value) => value.to_string(),
            TextOrNumber::Float(value) => value.to_string(),
            TextOrNumber::Text(value) => value,
        }),
    )
}

/// Decimal fields arrive either as JSON numbers or as strings (`"7.50"`).
fn deserialize_optional_decimal<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<TextOrNumber>::deserialize(deserializer)? {
        None => Ok(None),
        Some(TextOrNumber::Int(value)) => Ok(Some(value as f64)),
        Some(TextOrNumber::Float(value)) => Ok(Some(value)),
        Some(TextOrNumber::Text(value)) if value.trim().is_empty() => Ok(None),
        Some(TextOrNumber::Text(value)) => value
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid decimal '{value}'"))),
    }
}

/// Ordered recruitment phases. Movement is forward-only and confirmed by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Submitted,
    Screening,
    Interview,
    FinalReview,
    Decision,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Submitted,
        Stage::Screening,
        Stage::Interview,
        Stage::FinalReview,
        Stage::Decision,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Stage::Submitted => "submitted",
            Stage::Screening => "screening",
            Stage::Interview => "interview",
            Stage::FinalReview => "final_review",
            Stage::Decision => "decision",
        }
    }

    /// Upper-cased, space separated form used for badges and panel titles.
    pub const fn title(self) -> &'static str {
        match self {
            Stage::Submitted => "SUBMITTED",
            Stage::Screening => "SCREENING",
            Stage::Interview => "INTERVIEW",
            Stage::FinalReview => "FINAL REVIEW",
            Stage::Decision => "DECISION",
        }
    }

    pub const fn position(self) -> usize {
        match self {
            Stage::Submitted => 0,
            Stage::Screening => 1,
            Stage::Interview => 2,
            Stage::FinalReview => 3,
            Stage::Decision => 4,
        }
    }

    /// Stages whose forward action waits on a finalized evaluation.
    pub const fn requires_evaluation(self) -> bool {
        matches!(self, Stage::Screening | Stage::Interview | Stage::FinalReview)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Stage {
    type Err = UnknownValue;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Stage::ALL
            .into_iter()
            .find(|stage| stage.label() == value.trim())
            .ok_or_else(|| UnknownValue {
                kind: "stage",
                value: value.to_string(),
            })
    }
}

/// Lifecycle flag orthogonal to the stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Active,
    OfferExtended,
    HireApproved,
    Rejected,
    Withdrawn,
    Closed,
}

impl Status {
    pub const ALL: [Status; 6] = [
        Status::Active,
        Status::OfferExtended,
        Status::HireApproved,
        Status::Rejected,
        Status::Withdrawn,
        Status::Closed,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Status::Active => "active",
            Status::OfferExtended => "offer_extended",
            Status::HireApproved => "hire_approved",
            Status::Rejected => "rejected",
            Status::Withdrawn => "withdrawn",
            Status::Closed => "closed",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Status::HireApproved | Status::Rejected | Status::Withdrawn | Status::Closed
        )
    }

    /// Message shown in place of the action area once the record is closed.
    pub const fn closed_message(self) -> Option<&'static str> {
        match self {
            Status::HireApproved => Some("Candidate hired. Onboarding initiated."),
            Status::Rejected => Some("Application rejected."),
            Status::Withdrawn => Some("Offer withdrawn."),
            Status::Closed => Some("Application closed."),
            Status::Active | Status::OfferExtended => None,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Status {
    type Err = UnknownValue;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Status::ALL
            .into_iter()
            .find(|status| status.label() == value.trim())
            .ok_or_else(|| UnknownValue {
                kind: "status",
                value: value.to_string(),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownValue {
    pub kind: &'static str,
    pub value: String,
}

/// Fixed rubric used for every scored stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    Career,
    Experience,
    Stability,
    Education,
    Skills,
}

impl Criterion {
    pub const ALL: [Criterion; 5] = [
        Criterion::Career,
        Criterion::Experience,
        Criterion::Stability,
        Criterion::Education,
        Criterion::Skills,
    ];

    pub const fn key(self) -> &'static str {
        match self {
            Criterion::Career => "career",
            Criterion::Experience => "experience",
            Criterion::Stability => "stability",
            Criterion::Education => "education",
            Criterion::Skills => "skills",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Criterion::Career => "Career progression",
            Criterion::Experience => "Relevant experience",
            Criterion::Stability => "Job stability",
            Criterion::Education => "Education",
            Criterion::Skills => "Skills",
        }
    }
}

impl FromStr for Criterion {
    type Err = UnknownValue;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Criterion::ALL
            .into_iter()
            .find(|criterion| criterion.key() == value.trim().to_ascii_lowercase())
            .ok_or_else(|| UnknownValue {
                kind: "criterion",
                value: value.to_string(),
            })
    }
}

/// A single criterion rating, always within 1..=5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "u8")]
pub struct Score(u8);

impl Score {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: u8) -> Result<Self, ScoreOutOfRange> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ScoreOutOfRange(value as f64))
        }
    }

    pub const fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<f64> for Score {
    type Error = ScoreOutOfRange;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if value.fract() != 0.0 || value < Self::MIN as f64 || value > Self::MAX as f64 {
            return Err(ScoreOutOfRange(value));
        }
        Ok(Self(value as u8))
    }
}

impl From<Score> for u8 {
    fn from(score: Score) -> Self {
        score.0
    }
}

impl FromStr for Score {
    type Err = ScoreOutOfRange;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let parsed = value.trim().parse::<f64>().map_err(|_| ScoreOutOfRange(f64::NAN))?;
        Score::try_from(parsed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
#[error("score must be a whole number between 1 and 5 (got {0})")]
pub struct ScoreOutOfRange(pub f64);

/// Rating and free-text notes for one criterion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CriterionEntry {
    pub score: Option<Score>,
    pub notes: String,
}

pub type CriteriaEntries = BTreeMap<Criterion, CriterionEntry>;

fn empty_criteria() -> CriteriaEntries {
    Criterion::ALL
        .into_iter()
        .map(|criterion| (criterion, CriterionEntry::default()))
        .collect()
}

/// Flat `<criterion>_score` / `<criterion>_notes` layout used by the evaluation endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CriteriaWire {
    #[serde(default)]
    career_score: Option<Score>,
    #[serde(default)]
    career_notes: Option<String>,
    #[serde(default)]
    experience_score: Option<Score>,
    #[serde(default)]
    experience_notes: Option<String>,
    #[serde(default)]
    stability_score: Option<Score>,
    #[serde(default)]
    stability_notes: Option<String>,
    #[serde(default)]
    education_score: Option<Score>,
    #[serde(default)]
    education_notes: Option<String>,
    #[serde(default)]
    skills_score: Option<Score>,
    #[serde(default)]
    skills_notes: Option<String>,
}

impl CriteriaWire {
    fn slot(&mut self, criterion: Criterion) -> (&mut Option<Score>, &mut Option<String>) {
        match criterion {
            Criterion::Career => (&mut self.career_score, &mut self.career_notes),
            Criterion::Experience => (&mut self.experience_score, &mut self.experience_notes),
            Criterion::Stability => (&mut self.stability_score, &mut self.stability_notes),
            Criterion::Education => (&mut self.education_score, &mut self.education_notes),
            Criterion::Skills => (&mut self.skills_score, &mut self.skills_notes),
        }
    }

    fn from_entries(entries: &CriteriaEntries) -> Self {
        let mut wire = Self::default();
        for criterion in Criterion::ALL {
            let entry = entries.get(&criterion).cloned().unwrap_or_default();
            let (score, notes) = wire.slot(criterion);
            *score = entry.score;
            *notes = Some(entry.notes);
        }
        wire
    }

    fn into_entries(mut self) -> CriteriaEntries {
        Criterion::ALL
            .into_iter()
            .map(|criterion| {
                let (score, notes) = self.slot(criterion);
                let entry = CriterionEntry {
                    score: score.take(),
                    notes: notes.take().unwrap_or_default(),
                };
                (criterion, entry)
            })
            .collect()
    }
}

/// A stage evaluation as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "EvaluationWire", into = "EvaluationWire")]
pub struct Evaluation {
    pub stage: Stage,
    pub is_finalized: bool,
    /// Authoritative 0-10 score recomputed by the server on every save.
    pub weighted_score: Option<f64>,
    pub criteria: CriteriaEntries,
    pub created_at: Option<DateTime<Utc>>,
}

impl Evaluation {
    pub fn blank(stage: Stage) -> Self {
        Self {
            stage,
            is_finalized: false,
            weighted_score: None,
            criteria: empty_criteria(),
            created_at: None,
        }
    }

    pub fn score(&self, criterion: Criterion) -> Option<Score> {
        self.criteria.get(&criterion).and_then(|entry| entry.score)
    }

    pub fn notes(&self, criterion: Criterion) -> &str {
        self.criteria
            .get(&criterion)
            .map(|entry| entry.notes.as_str())
            .unwrap_or("")
    }

    /// Scores in rubric order, `None` where the reviewer has not rated yet.
    pub fn scores(&self) -> Vec<Option<Score>> {
        Criterion::ALL
            .into_iter()
            .map(|criterion| self.score(criterion))
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct EvaluationWire {
    stage: Stage,
    #[serde(default)]
    is_finalized: bool,
    #[serde(default, deserialize_with = "deserialize_optional_decimal")]
    weighted_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    criteria: CriteriaWire,
}

impl From<EvaluationWire> for Evaluation {
    fn from(wire: EvaluationWire) -> Self {
        Self {
            stage: wire.stage,
            is_finalized: wire.is_finalized,
            weighted_score: wire.weighted_score,
            criteria: wire.criteria.into_entries(),
            created_at: wire.created_at,
        }
    }
}

impl From<Evaluation> for EvaluationWire {
    fn from(evaluation: Evaluation) -> Self {
        Self {
            stage: evaluation.stage,
            is_finalized: evaluation.is_finalized,
            weighted_score: evaluation.weighted_score,
            created_at: evaluation.created_at,
            criteria: CriteriaWire::from_entries(&evaluation.criteria),
        }
    }
}

/// Body of the evaluation-save request: `{stage, <criterion>_score, <criterion>_notes, ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "SubmissionWire", into = "SubmissionWire")]
pub struct EvaluationSubmission {
    pub stage: Stage,
    pub criteria: CriteriaEntries,
}

impl EvaluationSubmission {
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            criteria: empty_criteria(),
        }
    }

    pub fn with_score(mut self, criterion: Criterion, score: Score) -> Self {
        self.criteria.entry(criterion).or_default().score = Some(score);
        self
    }

    pub fn with_notes(mut self, criterion: Criterion, notes: impl Into<String>) -> Self {
        self.criteria.entry(criterion).or_default().notes = notes.into();
        self
    }

    pub fn scores(&self) -> Vec<Option<Score>> {
        Criterion::ALL
            .into_iter()
            .map(|criterion| self.criteria.get(&criterion).and_then(|entry| entry.score))
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SubmissionWire {
    stage: Stage,
    #[serde(flatten)]
    criteria: CriteriaWire,
}

impl From<SubmissionWire> for EvaluationSubmission {
    fn from(wire: SubmissionWire) -> Self {
        Self {
            stage: wire.stage,
            criteria: wire.criteria.into_entries(),
        }
    }
}

impl From<EvaluationSubmission> for SubmissionWire {
    fn from(submission: EvaluationSubmission) -> Self {
        Self {
            stage: submission.stage,
            criteria: CriteriaWire::from_entries(&submission.criteria),
        }
    }
}

/// One audited transition, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionLogEntry {
    pub action: String,
    #[serde(default)]
    pub previous_stage: Option<String>,
    #[serde(default)]
    pub new_stage: Option<String>,
    #[serde(default)]
    pub performed_by: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub duration_seconds: i64,
}

/// A candidate's pipeline record exactly as the backend last reported it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role_applied_for: Option<String>,
    pub current_stage: Stage,
    pub status: Status,
    #[serde(default)]
    pub evaluation: Option<Evaluation>,
    #[serde(default)]
    pub interview_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_optional_text_or_number")]
    pub assigned_reviewer: Option<String>,
    #[serde(default)]
    pub transition_logs: Vec<TransitionLogEntry>,
}

impl Application {
    /// Fresh `(submitted, active)` record.
    pub fn submitted(id: ApplicationId) -> Self {
        Self {
            id,
            first_name: None,
            last_name: None,
            email: None,
            role_applied_for: None,
            current_stage: Stage::Submitted,
            status: Status::Active,
            evaluation: None,
            interview_date: None,
            assigned_reviewer: None,
            transition_logs: Vec::new(),
        }
    }

    pub fn full_name(&self) -> String {
        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect();
        if parts.is_empty() {
            format!("Application {}", self.id)
        } else {
            parts.join(" ")
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// The evaluation belonging to the current stage, if the server returned one.
    pub fn current_evaluation(&self) -> Option<&Evaluation> {
        self.evaluation
            .as_ref()
            .filter(|evaluation| evaluation.stage == self.current_stage)
    }

    pub fn current_evaluation_finalized(&self) -> bool {
        self.current_evaluation()
            .map(|evaluation| evaluation.is_finalized)
            .unwrap_or(false)
    }
}
