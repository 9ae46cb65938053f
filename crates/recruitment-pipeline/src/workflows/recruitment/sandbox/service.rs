use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::{debug, info};

use super::super::domain::{Application, ApplicationId, Evaluation, EvaluationSubmission};
use super::super::listing::{filter_applications, ListQuery};
use super::super::scoring::{round_score, weighted_score, ScoreThresholds};
use super::engine::{InvalidTransition, SandboxRecord, TransitionEngine, TransitionPayload};
use super::store::{PipelineRepository, RepositoryError};

/// Transition request as received, before the action name is validated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransitionCommand {
    pub action: Option<String>,
    pub payload: TransitionPayload,
}

/// Service composing the repository and the transition engine behind the sandbox routes.
pub struct SandboxService<R> {
    repository: Arc<R>,
    engine: Arc<TransitionEngine>,
    writes: Mutex<()>,
}

impl<R> SandboxService<R>
where
    R: PipelineRepository + 'static,
{
    pub fn new(repository: Arc<R>, thresholds: ScoreThresholds) -> Self {
        Self {
            repository,
            engine: Arc::new(TransitionEngine::new(thresholds)),
            writes: Mutex::new(()),
        }
    }

    /// Store applications, skipping ids that already exist. Returns how many were added.
    pub fn seed<I>(&self, applications: I) -> Result<usize, SandboxError>
    where
        I: IntoIterator<Item = Application>,
    {
        let now = Utc::now();
        let mut added = 0;
        for application in applications {
            match self.repository.insert(SandboxRecord::new(application, now)) {
                Ok(()) => added += 1,
                Err(RepositoryError::Conflict) => {}
                Err(err) => return Err(err.into()),
            }
        }
        info!(added, "sandbox seeded");
        Ok(added)
    }

    /// Applications matching the list filter, ordered by id.
    pub fn list(&self, query: &ListQuery) -> Result<Vec<Application>, SandboxError> {
        let records = self.repository.all()?;
        let applications = filter_applications(records.iter().map(SandboxRecord::view), query);
        debug!(
            filter = %query.filter,
            status = ?query.status,
            matched = applications.len(),
            "sandbox list"
        );
        Ok(applications)
    }

    pub fn get(&self, id: &ApplicationId) -> Result<Application, SandboxError> {
        Ok(self.load(id)?.view())
    }

    pub fn transition(
        &self,
        id: &ApplicationId,
        command: TransitionCommand,
        actor: &str,
    ) -> Result<Application, SandboxError> {
        let action = command
            .action
            .as_deref()
            .map(str::trim)
            .filter(|action| !action.is_empty())
            .ok_or_else(|| SandboxError::Invalid("Action is required.".to_string()))?;

        let _guard = self.write_lock()?;
        let mut record = self.load(id)?;
        let applied = self
            .engine
            .perform(&mut record, action, actor, &command.payload, Utc::now())?;
        self.repository.update(record.clone())?;

        info!(
            application_id = %id,
            action = %applied,
            stage = %record.application.current_stage,
            status = %record.application.status,
            actor,
            "sandbox transition applied"
        );
        Ok(record.view())
    }

    pub fn save_evaluation(
        &self,
        id: &ApplicationId,
        submission: EvaluationSubmission,
    ) -> Result<Evaluation, SandboxError> {
        let _guard = self.write_lock()?;
        let mut record = self.load(id)?;
        let current = record.application.current_stage;

        if record.application.is_terminal() {
            return Err(InvalidTransition("Cannot modify a closed application.".to_string()).into());
        }
        if submission.stage != current {
            return Err(SandboxError::Invalid(
                "Evaluation must match current stage.".to_string(),
            ));
        }
        if !current.requires_evaluation() {
            return Err(SandboxError::Invalid(format!(
                "Stage '{current}' does not take an evaluation."
            )));
        }

        let now = Utc::now();
        let evaluation = record
            .evaluations
            .entry(current)
            .or_insert_with(|| Evaluation::blank(current));
        if evaluation.is_finalized {
            return Err(SandboxError::Invalid(
                "Evaluation is finalized and can no longer be edited.".to_string(),
            ));
        }

        let score = round_score(weighted_score(submission.scores()));
        evaluation.criteria = submission.criteria;
        evaluation.weighted_score = Some(score);
        evaluation.created_at.get_or_insert(now);
        let saved = evaluation.clone();

        self.repository.update(record)?;
        debug!(application_id = %id, stage = %current, weighted_score = score, "evaluation saved");
        Ok(saved)
    }

    pub fn finalize_evaluation(&self, id: &ApplicationId) -> Result<Evaluation, SandboxError> {
        let _guard = self.write_lock()?;
        let mut record = self.load(id)?;
        let current = record.application.current_stage;

        if record.application.is_terminal() {
            return Err(InvalidTransition("Cannot modify a closed application.".to_string()).into());
        }

        let evaluation = record.evaluations.get_mut(&current).ok_or_else(|| {
            SandboxError::Invalid(format!("No saved evaluation for stage '{current}'."))
        })?;
        if evaluation.is_finalized {
            return Err(SandboxError::Invalid("Evaluation already finalized.".to_string()));
        }
        evaluation.is_finalized = true;
        let finalized = evaluation.clone();

        self.repository.update(record)?;
        info!(application_id = %id, stage = %current, "evaluation finalized");
        Ok(finalized)
    }

    fn load(&self, id: &ApplicationId) -> Result<SandboxRecord, SandboxError> {
        self.repository.fetch(id)?.ok_or(SandboxError::NotFound)
    }

    fn write_lock(&self) -> Result<std::sync::MutexGuard<'_, ()>, SandboxError> {
        self.writes
            .lock()
            .map_err(|_| RepositoryError::Unavailable("write lock poisoned".to_string()).into())
    }
}

/// Error raised by the sandbox service.
#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
    #[error("Not found.")]
    NotFound,
    #[error("{0}")]
    Invalid(String),
    #[error("CSRF Failed: CSRF token missing or incorrect.")]
    Forbidden,
    #[error(transparent)]
    Transition(#[from] InvalidTransition),
    #[error(transparent)]
    Repository(RepositoryError),
}

impl From<RepositoryError> for SandboxError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::NotFound => SandboxError::NotFound,
            other => SandboxError::Repository(other),
        }
    }
}
