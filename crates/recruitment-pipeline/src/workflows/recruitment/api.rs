use std::future::Future;

use super::actions::{MissingPayload, PipelineAction, TransitionRequest};
use super::domain::{Application, ApplicationId, Evaluation, EvaluationSubmission, Stage};
use super::listing::ListQuery;

/// Transport abstraction so the controller can be exercised without a live backend.
pub trait PipelineApi: Send + Sync {
    /// `GET /applications?stage=..&status=..`
    fn list_applications(
        &self,
        query: &ListQuery,
    ) -> impl Future<Output = Result<Vec<Application>, ClientError>> + Send;

    /// `GET /applications/{id}`
    fn fetch_application(
        &self,
        id: &ApplicationId,
    ) -> impl Future<Output = Result<Application, ClientError>> + Send;

    /// `POST /recruitment/{id}/transition`
    fn transition(
        &self,
        id: &ApplicationId,
        request: &TransitionRequest,
    ) -> impl Future<Output = Result<Application, ClientError>> + Send;

    /// `POST /applications/{id}/evaluate`
    fn save_evaluation(
        &self,
        id: &ApplicationId,
        submission: &EvaluationSubmission,
    ) -> impl Future<Output = Result<Evaluation, ClientError>> + Send;

    /// `PATCH /applications/{id}/evaluate`
    fn finalize_evaluation(
        &self,
        id: &ApplicationId,
    ) -> impl Future<Output = Result<Evaluation, ClientError>> + Send;
}

/// Everything that can go wrong between a user trigger and a confirmed response.
///
/// The first three variants come back from the wire; the rest are refusals raised before any
/// request is sent.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClientError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("{detail}")]
    Rejected { status: u16, detail: String },
    #[error("unexpected response from server: {0}")]
    UnexpectedResponse(String),
    #[error("no application is loaded")]
    NotLoaded,
    #[error("'{0}' is not available in the current state")]
    ActionUnavailable(PipelineAction),
    #[error("finalize the {stage} evaluation before '{action}'")]
    EvaluationRequired {
        action: PipelineAction,
        stage: Stage,
    },
    #[error(transparent)]
    MissingPayload(#[from] MissingPayload),
    #[error("the {0} evaluation is finalized and can no longer be edited")]
    EvaluationLocked(Stage),
    #[error("evaluation is for {requested} but the application is in {current}")]
    StageMismatch { requested: Stage, current: Stage },
    #[error("the {0} stage is not scored")]
    NotScored(Stage),
    #[error("save the {0} evaluation before finalizing it")]
    UnsavedChanges(Stage),
    #[error("another request is still in progress")]
    Busy,
}

impl ClientError {
    /// The request went out, so the server may have applied it even though we saw a failure.
    pub fn reached_server(&self) -> bool {
        matches!(
            self,
            ClientError::Transport(_)
                | ClientError::Rejected { .. }
                | ClientError::UnexpectedResponse(_)
        )
    }
}
