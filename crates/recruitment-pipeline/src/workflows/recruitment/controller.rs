use std::sync::Arc;

use tracing::{info, warn};

use super::actions::{
    build_request, compute_actions, is_enabled, ActionInput, PipelineAction, TransitionRequest,
};
use super::api::{ClientError, PipelineApi};
use super::domain::{
    Application, ApplicationId, Criterion, Evaluation, EvaluationSubmission, Score, Stage,
};
use super::draft::EvaluationDraft;
use super::view::{
    BindingError, ControlId, Notice, PipelineRenderer, PipelineScreen, RenderSurface, UiState,
};

/// Single holder of the loaded application and the UI state around it.
///
/// The application is only ever replaced by a server response; the controller never advances
/// a stage or status on its own.
pub struct PipelineController<A, S> {
    api: Arc<A>,
    renderer: PipelineRenderer<S>,
    application: Option<Application>,
    draft: Option<EvaluationDraft>,
    in_flight: Option<ControlId>,
    notice: Option<Notice>,
}

impl<A, S> PipelineController<A, S>
where
    A: PipelineApi,
    S: RenderSurface,
{
    pub fn new(api: Arc<A>, surface: S) -> Result<Self, BindingError> {
        Ok(Self::with_renderer(api, PipelineRenderer::bind(surface)?))
    }

    pub fn with_renderer(api: Arc<A>, renderer: PipelineRenderer<S>) -> Self {
        Self {
            api,
            renderer,
            application: None,
            draft: None,
            in_flight: None,
            notice: None,
        }
    }

    pub fn application(&self) -> Option<&Application> {
        self.application.as_ref()
    }

    pub fn draft(&self) -> Option<&EvaluationDraft> {
        self.draft.as_ref()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn in_flight(&self) -> Option<ControlId> {
        self.in_flight
    }

    pub fn surface(&self) -> &S {
        self.renderer.surface()
    }

    pub fn screen(&self) -> Option<PipelineScreen> {
        self.application.as_ref().map(|application| {
            PipelineScreen::compose(
                application,
                UiState {
                    draft: self.draft.as_ref(),
                    in_flight: self.in_flight,
                    notice: self.notice.as_ref(),
                },
            )
        })
    }

    /// Rebuilds every bound region from current state. Nothing is drawn before the first load.
    pub fn render(&mut self) {
        if let Some(screen) = self.screen() {
            self.renderer.render(&screen);
        }
    }

    pub async fn load(&mut self, id: &ApplicationId) -> Result<&Application, ClientError> {
        match self.api.fetch_application(id).await {
            Ok(application) => {
                info!(application_id = %id, stage = %application.current_stage, status = %application.status, "application loaded");
                self.adopt(application);
                self.notice = None;
                self.render();
                self.application.as_ref().ok_or(ClientError::NotLoaded)
            }
            Err(err) => {
                warn!(application_id = %id, error = %err, "failed to load application");
                Err(self.surface_error(err))
            }
        }
    }

    /// Local score edit. Re-renders so the weighted score follows the draft.
    pub fn set_score(&mut self, criterion: Criterion, score: Option<Score>) -> Result<(), ClientError> {
        self.ensure_editable()?;
        if let Some(draft) = self.draft.as_mut() {
            draft.set_score(criterion, score);
        }
        self.render();
        Ok(())
    }

    pub fn set_notes(&mut self, criterion: Criterion, notes: impl Into<String>) -> Result<(), ClientError> {
        self.ensure_editable()?;
        if let Some(draft) = self.draft.as_mut() {
            draft.set_notes(criterion, notes);
        }
        self.render();
        Ok(())
    }

    /// Saves the local draft for the current stage.
    pub async fn save_draft(&mut self) -> Result<Evaluation, ClientError> {
        let submission = self
            .draft
            .as_ref()
            .map(EvaluationDraft::to_submission)
            .ok_or(ClientError::NotLoaded)?;
        self.submit_evaluation(submission).await
    }

    /// Persists an evaluation. The panel only changes once the server returns the saved copy.
    pub async fn submit_evaluation(
        &mut self,
        submission: EvaluationSubmission,
    ) -> Result<Evaluation, ClientError> {
        let id = match self.check_evaluation_target(submission.stage) {
            Ok(id) => id,
            Err(err) => return Err(self.surface_error(err)),
        };

        self.begin(ControlId::SaveEvaluation)?;
        let result = self.api.save_evaluation(&id, &submission).await;
        self.finish();

        match result {
            Ok(evaluation) => {
                info!(application_id = %id, stage = %evaluation.stage, weighted_score = ?evaluation.weighted_score, "evaluation saved");
                self.accept_evaluation(evaluation.clone(), Notice::info("Evaluation saved."));
                Ok(evaluation)
            }
            Err(err) => {
                warn!(application_id = %id, stage = %submission.stage, error = %err, "evaluation save failed");
                Err(self.surface_error(err))
            }
        }
    }

    /// Locks the saved evaluation. On success the scoring controls turn read-only and the gated
    /// forward action becomes available.
    ///
    /// Refused locally while the draft holds unsaved edits or nothing has been saved yet.
    pub async fn finalize_evaluation(&mut self, stage: Stage) -> Result<Evaluation, ClientError> {
        let id = match self.check_finalize_target(stage) {
            Ok(id) => id,
            Err(err) => return Err(self.surface_error(err)),
        };

        self.begin(ControlId::FinalizeEvaluation)?;
        let result = self.api.finalize_evaluation(&id).await;
        self.finish();

        match result {
            Ok(evaluation) => {
                info!(application_id = %id, stage = %evaluation.stage, "evaluation finalized");
                self.accept_evaluation(evaluation.clone(), Notice::info("Evaluation finalized."));
                Ok(evaluation)
            }
            Err(err) => {
                warn!(application_id = %id, stage = %stage, error = %err, "evaluation finalize failed");
                Err(self.surface_error(err))
            }
        }
    }

    /// Sends `{action, ...payload}` and adopts the returned record.
    ///
    /// On failure the record is left alone and the control is re-enabled. Any failure after the
    /// request went out triggers a reload; the reloaded record is adopted only if it differs
    /// from what is shown.
    pub async fn perform_transition(
        &mut self,
        action: PipelineAction,
        input: &ActionInput,
    ) -> Result<Application, ClientError> {
        let (id, request) = match self.prepare_transition(action, input) {
            Ok(prepared) => prepared,
            Err(err) => return Err(self.surface_error(err)),
        };

        self.begin(ControlId::Action(action))?;
        let result = self.api.transition(&id, &request).await;
        self.finish();

        match result {
            Ok(application) => {
                info!(
                    application_id = %id,
                    action = %action,
                    stage = %application.current_stage,
                    status = %application.status,
                    "transition applied"
                );
                self.adopt(application.clone());
                self.notice = Some(Notice::info(format!("{} completed.", action.label())));
                self.render();
                Ok(application)
            }
            Err(err) => {
                warn!(application_id = %id, action = %action, error = %err, "transition rejected");
                if err.reached_server() {
                    self.reconcile(&id).await;
                }
                Err(self.surface_error(err))
            }
        }
    }

    /// Clears a control left in flight by a request future that was dropped before completion.
    pub fn reset_in_flight(&mut self) {
        if self.in_flight.take().is_some() {
            self.render();
        }
    }

    fn prepare_transition(
        &self,
        action: PipelineAction,
        input: &ActionInput,
    ) -> Result<(ApplicationId, TransitionRequest), ClientError> {
        let application = self.application.as_ref().ok_or(ClientError::NotLoaded)?;

        if !compute_actions(application.current_stage, application.status).contains(action) {
            return Err(ClientError::ActionUnavailable(action));
        }
        if !is_enabled(action, application) {
            return Err(ClientError::EvaluationRequired {
                action,
                stage: action.gating_stage().unwrap_or(application.current_stage),
            });
        }

        let request = build_request(action, input)?;
        Ok((application.id.clone(), request))
    }

    fn check_evaluation_target(&self, stage: Stage) -> Result<ApplicationId, ClientError> {
        let application = self.application.as_ref().ok_or(ClientError::NotLoaded)?;

        if stage != application.current_stage {
            return Err(ClientError::StageMismatch {
                requested: stage,
                current: application.current_stage,
            });
        }
        if !stage.requires_evaluation() {
            return Err(ClientError::NotScored(stage));
        }
        if application.current_evaluation_finalized() {
            return Err(ClientError::EvaluationLocked(stage));
        }
        Ok(application.id.clone())
    }

    fn check_finalize_target(&self, stage: Stage) -> Result<ApplicationId, ClientError> {
        let id = self.check_evaluation_target(stage)?;
        let saved = self
            .application
            .as_ref()
            .and_then(Application::current_evaluation)
            .is_some();
        let dirty = self.draft.as_ref().is_some_and(EvaluationDraft::is_dirty);
        if !saved || dirty {
            return Err(ClientError::UnsavedChanges(stage));
        }
        Ok(id)
    }

    fn ensure_editable(&self) -> Result<(), ClientError> {
        if self.in_flight.is_some() {
            return Err(ClientError::Busy);
        }
        let application = self.application.as_ref().ok_or(ClientError::NotLoaded)?;
        let stage = application.current_stage;
        if !stage.requires_evaluation() {
            return Err(ClientError::NotScored(stage));
        }
        if application.current_evaluation_finalized() || application.is_terminal() {
            return Err(ClientError::EvaluationLocked(stage));
        }
        Ok(())
    }

    async fn reconcile(&mut self, id: &ApplicationId) {
        match self.api.fetch_application(id).await {
            Ok(fresh) if self.application.as_ref() != Some(&fresh) => {
                info!(application_id = %id, stage = %fresh.current_stage, status = %fresh.status, "record changed on the server; reloading");
                self.adopt(fresh);
            }
            Ok(_) => {}
            Err(err) => {
                warn!(application_id = %id, error = %err, "reload after rejection failed");
            }
        }
    }

    fn begin(&mut self, control: ControlId) -> Result<(), ClientError> {
        if self.in_flight.is_some() {
            return Err(ClientError::Busy);
        }
        self.in_flight = Some(control);
        self.notice = None;
        self.render();
        Ok(())
    }

    fn finish(&mut self) {
        self.in_flight = None;
    }

    fn adopt(&mut self, application: Application) {
        self.draft = Some(EvaluationDraft::hydrate(
            application.current_stage,
            application.current_evaluation(),
        ));
        self.application = Some(application);
    }

    fn accept_evaluation(&mut self, evaluation: Evaluation, notice: Notice) {
        if let Some(application) = self.application.as_mut() {
            self.draft = Some(EvaluationDraft::hydrate(
                application.current_stage,
                Some(&evaluation),
            ));
            application.evaluation = Some(evaluation);
        }
        self.notice = Some(notice);
        self.render();
    }

    fn surface_error(&mut self, err: ClientError) -> ClientError {
        self.notice = Some(Notice::error(err.to_string()));
        self.render();
        err
    }
}
