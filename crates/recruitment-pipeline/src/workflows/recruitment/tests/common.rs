use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::workflows::recruitment::actions::TransitionRequest;
use crate::workflows::recruitment::api::{ClientError, PipelineApi};
use crate::workflows::recruitment::domain::{
    Application, ApplicationId, Criterion, Evaluation, EvaluationSubmission, Score, Stage, Status,
};
use crate::workflows::recruitment::listing::ListQuery;
use crate::workflows::recruitment::sandbox::{
    sandbox_router, InMemoryPipelineRepository, SandboxService,
};
use crate::workflows::recruitment::scoring::ScoreThresholds;
use crate::workflows::recruitment::view::{Region, RegionContent, RenderSurface, TextSurface};

pub(crate) const APPLICATION_ID: &str = "7";

pub(crate) fn id() -> ApplicationId {
    ApplicationId::new(APPLICATION_ID)
}

pub(crate) fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, day, hour, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(crate) fn score(value: u8) -> Score {
    Score::new(value).expect("score within range")
}

pub(crate) fn application(stage: Stage, status: Status) -> Application {
    let mut application = Application::submitted(id());
    application.first_name = Some("Amara".to_string());
    application.last_name = Some("Okafor".to_string());
    application.email = Some("amara.okafor@example.com".to_string());
    application.role_applied_for = Some("Branch Operations Lead".to_string());
    application.current_stage = stage;
    application.status = status;
    application
}

/// Evaluation with every criterion rated `value`.
pub(crate) fn evaluation(stage: Stage, value: u8, finalized: bool) -> Evaluation {
    let mut evaluation = Evaluation::blank(stage);
    for criterion in Criterion::ALL {
        evaluation.criteria.entry(criterion).or_default().score = Some(score(value));
    }
    evaluation.weighted_score = Some(f64::from(value) * 2.0);
    evaluation.is_finalized = finalized;
    evaluation.created_at = Some(at(2, 9));
    evaluation
}

pub(crate) fn screening_application(finalized: bool) -> Application {
    let mut application = application(Stage::Screening, Status::Active);
    application.assigned_reviewer = Some("Dana Reviewer".to_string());
    application.evaluation = Some(evaluation(Stage::Screening, 4, finalized));
    application
}

pub(crate) fn full_submission(stage: Stage, value: u8) -> EvaluationSubmission {
    Criterion::ALL
        .into_iter()
        .fold(EvaluationSubmission::new(stage), |submission, criterion| {
            submission.with_score(criterion, score(value))
        })
}

/// Transport double answering from queued responses and recording each call.
#[derive(Default)]
pub(crate) struct ScriptedApi {
    fetches: Mutex<VecDeque<Result<Application, ClientError>>>,
    transitions: Mutex<VecDeque<Result<Application, ClientError>>>,
    saves: Mutex<VecDeque<Result<Evaluation, ClientError>>>,
    finalizes: Mutex<VecDeque<Result<Evaluation, ClientError>>>,
    calls: Mutex<Vec<String>>,
    requests: Mutex<Vec<Value>>,
}

impl ScriptedApi {
    pub(crate) fn push_fetch(&self, response: Result<Application, ClientError>) {
        self.fetches.lock().expect("fetch queue").push_back(response);
    }

    pub(crate) fn push_transition(&self, response: Result<Application, ClientError>) {
        self.transitions
            .lock()
            .expect("transition queue")
            .push_back(response);
    }

    pub(crate) fn push_save(&self, response: Result<Evaluation, ClientError>) {
        self.saves.lock().expect("save queue").push_back(response);
    }

    pub(crate) fn push_finalize(&self, response: Result<Evaluation, ClientError>) {
        self.finalizes
            .lock()
            .expect("finalize queue")
            .push_back(response);
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("call log").clone()
    }

    /// JSON bodies sent to the transition and evaluation endpoints, in order.
    pub(crate) fn requests(&self) -> Vec<Value> {
        self.requests.lock().expect("request log").clone()
    }

    fn record(&self, call: String, body: Option<Value>) {
        self.calls.lock().expect("call log").push(call);
        if let Some(body) = body {
            self.requests.lock().expect("request log").push(body);
        }
    }
}

fn next<T>(queue: &Mutex<VecDeque<Result<T, ClientError>>>) -> Result<T, ClientError> {
    queue
        .lock()
        .expect("response queue")
        .pop_front()
        .unwrap_or_else(|| Err(ClientError::Transport("no scripted response".to_string())))
}

impl PipelineApi for ScriptedApi {
    async fn list_applications(&self, query: &ListQuery) -> Result<Vec<Application>, ClientError> {
        self.record(format!("list {}", query.filter), None);
        Err(ClientError::Transport("no scripted listing".to_string()))
    }

    async fn fetch_application(&self, id: &ApplicationId) -> Result<Application, ClientError> {
        self.record(format!("fetch {id}"), None);
        next(&self.fetches)
    }

    async fn transition(
        &self,
        id: &ApplicationId,
        request: &TransitionRequest,
    ) -> Result<Application, ClientError> {
        let body = serde_json::to_value(request).expect("request serializes");
        self.record(format!("transition {id} {}", request.action), Some(body));
        next(&self.transitions)
    }

    async fn save_evaluation(
        &self,
        id: &ApplicationId,
        submission: &EvaluationSubmission,
    ) -> Result<Evaluation, ClientError> {
        let body = serde_json::to_value(submission).expect("submission serializes");
        self.record(format!("save {id} {}", submission.stage), Some(body));
        next(&self.saves)
    }

    async fn finalize_evaluation(&self, id: &ApplicationId) -> Result<Evaluation, ClientError> {
        self.record(format!("finalize {id}"), None);
        next(&self.finalizes)
    }
}

/// Text surface that also keeps every region write, oldest first.
#[derive(Default)]
pub(crate) struct RecordingSurface {
    pub(crate) inner: TextSurface,
    pub(crate) writes: Vec<(Region, RegionContent)>,
}

impl RecordingSurface {
    pub(crate) fn action_panels(&self) -> Vec<&RegionContent> {
        self.writes
            .iter()
            .filter(|(region, _)| *region == Region::ActionPanel)
            .map(|(_, content)| content)
            .collect()
    }
}

impl RenderSurface for RecordingSurface {
    fn has_region(&self, region: Region) -> bool {
        self.inner.has_region(region)
    }

    fn replace(&mut self, region: Region, content: RegionContent) {
        self.writes.push((region, content.clone()));
        self.inner.replace(region, content);
    }
}

pub(crate) fn rejected(detail: &str) -> ClientError {
    ClientError::Rejected {
        status: 400,
        detail: detail.to_string(),
    }
}

pub(crate) fn sandbox_service() -> Arc<SandboxService<InMemoryPipelineRepository>> {
    Arc::new(SandboxService::new(
        Arc::new(InMemoryPipelineRepository::new()),
        ScoreThresholds::default(),
    ))
}

pub(crate) fn seeded_sandbox() -> Arc<SandboxService<InMemoryPipelineRepository>> {
    let service = sandbox_service();
    service
        .seed([application(Stage::Submitted, Status::Active)])
        .expect("seed succeeds");
    service
}

pub(crate) fn router(service: Arc<SandboxService<InMemoryPipelineRepository>>) -> axum::Router {
    sandbox_router(service)
}

pub(crate) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
