use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header::COOKIE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use super::super::domain::{ApplicationId, EvaluationSubmission, Status};
use super::super::http::{CsrfToken, ACTOR_HEADER, CSRF_HEADER};
use super::super::listing::{ListQuery, PipelineFilter};
use super::engine::TransitionPayload;
use super::service::{SandboxError, SandboxService, TransitionCommand};
use super::store::PipelineRepository;

/// Mount point of the HR API inside the sandbox server.
pub const API_PREFIX: &str = "/hr/api";

const DEFAULT_ACTOR: &str = "sandbox-reviewer";

impl IntoResponse for SandboxError {
    fn into_response(self) -> Response {
        let status = match &self {
            SandboxError::NotFound => StatusCode::NOT_FOUND,
            SandboxError::Invalid(_) | SandboxError::Transition(_) => StatusCode::BAD_REQUEST,
            SandboxError::Forbidden => StatusCode::FORBIDDEN,
            SandboxError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

/// Router exposing the recruitment endpoints, with and without trailing slashes.
pub fn sandbox_router<R>(service: Arc<SandboxService<R>>) -> Router
where
    R: PipelineRepository + 'static,
{
    let api = Router::new()
        .route("/applications", get(list_handler::<R>))
        .route("/applications/", get(list_handler::<R>))
        .route("/applications/:id", get(application_handler::<R>))
        .route("/applications/:id/", get(application_handler::<R>))
        .route(
            "/recruitment/:id/transition",
            post(transition_handler::<R>),
        )
        .route(
            "/recruitment/:id/transition/",
            post(transition_handler::<R>),
        )
        .route(
            "/applications/:id/evaluate",
            post(save_evaluation_handler::<R>).patch(finalize_evaluation_handler::<R>),
        )
        .route(
            "/applications/:id/evaluate/",
            post(save_evaluation_handler::<R>).patch(finalize_evaluation_handler::<R>),
        )
        .with_state(service);

    Router::new().nest(API_PREFIX, api)
}

/// Raw `?stage=&status=` parameters; blank values mean "no filter".
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListParams {
    #[serde(default)]
    stage: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

impl ListParams {
    fn into_query(self) -> Result<ListQuery, SandboxError> {
        let filter = match non_blank(self.stage) {
            Some(raw) => raw
                .parse::<PipelineFilter>()
                .map_err(|_| SandboxError::Invalid(format!("Unknown stage filter '{raw}'.")))?,
            None => PipelineFilter::All,
        };
        let status = non_blank(self.status)
            .map(|raw| {
                raw.parse::<Status>()
                    .map_err(|_| SandboxError::Invalid(format!("Unknown status '{raw}'.")))
            })
            .transpose()?;
        Ok(ListQuery { filter, status })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub(crate) async fn list_handler<R>(
    State(service): State<Arc<SandboxService<R>>>,
    Query(params): Query<ListParams>,
) -> Response
where
    R: PipelineRepository + 'static,
{
    match params.into_query().and_then(|query| service.list(&query)) {
        Ok(applications) => (StatusCode::OK, Json(applications)).into_response(),
        Err(err) => {
            warn!(error = %err, "sandbox list refused");
            err.into_response()
        }
    }
}

pub(crate) async fn application_handler<R>(
    State(service): State<Arc<SandboxService<R>>>,
    Path(id): Path<String>,
) -> Response
where
    R: PipelineRepository + 'static,
{
    match service.get(&ApplicationId(id)) {
        Ok(application) => (StatusCode::OK, Json(application)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn transition_handler<R>(
    State(service): State<Arc<SandboxService<R>>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response
where
    R: PipelineRepository + 'static,
{
    let result = verify_csrf(&headers)
        .and_then(|()| json_body(&body))
        .and_then(|body| {
            service.transition(&ApplicationId(id.clone()), transition_command(&body), &actor(&headers))
        });

    match result {
        Ok(application) => (StatusCode::OK, Json(application)).into_response(),
        Err(err) => {
            warn!(application_id = %id, error = %err, "sandbox transition refused");
            err.into_response()
        }
    }
}

pub(crate) async fn save_evaluation_handler<R>(
    State(service): State<Arc<SandboxService<R>>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response
where
    R: PipelineRepository + 'static,
{
    let result = verify_csrf(&headers)
        .and_then(|()| json_body(&body))
        .and_then(|body| {
            serde_json::from_value::<EvaluationSubmission>(body)
                .map_err(|err| SandboxError::Invalid(format!("Invalid evaluation: {err}")))
        })
        .and_then(|submission| service.save_evaluation(&ApplicationId(id.clone()), submission));

    match result {
        Ok(evaluation) => (StatusCode::OK, Json(evaluation)).into_response(),
        Err(err) => {
            warn!(application_id = %id, error = %err, "sandbox evaluation save refused");
            err.into_response()
        }
    }
}

pub(crate) async fn finalize_evaluation_handler<R>(
    State(service): State<Arc<SandboxService<R>>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    R: PipelineRepository + 'static,
{
    let result = verify_csrf(&headers)
        .and_then(|()| service.finalize_evaluation(&ApplicationId(id.clone())));

    match result {
        Ok(evaluation) => (StatusCode::OK, Json(evaluation)).into_response(),
        Err(err) => {
            warn!(application_id = %id, error = %err, "sandbox evaluation finalize refused");
            err.into_response()
        }
    }
}

/// The `X-CSRFToken` header must echo the `csrftoken` cookie.
fn verify_csrf(headers: &HeaderMap) -> Result<(), SandboxError> {
    let cookie_token = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(CsrfToken::from_cookie_header);
    let header_token = headers.get(CSRF_HEADER).and_then(|value| value.to_str().ok());

    match (cookie_token, header_token) {
        (Some(cookie), Some(header)) if cookie.as_str() == header => Ok(()),
        _ => Err(SandboxError::Forbidden),
    }
}

fn json_body(body: &Bytes) -> Result<Value, SandboxError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_slice(body)
        .map_err(|err| SandboxError::Invalid(format!("JSON parse error - {err}")))
}

fn transition_command(body: &Value) -> TransitionCommand {
    TransitionCommand {
        action: body.get("action").and_then(text),
        payload: TransitionPayload {
            interview_date: body.get("interview_date").and_then(text),
        },
    }
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn actor(headers: &HeaderMap) -> String {
    headers
        .get(ACTOR_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(DEFAULT_ACTOR)
        .to_string()
}
