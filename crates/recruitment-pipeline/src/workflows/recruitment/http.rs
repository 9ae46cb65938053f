use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, COOKIE};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use super::actions::TransitionRequest;
use super::api::{ClientError, PipelineApi};
use super::domain::{Application, ApplicationId, Evaluation, EvaluationSubmission};
use super::listing::ListQuery;
use crate::config::ApiConfig;

pub const CSRF_COOKIE: &str = "csrftoken";
pub const CSRF_HEADER: &str = "x-csrftoken";
pub const ACTOR_HEADER: &str = "x-pipeline-actor";

/// Anti-forgery token lifted from the session cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrfToken(String);

impl CsrfToken {
    /// Find `csrftoken=<value>` in a `Cookie` header value.
    pub fn from_cookie_header(cookie: &str) -> Option<Self> {
        cookie
            .split(';')
            .map(str::trim)
            .find_map(|pair| pair.strip_prefix(CSRF_COOKIE)?.strip_prefix('='))
            .filter(|value| !value.is_empty())
            .map(|value| Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Endpoint layout relative to the configured base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRoutes {
    base: String,
    trailing_slash: bool,
}

impl ApiRoutes {
    pub fn new(base: &str, trailing_slash: bool) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
            trailing_slash,
        }
    }

    fn join(&self, path: &str) -> String {
        if self.trailing_slash {
            format!("{}{}/", self.base, path)
        } else {
            format!("{}{}", self.base, path)
        }
    }

    pub fn applications(&self) -> String {
        self.join("/applications")
    }

    pub fn application(&self, id: &ApplicationId) -> String {
        self.join(&format!("/applications/{id}"))
    }

    pub fn transition(&self, id: &ApplicationId) -> String {
        self.join(&format!("/recruitment/{id}/transition"))
    }

    pub fn evaluation(&self, id: &ApplicationId) -> String {
        self.join(&format!("/applications/{id}/evaluate"))
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// `reqwest`-backed transport for the HR backend.
#[derive(Debug, Clone)]
pub struct HttpPipelineApi {
    client: Client,
    routes: ApiRoutes,
    session: HeaderMap,
}

impl HttpPipelineApi {
    pub fn new(config: &ApiConfig) -> Result<Self, ClientError> {
        let client = Client::builder()
            .build()
            .map_err(|err| ClientError::Transport(err.to_string()))?;
        Self::with_client(client, config)
    }

    pub fn with_client(client: Client, config: &ApiConfig) -> Result<Self, ClientError> {
        let mut session = HeaderMap::new();

        if let Some(cookie) = config.cookie.as_deref() {
            session.insert(COOKIE, header_value(cookie)?);
            if let Some(token) = CsrfToken::from_cookie_header(cookie) {
                session.insert(CSRF_HEADER, header_value(token.as_str())?);
            }
        }
        if let Some(actor) = config.actor.as_deref() {
            session.insert(ACTOR_HEADER, header_value(actor)?);
        }

        Ok(Self {
            client,
            routes: ApiRoutes::new(&config.base_url, config.trailing_slash),
            session,
        })
    }

    pub fn routes(&self) -> &ApiRoutes {
        &self.routes
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
        let response = builder
            .header(ACCEPT, "application/json")
            .headers(self.session.clone())
            .send()
            .await
            .map_err(|err| ClientError::Transport(err.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| ClientError::Transport(err.to_string()))?;

        if !status.is_success() {
            return Err(rejection(status, &body));
        }

        serde_json::from_slice(&body).map_err(|err| ClientError::UnexpectedResponse(err.to_string()))
    }
}

fn header_value(raw: &str) -> Result<HeaderValue, ClientError> {
    HeaderValue::from_str(raw)
        .map_err(|_| ClientError::Transport(format!("invalid header value '{raw}'")))
}

fn rejection(status: StatusCode, body: &[u8]) -> ClientError {
    let detail = serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|body| body.detail.or(body.error))
        .unwrap_or_else(|| format!("request failed with status {}", status.as_u16()));

    ClientError::Rejected {
        status: status.as_u16(),
        detail,
    }
}

impl PipelineApi for HttpPipelineApi {
    async fn list_applications(&self, query: &ListQuery) -> Result<Vec<Application>, ClientError> {
        let url = self.routes.applications();
        debug!(%url, filter = %query.filter, status = ?query.status, "listing applications");
        self.send(self.client.get(url).query(&query.query_pairs()))
            .await
    }

    async fn fetch_application(&self, id: &ApplicationId) -> Result<Application, ClientError> {
        let url = self.routes.application(id);
        debug!(%url, "fetching application");
        self.send(self.client.get(url)).await
    }

    async fn transition(
        &self,
        id: &ApplicationId,
        request: &TransitionRequest,
    ) -> Result<Application, ClientError> {
        let url = self.routes.transition(id);
        debug!(%url, action = %request.action, "posting transition");
        self.send(self.client.post(url).json(request)).await
    }

    async fn save_evaluation(
        &self,
        id: &ApplicationId,
        submission: &EvaluationSubmission,
    ) -> Result<Evaluation, ClientError> {
        let url = self.routes.evaluation(id);
        debug!(%url, stage = %submission.stage, "saving evaluation");
        self.send(self.client.post(url).json(submission)).await
    }

    async fn finalize_evaluation(&self, id: &ApplicationId) -> Result<Evaluation, ClientError> {
        let url = self.routes.evaluation(id);
        debug!(%url, "finalizing evaluation");
        self.send(
            self.client
                .patch(url)
                .header(CONTENT_TYPE, "application/json"),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csrf_token_is_read_from_cookie_header() {
        let token = CsrfToken::from_cookie_header("sessionid=abc; csrftoken=tok-123; theme=dark")
            .expect("token present");
        assert_eq!(token.as_str(), "tok-123");
        assert!(CsrfToken::from_cookie_header("sessionid=abc").is_none());
        assert!(CsrfToken::from_cookie_header("csrftoken=").is_none());
        assert!(CsrfToken::from_cookie_header("csrftokenx=1").is_none());
    }

    #[test]
    fn routes_follow_trailing_slash_setting() {
        let id = ApplicationId::new("42");
        let slashed = ApiRoutes::new("http://hr.local/hr/api/", true);
        assert_eq!(
            slashed.transition(&id),
            "http://hr.local/hr/api/recruitment/42/transition/"
        );
        let bare = ApiRoutes::new("http://hr.local/hr/api", false);
        assert_eq!(bare.application(&id), "http://hr.local/hr/api/applications/42");
        assert_eq!(slashed.applications(), "http://hr.local/hr/api/applications/");
        assert_eq!(bare.evaluation(&id), "http://hr.local/hr/api/applications/42/evaluate");
    }

    #[test]
    fn rejection_prefers_detail_message() {
        let err = rejection(StatusCode::BAD_REQUEST, br#"{"detail":"Interview date is required."}"#);
        assert_eq!(
            err,
            ClientError::Rejected {
                status: 400,
                detail: "Interview date is required.".to_string()
            }
        );

        let err = rejection(StatusCode::BAD_GATEWAY, b"<html>bad gateway</html>");
        assert_eq!(err.to_string(), "request failed with status 502");
    }

    #[test]
    fn session_headers_carry_csrf_token() {
        let config = crate::config::ApiConfig::new("http://hr.local/hr/api")
            .with_cookie("csrftoken=tok; sessionid=s1")
            .with_actor("Dana Reviewer");
        let api = HttpPipelineApi::new(&config).expect("client builds");
        assert_eq!(
            api.session.get(CSRF_HEADER).and_then(|v| v.to_str().ok()),
            Some("tok")
        );
        assert_eq!(
            api.session.get(COOKIE).and_then(|v| v.to_str().ok()),
            Some("csrftoken=tok; sessionid=s1")
        );
        assert!(api.session.contains_key(ACTOR_HEADER));
    }
}
