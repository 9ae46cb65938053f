use super::common::*;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

const COOKIE: &str = "sessionid=s1; csrftoken=tok-123";

fn request(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::COOKIE, COOKIE)
        .header("x-csrftoken", "tok-123")
        .header("x-pipeline-actor", "Dana Reviewer");
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request builds"),
        None => builder.body(Body::empty()).expect("request builds"),
    }
}

#[tokio::test]
async fn application_route_returns_the_record() {
    let response = router(seeded_sandbox())
        .oneshot(request(Method::GET, "/hr/api/applications/7/", None))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["id"], "7");
    assert_eq!(payload["current_stage"], "submitted");
    assert_eq!(payload["status"], "active");
    assert_eq!(payload["evaluation"], Value::Null);
}

#[tokio::test]
async fn list_route_applies_stage_and_status_filters() {
    let app = router(seeded_sandbox());

    let response = app
        .clone()
        .oneshot(request(Method::GET, "/hr/api/applications/", None))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload.as_array().map(Vec::len), Some(1));
    assert_eq!(payload[0]["id"], "7");

    let response = app
        .clone()
        .oneshot(request(
            Method::GET,
            "/hr/api/applications?stage=submitted&status=active",
            None,
        ))
        .await
        .expect("route executes");
    assert_eq!(read_json_body(response).await.as_array().map(Vec::len), Some(1));

    let response = app
        .clone()
        .oneshot(request(Method::GET, "/hr/api/applications?stage=onboarding", None))
        .await
        .expect("route executes");
    assert_eq!(read_json_body(response).await, json!([]));

    let response = app
        .oneshot(request(Method::GET, "/hr/api/applications?status=archived", None))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        read_json_body(response).await,
        json!({"detail": "Unknown status 'archived'."})
    );
}

#[tokio::test]
async fn unknown_application_is_not_found() {
    let response = router(seeded_sandbox())
        .oneshot(request(Method::GET, "/hr/api/applications/404", None))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(read_json_body(response).await, json!({"detail": "Not found."}));
}

#[tokio::test]
async fn transition_without_csrf_token_is_forbidden() {
    let response = router(seeded_sandbox())
        .oneshot(
            Request::post("/hr/api/recruitment/7/transition/")
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::COOKIE, COOKIE)
                .body(Body::from(json!({"action": "start_screening"}).to_string()))
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let payload = read_json_body(response).await;
    assert_eq!(payload["detail"], "CSRF Failed: CSRF token missing or incorrect.");
}

#[tokio::test]
async fn transition_route_applies_actions() {
    let response = router(seeded_sandbox())
        .oneshot(request(
            Method::POST,
            "/hr/api/recruitment/7/transition/",
            Some(json!({"action": "start_screening"})),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["current_stage"], "screening");
    assert_eq!(payload["assigned_reviewer"], "Dana Reviewer");
    assert_eq!(payload["transition_logs"][0]["action"], "start_screening");
}

#[tokio::test]
async fn transition_route_reports_refusals_as_detail() {
    let service = seeded_sandbox();

    let missing = router(service.clone())
        .oneshot(request(
            Method::POST,
            "/hr/api/recruitment/7/transition",
            Some(json!({})),
        ))
        .await
        .expect("route executes");
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json_body(missing).await, json!({"detail": "Action is required."}));

    let unknown = router(service.clone())
        .oneshot(request(
            Method::POST,
            "/hr/api/recruitment/7/transition",
            Some(json!({"action": "fast_track"})),
        ))
        .await
        .expect("route executes");
    assert_eq!(unknown.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        read_json_body(unknown).await,
        json!({"detail": "Unknown action 'fast_track'."})
    );

    let out_of_order = router(service)
        .oneshot(request(
            Method::POST,
            "/hr/api/recruitment/7/transition",
            Some(json!({"action": "approve"})),
        ))
        .await
        .expect("route executes");
    assert_eq!(out_of_order.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        read_json_body(out_of_order).await,
        json!({"detail": "Approval only allowed from decision stage."})
    );
}

#[tokio::test]
async fn evaluation_routes_save_and_finalize() {
    let service = seeded_sandbox();
    service
        .transition(
            &id(),
            crate::workflows::recruitment::sandbox::TransitionCommand {
                action: Some("start_screening".to_string()),
                payload: Default::default(),
            },
            "dana",
        )
        .expect("screening starts");

    let saved = router(service.clone())
        .oneshot(request(
            Method::POST,
            "/hr/api/applications/7/evaluate/",
            Some(json!({
                "stage": "screening",
                "career_score": 4,
                "career_notes": "steady",
                "experience_score": 5,
                "stability_score": 3,
                "education_score": 4,
                "skills_score": 4
            })),
        ))
        .await
        .expect("route executes");
    assert_eq!(saved.status(), StatusCode::OK);
    let payload = read_json_body(saved).await;
    assert_eq!(payload["weighted_score"], 8.0);
    assert_eq!(payload["is_finalized"], false);
    assert_eq!(payload["career_notes"], "steady");

    let finalized = router(service.clone())
        .oneshot(request(Method::PATCH, "/hr/api/applications/7/evaluate/", None))
        .await
        .expect("route executes");
    assert_eq!(finalized.status(), StatusCode::OK);
    assert_eq!(read_json_body(finalized).await["is_finalized"], true);

    let fetched = router(service)
        .oneshot(request(Method::GET, "/hr/api/applications/7", None))
        .await
        .expect("route executes");
    let payload = read_json_body(fetched).await;
    assert_eq!(payload["evaluation"]["stage"], "screening");
    assert_eq!(payload["evaluation"]["is_finalized"], true);
}

#[tokio::test]
async fn out_of_range_scores_are_rejected() {
    let service = seeded_sandbox();
    service
        .transition(
            &id(),
            crate::workflows::recruitment::sandbox::TransitionCommand {
                action: Some("start_screening".to_string()),
                payload: Default::default(),
            },
            "dana",
        )
        .expect("screening starts");

    let response = router(service)
        .oneshot(request(
            Method::POST,
            "/hr/api/applications/7/evaluate",
            Some(json!({"stage": "screening", "career_score": 9})),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    assert!(payload["detail"]
        .as_str()
        .expect("detail string")
        .starts_with("Invalid evaluation"));
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let response = router(seeded_sandbox())
        .oneshot(
            Request::post("/hr/api/recruitment/7/transition")
                .header(header::COOKIE, COOKIE)
                .header("x-csrftoken", "tok-123")
                .body(Body::from("{not json"))
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
