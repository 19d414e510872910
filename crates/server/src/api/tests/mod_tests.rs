use super::*;
use axum::{
    body::{self, Body},
    http::{header, Request},
};
use shared::{
    domain::SubmissionStatus,
    protocol::{NoticeLevel, SessionEvent},
};
use storage::{seed, SubmissionReader, SubmissionStore};
use tower::ServiceExt;

fn test_app() -> Router {
    let mut store = SubmissionStore::new();
    seed::seed_demo(&mut store).expect("seed");
    let state = Arc::new(AppState::with_store(store, 16));
    routes().with_state(state)
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

async fn read_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

#[test]
fn error_codes_map_to_http_statuses() {
    assert_eq!(status_for(ErrorCode::Validation), StatusCode::BAD_REQUEST);
    assert_eq!(
        status_for(ErrorCode::InvalidStatus),
        StatusCode::UNPROCESSABLE_ENTITY
    );
    assert_eq!(status_for(ErrorCode::NotFound), StatusCode::NOT_FOUND);
    assert_eq!(
        status_for(ErrorCode::Internal),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[test]
fn blank_range_means_all_time() {
    assert_eq!(parse_range(None).expect("range"), TimeRange::All);
    assert_eq!(parse_range(Some(" ")).expect("range"), TimeRange::All);
    assert!(parse_range(Some("last-week")).is_err());
}

#[tokio::test]
async fn add_then_fetch_submission() {
    let app = test_app();
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/submissions",
            serde_json::json!({
                "title": "T1",
                "journal": "J1",
                "authors": "A, B",
                "status": "Submitted"
            }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: SubmissionRecord = read_json(response).await;
    assert_eq!(created.authors, vec!["A", "B"]);
    assert_eq!(created.status_history.len(), 1);
    assert_eq!(created.status_history[0].status, SubmissionStatus::Submitted);

    let fetch = Request::get(format!("/api/submissions/{}", created.id))
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(fetch).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let fetched: SubmissionRecord = read_json(response).await;
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn add_without_title_is_bad_request() {
    let app = test_app();
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/submissions",
            serde_json::json!({ "title": "", "journal": "J1" }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error: ApiError = read_json(response).await;
    assert_eq!(error.code, ErrorCode::Validation);
}

#[tokio::test]
async fn add_with_omitted_fields_reaches_store_validation() {
    let mut store = SubmissionStore::new();
    seed::seed_demo(&mut store).expect("seed");
    let state = Arc::new(AppState::with_store(store, 16));
    let mut events = state.events.subscribe();
    let app = routes().with_state(state.clone());

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/submissions",
            serde_json::json!({ "journal": "J1" }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error: ApiError = read_json(response).await;
    assert_eq!(error.code, ErrorCode::Validation);
    assert!(error.message.contains("title"));
    match events.try_recv().expect("notice") {
        SessionEvent::Notice(notice) => assert_eq!(notice.level, NoticeLevel::Error),
        other => panic!("unexpected event {other:?}"),
    }

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/submissions",
            serde_json::json!({ "title": "T", "journal": "J1", "status": "Withdrawn" }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let error: ApiError = read_json(response).await;
    assert_eq!(error.code, ErrorCode::InvalidStatus);
    assert_eq!(state.session.lock().await.reader().len(), 2);
    assert!(state.notifier.take_flash().is_none());
}

#[tokio::test]
async fn status_change_validates_and_appends() {
    let app = test_app();
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/submissions/2/status",
            serde_json::json!({ "status": "Accepted", "notes": "congratulations" }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let record: SubmissionRecord = read_json(response).await;
    assert_eq!(record.status, SubmissionStatus::Accepted);
    assert_eq!(record.status_history.len(), 4);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/submissions/2/status",
            serde_json::json!({ "status": "accepted" }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/submissions/missing/status",
            serde_json::json!({ "status": "Accepted" }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_removes_from_filtered_view() {
    let app = test_app();
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/view/filter",
            serde_json::json!({ "status": "UnderReview" }),
        ))
        .await
        .expect("response");
    let view: SubmissionView = read_json(response).await;
    assert_eq!(view.submissions.len(), 1);

    let delete = Request::delete("/api/submissions/1")
        .body(Body::empty())
        .expect("request");
    let response = app.clone().oneshot(delete).await.expect("response");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let again = Request::delete("/api/submissions/1")
        .body(Body::empty())
        .expect("request");
    let response = app.clone().oneshot(again).await.expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let list = Request::get("/api/submissions")
        .body(Body::empty())
        .expect("request");
    let view: SubmissionView = read_json(app.oneshot(list).await.expect("response")).await;
    assert!(view.submissions.is_empty());
}

#[tokio::test]
async fn sort_endpoint_toggles_direction() {
    let app = test_app();
    let first: SubmissionView = read_json(
        app.clone()
            .oneshot(json_request(
                "POST",
                "/api/view/sort",
                serde_json::json!({ "key": "title" }),
            ))
            .await
            .expect("response"),
    )
    .await;
    assert_eq!(first.submissions[0].id.as_str(), "2");

    let second: SubmissionView = read_json(
        app.clone()
            .oneshot(json_request(
                "POST",
                "/api/view/sort",
                serde_json::json!({ "key": "title" }),
            ))
            .await
            .expect("response"),
    )
    .await;
    assert_eq!(second.submissions[0].id.as_str(), "1");

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/view/sort",
            serde_json::json!({ "key": "status" }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn statistics_endpoint_reports_counts() {
    let app = test_app();
    let request = Request::get("/api/statistics")
        .body(Body::empty())
        .expect("request");
    let response = app.clone().oneshot(request).await.expect("response");
    let summary: StatisticsSummary = read_json(response).await;
    assert_eq!(summary.total, 2);
    assert_eq!(summary.by_status.len(), SubmissionStatus::ALL.len());
    assert_eq!(summary.by_status[1].percentage, 50.0);

    let request = Request::get("/api/statistics?range=2023-13")
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_stub_toggles_flag() {
    let app = test_app();
    let login = Request::post("/api/session/login")
        .body(Body::empty())
        .expect("request");
    let response = app.clone().oneshot(login).await.expect("response");
    let status: SessionStatus = read_json(response).await;
    assert!(status.authenticated);

    let logout = Request::post("/api/session/logout")
        .body(Body::empty())
        .expect("request");
    let status: SessionStatus = read_json(app.oneshot(logout).await.expect("response")).await;
    assert!(!status.authenticated);
}
