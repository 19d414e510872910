use std::sync::Arc;

use axum::{
    extract::{Path, Query, State, WebSocketUpgrade},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use shared::{
    domain::{SubmissionId, SubmissionRecord},
    error::{ApiError, ErrorCode},
    protocol::{
        ChangeStatusRequest, FilterRequest, NewSubmission, SessionStatus, SortRequest,
        StatisticsSummary, SubmissionView, TimeRange,
    },
};
use tracing::debug;

use crate::app_state::AppState;

pub(crate) type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

#[derive(Debug, Deserialize)]
pub(crate) struct RangeQuery {
    pub(crate) range: Option<String>,
}

pub(crate) fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::InvalidStatus => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub(crate) fn reject(error: ApiError) -> (StatusCode, Json<ApiError>) {
    (status_for(error.code), Json(error))
}

pub(crate) fn parse_range(raw: Option<&str>) -> Result<TimeRange, ApiError> {
    match raw.map(str::trim).filter(|r| !r.is_empty()) {
        Some(raw) => raw.parse::<TimeRange>().map_err(ApiError::from),
        None => Ok(TimeRange::All),
    }
}

pub(crate) fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/submissions",
            get(http_current_view).post(http_add_submission),
        )
        .route(
            "/api/submissions/:id",
            get(http_get_submission).delete(http_remove_submission),
        )
        .route("/api/submissions/:id/status", post(http_change_status))
        .route("/api/view/filter", post(http_set_filter))
        .route("/api/view/sort", post(http_request_sort))
        .route("/api/statistics", get(http_statistics))
        .route("/api/session/login", post(http_login))
        .route("/api/session/logout", post(http_logout))
        .route("/ws", get(ws_handler))
}

async fn http_current_view(State(state): State<Arc<AppState>>) -> Json<SubmissionView> {
    let session = state.session.lock().await;
    Json(session.current_view())
}

async fn http_get_submission(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<SubmissionRecord>> {
    let session = state.session.lock().await;
    let record = session.get(&SubmissionId(id)).map_err(reject)?;
    Ok(Json(record))
}

async fn http_add_submission(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewSubmission>,
) -> ApiResult<(StatusCode, Json<SubmissionRecord>)> {
    let mut session = state.session.lock().await;
    let record = session.add(req).map_err(reject)?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn http_remove_submission(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let mut session = state.session.lock().await;
    session.remove(&SubmissionId(id)).map_err(reject)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn http_change_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<ChangeStatusRequest>,
) -> ApiResult<Json<SubmissionRecord>> {
    let mut session = state.session.lock().await;
    let record = session
        .change_status(&SubmissionId(id), &req.status, req.notes)
        .map_err(reject)?;
    Ok(Json(record))
}

async fn http_set_filter(
    State(state): State<Arc<AppState>>,
    Json(req): Json<FilterRequest>,
) -> ApiResult<Json<SubmissionView>> {
    let mut session = state.session.lock().await;
    let filter = session.set_filter_named(&req.status).map_err(reject)?;
    debug!(%filter, "filter applied");
    Ok(Json(session.current_view()))
}

async fn http_request_sort(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SortRequest>,
) -> ApiResult<Json<SubmissionView>> {
    let mut session = state.session.lock().await;
    let config = session.request_sort_named(&req.key).map_err(reject)?;
    debug!(key = %config.key, direction = ?config.direction, "sort applied");
    Ok(Json(session.current_view()))
}

async fn http_statistics(
    State(state): State<Arc<AppState>>,
    Query(q): Query<RangeQuery>,
) -> ApiResult<Json<StatisticsSummary>> {
    let range = parse_range(q.range.as_deref()).map_err(reject)?;
    let session = state.session.lock().await;
    Ok(Json(session.statistics(range)))
}

async fn http_login(State(state): State<Arc<AppState>>) -> Json<SessionStatus> {
    let mut session = state.session.lock().await;
    Json(session.login())
}

async fn http_logout(State(state): State<Arc<AppState>>) -> Json<SessionStatus> {
    let mut session = state.session.lock().await;
    Json(session.logout())
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| ws_connection(state, socket))
}

async fn ws_connection(state: Arc<AppState>, socket: axum::extract::ws::WebSocket) {
    use axum::extract::ws::Message;
    use futures::{SinkExt, StreamExt};

    let (mut sender, mut receiver) = socket.split();
    let mut events_rx = state.events.subscribe();

    let send_task = tokio::spawn(async move {
        while let Ok(event) = events_rx.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(v) => v,
                Err(_) => continue,
            };
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(_msg)) = receiver.next().await {}

    send_task.abort();
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
