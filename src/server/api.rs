use super::AppState;
use crate::editor::EditorError;
use crate::models::chat::{ ConversationRecord, RecordRow };
use axum::{
    extract::{ Query, State },
    http::StatusCode,
    response::{ IntoResponse, Response },
    Json,
};
use log::error;
use serde::{ Deserialize, Serialize };

#[derive(Deserialize)]
pub struct RecentQuery {
    pub limit: Option<usize>,
}

#[derive(Deserialize)]
pub struct DeleteRequest {
    pub indices: Vec<usize>,
    /// Window the indices refer to. Defaults to the configured display window.
    pub window: Option<usize>,
}

#[derive(Serialize)]
struct ApiResponse<T: Serialize> {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
}

#[derive(Serialize)]
struct RecentRow {
    index: usize,
    #[serde(flatten)]
    row: RecordRow,
}

#[derive(Serialize)]
struct RecentData {
    total: usize,
    rows: Vec<RecentRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warning: Option<String>,
}

#[derive(Serialize)]
struct CountData {
    count: usize,
}

fn status_for(err: &EditorError) -> StatusCode {
    match err {
        EditorError::IneligibleRecord => StatusCode::UNPROCESSABLE_ENTITY,
        EditorError::IndexOutOfRange { .. } => StatusCode::BAD_REQUEST,
        EditorError::Codec(_) => StatusCode::INTERNAL_SERVER_ERROR,
        EditorError::RemoteRead(_) | EditorError::RemoteWrite(_) => StatusCode::BAD_GATEWAY,
    }
}

fn ok<T: Serialize>(message: &str, data: T) -> Response {
    (StatusCode::OK, Json(ApiResponse {
        success: true,
        message: message.into(),
        data: Some(data),
    })).into_response()
}

fn failure(err: EditorError) -> Response {
    let code = status_for(&err);
    if code.is_server_error() {
        error!("API request failed: {}", err);
    }
    (code, Json(ApiResponse::<()> {
        success: false,
        message: err.to_string(),
        data: None,
    })).into_response()
}

pub async fn recent_handler(
    State(state): State<AppState>,
    Query(query): Query<RecentQuery>
) -> Response {
    let limit = query.limit.unwrap_or(state.window);
    match state.editor.list_recent(limit).await {
        Ok(window) => {
            let rows = window.rows
                .into_iter()
                .enumerate()
                .map(|(index, row)| RecentRow { index, row })
                .collect();
            ok("ok", RecentData { total: window.total, rows, warning: window.warning })
        }
        Err(e) => failure(e),
    }
}

pub async fn append_handler(
    State(state): State<AppState>,
    Json(record): Json<ConversationRecord>
) -> Response {
    match state.editor.append(&record).await {
        Ok(count) => ok("Dataset updated successfully!", CountData { count }),
        Err(e) => failure(e),
    }
}

pub async fn delete_handler(
    State(state): State<AppState>,
    Json(req): Json<DeleteRequest>
) -> Response {
    let window = req.window.unwrap_or(state.window);
    match state.editor.delete(&req.indices, window).await {
        Ok(count) => ok("Dataset updated successfully!", CountData { count }),
        Err(e) => failure(e),
    }
}
