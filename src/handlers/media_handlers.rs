use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use tracing::info;

use crate::auth::AuthenticatedUser;
use crate::storage::MediaKind;
use crate::AppState;

#[derive(Deserialize)]
pub struct UploadParams {
    pub filename: String,
}

/// Handler to issue an upload ticket for a video file.
pub async fn video_upload_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(params): Query<UploadParams>,
) -> Response {
    issue_ticket(&state, &user, MediaKind::Video, &params.filename)
}

/// Handler to issue an upload ticket for an image (avatar or preview).
pub async fn image_upload_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(params): Query<UploadParams>,
) -> Response {
    issue_ticket(&state, &user, MediaKind::Image, &params.filename)
}

/// Handler to issue an upload ticket for a leadsheet.
pub async fn leadsheet_upload_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(params): Query<UploadParams>,
) -> Response {
    issue_ticket(&state, &user, MediaKind::Leadsheet, &params.filename)
}

fn issue_ticket(state: &AppState, user: &AuthenticatedUser, kind: MediaKind, filename: &str) -> Response {
    let filename = filename.trim();
    if filename.is_empty() || filename.contains('/') {
        return (StatusCode::BAD_REQUEST, "Invalid filename").into_response();
    }

    let ticket = state.storage.issue_upload(kind, filename);
    info!(login = %user.0, kind = ?kind, key = %ticket.key, "Issued upload ticket");
    (StatusCode::OK, Json(ticket)).into_response()
}
