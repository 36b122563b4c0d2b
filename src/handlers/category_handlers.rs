use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::error;

use crate::repositories::category_repository;
use crate::AppState;

/// Handler to list all post categories.
pub async fn list_categories_handler(State(state): State<AppState>) -> Response {
    match category_repository::list_categories(&state.db_pool).await {
        Ok(categories) => (StatusCode::OK, Json(categories)).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to fetch categories");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch categories").into_response()
        }
    }
}
