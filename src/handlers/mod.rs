pub mod auth_handlers;
pub mod category_handlers;
pub mod comment_handlers;
pub mod like_handlers;
pub mod media_handlers;
pub mod post_handlers;
pub mod user_handlers;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sqlx::PgPool;
use tracing::error;

use crate::models::User;
use crate::repositories::user_repository;

/// Resolves a verified login to its user row. A token can outlive its
/// account, so a missing row is NOT_FOUND rather than a server error.
pub(crate) async fn require_user(pool: &PgPool, login: &str) -> Result<User, Response> {
    match user_repository::find_by_login(pool, login).await {
        Ok(Some(user)) => Ok(user),
        Ok(None) => Err((StatusCode::NOT_FOUND, "User not found").into_response()),
        Err(e) => {
            error!(error = %e, login = %login, "Failed to look up user");
            Err((StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response())
        }
    }
}
