use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{error, info};

use crate::auth::AuthenticatedUser;
use crate::handlers::{post_handlers::check_post_exists, require_user};
use crate::repositories::like_repository;
use crate::AppState;

/// Handler to like a post. Liking twice is a conflict.
pub async fn like_post_handler(
    State(state): State<AppState>,
    Path(post_id): Path<i32>,
    user: AuthenticatedUser,
) -> Response {
    let user = match require_user(&state.db_pool, &user.0).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    if let Err(resp) = check_post_exists(&state.db_pool, post_id).await {
        return resp;
    }

    match like_repository::create_like(&state.db_pool, user.id, post_id).await {
        Ok(1) => {
            info!(user_id = user.id, post_id, "Post liked");
            StatusCode::CREATED.into_response()
        }
        Ok(_) => (StatusCode::CONFLICT, "Like already exists").into_response(),
        Err(e) => {
            error!(error = %e, user_id = user.id, post_id, "Failed to create like");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to like post").into_response()
        }
    }
}

/// Handler to remove a like from a post.
pub async fn unlike_post_handler(
    State(state): State<AppState>,
    Path(post_id): Path<i32>,
    user: AuthenticatedUser,
) -> Response {
    let user = match require_user(&state.db_pool, &user.0).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    if let Err(resp) = check_post_exists(&state.db_pool, post_id).await {
        return resp;
    }

    match like_repository::delete_like(&state.db_pool, user.id, post_id).await {
        Ok(1) => {
            info!(user_id = user.id, post_id, "Like removed");
            StatusCode::NO_CONTENT.into_response()
        }
        Ok(_) => (StatusCode::BAD_REQUEST, "Like does not exist").into_response(),
        Err(e) => {
            error!(error = %e, user_id = user.id, post_id, "Failed to remove like");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to remove like").into_response()
        }
    }
}

/// Handler to check whether the current user has liked a post.
pub async fn check_like_handler(
    State(state): State<AppState>,
    Path(post_id): Path<i32>,
    user: AuthenticatedUser,
) -> Response {
    let user = match require_user(&state.db_pool, &user.0).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    if let Err(resp) = check_post_exists(&state.db_pool, post_id).await {
        return resp;
    }

    match like_repository::like_exists(&state.db_pool, user.id, post_id).await {
        Ok(liked) => (StatusCode::OK, axum::Json(liked)).into_response(),
        Err(e) => {
            error!(error = %e, user_id = user.id, post_id, "Failed to check like");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to check like").into_response()
        }
    }
}
