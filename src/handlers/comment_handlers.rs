use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::auth::AuthenticatedUser;
use crate::comments::build_comment_forest;
use crate::handlers::{post_handlers::check_post_exists, require_user};
use crate::models::{CommentDto, CommentRecord};
use crate::repositories::comment_repository;
use crate::AppState;

const MAX_COMMENT_LENGTH: usize = 4000;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentPayload {
    pub content: String,
    pub reply_to_id: Option<i32>,
}

#[derive(Deserialize)]
pub struct UpdateCommentPayload {
    pub content: String,
}

fn validate_content(content: &str) -> Result<String, Response> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Comment cannot be empty").into_response());
    }
    if trimmed.chars().count() > MAX_COMMENT_LENGTH {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("Comment exceeds maximum length of {MAX_COMMENT_LENGTH} characters"),
        )
            .into_response());
    }
    Ok(trimmed.to_string())
}

/// Handler to add a comment (or a reply) to a post.
pub async fn create_comment_handler(
    State(state): State<AppState>,
    Path(post_id): Path<i32>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateCommentPayload>,
) -> Response {
    let user = match require_user(&state.db_pool, &user.0).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    if let Err(resp) = check_post_exists(&state.db_pool, post_id).await {
        return resp;
    }

    let content = match validate_content(&payload.content) {
        Ok(content) => content,
        Err(resp) => return resp,
    };

    // A reply target must exist and sit on the same post.
    if let Some(reply_to) = payload.reply_to_id {
        match comment_repository::get_comment_by_id(&state.db_pool, reply_to).await {
            Ok(Some(parent)) if parent.post_id == post_id => {}
            Ok(_) => {
                return (StatusCode::BAD_REQUEST, "Comment to reply to not found").into_response()
            }
            Err(e) => {
                error!(error = %e, reply_to, "Failed to check reply target");
                return (StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response();
            }
        }
    }

    match comment_repository::create_comment(
        &state.db_pool,
        post_id,
        user.id,
        payload.reply_to_id,
        &content,
    )
    .await
    {
        Ok(comment) => {
            info!(comment_id = comment.id, post_id, user_id = user.id, "Created comment");
            (StatusCode::CREATED, Json(comment)).into_response()
        }
        Err(e) => {
            error!(error = %e, post_id, user_id = user.id, "Failed to create comment");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to create comment").into_response()
        }
    }
}

/// Handler to edit a comment's content. Author only.
pub async fn update_comment_handler(
    State(state): State<AppState>,
    Path(comment_id): Path<i32>,
    user: AuthenticatedUser,
    Json(payload): Json<UpdateCommentPayload>,
) -> Response {
    let user = match require_user(&state.db_pool, &user.0).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };

    match comment_repository::get_comment_by_id(&state.db_pool, comment_id).await {
        Ok(Some(comment)) if comment.user_id != Some(user.id) => {
            warn!(comment_id, user_id = user.id, author_id = ?comment.user_id,
                "User attempted to edit a comment they did not write");
            return (StatusCode::FORBIDDEN, "Permission denied").into_response();
        }
        Ok(Some(_)) => {}
        Ok(None) => return (StatusCode::NOT_FOUND, "Comment not found").into_response(),
        Err(e) => {
            error!(error = %e, comment_id, "Failed to fetch comment for edit");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response();
        }
    }

    let content = match validate_content(&payload.content) {
        Ok(content) => content,
        Err(resp) => return resp,
    };

    match comment_repository::update_content(&state.db_pool, comment_id, &content).await {
        Ok(Some(comment)) => {
            info!(comment_id, user_id = user.id, "Updated comment");
            (StatusCode::OK, Json(comment)).into_response()
        }
        Ok(None) => (StatusCode::NOT_FOUND, "Comment not found").into_response(),
        Err(e) => {
            error!(error = %e, comment_id, "Failed to update comment");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to update comment").into_response()
        }
    }
}

/// Handler to delete a comment. Author only. Replies to the deleted comment
/// stay in place and surface as top-level comments.
pub async fn delete_comment_handler(
    State(state): State<AppState>,
    Path(comment_id): Path<i32>,
    user: AuthenticatedUser,
) -> Response {
    let user = match require_user(&state.db_pool, &user.0).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };

    match comment_repository::get_comment_by_id(&state.db_pool, comment_id).await {
        Ok(Some(comment)) if comment.user_id != Some(user.id) => {
            warn!(comment_id, user_id = user.id, author_id = ?comment.user_id,
                "User attempted to delete a comment they did not write");
            return (StatusCode::FORBIDDEN, "Permission denied").into_response();
        }
        Ok(Some(_)) => {}
        Ok(None) => return (StatusCode::NOT_FOUND, "Comment not found").into_response(),
        Err(e) => {
            error!(error = %e, comment_id, "Failed to fetch comment before deletion");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response();
        }
    }

    match comment_repository::delete_comment(&state.db_pool, comment_id).await {
        Ok(1) => {
            info!(comment_id, deleted_by = user.id, "Deleted comment");
            StatusCode::NO_CONTENT.into_response()
        }
        Ok(_) => (StatusCode::NOT_FOUND, "Comment not found").into_response(),
        Err(e) => {
            error!(error = %e, comment_id, "Failed to delete comment");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to delete comment").into_response()
        }
    }
}

/// Handler to list a post's comments flat, oldest first.
pub async fn list_comments_handler(
    State(state): State<AppState>,
    Path(post_id): Path<i32>,
) -> Response {
    if let Err(resp) = check_post_exists(&state.db_pool, post_id).await {
        return resp;
    }

    match comment_repository::comments_for_post(&state.db_pool, post_id).await {
        Ok(records) => {
            let comments: Vec<CommentDto> =
                records.iter().map(|r| to_dto(&state, r)).collect();
            (StatusCode::OK, Json(comments)).into_response()
        }
        Err(e) => {
            error!(error = %e, post_id, "Failed to fetch comments");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch comments").into_response()
        }
    }
}

/// Handler to list a post's comments as threaded reply trees.
pub async fn comment_tree_handler(
    State(state): State<AppState>,
    Path(post_id): Path<i32>,
) -> Response {
    if let Err(resp) = check_post_exists(&state.db_pool, post_id).await {
        return resp;
    }

    match comment_repository::comments_for_post(&state.db_pool, post_id).await {
        Ok(records) => {
            let forest = build_comment_forest(&records, |record| to_dto(&state, record));
            (StatusCode::OK, Json(forest)).into_response()
        }
        Err(e) => {
            error!(error = %e, post_id, "Failed to fetch comments for tree");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch comments").into_response()
        }
    }
}

/// Handler to list the current user's comments across posts.
pub async fn my_comments_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Response {
    let user = match require_user(&state.db_pool, &user.0).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    match comment_repository::comments_by_user(&state.db_pool, user.id).await {
        Ok(records) => {
            let comments: Vec<CommentDto> =
                records.iter().map(|r| to_dto(&state, r)).collect();
            (StatusCode::OK, Json(comments)).into_response()
        }
        Err(e) => {
            error!(error = %e, user_id = user.id, "Failed to fetch user's comments");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch comments").into_response()
        }
    }
}

fn to_dto(state: &AppState, record: &CommentRecord) -> CommentDto {
    let avatar_url = state.storage.avatar_url(record.author_avatar_key.as_deref());
    CommentDto::from_record(record, avatar_url)
}
