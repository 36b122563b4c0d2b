use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use sqlx::PgPool;
use tracing::{error, info, warn};

use crate::auth::AuthenticatedUser;
use crate::handlers::require_user;
use crate::models::{PostPageDto, PostPreviewDto, PostSummary};
use crate::repositories::{
    category_repository, post_repository,
    post_repository::{CreatePostData, PostFilter, PostSort, UpdatePostData},
    saved_repository, user_repository,
};
use crate::utils::PaginationParams;
use crate::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostPayload {
    pub name: String,
    pub description: Option<String>,
    pub media_key: Option<String>,
    pub leadsheet_key: Option<String>,
    #[serde(default)]
    pub categories: Vec<i32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostPayload {
    pub name: Option<String>,
    pub description: Option<String>,
    pub media_key: Option<String>,
    pub leadsheet_key: Option<String>,
    pub categories: Option<Vec<i32>>,
}

/// Query parameters for the post listing. `category_ids` arrives as a
/// comma-separated list.
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ListPostsParams {
    pub user_id: Option<i32>,
    pub category_ids: Option<String>,
    pub name: Option<String>,
    pub sort: Option<String>,
}

/// Handler to create a post.
pub async fn create_post_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreatePostPayload>,
) -> Response {
    let user = match require_user(&state.db_pool, &user.0).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };

    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return (StatusCode::BAD_REQUEST, "Missing or empty required field: name").into_response();
    }

    if let Err(resp) = check_categories_exist(&state.db_pool, &payload.categories).await {
        return resp;
    }

    let mut tx = match state.db_pool.begin().await {
        Ok(tx) => tx,
        Err(e) => {
            error!(error = %e, "Failed to begin transaction for post creation");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response();
        }
    };

    let data = CreatePostData {
        name,
        description: payload.description,
        media_key: payload.media_key,
        leadsheet_key: payload.leadsheet_key,
        categories: payload.categories,
    };
    match post_repository::create_post(&mut tx, user.id, data).await {
        Ok(post) => {
            if let Err(e) = tx.commit().await {
                error!(error = %e, post_id = post.id, "Failed to commit post creation");
                return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to save post").into_response();
            }
            info!(post_id = post.id, user_id = user.id, "Created post");
            (StatusCode::CREATED, Json(post)).into_response()
        }
        Err(e) => {
            error!(error = %e, user_id = user.id, "Failed to create post (transaction rolling back)");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to create post").into_response()
        }
    }
}

/// Handler for the post page: metadata plus presigned media URLs.
pub async fn get_post_handler(State(state): State<AppState>, Path(post_id): Path<i32>) -> Response {
    let detail = match post_repository::get_post_detail(&state.db_pool, post_id).await {
        Ok(Some(detail)) => detail,
        Ok(None) => return (StatusCode::NOT_FOUND, "Post not found").into_response(),
        Err(e) => {
            error!(error = %e, post_id, "Failed to fetch post");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch post").into_response();
        }
    };

    let categories = match post_repository::categories_for_posts(&state.db_pool, &[post_id]).await {
        Ok(pairs) => pairs.into_iter().map(|(_, category_id)| category_id).collect(),
        Err(e) => {
            error!(error = %e, post_id, "Failed to fetch post categories");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch post").into_response();
        }
    };

    let dto = PostPageDto {
        id: detail.id,
        name: detail.name,
        author_name: detail.author_login,
        description: detail.description,
        categories,
        preview_url: state.storage.preview_url(detail.media_key.as_deref()),
        post_url: state.storage.media_url(detail.media_key.as_deref()),
        leadsheet_url: state.storage.leadsheet_url(detail.leadsheet_key.as_deref()),
        avatar_url: state.storage.avatar_url(detail.author_avatar_key.as_deref()),
        created_at: detail.created_at,
    };
    (StatusCode::OK, Json(dto)).into_response()
}

/// Handler to list posts with optional author/category/name filters and
/// `date` or `likes` (trailing 30 days) ordering.
pub async fn list_posts_handler(
    State(state): State<AppState>,
    Query(params): Query<ListPostsParams>,
    Query(page): Query<PaginationParams>,
) -> Response {
    if let Some(user_id) = params.user_id {
        match user_repository::find_by_id(&state.db_pool, user_id).await {
            Ok(Some(_)) => {}
            Ok(None) => return (StatusCode::BAD_REQUEST, "User not found").into_response(),
            Err(e) => {
                error!(error = %e, user_id, "Failed to check filter user");
                return (StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response();
            }
        }
    }

    let category_ids = match parse_category_ids(params.category_ids.as_deref()) {
        Ok(ids) => ids,
        Err(resp) => return resp,
    };

    let filter = PostFilter {
        user_id: params.user_id,
        category_ids,
        name: params.name.filter(|n| !n.is_empty()),
        sort: PostSort::parse(params.sort.as_deref()),
        limit: page.limit() as i64,
        offset: page.offset() as i64,
    };

    match post_repository::list_posts(&state.db_pool, &filter).await {
        Ok(posts) => previews_response(&state, posts).await,
        Err(e) => {
            error!(error = %e, "Failed to list posts");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch posts").into_response()
        }
    }
}

/// Handler for the current user's own posts.
pub async fn my_posts_handler(State(state): State<AppState>, user: AuthenticatedUser) -> Response {
    let user = match require_user(&state.db_pool, &user.0).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    match post_repository::posts_by_user(&state.db_pool, user.id).await {
        Ok(posts) => previews_response(&state, posts).await,
        Err(e) => {
            error!(error = %e, user_id = user.id, "Failed to fetch user's posts");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch posts").into_response()
        }
    }
}

/// Handler to edit a post. Owner only; omitted fields keep their value.
pub async fn update_post_handler(
    State(state): State<AppState>,
    Path(post_id): Path<i32>,
    user: AuthenticatedUser,
    Json(payload): Json<UpdatePostPayload>,
) -> Response {
    let user = match require_user(&state.db_pool, &user.0).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };

    match post_repository::get_post_by_id(&state.db_pool, post_id).await {
        Ok(Some(post)) if post.user_id != user.id => {
            warn!(post_id, user_id = user.id, owner_id = post.user_id,
                "User attempted to edit a post they do not own");
            return (StatusCode::FORBIDDEN, "Permission denied").into_response();
        }
        Ok(Some(_)) => {}
        Ok(None) => return (StatusCode::NOT_FOUND, "Post not found").into_response(),
        Err(e) => {
            error!(error = %e, post_id, "Failed to fetch post for edit");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response();
        }
    }

    if let Some(name) = &payload.name {
        if name.trim().is_empty() {
            return (StatusCode::BAD_REQUEST, "Name cannot be empty").into_response();
        }
    }
    if let Some(categories) = &payload.categories {
        if let Err(resp) = check_categories_exist(&state.db_pool, categories).await {
            return resp;
        }
    }

    let mut tx = match state.db_pool.begin().await {
        Ok(tx) => tx,
        Err(e) => {
            error!(error = %e, "Failed to begin transaction for post edit");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response();
        }
    };

    let data = UpdatePostData {
        name: payload.name.map(|n| n.trim().to_string()),
        description: payload.description,
        media_key: payload.media_key,
        leadsheet_key: payload.leadsheet_key,
        categories: payload.categories,
    };
    match post_repository::update_post(&mut tx, post_id, data).await {
        Ok(Some(post)) => {
            if let Err(e) = tx.commit().await {
                error!(error = %e, post_id, "Failed to commit post edit");
                return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to save post").into_response();
            }
            info!(post_id, user_id = user.id, "Updated post");
            (StatusCode::OK, Json(post)).into_response()
        }
        Ok(None) => (StatusCode::NOT_FOUND, "Post not found").into_response(),
        Err(e) => {
            error!(error = %e, post_id, "Failed to update post (transaction rolling back)");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to update post").into_response()
        }
    }
}

/// Handler to delete a post. Owner only.
pub async fn delete_post_handler(
    State(state): State<AppState>,
    Path(post_id): Path<i32>,
    user: AuthenticatedUser,
) -> Response {
    let user = match require_user(&state.db_pool, &user.0).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };

    match post_repository::get_post_by_id(&state.db_pool, post_id).await {
        Ok(Some(post)) if post.user_id != user.id => {
            warn!(post_id, user_id = user.id, owner_id = post.user_id,
                "User attempted to delete a post they do not own");
            return (StatusCode::FORBIDDEN, "Permission denied").into_response();
        }
        Ok(Some(_)) => {}
        Ok(None) => return (StatusCode::NOT_FOUND, "Post not found").into_response(),
        Err(e) => {
            error!(error = %e, post_id, "Failed to fetch post before deletion");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response();
        }
    }

    match post_repository::delete_post(&state.db_pool, post_id).await {
        Ok(1) => {
            info!(post_id, deleted_by = user.id, "Deleted post");
            StatusCode::NO_CONTENT.into_response()
        }
        Ok(_) => (StatusCode::NOT_FOUND, "Post not found").into_response(),
        Err(e) => {
            error!(error = %e, post_id, "Failed to delete post");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to delete post").into_response()
        }
    }
}

// --- Favorites ---

/// Handler to save a post to the current user's favorites.
pub async fn add_favorite_handler(
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

    match saved_repository::save_post(&state.db_pool, user.id, post_id).await {
        Ok(1) => {
            info!(post_id, user_id = user.id, "Post saved to favorites");
            StatusCode::CREATED.into_response()
        }
        Ok(_) => (StatusCode::CONFLICT, "Post already saved").into_response(),
        Err(e) => {
            error!(error = %e, post_id, user_id = user.id, "Failed to save post");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to save post").into_response()
        }
    }
}

/// Handler to remove a post from favorites.
pub async fn remove_favorite_handler(
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

    match saved_repository::unsave_post(&state.db_pool, user.id, post_id).await {
        Ok(1) => {
            info!(post_id, user_id = user.id, "Post removed from favorites");
            StatusCode::NO_CONTENT.into_response()
        }
        Ok(_) => (StatusCode::BAD_REQUEST, "Post not saved").into_response(),
        Err(e) => {
            error!(error = %e, post_id, user_id = user.id, "Failed to remove saved post");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to remove saved post").into_response()
        }
    }
}

/// Handler to check whether a post is in the current user's favorites.
pub async fn check_favorite_handler(
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

    match saved_repository::is_saved(&state.db_pool, user.id, post_id).await {
        Ok(saved) => (StatusCode::OK, Json(saved)).into_response(),
        Err(e) => {
            error!(error = %e, post_id, user_id = user.id, "Failed to check saved status");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to check saved status").into_response()
        }
    }
}

/// Handler to list the current user's saved posts.
pub async fn list_favorites_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Response {
    let user = match require_user(&state.db_pool, &user.0).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    match saved_repository::saved_posts_for_user(&state.db_pool, user.id).await {
        Ok(posts) => previews_response(&state, posts).await,
        Err(e) => {
            error!(error = %e, user_id = user.id, "Failed to fetch saved posts");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch saved posts").into_response()
        }
    }
}

// --- Shared pieces ---

pub(crate) async fn check_post_exists(pool: &PgPool, post_id: i32) -> Result<(), Response> {
    match post_repository::get_post_by_id(pool, post_id).await {
        Ok(Some(_)) => Ok(()),
        Ok(None) => Err((StatusCode::NOT_FOUND, "Post not found").into_response()),
        Err(e) => {
            error!(error = %e, post_id, "Failed to check post existence");
            Err((StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response())
        }
    }
}

async fn check_categories_exist(pool: &PgPool, ids: &[i32]) -> Result<(), Response> {
    if ids.is_empty() {
        return Ok(());
    }
    let mut unique = ids.to_vec();
    unique.sort_unstable();
    unique.dedup();
    match category_repository::count_existing(pool, &unique).await {
        Ok(count) if count as usize == unique.len() => Ok(()),
        Ok(_) => Err((StatusCode::BAD_REQUEST, "Unknown category id").into_response()),
        Err(e) => {
            error!(error = %e, "Failed to validate category ids");
            Err((StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response())
        }
    }
}

fn parse_category_ids(raw: Option<&str>) -> Result<Vec<i32>, Response> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(Vec::new());
    };
    raw.split(',')
        .map(|part| part.trim().parse::<i32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| (StatusCode::BAD_REQUEST, "Invalid category id list").into_response())
}

/// Maps summaries to preview DTOs, attaching presigned preview URLs and the
/// posts' category ids.
async fn previews_response(state: &AppState, posts: Vec<PostSummary>) -> Response {
    let post_ids: Vec<i32> = posts.iter().map(|p| p.id).collect();
    let mut categories: HashMap<i32, Vec<i32>> = HashMap::new();
    if !post_ids.is_empty() {
        match post_repository::categories_for_posts(&state.db_pool, &post_ids).await {
            Ok(pairs) => {
                for (post_id, category_id) in pairs {
                    categories.entry(post_id).or_default().push(category_id);
                }
            }
            Err(e) => {
                error!(error = %e, "Failed to fetch categories for post previews");
                return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch posts")
                    .into_response();
            }
        }
    }

    let previews: Vec<PostPreviewDto> = posts
        .into_iter()
        .map(|post| PostPreviewDto {
            id: post.id,
            name: post.name,
            author_name: post.author_login,
            preview_url: state.storage.preview_url(post.media_key.as_deref()),
            categories: categories.remove(&post.id).unwrap_or_default(),
        })
        .collect();
    (StatusCode::OK, Json(previews)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_id_list_parses() {
        assert_eq!(parse_category_ids(None).unwrap(), Vec::<i32>::new());
        assert_eq!(parse_category_ids(Some("")).unwrap(), Vec::<i32>::new());
        assert_eq!(parse_category_ids(Some("3")).unwrap(), vec![3]);
        assert_eq!(parse_category_ids(Some("1, 2,3")).unwrap(), vec![1, 2, 3]);
        assert!(parse_category_ids(Some("1,x")).is_err());
    }

    #[test]
    fn sort_parses_case_insensitively() {
        assert_eq!(PostSort::parse(Some("date")), PostSort::Date);
        assert_eq!(PostSort::parse(Some("LIKES")), PostSort::RecentLikes);
        assert_eq!(PostSort::parse(Some("bogus")), PostSort::None);
        assert_eq!(PostSort::parse(None), PostSort::None);
    }
}
