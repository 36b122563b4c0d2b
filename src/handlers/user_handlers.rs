use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::auth::{hash_password, verify_password, AuthenticatedUser};
use crate::handlers::require_user;
use crate::models::PublicUserDto;
use crate::repositories::user_repository::{self, UpdateProfileData};
use crate::utils::{valid_email, valid_login, valid_name, valid_password, LOGIN_RULES, PASSWORD_RULES};
use crate::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfilePayload {
    pub email: String,
    pub login: String,
    pub first_name: String,
    pub last_name: String,
    pub avatar_key: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteAccountPayload {
    pub password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordPayload {
    pub old_password: String,
    pub new_password: String,
}

/// Handler to fetch a user's public profile by id.
pub async fn get_user_handler(State(state): State<AppState>, Path(user_id): Path<i32>) -> Response {
    match user_repository::find_by_id(&state.db_pool, user_id).await {
        Ok(Some(user)) => {
            let avatar_url = state.storage.avatar_url(user.avatar_key.as_deref());
            (StatusCode::OK, Json(PublicUserDto::from_user(&user, avatar_url))).into_response()
        }
        Ok(None) => (StatusCode::NOT_FOUND, "User not found").into_response(),
        Err(e) => {
            error!(error = %e, user_id, "Failed to fetch user");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch user").into_response()
        }
    }
}

/// Handler to fetch a user's public profile by login.
pub async fn get_user_by_login_handler(
    State(state): State<AppState>,
    Path(login): Path<String>,
) -> Response {
    if !valid_login(&login) {
        return (StatusCode::BAD_REQUEST, LOGIN_RULES).into_response();
    }
    match user_repository::find_by_login(&state.db_pool, &login).await {
        Ok(Some(user)) => {
            let avatar_url = state.storage.avatar_url(user.avatar_key.as_deref());
            (StatusCode::OK, Json(PublicUserDto::from_user(&user, avatar_url))).into_response()
        }
        Ok(None) => (StatusCode::NOT_FOUND, "User not found").into_response(),
        Err(e) => {
            error!(error = %e, login = %login, "Failed to fetch user by login");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch user").into_response()
        }
    }
}

/// Handler for the current user's own profile.
pub async fn get_me_handler(State(state): State<AppState>, user: AuthenticatedUser) -> Response {
    let user = match require_user(&state.db_pool, &user.0).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    let avatar_url = state.storage.avatar_url(user.avatar_key.as_deref());
    (StatusCode::OK, Json(PublicUserDto::from_user(&user, avatar_url))).into_response()
}

/// Handler to edit the current user's profile.
pub async fn update_me_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<UpdateProfilePayload>,
) -> Response {
    if !valid_email(&payload.email) {
        return (StatusCode::BAD_REQUEST, "Invalid email format").into_response();
    }
    if !valid_login(&payload.login) {
        return (StatusCode::BAD_REQUEST, LOGIN_RULES).into_response();
    }
    if !valid_name(&payload.first_name) || !valid_name(&payload.last_name) {
        return (StatusCode::BAD_REQUEST, "Names may contain letters only").into_response();
    }

    let user = match require_user(&state.db_pool, &user.0).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };

    // The new login/email may belong to someone else.
    match user_repository::find_by_login(&state.db_pool, &payload.login).await {
        Ok(Some(other)) if other.id != user.id => {
            return (StatusCode::CONFLICT, "This login is already used").into_response()
        }
        Ok(_) => {}
        Err(e) => {
            error!(error = %e, "Failed to check login uniqueness during profile edit");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response();
        }
    }
    match user_repository::find_by_email(&state.db_pool, &payload.email).await {
        Ok(Some(other)) if other.id != user.id => {
            return (StatusCode::CONFLICT, "This email is already used").into_response()
        }
        Ok(_) => {}
        Err(e) => {
            error!(error = %e, "Failed to check email uniqueness during profile edit");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response();
        }
    }

    let data = UpdateProfileData {
        email: payload.email,
        login: payload.login,
        first_name: payload.first_name,
        last_name: payload.last_name,
        avatar_key: payload.avatar_key,
    };
    match user_repository::update_profile(&state.db_pool, user.id, data).await {
        Ok(Some(updated)) => {
            info!(user_id = updated.id, "Updated user profile");
            let avatar_url = state.storage.avatar_url(updated.avatar_key.as_deref());
            (StatusCode::OK, Json(PublicUserDto::from_user(&updated, avatar_url))).into_response()
        }
        Ok(None) => (StatusCode::NOT_FOUND, "User not found").into_response(),
        Err(e) => {
            error!(error = %e, user_id = user.id, "Failed to update profile");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to update profile").into_response()
        }
    }
}

/// Handler to delete the current account after a password re-check. Comments
/// left on other posts survive under the deleted-author placeholder.
pub async fn delete_me_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<DeleteAccountPayload>,
) -> Response {
    let user = match require_user(&state.db_pool, &user.0).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };

    if !verify_password(&payload.password, &user.password_hash) {
        warn!(user_id = user.id, "Account deletion attempted with wrong password");
        return (StatusCode::FORBIDDEN, "Password is not correct").into_response();
    }

    match user_repository::delete_user(&state.db_pool, user.id).await {
        Ok(1) => {
            info!(user_id = user.id, login = %user.login, "Deleted user account");
            StatusCode::NO_CONTENT.into_response()
        }
        Ok(_) => (StatusCode::NOT_FOUND, "User not found").into_response(),
        Err(e) => {
            error!(error = %e, user_id = user.id, "Failed to delete account");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to delete account").into_response()
        }
    }
}

/// Handler to change the current user's password.
pub async fn update_password_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<UpdatePasswordPayload>,
) -> Response {
    let user = match require_user(&state.db_pool, &user.0).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };

    if !verify_password(&payload.old_password, &user.password_hash) {
        return (StatusCode::FORBIDDEN, "Old password is incorrect").into_response();
    }
    if !valid_password(&payload.new_password) {
        return (StatusCode::BAD_REQUEST, PASSWORD_RULES).into_response();
    }

    let password_hash = match hash_password(&payload.new_password) {
        Ok(hash) => hash,
        Err(e) => {
            error!(error = %e, user_id = user.id, "Failed to hash new password");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to update password")
                .into_response();
        }
    };

    match user_repository::update_password(&state.db_pool, user.id, &password_hash).await {
        Ok(1) => {
            info!(user_id = user.id, "Password updated");
            StatusCode::OK.into_response()
        }
        Ok(_) => (StatusCode::NOT_FOUND, "User not found").into_response(),
        Err(e) => {
            error!(error = %e, user_id = user.id, "Failed to update password");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to update password").into_response()
        }
    }
}
