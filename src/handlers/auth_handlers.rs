use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use tracing::{error, info};

use crate::auth::{hash_password, verify_password, AuthenticatedUser};
use crate::handlers::require_user;
use crate::models::LoggedInDto;
use crate::repositories::user_repository::{self, NewUser};
use crate::utils::{valid_email, valid_login, valid_name, valid_password, LOGIN_RULES, PASSWORD_RULES};
use crate::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPayload {
    pub email: String,
    pub login: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginPayload {
    pub login: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct CheckPasswordPayload {
    pub password: String,
}

/// Handler to register a new account.
pub async fn register_handler(
    State(state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
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
    if !valid_password(&payload.password) {
        return (StatusCode::BAD_REQUEST, PASSWORD_RULES).into_response();
    }

    match user_repository::find_by_login(&state.db_pool, &payload.login).await {
        Ok(Some(_)) => return (StatusCode::CONFLICT, "User already exists").into_response(),
        Ok(None) => {}
        Err(e) => {
            error!(error = %e, "Failed to check login uniqueness during registration");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response();
        }
    }
    match user_repository::find_by_email(&state.db_pool, &payload.email).await {
        Ok(Some(_)) => return (StatusCode::CONFLICT, "Email already exists").into_response(),
        Ok(None) => {}
        Err(e) => {
            error!(error = %e, "Failed to check email uniqueness during registration");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response();
        }
    }

    let password_hash = match hash_password(&payload.password) {
        Ok(hash) => hash,
        Err(e) => {
            error!(error = %e, "Failed to hash password during registration");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to register").into_response();
        }
    };

    let data = NewUser {
        email: payload.email,
        login: payload.login,
        first_name: payload.first_name,
        last_name: payload.last_name,
        password_hash,
    };
    match user_repository::create_user(&state.db_pool, data).await {
        Ok(user) => {
            info!(user_id = user.id, login = %user.login, "Registered new user");
            StatusCode::CREATED.into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to insert new user");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to register").into_response()
        }
    }
}

/// Handler to exchange credentials for a bearer token. Unknown login and
/// wrong password are deliberately indistinguishable.
pub async fn login_handler(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Response {
    let user = match user_repository::find_by_login(&state.db_pool, &payload.login).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return (StatusCode::UNAUTHORIZED, "Username or password is not correct")
                .into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to look up user during login");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response();
        }
    };

    if !verify_password(&payload.password, &user.password_hash) {
        return (StatusCode::UNAUTHORIZED, "Username or password is not correct").into_response();
    }

    let token = state.signer.issue(&user.login);
    info!(user_id = user.id, login = %user.login, "User logged in");
    (
        StatusCode::OK,
        Json(LoggedInDto {
            token,
            login: user.login,
        }),
    )
        .into_response()
}

/// Handler to re-check the current user's password (used before sensitive
/// client-side flows). Returns a bare boolean.
pub async fn check_password_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CheckPasswordPayload>,
) -> Response {
    let user = match require_user(&state.db_pool, &user.0).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    let matches = verify_password(&payload.password, &user.password_hash);
    (StatusCode::OK, Json(matches)).into_response()
}
