use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use sqlx::PgPool;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

pub mod auth;
pub mod comments;
pub mod config;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod storage;
pub mod utils;

use auth::TokenSigner;
use config::AppConfig;
use handlers::{
    auth_handlers::{check_password_handler, login_handler, register_handler},
    category_handlers::list_categories_handler,
    comment_handlers::{
        comment_tree_handler, create_comment_handler, delete_comment_handler,
        list_comments_handler, my_comments_handler, update_comment_handler,
    },
    like_handlers::{check_like_handler, like_post_handler, unlike_post_handler},
    media_handlers::{image_upload_handler, leadsheet_upload_handler, video_upload_handler},
    post_handlers::{
        add_favorite_handler, check_favorite_handler, create_post_handler, delete_post_handler,
        get_post_handler, list_favorites_handler, list_posts_handler, my_posts_handler,
        remove_favorite_handler, update_post_handler,
    },
    user_handlers::{
        delete_me_handler, get_me_handler, get_user_by_login_handler, get_user_handler,
        update_me_handler, update_password_handler,
    },
};
use storage::MediaStorage;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub storage: MediaStorage,
    pub signer: TokenSigner,
}

// Function to create the main application router
pub fn create_router(db_pool: PgPool, config: &AppConfig) -> Router {
    let app_state = AppState {
        db_pool,
        storage: MediaStorage::new(config.media_base_url.clone(), config.media_secret.as_bytes()),
        signer: TokenSigner::new(config.token_secret.as_str()),
    };

    let allow_origin = match &config.cors_allowed_origin {
        Some(origin) => match origin.parse::<HeaderValue>() {
            Ok(value) => AllowOrigin::exact(value),
            Err(_) => {
                warn!(origin = %origin, "Unparseable CORS origin, allowing any");
                AllowOrigin::any()
            }
        },
        None => AllowOrigin::any(),
    };
    let cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(root))
        .route("/auth/register", post(register_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/check-password", post(check_password_handler))
        .route("/users/:id", get(get_user_handler))
        .route("/users/by-login/:login", get(get_user_by_login_handler))
        .route(
            "/me",
            get(get_me_handler).put(update_me_handler).delete(delete_me_handler),
        )
        .route("/me/password", put(update_password_handler))
        .route("/me/posts", get(my_posts_handler))
        .route("/me/favorites", get(list_favorites_handler))
        .route("/me/comments", get(my_comments_handler))
        .route("/categories", get(list_categories_handler))
        .route("/posts", post(create_post_handler).get(list_posts_handler))
        .route(
            "/posts/:post_id",
            get(get_post_handler).put(update_post_handler).delete(delete_post_handler),
        )
        .route(
            "/posts/:post_id/favorite",
            post(add_favorite_handler)
                .get(check_favorite_handler)
                .delete(remove_favorite_handler),
        )
        .route(
            "/posts/:post_id/like",
            post(like_post_handler).get(check_like_handler).delete(unlike_post_handler),
        )
        .route(
            "/posts/:post_id/comments",
            post(create_comment_handler).get(list_comments_handler),
        )
        .route("/posts/:post_id/comments/tree", get(comment_tree_handler))
        .route(
            "/comments/:comment_id",
            put(update_comment_handler).delete(delete_comment_handler),
        )
        .route("/uploads/video", get(video_upload_handler))
        .route("/uploads/image", get(image_upload_handler))
        .route("/uploads/leadsheet", get(leadsheet_upload_handler))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

async fn root() -> &'static str {
    "MelodyHub API"
}
