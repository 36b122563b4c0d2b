use sqlx::PgPool;

use crate::models::PostSummary;

pub async fn is_saved(pool: &PgPool, user_id: i32, post_id: i32) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM saved_posts WHERE user_id = $1 AND post_id = $2)",
    )
    .bind(user_id)
    .bind(post_id)
    .fetch_one(pool)
    .await
}

pub async fn save_post(pool: &PgPool, user_id: i32, post_id: i32) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO saved_posts (user_id, post_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(user_id)
    .bind(post_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

pub async fn unsave_post(pool: &PgPool, user_id: i32, post_id: i32) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM saved_posts WHERE user_id = $1 AND post_id = $2")
        .bind(user_id)
        .bind(post_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Posts the user has saved, most recently saved first.
pub async fn saved_posts_for_user(
    pool: &PgPool,
    user_id: i32,
) -> Result<Vec<PostSummary>, sqlx::Error> {
    sqlx::query_as::<_, PostSummary>(
        "SELECT p.id, p.user_id, p.name, p.media_key, u.login AS author_login \
         FROM saved_posts s \
         JOIN posts p ON p.id = s.post_id \
         JOIN users u ON u.id = p.user_id \
         WHERE s.user_id = $1 \
         ORDER BY s.created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}
