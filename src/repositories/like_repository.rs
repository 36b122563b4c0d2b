use sqlx::PgPool;

pub async fn like_exists(pool: &PgPool, user_id: i32, post_id: i32) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM likes WHERE user_id = $1 AND post_id = $2)",
    )
    .bind(user_id)
    .bind(post_id)
    .fetch_one(pool)
    .await
}

pub async fn create_like(pool: &PgPool, user_id: i32, post_id: i32) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO likes (user_id, post_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(user_id)
    .bind(post_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

pub async fn delete_like(pool: &PgPool, user_id: i32, post_id: i32) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM likes WHERE user_id = $1 AND post_id = $2")
        .bind(user_id)
        .bind(post_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
