use sqlx::PgPool;

use crate::models::Category;

pub async fn list_categories(pool: &PgPool) -> Result<Vec<Category>, sqlx::Error> {
    sqlx::query_as::<_, Category>("SELECT id, name FROM categories ORDER BY id")
        .fetch_all(pool)
        .await
}

/// How many of the given ids actually exist; used to validate a submitted
/// category set in one query.
pub async fn count_existing(pool: &PgPool, ids: &[i32]) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM categories WHERE id = ANY($1)")
        .bind(ids)
        .fetch_one(pool)
        .await
}
