use sqlx::PgPool;

use crate::models::{Comment, CommentRecord, DELETED_AUTHOR};

const COMMENT_COLUMNS: &str = "id, post_id, user_id, reply_to, content, created_at";

// Columns for the author-joined record shape the hierarchy builder consumes.
// Ordered by (created_at, id) so sibling order in the built tree is
// oldest-first; the builder itself never re-sorts.
fn record_query(where_clause: &str) -> String {
    format!(
        "SELECT c.id, c.post_id, c.user_id, c.reply_to, c.content, \
                COALESCE(u.login, '{DELETED_AUTHOR}') AS author_login, \
                u.avatar_key AS author_avatar_key, \
                c.created_at \
         FROM comments c \
         LEFT JOIN users u ON u.id = c.user_id \
         WHERE {where_clause} \
         ORDER BY c.created_at ASC, c.id ASC"
    )
}

/// Inserts a new comment on a post.
pub async fn create_comment(
    pool: &PgPool,
    post_id: i32,
    user_id: i32,
    reply_to: Option<i32>,
    content: &str,
) -> Result<Comment, sqlx::Error> {
    sqlx::query_as::<_, Comment>(&format!(
        "INSERT INTO comments (post_id, user_id, reply_to, content) \
         VALUES ($1, $2, $3, $4) \
         RETURNING {COMMENT_COLUMNS}"
    ))
    .bind(post_id)
    .bind(user_id)
    .bind(reply_to)
    .bind(content)
    .fetch_one(pool)
    .await
}

pub async fn get_comment_by_id(pool: &PgPool, id: i32) -> Result<Option<Comment>, sqlx::Error> {
    sqlx::query_as::<_, Comment>(&format!(
        "SELECT {COMMENT_COLUMNS} FROM comments WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn update_content(
    pool: &PgPool,
    id: i32,
    content: &str,
) -> Result<Option<Comment>, sqlx::Error> {
    sqlx::query_as::<_, Comment>(&format!(
        "UPDATE comments SET content = $1 WHERE id = $2 RETURNING {COMMENT_COLUMNS}"
    ))
    .bind(content)
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn delete_comment(pool: &PgPool, id: i32) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM comments WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// All comments of a post as flat author-joined records, in the stable order
/// the hierarchy builder expects.
pub async fn comments_for_post(
    pool: &PgPool,
    post_id: i32,
) -> Result<Vec<CommentRecord>, sqlx::Error> {
    sqlx::query_as::<_, CommentRecord>(&record_query("c.post_id = $1"))
        .bind(post_id)
        .fetch_all(pool)
        .await
}

/// All comments a user has written, across posts.
pub async fn comments_by_user(
    pool: &PgPool,
    user_id: i32,
) -> Result<Vec<CommentRecord>, sqlx::Error> {
    sqlx::query_as::<_, CommentRecord>(&record_query("c.user_id = $1"))
        .bind(user_id)
        .fetch_all(pool)
        .await
}
