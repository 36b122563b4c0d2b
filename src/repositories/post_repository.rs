use sqlx::{PgPool, Postgres, Transaction};

use crate::models::{Post, PostDetail, PostSummary};

const POST_COLUMNS: &str = "id, user_id, name, description, media_key, leadsheet_key, created_at";

// Input data for creating a new post
pub struct CreatePostData {
    pub name: String,
    pub description: Option<String>,
    pub media_key: Option<String>,
    pub leadsheet_key: Option<String>,
    pub categories: Vec<i32>,
}

// Input data for a partial post edit; None leaves the field untouched.
#[derive(Default)]
pub struct UpdatePostData {
    pub name: Option<String>,
    pub description: Option<String>,
    pub media_key: Option<String>,
    pub leadsheet_key: Option<String>,
    pub categories: Option<Vec<i32>>,
}

/// How a post listing is ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PostSort {
    /// Insertion order (no explicit sort requested).
    #[default]
    None,
    /// Newest first.
    Date,
    /// Most likes gathered in the trailing 30 days first.
    RecentLikes,
}

impl PostSort {
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.eq_ignore_ascii_case("date") => PostSort::Date,
            Some(v) if v.eq_ignore_ascii_case("likes") => PostSort::RecentLikes,
            _ => PostSort::None,
        }
    }
}

pub struct PostFilter {
    pub user_id: Option<i32>,
    pub category_ids: Vec<i32>,
    pub name: Option<String>,
    pub sort: PostSort,
    pub limit: i64,
    pub offset: i64,
}

/// Inserts a post and its category links inside the caller's transaction.
pub async fn create_post(
    tx: &mut Transaction<'_, Postgres>,
    user_id: i32,
    data: CreatePostData,
) -> Result<Post, sqlx::Error> {
    let post = sqlx::query_as::<_, Post>(&format!(
        "INSERT INTO posts (user_id, name, description, media_key, leadsheet_key) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING {POST_COLUMNS}"
    ))
    .bind(user_id)
    .bind(&data.name)
    .bind(&data.description)
    .bind(&data.media_key)
    .bind(&data.leadsheet_key)
    .fetch_one(&mut **tx)
    .await?;

    replace_categories(tx, post.id, &data.categories).await?;
    Ok(post)
}

/// Applies a partial edit; category links are replaced only when a set is
/// supplied.
pub async fn update_post(
    tx: &mut Transaction<'_, Postgres>,
    post_id: i32,
    data: UpdatePostData,
) -> Result<Option<Post>, sqlx::Error> {
    let post = sqlx::query_as::<_, Post>(&format!(
        "UPDATE posts \
         SET name = COALESCE($1, name), \
             description = COALESCE($2, description), \
             media_key = COALESCE($3, media_key), \
             leadsheet_key = COALESCE($4, leadsheet_key) \
         WHERE id = $5 \
         RETURNING {POST_COLUMNS}"
    ))
    .bind(&data.name)
    .bind(&data.description)
    .bind(&data.media_key)
    .bind(&data.leadsheet_key)
    .bind(post_id)
    .fetch_optional(&mut **tx)
    .await?;

    if post.is_some() {
        if let Some(categories) = &data.categories {
            replace_categories(tx, post_id, categories).await?;
        }
    }
    Ok(post)
}

async fn replace_categories(
    tx: &mut Transaction<'_, Postgres>,
    post_id: i32,
    categories: &[i32],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM post_categories WHERE post_id = $1")
        .bind(post_id)
        .execute(&mut **tx)
        .await?;

    if !categories.is_empty() {
        sqlx::query(
            "INSERT INTO post_categories (post_id, category_id) \
             SELECT $1, unnest($2::int[]) \
             ON CONFLICT DO NOTHING",
        )
        .bind(post_id)
        .bind(categories)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

pub async fn get_post_by_id(pool: &PgPool, post_id: i32) -> Result<Option<Post>, sqlx::Error> {
    sqlx::query_as::<_, Post>(&format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1"))
        .bind(post_id)
        .fetch_optional(pool)
        .await
}

/// Fetches the post page row joined with its author.
pub async fn get_post_detail(pool: &PgPool, post_id: i32) -> Result<Option<PostDetail>, sqlx::Error> {
    sqlx::query_as::<_, PostDetail>(
        "SELECT p.id, p.user_id, p.name, p.description, p.media_key, p.leadsheet_key, \
                p.created_at, u.login AS author_login, u.avatar_key AS author_avatar_key \
         FROM posts p \
         JOIN users u ON u.id = p.user_id \
         WHERE p.id = $1",
    )
    .bind(post_id)
    .fetch_optional(pool)
    .await
}

/// Lists posts matching the filter. A post matches the category filter only
/// when it carries every requested category.
pub async fn list_posts(pool: &PgPool, filter: &PostFilter) -> Result<Vec<PostSummary>, sqlx::Error> {
    let sort = match filter.sort {
        PostSort::None => "",
        PostSort::Date => "date",
        PostSort::RecentLikes => "likes",
    };

    sqlx::query_as::<_, PostSummary>(
        "SELECT p.id, p.user_id, p.name, p.media_key, u.login AS author_login \
         FROM posts p \
         JOIN users u ON u.id = p.user_id \
         WHERE ($1::int IS NULL OR p.user_id = $1) \
           AND ($2::text IS NULL OR p.name ILIKE '%' || $2 || '%') \
           AND (cardinality($3::int[]) = 0 OR ( \
                 SELECT COUNT(DISTINCT pc.category_id) FROM post_categories pc \
                 WHERE pc.post_id = p.id AND pc.category_id = ANY($3)) \
               = cardinality($3::int[])) \
         ORDER BY \
           CASE WHEN $4 = 'likes' THEN ( \
             SELECT COUNT(*) FROM likes l \
             WHERE l.post_id = p.id AND l.created_at > now() - interval '30 days') \
           END DESC NULLS LAST, \
           CASE WHEN $4 = 'date' THEN p.created_at END DESC NULLS LAST, \
           p.id ASC \
         LIMIT $5 OFFSET $6",
    )
    .bind(filter.user_id)
    .bind(&filter.name)
    .bind(&filter.category_ids)
    .bind(sort)
    .bind(filter.limit)
    .bind(filter.offset)
    .fetch_all(pool)
    .await
}

pub async fn posts_by_user(pool: &PgPool, user_id: i32) -> Result<Vec<PostSummary>, sqlx::Error> {
    sqlx::query_as::<_, PostSummary>(
        "SELECT p.id, p.user_id, p.name, p.media_key, u.login AS author_login \
         FROM posts p \
         JOIN users u ON u.id = p.user_id \
         WHERE p.user_id = $1 \
         ORDER BY p.created_at DESC, p.id DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Category ids for a set of posts, for assembling preview DTOs without an
/// N+1 query.
pub async fn categories_for_posts(
    pool: &PgPool,
    post_ids: &[i32],
) -> Result<Vec<(i32, i32)>, sqlx::Error> {
    sqlx::query_as::<_, (i32, i32)>(
        "SELECT post_id, category_id FROM post_categories WHERE post_id = ANY($1) \
         ORDER BY post_id, category_id",
    )
    .bind(post_ids)
    .fetch_all(pool)
    .await
}

pub async fn delete_post(pool: &PgPool, post_id: i32) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM posts WHERE id = $1")
        .bind(post_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
