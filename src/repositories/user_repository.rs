use sqlx::PgPool;

use crate::models::User;

const USER_COLUMNS: &str = "id, email, login, first_name, last_name, password_hash, avatar_key";

// Input data for creating a new user
pub struct NewUser {
    pub email: String,
    pub login: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
}

// Profile fields a user may change about themselves
pub struct UpdateProfileData {
    pub email: String,
    pub login: String,
    pub first_name: String,
    pub last_name: String,
    pub avatar_key: Option<String>,
}

/// Inserts a new user row.
pub async fn create_user(pool: &PgPool, data: NewUser) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (email, login, first_name, last_name, password_hash) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING {USER_COLUMNS}"
    ))
    .bind(&data.email)
    .bind(&data.login)
    .bind(&data.first_name)
    .bind(&data.last_name)
    .bind(&data.password_hash)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_login(pool: &PgPool, login: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE login = $1"
    ))
    .bind(login)
    .fetch_optional(pool)
    .await
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
    ))
    .bind(email)
    .fetch_optional(pool)
    .await
}

/// Updates the profile fields, returning the fresh row.
pub async fn update_profile(
    pool: &PgPool,
    id: i32,
    data: UpdateProfileData,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "UPDATE users \
         SET email = $1, login = $2, first_name = $3, last_name = $4, \
             avatar_key = COALESCE($5, avatar_key) \
         WHERE id = $6 \
         RETURNING {USER_COLUMNS}"
    ))
    .bind(&data.email)
    .bind(&data.login)
    .bind(&data.first_name)
    .bind(&data.last_name)
    .bind(&data.avatar_key)
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn update_password(
    pool: &PgPool,
    id: i32,
    password_hash: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
        .bind(password_hash)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Deletes the account. Posts (and their comment trees) cascade away;
/// comments the user left elsewhere are detached via ON DELETE SET NULL and
/// keep rendering under the deleted-author placeholder.
pub async fn delete_user(pool: &PgPool, id: i32) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
