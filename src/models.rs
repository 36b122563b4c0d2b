use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Placeholder author name rendered for comments whose account was deleted.
pub const DELETED_AUTHOR: &str = "[deleted]";

/// A registered account.
#[derive(Serialize, Deserialize, Debug, Clone, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i32,
    pub email: String,
    pub login: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub avatar_key: Option<String>,
}

/// A post: an uploaded piece of media plus its metadata. Media itself lives
/// in the bucket under `media_key`/`leadsheet_key`.
#[derive(Serialize, Deserialize, Debug, Clone, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i32,
    pub user_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub media_key: Option<String>,
    pub leadsheet_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Post row joined with its author, used for list views.
#[derive(Debug, Clone, FromRow)]
pub struct PostSummary {
    pub id: i32,
    pub user_id: i32,
    pub name: String,
    pub media_key: Option<String>,
    pub author_login: String,
}

/// Post row joined with everything the post page needs.
#[derive(Debug, Clone, FromRow)]
pub struct PostDetail {
    pub id: i32,
    pub user_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub media_key: Option<String>,
    pub leadsheet_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub author_login: String,
    pub author_avatar_key: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, FromRow)]
pub struct Category {
    pub id: i32,
    pub name: String,
}

/// A comment row as stored.
#[derive(Serialize, Deserialize, Debug, Clone, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i32,
    pub post_id: i32,
    pub user_id: Option<i32>,
    pub reply_to: Option<i32>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Flat comment row joined with its author, the input shape consumed by the
/// hierarchy builder. `author_login` is coalesced to [`DELETED_AUTHOR`] when
/// the account is gone.
#[derive(Debug, Clone, FromRow)]
pub struct CommentRecord {
    pub id: i32,
    pub post_id: i32,
    pub user_id: Option<i32>,
    pub reply_to: Option<i32>,
    pub content: String,
    pub author_login: String,
    pub author_avatar_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Presentation shape of a single comment, as serialized in API responses.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CommentDto {
    pub id: i32,
    pub content: String,
    pub post_id: i32,
    pub reply_to_id: Option<i32>,
    pub user_id: Option<i32>,
    pub user_name: String,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl CommentDto {
    pub fn from_record(record: &CommentRecord, avatar_url: Option<String>) -> Self {
        Self {
            id: record.id,
            content: record.content.clone(),
            post_id: record.post_id,
            reply_to_id: record.reply_to,
            user_id: record.user_id,
            user_name: record.author_login.clone(),
            avatar_url,
            created_at: record.created_at,
        }
    }
}

/// Compact post representation for list endpoints.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PostPreviewDto {
    pub id: i32,
    pub name: String,
    pub author_name: String,
    pub preview_url: Option<String>,
    pub categories: Vec<i32>,
}

/// Full post page representation with presigned media URLs.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PostPageDto {
    pub id: i32,
    pub name: String,
    pub author_name: String,
    pub description: Option<String>,
    pub categories: Vec<i32>,
    pub preview_url: Option<String>,
    pub post_url: Option<String>,
    pub leadsheet_url: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Public view of a user, never carrying the password hash.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PublicUserDto {
    pub id: i32,
    pub login: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub avatar_url: Option<String>,
}

impl PublicUserDto {
    pub fn from_user(user: &User, avatar_url: Option<String>) -> Self {
        Self {
            id: user.id,
            login: user.login.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            avatar_url,
        }
    }
}

/// Login response: the bearer token plus the login it was issued for.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoggedInDto {
    pub token: String,
    pub login: String,
}

/// Presigned upload ticket: the key to store in the post and the URL to PUT
/// the file to.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UploadTicketDto {
    pub key: String,
    pub upload_url: String,
}
