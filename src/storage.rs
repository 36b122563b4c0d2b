//! Presigned URL issuing for the media bucket.
//!
//! The service never touches the bucket itself: clients upload and download
//! directly using URLs signed here with HMAC-SHA256 over the method, object
//! key and expiry.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::Utc;
use constant_time_eq::constant_time_eq;
use uuid::Uuid;

use crate::models::UploadTicketDto;

/// Upload URLs are short-lived; the client PUTs right after asking.
const UPLOAD_TTL_SECS: i64 = 15 * 60;
/// Download URLs live long enough to cover a browsing session.
const DOWNLOAD_TTL_SECS: i64 = 10 * 60 * 60;

/// What is being uploaded; decides the key prefix in the bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Image,
    Leadsheet,
}

impl MediaKind {
    fn prefix(self) -> &'static str {
        match self {
            MediaKind::Video => "videos",
            MediaKind::Image => "images",
            MediaKind::Leadsheet => "leadsheets",
        }
    }
}

#[derive(Clone)]
pub struct MediaStorage {
    base_url: String,
    secret: Vec<u8>,
}

impl MediaStorage {
    pub fn new(base_url: String, secret: impl Into<Vec<u8>>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            secret: secret.into(),
        }
    }

    /// Issues an upload ticket for a new object. The returned `key` is the
    /// bare object name (no prefix); it is what gets stored on the post row.
    pub fn issue_upload(&self, kind: MediaKind, filename: &str) -> UploadTicketDto {
        let key = format!("{}-{}", Uuid::new_v4(), filename);
        let object = format!("{}/{}", kind.prefix(), key);
        let upload_url = self.sign_url("PUT", &object, UPLOAD_TTL_SECS);
        UploadTicketDto { key, upload_url }
    }

    /// Preview image derived from a media key: extension rewritten to `.jpg`
    /// under the image prefix (the thumbnailer stores it there).
    pub fn preview_url(&self, media_key: Option<&str>) -> Option<String> {
        let key = non_empty(media_key)?;
        let object = format!("images/{}", rewrite_extension(key, "jpg"));
        Some(self.sign_url("GET", &object, DOWNLOAD_TTL_SECS))
    }

    /// Playable media derived from a media key: extension rewritten to
    /// `.mp4` under the video prefix (the transcoder stores it there).
    pub fn media_url(&self, media_key: Option<&str>) -> Option<String> {
        let key = non_empty(media_key)?;
        let object = format!("videos/{}", rewrite_extension(key, "mp4"));
        Some(self.sign_url("GET", &object, DOWNLOAD_TTL_SECS))
    }

    pub fn leadsheet_url(&self, leadsheet_key: Option<&str>) -> Option<String> {
        let key = non_empty(leadsheet_key)?;
        let object = format!("leadsheets/{key}");
        Some(self.sign_url("GET", &object, DOWNLOAD_TTL_SECS))
    }

    pub fn avatar_url(&self, avatar_key: Option<&str>) -> Option<String> {
        let key = non_empty(avatar_key)?;
        let object = format!("images/{key}");
        Some(self.sign_url("GET", &object, DOWNLOAD_TTL_SECS))
    }

    /// Checks a signature produced by [`Self::sign_url`]. Used by whatever
    /// fronts the bucket; exposed here so the scheme is testable end to end.
    pub fn verify(&self, method: &str, object: &str, expires: i64, signature: &str) -> bool {
        if expires <= Utc::now().timestamp() {
            return false;
        }
        let expected = self.signature(method, object, expires);
        constant_time_eq(expected.as_bytes(), signature.as_bytes())
    }

    fn sign_url(&self, method: &str, object: &str, ttl_secs: i64) -> String {
        let expires = Utc::now().timestamp() + ttl_secs;
        let signature = self.signature(method, object, expires);
        format!(
            "{}/{}?expires={}&signature={}",
            self.base_url, object, expires, signature
        )
    }

    fn signature(&self, method: &str, object: &str, expires: i64) -> String {
        let payload = format!("{method}\n{object}\n{expires}");
        URL_SAFE_NO_PAD.encode(hmac_sha256::HMAC::mac(payload.as_bytes(), &self.secret))
    }
}

fn non_empty(key: Option<&str>) -> Option<&str> {
    key.map(str::trim).filter(|k| !k.is_empty())
}

/// Replaces the final extension with `ext`; keys without an extension are
/// left untouched.
fn rewrite_extension(key: &str, ext: &str) -> String {
    match key.rfind('.') {
        Some(dot) => format!("{}.{ext}", &key[..dot]),
        None => key.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage() -> MediaStorage {
        MediaStorage::new("https://media.example.com/".to_string(), "test-secret")
    }

    fn parse_url(url: &str) -> (String, i64, String) {
        let (path, query) = url.split_once('?').unwrap();
        let mut expires = 0;
        let mut signature = String::new();
        for pair in query.split('&') {
            let (k, v) = pair.split_once('=').unwrap();
            match k {
                "expires" => expires = v.parse().unwrap(),
                "signature" => signature = v.to_string(),
                _ => {}
            }
        }
        (path.to_string(), expires, signature)
    }

    #[test]
    fn upload_ticket_points_at_prefixed_object() {
        let ticket = storage().issue_upload(MediaKind::Video, "song.mov");
        assert!(ticket.key.ends_with("-song.mov"));
        assert!(!ticket.key.contains('/'));
        assert!(ticket
            .upload_url
            .starts_with("https://media.example.com/videos/"));
        assert!(ticket.upload_url.contains(&ticket.key));
    }

    #[test]
    fn signed_url_verifies() {
        let storage = storage();
        let url = storage.sign_url("GET", "videos/abc.mp4", 60);
        let (path, expires, signature) = parse_url(&url);
        assert_eq!(path, "https://media.example.com/videos/abc.mp4");
        assert!(storage.verify("GET", "videos/abc.mp4", expires, &signature));
    }

    #[test]
    fn verification_rejects_wrong_method_object_or_expiry() {
        let storage = storage();
        let url = storage.sign_url("PUT", "videos/abc.mp4", 60);
        let (_, expires, signature) = parse_url(&url);

        assert!(!storage.verify("GET", "videos/abc.mp4", expires, &signature));
        assert!(!storage.verify("PUT", "videos/other.mp4", expires, &signature));
        assert!(!storage.verify("PUT", "videos/abc.mp4", expires + 1, &signature));
        // an expiry in the past fails even with a matching signature
        assert!(!storage.verify("PUT", "videos/abc.mp4", -1, &signature));
    }

    #[test]
    fn preview_and_media_urls_rewrite_the_extension() {
        let storage = storage();
        let preview = storage.preview_url(Some("abc-song.mov")).unwrap();
        assert!(preview.contains("/images/abc-song.jpg?"));

        let media = storage.media_url(Some("abc-song.mov")).unwrap();
        assert!(media.contains("/videos/abc-song.mp4?"));

        // no extension: key is used as-is
        let preview = storage.preview_url(Some("rawkey")).unwrap();
        assert!(preview.contains("/images/rawkey?"));
    }

    #[test]
    fn blank_keys_yield_no_url() {
        let storage = storage();
        assert!(storage.preview_url(None).is_none());
        assert!(storage.preview_url(Some("")).is_none());
        assert!(storage.media_url(Some("   ")).is_none());
        assert!(storage.leadsheet_url(None).is_none());
        assert!(storage.avatar_url(Some("")).is_none());
    }
}
