use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{DateTime, NaiveDateTime};
use lazy_static::lazy_static;
use log::warn;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const STATUS_ACTIVE: &str = "ACTIVE";
pub const STATUS_DELETED: &str = "DELETED";

/// One logged social-media post, as the client holds it in memory and in
/// the local cache. `image_data` and `image_file_id` are alternatives: a
/// freshly composed post carries the inline payload, a post listed from the
/// backend carries the remote reference until the lazy loader resolves it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostEntry {
    pub id: String,
    #[serde(default)]
    pub image_data: Option<String>,
    #[serde(default)]
    pub image_file_id: Option<String>,
    pub description: String,
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub post_type: Option<String>,
    #[serde(default)]
    pub post_url: Option<String>,
    pub timestamp: i64,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub created_by_email: String,
}

impl PostEntry {
    /// Tags are stored as one space-delimited string; a leading `#` on a
    /// token is cosmetic and dropped.
    pub fn tag_list(&self) -> Vec<&str> {
        self.tags
            .split_whitespace()
            .map(|tag| tag.trim_start_matches('#'))
            .filter(|tag| !tag.is_empty())
            .collect()
    }
}

/// Server-defined post category. Read-only reference data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostType {
    pub type_id: String,
    pub type_name: String,
    #[serde(default)]
    pub display_order: i64,
    #[serde(default)]
    pub is_active: bool,
}

/// Verified session identity, persisted locally across restarts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub employee_code: Option<String>,
}

/// Envelope every backend action responds with.
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: serde::Deserialize<'de>"))]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
}

/// One spreadsheet row as `action=list_posts` returns it. Column names must
/// match the backend's header configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendPost {
    pub post_id: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub created_by: String,
    #[serde(default)]
    pub created_by_email: String,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub post_type: String,
    #[serde(default)]
    pub post_url: String,
    #[serde(default)]
    pub image_file_id: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatedPost {
    pub post_id: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeletedPost {
    #[serde(default)]
    pub post_id: String,
    #[serde(default)]
    pub deleted: bool,
}

/// `action=get_image` proxy payload.
#[derive(Debug, Clone, Deserialize)]
pub struct ImagePayload {
    pub ok: bool,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(rename = "contentType", default)]
    pub content_type: Option<String>,
}

/// One directory row from `action=list_employees`. Rows missing either
/// field are skipped when building the directory.
#[derive(Debug, Clone, Deserialize)]
pub struct EmployeeRow {
    #[serde(default)]
    pub employee_code: Option<String>,
    #[serde(default)]
    pub nickname: Option<String>,
}

/// Result of a user-initiated mutation, carrying a localized message the
/// embedding shell can surface directly.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveOutcome {
    pub success: bool,
    pub message: Option<String>,
    pub post_id: Option<String>,
}

impl SaveOutcome {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            post_id: None,
        }
    }
}

lazy_static! {
    static ref DATA_URI_RE: Regex =
        Regex::new(r"^data:([^;]+);base64,(.+)$").expect("data URI pattern");
    static ref FILE_ID_RE: Regex =
        Regex::new(r"[?&]id=([a-zA-Z0-9_-]+)").expect("file id pattern");
}

impl BackendPost {
    /// Maps a wire row to the in-memory shape. The explicit file-id column
    /// wins over an id embedded in the hosting URL; an unparseable
    /// `created_at` keeps the row with timestamp 0 rather than dropping it.
    pub fn into_entry(self) -> PostEntry {
        let timestamp = match parse_created_at_ms(&self.created_at) {
            Some(ts) => ts,
            None => {
                warn!(
                    "unparseable created_at {:?} on post {}",
                    self.created_at, self.post_id
                );
                0
            }
        };
        let image_file_id = if self.image_file_id.is_empty() {
            extract_file_id(&self.image_url)
        } else {
            Some(self.image_file_id)
        };
        PostEntry {
            id: self.post_id,
            image_data: None,
            image_file_id,
            description: self.caption,
            tags: self.tags,
            post_type: non_empty(self.post_type),
            post_url: non_empty(self.post_url),
            timestamp,
            created_by: non_empty(self.created_by),
            created_by_email: self.created_by_email,
        }
    }
}

/// Rows the server still reports as deleted are dropped here; the client
/// never resurrects a soft-deleted post.
pub fn entries_from_rows(rows: Vec<BackendPost>) -> Vec<PostEntry> {
    rows.into_iter()
        .filter(|row| row.status != STATUS_DELETED)
        .map(BackendPost::into_entry)
        .collect()
}

pub(crate) fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// The spreadsheet serializes creation times as RFC 3339; older rows use a
/// bare `YYYY-MM-DD HH:MM:SS` and are read as UTC.
pub fn parse_created_at_ms(raw: &str) -> Option<i64> {
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.timestamp_millis());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc().timestamp_millis());
    }
    None
}

/// Pulls the opaque file id out of an image hosting URL (`…?id=<file_id>`).
pub fn extract_file_id(url: &str) -> Option<String> {
    FILE_ID_RE
        .captures(url)
        .map(|caps| caps[1].to_string())
}

/// Splits an inline payload into `(mime, bare base64)`. Payloads without a
/// data-URI prefix are assumed to already be bare base64 PNG data.
pub fn split_data_uri(raw: &str) -> (String, String) {
    match DATA_URI_RE.captures(raw) {
        Some(caps) => (caps[1].to_string(), caps[2].to_string()),
        None => ("image/png".to_string(), raw.to_string()),
    }
}

/// Extension for an upload filename, from the MIME subtype.
pub fn mime_extension(mime: &str) -> &str {
    mime.split('/')
        .nth(1)
        .filter(|ext| !ext.is_empty())
        .unwrap_or("png")
}

/// Headless counterpart of reading a picked file into a displayable form.
pub fn to_data_uri(bytes: &[u8], mime: &str) -> String {
    format!("data:{mime};base64,{}", BASE64.encode(bytes))
}
