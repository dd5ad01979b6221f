use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use lazy_static::lazy_static;
use log::error;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::{Endpoint, SocialLogConfig};
use crate::identity;
use crate::models::{
    self, ApiResponse, BackendPost, CreatedPost, DeletedPost, EmployeeRow, ImagePayload,
    PostEntry, PostType, SaveOutcome, User,
};

// Localized messages surfaced to the user for their own actions. Backend
// error strings take precedence when present.
pub const MSG_SAVED: &str = "บันทึกสำเร็จ";
pub const MSG_DELETED: &str = "ลบสำเร็จ";
pub const MSG_GENERIC_ERROR: &str = "เกิดข้อผิดพลาด";
pub const MSG_SAVE_FAILED: &str = "เกิดข้อผิดพลาดในการบันทึกข้อมูล";
pub const MSG_DELETE_FAILED: &str = "เกิดข้อผิดพลาดในการลบข้อมูล";
pub const MSG_CONFIG_MISSING: &str = "ไม่พบการตั้งค่า API";

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("API URL or token not configured")]
    NotConfigured,
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected response: {0}")]
    Malformed(String),
}

lazy_static! {
    // Image fetches share one plain client instead of borrowing a RemoteClient.
    static ref SHARED_CLIENT: Client = Client::new();
}

/// Process-lifetime cache for the post-type vocabulary. Populated on the
/// first successful fetch, served from memory afterwards, refreshed only
/// through an explicit `invalidate`.
#[derive(Clone, Default)]
pub struct PostTypeCache {
    inner: Arc<Mutex<Option<Vec<PostType>>>>,
}

impl PostTypeCache {
    pub fn get_or_fetch(
        &self,
        fetch: impl FnOnce() -> Result<Vec<PostType>, RemoteError>,
    ) -> Vec<PostType> {
        {
            let cached = self.inner.lock().unwrap();
            if let Some(types) = cached.as_ref() {
                return types.clone();
            }
        }
        match fetch() {
            Ok(types) => {
                *self.inner.lock().unwrap() = Some(types.clone());
                types
            }
            Err(err) => {
                error!("failed to fetch post types: {err}");
                Vec::new()
            }
        }
    }

    pub fn invalidate(&self) {
        *self.inner.lock().unwrap() = None;
    }
}

/// Thin wrapper around the backend's action-based HTTP API. Cloneable so
/// background tasks can carry their own handle.
#[derive(Clone)]
pub struct RemoteClient {
    config: SocialLogConfig,
    client: Client,
    post_types: PostTypeCache,
}

impl RemoteClient {
    pub fn new(config: SocialLogConfig) -> Self {
        Self {
            config,
            client: Client::new(),
            post_types: PostTypeCache::default(),
        }
    }

    fn backend(&self) -> Result<&Endpoint, RemoteError> {
        self.config.backend.as_ref().ok_or(RemoteError::NotConfigured)
    }

    /// Background-load contract: failures are logged and become an empty
    /// list, never an error to the caller.
    pub fn list_posts(&self) -> Vec<PostEntry> {
        match self.try_list_posts() {
            Ok(posts) => posts,
            Err(err) => {
                error!("failed to fetch posts from backend: {err}");
                Vec::new()
            }
        }
    }

    /// Fallible variant for callers that must distinguish "empty" from
    /// "failed" (the store keeps its previous list on a failed sync).
    pub fn try_list_posts(&self) -> Result<Vec<PostEntry>, RemoteError> {
        let endpoint = self.backend()?;
        let response = self
            .client
            .get(&endpoint.url)
            .query(&[("action", "list_posts"), ("token", endpoint.token.as_str())])
            .send()?
            .error_for_status()?;
        let body: ApiResponse<Vec<BackendPost>> = response.json()?;
        let rows = unwrap_data(body)?;
        Ok(models::entries_from_rows(rows))
    }

    /// Persists a composed post. The inline image travels base64-encoded
    /// with its MIME type and a filename derived from the post id.
    pub fn create_post(
        &self,
        post: &PostEntry,
        user_email: &str,
        employee_code: Option<&str>,
    ) -> SaveOutcome {
        let endpoint = match self.backend() {
            Ok(endpoint) => endpoint,
            Err(err) => {
                error!("create_post: {err}");
                return SaveOutcome::failure(MSG_CONFIG_MISSING);
            }
        };

        let (image_mime, image_base64, image_name) = match post.image_data.as_deref() {
            Some(raw) if !raw.is_empty() => {
                let (mime, data) = models::split_data_uri(raw);
                let name = format!("{}.{}", post.id, models::mime_extension(&mime));
                (mime, data, name)
            }
            _ => (
                "image/png".to_string(),
                String::new(),
                format!("{}.png", post.id),
            ),
        };

        let mut body = json!({
            "action": "create_post",
            "token": endpoint.token,
            "employee_email": user_email,
            "caption": post.description,
            "tags": post.tags,
            "image_base64": image_base64,
            "image_name": image_name,
            "image_mime": image_mime,
        });
        if let Some(code) = employee_code {
            body["employee_code"] = json!(code);
        }
        if let Some(post_type) = post.post_type.as_deref() {
            body["post_type"] = json!(post_type);
        }
        if let Some(post_url) = post.post_url.as_deref() {
            body["post_url"] = json!(post_url);
        }

        match self.post_plain_json::<ApiResponse<CreatedPost>>(&endpoint.url, &body) {
            Ok(response) if response.ok => SaveOutcome {
                success: true,
                message: Some(MSG_SAVED.to_string()),
                post_id: response.data.map(|data| data.post_id),
            },
            Ok(response) => SaveOutcome::failure(
                response.error.unwrap_or_else(|| MSG_GENERIC_ERROR.to_string()),
            ),
            Err(err) => {
                error!("failed to save post {}: {err}", post.id);
                SaveOutcome::failure(MSG_SAVE_FAILED)
            }
        }
    }

    /// Logical delete; the record stays server-side with a DELETED status.
    pub fn delete_post(&self, post_id: &str, user_email: &str) -> SaveOutcome {
        let endpoint = match self.backend() {
            Ok(endpoint) => endpoint,
            Err(err) => {
                error!("delete_post: {err}");
                return SaveOutcome::failure(MSG_CONFIG_MISSING);
            }
        };

        let body = json!({
            "action": "delete_post",
            "token": endpoint.token,
            "employee_email": user_email,
            "post_id": post_id,
        });

        match self.post_plain_json::<ApiResponse<DeletedPost>>(&endpoint.url, &body) {
            Ok(response) if response.ok => SaveOutcome {
                success: true,
                message: Some(MSG_DELETED.to_string()),
                post_id: response.data.map(|data| data.post_id),
            },
            Ok(response) => SaveOutcome::failure(
                response.error.unwrap_or_else(|| MSG_GENERIC_ERROR.to_string()),
            ),
            Err(err) => {
                error!("failed to delete post {post_id}: {err}");
                SaveOutcome::failure(MSG_DELETE_FAILED)
            }
        }
    }

    /// Cached vocabulary of post types; empty on fetch failure.
    pub fn post_types(&self) -> Vec<PostType> {
        self.post_types.get_or_fetch(|| self.try_list_post_types())
    }

    /// Forces the next `post_types` call to refetch.
    pub fn invalidate_post_types(&self) {
        self.post_types.invalidate();
    }

    fn try_list_post_types(&self) -> Result<Vec<PostType>, RemoteError> {
        let endpoint = self.backend()?;
        let response = self
            .client
            .get(&endpoint.url)
            .query(&[
                ("action", "list_post_types"),
                ("token", endpoint.token.as_str()),
            ])
            .send()?
            .error_for_status()?;
        let body: ApiResponse<Vec<PostType>> = response.json()?;
        unwrap_data(body)
    }

    /// Employee code → nickname map used to relabel aggregation output.
    pub fn list_employees(&self) -> HashMap<String, String> {
        match self.try_list_employees() {
            Ok(map) => map,
            Err(err) => {
                error!("failed to fetch employee directory: {err}");
                HashMap::new()
            }
        }
    }

    fn try_list_employees(&self) -> Result<HashMap<String, String>, RemoteError> {
        let endpoint = self.backend()?;
        let response = self
            .client
            .get(&endpoint.url)
            .query(&[
                ("action", "list_employees"),
                ("token", endpoint.token.as_str()),
            ])
            .send()?
            .error_for_status()?;
        let body: ApiResponse<Vec<EmployeeRow>> = response.json()?;
        let rows = unwrap_data(body)?;
        Ok(rows
            .into_iter()
            .filter_map(|row| match (row.employee_code, row.nickname) {
                (Some(code), Some(nickname)) if !code.is_empty() && !nickname.is_empty() => {
                    Some((code, nickname))
                }
                _ => None,
            })
            .collect())
    }

    /// Resolves an opaque remote file reference to an inline data URI via
    /// the image proxy. None on any failure.
    pub fn fetch_image(&self, file_id: &str) -> Option<String> {
        let endpoint = match self.backend() {
            Ok(endpoint) => endpoint,
            Err(err) => {
                error!("fetch_image: {err}");
                return None;
            }
        };
        fetch_image_as_data_uri(&endpoint.url, file_id)
    }

    /// Verifies an identity credential against the separate auth endpoint
    /// and normalizes the loosely-cased user payload.
    pub fn verify_credential(&self, credential: &str) -> Result<User, RemoteError> {
        let endpoint = self.config.auth.as_ref().ok_or(RemoteError::NotConfigured)?;
        let response = self
            .client
            .get(&endpoint.url)
            .query(&[
                ("token", endpoint.token.as_str()),
                ("action", "verify"),
                ("app_id", self.config.app_id.as_str()),
                ("credential", credential),
            ])
            .header(CONTENT_TYPE, "text/plain;charset=utf-8")
            .send()?
            .error_for_status()?;
        let body: Value = response.json()?;

        if body.get("ok").and_then(Value::as_bool).unwrap_or(false) {
            let user = body
                .get("user")
                .ok_or_else(|| RemoteError::Malformed("missing user object".to_string()))?;
            Ok(identity::user_from_verify_payload(user, body.get("employee")))
        } else {
            let message = body
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("identity verification failed");
            Err(RemoteError::Malformed(message.to_string()))
        }
    }

    // Writes go out as JSON text under a simple content type so the browser
    // build of this protocol never triggers a CORS preflight; the backend
    // parses the body regardless.
    fn post_plain_json<T: DeserializeOwned>(
        &self,
        url: &str,
        body: &Value,
    ) -> Result<T, RemoteError> {
        let payload =
            serde_json::to_string(body).map_err(|err| RemoteError::Malformed(err.to_string()))?;
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "text/plain")
            .body(payload)
            .send()?
            .error_for_status()?;
        Ok(response.json()?)
    }
}

/// GET `action=get_image&file_id=…` (tokenless) on the shared client and
/// assemble the displayable payload.
pub fn fetch_image_as_data_uri(base_url: &str, file_id: &str) -> Option<String> {
    let result: Result<ImagePayload, RemoteError> = (|| {
        let response = SHARED_CLIENT
            .get(base_url)
            .query(&[("action", "get_image"), ("file_id", file_id)])
            .send()?
            .error_for_status()?;
        Ok(response.json()?)
    })();

    match result {
        Ok(payload) if payload.ok => {
            let data = payload.data.filter(|data| !data.is_empty())?;
            let mime = payload
                .content_type
                .unwrap_or_else(|| "image/png".to_string());
            Some(format!("data:{mime};base64,{data}"))
        }
        Ok(_) => None,
        Err(err) => {
            error!("failed to fetch image {file_id}: {err}");
            None
        }
    }
}

fn unwrap_data<T>(body: ApiResponse<T>) -> Result<T, RemoteError> {
    if !body.ok {
        return Err(RemoteError::Malformed(
            body.error
                .unwrap_or_else(|| "backend reported failure".to_string()),
        ));
    }
    body.data
        .ok_or_else(|| RemoteError::Malformed("missing data field".to_string()))
}
