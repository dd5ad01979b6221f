use std::env;
use std::path::PathBuf;

/// One backend endpoint plus the shared token embedded in its requests.
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub url: String,
    pub token: String,
}

/// Runtime configuration, read once from the environment. A missing URL or
/// token is not an error here: the affected remote operations short-circuit
/// with a failure result instead.
#[derive(Debug, Clone)]
pub struct SocialLogConfig {
    /// Posting backend (`action=create_post` and friends).
    pub backend: Option<Endpoint>,
    /// Identity-verification endpoint; separate base URL and token.
    pub auth: Option<Endpoint>,
    pub app_id: String,
    /// Override for the local cache directory; defaults to `~/.sociallog`.
    pub data_dir: Option<PathBuf>,
}

impl SocialLogConfig {
    pub fn from_env() -> Self {
        Self {
            backend: endpoint_from_env("SOCIALLOG_API_URL", "SOCIALLOG_API_TOKEN"),
            auth: endpoint_from_env("SOCIALLOG_AUTH_URL", "SOCIALLOG_AUTH_TOKEN"),
            app_id: env::var("SOCIALLOG_APP_ID").unwrap_or_else(|_| default_app_id()),
            data_dir: env::var("SOCIALLOG_DATA_DIR").ok().map(PathBuf::from),
        }
    }

    /// Empty configuration; every remote call reports the missing setup.
    pub fn unconfigured() -> Self {
        Self {
            backend: None,
            auth: None,
            app_id: default_app_id(),
            data_dir: None,
        }
    }
}

fn endpoint_from_env(url_var: &str, token_var: &str) -> Option<Endpoint> {
    let url = env::var(url_var).ok().filter(|v| !v.is_empty())?;
    let token = env::var(token_var).ok().filter(|v| !v.is_empty())?;
    Some(Endpoint { url, token })
}

fn default_app_id() -> String {
    "ksp-sociallog".to_string()
}
