use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use log::warn;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::models::{PostEntry, User};

const POSTS_FILE: &str = "posts.json";
const SESSION_FILE: &str = "session.json";

/// Local persistence: two plain JSON files under one directory. This is a
/// cache, not a source of truth; the remote store stays authoritative and
/// the post list is rewritten wholesale after every sync and mutation.
pub struct LocalStore {
    base_dir: PathBuf,
}

impl LocalStore {
    pub fn open(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn open_default() -> Self {
        let base_dir = dirs::home_dir()
            .map(|home| home.join(".sociallog"))
            .unwrap_or_else(|| PathBuf::from(".sociallog"));
        Self::open(base_dir)
    }

    pub fn load_posts(&self) -> Option<Vec<PostEntry>> {
        self.load_json(POSTS_FILE)
    }

    pub fn save_posts(&self, posts: &[PostEntry]) {
        if let Err(err) = self.write_json(POSTS_FILE, &posts) {
            warn!("failed to write post cache: {err:#}");
        }
    }

    pub fn load_session(&self) -> Option<User> {
        self.load_json(SESSION_FILE)
    }

    pub fn save_session(&self, user: &User) {
        if let Err(err) = self.write_json(SESSION_FILE, user) {
            warn!("failed to write session: {err:#}");
        }
    }

    pub fn clear_session(&self) {
        let path = self.base_dir.join(SESSION_FILE);
        if path.exists() {
            if let Err(err) = fs::remove_file(&path) {
                warn!("failed to remove session file {}: {err}", path.display());
            }
        }
    }

    // Corrupt or unreadable cache files are discarded, never fatal.
    fn load_json<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        let path = self.base_dir.join(name);
        let raw = fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!("discarding corrupt cache file {}: {err}", path.display());
                None
            }
        }
    }

    fn write_json<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<()> {
        fs::create_dir_all(&self.base_dir)
            .with_context(|| format!("failed to create {}", self.base_dir.display()))?;
        let path = self.base_dir.join(name);
        let raw = serde_json::to_string(value)?;
        fs::write(&path, raw).with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }
}
