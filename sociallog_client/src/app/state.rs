use chrono::{Datelike, NaiveDate};

use crate::models::PostType;

/// Which screen the embedding shell is presenting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewState {
    #[default]
    Login,
    Form,
    List,
    Dashboard,
}

/// Post-store lifecycle: local caches are loaded first as a pre-paint
/// placeholder, then a signed-in session triggers one authoritative sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncPhase {
    #[default]
    Uninitialized,
    Syncing,
    Idle,
}

#[derive(Default)]
pub struct LoginState {
    pub processing: bool,
    pub error: Option<String>,
}

#[derive(Default)]
pub struct PostFormState {
    pub description: String,
    pub tags: String,
    pub post_type: String,
    pub post_url: String,
    pub image_data: Option<String>,
    pub submitting: bool,
    pub error: Option<String>,
    pub save_success: bool,
    pub post_types: Vec<PostType>,
}

impl PostFormState {
    /// Clears the draft after a successful save; the type vocabulary stays.
    pub fn reset(&mut self) {
        self.description.clear();
        self.tags.clear();
        self.post_type.clear();
        self.post_url.clear();
        self.image_data = None;
        self.submitting = false;
        self.error = None;
        self.save_success = false;
    }
}

pub struct DashboardState {
    pub selected_month: (i32, u32),
    pub selected_day: NaiveDate,
}

impl DashboardState {
    pub fn for_today(today: NaiveDate) -> Self {
        Self {
            selected_month: (today.year(), today.month()),
            selected_day: today,
        }
    }
}
