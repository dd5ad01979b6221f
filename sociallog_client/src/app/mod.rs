use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};

use chrono::Local;
use log::info;

use crate::api::RemoteClient;
use crate::config::SocialLogConfig;
use crate::image_loader::ImageCache;
use crate::models::{self, PostEntry, User};
use crate::stats::{
    self, DailyCount, EmployeeCount, MonthSummary, TypeBreakdown, MONTH_OPTION_COUNT,
};
use crate::storage::LocalStore;

mod messages;
mod state;
mod tasks;

pub use messages::AppMessage;
pub use state::{DashboardState, LoginState, PostFormState, SyncPhase, ViewState};

const MSG_DESCRIPTION_REQUIRED: &str = "กรุณากรอกรายละเอียดโพสต์";

/// Everything the dashboard renders, derived fresh from the post list on
/// each call.
pub struct DashboardSnapshot {
    pub my_posts_today: usize,
    pub summary: MonthSummary,
    pub daily_series: Vec<DailyCount>,
    pub employee_totals: Vec<EmployeeCount>,
    pub employee_month_totals: Vec<EmployeeCount>,
    pub employee_day_totals: Vec<EmployeeCount>,
    pub my_breakdown: TypeBreakdown,
    pub month_options: Vec<(i32, u32)>,
    pub day_options: Vec<chrono::NaiveDate>,
}

/// Headless application core. An embedding shell renders the current state,
/// forwards user intent through the public methods, and calls [`poll`] each
/// tick to apply completed background work.
///
/// [`poll`]: SocialLogApp::poll
pub struct SocialLogApp {
    client: RemoteClient,
    store: LocalStore,
    tx: Sender<AppMessage>,
    rx: Receiver<AppMessage>,
    pub posts: Vec<PostEntry>,
    pub session: Option<User>,
    pub view: ViewState,
    pub sync_phase: SyncPhase,
    pub busy: bool,
    pub info_banner: Option<String>,
    pub login: LoginState,
    pub form: PostFormState,
    pub dashboard: DashboardState,
    pub images: ImageCache,
    pub employee_nicknames: HashMap<String, String>,
}

impl SocialLogApp {
    pub fn new(config: SocialLogConfig) -> Self {
        let store = match &config.data_dir {
            Some(dir) => LocalStore::open(dir.clone()),
            None => LocalStore::open_default(),
        };
        Self::with_parts(RemoteClient::new(config), store)
    }

    pub fn with_parts(client: RemoteClient, store: LocalStore) -> Self {
        let (tx, rx) = mpsc::channel();
        let today = Local::now().date_naive();
        let mut app = Self {
            client,
            store,
            tx,
            rx,
            posts: Vec::new(),
            session: None,
            view: ViewState::Login,
            sync_phase: SyncPhase::Uninitialized,
            busy: false,
            info_banner: None,
            login: LoginState::default(),
            form: PostFormState::default(),
            dashboard: DashboardState::for_today(today),
            images: ImageCache::new(),
            employee_nicknames: HashMap::new(),
        };
        app.restore();
        app
    }

    // Pre-paint restore: the cached list avoids an empty flash, then a
    // restored session triggers the authoritative sync.
    fn restore(&mut self) {
        if let Some(posts) = self.store.load_posts() {
            self.posts = posts;
        }
        if let Some(user) = self.store.load_session() {
            info!("restored session for {}", user.email);
            self.session = Some(user);
            self.view = ViewState::Form;
            self.begin_sync();
        }
    }

    /// Drains completed background work into the state. Call once per tick.
    pub fn poll(&mut self) {
        messages::process_messages(self);
    }

    /// Hands a verified-identity credential (from the provider's sign-in
    /// flow) to the auth endpoint.
    pub fn sign_in(&mut self, credential: &str) {
        if self.login.processing {
            return;
        }
        self.login.processing = true;
        self.login.error = None;
        tasks::verify_login(self.client.clone(), self.tx.clone(), credential.to_string());
    }

    fn complete_login(&mut self, user: User) {
        self.store.save_session(&user);
        self.session = Some(user);
        self.view = ViewState::Form;
        self.begin_sync();
    }

    /// Local-only: clears the persisted identity and returns to the login
    /// view. The in-memory list stays until the next login syncs over it.
    pub fn sign_out(&mut self) {
        self.store.clear_session();
        self.session = None;
        self.view = ViewState::Login;
    }

    fn begin_sync(&mut self) {
        self.sync_phase = SyncPhase::Syncing;
        self.busy = true;
        tasks::sync_posts(self.client.clone(), self.tx.clone());
        tasks::load_post_types(self.client.clone(), self.tx.clone());
        tasks::load_employees(self.client.clone(), self.tx.clone());
    }

    /// Submits the current form draft. The post id and timestamp come from
    /// the same creation instant; the list and cache update only after the
    /// backend confirms.
    pub fn submit_post(&mut self) {
        let user = match &self.session {
            Some(user) => user.clone(),
            None => return,
        };
        if self.form.description.trim().is_empty() {
            self.form.error = Some(MSG_DESCRIPTION_REQUIRED.to_string());
            return;
        }

        let now_ms = Local::now().timestamp_millis();
        let post = PostEntry {
            id: now_ms.to_string(),
            image_data: self.form.image_data.clone(),
            image_file_id: None,
            description: self.form.description.clone(),
            tags: self.form.tags.clone(),
            post_type: models::non_empty(self.form.post_type.clone()),
            post_url: models::non_empty(self.form.post_url.clone()),
            timestamp: now_ms,
            created_by: user.employee_code.clone(),
            created_by_email: user.email.clone(),
        };

        self.form.submitting = true;
        self.form.error = None;
        self.busy = true;
        tasks::save_post(
            self.client.clone(),
            self.tx.clone(),
            post,
            user.email,
            user.employee_code,
        );
    }

    pub fn delete_post(&mut self, post_id: &str) {
        let user = match &self.session {
            Some(user) => user,
            None => return,
        };
        self.busy = true;
        tasks::delete_post(
            self.client.clone(),
            self.tx.clone(),
            post_id.to_string(),
            user.email.clone(),
        );
    }

    /// Attaches a picked image to the draft as an inline payload.
    pub fn attach_image(&mut self, bytes: &[u8], mime: &str) {
        self.form.image_data = Some(models::to_data_uri(bytes, mime));
    }

    pub fn remove_image(&mut self) {
        self.form.image_data = None;
    }

    /// The viewer's own history, newest first (the list is kept in that
    /// order by sync and optimistic prepends).
    pub fn my_posts(&self) -> Vec<&PostEntry> {
        match &self.session {
            Some(user) => self
                .posts
                .iter()
                .filter(|post| post.created_by_email == user.email)
                .collect(),
            None => Vec::new(),
        }
    }

    /// Kicks off lazy fetches for every visible post whose image is still
    /// an unresolved remote reference. Idempotent per sweep.
    pub fn request_images(&mut self) {
        let viewer = match &self.session {
            Some(user) => user.email.clone(),
            None => return,
        };
        let visible: Vec<&PostEntry> = self
            .posts
            .iter()
            .filter(|post| post.created_by_email == viewer)
            .collect();
        let pending = self.images.claim_missing(visible);
        if !pending.is_empty() {
            tasks::fetch_images(self.client.clone(), self.tx.clone(), pending);
        }
    }

    /// Forces the post-type vocabulary to refetch on its next use.
    pub fn refresh_post_types(&mut self) {
        self.client.invalidate_post_types();
        tasks::load_post_types(self.client.clone(), self.tx.clone());
    }

    pub fn select_month(&mut self, year: i32, month: u32) {
        self.dashboard.selected_month = (year, month);
    }

    pub fn select_day(&mut self, day: chrono::NaiveDate) {
        self.dashboard.selected_day = day;
    }

    /// One-shot message for the shell's alert surface.
    pub fn take_banner(&mut self) -> Option<String> {
        self.info_banner.take()
    }

    pub fn dashboard_snapshot(&self) -> DashboardSnapshot {
        let (year, month) = self.dashboard.selected_month;
        let today = Local::now().date_naive();
        let viewer_email = self
            .session
            .as_ref()
            .map(|user| user.email.as_str())
            .unwrap_or_default();

        DashboardSnapshot {
            my_posts_today: stats::posts_today(&self.posts, viewer_email, today),
            summary: stats::month_summary(&self.posts, year, month),
            daily_series: stats::daily_series(&self.posts, year, month),
            employee_totals: stats::employee_totals(&self.posts, &self.employee_nicknames),
            employee_month_totals: stats::employee_totals_in_month(
                &self.posts,
                year,
                month,
                &self.employee_nicknames,
            ),
            employee_day_totals: stats::employee_totals_on_day(
                &self.posts,
                self.dashboard.selected_day,
                &self.employee_nicknames,
            ),
            my_breakdown: stats::user_type_breakdown(&self.posts, viewer_email, year, month),
            month_options: stats::month_options(today, MONTH_OPTION_COUNT),
            day_options: stats::day_options(year, month),
        }
    }
}
