use std::collections::HashMap;

use log::error;

use crate::api::{MSG_DELETE_FAILED, MSG_GENERIC_ERROR, MSG_SAVE_FAILED};
use crate::models::{PostEntry, PostType, SaveOutcome, User};

use super::state::{SyncPhase, ViewState};
use super::SocialLogApp;

pub enum AppMessage {
    SignedIn(Result<User, anyhow::Error>),
    PostsSynced(Result<Vec<PostEntry>, anyhow::Error>),
    PostSaved {
        post: PostEntry,
        outcome: SaveOutcome,
    },
    PostDeleted {
        post_id: String,
        outcome: SaveOutcome,
    },
    PostTypesLoaded(Vec<PostType>),
    EmployeesLoaded(HashMap<String, String>),
    ImageLoaded {
        post_id: String,
        image: Option<String>,
    },
}

pub(super) fn process_messages(app: &mut SocialLogApp) {
    while let Ok(message) = app.rx.try_recv() {
        match message {
            AppMessage::SignedIn(result) => {
                app.login.processing = false;
                match result {
                    Ok(user) => {
                        app.login.error = None;
                        app.complete_login(user);
                    }
                    Err(err) => {
                        error!("identity verification failed: {err}");
                        app.login.error = Some(err.to_string());
                    }
                }
            }
            AppMessage::PostsSynced(result) => {
                app.sync_phase = SyncPhase::Idle;
                app.busy = false;
                match result {
                    Ok(posts) => {
                        // Remote is authoritative: replace wholesale and
                        // rewrite the local cache to match.
                        app.posts = posts;
                        app.store.save_posts(&app.posts);
                    }
                    Err(err) => {
                        // Previous (possibly stale) list stays in place.
                        error!("failed to sync posts from backend: {err}");
                    }
                }
            }
            AppMessage::PostSaved { post, outcome } => {
                app.form.submitting = false;
                app.busy = false;
                if outcome.success {
                    app.posts.insert(0, post);
                    app.store.save_posts(&app.posts);
                    app.form.reset();
                    app.form.save_success = true;
                    app.view = ViewState::List;
                } else {
                    let message = outcome
                        .message
                        .unwrap_or_else(|| MSG_SAVE_FAILED.to_string());
                    app.info_banner = Some(format!("{MSG_GENERIC_ERROR}: {message}"));
                }
            }
            AppMessage::PostDeleted { post_id, outcome } => {
                app.busy = false;
                if outcome.success {
                    app.posts.retain(|post| post.id != post_id);
                    app.store.save_posts(&app.posts);
                    app.info_banner = Some("ลบข้อมูลสำเร็จ!".to_string());
                } else {
                    let message = outcome
                        .message
                        .unwrap_or_else(|| MSG_DELETE_FAILED.to_string());
                    app.info_banner = Some(format!("{MSG_GENERIC_ERROR}: {message}"));
                }
            }
            AppMessage::PostTypesLoaded(types) => {
                app.form.post_types = types;
            }
            AppMessage::EmployeesLoaded(directory) => {
                app.employee_nicknames = directory;
            }
            AppMessage::ImageLoaded { post_id, image } => {
                app.images.complete(&post_id, image);
            }
        }
    }
}
