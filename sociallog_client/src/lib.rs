pub mod api;
pub mod app;
pub mod config;
pub mod identity;
pub mod image_loader;
pub mod models;
pub mod stats;
pub mod storage;

pub use app::SocialLogApp;
pub use config::SocialLogConfig;

/// Initializes env_logger once; safe to call again from an embedding shell.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(false).try_init();
}
