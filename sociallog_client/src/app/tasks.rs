use std::sync::mpsc::Sender;
use std::thread;

use log::error;

use crate::api::RemoteClient;
use crate::models::PostEntry;

use super::messages::AppMessage;

pub fn verify_login(client: RemoteClient, tx: Sender<AppMessage>, credential: String) {
    thread::spawn(move || {
        let result = client
            .verify_credential(&credential)
            .map_err(anyhow::Error::from);
        if tx.send(AppMessage::SignedIn(result)).is_err() {
            error!("failed to send SignedIn message");
        }
    });
}

pub fn sync_posts(client: RemoteClient, tx: Sender<AppMessage>) {
    thread::spawn(move || {
        let result = client.try_list_posts().map_err(anyhow::Error::from);
        if tx.send(AppMessage::PostsSynced(result)).is_err() {
            error!("failed to send PostsSynced message");
        }
    });
}

pub fn save_post(
    client: RemoteClient,
    tx: Sender<AppMessage>,
    post: PostEntry,
    user_email: String,
    employee_code: Option<String>,
) {
    thread::spawn(move || {
        let outcome = client.create_post(&post, &user_email, employee_code.as_deref());
        if tx.send(AppMessage::PostSaved { post, outcome }).is_err() {
            error!("failed to send PostSaved message");
        }
    });
}

pub fn delete_post(
    client: RemoteClient,
    tx: Sender<AppMessage>,
    post_id: String,
    user_email: String,
) {
    thread::spawn(move || {
        let outcome = client.delete_post(&post_id, &user_email);
        if tx.send(AppMessage::PostDeleted { post_id, outcome }).is_err() {
            error!("failed to send PostDeleted message");
        }
    });
}

pub fn load_post_types(client: RemoteClient, tx: Sender<AppMessage>) {
    thread::spawn(move || {
        let types = client.post_types();
        if tx.send(AppMessage::PostTypesLoaded(types)).is_err() {
            error!("failed to send PostTypesLoaded message");
        }
    });
}

pub fn load_employees(client: RemoteClient, tx: Sender<AppMessage>) {
    thread::spawn(move || {
        let directory = client.list_employees();
        if tx.send(AppMessage::EmployeesLoaded(directory)).is_err() {
            error!("failed to send EmployeesLoaded message");
        }
    });
}

/// One independent fetch per pending post; completion order is arbitrary
/// and a failure only affects its own post.
pub fn fetch_images(client: RemoteClient, tx: Sender<AppMessage>, pending: Vec<(String, String)>) {
    for (post_id, file_id) in pending {
        let client = client.clone();
        let tx = tx.clone();
        thread::spawn(move || {
            let image = client.fetch_image(&file_id);
            if tx.send(AppMessage::ImageLoaded { post_id, image }).is_err() {
                error!("failed to send ImageLoaded message");
            }
        });
    }
}
