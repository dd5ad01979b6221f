use std::collections::{HashMap, HashSet};

use log::debug;

use crate::models::PostEntry;

/// Session cache of resolved post images, keyed by post id. Posts listed
/// from the backend carry only an opaque file reference; the actual payload
/// is fetched on demand and kept here so a post is never fetched twice.
#[derive(Default)]
pub struct ImageCache {
    loaded: HashMap<String, String>,
    in_flight: HashSet<String>,
}

impl ImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, post_id: &str) -> Option<&str> {
        self.loaded.get(post_id).map(String::as_str)
    }

    pub fn is_loading(&self, post_id: &str) -> bool {
        self.in_flight.contains(post_id)
    }

    pub fn len(&self) -> usize {
        self.loaded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty()
    }

    /// Selects the posts in the working set that carry a remote file
    /// reference and are neither resolved nor already being fetched, and
    /// marks them in-flight. Returns `(post_id, file_id)` pairs; a repeated
    /// sweep over the same set yields nothing.
    pub fn claim_missing<'a>(
        &mut self,
        posts: impl IntoIterator<Item = &'a PostEntry>,
    ) -> Vec<(String, String)> {
        let mut pending = Vec::new();
        for post in posts {
            let file_id = match post.image_file_id.as_deref() {
                Some(file_id) if !file_id.is_empty() => file_id,
                _ => continue,
            };
            if self.loaded.contains_key(&post.id) || self.in_flight.contains(&post.id) {
                continue;
            }
            self.in_flight.insert(post.id.clone());
            pending.push((post.id.clone(), file_id.to_string()));
        }
        pending
    }

    /// Applies one completed fetch. Insertions are a monotonic union: a
    /// late or failed result never evicts an entry that is already present.
    /// A failed post simply stays unresolved; the next sweep may retry it.
    pub fn complete(&mut self, post_id: &str, image: Option<String>) {
        self.in_flight.remove(post_id);
        match image {
            Some(data) => {
                self.loaded.entry(post_id.to_string()).or_insert(data);
            }
            None => debug!("image for post {post_id} left unresolved"),
        }
    }

    pub fn clear(&mut self) {
        self.loaded.clear();
        self.in_flight.clear();
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn post(id: &str, file_id: Option<&str>) -> PostEntry {
        PostEntry {
            id: id.to_string(),
            image_data: None,
            image_file_id: file_id.map(str::to_string),
            description: "caption".to_string(),
            tags: String::new(),
            post_type: None,
            post_url: None,
            timestamp: 0,
            created_by: None,
            created_by_email: "a@x.com".to_string(),
        }
    }

    #[test]
    fn claims_exactly_the_uncached_referenced_posts() {
        let posts = vec![
            post("1", Some("f1")),
            post("2", None),
            post("3", Some("f3")),
            post("4", Some("")),
            post("5", Some("f5")),
        ];
        let mut cache = ImageCache::new();
        let pending = cache.claim_missing(&posts);
        assert_eq!(
            pending,
            vec![
                ("1".to_string(), "f1".to_string()),
                ("3".to_string(), "f3".to_string()),
                ("5".to_string(), "f5".to_string()),
            ]
        );
        // Already in flight: a second sweep issues nothing.
        assert!(cache.claim_missing(&posts).is_empty());
    }

    #[test]
    fn partial_failure_leaves_other_entries_intact() {
        let posts: Vec<PostEntry> = (1..=4)
            .map(|i| post(&i.to_string(), Some(&format!("f{i}"))))
            .collect();
        let mut cache = ImageCache::new();
        let pending = cache.claim_missing(&posts);
        assert_eq!(pending.len(), 4);

        // Out-of-order completion with one failure.
        cache.complete("3", Some("data:image/png;base64,c3".to_string()));
        cache.complete("2", None);
        cache.complete("1", Some("data:image/png;base64,c1".to_string()));
        cache.complete("4", Some("data:image/png;base64,c4".to_string()));

        assert_eq!(cache.len(), 3);
        assert_eq!(cache.get("1"), Some("data:image/png;base64,c1"));
        assert_eq!(cache.get("2"), None);
        assert!(!cache.is_loading("2"));

        // The failed post is claimable again on the next sweep.
        let retry = cache.claim_missing(&posts);
        assert_eq!(retry, vec![("2".to_string(), "f2".to_string())]);
    }

    #[test]
    fn union_is_monotonic() {
        let mut cache = ImageCache::new();
        cache.complete("1", Some("first".to_string()));
        // A duplicate completion never replaces, a failure never removes.
        cache.complete("1", Some("second".to_string()));
        cache.complete("1", None);
        assert_eq!(cache.get("1"), Some("first"));
    }

    #[test]
    fn cached_posts_are_not_refetched() {
        let posts = vec![post("1", Some("f1")), post("2", Some("f2"))];
        let mut cache = ImageCache::new();
        for (post_id, _) in cache.claim_missing(&posts) {
            cache.complete(&post_id, Some("data".to_string()));
        }
        assert!(cache.claim_missing(&posts).is_empty());

        cache.clear();
        assert_eq!(cache.claim_missing(&posts).len(), 2);
    }
}
