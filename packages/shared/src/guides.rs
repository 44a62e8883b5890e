//! Feature-guide walkthrough tracking.
//!
//! Each product release ships a set of one-time feature walkthroughs.
//! Which guides a user has already seen is stored client-side under a
//! per-release, per-user key so that a new release re-shows its guides
//! and users on the same machine do not share state. Stored contents
//! are not trusted: anything that fails to parse as a JSON string array
//! is treated as "no guides seen".

use std::collections::BTreeSet;

use crate::storage::KeyValueStorage;

/// Namespace prefix for feature-guide storage keys.
pub const FEATURE_GUIDE_PREFIX: &str = "matcha_feature_guides";

/// Tracks which feature-guide walkthroughs a user has seen.
pub struct FeatureGuideStore<S> {
    storage: S,
    release: String,
}

impl<S: KeyValueStorage> FeatureGuideStore<S> {
    /// Create a store scoped to one product release (e.g. "2026.08").
    pub fn new(storage: S, release: impl Into<String>) -> Self {
        Self {
            storage,
            release: release.into(),
        }
    }

    fn key(&self, user_id: &str) -> String {
        format!("{}:{}:{}", FEATURE_GUIDE_PREFIX, self.release, user_id)
    }

    fn seen_set(&self, user_id: &str) -> BTreeSet<String> {
        let Some(raw) = self.storage.get(&self.key(user_id)) else {
            return BTreeSet::new();
        };
        match serde_json::from_str::<BTreeSet<String>>(&raw) {
            Ok(set) => set,
            Err(e) => {
                // Corrupted contents are treated as empty, never an error.
                tracing::warn!("discarding corrupted feature-guide entry: {}", e);
                BTreeSet::new()
            }
        }
    }

    /// Whether `user_id` has already seen the guide named `guide`.
    pub fn has_seen(&self, guide: &str, user_id: &str) -> bool {
        self.seen_set(user_id).contains(guide)
    }

    /// Record that `user_id` has seen the guide named `guide`.
    pub fn mark_seen(&mut self, guide: &str, user_id: &str) {
        let mut seen = self.seen_set(user_id);
        seen.insert(guide.to_string());
        match serde_json::to_string(&seen) {
            Ok(raw) => self.storage.set(&self.key(user_id), &raw),
            Err(e) => tracing::error!("failed to serialize feature-guide entry: {}", e),
        }
    }

    /// Forget every guide `user_id` has seen in this release.
    ///
    /// Other users' entries are untouched.
    pub fn clear_all(&mut self, user_id: &str) {
        self.storage.remove(&self.key(user_id));
    }
}
