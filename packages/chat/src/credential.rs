//! Access credential store.
//!
//! The browser product keeps the access token under one well-known
//! storage key shared across tabs; logging out in any tab clears it and
//! every open session must react. Here that is modeled as an explicit
//! event source: the store owns a watch channel, sessions subscribe on
//! spawn and stop observing when they shut down.

use tokio::sync::watch;

use matcha_shared::storage::KeyValueStorage;

/// Well-known storage key holding the access token.
pub const ACCESS_TOKEN_KEY: &str = "matcha_access_token";

/// Shared, observable holder of the access token.
///
/// Cloning the store is cheap; all clones share the same token.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    tx: watch::Sender<Option<String>>,
}

impl CredentialStore {
    /// Create a store with no token (logged out).
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    /// Create a store holding `token`.
    pub fn with_token(token: impl Into<String>) -> Self {
        let (tx, _rx) = watch::channel(Some(token.into()));
        Self { tx }
    }

    /// Seed the store from the well-known storage key.
    pub fn from_storage(storage: &dyn KeyValueStorage) -> Self {
        match storage.get(ACCESS_TOKEN_KEY) {
            Some(token) if !token.is_empty() => Self::with_token(token),
            _ => Self::new(),
        }
    }

    /// Current token, if logged in.
    pub fn get(&self) -> Option<String> {
        self.tx.borrow().clone()
    }

    /// Store a new token (login, token refresh). Observers are notified.
    pub fn set(&self, token: impl Into<String>) {
        self.tx.send_replace(Some(token.into()));
    }

    /// Drop the token (logout). Observers are notified.
    pub fn clear(&self) {
        self.tx.send_replace(None);
    }

    /// Subscribe to token changes. Each receiver sees the current value
    /// immediately and every change afterwards.
    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.tx.subscribe()
    }

    /// Write the current token back to the well-known storage key.
    pub fn persist_to(&self, storage: &mut dyn KeyValueStorage) {
        match self.get() {
            Some(token) => storage.set(ACCESS_TOKEN_KEY, &token),
            None => storage.remove(ACCESS_TOKEN_KEY),
        }
    }
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new()
    }
}
