use std::sync::Arc;

use tracing::warn;

use super::storage::Storage;

/// Well-known storage key for the session token
pub const TOKEN_KEY: &str = "auth_token";

/// Accessor triple the transport uses to read and maintain the session token.
pub trait TokenProvider: Send + Sync {
    fn get_token(&self) -> Option<String>;
    fn set_token(&self, token: &str);
    fn clear_token(&self);
}

/// Session token persisted in a storage medium.
///
/// A store without a medium (e.g. a headless or pre-init context) reads as
/// unauthenticated and ignores writes. Storage failures are logged and treated
/// the same way rather than surfaced to callers.
#[derive(Clone)]
pub struct TokenStore {
    storage: Option<Arc<dyn Storage>>,
}

impl TokenStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage: Some(storage),
        }
    }

    /// A store with no backing medium.
    pub fn unavailable() -> Self {
        Self { storage: None }
    }

    pub fn has_medium(&self) -> bool {
        self.storage.is_some()
    }
}

impl TokenProvider for TokenStore {
    fn get_token(&self) -> Option<String> {
        let storage = self.storage.as_ref()?;
        match storage.get(TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                warn!(error = %e, "Failed to read session token");
                None
            }
        }
    }

    fn set_token(&self, token: &str) {
        if let Some(storage) = &self.storage {
            if let Err(e) = storage.set(TOKEN_KEY, token) {
                warn!(error = %e, "Failed to persist session token");
            }
        }
    }

    fn clear_token(&self) {
        if let Some(storage) = &self.storage {
            if let Err(e) = storage.remove(TOKEN_KEY) {
                warn!(error = %e, "Failed to clear session token");
            }
        }
    }
}
