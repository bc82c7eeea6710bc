use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::storage::Storage;
use crate::models::ChurchRole;

/// Well-known storage key for the last known signed-in user
pub const USER_KEY: &str = "user";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct CurrentUser {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<ChurchRole>,
    #[serde(rename = "churchId", default)]
    pub church_id: Option<String>,
    #[serde(rename = "signedInAt", default = "Utc::now")]
    #[cfg_attr(feature = "ts", ts(type = "string"))]
    pub signed_in_at: DateTime<Utc>,
}

/// The persisted "current user" marker.
///
/// Shares its storage medium with the token store. Presence of the raw value is
/// what matters to the unauthorized interceptor, so an unparseable marker still
/// counts as present.
#[derive(Clone)]
pub struct Session {
    storage: Option<Arc<dyn Storage>>,
}

impl Session {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage: Some(storage),
        }
    }

    pub fn unavailable() -> Self {
        Self { storage: None }
    }

    fn raw(&self) -> Option<String> {
        let storage = self.storage.as_ref()?;
        match storage.get(USER_KEY) {
            Ok(value) => value.filter(|v| !v.is_empty()),
            Err(e) => {
                warn!(error = %e, "Failed to read user marker");
                None
            }
        }
    }

    pub fn has_user(&self) -> bool {
        self.raw().is_some()
    }

    pub fn current_user(&self) -> Option<CurrentUser> {
        let raw = self.raw()?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!(error = %e, "Stored user marker is not valid JSON");
                None
            }
        }
    }

    pub fn set_current_user(&self, user: &CurrentUser) {
        let Some(storage) = &self.storage else {
            return;
        };
        let result = serde_json::to_string(user)
            .map_err(anyhow::Error::from)
            .and_then(|json| storage.set(USER_KEY, &json));
        if let Err(e) = result {
            warn!(error = %e, "Failed to persist user marker");
        }
    }

    pub fn clear(&self) {
        if let Some(storage) = &self.storage {
            if let Err(e) = storage.remove(USER_KEY) {
                warn!(error = %e, "Failed to clear user marker");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::storage::MemoryStorage;

    fn user() -> CurrentUser {
        CurrentUser {
            id: "u1".to_string(),
            name: "Ana".to_string(),
            email: Some("ana@example.org".to_string()),
            role: Some(ChurchRole::Leader),
            church_id: Some("c1".to_string()),
            signed_in_at: Utc::now(),
        }
    }

    #[test]
    fn test_round_trip_current_user() {
        let session = Session::new(Arc::new(MemoryStorage::new()));
        assert!(!session.has_user());
        let expected = user();
        session.set_current_user(&expected);
        assert!(session.has_user());
        assert_eq!(session.current_user(), Some(expected));
        session.clear();
        assert!(!session.has_user());
        assert_eq!(session.current_user(), None);
    }

    #[test]
    fn test_unparseable_marker_still_counts_as_present() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(USER_KEY, "legacy-value").unwrap();
        let session = Session::new(storage);
        assert!(session.has_user());
        assert_eq!(session.current_user(), None);
    }

    #[test]
    fn test_marker_without_timestamp_parses() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(USER_KEY, r#"{"id":"u2","name":"Ben"}"#).unwrap();
        let session = Session::new(storage);
        let user = session.current_user().unwrap();
        assert_eq!(user.id, "u2");
        assert_eq!(user.role, None);
    }

    #[test]
    fn test_unavailable_session_has_no_user() {
        let session = Session::unavailable();
        session.set_current_user(&user());
        assert!(!session.has_user());
    }
}
