use std::sync::{Arc, Mutex};

use tracing::{debug, info};

use super::session::Session;
use super::token_store::TokenProvider;
use crate::api::ApiError;

/// Route the client is sent to after its session is revoked
pub const LOGIN_ROUTE: &str = "/login";

/// Navigation callback fired when an authenticated session is rejected.
pub type UnauthorizedHandler = Arc<dyn Fn(&str) + Send + Sync>;

/// Reacts to 401 responses.
///
/// Only a client that believes it is signed in (a user marker is stored) has
/// its session torn down. A 401 during an anonymous startup probe leaves the
/// token store alone and does not navigate.
#[derive(Clone)]
pub struct UnauthorizedInterceptor {
    tokens: Arc<dyn TokenProvider>,
    session: Session,
    on_unauthorized: Option<UnauthorizedHandler>,
    guard: Arc<Mutex<()>>,
}

impl UnauthorizedInterceptor {
    pub fn new(
        tokens: Arc<dyn TokenProvider>,
        session: Session,
        on_unauthorized: Option<UnauthorizedHandler>,
    ) -> Self {
        Self {
            tokens,
            session,
            on_unauthorized,
            guard: Arc::new(Mutex::new(())),
        }
    }

    /// Inspect a failed request. Returns true if the session was cleared.
    pub fn handle(&self, error: &ApiError) -> bool {
        if !error.is_unauthorized() {
            return false;
        }

        // Check-and-clear must be atomic so racing 401s redirect once.
        let _guard = self.guard.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        if !self.session.has_user() {
            debug!("401 without a stored user, leaving session untouched");
            return false;
        }

        info!("Session rejected by server, signing out");
        self.tokens.clear_token();
        self.session.clear();

        if let Some(handler) = &self.on_unauthorized {
            handler(LOGIN_ROUTE);
        }
        true
    }
}
