use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::api::{ApiError, Envelope, Instance};
use crate::auth::CurrentUser;

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
    #[serde(rename = "requestTokenInBody")]
    request_token_in_body: bool,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    token: Option<String>,
    user: CurrentUser,
}

/// Sign-in, sign-out and the current-user probe.
#[derive(Clone)]
pub struct AuthService {
    instance: Instance,
}

impl AuthService {
    pub fn new(instance: Instance) -> Self {
        Self { instance }
    }

    /// Authenticate and persist the session.
    ///
    /// When the client asks for the token in the body it is written to the
    /// token store; otherwise the session rides on cookies. The user marker is
    /// written either way.
    pub async fn login(&self, credentials: &Credentials) -> Result<CurrentUser, ApiError> {
        if credentials.email.trim().is_empty() || credentials.password.is_empty() {
            return Err(ApiError::Validation("Email and password are required".into()));
        }

        let wants_token = self.instance.transport().requests_token_in_body();
        let request = LoginRequest {
            email: credentials.email.trim(),
            password: &credentials.password,
            request_token_in_body: wants_token,
        };
        let response: LoginResponse = self
            .instance
            .post("/auth/login", &request)
            .await
            .map(Envelope::into_data)?;

        match (wants_token, response.token) {
            (true, Some(token)) => self.instance.tokens().set_token(&token),
            (true, None) => warn!("Login response did not include a session token"),
            (false, _) => {}
        }
        self.instance.session().set_current_user(&response.user);
        info!(user_id = %response.user.id, "Signed in");
        Ok(response.user)
    }

    /// End the session on the server and forget it locally.
    ///
    /// Local state is cleared even when the server call fails.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let result = self
            .instance
            .post::<Value, _>("/auth/logout", &serde_json::json!({}))
            .await
            .map(|_| ());
        self.instance.tokens().clear_token();
        self.instance.session().clear();
        info!("Signed out");
        result
    }

    pub async fn me(&self) -> Result<CurrentUser, ApiError> {
        self.instance.get("/auth/me").await.map(Envelope::into_data)
    }
}
