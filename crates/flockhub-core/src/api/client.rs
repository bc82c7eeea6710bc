//! API client facade.
//!
//! `ApiClient` composes the token store, HTTP transport and unauthorized
//! interceptor from one configuration object and hands out a configured
//! `Instance` for issuing requests.

use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use super::transport::{HttpTransport, RequestDescriptor, TransportConfig, DEFAULT_TIMEOUT_SECS};
use super::ApiError;
use crate::auth::{
    Session, Storage, TokenProvider, TokenStore, UnauthorizedHandler, UnauthorizedInterceptor,
};
use crate::mock::MockBackend;

/// Response envelope used by every backend route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    #[serde(default)]
    pub route: String,
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn into_data(self) -> T {
        self.data
    }
}

/// Construction-time options for [`ApiClient`].
#[derive(Clone)]
pub struct ApiClientConfig {
    pub base_url: String,
    pub tokens: Arc<dyn TokenProvider>,
    pub session: Session,
    pub on_unauthorized: Option<UnauthorizedHandler>,
    pub use_cookies: bool,
    pub request_token_in_body: bool,
    pub timeout: Duration,
    /// Serve canned data instead of talking to the network.
    pub use_mock: bool,
}

impl ApiClientConfig {
    /// Token and user marker both persisted in `storage`.
    pub fn new(base_url: impl Into<String>, storage: Arc<dyn Storage>) -> Self {
        Self::with_parts(
            base_url,
            Arc::new(TokenStore::new(storage.clone())),
            Session::new(storage),
        )
    }

    /// No storage medium: every request goes out unauthenticated.
    pub fn without_storage(base_url: impl Into<String>) -> Self {
        Self::with_parts(base_url, Arc::new(TokenStore::unavailable()), Session::unavailable())
    }

    pub fn with_parts(
        base_url: impl Into<String>,
        tokens: Arc<dyn TokenProvider>,
        session: Session,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            tokens,
            session,
            on_unauthorized: None,
            use_cookies: false,
            request_token_in_body: false,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            use_mock: false,
        }
    }

    pub fn on_unauthorized(mut self, handler: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_unauthorized = Some(Arc::new(handler));
        self
    }

    pub fn use_cookies(mut self, enabled: bool) -> Self {
        self.use_cookies = enabled;
        self
    }

    pub fn request_token_in_body(mut self, enabled: bool) -> Self {
        self.request_token_in_body = enabled;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn use_mock(mut self, enabled: bool) -> Self {
        self.use_mock = enabled;
        self
    }
}

/// The configured API client. Building one performs no I/O.
pub struct ApiClient {
    instance: Instance,
}

impl ApiClient {
    pub fn new(config: ApiClientConfig) -> Result<Self, ApiError> {
        let transport_config = TransportConfig {
            base_url: config.base_url,
            use_cookies: config.use_cookies,
            request_token_in_body: config.request_token_in_body,
            timeout: config.timeout,
        };
        let transport = HttpTransport::new(transport_config, config.tokens.clone())?;
        let interceptor = UnauthorizedInterceptor::new(
            config.tokens,
            config.session.clone(),
            config.on_unauthorized,
        );
        let mock = config.use_mock.then(|| Arc::new(MockBackend::canned()));

        Ok(Self {
            instance: Instance {
                transport,
                interceptor,
                session: config.session,
                mock,
            },
        })
    }

    /// The request-issuing instance bound to this client's policy.
    pub fn instance(&self) -> Instance {
        self.instance.clone()
    }
}

/// Issues authenticated requests and decodes response envelopes.
///
/// Clone is cheap and every clone shares the same connection pool, cookie jar
/// and token store.
#[derive(Clone)]
pub struct Instance {
    transport: HttpTransport,
    interceptor: UnauthorizedInterceptor,
    session: Session,
    mock: Option<Arc<MockBackend>>,
}

impl Instance {
    pub fn transport(&self) -> &HttpTransport {
        &self.transport
    }

    pub fn tokens(&self) -> &Arc<dyn TokenProvider> {
        self.transport.tokens()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn is_mock(&self) -> bool {
        self.mock.is_some()
    }

    /// Send a request and decode its envelope.
    ///
    /// Failures are handed to the unauthorized interceptor and then returned
    /// to the caller unchanged.
    pub async fn request<T: DeserializeOwned>(
        &self,
        request: RequestDescriptor,
    ) -> Result<Envelope<T>, ApiError> {
        let result = match &self.mock {
            Some(mock) => mock.respond(&request),
            None => self.transport.send(&request).await,
        };

        let value = match result {
            Ok(value) => value,
            Err(e) => {
                self.interceptor.handle(&e);
                return Err(e);
            }
        };

        serde_json::from_value(value).map_err(|e| {
            debug!(path = %request.path, error = %e, "Unexpected response shape");
            ApiError::InvalidResponse(format!(
                "Failed to decode {} {} response: {}",
                request.method, request.path, e
            ))
        })
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<Envelope<T>, ApiError> {
        self.request(RequestDescriptor::get(path)).await
    }

    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Vec<(String, String)>,
    ) -> Result<Envelope<T>, ApiError> {
        self.request(RequestDescriptor::get(path).with_query(query)).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Envelope<T>, ApiError> {
        self.request(RequestDescriptor::post(path, body)?).await
    }

    pub async fn patch<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Envelope<T>, ApiError> {
        self.request(RequestDescriptor::patch(path, body)?).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<Envelope<T>, ApiError> {
        self.request(RequestDescriptor::delete(path)).await
    }
}
