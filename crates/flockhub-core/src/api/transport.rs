//! HTTP transport: base URL resolution, bearer auth and cookie credentials
//! on top of a shared `reqwest::Client`.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{header, Client, Method, Url};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::ApiError;
use crate::auth::TokenProvider;

/// HTTP request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub base_url: String,
    /// Keep a cookie jar and send it with every request.
    pub use_cookies: bool,
    /// Ask the backend to return the session token in the login body.
    pub request_token_in_body: bool,
    pub timeout: Duration,
}

impl TransportConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            use_cookies: false,
            request_token_in_body: false,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// One outgoing call. Built per request and dropped after it.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl RequestDescriptor {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn post<B: Serialize>(path: impl Into<String>, body: &B) -> Result<Self, ApiError> {
        Self::new(Method::POST, path).with_body(body)
    }

    pub fn patch<B: Serialize>(path: impl Into<String>, body: &B) -> Result<Self, ApiError> {
        Self::new(Method::PATCH, path).with_body(body)
    }

    pub fn with_body<B: Serialize>(mut self, body: &B) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body)
            .map_err(|e| ApiError::Validation(format!("Unserializable request body: {}", e)))?;
        self.body = Some(value);
        Ok(self)
    }

    pub fn with_query(mut self, pairs: Vec<(String, String)>) -> Self {
        self.query.extend(pairs);
        self
    }

    pub(crate) fn validate(&self) -> Result<(), ApiError> {
        if !self.path.starts_with('/') {
            return Err(ApiError::Validation(format!(
                "Path must start with '/': {}",
                self.path
            )));
        }
        if self.path.chars().any(char::is_whitespace) {
            return Err(ApiError::Validation(format!(
                "Path contains whitespace: {:?}",
                self.path
            )));
        }
        if self.path.split('/').any(is_dot_segment) {
            return Err(ApiError::Validation(format!(
                "Path escapes the API root: {}",
                self.path
            )));
        }
        if self.body.is_some() && matches!(self.method, Method::GET | Method::DELETE) {
            return Err(ApiError::Validation(format!(
                "{} request cannot carry a body",
                self.method
            )));
        }
        Ok(())
    }
}

/// `.` or `..`, literally or percent-encoded. URL parsing resolves these,
/// which would send the request to a different resource.
fn is_dot_segment(segment: &str) -> bool {
    let decoded = segment.to_ascii_lowercase().replace("%2e", ".");
    decoded == "." || decoded == ".."
}

/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
    tokens: Arc<dyn TokenProvider>,
    config: TransportConfig,
}

impl HttpTransport {
    pub fn new(config: TransportConfig, tokens: Arc<dyn TokenProvider>) -> Result<Self, ApiError> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        let parsed = Url::parse(&base_url)
            .map_err(|e| ApiError::Validation(format!("Invalid base URL {}: {}", base_url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ApiError::Validation(format!(
                "Unsupported base URL scheme: {}",
                parsed.scheme()
            )));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .cookie_store(config.use_cookies)
            .build()
            .map_err(|e| ApiError::Validation(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            tokens,
            config,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn uses_cookies(&self) -> bool {
        self.config.use_cookies
    }

    pub fn requests_token_in_body(&self) -> bool {
        self.config.request_token_in_body
    }

    pub fn tokens(&self) -> &Arc<dyn TokenProvider> {
        &self.tokens
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn auth_headers(&self) -> Result<header::HeaderMap, ApiError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
        if let Some(token) = self.tokens.get_token() {
            let value = header::HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
                ApiError::Validation("Session token is not a valid header value".into())
            })?;
            headers.insert(header::AUTHORIZATION, value);
        }
        Ok(headers)
    }

    /// Issue a request and return the decoded JSON body.
    ///
    /// An empty success body decodes to `Value::Null`. Statuses of 400 and
    /// above become `ApiError::Http` carrying the (truncated) body.
    pub async fn send(&self, request: &RequestDescriptor) -> Result<Value, ApiError> {
        request.validate()?;
        let url = self.url_for(&request.path);
        debug!(method = %request.method, url = %url, "Sending request");

        let mut builder = self
            .client
            .request(request.method.clone(), &url)
            .headers(self.auth_headers()?);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::from_transport(e, self.config.timeout))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::from_transport(e, self.config.timeout))?;

        if !status.is_success() {
            debug!(status = status.as_u16(), url = %url, "Request failed");
            return Err(ApiError::from_status(status, &text));
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse JSON response from {}: {}", url, e))
        })
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_json, header, header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    use super::*;
    use crate::auth::{MemoryStorage, TokenStore};

    fn transport(base_url: &str, use_cookies: bool) -> (HttpTransport, TokenStore) {
        let tokens = TokenStore::new(Arc::new(MemoryStorage::new()));
        let mut config = TransportConfig::new(base_url);
        config.use_cookies = use_cookies;
        let transport = HttpTransport::new(config, Arc::new(tokens.clone())).unwrap();
        (transport, tokens)
    }

    #[tokio::test]
    async fn test_bearer_header_attached_when_token_present() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/people"))
            .and(header("Authorization", "Bearer abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let (transport, tokens) = transport(&server.uri(), false);
        tokens.set_token("abc");
        let body = transport.send(&RequestDescriptor::get("/people")).await.unwrap();
        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn test_no_bearer_header_without_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/people"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let (transport, _tokens) = transport(&server.uri(), false);
        let body = transport.send(&RequestDescriptor::get("/people")).await.unwrap();
        assert_eq!(body, Value::Null);

        let requests: Vec<Request> = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert!(!requests[0].headers.contains_key("authorization"));
    }

    #[tokio::test]
    async fn test_error_status_becomes_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/teams/t9"))
            .respond_with(ResponseTemplate::new(404).set_body_string("no such team"))
            .mount(&server)
            .await;

        let (transport, _tokens) = transport(&server.uri(), false);
        let err = transport.send(&RequestDescriptor::get("/teams/t9")).await.unwrap_err();
        match err {
            ApiError::Http { status, body } => {
                assert_eq!(status, 404);
                assert_eq!(body, "no such team");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_query_and_json_body_are_sent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/teams"))
            .and(query_param("churchId", "c1"))
            .and(header_exists("content-type"))
            .and(body_json(serde_json::json!({"name": "Worship"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({"id": "t1"})))
            .expect(1)
            .mount(&server)
            .await;

        let (transport, _tokens) = transport(&format!("{}/", server.uri()), false);
        let request = RequestDescriptor::post("/teams", &serde_json::json!({"name": "Worship"}))
            .unwrap()
            .with_query(vec![("churchId".to_string(), "c1".to_string())]);
        let body = transport.send(&request).await.unwrap();
        assert_eq!(body["id"], "t1");
    }

    #[tokio::test]
    async fn test_cookie_credentials_sent_without_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(200).insert_header("set-cookie", "sid=xyz; Path=/"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/churches"))
            .and(header("cookie", "sid=xyz"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let (transport, tokens) = transport(&server.uri(), true);
        assert!(transport.uses_cookies());
        assert_eq!(tokens.get_token(), None);

        let login = RequestDescriptor::post("/auth/login", &serde_json::json!({})).unwrap();
        transport.send(&login).await.unwrap();
        transport.send(&RequestDescriptor::get("/churches")).await.unwrap();
    }

    #[tokio::test]
    async fn test_timeout_maps_to_timeout_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let tokens = TokenStore::unavailable();
        let mut config = TransportConfig::new(server.uri());
        config.timeout = Duration::from_millis(50);
        let transport = HttpTransport::new(config, Arc::new(tokens)).unwrap();

        let err = transport.send(&RequestDescriptor::get("/slow")).await.unwrap_err();
        assert!(matches!(err, ApiError::Timeout(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        let (transport, _tokens) = transport("http://127.0.0.1:9", false);
        let err = transport.send(&RequestDescriptor::get("/people")).await.unwrap_err();
        assert!(matches!(err, ApiError::Network(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_invalid_paths_fail_before_sending() {
        let (transport, _tokens) = transport("http://127.0.0.1:9", false);
        let bad_paths = [
            "people",
            "/people/../admin",
            "/people/a b",
            "/people/.",
            "/people/%2e%2e",
            "/people/.%2E",
        ];
        for bad in bad_paths {
            let err = transport.send(&RequestDescriptor::get(bad)).await.unwrap_err();
            assert!(matches!(err, ApiError::Validation(_)), "{bad}: {err:?}");
        }
        let mut with_body = RequestDescriptor::get("/people");
        with_body.body = Some(serde_json::json!({}));
        let err = transport.send(&with_body).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let tokens: Arc<dyn TokenProvider> = Arc::new(TokenStore::unavailable());
        assert!(HttpTransport::new(TransportConfig::new("not a url"), tokens.clone()).is_err());
        assert!(HttpTransport::new(TransportConfig::new("ftp://api.test"), tokens).is_err());
    }

    #[test]
    fn test_url_for_joins_without_double_slash() {
        let (transport, _tokens) = transport("https://api.test/", false);
        assert_eq!(transport.base_url(), "https://api.test");
        assert_eq!(transport.url_for("/people/p1"), "https://api.test/people/p1");
    }
}
