//! Offline mode: canned responses served in-process.
//!
//! Reads come from a fixture table keyed by path. Writes echo the payload back
//! with an id so screens behave as if the backend accepted them. Nothing is
//! stored between calls.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;

use crate::api::{ApiError, RequestDescriptor};

/// Token handed out by the mock login route
pub const MOCK_TOKEN: &str = "mock-token";

pub struct MockBackend {
    fixtures: HashMap<String, Value>,
    next_id: AtomicU64,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            fixtures: HashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// A backend seeded with one church and a handful of related records.
    pub fn canned() -> Self {
        let mut mock = Self::new();

        let church = json!({
            "id": "c1",
            "name": "Grace Community Church",
            "city": "Springfield",
            "timeZone": "America/Chicago"
        });
        let people = json!([
            {
                "id": "p1",
                "name": "Ana Souza",
                "email": "ana@example.org",
                "churchId": "c1",
                "role": "LEADER"
            },
            {"id": "p2", "name": "Ben Carter", "churchId": "c1", "role": "VOLUNTEER"},
            {"id": "p3", "name": "Chloe Kim", "churchId": "c1", "role": "MEMBER"}
        ]);
        let teams = json!([
            {"id": "t1", "name": "Worship", "churchId": "c1", "ministryId": "m1", "memberCount": 2},
            {"id": "t2", "name": "Hospitality", "churchId": "c1", "memberCount": 1}
        ]);
        let ministries = json!([
            {"id": "m1", "name": "Music Ministry", "churchId": "c1", "leaderId": "p1"}
        ]);
        let services = json!([
            {
                "id": "sv1",
                "name": "Sunday Morning",
                "churchId": "c1",
                "startsAt": "2030-01-06T15:00:00Z",
                "location": "Main Hall"
            }
        ]);
        let schedules = json!([
            {
                "id": "s1",
                "serviceId": "sv1",
                "teamId": "t1",
                "personId": "p2",
                "status": "CONFIRMED"
            }
        ]);

        mock.insert("/churches", json!([church.clone()]));
        mock.insert("/churches/c1", church);
        mock.insert_collection("/people", &people);
        mock.insert_collection("/teams", &teams);
        mock.insert_collection("/ministries", &ministries);
        mock.insert_collection("/services", &services);
        mock.insert_collection("/schedules", &schedules);
        mock.insert("/services/sv1/schedules", schedules);
        mock.insert(
            "/teams/t1/members",
            json!([
                {"personId": "p1", "name": "Ana Souza", "role": "LEAD"},
                {"personId": "p2", "name": "Ben Carter", "role": "MEMBER"}
            ]),
        );
        mock.insert("/attendance", json!([]));
        mock.insert("/communication", json!([]));
        mock.insert(
            "/auth/me",
            json!({
                "id": "p1",
                "name": "Ana Souza",
                "email": "ana@example.org",
                "role": "LEADER",
                "churchId": "c1"
            }),
        );
        mock
    }

    pub fn insert(&mut self, path: &str, data: Value) {
        self.fixtures.insert(path.to_string(), data);
    }

    /// Register a list route and one detail route per element.
    fn insert_collection(&mut self, path: &str, items: &Value) {
        if let Some(array) = items.as_array() {
            for item in array {
                if let Some(id) = item.get("id").and_then(Value::as_str) {
                    self.fixtures.insert(format!("{}/{}", path, id), item.clone());
                }
            }
        }
        self.fixtures.insert(path.to_string(), items.clone());
    }

    fn envelope(status: u16, path: &str, data: Value) -> Value {
        json!({"statusCode": status, "route": path, "data": data})
    }

    /// Answer a request with a full response envelope.
    pub fn respond(&self, request: &RequestDescriptor) -> Result<Value, ApiError> {
        request.validate()?;
        debug!(method = %request.method, path = %request.path, "Serving mock response");

        let path = request.path.as_str();
        if path == "/auth/login" && request.method == Method::POST {
            let user = self.fixtures.get("/auth/me").cloned().unwrap_or(Value::Null);
            return Ok(Self::envelope(201, path, json!({"token": MOCK_TOKEN, "user": user})));
        }

        match request.method {
            Method::GET => self
                .fixtures
                .get(path)
                .map(|data| Self::envelope(200, path, data.clone()))
                .ok_or_else(|| ApiError::Http {
                    status: 404,
                    body: format!("No mock data for {}", path),
                }),
            Method::POST => {
                let id = format!("mock-{}", self.next_id.fetch_add(1, Ordering::Relaxed));
                let mut data = with_id(request.body.clone(), &id);
                if path == "/attendance/check-in" {
                    merge(&mut data, json!({"checkedInAt": Utc::now().to_rfc3339()}));
                }
                Ok(Self::envelope(201, path, data))
            }
            Method::PATCH | Method::PUT => {
                let id = path.rsplit('/').next().unwrap_or_default().to_string();
                let mut data = self.fixtures.get(path).cloned().unwrap_or_else(|| json!({}));
                merge(&mut data, request.body.clone().unwrap_or(Value::Null));
                Ok(Self::envelope(200, path, with_id(Some(data), &id)))
            }
            Method::DELETE => Ok(Self::envelope(200, path, Value::Null)),
            _ => Err(ApiError::Validation(format!(
                "Mock backend does not support {}",
                request.method
            ))),
        }
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn with_id(body: Option<Value>, id: &str) -> Value {
    let mut data = match body {
        Some(Value::Object(map)) => Value::Object(map),
        _ => json!({}),
    };
    if let Value::Object(map) = &mut data {
        map.entry("id").or_insert_with(|| Value::String(id.to_string()));
    }
    data
}

fn merge(target: &mut Value, patch: Value) {
    if let (Value::Object(target), Value::Object(patch)) = (target, patch) {
        for (key, value) in patch {
            target.insert(key, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_detail_route() {
        let mock = MockBackend::canned();
        let response = mock.respond(&RequestDescriptor::get("/people/p1")).unwrap();
        assert_eq!(response["statusCode"], 200);
        assert_eq!(response["route"], "/people/p1");
        assert_eq!(response["data"]["name"], "Ana Souza");
    }

    #[test]
    fn test_unknown_route_is_404() {
        let mock = MockBackend::canned();
        let err = mock.respond(&RequestDescriptor::get("/people/nope")).unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn test_create_assigns_id() {
        let mock = MockBackend::canned();
        let request = RequestDescriptor::post("/teams", &json!({"name": "Media"})).unwrap();
        let response = mock.respond(&request).unwrap();
        assert_eq!(response["data"]["name"], "Media");
        assert_eq!(response["data"]["id"], "mock-1");
    }

    #[test]
    fn test_update_merges_fixture() {
        let mock = MockBackend::canned();
        let request = RequestDescriptor::patch("/teams/t2", &json!({"name": "Welcome"})).unwrap();
        let response = mock.respond(&request).unwrap();
        assert_eq!(response["data"]["id"], "t2");
        assert_eq!(response["data"]["name"], "Welcome");
        assert_eq!(response["data"]["churchId"], "c1");
    }

    #[test]
    fn test_login_returns_token() {
        let mock = MockBackend::canned();
        let request = RequestDescriptor::post("/auth/login", &json!({"email": "a@b.c"})).unwrap();
        let response = mock.respond(&request).unwrap();
        assert_eq!(response["data"]["token"], MOCK_TOKEN);
        assert_eq!(response["data"]["user"]["id"], "p1");
    }

    #[test]
    fn test_check_in_is_stamped() {
        let mock = MockBackend::canned();
        let body = json!({"personId": "p2", "serviceId": "sv1"});
        let request = RequestDescriptor::post("/attendance/check-in", &body).unwrap();
        let response = mock.respond(&request).unwrap();
        assert_eq!(response["data"]["personId"], "p2");
        assert!(response["data"]["checkedInAt"].is_string());
    }

    #[test]
    fn test_invalid_path_is_rejected() {
        let mock = MockBackend::canned();
        let err = mock.respond(&RequestDescriptor::get("people")).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }
}
