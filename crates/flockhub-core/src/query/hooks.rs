//! Per-resource queries and mutations over [`Services`].
//!
//! List queries are scoped by church and stay idle until a church id is
//! known. Mutations invalidate the lists they affect.

use serde::{de::DeserializeOwned, Serialize};

use super::{MutationOptions, QueryClient, QueryKey, QueryOptions, QueryResult};
use crate::api::ApiError;
use crate::auth::CurrentUser;
use crate::models::{
    Attendance, CheckIn, Church, Ministry, Person, Schedule, Service, Team, TeamMember,
};
use crate::services::{ListFilter, ResourceService, Services};

#[derive(Clone)]
pub struct Queries {
    client: QueryClient,
    services: Services,
    defaults: QueryOptions,
}

impl Queries {
    pub fn new(client: QueryClient, services: Services) -> Self {
        Self {
            client,
            services,
            defaults: QueryOptions::default(),
        }
    }

    /// Override the read policy used by every query below.
    pub fn with_defaults(mut self, defaults: QueryOptions) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn client(&self) -> &QueryClient {
        &self.client
    }

    /// The request builders behind these queries.
    pub fn api(&self) -> &Services {
        &self.services
    }

    async fn list_for_church<T>(
        &self,
        service: &ResourceService<T>,
        church_id: Option<&str>,
    ) -> QueryResult<Vec<T>>
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        let options = self.defaults.clone().requires(&[church_id]);
        let church_id = church_id.unwrap_or_default().to_string();
        let key = QueryKey::new(service.resource()).with(church_id.clone());
        let service = service.clone();
        let filter = ListFilter::for_church(church_id);
        self.client
            .fetch(key, &options, move || {
                let service = service.clone();
                let filter = filter.clone();
                async move { service.list(&filter).await }
            })
            .await
    }

    async fn by_id<T>(&self, service: &ResourceService<T>, id: Option<&str>) -> QueryResult<T>
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        let options = self.defaults.clone().requires(&[id]);
        let id = id.unwrap_or_default().to_string();
        let key = QueryKey::new(service.resource()).with("detail").with(id.clone());
        let service = service.clone();
        self.client
            .fetch(key, &options, move || {
                let service = service.clone();
                let id = id.clone();
                async move { service.get_by_id(&id).await }
            })
            .await
    }

    pub async fn me(&self) -> QueryResult<CurrentUser> {
        let auth = self.services.auth.clone();
        self.client
            .fetch(QueryKey::new("auth").with("me"), &self.defaults, move || {
                let auth = auth.clone();
                async move { auth.me().await }
            })
            .await
    }

    pub async fn churches(&self) -> QueryResult<Vec<Church>> {
        let churches = self.services.churches.clone();
        self.client
            .fetch(QueryKey::new("churches"), &self.defaults, move || {
                let churches = churches.clone();
                async move { churches.list(&ListFilter::default()).await }
            })
            .await
    }

    pub async fn church(&self, church_id: Option<&str>) -> QueryResult<Church> {
        self.by_id(&self.services.churches, church_id).await
    }

    pub async fn people(&self, church_id: Option<&str>) -> QueryResult<Vec<Person>> {
        self.list_for_church(&self.services.people, church_id).await
    }

    pub async fn person(&self, person_id: Option<&str>) -> QueryResult<Person> {
        self.by_id(&self.services.people, person_id).await
    }

    pub async fn teams(&self, church_id: Option<&str>) -> QueryResult<Vec<Team>> {
        self.list_for_church(&self.services.teams, church_id).await
    }

    pub async fn team_members(&self, team_id: Option<&str>) -> QueryResult<Vec<TeamMember>> {
        let options = self.defaults.clone().requires(&[team_id]);
        let team_id = team_id.unwrap_or_default().to_string();
        let key = QueryKey::new("teams").with("members").with(team_id.clone());
        let teams = self.services.teams.clone();
        self.client
            .fetch(key, &options, move || {
                let teams = teams.clone();
                let team_id = team_id.clone();
                async move { teams.members(&team_id).await }
            })
            .await
    }

    pub async fn ministries(&self, church_id: Option<&str>) -> QueryResult<Vec<Ministry>> {
        self.list_for_church(&self.services.ministries, church_id).await
    }

    pub async fn services(&self, church_id: Option<&str>) -> QueryResult<Vec<Service>> {
        self.list_for_church(&self.services.services, church_id).await
    }

    pub async fn schedules_for_service(
        &self,
        service_id: Option<&str>,
    ) -> QueryResult<Vec<Schedule>> {
        let options = self.defaults.clone().requires(&[service_id]);
        let service_id = service_id.unwrap_or_default().to_string();
        let key = QueryKey::new("schedules").with(service_id.clone());
        let schedules = self.services.schedules.clone();
        self.client
            .fetch(key, &options, move || {
                let schedules = schedules.clone();
                let service_id = service_id.clone();
                async move { schedules.list_for_service(&service_id).await }
            })
            .await
    }

    pub async fn update_person<P: Serialize>(
        &self,
        person_id: &str,
        payload: &P,
    ) -> Result<Person, ApiError> {
        let options = MutationOptions::default().invalidates(QueryKey::new("people"));
        self.client
            .mutate(&options, || self.services.people.update(person_id, payload))
            .await
    }

    pub async fn create_team<P: Serialize>(&self, payload: &P) -> Result<Team, ApiError> {
        let options = MutationOptions::default().invalidates(QueryKey::new("teams"));
        self.client
            .mutate(&options, || self.services.teams.create(payload))
            .await
    }

    pub async fn check_in(&self, check_in: &CheckIn) -> Result<Attendance, ApiError> {
        let options = MutationOptions::default()
            .invalidates(QueryKey::new("attendance"))
            .invalidates(QueryKey::new("schedules").with(check_in.service_id.clone()));
        self.client
            .mutate(&options, || self.services.attendance.check_in(check_in))
            .await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::api::{ApiClient, ApiClientConfig};
    use crate::services::create_services;

    fn queries_for(base_url: &str) -> Queries {
        let client = ApiClient::new(ApiClientConfig::without_storage(base_url)).unwrap();
        Queries::new(QueryClient::new(), create_services(client.instance()))
    }

    #[tokio::test]
    async fn test_people_without_church_stays_idle() {
        let server = MockServer::start().await;
        let queries = queries_for(&server.uri());

        let result = queries.people(None).await;

        assert!(result.is_idle());
        assert!(result.data.is_none());
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_people_queries_share_one_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/people"))
            .and(query_param("churchId", "c1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({
                        "statusCode": 200,
                        "route": "/people",
                        "data": [{"id": "p1", "name": "Ana"}]
                    }))
                    .set_delay(std::time::Duration::from_millis(50)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let queries = queries_for(&server.uri());
        let (a, b) = tokio::join!(queries.people(Some("c1")), queries.people(Some("c1")));

        assert_eq!(a.data.as_ref().unwrap()[0].name, "Ana");
        assert_eq!(a.data, b.data);
    }

    #[tokio::test]
    async fn test_create_team_invalidates_team_lists() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/teams"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "statusCode": 200,
                "route": "/teams",
                "data": []
            })))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/teams"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "statusCode": 201,
                "route": "/teams",
                "data": {"id": "t1", "name": "Media", "churchId": "c1"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let queries = queries_for(&server.uri());
        queries.teams(Some("c1")).await;
        queries.teams(Some("c1")).await;

        let team = queries
            .create_team(&json!({"name": "Media", "churchId": "c1"}))
            .await
            .unwrap();
        assert_eq!(team.id, "t1");

        let after = queries.teams(Some("c1")).await;
        assert!(after.is_success());
    }

    #[tokio::test]
    async fn test_failed_mutation_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/people/p1"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let queries = queries_for(&server.uri());
        let err = queries
            .update_person("p1", &json!({"name": "Ana Maria"}))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(503));
    }

    #[tokio::test]
    async fn test_mock_mode_queries() {
        let config = ApiClientConfig::without_storage("http://127.0.0.1:9").use_mock(true);
        let client = ApiClient::new(config).unwrap();
        let queries = Queries::new(QueryClient::new(), create_services(client.instance()));

        let teams = queries.teams(Some("c1")).await;
        assert_eq!(teams.data.unwrap().len(), 2);
        let members = queries.team_members(Some("t1")).await;
        assert_eq!(members.data.unwrap().len(), 2);
        let church = queries.church(Some("c1")).await;
        assert_eq!(church.data.unwrap().name, "Grace Community Church");

        let check_in = CheckIn {
            person_id: "p2".to_string(),
            service_id: "sv1".to_string(),
            security_code: None,
        };
        let attendance = queries.check_in(&check_in).await.unwrap();
        assert_eq!(attendance.person_id, "p2");
        assert!(!attendance.is_checked_out());
    }
}
