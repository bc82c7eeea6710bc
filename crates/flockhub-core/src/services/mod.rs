//! Typed request builders per backend resource.
//!
//! `create_services` takes the facade's instance and returns one independent
//! service per resource. Each exposes `get_by_id`, `list`, `create`, `update`
//! and `delete`; a few add resource-specific routes.

pub mod attendance;
pub mod auth;
pub mod resource;
pub mod schedules;
pub mod teams;

use crate::api::Instance;
use crate::models::{Church, Communication, Ministry, Person, Service};

pub use attendance::AttendanceService;
pub use auth::{AuthService, Credentials};
pub use resource::ResourceService;
pub use schedules::SchedulesService;
pub use teams::TeamsService;

pub type PeopleService = ResourceService<Person>;
pub type ServicesService = ResourceService<Service>;
pub type CommunicationService = ResourceService<Communication>;
pub type ChurchesService = ResourceService<Church>;
pub type MinistriesService = ResourceService<Ministry>;

/// Filter for list requests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListFilter {
    pub church_id: Option<String>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl ListFilter {
    pub fn for_church(church_id: impl Into<String>) -> Self {
        Self {
            church_id: Some(church_id.into()),
            ..Self::default()
        }
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn page(mut self, page: u32, limit: u32) -> Self {
        self.page = Some(page);
        self.limit = Some(limit);
        self
    }

    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        if let Some(ref church_id) = self.church_id {
            query.push(("churchId".to_string(), church_id.clone()));
        }
        if let Some(ref search) = self.search {
            if !search.is_empty() {
                query.push(("search".to_string(), search.clone()));
            }
        }
        if let Some(page) = self.page {
            query.push(("page".to_string(), page.to_string()));
        }
        if let Some(limit) = self.limit {
            query.push(("limit".to_string(), limit.to_string()));
        }
        query
    }
}

/// All resource services, sharing one instance.
#[derive(Clone)]
pub struct Services {
    pub auth: AuthService,
    pub people: PeopleService,
    pub teams: TeamsService,
    pub services: ServicesService,
    pub schedules: SchedulesService,
    pub attendance: AttendanceService,
    pub communication: CommunicationService,
    pub churches: ChurchesService,
    pub ministries: MinistriesService,
}

pub fn create_services(instance: Instance) -> Services {
    Services {
        auth: AuthService::new(instance.clone()),
        people: ResourceService::new(instance.clone(), "people"),
        teams: ResourceService::new(instance.clone(), "teams"),
        services: ResourceService::new(instance.clone(), "services"),
        schedules: ResourceService::new(instance.clone(), "schedules"),
        attendance: ResourceService::new(instance.clone(), "attendance"),
        communication: ResourceService::new(instance.clone(), "communication"),
        churches: ResourceService::new(instance.clone(), "churches"),
        ministries: ResourceService::new(instance, "ministries"),
    }
}
