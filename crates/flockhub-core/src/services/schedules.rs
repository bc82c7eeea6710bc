use super::resource::{validate_id, ResourceService};
use crate::api::{ApiError, Envelope};
use crate::models::Schedule;

pub type SchedulesService = ResourceService<Schedule>;

impl SchedulesService {
    /// Volunteer assignments for one service.
    pub async fn list_for_service(&self, service_id: &str) -> Result<Vec<Schedule>, ApiError> {
        let path = format!("/services/{}/schedules", validate_id(service_id)?);
        self.instance().get(&path).await.map(Envelope::into_data)
    }
}
