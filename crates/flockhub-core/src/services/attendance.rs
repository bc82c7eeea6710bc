use super::resource::ResourceService;
use crate::api::{ApiError, Envelope};
use crate::models::{Attendance, CheckIn};

pub type AttendanceService = ResourceService<Attendance>;

impl AttendanceService {
    pub async fn check_in(&self, check_in: &CheckIn) -> Result<Attendance, ApiError> {
        if check_in.person_id.is_empty() || check_in.service_id.is_empty() {
            return Err(ApiError::Validation(
                "Check-in requires both a person and a service".into(),
            ));
        }
        self.instance()
            .post("/attendance/check-in", check_in)
            .await
            .map(Envelope::into_data)
    }
}
