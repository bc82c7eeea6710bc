use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A scheduled worship service or gathering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Service {
    pub id: String,
    pub name: String,
    #[serde(rename = "churchId")]
    pub church_id: String,
    #[serde(rename = "startsAt")]
    #[cfg_attr(feature = "ts", ts(type = "string"))]
    pub starts_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl Service {
    pub fn is_upcoming(&self) -> bool {
        self.starts_at > Utc::now()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum ScheduleStatus {
    Pending,
    Confirmed,
    Declined,
}

impl ScheduleStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ScheduleStatus::Pending => "Awaiting reply",
            ScheduleStatus::Confirmed => "Confirmed",
            ScheduleStatus::Declined => "Declined",
        }
    }
}

/// A volunteer assigned to serve on a team at a service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Schedule {
    pub id: String,
    #[serde(rename = "serviceId")]
    pub service_id: String,
    #[serde(rename = "teamId")]
    pub team_id: String,
    #[serde(rename = "personId")]
    pub person_id: String,
    pub status: ScheduleStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_parses_status() {
        let schedule: Schedule = serde_json::from_str(
            r#"{"id":"s1","serviceId":"sv1","teamId":"t1","personId":"p1","status":"CONFIRMED"}"#,
        )
        .unwrap();
        assert_eq!(schedule.status, ScheduleStatus::Confirmed);
        assert_eq!(schedule.status.label(), "Confirmed");
    }

    #[test]
    fn test_is_upcoming() {
        let service = Service {
            id: "sv1".to_string(),
            name: "Sunday 9am".to_string(),
            church_id: "c1".to_string(),
            starts_at: Utc::now() + chrono::Duration::days(2),
            location: None,
        };
        assert!(service.is_upcoming());
    }
}
