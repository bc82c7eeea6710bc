use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A recorded check-in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Attendance {
    pub id: String,
    #[serde(rename = "personId")]
    pub person_id: String,
    #[serde(rename = "serviceId")]
    pub service_id: String,
    #[serde(rename = "checkedInAt")]
    #[cfg_attr(feature = "ts", ts(type = "string"))]
    pub checked_in_at: DateTime<Utc>,
    #[serde(rename = "checkedOutAt", default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "ts", ts(type = "string | null"))]
    pub checked_out_at: Option<DateTime<Utc>>,
}

impl Attendance {
    pub fn is_checked_out(&self) -> bool {
        self.checked_out_at.is_some()
    }
}

/// Check-in request payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct CheckIn {
    #[serde(rename = "personId")]
    pub person_id: String,
    #[serde(rename = "serviceId")]
    pub service_id: String,
    /// Printed label code for children's ministry pickup.
    #[serde(rename = "securityCode", default, skip_serializing_if = "Option::is_none")]
    pub security_code: Option<String>,
}
