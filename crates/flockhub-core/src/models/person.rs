use serde::{Deserialize, Serialize};

use super::ChurchRole;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Person {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(rename = "churchId", default, skip_serializing_if = "Option::is_none")]
    pub church_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<ChurchRole>,
}

impl Person {
    /// Name plus role label, e.g. "Ana (Volunteer)".
    pub fn display_name(&self) -> String {
        match self.role {
            Some(role) => format!("{} ({})", self.name, role.label()),
            None => self.name.clone(),
        }
    }
}
