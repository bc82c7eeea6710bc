use serde::{Deserialize, Serialize};

use super::TeamRole;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Team {
    pub id: String,
    pub name: String,
    #[serde(rename = "churchId")]
    pub church_id: String,
    #[serde(rename = "ministryId", default, skip_serializing_if = "Option::is_none")]
    pub ministry_id: Option<String>,
    #[serde(rename = "memberCount", default, skip_serializing_if = "Option::is_none")]
    pub member_count: Option<u32>,
}

impl Team {
    pub fn display_member_count(&self) -> String {
        match self.member_count {
            Some(1) => "1 member".to_string(),
            Some(count) => format!("{} members", count),
            None => "Unknown".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct TeamMember {
    #[serde(rename = "personId")]
    pub person_id: String,
    pub name: String,
    pub role: TeamRole,
}
