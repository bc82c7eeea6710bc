use serde::{Deserialize, Serialize};

/// A member's role within a church.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum ChurchRole {
    Admin,
    Pastor,
    Leader,
    Volunteer,
    Member,
}

impl ChurchRole {
    pub const ALL: [ChurchRole; 5] = [
        ChurchRole::Admin,
        ChurchRole::Pastor,
        ChurchRole::Leader,
        ChurchRole::Volunteer,
        ChurchRole::Member,
    ];

    /// Get the display label for this role.
    pub fn label(&self) -> &'static str {
        match self {
            ChurchRole::Admin => "Administrator",
            ChurchRole::Pastor => "Pastor",
            ChurchRole::Leader => "Ministry Leader",
            ChurchRole::Volunteer => "Volunteer",
            ChurchRole::Member => "Member",
        }
    }

    /// Whether this role may edit schedules and rosters.
    pub fn can_manage(&self) -> bool {
        match self {
            ChurchRole::Admin | ChurchRole::Pastor | ChurchRole::Leader => true,
            ChurchRole::Volunteer | ChurchRole::Member => false,
        }
    }
}

impl std::fmt::Display for ChurchRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A volunteer's position on a team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum TeamRole {
    Lead,
    Coordinator,
    Member,
    Trainee,
}

impl TeamRole {
    pub fn label(&self) -> &'static str {
        match self {
            TeamRole::Lead => "Team Lead",
            TeamRole::Coordinator => "Coordinator",
            TeamRole::Member => "Team Member",
            TeamRole::Trainee => "Trainee",
        }
    }
}

impl std::fmt::Display for TeamRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}
