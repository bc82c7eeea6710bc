use super::resource::{validate_id, ResourceService};
use crate::api::{ApiError, Envelope};
use crate::models::{Team, TeamMember};

pub type TeamsService = ResourceService<Team>;

impl TeamsService {
    /// Roster of a team with each member's position.
    pub async fn members(&self, team_id: &str) -> Result<Vec<TeamMember>, ApiError> {
        let path = format!("/teams/{}/members", validate_id(team_id)?);
        self.instance().get(&path).await.map(Envelope::into_data)
    }
}
