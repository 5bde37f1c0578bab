//! Team endpoints.

use reqwest::Method;

use crate::error::ClientError;
use crate::models::team::Team;

use super::{path, PortClient};

impl PortClient {
    /// Fetch a team, projecting the fields the provider manages.
    pub async fn get_team(&self, name: &str) -> Result<(Option<Team>, u16), ClientError> {
        self.send(
            Method::GET,
            &path("v1/teams/{name}", &[("name", name)]),
            &[(
                "fields",
                "name,description,users.email,provider,createdAt,updatedAt".to_string(),
            )],
            None,
            "team",
        )
        .await
    }

    /// Create a team.
    pub async fn create_team(&self, team: &Team) -> Result<(Option<Team>, u16), ClientError> {
        let body = serde_json::to_value(team)?;
        self.send(Method::POST, "v1/teams", &[], Some(&body), "team")
            .await
    }

    /// Patch a team.
    pub async fn update_team(
        &self,
        name: &str,
        team: &Team,
    ) -> Result<(Option<Team>, u16), ClientError> {
        let body = serde_json::to_value(team)?;
        self.send(
            Method::PATCH,
            &path("v1/teams/{name}", &[("name", name)]),
            &[],
            Some(&body),
            "team",
        )
        .await
    }

    /// Delete a team.
    pub async fn delete_team(&self, name: &str) -> Result<u16, ClientError> {
        self.send_expect_ok(
            Method::DELETE,
            &path("v1/teams/{name}", &[("name", name)]),
            &[],
            None,
        )
        .await
    }
}
