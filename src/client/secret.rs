//! Organization secret endpoints.

use reqwest::Method;

use crate::error::ClientError;
use crate::models::secret::OrganizationSecret;

use super::{path, PortClient};

impl PortClient {
    /// Fetch a secret. The value is never returned by the server.
    pub async fn get_organization_secret(
        &self,
        secret_name: &str,
    ) -> Result<(Option<OrganizationSecret>, u16), ClientError> {
        self.send(
            Method::GET,
            &path("v1/organization/secrets/{name}", &[("name", secret_name)]),
            &[],
            None,
            "secret",
        )
        .await
    }

    /// Create a secret.
    pub async fn create_organization_secret(
        &self,
        secret: &OrganizationSecret,
    ) -> Result<(Option<OrganizationSecret>, u16), ClientError> {
        let body = serde_json::to_value(secret)?;
        self.send(
            Method::POST,
            "v1/organization/secrets",
            &[],
            Some(&body),
            "secret",
        )
        .await
    }

    /// Patch a secret's value or description.
    pub async fn update_organization_secret(
        &self,
        secret_name: &str,
        secret: &OrganizationSecret,
    ) -> Result<(Option<OrganizationSecret>, u16), ClientError> {
        let body = serde_json::to_value(secret)?;
        self.send(
            Method::PATCH,
            &path("v1/organization/secrets/{name}", &[("name", secret_name)]),
            &[],
            Some(&body),
            "secret",
        )
        .await
    }

    /// Delete a secret.
    pub async fn delete_organization_secret(
        &self,
        secret_name: &str,
    ) -> Result<u16, ClientError> {
        self.send_expect_ok(
            Method::DELETE,
            &path("v1/organization/secrets/{name}", &[("name", secret_name)]),
            &[],
            None,
        )
        .await
    }
}
