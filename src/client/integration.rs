//! Integration endpoints.

use reqwest::Method;

use crate::error::ClientError;
use crate::models::integration::Integration;

use super::{path, PortClient};

impl PortClient {
    /// Fetch an integration by installation id.
    pub async fn get_integration(
        &self,
        installation_id: &str,
    ) -> Result<(Option<Integration>, u16), ClientError> {
        self.send(
            Method::GET,
            &path("v1/integration/{id}", &[("id", installation_id)]),
            &[("byField", "installationId".to_string())],
            None,
            "integration",
        )
        .await
    }

    /// Create an integration.
    pub async fn create_integration(
        &self,
        integration: &Integration,
    ) -> Result<(Option<Integration>, u16), ClientError> {
        let body = serde_json::to_value(integration)?;
        self.send(Method::POST, "v1/integration", &[], Some(&body), "integration")
            .await
    }

    /// Patch an integration.
    pub async fn update_integration(
        &self,
        installation_id: &str,
        integration: &Integration,
    ) -> Result<(Option<Integration>, u16), ClientError> {
        let body = serde_json::to_value(integration)?;
        self.send(
            Method::PATCH,
            &path("v1/integration/{id}", &[("id", installation_id)]),
            &[],
            Some(&body),
            "integration",
        )
        .await
    }

    /// Delete an integration.
    pub async fn delete_integration(&self, installation_id: &str) -> Result<u16, ClientError> {
        self.send_expect_ok(
            Method::DELETE,
            &path("v1/integration/{id}", &[("id", installation_id)]),
            &[],
            None,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use crate::client::rate_limit::RateLimitGovernor;
    use crate::client::PortClient;

    #[tokio::test]
    async fn test_get_integration_by_installation_id() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/v1/integration/github-main")
                    .query_param("byField", "installationId");
                then.status(200).json_body(json!({
                    "ok": true,
                    "integration": {"installationId": "github-main"}
                }));
            })
            .await;

        let client = PortClient::builder(server.base_url())
            .governor(RateLimitGovernor::new(false, false))
            .token("t")
            .build()
            .unwrap();

        let (integration, _) = client.get_integration("github-main").await.unwrap();
        mock.assert_async().await;
        assert_eq!(integration.unwrap().installation_id, "github-main");
    }
}
