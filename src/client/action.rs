//! Action endpoints.

use reqwest::Method;

use crate::error::ClientError;
use crate::models::action::Action;

use super::{path, PortClient};

impl PortClient {
    /// Fetch an action.
    pub async fn get_action(
        &self,
        identifier: &str,
    ) -> Result<(Option<Action>, u16), ClientError> {
        self.send(
            Method::GET,
            &path("v1/actions/{id}", &[("id", identifier)]),
            &[],
            None,
            "action",
        )
        .await
    }

    /// Create an action.
    pub async fn create_action(
        &self,
        action: &Action,
    ) -> Result<(Option<Action>, u16), ClientError> {
        let body = serde_json::to_value(action)?;
        self.send(Method::POST, "v1/actions", &[], Some(&body), "action")
            .await
    }

    /// Replace an action document.
    pub async fn update_action(
        &self,
        identifier: &str,
        action: &Action,
    ) -> Result<(Option<Action>, u16), ClientError> {
        let body = serde_json::to_value(action)?;
        self.send(
            Method::PUT,
            &path("v1/actions/{id}", &[("id", identifier)]),
            &[],
            Some(&body),
            "action",
        )
        .await
    }

    /// Delete an action.
    pub async fn delete_action(&self, identifier: &str) -> Result<u16, ClientError> {
        self.send_expect_ok(
            Method::DELETE,
            &path("v1/actions/{id}", &[("id", identifier)]),
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
    use crate::models::action::Action;

    fn test_client(server: &MockServer) -> PortClient {
        PortClient::builder(server.base_url())
            .governor(RateLimitGovernor::new(false, false))
            .token("t")
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_action_round_trip() {
        let server = MockServer::start_async().await;
        let create = server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/actions");
                then.status(201).json_body(json!({
                    "ok": true,
                    "action": {"identifier": "restart", "title": "Restart"}
                }));
            })
            .await;

        let client = test_client(&server);
        let action = Action {
            identifier: "restart".into(),
            title: Some("Restart".into()),
            ..Default::default()
        };
        let (created, _) = client.create_action(&action).await.unwrap();

        create.assert_async().await;
        assert_eq!(created.unwrap().title.as_deref(), Some("Restart"));
    }
}
