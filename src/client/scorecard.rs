//! Scorecard endpoints, addressed through the owning blueprint.

use reqwest::Method;

use crate::error::ClientError;
use crate::models::scorecard::Scorecard;

use super::{path, PortClient};

impl PortClient {
    /// Fetch a scorecard of a blueprint.
    pub async fn get_scorecard(
        &self,
        blueprint: &str,
        identifier: &str,
    ) -> Result<(Option<Scorecard>, u16), ClientError> {
        self.send(
            Method::GET,
            &path(
                "v1/blueprints/{bp}/scorecards/{id}",
                &[("bp", blueprint), ("id", identifier)],
            ),
            &[],
            None,
            "scorecard",
        )
        .await
    }

    /// Create a scorecard on a blueprint.
    pub async fn create_scorecard(
        &self,
        blueprint: &str,
        scorecard: &Scorecard,
    ) -> Result<(Option<Scorecard>, u16), ClientError> {
        let body = serde_json::to_value(scorecard)?;
        self.send(
            Method::POST,
            &path("v1/blueprints/{bp}/scorecards", &[("bp", blueprint)]),
            &[],
            Some(&body),
            "scorecard",
        )
        .await
    }

    /// Replace a scorecard document.
    pub async fn update_scorecard(
        &self,
        blueprint: &str,
        identifier: &str,
        scorecard: &Scorecard,
    ) -> Result<(Option<Scorecard>, u16), ClientError> {
        let body = serde_json::to_value(scorecard)?;
        self.send(
            Method::PUT,
            &path(
                "v1/blueprints/{bp}/scorecards/{id}",
                &[("bp", blueprint), ("id", identifier)],
            ),
            &[],
            Some(&body),
            "scorecard",
        )
        .await
    }

    /// Delete a scorecard.
    pub async fn delete_scorecard(
        &self,
        blueprint: &str,
        identifier: &str,
    ) -> Result<u16, ClientError> {
        self.send_expect_ok(
            Method::DELETE,
            &path(
                "v1/blueprints/{bp}/scorecards/{id}",
                &[("bp", blueprint), ("id", identifier)],
            ),
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
    async fn test_get_scorecard_addresses_blueprint() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/blueprints/svc/scorecards/readiness");
                then.status(200).json_body(json!({
                    "ok": true,
                    "scorecard": {"identifier": "readiness", "title": "Readiness"}
                }));
            })
            .await;

        let client = PortClient::builder(server.base_url())
            .governor(RateLimitGovernor::new(false, false))
            .token("t")
            .build()
            .unwrap();

        let (scorecard, _) = client.get_scorecard("svc", "readiness").await.unwrap();
        mock.assert_async().await;
        assert_eq!(scorecard.unwrap().identifier, "readiness");
    }
}
