//! Webhook endpoints.

use reqwest::Method;

use crate::error::ClientError;
use crate::models::webhook::Webhook;

use super::{path, PortClient};

impl PortClient {
    /// Fetch a webhook.
    pub async fn get_webhook(
        &self,
        identifier: &str,
    ) -> Result<(Option<Webhook>, u16), ClientError> {
        self.send(
            Method::GET,
            &path("v1/webhooks/{id}", &[("id", identifier)]),
            &[],
            None,
            "integration",
        )
        .await
    }

    /// Create a webhook.
    pub async fn create_webhook(
        &self,
        webhook: &Webhook,
    ) -> Result<(Option<Webhook>, u16), ClientError> {
        let body = serde_json::to_value(webhook)?;
        self.send(Method::POST, "v1/webhooks", &[], Some(&body), "integration")
            .await
    }

    /// Replace a webhook document.
    pub async fn update_webhook(
        &self,
        identifier: &str,
        webhook: &Webhook,
    ) -> Result<(Option<Webhook>, u16), ClientError> {
        let body = serde_json::to_value(webhook)?;
        self.send(
            Method::PUT,
            &path("v1/webhooks/{id}", &[("id", identifier)]),
            &[],
            Some(&body),
            "integration",
        )
        .await
    }

    /// Delete a webhook.
    pub async fn delete_webhook(&self, identifier: &str) -> Result<u16, ClientError> {
        self.send_expect_ok(
            Method::DELETE,
            &path("v1/webhooks/{id}", &[("id", identifier)]),
            &[],
            None,
        )
        .await
    }
}
