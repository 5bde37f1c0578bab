//! Blueprint endpoints, including cascade deletion and migration polling.

use std::time::Duration;

use reqwest::Method;
use serde::Deserialize;
use tracing::debug;

use crate::error::ClientError;
use crate::models::blueprint::{Blueprint, Migration};

use super::{path, PortClient};

/// Interval between migration polls during cascade deletion.
const MIGRATION_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Polls allowed before a non-terminal migration is declared stuck.
const MIGRATION_POLL_MAX: u32 = 90;

impl PortClient {
    /// Fetch a blueprint. Calculated properties are excluded so server-side
    /// derivations do not pollute the read.
    pub async fn get_blueprint(
        &self,
        identifier: &str,
    ) -> Result<(Option<Blueprint>, u16), ClientError> {
        self.send(
            Method::GET,
            &path("v1/blueprints/{id}", &[("id", identifier)]),
            &[("exclude_calculated_properties", "true".to_string())],
            None,
            "blueprint",
        )
        .await
    }

    /// Create a blueprint, optionally creating a catalog page alongside it.
    pub async fn create_blueprint(
        &self,
        blueprint: &Blueprint,
        create_catalog_page: Option<bool>,
    ) -> Result<(Option<Blueprint>, u16), ClientError> {
        let mut query = Vec::new();
        if let Some(flag) = create_catalog_page {
            query.push(("create_catalog_page", flag.to_string()));
        }
        let body = serde_json::to_value(blueprint)?;
        self.send(Method::POST, "v1/blueprints", &query, Some(&body), "blueprint")
            .await
    }

    /// Replace a blueprint document.
    pub async fn update_blueprint(
        &self,
        identifier: &str,
        blueprint: &Blueprint,
    ) -> Result<(Option<Blueprint>, u16), ClientError> {
        let body = serde_json::to_value(blueprint)?;
        self.send(
            Method::PUT,
            &path("v1/blueprints/{id}", &[("id", identifier)]),
            &[],
            Some(&body),
            "blueprint",
        )
        .await
    }

    /// Delete a blueprint that has no entities.
    pub async fn delete_blueprint(&self, identifier: &str) -> Result<u16, ClientError> {
        self.send_expect_ok(
            Method::DELETE,
            &path("v1/blueprints/{id}", &[("id", identifier)]),
            &[],
            None,
        )
        .await
    }

    /// Delete a blueprint together with all its entities. Returns the
    /// migration id to poll via [`get_migration`](Self::get_migration).
    pub async fn delete_blueprint_with_all_entities(
        &self,
        identifier: &str,
    ) -> Result<Option<String>, ClientError> {
        #[derive(Debug, Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct MigrationRef {
            id: String,
        }

        let (migration, _status) = self
            .send::<MigrationRef>(
                Method::DELETE,
                &path("v1/blueprints/{id}/all-entities", &[("id", identifier)]),
                &[("delete_blueprint", "true".to_string())],
                None,
                "migration",
            )
            .await?;
        Ok(migration.map(|m| m.id))
    }

    /// Fetch a migration record.
    pub async fn get_migration(
        &self,
        migration_id: &str,
    ) -> Result<(Option<Migration>, u16), ClientError> {
        self.send(
            Method::GET,
            &path("v1/migrations/{id}", &[("id", migration_id)]),
            &[],
            None,
            "migration",
        )
        .await
    }

    /// Poll a migration until it reaches a terminal state. Fails if the
    /// migration record disappears, does not complete successfully, or is
    /// still running after [`MIGRATION_POLL_MAX`] polls.
    pub async fn wait_for_migration(&self, migration_id: &str) -> Result<(), ClientError> {
        self.wait_for_migration_bounded(migration_id, MIGRATION_POLL_MAX)
            .await
    }

    async fn wait_for_migration_bounded(
        &self,
        migration_id: &str,
        max_polls: u32,
    ) -> Result<(), ClientError> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let (migration, status) = self.get_migration(migration_id).await?;
            let migration = migration.ok_or(ClientError::Protocol {
                status,
                body: format!("migration {migration_id} not found"),
            })?;
            if migration.is_terminal() {
                if migration.is_complete() {
                    return Ok(());
                }
                return Err(ClientError::Protocol {
                    status,
                    body: format!(
                        "migration {migration_id} ended with status {}",
                        migration.status
                    ),
                });
            }
            if attempt >= max_polls {
                return Err(ClientError::Protocol {
                    status,
                    body: format!(
                        "migration {migration_id} still {} after {attempt} polls",
                        migration.status
                    ),
                });
            }
            debug!(
                target: "port_provider::client",
                migration_id, status = %migration.status, attempt, "migration in progress"
            );
            tokio::time::sleep(MIGRATION_POLL_INTERVAL).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use crate::client::rate_limit::RateLimitGovernor;
    use crate::client::PortClient;
    use crate::models::blueprint::Blueprint;

    fn test_client(server: &MockServer) -> PortClient {
        PortClient::builder(server.base_url())
            .governor(RateLimitGovernor::new(false, false))
            .token("t")
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_get_blueprint_excludes_calculated_properties() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/v1/blueprints/svc")
                    .query_param("exclude_calculated_properties", "true");
                then.status(200)
                    .json_body(json!({"ok": true, "blueprint": {"identifier": "svc"}}));
            })
            .await;

        let client = test_client(&server);
        let (bp, status) = client.get_blueprint("svc").await.unwrap();

        mock.assert_async().await;
        assert_eq!(status, 200);
        assert_eq!(bp.unwrap().identifier, "svc");
    }

    #[tokio::test]
    async fn test_create_blueprint_with_catalog_page() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/blueprints")
                    .query_param("create_catalog_page", "true");
                then.status(201)
                    .json_body(json!({"ok": true, "blueprint": {"identifier": "svc"}}));
            })
            .await;

        let client = test_client(&server);
        let blueprint = Blueprint {
            identifier: "svc".into(),
            ..Default::default()
        };
        let (created, _) = client
            .create_blueprint(&blueprint, Some(true))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(created.unwrap().identifier, "svc");
    }

    #[tokio::test]
    async fn test_cascade_delete_returns_migration_id() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(DELETE)
                    .path("/v1/blueprints/svc/all-entities")
                    .query_param("delete_blueprint", "true");
                then.status(200)
                    .json_body(json!({"ok": true, "migration": {"id": "mig_1"}}));
            })
            .await;

        let client = test_client(&server);
        let id = client
            .delete_blueprint_with_all_entities("svc")
            .await
            .unwrap();
        assert_eq!(id.as_deref(), Some("mig_1"));
    }

    #[tokio::test]
    async fn test_wait_for_migration_failure_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/migrations/mig_1");
                then.status(200).json_body(
                    json!({"ok": true, "migration": {"id": "mig_1", "status": "FAILURE"}}),
                );
            })
            .await;

        let client = test_client(&server);
        let err = client.wait_for_migration("mig_1").await.unwrap_err();
        assert!(err.to_string().contains("FAILURE"));
    }

    #[tokio::test]
    async fn test_wait_for_migration_gives_up_when_stuck() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/migrations/mig_1");
                then.status(200).json_body(
                    json!({"ok": true, "migration": {"id": "mig_1", "status": "RUNNING"}}),
                );
            })
            .await;

        let client = test_client(&server);
        let err = client
            .wait_for_migration_bounded("mig_1", 1)
            .await
            .unwrap_err();

        assert_eq!(mock.hits_async().await, 1);
        assert!(err.to_string().contains("still RUNNING"));
    }
}
