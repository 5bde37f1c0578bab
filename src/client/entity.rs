//! Entity endpoints, including upsert-style creation and search.

use reqwest::Method;

use crate::error::ClientError;
use crate::models::entity::{Entity, SearchRequest};

use super::{path, PortClient};

/// Optional flags for entity creation.
#[derive(Debug, Clone, Default)]
pub struct CreateEntityOptions {
    /// Action run to correlate the change with.
    pub run_id: Option<String>,
    /// Create referenced entities that do not exist yet.
    pub create_missing_related_entities: bool,
}

impl PortClient {
    /// Fetch an entity of a blueprint, excluding calculated properties.
    pub async fn get_entity(
        &self,
        blueprint: &str,
        identifier: &str,
    ) -> Result<(Option<Entity>, u16), ClientError> {
        self.send(
            Method::GET,
            &path(
                "v1/blueprints/{bp}/entities/{id}",
                &[("bp", blueprint), ("id", identifier)],
            ),
            &[("exclude_calculated_properties", "true".to_string())],
            None,
            "entity",
        )
        .await
    }

    /// Create or upsert an entity.
    pub async fn create_entity(
        &self,
        blueprint: &str,
        entity: &Entity,
        options: &CreateEntityOptions,
    ) -> Result<(Option<Entity>, u16), ClientError> {
        let mut query = vec![("upsert", "true".to_string())];
        if let Some(run_id) = &options.run_id {
            query.push(("run_id", run_id.clone()));
        }
        if options.create_missing_related_entities {
            query.push(("create_missing_related_entities", "true".to_string()));
        }
        let body = serde_json::to_value(entity)?;
        self.send(
            Method::POST,
            &path("v1/blueprints/{bp}/entities", &[("bp", blueprint)]),
            &query,
            Some(&body),
            "entity",
        )
        .await
    }

    /// Replace an entity document.
    pub async fn update_entity(
        &self,
        blueprint: &str,
        identifier: &str,
        entity: &Entity,
    ) -> Result<(Option<Entity>, u16), ClientError> {
        let body = serde_json::to_value(entity)?;
        self.send(
            Method::PUT,
            &path(
                "v1/blueprints/{bp}/entities/{id}",
                &[("bp", blueprint), ("id", identifier)],
            ),
            &[],
            Some(&body),
            "entity",
        )
        .await
    }

    /// Delete an entity.
    pub async fn delete_entity(
        &self,
        blueprint: &str,
        identifier: &str,
    ) -> Result<u16, ClientError> {
        self.delete_entity_with_flag(blueprint, identifier, false).await
    }

    /// Delete an entity, optionally deleting dependent entities with it.
    pub async fn delete_entity_with_flag(
        &self,
        blueprint: &str,
        identifier: &str,
        delete_dependents: bool,
    ) -> Result<u16, ClientError> {
        let mut query = Vec::new();
        if delete_dependents {
            query.push(("delete_dependents", "true".to_string()));
        }
        self.send_expect_ok(
            Method::DELETE,
            &path(
                "v1/blueprints/{bp}/entities/{id}",
                &[("bp", blueprint), ("id", identifier)],
            ),
            &query,
            None,
        )
        .await
    }

    /// Search entities across blueprints.
    pub async fn search_entities(
        &self,
        request: &SearchRequest,
    ) -> Result<Vec<Entity>, ClientError> {
        let body = serde_json::to_value(request)?;
        let (entities, _status) = self
            .send::<Vec<Entity>>(Method::POST, "v1/entities/search", &[], Some(&body), "entities")
            .await?;
        Ok(entities.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use crate::client::rate_limit::RateLimitGovernor;
    use crate::client::PortClient;
    use crate::models::entity::Entity;

    use super::CreateEntityOptions;

    fn test_client(server: &MockServer) -> PortClient {
        PortClient::builder(server.base_url())
            .governor(RateLimitGovernor::new(false, false))
            .token("t")
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_entity_query_flags() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/blueprints/svc/entities")
                    .query_param("upsert", "true")
                    .query_param("run_id", "run_9")
                    .query_param("create_missing_related_entities", "true");
                then.status(201)
                    .json_body(json!({"ok": true, "entity": {"identifier": "svc-api"}}));
            })
            .await;

        let client = test_client(&server);
        let entity = Entity {
            identifier: Some("svc-api".into()),
            ..Default::default()
        };
        let options = CreateEntityOptions {
            run_id: Some("run_9".into()),
            create_missing_related_entities: true,
        };
        let (created, _) = client.create_entity("svc", &entity, &options).await.unwrap();

        mock.assert_async().await;
        assert_eq!(created.unwrap().identifier.as_deref(), Some("svc-api"));
    }

    #[tokio::test]
    async fn test_delete_entity_with_and_without_dependents() {
        let server = MockServer::start_async().await;
        let with_flag = server
            .mock_async(|when, then| {
                when.method(DELETE)
                    .path("/v1/blueprints/svc/entities/svc-api")
                    .query_param("delete_dependents", "true");
                then.status(200).json_body(json!({"ok": true}));
            })
            .await;

        let client = test_client(&server);
        client
            .delete_entity_with_flag("svc", "svc-api", true)
            .await
            .unwrap();
        with_flag.assert_async().await;

        let bare = server
            .mock_async(|when, then| {
                when.method(DELETE).path("/v1/blueprints/svc/entities/svc-db");
                then.status(200).json_body(json!({"ok": true}));
            })
            .await;
        client.delete_entity("svc", "svc-db").await.unwrap();
        bare.assert_async().await;
    }

    #[tokio::test]
    async fn test_entity_404_is_silent() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/blueprints/svc/entities/gone");
                then.status(404).json_body(json!({"ok": false}));
            })
            .await;

        let client = test_client(&server);
        let (entity, status) = client.get_entity("svc", "gone").await.unwrap();
        assert!(entity.is_none());
        assert_eq!(status, 404);
    }
}
