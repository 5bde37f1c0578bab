//! Permission endpoints: action, blueprint and page permissions.
//!
//! These are read/patch only. The client retries `ok:false` bodies on these
//! paths (scope creation is asynchronous on the server side); see the retry
//! policy in the parent module.

use reqwest::Method;

use crate::error::ClientError;
use crate::models::permissions::{
    ActionPermissionsBody, BlueprintPermissionsBody, PagePermissionsBody,
};

use super::{path, PortClient};

impl PortClient {
    /// Fetch an action's execute/approve ACLs.
    pub async fn get_action_permissions(
        &self,
        blueprint: &str,
        action: &str,
    ) -> Result<(Option<ActionPermissionsBody>, u16), ClientError> {
        self.send(
            Method::GET,
            &path(
                "v1/blueprints/{bp}/actions/{id}/permissions",
                &[("bp", blueprint), ("id", action)],
            ),
            &[],
            None,
            "permissions",
        )
        .await
    }

    /// Patch an action's execute/approve ACLs.
    pub async fn update_action_permissions(
        &self,
        blueprint: &str,
        action: &str,
        permissions: &ActionPermissionsBody,
    ) -> Result<(Option<ActionPermissionsBody>, u16), ClientError> {
        let body = serde_json::to_value(permissions)?;
        self.send(
            Method::PATCH,
            &path(
                "v1/blueprints/{bp}/actions/{id}/permissions",
                &[("bp", blueprint), ("id", action)],
            ),
            &[],
            Some(&body),
            "permissions",
        )
        .await
    }

    /// Fetch a blueprint's entity ACLs.
    pub async fn get_blueprint_permissions(
        &self,
        blueprint: &str,
    ) -> Result<(Option<BlueprintPermissionsBody>, u16), ClientError> {
        self.send(
            Method::GET,
            &path("v1/blueprints/{bp}/permissions", &[("bp", blueprint)]),
            &[],
            None,
            "permissions",
        )
        .await
    }

    /// Patch a blueprint's entity ACLs.
    pub async fn update_blueprint_permissions(
        &self,
        blueprint: &str,
        permissions: &BlueprintPermissionsBody,
    ) -> Result<(Option<BlueprintPermissionsBody>, u16), ClientError> {
        let body = serde_json::to_value(permissions)?;
        self.send(
            Method::PATCH,
            &path("v1/blueprints/{bp}/permissions", &[("bp", blueprint)]),
            &[],
            Some(&body),
            "permissions",
        )
        .await
    }

    /// Fetch a page's read ACLs.
    pub async fn get_page_permissions(
        &self,
        page: &str,
    ) -> Result<(Option<PagePermissionsBody>, u16), ClientError> {
        self.send(
            Method::GET,
            &path("v1/pages/{id}/permissions", &[("id", page)]),
            &[],
            None,
            "permissions",
        )
        .await
    }

    /// Patch a page's read ACLs.
    pub async fn update_page_permissions(
        &self,
        page: &str,
        permissions: &PagePermissionsBody,
    ) -> Result<(Option<PagePermissionsBody>, u16), ClientError> {
        let body = serde_json::to_value(permissions)?;
        self.send(
            Method::PATCH,
            &path("v1/pages/{id}/permissions", &[("id", page)]),
            &[],
            Some(&body),
            "permissions",
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
    async fn test_blueprint_permissions_round_trip() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/blueprints/svc/permissions");
                then.status(200).json_body(json!({
                    "ok": true,
                    "permissions": {
                        "entities": {
                            "register": {"roles": ["Admin"], "users": [], "teams": []},
                            "updateProperties": {
                                "$title": {"roles": ["Admin"]}
                            }
                        }
                    }
                }));
            })
            .await;

        let client = PortClient::builder(server.base_url())
            .governor(RateLimitGovernor::new(false, false))
            .token("t")
            .build()
            .unwrap();

        let (perms, _) = client.get_blueprint_permissions("svc").await.unwrap();
        let entities = perms.unwrap().entities.unwrap();
        assert_eq!(
            entities.register.unwrap().roles.unwrap(),
            vec!["Admin"]
        );
        assert!(entities.update_properties.contains_key("$title"));
    }
}
