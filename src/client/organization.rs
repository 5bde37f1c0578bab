//! Organization endpoint.

use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::error::ClientError;

use super::PortClient;

/// The organisation document; only the fields the provider consults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_flags: Option<Vec<String>>,
}

impl PortClient {
    /// Fetch the organisation document.
    pub async fn get_organization(&self) -> Result<Organization, ClientError> {
        let (org, status) = self
            .send::<Organization>(Method::GET, "v1/organization", &[], None, "organization")
            .await?;
        org.ok_or(ClientError::Protocol {
            status,
            body: "organization missing from response".to_string(),
        })
    }
}
