//! Action models: self-service and automation operations on the portal.
//!
//! The trigger and invocation-method documents are deeply polymorphic on the
//! wire; the declarative side keeps one typed block per variant and the
//! translation layer assembles the wire JSON.

use serde::{Deserialize, Serialize};

use crate::types::Field;

/// Declarative action state.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ActionState {
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub title: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub icon: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub description: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub publish: Field<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_service_trigger: Option<SelfServiceTriggerState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub automation_trigger: Option<AutomationTriggerState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_method: Option<WebhookMethodState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kafka_method: Option<KafkaMethodState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_method: Option<GithubMethodState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gitlab_method: Option<GitlabMethodState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure_method: Option<AzureMethodState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upsert_entity_method: Option<UpsertEntityMethodState>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub required_approval: Field<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval_webhook_notification: Option<ApprovalWebhookNotificationState>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub approval_email_notification: Field<bool>,

    // Server-computed
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub created_at: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub created_by: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub updated_at: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub updated_by: Field<String>,
}

/// Trigger for user-initiated runs, with an input form.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SelfServiceTriggerState {
    /// Operation shown in the UI: `CREATE`, `DAY-2` or `DELETE`.
    pub operation: String,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub blueprint_identifier: Field<String>,
    /// Input-form schema as an opaque JSON string.
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub user_properties: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub required_jq_query: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub order_properties: Field<Vec<String>>,
    /// Entity-selection condition as an opaque JSON string.
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub condition: Field<String>,
}

/// Trigger for event-driven runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AutomationTriggerState {
    /// Portal event, for example `ENTITY_CREATED` or `RUN_UPDATED`.
    pub event: String,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub blueprint_identifier: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub action_identifier: Field<String>,
    /// jq expressions that must all evaluate truthy for the run to start.
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub jq_condition_expressions: Field<Vec<String>>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub jq_condition_combinator: Field<String>,
}

/// Invoke via an HTTP webhook.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WebhookMethodState {
    pub url: String,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub agent: Field<bool>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub synchronized: Field<bool>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub method: Field<String>,
    /// Extra headers as an opaque JSON string.
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub headers: Field<String>,
    /// Request body template as an opaque JSON string.
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub body: Field<String>,
}

/// Invoke via the organisation's Kafka topic.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct KafkaMethodState {
    /// Message payload template as an opaque JSON string.
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub payload: Field<String>,
}

/// Invoke a GitHub workflow.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GithubMethodState {
    pub org: String,
    pub repo: String,
    pub workflow: String,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub workflow_inputs: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub report_workflow_status: Field<bool>,
}

/// Invoke a GitLab pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GitlabMethodState {
    pub project_name: String,
    pub group_name: String,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub default_ref: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub pipeline_variables: Field<String>,
}

/// Invoke an Azure DevOps pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AzureMethodState {
    pub org: String,
    pub webhook: String,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub payload: Field<String>,
}

/// Upsert an entity as the action's effect.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UpsertEntityMethodState {
    pub blueprint_identifier: String,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub identifier: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub title: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub teams: Field<Vec<String>>,
    /// Property and relation payload as an opaque JSON string.
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub mapping: Field<String>,
}

/// Webhook target for approval notifications.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ApprovalWebhookNotificationState {
    pub url: String,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub format: Field<String>,
}

/// The action document as the API reads and writes it. The polymorphic
/// `trigger` and `invocationMethod` sub-documents are kept as raw JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invocation_method: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_approval: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval_notification: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
}

impl ActionState {
    /// Number of invocation-method blocks that are set.
    pub fn method_count(&self) -> usize {
        usize::from(self.webhook_method.is_some())
            + usize::from(self.kafka_method.is_some())
            + usize::from(self.github_method.is_some())
            + usize::from(self.gitlab_method.is_some())
            + usize::from(self.azure_method.is_some())
            + usize::from(self.upsert_entity_method.is_some())
    }

    /// Number of trigger blocks that are set.
    pub fn trigger_count(&self) -> usize {
        usize::from(self.self_service_trigger.is_some())
            + usize::from(self.automation_trigger.is_some())
    }
}
