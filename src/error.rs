//! Error types for the Port provider.

use thiserror::Error;

/// Errors produced by the HTTP and domain client layers.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A network-level failure after exhausted retries.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// An HTTP >= 400 response (other than a 404 on read) or an `ok:false`
    /// envelope. The message carries the verbatim server body.
    #[error("API error (status {status}): {body}")]
    Protocol {
        /// The HTTP status code of the failing response.
        status: u16,
        /// The raw response body, verbatim.
        body: String,
    },

    /// A serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A client construction or configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ClientError {
    /// Whether this error is an `ok:false` envelope or HTTP failure (as
    /// opposed to a transport or local error).
    pub fn is_protocol(&self) -> bool {
        matches!(self, Self::Protocol { .. })
    }
}

/// Errors that can occur when implementing a provider lifecycle method.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The requested resource was not found where its presence was required,
    /// e.g. a sub-resource's parent document is gone.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// A validation error caught before any network call.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A provider configuration error (missing credentials, bad base URL).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The requested resource type is unknown.
    #[error("Unknown resource type: {0}")]
    UnknownResource(String),

    /// A serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An error from the HTTP or domain client.
    #[error("Client error: {0}")]
    Client(#[from] ClientError),

    /// A sub-resource key already exists on the parent document.
    #[error("Resource already exists: {0}")]
    AlreadyExists(String),

    /// A post-write verification failed: a sub-resource was not present
    /// after create/update, or still present after delete.
    #[error("Post-condition violation: {0}")]
    PostCondition(String),

    /// A beta-gated resource was planned without the gate env var set.
    #[error("Beta feature not enabled: {0}")]
    BetaGated(String),

    /// An import ID could not be parsed.
    #[error("Invalid import ID: {0}")]
    InvalidImportId(String),
}

impl ProviderError {
    /// Get the error message as a string.
    pub fn message(&self) -> String {
        self.to_string()
    }
}
