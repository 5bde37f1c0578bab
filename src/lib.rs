//! Port provider
//!
//! This crate implements an infrastructure-as-code provider for the
//! [Port](https://getport.io) developer portal: declarative configuration in,
//! Port API calls out, refreshed state back.
//!
//! # Overview
//!
//! The crate provides:
//!
//! - **PortClient**: an authenticated HTTP client for the Port API with
//!   `{ok, <kind>}` envelope unwrapping, bounded retries and an adaptive
//!   rate-limit governor
//! - **Declarative models**: per-kind state structs built on [`types::Field`],
//!   preserving the unset/null/known distinction end to end
//! - **Translation layer**: `<kind>_to_body` / `refresh_<kind>_state` pairs
//!   between declarative state and the wire format
//! - **Resources**: read/create/update/delete/import/validate lifecycles for
//!   fifteen resource kinds, including the sub-resources that live inside a
//!   parent blueprint document
//! - **PortProvider**: the [`provider::ProviderService`] implementation wiring
//!   it all together, with a generic plan step applying schema-declared rules
//! - **Testing**: a [`testing::ProviderTester`] harness for exercising the
//!   provider without plugin framing
//!
//! # Quick Start
//!
//! ```ignore
//! use port_provider::{PortProvider, ProviderService};
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! port_provider::init_logging();
//!
//! let provider = PortProvider::new();
//! provider
//!     .configure(json!({"client_id": "...", "secret": "..."}))
//!     .await?;
//!
//! let state = provider
//!     .create(
//!         "port_blueprint",
//!         json!({"identifier": "microservice", "title": "Microservice"}),
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Credentials
//!
//! The provider authenticates with an OAuth client-ID/secret pair exchanged
//! for a bearer token, or with a pre-issued token that skips the exchange.
//! All of `client_id`, `secret` and `base_url` fall back to the
//! `PORT_CLIENT_ID`, `PORT_CLIENT_SECRET` and `PORT_BASE_URL` environment
//! variables.
//!
//! Beta resources (`port_page`, `port_folder`) additionally require
//! `PORT_BETA_FEATURES_ENABLED=true`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod planmod;
pub mod provider;
pub mod resources;
pub mod schema;
pub mod testing;
pub mod translate;
pub mod types;
pub mod validation;

// Re-export main types at crate root
pub use client::rate_limit::RateLimitGovernor;
pub use client::PortClient;
pub use config::ProviderConfig;
pub use error::{ClientError, ProviderError};
pub use logging::{init_logging, init_logging_with_default, try_init_logging};
pub use provider::{PortProvider, ProviderService};
pub use resources::Resource;
pub use schema::{Diagnostic, ProviderSchema};
pub use types::{AttributeChange, Field, ImportedResource, PlanResult, ProviderMetadata};
pub use validation::{is_valid, validate, validate_result};

// Re-export async_trait for convenience
pub use async_trait::async_trait;

// Re-export commonly used external types
pub use serde_json;
pub use tracing;
