//! HTTP client for the Port API.
//!
//! [`PortClient`] owns the authenticated `reqwest` session, the adaptive
//! rate-limit governor, and one typed method per API endpoint (spread across
//! the sibling modules by resource kind). Every response is an envelope of
//! the shape `{"ok": bool, "<kind>": {...}}`; a call succeeds only when the
//! HTTP status is 2xx *and* `ok` is `true`.
//!
//! # Quick Start
//!
//! ```no_run
//! use port_provider::client::PortClient;
//!
//! # async fn example() -> Result<(), port_provider::error::ClientError> {
//! let client = PortClient::builder("https://api.getport.io").build()?;
//! client.authenticate("my-client-id", "my-secret").await?;
//!
//! let (blueprint, status) = client.get_blueprint("service").await?;
//! # Ok(())
//! # }
//! ```

pub mod rate_limit;

mod action;
mod blueprint;
mod entity;
mod folder;
mod integration;
mod organization;
mod page;
mod permissions;
mod scorecard;
mod secret;
mod team;
mod webhook;

pub use entity::CreateEntityOptions;
pub use organization::Organization;

use std::sync::RwLock;
use std::time::Duration;

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::error::ClientError;
use rate_limit::RateLimitGovernor;

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Attempts for a single logical request: one initial try plus five retries.
const MAX_ATTEMPTS: u32 = 6;

/// Base wait between retry attempts; doubled per attempt up to [`MAX_RETRY_WAIT`].
const RETRY_BASE_WAIT: Duration = Duration::from_millis(300);

/// Ceiling on a single retry wait.
const MAX_RETRY_WAIT: Duration = Duration::from_secs(2);

/// Characters percent-encoded inside a path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'#')
    .add(b'?')
    .add(b'{')
    .add(b'}')
    .add(b'%')
    .add(b'/');

/// The bearer token returned by the auth endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessToken {
    /// The bearer token itself.
    pub access_token: String,
    /// Seconds until the token expires.
    pub expires_in: i64,
    /// The token type, normally `Bearer`.
    pub token_type: String,
}

/// Authenticated HTTP client for the Port API.
///
/// Cheap to share behind an `Arc`; all methods take `&self` and are safe for
/// concurrent callers. The rate-limit governor serialises outgoing traffic as
/// needed.
#[derive(Debug)]
pub struct PortClient {
    http: reqwest::Client,
    base_url: String,
    token: RwLock<Option<String>>,
    governor: RateLimitGovernor,
    feature_flags: tokio::sync::Mutex<Option<Vec<String>>>,
    json_escape_html: bool,
}

/// Builder for configuring a [`PortClient`].
#[derive(Debug)]
pub struct PortClientBuilder {
    base_url: String,
    timeout: Duration,
    token: Option<String>,
    json_escape_html: bool,
    governor: Option<RateLimitGovernor>,
    client: Option<reqwest::Client>,
}

impl PortClientBuilder {
    /// Create a new builder with the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: DEFAULT_TIMEOUT,
            token: None,
            json_escape_html: true,
            governor: None,
            client: None,
        }
    }

    /// Set the request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Install a pre-issued bearer token, skipping the token exchange.
    #[must_use]
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Control whether nested-JSON strings escape `<`, `>` and `&`.
    #[must_use]
    pub fn json_escape_html(mut self, escape: bool) -> Self {
        self.json_escape_html = escape;
        self
    }

    /// Use a custom rate-limit governor (tests mostly).
    #[must_use]
    pub fn governor(mut self, governor: RateLimitGovernor) -> Self {
        self.governor = Some(governor);
        self
    }

    /// Use a custom reqwest Client (TLS, proxies, etc.).
    #[must_use]
    pub fn client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<PortClient, ClientError> {
        let client = match self.client {
            Some(c) => c,
            None => {
                let mut headers = reqwest::header::HeaderMap::new();
                headers.insert(
                    reqwest::header::ACCEPT,
                    reqwest::header::HeaderValue::from_static("application/json"),
                );
                reqwest::Client::builder()
                    .timeout(self.timeout)
                    .user_agent(user_agent())
                    .default_headers(headers)
                    .build()
                    .map_err(|e| ClientError::Configuration(e.to_string()))?
            },
        };

        Ok(PortClient {
            http: client,
            base_url: self.base_url,
            token: RwLock::new(self.token),
            governor: self.governor.unwrap_or_else(RateLimitGovernor::from_env),
            feature_flags: tokio::sync::Mutex::new(None),
            json_escape_html: self.json_escape_html,
        })
    }
}

fn user_agent() -> String {
    format!("port-provider/{}", env!("CARGO_PKG_VERSION"))
}

/// Substitute named `{segment}` placeholders in a path template, percent-
/// encoding each parameter value.
pub(crate) fn path(template: &str, params: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (name, value) in params {
        let encoded = utf8_percent_encode(value, PATH_SEGMENT).to_string();
        out = out.replace(&format!("{{{}}}", name), &encoded);
    }
    out
}

impl PortClient {
    /// Create a builder for the given base URL.
    pub fn builder(base_url: impl Into<String>) -> PortClientBuilder {
        PortClientBuilder::new(base_url)
    }

    /// The configured base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The rate-limit governor wrapped around this client's requests.
    pub fn governor(&self) -> &RateLimitGovernor {
        &self.governor
    }

    /// Whether nested-JSON strings escape `<`, `>` and `&` when serialised.
    pub fn json_escape_html(&self) -> bool {
        self.json_escape_html
    }

    /// Exchange client credentials for a bearer token and install it.
    pub async fn authenticate(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> Result<AccessToken, ClientError> {
        let body = serde_json::json!({
            "clientId": client_id,
            "clientSecret": client_secret,
        });
        let (status, text) = self
            .execute(Method::POST, "v1/auth/access_token", &[], Some(&body))
            .await?;
        let envelope = check_envelope(status, text)?;
        let token: AccessToken = serde_json::from_value(envelope)?;
        *self.token.write().expect("token lock poisoned") = Some(token.access_token.clone());
        Ok(token)
    }

    /// Install a pre-issued bearer token.
    pub fn set_token(&self, token: impl Into<String>) {
        *self.token.write().expect("token lock poisoned") = Some(token.into());
    }

    /// Whether a bearer token is installed.
    pub fn is_authenticated(&self) -> bool {
        self.token
            .read()
            .expect("token lock poisoned")
            .is_some()
    }

    /// The organisation's feature flags, fetched once and cached for the
    /// lifetime of this client. Reads return a clone of the cached list.
    pub async fn feature_flags(&self) -> Result<Vec<String>, ClientError> {
        let mut cache = self.feature_flags.lock().await;
        if let Some(flags) = cache.as_ref() {
            return Ok(flags.clone());
        }
        let org = self.get_organization().await?;
        let flags = org.feature_flags.unwrap_or_default();
        *cache = Some(flags.clone());
        Ok(flags)
    }

    /// Whether every requested feature flag is present on the organisation.
    pub async fn has_feature_flags(&self, wanted: &[&str]) -> Result<bool, ClientError> {
        let flags = self.feature_flags().await?;
        Ok(wanted.iter().all(|w| flags.iter().any(|f| f == w)))
    }

    /// Send a request and unwrap the `{ok, <kind>}` envelope.
    ///
    /// Returns `(None, 404)` when the resource is gone; the caller decides
    /// whether that is an error. Any other non-2xx status, and any `ok:false`
    /// body, is a [`ClientError::Protocol`] carrying the verbatim body.
    pub(crate) async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&serde_json::Value>,
        kind: &str,
    ) -> Result<(Option<T>, u16), ClientError> {
        let (status, text) = self.execute(method, path, query, body).await?;
        if status == 404 {
            return Ok((None, status));
        }
        if !(200..300).contains(&status) {
            return Err(ClientError::Protocol { status, body: text });
        }
        // Some create endpoints return ok with an empty body; the caller
        // follows up with a read.
        if text.trim().is_empty() {
            return Ok((None, status));
        }
        let envelope: serde_json::Value = serde_json::from_str(&text)?;
        if envelope.get("ok").and_then(serde_json::Value::as_bool) != Some(true) {
            return Err(ClientError::Protocol { status, body: text });
        }
        match envelope.get(kind) {
            Some(v) if !v.is_null() => Ok((Some(serde_json::from_value(v.clone())?), status)),
            _ => Ok((None, status)),
        }
    }

    /// Send a request where only success matters (deletes, patches without a
    /// useful body).
    pub(crate) async fn send_expect_ok(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&serde_json::Value>,
    ) -> Result<u16, ClientError> {
        let (status, text) = self.execute(method, path, query, body).await?;
        if status == 404 {
            return Ok(status);
        }
        if !(200..300).contains(&status) {
            return Err(ClientError::Protocol { status, body: text });
        }
        if !text.trim().is_empty() {
            let envelope: serde_json::Value = serde_json::from_str(&text)?;
            if envelope.get("ok").and_then(serde_json::Value::as_bool) != Some(true) {
                return Err(ClientError::Protocol { status, body: text });
            }
        }
        Ok(status)
    }

    /// Execute one HTTP round-trip with retries and the rate-limit governor
    /// wrapped around each attempt.
    ///
    /// Retries, with exponential backoff from [`RETRY_BASE_WAIT`], on
    /// transport failures and on `/permissions` responses whose body is not
    /// `ok:true` (scope creation on the server side is asynchronous). Other
    /// endpoints never retry on an `ok:false` body.
    async fn execute(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&serde_json::Value>,
    ) -> Result<(u16, String), ClientError> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            let permit = self.governor.before_request().await;

            let mut request = self.http.request(method.clone(), &url);
            if !query.is_empty() {
                request = request.query(query);
            }
            if let Some(token) = self.token.read().expect("token lock poisoned").as_deref() {
                request = request.bearer_auth(token);
            }
            if let Some(b) = body {
                request = request.json(b);
            }

            let outcome = match request.send().await {
                Ok(response) => {
                    let status = response.status().as_u16();
                    let headers = response.headers().clone();
                    match response.text().await {
                        Ok(text) => {
                            self.governor.after_response(&headers, permit);
                            Ok((status, text))
                        },
                        Err(e) => {
                            self.governor.after_response(&headers, permit);
                            Err(e)
                        },
                    }
                },
                Err(e) => {
                    self.governor
                        .after_response(&reqwest::header::HeaderMap::new(), permit);
                    Err(e)
                },
            };

            match outcome {
                Ok((status, text)) => {
                    if attempt < MAX_ATTEMPTS && should_retry_permissions(path, &text) {
                        debug!(
                            target: "port_provider::client",
                            %url, attempt, "permissions endpoint not ready; retrying"
                        );
                        tokio::time::sleep(retry_wait(attempt)).await;
                        continue;
                    }
                    return Ok((status, text));
                },
                Err(e) => {
                    if attempt < MAX_ATTEMPTS {
                        debug!(
                            target: "port_provider::client",
                            %url, attempt, error = %e, "transport error; retrying"
                        );
                        tokio::time::sleep(retry_wait(attempt)).await;
                        continue;
                    }
                    return Err(e.into());
                },
            }
        }
    }
}

/// Permissions endpoints depend on asynchronous scope creation server-side;
/// an `ok != true` body there is retried where any other endpoint would fail
/// immediately.
fn should_retry_permissions(path: &str, body: &str) -> bool {
    if !path.contains("/permissions") {
        return false;
    }
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(v) => v.get("ok").and_then(serde_json::Value::as_bool) != Some(true),
        Err(_) => true,
    }
}

fn retry_wait(attempt: u32) -> Duration {
    let wait = RETRY_BASE_WAIT * 2u32.saturating_pow(attempt.saturating_sub(1));
    wait.min(MAX_RETRY_WAIT)
}

/// Validate a 2xx `ok:true` envelope and return the parsed body.
fn check_envelope(status: u16, text: String) -> Result<serde_json::Value, ClientError> {
    if !(200..300).contains(&status) {
        return Err(ClientError::Protocol { status, body: text });
    }
    let envelope: serde_json::Value = serde_json::from_str(&text)?;
    if envelope.get("ok").and_then(serde_json::Value::as_bool) != Some(true) {
        return Err(ClientError::Protocol { status, body: text });
    }
    Ok(envelope)
}
