//! HTTP client for the PDP `/allowed` endpoint.

use crate::config::PdpConfig;
use crate::error::AuthzError;
use crate::types::{Action, Attributes, Resource, User};
use async_trait::async_trait;
use reqwest::Url;
use rootcause::prelude::Report;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, instrument};

/// Anything that can answer "may this user do this to that resource?".
///
/// The server depends on this trait rather than on [`PdpClient`] so that
/// handlers can be exercised without a running PDP.
#[async_trait]
pub trait PermissionCheck: Send + Sync {
    /// Returns whether `user` may perform `action` on `resource`.
    ///
    /// # Errors
    ///
    /// Returns an error when no decision could be obtained.
    async fn check(
        &self,
        user: &User,
        action: &Action,
        resource: &Resource,
    ) -> Result<bool, Report<AuthzError>>;
}

/// Client for a policy decision point.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Clone)]
pub struct PdpClient {
    http: reqwest::Client,
    allowed_url: Url,
    api_key: String,
}

impl fmt::Debug for PdpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PdpClient")
            .field("allowed_url", &self.allowed_url.as_str())
            .finish_non_exhaustive()
    }
}

/// Body of a `POST /allowed` request.
#[derive(Serialize)]
struct AuthorizationQuery<'a> {
    user: &'a User,
    action: &'a Action,
    resource: &'a Resource,
    context: Attributes,
}

/// Body of a `POST /allowed` response. Other fields are ignored.
#[derive(Deserialize)]
struct AllowedResponse {
    allow: bool,
}

impl PdpClient {
    /// Creates a new PDP client.
    ///
    /// No request is made here; an unreachable PDP surfaces on the first check.
    ///
    /// # Errors
    ///
    /// Returns `AuthzError::InvalidConfig` if the configuration is invalid or
    /// the HTTP client cannot be built.
    pub fn new(config: &PdpConfig) -> Result<Self, Report<AuthzError>> {
        let base = config.validate()?;
        let allowed_url = allowed_endpoint(base)?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(|e| AuthzError::InvalidConfig {
            details: format!("failed to build HTTP client: {e}"),
        })?;

        Ok(Self {
            http,
            allowed_url,
            api_key: config.api_key().to_string(),
        })
    }

    /// Returns the URL checks are sent to.
    #[must_use]
    pub fn allowed_url(&self) -> &Url {
        &self.allowed_url
    }

    /// Asks the PDP whether `user` may perform `action` on `resource`.
    ///
    /// # Errors
    ///
    /// Returns an error if the PDP cannot be reached, answers with a
    /// non-success status, or answers with something other than a decision.
    #[instrument(
        skip_all,
        fields(user = %user.key, resource = %resource.resource_type, action = %action)
    )]
    pub async fn check(
        &self,
        user: &User,
        action: &Action,
        resource: &Resource,
    ) -> Result<bool, Report<AuthzError>> {
        let query = AuthorizationQuery {
            user,
            action,
            resource,
            context: Attributes::new(),
        };

        let response = self
            .http
            .post(self.allowed_url.clone())
            .bearer_auth(&self.api_key)
            .json(&query)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AuthzError::Timeout {
                        endpoint: self.allowed_url.to_string(),
                    }
                } else {
                    AuthzError::ConnectionFailed {
                        endpoint: self.allowed_url.to_string(),
                        details: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthzError::RequestFailed {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| AuthzError::ConnectionFailed {
                endpoint: self.allowed_url.to_string(),
                details: e.to_string(),
            })?;

        let decision: AllowedResponse =
            serde_json::from_slice(&body).map_err(|e| AuthzError::MalformedResponse {
                details: e.to_string(),
            })?;

        debug!(allow = decision.allow, "permission check result");

        Ok(decision.allow)
    }
}

#[async_trait]
impl PermissionCheck for PdpClient {
    async fn check(
        &self,
        user: &User,
        action: &Action,
        resource: &Resource,
    ) -> Result<bool, Report<AuthzError>> {
        PdpClient::check(self, user, action, resource).await
    }
}

/// Appends `allowed` to the base URL, keeping any path prefix.
fn allowed_endpoint(mut base: Url) -> Result<Url, AuthzError> {
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join("allowed").map_err(|e| AuthzError::InvalidConfig {
        details: format!("cannot build check URL from '{base}': {e}"),
    })
}
