//! Centralized server configuration.
//!
//! This module provides strongly-typed configuration for the server,
//! loaded via the `config` crate from environment variables. Nested keys use
//! `__` as separator, e.g. `PDP__API_KEY` or `CHECK__USER__FIRST_NAME`.
//!
//! See [`PdpConfig`] for the policy decision point settings.

use crate::handler::CheckTemplate;
use pdp_check_authz::{Action, AuthzError, PdpConfig, Resource, User, parse_attributes};
use serde::Deserialize;

/// Port the example listens on, on all interfaces.
pub const PORT: u16 = 4000;

/// Server configuration composed from library configs.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Policy decision point configuration.
    pub pdp: PdpConfig,

    /// Placeholder check performed on every request.
    #[serde(default)]
    pub check: CheckConfig,
}

impl ServerConfig {
    /// Creates a configuration with defaults for everything but the PDP.
    #[must_use]
    pub fn new(pdp: PdpConfig) -> Self {
        Self {
            pdp,
            check: CheckConfig::default(),
        }
    }

    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::from_environment(config::Environment::default())
    }

    // Values stay strings until deserialized, so numeric fields still parse
    // while placeholders like "007" keep their leading zeros.
    fn from_environment(environment: config::Environment) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(environment.separator("__"))
            .build()?
            .try_deserialize()
    }
}

/// What the handler does when the PDP gives no decision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckErrorPolicy {
    /// Answer 500 and keep the cause in the logs.
    #[default]
    InternalError,
    /// Write nothing; the listener sends its default empty 200.
    Silent,
}

/// The placeholder user, action and resource checked on every request.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckConfig {
    /// Placeholder user.
    #[serde(default)]
    pub user: UserConfig,

    /// Action to check, e.g. "read".
    #[serde(default = "default_action")]
    pub action: String,

    /// Resource as `type` or `type:key`.
    #[serde(default = "default_resource")]
    pub resource: String,

    /// Tenant of the resource. Unset means the PDP's default tenant.
    #[serde(default)]
    pub tenant: Option<String>,

    /// User attributes as `key1:value1,key2:value2`.
    #[serde(default)]
    pub user_attributes: Option<String>,

    /// Resource attributes as `key1:value1,key2:value2`.
    #[serde(default)]
    pub resource_attributes: Option<String>,

    /// Behaviour when the check itself fails.
    #[serde(default)]
    pub on_error: CheckErrorPolicy,
}

fn default_action() -> String {
    "read".to_string()
}

fn default_resource() -> String {
    "document".to_string()
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            user: UserConfig::default(),
            action: default_action(),
            resource: default_resource(),
            tenant: None,
            user_attributes: None,
            resource_attributes: None,
            on_error: CheckErrorPolicy::default(),
        }
    }
}

impl CheckConfig {
    /// Builds the request template from the configured placeholders.
    ///
    /// # Errors
    ///
    /// Returns `AuthzError::InvalidInput` for an empty user key or action, or
    /// an unparseable resource or attribute list.
    pub fn template(&self) -> Result<CheckTemplate, AuthzError> {
        if self.user.key.trim().is_empty() {
            return Err(AuthzError::InvalidInput {
                details: "user key must not be empty".to_string(),
            });
        }
        if self.action.trim().is_empty() {
            return Err(AuthzError::InvalidInput {
                details: "action must not be empty".to_string(),
            });
        }

        let mut user = User::new(self.user.key.trim())
            .with_first_name(&self.user.first_name)
            .with_last_name(&self.user.last_name)
            .with_email(&self.user.email);
        if let Some(attributes) = &self.user_attributes {
            user = user.with_attributes(parse_attributes(attributes)?);
        }

        let mut resource = Resource::parse(&self.resource)?;
        if let Some(tenant) = self.tenant.as_deref().map(str::trim)
            && !tenant.is_empty()
        {
            resource = resource.with_tenant(tenant);
        }
        if let Some(attributes) = &self.resource_attributes {
            resource = resource.with_attributes(parse_attributes(attributes)?);
        }

        Ok(CheckTemplate {
            user,
            action: Action::new(self.action.trim()),
            resource,
        })
    }
}

/// Placeholder user details.
#[derive(Debug, Clone, Deserialize)]
pub struct UserConfig {
    #[serde(default = "default_user_key")]
    pub key: String,
    #[serde(default = "default_first_name")]
    pub first_name: String,
    #[serde(default = "default_last_name")]
    pub last_name: String,
    #[serde(default = "default_email")]
    pub email: String,
}

fn default_user_key() -> String {
    "jane.doe@example.com".to_string()
}

fn default_first_name() -> String {
    "Jane".to_string()
}

fn default_last_name() -> String {
    "Doe".to_string()
}

fn default_email() -> String {
    "jane.doe@example.com".to_string()
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            key: default_user_key(),
            first_name: default_first_name(),
            last_name: default_last_name(),
            email: default_email(),
        }
    }
}
