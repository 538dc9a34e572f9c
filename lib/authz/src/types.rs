//! Authorization types sent to the policy decision point.

use crate::error::AuthzError;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Free-form attributes attached to a user or resource.
pub type Attributes = BTreeMap<String, Value>;

/// A user (subject) whose permissions are checked.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user key known to the PDP.
    pub key: String,
    /// First name, for display only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// Last name, for display only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// Email address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Attributes evaluated by ABAC policies.
    pub attributes: Attributes,
}

impl User {
    /// Creates a user with only a key.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            first_name: None,
            last_name: None,
            email: None,
            attributes: Attributes::new(),
        }
    }

    /// Sets the first name.
    #[must_use]
    pub fn with_first_name(mut self, first_name: impl Into<String>) -> Self {
        self.first_name = Some(first_name.into());
        self
    }

    /// Sets the last name.
    #[must_use]
    pub fn with_last_name(mut self, last_name: impl Into<String>) -> Self {
        self.last_name = Some(last_name.into());
        self
    }

    /// Sets the email address.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Adds attributes, replacing any with the same name.
    #[must_use]
    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes.extend(attributes);
        self
    }

    /// Returns the first name, or an empty string.
    #[must_use]
    pub fn first_name(&self) -> &str {
        self.first_name.as_deref().unwrap_or_default()
    }

    /// Returns the last name, or an empty string.
    #[must_use]
    pub fn last_name(&self) -> &str {
        self.last_name.as_deref().unwrap_or_default()
    }
}

/// A resource being acted upon.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resource {
    /// Resource type, e.g. "document".
    #[serde(rename = "type")]
    pub resource_type: String,
    /// Specific instance, if the check targets one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Tenant the resource belongs to. The PDP assumes its default tenant when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant: Option<String>,
    /// Attributes evaluated by ABAC policies.
    pub attributes: Attributes,
}

impl Resource {
    /// Creates a resource of the given type.
    #[must_use]
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            key: None,
            tenant: None,
            attributes: Attributes::new(),
        }
    }

    /// Parses `type` or `type:key`.
    ///
    /// # Errors
    ///
    /// Returns `AuthzError::InvalidInput` if the type part is empty.
    pub fn parse(value: &str) -> Result<Self, AuthzError> {
        let (resource_type, key) = match value.split_once(':') {
            Some((resource_type, key)) => (resource_type.trim(), Some(key.trim())),
            None => (value.trim(), None),
        };

        if resource_type.is_empty() {
            return Err(AuthzError::InvalidInput {
                details: format!("resource '{value}' has an empty type"),
            });
        }

        let resource = Self::new(resource_type);
        Ok(match key {
            Some(key) if !key.is_empty() => resource.with_key(key),
            _ => resource,
        })
    }

    /// Sets the instance key.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Sets the tenant.
    #[must_use]
    pub fn with_tenant(mut self, tenant: impl Into<String>) -> Self {
        self.tenant = Some(tenant.into());
        self
    }

    /// Adds attributes, replacing any with the same name.
    #[must_use]
    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes.extend(attributes);
        self
    }
}

/// An action a user performs on a resource, e.g. "read".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Action(String);

impl Action {
    /// Creates a new action.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the action name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Action {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parses `key1:value1,key2:value2` into attributes.
///
/// Numbers and booleans keep their JSON type; everything else is a string.
///
/// # Errors
///
/// Returns `AuthzError::InvalidInput` for a pair without a colon or with an empty key.
pub fn parse_attributes(input: &str) -> Result<Attributes, AuthzError> {
    let mut attributes = Attributes::new();

    for pair in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (key, value) = pair
            .split_once(':')
            .ok_or_else(|| AuthzError::InvalidInput {
                details: format!("attribute '{pair}' is not in key:value form"),
            })?;

        let key = key.trim();
        if key.is_empty() {
            return Err(AuthzError::InvalidInput {
                details: format!("attribute '{pair}' has an empty key"),
            });
        }

        attributes.insert(key.to_string(), attribute_value(value.trim()));
    }

    Ok(attributes)
}

fn attribute_value(raw: &str) -> Value {
    match serde_json::from_str::<Value>(raw) {
        Ok(value @ (Value::Bool(_) | Value::Number(_))) => value,
        _ => Value::String(raw.to_string()),
    }
}
