//! Authorization error types.

use std::fmt;

/// Authorization errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthzError {
    /// The client configuration is unusable.
    InvalidConfig {
        /// Error details.
        details: String,
    },
    /// A subject, resource or attribute list could not be built.
    InvalidInput {
        /// Error details.
        details: String,
    },
    /// Failed to reach the PDP.
    ConnectionFailed {
        /// The URL that was called.
        endpoint: String,
        /// Error details.
        details: String,
    },
    /// The PDP did not answer within the configured timeout.
    Timeout {
        /// The URL that was called.
        endpoint: String,
    },
    /// The PDP answered with a non-success status.
    RequestFailed {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly empty.
        body: String,
    },
    /// The PDP answered with a body that is not a decision.
    MalformedResponse {
        /// Error details.
        details: String,
    },
}

impl fmt::Display for AuthzError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig { details } => {
                write!(f, "invalid PDP configuration: {details}")
            }
            Self::InvalidInput { details } => {
                write!(f, "invalid authorization input: {details}")
            }
            Self::ConnectionFailed { endpoint, details } => {
                write!(f, "failed to connect to PDP at '{endpoint}': {details}")
            }
            Self::Timeout { endpoint } => {
                write!(f, "request to PDP at '{endpoint}' timed out")
            }
            Self::RequestFailed { status, body } => {
                if body.is_empty() {
                    write!(f, "PDP request failed with HTTP {status}")
                } else {
                    write!(f, "PDP request failed with HTTP {status}: {body}")
                }
            }
            Self::MalformedResponse { details } => {
                write!(f, "malformed PDP response: {details}")
            }
        }
    }
}

impl std::error::Error for AuthzError {}
