//! Domain error types for server startup.
//!
//! Request-time failures never leave the handler; see
//! [`CheckOutcome`](crate::handler::CheckOutcome). These variants are the
//! fatal ones: the process does not start when any of them occurs.

use std::fmt;

/// Server startup errors.
#[derive(Debug)]
pub enum ServerError {
    /// Configuration could not be loaded from the environment.
    Config { details: String },
    /// The PDP client could not be configured.
    PdpClient { details: String },
    /// The placeholder user, action or resource is invalid.
    CheckTemplate { details: String },
    /// The listening socket could not be bound.
    Bind { addr: String, details: String },
    /// The HTTP server stopped with an error.
    Serve { details: String },
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config { details } => {
                write!(f, "failed to load configuration: {details}")
            }
            Self::PdpClient { details } => {
                write!(f, "failed to configure PDP client: {details}")
            }
            Self::CheckTemplate { details } => {
                write!(f, "invalid placeholder user, action or resource: {details}")
            }
            Self::Bind { addr, details } => {
                write!(f, "failed to bind to '{addr}': {details}")
            }
            Self::Serve { details } => write!(f, "server error: {details}"),
        }
    }
}

impl std::error::Error for ServerError {}
