//! Policy decision point client for pdp-check.
//!
//! This crate asks a remote PDP whether a user may perform an action on a
//! resource. It speaks the PDP's `/allowed` JSON endpoint and nothing else:
//! no caching, no batching, no retries.

mod client;
mod config;
mod error;
mod types;

pub use client::{PdpClient, PermissionCheck};
pub use config::{DEFAULT_PDP_URL, PdpConfig};
pub use error::AuthzError;
pub use types::{Action, Attributes, Resource, User, parse_attributes};
