//! Error types for the Eureka cache core.

use thiserror::Error;

/// Raised when no distinguishing field is available to identify an instance.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("cannot resolve instance id for app {app:?}: no instanceId, datacenter id, hostName or ipAddr")]
    Unresolvable { app: Option<String> },
}

/// Errors decoding a server payload.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("payload has no applications object")]
    MissingApplications,

    #[error("payload has no instance object")]
    MissingInstance,
}
