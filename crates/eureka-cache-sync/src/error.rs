//! Error types for the sync module.

use eureka_cache_core::{DecodeError, IdentityError};
use thiserror::Error;

/// Errors that can occur while fetching or reconciling registry state.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A single endpoint could not be reached or answered with a failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The endpoint answered, but has no such resource.
    #[error("resource not found: {0}")]
    NotFound(String),

    /// The payload could not be decoded.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// No candidate endpoints were configured.
    #[error("no registry endpoints configured")]
    NoEndpoints,

    /// Every candidate endpoint failed; carries the last failure.
    #[error("all {attempts} registry endpoints failed, last error: {last}")]
    AllEndpointsFailed {
        attempts: usize,
        #[source]
        last: Box<SyncError>,
    },

    /// An instance record carried no distinguishing field.
    #[error("identity error: {0}")]
    Identity(#[from] IdentityError),
}

impl SyncError {
    /// Whether the failure means the resource does not exist, as opposed to
    /// the endpoints being unreachable.
    pub fn is_not_found(&self) -> bool {
        match self {
            SyncError::NotFound(_) => true,
            SyncError::AllEndpointsFailed { last, .. } => last.is_not_found(),
            _ => false,
        }
    }
}

/// Result type for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;
