//! Error types for the discovery cache.

use eureka_cache_core::InstanceId;
use eureka_cache_sync::SyncError;
use thiserror::Error;

/// Errors returned by [`DiscoveryCache`](crate::DiscoveryCache).
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// No application with this name is registered.
    #[error("application {0} not found")]
    ApplicationNotFound(String),

    /// The application has no instance with this id.
    #[error("instance {id} of application {app} not found")]
    InstanceNotFound { app: String, id: InstanceId },

    /// No instance is registered under this virtual address.
    #[error("vip address {0} not found")]
    VipNotFound(String),

    /// No instance is registered under this secure virtual address.
    #[error("secure vip address {0} not found")]
    SecureVipNotFound(String),

    /// The client configuration is unusable.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A sync cycle failed.
    #[error("sync error: {0}")]
    Sync(#[from] SyncError),
}

/// Result type for discovery cache operations.
pub type Result<T> = std::result::Result<T, DiscoveryError>;
