//! # Eureka Cache
//!
//! A client-side cache of a Eureka service registry.
//!
//! ## Overview
//!
//! The cache keeps an in-memory snapshot of every registered instance,
//! indexed three ways:
//!
//! - **Application name**: all instances of one application
//! - **VIP address**: all instances behind one virtual address
//! - **Secure VIP address**: likewise for the secure address
//!
//! The snapshot is refreshed by polling the registry: a full fetch on
//! startup, then incremental deltas verified against the server's status
//! digest, falling back to a full fetch whenever a delta cannot be trusted.
//! Lookups always see a complete snapshot and return copies that callers
//! are free to modify.
//!
//! [`RemoteDiscovery`] answers the same lookups straight from the registry
//! servers, one request per call, for callers that do not keep a cache.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use eureka_cache::{ClientConfig, DiscoveryCache};
//! use eureka_cache::sync::Transport;
//! use tokio_util::sync::CancellationToken;
//!
//! async fn example(transport: impl Transport + 'static) {
//!     let config = ClientConfig::default()
//!         .zone("us-east-1a", ["http://eureka-a:8080/eureka/v2"])
//!         .zone("us-east-1b", ["http://eureka-b:8080/eureka/v2"])
//!         .prefer_zone("us-east-1a");
//!
//!     let cache = DiscoveryCache::new(&config, transport).unwrap();
//!     let cancel = CancellationToken::new();
//!     let task = cache.spawn(cancel.clone());
//!
//!     // ...
//!     if let Ok(instances) = cache.instances_by_vip("orders.service") {
//!         println!("{} order service instances", instances.len());
//!     }
//!
//!     cancel.cancel();
//!     task.await.unwrap();
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `eureka_cache::core` - Wire types, identity resolution, hashcode
//! - `eureka_cache::registry` - The indexed snapshot and its shared handle
//! - `eureka_cache::sync` - Transport, reconciliation and the sync loop

pub mod client;
pub mod config;
pub mod error;
pub mod remote;

// Re-export component crates
pub use eureka_cache_core as core;
pub use eureka_cache_registry as registry;
pub use eureka_cache_sync as sync;

// Re-export main types for convenience
pub use client::DiscoveryCache;
pub use config::ClientConfig;
pub use error::{DiscoveryError, Result};
pub use remote::RemoteDiscovery;

pub use eureka_cache_core::{Application, Instance, InstanceId, Status};
pub use eureka_cache_sync::{InstanceEventHandler, SyncMode, SyncReport};
