//! # Eureka Cache Sync
//!
//! Keeps a local registry snapshot in step with a discovery server.
//!
//! ## Overview
//!
//! The first cycle fetches the full instance roster. Every later cycle
//! fetches the server's change feed and applies it to a copy of the current
//! snapshot; the server's status digest is then compared against the
//! copy's. A digest mismatch, an unsupported delta or a failed delta fetch
//! all fall back to a full fetch within the same cycle.
//!
//! ## Key Properties
//!
//! - **Sequential**: cycles never overlap for one session
//! - **Atomic**: readers see the snapshot before or after a cycle, never a
//!   partial one
//! - **Fail-safe**: a failed fetch publishes nothing and notifies nobody
//! - **Verified**: a delta is adopted only if the resulting digest matches
//!
//! ## Usage
//!
//! ```rust,no_run
//! use eureka_cache_sync::{Fetcher, SyncConfig, SyncSession, Transport};
//! use tokio_util::sync::CancellationToken;
//!
//! async fn example(transport: impl Transport + 'static) {
//!     let fetcher = Fetcher::new(transport, ["http://eureka:8761/eureka/v2".to_string()]);
//!     let mut session = SyncSession::new(fetcher, SyncConfig::default());
//!     let registry = session.registry().clone();
//!
//!     let cancel = CancellationToken::new();
//!     session.run(cancel).await;
//!     println!("{} instances", registry.load().len());
//! }
//! ```

pub mod convergence;
pub mod diff;
pub mod error;
pub mod fetch;
pub mod notify;
pub mod poll;
pub mod protocol;
pub mod reconcile;
pub mod transport;

pub use convergence::{verify_hashcode, ConvergenceResult};
pub use diff::{all_added, diff_snapshots, Change, ChangeSet};
pub use error::{Result, SyncError};
pub use fetch::{ApplicationsSource, Fetcher, Resource, APPS_PATH, DELTA_PATH};
pub use notify::{dispatch, InstanceEventHandler, NoopHandler};
pub use poll::{log_cycle, PollTicker};
pub use protocol::{SyncConfig, SyncMode, SyncReport, SyncSession};
pub use reconcile::{DeltaOutcome, Reconciler, ResyncReason};
pub use transport::{memory::MemoryTransport, Transport};
