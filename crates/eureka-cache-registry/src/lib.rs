//! # Eureka Cache Registry
//!
//! The in-memory, multiply-indexed registry snapshot and the lock-guarded
//! handle through which the sync loop publishes it to readers.
//!
//! ## Overview
//!
//! A [`RegistrySnapshot`] indexes instances three ways: by application
//! name, by virtual address (VIP) and by secure virtual address (SVIP).
//! Every mutation goes through one primitive, [`Index::upsert`] /
//! [`Index::remove`], so the three indices cannot drift apart.
//!
//! ## Key Types
//!
//! - [`RegistrySnapshot`] - Three indices plus a per-instance membership ledger
//! - [`Index`] - One key → bucket mapping, never holding an empty bucket
//! - [`SharedRegistry`] - The authoritative snapshot behind an `RwLock`
//! - [`RegistryRead`] - Read-only lookups returning deep copies
//!
//! ## Design Notes
//!
//! - **Shared instances**: Snapshots hold `Arc<Instance>`; cloning a snapshot
//!   copies the maps and aliases the instances.
//! - **Deep-copied reads**: Lookups clone the instance out, so callers can
//!   never mutate registry state.
//! - **Atomic publication**: A new snapshot replaces the old one in a single
//!   pointer swap; readers see either the old or the new state.

pub mod index;
pub mod shared;
pub mod snapshot;
pub mod traits;

pub use index::{Bucket, Index};
pub use shared::SharedRegistry;
pub use snapshot::{Membership, RegistrySnapshot};
pub use traits::RegistryRead;
