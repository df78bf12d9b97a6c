//! # Eureka Cache Testkit
//!
//! Testing utilities for the Eureka cache.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden payloads**: Server response bodies with the expected decode and reconciliation results
//! - **Generators**: Proptest strategies for property-based testing of the registry
//! - **Fixtures**: Instance and payload builders, an in-memory server, a recording handler
//!
//! ## Golden Payloads
//!
//! ```rust
//! use eureka_cache_testkit::payloads::verify_all_payloads;
//!
//! verify_all_payloads().expect("golden payloads");
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use eureka_cache_testkit::generators::{ops, snapshot_from_ops};
//!
//! proptest! {
//!     #[test]
//!     fn never_empty_buckets(history in ops(40)) {
//!         let snapshot = snapshot_from_ops(&history);
//!         for (_, bucket) in snapshot.by_vip().iter() {
//!             prop_assert!(!bucket.is_empty());
//!         }
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use eureka_cache_testkit::fixtures::{InstanceBuilder, PayloadBuilder, TestServer};
//!
//! let server = TestServer::new();
//! server.serve_full(
//!     PayloadBuilder::new().instances([InstanceBuilder::new("ORDERS", "orders-1").vip("orders").build()]),
//! );
//! ```

pub mod fixtures;
pub mod generators;
pub mod payloads;

pub use fixtures::{
    orders_roster, Event, InstanceBuilder, PayloadBuilder, RecordingHandler, TestServer, BASE_URL,
};
pub use generators::{snapshot_from_ops, InstanceParams, Op};
pub use payloads::{all_payloads, verify_all_payloads, GoldenPayload};
