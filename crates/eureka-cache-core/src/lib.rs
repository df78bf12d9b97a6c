//! # Eureka Cache Core
//!
//! Pure primitives for the Eureka cache: instance records, the applications
//! payload, identity resolution and the hashcode digest.
//!
//! This crate contains no I/O, no locking, no networking. It is pure data
//! and computation over what the registry server sends.
//!
//! ## Key Types
//!
//! - [`Instance`] - One registered service endpoint
//! - [`InstanceId`] - The resolved unique identity of an instance
//! - [`Application`] - A name plus the instances grouped under it
//! - [`Applications`] - The full or delta payload returned by the server
//! - [`IdentityResolver`] - Resolves an [`InstanceId`] from an instance record
//!
//! ## Wire Format
//!
//! Payloads are JSON. The server emits single objects where arrays are
//! expected when a list has exactly one element; see [`application`].

pub mod application;
pub mod error;
pub mod hashcode;
pub mod identity;
pub mod instance;
mod lenient;
pub mod types;

pub use application::{
    decode_application_list, decode_applications, Application, Applications,
    ApplicationsEnvelope,
};
pub use error::{DecodeError, IdentityError};
pub use hashcode::{compute_hashcode, HASHCODE_DELIMITER};
pub use identity::{AmazonResolver, DatacenterIdResolver, IdentityResolver, SoftLayerResolver};
pub use instance::{decode_instance, DatacenterInfo, Instance, InstanceEnvelope, LeaseInfo, Port};
pub use types::{ActionType, InstanceId, Status, VERSION_DELTA_UNSUPPORTED};
