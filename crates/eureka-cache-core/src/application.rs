//! Applications payload and the application view.
//!
//! The server answers both `apps` and `apps/delta` with the same envelope:
//!
//! ```text
//! {"applications": {
//!     "versions__delta": "3",
//!     "apps__hashcode": "DOWN_1_UP_4_",
//!     "application": [ {"name": "ORDERS", "instance": [ ... ]} ]
//! }}
//! ```
//!
//! When a list holds exactly one element the server emits the bare object
//! instead of an array; both shapes decode to a `Vec`. A `null` list decodes
//! as empty.
//!
//! A single-application lookup (`apps/{name}`) answers with the inner object
//! only, without the `applications` wrapper; see [`decode_application_list`].

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DefaultOnNull, NoneAsEmptyString, OneOrMany, PickFirst};
use serde_with::formats::PreferMany;

use crate::error::DecodeError;
use crate::instance::Instance;
use crate::types::VERSION_DELTA_UNSUPPORTED;

// Lists try the array shape first. Every field of `Instance` and
// `Application` has a default, so an empty array would otherwise decode as
// one all-default element.

/// A name plus the instances currently grouped under it.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Application {
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub name: String,

    #[serde_as(as = "DefaultOnNull<PickFirst<(Vec<_>, OneOrMany<_, PreferMany>)>>")]
    #[serde(rename = "instance", default)]
    pub instances: Vec<Instance>,
}

impl Application {
    pub fn new(name: impl Into<String>, instances: Vec<Instance>) -> Self {
        Self {
            name: name.into(),
            instances,
        }
    }
}

/// A full roster or a delta, as returned by the server.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Applications {
    #[serde_as(as = "PickFirst<(Option<_>, NoneAsEmptyString)>")]
    #[serde(
        rename = "versions__delta",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub versions_delta: Option<i64>,

    #[serde(
        rename = "apps__hashcode",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub apps_hashcode: Option<String>,

    #[serde_as(as = "DefaultOnNull<PickFirst<(Vec<_>, OneOrMany<_, PreferMany>)>>")]
    #[serde(rename = "application", default)]
    pub applications: Vec<Application>,
}

impl Applications {
    /// Whether the server declined to serve a delta.
    pub fn delta_unsupported(&self) -> bool {
        self.versions_delta == Some(VERSION_DELTA_UNSUPPORTED)
    }

    /// Total number of instance records across all applications.
    pub fn instance_count(&self) -> usize {
        self.applications.iter().map(|a| a.instances.len()).sum()
    }
}

/// The outer `{"applications": ...}` wrapper.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicationsEnvelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applications: Option<Applications>,
}

/// Decode a raw `apps` or `apps/delta` response body.
pub fn decode_applications(body: &[u8]) -> Result<Applications, DecodeError> {
    let envelope: ApplicationsEnvelope = serde_json::from_slice(body)?;
    envelope.applications.ok_or(DecodeError::MissingApplications)
}

/// Decode an `apps/{name}` response body, which carries the
/// [`Applications`] object without the outer wrapper.
pub fn decode_application_list(body: &[u8]) -> Result<Applications, DecodeError> {
    Ok(serde_json::from_slice(body)?)
}
