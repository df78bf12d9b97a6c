//! Strong type definitions for the Eureka cache.
//!
//! Identifiers and tags are newtypes or enums so that an application name
//! can never be passed where an instance id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentinel `versions__delta` value meaning the server does not serve deltas.
pub const VERSION_DELTA_UNSUPPORTED: i64 = -1;

/// The resolved unique identity of an instance.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(String);

impl InstanceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InstanceId({})", self.0)
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for InstanceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for InstanceId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for InstanceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Health status of an instance as reported by the server.
///
/// Status strings the server invents later decode to [`Status::Other`] so
/// that the hashcode still counts them under their own name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Status {
    Up,
    Down,
    Starting,
    OutOfService,
    #[default]
    Unknown,
    Other(String),
}

impl Status {
    /// The wire spelling of this status.
    pub fn as_str(&self) -> &str {
        match self {
            Status::Up => "UP",
            Status::Down => "DOWN",
            Status::Starting => "STARTING",
            Status::OutOfService => "OUT_OF_SERVICE",
            Status::Unknown => "UNKNOWN",
            Status::Other(s) => s,
        }
    }
}

impl From<String> for Status {
    fn from(s: String) -> Self {
        match s.as_str() {
            "UP" => Status::Up,
            "DOWN" => Status::Down,
            "STARTING" => Status::Starting,
            "OUT_OF_SERVICE" => Status::OutOfService,
            "UNKNOWN" => Status::Unknown,
            _ => Status::Other(s),
        }
    }
}

impl From<Status> for String {
    fn from(status: Status) -> Self {
        match status {
            Status::Other(s) => s,
            other => other.as_str().to_owned(),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-instance change marker carried only by delta payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActionType {
    Added,
    Modified,
    Deleted,
    Unknown,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::Added => "ADDED",
            ActionType::Modified => "MODIFIED",
            ActionType::Deleted => "DELETED",
            ActionType::Unknown => "UNKNOWN",
        }
    }
}

impl From<String> for ActionType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "ADDED" => ActionType::Added,
            "MODIFIED" => ActionType::Modified,
            "DELETED" => ActionType::Deleted,
            _ => ActionType::Unknown,
        }
    }
}

impl From<ActionType> for String {
    fn from(action: ActionType) -> Self {
        action.as_str().to_owned()
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_names() {
        for (raw, status) in [
            ("UP", Status::Up),
            ("DOWN", Status::Down),
            ("STARTING", Status::Starting),
            ("OUT_OF_SERVICE", Status::OutOfService),
            ("UNKNOWN", Status::Unknown),
        ] {
            assert_eq!(Status::from(raw.to_string()), status);
            assert_eq!(status.as_str(), raw);
        }
    }

    #[test]
    fn test_status_unrecognized_keeps_text() {
        let status: Status = serde_json::from_str("\"DRAINING\"").unwrap();
        assert_eq!(status, Status::Other("DRAINING".into()));
        assert_eq!(serde_json::to_string(&status).unwrap(), "\"DRAINING\"");
    }

    #[test]
    fn test_action_type_unknown_tag() {
        let action: ActionType = serde_json::from_str("\"RENAMED\"").unwrap();
        assert_eq!(action, ActionType::Unknown);
        let action: ActionType = serde_json::from_str("\"DELETED\"").unwrap();
        assert_eq!(action, ActionType::Deleted);
    }

    #[test]
    fn test_instance_id_display() {
        let id = InstanceId::from("host-a:8080");
        assert_eq!(id.to_string(), "host-a:8080");
        assert_eq!(format!("{:?}", id), "InstanceId(host-a:8080)");
    }
}
