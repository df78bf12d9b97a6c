//! Instance records.
//!
//! An [`Instance`] is one registered service endpoint. All fields mirror the
//! server's JSON schema; only the grouping keys, status and identity fields
//! matter to the registry, the rest is carried through to callers untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use serde_with::{serde_as, DefaultOnNull, NoneAsEmptyString, PickFirst};
use std::fmt;

use crate::error::DecodeError;
use crate::lenient::BoolFromText;
use crate::types::{ActionType, Status};

/// A port declaration, e.g. `{"@enabled": "true", "$": 8080}`.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Port {
    #[serde_as(as = "Option<BoolFromText>")]
    #[serde(rename = "@enabled", skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    #[serde_as(as = "PickFirst<(Option<_>, NoneAsEmptyString)>")]
    #[serde(rename = "$", default, skip_serializing_if = "Option::is_none")]
    pub number: Option<u16>,
}

impl Port {
    pub fn enabled(number: u16) -> Self {
        Self {
            enabled: Some(true),
            number: Some(number),
        }
    }
}

/// Datacenter description. The `name` field selects the identity resolver.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatacenterInfo {
    #[serde(rename = "@class", default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde_as(as = "DefaultOnNull")]
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

/// Lease and renewal timing.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaseInfo {
    #[serde_as(as = "DefaultOnNull")]
    #[serde(rename = "renewalIntervalInSecs", default)]
    pub renewal_interval_secs: u32,

    #[serde_as(as = "DefaultOnNull")]
    #[serde(rename = "durationInSecs", default)]
    pub duration_secs: u32,

    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub registration_timestamp: i64,

    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub last_renewal_timestamp: i64,
}

/// One service endpoint record.
///
/// `Clone` is a deep copy: every field is owned, so a clone handed to a
/// caller shares nothing with the registry's copy.
///
/// A `null` in any field decodes as that field's default; a `null` status
/// reads as [`Status::Unknown`].
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_group_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_addr: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vip_address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secure_vip_address: Option<String>,

    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub status: Status,

    #[serde(
        rename = "overriddenstatus",
        alias = "overriddenStatus",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub overridden_status: Option<Status>,

    #[serde_as(as = "PickFirst<(Option<_>, NoneAsEmptyString)>")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_id: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<Port>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secure_port: Option<Port>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_page_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_page_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_check_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_center_info: Option<DatacenterInfo>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lease_info: Option<LeaseInfo>,

    #[serde_as(as = "DefaultOnNull")]
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,

    #[serde_as(as = "Option<BoolFromText>")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_coordinating_discovery_server: Option<bool>,

    #[serde_as(as = "PickFirst<(Option<_>, NoneAsEmptyString)>")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated_timestamp: Option<i64>,

    #[serde_as(as = "PickFirst<(Option<_>, NoneAsEmptyString)>")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_dirty_timestamp: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_type: Option<ActionType>,
}

/// The `{"instance": ...}` wrapper of a single-instance lookup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstanceEnvelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<Instance>,
}

/// Decode an `apps/{app}/{id}` response body.
pub fn decode_instance(body: &[u8]) -> Result<Instance, DecodeError> {
    let envelope: InstanceEnvelope = serde_json::from_slice(body)?;
    envelope.instance.ok_or(DecodeError::MissingInstance)
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}

impl Instance {
    /// Application name declared by the instance, if non-empty.
    pub fn app_name(&self) -> Option<&str> {
        non_empty(&self.app)
    }

    /// Primary virtual address, if non-empty.
    pub fn vip(&self) -> Option<&str> {
        non_empty(&self.vip_address)
    }

    /// Secure virtual address, if non-empty.
    pub fn secure_vip(&self) -> Option<&str> {
        non_empty(&self.secure_vip_address)
    }

    /// The first enabled port number, preferring the plain port.
    pub fn port_number(&self) -> Option<u16> {
        [&self.port, &self.secure_port]
            .into_iter()
            .flatten()
            .filter(|p| p.enabled != Some(false))
            .find_map(|p| p.number)
    }

    /// The change marker, treating a missing tag as unknown.
    pub fn action(&self) -> ActionType {
        self.action_type.unwrap_or(ActionType::Unknown)
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "vip_address: {}, endpoint: {}:{}, hostname: {}, status: {}, metadata: {}",
            self.vip().unwrap_or(""),
            self.ip_addr.as_deref().unwrap_or(""),
            self.port_number().map(|p| p.to_string()).unwrap_or_default(),
            self.host_name.as_deref().unwrap_or(""),
            self.status,
            self.metadata.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "instanceId": "host-a:orders:8080",
        "hostName": "host-a",
        "app": "ORDERS",
        "ipAddr": "10.0.0.5",
        "status": "UP",
        "overriddenstatus": "UNKNOWN",
        "port": {"$": 8080, "@enabled": "true"},
        "securePort": {"$": "443", "@enabled": "false"},
        "countryId": 1,
        "dataCenterInfo": {
            "@class": "com.netflix.appinfo.InstanceInfo$DefaultDataCenterInfo",
            "name": "MyOwn"
        },
        "leaseInfo": {
            "renewalIntervalInSecs": 30,
            "durationInSecs": 90,
            "registrationTimestamp": 1700000000000,
            "lastRenewalTimestamp": 1700000030000
        },
        "metadata": {"zone": "a"},
        "vipAddress": "orders",
        "secureVipAddress": "orders-secure",
        "isCoordinatingDiscoveryServer": "false",
        "lastUpdatedTimestamp": "1700000000000",
        "lastDirtyTimestamp": "1700000000001",
        "actionType": "ADDED"
    }"#;

    #[test]
    fn test_decode_full_instance() {
        let inst: Instance = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(inst.instance_id.as_deref(), Some("host-a:orders:8080"));
        assert_eq!(inst.status, Status::Up);
        assert_eq!(inst.overridden_status, Some(Status::Unknown));
        assert_eq!(inst.port_number(), Some(8080));
        assert_eq!(inst.secure_port.as_ref().and_then(|p| p.number), Some(443));
        assert_eq!(inst.lease_info.as_ref().map(|l| l.duration_secs), Some(90));
        assert_eq!(inst.is_coordinating_discovery_server, Some(false));
        assert_eq!(inst.last_dirty_timestamp, Some(1700000000001));
        assert_eq!(inst.action(), ActionType::Added);
        assert_eq!(inst.vip(), Some("orders"));
        assert_eq!(inst.secure_vip(), Some("orders-secure"));
    }

    #[test]
    fn test_empty_grouping_keys_are_absent() {
        let inst: Instance =
            serde_json::from_str(r#"{"hostName":"h","app":"","vipAddress":""}"#).unwrap();
        assert_eq!(inst.app_name(), None);
        assert_eq!(inst.vip(), None);
        assert_eq!(inst.secure_vip(), None);
        assert_eq!(inst.status, Status::Unknown);
        assert_eq!(inst.action(), ActionType::Unknown);
    }

    #[test]
    fn test_null_fields_decode_as_defaults() {
        let inst: Instance = serde_json::from_str(
            r#"{
                "hostName": "h",
                "status": null,
                "metadata": null,
                "countryId": null,
                "port": {"$": "", "@enabled": null},
                "dataCenterInfo": {"name": "MyOwn", "metadata": null},
                "leaseInfo": {"durationInSecs": null, "renewalIntervalInSecs": 30}
            }"#,
        )
        .unwrap();
        assert_eq!(inst.status, Status::Unknown);
        assert!(inst.metadata.is_empty());
        assert_eq!(inst.country_id, None);
        assert_eq!(inst.port, Some(Port::default()));
        assert!(inst.data_center_info.unwrap().metadata.is_empty());
        let lease = inst.lease_info.unwrap();
        assert_eq!(lease.duration_secs, 0);
        assert_eq!(lease.renewal_interval_secs, 30);
    }

    #[test]
    fn test_decode_instance_envelope() {
        let body = format!(r#"{{"instance": {SAMPLE}}}"#);
        let inst = decode_instance(body.as_bytes()).unwrap();
        assert_eq!(inst.host_name.as_deref(), Some("host-a"));
        assert!(matches!(
            decode_instance(br#"{"instance": null}"#),
            Err(DecodeError::MissingInstance)
        ));
    }

    #[test]
    fn test_clone_is_independent() {
        let original: Instance = serde_json::from_str(SAMPLE).unwrap();
        let mut copy = original.clone();
        copy.metadata.insert("zone".into(), Value::from("b"));
        copy.status = Status::Down;
        assert_eq!(original.metadata["zone"], "a");
        assert_eq!(original.status, Status::Up);
    }
}
