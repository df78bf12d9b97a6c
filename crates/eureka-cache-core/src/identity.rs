//! Instance identity resolution.
//!
//! Every instance in the registry is keyed by an [`InstanceId`]. The id is
//! taken, in order, from:
//!
//! 1. the explicit `instanceId` field,
//! 2. a datacenter-specific resolver selected by `dataCenterInfo.name`,
//! 3. `hostName`, suffixed with `:port` when a port is declared,
//! 4. `ipAddr`, likewise suffixed.
//!
//! When none of these is present resolution fails with
//! [`IdentityError::Unresolvable`].

use serde_json::Value;

use crate::error::IdentityError;
use crate::instance::{DatacenterInfo, Instance};
use crate::types::InstanceId;

/// Extracts an instance id from datacenter metadata.
///
/// One implementation per datacenter variant; the resolver for an instance
/// is picked by comparing [`DatacenterIdResolver::datacenter`] against
/// `dataCenterInfo.name`.
pub trait DatacenterIdResolver: Send + Sync {
    /// The `dataCenterInfo.name` this resolver handles.
    fn datacenter(&self) -> &str;

    /// Return the id, or `None` if the metadata does not carry one.
    fn resolve(&self, info: &DatacenterInfo) -> Option<String>;
}

fn metadata_id(info: &DatacenterInfo, key: &str) -> Option<String> {
    match info.metadata.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Some(i.to_string()),
            None => n.as_f64().map(|f| format!("{f:.0}")),
        },
        Value::Null | Value::String(_) => None,
        other => Some(other.to_string()),
    }
}

/// SoftLayer publishes the machine id under `getId`, often as a number.
#[derive(Debug, Clone, Copy, Default)]
pub struct SoftLayerResolver;

impl DatacenterIdResolver for SoftLayerResolver {
    fn datacenter(&self) -> &str {
        "SoftLayer"
    }

    fn resolve(&self, info: &DatacenterInfo) -> Option<String> {
        metadata_id(info, "getId")
    }
}

/// Amazon publishes the EC2 instance id under `instance-id`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AmazonResolver;

impl DatacenterIdResolver for AmazonResolver {
    fn datacenter(&self) -> &str {
        "Amazon"
    }

    fn resolve(&self, info: &DatacenterInfo) -> Option<String> {
        metadata_id(info, "instance-id")
    }
}

/// Resolves the [`InstanceId`] of instance records.
pub struct IdentityResolver {
    datacenters: Vec<Box<dyn DatacenterIdResolver>>,
}

impl IdentityResolver {
    /// A resolver with no datacenter-specific strategies.
    pub fn host_based() -> Self {
        Self {
            datacenters: Vec::new(),
        }
    }

    /// Register an additional datacenter strategy.
    pub fn with_datacenter(mut self, resolver: impl DatacenterIdResolver + 'static) -> Self {
        self.datacenters.push(Box::new(resolver));
        self
    }

    /// Resolve the id of `instance`.
    pub fn resolve(&self, instance: &Instance) -> Result<InstanceId, IdentityError> {
        if let Some(id) = instance.instance_id.as_deref().filter(|s| !s.is_empty()) {
            return Ok(InstanceId::new(id));
        }

        if let Some(id) = self.resolve_datacenter(instance) {
            return Ok(InstanceId::new(id));
        }

        let host = [&instance.host_name, &instance.ip_addr]
            .into_iter()
            .find_map(|field| field.as_deref().filter(|s| !s.is_empty()));

        match (host, instance.port_number()) {
            (Some(host), Some(port)) => Ok(InstanceId::new(format!("{host}:{port}"))),
            (Some(host), None) => Ok(InstanceId::new(host)),
            (None, _) => Err(IdentityError::Unresolvable {
                app: instance.app.clone(),
            }),
        }
    }

    fn resolve_datacenter(&self, instance: &Instance) -> Option<String> {
        let info = instance.data_center_info.as_ref()?;
        let name = info.name.as_deref()?;
        self.datacenters
            .iter()
            .find(|r| r.datacenter() == name)
            .and_then(|r| r.resolve(info))
    }
}

impl Default for IdentityResolver {
    /// Host-based resolution plus the SoftLayer and Amazon strategies.
    fn default() -> Self {
        Self::host_based()
            .with_datacenter(SoftLayerResolver)
            .with_datacenter(AmazonResolver)
    }
}

impl std::fmt::Debug for IdentityResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityResolver")
            .field(
                "datacenters",
                &self.datacenters.iter().map(|r| r.datacenter()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::Port;
    use serde_json::json;

    fn datacenter(name: &str, metadata: Value) -> Option<DatacenterInfo> {
        Some(DatacenterInfo {
            class: None,
            name: Some(name.into()),
            metadata: metadata.as_object().cloned().unwrap_or_default(),
        })
    }

    #[test]
    fn test_explicit_id_wins() {
        let inst = Instance {
            instance_id: Some("explicit".into()),
            host_name: Some("host".into()),
            data_center_info: datacenter("Amazon", json!({"instance-id": "i-123"})),
            ..Default::default()
        };
        assert_eq!(IdentityResolver::default().resolve(&inst).unwrap(), InstanceId::from("explicit"));
    }

    #[test]
    fn test_softlayer_numeric_id() {
        let inst = Instance {
            host_name: Some("host".into()),
            data_center_info: datacenter("SoftLayer", json!({"getId": 123456.0})),
            ..Default::default()
        };
        assert_eq!(IdentityResolver::default().resolve(&inst).unwrap(), InstanceId::from("123456"));
    }

    #[test]
    fn test_amazon_id() {
        let inst = Instance {
            data_center_info: datacenter("Amazon", json!({"instance-id": "i-0abc"})),
            ..Default::default()
        };
        assert_eq!(IdentityResolver::default().resolve(&inst).unwrap(), InstanceId::from("i-0abc"));
    }

    #[test]
    fn test_unregistered_datacenter_falls_back_to_host() {
        let inst = Instance {
            host_name: Some("host-a".into()),
            port: Some(Port::enabled(8080)),
            data_center_info: datacenter("SoftLayer", json!({"getId": 1})),
            ..Default::default()
        };
        assert_eq!(
            IdentityResolver::host_based().resolve(&inst).unwrap(),
            InstanceId::from("host-a:8080")
        );
    }

    #[test]
    fn test_ip_fallback() {
        let inst = Instance {
            host_name: Some(String::new()),
            ip_addr: Some("10.1.2.3".into()),
            ..Default::default()
        };
        assert_eq!(IdentityResolver::default().resolve(&inst).unwrap(), InstanceId::from("10.1.2.3"));
    }

    #[test]
    fn test_unresolvable() {
        let inst = Instance {
            app: Some("ORDERS".into()),
            ..Default::default()
        };
        assert_eq!(
            IdentityResolver::default().resolve(&inst),
            Err(IdentityError::Unresolvable {
                app: Some("ORDERS".into())
            })
        );
    }
}
