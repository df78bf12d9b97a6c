//! Golden server payloads.
//!
//! Response bodies in the shapes registry servers actually emit, including
//! the single-element quirk, numeric strings and datacenter metadata. Each
//! carries what decoding and full reconciliation must produce from it.

use eureka_cache_core::decode_applications;
use eureka_cache_sync::Reconciler;

/// A golden payload.
#[derive(Debug, Clone)]
pub struct GoldenPayload {
    /// Human-readable name for the payload.
    pub name: &'static str,
    /// The response body.
    pub json: &'static str,
    /// Expected number of instance records.
    pub instance_records: usize,
    /// Expected `versions__delta`.
    pub versions_delta: Option<i64>,
    /// Expected digest after full reconciliation.
    pub hashcode: &'static str,
    /// Expected instance ids after full reconciliation, sorted.
    pub instance_ids: &'static [&'static str],
}

/// A single application holding a single instance, both as bare objects.
pub const SINGLE_OBJECTS: &str = r#"{
  "applications": {
    "versions__delta": "1",
    "apps__hashcode": "UP_1_",
    "application": {
      "name": "ORDERS",
      "instance": {
        "hostName": "orders-1.internal",
        "app": "ORDERS",
        "ipAddr": "10.0.0.11",
        "vipAddress": "orders-vip",
        "secureVipAddress": "orders-secure",
        "status": "UP",
        "overriddenstatus": "UNKNOWN",
        "port": {"@enabled": "true", "$": "8080"},
        "securePort": {"@enabled": "false", "$": 8443},
        "countryId": 1,
        "dataCenterInfo": {
          "@class": "com.netflix.appinfo.MyDataCenterInfo",
          "name": "MyOwn"
        },
        "leaseInfo": {
          "renewalIntervalInSecs": 30,
          "durationInSecs": 90,
          "registrationTimestamp": 1700000000000,
          "lastRenewalTimestamp": 1700000030000
        },
        "metadata": {"@class": "java.util.Collections$EmptyMap"},
        "isCoordinatingDiscoveryServer": "false",
        "lastUpdatedTimestamp": "1700000000000",
        "lastDirtyTimestamp": "1700000000000"
      }
    }
  }
}"#;

/// Two applications with instance arrays and cloud datacenter metadata.
pub const CLOUD_ROSTER: &str = r#"{
  "applications": {
    "versions__delta": 4,
    "apps__hashcode": "DOWN_1_STARTING_1_UP_2_",
    "application": [
      {
        "name": "ORDERS",
        "instance": [
          {
            "hostName": "ip-10-0-0-11",
            "app": "ORDERS",
            "vipAddress": "orders-vip",
            "status": "UP",
            "dataCenterInfo": {
              "name": "Amazon",
              "metadata": {"instance-id": "i-0aa11", "availability-zone": "us-east-1a"}
            }
          },
          {
            "hostName": "ip-10-0-0-12",
            "app": "ORDERS",
            "vipAddress": "orders-vip",
            "status": "DOWN",
            "dataCenterInfo": {
              "name": "Amazon",
              "metadata": {"instance-id": "i-0aa12"}
            }
          }
        ]
      },
      {
        "name": "BILLING",
        "instance": [
          {
            "hostName": "billing-1",
            "app": "BILLING",
            "vipAddress": "billing-vip",
            "status": "UP",
            "dataCenterInfo": {
              "name": "SoftLayer",
              "metadata": {"getId": 4711}
            }
          },
          {
            "instanceId": "billing-2:explicit",
            "hostName": "billing-2",
            "app": "BILLING",
            "status": "STARTING",
            "port": {"@enabled": "true", "$": 9000}
          }
        ]
      }
    ]
  }
}"#;

/// A delta marking one change of each kind.
pub const DELTA: &str = r#"{
  "applications": {
    "versions__delta": "12",
    "apps__hashcode": "DOWN_1_UP_1_",
    "application": [
      {
        "name": "ORDERS",
        "instance": [
          {"hostName": "orders-1", "app": "ORDERS", "vipAddress": "orders-vip", "status": "DOWN", "actionType": "MODIFIED"},
          {"hostName": "orders-4", "app": "ORDERS", "vipAddress": "orders-vip", "status": "UP", "actionType": "ADDED"},
          {"hostName": "orders-3", "app": "ORDERS", "vipAddress": "orders-canary", "status": "UP", "actionType": "DELETED"}
        ]
      }
    ]
  }
}"#;

/// The server declining to serve a delta.
pub const DELTA_UNSUPPORTED: &str = r#"{
  "applications": {
    "versions__delta": "-1",
    "apps__hashcode": "",
    "application": []
  }
}"#;

/// An instance with no identity next to one with an unknown status.
pub const PARTIAL_ROSTER: &str = r#"{
  "applications": {
    "apps__hashcode": "DRAINING_1_",
    "application": {
      "name": "SEARCH",
      "instance": [
        {"app": "SEARCH", "vipAddress": "search-vip", "status": "UP"},
        {"ipAddr": "10.1.1.1", "app": "SEARCH", "vipAddress": "search-vip", "status": "DRAINING",
         "port": {"$": 7001}}
      ]
    }
  }
}"#;

/// Get all golden payloads.
pub fn all_payloads() -> Vec<GoldenPayload> {
    vec![
        GoldenPayload {
            name: "single application and instance as bare objects",
            json: SINGLE_OBJECTS,
            instance_records: 1,
            versions_delta: Some(1),
            hashcode: "UP_1_",
            instance_ids: &["orders-1.internal:8080"],
        },
        GoldenPayload {
            name: "cloud roster with datacenter identities",
            json: CLOUD_ROSTER,
            instance_records: 4,
            versions_delta: Some(4),
            hashcode: "DOWN_1_STARTING_1_UP_2_",
            instance_ids: &["4711", "billing-2:explicit", "i-0aa11", "i-0aa12"],
        },
        GoldenPayload {
            name: "delta with one change of each kind",
            json: DELTA,
            instance_records: 3,
            versions_delta: Some(12),
            hashcode: "DOWN_1_UP_2_",
            instance_ids: &["orders-1", "orders-3", "orders-4"],
        },
        GoldenPayload {
            name: "delta not supported",
            json: DELTA_UNSUPPORTED,
            instance_records: 0,
            versions_delta: Some(-1),
            hashcode: "",
            instance_ids: &[],
        },
        GoldenPayload {
            name: "unresolvable instance skipped",
            json: PARTIAL_ROSTER,
            instance_records: 2,
            versions_delta: None,
            hashcode: "DRAINING_1_",
            instance_ids: &["10.1.1.1:7001"],
        },
    ]
}

/// Decode and fully reconcile every golden payload, returning the names of
/// those whose result differs from the expectation.
pub fn verify_all_payloads() -> Result<(), Vec<String>> {
    let failures: Vec<String> = all_payloads()
        .into_iter()
        .filter(|golden| !verify_payload(golden))
        .map(|golden| golden.name.to_owned())
        .collect();

    if failures.is_empty() {
        Ok(())
    } else {
        Err(failures)
    }
}

fn verify_payload(golden: &GoldenPayload) -> bool {
    let Ok(apps) = decode_applications(golden.json.as_bytes()) else {
        return false;
    };
    if apps.instance_count() != golden.instance_records || apps.versions_delta != golden.versions_delta
    {
        return false;
    }

    let snapshot = Reconciler::default().build_full(apps);
    let mut ids: Vec<&str> = snapshot.instances().map(|(id, _)| id.as_str()).collect();
    ids.sort_unstable();

    snapshot.hashcode() == golden.hashcode && ids == golden.instance_ids
}
