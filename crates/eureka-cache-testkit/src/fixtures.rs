//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::{Mutex, PoisonError};

use eureka_cache_core::{
    compute_hashcode, ActionType, Application, Applications, ApplicationsEnvelope,
    DatacenterInfo, Instance, Port, Status,
};
use eureka_cache_sync::{Fetcher, InstanceEventHandler, MemoryTransport, APPS_PATH, DELTA_PATH};
use serde_json::Value;

/// Base URL the fixture transport serves.
pub const BASE_URL: &str = "http://eureka.test:8080/eureka/v2";

/// Builder for [`Instance`] records.
#[derive(Debug, Clone)]
pub struct InstanceBuilder {
    instance: Instance,
}

impl InstanceBuilder {
    /// An `UP` instance of `app` on `host`.
    pub fn new(app: &str, host: &str) -> Self {
        Self {
            instance: Instance {
                app: Some(app.to_owned()),
                host_name: Some(host.to_owned()),
                ip_addr: Some("10.0.0.1".to_owned()),
                status: Status::Up,
                ..Default::default()
            },
        }
    }

    pub fn id(mut self, id: &str) -> Self {
        self.instance.instance_id = Some(id.to_owned());
        self
    }

    pub fn vip(mut self, vip: &str) -> Self {
        self.instance.vip_address = Some(vip.to_owned());
        self
    }

    pub fn secure_vip(mut self, svip: &str) -> Self {
        self.instance.secure_vip_address = Some(svip.to_owned());
        self
    }

    pub fn status(mut self, status: Status) -> Self {
        self.instance.status = status;
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.instance.port = Some(Port::enabled(port));
        self
    }

    pub fn action(mut self, action: ActionType) -> Self {
        self.instance.action_type = Some(action);
        self
    }

    /// Attach datacenter metadata, e.g. `("Amazon", "instance-id", "i-123")`.
    pub fn datacenter(mut self, name: &str, key: &str, value: impl Into<Value>) -> Self {
        let mut info = DatacenterInfo {
            name: Some(name.to_owned()),
            ..Default::default()
        };
        info.metadata.insert(key.to_owned(), value.into());
        self.instance.data_center_info = Some(info);
        self
    }

    pub fn metadata(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.instance.metadata.insert(key.to_owned(), value.into());
        self
    }

    pub fn build(self) -> Instance {
        self.instance
    }
}

/// Builder for full and delta payloads.
#[derive(Debug, Clone, Default)]
pub struct PayloadBuilder {
    version: i64,
    hashcode: Option<String>,
    apps: Vec<Application>,
}

impl PayloadBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn version(mut self, version: i64) -> Self {
        self.version = version;
        self
    }

    /// Report `hashcode` instead of the digest of the payload's instances.
    pub fn hashcode(mut self, hashcode: &str) -> Self {
        self.hashcode = Some(hashcode.to_owned());
        self
    }

    /// Add instances, grouped under their `app` field.
    pub fn instances(mut self, instances: impl IntoIterator<Item = Instance>) -> Self {
        for instance in instances {
            let name = instance.app.clone().unwrap_or_default();
            match self.apps.iter_mut().find(|a| a.name == name) {
                Some(app) => app.instances.push(instance),
                None => self.apps.push(Application::new(name, vec![instance])),
            }
        }
        self
    }

    pub fn build(self) -> Applications {
        let hashcode = self.hashcode.unwrap_or_else(|| {
            compute_hashcode(
                self.apps
                    .iter()
                    .flat_map(|a| &a.instances)
                    .filter(|i| i.action_type != Some(ActionType::Deleted))
                    .map(|i| &i.status),
            )
        });
        Applications {
            versions_delta: Some(self.version),
            apps_hashcode: Some(hashcode),
            applications: self.apps,
        }
    }

    /// The payload as a JSON response body.
    pub fn to_json(self) -> Vec<u8> {
        encode(self.build())
    }
}

/// Encode `apps` the way the server does.
pub fn encode(apps: Applications) -> Vec<u8> {
    let envelope = ApplicationsEnvelope {
        applications: Some(apps),
    };
    // Serializing plain data with string keys cannot fail.
    serde_json::to_vec(&envelope).unwrap_or_default()
}

/// A registry server backed by a [`MemoryTransport`].
#[derive(Clone, Default)]
pub struct TestServer {
    pub transport: MemoryTransport,
}

impl TestServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a full roster response.
    pub fn serve_full(&self, payload: PayloadBuilder) {
        self.transport.respond(BASE_URL, APPS_PATH, payload.to_json());
    }

    /// Queue a delta response.
    pub fn serve_delta(&self, payload: PayloadBuilder) {
        self.transport.respond(BASE_URL, DELTA_PATH, payload.to_json());
    }

    /// A fetcher against this server only.
    pub fn fetcher(&self) -> Fetcher<MemoryTransport> {
        Fetcher::new(self.transport.clone(), [BASE_URL.to_owned()])
    }

    /// Number of requests served per path: `(full, delta)`.
    pub fn request_counts(&self) -> (usize, usize) {
        let requests = self.transport.requests();
        let delta = requests.iter().filter(|r| r.ends_with(DELTA_PATH)).count();
        (requests.len() - delta, delta)
    }
}

/// A notification received by [`RecordingHandler`].
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Added(Instance),
    Updated { old: Instance, new: Instance },
    Deleted(Instance),
}

impl Event {
    /// `"add h1"`, `"update h1 UP -> DOWN"` or `"delete h1"`, keyed by host.
    pub fn summary(&self) -> String {
        fn host(i: &Instance) -> &str {
            i.host_name.as_deref().unwrap_or("")
        }
        match self {
            Event::Added(i) => format!("add {}", host(i)),
            Event::Updated { old, new } => {
                format!("update {} {} -> {}", host(new), old.status, new.status)
            }
            Event::Deleted(i) => format!("delete {}", host(i)),
        }
    }
}

/// Handler that records every notification it receives.
#[derive(Debug, Default)]
pub struct RecordingHandler {
    events: Mutex<Vec<Event>>,
}

impl RecordingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain the recorded events.
    pub fn take(&self) -> Vec<Event> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Drain the recorded events as summaries.
    pub fn take_summaries(&self) -> Vec<String> {
        self.take().iter().map(Event::summary).collect()
    }

    fn push(&self, event: Event) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

impl InstanceEventHandler for RecordingHandler {
    fn on_add(&self, instance: &Instance) {
        self.push(Event::Added(instance.clone()));
    }

    fn on_update(&self, old: &Instance, new: &Instance) {
        self.push(Event::Updated {
            old: old.clone(),
            new: new.clone(),
        });
    }

    fn on_delete(&self, instance: &Instance) {
        self.push(Event::Deleted(instance.clone()));
    }
}

/// Three `UP` instances of `ORDERS`: two behind `orders-vip`, one behind
/// `orders-canary`, all sharing `orders-secure`.
pub fn orders_roster() -> Vec<Instance> {
    vec![
        InstanceBuilder::new("ORDERS", "orders-1")
            .vip("orders-vip")
            .secure_vip("orders-secure")
            .build(),
        InstanceBuilder::new("ORDERS", "orders-2")
            .vip("orders-vip")
            .secure_vip("orders-secure")
            .build(),
        InstanceBuilder::new("ORDERS", "orders-3")
            .vip("orders-canary")
            .secure_vip("orders-secure")
            .build(),
    ]
}
