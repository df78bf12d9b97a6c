//! Read-only registry lookups.
//!
//! Every lookup returns deep copies. `None` means the key is not in the
//! registry; a `Some` is never empty, since the registry holds no empty
//! buckets.

use eureka_cache_core::{Application, Instance, InstanceId};

use crate::index::Bucket;
use crate::snapshot::RegistrySnapshot;

/// Lookups against a registry.
pub trait RegistryRead {
    /// The application `name` with all its instances.
    fn application(&self, name: &str) -> Option<Application>;

    /// Every application, ordered by name.
    fn applications(&self) -> Vec<Application>;

    /// One instance of application `app`.
    fn instance(&self, app: &str, id: &InstanceId) -> Option<Instance>;

    /// Instances registered under virtual address `vip`.
    fn instances_by_vip(&self, vip: &str) -> Option<Vec<Instance>>;

    /// Instances registered under secure virtual address `svip`.
    fn instances_by_secure_vip(&self, svip: &str) -> Option<Vec<Instance>>;
}

/// Deep-copy a bucket, ordered by instance id.
fn copy_bucket(bucket: &Bucket) -> Vec<Instance> {
    let mut entries: Vec<_> = bucket.iter().collect();
    entries.sort_by(|(a, _), (b, _)| a.cmp(b));
    entries
        .into_iter()
        .map(|(_, inst)| Instance::clone(inst))
        .collect()
}

impl RegistryRead for RegistrySnapshot {
    fn application(&self, name: &str) -> Option<Application> {
        self.by_app()
            .bucket(name)
            .map(|bucket| Application::new(name, copy_bucket(bucket)))
    }

    fn applications(&self) -> Vec<Application> {
        let mut apps: Vec<Application> = self
            .by_app()
            .iter()
            .map(|(name, bucket)| Application::new(name, copy_bucket(bucket)))
            .collect();
        apps.sort_by(|a, b| a.name.cmp(&b.name));
        apps
    }

    fn instance(&self, app: &str, id: &InstanceId) -> Option<Instance> {
        self.by_app().get(app, id).map(|inst| Instance::clone(inst))
    }

    fn instances_by_vip(&self, vip: &str) -> Option<Vec<Instance>> {
        self.by_vip().bucket(vip).map(copy_bucket)
    }

    fn instances_by_secure_vip(&self, svip: &str) -> Option<Vec<Instance>> {
        self.by_svip().bucket(svip).map(copy_bucket)
    }
}
