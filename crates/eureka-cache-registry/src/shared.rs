//! The authoritative snapshot shared between the sync loop and readers.

use std::sync::{Arc, PoisonError, RwLock};

use eureka_cache_core::{Application, Instance, InstanceId};

use crate::snapshot::RegistrySnapshot;
use crate::traits::RegistryRead;

/// Holds the current [`RegistrySnapshot`] behind a lock.
///
/// The lock guards a pointer, not the snapshot contents: readers take it
/// just long enough to clone the `Arc`, the writer just long enough to
/// replace it. No lock is held across a network fetch.
///
/// Cloning a `SharedRegistry` yields another handle to the same state.
#[derive(Debug, Clone, Default)]
pub struct SharedRegistry {
    current: Arc<RwLock<Arc<RegistrySnapshot>>>,
}

impl SharedRegistry {
    /// A registry holding an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// The snapshot that is authoritative right now.
    pub fn load(&self) -> Arc<RegistrySnapshot> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Publish `next`, returning the snapshot it replaced.
    pub fn swap(&self, next: RegistrySnapshot) -> Arc<RegistrySnapshot> {
        let next = Arc::new(next);
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, next)
    }

    pub fn is_empty(&self) -> bool {
        self.load().is_empty()
    }
}

impl RegistryRead for SharedRegistry {
    fn application(&self, name: &str) -> Option<Application> {
        self.load().application(name)
    }

    fn applications(&self) -> Vec<Application> {
        self.load().applications()
    }

    fn instance(&self, app: &str, id: &InstanceId) -> Option<Instance> {
        self.load().instance(app, id)
    }

    fn instances_by_vip(&self, vip: &str) -> Option<Vec<Instance>> {
        self.load().instances_by_vip(vip)
    }

    fn instances_by_secure_vip(&self, svip: &str) -> Option<Vec<Instance>> {
        self.load().instances_by_secure_vip(svip)
    }
}
