//! The registry snapshot.
//!
//! A [`RegistrySnapshot`] is the full in-memory registry at one point in
//! time. The sync loop builds a fresh one on every full fetch, or clones the
//! current one and mutates the clone while applying a delta; it is never
//! mutated once published through [`SharedRegistry`](crate::SharedRegistry).

use std::collections::HashMap;
use std::sync::Arc;

use eureka_cache_core::{compute_hashcode, Instance, InstanceId};
use tracing::debug;

use crate::index::Index;

/// The index keys an instance was filed under when it was last upserted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Membership {
    pub app: Option<String>,
    pub vip: Option<String>,
    pub svip: Option<String>,
}

impl Membership {
    /// The keys `instance` declares when grouped under `grouping_app`.
    ///
    /// The application key is the grouping application's name, falling back
    /// to the instance's own `app` field when the grouping name is empty.
    pub fn declared_by(instance: &Instance, grouping_app: &str) -> Self {
        let app = Some(grouping_app)
            .filter(|s| !s.is_empty())
            .or_else(|| instance.app_name());
        Self {
            app: app.map(str::to_owned),
            vip: instance.vip().map(str::to_owned),
            svip: instance.secure_vip().map(str::to_owned),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.app.is_none() && self.vip.is_none() && self.svip.is_none()
    }
}

/// Three-way indexed set of instances.
///
/// Cloning is shallow: the index maps are copied, the instances are shared.
/// Mutating a clone never affects the original, since instances are only
/// ever replaced, never modified in place.
#[derive(Debug, Clone, Default)]
pub struct RegistrySnapshot {
    by_app: Index,
    by_vip: Index,
    by_svip: Index,
    /// Ledger of which keys each instance currently occupies.
    members: HashMap<InstanceId, Membership>,
}

impl RegistrySnapshot {
    /// Create an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutation
    // ─────────────────────────────────────────────────────────────────────────

    /// Add an instance. Same effect as [`update`](Self::update).
    pub fn add(&mut self, id: InstanceId, instance: Arc<Instance>, grouping_app: &str) {
        self.upsert(id, instance, grouping_app);
    }

    /// Insert or replace an instance in every index it declares a key for.
    ///
    /// If the instance was previously filed under different keys (for
    /// example its VIP changed), it is first removed from those buckets.
    pub fn update(&mut self, id: InstanceId, instance: Arc<Instance>, grouping_app: &str) {
        self.upsert(id, instance, grouping_app);
    }

    /// Remove an instance from all three indices.
    ///
    /// Buckets left empty are dropped. Returns the removed instance, or
    /// `None` if the id was not present.
    pub fn delete(&mut self, id: &InstanceId) -> Option<Arc<Instance>> {
        let membership = self.members.remove(id)?;
        self.unfile(id, &membership)
    }

    fn upsert(&mut self, id: InstanceId, instance: Arc<Instance>, grouping_app: &str) {
        if let Some(previous) = self.members.remove(&id) {
            self.unfile(&id, &previous);
        }

        let membership = Membership::declared_by(&instance, grouping_app);
        if membership.is_empty() {
            debug!(instance_id = %id, "instance declares no app, vip or svip; not indexed");
            return;
        }

        if let Some(app) = &membership.app {
            self.by_app.upsert(app, id.clone(), Arc::clone(&instance));
        }
        if let Some(vip) = &membership.vip {
            self.by_vip.upsert(vip, id.clone(), Arc::clone(&instance));
        }
        if let Some(svip) = &membership.svip {
            self.by_svip.upsert(svip, id.clone(), Arc::clone(&instance));
        }
        self.members.insert(id, membership);
    }

    fn unfile(&mut self, id: &InstanceId, membership: &Membership) -> Option<Arc<Instance>> {
        let mut removed = None;
        if let Some(app) = &membership.app {
            removed = self.by_app.remove(app, id).or(removed);
        }
        if let Some(vip) = &membership.vip {
            removed = self.by_vip.remove(vip, id).or(removed);
        }
        if let Some(svip) = &membership.svip {
            removed = self.by_svip.remove(svip, id).or(removed);
        }
        removed
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Inspection
    // ─────────────────────────────────────────────────────────────────────────

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Number of distinct instances.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn contains(&self, id: &InstanceId) -> bool {
        self.members.contains_key(id)
    }

    /// The shared instance stored under `id`, whatever index holds it.
    pub fn get(&self, id: &InstanceId) -> Option<&Arc<Instance>> {
        let membership = self.members.get(id)?;
        // Every index the instance is filed under holds the same Arc.
        membership
            .app
            .as_deref()
            .and_then(|k| self.by_app.get(k, id))
            .or_else(|| membership.vip.as_deref().and_then(|k| self.by_vip.get(k, id)))
            .or_else(|| membership.svip.as_deref().and_then(|k| self.by_svip.get(k, id)))
    }

    pub fn membership(&self, id: &InstanceId) -> Option<&Membership> {
        self.members.get(id)
    }

    /// Iterate every distinct instance once, in arbitrary order.
    pub fn instances(&self) -> impl Iterator<Item = (&InstanceId, &Arc<Instance>)> {
        self.members
            .keys()
            .filter_map(move |id| self.get(id).map(|inst| (id, inst)))
    }

    /// The status-count digest of this snapshot.
    pub fn hashcode(&self) -> String {
        compute_hashcode(self.instances().map(|(_, inst)| &inst.status))
    }

    pub fn by_app(&self) -> &Index {
        &self.by_app
    }

    pub fn by_vip(&self) -> &Index {
        &self.by_vip
    }

    pub fn by_svip(&self) -> &Index {
        &self.by_svip
    }
}
