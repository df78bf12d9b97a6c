//! Change sets between snapshots.
//!
//! A [`ChangeSet`] maps each touched instance id to the single change it
//! underwent. Delta reconciliation builds one directly from the action tags
//! in the payload; a full resync derives one by comparing VIP buckets of the
//! previous and new snapshots.

use std::collections::BTreeMap;
use std::sync::Arc;

use eureka_cache_core::{ActionType, Instance, InstanceId};
use eureka_cache_registry::RegistrySnapshot;

/// One instance-level change. Carries the instance as it is after the
/// change, or as it was last seen for deletions.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    Added(Arc<Instance>),
    Modified(Arc<Instance>),
    Deleted(Arc<Instance>),
}

impl Change {
    pub fn action(&self) -> ActionType {
        match self {
            Change::Added(_) => ActionType::Added,
            Change::Modified(_) => ActionType::Modified,
            Change::Deleted(_) => ActionType::Deleted,
        }
    }

    pub fn instance(&self) -> &Arc<Instance> {
        match self {
            Change::Added(inst) | Change::Modified(inst) | Change::Deleted(inst) => inst,
        }
    }
}

/// Changes keyed by instance id.
pub type ChangeSet = BTreeMap<InstanceId, Change>;

/// Count changes per kind: `(added, modified, deleted)`.
pub fn tally(changes: &ChangeSet) -> (usize, usize, usize) {
    changes
        .values()
        .fold((0, 0, 0), |(a, m, d), change| match change {
            Change::Added(_) => (a + 1, m, d),
            Change::Modified(_) => (a, m + 1, d),
            Change::Deleted(_) => (a, m, d + 1),
        })
}

/// Every instance of `snapshot` as an addition. Used at bootstrap, when
/// there is no prior state to compare against.
pub fn all_added(snapshot: &RegistrySnapshot) -> ChangeSet {
    snapshot
        .instances()
        .map(|(id, inst)| (id.clone(), Change::Added(Arc::clone(inst))))
        .collect()
}

/// Compare two snapshots bucket by bucket over the VIP index.
///
/// Within a bucket present on both sides, an instance whose status changed
/// is modified, one only on the new side is added, one only on the old side
/// is deleted. Buckets present on one side only contribute all their
/// instances as additions or deletions.
///
/// An instance that moved to a different VIP is reported once, as modified,
/// rather than as an addition plus a deletion.
pub fn diff_snapshots(old: &RegistrySnapshot, new: &RegistrySnapshot) -> ChangeSet {
    let mut changes = ChangeSet::new();

    for (vip, bucket) in new.by_vip().iter() {
        let old_bucket = old.by_vip().bucket(vip);
        for (id, inst) in bucket {
            match old_bucket.and_then(|b| b.get(id)) {
                Some(prev) if prev.status != inst.status => {
                    changes.insert(id.clone(), Change::Modified(Arc::clone(inst)));
                }
                Some(_) => {}
                None if old.contains(id) => {
                    changes.insert(id.clone(), Change::Modified(Arc::clone(inst)));
                }
                None => {
                    changes.insert(id.clone(), Change::Added(Arc::clone(inst)));
                }
            }
        }
    }

    for (vip, bucket) in old.by_vip().iter() {
        let new_bucket = new.by_vip().bucket(vip);
        for (id, inst) in bucket {
            if new_bucket.is_some_and(|b| b.contains_key(id)) || changes.contains_key(id) {
                continue;
            }
            let change = match new.get(id) {
                Some(moved) => Change::Modified(Arc::clone(moved)),
                None => Change::Deleted(Arc::clone(inst)),
            };
            changes.insert(id.clone(), change);
        }
    }

    changes
}
