//! Change notification.

use eureka_cache_core::Instance;
use eureka_cache_registry::RegistrySnapshot;
use tracing::debug;

use crate::diff::{Change, ChangeSet};

/// Receives instance-level changes after each sync cycle.
///
/// Callbacks run synchronously inside the cycle; a handler that blocks
/// stalls the next poll.
pub trait InstanceEventHandler: Send + Sync {
    fn on_add(&self, instance: &Instance);
    fn on_update(&self, old: &Instance, new: &Instance);
    fn on_delete(&self, instance: &Instance);
}

/// Handler that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHandler;

impl InstanceEventHandler for NoopHandler {
    fn on_add(&self, _instance: &Instance) {}
    fn on_update(&self, _old: &Instance, _new: &Instance) {}
    fn on_delete(&self, _instance: &Instance) {}
}

impl<H: InstanceEventHandler + ?Sized> InstanceEventHandler for std::sync::Arc<H> {
    fn on_add(&self, instance: &Instance) {
        (**self).on_add(instance)
    }

    fn on_update(&self, old: &Instance, new: &Instance) {
        (**self).on_update(old, new)
    }

    fn on_delete(&self, instance: &Instance) {
        (**self).on_delete(instance)
    }
}

/// Deliver `changes` to `handler`.
///
/// The prior state of a modified instance is looked up by id in
/// `previous`. If it is not there, the modification is delivered as an
/// addition.
pub fn dispatch<H>(changes: &ChangeSet, previous: &RegistrySnapshot, handler: &H)
where
    H: InstanceEventHandler + ?Sized,
{
    for (id, change) in changes {
        match change {
            Change::Added(inst) => handler.on_add(inst),
            Change::Modified(inst) => match previous.get(id) {
                Some(old) => handler.on_update(old, inst),
                None => {
                    debug!(instance_id = %id, "no prior state for modified instance, delivering as add");
                    handler.on_add(inst)
                }
            },
            Change::Deleted(inst) => handler.on_delete(inst),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::diff_snapshots;
    use eureka_cache_core::Status;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Log(Mutex<Vec<String>>);

    impl InstanceEventHandler for Log {
        fn on_add(&self, i: &Instance) {
            self.0.lock().unwrap().push(format!("add {}", i.status));
        }
        fn on_update(&self, old: &Instance, new: &Instance) {
            self.0
                .lock()
                .unwrap()
                .push(format!("update {} -> {}", old.status, new.status));
        }
        fn on_delete(&self, i: &Instance) {
            self.0.lock().unwrap().push(format!("delete {}", i.status));
        }
    }

    fn single(status: Status) -> RegistrySnapshot {
        let mut snap = RegistrySnapshot::new();
        snap.add(
            "A".into(),
            Arc::new(Instance {
                app: Some("APP".into()),
                vip_address: Some("vip".into()),
                status,
                ..Default::default()
            }),
            "APP",
        );
        snap
    }

    #[test]
    fn test_modification_carries_old_and_new() {
        let old = single(Status::Up);
        let new = single(Status::Down);
        let log = Log::default();

        dispatch(&diff_snapshots(&old, &new), &old, &log);

        assert_eq!(*log.0.lock().unwrap(), ["update UP -> DOWN"]);
    }

    #[test]
    fn test_modification_without_prior_is_add() {
        let mut changes = ChangeSet::new();
        changes.insert(
            "A".into(),
            Change::Modified(Arc::new(Instance {
                status: Status::Starting,
                ..Default::default()
            })),
        );
        let log = Log::default();

        dispatch(&changes, &RegistrySnapshot::new(), &log);

        assert_eq!(*log.0.lock().unwrap(), ["add STARTING"]);
    }

    #[test]
    fn test_deletion() {
        let old = single(Status::Up);
        let log = Log::default();
        dispatch(&diff_snapshots(&old, &RegistrySnapshot::new()), &old, &log);
        assert_eq!(*log.0.lock().unwrap(), ["delete UP"]);
    }
}
