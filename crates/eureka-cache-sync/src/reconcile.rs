//! Full and delta reconciliation.
//!
//! The [`Reconciler`] turns fetched payloads into registry snapshots. It
//! owns the identity resolver and the last applied delta version; the
//! snapshot itself is owned by the caller.

use std::sync::Arc;

use eureka_cache_core::{ActionType, Applications, IdentityError, IdentityResolver};
use eureka_cache_registry::RegistrySnapshot;
use tracing::{debug, info, warn};

use crate::convergence::{verify_hashcode, ConvergenceResult};
use crate::diff::{Change, ChangeSet};
use crate::error::{Result, SyncError};
use crate::fetch::{ApplicationsSource, Resource};

/// Why a delta could not be applied and a full fetch is needed.
#[derive(Debug)]
pub enum ResyncReason {
    /// The server does not serve deltas.
    Unsupported,
    /// The delta could not be fetched or decoded.
    Fetch(SyncError),
    /// A delta record had no resolvable identity.
    Identity(IdentityError),
    /// The delta applied cleanly but the result disagrees with the server.
    HashcodeMismatch { local: String, remote: String },
}

/// Outcome of delta reconciliation.
#[derive(Debug)]
pub enum DeltaOutcome {
    /// The server version equals the last applied one; nothing to do.
    Unchanged,
    /// The delta was applied and verified.
    Applied {
        snapshot: RegistrySnapshot,
        changes: ChangeSet,
    },
    /// The local state must be rebuilt from a full fetch.
    ResyncRequired(ResyncReason),
}

/// Builds snapshots from full payloads and applies deltas to them.
#[derive(Debug)]
pub struct Reconciler {
    resolver: IdentityResolver,
    version_delta: i64,
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new(IdentityResolver::default())
    }
}

impl Reconciler {
    pub fn new(resolver: IdentityResolver) -> Self {
        Self {
            resolver,
            version_delta: 0,
        }
    }

    /// The last delta version applied, or 0 after a full fetch.
    pub fn version_delta(&self) -> i64 {
        self.version_delta
    }

    /// Build a fresh snapshot from a full roster.
    ///
    /// Instances whose identity cannot be resolved are skipped. Resets the
    /// delta version to 0.
    pub fn build_full(&mut self, apps: Applications) -> RegistrySnapshot {
        let mut snapshot = RegistrySnapshot::new();
        let mut skipped = 0usize;

        for app in apps.applications {
            for mut instance in app.instances {
                let id = match self.resolver.resolve(&instance) {
                    Ok(id) => id,
                    Err(e) => {
                        warn!(app = %app.name, error = %e, "skipping instance without identity");
                        skipped += 1;
                        continue;
                    }
                };
                instance.instance_id = Some(id.as_str().to_owned());
                snapshot.add(id, Arc::new(instance), &app.name);
            }
        }

        self.version_delta = 0;
        info!(
            instances = snapshot.len(),
            skipped,
            hashcode = %snapshot.hashcode(),
            "full fetch reconciled"
        );
        snapshot
    }

    /// Apply a delta payload to a copy of `current`.
    ///
    /// `current` is never modified. On [`DeltaOutcome::Applied`] the delta
    /// version is adopted; on any other outcome it is left unchanged.
    pub fn apply_delta(&mut self, current: &RegistrySnapshot, apps: Applications) -> DeltaOutcome {
        if apps.delta_unsupported() {
            info!("server does not support delta, full fetch required");
            return DeltaOutcome::ResyncRequired(ResyncReason::Unsupported);
        }

        let version = apps.versions_delta.unwrap_or_default();
        if version == self.version_delta {
            debug!(version, "delta version is current");
            return DeltaOutcome::Unchanged;
        }

        let mut snapshot = current.clone();
        let mut changes = ChangeSet::new();

        for app in apps.applications {
            for mut instance in app.instances {
                let id = match self.resolver.resolve(&instance) {
                    Ok(id) => id,
                    Err(e) => {
                        warn!(app = %app.name, error = %e, "delta record without identity, discarding delta");
                        return DeltaOutcome::ResyncRequired(ResyncReason::Identity(e));
                    }
                };
                instance.instance_id = Some(id.as_str().to_owned());
                let instance = Arc::new(instance);

                let change = match instance.action() {
                    ActionType::Added => {
                        snapshot.add(id.clone(), Arc::clone(&instance), &app.name);
                        Change::Added(instance)
                    }
                    ActionType::Modified => {
                        snapshot.update(id.clone(), Arc::clone(&instance), &app.name);
                        Change::Modified(instance)
                    }
                    ActionType::Deleted => {
                        let removed = snapshot.delete(&id);
                        Change::Deleted(removed.unwrap_or(instance))
                    }
                    ActionType::Unknown => {
                        warn!(instance_id = %id, "delta record with unknown action type, ignored");
                        continue;
                    }
                };
                changes.insert(id, change);
            }
        }

        match verify_hashcode(&snapshot, apps.apps_hashcode.as_deref()) {
            ConvergenceResult::Converged => {
                self.version_delta = version;
                let (added, modified, deleted) = crate::diff::tally(&changes);
                info!(version, added, modified, deleted, "delta applied");
                DeltaOutcome::Applied { snapshot, changes }
            }
            ConvergenceResult::Diverged { local, remote } => {
                warn!(%local, %remote, "hashcode mismatch after delta");
                DeltaOutcome::ResyncRequired(ResyncReason::HashcodeMismatch { local, remote })
            }
        }
    }

    /// Fetch the full roster and build a snapshot from it.
    pub async fn reconcile_full<S>(&mut self, source: &S) -> Result<RegistrySnapshot>
    where
        S: ApplicationsSource + ?Sized,
    {
        let apps = source.fetch(Resource::Full).await?;
        Ok(self.build_full(apps))
    }

    /// Fetch a delta and apply it to a copy of `current`.
    ///
    /// Fetch failures are reported as [`ResyncReason::Fetch`].
    pub async fn reconcile_delta<S>(&mut self, source: &S, current: &RegistrySnapshot) -> DeltaOutcome
    where
        S: ApplicationsSource + ?Sized,
    {
        match source.fetch(Resource::Delta).await {
            Ok(apps) => self.apply_delta(current, apps),
            Err(e) => {
                warn!(error = %e, "delta fetch failed");
                DeltaOutcome::ResyncRequired(ResyncReason::Fetch(e))
            }
        }
    }
}
