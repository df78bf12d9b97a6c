//! The sync loop.
//!
//! A [`SyncSession`] runs reconciliation cycles against a registry source
//! and publishes each result into a [`SharedRegistry`]:
//!
//! ```text
//! registry empty ──> full fetch ──> all instances added ─────────────┐
//!                                                                    │
//! otherwise ──> delta ──┬─ unchanged ───────────── (nothing) ───────┤
//!                       ├─ applied ──> delta action list ───────────┤
//!                       └─ resync ──> full fetch ──> VIP diff ──────┤
//!                                                                    v
//!                                                   swap snapshot, notify
//! ```
//!
//! Cycles never overlap: a session is driven through `&mut self`.

use std::sync::Arc;
use std::time::Duration;

use eureka_cache_core::IdentityResolver;
use eureka_cache_registry::{RegistrySnapshot, SharedRegistry};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::diff::{all_added, diff_snapshots, tally, ChangeSet};
use crate::error::Result;
use crate::fetch::ApplicationsSource;
use crate::notify::{dispatch, InstanceEventHandler, NoopHandler};
use crate::poll::{log_cycle, PollTicker};
use crate::reconcile::{DeltaOutcome, Reconciler};

/// Configuration for sync behavior.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Time between the start of consecutive cycles.
    pub poll_interval: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(30),
        }
    }
}

/// How a cycle reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// First full fetch into an empty registry.
    Bootstrap,
    /// A delta was applied.
    Delta,
    /// The server delta version was already applied.
    Unchanged,
    /// A delta was rejected and the registry rebuilt from a full fetch.
    FullResync,
}

/// Result of one sync cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub mode: SyncMode,
    pub added: usize,
    pub modified: usize,
    pub deleted: usize,
    /// Number of distinct instances in the published snapshot.
    pub instances: usize,
    /// Digest of the published snapshot.
    pub hashcode: String,
}

impl SyncReport {
    fn new(mode: SyncMode, changes: &ChangeSet, snapshot: &RegistrySnapshot) -> Self {
        let (added, modified, deleted) = tally(changes);
        Self {
            mode,
            added,
            modified,
            deleted,
            instances: snapshot.len(),
            hashcode: snapshot.hashcode(),
        }
    }

    /// Total number of changes delivered.
    pub fn changes(&self) -> usize {
        self.added + self.modified + self.deleted
    }
}

/// Sync session state.
pub struct SyncSession<S, H = NoopHandler> {
    source: S,
    reconciler: Reconciler,
    registry: SharedRegistry,
    handler: H,
    config: SyncConfig,
}

impl<S: ApplicationsSource> SyncSession<S, NoopHandler> {
    /// Create a session that publishes without notifying anyone.
    pub fn new(source: S, config: SyncConfig) -> Self {
        Self::with_handler(source, NoopHandler, config)
    }
}

impl<S: ApplicationsSource, H: InstanceEventHandler> SyncSession<S, H> {
    /// Create a session that delivers changes to `handler`.
    pub fn with_handler(source: S, handler: H, config: SyncConfig) -> Self {
        Self {
            source,
            reconciler: Reconciler::default(),
            registry: SharedRegistry::new(),
            handler,
            config,
        }
    }

    /// Use `resolver` for instance identities.
    pub fn with_resolver(mut self, resolver: IdentityResolver) -> Self {
        self.set_resolver(resolver);
        self
    }

    /// Swap the identity resolver. The delta version restarts at 0, so the
    /// next delta is verified against the digest like any other.
    pub fn set_resolver(&mut self, resolver: IdentityResolver) {
        self.reconciler = Reconciler::new(resolver);
    }

    /// Publish into an existing registry handle.
    pub fn with_registry(mut self, registry: SharedRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Handle to the registry this session publishes into.
    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// The last delta version applied.
    pub fn version_delta(&self) -> i64 {
        self.reconciler.version_delta()
    }

    /// Run one reconciliation cycle.
    ///
    /// On error nothing is published and no handler is called.
    pub async fn run_cycle(&mut self) -> Result<SyncReport> {
        let previous = self.registry.load();

        if previous.is_empty() {
            let snapshot = self.reconciler.reconcile_full(&self.source).await?;
            let changes = all_added(&snapshot);
            return Ok(self.publish(SyncMode::Bootstrap, snapshot, changes, &previous));
        }

        match self.reconciler.reconcile_delta(&self.source, &previous).await {
            DeltaOutcome::Unchanged => {
                Ok(SyncReport::new(SyncMode::Unchanged, &ChangeSet::new(), &previous))
            }
            DeltaOutcome::Applied { snapshot, changes } => {
                Ok(self.publish(SyncMode::Delta, snapshot, changes, &previous))
            }
            DeltaOutcome::ResyncRequired(reason) => {
                info!(?reason, "falling back to full fetch");
                let snapshot = self.reconciler.reconcile_full(&self.source).await?;
                let changes = diff_snapshots(&previous, &snapshot);
                Ok(self.publish(SyncMode::FullResync, snapshot, changes, &previous))
            }
        }
    }

    fn publish(
        &self,
        mode: SyncMode,
        snapshot: RegistrySnapshot,
        changes: ChangeSet,
        previous: &Arc<RegistrySnapshot>,
    ) -> SyncReport {
        let report = SyncReport::new(mode, &changes, &snapshot);
        self.registry.swap(snapshot);
        dispatch(&changes, previous, &self.handler);
        debug!(
            ?mode,
            added = report.added,
            modified = report.modified,
            deleted = report.deleted,
            "snapshot published"
        );
        report
    }

    /// Poll until `cancel` fires.
    ///
    /// The first cycle runs immediately. Cancellation is observed only while
    /// waiting for the next tick; a cycle in progress always completes.
    /// Failed cycles are logged and retried on the next tick.
    pub async fn run(&mut self, cancel: CancellationToken) {
        let mut ticker = PollTicker::new(self.config.poll_interval, cancel);
        while ticker.tick().await {
            log_cycle(&self.run_cycle().await);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::Fetcher;
    use crate::transport::memory::MemoryTransport;
    use eureka_cache_core::{
        ActionType, Application, Applications, ApplicationsEnvelope, Instance, InstanceId, Status,
    };
    use eureka_cache_registry::RegistryRead;
    use std::sync::Mutex;

    const BASE: &str = "http://registry";

    fn inst(host: &str, vip: &str, status: Status, action: Option<ActionType>) -> Instance {
        Instance {
            host_name: Some(host.into()),
            app: Some("APP".into()),
            vip_address: Some(vip.into()),
            status,
            action_type: action,
            ..Default::default()
        }
    }

    fn body(version: i64, hashcode: &str, instances: Vec<Instance>) -> Vec<u8> {
        let envelope = ApplicationsEnvelope {
            applications: Some(Applications {
                versions_delta: Some(version),
                apps_hashcode: Some(hashcode.into()),
                applications: vec![Application::new("APP", instances)],
            }),
        };
        serde_json::to_vec(&envelope).unwrap()
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>);

    impl InstanceEventHandler for Recorder {
        fn on_add(&self, i: &Instance) {
            let host = i.host_name.clone().unwrap_or_default();
            self.0.lock().unwrap().push(format!("add {host}"));
        }
        fn on_update(&self, old: &Instance, new: &Instance) {
            let host = new.host_name.clone().unwrap_or_default();
            self.0
                .lock()
                .unwrap()
                .push(format!("update {host} {} -> {}", old.status, new.status));
        }
        fn on_delete(&self, i: &Instance) {
            let host = i.host_name.clone().unwrap_or_default();
            self.0.lock().unwrap().push(format!("delete {host}"));
        }
    }

    impl Recorder {
        fn take(&self) -> Vec<String> {
            std::mem::take(&mut *self.0.lock().unwrap())
        }
    }

    fn session(
        transport: &MemoryTransport,
    ) -> (SyncSession<Fetcher<MemoryTransport>, Arc<Recorder>>, Arc<Recorder>) {
        let recorder = Arc::new(Recorder::default());
        let fetcher = Fetcher::new(transport.clone(), [BASE.to_string()]);
        let session = SyncSession::with_handler(fetcher, Arc::clone(&recorder), SyncConfig::default());
        (session, recorder)
    }

    fn roster() -> Vec<Instance> {
        vec![
            inst("h1", "v1", Status::Up, None),
            inst("h2", "v1", Status::Up, None),
            inst("h3", "v2", Status::Up, None),
        ]
    }

    #[tokio::test]
    async fn test_bootstrap_reports_everything_added() {
        let transport = MemoryTransport::new();
        transport.respond(BASE, "apps", body(0, "UP_3_", roster()));
        let (mut session, recorder) = session(&transport);

        let report = session.run_cycle().await.unwrap();

        assert_eq!(report.mode, SyncMode::Bootstrap);
        assert_eq!(report.added, 3);
        assert_eq!(report.hashcode, "UP_3_");
        assert_eq!(recorder.take().len(), 3);
        assert_eq!(session.registry().application("APP").unwrap().instances.len(), 3);
        assert_eq!(session.registry().instances_by_vip("v1").unwrap().len(), 2);
        assert_eq!(transport.requests(), ["http://registry/apps"]);
    }

    #[tokio::test]
    async fn test_same_version_delta_is_noop() {
        let transport = MemoryTransport::new();
        transport.respond(BASE, "apps", body(0, "UP_3_", roster()));
        transport.respond(BASE, "apps/delta", body(0, "UP_3_", vec![]));
        let (mut session, recorder) = session(&transport);
        session.run_cycle().await.unwrap();
        recorder.take();

        let before = session.registry().load();
        let report = session.run_cycle().await.unwrap();

        assert_eq!(report.mode, SyncMode::Unchanged);
        assert_eq!(report.changes(), 0);
        assert!(recorder.take().is_empty());
        assert!(Arc::ptr_eq(&before, &session.registry().load()));
    }

    #[tokio::test]
    async fn test_delta_notifies_with_prior_state() {
        let transport = MemoryTransport::new();
        transport.respond(BASE, "apps", body(0, "UP_3_", roster()));
        transport.respond(
            BASE,
            "apps/delta",
            body(
                5,
                "DOWN_1_UP_1_",
                vec![
                    inst("h1", "v1", Status::Down, Some(ActionType::Modified)),
                    inst("h3", "v2", Status::Up, Some(ActionType::Deleted)),
                ],
            ),
        );
        let (mut session, recorder) = session(&transport);
        session.run_cycle().await.unwrap();
        recorder.take();

        let report = session.run_cycle().await.unwrap();

        assert_eq!(report.mode, SyncMode::Delta);
        assert_eq!((report.modified, report.deleted), (1, 1));
        assert_eq!(session.version_delta(), 5);
        assert_eq!(recorder.take(), ["update h1 UP -> DOWN", "delete h3"]);
        assert!(session.registry().instances_by_vip("v2").is_none());
    }

    #[tokio::test]
    async fn test_hashcode_mismatch_falls_back_to_full() {
        let transport = MemoryTransport::new();
        transport.respond(BASE, "apps", body(0, "UP_3_", roster()));
        transport.respond(
            BASE,
            "apps",
            body(
                0,
                "DOWN_1_UP_2_",
                vec![
                    inst("h1", "v1", Status::Down, None),
                    inst("h2", "v1", Status::Up, None),
                    inst("h4", "v3", Status::Up, None),
                ],
            ),
        );
        transport.respond(
            BASE,
            "apps/delta",
            body(9, "UP_9_", vec![inst("h1", "v1", Status::Down, Some(ActionType::Modified))]),
        );
        let (mut session, recorder) = session(&transport);
        session.run_cycle().await.unwrap();
        recorder.take();

        let report = session.run_cycle().await.unwrap();

        assert_eq!(report.mode, SyncMode::FullResync);
        assert_eq!(session.version_delta(), 0);
        assert_eq!(report.hashcode, "DOWN_1_UP_2_");
        assert_eq!(
            recorder.take(),
            ["update h1 UP -> DOWN", "delete h3", "add h4"]
        );
        assert!(session
            .registry()
            .instance("APP", &InstanceId::from("h4"))
            .is_some());
    }

    #[tokio::test]
    async fn test_fetch_failure_keeps_snapshot() {
        let transport = MemoryTransport::new();
        transport.respond(BASE, "apps", body(0, "UP_3_", roster()));
        let (mut session, recorder) = session(&transport);
        session.run_cycle().await.unwrap();
        recorder.take();

        let before = session.registry().load();
        transport.down(BASE);

        assert!(session.run_cycle().await.is_err());
        assert!(recorder.take().is_empty());
        assert!(Arc::ptr_eq(&before, &session.registry().load()));
    }

    #[tokio::test]
    async fn test_bootstrap_failure_leaves_registry_empty() {
        let transport = MemoryTransport::new();
        transport.respond(BASE, "apps", "{\"applications\": ");
        let (mut session, _) = session(&transport);

        assert!(session.run_cycle().await.is_err());
        assert!(session.registry().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_on_cancel() {
        let transport = MemoryTransport::new();
        transport.respond(BASE, "apps", body(0, "UP_3_", roster()));
        transport.respond(BASE, "apps/delta", body(0, "UP_3_", vec![]));
        let (mut session, _) = session(&transport);
        let registry = session.registry().clone();

        let cancel = CancellationToken::new();
        let task = tokio::spawn({
            let cancel = cancel.clone();
            async move { session.run(cancel).await }
        });

        tokio::time::sleep(Duration::from_secs(65)).await;
        cancel.cancel();
        task.await.unwrap();

        assert_eq!(registry.load().len(), 3);
        // bootstrap at t=0, deltas at t=30 and t=60
        assert_eq!(transport.requests().len(), 3);
    }
}
