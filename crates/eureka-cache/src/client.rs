//! The discovery cache: lookups backed by a polled registry snapshot.

use std::sync::Arc;
use std::time::Duration;

use eureka_cache_core::{Application, IdentityResolver, Instance, InstanceId};
use eureka_cache_registry::{RegistryRead, SharedRegistry};
use eureka_cache_sync::{
    log_cycle, ApplicationsSource, Fetcher, InstanceEventHandler, NoopHandler, PollTicker,
    SyncReport, SyncSession, Transport,
};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{DiscoveryError, Result};

/// A local, continuously refreshed copy of the discovery registry.
///
/// Lookups read the current snapshot and never wait on a sync cycle.
/// Cycles are driven either by [`refresh`](Self::refresh) or by the
/// background task started with [`spawn`](Self::spawn); the two share one
/// session, so cycles never overlap.
pub struct DiscoveryCache<S, H = NoopHandler> {
    registry: SharedRegistry,
    session: Arc<Mutex<SyncSession<S, H>>>,
    poll_interval: Duration,
}

impl<T: Transport> DiscoveryCache<Fetcher<T>, NoopHandler> {
    /// Create a cache polling the servers named in `config` over `transport`.
    pub fn new(config: &ClientConfig, transport: T) -> Result<Self> {
        Self::with_handler(config, transport, NoopHandler)
    }
}

impl<T: Transport, H: InstanceEventHandler> DiscoveryCache<Fetcher<T>, H> {
    /// Like [`new`](DiscoveryCache::new), delivering changes to `handler`.
    pub fn with_handler(config: &ClientConfig, transport: T, handler: H) -> Result<Self> {
        let endpoints = config.endpoint_urls()?;
        debug!(?endpoints, "registry endpoints");
        let fetcher = Fetcher::new(transport, endpoints);
        Ok(Self::from_session(SyncSession::with_handler(
            fetcher,
            handler,
            config.sync_config(),
        )))
    }
}

impl<S: ApplicationsSource, H: InstanceEventHandler> DiscoveryCache<S, H> {
    /// Wrap an existing session.
    pub fn from_session(session: SyncSession<S, H>) -> Self {
        Self {
            registry: session.registry().clone(),
            poll_interval: session.config().poll_interval,
            session: Arc::new(Mutex::new(session)),
        }
    }

    /// Replace the identity resolver used for incoming instances.
    pub async fn set_resolver(&self, resolver: IdentityResolver) {
        self.session.lock().await.set_resolver(resolver);
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lookups
    // ─────────────────────────────────────────────────────────────────────────

    pub fn application(&self, name: &str) -> Result<Application> {
        self.registry
            .application(name)
            .ok_or_else(|| DiscoveryError::ApplicationNotFound(name.to_owned()))
    }

    /// Every registered application, ordered by name. Empty before the
    /// first successful sync.
    pub fn applications(&self) -> Vec<Application> {
        self.registry.applications()
    }

    pub fn instance(&self, app: &str, id: &InstanceId) -> Result<Instance> {
        self.registry
            .instance(app, id)
            .ok_or_else(|| DiscoveryError::InstanceNotFound {
                app: app.to_owned(),
                id: id.clone(),
            })
    }

    pub fn instances_by_vip(&self, vip: &str) -> Result<Vec<Instance>> {
        self.registry
            .instances_by_vip(vip)
            .ok_or_else(|| DiscoveryError::VipNotFound(vip.to_owned()))
    }

    pub fn instances_by_secure_vip(&self, svip: &str) -> Result<Vec<Instance>> {
        self.registry
            .instances_by_secure_vip(svip)
            .ok_or_else(|| DiscoveryError::SecureVipNotFound(svip.to_owned()))
    }

    /// Status digest of the current snapshot.
    pub fn hashcode(&self) -> String {
        self.registry.load().hashcode()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Sync
    // ─────────────────────────────────────────────────────────────────────────

    /// Run one sync cycle now, waiting for any cycle in progress to finish.
    pub async fn refresh(&self) -> Result<SyncReport> {
        let mut session = self.session.lock().await;
        Ok(session.run_cycle().await?)
    }

    /// Poll in the background until `cancel` fires.
    ///
    /// The first cycle starts immediately. Cancellation takes effect between
    /// cycles; a cycle already running completes first.
    pub fn spawn(&self, cancel: CancellationToken) -> JoinHandle<()>
    where
        S: 'static,
        H: 'static,
    {
        let session = Arc::clone(&self.session);
        let poll_interval = self.poll_interval;

        tokio::spawn(async move {
            let mut ticker = PollTicker::new(poll_interval, cancel);
            while ticker.tick().await {
                let result = session.lock().await.run_cycle().await;
                log_cycle(&result);
            }
        })
    }
}
