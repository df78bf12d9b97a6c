//! Direct registry lookups, bypassing the local snapshot.
//!
//! Every call is one GET against the registry, failing over across the
//! configured endpoints the same way the sync loop does. Use this for
//! one-off lookups where a polled cache is not worth keeping.

use eureka_cache_core::{
    decode_application_list, decode_applications, decode_instance, Application, Instance,
    InstanceId,
};
use eureka_cache_sync::{Fetcher, SyncError, Transport, APPS_PATH};
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{DiscoveryError, Result};

/// Uncached lookups against the registry servers.
pub struct RemoteDiscovery<T: Transport> {
    fetcher: Fetcher<T>,
}

impl<T: Transport> RemoteDiscovery<T> {
    pub fn new(config: &ClientConfig, transport: T) -> Result<Self> {
        let endpoints = config.endpoint_urls()?;
        debug!(?endpoints, "registry endpoints");
        Ok(Self::from_fetcher(Fetcher::new(transport, endpoints)))
    }

    pub fn from_fetcher(fetcher: Fetcher<T>) -> Self {
        Self { fetcher }
    }

    /// `GET apps/{name}`.
    pub async fn application(&self, name: &str) -> Result<Application> {
        let not_found = || DiscoveryError::ApplicationNotFound(name.to_owned());
        let apps = self
            .fetcher
            .fetch_with(&format!("{APPS_PATH}/{name}"), decode_application_list)
            .await
            .map_err(|e| or_not_found(e, not_found))?;

        if apps.applications.len() > 1 {
            warn!(
                app = name,
                count = apps.applications.len(),
                "registry returned several applications for one name, using the first"
            );
        }
        apps.applications.into_iter().next().ok_or_else(not_found)
    }

    /// `GET apps`. An empty registry yields an empty list.
    pub async fn applications(&self) -> Result<Vec<Application>> {
        Ok(self.fetcher.fetch_path(APPS_PATH).await?.applications)
    }

    /// `GET apps/{app}/{id}`.
    pub async fn instance(&self, app: &str, id: &InstanceId) -> Result<Instance> {
        self.fetcher
            .fetch_with(&format!("{APPS_PATH}/{app}/{id}"), decode_instance)
            .await
            .map_err(|e| {
                or_not_found(e, || DiscoveryError::InstanceNotFound {
                    app: app.to_owned(),
                    id: id.clone(),
                })
            })
    }

    /// `GET vips/{vip}`.
    pub async fn instances_by_vip(&self, vip: &str) -> Result<Vec<Instance>> {
        self.instances_at(&format!("vips/{vip}"), || {
            DiscoveryError::VipNotFound(vip.to_owned())
        })
        .await
    }

    /// `GET svips/{svip}`.
    pub async fn instances_by_secure_vip(&self, svip: &str) -> Result<Vec<Instance>> {
        self.instances_at(&format!("svips/{svip}"), || {
            DiscoveryError::SecureVipNotFound(svip.to_owned())
        })
        .await
    }

    async fn instances_at(
        &self,
        path: &str,
        not_found: impl Fn() -> DiscoveryError,
    ) -> Result<Vec<Instance>> {
        let apps = self
            .fetcher
            .fetch_with(path, decode_applications)
            .await
            .map_err(|e| or_not_found(e, &not_found))?;

        let instances: Vec<Instance> = apps
            .applications
            .into_iter()
            .flat_map(|a| a.instances)
            .collect();
        if instances.is_empty() {
            return Err(not_found());
        }
        Ok(instances)
    }
}

fn or_not_found(e: SyncError, not_found: impl FnOnce() -> DiscoveryError) -> DiscoveryError {
    if e.is_not_found() {
        not_found()
    } else {
        DiscoveryError::Sync(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eureka_cache_core::Applications;
    use eureka_cache_sync::MemoryTransport;
    use eureka_cache_testkit::{InstanceBuilder, PayloadBuilder};
    use serde_json::json;

    const A: &str = "http://a/eureka/v2";
    const B: &str = "http://b/eureka/v2";

    fn remote(transport: &MemoryTransport) -> RemoteDiscovery<MemoryTransport> {
        RemoteDiscovery::from_fetcher(Fetcher::new(
            transport.clone(),
            [A, B].map(String::from),
        ))
    }

    fn orders(host: &str) -> Instance {
        InstanceBuilder::new("ORDERS", host)
            .id(host)
            .vip("orders")
            .secure_vip("orders-secure")
            .port(8080)
            .build()
    }

    #[tokio::test]
    async fn test_application_fails_over() {
        let transport = MemoryTransport::new();
        transport.down(A);
        let bare = Applications {
            applications: vec![Application::new("ORDERS", vec![orders("o1"), orders("o2")])],
            ..Default::default()
        };
        transport.respond(B, "apps/ORDERS", serde_json::to_vec(&bare).unwrap());

        let app = remote(&transport).application("ORDERS").await.unwrap();
        assert_eq!(app.name, "ORDERS");
        assert_eq!(app.instances.len(), 2);
        assert_eq!(transport.requests(), [format!("{A}/apps/ORDERS"), format!("{B}/apps/ORDERS")]);
    }

    #[tokio::test]
    async fn test_application_missing_or_empty() {
        let transport = MemoryTransport::new();
        transport.respond(A, "apps/EMPTY", r#"{"application": []}"#);
        let remote = remote(&transport);

        assert!(matches!(
            remote.application("NOPE").await,
            Err(DiscoveryError::ApplicationNotFound(name)) if name == "NOPE"
        ));
        assert!(matches!(
            remote.application("EMPTY").await,
            Err(DiscoveryError::ApplicationNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_applications() {
        let transport = MemoryTransport::new();
        transport.respond(
            A,
            "apps",
            PayloadBuilder::new()
                .version(3)
                .instances([orders("o1"), InstanceBuilder::new("BILLING", "b1").build()])
                .to_json(),
        );

        let apps = remote(&transport).applications().await.unwrap();
        assert_eq!(apps.len(), 2);
    }

    #[tokio::test]
    async fn test_instance() {
        let transport = MemoryTransport::new();
        let body = json!({"instance": orders("o1")});
        transport.respond(A, "apps/ORDERS/o1", serde_json::to_vec(&body).unwrap());
        let remote = remote(&transport);

        let inst = remote.instance("ORDERS", &InstanceId::new("o1")).await.unwrap();
        assert_eq!(inst.host_name.as_deref(), Some("o1"));
        assert_eq!(inst.port_number(), Some(8080));

        match remote.instance("ORDERS", &InstanceId::new("o9")).await {
            Err(DiscoveryError::InstanceNotFound { app, id }) => {
                assert_eq!(app, "ORDERS");
                assert_eq!(id, InstanceId::new("o9"));
            }
            other => panic!("expected InstanceNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_instances_by_vip_and_secure_vip() {
        let transport = MemoryTransport::new();
        let payload = PayloadBuilder::new().instances([orders("o1"), orders("o2")]);
        transport.respond(A, "vips/orders", payload.clone().to_json());
        transport.respond(A, "svips/orders-secure", payload.to_json());
        transport.respond(A, "vips/idle", PayloadBuilder::new().to_json());
        let remote = remote(&transport);

        assert_eq!(remote.instances_by_vip("orders").await.unwrap().len(), 2);
        assert_eq!(
            remote
                .instances_by_secure_vip("orders-secure")
                .await
                .unwrap()
                .len(),
            2
        );
        assert!(matches!(
            remote.instances_by_vip("idle").await,
            Err(DiscoveryError::VipNotFound(vip)) if vip == "idle"
        ));
        assert!(matches!(
            remote.instances_by_secure_vip("gone").await,
            Err(DiscoveryError::SecureVipNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_is_not_not_found() {
        let transport = MemoryTransport::new();
        transport.down(A);
        transport.down(B);

        match remote(&transport).instances_by_vip("orders").await {
            Err(DiscoveryError::Sync(SyncError::AllEndpointsFailed { attempts, .. })) => {
                assert_eq!(attempts, 2)
            }
            other => panic!("expected a sync error, got {other:?}"),
        }
    }
}
