//! Client configuration.

use std::collections::BTreeMap;
use std::time::Duration;

use eureka_cache_sync::SyncConfig;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationSeconds};

use crate::error::{DiscoveryError, Result};

/// Configuration for a [`DiscoveryCache`](crate::DiscoveryCache).
///
/// Deserializes from camelCase keys; the poll interval is given in whole
/// seconds as `pollIntervalSecs`.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientConfig {
    /// Registry base URLs per zone.
    pub service_urls: BTreeMap<String, Vec<String>>,
    /// The zone this client runs in.
    pub preferred_zone: Option<String>,
    /// Try the preferred zone's servers before any other zone's.
    pub prefer_same_zone: bool,
    /// Discover servers through DNS. Not supported.
    pub use_dns_for_service_urls: bool,
    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(rename = "pollIntervalSecs")]
    pub poll_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            service_urls: BTreeMap::new(),
            preferred_zone: None,
            prefer_same_zone: false,
            use_dns_for_service_urls: false,
            poll_interval: SyncConfig::default().poll_interval,
        }
    }
}

impl ClientConfig {
    /// Add the servers of `zone`.
    pub fn zone<I, U>(mut self, zone: impl Into<String>, urls: I) -> Self
    where
        I: IntoIterator<Item = U>,
        U: Into<String>,
    {
        self.service_urls
            .entry(zone.into())
            .or_default()
            .extend(urls.into_iter().map(Into::into));
        self
    }

    /// Prefer the servers of `zone`.
    pub fn prefer_zone(mut self, zone: impl Into<String>) -> Self {
        self.preferred_zone = Some(zone.into());
        self.prefer_same_zone = true;
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.use_dns_for_service_urls {
            return Err(DiscoveryError::Config(
                "DNS discovery of service urls is not supported".into(),
            ));
        }
        if self.service_urls.values().all(Vec::is_empty) {
            return Err(DiscoveryError::Config("no service urls configured".into()));
        }
        if self.prefer_same_zone {
            match &self.preferred_zone {
                None => {
                    return Err(DiscoveryError::Config(
                        "prefer_same_zone is set but no preferred zone is given".into(),
                    ))
                }
                Some(zone) if self.service_urls.get(zone).map_or(true, Vec::is_empty) => {
                    return Err(DiscoveryError::Config(format!(
                        "preferred zone {zone} has no service urls"
                    )))
                }
                Some(_) => {}
            }
        }
        if self.poll_interval.is_zero() {
            return Err(DiscoveryError::Config("poll interval must be positive".into()));
        }
        Ok(())
    }

    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            poll_interval: self.poll_interval,
        }
    }

    /// The candidate registry URLs in the order they should be tried.
    pub fn endpoint_urls(&self) -> Result<Vec<String>> {
        self.endpoint_urls_with(&mut rand::thread_rng())
    }

    /// Like [`endpoint_urls`](Self::endpoint_urls) with a caller-supplied rng.
    ///
    /// Zones are visited in random order and so are the servers within a
    /// zone, spreading load across the cluster. When a zone is preferred its
    /// servers come first. Trailing slashes are trimmed.
    pub fn endpoint_urls_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Vec<String>> {
        self.validate()?;

        let preferred = self
            .preferred_zone
            .as_deref()
            .filter(|_| self.prefer_same_zone);

        let mut zones: Vec<&str> = self
            .service_urls
            .keys()
            .map(String::as_str)
            .filter(|zone| Some(*zone) != preferred)
            .collect();
        zones.shuffle(rng);
        if let Some(zone) = preferred {
            zones.insert(0, zone);
        }

        let mut urls = Vec::new();
        for zone in zones {
            let mut zone_urls: Vec<String> = self.service_urls[zone]
                .iter()
                .map(|url| url.trim_end_matches('/').to_owned())
                .collect();
            zone_urls.shuffle(rng);
            urls.extend(zone_urls);
        }
        Ok(urls)
    }
}
