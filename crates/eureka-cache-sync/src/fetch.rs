//! Fetching applications payloads with endpoint fail-over.

use async_trait::async_trait;
use eureka_cache_core::{decode_applications, Applications, DecodeError};
use tracing::{debug, warn};

use crate::error::{Result, SyncError};
use crate::transport::Transport;

/// Resource path of the full registry roster.
pub const APPS_PATH: &str = "apps";

/// Resource path of the incremental change feed.
pub const DELTA_PATH: &str = "apps/delta";

/// Which registry resource to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    /// The full instance roster.
    Full,
    /// The incremental change feed.
    Delta,
}

impl Resource {
    pub fn path(&self) -> &'static str {
        match self {
            Resource::Full => APPS_PATH,
            Resource::Delta => DELTA_PATH,
        }
    }
}

/// Source of decoded applications payloads.
///
/// This is the seam the reconciler fetches through; [`Fetcher`] implements
/// it over a [`Transport`].
#[async_trait]
pub trait ApplicationsSource: Send + Sync {
    async fn fetch(&self, resource: Resource) -> Result<Applications>;
}

/// Tries an ordered list of candidate endpoints until one yields a
/// decodable payload.
pub struct Fetcher<T: Transport> {
    transport: T,
    endpoints: Vec<String>,
}

impl<T: Transport> Fetcher<T> {
    /// Create a fetcher over `endpoints`, tried in the given order.
    ///
    /// Trailing slashes are trimmed from each base URL.
    pub fn new(transport: T, endpoints: impl IntoIterator<Item = String>) -> Self {
        let endpoints = endpoints
            .into_iter()
            .map(|url| url.trim_end_matches('/').to_owned())
            .collect();
        Self {
            transport,
            endpoints,
        }
    }

    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Fetch and decode `path` from the first endpoint that succeeds.
    pub async fn fetch_path(&self, path: &str) -> Result<Applications> {
        self.fetch_with(path, decode_applications).await
    }

    /// Fetch `path` from the first endpoint whose body `decode` accepts.
    ///
    /// Transport and decode failures both move on to the next endpoint.
    /// When all fail, the last failure is returned inside
    /// [`SyncError::AllEndpointsFailed`].
    pub async fn fetch_with<R, F>(&self, path: &str, decode: F) -> Result<R>
    where
        F: Fn(&[u8]) -> std::result::Result<R, DecodeError>,
    {
        let mut last = None;

        for base_url in &self.endpoints {
            let attempt = match self.transport.get(base_url, path).await {
                Ok(body) => decode(&body).map_err(SyncError::from),
                Err(e) => Err(e),
            };

            match attempt {
                Ok(value) => {
                    debug!(endpoint = %base_url, path, "fetched registry resource");
                    return Ok(value);
                }
                Err(e) => {
                    warn!(endpoint = %base_url, path, error = %e, "registry endpoint failed");
                    last = Some(e);
                }
            }
        }

        match last {
            Some(last) => Err(SyncError::AllEndpointsFailed {
                attempts: self.endpoints.len(),
                last: Box::new(last),
            }),
            None => Err(SyncError::NoEndpoints),
        }
    }
}

#[async_trait]
impl<T: Transport> ApplicationsSource for Fetcher<T> {
    async fn fetch(&self, resource: Resource) -> Result<Applications> {
        self.fetch_path(resource.path()).await
    }
}
