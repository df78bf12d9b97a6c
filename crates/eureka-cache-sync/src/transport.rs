//! Transport abstraction for registry fetches.
//!
//! The transport issues a single GET against one base URL. Fail-over across
//! candidate endpoints, decoding and retries-by-polling live above it, in
//! [`Fetcher`](crate::fetch::Fetcher). Timeouts and TLS are the
//! implementation's concern.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

/// Fetch a raw resource from a registry endpoint.
///
/// Implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET `{base_url}/{path}` and return the response body.
    ///
    /// Non-success responses are errors; a missing resource should be
    /// reported as [`SyncError::NotFound`](crate::error::SyncError::NotFound).
    async fn get(&self, base_url: &str, path: &str) -> Result<Bytes>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn get(&self, base_url: &str, path: &str) -> Result<Bytes> {
        (**self).get(base_url, path).await
    }
}

/// A simple in-memory transport for testing.
///
/// Responses are scripted per `(base_url, path)`. A scripted queue is
/// consumed one response per request; the last response sticks. Unscripted
/// paths answer not found.
pub mod memory {
    use super::*;
    use crate::error::SyncError;
    use std::collections::{HashMap, HashSet, VecDeque};
    use std::sync::{Arc, Mutex, PoisonError};

    #[derive(Default)]
    struct State {
        responses: HashMap<(String, String), VecDeque<Result<Bytes>>>,
        down: HashSet<String>,
        requests: Vec<String>,
    }

    /// In-memory transport implementation. Clones share state.
    #[derive(Clone, Default)]
    pub struct MemoryTransport {
        state: Arc<Mutex<State>>,
    }

    impl MemoryTransport {
        pub fn new() -> Self {
            Self::default()
        }

        fn state(&self) -> std::sync::MutexGuard<'_, State> {
            self.state.lock().unwrap_or_else(PoisonError::into_inner)
        }

        /// Queue a successful response body.
        pub fn respond(&self, base_url: &str, path: &str, body: impl Into<Bytes>) {
            self.push(base_url, path, Ok(body.into()));
        }

        /// Queue a failure.
        pub fn fail(&self, base_url: &str, path: &str, message: &str) {
            self.push(
                base_url,
                path,
                Err(SyncError::Transport(message.to_owned())),
            );
        }

        /// Make every request to `base_url` fail until [`up`](Self::up).
        pub fn down(&self, base_url: &str) {
            self.state().down.insert(base_url.to_owned());
        }

        pub fn up(&self, base_url: &str) {
            self.state().down.remove(base_url);
        }

        /// Every `{base_url}/{path}` requested so far, in order.
        pub fn requests(&self) -> Vec<String> {
            self.state().requests.clone()
        }

        fn push(&self, base_url: &str, path: &str, response: Result<Bytes>) {
            self.state()
                .responses
                .entry((base_url.to_owned(), path.to_owned()))
                .or_default()
                .push_back(response);
        }
    }

    fn replay(response: &Result<Bytes>) -> Result<Bytes> {
        match response {
            Ok(body) => Ok(body.clone()),
            Err(SyncError::NotFound(what)) => Err(SyncError::NotFound(what.clone())),
            Err(e) => Err(SyncError::Transport(e.to_string())),
        }
    }

    #[async_trait]
    impl Transport for MemoryTransport {
        async fn get(&self, base_url: &str, path: &str) -> Result<Bytes> {
            let mut state = self.state();
            state.requests.push(format!("{base_url}/{path}"));

            if state.down.contains(base_url) {
                return Err(SyncError::Transport(format!("{base_url} unreachable")));
            }

            let key = (base_url.to_owned(), path.to_owned());
            match state.responses.get_mut(&key) {
                Some(queue) if queue.len() > 1 => queue
                    .pop_front()
                    .unwrap_or_else(|| Err(SyncError::Transport("empty queue".into()))),
                Some(queue) => match queue.front() {
                    Some(response) => replay(response),
                    None => Err(SyncError::Transport("empty queue".into())),
                },
                None => Err(SyncError::NotFound(format!("{base_url}/{path}"))),
            }
        }
    }
}
