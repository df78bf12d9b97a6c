//! A single registry index.

use std::collections::HashMap;
use std::sync::Arc;

use eureka_cache_core::{Instance, InstanceId};

/// Instances sharing one index key, keyed by instance id.
pub type Bucket = HashMap<InstanceId, Arc<Instance>>;

/// Maps an index key (application name, VIP or SVIP) to its bucket.
///
/// Invariant: no bucket is ever empty. A bucket is created by the first
/// [`upsert`](Index::upsert) into its key and dropped by the
/// [`remove`](Index::remove) that takes out its last member.
#[derive(Debug, Clone, Default)]
pub struct Index {
    buckets: HashMap<String, Bucket>,
}

impl Index {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace `id` in the bucket for `key`, creating the bucket
    /// if absent.
    pub fn upsert(&mut self, key: &str, id: InstanceId, instance: Arc<Instance>) {
        self.buckets
            .entry(key.to_owned())
            .or_default()
            .insert(id, instance);
    }

    /// Remove `id` from the bucket for `key`, dropping the bucket if it
    /// becomes empty. Returns the removed instance.
    pub fn remove(&mut self, key: &str, id: &InstanceId) -> Option<Arc<Instance>> {
        let bucket = self.buckets.get_mut(key)?;
        let removed = bucket.remove(id);
        if bucket.is_empty() {
            self.buckets.remove(key);
        }
        removed
    }

    pub fn bucket(&self, key: &str) -> Option<&Bucket> {
        self.buckets.get(key)
    }

    pub fn get(&self, key: &str, id: &InstanceId) -> Option<&Arc<Instance>> {
        self.buckets.get(key)?.get(id)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.buckets.contains_key(key)
    }

    /// Iterate `(key, bucket)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Bucket)> {
        self.buckets.iter().map(|(k, b)| (k.as_str(), b))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.buckets.keys().map(String::as_str)
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}
