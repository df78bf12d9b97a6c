//! Proptest generators for property-based testing.

use std::sync::Arc;

use proptest::prelude::*;

use eureka_cache_core::{Instance, InstanceId, Status};
use eureka_cache_registry::{Index, RegistrySnapshot};

/// Generate a status, including one the client has never heard of.
pub fn status() -> impl Strategy<Value = Status> {
    prop_oneof![
        Just(Status::Up),
        Just(Status::Down),
        Just(Status::Starting),
        Just(Status::OutOfService),
        Just(Status::Unknown),
        Just(Status::Other("DRAINING".to_owned())),
    ]
}

/// Generate a grouping key from a small alphabet, or no key at all.
///
/// The alphabet is kept small so that generated instances collide in
/// buckets.
pub fn grouping_key(prefix: &'static str) -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        1 => Just(None),
        1 => Just(Some(String::new())),
        4 => (0u8..3).prop_map(move |n| Some(format!("{prefix}{n}"))),
    ]
}

/// Generate an instance id from a small alphabet.
pub fn instance_id() -> impl Strategy<Value = InstanceId> {
    (0u8..8).prop_map(|n| InstanceId::new(format!("i-{n}")))
}

/// Parameters for generating an instance.
#[derive(Debug, Clone)]
pub struct InstanceParams {
    pub id: InstanceId,
    pub app: Option<String>,
    pub vip: Option<String>,
    pub svip: Option<String>,
    pub status: Status,
}

impl Arbitrary for InstanceParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            instance_id(),
            grouping_key("app-"),
            grouping_key("vip-"),
            grouping_key("svip-"),
            status(),
        )
            .prop_map(|(id, app, vip, svip, status)| InstanceParams {
                id,
                app,
                vip,
                svip,
                status,
            })
            .boxed()
    }
}

impl InstanceParams {
    pub fn instance(&self) -> Instance {
        Instance {
            instance_id: Some(self.id.as_str().to_owned()),
            app: self.app.clone(),
            vip_address: self.vip.clone(),
            secure_vip_address: self.svip.clone(),
            status: self.status.clone(),
            ..Default::default()
        }
    }

    /// The application name the instance is grouped under in a payload.
    pub fn grouping_app(&self) -> &str {
        self.app.as_deref().unwrap_or("")
    }
}

/// A mutation of a registry snapshot.
#[derive(Debug, Clone)]
pub enum Op {
    Add(InstanceParams),
    Update(InstanceParams),
    Delete(InstanceId),
}

impl Op {
    pub fn apply(&self, snapshot: &mut RegistrySnapshot) {
        match self {
            Op::Add(p) => snapshot.add(p.id.clone(), Arc::new(p.instance()), p.grouping_app()),
            Op::Update(p) => {
                snapshot.update(p.id.clone(), Arc::new(p.instance()), p.grouping_app())
            }
            Op::Delete(id) => {
                snapshot.delete(id);
            }
        }
    }
}

/// Generate a registry mutation.
pub fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => any::<InstanceParams>().prop_map(Op::Add),
        2 => any::<InstanceParams>().prop_map(Op::Update),
        2 => instance_id().prop_map(Op::Delete),
    ]
}

/// Generate a sequence of registry mutations.
pub fn ops(max_len: usize) -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(op(), 0..=max_len)
}

/// Generate up to `max_len` instances with pairwise distinct ids.
pub fn distinct_instances(max_len: usize) -> impl Strategy<Value = Vec<InstanceParams>> {
    prop::collection::vec(any::<InstanceParams>(), 0..=max_len).prop_map(|params| {
        let mut seen = std::collections::HashSet::new();
        params
            .into_iter()
            .filter(|p| seen.insert(p.id.clone()))
            .collect()
    })
}

/// Replay `ops` onto an empty snapshot.
pub fn snapshot_from_ops(ops: &[Op]) -> RegistrySnapshot {
    let mut snapshot = RegistrySnapshot::new();
    for op in ops {
        op.apply(&mut snapshot);
    }
    snapshot
}

/// Ordered, comparable dump of an index: key -> id -> instance.
pub fn index_contents(
    index: &Index,
) -> std::collections::BTreeMap<String, std::collections::BTreeMap<InstanceId, Instance>> {
    index
        .iter()
        .map(|(key, bucket)| {
            let bucket = bucket
                .iter()
                .map(|(id, inst)| (id.clone(), Instance::clone(inst)))
                .collect();
            (key.to_owned(), bucket)
        })
        .collect()
}
