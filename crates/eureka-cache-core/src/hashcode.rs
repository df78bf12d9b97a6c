//! Hashcode digest.
//!
//! The server summarizes its registry as the count of instances per status,
//! statuses in lexicographic order, rendered `STATUS_COUNT_` per status:
//!
//! ```text
//! DOWN_1_STARTING_2_UP_5_
//! ```
//!
//! It is a consistency check, not a cryptographic hash. Two registries with
//! the same multiset of statuses have the same digest.

use std::collections::BTreeMap;

use crate::types::Status;

/// Separator between status name and count, and after each count.
pub const HASHCODE_DELIMITER: &str = "_";

/// Compute the digest over the statuses of a set of instances.
///
/// An empty input yields the empty string.
pub fn compute_hashcode<'a, I>(statuses: I) -> String
where
    I: IntoIterator<Item = &'a Status>,
{
    let mut counts: BTreeMap<&str, u32> = BTreeMap::new();
    for status in statuses {
        *counts.entry(status.as_str()).or_insert(0) += 1;
    }

    let mut hashcode = String::new();
    for (status, count) in counts {
        hashcode.push_str(status);
        hashcode.push_str(HASHCODE_DELIMITER);
        hashcode.push_str(&count.to_string());
        hashcode.push_str(HASHCODE_DELIMITER);
    }
    hashcode
}
