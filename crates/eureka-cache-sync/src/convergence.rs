//! Convergence verification after applying a delta.
//!
//! The server reports a status-count digest alongside every delta. After
//! applying the delta to a local copy, the digest of that copy must match
//! the server's, or the copy has drifted (missed or reordered records) and
//! must be discarded in favor of a full fetch.

use eureka_cache_registry::RegistrySnapshot;

/// Result of comparing a local snapshot against the server digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConvergenceResult {
    /// Local and remote digests match.
    Converged,
    /// Digests differ.
    Diverged { local: String, remote: String },
}

impl ConvergenceResult {
    pub fn is_converged(&self) -> bool {
        matches!(self, ConvergenceResult::Converged)
    }
}

/// Compare the digest of `snapshot` with the server-reported `remote`.
///
/// A missing remote digest is compared as the empty string, which only an
/// empty snapshot produces.
pub fn verify_hashcode(snapshot: &RegistrySnapshot, remote: Option<&str>) -> ConvergenceResult {
    let local = snapshot.hashcode();
    let remote = remote.unwrap_or_default();

    if local == remote {
        ConvergenceResult::Converged
    } else {
        ConvergenceResult::Diverged {
            local,
            remote: remote.to_owned(),
        }
    }
}
