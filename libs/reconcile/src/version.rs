//! Optimistic version counter for a reconciliation pass.
//!
//! The control plane rejects any mutation whose supplied version does not
//! match the stored one. Every accepted mutation bumps the stored version by
//! exactly one, so the tracker advances locally instead of re-reading after
//! each call.

/// Tracks the expected application version across sequential mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionTracker {
    current: u64,
}

impl VersionTracker {
    /// Start from the version reported by the last read.
    pub fn new(observed: u64) -> Self {
        Self { current: observed }
    }

    /// The version to supply with the next mutation.
    pub fn current(&self) -> u64 {
        self.current
    }

    /// Record a mutation the control plane accepted.
    pub fn advance(&mut self) -> u64 {
        self.current += 1;
        self.current
    }
}
