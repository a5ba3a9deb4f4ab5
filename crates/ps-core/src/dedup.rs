//! Warn-once log de-duplication.
//!
//! A `WarnOnce` is owned by whoever produces the warnings (one per run), so
//! suppression never leaks across runs and there are no process-wide flags.

use std::collections::HashSet;

#[derive(Debug, Default, Clone)]
pub struct WarnOnce {
    seen: HashSet<String>,
    suppressed: usize,
}

impl WarnOnce {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` the first time `key` is seen, `false` afterwards.
    pub fn first(&mut self, key: &str) -> bool {
        if self.seen.contains(key) {
            self.suppressed += 1;
            false
        } else {
            self.seen.insert(key.to_string());
            true
        }
    }

    /// Emit `message` as a tracing warning the first time `key` is seen.
    pub fn warn(&mut self, key: &str, message: impl FnOnce() -> String) -> bool {
        let first = self.first(key);
        if first {
            tracing::warn!("{} (further occurrences suppressed)", message());
        }
        first
    }

    /// Number of distinct keys seen so far.
    pub fn distinct(&self) -> usize {
        self.seen.len()
    }

    /// Number of repeated occurrences that were swallowed.
    pub fn suppressed(&self) -> usize {
        self.suppressed
    }
}
