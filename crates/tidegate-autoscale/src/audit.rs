//! Bounded audit trail of decisions.
//!
//! Fixed-capacity ring: appends past capacity evict the oldest entry.

use std::collections::VecDeque;

use tidegate_core::Decision;

/// Number of decisions kept by default.
pub const AUDIT_CAPACITY: usize = 500;

#[derive(Debug, Clone)]
pub struct AuditLog {
    entries: VecDeque<Decision>,
    capacity: usize,
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::with_capacity(AUDIT_CAPACITY)
    }
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A log holding at most `capacity` entries (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn append(&mut self, decision: Decision) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(decision);
    }

    /// Copy of the retained entries, oldest first.
    pub fn snapshot(&self) -> Vec<Decision> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hold(n: i32) -> Decision {
        Decision::hold(n, format!("tick-{n}"), String::new())
    }

    #[test]
    fn keeps_insertion_order() {
        let mut log = AuditLog::new();
        log.append(hold(1));
        log.append(hold(2));
        log.append(hold(3));

        let reasons: Vec<_> = log.snapshot().into_iter().map(|d| d.reason).collect();
        assert_eq!(reasons, ["tick-1", "tick-2", "tick-3"]);
    }

    #[test]
    fn bounded_to_most_recent_entries() {
        let mut log = AuditLog::new();
        for i in 0..750 {
            log.append(hold(i));
        }

        assert_eq!(log.len(), AUDIT_CAPACITY);
        let kept = log.snapshot();
        assert_eq!(kept.first().map(|d| d.from), Some(250));
        assert_eq!(kept.last().map(|d| d.from), Some(749));
        assert!(kept.windows(2).all(|w| w[0].from + 1 == w[1].from));
    }

    #[test]
    fn exactly_at_capacity_evicts_nothing() {
        let mut log = AuditLog::with_capacity(3);
        log.append(hold(0));
        log.append(hold(1));
        log.append(hold(2));
        assert_eq!(log.snapshot()[0].from, 0);

        log.append(hold(3));
        assert_eq!(log.len(), 3);
        assert_eq!(log.snapshot()[0].from, 1);
    }

    #[test]
    fn snapshot_is_a_copy() {
        let mut log = AuditLog::new();
        log.append(hold(1));
        let before = log.snapshot();
        log.append(hold(2));
        assert_eq!(before.len(), 1);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn zero_capacity_clamped() {
        let mut log = AuditLog::with_capacity(0);
        log.append(hold(1));
        log.append(hold(2));
        assert_eq!(log.len(), 1);
        assert_eq!(log.snapshot()[0].from, 2);
        assert!(!log.is_empty());
    }
}
