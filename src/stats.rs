//! Shared engine counters.
//!
//! Both threads write disjoint counters with relaxed fetch-adds; monotonic
//! counts tolerate any ordering. The only cross-thread control signal is
//! `running`, stored with release on shutdown and polled relaxed by the
//! matcher.

use std::sync::atomic::{AtomicBool, AtomicU64};

#[repr(align(64))]
#[derive(Debug)]
pub struct EngineStats {
    /// Submissions the gateway pushed into the ring.
    pub orders_received: AtomicU64,
    /// Messages the matcher dispatched.
    pub orders_processed: AtomicU64,
    /// Quantity matched, counted once per crossing.
    pub total_fills: AtomicU64,
    /// Spurious push attempts against a full ring.
    pub ring_buffer_full_count: AtomicU64,
    /// Submissions dropped because the pool had no free slot.
    pub pool_exhausted_count: AtomicU64,
    /// Cleared (release) to ask the matcher to drain and exit.
    pub running: AtomicBool,
}

impl EngineStats {
    pub const fn new() -> Self {
        Self {
            orders_received: AtomicU64::new(0),
            orders_processed: AtomicU64::new(0),
            total_fills: AtomicU64::new(0),
            ring_buffer_full_count: AtomicU64::new(0),
            pool_exhausted_count: AtomicU64::new(0),
            running: AtomicBool::new(true),
        }
    }
}

impl Default for EngineStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;

    #[test]
    fn starts_running_with_zeroed_counters() {
        let stats = EngineStats::new();
        assert!(stats.running.load(Ordering::Relaxed));
        assert_eq!(stats.orders_processed.load(Ordering::Relaxed), 0);
        assert_eq!(stats.total_fills.load(Ordering::Relaxed), 0);
    }
}
