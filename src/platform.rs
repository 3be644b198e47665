//! Thread pinning and the monotonic clock.

use std::sync::OnceLock;
use std::time::Instant;

/// Pin the calling thread to a specific core. Returns whether the affinity
/// change took effect; on failure the engine still runs, just without the
/// cache-residency guarantee.
pub fn pin_to_core(core_id: usize) -> bool {
    core_affinity::set_for_current(core_affinity::CoreId { id: core_id })
}

static CLOCK_EPOCH: OnceLock<Instant> = OnceLock::new();

/// Monotonic nanoseconds since the first call in this process.
#[inline]
pub fn timestamp_ns() -> u64 {
    CLOCK_EPOCH.get_or_init(Instant::now).elapsed().as_nanos() as u64
}
