//! Engine tuning constants.
//!
//! Everything here is fixed at compile time; the driver binary takes no
//! flags. Power-of-two requirements are enforced below so a bad edit fails
//! the build instead of corrupting index masks at runtime.

/// Cache line width used for alignment and padding.
pub const CACHE_LINE_SIZE: usize = 64;

/// Capacity of the submission ring. Must be a power of two.
pub const RING_CAPACITY: usize = 1 << 16;

/// Total size of the memory arena backing the pool slab and ring storage.
pub const ARENA_BYTES: usize = 64 * 1024 * 1024;

/// Number of order slots in the object pool.
pub const MAX_ORDERS: u32 = 500_000;

/// Length of each flat price-level array (one per side).
pub const MAX_PRICE_LEVELS: usize = 10_000;

/// Size of the direct-mapped id -> slot table. Must be a power of two.
pub const ID_TABLE_SIZE: usize = 1 << 20;

/// Core the matcher thread is pinned to.
pub const MATCHER_CORE_ID: usize = 1;

/// Fixed-point price scale: stored price = real price * PRICE_MULTIPLIER.
pub const PRICE_MULTIPLIER: i64 = 10_000;

// ── Synthetic flow (gateway) ──

/// Center of the limit-price distribution (100.0000 in fixed-point).
pub const MID_PRICE: i64 = 1_000_000;

/// Standard deviation of the limit-price offset, in fixed-point units.
pub const PRICE_STDDEV: f64 = 5_000.0;

/// Orders the gateway submits per run.
pub const GATEWAY_ORDER_COUNT: u64 = 200_000;

/// Share of limit orders in the generated flow.
pub const LIMIT_ORDER_RATIO: f64 = 0.70;

/// Share of market orders; the remainder (to 1.0) is cancels.
pub const MARKET_ORDER_RATIO: f64 = 0.20;

/// Largest generated order quantity.
pub const MAX_ORDER_QTY: u32 = 1_000;

const _: () = assert!(RING_CAPACITY.is_power_of_two());
const _: () = assert!(ID_TABLE_SIZE.is_power_of_two());
const _: () = assert!(
    (MAX_ORDERS as usize) < ID_TABLE_SIZE,
    "id table must be larger than the order pool"
);
