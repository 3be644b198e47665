//! Order record and ring envelope.
//!
//! An [`Order`] is exactly one cache line so a matching walk touches one
//! line per order, and so records can be copied in and out of pool slots
//! with a single aligned move.
//!
//! # Memory Layout
//!
//! | Field          | Type  | Offset | Size |
//! |----------------|-------|--------|------|
//! | id             | u64   | 0      | 8    |
//! | instrument_id  | u64   | 8      | 8    |
//! | price          | i64   | 16     | 8    |
//! | quantity       | u32   | 24     | 4    |
//! | remaining_qty  | u32   | 28     | 4    |
//! | timestamp      | u64   | 32     | 8    |
//! | side           | u8    | 40     | 1    |
//! | kind           | u8    | 41     | 1    |
//! | active         | bool  | 42     | 1    |
//! | (padding)      | -     | 43     | 1    |
//! | next           | u32   | 44     | 4    |
//!
//! 48 bytes of payload, `align(64)` pads the tail to a full line.

use crate::pool::{SlotIdx, NIL};

/// Order side (bid = buy, ask = sell).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Side {
    Bid = 0,
    Ask = 1,
}

impl Side {
    /// Returns the opposite side.
    #[inline]
    pub const fn opposite(self) -> Self {
        match self {
            Side::Bid => Side::Ask,
            Side::Ask => Side::Bid,
        }
    }
}

/// Kind of submission. `Cancel` only ever appears in the ring envelope; a
/// stored order is always `Limit` or `Market`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum OrderKind {
    #[default]
    Limit = 0,
    Market = 1,
    Cancel = 2,
}

/// A single order, sized and aligned to one cache line.
#[repr(C, align(64))]
#[derive(Clone, Copy, Debug)]
pub struct Order {
    /// Session-unique id assigned by the producer.
    pub id: u64,
    /// Carried for reporting; matching runs on the single shared book.
    pub instrument_id: u64,
    /// Fixed-point price (real price x `PRICE_MULTIPLIER`). Zero for
    /// market orders.
    pub price: i64,
    /// Original size.
    pub quantity: u32,
    /// Unfilled size; never increases while the order is live.
    pub remaining_qty: u32,
    /// Monotonic nanoseconds at submission.
    pub timestamp: u64,
    pub side: Side,
    pub kind: OrderKind,
    /// Live flag: cleared on full fill or cancel, after which matching
    /// walks skip the node without unlinking it.
    pub active: bool,
    /// Intrusive link to the next order at the same price level.
    pub next: SlotIdx,
}

const _: () = assert!(
    std::mem::size_of::<Order>() == crate::config::CACHE_LINE_SIZE,
    "Order must be exactly one cache line"
);
const _: () = assert!(
    std::mem::align_of::<Order>() == crate::config::CACHE_LINE_SIZE,
    "Order must be cache-line aligned"
);

impl Default for Order {
    fn default() -> Self {
        Self {
            id: 0,
            instrument_id: 0,
            price: 0,
            quantity: 0,
            remaining_qty: 0,
            timestamp: 0,
            side: Side::Bid,
            kind: OrderKind::Limit,
            active: false,
            next: NIL,
        }
    }
}

/// Ring envelope: what the gateway hands the matcher.
///
/// For `Limit` and `Market` the `slot` names a populated pool slot and
/// `cancel_id` is ignored; for `Cancel` the slot is `NIL` and `cancel_id`
/// names the target order.
#[derive(Clone, Copy, Debug)]
pub struct OrderMessage {
    pub kind: OrderKind,
    pub slot: SlotIdx,
    pub cancel_id: u64,
}

impl OrderMessage {
    #[inline]
    pub const fn limit(slot: SlotIdx) -> Self {
        Self {
            kind: OrderKind::Limit,
            slot,
            cancel_id: 0,
        }
    }

    #[inline]
    pub const fn market(slot: SlotIdx) -> Self {
        Self {
            kind: OrderKind::Market,
            slot,
            cancel_id: 0,
        }
    }

    #[inline]
    pub const fn cancel(order_id: u64) -> Self {
        Self {
            kind: OrderKind::Cancel,
            slot: NIL,
            cancel_id: order_id,
        }
    }
}
