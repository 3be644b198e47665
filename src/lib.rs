//! # pulse-lob
//!
//! A single-book, price-time-priority matching engine built for a
//! sub-microsecond hot path.
//!
//! ## Design Principles
//!
//! - **Single-writer everywhere**: the matcher thread owns the book, the
//!   gateway thread owns submission; the only shared state is an SPSC ring
//!   and a block of atomic counters
//! - **Zero allocation on the hot path**: every order lives in a
//!   pre-allocated pool slab inside one arena; price levels are intrusive
//!   lists through the order records themselves
//! - **Cache-conscious layout**: 64-byte order records, 32-bit slot
//!   indices, head/tail counters on separate cache lines
//!
//! ## Architecture
//!
//! ```text
//! [Gateway Thread] --> [SPSC Ring] --> [Matcher Thread (pinned)]
//!        |                                    |
//!   [ObjectPool] <------ market-order recycle-+
//!        |                                    |
//!     [Arena]                            [OrderBook]
//! ```

pub mod arena;
pub mod config;
pub mod gateway;
pub mod matcher;
pub mod order;
pub mod order_book;
pub mod order_list;
pub mod platform;
pub mod pool;
pub mod price_level;
pub mod report;
pub mod ring;
pub mod stats;

// Re-exports for convenience
pub use arena::Arena;
pub use gateway::Gateway;
pub use matcher::Matcher;
pub use order::{Order, OrderKind, OrderMessage, Side};
pub use order_book::OrderBook;
pub use order_list::OrderList;
pub use pool::{Acquirer, ObjectPool, Slab, SlotIdx, NIL};
pub use price_level::PriceLevel;
pub use ring::{Consumer, Producer, SpscRing};
pub use stats::EngineStats;
