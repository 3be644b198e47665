//! Order book - flat price-level arrays with price-time matching.
//!
//! Price resolution is one level per whole price point: level `i` carries
//! fixed-point price `i * PRICE_MULTIPLIER`, and an incoming price is
//! quantized by integer division and clamped into the table. Finer ticks
//! that land on the same level trade as one price; the producer is expected
//! not to emit prices that need finer resolution.
//!
//! Cancels are O(1) through a direct-mapped id table of pool slot indices.
//! The table is overwrite-on-add: an old live order whose id hashes to the
//! same slot as a newer one loses its cancel-by-id affordance, a documented
//! trade for branch-free lookup.

use crate::config::{ID_TABLE_SIZE, MAX_PRICE_LEVELS, PRICE_MULTIPLIER};
use crate::order::{Order, Side};
use crate::pool::{Slab, SlotIdx, NIL};
use crate::price_level::PriceLevel;

/// Quantize a fixed-point price onto the level grid.
#[inline]
pub fn level_index(price: i64) -> usize {
    (price / PRICE_MULTIPLIER).clamp(0, MAX_PRICE_LEVELS as i64 - 1) as usize
}

pub struct OrderBook {
    bids: Box<[PriceLevel]>,
    asks: Box<[PriceLevel]>,
    /// Direct-mapped id -> slot table; `NIL` marks an empty entry.
    id_table: Box<[SlotIdx]>,
    /// Highest bid level with resting quantity, best effort during sweeps.
    best_bid: Option<usize>,
    /// Lowest ask level with resting quantity, best effort during sweeps.
    best_ask: Option<usize>,
    match_count: u64,
    cancel_count: u64,
}

impl OrderBook {
    pub fn new() -> Self {
        fn grid() -> Box<[PriceLevel]> {
            (0..MAX_PRICE_LEVELS)
                .map(|i| PriceLevel::new(i as i64 * PRICE_MULTIPLIER))
                .collect()
        }
        Self {
            bids: grid(),
            asks: grid(),
            id_table: vec![NIL; ID_TABLE_SIZE].into_boxed_slice(),
            best_bid: None,
            best_ask: None,
            match_count: 0,
            cancel_count: 0,
        }
    }

    // ── Order entry ──

    /// Rest a limit order: activate, register for cancel, queue at its
    /// level, and pull the best index toward it. O(1).
    pub fn add_order(&mut self, slab: &mut Slab<Order>, idx: SlotIdx) {
        let (id, side, price) = {
            let o = slab.get_mut(idx);
            o.active = true;
            (o.id, o.side, o.price)
        };
        let li = level_index(price);
        self.id_table[(id & (ID_TABLE_SIZE as u64 - 1)) as usize] = idx;
        match side {
            Side::Bid => {
                self.bids[li].add(slab, idx);
                self.best_bid = Some(self.best_bid.map_or(li, |b| b.max(li)));
            }
            Side::Ask => {
                self.asks[li].add(slab, idx);
                self.best_ask = Some(self.best_ask.map_or(li, |a| a.min(li)));
            }
        }
    }

    /// Cancel by id. O(1): validate the table entry, deduct the resting
    /// quantity from its level, deactivate in place. Returns whether a
    /// cancel took effect.
    pub fn cancel(&mut self, slab: &mut Slab<Order>, order_id: u64) -> bool {
        let entry = (order_id & (ID_TABLE_SIZE as u64 - 1)) as usize;
        let idx = self.id_table[entry];
        if idx == NIL {
            return false;
        }
        let (id, active, side, price, remaining) = {
            let o = slab.get(idx);
            (o.id, o.active, o.side, o.price, o.remaining_qty)
        };
        if id != order_id || !active {
            return false;
        }
        let li = level_index(price);
        match side {
            Side::Bid => self.bids[li].reduce_qty(remaining),
            Side::Ask => self.asks[li].reduce_qty(remaining),
        }
        let o = slab.get_mut(idx);
        o.active = false;
        o.remaining_qty = 0;
        self.id_table[entry] = NIL;
        self.cancel_count += 1;
        true
    }

    // ── Matching ──

    /// Sweep the crossed region after a limit add: while the best bid price
    /// is at or above the best ask price, fill the smaller side and walk the
    /// best indices inward. Returns the total quantity filled (counted once
    /// per crossing, not once per side).
    pub fn uncross(&mut self, slab: &mut Slab<Order>) -> u64 {
        let mut total = 0u64;
        loop {
            let (Some(bi), Some(ai)) = (self.best_bid, self.best_ask) else {
                break;
            };
            if self.bids[bi].price() < self.asks[ai].price() {
                break;
            }
            // Stale best indices: step past drained levels first.
            if self.bids[bi].total_qty() == 0 {
                self.best_bid = bi.checked_sub(1);
                continue;
            }
            if self.asks[ai].total_qty() == 0 {
                self.best_ask = next_ask_level(ai);
                continue;
            }
            let qty = self.bids[bi].total_qty().min(self.asks[ai].total_qty());
            self.bids[bi].fill(slab, qty);
            self.asks[ai].fill(slab, qty);
            total += qty as u64;
            self.match_count += 1;
            if self.bids[bi].total_qty() == 0 {
                self.best_bid = bi.checked_sub(1);
            }
            if self.asks[ai].total_qty() == 0 {
                self.best_ask = next_ask_level(ai);
            }
        }
        total
    }

    /// Fill a market order against the opposite side, best price outward,
    /// until it is satisfied or depth runs out. The order's remaining
    /// quantity is left on the record; the caller discards the remainder.
    pub fn match_market(&mut self, slab: &mut Slab<Order>, idx: SlotIdx) -> u64 {
        let side = slab.get(idx).side;
        let mut filled = 0u64;
        match side {
            Side::Bid => {
                let Some(start) = self.best_ask else {
                    return 0;
                };
                let mut i = start;
                while i < MAX_PRICE_LEVELS {
                    let want = slab.get(idx).remaining_qty;
                    if want == 0 {
                        break;
                    }
                    let got = self.asks[i].fill(slab, want);
                    slab.get_mut(idx).remaining_qty -= got;
                    filled += got as u64;
                    if self.asks[i].total_qty() == 0 && self.best_ask == Some(i) {
                        self.best_ask = next_ask_level(i);
                    }
                    i += 1;
                }
            }
            Side::Ask => {
                let Some(start) = self.best_bid else {
                    return 0;
                };
                let mut i = start;
                loop {
                    let want = slab.get(idx).remaining_qty;
                    if want == 0 {
                        break;
                    }
                    let got = self.bids[i].fill(slab, want);
                    slab.get_mut(idx).remaining_qty -= got;
                    filled += got as u64;
                    if self.bids[i].total_qty() == 0 && self.best_bid == Some(i) {
                        self.best_bid = i.checked_sub(1);
                    }
                    if i == 0 {
                        break;
                    }
                    i -= 1;
                }
            }
        }
        if filled > 0 {
            self.match_count += 1;
        }
        filled
    }

    /// Unlink dead nodes on every populated level and rebuild the caches.
    /// O(levels + orders); maintenance only, never on the matching path.
    pub fn compact(&mut self, slab: &mut Slab<Order>) {
        for level in self.bids.iter_mut().chain(self.asks.iter_mut()) {
            if !level.is_empty() {
                level.compact(slab);
            }
        }
    }

    // ── Observation ──

    #[inline]
    pub fn best_bid_price(&self) -> Option<i64> {
        self.best_bid.map(|i| self.bids[i].price())
    }

    #[inline]
    pub fn best_ask_price(&self) -> Option<i64> {
        self.best_ask.map(|i| self.asks[i].price())
    }

    #[inline]
    pub fn bid_level(&self, idx: usize) -> &PriceLevel {
        &self.bids[idx]
    }

    #[inline]
    pub fn ask_level(&self, idx: usize) -> &PriceLevel {
        &self.asks[idx]
    }

    /// Resting quantity summed over every level of one side. O(levels);
    /// reporting and test accounting only.
    pub fn side_depth(&self, side: Side) -> u64 {
        let levels = match side {
            Side::Bid => &self.bids,
            Side::Ask => &self.asks,
        };
        levels.iter().map(|l| l.total_qty() as u64).sum()
    }

    #[inline]
    pub fn match_count(&self) -> u64 {
        self.match_count
    }

    #[inline]
    pub fn cancel_count(&self) -> u64 {
        self.cancel_count
    }
}

impl Default for OrderBook {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for OrderBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderBook")
            .field("best_bid", &self.best_bid_price())
            .field("best_ask", &self.best_ask_price())
            .field("match_count", &self.match_count)
            .field("cancel_count", &self.cancel_count)
            .finish()
    }
}

/// Step an ask-side index upward, falling off the grid into `None`.
#[inline]
fn next_ask_level(i: usize) -> Option<usize> {
    if i + 1 < MAX_PRICE_LEVELS {
        Some(i + 1)
    } else {
        None
    }
}
