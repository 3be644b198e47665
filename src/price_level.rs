//! Price level - one FIFO of orders plus a cached total quantity.
//!
//! The cache is adjusted lazily: adds increase it, fills and cancels
//! decrease it, and a dead node sitting in the list never contributes. The
//! matching loop trusts the cache; `compact` restores it from an
//! authoritative walk when invoked between bursts.

use crate::order::Order;
use crate::order_list::OrderList;
use crate::pool::{Slab, SlotIdx, NIL};

#[derive(Clone, Copy, Debug)]
pub struct PriceLevel {
    price: i64,
    cached_qty: u32,
    orders: OrderList,
}

impl PriceLevel {
    #[inline]
    pub const fn new(price: i64) -> Self {
        Self {
            price,
            cached_qty: 0,
            orders: OrderList::new(),
        }
    }

    /// Queue an order at this price. O(1).
    #[inline]
    pub fn add(&mut self, slab: &mut Slab<Order>, idx: SlotIdx) {
        let qty = slab.get(idx).remaining_qty;
        self.orders.append(slab, idx);
        self.cached_qty += qty;
    }

    /// Fill up to `qty` units in price-time order; returns the filled total.
    #[inline]
    pub fn fill(&mut self, slab: &mut Slab<Order>, qty: u32) -> u32 {
        let filled = self.orders.fill(slab, qty);
        debug_assert!(filled <= self.cached_qty);
        self.cached_qty -= filled;
        filled
    }

    /// Remove resting quantity without walking the list (cancel path).
    #[inline]
    pub fn reduce_qty(&mut self, amount: u32) {
        self.cached_qty = self.cached_qty.saturating_sub(amount);
    }

    /// Unlink dead nodes and recompute the cache from the survivors.
    pub fn compact(&mut self, slab: &mut Slab<Order>) {
        self.orders.compact(slab);
        let mut total = 0u32;
        let mut cur = self.orders.head();
        while cur != NIL {
            let o = slab.get(cur);
            if o.active {
                total += o.remaining_qty;
            }
            cur = o.next;
        }
        self.cached_qty = total;
    }

    #[inline]
    pub const fn price(&self) -> i64 {
        self.price
    }

    #[inline]
    pub const fn total_qty(&self) -> u32 {
        self.cached_qty
    }

    #[inline]
    pub const fn order_count(&self) -> u32 {
        self.orders.len()
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}
