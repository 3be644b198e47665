//! Matcher - the pinned busy-spin consumer that owns the book.
//!
//! Loop shape: pop, dispatch, bump counters, repeat. No yield, no sleep, no
//! blocking call; an empty ring costs one pause hint and another poll. When
//! `running` clears, the loop drains whatever the gateway managed to push
//! and returns. Nothing on this path logs or allocates.

use std::sync::atomic::Ordering;

use crate::order::{Order, OrderKind, OrderMessage};
use crate::order_book::OrderBook;
use crate::platform;
use crate::pool::Slab;
use crate::ring::Consumer;
use crate::stats::EngineStats;

pub struct Matcher<'a> {
    rx: Consumer<'a, OrderMessage>,
    slab: Slab<'a, Order>,
    book: OrderBook,
    stats: &'a EngineStats,
    core_id: usize,
}

impl<'a> Matcher<'a> {
    pub fn new(
        rx: Consumer<'a, OrderMessage>,
        slab: Slab<'a, Order>,
        stats: &'a EngineStats,
        core_id: usize,
    ) -> Self {
        Self {
            rx,
            slab,
            book: OrderBook::new(),
            stats,
            core_id,
        }
    }

    /// Pin, then spin until shutdown; drain the ring before returning.
    /// Returns `self` so the driver can inspect the final book.
    pub fn run(mut self) -> Self {
        if !platform::pin_to_core(self.core_id) {
            tracing::warn!(core = self.core_id, "failed to pin matcher thread");
        }
        while self.stats.running.load(Ordering::Relaxed) {
            match self.rx.pop() {
                Some(msg) => {
                    self.dispatch(msg);
                    self.stats.orders_processed.fetch_add(1, Ordering::Relaxed);
                }
                None => std::hint::spin_loop(),
            }
        }
        while let Some(msg) = self.rx.pop() {
            self.dispatch(msg);
            self.stats.orders_processed.fetch_add(1, Ordering::Relaxed);
        }
        self
    }

    /// Apply one submission to the book.
    #[inline]
    pub fn dispatch(&mut self, msg: OrderMessage) {
        match msg.kind {
            OrderKind::Limit => {
                self.book.add_order(&mut self.slab, msg.slot);
                let fills = self.book.uncross(&mut self.slab);
                if fills > 0 {
                    self.stats.total_fills.fetch_add(fills, Ordering::Relaxed);
                }
            }
            OrderKind::Market => {
                let fills = self.book.match_market(&mut self.slab, msg.slot);
                self.stats.total_fills.fetch_add(fills, Ordering::Relaxed);
                // Market orders never rest; recycle the slot immediately.
                self.slab.release(msg.slot);
            }
            OrderKind::Cancel => {
                // Unknown or dead ids are silent no-ops, observable only
                // through the book's cancel counter.
                self.book.cancel(&mut self.slab, msg.cancel_id);
            }
        }
    }

    #[inline]
    pub fn book(&self) -> &OrderBook {
        &self.book
    }
}
