//! Gateway - the synthetic order producer.
//!
//! One possible implementation of the producer contract: acquire a slot,
//! populate it, publish the envelope, and never touch the slot again. The
//! flow mix is 70% limit / 20% market / 10% cancel, with limit prices
//! normally distributed around the mid and cancel targets drawn from
//! already-issued ids. A seeded ChaCha stream makes a run reproducible.
//!
//! Backpressure: a full ring is retried after yielding to the scheduler
//! (counted); an exhausted pool drops the submission (counted). Both keep
//! the matcher making forward progress.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rand_distr::Normal;
use std::sync::atomic::Ordering;

use crate::config::{
    LIMIT_ORDER_RATIO, MARKET_ORDER_RATIO, MAX_ORDER_QTY, MID_PRICE, PRICE_STDDEV,
};
use crate::order::{Order, OrderKind, OrderMessage, Side};
use crate::platform;
use crate::pool::{Acquirer, SlotIdx};
use crate::ring::Producer;
use crate::stats::EngineStats;

pub struct Gateway<'a> {
    tx: Producer<'a, OrderMessage>,
    pool: Acquirer<'a, Order>,
    stats: &'a EngineStats,
    total_orders: u64,
    rng: ChaCha8Rng,
    price_offset: Normal<f64>,
}

impl<'a> Gateway<'a> {
    pub fn new(
        tx: Producer<'a, OrderMessage>,
        pool: Acquirer<'a, Order>,
        stats: &'a EngineStats,
        total_orders: u64,
        seed: u64,
    ) -> Self {
        Self {
            tx,
            pool,
            stats,
            total_orders,
            rng: ChaCha8Rng::seed_from_u64(seed),
            price_offset: Normal::new(0.0, PRICE_STDDEV).expect("valid price stddev"),
        }
    }

    /// Generate and publish the configured number of submissions.
    pub fn run(mut self) {
        let mut next_id: u64 = 1;
        for _ in 0..self.total_orders {
            if !self.stats.running.load(Ordering::Relaxed) {
                break;
            }
            let roll: f64 = self.rng.gen();
            let msg = if roll < LIMIT_ORDER_RATIO {
                match self.build_order(next_id, OrderKind::Limit) {
                    Some(slot) => {
                        next_id += 1;
                        OrderMessage::limit(slot)
                    }
                    None => continue,
                }
            } else if roll < LIMIT_ORDER_RATIO + MARKET_ORDER_RATIO {
                match self.build_order(next_id, OrderKind::Market) {
                    Some(slot) => {
                        next_id += 1;
                        OrderMessage::market(slot)
                    }
                    None => continue,
                }
            } else {
                OrderMessage::cancel(self.cancel_target(next_id))
            };

            while !self.tx.push(msg) {
                self.stats
                    .ring_buffer_full_count
                    .fetch_add(1, Ordering::Relaxed);
                std::thread::yield_now();
            }
            self.stats.orders_received.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Acquire and populate a slot; `None` (counted) when the pool is dry.
    fn build_order(&mut self, id: u64, kind: OrderKind) -> Option<SlotIdx> {
        let Some(slot) = self.pool.acquire() else {
            self.stats
                .pool_exhausted_count
                .fetch_add(1, Ordering::Relaxed);
            return None;
        };
        let price = match kind {
            OrderKind::Limit => {
                let offset = self.rng.sample(self.price_offset) as i64;
                (MID_PRICE + offset).max(1)
            }
            _ => 0,
        };
        let side = if self.rng.gen_bool(0.5) {
            Side::Bid
        } else {
            Side::Ask
        };
        let qty = self.rng.gen_range(1..=MAX_ORDER_QTY);
        let instrument_id = self.rng.gen_range(0..100);

        let o = self.pool.get_mut(slot);
        o.id = id;
        o.instrument_id = instrument_id;
        o.price = price;
        o.quantity = qty;
        o.remaining_qty = qty;
        o.timestamp = platform::timestamp_ns();
        o.side = side;
        o.kind = kind;
        o.active = true;
        Some(slot)
    }

    /// Pick a previously issued id to cancel, or 1 before any were issued.
    fn cancel_target(&mut self, next_id: u64) -> u64 {
        if next_id <= 1 {
            1
        } else {
            self.rng.gen_range(1..next_id)
        }
    }
}
