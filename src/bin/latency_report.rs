//! Per-operation latency percentiles over the synchronous dispatch path.
//!
//! Drives the matcher directly (no ring hop, no second thread) so the
//! histogram captures book work alone: add, cross, cancel.

use hdrhistogram::Histogram;
use std::time::Instant;

use pulse_lob::config::{ARENA_BYTES, MATCHER_CORE_ID, MAX_ORDERS, MID_PRICE, RING_CAPACITY};
use pulse_lob::{
    Arena, EngineStats, Matcher, ObjectPool, Order, OrderKind, OrderMessage, Side, SpscRing,
};

// Limit slots are never recycled, so the op count stays inside the pool.
const WARMUP_OPS: u64 = 10_000;
const MEASURED_OPS: u64 = 400_000;

fn main() {
    println!("preparing latency run...");

    let arena = Arena::new(ARENA_BYTES);
    let pool = ObjectPool::<Order>::new(&arena, MAX_ORDERS);
    let ring: SpscRing<OrderMessage> = SpscRing::new(&arena, RING_CAPACITY);
    let stats = EngineStats::new();
    arena.warm_up();

    let (_tx, rx) = ring.split();
    let (mut acq, slab) = pool.split();
    let mut matcher = Matcher::new(rx, slab, &stats, MATCHER_CORE_ID);

    let mut histogram = Histogram::<u64>::new_with_bounds(1, 10_000_000, 3).unwrap();

    // Alternating near-mid bids and asks: a mix of resting adds and
    // crossings, with a cancel every eighth op.
    let mut submit = |op: u64, record: bool| {
        let id = op + 1;
        let msg = if op % 8 == 7 {
            OrderMessage::cancel(id.saturating_sub(4))
        } else {
            let Some(slot) = acq.acquire() else { return };
            let o = acq.get_mut(slot);
            o.id = id;
            o.side = if op % 2 == 0 { Side::Bid } else { Side::Ask };
            o.kind = OrderKind::Limit;
            o.price = MID_PRICE + ((op % 100) as i64 - 50) * 10_000;
            o.quantity = 10;
            o.remaining_qty = 10;
            o.active = true;
            OrderMessage::limit(slot)
        };
        if record {
            let start = Instant::now();
            std::hint::black_box(matcher.dispatch(msg));
            histogram
                .record(start.elapsed().as_nanos() as u64)
                .unwrap_or(());
        } else {
            std::hint::black_box(matcher.dispatch(msg));
        }
    };

    println!("warming up ({} ops)...", WARMUP_OPS);
    for op in 0..WARMUP_OPS {
        submit(op, false);
    }

    println!("measuring {} ops...", MEASURED_OPS);
    let run_start = Instant::now();
    for op in WARMUP_OPS..WARMUP_OPS + MEASURED_OPS {
        submit(op, true);
    }
    let total = run_start.elapsed();

    println!();
    println!("=== dispatch latency (ns) ===");
    println!("ops:        {}", MEASURED_OPS);
    println!(
        "throughput: {:.0} ops/s",
        MEASURED_OPS as f64 / total.as_secs_f64()
    );
    println!("-----------------------------");
    println!("min:    {:>8}", histogram.min());
    println!("p50:    {:>8}", histogram.value_at_quantile(0.50));
    println!("p90:    {:>8}", histogram.value_at_quantile(0.90));
    println!("p99:    {:>8}", histogram.value_at_quantile(0.99));
    println!("p99.9:  {:>8}", histogram.value_at_quantile(0.999));
    println!("max:    {:>8}", histogram.max());
}
