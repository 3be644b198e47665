//! Driver: wire the engine together, run one synthetic session, report.

use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use tracing::info;

use pulse_lob::config::{
    ARENA_BYTES, GATEWAY_ORDER_COUNT, MATCHER_CORE_ID, MAX_ORDERS, RING_CAPACITY,
};
use pulse_lob::{
    report, Arena, EngineStats, Gateway, Matcher, ObjectPool, Order, OrderMessage, SpscRing,
};

const GATEWAY_SEED: u64 = 42;

fn main() {
    tracing_subscriber::fmt().with_target(false).init();

    info!("pulse-lob matching engine starting");
    info!(
        arena_mb = ARENA_BYTES / (1024 * 1024),
        pool_slots = MAX_ORDERS,
        ring_capacity = RING_CAPACITY,
        matcher_core = MATCHER_CORE_ID,
        "configuration"
    );

    let arena = Arena::new(ARENA_BYTES);
    let pool = ObjectPool::<Order>::new(&arena, MAX_ORDERS);
    let ring: SpscRing<OrderMessage> = SpscRing::new(&arena, RING_CAPACITY);
    let stats = EngineStats::new();

    arena.warm_up();
    info!(
        arena_used = arena.used(),
        arena_capacity = arena.capacity(),
        "memory pre-allocated and pre-faulted"
    );

    let (tx, rx) = ring.split();
    let (acquirer, slab) = pool.split();

    let started = Instant::now();
    let matcher = std::thread::scope(|s| {
        let matcher = Matcher::new(rx, slab, &stats, MATCHER_CORE_ID);
        let matcher_thread = s.spawn(move || matcher.run());

        info!(orders = GATEWAY_ORDER_COUNT, seed = GATEWAY_SEED, "gateway starting");
        let gateway = Gateway::new(tx, acquirer, &stats, GATEWAY_ORDER_COUNT, GATEWAY_SEED);
        let gateway_thread = s.spawn(move || gateway.run());

        gateway_thread.join().expect("gateway thread panicked");

        // Give the matcher a moment to catch up, then ask it to drain.
        std::thread::sleep(Duration::from_millis(100));
        stats.running.store(false, Ordering::Release);

        matcher_thread.join().expect("matcher thread panicked")
    });
    let elapsed = started.elapsed();

    info!("run complete");
    report::print_report(&stats, elapsed, &arena, matcher.book());
}
