//! Determinism - identical seeds must produce identical sessions.
//!
//! The gateway stream is a pure function of its seed, and the matcher
//! applies it in arrival order, so every counter and the final book shape
//! must agree across runs regardless of thread interleaving. The pool is
//! sized so no submission is ever dropped, which removes the one source of
//! timing sensitivity.

use std::sync::atomic::Ordering;
use std::time::Duration;

use pulse_lob::{
    Arena, EngineStats, Gateway, Matcher, ObjectPool, Order, OrderMessage, Side, SpscRing,
};

#[derive(Debug, PartialEq, Eq)]
struct SessionDigest {
    received: u64,
    processed: u64,
    fills: u64,
    matches: u64,
    cancels: u64,
    bid_depth: u64,
    ask_depth: u64,
    best_bid: Option<i64>,
    best_ask: Option<i64>,
}

fn run_session(seed: u64, orders: u64) -> SessionDigest {
    let arena = Arena::new(16 * 1024 * 1024);
    let pool = ObjectPool::<Order>::new(&arena, 65_536);
    let ring: SpscRing<OrderMessage> = SpscRing::new(&arena, 4096);
    let stats = EngineStats::new();
    let (tx, rx) = ring.split();
    let (acq, slab) = pool.split();

    std::thread::scope(|s| {
        let matcher = Matcher::new(rx, slab, &stats, 0);
        let handle = s.spawn(|| matcher.run());

        Gateway::new(tx, acq, &stats, orders, seed).run();

        std::thread::sleep(Duration::from_millis(50));
        stats.running.store(false, Ordering::Release);
        let matcher = handle.join().unwrap();

        let book = matcher.book();
        SessionDigest {
            received: stats.orders_received.load(Ordering::Relaxed),
            processed: stats.orders_processed.load(Ordering::Relaxed),
            fills: stats.total_fills.load(Ordering::Relaxed),
            matches: book.match_count(),
            cancels: book.cancel_count(),
            bid_depth: book.side_depth(Side::Bid),
            ask_depth: book.side_depth(Side::Ask),
            best_bid: book.best_bid_price(),
            best_ask: book.best_ask_price(),
        }
    })
}

#[test]
fn same_seed_same_session() {
    let first = run_session(0xDEAD_BEEF, 10_000);
    for _ in 0..3 {
        let again = run_session(0xDEAD_BEEF, 10_000);
        assert_eq!(again, first);
    }
}

#[test]
fn different_seeds_diverge() {
    let a = run_session(1, 5_000);
    let b = run_session(2, 5_000);
    assert_ne!(a, b);
}

#[test]
fn session_processes_everything_it_accepts() {
    let digest = run_session(0xCAFE_BABE, 10_000);
    assert_eq!(digest.received, digest.processed);
    assert_eq!(digest.received, 10_000);
}
