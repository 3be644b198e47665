//! The hot path must never touch the heap allocator.
//!
//! Everything is set up first (arena, pool, book - those may allocate),
//! then the submission/match/cancel sequence runs under `assert_no_alloc`,
//! which aborts the test on any allocator call.

use assert_no_alloc::{assert_no_alloc, AllocDisabler};

use pulse_lob::config::MID_PRICE;
use pulse_lob::{Arena, ObjectPool, Order, OrderBook, OrderKind, Side};

#[global_allocator]
static ALLOC: AllocDisabler = AllocDisabler;

#[test]
fn submission_matching_and_cancel_are_allocation_free() {
    let arena = Arena::new(16 * 1024 * 1024);
    let pool = ObjectPool::<Order>::new(&arena, 16_384);
    let (mut acq, mut slab) = pool.split();
    let mut book = OrderBook::new();

    let used_before = arena.used();
    assert_no_alloc(|| {
        // Deep one-sided book: 5000 asks on a single level.
        for id in 1..=5_000u64 {
            let slot = acq.acquire().unwrap();
            let o = acq.get_mut(slot);
            o.id = id;
            o.side = Side::Ask;
            o.kind = OrderKind::Limit;
            o.price = MID_PRICE;
            o.quantity = 1;
            o.remaining_qty = 1;
            o.active = true;
            book.add_order(&mut slab, slot);
        }

        // Cross part of it, cancel some of the rest.
        let slot = acq.acquire().unwrap();
        let o = acq.get_mut(slot);
        o.id = 10_001;
        o.side = Side::Bid;
        o.kind = OrderKind::Limit;
        o.price = MID_PRICE;
        o.quantity = 2_000;
        o.remaining_qty = 2_000;
        o.active = true;
        book.add_order(&mut slab, slot);
        book.uncross(&mut slab);

        for id in 3_000..4_000u64 {
            book.cancel(&mut slab, id);
        }
        book.compact(&mut slab);
    });

    assert_eq!(arena.used(), used_before, "arena does not grow either");
    assert_eq!(book.ask_level(100).total_qty(), 2_000);
}
