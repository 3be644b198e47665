//! Lock-free SPSC ring - the only channel between gateway and matcher.
//!
//! Power-of-two capacity, monotonic 64-bit head/tail counters masked into
//! slot indices, each counter on its own cache line so the producer and the
//! consumer never invalidate each other's line. Publication is a release
//! store of the owning counter; the peer observes it with an acquire load.
//! With one writer per counter there is no compare-and-swap anywhere.
//!
//! `split` hands out exactly one [`Producer`] and one [`Consumer`]; each is
//! the sole owner of its side, which is what makes the unsynchronized slot
//! accesses below sound.

use std::cell::UnsafeCell;
use std::fmt;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::arena::Arena;

/// An atomic counter padded out to a full cache line.
#[repr(align(64))]
pub(crate) struct LineAligned(pub(crate) AtomicU64);

pub struct SpscRing<T> {
    /// Next slot to read. Written by the consumer only.
    head: LineAligned,
    /// Next slot to write. Written by the producer only.
    tail: LineAligned,
    buffer: NonNull<UnsafeCell<T>>,
    capacity: u64,
    mask: u64,
    split: AtomicBool,
}

// SAFETY: the buffer is only ever accessed through the single Producer and
// single Consumer handed out by `split`; each slot is touched by exactly one
// side at a time, with the head/tail release stores ordering the handoff.
unsafe impl<T: Send> Send for SpscRing<T> {}
unsafe impl<T: Send> Sync for SpscRing<T> {}

impl<T: Copy> SpscRing<T> {
    /// Carve the slot storage out of `arena`. Capacity must be a power of
    /// two so the index mask is a single AND.
    pub fn new(arena: &Arena, capacity: usize) -> Self {
        assert!(capacity > 0 && capacity.is_power_of_two());
        let buffer = arena.alloc_array::<UnsafeCell<T>>(capacity);
        Self {
            head: LineAligned(AtomicU64::new(0)),
            tail: LineAligned(AtomicU64::new(0)),
            buffer,
            capacity: capacity as u64,
            mask: capacity as u64 - 1,
            split: AtomicBool::new(false),
        }
    }

    /// Hand out the two endpoint handles. Panics if called twice; a second
    /// producer or consumer would break the single-writer protocol.
    pub fn split(&self) -> (Producer<'_, T>, Consumer<'_, T>) {
        assert!(
            !self.split.swap(true, Ordering::AcqRel),
            "ring already split"
        );
        (Producer { ring: self }, Consumer { ring: self })
    }

    /// Number of queued items. Exact only from the owning threads; elsewhere
    /// it is a monotone snapshot good enough for reporting.
    #[inline]
    pub fn len(&self) -> usize {
        let t = self.tail.0.load(Ordering::Relaxed);
        let h = self.head.0.load(Ordering::Relaxed);
        (t - h) as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity as usize
    }

    #[inline]
    fn slot(&self, counter: u64) -> *mut T {
        // SAFETY: counter & mask < capacity, inside the arena allocation.
        unsafe { (*self.buffer.as_ptr().add((counter & self.mask) as usize)).get() }
    }
}

impl<T> fmt::Debug for SpscRing<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpscRing")
            .field("capacity", &self.capacity)
            .field("head", &self.head.0.load(Ordering::Relaxed))
            .field("tail", &self.tail.0.load(Ordering::Relaxed))
            .finish()
    }
}

/// Write side of the ring. Owned by the gateway thread.
pub struct Producer<'a, T> {
    ring: &'a SpscRing<T>,
}

impl<T: Copy> Producer<'_, T> {
    /// Push one item. Returns `false` when the ring holds `capacity` items;
    /// backpressure is the caller's problem.
    #[inline]
    pub fn push(&mut self, item: T) -> bool {
        let ring = self.ring;
        let tail = ring.tail.0.load(Ordering::Relaxed);
        // Acquire: the consumer's last read of the slot we are about to
        // overwrite must be complete before we store into it.
        let head = ring.head.0.load(Ordering::Acquire);
        if tail - head == ring.capacity {
            return false;
        }
        // SAFETY: tail - head < capacity, so this slot is not owned by the
        // consumer; we are the only producer.
        unsafe { ring.slot(tail).write(item) };
        ring.tail.0.store(tail + 1, Ordering::Release);
        true
    }
}

/// Read side of the ring. Owned by the matcher thread.
pub struct Consumer<'a, T> {
    ring: &'a SpscRing<T>,
}

impl<T: Copy> Consumer<'_, T> {
    /// Pop one item, or `None` when the ring is empty. A successful pop
    /// observes every write that preceded the matching push.
    #[inline]
    pub fn pop(&mut self) -> Option<T> {
        let ring = self.ring;
        let head = ring.head.0.load(Ordering::Relaxed);
        // Acquire: pairs with the producer's release store of tail, making
        // the slot contents visible.
        let tail = ring.tail.0.load(Ordering::Acquire);
        if head == tail {
            return None;
        }
        // SAFETY: head < tail, so the producer has published this slot and
        // will not touch it again until we advance head.
        let item = unsafe { ring.slot(head).read() };
        ring.head.0.store(head + 1, Ordering::Release);
        Some(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RING_CAPACITY;

    fn small_ring(arena: &Arena) -> SpscRing<u64> {
        SpscRing::new(arena, 8)
    }

    #[test]
    fn starts_empty() {
        let arena = Arena::new(4096);
        let ring = small_ring(&arena);
        assert!(ring.is_empty());
        assert_eq!(ring.len(), 0);
        assert_eq!(ring.capacity(), 8);
    }

    #[test]
    fn push_then_pop_round_trips_payload() {
        let arena = Arena::new(4096);
        let ring = small_ring(&arena);
        let (mut tx, mut rx) = ring.split();

        assert!(tx.push(42));
        assert!(!ring.is_empty());
        assert_eq!(rx.pop(), Some(42));
        assert_eq!(rx.pop(), None);
    }

    #[test]
    fn pop_on_empty_fails() {
        let arena = Arena::new(4096);
        let ring = small_ring(&arena);
        let (_tx, mut rx) = ring.split();
        assert_eq!(rx.pop(), None);
    }

    #[test]
    fn fifo_order_across_wraparound() {
        let arena = Arena::new(4096);
        let ring = small_ring(&arena);
        let (mut tx, mut rx) = ring.split();

        // Cycle several times past the capacity to exercise the mask.
        let mut next_expected = 0u64;
        for v in 0..100u64 {
            assert!(tx.push(v));
            if v % 3 == 2 {
                for _ in 0..3 {
                    assert_eq!(rx.pop(), Some(next_expected));
                    next_expected += 1;
                }
            }
        }
        while let Some(v) = rx.pop() {
            assert_eq!(v, next_expected);
            next_expected += 1;
        }
        assert_eq!(next_expected, 100);
    }

    #[test]
    fn full_ring_accepts_exactly_capacity_items() {
        let arena = Arena::new(2 * 1024 * 1024);
        let ring: SpscRing<u64> = SpscRing::new(&arena, RING_CAPACITY);
        let (mut tx, mut rx) = ring.split();

        for i in 0..RING_CAPACITY as u64 {
            assert!(tx.push(i), "push {} should succeed", i);
        }
        assert!(!tx.push(u64::MAX), "push past capacity must fail");
        assert_eq!(rx.pop(), Some(0), "first pop returns first payload");
    }

    #[test]
    #[should_panic(expected = "already split")]
    fn second_split_panics() {
        let arena = Arena::new(4096);
        let ring = small_ring(&arena);
        let _pair = ring.split();
        let _again = ring.split();
    }

    #[test]
    fn spsc_ordering_across_threads() {
        const COUNT: u64 = 100_000;
        let arena = Arena::new(4096);
        let ring = small_ring(&arena);
        let (mut tx, mut rx) = ring.split();

        std::thread::scope(|s| {
            s.spawn(move || {
                for v in 0..COUNT {
                    while !tx.push(v) {
                        std::hint::spin_loop();
                    }
                }
            });
            s.spawn(move || {
                let mut expected = 0u64;
                while expected < COUNT {
                    if let Some(v) = rx.pop() {
                        assert_eq!(v, expected);
                        expected += 1;
                    } else {
                        std::hint::spin_loop();
                    }
                }
            });
        });
    }
}
