//! Object pool - fixed-capacity slot recycler over an arena slab.
//!
//! Slots are addressed by `u32` index rather than pointer: half the width,
//! trivially serializable into the ring envelope, and stable for the whole
//! session, so an id -> slot mapping taken at acquire time stays valid.
//!
//! Two threads share the pool with disjoint roles. The gateway acquires
//! fresh slots and fills them in; the matcher owns every published slot and
//! recycles market orders when it is done with them. The free list is
//! therefore an SPSC index queue: the matcher pushes released indices at one
//! end, the gateway pops at the other, and the release/acquire pair on the
//! queue counters orders the slot handoff so a recycled slot's old contents
//! are never observed.
//!
//! [`ObjectPool::split`] hands out one [`Acquirer`] (gateway side) and one
//! [`Slab`] (matcher side); each is the unique owner of its role.

use std::cell::UnsafeCell;
use std::fmt;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::arena::Arena;
use crate::ring::LineAligned;

/// Index of a slot in the pool slab.
pub type SlotIdx = u32;

/// Sentinel for "no slot", used both by the free list and by intrusive
/// links threaded through pooled records.
pub const NIL: SlotIdx = SlotIdx::MAX;

pub struct ObjectPool<T> {
    slots: NonNull<UnsafeCell<T>>,
    capacity: u32,
    /// Free-queue read position. Written by the acquire side only.
    free_head: LineAligned,
    /// Free-queue write position. Written by the release side only.
    free_tail: LineAligned,
    free: NonNull<UnsafeCell<SlotIdx>>,
    free_mask: u64,
    split: AtomicBool,
}

// SAFETY: slot contents are accessed only by the side that currently owns
// the slot (acquired-but-unpublished: Acquirer; published: Slab), and
// ownership moves between threads only through the free queue and the
// message ring, both of which publish with release/acquire.
unsafe impl<T: Send> Send for ObjectPool<T> {}
unsafe impl<T: Send> Sync for ObjectPool<T> {}

impl<T: Copy + Default> ObjectPool<T> {
    /// Carve the slab and the free queue out of `arena` and mark every slot
    /// free. Capacity must leave room for the `NIL` sentinel.
    pub fn new(arena: &Arena, capacity: u32) -> Self {
        assert!(capacity > 0 && capacity < NIL);
        let slots = arena.alloc_array::<UnsafeCell<T>>(capacity as usize);
        let free_len = (capacity as usize).next_power_of_two();
        let free = arena.alloc_array::<UnsafeCell<SlotIdx>>(free_len);
        for i in 0..capacity {
            // SAFETY: i < free_len; sole owner during construction.
            unsafe { (*free.as_ptr().add(i as usize)).get().write(i) };
        }
        Self {
            slots,
            capacity,
            free_head: LineAligned(AtomicU64::new(0)),
            free_tail: LineAligned(AtomicU64::new(capacity as u64)),
            free,
            free_mask: free_len as u64 - 1,
            split: AtomicBool::new(false),
        }
    }

    /// Hand out the two role handles. Panics if called twice.
    pub fn split(&self) -> (Acquirer<'_, T>, Slab<'_, T>) {
        assert!(
            !self.split.swap(true, Ordering::AcqRel),
            "pool already split"
        );
        (Acquirer { pool: self }, Slab { pool: self })
    }

    /// Slots currently on the free queue.
    #[inline]
    pub fn available(&self) -> u32 {
        let t = self.free_tail.0.load(Ordering::Relaxed);
        let h = self.free_head.0.load(Ordering::Relaxed);
        (t - h) as u32
    }

    /// Slots handed out and not yet released.
    #[inline]
    pub fn in_use(&self) -> u32 {
        self.capacity - self.available()
    }

    #[inline]
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    #[inline]
    fn slot_ptr(&self, idx: SlotIdx) -> *mut T {
        debug_assert!(idx < self.capacity);
        // SAFETY: idx < capacity, inside the slab allocation.
        unsafe { (*self.slots.as_ptr().add(idx as usize)).get() }
    }

    #[inline]
    fn free_slot(&self, counter: u64) -> *mut SlotIdx {
        // SAFETY: counter & mask is within the free queue allocation.
        unsafe { (*self.free.as_ptr().add((counter & self.free_mask) as usize)).get() }
    }
}

impl<T> fmt::Debug for ObjectPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectPool")
            .field("capacity", &self.capacity)
            .field("free_head", &self.free_head.0.load(Ordering::Relaxed))
            .field("free_tail", &self.free_tail.0.load(Ordering::Relaxed))
            .finish()
    }
}

/// Acquire side of the pool. Owned by the gateway thread.
///
/// Between `acquire` and publication through the ring the gateway is the
/// unique owner of the slot and may fill it through `get_mut`; after
/// publication it must not touch the slot again.
pub struct Acquirer<'a, T> {
    pool: &'a ObjectPool<T>,
}

impl<T: Copy + Default> Acquirer<'_, T> {
    /// Pop a free slot, reset to the default record. `None` when the pool
    /// is exhausted; the caller decides whether to drop or retry.
    #[inline]
    pub fn acquire(&mut self) -> Option<SlotIdx> {
        let pool = self.pool;
        let head = pool.free_head.0.load(Ordering::Relaxed);
        // Acquire: pairs with the release in `Slab::release`, so the old
        // owner's last writes to the slot happened before we reset it.
        let tail = pool.free_tail.0.load(Ordering::Acquire);
        if head == tail {
            return None;
        }
        // SAFETY: head < tail, so this queue entry was published; we are the
        // only consumer of the free queue.
        let idx = unsafe { pool.free_slot(head).read() };
        pool.free_head.0.store(head + 1, Ordering::Release);
        // SAFETY: we just took ownership of `idx` off the free queue.
        unsafe { pool.slot_ptr(idx).write(T::default()) };
        Some(idx)
    }

    /// Mutable access to a slot this handle acquired and has not yet
    /// published.
    #[inline]
    pub fn get_mut(&mut self, idx: SlotIdx) -> &mut T {
        // SAFETY: the acquire-side protocol guarantees exclusive ownership
        // of unpublished slots; `slot_ptr` bounds-checks in debug builds.
        unsafe { &mut *self.pool.slot_ptr(idx) }
    }
}

/// Matcher-side view of the slab: read and mutate published slots, release
/// the ones that are done.
pub struct Slab<'a, T> {
    pool: &'a ObjectPool<T>,
}

impl<T: Copy + Default> Slab<'_, T> {
    #[inline]
    pub fn get(&self, idx: SlotIdx) -> &T {
        // SAFETY: published slots belong to this side until released.
        unsafe { &*self.pool.slot_ptr(idx) }
    }

    #[inline]
    pub fn get_mut(&mut self, idx: SlotIdx) -> &mut T {
        // SAFETY: as above; `&mut self` keeps matcher-side borrows unique.
        unsafe { &mut *self.pool.slot_ptr(idx) }
    }

    /// Return a slot to the free queue. Releasing an index that was never
    /// part of this pool is a programming error and aborts the process.
    #[inline]
    pub fn release(&mut self, idx: SlotIdx) {
        let pool = self.pool;
        if idx >= pool.capacity {
            tracing::error!(idx, capacity = pool.capacity, "release of foreign slot");
            std::process::abort();
        }
        // SAFETY: we own the slot until the release store below.
        unsafe { pool.slot_ptr(idx).write(T::default()) };
        let tail = pool.free_tail.0.load(Ordering::Relaxed);
        debug_assert!(tail - pool.free_head.0.load(Ordering::Relaxed) < pool.capacity as u64);
        // SAFETY: only released-and-owned indices reach here, so the queue
        // can never exceed `capacity` entries; we are the only producer.
        unsafe { pool.free_slot(tail).write(idx) };
        pool.free_tail.0.store(tail + 1, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::Order;

    fn pool_of(arena: &Arena, capacity: u32) -> ObjectPool<Order> {
        ObjectPool::new(arena, capacity)
    }

    #[test]
    fn counters_partition_capacity() {
        let arena = Arena::new(1024 * 1024);
        let pool = pool_of(&arena, 100);
        let (mut acq, mut slab) = pool.split();

        assert_eq!(pool.available(), 100);
        assert_eq!(pool.in_use(), 0);

        let a = acq.acquire().unwrap();
        let b = acq.acquire().unwrap();
        assert_eq!(pool.available() + pool.in_use(), 100);
        assert_eq!(pool.in_use(), 2);

        slab.release(a);
        assert_eq!(pool.available() + pool.in_use(), 100);
        assert_eq!(pool.in_use(), 1);

        slab.release(b);
        assert_eq!(pool.available(), 100);
    }

    #[test]
    fn acquire_release_round_trip_is_neutral() {
        let arena = Arena::new(1024 * 1024);
        let pool = pool_of(&arena, 10);
        let (mut acq, mut slab) = pool.split();

        let before = pool.available();
        let idx = acq.acquire().unwrap();
        slab.release(idx);
        assert_eq!(pool.available(), before);
    }

    #[test]
    fn exhaustion_returns_none() {
        let arena = Arena::new(1024 * 1024);
        let pool = pool_of(&arena, 2);
        let (mut acq, _slab) = pool.split();

        assert!(acq.acquire().is_some());
        assert!(acq.acquire().is_some());
        assert!(acq.acquire().is_none());
    }

    #[test]
    fn recycled_slot_comes_back_reset() {
        let arena = Arena::new(1024 * 1024);
        let pool = pool_of(&arena, 3);
        let (mut acq, mut slab) = pool.split();

        let idx = acq.acquire().unwrap();
        let o = acq.get_mut(idx);
        o.id = 77;
        o.remaining_qty = 500;
        o.active = true;
        slab.release(idx);

        // Cycle until the same slot comes around again.
        for _ in 0..3 {
            let got = acq.acquire().unwrap();
            if got == idx {
                let o = acq.get_mut(got);
                assert_eq!(o.id, 0);
                assert_eq!(o.remaining_qty, 0);
                assert!(!o.active);
                assert_eq!(o.next, NIL);
                return;
            }
        }
        panic!("released slot never reissued");
    }

    #[test]
    fn slot_addresses_are_stable() {
        let arena = Arena::new(1024 * 1024);
        let pool = pool_of(&arena, 8);
        let (mut acq, mut slab) = pool.split();

        let idx = acq.acquire().unwrap();
        let first = acq.get_mut(idx) as *mut Order;
        slab.release(idx);
        // Drain the queue so the same index is reissued.
        let mut reissued = NIL;
        for _ in 0..8 {
            let got = acq.acquire().unwrap();
            if got == idx {
                reissued = got;
                break;
            }
        }
        assert_eq!(reissued, idx);
        assert_eq!(acq.get_mut(reissued) as *mut Order, first);
    }

    #[test]
    #[should_panic(expected = "already split")]
    fn second_split_panics() {
        let arena = Arena::new(1024 * 1024);
        let pool = pool_of(&arena, 4);
        let _pair = pool.split();
        let _again = pool.split();
    }
}
