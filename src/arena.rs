//! Memory arena - one-shot bump allocator with per-request alignment.
//!
//! The arena grabs a single contiguous, cache-line-aligned, zeroed block at
//! startup and hands out sub-ranges by advancing a monotonic offset. Nothing
//! is ever freed individually; the pool slab and the ring storage are carved
//! out of it once and live for the whole session. `reset` exists only for
//! test boundaries and invalidates every outstanding allocation.
//!
//! Running out of arena space is a sizing bug, not a runtime condition, so
//! exhaustion aborts the process rather than degrading silently.

use std::alloc::{alloc_zeroed, dealloc, Layout};
use std::cell::Cell;
use std::fmt;
use std::ptr::NonNull;

use crate::config::CACHE_LINE_SIZE;

pub struct Arena {
    base: NonNull<u8>,
    capacity: usize,
    offset: Cell<usize>,
}

impl Arena {
    /// Allocate and zero the backing region.
    ///
    /// Aborts if the allocation itself fails; there is nothing sensible to
    /// do without the arena.
    pub fn new(capacity_bytes: usize) -> Self {
        assert!(capacity_bytes > 0, "arena capacity must be non-zero");
        let layout = Layout::from_size_align(capacity_bytes, CACHE_LINE_SIZE)
            .expect("invalid arena layout");
        // SAFETY: layout has non-zero size, checked above.
        let raw = unsafe { alloc_zeroed(layout) };
        let Some(base) = NonNull::new(raw) else {
            tracing::error!(bytes = capacity_bytes, "arena allocation failed");
            std::process::abort();
        };
        Self {
            base,
            capacity: capacity_bytes,
            offset: Cell::new(0),
        }
    }

    /// Carve out space for `count` values of `T`, aligned for `T`.
    ///
    /// The returned memory is zeroed (never handed out before, or re-handed
    /// out only after `reset`). Aborts the process on exhaustion.
    pub fn alloc_array<T>(&self, count: usize) -> NonNull<T> {
        let align = std::mem::align_of::<T>();
        assert!(
            align <= CACHE_LINE_SIZE,
            "arena base alignment cannot satisfy type alignment"
        );
        let bytes = std::mem::size_of::<T>() * count;
        let aligned = (self.offset.get() + align - 1) & !(align - 1);
        if aligned + bytes > self.capacity {
            tracing::error!(
                requested = bytes,
                used = self.offset.get(),
                capacity = self.capacity,
                "arena exhausted"
            );
            std::process::abort();
        }
        self.offset.set(aligned + bytes);
        // SAFETY: aligned + bytes <= capacity, so the pointer stays inside
        // the allocation; base is non-null and `aligned` respects
        // align_of::<T>().
        unsafe { NonNull::new_unchecked(self.base.as_ptr().add(aligned).cast::<T>()) }
    }

    /// Rewind the bump offset to zero, invalidating all prior allocations.
    ///
    /// Only legal between runs when no structure still points into the
    /// arena. Not used on any hot path.
    pub fn reset(&self) {
        self.offset.set(0);
    }

    /// Touch every page so the OS maps it before the hot path starts.
    pub fn warm_up(&self) {
        const PAGE: usize = 4096;
        let mut off = 0;
        while off < self.capacity {
            // SAFETY: off < capacity; volatile read-write keeps the touch
            // from being optimized out.
            unsafe {
                let p = self.base.as_ptr().add(off);
                std::ptr::write_volatile(p, std::ptr::read_volatile(p));
            }
            off += PAGE;
        }
    }

    /// Bytes handed out so far.
    #[inline]
    pub fn used(&self) -> usize {
        self.offset.get()
    }

    /// Bytes still available.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.capacity - self.offset.get()
    }

    /// Total size of the backing region.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Drop for Arena {
    fn drop(&mut self) {
        let layout = Layout::from_size_align(self.capacity, CACHE_LINE_SIZE)
            .expect("invalid arena layout");
        // SAFETY: base was produced by alloc_zeroed with this exact layout.
        unsafe { dealloc(self.base.as_ptr(), layout) };
    }
}

impl fmt::Debug for Arena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("capacity", &self.capacity)
            .field("used", &self.offset.get())
            .finish()
    }
}
