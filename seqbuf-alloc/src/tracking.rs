//! An allocator adaptor that counts what passes through it and can be told
//! to start failing, for observing growth behaviour and injecting faults.

use core::alloc::Layout;
use core::cell::Cell;
use core::ptr::NonNull;

use crate::{AllocError, Global, RawAlloc};

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct AllocStats {
    pub allocations: usize,
    pub deallocations: usize,
    /// Requests refused, either by the budget or by the inner allocator.
    pub failures: usize,
    pub live_bytes: usize,
    pub peak_bytes: usize,
}

impl AllocStats {
    pub fn live_blocks(&self) -> usize {
        self.allocations - self.deallocations
    }
}

/// Wraps another [`RawAlloc`], recording [`AllocStats`].
///
/// Not `Sync`: share it between containers of one owner by reference,
/// `&Tracking` is itself a `RawAlloc`.
#[derive(Debug, Default)]
pub struct Tracking<A = Global> {
    inner: A,
    stats: Cell<AllocStats>,
    /// Remaining successful allocations before requests are refused.
    budget: Cell<Option<usize>>,
}

impl Tracking<Global> {
    pub const fn new() -> Self {
        Tracking::wrap(Global)
    }
}

impl<A> Tracking<A> {
    pub const fn wrap(inner: A) -> Self {
        Tracking {
            inner,
            stats: Cell::new(AllocStats {
                allocations: 0,
                deallocations: 0,
                failures: 0,
                live_bytes: 0,
                peak_bytes: 0,
            }),
            budget: Cell::new(None),
        }
    }

    pub fn stats(&self) -> AllocStats {
        self.stats.get()
    }

    /// Let `allocations` more requests succeed, refuse every one after.
    pub fn fail_after(&self, allocations: usize) {
        self.budget.set(Some(allocations));
    }

    pub fn clear_budget(&self) {
        self.budget.set(None);
    }

    fn update(&self, f: impl FnOnce(&mut AllocStats)) {
        let mut stats = self.stats.get();
        f(&mut stats);
        self.stats.set(stats);
    }
}

unsafe impl<A: RawAlloc> RawAlloc for Tracking<A> {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        if let Some(remaining) = self.budget.get() {
            if remaining == 0 {
                self.update(|s| s.failures += 1);
                return Err(AllocError::for_layout(layout));
            }
            self.budget.set(Some(remaining - 1));
        }

        let ptr = self.inner.allocate(layout).map_err(|err| {
            self.update(|s| s.failures += 1);
            err
        })?;

        self.update(|s| {
            s.allocations += 1;
            s.live_bytes += layout.size();
            s.peak_bytes = s.peak_bytes.max(s.live_bytes);
        });

        Ok(ptr)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        self.update(|s| {
            s.deallocations += 1;
            s.live_bytes -= layout.size();
        });

        // SAFETY: forwarded contract, the block came from inner.allocate
        unsafe { self.inner.deallocate(ptr, layout) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_blocks_and_bytes() {
        let tracker = Tracking::new();
        let small = Layout::array::<u8>(16).unwrap();
        let large = Layout::array::<u8>(64).unwrap();

        let a = tracker.allocate(small).unwrap();
        let b = tracker.allocate(large).unwrap();
        assert_eq!(tracker.stats().live_blocks(), 2);
        assert_eq!(tracker.stats().live_bytes, 80);

        unsafe { tracker.deallocate(a, small) };
        assert_eq!(tracker.stats().live_bytes, 64);
        assert_eq!(tracker.stats().peak_bytes, 80);

        unsafe { tracker.deallocate(b, large) };
        let stats = tracker.stats();
        assert_eq!(stats.allocations, 2);
        assert_eq!(stats.deallocations, 2);
        assert_eq!(stats.live_bytes, 0);
    }

    #[test]
    fn budget_refuses_after_limit() {
        let tracker = Tracking::new();
        let layout = Layout::new::<u64>();
        tracker.fail_after(1);

        let first = tracker.allocate(layout).unwrap();
        let err = tracker.allocate(layout).unwrap_err();
        assert_eq!(err, AllocError::for_layout(layout));
        assert_eq!(tracker.stats().failures, 1);
        assert_eq!(tracker.stats().allocations, 1);

        tracker.clear_budget();
        let second = tracker.allocate(layout).unwrap();

        unsafe {
            tracker.deallocate(first, layout);
            tracker.deallocate(second, layout);
        }
        assert_eq!(tracker.stats().live_blocks(), 0);
    }

    #[test]
    fn zero_budget_fails_immediately() {
        let tracker = Tracking::new();
        tracker.fail_after(0);
        assert!(tracker.allocate(Layout::new::<u8>()).is_err());
        assert_eq!(tracker.stats().live_bytes, 0);
    }
}
