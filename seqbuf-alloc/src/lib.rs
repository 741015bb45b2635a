#![no_std]

extern crate alloc;

use core::alloc::Layout;
use core::ptr::NonNull;

use derive_more::Display;

#[cfg(not(any(feature = "fallible", feature = "abort-on-oom")))]
compile_error!("must enable either the fallible or the abort-on-oom feature!");

#[cfg(all(feature = "fallible", feature = "abort-on-oom"))]
compile_error!("fallible and abort-on-oom are mutually exclusive, pick one");

#[cfg(feature = "fallible")]
#[path = "fallible_impl.rs"]
mod impl_;

#[cfg(feature = "abort-on-oom")]
#[path = "abort_impl.rs"]
mod impl_;

pub mod tracking;

pub use impl_::POLICY;
pub use tracking::{AllocStats, Tracking};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Display)]
#[display("allocation of {requested_bytes} bytes (align {align}) failed")]
pub struct AllocError {
    pub requested_bytes: usize,
    pub align: usize,
}

impl AllocError {
    pub fn for_layout(layout: Layout) -> Self {
        AllocError {
            requested_bytes: layout.size(),
            align: layout.align(),
        }
    }
}

impl core::error::Error for AllocError {}

/// What [`Global`] does when the system allocator returns null. Chosen at
/// build time through the `fallible` / `abort-on-oom` features.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Display)]
pub enum FailurePolicy {
    /// Report the failure to the caller as an [`AllocError`].
    #[display("propagate")]
    Propagate,
    /// Log and terminate the process through `handle_alloc_error`.
    #[display("abort")]
    Abort,
}

/// Untyped memory source used by the containers.
///
/// # Safety
///
/// A successful `allocate` must return a block that is valid for reads and
/// writes of `layout.size()` bytes, aligned to `layout.align()`, and that
/// stays valid until it is handed back to `deallocate` with the same layout.
pub unsafe trait RawAlloc {
    /// Allocate a block for `layout`. Callers never ask for zero bytes.
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError>;

    /// Release a block.
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by `allocate` on this allocator with
    /// the same `layout`, and must not be used afterwards.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);
}

unsafe impl<A: RawAlloc + ?Sized> RawAlloc for &A {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        (**self).allocate(layout)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: forwarded contract
        unsafe { (**self).deallocate(ptr, layout) }
    }
}

/// The process-wide system allocator.
#[derive(Debug, Default, Copy, Clone)]
pub struct Global;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_round_trip() {
        let layout = Layout::array::<u64>(16).unwrap();
        let ptr = Global.allocate(layout).unwrap();
        unsafe {
            ptr.as_ptr().write_bytes(0xab, layout.size());
            assert_eq!(*ptr.as_ptr().add(layout.size() - 1), 0xab);
            Global.deallocate(ptr, layout);
        }
    }

    #[test]
    fn reference_forwards_to_allocator() {
        let tracker = Tracking::new();
        let by_ref = &tracker;
        let layout = Layout::new::<u32>();
        let ptr = by_ref.allocate(layout).unwrap();
        assert_eq!(tracker.stats().allocations, 1);
        unsafe { by_ref.deallocate(ptr, layout) };
        assert_eq!(tracker.stats().deallocations, 1);
    }

    #[test]
    fn alloc_error_describes_layout() {
        let err = AllocError::for_layout(Layout::from_size_align(24, 8).unwrap());
        assert_eq!(err.requested_bytes, 24);
        assert_eq!(
            alloc::format!("{err}"),
            "allocation of 24 bytes (align 8) failed"
        );
    }

    #[cfg(feature = "fallible")]
    #[test]
    fn default_policy_propagates() {
        assert_eq!(POLICY, FailurePolicy::Propagate);
        assert_eq!(alloc::format!("{POLICY}"), "propagate");
    }
}
