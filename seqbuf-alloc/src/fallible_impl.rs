use core::alloc::Layout;
use core::ptr::NonNull;

use crate::{AllocError, FailurePolicy, Global, RawAlloc};

pub const POLICY: FailurePolicy = FailurePolicy::Propagate;

unsafe impl RawAlloc for Global {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        debug_assert!(layout.size() != 0);

        // SAFETY: layout has non-zero size
        let ptr = unsafe { alloc::alloc::alloc(layout) };

        NonNull::new(ptr).ok_or(AllocError::for_layout(layout))
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: caller guarantees ptr was allocated by us with this layout
        unsafe { alloc::alloc::dealloc(ptr.as_ptr(), layout) }
    }
}
