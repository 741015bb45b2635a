use core::alloc::Layout;
use core::ptr::NonNull;

use crate::{AllocError, FailurePolicy, Global, RawAlloc};

pub const POLICY: FailurePolicy = FailurePolicy::Abort;

unsafe impl RawAlloc for Global {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        debug_assert!(layout.size() != 0);

        // SAFETY: layout has non-zero size
        let ptr = unsafe { alloc::alloc::alloc(layout) };

        match NonNull::new(ptr) {
            Some(ptr) => Ok(ptr),
            None => {
                log::error!("seqbuf_alloc: allocation failed! requested size: {}", layout.size());
                alloc::alloc::handle_alloc_error(layout)
            }
        }
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: caller guarantees ptr was allocated by us with this layout
        unsafe { alloc::alloc::dealloc(ptr.as_ptr(), layout) }
    }
}
