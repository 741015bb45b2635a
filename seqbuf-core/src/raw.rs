//! The storage core shared by [`DynArray`](crate::DynArray) and
//! [`DynBuffer`](crate::DynBuffer): one owned block, the count of live
//! elements at its front, and the primitives every container mutation is
//! built from.
//!
//! Nothing here is observable half-done. Growth either completes or leaves
//! the storage exactly as it was: new elements are constructed before any
//! existing element moves, and moving existing elements is a bitwise copy
//! that cannot fail.

use core::alloc::Layout;
use core::fmt::{self, Debug};
use core::marker::PhantomData;
use core::mem::{self, ManuallyDrop};
use core::ptr::{self, NonNull};
use core::{cmp, slice};

use seqbuf_alloc::{Global, RawAlloc};

use crate::error::SeqError;

/// Write `value` into an uninitialized slot.
///
/// # Safety
///
/// `slot` must be valid for writes and must not hold a live value.
#[inline]
pub unsafe fn construct_at<T>(slot: *mut T, value: T) {
    // SAFETY: forwarded contract
    unsafe { slot.write(value) }
}

/// # Safety
///
/// As [`construct_at`].
#[inline]
pub unsafe fn construct_default_at<T: Default>(slot: *mut T) {
    // SAFETY: forwarded contract
    unsafe { slot.write(T::default()) }
}

/// # Safety
///
/// `slot` must hold a live value, which is dead afterwards.
#[inline]
pub unsafe fn destroy_at<T>(slot: *mut T) {
    // SAFETY: forwarded contract
    unsafe { ptr::drop_in_place(slot) }
}

/// Destroy `count` live values starting at `first`. Compiles to nothing
/// for types without drop glue.
///
/// # Safety
///
/// As [`destroy_at`], for every slot in the range.
#[inline]
pub unsafe fn destroy_range<T>(first: *mut T, count: usize) {
    if mem::needs_drop::<T>() && count != 0 {
        // SAFETY: forwarded contract
        unsafe { ptr::drop_in_place(ptr::slice_from_raw_parts_mut(first, count)) }
    }
}

/// Largest element count a block of `T` may hold: its byte size must stay
/// within `isize::MAX`.
pub const fn max_len<T>() -> usize {
    match mem::size_of::<T>() {
        0 => usize::MAX,
        size => isize::MAX as usize / size,
    }
}

/// Obtain an uninitialized block for `count` elements. Zero-sized blocks
/// are never requested from `alloc`.
pub fn allocate<T, A: RawAlloc>(alloc: &A, count: usize) -> Result<NonNull<T>, SeqError> {
    let max = max_len::<T>();
    if count > max {
        return Err(SeqError::LengthLimit { requested: count, max });
    }

    let layout = Layout::array::<T>(count)
        .map_err(|_| SeqError::LengthLimit { requested: count, max })?;

    if layout.size() == 0 {
        return Ok(NonNull::dangling());
    }

    Ok(alloc.allocate(layout)?.cast())
}

/// Return a block obtained from [`allocate`].
///
/// # Safety
///
/// `ptr` and `count` must be exactly what `allocate` was called with and
/// returned, on the same allocator. No live elements may remain in it.
pub unsafe fn deallocate<T, A: RawAlloc>(alloc: &A, ptr: NonNull<T>, count: usize) {
    let size = mem::size_of::<T>() * count;
    if size == 0 {
        return;
    }

    // SAFETY: this layout was validated by Layout::array when allocating
    let layout = unsafe { Layout::from_size_align_unchecked(size, mem::align_of::<T>()) };

    // SAFETY: forwarded contract
    unsafe { alloc.deallocate(ptr.cast(), layout) }
}

/// Capacity to move to when `count` elements must be spliced into a full
/// block: at least double, then `headroom` spare slots on top.
fn grow_target<T>(len: usize, count: usize, headroom: usize) -> usize {
    len.saturating_add(cmp::max(len, count))
        .saturating_add(headroom)
        .min(max_len::<T>())
}

/// A block being filled off to the side of a [`RawStorage`], borrowing its
/// allocator. Until it is installed, dropping it destroys what was pushed
/// and frees the block.
pub type Fill<'a, T, A> = RawStorage<T, &'a A>;

pub struct RawStorage<T, A: RawAlloc = Global> {
    ptr: NonNull<T>,
    len: usize,
    cap: usize,
    alloc: A,
    _owns: PhantomData<T>,
}

// SAFETY: RawStorage owns its elements as a Vec would
unsafe impl<T: Send, A: RawAlloc + Send> Send for RawStorage<T, A> {}
unsafe impl<T: Sync, A: RawAlloc + Sync> Sync for RawStorage<T, A> {}

impl<T, A: RawAlloc> Debug for RawStorage<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawStorage {{ len = {}; cap = {} }}", self.len, self.cap)
    }
}

impl<T, A: RawAlloc> RawStorage<T, A> {
    /// Empty storage. Allocates nothing.
    pub const fn new_in(alloc: A) -> Self {
        RawStorage {
            ptr: NonNull::dangling(),
            len: 0,
            cap: 0,
            alloc,
            _owns: PhantomData,
        }
    }

    pub fn with_capacity_in(cap: usize, alloc: A) -> Result<Self, SeqError> {
        let ptr = allocate::<T, A>(&alloc, cap)?;
        Ok(RawStorage { ptr, len: 0, cap, alloc, _owns: PhantomData })
    }

    pub fn max_len() -> usize {
        max_len::<T>()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.cap
    }

    pub fn spare_capacity(&self) -> usize {
        self.cap - self.len
    }

    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    pub fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }

    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.ptr.as_ptr()
    }

    pub fn as_slice(&self) -> &[T] {
        // SAFETY: the first len slots are live
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: the first len slots are live and we hold &mut self
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    /// Pointer to slot `idx` of the block, live or not.
    ///
    /// # Safety
    ///
    /// `idx` must not exceed the capacity.
    pub unsafe fn slot(&self, idx: usize) -> *mut T {
        debug_assert!(idx <= self.cap);
        // SAFETY: forwarded contract, idx stays within or one past the block
        unsafe { self.ptr.as_ptr().add(idx) }
    }

    /// Construct `value` in the first spare slot, handing it back if there
    /// is none.
    pub fn push_within_capacity(&mut self, value: T) -> Result<(), T> {
        if self.len == self.cap {
            return Err(value);
        }

        // SAFETY: len < cap so the slot is inside the block and dead
        unsafe { construct_at(self.slot(self.len), value) };
        self.len += 1;
        Ok(())
    }

    /// Construct values from `iter` into spare slots until either runs
    /// out. A panicking iterator leaves every value constructed so far live.
    pub fn extend_within_capacity<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter.into_iter().take(self.spare_capacity()) {
            // SAFETY: take() keeps len below cap
            unsafe { construct_at(self.slot(self.len), value) };
            self.len += 1;
        }
    }

    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }

        self.len -= 1;
        // SAFETY: the slot was live and is now outside the live prefix
        Some(unsafe { self.slot(self.len).read() })
    }

    /// Move the element at `idx` out, shifting the tail left over it.
    pub fn remove(&mut self, idx: usize) -> T {
        assert!(idx < self.len, "remove index {idx} out of range for length {}", self.len);

        // SAFETY: idx is live; the tail copy stays inside the live prefix
        unsafe {
            let hole = self.slot(idx);
            let value = hole.read();
            ptr::copy(hole.add(1), hole, self.len - idx - 1);
            self.len -= 1;
            value
        }
    }

    /// Destroy the elements in `start..end` and close the hole.
    pub fn remove_range(&mut self, start: usize, end: usize) {
        assert!(start <= end && end <= self.len, "remove range {start}..{end} out of range");
        if start == end {
            return;
        }

        let tail = self.len - end;

        // a panicking destructor leaks the tail rather than dropping it twice
        self.len = start;

        // SAFETY: start..end is live, tail elements follow it contiguously
        unsafe {
            destroy_range(self.slot(start), end - start);
            ptr::copy(self.slot(end), self.slot(start), tail);
        }

        self.len = start + tail;
    }

    pub fn truncate(&mut self, len: usize) {
        if len >= self.len {
            return;
        }

        let dead = self.len - len;
        self.len = len;

        // SAFETY: these slots were live and are past the new len
        unsafe { destroy_range(self.slot(len), dead) };
    }

    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }

    /// Move the live elements into a block of exactly `new_cap` slots.
    pub fn relocate(&mut self, new_cap: usize) -> Result<(), SeqError> {
        debug_assert!(new_cap >= self.len);
        if new_cap == self.cap {
            return Ok(());
        }

        let block = allocate::<T, A>(&self.alloc, new_cap)?;

        log::trace!("relocating {} elements: capacity {} -> {}", self.len, self.cap, new_cap);

        // SAFETY: both blocks hold at least len slots and are distinct; the
        // old block has no live elements left after the copy
        unsafe {
            ptr::copy_nonoverlapping(self.ptr.as_ptr(), block.as_ptr(), self.len);
            deallocate(&self.alloc, self.ptr, self.cap);
        }

        self.ptr = block;
        self.cap = new_cap;
        Ok(())
    }

    /// Replace the contents with a block of exactly `cap` slots filled by
    /// `fill`. If allocation fails or `fill` panics, the current contents
    /// are untouched and the new block is released. The new block is
    /// installed before the old elements are destroyed, so a panicking
    /// destructor cannot lose it.
    pub fn rebuild<F>(&mut self, cap: usize, fill: F) -> Result<(), SeqError>
    where
        F: FnOnce(&mut Fill<'_, T, A>),
    {
        let mut fresh = RawStorage::with_capacity_in(cap, &self.alloc)?;
        fill(&mut fresh);

        let fresh = ManuallyDrop::new(fresh);

        log::trace!("rebuilt storage: capacity {} -> {}", self.cap, fresh.cap);

        let old: Fill<'_, T, A> = RawStorage {
            ptr: mem::replace(&mut self.ptr, fresh.ptr),
            len: mem::replace(&mut self.len, fresh.len),
            cap: mem::replace(&mut self.cap, fresh.cap),
            alloc: &self.alloc,
            _owns: PhantomData,
        };
        drop(old);

        Ok(())
    }

    /// Make room for `count` elements at `at`, keeping `headroom` spare
    /// slots past the result.
    ///
    /// Fits in place when the block is large enough: the tail shifts right
    /// immediately. Otherwise a new block of `len + max(len, count) +
    /// headroom` slots is allocated and nothing moves until the gap is
    /// committed. Either way, if allocation fails nothing has changed.
    pub fn open_gap(
        &mut self,
        at: usize,
        count: usize,
        headroom: usize,
    ) -> Result<Gap<'_, T, A>, SeqError> {
        assert!(at <= self.len, "gap position {at} out of range for length {}", self.len);

        let max = max_len::<T>();
        let required = self
            .len
            .checked_add(count)
            .and_then(|n| n.checked_add(headroom))
            .filter(|&n| n <= max)
            .ok_or(SeqError::LengthLimit {
                requested: self.len.saturating_add(count).saturating_add(headroom),
                max,
            })?;

        let tail = self.len - at;

        if required <= self.cap {
            // SAFETY: at + count + tail <= cap; ptr::copy permits overlap
            unsafe { ptr::copy(self.slot(at), self.slot(at + count), tail) };
            self.len = at;

            return Ok(Gap { storage: self, fresh: None, at, count, tail, filled: 0, committed: false });
        }

        let new_cap = grow_target::<T>(self.len, count, headroom);
        let block = allocate::<T, A>(&self.alloc, new_cap)?;

        log::trace!(
            "splicing {} elements at {} of {}: capacity {} -> {}",
            count, at, self.len, self.cap, new_cap,
        );

        Ok(Gap {
            storage: self,
            fresh: Some((block, new_cap)),
            at,
            count,
            tail,
            filled: 0,
            committed: false,
        })
    }

    /// Destroy all elements and give the block back.
    fn release(&mut self) {
        struct FreeOnDrop<'a, T, A: RawAlloc>(&'a mut RawStorage<T, A>);

        impl<T, A: RawAlloc> Drop for FreeOnDrop<'_, T, A> {
            fn drop(&mut self) {
                let storage = &mut *self.0;

                // SAFETY: ptr and cap describe our block, emptied by truncate
                // even when one of the destructors unwound
                unsafe { deallocate(&storage.alloc, storage.ptr, storage.cap) };

                storage.ptr = NonNull::dangling();
                storage.cap = 0;
            }
        }

        let guard = FreeOnDrop(self);
        guard.0.truncate(0);
    }
}

impl<T, A: RawAlloc> Drop for RawStorage<T, A> {
    fn drop(&mut self) {
        self.release();
    }
}

/// A reserved run of uninitialized slots inside a [`RawStorage`], opened by
/// [`RawStorage::open_gap`].
///
/// Elements pushed into the gap become live on [`commit`](Gap::commit);
/// any unfilled remainder closes up. Dropping the gap uncommitted, as
/// happens when filling it panics, destroys what was pushed and restores
/// the storage to its state before the gap was opened.
pub struct Gap<'a, T, A: RawAlloc> {
    storage: &'a mut RawStorage<T, A>,
    /// Replacement block when the gap did not fit in place.
    fresh: Option<(NonNull<T>, usize)>,
    at: usize,
    count: usize,
    tail: usize,
    filled: usize,
    committed: bool,
}

impl<'a, T, A: RawAlloc> Gap<'a, T, A> {
    pub fn remaining(&self) -> usize {
        self.count - self.filled
    }

    pub fn push(&mut self, value: T) {
        assert!(self.filled < self.count, "gap of {} is already full", self.count);

        // SAFETY: the slot is inside the reserved, dead range
        unsafe { construct_at(self.hole().add(self.filled), value) };
        self.filled += 1;
    }

    /// Push values from `iter` until it or the gap runs out.
    pub fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter.into_iter().take(self.remaining()) {
            self.push(value);
        }
    }

    pub fn commit(mut self) {
        self.committed = true;
    }

    fn hole(&self) -> *mut T {
        let base = match self.fresh {
            Some((block, _)) => block.as_ptr(),
            None => self.storage.ptr.as_ptr(),
        };

        // SAFETY: at is within both the old and the fresh block
        unsafe { base.add(self.at) }
    }
}

impl<'a, T, A: RawAlloc> Drop for Gap<'a, T, A> {
    fn drop(&mut self) {
        if !self.committed {
            // SAFETY: exactly `filled` slots at the hole were constructed
            unsafe { destroy_range(self.hole(), self.filled) };
            self.filled = 0;
        }

        let (at, count, tail, filled) = (self.at, self.count, self.tail, self.filled);
        let storage = &mut *self.storage;

        match self.fresh.take() {
            // SAFETY: the tail sits at at + count; moving it to at + filled
            // stays inside the block
            None => unsafe {
                if filled != count {
                    ptr::copy(storage.slot(at + count), storage.slot(at + filled), tail);
                }
                storage.len = at + filled + tail;
            },
            // SAFETY: the fresh block holds at + filled + tail slots at
            // least; after the copies the old block holds nothing live
            Some((block, cap)) if self.committed => unsafe {
                let old = storage.ptr.as_ptr();
                let new = block.as_ptr();
                ptr::copy_nonoverlapping(old, new, at);
                ptr::copy_nonoverlapping(old.add(at), new.add(at + filled), tail);
                deallocate(&storage.alloc, storage.ptr, storage.cap);

                storage.ptr = block;
                storage.cap = cap;
                storage.len = at + filled + tail;
            },
            // SAFETY: the fresh block is empty again and the storage never
            // saw it
            Some((block, cap)) => unsafe { deallocate(&storage.alloc, block, cap) },
        }
    }
}
