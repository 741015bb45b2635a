use core::cmp::Ordering;
use core::fmt::{self, Debug};
use core::hash::{Hash, Hasher};
use core::iter;
use core::ops::{Deref, DerefMut, Range};
use core::slice;

use seqbuf_alloc::{Global, RawAlloc};
use static_assertions::{assert_eq_size, assert_impl_all, assert_not_impl_any};

use crate::error::{check_index, check_position, SeqError};
use crate::raw::RawStorage;

/// A growable contiguous array over a [`RawAlloc`].
///
/// Every operation that can allocate returns a `Result`; on error the array
/// is unchanged. Growth at least doubles the capacity, so appending runs in
/// amortized constant time. Copying is explicit through
/// [`try_clone`](DynArray::try_clone).
pub struct DynArray<T, A: RawAlloc = Global> {
    raw: RawStorage<T, A>,
}

assert_impl_all!(DynArray<u32>: Send, Sync);
assert_not_impl_any!(DynArray<u32>: Clone, Copy);
assert_eq_size!(DynArray<u8>, [usize; 3]);

impl<T> DynArray<T> {
    pub const fn new() -> Self {
        Self::new_in(Global)
    }

    pub fn with_len(len: usize) -> Result<Self, SeqError>
    where
        T: Default,
    {
        Self::with_len_in(len, Global)
    }

    pub fn from_elem(len: usize, value: &T) -> Result<Self, SeqError>
    where
        T: Clone,
    {
        Self::from_elem_in(len, value, Global)
    }

    pub fn from_slice(values: &[T]) -> Result<Self, SeqError>
    where
        T: Clone,
    {
        Self::from_slice_in(values, Global)
    }

    pub fn try_from_iter<I>(iter: I) -> Result<Self, SeqError>
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: ExactSizeIterator,
    {
        Self::try_from_iter_in(iter, Global)
    }
}

impl<T, A: RawAlloc> DynArray<T, A> {
    pub const fn new_in(alloc: A) -> Self {
        DynArray { raw: RawStorage::new_in(alloc) }
    }

    pub fn with_len_in(len: usize, alloc: A) -> Result<Self, SeqError>
    where
        T: Default,
    {
        Self::build_in(len, alloc, iter::repeat_with(T::default))
    }

    pub fn from_elem_in(len: usize, value: &T, alloc: A) -> Result<Self, SeqError>
    where
        T: Clone,
    {
        Self::build_in(len, alloc, iter::repeat_with(|| value.clone()))
    }

    pub fn from_slice_in(values: &[T], alloc: A) -> Result<Self, SeqError>
    where
        T: Clone,
    {
        Self::build_in(values.len(), alloc, values.iter().cloned())
    }

    /// Collect an iterator of known length. Capacity is exactly the
    /// reported length; extra items are not consumed.
    pub fn try_from_iter_in<I>(iter: I, alloc: A) -> Result<Self, SeqError>
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: ExactSizeIterator,
    {
        let iter = iter.into_iter();
        Self::build_in(iter.len(), alloc, iter)
    }

    /// Element-wise copy into a fresh block sized exactly to the length.
    pub fn try_clone(&self) -> Result<Self, SeqError>
    where
        T: Clone,
        A: Clone,
    {
        Self::from_slice_in(self, self.raw.allocator().clone())
    }

    fn build_in<I>(cap: usize, alloc: A, values: I) -> Result<Self, SeqError>
    where
        I: Iterator<Item = T>,
    {
        let mut raw = RawStorage::with_capacity_in(cap, alloc)?;
        raw.extend_within_capacity(values);
        Ok(DynArray { raw })
    }

    pub fn max_len() -> usize {
        RawStorage::<T, A>::max_len()
    }

    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.raw.capacity()
    }

    pub fn allocator(&self) -> &A {
        self.raw.allocator()
    }

    pub fn as_slice(&self) -> &[T] {
        self.raw.as_slice()
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        self.raw.as_mut_slice()
    }

    pub fn as_ptr(&self) -> *const T {
        self.raw.as_ptr()
    }

    pub fn front(&self) -> Option<&T> {
        self.as_slice().first()
    }

    pub fn back(&self) -> Option<&T> {
        self.as_slice().last()
    }

    pub fn front_mut(&mut self) -> Option<&mut T> {
        self.as_mut_slice().first_mut()
    }

    pub fn back_mut(&mut self) -> Option<&mut T> {
        self.as_mut_slice().last_mut()
    }

    pub fn at(&self, idx: usize) -> Result<&T, SeqError> {
        let len = self.len();
        self.as_slice().get(idx).ok_or(SeqError::OutOfRange { pos: idx, len })
    }

    pub fn at_mut(&mut self, idx: usize) -> Result<&mut T, SeqError> {
        let len = self.len();
        self.as_mut_slice().get_mut(idx).ok_or(SeqError::OutOfRange { pos: idx, len })
    }

    /// Make the capacity at least `n`, allocating exactly `n` if it is not.
    pub fn reserve(&mut self, n: usize) -> Result<(), SeqError> {
        if n <= self.capacity() {
            return Ok(());
        }

        log::debug!("array reserve: capacity {} -> {}", self.capacity(), n);
        self.raw.relocate(n)
    }

    pub fn shrink_to_fit(&mut self) -> Result<(), SeqError> {
        let len = self.len();
        self.raw.relocate(len)
    }

    pub fn push_back(&mut self, value: T) -> Result<(), SeqError> {
        if let Err(value) = self.raw.push_within_capacity(value) {
            let end = self.len();
            let mut gap = self.raw.open_gap(end, 1, 0)?;
            gap.push(value);
            gap.commit();
        }
        Ok(())
    }

    pub fn push_back_default(&mut self) -> Result<(), SeqError>
    where
        T: Default,
    {
        self.push_back(T::default())
    }

    pub fn pop_back(&mut self) -> Option<T> {
        self.raw.pop()
    }

    /// Insert `value` before `pos`, returning the position it landed at.
    pub fn insert(&mut self, pos: usize, value: T) -> Result<usize, SeqError> {
        check_position(pos, self.len())?;

        let mut gap = self.raw.open_gap(pos, 1, 0)?;
        gap.push(value);
        gap.commit();
        Ok(pos)
    }

    pub fn insert_default(&mut self, pos: usize) -> Result<usize, SeqError>
    where
        T: Default,
    {
        self.insert(pos, T::default())
    }

    /// Insert `n` clones of `value` before `pos`.
    pub fn insert_n(&mut self, pos: usize, n: usize, value: &T) -> Result<(), SeqError>
    where
        T: Clone,
    {
        self.insert_with(pos, n, iter::repeat_with(|| value.clone()))
    }

    pub fn insert_slice(&mut self, pos: usize, values: &[T]) -> Result<(), SeqError>
    where
        T: Clone,
    {
        self.insert_with(pos, values.len(), values.iter().cloned())
    }

    /// Insert the items of an iterator of known length before `pos`. An
    /// iterator that yields fewer items than it reported inserts what it
    /// yields; extra items are not consumed.
    pub fn insert_iter<I>(&mut self, pos: usize, iter: I) -> Result<(), SeqError>
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: ExactSizeIterator,
    {
        let iter = iter.into_iter();
        self.insert_with(pos, iter.len(), iter)
    }

    pub fn extend_from_slice(&mut self, values: &[T]) -> Result<(), SeqError>
    where
        T: Clone,
    {
        let end = self.len();
        self.insert_slice(end, values)
    }

    fn insert_with<I>(&mut self, pos: usize, count: usize, values: I) -> Result<(), SeqError>
    where
        I: Iterator<Item = T>,
    {
        check_position(pos, self.len())?;
        if count == 0 {
            return Ok(());
        }

        let mut gap = self.raw.open_gap(pos, count, 0)?;
        gap.extend(values);
        gap.commit();
        Ok(())
    }

    /// Remove and return the element at `pos`.
    pub fn erase(&mut self, pos: usize) -> Result<T, SeqError> {
        check_index(pos, self.len())?;
        Ok(self.raw.remove(pos))
    }

    pub fn erase_range(&mut self, range: Range<usize>) -> Result<(), SeqError> {
        let len = self.len();
        check_position(range.end, len)?;
        check_position(range.start, range.end)?;
        self.raw.remove_range(range.start, range.end);
        Ok(())
    }

    pub fn truncate(&mut self, len: usize) {
        self.raw.truncate(len);
    }

    /// Destroy every element. Capacity is kept.
    pub fn clear(&mut self) {
        self.raw.truncate(0);
    }

    pub fn resize(&mut self, len: usize, value: &T) -> Result<(), SeqError>
    where
        T: Clone,
    {
        self.resize_with(len, || value.clone())
    }

    pub fn resize_default(&mut self, len: usize) -> Result<(), SeqError>
    where
        T: Default,
    {
        self.resize_with(len, T::default)
    }

    fn resize_with<F>(&mut self, len: usize, make: F) -> Result<(), SeqError>
    where
        F: FnMut() -> T,
    {
        let current = self.len();
        if len <= current {
            self.raw.truncate(len);
            return Ok(());
        }

        self.insert_with(current, len - current, iter::repeat_with(make))
    }

    /// Replace the contents with clones of `values`.
    ///
    /// When the capacity suffices, existing elements are assigned over and
    /// the block is kept. Otherwise the new contents are built in a block of
    /// exactly `values.len()` and the old block is released only once that
    /// succeeded.
    pub fn assign_slice(&mut self, values: &[T]) -> Result<(), SeqError>
    where
        T: Clone,
    {
        if values.len() > self.capacity() {
            return self.raw.rebuild(values.len(), |fresh| {
                fresh.extend_within_capacity(values.iter().cloned())
            });
        }

        let common = values.len().min(self.len());
        self.as_mut_slice()[..common].clone_from_slice(&values[..common]);

        if values.len() < self.len() {
            self.raw.truncate(values.len());
        } else {
            self.raw.extend_within_capacity(values[common..].iter().cloned());
        }

        Ok(())
    }

    /// Replace the contents with `n` clones of `value`, in place when the
    /// capacity suffices.
    pub fn assign_n(&mut self, n: usize, value: &T) -> Result<(), SeqError>
    where
        T: Clone,
    {
        if n > self.capacity() {
            return self.raw.rebuild(n, |fresh| {
                fresh.extend_within_capacity(iter::repeat_with(|| value.clone()))
            });
        }

        let common = n.min(self.len());
        for slot in &mut self.as_mut_slice()[..common] {
            slot.clone_from(value);
        }

        if n < self.len() {
            self.raw.truncate(n);
        } else {
            self.raw.extend_within_capacity(iter::repeat_with(|| value.clone()).take(n - common));
        }

        Ok(())
    }

    /// Exchange contents, capacities and allocators. Never allocates.
    pub fn swap(&mut self, other: &mut Self) {
        self.raw.swap(&mut other.raw);
    }
}

impl<T> Default for DynArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, A: RawAlloc> Deref for DynArray<T, A> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T, A: RawAlloc> DerefMut for DynArray<T, A> {
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T, A: RawAlloc> AsRef<[T]> for DynArray<T, A> {
    fn as_ref(&self) -> &[T] {
        self
    }
}

impl<'a, T, A: RawAlloc> IntoIterator for &'a DynArray<T, A> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_slice().iter()
    }
}

impl<'a, T, A: RawAlloc> IntoIterator for &'a mut DynArray<T, A> {
    type Item = &'a mut T;
    type IntoIter = slice::IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_mut_slice().iter_mut()
    }
}

impl<T: Debug, A: RawAlloc> Debug for DynArray<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T, U, A: RawAlloc, B: RawAlloc> PartialEq<DynArray<U, B>> for DynArray<T, A>
where
    T: PartialEq<U>,
{
    fn eq(&self, other: &DynArray<U, B>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T, U, A: RawAlloc> PartialEq<[U]> for DynArray<T, A>
where
    T: PartialEq<U>,
{
    fn eq(&self, other: &[U]) -> bool {
        self.as_slice() == other
    }
}

impl<T, U, A: RawAlloc, const N: usize> PartialEq<[U; N]> for DynArray<T, A>
where
    T: PartialEq<U>,
{
    fn eq(&self, other: &[U; N]) -> bool {
        self.as_slice() == other
    }
}

impl<T: Eq, A: RawAlloc> Eq for DynArray<T, A> {}

impl<T: PartialOrd, A: RawAlloc, B: RawAlloc> PartialOrd<DynArray<T, B>> for DynArray<T, A> {
    fn partial_cmp(&self, other: &DynArray<T, B>) -> Option<Ordering> {
        self.as_slice().partial_cmp(other.as_slice())
    }
}

impl<T: Ord, A: RawAlloc> Ord for DynArray<T, A> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_slice().cmp(other.as_slice())
    }
}

impl<T: Hash, A: RawAlloc> Hash for DynArray<T, A> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_slice().hash(state)
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{self, AssertUnwindSafe};

    use seqbuf_alloc::Tracking;

    use super::*;
    use crate::testing::{values, ProbeCounter};

    #[test]
    fn construction() {
        let empty = DynArray::<u32>::new();
        assert!(empty.is_empty());
        assert_eq!(empty.capacity(), 0);

        let zeroes = DynArray::<u32>::with_len(4).unwrap();
        assert_eq!(zeroes, [0, 0, 0, 0]);
        assert_eq!(zeroes.capacity(), 4);

        let fives = DynArray::from_elem(3, &5u8).unwrap();
        assert_eq!(fives, [5, 5, 5]);

        let copied = DynArray::from_slice(&[1, 2, 3]).unwrap();
        let collected = DynArray::try_from_iter([1, 2, 3]).unwrap();
        assert_eq!(copied, collected);

        let cloned = copied.try_clone().unwrap();
        assert_eq!(cloned, copied);
        assert_eq!(cloned.capacity(), 3);
        assert_ne!(cloned.as_ptr(), copied.as_ptr());
    }

    #[test]
    fn front_back_and_checked_access() {
        let mut array = DynArray::new();
        for v in [1, 2, 3] {
            array.push_back(v).unwrap();
        }
        assert_eq!(array.len(), 3);
        assert_eq!(array.front(), Some(&1));
        assert_eq!(array.back(), Some(&3));

        *array.back_mut().unwrap() = 4;
        assert_eq!(array.at(2), Ok(&4));
        assert_eq!(array.at(3), Err(SeqError::OutOfRange { pos: 3, len: 3 }));
        *array.at_mut(0).unwrap() = 0;
        assert_eq!(array, [0, 2, 4]);

        let empty = DynArray::<u8>::new();
        assert_eq!(empty.front(), None);
        assert_eq!(empty.back(), None);
    }

    #[test]
    fn appends_reallocate_logarithmically() {
        let tracker = Tracking::new();
        let mut array = DynArray::new_in(&tracker);
        for v in 0..1000u32 {
            array.push_back(v).unwrap();
        }
        assert_eq!(array.len(), 1000);
        assert!(array.iter().copied().eq(0..1000));
        // capacities 1, 2, 4, .., 1024
        assert_eq!(tracker.stats().allocations, 11);
        assert_eq!(tracker.stats().live_blocks(), 1);
    }

    #[test]
    fn reserved_appends_never_reallocate() {
        let tracker = Tracking::new();
        let mut array = DynArray::new_in(&tracker);
        array.reserve(100).unwrap();
        assert_eq!(array.capacity(), 100);
        let before = tracker.stats().allocations;

        for v in 0..100u64 {
            array.push_back(v).unwrap();
        }
        assert_eq!(tracker.stats().allocations, before);

        array.reserve(10).unwrap();
        assert_eq!(array.capacity(), 100);
    }

    #[test]
    fn insert_n_reallocates_once() {
        let tracker = Tracking::new();
        let mut array = DynArray::from_slice_in(&[1, 2, 3], &tracker).unwrap();
        let before = tracker.stats().allocations;

        array.insert_n(1, 2, &9).unwrap();
        assert_eq!(array, [1, 9, 9, 2, 3]);
        assert_eq!(array.capacity(), 6);
        assert_eq!(tracker.stats().allocations, before + 1);
    }

    #[test]
    fn inserts_in_place() {
        let mut array = DynArray::try_from_iter(0..5).unwrap();
        array.reserve(16).unwrap();
        let ptr = array.as_ptr();

        // tail longer than the inserted run
        array.insert_n(1, 2, &9).unwrap();
        assert_eq!(array, [0, 9, 9, 1, 2, 3, 4]);

        // tail shorter than the inserted run
        array.insert_slice(5, &[7, 7, 7, 7, 7, 7]).unwrap();
        assert_eq!(array, [0, 9, 9, 1, 2, 7, 7, 7, 7, 7, 7, 3, 4]);

        assert_eq!(array.insert(13, 5), Ok(13));
        assert_eq!(array.insert(0, -1), Ok(0));
        assert_eq!(array.back(), Some(&5));
        assert_eq!(array.front(), Some(&-1));
        assert_eq!(array.as_ptr(), ptr);
    }

    #[test]
    fn insert_past_end_is_rejected() {
        let mut array = DynArray::from_slice(&[1, 2]).unwrap();
        assert_eq!(array.insert(3, 0), Err(SeqError::OutOfRange { pos: 3, len: 2 }));
        assert_eq!(array.insert_n(3, 0, &0), Err(SeqError::OutOfRange { pos: 3, len: 2 }));
        assert_eq!(array, [1, 2]);
    }

    #[test]
    fn insert_iter_and_defaults() {
        let mut array = DynArray::<u16>::new();
        array.insert_iter(0, [3, 4]).unwrap();
        array.insert_iter(0, [1, 2].iter().copied()).unwrap();
        array.insert_default(4).unwrap();
        array.push_back_default().unwrap();
        array.extend_from_slice(&[8]).unwrap();
        assert_eq!(array, [1, 2, 3, 4, 0, 0, 8]);
    }

    #[test]
    fn erase_keeps_capacity() {
        let mut array = DynArray::try_from_iter(0..8).unwrap();
        assert_eq!(array.erase(0), Ok(0));
        assert_eq!(array.erase(6), Ok(7));
        assert_eq!(array.erase(6), Err(SeqError::OutOfRange { pos: 6, len: 6 }));

        array.erase_range(1..3).unwrap();
        assert_eq!(array, [1, 4, 5, 6]);
        array.erase_range(2..2).unwrap();
        assert_eq!(array.erase_range(3..5), Err(SeqError::OutOfRange { pos: 5, len: 4 }));
        assert_eq!(array.capacity(), 8);

        assert_eq!(array.pop_back(), Some(6));
        array.clear();
        assert!(array.is_empty());
        assert_eq!(array.pop_back(), None);
        assert_eq!(array.capacity(), 8);
    }

    #[test]
    fn erase_destroys_removed_elements() {
        let counter = ProbeCounter::new();
        let mut array = DynArray::try_from_iter((0..6).map(|v| counter.probe(v))).unwrap();

        array.erase_range(2..5).unwrap();
        assert_eq!(counter.live(), 3);
        drop(array.erase(0));
        assert_eq!(counter.live(), 2);
        assert_eq!(values(&array), [1, 5]);

        drop(array);
        assert_eq!(counter.live(), 0);
    }

    #[test]
    fn resize_grows_and_shrinks() {
        let mut array = DynArray::from_slice(&[1, 2, 3]).unwrap();
        array.resize(5, &7).unwrap();
        assert_eq!(array, [1, 2, 3, 7, 7]);
        array.resize(2, &0).unwrap();
        assert_eq!(array, [1, 2]);
        array.resize_default(4).unwrap();
        assert_eq!(array, [1, 2, 0, 0]);
        array.resize(4, &9).unwrap();
        assert_eq!(array, [1, 2, 0, 0]);
    }

    #[test]
    fn assign_reuses_capacity() {
        let tracker = Tracking::new();
        let mut array = DynArray::from_slice_in(&[1, 2, 3, 4, 5, 6], &tracker).unwrap();

        array.assign_n(2, &6).unwrap();
        assert_eq!(array, [6, 6]);
        assert_eq!(array.capacity(), 6);

        array.assign_slice(&[1, 2, 3, 4]).unwrap();
        assert_eq!(array, [1, 2, 3, 4]);
        assert_eq!(array.capacity(), 6);
        assert_eq!(tracker.stats().allocations, 1);

        array.assign_n(10, &3).unwrap();
        assert_eq!(array.len(), 10);
        assert_eq!(array.capacity(), 10);
        assert_eq!(tracker.stats().live_blocks(), 1);

        array.assign_slice(&[]).unwrap();
        assert!(array.is_empty());
        assert_eq!(array.capacity(), 10);
    }

    #[test]
    fn shrink_to_fit_releases_spare() {
        let mut array = DynArray::<u8>::new();
        array.reserve(64).unwrap();
        array.extend_from_slice(b"abc").unwrap();
        array.shrink_to_fit().unwrap();
        assert_eq!(array.capacity(), 3);
        assert_eq!(array, *b"abc");
    }

    #[test]
    fn length_limit_leaves_array_unchanged() {
        let mut array = DynArray::from_slice(&[1u64, 2]).unwrap();
        let err = array.reserve(DynArray::<u64>::max_len() + 1).unwrap_err();
        assert!(matches!(err, SeqError::LengthLimit { .. }));

        let err = array.assign_n(usize::MAX, &0).unwrap_err();
        assert!(matches!(err, SeqError::LengthLimit { .. }));
        assert_eq!(array, [1, 2]);
        assert_eq!(array.capacity(), 2);
    }

    #[test]
    fn failed_growth_leaves_array_unchanged() {
        let tracker = Tracking::new();
        let mut array = DynArray::from_slice_in(&[1, 2, 3], &tracker).unwrap();
        tracker.fail_after(0);

        assert!(matches!(array.push_back(4), Err(SeqError::Alloc(_))));
        assert!(matches!(array.insert_slice(1, &[5, 6]), Err(SeqError::Alloc(_))));
        assert!(matches!(array.assign_n(8, &0), Err(SeqError::Alloc(_))));
        assert_eq!(array, [1, 2, 3]);
        assert_eq!(array.capacity(), 3);

        tracker.clear_budget();
        array.push_back(4).unwrap();
        assert_eq!(array, [1, 2, 3, 4]);
    }

    #[test]
    fn panicking_clone_during_growth_rolls_back() {
        let counter = ProbeCounter::new();
        let tracker = Tracking::new();
        let mut array = DynArray::new_in(&tracker);
        for v in 0..3 {
            array.push_back(counter.probe(v)).unwrap();
        }
        let capacity = array.capacity();
        let seed = counter.probe(9);

        counter.panic_after_clones(2);
        let result = panic::catch_unwind(AssertUnwindSafe(|| array.insert_n(1, 5, &seed)));
        assert!(result.is_err());

        assert_eq!(values(&array), [0, 1, 2]);
        assert_eq!(array.capacity(), capacity);
        assert_eq!(counter.live(), 4);
        assert_eq!(tracker.stats().live_blocks(), 1);
    }

    #[test]
    fn panicking_clone_in_place_rolls_back() {
        let counter = ProbeCounter::new();
        let mut array = DynArray::new();
        array.reserve(10).unwrap();
        for v in 0..4 {
            array.push_back(counter.probe(v)).unwrap();
        }
        let seed = counter.probe(9);

        counter.panic_after_clones(1);
        let result = panic::catch_unwind(AssertUnwindSafe(|| array.insert_n(2, 3, &seed)));
        assert!(result.is_err());

        assert_eq!(values(&array), [0, 1, 2, 3]);
        assert_eq!(counter.live(), 5);
    }

    #[test]
    fn panicking_clone_during_construction_releases_block() {
        let counter = ProbeCounter::new();
        let tracker = Tracking::new();
        let seed = counter.probe(1);

        counter.panic_after_clones(3);
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            DynArray::from_elem_in(6, &seed, &tracker)
        }));
        assert!(result.is_err());

        assert_eq!(counter.live(), 1);
        assert_eq!(tracker.stats().allocations, 1);
        assert_eq!(tracker.stats().live_blocks(), 0);
    }

    #[test]
    fn panicking_clone_during_rebuild_keeps_contents() {
        let counter = ProbeCounter::new();
        let mut array = DynArray::try_from_iter([counter.probe(1)]).unwrap();
        let source = [counter.probe(2), counter.probe(3), counter.probe(4)];

        counter.panic_after_clones(1);
        let result = panic::catch_unwind(AssertUnwindSafe(|| array.assign_slice(&source)));
        assert!(result.is_err());

        assert_eq!(values(&array), [1]);
        assert_eq!(counter.live(), 4);
    }

    #[test]
    fn panicking_drop_during_rebuild_keeps_new_contents() {
        let counter = ProbeCounter::new();
        let tracker = Tracking::new();
        let mut array = DynArray::from_slice_in(&[counter.probe(1)], &tracker).unwrap();
        let source = [counter.probe(2), counter.probe(3), counter.probe(4)];
        assert_eq!(array.capacity(), 1);

        counter.panic_on_drop_of(1);
        let result = panic::catch_unwind(AssertUnwindSafe(|| array.assign_slice(&source)));
        assert!(result.is_err());

        assert_eq!(values(&array), [2, 3, 4]);
        assert_eq!(counter.live(), 6);
        assert_eq!(tracker.stats().live_blocks(), 1);

        drop(array);
        assert_eq!(counter.live(), 3);
        assert_eq!(tracker.stats().live_blocks(), 0);
    }

    #[test]
    fn swap_exchanges_without_allocating() {
        let tracker = Tracking::new();
        let mut a = DynArray::from_slice_in(&[1, 2], &tracker).unwrap();
        let mut b = DynArray::from_slice_in(&[3, 4, 5], &tracker).unwrap();
        let allocations = tracker.stats().allocations;

        a.swap(&mut b);
        assert_eq!(a, [3, 4, 5]);
        assert_eq!(b, [1, 2]);
        assert_eq!(tracker.stats().allocations, allocations);
    }

    #[test]
    fn ordering_is_lexicographic() {
        let short = DynArray::from_slice(&[1, 2]).unwrap();
        let long = DynArray::from_slice(&[1, 2, 0]).unwrap();
        let bigger = DynArray::from_slice(&[1, 3]).unwrap();

        assert!(short < long);
        assert!(long < bigger);
        assert_eq!(short.cmp(&short.try_clone().unwrap()), Ordering::Equal);
        assert_eq!(format!("{short:?}"), "[1, 2]");
    }

    #[test]
    fn zero_sized_elements() {
        let tracker = Tracking::new();
        let mut array = DynArray::new_in(&tracker);
        for _ in 0..10 {
            array.push_back(()).unwrap();
        }
        array.erase_range(2..5).unwrap();
        assert_eq!(array.len(), 7);
        assert_eq!(tracker.stats().allocations, 0);
    }

    mod proptests {
        use proptest::prelude::*;

        use super::*;

        #[derive(Debug, Clone)]
        enum Op {
            Push(u8),
            Pop,
            Insert(usize, Vec<u8>),
            Erase(usize, usize),
            Resize(usize, u8),
            Assign(Vec<u8>),
            Reserve(usize),
            Shrink,
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![
                any::<u8>().prop_map(Op::Push),
                Just(Op::Pop),
                (any::<usize>(), prop::collection::vec(any::<u8>(), 0..12))
                    .prop_map(|(at, v)| Op::Insert(at, v)),
                (any::<usize>(), 0usize..8).prop_map(|(at, n)| Op::Erase(at, n)),
                (0usize..40, any::<u8>()).prop_map(|(n, v)| Op::Resize(n, v)),
                prop::collection::vec(any::<u8>(), 0..24).prop_map(Op::Assign),
                (0usize..64).prop_map(Op::Reserve),
                Just(Op::Shrink),
            ]
        }

        proptest! {
            #[test]
            fn behaves_like_vec(ops in prop::collection::vec(op(), 0..64)) {
                let mut array = DynArray::<u8>::new();
                let mut model = Vec::<u8>::new();

                for op in ops {
                    match op {
                        Op::Push(v) => {
                            array.push_back(v).unwrap();
                            model.push(v);
                        }
                        Op::Pop => {
                            prop_assert_eq!(array.pop_back(), model.pop());
                        }
                        Op::Insert(at, values) => {
                            let at = at % (model.len() + 1);
                            array.insert_slice(at, &values).unwrap();
                            model.splice(at..at, values).for_each(drop);
                        }
                        Op::Erase(at, n) => {
                            let at = at % (model.len() + 1);
                            let end = (at + n).min(model.len());
                            array.erase_range(at..end).unwrap();
                            model.drain(at..end);
                        }
                        Op::Resize(n, v) => {
                            array.resize(n, &v).unwrap();
                            model.resize(n, v);
                        }
                        Op::Assign(values) => {
                            array.assign_slice(&values).unwrap();
                            model = values;
                        }
                        Op::Reserve(n) => {
                            array.reserve(n).unwrap();
                            prop_assert!(array.capacity() >= n);
                        }
                        Op::Shrink => {
                            array.shrink_to_fit().unwrap();
                            prop_assert_eq!(array.capacity(), model.len());
                        }
                    }

                    prop_assert!(array.len() <= array.capacity());
                    prop_assert_eq!(array.as_slice(), model.as_slice());
                }
            }

            #[test]
            fn insert_then_erase_restores(
                base in prop::collection::vec(any::<u32>(), 0..32),
                extra in prop::collection::vec(any::<u32>(), 0..32),
                at in any::<usize>(),
            ) {
                let at = at % (base.len() + 1);
                let mut array = DynArray::from_slice(&base).unwrap();
                array.insert_slice(at, &extra).unwrap();
                prop_assert_eq!(array.len(), base.len() + extra.len());
                array.erase_range(at..at + extra.len()).unwrap();
                prop_assert_eq!(array.as_slice(), base.as_slice());
            }

            #[test]
            fn assign_is_idempotent(
                base in prop::collection::vec(any::<u16>(), 0..32),
                values in prop::collection::vec(any::<u16>(), 0..32),
            ) {
                let mut array = DynArray::from_slice(&base).unwrap();
                array.assign_slice(&values).unwrap();
                let capacity = array.capacity();
                array.assign_slice(&values).unwrap();
                prop_assert_eq!(array.as_slice(), values.as_slice());
                prop_assert_eq!(array.capacity(), capacity);
            }
        }
    }
}
