//! A growable buffer of character-like elements that always keeps a
//! terminator, one zero element, directly after its contents.

use core::cmp::Ordering;
use core::ffi::CStr;
use core::fmt::{self, Debug, Display};
use core::hash::{Hash, Hasher};
use core::iter;
use core::ops::{Deref, DerefMut, Range};
use core::str::{FromStr, Utf8Error};

use bytemuck::{Pod, Zeroable};
use seqbuf_alloc::{Global, RawAlloc};
use static_assertions::{assert_impl_all, assert_not_impl_any};

use crate::algo;
use crate::error::{check_index, check_position, sub_range, SeqError};
use crate::raw::RawStorage;

/// Element types a [`DynBuffer`] can hold. The all-zero value is the
/// terminator.
pub trait CharLike: Copy + Zeroable + Ord + 'static {}

impl<T: Copy + Zeroable + Ord + 'static> CharLike for T {}

/// "No position", accepted wherever a count means "to the end".
pub const NPOS: usize = usize::MAX;

/// Capacity of a buffer created empty.
pub const DEFAULT_CAPACITY: usize = 7;

pub type ByteBuffer<A = Global> = DynBuffer<u8, A>;

/// Growable character buffer.
///
/// The block always has one slot more than [`capacity`](DynBuffer::capacity)
/// reports, and slot `len()` always holds `T::zeroed()`, so the contents
/// can be handed out with their terminator at any time through
/// [`with_terminator`](DynBuffer::with_terminator).
///
/// Fallible operations leave the buffer unchanged when they return an
/// error. Positions past `len()` are [`SeqError::OutOfRange`]; counts are
/// clamped to what is available, so [`NPOS`] means "everything after".
pub struct DynBuffer<T: CharLike = u8, A: RawAlloc = Global> {
    raw: RawStorage<T, A>,
}

assert_impl_all!(ByteBuffer: Send, Sync, FromStr, Display);
assert_not_impl_any!(ByteBuffer: Clone, Copy);

impl<T: CharLike> DynBuffer<T> {
    pub fn new() -> Result<Self, SeqError> {
        Self::new_in(Global)
    }

    pub fn with_capacity(cap: usize) -> Result<Self, SeqError> {
        Self::with_capacity_in(cap, Global)
    }

    pub fn from_slice(src: &[T]) -> Result<Self, SeqError> {
        Self::from_slice_in(src, Global)
    }

    pub fn from_elem(n: usize, c: T) -> Result<Self, SeqError> {
        Self::from_elem_in(n, c, Global)
    }

    pub fn from_sub(src: &[T], pos: usize, n: usize) -> Result<Self, SeqError> {
        Self::from_sub_in(src, pos, n, Global)
    }
}

impl<T: CharLike, A: RawAlloc> DynBuffer<T, A> {
    pub fn new_in(alloc: A) -> Result<Self, SeqError> {
        Self::with_capacity_in(DEFAULT_CAPACITY, alloc)
    }

    pub fn with_capacity_in(cap: usize, alloc: A) -> Result<Self, SeqError> {
        Self::build_in(cap, alloc, iter::empty())
    }

    pub fn from_slice_in(src: &[T], alloc: A) -> Result<Self, SeqError> {
        Self::build_in(src.len(), alloc, src.iter().copied())
    }

    pub fn from_elem_in(n: usize, c: T, alloc: A) -> Result<Self, SeqError> {
        Self::build_in(n, alloc, iter::repeat(c))
    }

    /// The `(pos, n)` sub-range of `src` as a new buffer.
    pub fn from_sub_in(src: &[T], pos: usize, n: usize, alloc: A) -> Result<Self, SeqError> {
        let range = sub_range(src.len(), pos, n)?;
        Self::from_slice_in(&src[range], alloc)
    }

    pub fn try_clone(&self) -> Result<Self, SeqError>
    where
        A: Clone,
    {
        Self::from_slice_in(self, self.raw.allocator().clone())
    }

    /// Copy of the `(pos, n)` sub-range, sharing this buffer's allocator.
    pub fn substr(&self, pos: usize, n: usize) -> Result<Self, SeqError>
    where
        A: Clone,
    {
        Self::from_sub_in(self, pos, n, self.raw.allocator().clone())
    }

    fn build_in<I>(cap: usize, alloc: A, chars: I) -> Result<Self, SeqError>
    where
        I: Iterator<Item = T>,
    {
        let max = Self::max_len();
        if cap > max {
            return Err(SeqError::LengthLimit { requested: cap, max });
        }

        let mut raw = RawStorage::with_capacity_in(cap + 1, alloc)?;
        raw.extend_within_capacity(chars.take(cap));

        let mut buffer = DynBuffer { raw };
        buffer.ensure_terminator();
        Ok(buffer)
    }

    /// One slot is always kept for the terminator.
    pub fn max_len() -> usize {
        RawStorage::<T, A>::max_len() - 1
    }

    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Elements the buffer can hold without reallocating, not counting the
    /// terminator slot.
    pub fn capacity(&self) -> usize {
        self.raw.capacity() - 1
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

    /// The contents followed by the terminator.
    pub fn with_terminator(&self) -> &[T] {
        // SAFETY: slot len is inside the block and always initialized
        unsafe { core::slice::from_raw_parts(self.raw.as_ptr(), self.len() + 1) }
    }

    /// Pointer to the first element of a terminated run of `len() + 1`.
    pub fn as_ptr(&self) -> *const T {
        self.raw.as_ptr()
    }

    pub fn at(&self, pos: usize) -> Result<T, SeqError> {
        check_index(pos, self.len())?;
        Ok(self.as_slice()[pos])
    }

    pub fn at_mut(&mut self, pos: usize) -> Result<&mut T, SeqError> {
        check_index(pos, self.len())?;
        Ok(&mut self.as_mut_slice()[pos])
    }

    fn ensure_terminator(&mut self) {
        debug_assert!(self.raw.capacity() > self.raw.len());

        // SAFETY: every mutation keeps the block one slot longer than len
        unsafe { self.raw.slot(self.raw.len()).write(T::zeroed()) }
    }

    fn check_growth(&self, additional: usize) -> Result<(), SeqError> {
        let max = Self::max_len();
        match self.len().checked_add(additional) {
            Some(requested) if requested <= max => Ok(()),
            requested => Err(SeqError::LengthLimit {
                requested: requested.unwrap_or(usize::MAX),
                max,
            }),
        }
    }

    /// Make the capacity at least `n`. Never shrinks; see
    /// [`shrink_to_fit`](DynBuffer::shrink_to_fit).
    pub fn reserve(&mut self, n: usize) -> Result<(), SeqError> {
        let max = Self::max_len();
        if n > max {
            return Err(SeqError::LengthLimit { requested: n, max });
        }

        if n <= self.capacity() {
            return Ok(());
        }

        log::debug!("buffer reserve: capacity {} -> {}", self.capacity(), n);
        self.raw.relocate(n + 1)?;
        self.ensure_terminator();
        Ok(())
    }

    pub fn shrink_to_fit(&mut self) -> Result<(), SeqError> {
        let slots = self.len() + 1;
        self.raw.relocate(slots)?;
        self.ensure_terminator();
        Ok(())
    }

    /// Replace `range` with `count` elements, element `i` given by
    /// `char_at(i)`. The single primitive behind every edit.
    ///
    /// Growth happens first, by splicing the elements beyond the old
    /// range's length in after it; only then is the old range overwritten.
    /// A failed allocation therefore changes nothing, and any reallocation
    /// is a single one.
    fn replace_with<F>(&mut self, range: Range<usize>, count: usize, char_at: F) -> Result<(), SeqError>
    where
        F: Fn(usize) -> T,
    {
        let old = range.len();

        if count > old {
            self.check_growth(count - old)?;

            let mut gap = self.raw.open_gap(range.end, count - old, 1)?;
            gap.extend((old..count).map(&char_at));
            gap.commit();
        }

        let overwrite = old.min(count);
        let dst = &mut self.as_mut_slice()[range.start..range.start + overwrite];
        for (i, slot) in dst.iter_mut().enumerate() {
            *slot = char_at(i);
        }

        if count < old {
            self.raw.remove_range(range.start + count, range.end);
        }

        self.ensure_terminator();
        Ok(())
    }

    pub fn push_back(&mut self, c: T) -> Result<(), SeqError> {
        let end = self.len();
        self.replace_with(end..end, 1, |_| c)
    }

    pub fn pop_back(&mut self) -> Option<T> {
        let c = self.raw.pop()?;
        self.ensure_terminator();
        Some(c)
    }

    /// Destroy the contents, keeping the capacity.
    pub fn clear(&mut self) {
        self.raw.truncate(0);
        self.ensure_terminator();
    }

    pub fn truncate(&mut self, n: usize) {
        self.raw.truncate(n);
        self.ensure_terminator();
    }

    pub fn resize(&mut self, n: usize, c: T) -> Result<(), SeqError> {
        let len = self.len();
        if n <= len {
            self.truncate(n);
            return Ok(());
        }
        self.append_n(n - len, c)
    }

    pub fn append(&mut self, src: &[T]) -> Result<(), SeqError> {
        let end = self.len();
        self.replace_with(end..end, src.len(), |i| src[i])
    }

    pub fn append_n(&mut self, n: usize, c: T) -> Result<(), SeqError> {
        let end = self.len();
        self.replace_with(end..end, n, |_| c)
    }

    /// Append the `(pos, n)` sub-range of `src`.
    pub fn append_sub(&mut self, src: &[T], pos: usize, n: usize) -> Result<(), SeqError> {
        let range = sub_range(src.len(), pos, n)?;
        self.append(&src[range])
    }

    /// Replace the contents with `src`, reusing the block when it fits.
    pub fn assign(&mut self, src: &[T]) -> Result<(), SeqError> {
        let len = self.len();
        self.replace_with(0..len, src.len(), |i| src[i])
    }

    pub fn assign_n(&mut self, n: usize, c: T) -> Result<(), SeqError> {
        let len = self.len();
        self.replace_with(0..len, n, |_| c)
    }

    pub fn assign_sub(&mut self, src: &[T], pos: usize, n: usize) -> Result<(), SeqError> {
        let range = sub_range(src.len(), pos, n)?;
        self.assign(&src[range])
    }

    /// Insert `src` before `pos`.
    pub fn insert(&mut self, pos: usize, src: &[T]) -> Result<(), SeqError> {
        check_position(pos, self.len())?;
        self.replace_with(pos..pos, src.len(), |i| src[i])
    }

    pub fn insert_n(&mut self, pos: usize, n: usize, c: T) -> Result<(), SeqError> {
        check_position(pos, self.len())?;
        self.replace_with(pos..pos, n, |_| c)
    }

    /// Insert one element before `pos`, returning the position it landed at.
    pub fn insert_elem(&mut self, pos: usize, c: T) -> Result<usize, SeqError> {
        self.insert_n(pos, 1, c)?;
        Ok(pos)
    }

    /// Insert the `(spos, n)` sub-range of `src` before `pos`.
    pub fn insert_sub(&mut self, pos: usize, src: &[T], spos: usize, n: usize) -> Result<(), SeqError> {
        let range = sub_range(src.len(), spos, n)?;
        self.insert(pos, &src[range])
    }

    /// Remove up to `n` elements starting at `pos`.
    pub fn erase(&mut self, pos: usize, n: usize) -> Result<(), SeqError> {
        let range = sub_range(self.len(), pos, n)?;
        self.replace_with(range, 0, |_| T::zeroed())
    }

    /// Remove and return the element at `pos`.
    pub fn erase_at(&mut self, pos: usize) -> Result<T, SeqError> {
        check_index(pos, self.len())?;
        let c = self.raw.remove(pos);
        self.ensure_terminator();
        Ok(c)
    }

    /// Replace up to `n` elements at `pos` with `src`. At most one
    /// reallocation.
    pub fn replace(&mut self, pos: usize, n: usize, src: &[T]) -> Result<(), SeqError> {
        let range = sub_range(self.len(), pos, n)?;
        self.replace_with(range, src.len(), |i| src[i])
    }

    pub fn replace_n(&mut self, pos: usize, n: usize, count: usize, c: T) -> Result<(), SeqError> {
        let range = sub_range(self.len(), pos, n)?;
        self.replace_with(range, count, |_| c)
    }

    pub fn replace_sub(
        &mut self,
        pos: usize,
        n: usize,
        src: &[T],
        spos: usize,
        sn: usize,
    ) -> Result<(), SeqError> {
        let src_range = sub_range(src.len(), spos, sn)?;
        self.replace(pos, n, &src[src_range])
    }

    pub fn swap(&mut self, other: &mut Self) {
        self.raw.swap(&mut other.raw);
    }

    /// First occurrence of `needle` starting at or after `pos`.
    pub fn find(&self, needle: &[T], pos: usize) -> Option<usize> {
        let len = self.len();
        if pos > len || needle.len() > len - pos {
            return None;
        }
        algo::search(&self[pos..], needle, T::eq).map(|i| i + pos)
    }

    pub fn find_elem(&self, c: T, pos: usize) -> Option<usize> {
        let tail = self.get(pos..)?;
        tail.iter().position(|&x| x == c).map(|i| i + pos)
    }

    /// Last occurrence of `needle` starting at or before `pos`.
    pub fn rfind(&self, needle: &[T], pos: usize) -> Option<usize> {
        let (len, n) = (self.len(), needle.len());
        if n > len {
            return None;
        }
        if n == 0 {
            return Some(len.min(pos));
        }

        let last = (len - n).min(pos) + n;
        algo::find_end(&self[..last], needle, T::eq)
    }

    pub fn rfind_elem(&self, c: T, pos: usize) -> Option<usize> {
        self.head_through(pos)?.iter().rposition(|&x| x == c)
    }

    pub fn find_first_of(&self, set: &[T], pos: usize) -> Option<usize> {
        let tail = self.get(pos..)?;
        algo::find_first_of(tail, set, T::eq).map(|i| i + pos)
    }

    pub fn find_first_not_of(&self, set: &[T], pos: usize) -> Option<usize> {
        let tail = self.get(pos..)?;
        algo::find_first_not_of(tail, set, T::eq).map(|i| i + pos)
    }

    pub fn find_last_of(&self, set: &[T], pos: usize) -> Option<usize> {
        algo::find_last_of(self.head_through(pos)?, set, T::eq)
    }

    pub fn find_last_not_of(&self, set: &[T], pos: usize) -> Option<usize> {
        algo::find_last_not_of(self.head_through(pos)?, set, T::eq)
    }

    /// Elements up to and including `pos`, clamped to the last one.
    fn head_through(&self, pos: usize) -> Option<&[T]> {
        let last = self.len().checked_sub(1)?;
        Some(&self[..=last.min(pos)])
    }

    /// Lexicographic comparison, a shorter prefix ordering first.
    pub fn compare(&self, other: &[T]) -> Ordering {
        self.as_slice().cmp(other)
    }

    /// Compare the `(pos, n)` sub-range of this buffer with `other`.
    pub fn compare_sub(&self, pos: usize, n: usize, other: &[T]) -> Result<Ordering, SeqError> {
        let range = sub_range(self.len(), pos, n)?;
        Ok(self[range].cmp(other))
    }

    /// Compare the `(pos1, n1)` sub-range of this buffer with the
    /// `(pos2, n2)` sub-range of `other`.
    pub fn compare_sub2(
        &self,
        pos1: usize,
        n1: usize,
        other: &[T],
        pos2: usize,
        n2: usize,
    ) -> Result<Ordering, SeqError> {
        let ours = sub_range(self.len(), pos1, n1)?;
        let theirs = sub_range(other.len(), pos2, n2)?;
        Ok(self[ours].cmp(&other[theirs]))
    }
}

impl<T: CharLike + Pod, A: RawAlloc> DynBuffer<T, A> {
    /// The contents as raw bytes, without the terminator.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.as_slice())
    }
}

impl<A: RawAlloc> DynBuffer<u8, A> {
    pub fn to_str(&self) -> Result<&str, Utf8Error> {
        core::str::from_utf8(self)
    }

    /// The terminated contents as a C string. Fails if the contents hold
    /// an interior zero byte.
    pub fn as_c_str(&self) -> Result<&CStr, core::ffi::FromBytesWithNulError> {
        CStr::from_bytes_with_nul(self.with_terminator())
    }
}

impl FromStr for DynBuffer<u8> {
    type Err = SeqError;

    fn from_str(s: &str) -> Result<Self, SeqError> {
        Self::from_slice(s.as_bytes())
    }
}

impl<A: RawAlloc> Display for DynBuffer<u8, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(self))
    }
}

impl<T: CharLike + Debug, A: RawAlloc> Debug for DynBuffer<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: CharLike, A: RawAlloc> Deref for DynBuffer<T, A> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T: CharLike, A: RawAlloc> DerefMut for DynBuffer<T, A> {
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T: CharLike, A: RawAlloc> AsRef<[T]> for DynBuffer<T, A> {
    fn as_ref(&self) -> &[T] {
        self
    }
}

impl<T: CharLike, A: RawAlloc, B: RawAlloc> PartialEq<DynBuffer<T, B>> for DynBuffer<T, A> {
    fn eq(&self, other: &DynBuffer<T, B>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: CharLike, A: RawAlloc> PartialEq<[T]> for DynBuffer<T, A> {
    fn eq(&self, other: &[T]) -> bool {
        self.as_slice() == other
    }
}

impl<T: CharLike, A: RawAlloc, const N: usize> PartialEq<[T; N]> for DynBuffer<T, A> {
    fn eq(&self, other: &[T; N]) -> bool {
        self.as_slice() == other
    }
}

impl<A: RawAlloc> PartialEq<str> for DynBuffer<u8, A> {
    fn eq(&self, other: &str) -> bool {
        self.as_slice() == other.as_bytes()
    }
}

impl<A: RawAlloc> PartialEq<&str> for DynBuffer<u8, A> {
    fn eq(&self, other: &&str) -> bool {
        self.as_slice() == other.as_bytes()
    }
}

impl<T: CharLike, A: RawAlloc> Eq for DynBuffer<T, A> {}

impl<T: CharLike, A: RawAlloc, B: RawAlloc> PartialOrd<DynBuffer<T, B>> for DynBuffer<T, A> {
    fn partial_cmp(&self, other: &DynBuffer<T, B>) -> Option<Ordering> {
        Some(self.compare(other))
    }
}

impl<T: CharLike, A: RawAlloc> Ord for DynBuffer<T, A> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl<T: CharLike + Hash, A: RawAlloc> Hash for DynBuffer<T, A> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_slice().hash(state)
    }
}
