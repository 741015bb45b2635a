//! Fixed-size bit set with a '0'/'1' text form.
//!
//! Text is most significant bit first: bit `i` of an `N`-bit set is the
//! character at offset `N - 1 - i`.

use core::fmt::{self, Debug};
use core::ops::{BitAndAssign, BitOrAssign, BitXorAssign};

use seqbuf_alloc::RawAlloc;

use crate::buffer::{ByteBuffer, DynBuffer};
use crate::error::{check_index, check_position, BitTextError, SeqError};

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FixedBitSet<const N: usize> {
    bits: [bool; N],
    count: usize,
}

impl<const N: usize> Default for FixedBitSet<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> FixedBitSet<N> {
    pub const fn new() -> Self {
        FixedBitSet { bits: [false; N], count: 0 }
    }

    /// Low `N` bits of `word`; bits past 64 stay clear.
    pub fn from_word(word: u64) -> Self {
        let mut set = Self::new();
        for i in 0..N.min(64) {
            if word & (1 << i) != 0 {
                set.insert(i);
            }
        }
        set
    }

    /// Parse up to `count` characters of `text` starting at `start`. The
    /// last character read becomes bit 0. Fewer characters than `N` leave
    /// the high bits clear.
    pub fn from_text(text: &[u8], start: usize, count: usize) -> Result<Self, BitTextError> {
        check_position(start, text.len())?;
        let nbits = N.min(count).min(text.len() - start);

        let mut set = Self::new();
        for i in 0..nbits {
            let offset = start + nbits - 1 - i;
            match text[offset] {
                b'0' => {}
                b'1' => {
                    set.insert(i);
                }
                digit => return Err(BitTextError::InvalidDigit { digit, offset }),
            }
        }

        Ok(set)
    }

    /// Render all `N` bits into `out`, replacing its contents.
    pub fn write_text<A: RawAlloc>(&self, out: &mut DynBuffer<u8, A>) -> Result<(), SeqError> {
        out.assign_n(N, b'0')?;
        for (i, _) in self.bits.iter().enumerate().filter(|(_, &bit)| bit) {
            out[N - 1 - i] = b'1';
        }
        Ok(())
    }

    pub fn to_text(&self) -> Result<ByteBuffer, SeqError> {
        let mut text = ByteBuffer::with_capacity(N)?;
        self.write_text(&mut text)?;
        Ok(text)
    }

    pub const fn len(&self) -> usize {
        N
    }

    pub const fn is_empty(&self) -> bool {
        N == 0
    }

    /// Number of set bits.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn any(&self) -> bool {
        self.count != 0
    }

    pub fn none(&self) -> bool {
        self.count == 0
    }

    pub fn all(&self) -> bool {
        self.count == N
    }

    /// False for positions past the end.
    pub fn test(&self, pos: usize) -> bool {
        pos < N && self.bits[pos]
    }

    pub fn set(&mut self, pos: usize) -> Result<(), SeqError> {
        check_index(pos, N)?;
        self.insert(pos);
        Ok(())
    }

    pub fn reset(&mut self, pos: usize) -> Result<(), SeqError> {
        check_index(pos, N)?;
        if self.bits[pos] {
            self.bits[pos] = false;
            self.count -= 1;
        }
        Ok(())
    }

    pub fn flip(&mut self, pos: usize) -> Result<(), SeqError> {
        check_index(pos, N)?;
        if self.bits[pos] {
            self.reset(pos)
        } else {
            self.set(pos)
        }
    }

    pub fn set_all(&mut self) {
        self.bits = [true; N];
        self.count = N;
    }

    pub fn clear(&mut self) {
        self.bits = [false; N];
        self.count = 0;
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.bits.iter().enumerate().filter(|(_, &bit)| bit).map(|(i, _)| i)
    }

    fn insert(&mut self, pos: usize) -> bool {
        if self.bits[pos] {
            return false;
        }
        self.bits[pos] = true;
        self.count += 1;
        true
    }

    fn combine(&mut self, other: &Self, op: impl Fn(bool, bool) -> bool) {
        for (bit, &theirs) in self.bits.iter_mut().zip(&other.bits) {
            *bit = op(*bit, theirs);
        }
        self.count = self.bits.iter().filter(|&&bit| bit).count();
    }
}

impl<const N: usize> BitAndAssign<&FixedBitSet<N>> for FixedBitSet<N> {
    fn bitand_assign(&mut self, rhs: &FixedBitSet<N>) {
        self.combine(rhs, |a, b| a & b);
    }
}

impl<const N: usize> BitOrAssign<&FixedBitSet<N>> for FixedBitSet<N> {
    fn bitor_assign(&mut self, rhs: &FixedBitSet<N>) {
        self.combine(rhs, |a, b| a | b);
    }
}

impl<const N: usize> BitXorAssign<&FixedBitSet<N>> for FixedBitSet<N> {
    fn bitxor_assign(&mut self, rhs: &FixedBitSet<N>) {
        self.combine(rhs, |a, b| a ^ b);
    }
}

impl<const N: usize> Debug for FixedBitSet<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FixedBitSet<{N}> {{ ")?;
        for bit in self.bits.iter().rev() {
            f.write_str(if *bit { "1" } else { "0" })?;
        }
        f.write_str(" }")
    }
}
