use core::ops::Range;

use seqbuf_alloc::AllocError;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SeqError {
    #[error("requested length {requested} exceeds maximum of {max}")]
    LengthLimit { requested: usize, max: usize },
    #[error("position {pos} out of range for length {len}")]
    OutOfRange { pos: usize, len: usize },
    #[error(transparent)]
    Alloc(#[from] AllocError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BitTextError {
    #[error(transparent)]
    Seq(#[from] SeqError),
    #[error("invalid bit digit {digit:#04x} at offset {offset}")]
    InvalidDigit { digit: u8, offset: usize },
}

/// `pos` may equal `len`: it names the end of the sequence.
pub(crate) fn check_position(pos: usize, len: usize) -> Result<(), SeqError> {
    if pos > len {
        return Err(SeqError::OutOfRange { pos, len });
    }
    Ok(())
}

pub(crate) fn check_index(pos: usize, len: usize) -> Result<(), SeqError> {
    if pos >= len {
        return Err(SeqError::OutOfRange { pos, len });
    }
    Ok(())
}

/// The `(pos, n)` sub-range of a sequence of `len`, with `n` clamped to
/// what remains after `pos`.
pub(crate) fn sub_range(len: usize, pos: usize, n: usize) -> Result<Range<usize>, SeqError> {
    check_position(pos, len)?;
    Ok(pos..pos + n.min(len - pos))
}
