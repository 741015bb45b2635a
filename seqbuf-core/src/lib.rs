pub mod algo;
pub mod array;
pub mod bitset;
pub mod buffer;
pub mod error;
pub mod raw;

#[cfg(test)]
mod testing;

pub use array::DynArray;
pub use bitset::FixedBitSet;
pub use buffer::{ByteBuffer, CharLike, DynBuffer, NPOS};
pub use error::{BitTextError, SeqError};

pub use seqbuf_alloc::{AllocError, AllocStats, Global, RawAlloc, Tracking};
