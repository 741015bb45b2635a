use structopt::StructOpt;

use seqbuf_core::{FixedBitSet, NPOS};

use crate::RunError;

const WIDTH: usize = 64;

#[derive(StructOpt)]
pub struct BitsOpt {
    /// Bit text, most significant bit first
    pub text: String,

    /// Offset of the first character to read
    #[structopt(long, default_value = "0")]
    pub start: usize,

    /// Number of characters to read, at most 64
    #[structopt(long)]
    pub count: Option<usize>,
}

pub fn run(opt: BitsOpt) -> Result<(), RunError> {
    let count = opt.count.unwrap_or(NPOS);
    let set = FixedBitSet::<WIDTH>::from_text(opt.text.as_bytes(), opt.start, count)?;

    println!("{}", set.to_text()?);
    println!("{} of {} bits set", set.count(), set.len());

    Ok(())
}
