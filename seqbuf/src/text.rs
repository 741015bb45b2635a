use structopt::StructOpt;

use seqbuf_core::{ByteBuffer, NPOS};

use crate::RunError;

#[derive(StructOpt)]
pub struct TextOpt {
    /// Initial buffer contents
    pub text: String,

    /// Position of the range to replace
    #[structopt(long, default_value = "0")]
    pub pos: usize,

    /// Length of the range to replace, clamped to the end of the text
    #[structopt(long, default_value = "0")]
    pub len: usize,

    /// Replacement for the range
    #[structopt(long, default_value = "")]
    pub with: String,

    /// Search the edited text for this
    #[structopt(long)]
    pub find: Option<String>,
}

pub fn run(opt: TextOpt) -> Result<(), RunError> {
    let mut buffer: ByteBuffer = opt.text.parse()?;
    buffer.replace(opt.pos, opt.len, opt.with.as_bytes())?;

    log::debug!("edited buffer: len {}, capacity {}", buffer.len(), buffer.capacity());
    println!("{buffer}");

    if let Some(needle) = &opt.find {
        let first = buffer.find(needle.as_bytes(), 0);
        let last = buffer.rfind(needle.as_bytes(), NPOS);

        match first.zip(last) {
            Some((first, last)) => println!("{needle:?}: first at {first}, last at {last}"),
            None => println!("{needle:?}: not found"),
        }
    }

    Ok(())
}
