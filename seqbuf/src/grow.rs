use std::mem;

use structopt::StructOpt;

use seqbuf_core::{DynArray, Tracking};

use crate::config::Element;
use crate::RunError;

#[derive(StructOpt)]
pub struct GrowOpt {
    /// Number of elements to append
    #[structopt(long, env = "SEQBUF_GROW_COUNT", default_value = "1000")]
    pub count: usize,

    #[structopt(long, env = "SEQBUF_GROW_ELEMENT", default_value = "u64")]
    pub element: Element,

    /// Reserve capacity for this many elements before appending
    #[structopt(long)]
    pub reserve: Option<usize>,
}

pub fn run(opt: GrowOpt) -> Result<(), RunError> {
    match opt.element {
        Element::U8 => grow::<u8>(&opt),
        Element::U32 => grow::<u32>(&opt),
        Element::U64 => grow::<u64>(&opt),
    }
}

fn grow<T: Default>(opt: &GrowOpt) -> Result<(), RunError> {
    let tracker = Tracking::new();
    let mut array = DynArray::<T, _>::new_in(&tracker);

    if let Some(n) = opt.reserve {
        array.reserve(n)?;
    }

    let mut capacity = array.capacity();
    let mut reallocations = 0;

    for _ in 0..opt.count {
        array.push_back_default()?;

        if array.capacity() != capacity {
            reallocations += 1;
            log::info!("len {}: capacity {} -> {}", array.len(), capacity, array.capacity());
            capacity = array.capacity();
        }
    }

    let stats = tracker.stats();

    println!(
        "{} x {} ({} bytes each): capacity {}, {} reallocations",
        array.len(),
        opt.element,
        mem::size_of::<T>(),
        array.capacity(),
        reallocations,
    );
    println!(
        "allocator: {} allocations, {} deallocations, peak {} bytes",
        stats.allocations, stats.deallocations, stats.peak_bytes,
    );

    Ok(())
}
