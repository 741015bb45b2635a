use std::iter;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use structopt::StructOpt;

use seqbuf_core::{ByteBuffer, DynArray, SeqError, Tracking};

use crate::RunError;

#[derive(StructOpt)]
pub struct ChurnOpt {
    #[structopt(long, env = "SEQBUF_CHURN_SEED", default_value = "0")]
    pub seed: u64,

    /// Number of random edits to apply to each container
    #[structopt(long, env = "SEQBUF_CHURN_STEPS", default_value = "10000")]
    pub steps: usize,

    /// Containers stop growing past this length
    #[structopt(long, env = "SEQBUF_CHURN_MAX_LEN", default_value = "256")]
    pub max_len: usize,
}

pub fn run(opt: ChurnOpt) -> Result<(), RunError> {
    let mut rng = StdRng::seed_from_u64(opt.seed);
    let tracker = Tracking::new();

    log::info!("churning {} steps with seed {}", opt.steps, opt.seed);

    {
        let mut array = DynArray::new_in(&tracker);
        let mut array_model = Vec::new();
        let mut text = ByteBuffer::new_in(&tracker)?;
        let mut text_model = Vec::new();

        for step in 0..opt.steps {
            edit_array(&mut rng, &mut array, &mut array_model, opt.max_len)?;
            edit_text(&mut rng, &mut text, &mut text_model, opt.max_len)?;

            if array.as_slice() != array_model.as_slice() {
                return Err(RunError::Diverged { step, what: "array contents" });
            }

            if text.as_slice() != text_model.as_slice() {
                return Err(RunError::Diverged { step, what: "buffer contents" });
            }

            if text.with_terminator().last() != Some(&0) {
                return Err(RunError::Diverged { step, what: "buffer terminator" });
            }
        }

        log::debug!(
            "final lengths: array {} (capacity {}), buffer {} (capacity {})",
            array.len(), array.capacity(), text.len(), text.capacity(),
        );
    }

    let stats = tracker.stats();
    if stats.live_blocks() != 0 {
        return Err(RunError::Leak { blocks: stats.live_blocks() });
    }

    println!(
        "{} steps ok: {} allocations, peak {} bytes",
        opt.steps, stats.allocations, stats.peak_bytes,
    );

    Ok(())
}

fn edit_array<R: Rng>(
    rng: &mut R,
    array: &mut DynArray<u32, &Tracking>,
    model: &mut Vec<u32>,
    max_len: usize,
) -> Result<(), SeqError> {
    let len = model.len();

    match rng.gen_range(0..6) {
        0 if len < max_len => {
            let value = rng.gen();
            array.push_back(value)?;
            model.push(value);
        }
        1 if len < max_len => {
            let at = rng.gen_range(0..=len);
            let n = rng.gen_range(0..8);
            let value = rng.gen();
            array.insert_n(at, n, &value)?;
            model.splice(at..at, iter::repeat(value).take(n)).for_each(drop);
        }
        2 if len > 0 => {
            let start = rng.gen_range(0..len);
            let end = rng.gen_range(start..=len);
            array.erase_range(start..end)?;
            model.drain(start..end);
        }
        3 => {
            let values: Vec<u32> = (0..rng.gen_range(0..=max_len.min(32))).map(|_| rng.gen()).collect();
            array.assign_slice(&values)?;
            *model = values;
        }
        4 => {
            array.shrink_to_fit()?;
        }
        _ => {
            array.pop_back();
            model.pop();
        }
    }

    Ok(())
}

fn edit_text<R: Rng>(
    rng: &mut R,
    text: &mut ByteBuffer<&Tracking>,
    model: &mut Vec<u8>,
    max_len: usize,
) -> Result<(), SeqError> {
    let len = model.len();
    let chunk: Vec<u8> = (0..rng.gen_range(0..8)).map(|_| rng.gen_range(b'a'..=b'z')).collect();

    match rng.gen_range(0..5) {
        0 if len < max_len => {
            text.append(&chunk)?;
            model.extend_from_slice(&chunk);
        }
        1 if len < max_len => {
            let at = rng.gen_range(0..=len);
            text.insert(at, &chunk)?;
            model.splice(at..at, chunk).for_each(drop);
        }
        2 => {
            let at = rng.gen_range(0..=len);
            let n = rng.gen_range(0..8);
            let end = (at + n).min(len);
            text.replace(at, n, &chunk)?;
            model.splice(at..end, chunk).for_each(drop);
        }
        3 => {
            let at = rng.gen_range(0..=len);
            let n = rng.gen_range(0..8);
            text.erase(at, n)?;
            model.drain(at..(at + n).min(len));
        }
        _ => {
            text.assign(&chunk)?;
            *model = chunk;
        }
    }

    Ok(())
}
