mod bits;
mod churn;
mod config;
mod grow;
mod text;

use std::process::ExitCode;

use log::LevelFilter;
use structopt::StructOpt;
use thiserror::Error;

use seqbuf_core::{BitTextError, SeqError};

#[derive(StructOpt)]
enum Opt {
    /// Append elements one at a time and report every reallocation
    Grow(grow::GrowOpt),
    /// Edit a byte buffer and search the result
    Text(text::TextOpt),
    /// Parse bit text into a fixed bit set and render it back
    Bits(bits::BitsOpt),
    /// Run a seeded random edit workload checked against Vec
    Churn(churn::ChurnOpt),
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config: {0}")]
    Config(#[from] config::ConfigError),
    #[error("container operation: {0}")]
    Seq(#[from] SeqError),
    #[error("parsing bit text: {0}")]
    BitText(#[from] BitTextError),
    #[error("diverged from reference at step {step}: {what}")]
    Diverged { step: usize, what: &'static str },
    #[error("{blocks} blocks still allocated after teardown")]
    Leak { blocks: usize },
}

fn main() -> Result<(), ExitCode> {
    init_log();

    run().map_err(|err| {
        log::error!("fatal: {err}");
        ExitCode::FAILURE
    })
}

fn run() -> Result<(), RunError> {
    if let Some(config) = config::read()? {
        config::load_into_env(&config);
    }

    log::debug!("allocation failure policy: {}", seqbuf_alloc::POLICY);

    match Opt::from_args() {
        Opt::Grow(opt) => grow::run(opt),
        Opt::Text(opt) => text::run(opt),
        Opt::Bits(opt) => bits::run(opt),
        Opt::Churn(opt) => churn::run(opt),
    }
}

fn init_log() {
    env_logger::builder()
        .format_timestamp_millis()
        .filter_level(default_log_level())
        .parse_default_env()
        .init();
}

fn default_log_level() -> LevelFilter {
    if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}
