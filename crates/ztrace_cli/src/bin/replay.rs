//! `ztrace-replay`: replay one captured zlib session and verify every call.
//!
//! Exits non-zero on the first divergence, read failure, or unexpected teardown status.

#![warn(clippy::all)]

use clap::Parser;
use color_eyre::Result;
use color_eyre::eyre::WrapErr;
use std::path::PathBuf;
use ztrace_replay::{ReplayConfig, ReplayEngine};

#[derive(Parser)]
#[command(name = "ztrace-replay")]
#[command(about = "Replay a captured zlib session against the linked zlib", long_about = None)]
struct Cli {
    /// Metadata log of the session, e.g. `deflate.4242.0`
    metadata: PathBuf,
    /// Accept any status from the final deflateEnd/inflateEnd
    #[arg(long)]
    no_verify_teardown: bool,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    ztrace_cli::init_tracing();
    let cli = Cli::parse();
    tracing::debug!(metadata = %cli.metadata.display(), "replaying");

    let engine = ReplayEngine::new().with_config(ReplayConfig {
        verify_teardown: !cli.no_verify_teardown,
    });
    let report = engine
        .replay(&cli.metadata)
        .wrap_err_with(|| format!("replay of {} failed", cli.metadata.display()))?;
    println!("{report}");
    Ok(())
}
