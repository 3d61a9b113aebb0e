//! `ztrace-inspect`: print the records of a captured zlib session.

#![warn(clippy::all)]

use clap::Parser;
use color_eyre::Result;
use color_eyre::eyre::WrapErr;
use std::path::PathBuf;
use ztrace_cli::Inspection;

#[derive(Parser)]
#[command(name = "ztrace-inspect")]
#[command(about = "Show the init and call records of a zlib capture", long_about = None)]
struct Cli {
    /// Metadata log of the session, e.g. `inflate.4242.3`
    metadata: PathBuf,
    /// Emit the parsed records as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    ztrace_cli::init_tracing();
    let cli = Cli::parse();

    let inspection = Inspection::load(&cli.metadata)
        .wrap_err_with(|| format!("cannot inspect {}", cli.metadata.display()))?;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&inspection)?);
    } else {
        print!("{inspection}");
    }
    Ok(())
}
