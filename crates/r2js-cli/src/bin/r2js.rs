use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;

use r2js_cli::args::CliArgs;
use r2js_cli::{driver, tracing_config};

fn main() -> Result<()> {
    // Only installs a subscriber when R2JS_LOG or RUST_LOG is set.
    tracing_config::init_tracing();

    let args = CliArgs::parse();
    let output = driver::run(&args)?;

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{output}").context("failed to write output")?;
    Ok(())
}
