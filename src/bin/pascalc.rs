//! the main compiler binary. takes a single source file and writes the
//! compiled LLVM IR to `result.ll` in the current directory.
//!
//! run with `--help` for more info.

use std::fs;

use anyhow::{Context, Result};
use clap::Parser;

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// the input source file
    file: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let source = fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read input file: {}", args.file))?;

    let mut warnings = Vec::new();
    let ir = pascalc::compile(&source, &mut warnings)?;

    for w in &warnings {
        eprintln!("warning: {w}");
    }

    fs::write("result.ll", ir).context("failed to write result.ll")?;

    Ok(())
}
