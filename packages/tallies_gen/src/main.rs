#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(coverage_nightly, coverage(off))]

//! Binary entry point for the tallies_gen tool.
//!
//! This module is excluded from mutation testing because testing process entry/exit behavior
//! is impractical - it requires spawning subprocesses and checking exit codes.

use std::path::PathBuf;
use std::process::ExitCode;

use argh::FromArgs;
use tallies_gen::{RunInput, run};
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Generates a Rust statistics module from a TOML schema.
#[derive(FromArgs)]
struct Args {
    /// schema file to read (defaults to the embedded transaction log schema)
    #[argh(option)]
    schema: Option<PathBuf>,

    /// file to write the generated source to (defaults to standard output)
    #[argh(option)]
    output: Option<PathBuf>,
}

// Binary entry point - mutations would require subprocess testing which is impractical.
#[cfg_attr(test, mutants::skip)]
fn main() -> ExitCode {
    // Logs go to stderr so that generated source on stdout stays clean.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Args = argh::from_env();

    let input = RunInput {
        schema: args.schema,
        output: args.output,
    };

    match run(&input) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "generation failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
