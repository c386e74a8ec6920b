#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Generates a Rust statistics module from a TOML schema.
//!
//! The output is the same code the `tallies::stats!` macro expands to, as source text that
//! can be checked in. Hooks are gated behind the Cargo feature named by
//! `naming.toggle_feature` in the crate that includes the generated file.
//!
//! Without an explicit schema the embedded transaction log schema is used.
//!
//! The binary entry point is in `main.rs`.

mod config;
mod error;
mod render;

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use tallies_macros_impl::generate;
use tracing::info;

pub use error::Error;
pub(crate) use error::Result;

/// The schema used when none is given: statistics of a transactional memory runtime.
pub const EMBEDDED_SCHEMA: &str = include_str!("../schema/transaction_log.toml");

/// Input parameters for the `run` function.
#[doc(hidden)]
#[derive(Debug, Default)]
#[allow(
    clippy::exhaustive_structs,
    reason = "This is a hidden struct for internal/test use only"
)]
pub struct RunInput {
    /// Schema file to read. The embedded schema is used if `None`.
    pub schema: Option<PathBuf>,

    /// File to write. Standard output is used if `None`.
    pub output: Option<PathBuf>,
}

/// Generates source text from the text of a TOML schema.
///
/// `origin` names the schema in the header comment of the output.
///
/// # Errors
///
/// Returns an error if the schema text is not a valid schema file or if the schema it
/// describes fails validation. Nothing is produced in that case.
pub fn generate_source(schema_text: &str, origin: &str) -> Result<String> {
    let config = config::parse_config(schema_text)?;

    let tokens = generate(
        &config.schema,
        &config.naming,
        &config.instrumentation,
        &config.overrides,
    )?;

    render::render(tokens, origin)
}

/// Core logic of the tool, extracted for testability.
///
/// # Errors
///
/// Returns an error if the schema cannot be read or is invalid, or if the output cannot
/// be written.
#[doc(hidden)]
pub fn run(input: &RunInput) -> Result<()> {
    let (text, origin) = match &input.schema {
        Some(path) => (
            fs::read_to_string(path).map_err(|source| Error::Io {
                path: path.clone(),
                source,
            })?,
            path.display().to_string(),
        ),
        None => (EMBEDDED_SCHEMA.to_string(), "the embedded schema".to_string()),
    };

    let generated = generate_source(&text, &origin)?;

    match &input.output {
        Some(path) => {
            fs::write(path, &generated).map_err(|source| Error::Io {
                path: path.clone(),
                source,
            })?;

            info!(
                schema = %origin,
                output = %path.display(),
                bytes = generated.len(),
                "generated statistics module"
            );
        }
        None => {
            io::stdout()
                .lock()
                .write_all(generated.as_bytes())
                .map_err(|source| Error::Io {
                    path: PathBuf::from("<stdout>"),
                    source,
                })?;

            info!(schema = %origin, bytes = generated.len(), "generated statistics module");
        }
    }

    Ok(())
}
