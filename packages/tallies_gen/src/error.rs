use std::io;
use std::path::PathBuf;

use tallies_macros_impl::SchemaError;
use thiserror::Error;

/// Reasons the generator cannot produce a statistics module.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The schema file is not valid TOML.
    #[error("schema is not valid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    /// A key the schema file must contain is absent.
    #[error("missing required key '{key}'")]
    MissingKey {
        /// The absent key, qualified by its table.
        key: String,
    },

    /// A key holds a value of the wrong TOML type.
    #[error("'{key}' must be {expected}")]
    WrongType {
        /// The offending key, qualified by its table.
        key: String,

        /// What the key should hold.
        expected: &'static str,
    },

    /// The schema file contains a key the generator does not understand.
    #[error("unknown key '{key}'")]
    UnknownKey {
        /// The unknown key, qualified by its table.
        key: String,
    },

    /// A `[[metric]]` entry is neither a well-formed base nor a well-formed compound metric.
    #[error("invalid metric '{name}': {problem}")]
    InvalidMetric {
        /// The `name` of the entry.
        name: String,

        /// A human-readable description of the problem.
        problem: String,
    },

    /// A value that names a function or crate does not parse as a Rust path.
    #[error("'{key}' is not a Rust path: '{path}'")]
    InvalidPath {
        /// The key holding the value.
        key: String,

        /// The value as written.
        path: String,
    },

    /// The schema parsed but its metric definitions are inconsistent.
    #[error("invalid schema: {0}")]
    Schema(#[from] SchemaError),

    /// The emitted tokens do not form a Rust file. This indicates a bug in the generator.
    #[error("generated code does not parse: {0}")]
    Render(#[from] syn::Error),

    /// Reading the schema or writing the output failed.
    #[error("cannot access '{}': {source}", path.display())]
    Io {
        /// The file being read or written.
        path: PathBuf,

        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },
}

impl Error {
    pub(crate) fn wrong_type(key: impl Into<String>, expected: &'static str) -> Self {
        Self::WrongType {
            key: key.into(),
            expected,
        }
    }

    pub(crate) fn invalid_metric(name: impl Into<String>, problem: impl Into<String>) -> Self {
        Self::InvalidMetric {
            name: name.into(),
            problem: problem.into(),
        }
    }
}

/// A specialized `Result` type for generator operations, returning the crate's
/// [`Error`] type as the error value.
pub(crate) type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::fmt::Debug;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(Error: Send, Sync, Debug);

    #[test]
    fn schema_errors_are_wrapped() {
        let error = Error::from(SchemaError::InvalidOverride {
            hook: "ghost".to_string(),
        });

        assert_eq!(
            error.to_string(),
            "invalid schema: cannot override unknown hook 'ghost'"
        );
    }
}
