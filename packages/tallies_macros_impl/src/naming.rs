use proc_macro2::{Ident, Span};
use syn::{Path, parse_quote};

use crate::{Result, SchemaError};

/// Naming options for the generated artifact.
///
/// Defaults: no hook prefix, record type `PerfStatsRecord`, aggregator type `PerfStats`,
/// no wrapping module and runtime crate `::tallies`.
#[derive(Clone, Debug)]
pub struct Naming {
    pub(crate) hook_prefix: String,
    pub(crate) record: String,
    pub(crate) aggregator: String,
    pub(crate) module: Option<String>,
    pub(crate) runtime: Path,
}

impl Default for Naming {
    fn default() -> Self {
        Self {
            hook_prefix: String::new(),
            record: "PerfStatsRecord".to_string(),
            aggregator: "PerfStats".to_string(),
            module: None,
            runtime: parse_quote!(::tallies),
        }
    }
}

impl Naming {
    /// Prepended verbatim to every hook function name, e.g. `log_` gives `log_reads()`.
    #[must_use]
    pub fn hook_prefix(self, hook_prefix: impl Into<String>) -> Self {
        Self {
            hook_prefix: hook_prefix.into(),
            ..self
        }
    }

    /// Name of the per-thread record type.
    #[must_use]
    pub fn record(self, record: impl Into<String>) -> Self {
        Self {
            record: record.into(),
            ..self
        }
    }

    /// Name of the aggregator type that owns the ledger.
    #[must_use]
    pub fn aggregator(self, aggregator: impl Into<String>) -> Self {
        Self {
            aggregator: aggregator.into(),
            ..self
        }
    }

    /// Wraps the whole artifact in `pub mod <module>`. Everything generated is then
    /// reachable through that module path.
    #[must_use]
    pub fn module(self, module: impl Into<String>) -> Self {
        Self {
            module: Some(module.into()),
            ..self
        }
    }

    /// Path under which generated code finds the `tallies` runtime crate.
    #[must_use]
    pub fn runtime(self, runtime: Path) -> Self {
        Self { runtime, ..self }
    }

    pub(crate) fn record_ident(&self) -> Result<Ident> {
        type_ident(&self.record)
    }

    pub(crate) fn aggregator_ident(&self) -> Result<Ident> {
        type_ident(&self.aggregator)
    }

    pub(crate) fn module_ident(&self) -> Result<Option<Ident>> {
        self.module.as_deref().map(parse_ident).transpose()
    }

    /// The `thread_local!` static holding the live record, e.g. `THREAD_RECORD_INSTANCE`.
    pub(crate) fn thread_local_ident(&self) -> Result<Ident> {
        parse_ident(&format!("{}_INSTANCE", upper_snake(&self.record)))
    }

    pub(crate) fn hook_ident(&self, hook: &str) -> Result<Ident> {
        parse_ident(&format!("{}{}", self.hook_prefix, snake_name(hook)))
    }
}

fn type_ident(name: &str) -> Result<Ident> {
    if name.is_empty() || name.contains(' ') {
        return Err(SchemaError::invalid_name(name, "type names must be single identifiers"));
    }

    parse_ident(name)
}

/// Turns a string into an identifier, rejecting keywords and anything else that
/// Rust would not accept as a plain identifier.
pub(crate) fn parse_ident(name: &str) -> Result<Ident> {
    syn::parse_str::<Ident>(name)
        .map(|ident| Ident::new(&ident.to_string(), Span::call_site()))
        .map_err(|_| SchemaError::invalid_name(name, "not a valid Rust identifier"))
}

/// `max write size` -> `max_write_size`
#[must_use]
pub fn snake_name(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

/// `max write size` -> `Max Write Size`
#[must_use]
pub fn pretty_name(name: &str) -> String {
    name.split_whitespace()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();

    chars.next().map_or_else(String::new, |first| {
        first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect()
    })
}

/// `ThreadRecord` -> `THREAD_RECORD`
fn upper_snake(name: &str) -> String {
    let mut result = String::with_capacity(name.len().saturating_mul(2));

    for (i, c) in name.char_indices() {
        if c.is_uppercase() && i != 0 && !result.ends_with('_') {
            result.push('_');
        }

        result.extend(c.to_uppercase());
    }

    result
}
