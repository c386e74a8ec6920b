//! Schema model, validation and code generation behind the `stats!` macro and the
//! `tallies_gen` tool.
//!
//! A [`Schema`] declares base metrics (accumulated per thread) and compound metrics
//! (derived from other metrics by one arithmetic operator), plus three orderings that
//! control field layout, accessor emission and report lines. [`compile()`] validates a
//! schema and resolves its orderings; [`generate()`] turns it into Rust items.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![allow(
    missing_docs,
    reason = "Private API, public API is documented in `tallies` package"
)]

mod aggregator;
mod assemble;
mod compiled;
mod dsl;
mod error;
mod expression;
mod hooks;
mod naming;
mod ordering;
mod overrides;
mod record;
mod report;
mod schema;

pub use assemble::*;
pub use compiled::{CompiledSchema, ValueType, compile};
pub use dsl::entrypoint;
pub use error::SchemaError;
pub(crate) use error::Result;
pub use hooks::Instrumentation;
pub use naming::{Naming, pretty_name, snake_name};
pub use ordering::{Ordering, resolve};
pub use overrides::Overrides;
pub use schema::*;
