#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Per-thread statistics generated from a declarative schema.
//!
//! A schema lists *base metrics*, raw quantities that every thread accumulates in its own
//! record, and *compound metrics*, values derived from other metrics by a single
//! arithmetic operator. The [`stats!`] macro turns a schema into:
//!
//! * a record type holding one `u64` per base metric, with a thread-local instance;
//! * an aggregator type that collects published records and reduces over them;
//! * one hook function per base metric plus `publish`, `clear` and `dump` hooks;
//! * a fixed-layout text report for both the record and the aggregator.
//!
//! # Defining statistics
//!
//! ```
//! tallies::stats! {
//!     record = TransferRecord;
//!     aggregator = TransferStats;
//!     hook_prefix = "log_";
//!
//!     base {
//!         "successes": counter,
//!         "failures": counter,
//!         "bytes sent": sum,
//!         "largest packet": max,
//!     }
//!
//!     compound {
//!         "transfers" = "successes" + "failures",
//!         "failure rate" = "failures" / "transfers",
//!         "average transfer size" = "bytes sent" / "transfers",
//!     }
//!
//!     display_order ["transfers", "failure rate"];
//! }
//!
//! let mut record = TransferRecord::new();
//! record.count_successes();
//! record.count_failures();
//! record.add_bytes_sent(1200_u32);
//! record.observe_largest_packet(900_u16);
//!
//! let mut stats = TransferStats::new();
//! stats.publish(record);
//!
//! assert_eq!(stats.transfers(), 2);
//! assert!((stats.failure_rate() - 0.5).abs() < f64::EPSILON);
//! assert!((stats.average_transfer_size() - 600.0).abs() < f64::EPSILON);
//! ```
//!
//! # Hooks
//!
//! Instrumented code calls the generated hooks, e.g. `log_successes()` or
//! `log_bytes_sent(len)`. Each hook updates the calling thread's record. When a thread
//! finishes its work it calls `log_publish(&mut stats)` to move its record into an
//! aggregator.
//!
//! Hooks only do anything when the `enabled` feature of this crate is active. Without it
//! every hook is an empty `#[inline(always)]` function, so instrumentation can stay in
//! place at zero cost. Individual hooks of a disabled build can be redirected to a custom
//! function via `overrides { ... }`. A `dump` override applies in every build.
//!
//! # Arithmetic
//!
//! All base metrics are `u64`. Counters and sums wrap on overflow. A compound metric is
//! `u64` unless it divides or uses a fractional operand, in which case it is `f64`.
//!
//! Compound arithmetic is not guarded:
//!
//! * Addition and subtraction use plain `+` and `-` on `u64`. Overflow and underflow panic
//!   in debug builds and wrap in release builds.
//! * Only the last operand of a division is converted to `f64`, so a zero last operand
//!   yields infinity or NaN.
//! * Earlier operands of a chained division divide as `u64`. A zero among them panics,
//!   also when evaluating the reports of an empty aggregator. Schemas that chain divisions
//!   must only be reported on once every divisor but the last is non-zero.
//!
//! # Concurrency
//!
//! Records are thread-local and need no synchronization. An aggregator is a plain value
//! mutated through `&mut self`; share it between threads behind a `Mutex` or publish
//! records after joining the worker threads.
//!
//! # Offline generation
//!
//! The `tallies_gen` tool produces the same code from a TOML schema file, for projects
//! that prefer checked-in generated sources.

mod ledger;

pub use ledger::*;
pub use tallies_macros::stats;

#[doc(hidden)]
pub mod __private {
    pub use num_traits::AsPrimitive;
}
