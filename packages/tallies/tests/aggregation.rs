//! Records, aggregators and reports generated by `stats!`. These work the same whether or
//! not hooks are enabled.

#![allow(clippy::float_cmp, reason = "exact values are expected in these tests")]

use std::sync::Mutex;
use std::thread;

tallies::stats! {
    record = ThreadRecord;
    aggregator = TransactionLog;
    hook_prefix = "log_";
    module = transaction_log;

    base {
        "user failures": counter,
        "failures": counter,
        "successes": counter,
        "max write size": max,
        "reads": sum,
        "writes": sum,
    }

    compound {
        "transactions" = "failures" + "successes",
        "internal failures" = "failures" - "user failures",
        "success rate" = "successes" / "transactions",
        "average read size" = "reads" / "transactions",
        "writes per read per transaction" = "writes" / "reads" / "transactions",
    }

    storage_order ["reads", "writes", "max write size"];
    display_order ["transactions", "success rate", "reads", "max write size"];
}

use transaction_log::{ThreadRecord, TransactionLog};

fn record(failures: u64, successes: u64) -> ThreadRecord {
    let mut record = ThreadRecord::new();

    for _ in 0..failures {
        record.count_failures();
    }

    for _ in 0..successes {
        record.count_successes();
    }

    record
}

#[test]
fn compound_metrics_use_aggregated_totals() {
    let mut log = TransactionLog::new();
    log.publish(record(2, 1));
    log.publish(record(1, 1));

    assert_eq!(log.record_count(), 2);
    assert_eq!(log.failures(), 3);
    assert_eq!(log.successes(), 2);
    assert_eq!(log.transactions(), 5);
    assert_eq!(log.success_rate(), 0.4);
}

#[test]
fn max_reduces_to_largest_or_zero() {
    let mut log = TransactionLog::new();
    assert_eq!(log.max_write_size(), 0);

    for size in [4_u32, 7, 2] {
        let mut record = ThreadRecord::new();
        record.observe_max_write_size(size);
        log.publish(record);
    }

    assert_eq!(log.max_write_size(), 7);
}

#[test]
fn record_max_keeps_largest_observation() {
    let mut record = ThreadRecord::new();
    record.observe_max_write_size(10_usize);
    record.observe_max_write_size(3_u8);

    assert_eq!(record.max_write_size(), 10);
}

#[test]
fn division_is_unguarded() {
    let log = TransactionLog::new();

    assert_eq!(log.transactions(), 0);
    assert!(log.success_rate().is_nan());

    let mut record = ThreadRecord::new();
    record.add_reads(64_u32);
    let mut log = TransactionLog::new();
    log.publish(record);

    assert!(log.average_read_size().is_infinite());
}

#[test]
fn only_the_last_division_is_fractional() {
    let mut record = record(0, 2);
    record.add_writes(7_u32);
    record.add_reads(2_u32);

    // (7 / 2) is integral, so 3 / 2 transactions.
    assert_eq!(record.writes_per_read_per_transaction(), 1.5);
}

#[test]
fn subtraction_is_integral() {
    let mut record = record(3, 0);
    record.count_user_failures();

    assert_eq!(record.internal_failures(), 2);
}

#[test]
fn clear_forgets_published_records() {
    let mut log = TransactionLog::new();
    log.publish(record(1, 1));
    log.publish(record(0, 4));

    log.clear();

    assert_eq!(log.record_count(), 0);
    assert_eq!(log.transactions(), 0);
    assert!(log.records().is_empty());
}

#[test]
fn records_keep_publication_order() {
    let mut log = TransactionLog::new();
    log.publish(record(1, 0));
    log.publish(record(0, 1));

    let failures = log
        .records()
        .iter()
        .map(ThreadRecord::failures)
        .collect::<Vec<_>>();

    assert_eq!(failures, [1, 0]);
}

#[test]
fn records_from_many_threads_are_aggregated() {
    let log = Mutex::new(TransactionLog::new());

    thread::scope(|s| {
        for successes in 1..=4 {
            let log = &log;

            s.spawn(move || {
                let record = record(0, successes);
                log.lock().unwrap().publish(record);
            });
        }
    });

    let log = log.into_inner().unwrap();

    assert_eq!(log.record_count(), 4);
    assert_eq!(log.successes(), 10);
}

#[test]
fn report_lines_follow_display_order_and_align() {
    let mut record = record(1, 3);
    record.add_reads(12_u32);
    record.observe_max_write_size(9_u32);

    let mut log = TransactionLog::new();
    log.publish(record);

    let summary = log.results(false);
    let lines = summary.lines().collect::<Vec<_>>();

    assert_eq!(lines.len(), 11);
    assert_eq!(lines.first().copied(), Some("Transactions:                    4"));
    assert_eq!(lines.get(1).copied(), Some("Success Rate:                    0.75"));
    assert_eq!(lines.get(2).copied(), Some("Reads:                           12"));
    assert_eq!(lines.get(3).copied(), Some("Max Write Size:                  9"));

    // Every value starts one column after the longest label.
    let width = "Writes Per Read Per Transaction: ".len();
    assert!(lines.iter().all(|line| line.len() > width));
}

#[test]
fn record_report_is_indented() {
    let mut record = record(0, 1);
    record.add_reads(5_u32);

    let report = record.to_string();

    assert!(report.starts_with("    Transactions:"), "{report}");
    assert!(report.lines().all(|line| line.starts_with("    ")), "{report}");
    assert!(report.ends_with('\n'));
}

#[test]
fn per_record_results_follow_summary() {
    let mut log = TransactionLog::new();

    // Reports evaluate every compound metric, so each record needs reads to divide by.
    for (failures, successes) in [(1, 0), (0, 1)] {
        let mut record = record(failures, successes);
        record.add_reads(1_u8);
        log.publish(record);
    }

    let summary = log.results(false);
    let full = log.results(true);

    assert!(full.starts_with(&summary));
    assert!(full.contains("--== Thread:    0 ==--\n    Transactions:"));
    assert!(full.contains("--== Thread:    1 ==--\n"));
    assert_eq!(full, log.to_string());
}

#[test]
#[should_panic(expected = "attempt to divide by zero")]
fn chained_division_panics_on_zero_inner_divisor() {
    // "writes" / "reads" / "transactions" divides integers before the last operand.
    let _report = TransactionLog::new().results(false);
}
