//! Overflow and division behavior of generated metrics.

#![allow(clippy::float_cmp, reason = "exact values are expected in these tests")]

tallies::stats! {
    record = TrafficRecord;
    aggregator = TrafficTotals;
    module = traffic;

    base {
        "sent": sum,
        "received": sum,
        "rounds": counter,
    }

    compound {
        "traffic" = "sent" + "received",
        "received per send per round" = "received" / "sent" / "rounds",
    }
}

use traffic::{TrafficRecord, TrafficTotals};

#[test]
fn sums_wrap_on_overflow() {
    let mut record = TrafficRecord::new();
    record.add_sent(u64::MAX);
    record.add_sent(2_u8);

    assert_eq!(record.sent(), 1);
}

#[test]
fn totals_wrap_on_overflow() {
    let mut totals = TrafficTotals::new();

    for _ in 0..2 {
        let mut record = TrafficRecord::new();
        record.add_received(u64::MAX);
        totals.publish(record);
    }

    assert_eq!(totals.received(), u64::MAX.wrapping_sub(1));
}

#[cfg(debug_assertions)]
#[test]
#[should_panic(expected = "attempt to add with overflow")]
fn compound_addition_overflow_panics_in_debug_builds() {
    let mut record = TrafficRecord::new();
    record.add_sent(u64::MAX);
    record.add_received(1_u8);

    let _traffic = record.traffic();
}

#[test]
fn zero_last_divisor_is_infinite() {
    let mut record = TrafficRecord::new();
    record.add_sent(2_u8);
    record.add_received(8_u8);

    assert_eq!(record.received_per_send_per_round(), f64::INFINITY);

    record.count_rounds();
    record.count_rounds();

    assert_eq!(record.received_per_send_per_round(), 2.0);
}

#[test]
#[should_panic(expected = "attempt to divide by zero")]
fn zero_inner_divisor_panics() {
    let mut record = TrafficRecord::new();
    record.add_received(8_u8);
    record.count_rounds();

    let _ratio = record.received_per_send_per_round();
}
