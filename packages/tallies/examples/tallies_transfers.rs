//! Instruments a small multithreaded workload and prints the aggregated report.
//!
//! Run with `--features enabled` to see non-zero statistics; without the feature every
//! hook compiles to nothing and the report shows zeroes.

use std::sync::Mutex;
use std::thread;

tallies::stats! {
    record = WorkerRecord;
    aggregator = TransferStats;
    hook_prefix = "log_";

    base {
        "successes": counter,
        "failures": counter,
        "bytes sent": sum,
        "largest packet": max,
    }

    compound {
        "transfers" = "successes" + "failures",
        "failure rate" = "failures" / "transfers",
        "average transfer size" = "bytes sent" / "transfers",
    }

    display_order ["transfers", "failure rate", "average transfer size"];
}

const WORKERS: usize = 4;
const PACKETS_PER_WORKER: usize = 100;

fn send(packet: usize) -> bool {
    // Every seventh packet is lost.
    packet % 7 != 0
}

fn main() {
    let stats = Mutex::new(TransferStats::new());

    thread::scope(|s| {
        for worker in 0..WORKERS {
            let stats = &stats;

            s.spawn(move || {
                for packet in 0..PACKETS_PER_WORKER {
                    let size = 64 + worker * 16 + packet % 32;

                    if send(packet) {
                        log_successes();
                        log_bytes_sent(size);
                        log_largest_packet(size);
                    } else {
                        log_failures();
                    }
                }

                log_publish(&mut stats.lock().unwrap());
            });
        }
    });

    let stats = stats.into_inner().unwrap();
    println!("{}", stats.results(true));
}
