#![no_main]

use libfuzzer_sys::fuzz_target;
use reusekit::tracker::{Access, ExactTracker};

// Fuzz the exact engine against a naive recency-list model
//
// The model keeps addresses in a Vec ordered by recency and computes the
// stack distance with a linear scan; the engine must agree on every
// read-only distance query and on the structural invariants.
fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    let capacity = (data[0] % 32) as u64;
    let mut tracker = ExactTracker::with_bin_individual(capacity, 0);
    let mut recency: Vec<u64> = Vec::new();

    for &byte in &data[1..] {
        let address = (byte % 48) as u64;
        let access = Access::new(0, address);

        let expected = match recency.iter().position(|&a| a == address) {
            Some(pos) => (recency.len() - pos) as u64,
            None => 0,
        };
        assert_eq!(tracker.distance(access), expected);

        tracker.process(access);
        match recency.iter().position(|&a| a == address) {
            Some(pos) => {
                recency.remove(pos);
            }
            None => {
                if capacity != 0 && recency.len() as u64 >= capacity {
                    recency.remove(0);
                }
            }
        }
        recency.push(address);

        assert_eq!(tracker.active_addresses(), recency);
        assert_eq!(tracker.resident_count(), recency.len() as u64);
    }

    tracker.check_invariants().expect("tracker invariants violated");
});
