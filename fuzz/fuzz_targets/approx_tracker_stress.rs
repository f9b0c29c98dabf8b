#![no_main]

use libfuzzer_sys::fuzz_target;
use reusekit::tracker::{Access, ApproxTracker};

// Fuzz the approx engine with interleaved maintenance calls
//
// Cleanup, pacing changes, and sequence fast-forwards must never change the
// histogram outcome of the accesses that follow; a shadow clone processing
// the same accesses without maintenance keeps it honest.
fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    let capacity = (data[0] % 64) as u64;
    let mut tracker = ApproxTracker::new(capacity);
    let mut shadow = tracker.clone();

    for chunk in data[1..].chunks(2) {
        let op = chunk[0] % 8;
        let arg = *chunk.get(1).unwrap_or(&0);

        match op {
            // Maintenance must be distance-neutral, so only exercise it on
            // the primary; the shadow just mirrors the sequence counter.
            0 => {
                tracker.cleanup();
            }
            1 => {
                tracker.set_clean_frequency(arg as u64 + 1);
            }
            2 => {
                tracker.increment_sequence(arg as u64);
                shadow.increment_sequence(arg as u64);
            }
            _ => {
                let access = Access::new((arg % 3) as u64, (arg % 48) as u64);
                tracker.process(access);
                shadow.process(access);
            }
        }

        assert_eq!(tracker.current_sequence(), shadow.current_sequence());
        tracker.check_invariants().expect("approx invariants violated");
    }

    let mut ids = tracker.indices();
    ids.sort_unstable();
    let mut shadow_ids = shadow.indices();
    shadow_ids.sort_unstable();
    assert_eq!(ids, shadow_ids);

    for id in ids {
        let a = tracker.stats(id).expect("id seen on primary");
        let b = shadow.stats(id).expect("id seen on shadow");
        assert_eq!(a.sorted_distances(), b.sorted_distances());
        for d in a.sorted_distances() {
            assert_eq!(a.count_distance(d), b.count_distance(d));
        }
        assert_eq!(a.miss_count(), b.miss_count());
    }
});
