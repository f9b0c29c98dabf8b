#![no_main]

use libfuzzer_sys::fuzz_target;
use reusekit::ds::{RankTree, RecencyEntry};

// Fuzz arbitrary operation sequences on RankTree
//
// Mirrors every insert/remove against a sorted Vec model and checks rank
// queries, ordering, and the balance/size annotations as the shape evolves.
fuzz_target!(|data: &[u8]| {
    let mut tree = RankTree::new();
    let mut model: Vec<RecencyEntry> = Vec::new();
    let mut seq = 0u64;

    for chunk in data.chunks(2) {
        let op = chunk[0] % 4;
        let arg = *chunk.get(1).unwrap_or(&0) as usize;

        match op {
            // Insert dominates so trees actually grow.
            0 | 1 => {
                seq += 1;
                let entry = RecencyEntry::new(seq, arg as u64);
                tree.insert(entry);
                model.push(entry);
            }
            2 => {
                if !model.is_empty() {
                    let rank = arg % model.len();
                    let expected = model.remove(rank);
                    assert_eq!(tree.remove_at(rank), Some(expected));
                }
            }
            3 => {
                if !model.is_empty() {
                    let rank = arg % model.len();
                    assert_eq!(tree.rank_of(model[rank].seq), Some(rank));
                    assert_eq!(tree.get(rank), Some(&model[rank]));
                }
            }
            _ => unreachable!(),
        }

        assert_eq!(tree.len(), model.len());
    }

    tree.check_invariants().expect("tree invariants violated");
    let inorder: Vec<RecencyEntry> = tree.iter().copied().collect();
    assert_eq!(inorder, model);
});
