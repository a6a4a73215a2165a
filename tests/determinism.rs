mod common;

use std::collections::HashSet;
use std::thread;

use blake3::Hasher;
use common::synthetic_genome;
use esaseek::esa::TableStorage;
use esaseek::{CompactEsa, Sequence};

fn fingerprint(esa: &CompactEsa) -> blake3::Hash {
    let mut hasher = Hasher::new();
    for table in [
        esa.suftab().to_vec().unwrap(),
        esa.lcptab().to_vec().unwrap(),
        esa.childtab().to_vec().unwrap(),
    ] {
        for value in table {
            hasher.update(&value.to_le_bytes());
        }
    }
    hasher.finalize()
}

#[test]
fn construction_is_deterministic_across_threads() {
    let genome = synthetic_genome(20_000, 99);
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let genome = genome.clone();
            thread::spawn(move || {
                let esa = CompactEsa::build(Sequence::new(genome).unwrap()).unwrap();
                fingerprint(&esa)
            })
        })
        .collect();

    let fingerprints: HashSet<_> = handles
        .into_iter()
        .map(|handle| handle.join().expect("builder thread panicked"))
        .collect();
    assert_eq!(fingerprints.len(), 1, "tables diverged across runs");
}

#[test]
fn shared_index_answers_concurrent_queries() {
    let genome = synthetic_genome(10_000, 7);
    let esa = CompactEsa::build(Sequence::new(&genome).unwrap()).unwrap();
    let expected = esa.find_positions(&genome[100..112]).unwrap();

    thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                assert_eq!(esa.find_positions(&genome[100..112]).unwrap(), expected);
            });
        }
    });
}
