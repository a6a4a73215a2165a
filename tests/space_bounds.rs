//! Workspace bound verification for the suffix sorter

mod common;

use common::synthetic_genome;
use esaseek::esa::SuffixSorter;
use esaseek::Sequence;

#[test]
fn sorter_workspace_is_linear_in_input() {
    for len in [1_000, 10_000, 100_000] {
        let sequence = Sequence::new(synthetic_genome(len, len as u64)).unwrap();
        let mut sorter = SuffixSorter::new();
        let suftab = sorter.sort(&sequence);
        assert_eq!(suftab.len(), len + 1);

        let profile = sorter.profile();
        assert!(
            profile.satisfies_bound(len, 32),
            "len={len}: {}",
            profile.report()
        );
        assert!(profile.max_depth >= 1);
    }
}

#[test]
fn repetitive_input_recurses_without_blowing_the_bound() {
    // periodic input forces the sorter to recurse
    let bases: Vec<u8> = b"ACG".iter().copied().cycle().take(30_000).collect();
    let mut sorter = SuffixSorter::new();
    let suftab = sorter.sort(&Sequence::new(&bases).unwrap());

    assert_eq!(suftab[0], 30_000);
    assert_eq!(suftab[1], 29_999 - 2, "shortest ACG-prefixed suffix sorts first");
    assert!(sorter.profile().satisfies_bound(bases.len(), 32));
}
