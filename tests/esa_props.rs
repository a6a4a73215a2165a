mod common;

use common::{brute_force_positions, dna, naive_suffix_array, repetitive_dna};
use esaseek::esa::child_table::{build_child_table, build_child_table_two_pass};
use esaseek::esa::lcp::{build_lcp, naive_lcp};
use esaseek::esa::storage::compact::CompactTable;
use esaseek::esa::{SuffixSorter, TableKind, TableStorage};
use esaseek::{BuildConfig, CancellationToken, CompactEsa, InMemoryEsa, Interval, Sequence};
use proptest::prelude::*;

fn check_partition(esa: &InMemoryEsa, interval: Interval) -> Result<(), TestCaseError> {
    if interval.is_singleton() {
        return Ok(());
    }
    let children = esa.child_intervals(interval).expect("navigation succeeds");
    prop_assert!(children.len() >= 2, "{} has {} children", interval, children.len());
    prop_assert_eq!(children[0].lb, interval.lb);
    prop_assert_eq!(children[children.len() - 1].ub, interval.ub);
    for pair in children.windows(2) {
        prop_assert_eq!(pair[0].ub + 1, pair[1].lb, "children must be adjacent");
    }

    let depth = esa.interval_lcp(interval).unwrap();
    let min_lcp = (interval.lb + 1..=interval.ub)
        .map(|i| esa.lcp_at(i).unwrap())
        .min()
        .unwrap();
    prop_assert_eq!(depth, min_lcp);

    for child in children {
        if !child.is_singleton() {
            prop_assert!(esa.interval_lcp(child).unwrap() > depth);
        }
        check_partition(esa, child)?;
    }
    Ok(())
}

proptest! {
    #[test]
    fn suffix_array_matches_naive_sort(text in dna(1..200)) {
        let sequence = Sequence::new(&text).unwrap();
        let suftab = SuffixSorter::new().sort(&sequence);
        prop_assert_eq!(suftab, naive_suffix_array(&text));
    }

    #[test]
    fn suffix_array_on_repeats(text in repetitive_dna(1..200)) {
        let sequence = Sequence::new(&text).unwrap();
        prop_assert_eq!(SuffixSorter::new().sort(&sequence), naive_suffix_array(&text));
    }

    #[test]
    fn kasai_matches_pairwise_lcp(text in dna(1..200)) {
        let suftab = naive_suffix_array(&text);
        prop_assert_eq!(build_lcp(&text, &suftab), naive_lcp(&text, &suftab));
    }

    #[test]
    fn fused_child_table_matches_two_pass(text in repetitive_dna(1..150)) {
        let suftab = naive_suffix_array(&text);
        let lcp = build_lcp(&text, &suftab);
        prop_assert_eq!(build_child_table(&lcp), build_child_table_two_pass(&lcp));
    }

    #[test]
    fn child_slots_satisfy_at_most_one_link_predicate(text in repetitive_dna(1..150)) {
        let suftab = naive_suffix_array(&text);
        let lcp = build_lcp(&text, &suftab);
        let childtab = build_child_table(&lcp);
        let lcp_at = |i: usize| lcp.get(i).copied().unwrap_or(0);

        for (i, &raw) in childtab.iter().enumerate() {
            let target = raw as usize;
            let up = lcp_at(i) > lcp_at(i + 1);
            let down = lcp_at(target) > lcp_at(i);
            let next = lcp_at(target) == lcp_at(i) && target > i;
            let holding = [up, down, next].iter().filter(|&&holds| holds).count();
            prop_assert!(
                holding <= 1,
                "slot {} (value {}) has up={} down={} next={}",
                i, raw, up, down, next
            );
        }
    }

    #[test]
    fn child_intervals_partition_their_parent(text in dna(1..120)) {
        let esa = InMemoryEsa::build(Sequence::new(&text).unwrap()).unwrap();
        check_partition(&esa, esa.root())?;
    }

    #[test]
    fn find_matches_brute_force(
        text in dna(1..150),
        start in 0usize..150,
        len in 1usize..10,
        random in dna(1..8),
    ) {
        let esa = CompactEsa::build_with(
            Sequence::new(&text).unwrap(),
            &BuildConfig::default().with_bucket_depth(2).unwrap(),
            &CancellationToken::new(),
        )
        .unwrap();

        let start = start % text.len();
        let end = (start + len).min(text.len());
        for pattern in [&text[start..end], random.as_slice()] {
            prop_assert_eq!(
                esa.find_positions(pattern).unwrap(),
                brute_force_positions(&text, pattern)
            );
        }
    }

    #[test]
    fn compact_tables_round_trip(values in proptest::collection::vec(0u32..100_000, 1..300)) {
        for kind in [TableKind::Lcp, TableKind::Child] {
            let table = CompactTable::encode(kind, &values);
            prop_assert_eq!(table.to_vec().unwrap(), values.clone());
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(4))]

    #[test]
    fn long_sequences_keep_lcp_linear_and_exact(text in dna(2_000..10_000)) {
        let sequence = Sequence::new(&text).unwrap();
        let mut sorter = SuffixSorter::new();
        let suftab = sorter.sort(&sequence);
        prop_assert!(sorter.profile().satisfies_bound(text.len(), 32));
        prop_assert_eq!(build_lcp(&text, &suftab), naive_lcp(&text, &suftab));
    }
}
