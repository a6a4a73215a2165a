mod common;

use std::collections::BTreeSet;

use common::{FIXTURE_CHILDTAB, FIXTURE_LCP, FIXTURE_SUFTAB, FIXTURE_TEXT};
use esaseek::esa::child_table::{build_child_table, build_child_table_two_pass};
use esaseek::esa::lcp::build_lcp;
use esaseek::esa::{SuffixSorter, TableStorage};
use esaseek::{BuildConfig, CancellationToken, CompactEsa, EsaError, InMemoryEsa, Interval, Sequence};
use test_case::test_case;

fn fixture_sequence() -> Sequence {
    Sequence::new(FIXTURE_TEXT).expect("fixture is valid DNA")
}

#[test]
fn builders_reproduce_reference_tables() {
    let sequence = fixture_sequence();
    let suftab = SuffixSorter::new().sort(&sequence);
    assert_eq!(suftab, FIXTURE_SUFTAB.to_vec());

    let lcp = build_lcp(sequence.as_bytes(), &suftab);
    assert_eq!(lcp, FIXTURE_LCP.to_vec());

    assert_eq!(build_child_table(&lcp), FIXTURE_CHILDTAB.to_vec());
    assert_eq!(build_child_table_two_pass(&lcp), FIXTURE_CHILDTAB.to_vec());
}

#[test]
fn compact_index_decodes_reference_tables() {
    let esa = CompactEsa::build(fixture_sequence()).expect("build succeeds");
    assert_eq!(esa.suftab().to_vec().unwrap(), FIXTURE_SUFTAB.to_vec());
    assert_eq!(esa.lcptab().to_vec().unwrap(), FIXTURE_LCP.to_vec());
    assert_eq!(esa.childtab().to_vec().unwrap(), FIXTURE_CHILDTAB.to_vec());
}

#[test]
fn root_has_four_children() {
    let esa = InMemoryEsa::build(fixture_sequence()).expect("build succeeds");
    let children = esa.child_intervals(esa.root()).unwrap();
    assert_eq!(
        children,
        vec![
            Interval::new(0, 0),
            Interval::new(1, 6),
            Interval::new(7, 8),
            Interval::new(9, 10),
        ]
    );
}

#[test_case("aca", &[0, 4] ; "two occurrences")]
#[test_case("acat", &[4] ; "narrowed to one")]
#[test_case("a", &[0, 2, 3, 4, 6, 8] ; "single symbol")]
#[test_case("tat", &[7] ; "suffix of the text")]
#[test_case("acaaacatat", &[0] ; "whole text")]
#[test_case("cg", &[] ; "absent symbol pair")]
#[test_case("ataa", &[] ; "runs past the end")]
#[test_case("acaaacatatt", &[] ; "longer than text")]
fn exact_search(pattern: &str, expected: &[usize]) {
    let expected: BTreeSet<usize> = expected.iter().copied().collect();
    let plain = InMemoryEsa::build(fixture_sequence()).unwrap();
    let bucketed = CompactEsa::build_with(
        fixture_sequence(),
        &BuildConfig::default().with_bucket_depth(3).unwrap(),
        &CancellationToken::new(),
    )
    .unwrap();

    assert_eq!(plain.find_positions(pattern).unwrap(), expected);
    assert_eq!(bucketed.find_positions(pattern).unwrap(), expected);
    assert_eq!(plain.match_count(pattern).unwrap(), expected.len());
}

#[test]
fn empty_and_foreign_patterns_are_errors() {
    let esa = CompactEsa::build(fixture_sequence()).unwrap();
    assert!(matches!(esa.find_positions(""), Err(EsaError::EmptyPattern)));
    assert!(matches!(esa.match_count("ac-a"), Err(EsaError::InvalidInput(_))));
}

#[test]
fn invalid_sequences_are_rejected() {
    assert!(Sequence::new("").is_err());
    assert!(Sequence::new("ACGTX").is_err());
}
