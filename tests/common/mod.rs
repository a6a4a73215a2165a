#![allow(dead_code)]

use std::collections::BTreeSet;

use proptest::prelude::*;

pub const FIXTURE_TEXT: &str = "acaaacatat";
pub const FIXTURE_SUFTAB: [u32; 11] = [10, 2, 3, 0, 4, 8, 6, 1, 5, 9, 7];
pub const FIXTURE_LCP: [u32; 11] = [0, 0, 2, 1, 3, 1, 2, 0, 2, 0, 1];
pub const FIXTURE_CHILDTAB: [u32; 11] = [1, 7, 2, 5, 4, 6, 3, 9, 8, 10, 10];

/// Suffix array by sorting suffixes directly; the sentinel sorts first.
pub fn naive_suffix_array(text: &[u8]) -> Vec<u32> {
    let mut suffixes: Vec<u32> = (0..=text.len() as u32).collect();
    suffixes.sort_by(|&a, &b| text[a as usize..].cmp(&text[b as usize..]));
    suffixes
}

/// Every start position of `pattern` in `text`.
pub fn brute_force_positions(text: &[u8], pattern: &[u8]) -> BTreeSet<usize> {
    if pattern.is_empty() || pattern.len() > text.len() {
        return BTreeSet::new();
    }
    text.windows(pattern.len())
        .enumerate()
        .filter(|(_, window)| *window == pattern)
        .map(|(pos, _)| pos)
        .collect()
}

/// Uppercase DNA over {A, C, G, T, N}, N rarer than the other bases.
pub fn dna(len: std::ops::Range<usize>) -> impl Strategy<Value = Vec<u8>> {
    proptest::collection::vec(
        prop_oneof![
            4 => Just(b'A'),
            4 => Just(b'C'),
            4 => Just(b'G'),
            4 => Just(b'T'),
            1 => Just(b'N'),
        ],
        len,
    )
}

/// DNA over a two-letter alphabet, rich in repeats.
pub fn repetitive_dna(len: std::ops::Range<usize>) -> impl Strategy<Value = Vec<u8>> {
    proptest::collection::vec(prop_oneof![Just(b'A'), Just(b'T')], len)
}

/// Deterministic pseudo-random genome for larger tests.
pub fn synthetic_genome(len: usize, seed: u64) -> Vec<u8> {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    (0..len)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            b"ACGT"[(state >> 62) as usize]
        })
        .collect()
}
